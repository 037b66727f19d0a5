use std::collections::BTreeMap;

use ionnet::io::build_reports;
use ionnet::models::defaults;
use ionnet::models::modification::Polarity;
use ionnet::models::tolerance::RtTolerance;
use ionnet::networking::library::LibraryConfig;
use ionnet::networking::logic::{
    create_annotation_networks,
    recalc_all_annotation_networks,
    sort_ion_identities,
    split_by_groups,
    stream_networks,
};
use ionnet::networking::CheckMode;
use ionnet::{
    FeatureList,
    FeatureRow,
    IdentityId,
    IonModification,
    IonNetworkLibrary,
    IonNetworkingParameters,
    IonType,
    MzTolerance,
    MzToleranceCheck,
    RowId,
    Tolerance,
};

const TOL: MzTolerance = MzTolerance::Absolute(0.001);

fn h() -> IonType {
    IonType::new(defaults::h())
}

fn na() -> IonType {
    IonType::new(defaults::na())
}

fn water_loss_rows() -> FeatureList {
    FeatureList::from_rows([
        FeatureRow::new(1, 282.089435, 5.0, 1e4),
        FeatureRow::new(2, 300.1000, 5.0, 1e5),
        FeatureRow::new(3, 322.0819, 5.0, 5e4),
    ])
    .unwrap()
}

fn all_partners(list: &FeatureList) -> BTreeMap<(RowId, String), Vec<RowId>> {
    let mut out = BTreeMap::new();
    for row in list.row_ids() {
        for id in list.identities_of(row) {
            let identity = list.identity(id);
            out.insert(
                (row, identity.ion_type().to_string()),
                identity.partners().keys().copied().collect(),
            );
        }
    }
    out
}

#[test]
fn test_h_na_pair_builds_one_network() {
    let mut list = FeatureList::from_rows([
        FeatureRow::new(1, 300.1000, 5.0, 1.0),
        FeatureRow::new(2, 322.0819, 5.0, 1.0),
    ])
    .unwrap();
    list.add_adduct_identity_to_row(TOL, RowId(1), h(), RowId(2), na())
        .unwrap();

    let rows = list.row_ids();
    let nets = create_annotation_networks(&mut list, &rows, TOL);
    assert_eq!(nets.len(), 1);
    assert_eq!(list.network(nets[0]).unwrap().len(), 2);
    assert_eq!(list.network(nets[0]).unwrap().number(), 0);

    let a = list.best_identity(RowId(1)).unwrap();
    let b = list.best_identity(RowId(2)).unwrap();
    assert_eq!(list.identity(a).partners().get(&RowId(2)), Some(&b));
    assert_eq!(list.identity(b).partners().get(&RowId(1)), Some(&a));

    let mass = list.neutral_mass(nets[0]).unwrap();
    assert!((mass - 299.0927).abs() < 0.001);
}

#[test]
fn test_neutral_loss_is_filled_into_partner_network() {
    let mut list = water_loss_rows();
    let loss = IonType::undefined(1).create_modified(&[defaults::h2o()]);
    list.add_adduct_identity_to_row(TOL, RowId(2), IonType::undefined(1), RowId(1), loss)
        .unwrap();
    list.add_adduct_identity_to_row(TOL, RowId(2), h(), RowId(3), na())
        .unwrap();

    let rows = list.row_ids();
    let nets = create_annotation_networks(&mut list, &rows, TOL);
    assert_eq!(nets.len(), 2);

    // Row 1 now explains itself as a water loss of the protonated ion
    let filled = list.best_identity(RowId(1)).unwrap();
    assert_eq!(list.identity(filled).ion_type().to_string(), "[M-H2O+H]+");
    let net = list.identity(filled).network().unwrap();
    let network = list.network(net).unwrap();
    assert_eq!(network.len(), 3);
    assert!(network.contains_row(RowId(2)) && network.contains_row(RowId(3)));

    let partners: Vec<RowId> = list.identity(filled).partners().keys().copied().collect();
    assert_eq!(partners, vec![RowId(2), RowId(3)]);
}

#[test]
fn test_fill_in_does_not_duplicate_identities() {
    let mut list = water_loss_rows();
    let loss = IonType::undefined(1).create_modified(&[defaults::h2o()]);
    list.add_adduct_identity_to_row(TOL, RowId(2), IonType::undefined(1), RowId(1), loss)
        .unwrap();
    list.add_adduct_identity_to_row(TOL, RowId(2), h(), RowId(3), na())
        .unwrap();
    let rows = list.row_ids();
    create_annotation_networks(&mut list, &rows, TOL);
    create_annotation_networks(&mut list, &rows, TOL);

    let names: Vec<String> = list
        .identities_of(RowId(1))
        .into_iter()
        .map(|id| list.identity(id).ion_type().to_string())
        .collect();
    assert_eq!(
        names.iter().filter(|n| n.as_str() == "[M-H2O+H]+").count(),
        1
    );
}

#[test]
fn test_defined_adduct_sorts_before_undefined() {
    let mut list = water_loss_rows();
    let (undefined, _) = list
        .add_adduct_identity_to_row(
            TOL,
            RowId(2),
            IonType::undefined(1),
            RowId(1),
            IonType::undefined(1).create_modified(&[defaults::h2o()]),
        )
        .unwrap();
    let (proton, _) = list
        .add_adduct_identity_to_row(TOL, RowId(2), h(), RowId(3), na())
        .unwrap();

    sort_ion_identities(&mut list, false);
    assert_eq!(list.identities_of(RowId(2)), vec![proton, undefined]);
}

#[test]
fn test_recalc_is_idempotent() {
    let mut list = water_loss_rows();
    list.add_adduct_identity_to_row(
        TOL,
        RowId(2),
        IonType::undefined(1),
        RowId(1),
        IonType::undefined(1).create_modified(&[defaults::h2o()]),
    )
    .unwrap();
    list.add_adduct_identity_to_row(TOL, RowId(2), h(), RowId(3), na())
        .unwrap();
    let rows = list.row_ids();
    create_annotation_networks(&mut list, &rows, TOL);

    recalc_all_annotation_networks(&mut list, false);
    let first = all_partners(&list);
    recalc_all_annotation_networks(&mut list, false);
    assert_eq!(first, all_partners(&list));
}

#[test]
fn test_every_member_matches_network_mass() {
    let mut list = FeatureList::from_rows([
        FeatureRow::new(1, 300.1000, 5.0, 1.0),
        FeatureRow::new(2, 322.0819, 5.0, 1.0),
        FeatureRow::new(3, 317.126547, 5.0, 1.0),
    ])
    .unwrap();
    let nh4 = IonType::new(defaults::nh4());
    list.add_adduct_identity_to_row(TOL, RowId(1), h(), RowId(2), na())
        .unwrap();
    list.add_adduct_identity_to_row(TOL, RowId(1), h(), RowId(3), nh4)
        .unwrap();
    let rows = list.row_ids();
    let nets = create_annotation_networks(&mut list, &rows, TOL);
    assert_eq!(nets.len(), 1);

    let neutral = list.neutral_mass(nets[0]).unwrap();
    let members: Vec<(RowId, IdentityId)> = list
        .network(nets[0])
        .unwrap()
        .entries()
        .iter()
        .map(|(r, i)| (*r, *i))
        .collect();
    assert_eq!(members.len(), 3);
    for (row, id) in members {
        let mz = list.row(row).unwrap().average_mz;
        let mass = list.identity(id).ion_type().mass(mz).unwrap();
        assert!(TOL.check_within_tolerance(mass, neutral));
        assert_eq!(list.identity(id).network(), Some(nets[0]));
    }
}

#[test]
fn test_delete_removes_identity_everywhere() {
    let mut list = FeatureList::from_rows([
        FeatureRow::new(1, 300.1000, 5.0, 1.0),
        FeatureRow::new(2, 322.0819, 5.0, 1.0),
    ])
    .unwrap();
    let (a, b) = list
        .add_adduct_identity_to_row(TOL, RowId(1), h(), RowId(2), na())
        .unwrap();
    let net = list.identity(a).network().unwrap();

    list.delete_identity(a);
    assert!(list.identity(a).is_deleted());
    // partners go with it
    assert!(list.identity(b).is_deleted());
    assert!(list.identities_of(RowId(1)).is_empty());
    assert!(list.identities_of(RowId(2)).is_empty());
    assert!(list.network(net).map_or(true, |n| n.is_empty()));
}

#[test]
fn test_split_by_groups() {
    let mut list = FeatureList::from_rows([
        FeatureRow::new(1, 300.1000, 5.0, 1.0).with_group(1),
        FeatureRow::new(2, 322.0819, 5.0, 1.0).with_group(1),
        FeatureRow::new(3, 317.126547, 5.0, 1.0).with_group(2),
        FeatureRow::new(4, 338.0558, 5.0, 1.0).with_group(2),
    ])
    .unwrap();
    let nh4 = IonType::new(defaults::nh4());
    let k = IonType::new(defaults::k());
    list.add_adduct_identity_to_row(TOL, RowId(1), h(), RowId(2), na())
        .unwrap();
    list.add_adduct_identity_to_row(TOL, RowId(3), nh4, RowId(4), k)
        .unwrap();
    let rows = list.row_ids();
    let mut nets = create_annotation_networks(&mut list, &rows, TOL);
    assert_eq!(nets.len(), 1);
    assert_eq!(list.network(nets[0]).unwrap().len(), 4);

    split_by_groups(&mut list, &mut nets);
    assert_eq!(nets.len(), 2);
    for net in nets.iter() {
        let network = list.network(*net).unwrap();
        assert_eq!(network.len(), 2);
        assert!(network.all_same_corr_group(list.rows()));
    }
}

#[test]
fn test_search_to_report() {
    let mut list = water_loss_rows();
    let library = IonNetworkLibrary::new(LibraryConfig {
        polarity: Polarity::Positive,
        max_molecules: 2,
        max_charge: 1,
        adducts: vec![defaults::h(), defaults::na(), defaults::nh4()],
        modifications: vec![defaults::h2o()],
    });
    let params = IonNetworkingParameters {
        tolerance: Tolerance {
            ms: TOL,
            rt: RtTolerance::Minutes(0.1),
        },
        min_height: 0.0,
        check_mode: CheckMode::All,
    };

    let links = ionnet::networking::search(&mut list, &library, &params).unwrap();
    assert!(links > 0);
    let rows = list.row_ids();
    create_annotation_networks(&mut list, &rows, TOL);
    recalc_all_annotation_networks(&mut list, true);
    sort_ion_identities(&mut list, false);

    let best = list.best_identity(RowId(1)).unwrap();
    assert_eq!(list.identity(best).ion_type().to_string(), "[M-H2O+H]+");

    let nets = stream_networks(&mut list, true, None);
    let reports = build_reports(&mut list, &nets);
    let report = reports
        .iter()
        .find(|r| r.members.iter().any(|m| m.row == RowId(1)))
        .unwrap();
    assert_eq!(report.size, 3);
    assert!((report.neutral_mass.unwrap() - 299.0927).abs() < 0.001);
    assert_eq!(report.most_intense_row, Some(RowId(2)));
    let json = serde_json::to_string(&reports).unwrap();
    assert!(json.contains("[M+Na]+"));
}

#[test]
fn test_ion_type_mz_round_trip() {
    let types = [
        h(),
        na(),
        IonType::with_molecules(2, defaults::na(), None),
        IonType::with_modification(defaults::h(), defaults::h2o()),
        IonType::new(defaults::h2_plus()),
        IonType::new(defaults::cl()),
        IonType::undefined(-1),
    ];
    for ion in types.iter() {
        for mass in [100.0, 299.0927, 1234.5678] {
            let mz = ion.mz(mass).unwrap();
            assert!((ion.mass(mz).unwrap() - mass).abs() < 1e-9, "{}", ion);
        }
    }
}

#[test]
fn test_modification_algebra() {
    let combined = IonModification::create(&[defaults::nh3(), defaults::h2o()]);
    let expected = defaults::nh3().mass() + defaults::h2o().mass();
    assert!((combined.mass() - expected).abs() < 1e-9);
    assert_eq!(combined.mod_count(), 2);

    let opposite = combined.create_opposite();
    assert!((opposite.mass() + combined.mass()).abs() < 1e-9);
    assert_eq!(opposite.create_opposite(), combined);

    let rest = combined.remove(&defaults::h2o()).unwrap();
    assert_eq!(rest, defaults::nh3());

    let parent = h();
    let modified = parent.create_modified(&[defaults::h2o()]);
    assert!(modified.is_modification_of(&parent));
    assert!(!parent.is_modification_of(&modified));
}
