//! Pairwise adduct search.
//!
//! Candidate links between rows are discovered in parallel against a shared
//! `&FeatureList`, collected, and then applied one by one by the owner of
//! the list.

use rayon::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    info,
    instrument,
};

use crate::errors::ModelError;
use crate::models::feature_list::FeatureList;
use crate::models::feature_row::{
    FeatureRow,
    RowId,
};
use crate::models::ion_type::IonType;
use crate::models::tolerance::{
    MzToleranceCheck,
    Tolerance,
};
use crate::networking::library::IonNetworkLibrary;

/// Which row pairs are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckMode {
    #[default]
    All,
    /// Only rows of the same correlation group. Ungrouped rows are never paired.
    SameGroup,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IonNetworkingParameters {
    pub tolerance: Tolerance,
    #[serde(default)]
    pub min_height: f64,
    #[serde(default)]
    pub check_mode: CheckMode,
}

impl Default for IonNetworkingParameters {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            min_height: 0.0,
            check_mode: CheckMode::All,
        }
    }
}

/// Two rows explained as two ion types of the same neutral molecule.
#[derive(Debug, Clone, PartialEq)]
pub struct AdductLink {
    pub row_a: RowId,
    pub type_a: IonType,
    pub row_b: RowId,
    pub type_b: IonType,
}

/// Implied neutral masses of one row, sorted by mass.
struct RowMasses<'a> {
    row: &'a FeatureRow,
    masses: Vec<(f64, usize)>,
}

impl<'a> RowMasses<'a> {
    fn new(row: &'a FeatureRow, types: &[IonType]) -> Self {
        let mut masses: Vec<(f64, usize)> = types
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.mass(row.average_mz).ok().map(|m| (m, i)))
            .collect();
        masses.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { row, masses }
    }

    /// Type indices whose implied mass matches `mass`.
    fn matching<'b>(
        &'b self,
        mass: f64,
        tolerance: &'b Tolerance,
    ) -> impl Iterator<Item = usize> + 'b {
        let range = tolerance.mz_range(mass);
        let start = self.masses.partition_point(|(m, _)| *m < range.start());
        self.masses[start..]
            .iter()
            .take_while(move |(m, _)| *m <= range.end())
            .filter(move |(m, _)| tolerance.check_within_tolerance(mass, *m))
            .map(|(_, i)| *i)
    }
}

fn compatible(a: &IonType, b: &IonType) -> bool {
    a.charge().signum() == b.charge().signum()
        && !(a.has_mods() && b.has_mods())
        && (a.molecules() == 1 || b.molecules() == 1)
}

fn rows_comparable(a: &FeatureRow, b: &FeatureRow, params: &IonNetworkingParameters) -> bool {
    if params.check_mode == CheckMode::SameGroup
        && (a.group_id.is_none() || a.group_id != b.group_id)
    {
        return false;
    }
    params
        .tolerance
        .rt
        .check_within_tolerance(a.average_rt, b.average_rt)
}

fn links_between(
    a: &RowMasses,
    b: &RowMasses,
    library: &IonNetworkLibrary,
    tolerance: &Tolerance,
    out: &mut Vec<AdductLink>,
) {
    let types = library.adduct_types();
    for (mass, ia) in a.masses.iter() {
        for ib in b.matching(*mass, tolerance) {
            if ia == &ib || !compatible(&types[*ia], &types[ib]) {
                continue;
            }
            out.push(AdductLink {
                row_a: a.row.id,
                type_a: types[*ia].clone(),
                row_b: b.row.id,
                type_b: types[ib].clone(),
            });
        }
    }

    for modified in library.modification_types() {
        let parent = IonType::undefined(modified.charge());
        for (heavy, light) in [(a.row, b.row), (b.row, a.row)] {
            let (Ok(parent_mass), Ok(modified_mass)) =
                (parent.mass(heavy.average_mz), modified.mass(light.average_mz))
            else {
                continue;
            };
            if tolerance.check_within_tolerance(parent_mass, modified_mass) {
                out.push(AdductLink {
                    row_a: heavy.id,
                    type_a: parent.clone(),
                    row_b: light.id,
                    type_b: modified.clone(),
                });
            }
        }
    }
}

/// All candidate links between rows of `list`, computed on the rayon pool.
#[instrument(level = "debug", skip_all)]
pub fn find_adduct_links(
    list: &FeatureList,
    library: &IonNetworkLibrary,
    params: &IonNetworkingParameters,
) -> Vec<AdductLink> {
    let rows: Vec<RowMasses> = list
        .rows()
        .iter()
        .filter(|r| r.height >= params.min_height)
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|r| RowMasses::new(r, library.adduct_types()))
        .collect();
    debug!(
        "Searching {} of {} rows against {} ion types",
        rows.len(),
        list.rows().len(),
        library.len()
    );

    (0..rows.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let mut out = Vec::new();
            for j in (i + 1)..rows.len() {
                if rows_comparable(rows[i].row, rows[j].row, params) {
                    links_between(&rows[i], &rows[j], library, &params.tolerance, &mut out);
                }
            }
            out
        })
        .collect()
}

/// Turns links into identities and networks. Returns how many were applied.
pub fn apply_adduct_links(
    list: &mut FeatureList,
    links: Vec<AdductLink>,
    params: &IonNetworkingParameters,
) -> Result<usize, ModelError> {
    let count = links.len();
    for link in links {
        list.add_adduct_identity_to_row(
            params.tolerance.ms,
            link.row_a,
            link.type_a,
            link.row_b,
            link.type_b,
        )?;
    }
    Ok(count)
}

/// Finds and applies all links. Returns the number of links.
#[instrument(level = "debug", skip_all)]
pub fn search(
    list: &mut FeatureList,
    library: &IonNetworkLibrary,
    params: &IonNetworkingParameters,
) -> Result<usize, ModelError> {
    let links = find_adduct_links(list, library, params);
    let applied = apply_adduct_links(list, links, params)?;
    info!(
        "Found {} adduct links, {} identities in {} networks",
        applied,
        list.rows().iter().map(|r| r.identities().len()).sum::<usize>(),
        list.network_count()
    );
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::defaults;
    use crate::models::modification::Polarity;
    use crate::models::tolerance::{
        MzTolerance,
        RtTolerance,
    };
    use crate::networking::library::LibraryConfig;

    fn small_library() -> IonNetworkLibrary {
        IonNetworkLibrary::new(LibraryConfig {
            polarity: Polarity::Positive,
            max_molecules: 2,
            max_charge: 1,
            adducts: vec![defaults::h(), defaults::na(), defaults::nh4()],
            modifications: vec![defaults::h2o()],
        })
    }

    fn params() -> IonNetworkingParameters {
        IonNetworkingParameters {
            tolerance: Tolerance {
                ms: MzTolerance::Absolute(0.001),
                rt: RtTolerance::Minutes(0.1),
            },
            min_height: 100.0,
            check_mode: CheckMode::All,
        }
    }

    #[test]
    fn test_finds_h_na_pair() {
        let list = FeatureList::from_rows([
            FeatureRow::new(1, 300.1000, 5.0, 1e5),
            FeatureRow::new(2, 322.0819, 5.02, 5e4),
        ])
        .unwrap();
        let links = find_adduct_links(&list, &small_library(), &params());
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].type_a.to_string(), "[M+H]+");
        assert_eq!(links[0].type_b.to_string(), "[M+Na]+");
    }

    #[test]
    fn test_filters() {
        let rows = [
            FeatureRow::new(1, 300.1000, 5.0, 1e5).with_group(1),
            FeatureRow::new(2, 322.0819, 7.0, 5e4).with_group(1),
        ];
        // outside the RT window
        let list = FeatureList::from_rows(rows.clone()).unwrap();
        assert!(find_adduct_links(&list, &small_library(), &params()).is_empty());

        // too low
        let mut low = rows.clone();
        low[1].average_rt = 5.0;
        low[1].height = 10.0;
        let list = FeatureList::from_rows(low).unwrap();
        assert!(find_adduct_links(&list, &small_library(), &params()).is_empty());

        // different groups
        let mut other_group = rows.clone();
        other_group[1].average_rt = 5.0;
        other_group[1].group_id = Some(2);
        let list = FeatureList::from_rows(other_group).unwrap();
        let mut same_group = params();
        same_group.check_mode = CheckMode::SameGroup;
        assert!(find_adduct_links(&list, &small_library(), &same_group).is_empty());
        assert_eq!(find_adduct_links(&list, &small_library(), &params()).len(), 1);
    }

    #[test]
    fn test_modification_link() {
        let list = FeatureList::from_rows([
            FeatureRow::new(1, 300.1000, 5.0, 1e5),
            FeatureRow::new(2, 282.089435, 5.0, 1e5),
        ])
        .unwrap();
        let links = find_adduct_links(&list, &small_library(), &params());
        let modification: Vec<&AdductLink> = links
            .iter()
            .filter(|l| l.type_b.is_modified_undefined_adduct())
            .collect();
        assert_eq!(modification.len(), 1);
        assert_eq!(modification[0].row_a, RowId(1));
        assert_eq!(modification[0].type_a.to_string(), "[M+?]+");
        assert_eq!(modification[0].type_b.to_string(), "[M-H2O+?]+");
    }

    #[test]
    fn test_search_builds_network() {
        let mut list = FeatureList::from_rows([
            FeatureRow::new(1, 300.1000, 5.0, 1e5),
            FeatureRow::new(2, 322.0819, 5.0, 5e4),
            FeatureRow::new(3, 317.1265, 5.0, 2e4),
        ])
        .unwrap();
        let applied = search(&mut list, &small_library(), &params()).unwrap();
        assert!(applied >= 3);
        let h = list.best_identity(RowId(1)).unwrap();
        let net = list.identity(h).network().unwrap();
        assert_eq!(list.network(net).unwrap().len(), 3);
    }
}
