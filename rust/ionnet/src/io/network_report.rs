use serde::Serialize;

use crate::models::feature_list::FeatureList;
use crate::models::feature_row::RowId;
use crate::models::network::NetworkId;

/// One network row of the output.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkReport {
    pub number: i32,
    pub size: usize,
    pub neutral_mass: Option<f64>,
    pub max_dev: Option<f64>,
    pub avg_rt: Option<f64>,
    pub avg_mz: Option<f64>,
    pub height_sum: f64,
    pub most_intense_row: Option<RowId>,
    pub relations: Vec<RelationReport>,
    pub members: Vec<MemberReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationReport {
    pub network: i32,
    pub relation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberReport {
    pub row: RowId,
    pub mz: f64,
    pub rt: f32,
    pub height: f64,
    pub ion: String,
    pub score: usize,
    pub likelihood: i32,
    pub partners: Vec<RowId>,
}

/// Snapshots the given networks. Missing handles are skipped.
pub fn build_reports(list: &mut FeatureList, networks: &[NetworkId]) -> Vec<NetworkReport> {
    networks
        .iter()
        .filter_map(|net| build_report(list, *net))
        .collect()
}

fn build_report(list: &mut FeatureList, net: NetworkId) -> Option<NetworkReport> {
    let neutral_mass = list.calc_neutral_mass(net);
    let max_dev = list.max_dev(net);
    let network = list.network(net)?;

    let relations = network
        .relations()
        .iter()
        .filter_map(|(other, relations)| Some((list.network(*other)?.number(), relations)))
        .flat_map(|(number, relations)| {
            relations.iter().map(move |relation| RelationReport {
                network: number,
                relation: relation.description(),
            })
        })
        .collect();

    let members = network
        .entries()
        .iter()
        .filter_map(|(row_id, identity)| {
            let row = list.row(*row_id)?;
            let ident = list.identity(*identity);
            Some(MemberReport {
                row: *row_id,
                mz: row.average_mz,
                rt: row.average_rt,
                height: row.height,
                ion: ident.ion_type().to_string(),
                score: list.identity_score(*identity),
                likelihood: list.identity_likelihood(*identity),
                partners: ident.partners().keys().copied().collect(),
            })
        })
        .collect();

    Some(NetworkReport {
        number: network.number(),
        size: network.len(),
        neutral_mass,
        max_dev,
        avg_rt: network.avg_rt(),
        avg_mz: network.avg_mz(list.rows()),
        height_sum: network.height_sum(),
        most_intense_row: network.most_intense_row(list.rows()),
        relations,
        members,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::defaults;
    use crate::models::feature_row::FeatureRow;
    use crate::models::ion_type::IonType;
    use crate::models::tolerance::MzTolerance;

    #[test]
    fn test_report_of_two_row_network() {
        let mut list = FeatureList::from_rows([
            FeatureRow::new(1, 300.1000, 5.0, 1e5),
            FeatureRow::new(2, 322.0819, 5.0, 5e4),
        ])
        .unwrap();
        let (a, _) = list
            .add_adduct_identity_to_row(
                MzTolerance::Absolute(0.001),
                RowId(1),
                IonType::new(defaults::h()),
                RowId(2),
                IonType::new(defaults::na()),
            )
            .unwrap();
        let net = list.identity(a).network().unwrap();
        let reports = build_reports(&mut list, &[net]);
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.size, 2);
        assert_eq!(report.most_intense_row, Some(RowId(1)));
        assert_eq!(report.members[0].ion, "[M+H]+");
        assert_eq!(report.members[1].partners, vec![RowId(1)]);
        assert_eq!(report.members[0].score, 2);

        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["members"][1]["ion"], "[M+Na]+");
        assert_eq!(json["height_sum"], 1.5e5);
    }
}
