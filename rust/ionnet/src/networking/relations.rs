use tracing::debug;

use crate::models::feature_list::FeatureList;
use crate::models::modification::IonModification;
use crate::models::network::{
    NetworkId,
    NetworkRelation,
};
use crate::models::tolerance::MzToleranceCheck;

/// Records a relation between every two networks whose neutral masses differ
/// by the mass of one of `modifications`.
///
/// When `a + modification = b`, `a` relates to `b` by the modification and
/// `b` to `a` by its opposite. Returns the number of related pairs.
pub fn find_modification_relations(
    list: &mut FeatureList,
    nets: &[NetworkId],
    modifications: &[IonModification],
    tolerance: &impl MzToleranceCheck,
) -> usize {
    let masses: Vec<(NetworkId, f64)> = nets
        .iter()
        .filter_map(|n| list.neutral_mass(*n).map(|m| (*n, m)))
        .collect();

    let mut found = Vec::new();
    for (i, (a, mass_a)) in masses.iter().enumerate() {
        for (b, mass_b) in masses.iter().skip(i + 1) {
            for modification in modifications {
                let delta = modification.mass();
                if tolerance.check_within_tolerance(mass_a + delta, *mass_b) {
                    found.push((*a, *b, modification.clone()));
                } else if tolerance.check_within_tolerance(mass_b + delta, *mass_a) {
                    found.push((*b, *a, modification.clone()));
                }
            }
        }
    }

    let mut pairs = 0;
    for (from, to, modification) in found {
        let opposite = modification.create_opposite();
        if let Some(n) = list.network_mut(from) {
            n.add_relation(to, NetworkRelation::Modification(modification));
        }
        if let Some(n) = list.network_mut(to) {
            n.add_relation(from, NetworkRelation::Modification(opposite));
        }
        pairs += 1;
    }
    debug!("Related {} network pairs by modification", pairs);
    pairs
}
