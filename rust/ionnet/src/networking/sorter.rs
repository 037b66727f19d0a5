use serde::{
    Deserialize,
    Serialize,
};

use crate::models::feature_list::FeatureList;
use crate::models::network::NetworkId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortingProperty {
    #[default]
    Rt,
    Mz,
    NeutralMass,
    Size,
    Height,
    /// Network number.
    Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortingDirection {
    #[default]
    Ascending,
    Descending,
}

/// Orders networks by one property.
///
/// Networks missing the property (no members) sort last in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NetworkSorter {
    pub property: SortingProperty,
    #[serde(default)]
    pub direction: SortingDirection,
}

impl NetworkSorter {
    pub fn new(property: SortingProperty, direction: SortingDirection) -> Self {
        Self {
            property,
            direction,
        }
    }

    fn key(&self, list: &mut FeatureList, net: NetworkId) -> Option<f64> {
        list.calc_neutral_mass(net);
        let network = list.network(net)?;
        match self.property {
            SortingProperty::Rt => network.avg_rt(),
            SortingProperty::Mz => network.avg_mz(list.rows()),
            SortingProperty::NeutralMass => network.neutral_mass_cached(),
            SortingProperty::Size => Some(network.len() as f64),
            SortingProperty::Height => Some(network.height_sum()),
            SortingProperty::Id => Some(network.number() as f64),
        }
    }

    /// Stable sort of `nets` in place.
    pub fn sort(&self, list: &mut FeatureList, nets: &mut [NetworkId]) {
        let mut keyed: Vec<(Option<f64>, NetworkId)> =
            nets.iter().map(|n| (self.key(list, *n), *n)).collect();
        keyed.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some(a), Some(b)) => match self.direction {
                SortingDirection::Ascending => a.total_cmp(b),
                SortingDirection::Descending => b.total_cmp(a),
            },
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        for (slot, (_, net)) in nets.iter_mut().zip(keyed) {
            *slot = net;
        }
    }
}
