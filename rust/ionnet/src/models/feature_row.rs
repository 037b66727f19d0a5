use std::fmt::Display;

use serde::{
    Deserialize,
    Serialize,
};

use crate::models::identity::IdentityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub u32);

impl Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for RowId {
    fn from(value: u32) -> Self {
        RowId(value)
    }
}

/// One aligned chromatographic feature: averaged m/z and RT, the height of
/// its best feature, an optional correlation group and the ion identities
/// attached to it (best first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRow {
    pub id: RowId,
    #[serde(rename = "mz")]
    pub average_mz: f64,
    #[serde(rename = "rt")]
    pub average_rt: f32,
    #[serde(default)]
    pub height: f64,
    #[serde(default, rename = "group")]
    pub group_id: Option<u32>,
    #[serde(skip)]
    identities: Vec<IdentityId>,
}

impl FeatureRow {
    pub fn new(id: u32, average_mz: f64, average_rt: f32, height: f64) -> Self {
        Self {
            id: RowId(id),
            average_mz,
            average_rt,
            height,
            group_id: None,
            identities: Vec::new(),
        }
    }

    pub fn with_group(mut self, group_id: u32) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// Identities, preferred first.
    pub fn identities(&self) -> &[IdentityId] {
        &self.identities
    }

    pub fn has_ion_identity(&self) -> bool {
        !self.identities.is_empty()
    }

    pub fn best_identity(&self) -> Option<IdentityId> {
        self.identities.first().copied()
    }

    pub(crate) fn add_identity(&mut self, identity: IdentityId, preferred: bool) {
        self.identities.retain(|x| *x != identity);
        if preferred {
            self.identities.insert(0, identity);
        } else {
            self.identities.push(identity);
        }
    }

    pub(crate) fn remove_identity(&mut self, identity: IdentityId) {
        self.identities.retain(|x| *x != identity);
    }

    pub(crate) fn identities_mut(&mut self) -> &mut Vec<IdentityId> {
        &mut self.identities
    }
}
