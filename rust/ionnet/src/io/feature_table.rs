use std::path::Path;

use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    info,
};

use crate::errors::{
    InputError,
    IonNetError,
};
use crate::models::feature_list::FeatureList;
use crate::models::feature_row::FeatureRow;

/// Aligned feature rows as read from JSON.
///
/// Either `{"rows": [...]}` or a bare array of rows is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FeatureTable {
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn from_json_str(content: &str) -> Result<Self, InputError> {
        match serde_json::from_str::<FeatureTable>(content) {
            Ok(table) => Ok(table),
            Err(e) => {
                debug!("Not a wrapped feature table ({}), trying a bare row array", e);
                let rows: Vec<FeatureRow> = serde_json::from_str(content).map_err(|source| {
                    InputError::FeatureTableParsingError {
                        source,
                        context: "expected {\"rows\": [...]} or an array of rows",
                    }
                })?;
                Ok(FeatureTable { rows })
            }
        }
    }

    pub fn into_feature_list(self) -> Result<FeatureList, IonNetError> {
        Ok(FeatureList::from_rows(self.rows)?)
    }

    /// A small table used for config templates.
    pub fn template() -> Self {
        FeatureTable {
            rows: vec![
                FeatureRow::new(1, 300.1000, 5.02, 1.2e5).with_group(1),
                FeatureRow::new(2, 322.0819, 5.03, 4.5e4).with_group(1),
                FeatureRow::new(3, 282.0894, 5.02, 2.0e4).with_group(1),
            ],
        }
    }
}

/// Reads a JSON feature table into a fresh [`FeatureList`].
pub fn read_feature_table(path: impl AsRef<Path>) -> Result<FeatureList, IonNetError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| InputError::FileReadingError {
        source,
        path: path.to_path_buf(),
    })?;
    let table = FeatureTable::from_json_str(&content)?;
    info!("Read {} feature rows from {}", table.rows.len(), path.display());
    table.into_feature_list()
}
