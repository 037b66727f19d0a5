use ionnet::models::modification::Polarity;
use ionnet::models::tolerance::RtTolerance;
use ionnet::networking::{
    CheckMode,
    IonNetworkingParameters,
    LibraryConfig,
    NetworkSorter,
};
use ionnet::{
    IonModification,
    MzTolerance,
    Tolerance,
};
use serde::{
    Deserialize,
    Serialize,
};
use tracing::warn;

use crate::error::CliError;

/// Settings of one `run`.
///
/// `adducts` and `modifications` are tokens such as `"Na"`, `"-H"` or
/// `"H2O"`. Leaving them out uses the built-in tables of the polarity.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IonNetworkingConfig {
    pub mz_tolerance: MzTolerance,
    #[serde(default)]
    pub rt_tolerance: RtTolerance,
    #[serde(default)]
    pub min_height: f64,
    #[serde(default)]
    pub check_mode: CheckMode,
    #[serde(default)]
    pub polarity: Polarity,
    #[serde(default = "default_max_molecules")]
    pub max_molecules: u32,
    #[serde(default = "default_max_charge")]
    pub max_charge: i32,
    #[serde(default)]
    pub adducts: Option<Vec<String>>,
    #[serde(default)]
    pub modifications: Option<Vec<String>>,
    /// Build networks separately per correlation group.
    #[serde(default)]
    pub use_grouping: bool,
    /// Split networks spanning more than one correlation group.
    #[serde(default)]
    pub split_by_groups: bool,
    #[serde(default = "default_min_network_size")]
    pub min_network_size: usize,
    /// Only report networks holding the best identity of all their rows.
    #[serde(default = "default_true")]
    pub only_best: bool,
    /// Relate networks whose neutral masses differ by a modification.
    #[serde(default = "default_true")]
    pub find_relations: bool,
    #[serde(default)]
    pub sort_by: NetworkSorter,
}

fn default_max_molecules() -> u32 {
    3
}

fn default_max_charge() -> i32 {
    2
}

fn default_min_network_size() -> usize {
    2
}

fn default_true() -> bool {
    true
}

impl Default for IonNetworkingConfig {
    fn default() -> Self {
        Self {
            mz_tolerance: MzTolerance::default(),
            rt_tolerance: RtTolerance::Minutes(0.1),
            min_height: 0.0,
            check_mode: CheckMode::All,
            polarity: Polarity::Positive,
            max_molecules: default_max_molecules(),
            max_charge: default_max_charge(),
            adducts: None,
            modifications: None,
            use_grouping: false,
            split_by_groups: false,
            min_network_size: default_min_network_size(),
            only_best: true,
            find_relations: true,
            sort_by: NetworkSorter::default(),
        }
    }
}

fn parse_tokens(tokens: &[String]) -> Vec<IonModification> {
    tokens
        .iter()
        .map(|t| {
            let parsed = IonModification::parse_from_string(t.trim());
            if parsed.mass() == 0.0 && parsed.charge() == 0 {
                warn!("Could not resolve modification token '{}'", t);
            }
            parsed
        })
        .collect()
}

impl IonNetworkingConfig {
    pub fn validate(&self) -> Result<(), CliError> {
        if self.max_molecules == 0 {
            return Err(CliError::Config("max_molecules must be at least 1".into()));
        }
        if self.max_charge < 1 {
            return Err(CliError::Config("max_charge must be at least 1".into()));
        }
        if self.min_height < 0.0 {
            return Err(CliError::Config("min_height must not be negative".into()));
        }
        if self.adducts.as_ref().is_some_and(|a| a.is_empty()) {
            return Err(CliError::Config(
                "adducts is empty, leave it out to use the built-in table".into(),
            ));
        }
        Ok(())
    }

    pub fn library_config(&self) -> LibraryConfig {
        let mut config = LibraryConfig::with_defaults(self.polarity);
        config.max_molecules = self.max_molecules;
        config.max_charge = self.max_charge;
        if let Some(adducts) = &self.adducts {
            config.adducts = parse_tokens(adducts);
        }
        if let Some(modifications) = &self.modifications {
            config.modifications = parse_tokens(modifications);
        }
        config
    }

    pub fn parameters(&self) -> IonNetworkingParameters {
        IonNetworkingParameters {
            tolerance: Tolerance {
                ms: self.mz_tolerance,
                rt: self.rt_tolerance,
            },
            min_height: self.min_height,
            check_mode: self.check_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ionnet::models::defaults;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: IonNetworkingConfig =
            serde_json::from_str(r#"{"mz_tolerance": {"ppm": 10.0}}"#).unwrap();
        assert_eq!(config.max_molecules, 3);
        assert_eq!(config.min_network_size, 2);
        assert!(config.only_best);
        assert!(matches!(config.rt_tolerance, RtTolerance::Unrestricted));
        let library = config.library_config();
        assert_eq!(library.adducts, defaults::default_adducts_positive());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tokens_are_parsed() {
        let config = IonNetworkingConfig {
            adducts: Some(vec!["H".into(), "Na".into()]),
            modifications: Some(vec!["H2O".into()]),
            ..Default::default()
        };
        let library = config.library_config();
        assert_eq!(library.adducts, vec![defaults::h(), defaults::na()]);
        assert_eq!(library.modifications, vec![defaults::h2o()]);
    }

    #[test]
    fn test_validation() {
        let mut config = IonNetworkingConfig::default();
        config.max_molecules = 0;
        assert!(config.validate().is_err());

        let config = IonNetworkingConfig {
            adducts: Some(vec![]),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
