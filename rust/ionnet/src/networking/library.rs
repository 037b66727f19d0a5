use tracing::debug;

use crate::models::defaults;
use crate::models::ion_type::IonType;
use crate::models::modification::{
    IonModification,
    Polarity,
};

/// What goes into an [`IonNetworkLibrary`].
#[derive(Debug, Clone)]
pub struct LibraryConfig {
    pub polarity: Polarity,
    pub max_molecules: u32,
    pub max_charge: i32,
    pub adducts: Vec<IonModification>,
    pub modifications: Vec<IonModification>,
}

impl LibraryConfig {
    /// Built-in adducts of the polarity and all built-in modifications.
    pub fn with_defaults(polarity: Polarity) -> Self {
        let adducts = match polarity {
            Polarity::Negative => defaults::default_adducts_negative(),
            Polarity::Positive => defaults::default_adducts_positive(),
            Polarity::Neutral => {
                let mut all = defaults::default_adducts_positive();
                all.extend(defaults::default_adducts_negative());
                all
            }
        };
        Self {
            polarity,
            max_molecules: 3,
            max_charge: 2,
            adducts,
            modifications: defaults::default_modifications(),
        }
    }

    fn accepts(&self, charge: i32) -> bool {
        if charge == 0 || charge.abs() > self.max_charge {
            return false;
        }
        match self.polarity {
            Polarity::Positive => charge > 0,
            Polarity::Negative => charge < 0,
            Polarity::Neutral => true,
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self::with_defaults(Polarity::Positive)
    }
}

/// All ion types the adduct search tries.
///
/// Adduct types are every accepted adduct with 1 to `max_molecules`
/// molecules and every accepted adduct with each modification. Modification
/// types are `[M+X+?]` for every modification and every single charge of the
/// polarity. Ion types with the same mass delta, charge and molecules as an
/// earlier one are skipped.
///
/// ```
/// use ionnet::models::modification::Polarity;
/// use ionnet::networking::library::{IonNetworkLibrary, LibraryConfig};
///
/// let library = IonNetworkLibrary::new(LibraryConfig::with_defaults(Polarity::Positive));
/// assert!(library.adduct_types().iter().any(|t| t.to_string() == "[2M+Na]+"));
/// assert!(library.modification_types().iter().any(|t| t.to_string() == "[M-H2O+?]+"));
/// ```
#[derive(Debug, Clone)]
pub struct IonNetworkLibrary {
    config: LibraryConfig,
    adduct_types: Vec<IonType>,
    modification_types: Vec<IonType>,
}

fn push_unique(types: &mut Vec<IonType>, candidate: IonType) -> bool {
    if types.iter().any(|t| t.same_math_difference(&candidate)) {
        return false;
    }
    types.push(candidate);
    true
}

impl IonNetworkLibrary {
    pub fn new(config: LibraryConfig) -> Self {
        let adducts: Vec<&IonModification> = config
            .adducts
            .iter()
            .filter(|a| config.accepts(a.charge()))
            .collect();

        let mut adduct_types = Vec::new();
        let mut skipped = 0usize;
        for adduct in adducts.iter() {
            for molecules in 1..=config.max_molecules.max(1) {
                let candidate = IonType::with_molecules(molecules, (*adduct).clone(), None);
                skipped += !push_unique(&mut adduct_types, candidate) as usize;
            }
        }
        for adduct in adducts.iter() {
            for modification in config.modifications.iter() {
                let candidate = IonType::with_modification((*adduct).clone(), modification.clone());
                skipped += !push_unique(&mut adduct_types, candidate) as usize;
            }
        }

        let charges: &[i32] = match config.polarity {
            Polarity::Positive => &[1],
            Polarity::Negative => &[-1],
            Polarity::Neutral => &[1, -1],
        };
        let mut modification_types = Vec::new();
        for charge in charges {
            let parent = IonType::undefined(*charge);
            for modification in config.modifications.iter() {
                let candidate = parent.create_modified(std::slice::from_ref(modification));
                skipped += !push_unique(&mut modification_types, candidate) as usize;
            }
        }

        debug!(
            "Ion library: {} adduct types, {} modification types, {} duplicates skipped",
            adduct_types.len(),
            modification_types.len(),
            skipped
        );
        Self {
            config,
            adduct_types,
            modification_types,
        }
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn adduct_types(&self) -> &[IonType] {
        &self.adduct_types
    }

    /// `[M+X+?]` types, matched against `[M+?]` of the same charge.
    pub fn modification_types(&self) -> &[IonType] {
        &self.modification_types
    }

    pub fn len(&self) -> usize {
        self.adduct_types.len() + self.modification_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_library() {
        let mut config = LibraryConfig::with_defaults(Polarity::Positive);
        config.max_molecules = 2;
        let library = IonNetworkLibrary::new(config);
        assert!(library.adduct_types().iter().all(|t| t.charge() > 0));
        assert!(library.adduct_types().iter().all(|t| t.abs_charge() <= 2));
        assert!(library.adduct_types().iter().all(|t| t.molecules() <= 2));
        // the positive table lists -H, which is negatively charged
        assert!(!library.adduct_types().iter().any(|t| t.to_string() == "[M-H]-"));
        assert!(library.adduct_types().iter().any(|t| t.to_string() == "[M-H2O+H]+"));
        assert_eq!(
            library.modification_types().len(),
            defaults::default_modifications().len()
        );
    }

    #[test]
    fn test_duplicates_are_skipped() {
        let config = LibraryConfig {
            polarity: Polarity::Positive,
            max_molecules: 1,
            max_charge: 1,
            adducts: vec![defaults::h(), defaults::h(), defaults::m_plus()],
            modifications: vec![],
        };
        let library = IonNetworkLibrary::new(config);
        assert_eq!(library.adduct_types().len(), 2);
        assert!(library.modification_types().is_empty());
    }

    #[test]
    fn test_neutral_polarity_has_both_signs() {
        let mut config = LibraryConfig::with_defaults(Polarity::Neutral);
        config.max_molecules = 1;
        config.modifications = vec![defaults::h2o()];
        let library = IonNetworkLibrary::new(config);
        assert!(library.adduct_types().iter().any(|t| t.charge() < 0));
        assert!(library.adduct_types().iter().any(|t| t.charge() > 0));
        assert_eq!(library.modification_types().len(), 2);
    }
}
