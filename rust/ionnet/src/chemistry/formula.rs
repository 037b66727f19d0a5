use std::fmt::Display;
use std::str::FromStr;

use rustyms::MolecularFormula as ElementalFormula;
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error("Empty formula")]
    Empty,
    #[error("Invalid formula '{formula}': {reason}")]
    Invalid { formula: String, reason: String },
}

/// A molecular formula in ProForma notation, such as `C2H4O2` or `Se2`.
///
/// Parsing and element masses come from rustyms. Two formulas are equal
/// when their Hill notations are.
///
/// ```
/// use ionnet::chemistry::MolecularFormula;
///
/// let water: MolecularFormula = "H2O".parse().unwrap();
/// assert!((water.monoisotopic_mass() - 18.010565).abs() < 1e-5);
/// ```
#[derive(Debug, Clone)]
pub struct MolecularFormula {
    hill: String,
    mass: f64,
}

impl MolecularFormula {
    pub fn hill_notation(&self) -> &str {
        &self.hill
    }

    pub fn monoisotopic_mass(&self) -> f64 {
        self.mass
    }
}

impl PartialEq for MolecularFormula {
    fn eq(&self, other: &Self) -> bool {
        self.hill == other.hill
    }
}

impl Eq for MolecularFormula {}

impl FromStr for MolecularFormula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(FormulaError::Empty);
        }
        let parsed =
            ElementalFormula::from_pro_forma(trimmed).map_err(|e| FormulaError::Invalid {
                formula: trimmed.to_string(),
                reason: e.to_string(),
            })?;
        let hill = parsed.hill_notation();
        if hill.is_empty() {
            return Err(FormulaError::Empty);
        }
        Ok(Self {
            hill,
            mass: parsed.monoisotopic_mass().value,
        })
    }
}

impl Display for MolecularFormula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hill)
    }
}

impl Serialize for MolecularFormula {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hill)
    }
}

impl<'de> Deserialize<'de> for MolecularFormula {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let f: MolecularFormula = "C2H4O2".parse().unwrap();
        assert!((f.monoisotopic_mass() - 60.021129).abs() < 1e-5);
    }

    #[test]
    fn test_same_composition_is_equal() {
        let a: MolecularFormula = "H3N".parse().unwrap();
        let b: MolecularFormula = "NH3".parse().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, "H2O".parse::<MolecularFormula>().unwrap());
    }

    #[test]
    fn test_elements_beyond_common_organics() {
        // Se-80 and I-127
        let selenium: MolecularFormula = "Se2".parse().unwrap();
        assert!((selenium.monoisotopic_mass() - 159.833044).abs() < 1e-4);
        let iodide: MolecularFormula = "I".parse().unwrap();
        assert!((iodide.monoisotopic_mass() - 126.904473).abs() < 1e-4);
    }

    #[test]
    fn test_errors() {
        assert_eq!("".parse::<MolecularFormula>(), Err(FormulaError::Empty));
        assert_eq!("  ".parse::<MolecularFormula>(), Err(FormulaError::Empty));
        assert!(matches!(
            "Xy2".parse::<MolecularFormula>(),
            Err(FormulaError::Invalid { .. })
        ));
    }
}
