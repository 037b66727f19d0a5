//! Built-in adducts, in-source modifications and isotopes.

use std::sync::LazyLock;

use crate::chemistry::constants::{
    MASS_C13_SHIFT,
    MASS_ELECTRON,
    MASS_PROTON,
};
use crate::models::modification::{
    IonModification,
    ModificationKind,
};
use ModificationKind::{
    Adduct,
    Cluster,
    Isotope,
    NeutralLoss,
};

fn single(
    kind: ModificationKind,
    name: &str,
    formula: Option<&str>,
    mass: f64,
    charge: i32,
) -> IonModification {
    IonModification::new(kind, name, formula, mass, charge)
}

// Adducts
pub fn m_minus() -> IonModification {
    single(Adduct, "e", None, MASS_ELECTRON, -1)
}

/// Already charged molecule in negative mode (no electron mass).
pub fn m_minus_already_charged() -> IonModification {
    single(Adduct, "e", None, 0.0, -1)
}

pub fn h_neg() -> IonModification {
    single(Adduct, "H", Some("H"), -MASS_PROTON, -1)
}

pub fn m_plus() -> IonModification {
    single(Adduct, "e", None, -MASS_ELECTRON, 1)
}

pub fn m_plus_already_charged() -> IonModification {
    single(Adduct, "e", None, 0.0, 1)
}

pub fn h() -> IonModification {
    single(Adduct, "H", Some("H"), MASS_PROTON, 1)
}

pub fn na() -> IonModification {
    single(Adduct, "Na", Some("Na"), 22.989218, 1)
}

pub fn nh4() -> IonModification {
    single(Adduct, "NH4", Some("NH4"), 18.033823, 1)
}

pub fn k() -> IonModification {
    single(Adduct, "K", Some("K"), 38.963158, 1)
}

pub fn fe() -> IonModification {
    single(Adduct, "Fe", Some("Fe"), 55.933840, 2)
}

pub fn ca() -> IonModification {
    single(Adduct, "Ca", Some("Ca"), 39.961493820, 2)
}

pub fn mg() -> IonModification {
    single(Adduct, "Mg", Some("Mg"), 47.96953482, 2)
}

pub fn cl() -> IonModification {
    single(Adduct, "Cl", Some("Cl"), 34.969401, -1)
}

pub fn br() -> IonModification {
    single(Adduct, "Br", Some("Br"), 78.918886, -1)
}

/// Formate.
pub fn fa() -> IonModification {
    single(Adduct, "FA", Some("HCO2"), 44.99820285, -1)
}

// Combined adducts
pub fn h2_plus() -> IonModification {
    IonModification::create(&[h(), h()])
}

pub fn m2_plus() -> IonModification {
    IonModification::create(&[m_plus(), m_plus()])
}

pub fn na_h() -> IonModification {
    IonModification::create(&[na(), h()])
}

pub fn k_h() -> IonModification {
    IonModification::create(&[k(), h()])
}

pub fn nh4_h() -> IonModification {
    IonModification::create(&[nh4(), h()])
}

pub fn hneg_na2() -> IonModification {
    IonModification::create(&[na(), na(), h_neg()])
}

pub fn hneg_ca() -> IonModification {
    IonModification::create(&[ca(), h_neg()])
}

pub fn hneg_fe() -> IonModification {
    IonModification::create(&[fe(), h_neg()])
}

pub fn hneg_mg() -> IonModification {
    IonModification::create(&[mg(), h_neg()])
}

/// `[M+Na-2H]-`
pub fn na_2h() -> IonModification {
    IonModification::create(&[na(), h_neg(), h_neg()])
}

// Neutral losses
pub fn h2() -> IonModification {
    single(NeutralLoss, "H2", Some("H2"), -2.015650, 0)
}

pub fn c2h4() -> IonModification {
    single(NeutralLoss, "C2H4", Some("C2H4"), -28.031301, 0)
}

pub fn h2o() -> IonModification {
    single(NeutralLoss, "H2O", Some("H2O"), -18.010565, 0)
}

/// `n` water losses combined.
pub fn h2o_times(n: usize) -> IonModification {
    IonModification::create(&vec![h2o(); n.max(1)])
}

pub fn nh3() -> IonModification {
    single(NeutralLoss, "NH3", Some("NH3"), -17.026549, 0)
}

pub fn co() -> IonModification {
    single(NeutralLoss, "CO", Some("CO"), -27.994915, 0)
}

pub fn co2() -> IonModification {
    single(NeutralLoss, "CO2", Some("CO2"), -43.989829, 0)
}

// Clusters
pub fn meoh() -> IonModification {
    single(Cluster, "MeOH", Some("CH3OH"), 32.026215, 0)
}

pub fn hfa() -> IonModification {
    single(Cluster, "HFA", Some("CHOOH"), 46.005479, 0)
}

pub fn hac() -> IonModification {
    single(Cluster, "HAc", Some("CH3COOH"), 60.021129, 0)
}

pub fn acn() -> IonModification {
    single(Cluster, "ACN", Some("CH3CN"), 41.026549, 0)
}

pub fn o() -> IonModification {
    single(Cluster, "O", Some("O"), 15.99491462, 0)
}

pub fn isoprop() -> IonModification {
    single(Cluster, "IsoProp", Some("C3H8O"), 60.058064, 0)
}

// Isotopes
pub fn c13() -> IonModification {
    single(Isotope, "(13C)", None, MASS_C13_SHIFT, 0)
}

static POSITIVE: LazyLock<Vec<IonModification>> = LazyLock::new(|| {
    vec![
        h_neg(),
        m_plus(),
        h(),
        na(),
        k(),
        nh4(),
        m2_plus(),
        h2_plus(),
        ca(),
        fe(),
        mg(),
        na_h(),
        nh4_h(),
        k_h(),
        hneg_na2(),
        hneg_ca(),
        hneg_fe(),
        m_plus_already_charged(),
        hneg_mg(),
    ]
});

static NEGATIVE: LazyLock<Vec<IonModification>> = LazyLock::new(|| {
    vec![
        m_minus(),
        h_neg(),
        na_2h(),
        na(),
        cl(),
        br(),
        fa(),
        m_minus_already_charged(),
    ]
});

static MODIFICATIONS: LazyLock<Vec<IonModification>> = LazyLock::new(|| {
    vec![
        h2o(),
        h2o_times(2),
        h2o_times(3),
        h2o_times(4),
        h2o_times(5),
        nh3(),
        o(),
        co(),
        co2(),
        c2h4(),
        hfa(),
        hac(),
        meoh(),
        acn(),
        isoprop(),
    ]
});

static ISOTOPES: LazyLock<Vec<IonModification>> = LazyLock::new(|| vec![c13()]);

pub fn default_adducts_positive() -> Vec<IonModification> {
    POSITIVE.clone()
}

pub fn default_adducts_negative() -> Vec<IonModification> {
    NEGATIVE.clone()
}

pub fn default_modifications() -> Vec<IonModification> {
    MODIFICATIONS.clone()
}

/// Reads the modification table truncated to the isotope table length,
/// so this returns `[H2O]` and not the 13C isotope. Use [`isotopes`] for
/// the actual isotope table.
pub fn default_isotopes() -> Vec<IonModification> {
    MODIFICATIONS[..ISOTOPES.len()].to_vec()
}

pub fn isotopes() -> Vec<IonModification> {
    ISOTOPES.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sizes() {
        assert_eq!(default_adducts_positive().len(), 19);
        assert_eq!(default_adducts_negative().len(), 8);
        assert_eq!(default_modifications().len(), 15);
    }

    #[test]
    fn test_default_isotopes_reads_modification_table() {
        assert_eq!(default_isotopes(), vec![h2o()]);
        assert_eq!(isotopes(), vec![c13()]);
    }

    #[test]
    fn test_combined_names() {
        assert_eq!(h2_plus().parsed_name(), "+2H");
        assert_eq!(h2_plus().to_string(), "[M+2H]2+");
        assert_eq!(na_2h().parsed_name(), "-2H+Na");
        assert_eq!(na_2h().charge(), -1);
        assert_eq!(h2o_times(3).parsed_name(), "-3H2O");
        assert_eq!(hneg_ca().to_string(), "[M+Ca-H]+");
    }

    #[test]
    fn test_charges_match_polarity_tables() {
        assert!(default_adducts_negative().iter().all(|m| m.charge() < 0 || m.charge() == 1));
        assert!(default_modifications().iter().all(|m| m.charge() == 0));
    }
}
