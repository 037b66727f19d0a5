use std::cmp::Ordering;
use std::fmt::Display;
use std::hash::{
    Hash,
    Hasher,
};

use crate::errors::ModelError;
use crate::models::modification::{
    IonModification,
    ModificationKind,
};

/// `[nM + modification + adduct]z`: how a neutral molecule shows up as an ion.
///
/// The mass delta is adduct plus modification and is not multiplied by the
/// number of molecules; the charge is the adduct charge.
///
/// ```
/// use ionnet::models::defaults;
/// use ionnet::models::ion_type::IonType;
///
/// let ion = IonType::new(defaults::h());
/// assert_eq!(ion.to_string(), "[M+H]+");
/// let neutral = ion.mass(300.1).unwrap();
/// assert!((neutral - 299.092724).abs() < 1e-6);
/// assert!((ion.mz(neutral).unwrap() - 300.1).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct IonType {
    adduct: IonModification,
    modification: Option<IonModification>,
    molecules: u32,
    mass: f64,
    charge: i32,
    name: String,
}

impl IonType {
    pub fn new(adduct: IonModification) -> Self {
        Self::with_molecules(1, adduct, None)
    }

    pub fn with_modification(adduct: IonModification, modification: IonModification) -> Self {
        Self::with_molecules(1, adduct, Some(modification))
    }

    /// Molecule counts below 1 are clamped to 1.
    pub fn with_molecules(
        molecules: u32,
        adduct: IonModification,
        modification: Option<IonModification>,
    ) -> Self {
        let mass = adduct.mass() + modification.as_ref().map_or(0.0, |m| m.mass());
        let charge = adduct.charge();
        let name = format!(
            "{}{}",
            modification.as_ref().map_or("", |m| m.parsed_name()),
            adduct.parsed_name()
        );
        Self {
            adduct,
            modification,
            molecules: molecules.max(1),
            mass,
            charge,
            name,
        }
    }

    /// `[M+?]` with the given charge and no modification.
    pub fn undefined(charge: i32) -> Self {
        Self::new(IonModification::undefined_for_charge(charge))
    }

    pub fn adduct(&self) -> &IonModification {
        &self.adduct
    }

    pub fn modification(&self) -> Option<&IonModification> {
        self.modification.as_ref()
    }

    pub fn molecules(&self) -> u32 {
        self.molecules
    }

    /// Mass delta of adduct and modification.
    pub fn mass_difference(&self) -> f64 {
        self.mass
    }

    pub fn charge(&self) -> i32 {
        self.charge
    }

    pub fn abs_charge(&self) -> i32 {
        self.charge.abs()
    }

    /// Modification and adduct display names, `-H2O+H`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_mods(&self) -> bool {
        self.modification.is_some()
    }

    pub fn mod_count(&self) -> usize {
        self.modification.as_ref().map_or(0, |m| m.mod_count())
    }

    pub fn adduct_count(&self) -> usize {
        self.adduct.mod_count()
    }

    /// Molecules, charge and all adduct and modification members.
    pub fn total_parts_count(&self) -> usize {
        self.molecules as usize + self.abs_charge() as usize + self.mod_count() + self.adduct_count()
    }

    /// Neutral mass: `(mz * |z| - delta) / molecules`.
    pub fn mass(&self, mz: f64) -> Result<f64, ModelError> {
        if self.charge == 0 {
            return Err(ModelError::ZeroCharge {
                ion: self.to_string(),
            });
        }
        Ok((mz * self.abs_charge() as f64 - self.mass) / self.molecules as f64)
    }

    /// m/z: `(neutral * molecules + delta) / |z|`.
    pub fn mz(&self, neutral_mass: f64) -> Result<f64, ModelError> {
        if self.charge == 0 {
            return Err(ModelError::ZeroCharge {
                ion: self.to_string(),
            });
        }
        Ok((neutral_mass * self.molecules as f64 + self.mass) / self.abs_charge() as f64)
    }

    pub fn is_undefined_adduct(&self) -> bool {
        self.adduct.kind() == ModificationKind::UndefinedAdduct
    }

    /// Undefined adduct and no modification: `[M+?]`.
    pub fn is_undefined_adduct_parent(&self) -> bool {
        self.is_undefined_adduct() && !self.has_mods()
    }

    /// Undefined adduct with a modification: `[M-H2O+?]`.
    pub fn is_modified_undefined_adduct(&self) -> bool {
        self.is_undefined_adduct() && self.has_mods()
    }

    /// Same adduct, molecules and charge with the modification of `self`.
    pub fn with_adduct_of(&self, other: &IonType) -> Self {
        Self::with_molecules(other.molecules, other.adduct.clone(), self.modification.clone())
    }

    pub fn with_new_molecules(&self, molecules: u32) -> Self {
        Self::with_molecules(molecules, self.adduct.clone(), self.modification.clone())
    }

    /// Adds `new_mods` to the existing modification.
    pub fn create_modified(&self, new_mods: &[IonModification]) -> Self {
        let mut all: Vec<IonModification> = new_mods.to_vec();
        if let Some(m) = &self.modification {
            all.extend(
                m.modifications()
                    .iter()
                    .cloned()
                    .map(IonModification::Single),
            );
        }
        let modification = if all.is_empty() {
            None
        } else {
            Some(IonModification::create(&all))
        };
        Self::with_molecules(self.molecules, self.adduct.clone(), modification)
    }

    /// Only the modification, on `[M+?]` with this charge.
    pub fn modified_only(&self) -> Self {
        Self::with_molecules(
            1,
            IonModification::undefined_for_charge(self.charge),
            self.modification.clone(),
        )
    }

    /// True when `self` is `parent` with additional modifications.
    ///
    /// ```
    /// use ionnet::models::defaults;
    /// use ionnet::models::ion_type::IonType;
    ///
    /// let parent = IonType::new(defaults::h());
    /// let water_loss = IonType::with_modification(defaults::h(), defaults::h2o());
    /// assert!(water_loss.is_modification_of(&parent));
    /// assert!(!parent.is_modification_of(&water_loss));
    /// ```
    pub fn is_modification_of(&self, parent: &IonType) -> bool {
        let Some(modification) = &self.modification else {
            return false;
        };
        if !(parent.mod_count() < self.mod_count()
            && self.mass != parent.mass
            && self.adduct == parent.adduct
            && self.molecules == parent.molecules
            && self.charge == parent.charge)
        {
            return false;
        }
        match &parent.modification {
            None => true,
            Some(parent_mod) => parent_mod.is_subset_of(modification),
        }
    }

    /// Removes the modification members of `other`, keeping everything else.
    pub fn subtract_mods(&self, other: &IonType) -> Self {
        match (&self.modification, &other.modification) {
            (Some(mine), Some(theirs)) => {
                Self::with_molecules(self.molecules, self.adduct.clone(), mine.remove(theirs))
            }
            _ => self.clone(),
        }
    }

    pub fn mods_equal(&self, other: &IonType) -> bool {
        self.modification == other.modification
    }

    /// Both carry a modification and share at least one member.
    pub fn has_modification_overlap(&self, other: &IonType) -> bool {
        match (&self.modification, &other.modification) {
            (Some(a), Some(b)) => !a.unique_adducts_to(b),
            _ => false,
        }
    }

    /// Undefined adducts never overlap.
    pub fn has_adduct_overlap(&self, other: &IonType) -> bool {
        if self.is_undefined_adduct() || other.is_undefined_adduct() {
            return false;
        }
        !self.adduct.unique_adducts_to(&other.adduct)
    }

    /// Same mass delta, charge and molecules.
    pub fn same_math_difference(&self, other: &IonType) -> bool {
        self.mass == other.mass && self.charge == other.charge && self.molecules == other.molecules
    }
}

impl PartialEq for IonType {
    fn eq(&self, other: &Self) -> bool {
        self.same_math_difference(other)
            && self.adduct == other.adduct
            && self.modification == other.modification
    }
}

impl Eq for IonType {}

impl Hash for IonType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.adduct.hash(state);
        self.modification.hash(state);
        self.charge.hash(state);
        self.molecules.hash(state);
    }
}

impl Ord for IonType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.mass.total_cmp(&other.mass))
            .then_with(|| self.molecules.cmp(&other.molecules))
            .then_with(|| self.charge.cmp(&other.charge))
            .then_with(|| self.adduct.cmp(&other.adduct))
            .then_with(|| self.modification.cmp(&other.modification))
    }
}

impl PartialOrd for IonType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for IonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let molecules = if self.molecules > 1 {
            self.molecules.to_string()
        } else {
            String::new()
        };
        let sign = if self.charge < 0 { "-" } else { "+" };
        let z = match self.abs_charge() {
            0 => String::new(),
            1 => sign.to_string(),
            n => format!("{}{}", n, sign),
        };
        write!(f, "[{}M{}]{}", molecules, self.name, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::defaults::*;

    #[test]
    fn test_mz_round_trip() {
        for ion in [
            IonType::new(h()),
            IonType::new(na()),
            IonType::new(h2_plus()),
            IonType::with_molecules(2, h(), Some(h2o())),
            IonType::new(h_neg()),
        ] {
            let neutral = 412.2;
            let mz = ion.mz(neutral).unwrap();
            assert!((ion.mass(mz).unwrap() - neutral).abs() < 1e-9, "{}", ion);
        }
    }

    #[test]
    fn test_zero_charge_is_an_error() {
        let neutral = IonType::new(h2o());
        assert!(matches!(
            neutral.mass(100.0),
            Err(ModelError::ZeroCharge { .. })
        ));
        assert!(neutral.mz(100.0).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(IonType::new(na()).to_string(), "[M+Na]+");
        assert_eq!(IonType::new(h2_plus()).to_string(), "[M+2H]2+");
        assert_eq!(
            IonType::with_molecules(2, h(), Some(h2o())).to_string(),
            "[2M-H2O+H]+"
        );
        assert_eq!(IonType::new(h_neg()).to_string(), "[M-H]-");
        assert_eq!(IonType::undefined(1).to_string(), "[M+?]+");
    }

    #[test]
    fn test_multimer_mass() {
        let dimer = IonType::with_molecules(2, h(), None);
        let mz = dimer.mz(299.092724).unwrap();
        assert!((mz - (2.0 * 299.092724 + 1.007276)).abs() < 1e-9);
    }

    #[test]
    fn test_is_modification_of() {
        let parent = IonType::new(h());
        let one = IonType::with_modification(h(), h2o());
        let two = IonType::with_modification(h(), h2o_times(2));
        let other_adduct = IonType::with_modification(na(), h2o());
        assert!(one.is_modification_of(&parent));
        assert!(two.is_modification_of(&one));
        assert!(two.is_modification_of(&parent));
        assert!(!other_adduct.is_modification_of(&parent));
        assert!(!parent.is_modification_of(&parent));
        let nh3_loss = IonType::with_modification(h(), IonModification::create(&[nh3(), h2o()]));
        assert!(nh3_loss.is_modification_of(&one));
        let co_loss = IonType::with_modification(h(), IonModification::create(&[co(), nh3()]));
        assert!(!co_loss.is_modification_of(&one));
    }

    #[test]
    fn test_create_modified_and_subtract() {
        let parent = IonType::new(h());
        let modified = parent.create_modified(&[h2o()]);
        assert_eq!(modified, IonType::with_modification(h(), h2o()));
        let twice = modified.create_modified(&[h2o()]);
        assert_eq!(twice.mod_count(), 2);
        assert_eq!(twice.subtract_mods(&modified), modified);
        assert_eq!(modified.subtract_mods(&modified), parent);
        assert_eq!(parent.subtract_mods(&modified), parent);
    }

    #[test]
    fn test_modified_only_and_overlaps() {
        let modified = IonType::with_modification(na(), h2o());
        let only = modified.modified_only();
        assert!(only.is_modified_undefined_adduct());
        assert_eq!(only.to_string(), "[M-H2O+?]+");

        let a = IonType::with_modification(na(), h2o());
        let b = IonType::with_modification(h(), IonModification::create(&[h2o(), nh3()]));
        assert!(a.has_modification_overlap(&b));
        assert!(!a.has_adduct_overlap(&b));
        assert!(IonType::new(na_h()).has_adduct_overlap(&IonType::new(h())));
        assert!(!IonType::undefined(1).has_adduct_overlap(&IonType::undefined(1)));
    }

    #[test]
    fn test_total_parts_count() {
        let ion = IonType::with_molecules(2, hneg_na2(), Some(h2o()));
        // 2 molecules + charge 1 + 1 modification + 3 adduct members
        assert_eq!(ion.total_parts_count(), 7);
    }

    #[test]
    fn test_undefined_flags() {
        let parent = IonType::undefined(1);
        assert!(parent.is_undefined_adduct_parent());
        assert!(!parent.is_modified_undefined_adduct());
        let modified = parent.create_modified(&[h2o()]);
        assert!(modified.is_modified_undefined_adduct());
    }
}
