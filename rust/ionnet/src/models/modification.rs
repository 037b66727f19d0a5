use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::hash::{
    Hash,
    Hasher,
};
use std::str::FromStr;

use serde::{
    Deserialize,
    Serialize,
};

use crate::chemistry::MolecularFormula;
use crate::models::defaults;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModificationKind {
    Adduct,
    UndefinedAdduct,
    NeutralLoss,
    Cluster,
    Isotope,
    Unknown,
    Mixed,
}

impl ModificationKind {
    /// Upper case identifier, as written to XML and data maps.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adduct => "ADDUCT",
            Self::UndefinedAdduct => "UNDEFINED_ADDUCT",
            Self::NeutralLoss => "NEUTRAL_LOSS",
            Self::Cluster => "CLUSTER",
            Self::Isotope => "ISOTOPE",
            Self::Unknown => "UNKNOWN",
            Self::Mixed => "MIXED",
        }
    }
}

impl FromStr for ModificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADDUCT" => Ok(Self::Adduct),
            "UNDEFINED_ADDUCT" => Ok(Self::UndefinedAdduct),
            "NEUTRAL_LOSS" => Ok(Self::NeutralLoss),
            "CLUSTER" => Ok(Self::Cluster),
            "ISOTOPE" => Ok(Self::Isotope),
            "UNKNOWN" => Ok(Self::Unknown),
            "MIXED" => Ok(Self::Mixed),
            other => Err(format!("Unknown modification type: {}", other)),
        }
    }
}

impl Display for ModificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Adduct => "Adduct",
            Self::UndefinedAdduct => "Undefined adduct",
            Self::NeutralLoss => "Neutral loss",
            Self::Cluster => "Cluster",
            Self::Isotope => "Isotope",
            Self::Unknown => "Unknown",
            Self::Mixed => "Mixed",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    #[default]
    Positive,
    Negative,
    Neutral,
}

impl Polarity {
    pub fn from_charge(charge: i32) -> Self {
        match charge.signum() {
            1 => Polarity::Positive,
            -1 => Polarity::Negative,
            _ => Polarity::Neutral,
        }
    }
}

/// Sign token derived from the charge: only single charges carry one.
pub fn charge_sign(charge: i32) -> &'static str {
    match charge {
        -1 => "-",
        1 => "+",
        _ => "",
    }
}

/// One chemical change: an adduct, a neutral loss, a cluster, ...
#[derive(Debug, Clone)]
pub struct SingleModification {
    kind: ModificationKind,
    name: String,
    formula: Option<String>,
    mass: f64,
    charge: i32,
    parsed_name: String,
}

impl SingleModification {
    pub fn new(
        kind: ModificationKind,
        name: impl Into<String>,
        formula: Option<&str>,
        mass: f64,
        charge: i32,
    ) -> Self {
        let name = name.into();
        let parsed_name = if name == "e" {
            String::new()
        } else {
            let sign = if kind == ModificationKind::UndefinedAdduct || mass >= 0.0 {
                "+"
            } else {
                "-"
            };
            format!("{}{}", sign, name)
        };
        Self {
            kind,
            name,
            formula: formula.map(|x| x.to_string()),
            mass,
            charge,
            parsed_name,
        }
    }

    pub fn kind(&self) -> ModificationKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn formula(&self) -> Option<&str> {
        self.formula.as_deref()
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn charge(&self) -> i32 {
        self.charge
    }

    pub fn parsed_name(&self) -> &str {
        &self.parsed_name
    }

    fn opposite(&self) -> Self {
        Self::new(
            self.kind,
            self.name.clone(),
            self.formula.as_deref(),
            -self.mass,
            self.charge,
        )
    }

    fn cmp_name_mass_charge(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.mass.total_cmp(&other.mass))
            .then_with(|| self.charge.cmp(&other.charge))
    }
}

impl PartialEq for SingleModification {
    fn eq(&self, other: &Self) -> bool {
        self.charge == other.charge && self.parsed_name == other.parsed_name && self.mass == other.mass
    }
}

impl Eq for SingleModification {}

/// Several single modifications applied together, e.g. `-H+2Na`.
///
/// Members are kept sorted by name, mass and charge.
#[derive(Debug, Clone)]
pub struct CombinedModification {
    parts: Vec<SingleModification>,
    kind: ModificationKind,
    mass: f64,
    charge: i32,
    parsed_name: String,
}

impl CombinedModification {
    fn new(mut parts: Vec<SingleModification>) -> Self {
        parts.sort_by(|a, b| a.cmp_name_mass_charge(b));
        let mass = parts.iter().map(|x| x.mass).sum();
        let charge = parts.iter().map(|x| x.charge).sum();
        let kind = match parts.first() {
            Some(first) if parts.iter().all(|x| x.kind == first.kind) => first.kind,
            Some(_) => ModificationKind::Mixed,
            None => ModificationKind::Unknown,
        };
        let parsed_name = combined_name(&parts);
        Self {
            parts,
            kind,
            mass,
            charge,
            parsed_name,
        }
    }

    pub fn parts(&self) -> &[SingleModification] {
        &self.parts
    }
}

/// Runs of members with the same signed name collapse into one token,
/// `+2Na` for two sodium adducts. Electrons contribute nothing.
fn combined_name(parts: &[SingleModification]) -> String {
    let mut out = String::new();
    let mut i = 0;
    while i < parts.len() {
        let token = parts[i].parsed_name();
        let mut run = 1;
        while i + run < parts.len() && parts[i + run].parsed_name() == token {
            run += 1;
        }
        if !token.is_empty() {
            let (sign, name) = token.split_at(1);
            out.push_str(sign);
            if run > 1 {
                out.push_str(&run.to_string());
            }
            out.push_str(name);
        }
        i += run;
    }
    out
}

/// A single or combined modification of a neutral molecule.
///
/// ```
/// use ionnet::models::defaults;
/// use ionnet::models::modification::IonModification;
///
/// let na = defaults::na();
/// let h_neg = defaults::h_neg();
/// let combined = IonModification::create(&[na.clone(), na, h_neg]);
/// assert_eq!(combined.parsed_name(), "-H+2Na");
/// assert_eq!(combined.charge(), 1);
/// assert_eq!(combined.to_string(), "[M-H+2Na]+");
/// ```
#[derive(Debug, Clone)]
pub enum IonModification {
    Single(SingleModification),
    Combined(CombinedModification),
}

impl IonModification {
    pub fn new(
        kind: ModificationKind,
        name: impl Into<String>,
        formula: Option<&str>,
        mass: f64,
        charge: i32,
    ) -> Self {
        IonModification::Single(SingleModification::new(kind, name, formula, mass, charge))
    }

    /// Combines all members of `parts` (flattening combined ones).
    ///
    /// A single resulting member is returned as a [`IonModification::Single`].
    pub fn create(parts: &[IonModification]) -> Self {
        let atoms: Vec<SingleModification> = parts
            .iter()
            .flat_map(|x| x.modifications().iter().cloned())
            .collect();
        Self::from_atoms(atoms)
    }

    fn from_atoms(mut atoms: Vec<SingleModification>) -> Self {
        if atoms.len() == 1 {
            if let Some(single) = atoms.pop() {
                return IonModification::Single(single);
            }
        }
        IonModification::Combined(CombinedModification::new(atoms))
    }

    /// `[M+?]` for the given charge.
    pub fn undefined_for_charge(charge: i32) -> Self {
        let mass = defaults::m_plus().mass() * charge as f64;
        IonModification::new(ModificationKind::UndefinedAdduct, "?", None, mass, charge)
    }

    /// Name of a single modification, the display name of a combined one.
    pub fn name(&self) -> &str {
        match self {
            IonModification::Single(x) => x.name(),
            IonModification::Combined(x) => &x.parsed_name,
        }
    }

    pub fn parsed_name(&self) -> &str {
        match self {
            IonModification::Single(x) => x.parsed_name(),
            IonModification::Combined(x) => &x.parsed_name,
        }
    }

    pub fn formula(&self) -> Option<&str> {
        match self {
            IonModification::Single(x) => x.formula(),
            IonModification::Combined(_) => None,
        }
    }

    pub fn mass(&self) -> f64 {
        match self {
            IonModification::Single(x) => x.mass,
            IonModification::Combined(x) => x.mass,
        }
    }

    pub fn charge(&self) -> i32 {
        match self {
            IonModification::Single(x) => x.charge,
            IonModification::Combined(x) => x.charge,
        }
    }

    pub fn abs_charge(&self) -> i32 {
        self.charge().abs()
    }

    pub fn kind(&self) -> ModificationKind {
        match self {
            IonModification::Single(x) => x.kind,
            IonModification::Combined(x) => x.kind,
        }
    }

    pub fn polarity(&self) -> Polarity {
        Polarity::from_charge(self.charge())
    }

    pub fn sign(&self) -> &'static str {
        charge_sign(self.charge())
    }

    pub fn is_combined(&self) -> bool {
        matches!(self, IonModification::Combined(_))
    }

    /// The single members; one for a single modification.
    pub fn modifications(&self) -> &[SingleModification] {
        match self {
            IonModification::Single(x) => std::slice::from_ref(x),
            IonModification::Combined(x) => &x.parts,
        }
    }

    pub fn mod_count(&self) -> usize {
        self.modifications().len()
    }

    /// Neutral mass for an m/z, without the molecule multiplier.
    pub fn mass_from_mz(&self, mz: f64) -> f64 {
        mz * self.abs_charge() as f64 - self.mass()
    }

    pub fn mz_from_mass(&self, neutral_mass: f64) -> f64 {
        (neutral_mass + self.mass()) / self.abs_charge() as f64
    }

    pub fn same_mass_difference(&self, other: &IonModification) -> bool {
        self.mass().total_cmp(&other.mass()) == Ordering::Equal
    }

    pub fn same_math_difference(&self, other: &IonModification) -> bool {
        self.same_mass_difference(other) && self.charge() == other.charge()
    }

    pub fn name_equals(&self, other: &IonModification) -> bool {
        self.parsed_name() == other.parsed_name()
    }

    /// Every member mass flipped, `-H2O` becomes `+H2O`.
    pub fn create_opposite(&self) -> Self {
        match self {
            IonModification::Single(x) => IonModification::Single(x.opposite()),
            IonModification::Combined(x) => IonModification::Combined(CombinedModification::new(
                x.parts.iter().map(|p| p.opposite()).collect(),
            )),
        }
    }

    /// Same modification with a different charge. Nothing else changes.
    pub fn with_charge(&self, charge: i32) -> Self {
        match self {
            IonModification::Single(x) => IonModification::new(
                x.kind,
                x.name.clone(),
                x.formula.as_deref(),
                x.mass,
                charge,
            ),
            IonModification::Combined(x) => {
                let mut copy = x.clone();
                copy.charge = charge;
                IonModification::Combined(copy)
            }
        }
    }

    /// True when no member of `self` equals any member of `other`.
    pub fn unique_adducts_to(&self, other: &IonModification) -> bool {
        let theirs = other.modifications();
        self.modifications()
            .iter()
            .all(|a| theirs.iter().all(|b| a != b))
    }

    /// Every member of `self` is matched by a distinct member of `parent`.
    ///
    /// Only combined parents can have subsets.
    pub fn is_subset_of(&self, parent: &IonModification) -> bool {
        let IonModification::Combined(parent) = parent else {
            return false;
        };
        let mut used = vec![false; parent.parts.len()];
        for member in self.modifications() {
            let slot = parent
                .parts
                .iter()
                .enumerate()
                .position(|(i, p)| !used[i] && p == member);
            match slot {
                Some(i) => used[i] = true,
                None => return false,
            }
        }
        true
    }

    /// Multiset difference. `None` when nothing is left.
    pub fn remove(&self, other: &IonModification) -> Option<IonModification> {
        match self {
            IonModification::Single(_) => {
                if self.is_subset_of(other) || self == other {
                    None
                } else {
                    Some(self.clone())
                }
            }
            IonModification::Combined(x) => {
                let mut left = x.parts.clone();
                for member in other.modifications() {
                    if let Some(i) = left.iter().position(|p| p == member) {
                        left.remove(i);
                    }
                }
                if left.is_empty() {
                    None
                } else {
                    Some(Self::from_atoms(left))
                }
            }
        }
    }

    /// `self` is `m` or one of its members is.
    pub fn contains(&self, m: &IonModification) -> bool {
        if self == m {
            return true;
        }
        match (self, m) {
            (IonModification::Combined(x), IonModification::Single(single)) => {
                x.parts.iter().any(|p| p == single)
            }
            _ => false,
        }
    }

    /// Looks up a built-in modification by signed name or formula.
    ///
    /// Unsigned tokens match the positively signed entries. Falls back to
    /// [`IonModification::from_formula`], then to a zero mass placeholder.
    ///
    /// ```
    /// use ionnet::models::modification::{IonModification, ModificationKind};
    ///
    /// assert_eq!(IonModification::parse_from_string("Na").mass(), 22.989218);
    /// assert_eq!(IonModification::parse_from_string("-H").charge(), -1);
    /// let unknown = IonModification::parse_from_string("Xyz");
    /// assert_eq!(unknown.kind(), ModificationKind::Unknown);
    /// assert_eq!(unknown.mass(), 0.0);
    /// ```
    pub fn parse_from_string(part: &str) -> Self {
        let tables = [
            defaults::default_adducts_positive(),
            defaults::default_adducts_negative(),
            defaults::default_modifications(),
        ];
        let found = tables.into_iter().flatten().find(|m| {
            let sign = m.sign();
            let formula = m.formula();
            let signed_name = format!("{}{}", sign, m.name());
            let signed_formula = formula.map(|f| format!("{}{}", sign, f));
            part == signed_name
                || signed_formula.as_deref() == Some(part)
                || (sign == "+" && (part == m.name() || formula == Some(part)))
        });
        match found {
            Some(m) => m,
            None => Self::from_formula(part).unwrap_or_else(|| {
                IonModification::new(ModificationKind::Unknown, part, None, 0.0, 0)
            }),
        }
    }

    /// `+Na` and `Na` add the formula mass, `-Na` subtracts it.
    ///
    /// `None` for blank input or formulas that cannot be parsed.
    pub fn from_formula(part: &str) -> Option<Self> {
        if part.trim().is_empty() {
            return None;
        }
        let (multiplier, stripped) = match part.chars().next() {
            Some('-') => (-1.0, &part[1..]),
            Some('+') => (1.0, &part[1..]),
            _ => (1.0, part),
        };
        let formula: MolecularFormula = stripped.parse().ok()?;
        Some(IonModification::new(
            ModificationKind::Unknown,
            stripped,
            Some(stripped),
            multiplier * formula.monoisotopic_mass(),
            0,
        ))
    }

    fn join_members(&self, f: impl Fn(&SingleModification) -> String) -> String {
        self.modifications()
            .iter()
            .map(f)
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Flat string map; combined modifications join member values with `;`.
    pub fn to_data_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("Name".to_string(), self.join_members(|m| m.name.clone()));
        map.insert(
            "Mass Diff".to_string(),
            self.join_members(|m| m.mass.to_string()),
        );
        map.insert(
            "Type".to_string(),
            self.join_members(|m| m.kind.as_str().to_string()),
        );
        map.insert(
            "Charge".to_string(),
            self.join_members(|m| m.charge.to_string()),
        );
        map.insert(
            "Formula".to_string(),
            self.join_members(|m| m.formula.clone().unwrap_or_default()),
        );
        map
    }

    /// Inverse of [`IonModification::to_data_map`]. `None` on any malformed value.
    pub fn from_data_map(map: &BTreeMap<String, String>) -> Option<Self> {
        let names = split_field(map, "Name");
        if names.is_empty() {
            return None;
        }
        let masses = split_field(map, "Mass Diff");
        let charges = split_field(map, "Charge");
        let kinds = split_field(map, "Type");
        let formulas = split_field(map, "Formula");

        let mut atoms = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let mass: f64 = masses.get(i)?.parse().ok()?;
            let charge: i32 = charges.get(i)?.parse().ok()?;
            let kind: ModificationKind = kinds.get(i)?.parse().ok()?;
            let formula = formulas.get(i).copied().filter(|f| !f.is_empty());
            atoms.push(SingleModification::new(kind, *name, formula, mass, charge));
        }
        Some(Self::from_atoms(atoms))
    }
}

fn split_field<'a>(map: &'a BTreeMap<String, String>, key: &str) -> Vec<&'a str> {
    match map.get(key) {
        Some(v) => v.split(';').collect(),
        None => Vec::new(),
    }
}

impl PartialEq for IonModification {
    fn eq(&self, other: &Self) -> bool {
        self.is_combined() == other.is_combined()
            && self.charge() == other.charge()
            && self.parsed_name() == other.parsed_name()
            && self.mass() == other.mass()
    }
}

impl Eq for IonModification {}

impl Hash for IonModification {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.is_combined().hash(state);
        self.parsed_name().hash(state);
        self.charge().hash(state);
        // 0.0 and -0.0 compare equal
        let mass = if self.mass() == 0.0 { 0.0f64 } else { self.mass() };
        mass.to_bits().hash(state);
    }
}

impl Ord for IonModification {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name()
            .cmp(other.name())
            .then_with(|| self.mass().total_cmp(&other.mass()))
            .then_with(|| self.charge().cmp(&other.charge()))
            .then_with(|| self.parsed_name().cmp(other.parsed_name()))
            .then_with(|| self.is_combined().cmp(&other.is_combined()))
    }
}

impl PartialOrd for IonModification {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for IonModification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let charge = self.charge();
        let z = match charge {
            0 => String::new(),
            1 => "+".to_string(),
            -1 => "-".to_string(),
            c => format!("{}{}", c.abs(), if c < 0 { "-" } else { "+" }),
        };
        write!(f, "[M{}]{}", self.parsed_name(), z)
    }
}
