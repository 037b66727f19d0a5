use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::Display;

use crate::models::feature_list::FeatureRows;
use crate::models::feature_row::{
    FeatureRow,
    RowId,
};
use crate::models::identity::{
    FormulaCandidates,
    IdentityId,
    IonIdentity,
};
use crate::models::ion_type::IonType;
use crate::models::modification::IonModification;
use crate::models::tolerance::{
    MzTolerance,
    MzToleranceCheck,
};
use crate::utils::streaming_calculators::RunningStatsCalculator;

/// Handle of a network inside a [`crate::models::feature_list::FeatureList`].
///
/// Stable for the lifetime of the network; the user facing number is
/// [`IonNetwork::number`] and changes when networks are renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkId(pub(crate) usize);

impl Display for NetworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "net#{}", self.0)
    }
}

/// How another network relates to this one.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkRelation {
    /// The other neutral molecule is this one plus the modification.
    Modification(IonModification),
    Custom(String),
}

impl NetworkRelation {
    pub fn description(&self) -> String {
        match self {
            NetworkRelation::Modification(m) => format!("M{}", m.parsed_name()),
            NetworkRelation::Custom(s) => s.clone(),
        }
    }
}

/// Rows whose identities imply the same neutral molecule.
///
/// Statistics are cached and dropped whenever the members change.
#[derive(Debug, Clone)]
pub struct IonNetwork {
    number: i32,
    mz_tolerance: MzTolerance,
    entries: BTreeMap<RowId, IdentityId>,
    lowest_id: Option<RowId>,
    neutral_mass: Option<f64>,
    max_dev: Option<f64>,
    avg_rt: Option<f64>,
    height_sum: f64,
    relations: BTreeMap<NetworkId, Vec<NetworkRelation>>,
    formulas: FormulaCandidates,
}

impl IonNetwork {
    pub(crate) fn new(mz_tolerance: MzTolerance, number: i32) -> Self {
        Self {
            number,
            mz_tolerance,
            entries: BTreeMap::new(),
            lowest_id: None,
            neutral_mass: None,
            max_dev: None,
            avg_rt: None,
            height_sum: 0.0,
            relations: BTreeMap::new(),
            formulas: FormulaCandidates::default(),
        }
    }

    pub fn number(&self) -> i32 {
        self.number
    }

    pub fn set_number(&mut self, number: i32) {
        self.number = number;
    }

    pub fn mz_tolerance(&self) -> &MzTolerance {
        &self.mz_tolerance
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &BTreeMap<RowId, IdentityId> {
        &self.entries
    }

    pub fn contains_row(&self, row: RowId) -> bool {
        self.entries.contains_key(&row)
    }

    pub fn get(&self, row: RowId) -> Option<IdentityId> {
        self.entries.get(&row).copied()
    }

    pub fn lowest_id(&self) -> Option<RowId> {
        self.lowest_id
    }

    /// The member with the smallest id owns the network when iterating rows.
    pub fn has_smallest_id(&self, row: RowId) -> bool {
        self.lowest_id == Some(row)
    }

    /// Map level insert. Back-references are kept by the feature list.
    pub(crate) fn insert(&mut self, row: RowId, identity: IdentityId) -> Option<IdentityId> {
        let previous = self.entries.insert(row, identity);
        if self.lowest_id.map_or(true, |low| row < low) {
            self.lowest_id = Some(row);
        }
        self.invalidate();
        previous
    }

    pub(crate) fn remove(&mut self, row: RowId) -> Option<IdentityId> {
        let removed = self.entries.remove(&row);
        if removed.is_some() {
            if self.lowest_id == Some(row) {
                self.lowest_id = self.entries.keys().min().copied();
            }
            self.invalidate();
        }
        removed
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.lowest_id = None;
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.neutral_mass = None;
        self.max_dev = None;
    }

    pub fn neutral_mass_cached(&self) -> Option<f64> {
        self.neutral_mass
    }

    pub fn max_dev_cached(&self) -> Option<f64> {
        self.max_dev
    }

    /// Mean RT of the members, set by [`IonNetwork::calc_neutral_mass`].
    pub fn avg_rt(&self) -> Option<f64> {
        self.avg_rt
    }

    /// Summed height of the members, set by [`IonNetwork::calc_neutral_mass`].
    pub fn height_sum(&self) -> f64 {
        self.height_sum
    }

    fn implied_masses<'a>(
        &'a self,
        rows: &'a FeatureRows,
        identities: &'a [IonIdentity],
    ) -> impl Iterator<Item = (&'a FeatureRow, f64)> + 'a {
        self.entries.iter().filter_map(move |(row_id, ident)| {
            let row = rows.get(*row_id)?;
            let mass = identities.get(ident.0)?.ion_type().mass(row.average_mz).ok()?;
            Some((row, mass))
        })
    }

    /// Mean implied neutral mass of all members. Also refreshes the
    /// average RT and the summed height.
    pub fn calc_neutral_mass(
        &mut self,
        rows: &FeatureRows,
        identities: &[IonIdentity],
    ) -> Option<f64> {
        let mut mass = RunningStatsCalculator::default();
        let mut rt = RunningStatsCalculator::default();
        let mut height_sum = 0.0;
        for (row, implied) in self.implied_masses(rows, identities) {
            mass.add(1.0, implied);
            rt.add(1.0, row.average_rt as f64);
            height_sum += row.height;
        }
        self.neutral_mass = mass.mean().ok();
        self.avg_rt = rt.mean().ok();
        self.height_sum = height_sum;
        self.max_dev = None;
        self.neutral_mass
    }

    pub fn neutral_mass(&mut self, rows: &FeatureRows, identities: &[IonIdentity]) -> Option<f64> {
        match self.neutral_mass {
            Some(mass) => Some(mass),
            None => self.calc_neutral_mass(rows, identities),
        }
    }

    /// Largest absolute distance of a member's implied neutral mass from
    /// the network neutral mass.
    pub fn calc_max_dev(&mut self, rows: &FeatureRows, identities: &[IonIdentity]) -> Option<f64> {
        let neutral = self.neutral_mass(rows, identities)?;
        let max_dev = self
            .implied_masses(rows, identities)
            .map(|(_, mass)| (mass - neutral).abs())
            .fold(0.0f64, f64::max);
        self.max_dev = Some(max_dev);
        self.max_dev
    }

    pub fn max_dev(&mut self, rows: &FeatureRows, identities: &[IonIdentity]) -> Option<f64> {
        match self.max_dev {
            Some(dev) => Some(dev),
            None => self.calc_max_dev(rows, identities),
        }
    }

    /// The spread of the members fits into the tolerance.
    pub fn check_all_within_mz_tol(
        &mut self,
        rows: &FeatureRows,
        identities: &[IonIdentity],
        tolerance: &impl MzToleranceCheck,
    ) -> bool {
        let (Some(neutral), Some(dev)) = (
            self.neutral_mass(rows, identities),
            self.max_dev(rows, identities),
        ) else {
            return false;
        };
        tolerance.check_within_tolerance(neutral, neutral + dev)
    }

    /// Would `row` annotated as `candidate` fit the neutral mass of this network?
    pub fn check_for_annotation(
        &mut self,
        rows: &FeatureRows,
        identities: &[IonIdentity],
        row: &FeatureRow,
        candidate: &IonType,
    ) -> bool {
        let Some(neutral) = self.neutral_mass(rows, identities) else {
            return false;
        };
        match candidate.mass(row.average_mz) {
            Ok(mass) => self.mz_tolerance.check_within_tolerance(neutral, mass),
            Err(_) => false,
        }
    }

    /// All members share one correlation group.
    pub fn all_same_corr_group(&self, rows: &FeatureRows) -> bool {
        let mut groups = self.entries.keys().map(|r| rows.get(*r).and_then(|x| x.group_id));
        match groups.next() {
            None => true,
            Some(first) => groups.all(|g| g == first),
        }
    }

    pub fn avg_mz(&self, rows: &FeatureRows) -> Option<f64> {
        let mut stats = RunningStatsCalculator::default();
        for row in self.entries.keys().filter_map(|r| rows.get(*r)) {
            stats.add(1.0, row.average_mz);
        }
        stats.mean().ok()
    }

    pub fn most_intense_row(&self, rows: &FeatureRows) -> Option<RowId> {
        self.entries
            .keys()
            .filter_map(|r| rows.get(*r))
            .max_by(|a, b| a.height.total_cmp(&b.height))
            .map(|r| r.id)
    }

    pub fn relations(&self) -> &BTreeMap<NetworkId, Vec<NetworkRelation>> {
        &self.relations
    }

    pub fn relations_to(&self, partner: NetworkId) -> &[NetworkRelation] {
        self.relations
            .get(&partner)
            .map(|r| r.as_slice())
            .unwrap_or_default()
    }

    /// One partner network can relate through several modifications.
    /// Adding an equal relation twice keeps one.
    pub fn add_relation(&mut self, partner: NetworkId, relation: NetworkRelation) {
        let existing = self.relations.entry(partner).or_default();
        if !existing.contains(&relation) {
            existing.push(relation);
        }
    }

    /// Drops every relation to `partner`.
    pub fn remove_relation(&mut self, partner: NetworkId) -> Option<Vec<NetworkRelation>> {
        self.relations.remove(&partner)
    }

    pub fn formulas(&self) -> &FormulaCandidates {
        &self.formulas
    }

    pub fn formulas_mut(&mut self) -> &mut FormulaCandidates {
        &mut self.formulas
    }

    /// Larger networks first.
    pub fn cmp_by_size(&self, other: &IonNetwork) -> Ordering {
        other.len().cmp(&self.len())
    }
}
