use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{
    Deserialize,
    Serialize,
};

use crate::chemistry::{
    FormulaError,
    MolecularFormula,
};
use crate::errors::ModelError;
use crate::models::feature_row::RowId;
use crate::models::ion_type::IonType;
use crate::models::modification::IonModification;
use crate::models::network::NetworkId;

/// Handle of an identity inside a [`crate::models::feature_list::FeatureList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityId(pub(crate) usize);

impl Display for IdentityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Fragment spectrum support for an identity.
#[derive(Debug, Clone, PartialEq)]
pub enum Ms2Evidence {
    /// The fragment spectrum of a multimer contains the monomer ion.
    Multimer {
        monomer_mz: f64,
        explained_signals: u32,
    },
    /// A fragment explains the in-source modification as a neutral loss.
    ModificationRelation {
        modification: IonModification,
        explained_signals: u32,
    },
}

/// A scored molecular formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaCandidate {
    pub formula: MolecularFormula,
    pub score: f64,
}

impl FormulaCandidate {
    pub fn new(formula: &str, score: f64) -> Result<Self, FormulaError> {
        Ok(Self {
            formula: formula.parse()?,
            score,
        })
    }
}

/// Ranked candidate formulas, best first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormulaCandidates {
    candidates: Vec<FormulaCandidate>,
}

impl FormulaCandidates {
    pub fn add(&mut self, candidate: FormulaCandidate, as_best: bool) {
        self.candidates.retain(|c| c.formula != candidate.formula);
        if as_best {
            self.candidates.insert(0, candidate);
        } else {
            self.candidates.push(candidate);
        }
    }

    pub fn best(&self) -> Option<&FormulaCandidate> {
        self.candidates.first()
    }

    pub fn as_slice(&self) -> &[FormulaCandidate] {
        &self.candidates
    }

    pub fn set_best(&mut self, formula: &MolecularFormula) -> Result<(), ModelError> {
        let i = self.position(formula)?;
        let candidate = self.candidates.remove(i);
        self.candidates.insert(0, candidate);
        Ok(())
    }

    pub fn remove(&mut self, formula: &MolecularFormula) -> Result<FormulaCandidate, ModelError> {
        let i = self.position(formula)?;
        Ok(self.candidates.remove(i))
    }

    fn position(&self, formula: &MolecularFormula) -> Result<usize, ModelError> {
        if self.candidates.is_empty() {
            return Err(ModelError::EmptyFormulaList);
        }
        self.candidates
            .iter()
            .position(|c| &c.formula == formula)
            .ok_or_else(|| ModelError::FormulaNotFound {
                formula: formula.to_string(),
            })
    }
}

/// One ion type assigned to one row.
///
/// Partners are other rows whose identities imply the same neutral mass.
/// Links are always created in pairs by the owning feature list.
#[derive(Debug, Clone)]
pub struct IonIdentity {
    ion_type: IonType,
    row: RowId,
    partners: BTreeMap<RowId, IdentityId>,
    network: Option<NetworkId>,
    ms2_evidence: Vec<Ms2Evidence>,
    formulas: FormulaCandidates,
    deleted: bool,
}

impl IonIdentity {
    pub(crate) fn new(ion_type: IonType, row: RowId) -> Self {
        Self {
            ion_type,
            row,
            partners: BTreeMap::new(),
            network: None,
            ms2_evidence: Vec::new(),
            formulas: FormulaCandidates::default(),
            deleted: false,
        }
    }

    pub fn ion_type(&self) -> &IonType {
        &self.ion_type
    }

    pub fn row(&self) -> RowId {
        self.row
    }

    pub fn partners(&self) -> &BTreeMap<RowId, IdentityId> {
        &self.partners
    }

    pub fn partner_count(&self) -> usize {
        self.partners.len()
    }

    /// Comma separated partner row ids.
    pub fn partner_rows_string(&self) -> String {
        self.partners
            .keys()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn network(&self) -> Option<NetworkId> {
        self.network
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Overwrites any previous partner for `row`.
    pub fn add_partner_row(&mut self, row: RowId, identity: IdentityId) {
        self.partners.insert(row, identity);
    }

    pub fn remove_partner_row(&mut self, row: RowId) -> Option<IdentityId> {
        self.partners.remove(&row)
    }

    pub(crate) fn reset_links(&mut self) {
        self.partners.clear();
    }

    pub(crate) fn set_network(&mut self, network: Option<NetworkId>) {
        self.network = network;
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    pub fn ms2_evidence(&self) -> &[Ms2Evidence] {
        &self.ms2_evidence
    }

    pub fn add_ms2_evidence(&mut self, evidence: Ms2Evidence) {
        self.ms2_evidence.push(evidence);
    }

    pub fn set_ms2_evidence(&mut self, evidence: Vec<Ms2Evidence>) {
        self.ms2_evidence = evidence;
    }

    pub fn has_multimer_evidence(&self) -> bool {
        self.ms2_evidence
            .iter()
            .any(|e| matches!(e, Ms2Evidence::Multimer { .. }))
    }

    pub fn has_modification_evidence(&self) -> bool {
        self.ms2_evidence
            .iter()
            .any(|e| matches!(e, Ms2Evidence::ModificationRelation { .. }))
    }

    pub fn formulas(&self) -> &FormulaCandidates {
        &self.formulas
    }

    pub fn add_formula(&mut self, candidate: FormulaCandidate, as_best: bool) {
        self.formulas.add(candidate, as_best);
    }

    pub fn best_formula(&self) -> Option<&FormulaCandidate> {
        self.formulas.best()
    }

    pub fn set_best_formula(&mut self, formula: &MolecularFormula) -> Result<(), ModelError> {
        self.formulas.set_best(formula)
    }

    pub fn remove_formula(
        &mut self,
        formula: &MolecularFormula,
    ) -> Result<FormulaCandidate, ModelError> {
        self.formulas.remove(formula)
    }

    /// Network size plus one per kind of MS2 support, or the partner
    /// count for identities outside any network.
    pub fn score(&self, network_size: Option<usize>) -> usize {
        match network_size {
            None => self.partners.len(),
            Some(size) => {
                size + self.has_multimer_evidence() as usize
                    + self.has_modification_evidence() as usize
            }
        }
    }

    /// Ranking heuristic for identities on the same row.
    pub fn likelihood_value(&self, network_size: Option<usize>) -> f64 {
        if self.ion_type.is_undefined_adduct_parent() {
            return 0.0;
        }
        if self.ion_type.is_undefined_adduct() {
            return 1.0;
        }
        let links = match network_size {
            Some(size) => size.saturating_sub(1),
            None => self.partners.len(),
        };
        let monomer = if self.ion_type.molecules() == 1 { 0.5 } else { 0.0 };
        3.0 * self.has_multimer_evidence() as u8 as f64
            + self.has_modification_evidence() as u8 as f64
            + links as f64
            + monomer
    }

    pub fn likelihood(&self, network_size: Option<usize>) -> i32 {
        self.likelihood_value(network_size) as i32
    }
}

impl Display for IonIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ion_type)?;
        if !self.partners.is_empty() {
            write!(f, " identified by ID={}", self.partner_rows_string())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::defaults;

    fn identity(ion_type: IonType) -> IonIdentity {
        IonIdentity::new(ion_type, RowId(1))
    }

    #[test]
    fn test_partner_overwrite() {
        let mut ident = identity(IonType::new(defaults::h()));
        ident.add_partner_row(RowId(2), IdentityId(5));
        ident.add_partner_row(RowId(2), IdentityId(6));
        assert_eq!(ident.partner_count(), 1);
        assert_eq!(ident.partners()[&RowId(2)], IdentityId(6));
        ident.add_partner_row(RowId(3), IdentityId(7));
        assert_eq!(ident.partner_rows_string(), "2,3");
        assert_eq!(ident.to_string(), "[M+H]+ identified by ID=2,3");
    }

    #[test]
    fn test_score() {
        let mut ident = identity(IonType::new(defaults::h()));
        ident.add_partner_row(RowId(2), IdentityId(5));
        assert_eq!(ident.score(None), 1);
        assert_eq!(ident.score(Some(4)), 4);
        ident.add_ms2_evidence(Ms2Evidence::Multimer {
            monomer_mz: 300.1,
            explained_signals: 2,
        });
        assert_eq!(ident.score(Some(4)), 5);
        ident.add_ms2_evidence(Ms2Evidence::ModificationRelation {
            modification: defaults::h2o(),
            explained_signals: 1,
        });
        assert_eq!(ident.score(Some(4)), 6);
    }

    #[test]
    fn test_likelihood() {
        assert_eq!(identity(IonType::undefined(1)).likelihood(Some(5)), 0);
        let modified_undefined = IonType::undefined(1).create_modified(&[defaults::h2o()]);
        assert_eq!(identity(modified_undefined).likelihood(Some(5)), 1);

        let mut ident = identity(IonType::new(defaults::h()));
        assert_eq!(ident.likelihood_value(Some(3)), 2.5);
        assert_eq!(ident.likelihood(Some(3)), 2);
        ident.add_ms2_evidence(Ms2Evidence::Multimer {
            monomer_mz: 300.1,
            explained_signals: 1,
        });
        assert_eq!(ident.likelihood_value(Some(3)), 5.5);

        let dimer = identity(IonType::with_molecules(2, defaults::h(), None));
        assert_eq!(dimer.likelihood_value(None), 0.0);
    }

    #[test]
    fn test_formula_candidates() {
        let mut ident = identity(IonType::new(defaults::h()));
        let water: MolecularFormula = "H2O".parse().unwrap();
        assert_eq!(
            ident.remove_formula(&water),
            Err(ModelError::EmptyFormulaList)
        );
        ident.add_formula(FormulaCandidate::new("C6H12O6", 0.9).unwrap(), false);
        ident.add_formula(FormulaCandidate::new("C7H16O5", 0.5).unwrap(), false);
        assert_eq!(
            ident.best_formula().unwrap().formula,
            "C6H12O6".parse::<MolecularFormula>().unwrap()
        );
        assert!(matches!(
            ident.set_best_formula(&water),
            Err(ModelError::FormulaNotFound { .. })
        ));
        let second: MolecularFormula = "C7H16O5".parse().unwrap();
        ident.set_best_formula(&second).unwrap();
        assert_eq!(ident.best_formula().unwrap().formula, second);
        let removed = ident.remove_formula(&second).unwrap();
        assert_eq!(removed.score, 0.5);
        assert_eq!(ident.formulas().as_slice().len(), 1);
    }
}
