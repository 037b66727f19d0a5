use std::collections::HashMap;

use tracing::trace;

use crate::errors::ModelError;
use crate::models::feature_row::{
    FeatureRow,
    RowId,
};
use crate::models::identity::{
    IdentityId,
    IonIdentity,
};
use crate::models::ion_type::IonType;
use crate::models::network::{
    IonNetwork,
    NetworkId,
};
use crate::models::tolerance::{
    MzTolerance,
    MzToleranceCheck,
};

/// Rows in insertion order with lookup by id.
#[derive(Debug, Clone, Default)]
pub struct FeatureRows {
    rows: Vec<FeatureRow>,
    index: HashMap<RowId, usize>,
}

impl FeatureRows {
    pub fn get(&self, id: RowId) -> Option<&FeatureRow> {
        self.index.get(&id).map(|i| &self.rows[*i])
    }

    pub(crate) fn get_mut(&mut self, id: RowId) -> Option<&mut FeatureRow> {
        let i = *self.index.get(&id)?;
        self.rows.get_mut(i)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeatureRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn ids(&self) -> Vec<RowId> {
        self.rows.iter().map(|r| r.id).collect()
    }

    fn push(&mut self, row: FeatureRow) -> Result<(), ModelError> {
        if self.index.contains_key(&row.id) {
            return Err(ModelError::DuplicateRow(row.id));
        }
        self.index.insert(row.id, self.rows.len());
        self.rows.push(row);
        Ok(())
    }
}

/// Owner of all rows, identities and networks.
///
/// Identities and networks refer to each other and to rows through
/// [`IdentityId`], [`NetworkId`] and [`RowId`] handles. All mutation goes
/// through `&mut FeatureList`, which keeps both sides of every reference
/// in sync:
///
/// - a network maps each member row to exactly one identity, and that
///   identity points back to the network;
/// - partner links are always mutual;
/// - deleted identities are flagged and detached from their row and network.
///
/// ```
/// use ionnet::models::defaults;
/// use ionnet::models::feature_list::FeatureList;
/// use ionnet::models::feature_row::FeatureRow;
/// use ionnet::models::ion_type::IonType;
/// use ionnet::models::tolerance::MzTolerance;
///
/// let mut list = FeatureList::from_rows([
///     FeatureRow::new(1, 300.1000, 5.0, 1e5),
///     FeatureRow::new(2, 322.0819, 5.0, 5e4),
/// ])
/// .unwrap();
/// let (a, b) = list
///     .add_adduct_identity_to_row(
///         MzTolerance::Absolute(0.001),
///         1.into(),
///         IonType::new(defaults::h()),
///         2.into(),
///         IonType::new(defaults::na()),
///     )
///     .unwrap();
/// let net = list.identity(a).network().unwrap();
/// assert_eq!(list.identity(b).network(), Some(net));
/// assert_eq!(list.network(net).unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FeatureList {
    rows: FeatureRows,
    identities: Vec<IonIdentity>,
    networks: Vec<Option<IonNetwork>>,
}

impl FeatureList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: impl IntoIterator<Item = FeatureRow>) -> Result<Self, ModelError> {
        let mut list = Self::new();
        for row in rows {
            list.add_row(row)?;
        }
        Ok(list)
    }

    /// Rows are added without identities.
    pub fn add_row(&mut self, mut row: FeatureRow) -> Result<(), ModelError> {
        row.identities_mut().clear();
        self.rows.push(row)
    }

    pub fn rows(&self) -> &FeatureRows {
        &self.rows
    }

    pub fn row(&self, id: RowId) -> Option<&FeatureRow> {
        self.rows.get(id)
    }

    pub fn row_ids(&self) -> Vec<RowId> {
        self.rows.ids()
    }

    fn row_or_err(&self, id: RowId) -> Result<&FeatureRow, ModelError> {
        self.rows.get(id).ok_or(ModelError::UnknownRow(id))
    }

    /// Handles are only handed out by this list, so lookups cannot miss.
    pub fn identity(&self, id: IdentityId) -> &IonIdentity {
        &self.identities[id.0]
    }

    pub fn identity_mut(&mut self, id: IdentityId) -> &mut IonIdentity {
        &mut self.identities[id.0]
    }

    /// Live identities of a row, preferred first.
    pub fn identities_of(&self, row: RowId) -> Vec<IdentityId> {
        self.rows
            .get(row)
            .map(|r| r.identities().to_vec())
            .unwrap_or_default()
    }

    pub fn best_identity(&self, row: RowId) -> Option<IdentityId> {
        self.rows.get(row).and_then(|r| r.best_identity())
    }

    pub fn network(&self, id: NetworkId) -> Option<&IonNetwork> {
        self.networks.get(id.0).and_then(|n| n.as_ref())
    }

    pub fn network_mut(&mut self, id: NetworkId) -> Option<&mut IonNetwork> {
        self.networks.get_mut(id.0).and_then(|n| n.as_mut())
    }

    /// All live networks, in creation order.
    pub fn network_ids(&self) -> Vec<NetworkId> {
        self.networks
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_some())
            .map(|(i, _)| NetworkId(i))
            .collect()
    }

    pub fn network_count(&self) -> usize {
        self.networks.iter().filter(|n| n.is_some()).count()
    }

    /// Size of the network owning the identity.
    pub fn network_size_of(&self, identity: IdentityId) -> Option<usize> {
        self.identity(identity)
            .network()
            .and_then(|n| self.network(n))
            .map(|n| n.len())
    }

    pub fn identity_score(&self, identity: IdentityId) -> usize {
        self.identity(identity).score(self.network_size_of(identity))
    }

    pub fn identity_likelihood(&self, identity: IdentityId) -> i32 {
        self.identity(identity)
            .likelihood(self.network_size_of(identity))
    }

    /// Neutral mass implied by the identity on its own row.
    pub fn implied_mass(&self, identity: IdentityId) -> Option<f64> {
        let ident = self.identity(identity);
        let row = self.rows.get(ident.row())?;
        ident.ion_type().mass(row.average_mz).ok()
    }

    // Identities

    /// Attaches a new identity to `row`.
    pub fn add_identity(
        &mut self,
        row: RowId,
        ion_type: IonType,
        preferred: bool,
    ) -> Result<IdentityId, ModelError> {
        self.row_or_err(row)?;
        let id = IdentityId(self.identities.len());
        self.identities.push(IonIdentity::new(ion_type, row));
        if let Some(r) = self.rows.get_mut(row) {
            r.add_identity(id, preferred);
        }
        Ok(id)
    }

    /// Live identity of `row` with an equal ion type.
    pub fn find_identity(&self, row: RowId, ion_type: &IonType) -> Option<IdentityId> {
        self.rows.get(row)?.identities().iter().copied().find(|id| {
            let ident = self.identity(*id);
            !ident.is_deleted() && ident.ion_type() == ion_type
        })
    }

    pub fn find_or_create_identity(
        &mut self,
        row: RowId,
        ion_type: IonType,
    ) -> Result<IdentityId, ModelError> {
        match self.find_identity(row, &ion_type) {
            Some(id) => Ok(id),
            None => self.add_identity(row, ion_type, false),
        }
    }

    /// Mutual partner link. Identities on the same row are never linked.
    pub fn link(&mut self, a: IdentityId, b: IdentityId) {
        let row_a = self.identity(a).row();
        let row_b = self.identity(b).row();
        if row_a == row_b {
            return;
        }
        self.identities[a.0].add_partner_row(row_b, b);
        self.identities[b.0].add_partner_row(row_a, a);
    }

    /// Deletes the identity and, through the partner links, every identity
    /// connected to it.
    ///
    /// The deleted flag is checked first, so cycles of partner links end
    /// the recursion.
    pub fn delete_identity(&mut self, id: IdentityId) {
        if self.identity(id).is_deleted() {
            return;
        }
        self.identities[id.0].mark_deleted();
        let row = self.identity(id).row();
        if let Some(net) = self.identity(id).network() {
            if self.network(net).and_then(|n| n.get(row)) == Some(id) {
                self.remove_from_network(net, row);
            }
            self.identities[id.0].set_network(None);
        }
        if let Some(r) = self.rows.get_mut(row) {
            r.remove_identity(id);
        }
        trace!("Deleted identity {} on row {}", id, row);
        let partners: Vec<IdentityId> = self.identity(id).partners().values().copied().collect();
        for partner in partners {
            self.delete_identity(partner);
        }
    }

    /// Finds or creates `type1` on `row1` and `type2` on `row2`, puts both in
    /// one network and links them.
    ///
    /// Two different networks are merged into the first; when neither identity
    /// has a network yet a new one is created.
    pub fn add_adduct_identity_to_row(
        &mut self,
        mz_tolerance: MzTolerance,
        row1: RowId,
        type1: IonType,
        row2: RowId,
        type2: IonType,
    ) -> Result<(IdentityId, IdentityId), ModelError> {
        self.row_or_err(row1)?;
        self.row_or_err(row2)?;
        let a = self.find_or_create_identity(row1, type1)?;
        let b = self.find_or_create_identity(row2, type2)?;

        let net_a = self.identity(a).network();
        let net_b = self.identity(b).network();
        let net = match (net_a, net_b) {
            (Some(na), Some(nb)) if na != nb => {
                self.merge_networks(na, nb);
                na
            }
            (Some(n), _) | (None, Some(n)) => n,
            (None, None) => self.create_network(mz_tolerance, -1),
        };
        self.put(net, row1, a);
        self.put(net, row2, b);
        self.link(a, b);
        Ok((a, b))
    }

    // Networks

    pub fn create_network(&mut self, mz_tolerance: MzTolerance, number: i32) -> NetworkId {
        let id = NetworkId(self.networks.len());
        self.networks.push(Some(IonNetwork::new(mz_tolerance, number)));
        id
    }

    /// Puts `identity` for `row` into the network and points the identity at it.
    ///
    /// The identity leaves its previous network, and an identity that was
    /// stored for the same row loses its network reference.
    pub fn put(&mut self, net: NetworkId, row: RowId, identity: IdentityId) {
        if self.network(net).is_none() {
            return;
        }
        if let Some(previous) = self.identity(identity).network().filter(|p| *p != net) {
            if let Some(prev_net) = self.network_mut(previous) {
                if prev_net.get(row) == Some(identity) {
                    prev_net.remove(row);
                }
            }
        }
        let replaced = self
            .network_mut(net)
            .and_then(|n| n.insert(row, identity));
        if let Some(old) = replaced.filter(|old| *old != identity) {
            if self.identity(old).network() == Some(net) {
                self.identities[old.0].set_network(None);
            }
        }
        self.identities[identity.0].set_network(Some(net));
    }

    /// Removes `row` from the network and clears the identity's network reference.
    pub fn remove_from_network(&mut self, net: NetworkId, row: RowId) -> Option<IdentityId> {
        let removed = self.network_mut(net)?.remove(row)?;
        if self.identity(removed).network() == Some(net) {
            self.identities[removed.0].set_network(None);
        }
        Some(removed)
    }

    /// Moves every entry of `from` into `into` and drops `from`.
    pub fn merge_networks(&mut self, into: NetworkId, from: NetworkId) {
        if into == from {
            return;
        }
        let entries: Vec<(RowId, IdentityId)> = match self.network(from) {
            Some(n) => n.entries().iter().map(|(r, i)| (*r, *i)).collect(),
            None => return,
        };
        for (row, identity) in entries {
            self.put(into, row, identity);
        }
        self.drop_network(from);
    }

    /// Detaches all member identities from their rows and removes the network.
    pub fn delete_network(&mut self, net: NetworkId) {
        let entries: Vec<(RowId, IdentityId)> = match self.network(net) {
            Some(n) => n.entries().iter().map(|(r, i)| (*r, *i)).collect(),
            None => return,
        };
        for (row, identity) in entries {
            if let Some(r) = self.rows.get_mut(row) {
                r.remove_identity(identity);
            }
            if self.identity(identity).network() == Some(net) {
                self.identities[identity.0].set_network(None);
            }
        }
        if let Some(n) = self.network_mut(net) {
            n.clear();
        }
        self.drop_network(net);
    }

    fn drop_network(&mut self, net: NetworkId) {
        for identity in self.identities.iter_mut() {
            if identity.network() == Some(net) {
                identity.set_network(None);
            }
        }
        if let Some(slot) = self.networks.get_mut(net.0) {
            *slot = None;
        }
    }

    /// Removes networks without members. Returns how many were removed.
    pub fn purge_empty_networks(&mut self) -> usize {
        let empty: Vec<NetworkId> = self
            .network_ids()
            .into_iter()
            .filter(|n| self.network(*n).is_some_and(|x| x.is_empty()))
            .collect();
        for net in empty.iter() {
            self.drop_network(*net);
        }
        empty.len()
    }

    /// Points every member identity at the network.
    pub fn set_network_to_all_rows(&mut self, net: NetworkId) {
        let members: Vec<IdentityId> = match self.network(net) {
            Some(n) => n.entries().values().copied().collect(),
            None => return,
        };
        for identity in members {
            self.identities[identity.0].set_network(Some(net));
        }
    }

    /// Links `identity` with every member whose implied neutral mass matches.
    ///
    /// Does not insert `identity` into the network.
    pub fn add_all_links_to(&mut self, net: NetworkId, row: RowId, identity: IdentityId) {
        let Some(network) = self.network(net) else {
            return;
        };
        let Some(mz) = self.rows.get(row).map(|r| r.average_mz) else {
            return;
        };
        let Ok(mass) = self.identity(identity).ion_type().mass(mz) else {
            return;
        };
        let tolerance = *network.mz_tolerance();
        let matches: Vec<IdentityId> = network
            .entries()
            .iter()
            .filter(|(r, _)| **r != row)
            .filter_map(|(r, id)| {
                let other_mz = self.rows.get(*r)?.average_mz;
                let other = self.identity(*id).ion_type().mass(other_mz).ok()?;
                tolerance
                    .check_within_tolerance(other, mass)
                    .then_some(*id)
            })
            .collect();
        for other in matches {
            self.link(identity, other);
        }
    }

    /// Rebuilds the partner links of every charged member from scratch.
    ///
    /// Former partners lose their side of the link too, including partners
    /// outside the network.
    pub fn recalc_connections(&mut self, net: NetworkId) {
        let entries: Vec<(RowId, IdentityId)> = match self.network(net) {
            Some(n) => n.entries().iter().map(|(r, i)| (*r, *i)).collect(),
            None => return,
        };
        for (row, identity) in entries {
            if self.identity(identity).ion_type().charge() == 0 {
                continue;
            }
            let former: Vec<IdentityId> =
                self.identity(identity).partners().values().copied().collect();
            for partner in former {
                let back = &mut self.identities[partner.0];
                if back.partners().get(&row) == Some(&identity) {
                    back.remove_partner_row(row);
                }
            }
            self.identities[identity.0].reset_links();
            self.add_all_links_to(net, row, identity);
        }
    }

    pub fn neutral_mass(&mut self, net: NetworkId) -> Option<f64> {
        let Self {
            rows,
            identities,
            networks,
        } = self;
        networks
            .get_mut(net.0)?
            .as_mut()?
            .neutral_mass(rows, identities)
    }

    /// Recomputes the neutral mass, average RT and summed height.
    pub fn calc_neutral_mass(&mut self, net: NetworkId) -> Option<f64> {
        let Self {
            rows,
            identities,
            networks,
        } = self;
        networks
            .get_mut(net.0)?
            .as_mut()?
            .calc_neutral_mass(rows, identities)
    }

    pub fn max_dev(&mut self, net: NetworkId) -> Option<f64> {
        let Self {
            rows,
            identities,
            networks,
        } = self;
        networks.get_mut(net.0)?.as_mut()?.max_dev(rows, identities)
    }

    pub fn check_all_within_mz_tol(
        &mut self,
        net: NetworkId,
        tolerance: &impl MzToleranceCheck,
    ) -> bool {
        let Self {
            rows,
            identities,
            networks,
        } = self;
        match networks.get_mut(net.0).and_then(|n| n.as_mut()) {
            Some(n) => n.check_all_within_mz_tol(rows, identities, tolerance),
            None => false,
        }
    }

    /// Would `row` annotated as `candidate` fit into the network?
    pub fn check_for_annotation(&mut self, net: NetworkId, row: RowId, candidate: &IonType) -> bool {
        let Self {
            rows,
            identities,
            networks,
        } = self;
        let Some(row) = rows.get(row) else {
            return false;
        };
        match networks.get_mut(net.0).and_then(|n| n.as_mut()) {
            Some(n) => n.check_for_annotation(rows, identities, row, candidate),
            None => false,
        }
    }

    /// Distinct networks of all identities of a row.
    pub fn networks_of_row(&self, row: RowId) -> Vec<NetworkId> {
        let mut nets: Vec<NetworkId> = Vec::new();
        for id in self.identities_of(row) {
            if let Some(net) = self.identity(id).network() {
                if !nets.contains(&net) {
                    nets.push(net);
                }
            }
        }
        nets
    }

    pub(crate) fn set_identity_order(&mut self, row: RowId, order: Vec<IdentityId>) {
        if let Some(r) = self.rows.get_mut(row) {
            *r.identities_mut() = order;
        }
    }

    pub(crate) fn prefer_identity(&mut self, row: RowId, identity: IdentityId) {
        if let Some(r) = self.rows.get_mut(row) {
            r.add_identity(identity, true);
        }
    }
}
