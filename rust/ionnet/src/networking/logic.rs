//! Building ion identity networks from annotated rows.
//!
//! The stages of [`create_annotation_networks`] depend on each other's side
//! effects and run in a fixed order:
//!
//! 1. bin charged identities by neutral mass into networks,
//! 2. point every member identity at its network,
//! 3. fill in modified identities implied by `[M-X+?]` annotations,
//! 4. number the networks in list order.
//!
//! Rows without identities are skipped in every stage.

use std::cmp::Ordering;
use std::collections::{
    BTreeMap,
    BTreeSet,
};

use tracing::{
    debug,
    info,
    instrument,
};

use crate::chemistry::constants::NEUTRAL_MASS_BINS_PER_DA;
use crate::models::feature_list::FeatureList;
use crate::models::feature_row::RowId;
use crate::models::identity::IdentityId;
use crate::models::modification::IonModification;
use crate::models::network::NetworkId;
use crate::models::tolerance::MzTolerance;
use crate::networking::sorter::NetworkSorter;

/// Number of partner rows of `identity`, only counting rows of `group` if given.
pub fn get_links_to(list: &FeatureList, identity: IdentityId, group: Option<u32>) -> usize {
    let partners = list.identity(identity).partners();
    match group {
        None => partners.len(),
        Some(g) => partners
            .keys()
            .filter(|r| list.row(**r).and_then(|x| x.group_id) == Some(g))
            .count(),
    }
}

/// Ranks two identities of the same row. `Greater` means `a` is the better
/// explanation.
///
/// `[M+?]` always loses, then any other undefined adduct. Otherwise the
/// likelihood decides, then fewer molecules, then more links (within
/// `group` if given), then the smaller absolute charge.
pub fn compare_rows(
    list: &FeatureList,
    a: IdentityId,
    b: IdentityId,
    group: Option<u32>,
) -> Ordering {
    let ta = list.identity(a).ion_type();
    let tb = list.identity(b).ion_type();
    match (ta.is_undefined_adduct_parent(), tb.is_undefined_adduct_parent()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }
    match (ta.is_undefined_adduct(), tb.is_undefined_adduct()) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }
    list.identity_likelihood(a)
        .cmp(&list.identity_likelihood(b))
        .then_with(|| tb.molecules().cmp(&ta.molecules()))
        .then_with(|| get_links_to(list, a, group).cmp(&get_links_to(list, b, group)))
        .then_with(|| tb.abs_charge().cmp(&ta.abs_charge()))
}

/// Sorts the identities of every row with more than one, best first.
pub fn sort_ion_identities(list: &mut FeatureList, use_group: bool) {
    for row in list.row_ids() {
        sort_ion_identities_of_row(list, row, use_group);
    }
}

pub fn sort_ion_identities_of_row(list: &mut FeatureList, row: RowId, use_group: bool) {
    let mut order = list.identities_of(row);
    if order.len() < 2 {
        return;
    }
    let group = if use_group {
        list.row(row).and_then(|r| r.group_id)
    } else {
        None
    };
    let snapshot: &FeatureList = list;
    order.sort_by(|a, b| compare_rows(snapshot, *b, *a, group));
    list.set_identity_order(row, order);
}

/// Distinct networks of all identities of `row`.
pub fn get_all_networks(list: &FeatureList, row: RowId) -> Vec<NetworkId> {
    list.networks_of_row(row)
}

/// All rows linked to any identity of `row`.
pub fn find_all_annotation_connections(list: &FeatureList, row: RowId) -> BTreeSet<RowId> {
    list.identities_of(row)
        .into_iter()
        .flat_map(|id| list.identity(id).partners().keys().copied().collect::<Vec<_>>())
        .collect()
}

/// Networks for [`create_annotation_networks`] over all rows or, with
/// `use_grouping`, separately for the rows of every correlation group.
///
/// Rows without a group are ignored when grouping. Without any grouped row
/// all rows are used.
#[instrument(level = "debug", skip_all)]
pub fn create_annotation_networks_grouped(
    list: &mut FeatureList,
    mz_tolerance: MzTolerance,
    use_grouping: bool,
) -> Vec<NetworkId> {
    let mut groups: BTreeMap<u32, Vec<RowId>> = BTreeMap::new();
    if use_grouping {
        for row in list.rows().iter() {
            if let Some(g) = row.group_id {
                groups.entry(g).or_default().push(row.id);
            }
        }
    }
    if groups.is_empty() {
        let rows = list.row_ids();
        return create_annotation_networks(list, &rows, mz_tolerance);
    }

    let mut nets = Vec::new();
    for (group, rows) in groups {
        debug!("Building networks for group {} ({} rows)", group, rows.len());
        nets.extend(create_annotation_networks(list, &rows, mz_tolerance));
    }
    nets.retain(|n| list.network(*n).is_some());
    nets
}

/// Runs bin, propagate, fill-in and renumber over `rows`.
#[instrument(level = "debug", skip_all)]
pub fn create_annotation_networks(
    list: &mut FeatureList,
    rows: &[RowId],
    mz_tolerance: MzTolerance,
) -> Vec<NetworkId> {
    let mut nets = bin_neutral_mass_to_networks(list, rows, mz_tolerance);
    set_networks_to_all_annotations(list, &nets);
    fill_in_neutral_losses(list, rows, &mut nets, mz_tolerance);

    let purged = list.purge_empty_networks();
    nets.retain(|n| list.network(*n).is_some());
    reset_network_ids(list, &nets);
    info!(
        "Created {} networks from {} rows ({} emptied networks removed)",
        nets.len(),
        rows.len(),
        purged
    );
    nets
}

/// Numbers networks by their position in `nets`.
pub fn reset_network_ids(list: &mut FeatureList, nets: &[NetworkId]) {
    for (i, net) in nets.iter().enumerate() {
        if let Some(n) = list.network_mut(*net) {
            n.set_number(i as i32);
        }
    }
}

/// Sorts by ascending average RT, then numbers from 0.
pub fn renumber_networks(list: &mut FeatureList, nets: &mut Vec<NetworkId>) {
    let mut keyed: Vec<(f64, NetworkId)> = nets
        .iter()
        .map(|n| {
            list.calc_neutral_mass(*n);
            let rt = list
                .network(*n)
                .and_then(|x| x.avg_rt())
                .unwrap_or(f64::INFINITY);
            (rt, *n)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    *nets = keyed.into_iter().map(|(_, n)| n).collect();
    reset_network_ids(list, nets);
}

pub fn set_networks_to_all_annotations(list: &mut FeatureList, nets: &[NetworkId]) {
    for net in nets {
        list.set_network_to_all_rows(*net);
    }
}

/// Multiplies before rounding, so `100.05` lands in bucket 1001.
fn neutral_mass_bucket(mass: f64) -> i64 {
    (mass * NEUTRAL_MASS_BINS_PER_DA).round() as i64
}

/// Groups charged identities whose neutral mass rounds to the same
/// 0.1 Da bucket, see [`neutral_mass_bucket`]. Coarser than the tolerance, so
/// networks straddling a bucket boundary stay separate.
fn bin_neutral_mass_to_networks(
    list: &mut FeatureList,
    rows: &[RowId],
    mz_tolerance: MzTolerance,
) -> Vec<NetworkId> {
    let mut buckets: BTreeMap<i64, NetworkId> = BTreeMap::new();
    let mut nets = Vec::new();
    for row in rows {
        for identity in list.identities_of(*row) {
            if list.identity(identity).ion_type().charge() == 0 {
                continue;
            }
            let Some(mass) = list.implied_mass(identity) else {
                continue;
            };
            let key = neutral_mass_bucket(mass);
            let net = match buckets.get(&key) {
                Some(n) => *n,
                None => {
                    let n = list.create_network(mz_tolerance, buckets.len() as i32);
                    buckets.insert(key, n);
                    nets.push(n);
                    n
                }
            };
            list.put(net, *row, identity);
        }
    }
    debug!("Binned {} rows into {} networks", rows.len(), nets.len());
    nets
}

/// Turns `[M-X+?]` identities into concrete `[M-X+adduct]` identities in the
/// networks of their partners.
///
/// A partner without any network gets a new two row network. Otherwise every
/// partner network that does not contain the row yet receives the partner's
/// ion type plus the modification, when the row's m/z fits its neutral mass.
fn fill_in_neutral_losses(
    list: &mut FeatureList,
    rows: &[RowId],
    nets: &mut Vec<NetworkId>,
    mz_tolerance: MzTolerance,
) {
    let mut filled = 0usize;
    for row in rows {
        let row = *row;
        let neutrals: Vec<IdentityId> = list
            .identities_of(row)
            .into_iter()
            .filter(|id| list.identity(*id).ion_type().is_modified_undefined_adduct())
            .collect();
        for neutral in neutrals {
            if list.identity(neutral).is_deleted() {
                continue;
            }
            let partners: Vec<(RowId, IdentityId)> = list
                .identity(neutral)
                .partners()
                .iter()
                .map(|(r, i)| (*r, *i))
                .collect();
            let modification: Vec<IonModification> = list
                .identity(neutral)
                .ion_type()
                .modification()
                .cloned()
                .into_iter()
                .collect();

            for (partner_row, partner) in partners {
                if list.row(partner_row).is_none() || list.identity(partner).is_deleted() {
                    continue;
                }
                let partner_nets = list.networks_of_row(partner_row);
                if partner_nets.is_empty() {
                    let net = list.create_network(mz_tolerance, nets.len() as i32);
                    nets.push(net);
                    list.put(net, row, neutral);
                    list.put(net, partner_row, partner);
                    list.set_network_to_all_rows(net);
                    continue;
                }

                for pnet in partner_nets {
                    let Some(network) = list.network(pnet) else {
                        continue;
                    };
                    if network.contains_row(row) {
                        continue;
                    }
                    let Some(partner_in_net) = network.get(partner_row) else {
                        continue;
                    };
                    let candidate = list
                        .identity(partner_in_net)
                        .ion_type()
                        .create_modified(&modification);
                    if !list.check_for_annotation(pnet, row, &candidate) {
                        continue;
                    }
                    let evidence = list.identity(neutral).ms2_evidence().to_vec();
                    let real = match list.find_identity(row, &candidate) {
                        Some(existing) => {
                            list.prefer_identity(row, existing);
                            existing
                        }
                        None => match list.add_identity(row, candidate, true) {
                            Ok(id) => id,
                            Err(_) => continue,
                        },
                    };
                    for e in evidence {
                        if !list.identity(real).ms2_evidence().contains(&e) {
                            list.identity_mut(real).add_ms2_evidence(e);
                        }
                    }
                    list.add_all_links_to(pnet, row, real);
                    list.put(pnet, row, real);
                    filled += 1;
                }
            }
        }
    }
    debug!("Filled in {} modified identities", filled);
}

/// Replaces every network spanning more than one correlation group by one
/// network per group. Identities of rows without a group are deleted.
#[instrument(level = "debug", skip_all)]
pub fn split_by_groups(list: &mut FeatureList, nets: &mut Vec<NetworkId>) {
    let mut consistent = Vec::with_capacity(nets.len());
    let mut split = Vec::new();
    for net in nets.drain(..) {
        let same_group = list
            .network(net)
            .map(|n| n.all_same_corr_group(list.rows()))
            .unwrap_or(true);
        if same_group {
            consistent.push(net);
        } else {
            split.extend(split_by_group(list, net));
        }
    }
    consistent.extend(split);
    list.purge_empty_networks();
    consistent.retain(|n| list.network(*n).is_some());
    *nets = consistent;
}

/// One new network per correlation group of the members of `net`.
pub fn split_by_group(list: &mut FeatureList, net: NetworkId) -> Vec<NetworkId> {
    let Some(network) = list.network(net) else {
        return Vec::new();
    };
    let mz_tolerance = *network.mz_tolerance();
    let entries: Vec<(RowId, IdentityId)> =
        network.entries().iter().map(|(r, i)| (*r, *i)).collect();

    let mut by_group: BTreeMap<u32, NetworkId> = BTreeMap::new();
    for (row, identity) in entries {
        if list.identity(identity).is_deleted() {
            continue;
        }
        match list.row(row).and_then(|r| r.group_id) {
            Some(group) => {
                let target = match by_group.get(&group) {
                    Some(n) => *n,
                    None => {
                        let n = list.create_network(mz_tolerance, -1);
                        by_group.insert(group, n);
                        n
                    }
                };
                list.put(target, row, identity);
            }
            None => list.delete_identity(identity),
        }
    }
    debug!("Split {} into {} group networks", net, by_group.len());
    by_group.into_values().collect()
}

/// Re-derives the partner links of every network, or deletes networks with
/// fewer than two members when `remove_empty` is set.
#[instrument(level = "debug", skip_all)]
pub fn recalc_all_annotation_networks(list: &mut FeatureList, remove_empty: bool) {
    let mut removed = 0usize;
    for net in stream_networks(list, false, None) {
        let size = list.network(net).map_or(0, |n| n.len());
        if remove_empty && size < 2 {
            list.delete_network(net);
            removed += 1;
        } else {
            list.recalc_connections(net);
        }
    }
    if removed > 0 {
        debug!("Removed {} networks with fewer than two members", removed);
    }
}

/// Every network once, found from its member with the smallest row id.
///
/// With `only_best` a network is only returned when it is the network of
/// the best identity of all its members.
pub fn stream_networks(
    list: &mut FeatureList,
    only_best: bool,
    sorter: Option<&NetworkSorter>,
) -> Vec<NetworkId> {
    let mut nets: Vec<NetworkId> = Vec::new();
    for row in list.row_ids() {
        if only_best {
            let Some(net) = list
                .best_identity(row)
                .and_then(|id| list.identity(id).network())
            else {
                continue;
            };
            let Some(network) = list.network(net) else {
                continue;
            };
            if !network.has_smallest_id(row) {
                continue;
            }
            let all_best = network.entries().keys().all(|member| {
                list.best_identity(*member)
                    .and_then(|id| list.identity(id).network())
                    == Some(net)
            });
            if all_best {
                nets.push(net);
            }
        } else {
            for net in list.networks_of_row(row) {
                let owns = list
                    .network(net)
                    .is_some_and(|n| n.has_smallest_id(row));
                if owns && !nets.contains(&net) {
                    nets.push(net);
                }
            }
        }
    }
    if let Some(sorter) = sorter {
        sorter.sort(list, &mut nets);
    }
    nets
}

/// Largest network of any row of `rows`, the first one on ties.
pub fn get_best_network(list: &FeatureList, rows: &[RowId]) -> Option<NetworkId> {
    let mut best: Option<(usize, NetworkId)> = None;
    for row in rows {
        for net in list.networks_of_row(*row) {
            let size = list.network(net).map_or(0, |n| n.len());
            if best.map_or(true, |(s, _)| size > s) {
                best = Some((size, net));
            }
        }
    }
    best.map(|(_, n)| n)
}
