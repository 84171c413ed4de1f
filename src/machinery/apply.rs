//! Applying a diff to the existing config.

use super::errors::{ConfigSide, EntityKind, MachineryError};
use super::resolver::ConflictResolver;
use super::types::{ChangeKind, ComplexDiff, Diff, DiffItem, NamedContext};
use crate::api::Config;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

impl Diff {
    /// Mutates `existing` in place according to every item of this diff.
    ///
    /// Items run in three phases. Deletions, replacements and modifications
    /// go first, so names they free are available afterwards. All renames are
    /// then applied together, which lets two contexts swap names. New
    /// contexts are inserted last.
    ///
    /// Entities taken from `incoming` are cloned. `resolver` picks fresh names
    /// for new entities whose names are already taken.
    ///
    /// On error `existing` may be partially updated and must not be used as
    /// a committed result.
    pub fn apply(
        &self,
        existing: &mut Config,
        incoming: &Config,
        resolver: &dyn ConflictResolver,
    ) -> Result<(), MachineryError> {
        for item in self.iter().filter(|item| phase(item) == Phase::Edit) {
            apply_item(item, existing, incoming, resolver)?;
        }

        let renames: Vec<&DiffItem> = self.iter().filter(|item| phase(item) == Phase::Rename).collect();
        for item in &renames {
            info!(item = %item, "applying diff item");
        }
        apply_renames(&renames, existing)?;

        for item in self.iter().filter(|item| phase(item) == Phase::New) {
            apply_item(item, existing, incoming, resolver)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Edit,
    Rename,
    New,
}

fn phase(item: &DiffItem) -> Phase {
    if item.change_type.contains(ChangeKind::New) {
        Phase::New
    } else if item.change_type.contains(ChangeKind::Rename) {
        Phase::Rename
    } else {
        Phase::Edit
    }
}

/// Applies a single diff item.
///
/// # Panics
///
/// Panics if a `Modify` item carries `RenameRequired`; that combination is
/// never produced by the diff engine.
pub fn apply_item(
    item: &DiffItem,
    existing: &mut Config,
    incoming: &Config,
    resolver: &dyn ConflictResolver,
) -> Result<(), MachineryError> {
    info!(item = %item, "applying diff item");
    let change = &item.change_type;
    if change.contains(ChangeKind::New) {
        apply_new(item, existing, incoming, resolver)
    } else if change.contains(ChangeKind::Rename) {
        apply_renames(&[item], existing)
    } else if change.contains(ChangeKind::Delete) {
        apply_delete(item, existing)
    } else if change.contains(ChangeKind::Replace) {
        apply_replace(item, existing, incoming)
    } else if change.contains(ChangeKind::Modify) {
        apply_modify(item, existing, incoming)
    } else {
        debug!(change = %change, "nothing to apply");
        Ok(())
    }
}

fn affected_existing(item: &DiffItem) -> Result<&NamedContext, MachineryError> {
    item.affected_existing
        .as_ref()
        .ok_or_else(|| MachineryError::IncompleteItem {
            side: ConfigSide::Existing,
            change: item.change_type.to_string(),
        })
}

fn affected_incoming(item: &DiffItem) -> Result<&NamedContext, MachineryError> {
    item.affected_incoming
        .as_ref()
        .ok_or_else(|| MachineryError::IncompleteItem {
            side: ConfigSide::Incoming,
            change: item.change_type.to_string(),
        })
}

fn lookup<'a, T>(
    map: &'a BTreeMap<String, T>,
    side: ConfigSide,
    kind: EntityKind,
    name: &str,
) -> Result<&'a T, MachineryError> {
    map.get(name)
        .ok_or_else(|| MachineryError::missing(side, kind, name))
}

fn take<T>(
    map: &mut BTreeMap<String, T>,
    kind: EntityKind,
    name: &str,
) -> Result<T, MachineryError> {
    map.remove(name)
        .ok_or_else(|| MachineryError::missing(ConfigSide::Existing, kind, name))
}

/// Returns `name` if it is free in `map`, otherwise asks the resolver.
fn free_name<T>(
    resolver: &dyn ConflictResolver,
    kind: EntityKind,
    name: &str,
    map: &BTreeMap<String, T>,
) -> Result<String, MachineryError> {
    if !map.contains_key(name) {
        return Ok(name.to_string());
    }
    let resolved = resolver.rename(kind, name, &|candidate| {
        if map.contains_key(candidate) {
            Err(MachineryError::already_exists(kind, candidate))
        } else {
            Ok(())
        }
    })?;
    debug!(%kind, from = name, to = %resolved, "resolved name conflict");
    Ok(resolved)
}

fn apply_new(
    item: &DiffItem,
    existing: &mut Config,
    incoming: &Config,
    resolver: &dyn ConflictResolver,
) -> Result<(), MachineryError> {
    let source = affected_incoming(item)?;
    let cluster = lookup(&incoming.clusters, ConfigSide::Incoming, EntityKind::Cluster, source.cluster())?.clone();
    let auth_info =
        lookup(&incoming.auth_infos, ConfigSide::Incoming, EntityKind::AuthInfo, source.auth_info())?.clone();

    let (cluster_name, auth_info_name, context_name) = if item.complex.contains(ComplexDiff::RenameRequired) {
        (
            free_name(resolver, EntityKind::Cluster, source.cluster(), &existing.clusters)?,
            free_name(resolver, EntityKind::AuthInfo, source.auth_info(), &existing.auth_infos)?,
            free_name(resolver, EntityKind::Context, &source.name, &existing.contexts)?,
        )
    } else {
        (
            source.cluster().to_string(),
            source.auth_info().to_string(),
            source.name.clone(),
        )
    };

    let mut context = source.context.clone();
    context.cluster = cluster_name.clone();
    context.auth_info = auth_info_name.clone();

    existing.clusters.insert(cluster_name, cluster);
    existing.auth_infos.insert(auth_info_name, auth_info);
    existing.contexts.insert(context_name, context);
    Ok(())
}

/// Moves every entry named by `moves` (from, to) at once.
///
/// A target may only be taken by an entry that is itself being moved away.
fn move_entries<T>(
    map: &mut BTreeMap<String, T>,
    kind: EntityKind,
    moves: &BTreeSet<(&str, &str)>,
) -> Result<(), MachineryError> {
    let sources: BTreeSet<&str> = moves.iter().map(|(from, _)| *from).collect();
    for (from, to) in moves {
        if !map.contains_key(*from) {
            return Err(MachineryError::missing(ConfigSide::Existing, kind, *from));
        }
        if map.contains_key(*to) && !sources.contains(to) {
            return Err(MachineryError::already_exists(kind, *to));
        }
    }

    let mut taken = Vec::with_capacity(moves.len());
    for (from, to) in moves {
        taken.push((*to, take(map, kind, from)?));
    }
    for (to, value) in taken {
        if map.contains_key(to) {
            return Err(MachineryError::already_exists(kind, to));
        }
        map.insert(to.to_string(), value);
    }
    Ok(())
}

/// Applies a batch of rename items.
fn apply_renames(items: &[&DiffItem], existing: &mut Config) -> Result<(), MachineryError> {
    let mut pairs = Vec::with_capacity(items.len());
    for item in items {
        let from = affected_existing(item)?;
        let to = affected_incoming(item)?;
        if !existing.contexts.contains_key(&from.name) {
            return Err(MachineryError::missing(ConfigSide::Existing, EntityKind::Context, &from.name));
        }
        pairs.push((from, to));
    }

    let mut clusters = BTreeSet::new();
    let mut auth_infos = BTreeSet::new();
    let mut contexts = BTreeSet::new();
    for (from, to) in &pairs {
        if from.cluster() != to.cluster() {
            clusters.insert((from.cluster(), to.cluster()));
        }
        if from.auth_info() != to.auth_info() {
            auth_infos.insert((from.auth_info(), to.auth_info()));
        }
        if from.name != to.name {
            contexts.insert((from.name.as_str(), to.name.as_str()));
        }
    }

    move_entries(&mut existing.clusters, EntityKind::Cluster, &clusters)?;
    move_entries(&mut existing.auth_infos, EntityKind::AuthInfo, &auth_infos)?;
    for (from, to) in &pairs {
        if let Some(context) = existing.contexts.get_mut(&from.name) {
            context.cluster = to.cluster().to_string();
            context.auth_info = to.auth_info().to_string();
        }
    }
    move_entries(&mut existing.contexts, EntityKind::Context, &contexts)?;

    if let Some((_, to)) = contexts.iter().find(|(from, _)| *from == existing.current_context) {
        existing.current_context = to.to_string();
    }
    Ok(())
}

fn apply_delete(item: &DiffItem, existing: &mut Config) -> Result<(), MachineryError> {
    let target = affected_existing(item)?;
    existing.clusters.remove(target.cluster());
    existing.auth_infos.remove(target.auth_info());
    existing.contexts.remove(&target.name);
    if existing.current_context == target.name {
        existing.current_context.clear();
    }
    Ok(())
}

fn apply_replace(item: &DiffItem, existing: &mut Config, incoming: &Config) -> Result<(), MachineryError> {
    let old = affected_existing(item)?;
    let new = affected_incoming(item)?;
    let cluster = lookup(&incoming.clusters, ConfigSide::Incoming, EntityKind::Cluster, new.cluster())?.clone();
    let auth_info = lookup(&incoming.auth_infos, ConfigSide::Incoming, EntityKind::AuthInfo, new.auth_info())?.clone();
    let context = lookup(&incoming.contexts, ConfigSide::Incoming, EntityKind::Context, &new.name)?.clone();

    existing.clusters.remove(old.cluster());
    existing.auth_infos.remove(old.auth_info());
    existing.contexts.remove(&old.name);

    existing.clusters.insert(new.cluster().to_string(), cluster);
    existing.auth_infos.insert(new.auth_info().to_string(), auth_info);
    existing.contexts.insert(new.name.clone(), context);
    if existing.current_context == old.name {
        existing.current_context = new.name.clone();
    }
    Ok(())
}

fn apply_modify(item: &DiffItem, existing: &mut Config, incoming: &Config) -> Result<(), MachineryError> {
    if item.complex.contains(ComplexDiff::RenameRequired) {
        panic!("bug: RenameRequired used with a Modify diff item");
    }
    let target = affected_existing(item)?;
    let source = affected_incoming(item)?;

    for change in item.complex.iter() {
        match change {
            ComplexDiff::ServerChanged => {
                let server = &lookup(&incoming.clusters, ConfigSide::Incoming, EntityKind::Cluster, source.cluster())?.server;
                let cluster = existing
                    .clusters
                    .get_mut(target.cluster())
                    .ok_or_else(|| MachineryError::missing(ConfigSide::Existing, EntityKind::Cluster, target.cluster()))?;
                cluster.server = server.clone();
            }
            ComplexDiff::UserAuthChanged => {
                let auth_info =
                    lookup(&incoming.auth_infos, ConfigSide::Incoming, EntityKind::AuthInfo, source.auth_info())?;
                existing
                    .auth_infos
                    .insert(target.auth_info().to_string(), auth_info.clone());
            }
            ComplexDiff::ClusterCAChanged => {
                let ca_data = &lookup(&incoming.clusters, ConfigSide::Incoming, EntityKind::Cluster, source.cluster())?
                    .certificate_authority_data;
                let cluster = existing
                    .clusters
                    .get_mut(target.cluster())
                    .ok_or_else(|| MachineryError::missing(ConfigSide::Existing, EntityKind::Cluster, target.cluster()))?;
                cluster.certificate_authority_data = ca_data.clone();
            }
            ComplexDiff::PreferencesChanged => {}
            ComplexDiff::RenameRequired => unreachable!("rejected above"),
        }
    }
    Ok(())
}
