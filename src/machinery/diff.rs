//! Diff computation between an existing and an incoming kubeconfig.
//!
//! Every incoming context is classified against the existing config by a
//! cascade of matching heuristics:
//!
//! 1. Exact match (same names, equal content): nothing to do.
//! 2. A single existing context with an equal cluster and an equal auth info:
//!    `Rename`.
//! 3. Only the cluster matches: the credentials changed.
//! 4. Only the auth info matches: the server URL and/or the CA changed.
//! 5. Only the CA data matches: same trust anchor, new server and credentials.
//! 6. Only the server URL matches: a different identity now serves the
//!    endpoint, `Replace`.
//! 7. Otherwise the context is `New`, flagged
//!    `RenameRequired` if any of its names is already taken.
//!
//! A second pass marks existing contexts that nothing refers to and that have
//! no equal counterpart in the incoming config as `Delete`.
//!
//! Scans run in ascending context name order and the first match wins.

use super::errors::{ConfigSide, EntityKind, MachineryError};
use super::types::{ComplexDiff, ComplexDiffType, Diff, DiffItem, NamedContext};
use crate::api::{auth_infos_equal, ca_data_equal, clusters_equal, AuthInfo, Cluster, Config, Context};
use tracing::debug;

/// A context with its cluster and auth info looked up.
#[derive(Debug, Clone, Copy)]
struct ResolvedContext<'a> {
    name: &'a str,
    context: &'a Context,
    cluster: &'a Cluster,
    auth_info: &'a AuthInfo,
}

impl<'a> ResolvedContext<'a> {
    fn named(&self) -> NamedContext {
        NamedContext::new(self.name, self.context)
    }

    /// Equal cluster and equal auth info, regardless of names.
    fn same_content(&self, other: &ResolvedContext<'_>) -> bool {
        clusters_equal(self.cluster, other.cluster) && auth_infos_equal(self.auth_info, other.auth_info)
    }

    /// Same context name, same referenced names and equal content.
    fn exact_match(&self, other: &ResolvedContext<'_>) -> bool {
        self.name == other.name
            && self.context.cluster == other.context.cluster
            && self.context.auth_info == other.context.auth_info
            && self.same_content(other)
    }
}

/// Resolves every context of a config in name order.
///
/// Fails on the first context whose cluster or auth info does not exist.
fn resolve_contexts(config: &Config, side: ConfigSide) -> Result<Vec<ResolvedContext<'_>>, MachineryError> {
    let mut resolved = Vec::with_capacity(config.contexts.len());
    for (name, context) in &config.contexts {
        let cluster = config
            .cluster_of(context)
            .ok_or_else(|| MachineryError::malformed(side, name, EntityKind::Cluster, &context.cluster))?;
        let auth_info = config
            .auth_info_of(context)
            .ok_or_else(|| MachineryError::malformed(side, name, EntityKind::AuthInfo, &context.auth_info))?;
        resolved.push(ResolvedContext {
            name: name.as_str(),
            context,
            cluster,
            auth_info,
        });
    }
    Ok(resolved)
}

/// Checks that every context of the config references existing entities.
pub fn validate_config(config: &Config, side: ConfigSide) -> Result<(), MachineryError> {
    resolve_contexts(config, side).map(|_| ())
}

/// Outcome of scanning the existing contexts for content matches.
enum ContentMatch<'a> {
    Both(ResolvedContext<'a>),
    Cluster(ResolvedContext<'a>),
    AuthInfo(ResolvedContext<'a>),
    Nothing,
}

/// Looks for existing contexts whose cluster and/or auth info equal the
/// incoming ones.
///
/// A context matching both wins outright. Otherwise the first cluster match
/// is preferred over the first auth info match, even when both exist on
/// different contexts.
fn find_content_match<'a>(existing: &[ResolvedContext<'a>], incoming: &ResolvedContext<'_>) -> ContentMatch<'a> {
    let mut cluster_match = None;
    let mut auth_match = None;
    for candidate in existing {
        let cluster_equal = clusters_equal(candidate.cluster, incoming.cluster);
        let auth_equal = auth_infos_equal(candidate.auth_info, incoming.auth_info);
        if cluster_equal && auth_equal {
            return ContentMatch::Both(*candidate);
        }
        if cluster_equal && cluster_match.is_none() {
            cluster_match = Some(*candidate);
        }
        if auth_equal && auth_match.is_none() {
            auth_match = Some(*candidate);
        }
    }
    match (cluster_match, auth_match) {
        (Some(c), _) => ContentMatch::Cluster(c),
        (None, Some(a)) => ContentMatch::AuthInfo(a),
        (None, None) => ContentMatch::Nothing,
    }
}

/// Classifies one incoming context. Returns None if it is already present.
fn classify(existing: &Config, candidates: &[ResolvedContext<'_>], incoming: &ResolvedContext<'_>) -> Option<DiffItem> {
    if candidates.iter().any(|candidate| candidate.exact_match(incoming)) {
        return None;
    }

    match find_content_match(candidates, incoming) {
        ContentMatch::Both(matched) => return Some(DiffItem::rename(matched.named(), incoming.named())),
        ContentMatch::Cluster(matched) => {
            return Some(DiffItem::modify(
                matched.named(),
                incoming.named(),
                ComplexDiff::UserAuthChanged.into(),
            ))
        }
        ContentMatch::AuthInfo(matched) => {
            let mut complex = ComplexDiffType::new();
            if matched.cluster.server != incoming.cluster.server {
                complex.insert(ComplexDiff::ServerChanged);
            }
            if !ca_data_equal(matched.cluster, incoming.cluster) {
                complex.insert(ComplexDiff::ClusterCAChanged);
            }
            return Some(DiffItem::modify(matched.named(), incoming.named(), complex));
        }
        ContentMatch::Nothing => {}
    }

    // Empty CA data on both sides counts as equal.
    if let Some(matched) = candidates
        .iter()
        .find(|candidate| ca_data_equal(candidate.cluster, incoming.cluster))
    {
        return Some(DiffItem::modify(
            matched.named(),
            incoming.named(),
            ComplexDiff::UserAuthChanged | ComplexDiff::ServerChanged,
        ));
    }

    if let Some(matched) = candidates
        .iter()
        .find(|candidate| candidate.cluster.server == incoming.cluster.server)
    {
        return Some(DiffItem::replace(matched.named(), incoming.named()));
    }

    let rename_required = existing.contexts.contains_key(incoming.name)
        || existing.clusters.contains_key(&incoming.context.cluster)
        || existing.auth_infos.contains_key(&incoming.context.auth_info);
    Some(DiffItem::new_context(incoming.named(), rename_required))
}

/// Computes the edits that turn `existing` into `incoming`.
///
/// Neither config is modified. Fails if either config has a context that
/// references a missing cluster or auth info.
pub fn compute_diff(existing: &Config, incoming: &Config) -> Result<Diff, MachineryError> {
    let existing_contexts = resolve_contexts(existing, ConfigSide::Existing)?;
    let incoming_contexts = resolve_contexts(incoming, ConfigSide::Incoming)?;

    let mut diff = Diff::new();
    for context in &incoming_contexts {
        if let Some(item) = classify(existing, &existing_contexts, context) {
            debug!(context = context.name, change = %item.change_type, complex = %item.complex, "classified incoming context");
            diff.push(item);
        }
    }

    for context in &existing_contexts {
        if diff.references_existing(context.name) {
            continue;
        }
        if incoming_contexts.iter().any(|incoming| incoming.same_content(context)) {
            continue;
        }
        debug!(context = context.name, "existing context has no incoming counterpart");
        diff.push(DiffItem::delete(context.named()));
    }

    Ok(diff)
}
