//! The on-disk copy of the remote store.
//!
//! The cache is written read-only so that it is never edited by hand; kit
//! temporarily lifts the restriction while rewriting it.

use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{debug, info};

use super::config::{set_mode, KitConfig, KitDir};
use super::errors::KitError;
use super::local::{read_local_data, LocalData};
use crate::api::Config;
use crate::machinery::{compute_diff, ConflictResolver, Diff};

/// RemoteCache holds the latest remote kubeconfig and every one it replaced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteCache {
    #[serde(default)]
    pub latest: Config,

    #[serde(default)]
    pub history: Vec<Config>,
}

impl RemoteCache {
    pub fn exists(dir: &KitDir) -> bool {
        dir.remote_cache_path().exists()
    }

    pub fn read(dir: &KitDir) -> Result<Self, KitError> {
        let path = dir.remote_cache_path();
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(KitError::RemoteCacheNotFound { path })
            }
            Err(e) => return Err(KitError::io(&path, e)),
        };
        Ok(serde_yaml::from_str(&data)?)
    }

    pub fn write(&self, dir: &KitDir) -> Result<(), KitError> {
        let path = dir.remote_cache_path();
        let data = serde_yaml::to_string(self)?;
        if path.exists() {
            set_mode(&path, 0o600)?;
        }
        let written = fs::write(&path, data).map_err(|e| KitError::io(&path, e));
        set_mode(&path, 0o400)?;
        written
    }

    /// Makes `config` the latest remote state.
    ///
    /// The previous latest is kept in history unless it is empty or equal to
    /// `config`.
    pub fn record(&mut self, config: Config) {
        if self.latest == config {
            debug!("remote state unchanged");
            return;
        }
        let previous = std::mem::replace(&mut self.latest, config);
        if !previous.is_empty() {
            self.history.push(previous);
        }
    }
}

/// The local kubeconfig, the cached remote state and the diff between them.
#[derive(Debug, Clone)]
pub struct IncomingDiff {
    pub local: LocalData,
    pub remote: RemoteCache,
    pub diff: Diff,
}

impl IncomingDiff {
    /// Applies the diff to the local kubeconfig in memory.
    pub fn apply(mut self, resolver: &dyn ConflictResolver) -> Result<LocalData, KitError> {
        self.diff
            .apply(&mut self.local.config, &self.remote.latest, resolver)?;
        Ok(self.local)
    }
}

/// Diffs the tracked local kubeconfig against the cached remote state.
pub fn compute_incoming_diff(dir: &KitDir, config: &KitConfig) -> Result<IncomingDiff, KitError> {
    let local = read_local_data(config)?;
    let remote = RemoteCache::read(dir)?;
    let diff = compute_diff(&local.config, &remote.latest)?;
    info!(items = diff.len(), "computed incoming diff");
    Ok(IncomingDiff { local, remote, diff })
}
