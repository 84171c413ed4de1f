//! Discovery and access of the local kubeconfig.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::config::{write_private, KitConfig};
use super::errors::KitError;
use crate::api::{self, Config};

/// Environment variable kubectl reads its config path list from.
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

/// LocalData is the parsed local kubeconfig and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalData {
    pub path: PathBuf,
    pub config: Config,
}

/// `~/.kube/config`.
pub fn default_kubeconfig_path() -> Result<PathBuf, KitError> {
    let home = dirs::home_dir().ok_or(KitError::HomeDirUnavailable)?;
    Ok(home.join(".kube").join("config"))
}

/// Locates the kubeconfig file kit should manage.
///
/// `KUBECONFIG` takes precedence, but it must name exactly one existing file.
pub fn find_kubeconfig_store() -> Result<PathBuf, KitError> {
    let env = std::env::var_os(KUBECONFIG_ENV);
    kubeconfig_store_from(env.as_deref(), default_kubeconfig_path)
}

fn kubeconfig_store_from(
    env: Option<&OsStr>,
    default: impl FnOnce() -> Result<PathBuf, KitError>,
) -> Result<PathBuf, KitError> {
    let value = match env {
        Some(value) if !value.is_empty() => value,
        _ => return default(),
    };
    let mut paths = std::env::split_paths(value);
    let path = match (paths.next(), paths.next()) {
        (Some(path), None) => path,
        _ => {
            return Err(KitError::MultipleKubeconfigs {
                value: value.to_string_lossy().into_owned(),
            })
        }
    };
    if !path.exists() {
        return Err(KitError::KubeconfigDoesNotExist { path });
    }
    debug!(path = %path.display(), "using kubeconfig from {}", KUBECONFIG_ENV);
    Ok(path)
}

/// Loads a kubeconfig file from disk.
pub fn read_kubeconfig(path: &Path) -> Result<Config, KitError> {
    if !path.exists() {
        return Err(KitError::KubeconfigDoesNotExist {
            path: path.to_path_buf(),
        });
    }
    let data = fs::read_to_string(path).map_err(|e| KitError::io(path, e))?;
    Ok(api::from_yaml(&data)?)
}

/// Stores a kubeconfig file, readable only by its owner.
pub fn write_kubeconfig(path: &Path, config: &Config) -> Result<(), KitError> {
    let data = api::to_yaml(config)?;
    write_private(path, &data)
}

/// Reads the kubeconfig tracked by the kit settings.
pub fn read_local_data(config: &KitConfig) -> Result<LocalData, KitError> {
    let path = config.kubeconfig_path.clone();
    let config = read_kubeconfig(&path)?;
    debug!(path = %path.display(), contexts = config.contexts.len(), "read local kubeconfig");
    Ok(LocalData { path, config })
}

/// Overwrites the tracked kubeconfig with `data`.
pub fn write_local_data(data: &LocalData) -> Result<(), KitError> {
    write_kubeconfig(&data.path, &data.config)
}
