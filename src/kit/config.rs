//! Kit settings and the directory that holds them.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::errors::KitError;
use super::local::find_kubeconfig_store;

/// Environment variable overriding the kit directory.
pub const KIT_HOME_ENV: &str = "KIT_HOME";

const DEFAULT_DIR: &str = ".kit";
const CONFIG_FILE: &str = "config.yaml";
const REMOTE_CACHE_FILE: &str = "remote.yaml";

/// KitDir is the directory holding kit's settings and remote cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitDir {
    root: PathBuf,
}

impl KitDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        KitDir { root: root.into() }
    }

    /// Resolves the kit directory.
    ///
    /// Priority:
    /// 1. `KIT_HOME` environment variable
    /// 2. `~/.kit`
    pub fn from_env() -> Result<Self, KitError> {
        if let Some(custom) = std::env::var_os(KIT_HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(KitDir::new(custom));
        }
        let home = dirs::home_dir().ok_or(KitError::HomeDirUnavailable)?;
        Ok(KitDir::new(home.join(DEFAULT_DIR)))
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn remote_cache_path(&self) -> PathBuf {
        self.root.join(REMOTE_CACHE_FILE)
    }

    pub fn is_initialized(&self) -> bool {
        self.config_path().exists()
    }

    /// Creates the directory and writes a fresh settings file.
    ///
    /// Fails with `AlreadyInitialized` if a settings file already exists; it
    /// is never overwritten.
    pub fn init(&self, remote_url: &str, kubeconfig_path: PathBuf) -> Result<KitConfig, KitError> {
        if self.is_initialized() {
            return Err(KitError::AlreadyInitialized {
                path: self.root.clone(),
            });
        }
        create_private_dir(&self.root)?;

        let config = KitConfig {
            remote_url: remote_url.to_string(),
            kubeconfig_path,
        };
        config.write(self)?;
        info!(dir = %self.root.display(), "initialized local configuration");
        Ok(config)
    }
}

/// KitConfig is the persisted kit settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitConfig {
    /// Address of the remote secret store.
    pub remote_url: String,

    /// Local kubeconfig file kept in sync.
    pub kubeconfig_path: PathBuf,
}

impl KitConfig {
    pub fn read(dir: &KitDir) -> Result<Self, KitError> {
        let path = dir.config_path();
        let data = fs::read_to_string(&path).map_err(|e| KitError::io(&path, e))?;
        Ok(serde_yaml::from_str(&data)?)
    }

    pub fn write(&self, dir: &KitDir) -> Result<(), KitError> {
        let path = dir.config_path();
        let data = serde_yaml::to_string(self)?;
        write_private(&path, &data)
    }
}

/// Initializes kit in `dir`, tracking the discovered local kubeconfig.
pub fn init_local(dir: &KitDir, remote_url: &str) -> Result<KitConfig, KitError> {
    if dir.is_initialized() {
        return Err(KitError::AlreadyInitialized {
            path: dir.path().to_path_buf(),
        });
    }
    let store = find_kubeconfig_store()?;
    dir.init(remote_url, store)
}

fn create_private_dir(path: &Path) -> Result<(), KitError> {
    fs::create_dir_all(path).map_err(|e| KitError::io(path, e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o700)).map_err(|e| KitError::io(path, e))?;
    }
    Ok(())
}

/// Writes a file readable only by its owner.
pub(crate) fn write_private(path: &Path, data: &str) -> Result<(), KitError> {
    fs::write(path, data).map_err(|e| KitError::io(path, e))?;
    set_mode(path, 0o600)
}

#[cfg(unix)]
pub(crate) fn set_mode(path: &Path, mode: u32) -> Result<(), KitError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| KitError::io(path, e))
}

#[cfg(not(unix))]
pub(crate) fn set_mode(path: &Path, mode: u32) -> Result<(), KitError> {
    let metadata = fs::metadata(path).map_err(|e| KitError::io(path, e))?;
    let mut permissions = metadata.permissions();
    permissions.set_readonly(mode & 0o200 == 0);
    fs::set_permissions(path, permissions).map_err(|e| KitError::io(path, e))
}
