//! Errors raised while working with the local kit environment.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::machinery::MachineryError;

/// KitError covers filesystem, codec and environment failures around the
/// reconciliation engine.
#[derive(Debug, Error)]
pub enum KitError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Machinery(#[from] MachineryError),

    #[error("KUBECONFIG must name a single file, got {value:?}")]
    MultipleKubeconfigs { value: String },

    #[error("kubeconfig {} does not exist", path.display())]
    KubeconfigDoesNotExist { path: PathBuf },

    #[error("cannot determine the home directory")]
    HomeDirUnavailable,

    #[error("kit is already initialized in {}", path.display())]
    AlreadyInitialized { path: PathBuf },

    #[error("remote cache {} not found, fetch remote data first", path.display())]
    RemoteCacheNotFound { path: PathBuf },
}

impl KitError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        KitError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Reports whether kit was already set up.
    pub fn is_already_initialized(&self) -> bool {
        matches!(self, KitError::AlreadyInitialized { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machinery::{ConfigSide, EntityKind};

    #[test]
    fn test_error_messages() {
        let err = KitError::MultipleKubeconfigs {
            value: "a:b".to_string(),
        };
        assert_eq!(err.to_string(), "KUBECONFIG must name a single file, got \"a:b\"");

        let err = KitError::io(
            Path::new("/tmp/missing"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.to_string(), "/tmp/missing: gone");
    }

    #[test]
    fn test_machinery_errors_are_transparent() {
        let inner = MachineryError::malformed(ConfigSide::Incoming, "ctx", EntityKind::Cluster, "c");
        let expected = inner.to_string();
        let err = KitError::from(inner);
        assert_eq!(err.to_string(), expected);
        assert!(!err.is_already_initialized());
    }
}
