//! API module - In-memory kubeconfig model.
//!
//! This module defines clusters, auth infos, contexts and the config that
//! holds them, plus the YAML codec for the kubeconfig file layout.

mod equals;
mod serialize;
mod types;

pub use equals::*;
pub use serialize::{from_yaml, to_yaml, DuplicateNameError, KubeConfigFile};
pub use types::*;
