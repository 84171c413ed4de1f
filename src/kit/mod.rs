//! Kit module - The local environment around the reconciliation engine.
//!
//! This module covers kit's settings directory, discovery of the local
//! kubeconfig and the on-disk cache of the remote store.

mod cache;
mod config;
mod errors;
mod local;

pub use cache::{compute_incoming_diff, IncomingDiff, RemoteCache};
pub use config::{init_local, KitConfig, KitDir, KIT_HOME_ENV};
pub use errors::KitError;
pub use local::{
    default_kubeconfig_path, find_kubeconfig_store, read_kubeconfig, read_local_data, write_kubeconfig,
    write_local_data, LocalData, KUBECONFIG_ENV,
};
