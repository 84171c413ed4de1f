//! # kubekit
//!
//! Reconciliation of kubeconfig files.
//!
//! Given an existing kubeconfig and an incoming one, this library classifies
//! every incoming context (new, renamed, modified, replaced or deleted), and
//! applies that classification to the existing config, renaming entities
//! whose names would otherwise collide.
//!
//! ## Modules
//!
//! - [`api`] - Kubeconfig entities and the YAML codec
//! - [`machinery`] - Diff computation, diff application and conflict resolution
//! - [`kit`] - Local settings, kubeconfig discovery and the remote cache

pub mod api;
pub mod kit;
pub mod machinery;

pub use api::{AuthInfo, Cluster, Config, Context};
pub use kit::KitError;
pub use machinery::{
    compute_diff, AutoResolver, ChangeKind, ComplexDiff, ConflictResolver, Diff, DiffItem, MachineryError,
};
