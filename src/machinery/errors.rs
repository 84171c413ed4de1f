//! Errors raised by the diff and apply engines.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// EntityKind names one of the three named maps of a config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityKind {
    Cluster,
    AuthInfo,
    Context,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Cluster => write!(f, "cluster"),
            EntityKind::AuthInfo => write!(f, "auth info"),
            EntityKind::Context => write!(f, "context"),
        }
    }
}

/// ConfigSide tells which of the two configs an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConfigSide {
    Existing,
    Incoming,
}

impl fmt::Display for ConfigSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSide::Existing => write!(f, "existing"),
            ConfigSide::Incoming => write!(f, "incoming"),
        }
    }
}

/// MachineryError represents a failure to diff or apply configs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineryError {
    /// A context references a cluster or auth info absent from its own config.
    #[error("{side} config is ill-formed: context {context} references nonexistent {kind} {name}")]
    MalformedConfig {
        side: ConfigSide,
        context: String,
        kind: EntityKind,
        name: String,
    },

    #[error("an item with this name already exists: {kind} {name}")]
    ItemAlreadyExists { kind: EntityKind, name: String },

    /// The conflict resolver ran out of candidate names.
    #[error("failed to rename {kind} {name}: no acceptable name found")]
    NameSpaceExhausted { kind: EntityKind, name: String },

    /// A diff item names an entity that is not in the config it refers to.
    #[error("diff refers to {kind} {name} which is missing from the {side} config")]
    MissingEntity {
        side: ConfigSide,
        kind: EntityKind,
        name: String,
    },

    #[error("{change} diff item has no affected {side} context")]
    IncompleteItem { side: ConfigSide, change: String },
}

impl MachineryError {
    /// Creates a malformed config error.
    pub fn malformed(
        side: ConfigSide,
        context: impl Into<String>,
        kind: EntityKind,
        name: impl Into<String>,
    ) -> Self {
        MachineryError::MalformedConfig {
            side,
            context: context.into(),
            kind,
            name: name.into(),
        }
    }

    /// Creates an item already exists error.
    pub fn already_exists(kind: EntityKind, name: impl Into<String>) -> Self {
        MachineryError::ItemAlreadyExists {
            kind,
            name: name.into(),
        }
    }

    /// Creates a name space exhausted error.
    pub fn exhausted(kind: EntityKind, name: impl Into<String>) -> Self {
        MachineryError::NameSpaceExhausted {
            kind,
            name: name.into(),
        }
    }

    /// Creates a missing entity error.
    pub fn missing(side: ConfigSide, kind: EntityKind, name: impl Into<String>) -> Self {
        MachineryError::MissingEntity {
            side,
            kind,
            name: name.into(),
        }
    }
}
