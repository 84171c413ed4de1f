//! Machinery module - Diff and apply engine for kubeconfigs.
//!
//! [`compute_diff`] classifies every incoming context against an existing
//! config, and [`Diff::apply`] mutates the existing config toward the
//! incoming one, using a [`ConflictResolver`] when names collide.

mod apply;
mod diff;
mod errors;
mod resolver;
mod types;

#[cfg(test)]
mod fixtures;

#[cfg(test)]
mod diff_test;


pub use apply::*;
pub use diff::*;
pub use errors::*;
pub use resolver::*;
pub use types::*;
