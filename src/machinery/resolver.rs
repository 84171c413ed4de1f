//! Conflict resolution for colliding entity names.

use super::errors::{EntityKind, MachineryError};
use tracing::trace;

/// ConflictResolver picks a replacement name when an inserted entity collides
/// with an existing one.
pub trait ConflictResolver {
    /// Returns a name derived from `old_name` that `validate` accepts.
    ///
    /// `validate` is pure and may be called any number of times.
    fn rename(
        &self,
        kind: EntityKind,
        old_name: &str,
        validate: &dyn Fn(&str) -> Result<(), MachineryError>,
    ) -> Result<String, MachineryError>;
}

/// AutoResolver appends an incrementing suffix: `name-1`, `name-2`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoResolver {
    limit: u32,
}

/// Shared stateless instance of the default resolver.
pub static AUTO_RESOLVER: AutoResolver = AutoResolver::new();

impl AutoResolver {
    /// Creates a resolver that tries every suffix up to `u32::MAX`.
    pub const fn new() -> Self {
        AutoResolver { limit: u32::MAX }
    }

    /// Creates a resolver that gives up after `limit` candidates.
    pub const fn with_limit(limit: u32) -> Self {
        AutoResolver { limit }
    }
}

impl Default for AutoResolver {
    fn default() -> Self {
        AutoResolver::new()
    }
}

impl ConflictResolver for AutoResolver {
    fn rename(
        &self,
        kind: EntityKind,
        old_name: &str,
        validate: &dyn Fn(&str) -> Result<(), MachineryError>,
    ) -> Result<String, MachineryError> {
        for i in 1..=self.limit {
            let candidate = format!("{}-{}", old_name, i);
            match validate(&candidate) {
                Ok(()) => return Ok(candidate),
                Err(e) => trace!(%kind, %candidate, error = %e, "rejected rename candidate"),
            }
        }
        Err(MachineryError::exhausted(kind, old_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn taken(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn rename_against(resolver: &AutoResolver, existing: &BTreeSet<String>, name: &str) -> Result<String, MachineryError> {
        resolver.rename(EntityKind::Cluster, name, &|candidate| {
            if existing.contains(candidate) {
                Err(MachineryError::already_exists(EntityKind::Cluster, candidate))
            } else {
                Ok(())
            }
        })
    }

    #[test]
    fn test_first_suffix() {
        let existing = taken(&["prod"]);
        assert_eq!(rename_against(&AUTO_RESOLVER, &existing, "prod").unwrap(), "prod-1");
    }

    #[test]
    fn test_next_free_suffix() {
        let existing = taken(&["prod", "prod-1", "prod-2"]);
        assert_eq!(rename_against(&AutoResolver::default(), &existing, "prod").unwrap(), "prod-3");
    }

    #[test]
    fn test_exhaustion_is_an_error() {
        let existing = taken(&["prod", "prod-1", "prod-2"]);
        let resolver = AutoResolver::with_limit(2);
        assert_eq!(
            rename_against(&resolver, &existing, "prod").unwrap_err(),
            MachineryError::exhausted(EntityKind::Cluster, "prod")
        );
    }
}
