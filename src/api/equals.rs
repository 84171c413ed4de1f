//! Equality predicates used when matching entities across two configs.
//!
//! Derived `PartialEq` compares every field. Matching only looks at the parts
//! that define an entity's identity.

use super::types::{AuthInfo, Cluster};

/// Returns true if both clusters point at the same server with the same CA.
///
/// Other cluster settings (proxy, TLS server name, extensions) are carried
/// along but never make two clusters different for matching.
pub fn clusters_equal(a: &Cluster, b: &Cluster) -> bool {
    a.server == b.server && ca_data_equal(a, b)
}

/// Returns true if both clusters carry byte-identical CA data.
pub fn ca_data_equal(a: &Cluster, b: &Cluster) -> bool {
    a.certificate_authority_data == b.certificate_authority_data
}

/// Returns true if the two auth infos are structurally identical.
pub fn auth_infos_equal(a: &AuthInfo, b: &AuthInfo) -> bool {
    a == b
}
