//! Shared configs for the machinery tests.

use crate::api::{AuthInfo, Cluster, Config, Context};

/// Builds a config with `cluster{id}`, `authInfo{id}` and `context{id}` for
/// every id. Every entity is distinct from those of other ids.
pub fn sample_config(ids: &[u32]) -> Config {
    let mut config = Config::new();
    for id in ids {
        config.clusters.insert(
            format!("cluster{}", id),
            Cluster::new(
                format!("https://host{}:6443", id),
                format!("cluster{}CA", id).into_bytes(),
            ),
        );
        config.auth_infos.insert(
            format!("authInfo{}", id),
            AuthInfo {
                client_certificate_data: format!("user{}ClientCert", id).into_bytes(),
                client_key_data: format!("user{}ClientKey", id).into_bytes(),
                ..Default::default()
            },
        );
        config.contexts.insert(
            format!("context{}", id),
            Context::new(format!("cluster{}", id), format!("authInfo{}", id)),
        );
    }
    config
}

/// Moves a map entry to a new key.
pub fn rekey<T>(map: &mut std::collections::BTreeMap<String, T>, from: &str, to: &str) {
    let value = map.remove(from).unwrap();
    map.insert(to.to_string(), value);
}
