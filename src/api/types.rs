//! Kubeconfig entity types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::serialize::{base64_bytes, named_extensions, KubeConfigFile};

/// Extensions is the opaque extension bag carried by kubeconfig entities.
///
/// The engine never interprets it; it only travels along when an entity is copied.
pub type Extensions = BTreeMap<String, serde_yaml::Value>;

fn is_false(b: &bool) -> bool {
    !*b
}

/// Cluster holds the endpoint and trust anchor of a Kubernetes API server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Cluster {
    #[serde(default)]
    pub server: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_server_name: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub insecure_skip_tls_verify: bool,

    /// Path to a CA bundle on disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_authority: Option<String>,

    /// PEM-encoded CA bundle. Stored base64 encoded in the file.
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "base64_bytes")]
    pub certificate_authority_data: Vec<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", with = "named_extensions")]
    pub extensions: Extensions,

    /// Fields not modelled here, carried through unchanged.
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_yaml::Value>,
}

impl Cluster {
    /// Creates a cluster from a server URL and CA data.
    pub fn new(server: impl Into<String>, ca_data: impl Into<Vec<u8>>) -> Self {
        Cluster {
            server: server.into(),
            certificate_authority_data: ca_data.into(),
            ..Default::default()
        }
    }
}

/// AuthInfo is a credential record used to authenticate against a cluster.
///
/// The engine treats it as opaque: two auth infos are equal only if every
/// field is equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AuthInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_certificate: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "base64_bytes")]
    pub client_certificate_data: Vec<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "base64_bytes")]
    pub client_key_data: Vec<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default, rename = "tokenFile", skip_serializing_if = "Option::is_none")]
    pub token_file: Option<String>,

    #[serde(default, rename = "as", skip_serializing_if = "Option::is_none")]
    pub impersonate: Option<String>,

    #[serde(default, rename = "as-uid", skip_serializing_if = "Option::is_none")]
    pub impersonate_uid: Option<String>,

    #[serde(default, rename = "as-groups", skip_serializing_if = "Vec::is_empty")]
    pub impersonate_groups: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_provider: Option<serde_yaml::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<serde_yaml::Value>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", with = "named_extensions")]
    pub extensions: Extensions,

    /// Fields not modelled here, carried through unchanged.
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_yaml::Value>,
}

/// Context binds one cluster to one auth info by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub cluster: String,

    #[serde(rename = "user")]
    pub auth_info: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", with = "named_extensions")]
    pub extensions: Extensions,

    /// Fields not modelled here, carried through unchanged.
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_yaml::Value>,
}

impl Context {
    /// Creates a context referencing the given cluster and auth info names.
    pub fn new(cluster: impl Into<String>, auth_info: impl Into<String>) -> Self {
        Context {
            cluster: cluster.into(),
            auth_info: auth_info.into(),
            ..Default::default()
        }
    }
}

/// Config is a full kubeconfig: named clusters, auth infos and contexts.
///
/// Maps are ordered by name, so iteration over any of them is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "KubeConfigFile", into = "KubeConfigFile")]
pub struct Config {
    pub clusters: BTreeMap<String, Cluster>,
    pub auth_infos: BTreeMap<String, AuthInfo>,
    pub contexts: BTreeMap<String, Context>,
    pub current_context: String,
    pub preferences: serde_yaml::Mapping,
    pub extensions: Extensions,
    /// Top-level fields not modelled here, carried through unchanged.
    pub other: BTreeMap<String, serde_yaml::Value>,
}

impl Config {
    /// Creates a new empty Config.
    pub fn new() -> Self {
        Config::default()
    }

    /// Returns the cluster a context points at, if it exists.
    pub fn cluster_of(&self, context: &Context) -> Option<&Cluster> {
        self.clusters.get(&context.cluster)
    }

    /// Returns the auth info a context points at, if it exists.
    pub fn auth_info_of(&self, context: &Context) -> Option<&AuthInfo> {
        self.auth_infos.get(&context.auth_info)
    }

    /// Returns true if there are no contexts, clusters or auth infos.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty() && self.auth_infos.is_empty() && self.contexts.is_empty()
    }
}
