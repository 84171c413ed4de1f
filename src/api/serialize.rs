//! Serialization for kubeconfig files.
//!
//! In memory a [`Config`] holds name-keyed maps. On disk a kubeconfig stores
//! each kind as a list of `{name, <kind>}` entries, and every `*-data` field as
//! a base64 string. This module converts between the two layouts.

use super::types::{AuthInfo, Cluster, Config, Context, Extensions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Serde adapter for byte fields stored as base64 strings.
pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.trim())
            .map_err(|e| serde::de::Error::custom(format!("invalid base64 data: {}", e)))
    }
}

/// Serde adapter for `extensions: [{name, extension}]` lists.
pub mod named_extensions {
    use super::Extensions;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct NamedExtension {
        name: String,
        #[serde(default)]
        extension: serde_yaml::Value,
    }

    pub fn serialize<S>(extensions: &Extensions, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let list: Vec<NamedExtension> = extensions
            .iter()
            .map(|(name, extension)| NamedExtension {
                name: name.clone(),
                extension: extension.clone(),
            })
            .collect();
        list.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Extensions, D::Error>
    where
        D: Deserializer<'de>,
    {
        let list: Option<Vec<NamedExtension>> = Option::deserialize(deserializer)?;
        Ok(list
            .unwrap_or_default()
            .into_iter()
            .map(|e| (e.name, e.extension))
            .collect())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NamedCluster {
    name: String,
    cluster: Cluster,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NamedAuthInfo {
    name: String,
    user: AuthInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NamedContextEntry {
    name: String,
    context: Context,
}

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_kind() -> String {
    "Config".to_string()
}

/// KubeConfigFile is the on-disk layout of a kubeconfig.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KubeConfigFile {
    #[serde(rename = "apiVersion", default = "default_api_version")]
    api_version: String,

    #[serde(default = "default_kind")]
    kind: String,

    #[serde(default)]
    preferences: serde_yaml::Mapping,

    #[serde(default, deserialize_with = "null_as_empty")]
    clusters: Vec<NamedCluster>,

    #[serde(default, deserialize_with = "null_as_empty")]
    users: Vec<NamedAuthInfo>,

    #[serde(default, deserialize_with = "null_as_empty")]
    contexts: Vec<NamedContextEntry>,

    #[serde(default)]
    current_context: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", with = "named_extensions")]
    extensions: Extensions,

    #[serde(flatten)]
    other: BTreeMap<String, serde_yaml::Value>,
}

/// `clusters: null` is common in freshly generated kubeconfigs.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// DuplicateNameError is returned when a kubeconfig lists the same name twice
/// within one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateNameError {
    pub kind: &'static str,
    pub name: String,
}

impl fmt::Display for DuplicateNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "duplicate {} name '{}' in kubeconfig", self.kind, self.name)
    }
}

impl std::error::Error for DuplicateNameError {}

fn collect_unique<T>(
    kind: &'static str,
    entries: impl IntoIterator<Item = (String, T)>,
) -> Result<BTreeMap<String, T>, DuplicateNameError> {
    let mut map = BTreeMap::new();
    for (name, value) in entries {
        if map.contains_key(&name) {
            return Err(DuplicateNameError { kind, name });
        }
        map.insert(name, value);
    }
    Ok(map)
}

impl TryFrom<KubeConfigFile> for Config {
    type Error = DuplicateNameError;

    fn try_from(file: KubeConfigFile) -> Result<Self, Self::Error> {
        Ok(Config {
            clusters: collect_unique(
                "cluster",
                file.clusters.into_iter().map(|c| (c.name, c.cluster)),
            )?,
            auth_infos: collect_unique(
                "user",
                file.users.into_iter().map(|u| (u.name, u.user)),
            )?,
            contexts: collect_unique(
                "context",
                file.contexts.into_iter().map(|c| (c.name, c.context)),
            )?,
            current_context: file.current_context,
            preferences: file.preferences,
            extensions: file.extensions,
            other: file.other,
        })
    }
}

impl From<Config> for KubeConfigFile {
    fn from(config: Config) -> Self {
        KubeConfigFile {
            api_version: default_api_version(),
            kind: default_kind(),
            preferences: config.preferences,
            clusters: config
                .clusters
                .into_iter()
                .map(|(name, cluster)| NamedCluster { name, cluster })
                .collect(),
            users: config
                .auth_infos
                .into_iter()
                .map(|(name, user)| NamedAuthInfo { name, user })
                .collect(),
            contexts: config
                .contexts
                .into_iter()
                .map(|(name, context)| NamedContextEntry { name, context })
                .collect(),
            current_context: config.current_context,
            extensions: config.extensions,
            other: config.other,
        }
    }
}

/// Parses a kubeconfig from YAML.
pub fn from_yaml(yaml: &str) -> Result<Config, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}

/// Serializes a kubeconfig to YAML.
pub fn to_yaml(config: &Config) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(config)
}
