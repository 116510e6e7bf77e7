//! Deployment request model

use std::collections::BTreeMap;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Opaque bag of provider credentials forwarded to the orchestrator
///
/// The tracker never interprets the entries; they are serialized onto the
/// wire once at job start. Values are secrets and never appear in Debug
/// output or logs.
#[derive(Default)]
pub struct DeploymentRequest {
    credentials: BTreeMap<String, SecretString>,
}

impl DeploymentRequest {
    /// Create an empty request
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credential entry
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.credentials
            .insert(key.into(), SecretString::from(value.into()));
    }

    /// Credential keys, for summary display
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.credentials.keys().map(String::as_str)
    }

    /// Number of credential entries
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Check if the request carries no entries
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

impl fmt::Debug for DeploymentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentRequest")
            .field("credentials", &format!("<{} entries redacted>", self.credentials.len()))
            .finish()
    }
}

impl FromIterator<(String, String)> for DeploymentRequest {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            credentials: iter
                .into_iter()
                .map(|(key, value)| (key, SecretString::from(value)))
                .collect(),
        }
    }
}

// Secrets cross into plaintext only here, at the wire boundary.
impl Serialize for DeploymentRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.credentials.len()))?;
        for (key, value) in &self.credentials {
            map.serialize_entry(key, value.expose_secret())?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DeploymentRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}
