//! Registry configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Configuration for a [`RoleRegistry`](crate::RoleRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry name. The registry address is derived from the owner and this.
    pub name: String,

    /// Grant the registry's own address use-permission on every stored handle.
    pub grant_registry_access: bool,

    /// Verify the persisted event chain when reopening.
    pub verify_chain_on_open: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name: "roles".to_string(),
            grant_registry_access: true,
            verify_chain_on_open: true,
        }
    }
}

impl RegistryConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
