//! Logical server names mapped to the commands that launch them.
//!
//! The registry is loaded once at startup and never mutated afterwards; it is
//! shared by reference into every invocation.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
};

/// How to launch one upstream server process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDescriptor {
    /// Program to execute.
    pub command: String,
    /// Arguments passed to the program.
    #[serde(default)]
    pub args: Vec<String>,
    /// Variables overlaid on the inherited environment.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// On-disk configuration shape.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(rename = "mcpServers", default)]
    mcp_servers: BTreeMap<String, ServerDescriptor>,
}

/// Read-only lookup of [`ServerDescriptor`]s by logical server name.
#[derive(Debug, Clone, Default)]
pub struct ServerRegistry {
    servers: BTreeMap<String, ServerDescriptor>,
}

impl ServerRegistry {
    /// Build a registry from already-parsed descriptors.
    pub fn new(servers: impl IntoIterator<Item = (String, ServerDescriptor)>) -> Self {
        Self {
            servers: servers.into_iter().collect(),
        }
    }

    /// Load a registry from a JSON config file with an `mcpServers` table.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ConfigFile =
            serde_json::from_str(&content).map_err(|source| Error::ParseConfig {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(
            path = %path.display(),
            servers = config.mcp_servers.len(),
            "loaded server registry"
        );
        Ok(Self {
            servers: config.mcp_servers,
        })
    }

    /// Parse a registry from the same JSON shape as [`ServerRegistry::load`].
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let config: ConfigFile = serde_json::from_str(content)?;
        Ok(Self {
            servers: config.mcp_servers,
        })
    }

    pub fn get(&self, name: &str) -> Option<&ServerDescriptor> {
        self.servers.get(name)
    }

    /// Like [`ServerRegistry::get`], but absence is an error naming every
    /// known server.
    pub fn resolve(&self, name: &str) -> Result<&ServerDescriptor, Error> {
        self.get(name).ok_or_else(|| Error::UnknownServer {
            name: name.to_string(),
            available: self.names().into_iter().map(String::from).collect(),
        })
    }

    /// Server names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.servers.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServerDescriptor)> {
        self.servers.iter().map(|(k, v)| (k.as_str(), v))
    }
}
