//! Server configuration, loaded from JSON.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! {
//!   "bind": "0.0.0.0:4000",
//!   "world": { "heartbeat": { "rate_hz": 4 } },
//!   "aliases": { "aliases": { "gaze": "look" } },
//!   "map": { "path": "town.map", "legend": { "start": "T" } }
//! }
//! ```

use std::path::{Path, PathBuf};

use mudforge_command::AliasConfig;
use mudforge_map::{Legend, MapError, TextMap};
use mudforge_transport::DEFAULT_MAX_LINE_LEN;
use mudforge_world::{RoomGraph, WorldConfig};
use serde::{Deserialize, Serialize};

/// Errors reading a [`ServerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which wire protocol clients speak.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    #[default]
    Telnet,
    WebSocket,
}

/// Where the world map comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Text map file. Relative paths resolve against the working directory.
    pub path: Option<PathBuf>,
    pub legend: Legend,
}

impl MapConfig {
    /// Load and compile the map file, or `Ok(None)` when no path is set.
    pub fn compile(&self) -> Result<Option<RoomGraph>, MapError> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        let map = TextMap::load(path)?;
        mudforge_map::compile(&map, &self.legend).map(Some)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub transport: TransportKind,
    /// Longest input line accepted from a client, in bytes.
    pub max_line_len: usize,
    /// Sent to every client on connect, before the name prompt.
    pub greeting: String,
    pub world: WorldConfig,
    pub aliases: AliasConfig,
    pub map: MapConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:4000".to_string(),
            transport: TransportKind::default(),
            max_line_len: DEFAULT_MAX_LINE_LEN,
            greeting: "Welcome to Mudforge.".to_string(),
            world: WorldConfig::default(),
            aliases: AliasConfig::default(),
            map: MapConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.display(), bind = %config.bind, "config loaded");
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(text)?;
        config.world.heartbeat = config.world.heartbeat.validated();
        config.max_line_len = config.max_line_len.max(1);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = ServerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.transport, TransportKind::Telnet);
        assert!(config.map.path.is_none());
    }

    #[test]
    fn test_partial_json_overrides_fields() {
        let config = ServerConfig::from_json_str(
            r#"{
                "bind": "0.0.0.0:5000",
                "transport": "web_socket",
                "max_line_len": 0,
                "world": { "heartbeat": { "rate_hz": 4 }, "pulse_capacity": 3 },
                "aliases": { "aliases": { "gaze": "look" } }
            }"#,
        )
        .unwrap();
        assert_eq!(config.bind, "0.0.0.0:5000");
        assert_eq!(config.transport, TransportKind::WebSocket);
        assert_eq!(config.max_line_len, 1);
        assert_eq!(config.world.heartbeat.rate_hz, 4);
        assert_eq!(config.world.pulse_capacity, 3);
        assert_eq!(config.aliases.aliases.get("gaze").map(String::as_str), Some("look"));
    }

    #[test]
    fn test_bad_json_is_rejected() {
        let err = ServerConfig::from_json_str("{ \"bind\": 4 }").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let err = ServerConfig::load("/nonexistent/mudforge.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/mudforge.json"));
    }

    #[test]
    fn test_map_without_path_compiles_to_none() {
        assert!(MapConfig::default().compile().unwrap().is_none());
    }
}
