use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::net::ENTITY_FIELD_VERSION;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub name: String,
    pub packet_send_fps: u32,
    pub net_fps: u32,
    pub max_packet_size: u32,
    pub max_bps: u32,
    pub cookie: String,
    pub entity_version: u32,
    pub handshake_attempts: u32,
    pub handshake_retry_ms: u64,
    /// Teams requested, in order, once the local client has a ping.
    pub team_requests: Vec<u16>,
    pub team1_unit: u16,
    pub default_unit: u16,
    pub maps_dir: PathBuf,
    /// Sent alongside the standard cvars; overrides them on key collision.
    pub extra_cvars: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: "player".to_string(),
            packet_send_fps: 30,
            net_fps: 30,
            max_packet_size: 65535,
            max_bps: 20000,
            cookie: String::new(),
            entity_version: ENTITY_FIELD_VERSION,
            handshake_attempts: 10,
            handshake_retry_ms: 100,
            team_requests: vec![2, 1],
            team1_unit: 705,
            default_unit: 704,
            maps_dir: PathBuf::from("maps"),
            extra_cvars: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn handshake_retry(&self) -> Duration {
        Duration::from_millis(self.handshake_retry_ms)
    }

    /// Interval between outbound client snapshots.
    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.packet_send_fps.max(1)))
    }

    /// Cvar set announced to the server, sorted by key.
    pub fn cvars(&self) -> BTreeMap<String, String> {
        let mut cvars = BTreeMap::new();
        cvars.insert("cl_packetSendFPS".to_string(), self.packet_send_fps.to_string());
        cvars.insert("net_FPS".to_string(), self.net_fps.to_string());
        cvars.insert("net_cookie".to_string(), self.cookie.clone());
        cvars.insert("net_maxPacketSize".to_string(), self.max_packet_size.to_string());
        cvars.insert("net_maxBPS".to_string(), self.max_bps.to_string());
        cvars.insert("net_name".to_string(), self.name.clone());
        cvars.insert("net_sendCvars".to_string(), "true".to_string());
        for (key, value) in &self.extra_cvars {
            cvars.insert(key.clone(), value.clone());
        }
        cvars
    }
}
