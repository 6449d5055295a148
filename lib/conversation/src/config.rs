//! Conversation service configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables. The gateway process loads this once at startup
//! and hands the pieces to the service constructor.

use palaver_core::RoomId;
use serde::Deserialize;

/// Configuration for the conversation service.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    /// Rooms where conversations may be started. Empty means no room is
    /// authorized.
    #[serde(default)]
    pub authorized_rooms: Vec<RoomId>,

    /// Collection IDs available to collections search. Empty leaves the
    /// tool unavailable.
    #[serde(default)]
    pub collection_ids: Vec<String>,

    /// Idle-session eviction settings.
    #[serde(default)]
    pub eviction: EvictionConfig,
}

/// Idle-session eviction settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EvictionConfig {
    /// Sessions idle longer than this are evicted.
    #[serde(default = "default_idle_ttl_seconds")]
    pub idle_ttl_seconds: i64,

    /// Interval between eviction sweeps, in seconds.
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
}

fn default_idle_ttl_seconds() -> i64 {
    21_600
}

fn default_sweep_interval_seconds() -> u64 {
    300
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_seconds: default_idle_ttl_seconds(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

impl EvictionConfig {
    /// The idle TTL as a duration.
    #[must_use]
    pub fn idle_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.idle_ttl_seconds)
    }
}

impl ConversationConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Returns true if conversations may be started in the room.
    #[must_use]
    pub fn is_room_authorized(&self, room: RoomId) -> bool {
        self.authorized_rooms.contains(&room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eviction_config_has_correct_defaults() {
        let config = EvictionConfig::default();
        assert_eq!(config.idle_ttl_seconds, 21_600);
        assert_eq!(config.sweep_interval_seconds, 300);
        assert_eq!(config.idle_ttl(), chrono::Duration::hours(6));
    }

    #[test]
    fn room_authorization() {
        let config = ConversationConfig {
            authorized_rooms: vec![RoomId::new(1), RoomId::new(2)],
            collection_ids: Vec::new(),
            eviction: EvictionConfig::default(),
        };
        assert!(config.is_room_authorized(RoomId::new(1)));
        assert!(!config.is_room_authorized(RoomId::new(3)));
    }

    #[test]
    fn config_deserializes_from_json() {
        let json = r#"{
            "authorized_rooms": [10],
            "collection_ids": ["docs"],
            "eviction": { "idle_ttl_seconds": 60 }
        }"#;
        let config: ConversationConfig = serde_json::from_str(json).expect("deserialize");
        assert_eq!(config.authorized_rooms, vec![RoomId::new(10)]);
        assert_eq!(config.collection_ids, vec!["docs".to_string()]);
        assert_eq!(config.eviction.idle_ttl_seconds, 60);
        assert_eq!(config.eviction.sweep_interval_seconds, 300);
    }
}
