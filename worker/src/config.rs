use serde::{Deserialize, Serialize};

use crate::RECENT_CAPACITY;

/// Tunables of the session service, every field optional in the TOML form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub default_width: i64,
    pub default_height: i64,
    pub default_mines: i64,
    /// Games kept in the recent games index.
    pub recent_capacity: usize,
    /// Games returned as history.
    pub history_len: usize,
    /// Seed used for every new board instead of a random one.
    pub seed: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_width: 10,
            default_height: 10,
            default_mines: 10,
            recent_capacity: RECENT_CAPACITY,
            history_len: 5,
            seed: None,
        }
    }
}

impl ServiceConfig {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}
