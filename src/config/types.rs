// Configuration type definitions

use std::time::Duration;

use serde::Deserialize;

use crate::toast::{TOAST_LIMIT, TOAST_REMOVE_DELAY};

/// Toast queue configuration section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ToastConfig {
    /// Maximum number of notifications kept in the active collection
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Delay between dismissal and physical removal, in milliseconds
    #[serde(default = "default_remove_delay_ms")]
    pub remove_delay_ms: u64,
}

fn default_limit() -> usize {
    TOAST_LIMIT
}

fn default_remove_delay_ms() -> u64 {
    TOAST_REMOVE_DELAY.as_millis() as u64
}

impl Default for ToastConfig {
    fn default() -> Self {
        ToastConfig {
            limit: default_limit(),
            remove_delay_ms: default_remove_delay_ms(),
        }
    }
}

impl ToastConfig {
    pub fn remove_delay(&self) -> Duration {
        Duration::from_millis(self.remove_delay_ms)
    }
}

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub toast: ToastConfig,
}
