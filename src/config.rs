use crate::error::{CategoryBoardsError, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use tokio::fs;

/// Name given to the system bucket holding otherwise uncategorized boards
pub const DEFAULT_CATEGORY_NAME: &str = "Boards";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    /// Display name of the default category created during bootstrap
    pub default_category_name: String,
    /// Maximum number of pending notifications before enqueue fails
    pub queue_capacity: usize,
    /// Delivery attempts per notification, including the first
    pub notify_max_attempts: u32,
    pub notify_retry_delay_ms: u64,
    /// Whether archived boards are swept into the default category
    pub include_archived_in_default: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_category_name: DEFAULT_CATEGORY_NAME.to_string(),
            queue_capacity: 1024,
            notify_max_attempts: 3,
            notify_retry_delay_ms: 100,
            include_archived_in_default: false,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON configuration document.
    /// Missing keys fall back to their defaults.
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(contents)
            .map_err(|e| CategoryBoardsError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).await.map_err(|e| {
            CategoryBoardsError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_category_name.trim().is_empty() {
            return Err(CategoryBoardsError::ConfigError(
                "default_category_name must not be empty".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(CategoryBoardsError::ConfigError(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.notify_max_attempts == 0 {
            return Err(CategoryBoardsError::ConfigError(
                "notify_max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn notify_retry_delay(&self) -> Duration {
        Duration::from_millis(self.notify_retry_delay_ms)
    }
}
