//! Engine configuration
//!
//! JSON file, every field optional. `DATABASE_URL` in the environment
//! overrides `database_url`.

mod errors;

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::request::PageLimits;

pub use errors::{ConfigError, ConfigResult};

/// Environment variable that overrides `database_url`
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Pool size (default: 10)
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long to wait for a pooled connection (default: 5000)
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,

    /// Deadline for each statement of a search (default: 10000)
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,

    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Rows returned by author rankings (default: 200)
    #[serde(default = "default_author_ranks_limit")]
    pub author_ranks_limit: u32,

    /// Articles not crawled for this many days count as outdated (default: 7)
    #[serde(default = "default_outdated_limit_days")]
    pub outdated_limit_days: u32,
}

fn default_database_url() -> String {
    "postgres://localhost/rxivist".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_ms() -> u64 {
    5000
}

fn default_statement_timeout_ms() -> u64 {
    10_000
}

fn default_page_size() -> u32 {
    20
}

fn default_max_page_size() -> u32 {
    250
}

fn default_author_ranks_limit() -> u32 {
    200
}

fn default_outdated_limit_days() -> u32 {
    7
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            max_connections: default_max_connections(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            statement_timeout_ms: default_statement_timeout_ms(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            author_ranks_limit: default_author_ranks_limit(),
            outdated_limit_days: default_outdated_limit_days(),
        }
    }
}

impl EngineConfig {
    /// Loads, applies the environment override, and validates
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&content)?.with_env_override();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus the environment override, validated
    pub fn from_env() -> ConfigResult<Self> {
        let config = Self::default().with_env_override();
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    fn with_env_override(self) -> Self {
        match std::env::var(DATABASE_URL_ENV) {
            Ok(url) => self.with_database_url(url),
            Err(_) => self,
        }
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        if !url.trim().is_empty() {
            self.database_url = url;
        }
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::invalid("database_url", "must not be empty"));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::invalid("max_connections", "must be positive"));
        }
        if self.acquire_timeout_ms == 0 {
            return Err(ConfigError::invalid("acquire_timeout_ms", "must be positive"));
        }
        if self.statement_timeout_ms == 0 {
            return Err(ConfigError::invalid("statement_timeout_ms", "must be positive"));
        }
        if self.default_page_size == 0 {
            return Err(ConfigError::invalid("default_page_size", "must be positive"));
        }
        if self.max_page_size < self.default_page_size {
            return Err(ConfigError::invalid(
                "max_page_size",
                format!(
                    "{} is smaller than default_page_size {}",
                    self.max_page_size, self.default_page_size
                ),
            ));
        }
        if self.author_ranks_limit == 0 {
            return Err(ConfigError::invalid("author_ranks_limit", "must be positive"));
        }
        Ok(())
    }

    pub fn statement_timeout(&self) -> Duration {
        Duration::from_millis(self.statement_timeout_ms)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
        }
    }
}
