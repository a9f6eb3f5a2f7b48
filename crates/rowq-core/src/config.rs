//! Engine configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rows buffered per window when windowing is requested without an
    /// explicit size.
    pub default_window_size: usize,

    /// Capacity of the buffered reader placed in front of file and stdin sources.
    pub read_buffer_bytes: usize,

    /// Treat strategy warnings as fatal planning errors.
    pub fail_on_warning: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_window_size: 1000,
            read_buffer_bytes: 64 * 1024,
            fail_on_warning: false,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `ROWQ_*` environment variables. Unparseable
    /// values are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("ROWQ_WINDOW_SIZE") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.default_window_size = v;
            }
        }

        if let Ok(s) = std::env::var("ROWQ_READ_BUFFER_BYTES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.read_buffer_bytes = v;
            }
        }

        if let Ok(s) = std::env::var("ROWQ_FAIL_ON_WARNING") {
            cfg.fail_on_warning = matches!(s.trim(), "1" | "true" | "yes");
        }

        cfg
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_window_size == 0 {
            return Err(Error::Config("default_window_size must be at least 1".into()));
        }
        if self.read_buffer_bytes == 0 {
            return Err(Error::Config("read_buffer_bytes must be at least 1".into()));
        }
        Ok(())
    }
}

/// Partial configuration carried by a query plan; `Some` fields win over the
/// engine's configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    pub default_window_size: Option<usize>,
    pub read_buffer_bytes: Option<usize>,
    pub fail_on_warning: Option<bool>,
}

impl EngineConfig {
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(v) = overrides.default_window_size {
            self.default_window_size = v;
        }
        if let Some(v) = overrides.read_buffer_bytes {
            self.read_buffer_bytes = v;
        }
        if let Some(v) = overrides.fail_on_warning {
            self.fail_on_warning = v;
        }
    }
}
