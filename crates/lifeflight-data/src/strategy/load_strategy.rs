//! Load strategy implementation using enum dispatch.

use std::fmt;
use std::str::FromStr;

/// Determines whether a loaded dataset may be reused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadStrategy {
    /// Load from the source on every call
    #[default]
    Reload,
    /// Check the cache first, load and populate it on a miss
    CacheFirst,
}

impl LoadStrategy {
    /// Execute a read according to the strategy.
    ///
    /// - `cache_fn`: returns the cached value, if one is usable
    /// - `load_fn`: reads from the source
    /// - `populate_fn`: offered the freshly loaded value
    pub fn read<T, E>(
        &self,
        cache_fn: impl FnOnce() -> Option<T>,
        load_fn: impl FnOnce() -> Result<T, E>,
        populate_fn: impl FnOnce(&T),
    ) -> Result<T, E> {
        match self {
            Self::Reload => load_fn(),
            Self::CacheFirst => {
                if let Some(value) = cache_fn() {
                    tracing::debug!("Dataset cache hit");
                    return Ok(value);
                }
                tracing::debug!("Dataset cache miss, loading from source");
                let value = load_fn()?;
                populate_fn(&value);
                Ok(value)
            }
        }
    }

    /// Strategy from the `DATASET_CACHE` on/off switch.
    #[must_use]
    pub const fn from_cache_flag(enabled: bool) -> Self {
        if enabled {
            Self::CacheFirst
        } else {
            Self::Reload
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Reload => "reload",
            Self::CacheFirst => "cache_first",
        }
    }
}

impl fmt::Display for LoadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reload" | "false" | "0" | "off" => Ok(Self::Reload),
            "cache_first" | "cache-first" | "true" | "1" | "on" => Ok(Self::CacheFirst),
            other => Err(format!("unknown load strategy: {other}")),
        }
    }
}
