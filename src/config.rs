// Runtime settings. There is no config file: a handful of optional
// environment variables cover staging endpoints, where the sources live
// and how long a request may take.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const API_BASE_URL_VAR: &str = "PA_API_BASE_URL";
pub const SOURCE_DIR_VAR: &str = "PA_SOURCE_DIR";
pub const HTTP_TIMEOUT_VAR: &str = "PA_HTTP_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Replaces the region-derived API root when set.
    pub api_base_url: Option<String>,
    /// Directory the upload manifest is resolved against. Defaults to the
    /// working directory, so running from anywhere but the project root
    /// needs `PA_SOURCE_DIR`.
    pub source_dir: PathBuf,
    /// `None` blocks until the server answers.
    pub http_timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_base_url: None,
            source_dir: PathBuf::from("."),
            http_timeout: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let http_timeout = match get(HTTP_TIMEOUT_VAR) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().with_context(|| {
                    format!("{} must be whole seconds, got {:?}", HTTP_TIMEOUT_VAR, raw)
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Settings {
            api_base_url: get(API_BASE_URL_VAR),
            source_dir: get(SOURCE_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            http_timeout,
        })
    }
}
