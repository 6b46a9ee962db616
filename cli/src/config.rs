use autotest_core::Config;
use serde::{Deserialize, Serialize};
use std::{fs::File, io, path::PathBuf};

use crate::util;

pub const APP_NAME: &str = "autotest-cli";
pub const ENV_PREFIX: &str = "AUTOTEST_";

/// Per-user settings that override the project's `autotest.toml`.
/// Kept out of the project config so the session cookie never lands in a shared repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub base_url: Option<String>,
    pub session_cookie: Option<String>,
    pub poll_interval_ms: Option<u64>,
}

impl GlobalConfig {
    pub const FILENAME: &str = "autotest-cli.toml";

    pub fn filepath() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(Self::FILENAME))
    }

    pub fn from_file_or_default() -> Self {
        let Some(path) = Self::filepath() else {
            return GlobalConfig::default();
        };
        let toml_str = match File::open(&path).and_then(io::read_to_string) {
            Ok(toml) => toml,
            _ => return GlobalConfig::default(),
        };
        toml::from_str(&toml_str).unwrap_or_else(|e| {
            log::error!(
                "Invalid config '{:?}': {:#}",
                util::replace_homedir_to_tilde(path),
                e
            );
            std::process::exit(1)
        })
    }

    /// `AUTOTEST_BASE_URL`, `AUTOTEST_SESSION_COOKIE` and `AUTOTEST_POLL_INTERVAL_MS` win over the file.
    pub fn with_overrides(self, overrides: GlobalConfig) -> Self {
        Self {
            base_url: overrides.base_url.or(self.base_url),
            session_cookie: overrides.session_cookie.or(self.session_cookie),
            poll_interval_ms: overrides.poll_interval_ms.or(self.poll_interval_ms),
        }
    }

    pub fn from_env() -> Self {
        envy::prefixed(ENV_PREFIX)
            .from_env::<Self>()
            .unwrap_or_else(|e| {
                log::warn!("Ignoring {}* env vars: {}", ENV_PREFIX, e);
                Self::default()
            })
    }

    pub fn from_file_and_env() -> Self {
        Self::from_file_or_default().with_overrides(Self::from_env())
    }

    pub fn apply_to(&self, cfg: &mut Config) {
        if let Some(url) = &self.base_url {
            cfg.server.base_url = url.clone();
        }
        if let Some(cookie) = &self.session_cookie {
            cfg.server.session_cookie = Some(cookie.clone());
        }
        if let Some(ms) = self.poll_interval_ms {
            cfg.poll.interval_ms = ms;
        }
    }
}
