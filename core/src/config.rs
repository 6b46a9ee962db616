use std::path::{Path, PathBuf};
use std::result::Result as StdResult;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use autotest_webclient::{ClientOptions, HttpGradingClient};
use fsutil::FileSystem;
use rust_embed::RustEmbed;
use serde::Deserialize;

use crate::orchestrator::Orchestrator;
use crate::persistence::{SentinelFiles, DEFAULT_RESULT_FILENAME, DEFAULT_SPEC_FILENAME};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,
    pub server: ServerConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub files: FilesConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    pub base_url: String,
    #[serde(default = "ServerConfig::default_request_interval_ms")]
    pub request_interval_ms: u64,
    pub timeout_ms: Option<u64>,
    pub session_cookie: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PollConfig {
    #[serde(default = "PollConfig::default_interval_ms")]
    pub interval_ms: u64,
    pub max_failures: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FilesConfig {
    #[serde(default = "FilesConfig::default_spec")]
    pub spec: String,
    #[serde(default = "FilesConfig::default_result")]
    pub result: String,
}

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

impl Config {
    pub const FILENAME: &str = "autotest.toml";

    pub fn example_toml() -> String {
        Asset::get(Self::FILENAME)
            .map(|file| String::from_utf8_lossy(file.data.as_ref()).into_owned())
            .unwrap_or_default()
    }

    pub fn from_toml(s: &str) -> StdResult<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(filepath: PathBuf) -> anyhow::Result<Self> {
        let toml = fsutil::read_to_string(&filepath).context("Cannot read a file")?;
        let mut cfg = Self::from_toml(&toml)
            .with_context(|| format!("Invalid config TOML: {:?}", filepath))?;
        cfg.source_config_file = Some(filepath);
        Ok(cfg)
    }

    /// Find config file ancestor dirs, including current dir.
    pub fn find_file_in_ancestors(cur_dir: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        let cur_dir = cur_dir.as_ref();
        cur_dir
            .ancestors()
            .map(|dir| dir.join(Self::FILENAME))
            .find(|path| path.is_file())
            .with_context(|| format!("Cannot find '{}' in {:?} or its ancestors", Self::FILENAME, cur_dir))
    }

    pub fn from_file_finding_in_ancestors(cur_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_filepath = Config::find_file_in_ancestors(cur_dir)?;
        Self::from_toml_file(config_filepath)
    }

    pub fn client_options(&self) -> ClientOptions {
        let ServerConfig {
            base_url,
            request_interval_ms,
            timeout_ms,
            session_cookie,
        } = &self.server;
        ClientOptions {
            base_url: base_url.clone(),
            request_interval: Duration::from_millis(*request_interval_ms),
            timeout: timeout_ms.map(Duration::from_millis),
            session_cookie: session_cookie.clone().filter(|c| !c.is_empty()),
        }
    }

    pub fn sentinel_files(&self) -> SentinelFiles {
        SentinelFiles {
            spec: self.files.spec.clone(),
            result: self.files.result.clone(),
        }
    }

    /// Orchestrator talking HTTP to the configured server.
    pub fn build_orchestrator(&self, fs: Arc<dyn FileSystem>) -> anyhow::Result<Orchestrator> {
        let client = HttpGradingClient::new(self.client_options())
            .with_context(|| format!("Invalid server config (base_url={})", self.server.base_url))?;
        Ok(Orchestrator::new(Arc::new(client), fs)
            .sentinel_files(self.sentinel_files())
            .poll_interval(Duration::from_millis(self.poll.interval_ms))
            .max_poll_failures(self.poll.max_failures))
    }
}

impl ServerConfig {
    fn default_request_interval_ms() -> u64 {
        200
    }
}

impl PollConfig {
    fn default_interval_ms() -> u64 {
        Orchestrator::DEFAULT_POLL_INTERVAL.as_millis() as u64
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: Self::default_interval_ms(),
            max_failures: None,
        }
    }
}

impl FilesConfig {
    fn default_spec() -> String {
        DEFAULT_SPEC_FILENAME.to_owned()
    }

    fn default_result() -> String {
        DEFAULT_RESULT_FILENAME.to_owned()
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            spec: Self::default_spec(),
            result: Self::default_result(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn example_toml_should_be_parsable() {
        let toml = Config::example_toml();
        let cfg = dbg!(Config::from_toml(&toml)).unwrap();

        let Config {
            source_config_file,
            server,
            poll,
            files,
        } = cfg;

        assert_eq!(source_config_file, None);
        assert_eq!(server.base_url, "https://autotest.example.edu/api/");
        assert_eq!(server.request_interval_ms, 200);
        assert_eq!(server.timeout_ms, Some(10000));
        assert_eq!(server.session_cookie, None);

        assert_eq!(poll.interval_ms, 500);
        assert_eq!(poll.max_failures, None);

        assert_eq!(files.spec, ".autotest2");
        assert_eq!(files.result, ".at_result");
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let cfg = Config::from_toml("[server]\nbase_url = \"http://localhost:8080\"\n").unwrap();
        assert_eq!(cfg.poll, PollConfig::default());
        assert_eq!(cfg.files, FilesConfig::default());

        let opts = cfg.client_options();
        assert_eq!(opts.request_interval, Duration::from_millis(200));
        assert_eq!(opts.timeout, None);
    }

    #[test]
    fn empty_cookie_is_ignored() {
        let cfg = Config::from_toml(
            "[server]\nbase_url = \"http://localhost\"\nsession_cookie = \"\"\n",
        )
        .unwrap();
        assert_eq!(cfg.client_options().session_cookie, None);
    }

    #[test]
    fn zero_request_interval_builds() {
        let cfg = Config::from_toml(
            "[server]\nbase_url = \"http://localhost\"\nrequest_interval_ms = 0\n",
        )
        .unwrap();
        assert_eq!(cfg.client_options().request_interval, Duration::ZERO);
        cfg.build_orchestrator(Arc::new(fsutil::LocalFs)).unwrap();
    }

    #[test]
    fn find_in_ancestors() {
        let tmp = tempfile::tempdir().unwrap();
        fsutil::write_with_mkdir(
            tmp.path().join(Config::FILENAME),
            "[server]\nbase_url = \"http://localhost\"\n",
        )
        .unwrap();
        let deep = tmp.path().join("course/hw1/task2");
        fsutil::mkdir_all(&deep).unwrap();

        let cfg = Config::from_file_finding_in_ancestors(&deep).unwrap();
        assert_eq!(cfg.source_config_file, Some(tmp.path().join(Config::FILENAME)));
        assert_eq!(cfg.server.base_url, "http://localhost");
    }
}
