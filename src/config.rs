use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub lastfm: LastfmConfig,
    pub store: StoreConfig,
}

/// Crawl configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Artist name the walk starts from.
    pub seed: String,
    /// Number of concurrent persist workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// Last.fm API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LastfmConfig {
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LastfmConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Snapshot store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub db_path: PathBuf,
}

fn default_workers() -> usize {
    10
}

fn default_api_key_env() -> String {
    "LASTFM_API_KEY".to_string()
}

fn default_base_url() -> String {
    "https://ws.audioscrobbler.com/2.0/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in FMEXPORT_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional; ignore a missing file
        let _ = dotenv::dotenv();

        let config_path = std::env::var("FMEXPORT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str).context("Failed to parse config.toml")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.crawl.seed.trim().is_empty() {
            anyhow::bail!("crawl.seed must not be empty");
        }

        if self.crawl.workers == 0 {
            anyhow::bail!("crawl.workers must be greater than 0");
        }

        Url::parse(&self.lastfm.base_url)
            .with_context(|| format!("lastfm.base_url is not a valid URL: {}", self.lastfm.base_url))?;

        // Check both environment variable and .env file (dotenv already loaded in Config::load)
        std::env::var(&self.lastfm.api_key_env).with_context(|| {
            format!(
                "Environment variable {} not set. Set it in your .env file or as an environment variable with your Last.fm API key.",
                self.lastfm.api_key_env
            )
        })?;

        Ok(())
    }

    /// Resolve the Last.fm API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.lastfm.api_key_env)
            .with_context(|| format!("Environment variable {} not set", self.lastfm.api_key_env))
    }

    /// Parsed API base URL
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.lastfm.base_url)
            .with_context(|| format!("lastfm.base_url is not a valid URL: {}", self.lastfm.base_url))
    }

    /// Get database path
    pub fn db_path(&self) -> &Path {
        &self.store.db_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide cwd and env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    const TEST_CONFIG: &str = r#"
[crawl]
seed = "Eminem"
workers = 4

[lastfm]
api_key_env = "LASTFM_API_KEY"
base_url = "https://ws.audioscrobbler.com/2.0/"
timeout_secs = 15

[store]
db_path = "./test.db"
"#;

    /// Restores cwd when dropped (e.g. on panic).
    struct CwdGuard(std::path::PathBuf);
    impl Drop for CwdGuard {
        fn drop(&mut self) {
            let _ = std::env::set_current_dir(&self.0);
        }
    }

    fn with_config_env(config_path: &std::path::Path, api_key: Option<&str>, f: impl FnOnce()) {
        let original_config = std::env::var("FMEXPORT_CONFIG").ok();
        let original_key = std::env::var("LASTFM_API_KEY").ok();
        std::env::set_var("FMEXPORT_CONFIG", config_path.to_str().unwrap());
        match api_key {
            Some(k) => std::env::set_var("LASTFM_API_KEY", k),
            None => std::env::remove_var("LASTFM_API_KEY"),
        }
        f();
        std::env::remove_var("FMEXPORT_CONFIG");
        std::env::remove_var("LASTFM_API_KEY");
        if let Some(val) = original_config {
            std::env::set_var("FMEXPORT_CONFIG", val);
        }
        if let Some(val) = original_key {
            std::env::set_var("LASTFM_API_KEY", val);
        }
    }

    #[test]
    fn test_config_load_success() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, TEST_CONFIG).unwrap();
        let original_dir = std::env::current_dir().unwrap();
        let _cwd = CwdGuard(original_dir.clone());
        std::env::set_current_dir(temp_dir.path()).unwrap();
        with_config_env(&config_path, Some("test-key"), || {
            let config = Config::load();
            assert!(config.is_ok(), "Config::load() failed: {:?}", config.err());
            let config = config.unwrap();
            assert_eq!(config.crawl.seed, "Eminem");
            assert_eq!(config.crawl.workers, 4);
            assert_eq!(config.lastfm.timeout_secs, 15);
            assert_eq!(config.api_key().unwrap(), "test-key");
        });
    }

    #[test]
    fn test_config_defaults() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(
            &config_path,
            "[crawl]\nseed = \"Eminem\"\n\n[store]\ndb_path = \"./test.db\"\n",
        )
        .unwrap();
        let original_dir = std::env::current_dir().unwrap();
        let _cwd = CwdGuard(original_dir.clone());
        std::env::set_current_dir(temp_dir.path()).unwrap();
        with_config_env(&config_path, Some("test-key"), || {
            let config = Config::load().unwrap();
            assert_eq!(config.crawl.workers, 10);
            assert_eq!(config.lastfm.api_key_env, "LASTFM_API_KEY");
            assert_eq!(config.lastfm.base_url, "https://ws.audioscrobbler.com/2.0/");
            assert_eq!(config.lastfm.timeout_secs, 30);
        });
    }

    #[test]
    fn test_config_missing_api_key() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, TEST_CONFIG).unwrap();
        let original_dir = std::env::current_dir().unwrap();
        let _cwd = CwdGuard(original_dir.clone());
        std::env::set_current_dir(temp_dir.path()).unwrap();
        with_config_env(&config_path, None, || {
            let config = Config::load();
            assert!(config.is_err(), "Expected missing API key error");
            assert!(config.unwrap_err().to_string().contains("LASTFM_API_KEY"));
        });
    }

    #[test]
    fn test_config_loads_key_from_env_file() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, TEST_CONFIG).unwrap();
        fs::write(
            temp_dir.path().join(".env"),
            "LASTFM_API_KEY=key-from-env-file\n",
        )
        .unwrap();
        let original_dir = std::env::current_dir().unwrap();
        let _cwd = CwdGuard(original_dir.clone());
        std::env::set_current_dir(temp_dir.path()).unwrap();
        with_config_env(&config_path, None, || {
            let config = Config::load();
            assert!(config.is_ok(), "Config should load with API key from .env file");
            assert_eq!(config.unwrap().api_key().unwrap(), "key-from-env-file");
        });
    }

    #[test]
    fn test_config_rejects_zero_workers() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(
            &config_path,
            "[crawl]\nseed = \"Eminem\"\nworkers = 0\n\n[store]\ndb_path = \"./test.db\"\n",
        )
        .unwrap();
        let original_dir = std::env::current_dir().unwrap();
        let _cwd = CwdGuard(original_dir.clone());
        std::env::set_current_dir(temp_dir.path()).unwrap();
        with_config_env(&config_path, Some("test-key"), || {
            let config = Config::load();
            assert!(config.is_err());
            assert!(config.unwrap_err().to_string().contains("workers"));
        });
    }

    #[test]
    fn test_config_invalid_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let original = std::env::var("FMEXPORT_CONFIG").ok();
        std::env::set_var("FMEXPORT_CONFIG", "nonexistent.toml");
        let config = Config::load();
        assert!(config.is_err());
        std::env::remove_var("FMEXPORT_CONFIG");
        if let Some(v) = original {
            std::env::set_var("FMEXPORT_CONFIG", v);
        }
    }
}
