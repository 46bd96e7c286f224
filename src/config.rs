use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};
use colored::*;

use gid_core::controller::{DEFAULT_FALLBACK, DEFAULT_GREETING};
use gid_core::FileStore;

/// Environment variable that overrides `server_url`
pub const SERVER_URL_ENV: &str = "GID_SERVER_URL";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    pub session_path: Option<PathBuf>,
    pub greeting: String,
    pub fallback_message: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            server_url: "http://localhost:8000".to_string(),
            session_path: None,
            greeting: DEFAULT_GREETING.to_string(),
            fallback_message: DEFAULT_FALLBACK.to_string(),
            log_level: "warn".to_string(),
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Logging is not up yet when this runs, so problems go straight to stderr.
    pub fn load_or_default() -> Self {
        let loaded = Self::get_config_path().and_then(|path| Self::load_from(&path));
        Self::or_default(loaded)
    }

    fn or_default(loaded: Result<Self>) -> Self {
        match loaded {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}: {}", "Could not read config, using defaults".yellow(), e);
                Self::new()
            }
        }
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Command line beats the environment, which beats the config file.
    pub fn server_url(&self, cli_override: Option<&str>) -> String {
        cli_override
            .map(str::to_string)
            .or_else(|| std::env::var(SERVER_URL_ENV).ok())
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.server_url.clone())
    }

    pub fn session_path(&self) -> Result<PathBuf> {
        match &self.session_path {
            Some(path) => Ok(path.clone()),
            None => Ok(FileStore::default_path()?),
        }
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("gid").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gid").join("config.json");

        let mut config = Config::new();
        config.server_url = "http://guide.example:9000".to_string();
        config.session_path = Some(dir.path().join("session.json"));
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"log_level":"debug"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.greeting, DEFAULT_GREETING);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(Config::load_from(&path).is_err());
        assert_eq!(Config::or_default(Config::load_from(&path)), Config::new());
    }

    #[test]
    fn test_cli_server_wins() {
        let config = Config::new();
        assert_eq!(config.server_url(Some("http://cli:1")), "http://cli:1");
    }

    #[test]
    fn test_explicit_session_path() {
        let mut config = Config::new();
        config.session_path = Some(PathBuf::from("/tmp/gid-session.json"));
        assert_eq!(
            config.session_path().unwrap(),
            PathBuf::from("/tmp/gid-session.json")
        );
    }
}
