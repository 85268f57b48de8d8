use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Runtime settings for the client and the CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Backend origin, also the base for relative model paths
    pub api_base: String,
    /// Path prefix of the REST endpoints
    pub api_prefix: String,
    /// Where the session file and rendered viewer documents live
    pub data_dir: PathBuf,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: "http://192.168.1.11:8000".to_string(),
            api_prefix: "/api".to_string(),
            data_dir: PathBuf::from(".flat3d"),
            timeout_secs: 30,
            user_agent: concat!("flat3d/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, then the TOML file if given, then `FLAT3D_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        debug!("Config: {:?}", config);
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(base) = var("FLAT3D_API_BASE") {
            self.api_base = base;
        }
        if let Some(dir) = var("FLAT3D_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(secs) = var("FLAT3D_TIMEOUT_SECS") {
            self.timeout_secs = secs
                .parse()
                .with_context(|| format!("FLAT3D_TIMEOUT_SECS is not a number: {:?}", secs))?;
        }
        Ok(())
    }

    /// Full URL of an endpoint such as "properties/"
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.api_base.trim_end_matches('/'),
            self.api_prefix.trim_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_endpoint() {
        let config = AppConfig::default();
        assert_eq!(
            config.endpoint("properties/"),
            "http://192.168.1.11:8000/api/properties/"
        );
        assert_eq!(
            config.endpoint("/check-email/"),
            "http://192.168.1.11:8000/api/check-email/"
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            api_base = "https://homes.example.com"
            timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.api_base, "https://homes.example.com");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.api_prefix, "/api");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("FLAT3D_API_BASE", "http://localhost:8000"),
            ("FLAT3D_TIMEOUT_SECS", "10"),
        ]
        .into_iter()
        .collect();
        let mut config = AppConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.api_base, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.data_dir, PathBuf::from(".flat3d"));
    }

    #[test]
    fn test_bad_timeout_is_an_error() {
        let mut config = AppConfig::default();
        assert!(config
            .apply_env(|key| (key == "FLAT3D_TIMEOUT_SECS").then(|| "soon".to_string()))
            .is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat3d.toml");
        std::fs::write(&path, "data_dir = \"/tmp/flat3d\"\n").unwrap();
        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/flat3d"));
    }
}
