//! Configuration loading (.env + environment)

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::jdcloud::{JdCloudConfig, DEFAULT_ENDPOINT_SUFFIX, DEFAULT_SCHEME, DEFAULT_TIMEOUT_SECS};

/// Project directory (where .env is)
pub fn project_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CLIMC_PROJECT_DIR") {
        return PathBuf::from(dir);
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Load .env file if there is one
pub fn load_env() -> Result<()> {
    let env_path = project_dir().join(".env");
    if !env_path.exists() {
        return Ok(());
    }
    dotenvy::from_path(&env_path)
        .with_context(|| format!("Failed to load .env from {:?}", env_path))?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing env var: {0}. Add it to your .env file.")]
    Missing(String),

    #[error("{name} is not a number: {value}")]
    NotANumber { name: &'static str, value: String },
}

fn required(name: &str) -> Result<String> {
    let value = std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::Missing(name.to_string()))?;
    Ok(value)
}

fn optional(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Region service endpoint and token
pub struct RegionConfig {
    pub url: String,
    pub token: String,
}

pub fn region_config() -> Result<RegionConfig> {
    Ok(RegionConfig {
        url: required("CLIMC_REGION_URL")?,
        token: required("CLIMC_AUTH_TOKEN")?,
    })
}

pub fn jdcloud_config() -> Result<JdCloudConfig> {
    let timeout = optional("JDCLOUD_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string());
    let timeout: u64 = timeout.parse().map_err(|_| ConfigError::NotANumber {
        name: "JDCLOUD_TIMEOUT_SECS",
        value: timeout.clone(),
    })?;

    let mut config = JdCloudConfig::new(
        required("JDCLOUD_ACCESS_KEY_ID")?,
        required("JDCLOUD_ACCESS_KEY_SECRET")?,
    );
    config.endpoint_suffix = optional("JDCLOUD_ENDPOINT_SUFFIX", DEFAULT_ENDPOINT_SUFFIX);
    config.scheme = optional("JDCLOUD_SCHEME", DEFAULT_SCHEME);
    config.timeout = Duration::from_secs(timeout);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test touches the process environment so nothing races on it
    #[test]
    fn env_lookup() {
        std::env::set_var("CLIMC_TEST_OPTIONAL", "");
        assert_eq!(optional("CLIMC_TEST_OPTIONAL", "fallback"), "fallback");
        std::env::set_var("CLIMC_TEST_OPTIONAL", "set");
        assert_eq!(optional("CLIMC_TEST_OPTIONAL", "fallback"), "set");

        std::env::remove_var("CLIMC_TEST_REQUIRED");
        let err = required("CLIMC_TEST_REQUIRED").unwrap_err();
        assert!(err.to_string().contains("CLIMC_TEST_REQUIRED"));
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::Missing(_))));

        let dir = std::env::temp_dir().join(format!("climc-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::env::set_var("CLIMC_PROJECT_DIR", &dir);
        assert_eq!(project_dir(), dir);
        assert!(load_env().is_ok());

        std::fs::write(dir.join(".env"), "CLIMC_TEST_FROM_DOTENV=yes\n").unwrap();
        load_env().unwrap();
        assert_eq!(std::env::var("CLIMC_TEST_FROM_DOTENV").unwrap(), "yes");

        std::env::remove_var("CLIMC_PROJECT_DIR");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
