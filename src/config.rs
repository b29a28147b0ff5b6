//! Configuration management
//!
//! Loads configuration from TOML files with environment variable substitution.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "TX_LIFECYCLE_CONFIG";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub chain: ChainConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub gas: GasConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub name: String,
    pub chain_id: u64,
    pub rpc_urls: Vec<String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Per-transaction confirmation timeout
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GasConfig {
    /// Extra gas added on top of the estimate, in percent
    #[serde(default)]
    pub gas_limit_buffer_percent: u64,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_confirmation_timeout_secs() -> u64 {
    15
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout_secs: default_confirmation_timeout_secs(),
        }
    }
}

impl PoolConfig {
    /// Longest accepted per-transaction confirmation timeout (one day)
    pub const MAX_CONFIRMATION_TIMEOUT_SECS: u64 = 86_400;

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }
}

impl Settings {
    /// Load settings from the file named by `TX_LIFECYCLE_CONFIG`, or `config/default.toml`
    pub fn load() -> Result<Self> {
        let config_path = env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));
        Self::load_from(&config_path)
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&config_str)
    }

    /// Parse settings from TOML text, substituting `${VAR}` placeholders first
    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config_str = substitute_env_vars(config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.chain.rpc_urls.iter().all(|u| u.trim().is_empty()) {
            anyhow::bail!("Chain {} has no RPC URLs configured", self.chain.name);
        }

        if self.pool.confirmation_timeout_secs == 0 {
            anyhow::bail!("pool.confirmation_timeout_secs must be greater than zero");
        }

        if self.pool.confirmation_timeout_secs > PoolConfig::MAX_CONFIRMATION_TIMEOUT_SECS {
            anyhow::bail!(
                "pool.confirmation_timeout_secs must be at most {}",
                PoolConfig::MAX_CONFIRMATION_TIMEOUT_SECS
            );
        }

        if self.gas.gas_limit_buffer_percent > 100 {
            tracing::warn!(
                "Gas limit buffer of {}% is unusually large",
                self.gas.gas_limit_buffer_percent
            );
        }

        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid placeholder pattern");
    re.replace_all(input, |caps: &regex::Captures| {
        env::var(&caps[1]).unwrap_or_default()
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
        [chain]
        name = "devnet"
        chain_id = 1337
        rpc_urls = ["http://127.0.0.1:8545"]
    "#;

    #[test]
    fn test_env_var_substitution() {
        env::set_var("TX_LIFECYCLE_TEST_VAR", "test_value");
        let input = "url = \"https://api.example.com/${TX_LIFECYCLE_TEST_VAR}/endpoint\"";
        let result = substitute_env_vars(input);
        assert_eq!(result, "url = \"https://api.example.com/test_value/endpoint\"");
    }

    #[test]
    fn test_defaults_applied() {
        let settings = Settings::from_toml(MINIMAL).unwrap();
        assert_eq!(settings.chain.chain_id, 1337);
        assert_eq!(settings.chain.poll_interval_ms, 1000);
        assert_eq!(settings.pool.confirmation_timeout(), Duration::from_secs(15));
        assert_eq!(settings.gas.gas_limit_buffer_percent, 0);
    }

    #[test]
    fn test_rejects_missing_rpc_urls() {
        let input = r#"
            [chain]
            name = "devnet"
            chain_id = 1337
            rpc_urls = []
        "#;
        assert!(Settings::from_toml(input).is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let input = format!("{}\n[pool]\nconfirmation_timeout_secs = 0\n", MINIMAL);
        assert!(Settings::from_toml(&input).is_err());
    }

    #[test]
    fn test_rejects_oversized_timeout() {
        let input = format!(
            "{}\n[pool]\nconfirmation_timeout_secs = 9223372036854775807\n",
            MINIMAL
        );
        assert!(Settings::from_toml(&input).is_err());

        let input = format!("{}\n[pool]\nconfirmation_timeout_secs = 86400\n", MINIMAL);
        assert!(Settings::from_toml(&input).is_ok());
    }

    #[test]
    fn test_load_from_file() {
        env::set_var("TX_LIFECYCLE_TEST_RPC", "http://10.0.0.5:8545");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [chain]
            name = "staging"
            chain_id = 5
            rpc_urls = ["${{TX_LIFECYCLE_TEST_RPC}}"]

            [pool]
            confirmation_timeout_secs = 30

            [gas]
            gas_limit_buffer_percent = 20
            "#
        )
        .unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.chain.rpc_urls, vec!["http://10.0.0.5:8545".to_string()]);
        assert_eq!(settings.pool.confirmation_timeout_secs, 30);
        assert_eq!(settings.gas.gas_limit_buffer_percent, 20);
    }
}
