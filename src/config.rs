use crate::api::kraken::{Credentials, KRAKEN_API_BASE};
use crate::execution::FailurePolicy;
use crate::models::PriceSource;
use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "kraken-dca";
const ENV_PREFIX: &str = "KRAKEN_DCA";

/// Runtime settings: defaults, then config file, then `KRAKEN_DCA_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_url: String,
    pub orders_file: PathBuf,
    pub key_file: PathBuf,
    pub log_file: PathBuf,
    pub price_source: PriceSource,
    pub failure_policy: FailurePolicy,
    pub request_timeout_secs: u64,
    pub requests_per_minute: u32,
    pub validate_only: bool,
}

impl Settings {
    /// Load settings. An explicit `config_file` must exist; the default one is optional.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let builder = Config::builder()
            .set_default("api_url", KRAKEN_API_BASE)?
            .set_default("orders_file", "orders.json")?
            .set_default("key_file", "kraken.key")?
            .set_default("log_file", "kraken_dca.log")?
            .set_default("price_source", "ticker")?
            .set_default("failure_policy", "abort")?
            .set_default("request_timeout_secs", 30_i64)?
            .set_default("requests_per_minute", 60_i64)?
            .set_default("validate_only", false)?;

        let builder = match config_file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// API credentials from the environment, falling back to the key file
    pub fn credentials(&self) -> Result<Credentials> {
        if let Some(credentials) = Credentials::from_env()? {
            tracing::debug!("Using Kraken credentials from environment");
            return Ok(credentials);
        }

        if !self.key_file.exists() {
            anyhow::bail!(
                "No Kraken API credentials found. Set KRAKEN_API_KEY and KRAKEN_API_SECRET \
                 or create {} with your API key on the first line and the secret on the second",
                self.key_file.display()
            );
        }

        Credentials::from_key_file(&self.key_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.toml");
        std::fs::write(&path, "").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();

        assert_eq!(settings.api_url, "https://api.kraken.com");
        assert_eq!(settings.orders_file, PathBuf::from("orders.json"));
        assert_eq!(settings.key_file, PathBuf::from("kraken.key"));
        assert_eq!(settings.price_source, PriceSource::Ticker);
        assert_eq!(settings.failure_policy, FailurePolicy::Abort);
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.requests_per_minute, 60);
        assert!(!settings.validate_only);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
orders_file = "/etc/dca/orders.json"
price_source = "ohlc"
failure_policy = "continue"
request_timeout_secs = 10
validate_only = true
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();

        assert_eq!(settings.orders_file, PathBuf::from("/etc/dca/orders.json"));
        assert_eq!(settings.price_source, PriceSource::Ohlc);
        assert_eq!(settings.failure_policy, FailurePolicy::Continue);
        assert_eq!(settings.request_timeout_secs, 10);
        assert!(settings.validate_only);
    }

    #[test]
    fn test_explicit_config_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let result = Settings::load(Some(&dir.path().join("missing.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, r#"failure_policy = "retry""#).unwrap();

        assert!(Settings::load(Some(file.path())).is_err());
    }
}
