//! CLI Configuration
//!
//! Layered: built-in defaults, an optional config file, then `PREFLIGHT__`
//! environment variables (`PREFLIGHT__NETWORK__NAME=futurenet`). Command
//! line flags are applied on top in `main`.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use preflight_rpc::{NetworkProfile, RpcConfig};
use preflight_tx::LifecycleConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub network: NetworkSettings,

    #[serde(default)]
    pub rpc: RpcSettings,

    #[serde(default)]
    pub poll: PollSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which network to talk to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Preset name (testnet, futurenet, mainnet, local) or a custom name
    #[serde(default = "default_network")]
    pub name: String,

    /// Overrides the preset's RPC endpoint
    pub rpc_url: Option<String>,

    /// Overrides the preset's passphrase
    pub passphrase: Option<String>,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self::named(default_network())
    }
}

impl NetworkSettings {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rpc_url: None,
            passphrase: None,
        }
    }

    /// Resolve to a profile. A custom network needs both URL and passphrase.
    pub fn profile(&self) -> anyhow::Result<NetworkProfile> {
        let Some(mut profile) = NetworkProfile::preset(&self.name) else {
            let rpc_url = self
                .rpc_url
                .clone()
                .with_context(|| format!("unknown network '{}': set network.rpc_url", self.name))?;
            let passphrase = self
                .passphrase
                .clone()
                .with_context(|| format!("unknown network '{}': set network.passphrase", self.name))?;
            return Ok(NetworkProfile::new(self.name.clone(), rpc_url, passphrase));
        };

        if let Some(url) = &self.rpc_url {
            profile.rpc_url = url.clone();
        }
        if let Some(passphrase) = &self.passphrase {
            profile.network_passphrase = passphrase.clone();
        }
        Ok(profile)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcSettings {
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Resource fee (stroops) above which simulations carry a warning
    #[serde(default = "default_fee_warning")]
    pub fee_warning_threshold: u64,
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            fee_warning_threshold: default_fee_warning(),
        }
    }
}

impl RpcSettings {
    pub fn rpc_config(&self) -> RpcConfig {
        RpcConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            fee_warning_threshold: self.fee_warning_threshold,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSettings {
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,

    #[serde(default = "default_poll_attempts")]
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
            max_attempts: default_poll_attempts(),
        }
    }
}

impl PollSettings {
    pub fn lifecycle_config(&self) -> LifecycleConfig {
        LifecycleConfig {
            poll_interval: Duration::from_millis(self.interval_ms),
            max_poll_attempts: self.max_attempts,
            ..LifecycleConfig::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_network() -> String {
    "testnet".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_fee_warning() -> u64 {
    1_000_000
}

fn default_poll_interval() -> u64 {
    1_000
}

fn default_poll_attempts() -> u32 {
    30
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl CliConfig {
    /// Load from `.env`, an optional file and the environment
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();

        // An explicitly named file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }
        builder = builder
            .add_source(config::File::with_name("preflight").required(false))
            .add_source(
                config::Environment::with_prefix("PREFLIGHT")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build().context("failed to read configuration")?;
        config
            .try_deserialize()
            .context("invalid configuration")
    }
}
