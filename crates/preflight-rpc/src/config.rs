//! Network profiles and client settings
//!
//! A profile is a plain value. Clients copy it at construction and keep it
//! for their lifetime; switching networks means building a new client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which node to talk to and which network it serves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkProfile {
    pub name: String,
    pub rpc_url: String,
    pub network_passphrase: String,
}

impl NetworkProfile {
    pub fn new(
        name: impl Into<String>,
        rpc_url: impl Into<String>,
        network_passphrase: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            rpc_url: rpc_url.into(),
            network_passphrase: network_passphrase.into(),
        }
    }

    pub fn testnet() -> Self {
        Self::new(
            "testnet",
            "https://soroban-testnet.stellar.org",
            "Test SDF Network ; September 2015",
        )
    }

    pub fn futurenet() -> Self {
        Self::new(
            "futurenet",
            "https://rpc-futurenet.stellar.org",
            "Test SDF Future Network ; October 2022",
        )
    }

    pub fn mainnet() -> Self {
        Self::new(
            "mainnet",
            "https://mainnet.sorobanrpc.com",
            "Public Global Stellar Network ; September 2015",
        )
    }

    /// A standalone node started by the quickstart image
    pub fn local() -> Self {
        Self::new(
            "local",
            "http://localhost:8000/soroban/rpc",
            "Standalone Network ; February 2017",
        )
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "testnet" => Some(Self::testnet()),
            "futurenet" => Some(Self::futurenet()),
            "mainnet" | "public" => Some(Self::mainnet()),
            "local" | "standalone" => Some(Self::local()),
            _ => None,
        }
    }

    /// SHA-256 of the passphrase; signs into every transaction hash
    pub fn network_id(&self) -> [u8; 32] {
        preflight_types::network_id(&self.network_passphrase)
    }
}

impl Default for NetworkProfile {
    fn default() -> Self {
        Self::testnet()
    }
}

/// Settings for the RPC and simulation clients
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Warn when the estimated resource fee (stroops) exceeds this
    pub fee_warning_threshold: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            fee_warning_threshold: 1_000_000,
        }
    }
}
