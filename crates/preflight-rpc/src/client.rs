//! Transport to the node and the thin typed client over it

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use preflight_types::envelope::{account_ledger_key, parse_account_entry, AccountEntry};
use preflight_types::xdr::{from_base64, to_base64};
use preflight_types::AccountId;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{NetworkProfile, RpcConfig};
use crate::error::{Result, RpcError};
use crate::types::*;

/// The node's JSON-RPC surface, one method per remote call
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Dry-run an unsigned envelope. Never executes.
    async fn simulate_transaction(&self, envelope_xdr: &str) -> Result<SimulateTransactionResponse>;

    async fn send_transaction(&self, envelope_xdr: &str) -> Result<SendTransactionResponse>;

    async fn get_transaction(&self, hash: &str) -> Result<GetTransactionResponse>;

    async fn get_latest_ledger(&self) -> Result<GetLatestLedgerResponse>;

    async fn get_ledger_entries(&self, keys: &[String]) -> Result<GetLedgerEntriesResponse>;
}

// ============================================================================
// HTTP transport
// ============================================================================

/// JSON-RPC 2.0 over HTTP POST
pub struct HttpTransport {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(profile: &NetworkProfile, config: &RpcConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RpcError::Transport {
                message: e.to_string(),
                timeout: false,
            })?;

        Ok(Self {
            url: profile.rpc_url.clone(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<P, R>(&self, method: &str, params: P) -> Result<R>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        tracing::trace!(method, id, url = %self.url, "JSON-RPC request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(RpcError::Http {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;

        if let Some(err) = body.error {
            return Err(RpcError::JsonRpc {
                code: err.code,
                message: err.message,
            });
        }
        body.result
            .ok_or_else(|| RpcError::InvalidResponse(format!("{} returned no result", method)))
    }
}

fn transport_error(err: reqwest::Error) -> RpcError {
    RpcError::Transport {
        message: err.to_string(),
        timeout: err.is_timeout(),
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn simulate_transaction(&self, envelope_xdr: &str) -> Result<SimulateTransactionResponse> {
        self.call(
            "simulateTransaction",
            SimulateTransactionParams {
                transaction: envelope_xdr,
            },
        )
        .await
    }

    async fn send_transaction(&self, envelope_xdr: &str) -> Result<SendTransactionResponse> {
        self.call(
            "sendTransaction",
            SimulateTransactionParams {
                transaction: envelope_xdr,
            },
        )
        .await
    }

    async fn get_transaction(&self, hash: &str) -> Result<GetTransactionResponse> {
        self.call("getTransaction", HashParams { hash }).await
    }

    async fn get_latest_ledger(&self) -> Result<GetLatestLedgerResponse> {
        self.call("getLatestLedger", serde_json::Value::Null).await
    }

    async fn get_ledger_entries(&self, keys: &[String]) -> Result<GetLedgerEntriesResponse> {
        self.call("getLedgerEntries", LedgerKeysParams { keys }).await
    }
}

// ============================================================================
// Typed client
// ============================================================================

/// Ledger reads that the simulation and lifecycle layers build on
#[derive(Clone)]
pub struct RpcClient {
    transport: Arc<dyn RpcTransport>,
    profile: NetworkProfile,
}

impl RpcClient {
    pub fn new(transport: Arc<dyn RpcTransport>, profile: NetworkProfile) -> Self {
        Self { transport, profile }
    }

    /// Connect over HTTP to the profile's node
    pub fn connect(profile: NetworkProfile, config: &RpcConfig) -> Result<Self> {
        let transport = HttpTransport::new(&profile, config)?;
        Ok(Self::new(Arc::new(transport), profile))
    }

    pub fn profile(&self) -> &NetworkProfile {
        &self.profile
    }

    pub fn transport(&self) -> Arc<dyn RpcTransport> {
        Arc::clone(&self.transport)
    }

    pub async fn latest_ledger(&self) -> Result<u32> {
        Ok(self.transport.get_latest_ledger().await?.sequence)
    }

    /// Current sequence number and balance of an account
    pub async fn load_account(&self, account: &AccountId) -> Result<AccountEntry> {
        let key = to_base64(&account_ledger_key(account));
        let response = self
            .transport
            .get_ledger_entries(std::slice::from_ref(&key))
            .await?;

        let entry = response
            .entries
            .unwrap_or_default()
            .into_iter()
            .find(|e| e.key == key)
            .ok_or_else(|| RpcError::AccountNotFound(account.to_string()))?;

        let parsed = parse_account_entry(&from_base64(&entry.xdr)?)?;
        tracing::debug!(
            account = %account,
            sequence = parsed.sequence,
            "Loaded account"
        );
        Ok(parsed)
    }
}
