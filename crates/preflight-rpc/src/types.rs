//! JSON-RPC wire types
//!
//! Field names follow the node's camelCase. Encoded payloads stay base64
//! strings here; decoding happens in the clients that need them.

use serde::{Deserialize, Deserializer, Serialize};

/// JSON-RPC 2.0 request
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a, P: Serialize> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: P,
}

/// JSON-RPC 2.0 response
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse<R> {
    pub result: Option<R>,
    pub error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

// ============================================================================
// simulateTransaction
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SimulateTransactionParams<'a> {
    pub transaction: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateTransactionResponse {
    #[serde(default)]
    pub latest_ledger: u32,
    /// Diagnostic text when the invocation failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<SimulateHostFunctionResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_data: Option<String>,
    #[serde(default, deserialize_with = "u64_lenient", skip_serializing_if = "Option::is_none")]
    pub min_resource_fee: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<SimulateCost>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_preamble: Option<RestorePreamble>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulateHostFunctionResult {
    /// Encoded return value
    #[serde(default)]
    pub xdr: String,
    /// Encoded authorization entries to attach when assembling
    #[serde(default)]
    pub auth: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateCost {
    #[serde(default, deserialize_with = "u64_lenient")]
    pub cpu_insns: Option<u64>,
    #[serde(default, deserialize_with = "u64_lenient")]
    pub mem_bytes: Option<u64>,
}

/// Present when archived entries must be restored before the call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorePreamble {
    #[serde(default)]
    pub transaction_data: String,
    #[serde(default, deserialize_with = "u64_lenient")]
    pub min_resource_fee: Option<u64>,
}

// ============================================================================
// sendTransaction
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendStatus {
    Pending,
    Duplicate,
    TryAgainLater,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionResponse {
    pub status: SendStatus,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub latest_ledger: u32,
    /// Encoded `TransactionResult` explaining an `ERROR`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_result_xdr: Option<String>,
}

// ============================================================================
// getTransaction
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HashParams<'a> {
    pub hash: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    NotFound,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTransactionResponse {
    pub status: TransactionStatus,
    #[serde(default)]
    pub latest_ledger: u32,
    /// Ledger the transaction was included in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_xdr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envelope_xdr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_meta_xdr: Option<String>,
}

impl GetTransactionResponse {
    pub fn not_found(latest_ledger: u32) -> Self {
        Self {
            status: TransactionStatus::NotFound,
            latest_ledger,
            ledger: None,
            result_xdr: None,
            envelope_xdr: None,
            result_meta_xdr: None,
        }
    }
}

// ============================================================================
// getLatestLedger / getLedgerEntries
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLatestLedgerResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub protocol_version: u32,
    pub sequence: u32,
}

#[derive(Debug, Serialize)]
pub struct LedgerKeysParams<'a> {
    pub keys: &'a [String],
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLedgerEntriesResponse {
    #[serde(default)]
    pub entries: Option<Vec<LedgerEntryResult>>,
    #[serde(default)]
    pub latest_ledger: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryResult {
    pub key: String,
    /// Encoded ledger entry data
    pub xdr: String,
    #[serde(default)]
    pub last_modified_ledger_seq: u32,
}

/// Nodes send 64-bit counters as strings; older ones send numbers
fn u64_lenient<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Num(n)) => Ok(Some(n)),
        Some(Raw::Str(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
