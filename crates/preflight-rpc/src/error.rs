//! RPC and query errors

use preflight_types::{AmountError, ClassifiedError, DecodeError, XdrError};
use thiserror::Error;

/// Failures talking to the node
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    #[error("Transport error: {message}")]
    Transport { message: String, timeout: bool },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("JSON-RPC error {code}: {message}")]
    JsonRpc { code: i64, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Malformed XDR in response: {0}")]
    Xdr(#[from] XdrError),

    #[error("Account not found: {0}")]
    AccountNotFound(String),
}

impl RpcError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport { timeout: true, .. } => "RPC_TIMEOUT",
            Self::Transport { .. } => "RPC_TRANSPORT",
            Self::Http { .. } => "RPC_HTTP",
            Self::JsonRpc { .. } => "RPC_JSON_RPC",
            Self::InvalidResponse(_) => "RPC_INVALID_RESPONSE",
            Self::Xdr(_) => "RPC_XDR",
            Self::AccountNotFound(_) => "RPC_ACCOUNT_NOT_FOUND",
        }
    }

    /// Whether the same request may succeed if sent again unchanged
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;

/// Failures of a typed read-only contract call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("{0}")]
    Simulation(ClassifiedError),

    #[error("Unexpected return value: {0}")]
    Decode(#[from] DecodeError),

    /// A well-typed reply that no token amount can carry
    #[error("Unusable amount from contract: {0}")]
    Amount(#[from] AmountError),
}

impl QueryError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Simulation(err) => err.kind.error_code(),
            Self::Decode(err) => err.error_code(),
            Self::Amount(err) => err.error_code(),
        }
    }

    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Simulation(err) if err.kind.is_retriable())
    }

    /// The classified remote error, when that is what failed
    pub fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            Self::Simulation(err) => Some(err),
            Self::Decode(_) | Self::Amount(_) => None,
        }
    }
}
