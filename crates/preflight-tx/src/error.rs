use preflight_rpc::RpcError;
use preflight_types::ClassifiedError;
use thiserror::Error;

use crate::lifecycle::TxState;
use crate::signer::SignError;

/// Failures while driving an envelope through its lifecycle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// A step was called from the wrong state. Always a caller bug.
    #[error("Cannot {operation} from state {state}")]
    OutOfOrderStep {
        operation: &'static str,
        state: TxState,
    },

    #[error("Simulation failed: {0}")]
    Simulation(ClassifiedError),

    #[error("Simulation returned no transaction data to assemble")]
    IncompleteSimulation,

    #[error("Total fee overflows: base {base_fee} + resource {resource_fee}")]
    FeeOverflow { base_fee: u32, resource_fee: u64 },

    #[error(transparent)]
    Sign(#[from] SignError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("Node is busy; submit again later")]
    TryAgainLater,

    #[error("Transaction rejected: {message}")]
    SubmitRejected { message: String, code: Option<i32> },

    #[error("Transaction {hash} failed: {message}")]
    TransactionFailed { hash: String, message: String },

    /// Outcome unknown; re-query the hash later
    #[error("No result for {hash} after {attempts} polls")]
    TimedOut { hash: String, attempts: u32 },
}

impl LifecycleError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::OutOfOrderStep { .. } => "OUT_OF_ORDER_STEP",
            Self::Simulation(err) => err.kind.error_code(),
            Self::IncompleteSimulation => "INCOMPLETE_SIMULATION",
            Self::FeeOverflow { .. } => "FEE_OVERFLOW",
            Self::Sign(err) => err.error_code(),
            Self::Rpc(err) => err.error_code(),
            Self::TryAgainLater => "TRY_AGAIN_LATER",
            Self::SubmitRejected { .. } => "SUBMIT_REJECTED",
            Self::TransactionFailed { .. } => "TRANSACTION_FAILED",
            Self::TimedOut { .. } => "TIMED_OUT",
        }
    }

    /// Whether the same step may be called again unchanged
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Simulation(err) => err.kind.is_retriable(),
            Self::Rpc(err) => err.is_retriable(),
            Self::TryAgainLater => true,
            _ => false,
        }
    }
}
