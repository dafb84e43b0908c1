//! Preflight Types - value model and pure math for contract pre-flight
//!
//! This crate has no network dependencies. It defines:
//!
//! - The tagged contract value model and its XDR wire encoding
//! - Strkey addresses (`G...` accounts, `C...` contracts)
//! - Typed decode/encode between values and native types
//! - Invocation envelopes, transaction hashes and result decoding
//! - Exact decimal amount conversion
//! - The remote error taxonomy and its classifier
//! - Vesting and allowance math over ledger heights
//!
//! # Flow
//!
//! ```text
//! parse_to_raw → encode → Transaction → (simulate) → decode → to_display
//! ```

pub mod allowance;
pub mod amount;
pub mod classify;
pub mod codec;
pub mod envelope;
pub mod error;
pub mod strkey;
pub mod value;
pub mod vesting;
pub mod xdr;

pub use allowance::AllowanceGrant;
pub use amount::{
    check_decimals, parse_to_i128, parse_to_raw, to_display, TokenAmount, MAX_DECIMALS,
};
pub use classify::{classify, ClassifiedError, ErrorKind};
pub use codec::{decode, encode, field, FromValue, Native, TypeHint};
pub use envelope::{
    describe_transaction_result, network_id, Invocation, TimeBounds, Transaction,
    TransactionResultSummary, BASE_FEE,
};
pub use error::*;
pub use strkey::{AccountId, ContractId, ScAddress};
pub use value::{i128_from_parts, i128_to_parts, Value};
pub use vesting::{
    releasable_amount, vested_amount, VestingError, VestingProgress, VestingSchedule,
};
pub use xdr::{XdrReader, XdrWriter};
