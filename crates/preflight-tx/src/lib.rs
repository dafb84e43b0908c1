//! Preflight TX - drives one invocation from build to a final status
//!
//! The lifecycle never holds keys. Signing goes through the [`Signer`]
//! collaborator, time through the [`Clock`], and the node through
//! `preflight_rpc::RpcTransport`.
//!
//! ```ignore
//! let lifecycle = TransactionLifecycle::new(transport, simulation, Arc::new(TokioClock), LifecycleConfig::default());
//! let account = rpc.load_account(&source).await?;
//! let mut envelope = lifecycle.build(source, account.sequence + 1, invocation);
//! match envelope.run(&wallet).await? {
//!     TxOutcome::Success { hash, .. } => println!("included: {hash}"),
//!     TxOutcome::Failed { message, .. } => println!("failed: {message}"),
//!     TxOutcome::TimedOut { hash, .. } => println!("still unknown, re-check {hash}"),
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod signer;

pub use clock::{Clock, ManualClock, TokioClock};
pub use config::LifecycleConfig;
pub use error::LifecycleError;
pub use lifecycle::{TransactionEnvelope, TransactionLifecycle, TxOutcome, TxState};
pub use signer::{SignError, Signer};
