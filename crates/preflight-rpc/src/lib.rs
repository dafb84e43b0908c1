//! Preflight RPC - node transport and pre-flight simulation
//!
//! Talks JSON-RPC 2.0 to a contract node. The [`RpcTransport`] trait is the
//! seam: [`HttpTransport`] speaks HTTP, tests plug in scripted transports.
//!
//! # Example
//!
//! ```ignore
//! let profile = NetworkProfile::testnet();
//! let config = RpcConfig::default();
//! let rpc = RpcClient::connect(profile.clone(), &config)?;
//! let sim = SimulationClient::new(rpc.transport(), profile, config);
//!
//! let result = sim.simulate(token, "balance", vec![holder.into()], None).await;
//! if !result.success() {
//!     for err in result.errors() {
//!         println!("{}", err.message);
//!     }
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod simulation;
pub mod types;

pub use client::{HttpTransport, RpcClient, RpcTransport};
pub use config::{NetworkProfile, RpcConfig};
pub use error::{QueryError, Result, RpcError};
pub use simulation::{classify_rpc_error, PreflightResult, ResourceEstimate, SimulationClient};
pub use types::*;
