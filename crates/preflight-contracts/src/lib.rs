//! Preflight Contracts - typed helpers for the token and vesting contracts
//!
//! Thin wrappers over `SimulationClient`: reads decode return values,
//! writes are pre-flighted only. Signing and submission belong to
//! `preflight-tx`.

pub mod error;
pub mod token;
pub mod vesting;

pub use error::InputError;
pub use token::{amount_arg, TokenClient, TokenMetadata};
pub use vesting::VestingClient;
