//! The transaction lifecycle state machine
//!
//! ```text
//! Built → Simulated → Assembled → Signed → Submitted → Pending → Success
//!                                                              → Failed
//!                                                              → TimedOut
//! ```
//!
//! Each arrow is one method on [`TransactionEnvelope`]. Calling a method
//! from any other state fails with [`LifecycleError::OutOfOrderStep`] and
//! leaves the envelope untouched. Steps that fail for retriable reasons
//! (transport trouble, a busy node) also leave the state where it was so
//! the caller may call the same step again.

use std::fmt;
use std::sync::Arc;

use preflight_rpc::{
    PreflightResult, RpcTransport, SendStatus, SimulationClient, TransactionStatus,
};
use preflight_types::xdr::{from_base64, to_base64};
use preflight_types::{
    describe_transaction_result, AccountId, ClassifiedError, Invocation, TimeBounds,
    Transaction,
};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::LifecycleConfig;
use crate::error::LifecycleError;
use crate::signer::Signer;

pub type Result<T> = std::result::Result<T, LifecycleError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxState {
    Built,
    Simulated,
    Assembled,
    Signed,
    /// Sent; the node has not answered yet
    Submitted,
    /// Accepted by the node, awaiting inclusion
    Pending,
    Success,
    Failed,
    /// Polling gave up; the outcome is unknown
    TimedOut,
}

impl TxState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::TimedOut)
    }
}

impl fmt::Display for TxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a submitted transaction ended, as far as polling could tell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    Success {
        hash: String,
        ledger: Option<u32>,
        fee_charged: Option<i64>,
    },
    Failed {
        hash: String,
        ledger: Option<u32>,
        message: String,
    },
    /// Not a verdict: query the hash again later. `attempts` counts every
    /// status query made, the first one included.
    TimedOut { hash: String, attempts: u32 },
}

impl TxOutcome {
    pub fn hash(&self) -> &str {
        match self {
            Self::Success { hash, .. } | Self::Failed { hash, .. } | Self::TimedOut { hash, .. } => {
                hash
            }
        }
    }

    pub fn state(&self) -> TxState {
        match self {
            Self::Success { .. } => TxState::Success,
            Self::Failed { .. } => TxState::Failed,
            Self::TimedOut { .. } => TxState::TimedOut,
        }
    }

    /// Treat anything but success as an error
    pub fn into_result(self) -> Result<String> {
        match self {
            Self::Success { hash, .. } => Ok(hash),
            Self::Failed { hash, message, .. } => {
                Err(LifecycleError::TransactionFailed { hash, message })
            }
            Self::TimedOut { hash, attempts } => Err(LifecycleError::TimedOut { hash, attempts }),
        }
    }
}

/// Shared machinery for building and tracking envelopes.
///
/// Holds its network profile by value; every envelope it builds keeps the
/// profile it was built with.
#[derive(Clone)]
pub struct TransactionLifecycle {
    simulation: SimulationClient,
    transport: Arc<dyn RpcTransport>,
    clock: Arc<dyn Clock>,
    config: LifecycleConfig,
}

impl TransactionLifecycle {
    pub fn new(
        transport: Arc<dyn RpcTransport>,
        simulation: SimulationClient,
        clock: Arc<dyn Clock>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            simulation,
            transport,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Build an unsigned envelope for `invocation`.
    ///
    /// `sequence` is the transaction's own sequence number, one past the
    /// source account's current one. The envelope is valid from now until
    /// the configured validity window elapses.
    pub fn build(&self, source: AccountId, sequence: i64, invocation: Invocation) -> TransactionEnvelope {
        let now = self.clock.unix_now();
        let tx = Transaction {
            source,
            fee: self.config.base_fee,
            sequence,
            time_bounds: Some(TimeBounds {
                min_time: 0,
                max_time: now.saturating_add(self.config.validity_window.as_secs()),
            }),
            invocation,
            auth: Vec::new(),
            soroban_data: None,
        };

        let passphrase = self.simulation.profile().network_passphrase.clone();
        debug!(
            source = %tx.source,
            sequence,
            method = %tx.invocation.method,
            network = %self.simulation.profile().name,
            "Built envelope"
        );

        TransactionEnvelope {
            lifecycle: self.clone(),
            network_passphrase: passphrase,
            state: TxState::Built,
            tx,
            preflight: None,
            signed: None,
            hash: None,
            outcome: None,
        }
    }

    /// Poll a transaction by hash until it resolves or the retry cap is
    /// reached. Safe to call again for the same hash at any time.
    ///
    /// The first query is immediate; up to `max_poll_attempts` re-queries
    /// follow, each one poll interval after the previous.
    pub async fn poll_hash(&self, hash: &str) -> Result<TxOutcome> {
        let max_retries = self.config.max_poll_attempts;

        for attempt in 0..=max_retries {
            if attempt > 0 {
                self.clock.sleep(self.config.poll_interval).await;
            }

            match self.transport.get_transaction(hash).await {
                Ok(response) => match response.status {
                    TransactionStatus::Success => {
                        let fee_charged = decode_result(response.result_xdr.as_deref())
                            .map(|summary| summary.fee_charged);
                        info!(hash, attempt, ledger = ?response.ledger, "Transaction succeeded");
                        return Ok(TxOutcome::Success {
                            hash: hash.to_string(),
                            ledger: response.ledger,
                            fee_charged,
                        });
                    }
                    TransactionStatus::Failed => {
                        let message = decode_result(response.result_xdr.as_deref())
                            .map(|summary| summary.message())
                            .unwrap_or_else(|| "Transaction failed".to_string());
                        warn!(hash, attempt, %message, "Transaction failed");
                        return Ok(TxOutcome::Failed {
                            hash: hash.to_string(),
                            ledger: response.ledger,
                            message,
                        });
                    }
                    TransactionStatus::NotFound => {
                        debug!(hash, attempt, max_retries, "Transaction not found yet");
                    }
                },
                Err(err) if err.is_retriable() => {
                    debug!(hash, attempt, error = %err, "Status query failed, will retry");
                }
                Err(err) => return Err(err.into()),
            }
        }

        let attempts = max_retries.saturating_add(1);
        warn!(hash, attempts, "Gave up polling; outcome unknown");
        Ok(TxOutcome::TimedOut {
            hash: hash.to_string(),
            attempts,
        })
    }
}

fn decode_result(xdr: Option<&str>) -> Option<preflight_types::TransactionResultSummary> {
    let bytes = from_base64(xdr?).ok()?;
    describe_transaction_result(&bytes).ok()
}

/// One transaction on its way through the lifecycle
pub struct TransactionEnvelope {
    lifecycle: TransactionLifecycle,
    network_passphrase: String,
    state: TxState,
    tx: Transaction,
    preflight: Option<PreflightResult>,
    signed: Option<Vec<u8>>,
    hash: Option<String>,
    outcome: Option<TxOutcome>,
}

impl TransactionEnvelope {
    pub fn state(&self) -> TxState {
        self.state
    }

    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    pub fn network_passphrase(&self) -> &str {
        &self.network_passphrase
    }

    pub fn preflight(&self) -> Option<&PreflightResult> {
        self.preflight.as_ref()
    }

    /// The encoded envelope a signer receives
    pub fn unsigned_envelope(&self) -> Vec<u8> {
        self.tx.to_envelope_xdr()
    }

    /// Hash of the transaction as currently built
    pub fn hash_hex(&self) -> String {
        self.tx
            .hash_hex(&preflight_types::network_id(&self.network_passphrase))
    }

    /// Identifier the node accepted, once submitted
    pub fn submitted_hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    pub fn outcome(&self) -> Option<&TxOutcome> {
        self.outcome.as_ref()
    }

    fn expect_state(&self, operation: &'static str, allowed: &[TxState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(LifecycleError::OutOfOrderStep {
                operation,
                state: self.state,
            })
        }
    }

    /// Dry-run the built envelope.
    ///
    /// A classified remote error stops the pipeline: the envelope becomes
    /// `Failed` unless the error is transport trouble worth retrying.
    pub async fn simulate(&mut self) -> Result<&PreflightResult> {
        self.expect_state("simulate", &[TxState::Built])?;

        let result = self.lifecycle.simulation.simulate_transaction(&self.tx).await;
        if let Some(err) = result.error() {
            let err: ClassifiedError = err.clone();
            if !err.kind.is_retriable() {
                self.state = TxState::Failed;
            }
            return Err(LifecycleError::Simulation(err));
        }

        self.state = TxState::Simulated;
        Ok(&*self.preflight.insert(result))
    }

    /// Fold the simulated resource fee, footprint and auth entries into the
    /// envelope, making it ready to sign
    pub fn assemble(&mut self) -> Result<()> {
        self.expect_state("assemble", &[TxState::Simulated])?;
        let preflight = self
            .preflight
            .as_ref()
            .ok_or(LifecycleError::IncompleteSimulation)?;
        let data = preflight
            .transaction_data()
            .ok_or(LifecycleError::IncompleteSimulation)?;

        let base_fee = self.lifecycle.config.base_fee;
        let resource_fee = preflight.resources().map(|r| r.min_resource_fee).unwrap_or(0);
        let fee = u64::from(base_fee)
            .checked_add(resource_fee)
            .and_then(|total| u32::try_from(total).ok())
            .ok_or(LifecycleError::FeeOverflow {
                base_fee,
                resource_fee,
            })?;

        self.tx.fee = fee;
        self.tx.soroban_data = Some(data.to_vec());
        self.tx.auth = preflight.auth().to_vec();
        self.state = TxState::Assembled;

        debug!(fee, auth_entries = self.tx.auth.len(), hash = %self.hash_hex(), "Assembled envelope");
        Ok(())
    }

    /// Ask the signer to sign. A rejection leaves the envelope assembled.
    pub async fn sign(&mut self, signer: &dyn Signer) -> Result<()> {
        self.expect_state("sign", &[TxState::Assembled])?;
        let signed = signer
            .sign(&self.unsigned_envelope(), &self.network_passphrase)
            .await?;
        self.signed = Some(signed);
        self.state = TxState::Signed;
        Ok(())
    }

    /// Accept an envelope signed outside this process
    pub fn attach_signed(&mut self, signed_envelope: Vec<u8>) -> Result<()> {
        self.expect_state("attach signed envelope", &[TxState::Assembled])?;
        self.signed = Some(signed_envelope);
        self.state = TxState::Signed;
        Ok(())
    }

    /// Send the signed envelope. Returns the hash the node will report on.
    pub async fn submit(&mut self) -> Result<String> {
        self.expect_state("submit", &[TxState::Signed])?;
        let signed = match &self.signed {
            Some(signed) => to_base64(signed),
            None => {
                return Err(LifecycleError::OutOfOrderStep {
                    operation: "submit",
                    state: self.state,
                })
            }
        };

        self.state = TxState::Submitted;
        let response = match self.lifecycle.transport.send_transaction(&signed).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "Submission failed before the node answered");
                self.state = TxState::Signed;
                return Err(err.into());
            }
        };

        let hash = if response.hash.is_empty() {
            self.hash_hex()
        } else {
            response.hash.clone()
        };

        match response.status {
            SendStatus::Pending | SendStatus::Duplicate => {
                info!(%hash, status = ?response.status, "Transaction accepted");
                self.state = TxState::Pending;
                self.hash = Some(hash.clone());
                Ok(hash)
            }
            SendStatus::TryAgainLater => {
                warn!(%hash, "Node asked to try again later");
                self.state = TxState::Signed;
                Err(LifecycleError::TryAgainLater)
            }
            SendStatus::Error => {
                let summary = decode_result(response.error_result_xdr.as_deref());
                let message = summary
                    .as_ref()
                    .map(|s| s.message())
                    .unwrap_or_else(|| "The node rejected the transaction".to_string());
                warn!(%hash, %message, "Transaction rejected");

                self.state = TxState::Failed;
                self.hash = Some(hash.clone());
                self.outcome = Some(TxOutcome::Failed {
                    hash,
                    ledger: None,
                    message: message.clone(),
                });
                Err(LifecycleError::SubmitRejected {
                    message,
                    code: summary.map(|s| s.code),
                })
            }
        }
    }

    /// Wait for the submitted transaction to resolve.
    ///
    /// Also allowed from `Submitted`, for when a submit was interrupted
    /// before the node answered.
    pub async fn poll(&mut self) -> Result<TxOutcome> {
        self.expect_state("poll", &[TxState::Pending, TxState::Submitted])?;
        let hash = match &self.hash {
            Some(hash) => hash.clone(),
            None => self.hash_hex(),
        };

        let outcome = self.lifecycle.poll_hash(&hash).await?;
        self.state = outcome.state();
        self.hash = Some(hash);
        self.outcome = Some(outcome.clone());
        Ok(outcome)
    }

    /// Drive simulate → assemble → sign → submit → poll, stopping at the
    /// first error
    pub async fn run(&mut self, signer: &dyn Signer) -> Result<TxOutcome> {
        self.simulate().await?;
        self.assemble()?;
        self.sign(signer).await?;
        self.submit().await?;
        self.poll().await
    }
}

impl fmt::Debug for TransactionEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionEnvelope")
            .field("state", &self.state)
            .field("method", &self.tx.invocation.method)
            .field("sequence", &self.tx.sequence)
            .field("hash", &self.hash)
            .finish()
    }
}
