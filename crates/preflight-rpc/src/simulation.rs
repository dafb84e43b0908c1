//! Pre-flight simulation
//!
//! Every call here goes to `simulateTransaction` only. Nothing is signed or
//! submitted, so any number of simulations may run concurrently.

use std::sync::Arc;

use preflight_types::xdr::from_base64;
use preflight_types::{
    classify, AccountId, ClassifiedError, ErrorKind, FromValue, Invocation, ScAddress,
    Transaction, Value, BASE_FEE,
};

use crate::client::RpcTransport;
use crate::config::{NetworkProfile, RpcConfig};
use crate::error::{QueryError, RpcError};
use crate::types::SimulateTransactionResponse;

/// Reported when the node claims success without a return value
pub const SIMULATION_INCOMPLETE: &str =
    "Simulation incomplete: the node returned no result for this call.";

/// Warning added when archived ledger state blocks the call
pub const RESTORE_REQUIRED: &str =
    "Archived contract state must be restored before this call can succeed.";

/// What the node expects the call to cost
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceEstimate {
    /// Resource fee in stroops, on top of the inclusion fee
    pub min_resource_fee: u64,
    pub cpu_instructions: u64,
    pub memory_bytes: u64,
}

/// Outcome of a pre-flight simulation.
///
/// Built only through [`PreflightResult::failed`] and the simulation
/// client, so a successful result never carries errors and a failed one
/// always carries at least one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightResult {
    success: bool,
    errors: Vec<ClassifiedError>,
    warnings: Vec<String>,
    return_value: Option<Value>,
    resources: Option<ResourceEstimate>,
    transaction_data: Option<Vec<u8>>,
    auth: Vec<Vec<u8>>,
    latest_ledger: Option<u32>,
}

impl PreflightResult {
    pub fn failed(error: ClassifiedError) -> Self {
        Self {
            success: false,
            errors: vec![error],
            warnings: Vec::new(),
            return_value: None,
            resources: None,
            transaction_data: None,
            auth: Vec::new(),
            latest_ledger: None,
        }
    }

    fn succeeded(return_value: Value, resources: ResourceEstimate) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            return_value: Some(return_value),
            resources: Some(resources),
            transaction_data: None,
            auth: Vec::new(),
            latest_ledger: None,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn errors(&self) -> &[ClassifiedError] {
        &self.errors
    }

    /// The first classified error, if the simulation failed
    pub fn error(&self) -> Option<&ClassifiedError> {
        self.errors.first()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn return_value(&self) -> Option<&Value> {
        self.return_value.as_ref()
    }

    pub fn resources(&self) -> Option<&ResourceEstimate> {
        self.resources.as_ref()
    }

    /// Encoded Soroban transaction data (footprint and resource limits)
    pub fn transaction_data(&self) -> Option<&[u8]> {
        self.transaction_data.as_deref()
    }

    /// Encoded authorization entries the invocation needs
    pub fn auth(&self) -> &[Vec<u8>] {
        &self.auth
    }

    pub fn latest_ledger(&self) -> Option<u32> {
        self.latest_ledger
    }

    /// Decode the return value as `T`
    pub fn decode<T: FromValue>(&self) -> Result<T, QueryError> {
        if let Some(err) = self.error() {
            return Err(QueryError::Simulation(err.clone()));
        }
        match &self.return_value {
            Some(value) => Ok(T::from_value(value)?),
            None => Err(QueryError::Simulation(incomplete())),
        }
    }

    fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    fn with_latest_ledger(mut self, ledger: u32) -> Self {
        if ledger > 0 {
            self.latest_ledger = Some(ledger);
        }
        self
    }
}

fn incomplete() -> ClassifiedError {
    ClassifiedError::new(ErrorKind::Unknown, SIMULATION_INCOMPLETE, "")
}

/// Turn a transport failure into the classification the UI shows
pub fn classify_rpc_error(err: &RpcError) -> ClassifiedError {
    let raw = err.to_string();
    if err.is_retriable() {
        return ClassifiedError::of_kind(ErrorKind::NetworkTimeout, raw);
    }
    classify(&raw)
}

/// Runs invocations through the node's simulate-only endpoint
#[derive(Clone)]
pub struct SimulationClient {
    transport: Arc<dyn RpcTransport>,
    profile: NetworkProfile,
    config: RpcConfig,
}

impl SimulationClient {
    pub fn new(transport: Arc<dyn RpcTransport>, profile: NetworkProfile, config: RpcConfig) -> Self {
        Self {
            transport,
            profile,
            config,
        }
    }

    pub fn profile(&self) -> &NetworkProfile {
        &self.profile
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Simulate `method(args)` on `contract`.
    ///
    /// Without a source the envelope uses a zeroed placeholder account,
    /// which is enough for reads.
    pub async fn simulate(
        &self,
        contract: impl Into<ScAddress>,
        method: &str,
        args: Vec<Value>,
        source: Option<AccountId>,
    ) -> PreflightResult {
        let invocation = Invocation::new(contract, method, args);
        self.simulate_invocation(&invocation, source).await
    }

    pub async fn simulate_invocation(
        &self,
        invocation: &Invocation,
        source: Option<AccountId>,
    ) -> PreflightResult {
        let tx = Transaction {
            source: source.unwrap_or(AccountId::PLACEHOLDER),
            fee: BASE_FEE,
            sequence: 0,
            time_bounds: None,
            invocation: invocation.clone(),
            auth: Vec::new(),
            soroban_data: None,
        };
        self.simulate_transaction(&tx).await
    }

    /// Simulate a fully built transaction, as the lifecycle does
    pub async fn simulate_transaction(&self, tx: &Transaction) -> PreflightResult {
        let method = tx.invocation.method.as_str();
        let contract = tx.invocation.contract.to_string();
        tracing::debug!(
            network = %self.profile.name,
            contract = %contract,
            method,
            "Simulating invocation"
        );

        let response = match self
            .transport
            .simulate_transaction(&tx.to_envelope_base64())
            .await
        {
            Ok(response) => response,
            Err(err) => {
                let classified = classify_rpc_error(&err);
                tracing::warn!(
                    contract = %contract,
                    method,
                    error = %err,
                    kind = %classified.kind,
                    "Simulation request failed"
                );
                return PreflightResult::failed(classified);
            }
        };

        let result = self.interpret(response);
        match result.error() {
            None => tracing::info!(
                contract = %contract,
                method,
                min_resource_fee = result.resources().map(|r| r.min_resource_fee),
                "Simulation succeeded"
            ),
            Some(err) => tracing::info!(
                contract = %contract,
                method,
                kind = %err.kind,
                raw = %err.raw,
                "Simulation reported an error"
            ),
        }
        result
    }

    fn interpret(&self, response: SimulateTransactionResponse) -> PreflightResult {
        let latest_ledger = response.latest_ledger;

        if let Some(text) = response.error.as_deref() {
            return PreflightResult::failed(classify(text)).with_latest_ledger(latest_ledger);
        }

        let first = response.results.as_ref().and_then(|r| r.first());
        let Some(first) = first.filter(|r| !r.xdr.is_empty()) else {
            return PreflightResult::failed(incomplete()).with_latest_ledger(latest_ledger);
        };

        let decoded = Value::from_xdr_base64(&first.xdr).and_then(|value| {
            let auth = first
                .auth
                .iter()
                .map(|entry| from_base64(entry))
                .collect::<Result<Vec<_>, _>>()?;
            let data = response
                .transaction_data
                .as_deref()
                .filter(|d| !d.is_empty())
                .map(from_base64)
                .transpose()?;
            Ok((value, auth, data))
        });
        let (value, auth, data) = match decoded {
            Ok(parts) => parts,
            Err(err) => {
                let raw = format!("undecodable simulation result: {}", err);
                return PreflightResult::failed(ClassifiedError::new(
                    ErrorKind::Unknown,
                    format!("{} Raw error: {}", SIMULATION_INCOMPLETE, raw),
                    raw,
                ))
                .with_latest_ledger(latest_ledger);
            }
        };

        let cost = response.cost.unwrap_or_default();
        let resources = ResourceEstimate {
            min_resource_fee: response.min_resource_fee.unwrap_or(0),
            cpu_instructions: cost.cpu_insns.unwrap_or(0),
            memory_bytes: cost.mem_bytes.unwrap_or(0),
        };

        let mut result = PreflightResult::succeeded(value, resources).with_latest_ledger(latest_ledger);
        result.auth = auth;
        result.transaction_data = data;

        if resources.min_resource_fee > self.config.fee_warning_threshold {
            tracing::warn!(
                min_resource_fee = resources.min_resource_fee,
                threshold = self.config.fee_warning_threshold,
                "Estimated resource fee above warning threshold"
            );
            result = result.with_warning(format!(
                "Estimated resource fee of {} stroops exceeds the warning threshold of {} stroops.",
                resources.min_resource_fee, self.config.fee_warning_threshold
            ));
        }
        if response.restore_preamble.is_some() {
            result = result.with_warning(RESTORE_REQUIRED);
        }
        result
    }

    /// Simulate a read and decode its return value
    pub async fn query<T: FromValue>(
        &self,
        contract: impl Into<ScAddress>,
        method: &str,
        args: Vec<Value>,
    ) -> Result<T, QueryError> {
        self.simulate(contract, method, args, None).await.decode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RestorePreamble, SimulateCost, SimulateHostFunctionResult};

    fn client(threshold: u64) -> SimulationClient {
        struct Unused;
        #[async_trait::async_trait]
        impl RpcTransport for Unused {
            async fn simulate_transaction(&self, _: &str) -> crate::Result<SimulateTransactionResponse> {
                unreachable!()
            }
            async fn send_transaction(&self, _: &str) -> crate::Result<crate::types::SendTransactionResponse> {
                unreachable!()
            }
            async fn get_transaction(&self, _: &str) -> crate::Result<crate::types::GetTransactionResponse> {
                unreachable!()
            }
            async fn get_latest_ledger(&self) -> crate::Result<crate::types::GetLatestLedgerResponse> {
                unreachable!()
            }
            async fn get_ledger_entries(&self, _: &[String]) -> crate::Result<crate::types::GetLedgerEntriesResponse> {
                unreachable!()
            }
        }

        SimulationClient::new(
            Arc::new(Unused),
            NetworkProfile::local(),
            RpcConfig {
                fee_warning_threshold: threshold,
                ..RpcConfig::default()
            },
        )
    }

    fn ok_response(fee: u64) -> SimulateTransactionResponse {
        SimulateTransactionResponse {
            latest_ledger: 1234,
            results: Some(vec![SimulateHostFunctionResult {
                xdr: Value::i128(500).to_xdr_base64(),
                auth: vec!["AAAAAQ==".into()],
            }]),
            transaction_data: Some("AAAAAA==".into()),
            min_resource_fee: Some(fee),
            cost: Some(SimulateCost {
                cpu_insns: Some(10),
                mem_bytes: Some(20),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_success_carries_value_and_resources() {
        let result = client(1_000_000).interpret(ok_response(500));
        assert!(result.success());
        assert!(result.errors().is_empty());
        assert!(result.warnings().is_empty());
        assert_eq!(result.decode::<i128>().unwrap(), 500);
        assert_eq!(result.latest_ledger(), Some(1234));
        assert_eq!(
            result.resources(),
            Some(&ResourceEstimate {
                min_resource_fee: 500,
                cpu_instructions: 10,
                memory_bytes: 20
            })
        );
        assert_eq!(result.auth(), &[vec![0u8, 0, 0, 1]]);
        assert_eq!(result.transaction_data(), Some(&[0u8, 0, 0, 0][..]));
    }

    #[test]
    fn test_fee_above_threshold_warns() {
        let result = client(100).interpret(ok_response(101));
        assert!(result.success());
        assert_eq!(result.warnings().len(), 1);
        assert!(result.warnings()[0].contains("101 stroops"));

        assert!(client(101).interpret(ok_response(101)).warnings().is_empty());
    }

    #[test]
    fn test_restore_preamble_warns() {
        let mut response = ok_response(1);
        response.restore_preamble = Some(RestorePreamble::default());
        let result = client(1_000).interpret(response);
        assert!(result.success());
        assert_eq!(result.warnings(), &[RESTORE_REQUIRED.to_string()]);
    }

    #[test]
    fn test_missing_result_is_failure() {
        let response = SimulateTransactionResponse {
            latest_ledger: 5,
            results: Some(vec![]),
            ..Default::default()
        };
        let result = client(1_000).interpret(response);
        assert!(!result.success());
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].message, SIMULATION_INCOMPLETE);
        assert!(result.return_value().is_none());

        let result = client(1_000).interpret(SimulateTransactionResponse::default());
        assert!(!result.success());
    }

    #[test]
    fn test_garbage_result_is_failure() {
        let response = SimulateTransactionResponse {
            results: Some(vec![SimulateHostFunctionResult {
                xdr: "!!!".into(),
                auth: vec![],
            }]),
            ..Default::default()
        };
        let result = client(1_000).interpret(response);
        assert!(!result.success());
        assert!(result.errors()[0].message.starts_with(SIMULATION_INCOMPLETE));
    }

    #[test]
    fn test_error_text_is_classified() {
        let response = SimulateTransactionResponse {
            error: Some("HostError: Error(Contract, #1) insufficient allowance".into()),
            ..Default::default()
        };
        let result = client(1_000).interpret(response);
        assert!(!result.success());
        assert_eq!(result.errors()[0].kind, ErrorKind::InsufficientAllowance);
        assert!(matches!(
            result.decode::<i128>(),
            Err(QueryError::Simulation(e)) if e.kind == ErrorKind::InsufficientAllowance
        ));
    }

    #[test]
    fn test_transport_errors() {
        let timeout = RpcError::Transport {
            message: "operation timed out".into(),
            timeout: true,
        };
        assert_eq!(classify_rpc_error(&timeout).kind, ErrorKind::NetworkTimeout);

        let unavailable = RpcError::Http {
            status: 503,
            body: "unavailable".into(),
        };
        assert_eq!(classify_rpc_error(&unavailable).kind, ErrorKind::NetworkTimeout);

        let bad = RpcError::JsonRpc {
            code: -32602,
            message: "invalid params".into(),
        };
        assert_eq!(classify_rpc_error(&bad).kind, ErrorKind::Unknown);
    }
}
