use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use preflight_contracts::{InputError, TokenClient, TokenMetadata, VestingClient};
use preflight_rpc::simulation::SIMULATION_INCOMPLETE;
use preflight_rpc::{
    GetLatestLedgerResponse, GetLedgerEntriesResponse, GetTransactionResponse, NetworkProfile,
    QueryError, RpcConfig, RpcError, RpcTransport, SendTransactionResponse,
    SimulateHostFunctionResult, SimulateTransactionResponse, SimulationClient,
};
use preflight_types::xdr::{from_base64, XdrReader};
use preflight_types::{
    AccountId, AmountError, ContractId, ErrorKind, ScAddress, Value, VestingError,
};

/// Answers simulations by contract method name and records the arguments
#[derive(Default)]
struct ContractNode {
    answers: HashMap<&'static str, SimulateTransactionResponse>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl ContractNode {
    fn answer(mut self, method: &'static str, response: SimulateTransactionResponse) -> Self {
        self.answers.insert(method, response);
        self
    }

    fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }
}

/// Pull the method name and arguments back out of an envelope
fn invocation_of(envelope: &str) -> (String, Vec<Value>) {
    let bytes = from_base64(envelope).unwrap();
    let mut r = XdrReader::new(&bytes);
    r.u32().unwrap(); // envelope type
    r.u32().unwrap(); // source key type
    r.fixed(32).unwrap();
    r.u32().unwrap(); // fee
    r.i64().unwrap(); // sequence
    if r.u32().unwrap() == 1 {
        r.u64().unwrap();
        r.u64().unwrap();
    }
    r.u32().unwrap(); // memo
    assert_eq!(r.u32().unwrap(), 1);
    assert!(!r.bool().unwrap());
    r.u32().unwrap(); // operation type
    r.u32().unwrap(); // host function type
    r.sc_address().unwrap();
    let method = String::from_utf8(r.var().unwrap().to_vec()).unwrap();
    let count = r.u32().unwrap();
    let args = (0..count).map(|_| r.value().unwrap()).collect();
    (method, args)
}

#[async_trait]
impl RpcTransport for ContractNode {
    async fn simulate_transaction(&self, envelope: &str) -> Result<SimulateTransactionResponse, RpcError> {
        let (method, args) = invocation_of(envelope);
        let answer = self.answers.get(method.as_str()).cloned();
        self.calls.lock().unwrap().push((method.clone(), args));
        answer.ok_or_else(|| RpcError::InvalidResponse(format!("no answer for {}", method)))
    }

    async fn send_transaction(&self, _: &str) -> Result<SendTransactionResponse, RpcError> {
        unreachable!("helpers never submit")
    }

    async fn get_transaction(&self, _: &str) -> Result<GetTransactionResponse, RpcError> {
        unreachable!("helpers never poll")
    }

    async fn get_latest_ledger(&self) -> Result<GetLatestLedgerResponse, RpcError> {
        unreachable!("ledger comes from the simulation")
    }

    async fn get_ledger_entries(&self, _: &[String]) -> Result<GetLedgerEntriesResponse, RpcError> {
        unreachable!()
    }
}

fn returns(value: Value) -> SimulateTransactionResponse {
    SimulateTransactionResponse {
        latest_ledger: 600,
        results: Some(vec![SimulateHostFunctionResult {
            xdr: value.to_xdr_base64(),
            auth: vec![],
        }]),
        transaction_data: Some("AAAAAA==".into()),
        min_resource_fee: Some(1_000),
        ..Default::default()
    }
}

fn fails(text: &str) -> SimulateTransactionResponse {
    SimulateTransactionResponse {
        latest_ledger: 600,
        error: Some(text.to_string()),
        ..Default::default()
    }
}

fn sim(node: Arc<ContractNode>) -> SimulationClient {
    SimulationClient::new(node, NetworkProfile::local(), RpcConfig::default())
}

fn alice() -> AccountId {
    AccountId([1u8; 32])
}

fn bob() -> ScAddress {
    AccountId([2u8; 32]).into()
}

fn token_id() -> ContractId {
    ContractId([0x70; 32])
}

fn schedule_value(total: i128, cliff: u32, end: u32, released: i128, revoked: bool) -> Value {
    Value::Map(vec![
        (Value::symbol("cliff_ledger"), Value::U32(cliff)),
        (Value::symbol("end_ledger"), Value::U32(end)),
        (Value::symbol("recipient"), bob().into()),
        (Value::symbol("released"), Value::i128(released)),
        (Value::symbol("revoked"), Value::Bool(revoked)),
        (Value::symbol("total_amount"), Value::i128(total)),
    ])
}

#[tokio::test]
async fn test_token_reads() {
    let node = Arc::new(
        ContractNode::default()
            .answer("balance", returns(Value::I128 { hi: 0, lo: 15_000_000 }))
            .answer("decimals", returns(Value::U32(7)))
            .answer("name", returns(Value::Str("Preflight Dollar".into())))
            .answer("symbol", returns(Value::Str("PFD".into())))
            .answer("admin", returns(Value::Address(alice().into()))),
    );
    let token = TokenClient::new(sim(node.clone()), token_id());

    assert_eq!(token.balance(&bob()).await.unwrap(), 15_000_000);
    assert_eq!(token.admin().await.unwrap(), ScAddress::from(alice()));
    assert_eq!(
        token.metadata().await.unwrap(),
        TokenMetadata {
            name: "Preflight Dollar".into(),
            symbol: "PFD".into(),
            decimals: 7
        }
    );
    assert_eq!(token.balance_amount(&bob()).await.unwrap().to_string(), "1.5");

    let (method, args) = &node.calls()[0];
    assert_eq!(method, "balance");
    assert_eq!(args, &vec![Value::from(bob())]);
}

#[tokio::test]
async fn test_wrong_return_type_is_decode_error() {
    let node = Arc::new(ContractNode::default().answer("decimals", returns(Value::Str("7".into()))));
    let token = TokenClient::new(sim(node), token_id());
    assert!(matches!(token.decimals().await, Err(QueryError::Decode(_))));
}

#[tokio::test]
async fn test_out_of_range_decimals_rejected() {
    let node = Arc::new(
        ContractNode::default()
            .answer("balance", returns(Value::i128(15_000_000)))
            .answer("decimals", returns(Value::U32(u32::MAX)))
            .answer("name", returns(Value::Str("Broken".into())))
            .answer("symbol", returns(Value::Str("BRK".into()))),
    );
    let token = TokenClient::new(sim(node), token_id());
    let unsupported = QueryError::Amount(AmountError::UnsupportedDecimals(u32::MAX));

    assert_eq!(token.decimals().await, Err(unsupported.clone()));
    assert_eq!(token.balance_amount(&bob()).await, Err(unsupported.clone()));
    assert_eq!(token.metadata().await, Err(unsupported));
    // the raw balance needs no precision
    assert_eq!(token.balance(&bob()).await.unwrap(), 15_000_000);
}

#[tokio::test]
async fn test_bad_amount_never_reaches_node() {
    let node = Arc::new(ContractNode::default());
    let token = TokenClient::new(sim(node.clone()), token_id());

    let err = token
        .preflight_transfer(alice(), &bob(), "1.00000001", 7)
        .await
        .unwrap_err();
    assert!(matches!(err, InputError::Amount(AmountError::PrecisionError { .. })));

    let err = token.preflight_mint(alice(), &bob(), "abc", 7).await.unwrap_err();
    assert_eq!(err.error_code(), "INVALID_FORMAT");

    assert!(node.calls().is_empty());
}

#[tokio::test]
async fn test_transfer_preflight() {
    let node = Arc::new(ContractNode::default().answer("transfer", fails("Error: insufficient balance")));
    let token = TokenClient::new(sim(node.clone()), token_id());

    let result = token
        .preflight_transfer(alice(), &bob(), "1.5", 7)
        .await
        .unwrap();
    assert!(!result.success());
    assert_eq!(result.errors()[0].kind, ErrorKind::InsufficientBalance);

    let (_, args) = &node.calls()[0];
    assert_eq!(
        args,
        &vec![
            Value::from(ScAddress::from(alice())),
            Value::from(bob()),
            Value::i128(15_000_000)
        ]
    );
}

#[tokio::test]
async fn test_approve_passes_expiration() {
    let node = Arc::new(ContractNode::default().answer("approve", returns(Value::Void)));
    let token = TokenClient::new(sim(node.clone()), token_id());

    let result = token
        .preflight_approve(alice(), &bob(), "10", 2, 5_000)
        .await
        .unwrap();
    assert!(result.success());
    assert_eq!(node.calls()[0].1[2], Value::i128(1_000));
    assert_eq!(node.calls()[0].1[3], Value::U32(5_000));
}

#[tokio::test]
async fn test_expired_allowance_is_zero() {
    let node = Arc::new(ContractNode::default().answer("allowance", returns(Value::i128(700))));
    let token = TokenClient::new(sim(node), token_id());
    let owner = ScAddress::from(alice());

    assert_eq!(token.allowance(&owner, &bob()).await.unwrap(), 700);
    // simulation ran at ledger 600
    assert_eq!(token.usable_allowance(&owner, &bob(), 601).await.unwrap(), 700);
    assert_eq!(token.usable_allowance(&owner, &bob(), 600).await.unwrap(), 0);
    assert_eq!(token.usable_allowance(&owner, &bob(), 10).await.unwrap(), 0);
}

#[tokio::test]
async fn test_usable_allowance_needs_a_ledger() {
    let mut unledgered = returns(Value::i128(700));
    unledgered.latest_ledger = 0;
    let node = Arc::new(ContractNode::default().answer("allowance", unledgered));
    let token = TokenClient::new(sim(node), token_id());
    let owner = ScAddress::from(alice());

    // the stored amount still decodes; only the expiry check needs the ledger
    assert_eq!(token.allowance(&owner, &bob()).await.unwrap(), 700);
    match token.usable_allowance(&owner, &bob(), u32::MAX).await {
        Err(QueryError::Simulation(err)) => {
            assert_eq!(err.kind, ErrorKind::Unknown);
            assert_eq!(err.message, SIMULATION_INCOMPLETE);
        }
        other => panic!("expected a simulation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_vesting_schedule_and_progress() {
    let node = Arc::new(
        ContractNode::default()
            .answer("get_schedule", returns(schedule_value(1000, 100, 1100, 200, false)))
            .answer("vested_amount", returns(Value::i128(500)))
            .answer("released_amount", returns(Value::i128(200))),
    );
    let vesting = VestingClient::new(sim(node), ContractId([0x71; 32]));

    let schedule = vesting.get_schedule(&bob()).await.unwrap();
    assert_eq!(schedule.total_amount(), 1000);
    assert_eq!(schedule.cliff_ledger(), 100);
    assert_eq!(schedule.recipient(), &bob());

    assert_eq!(vesting.vested_amount(&bob()).await.unwrap(), 500);
    assert_eq!(vesting.released_amount(&bob()).await.unwrap(), 200);

    let progress = vesting.progress(&bob()).await.unwrap();
    assert_eq!(progress.ledger, 600);
    assert_eq!(progress.vested, 500);
    assert_eq!(progress.releasable, 300);
    assert_eq!(progress.unvested, 500);
    assert_eq!(progress.vested_bps, 5_000);
}

#[tokio::test]
async fn test_revoked_schedule_progress_is_frozen() {
    let node = Arc::new(
        ContractNode::default()
            .answer("get_schedule", returns(schedule_value(1000, 100, 1100, 400, true))),
    );
    let vesting = VestingClient::new(sim(node), ContractId([0x71; 32]));

    let progress = vesting.progress(&bob()).await.unwrap();
    assert!(progress.revoked);
    assert_eq!(progress.vested, 400);
    assert_eq!(progress.releasable, 0);
}

#[tokio::test]
async fn test_missing_schedule_is_classified() {
    let node = Arc::new(
        ContractNode::default()
            .answer("get_schedule", fails("HostError: no vesting schedule for recipient"))
            .answer("revoke", fails("schedule already revoked")),
    );
    let vesting = VestingClient::new(sim(node), ContractId([0x71; 32]));

    match vesting.get_schedule(&bob()).await {
        Err(QueryError::Simulation(err)) => assert_eq!(err.kind, ErrorKind::VestingNotFound),
        other => panic!("unexpected {:?}", other),
    }

    let result = vesting.preflight_revoke(alice(), &bob()).await;
    assert_eq!(result.errors()[0].kind, ErrorKind::VestingRevoked);
}

#[tokio::test]
async fn test_create_schedule_validates_locally() {
    let node = Arc::new(ContractNode::default().answer("create_schedule", returns(Value::Void)));
    let vesting = VestingClient::new(sim(node.clone()), ContractId([0x71; 32]));

    let err = vesting
        .preflight_create_schedule(alice(), &bob(), "100", 7, 2_000, 1_000)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        InputError::Schedule(VestingError::InvalidScheduleRange {
            cliff: 2_000,
            end: 1_000
        })
    );
    assert!(node.calls().is_empty());

    let result = vesting
        .preflight_create_schedule(alice(), &bob(), "100", 7, 1_000, 2_000)
        .await
        .unwrap();
    assert!(result.success());
    assert_eq!(
        node.calls()[0].1,
        vec![
            Value::from(bob()),
            Value::i128(1_000_000_000),
            Value::U32(1_000),
            Value::U32(2_000)
        ]
    );

    let release = vesting.preflight_release(alice(), &bob()).await;
    assert!(!release.success());
}
