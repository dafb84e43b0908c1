//! Invocation envelopes and transaction results on the wire
//!
//! Only the shape this layer produces is modelled: a v1 envelope holding a
//! single contract invocation. Soroban resource data and authorization
//! entries come back from simulation already encoded and are spliced in
//! verbatim.

use sha2::{Digest, Sha256};

use crate::error::XdrError;
use crate::strkey::{AccountId, ScAddress};
use crate::value::Value;
use crate::xdr::{to_base64, XdrReader, XdrWriter};

pub const ENVELOPE_TYPE_TX: u32 = 2;

const PRECOND_NONE: u32 = 0;
const PRECOND_TIME: u32 = 1;
const MEMO_NONE: u32 = 0;
const KEY_TYPE_ED25519: u32 = 0;
const OP_INVOKE_HOST_FUNCTION: u32 = 24;
const HOST_FUNCTION_INVOKE_CONTRACT: u32 = 0;
const LEDGER_ENTRY_ACCOUNT: u32 = 0;

/// Minimum inclusion fee per operation, in stroops
pub const BASE_FEE: u32 = 100;

/// Network identity: SHA-256 of the network passphrase
pub fn network_id(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}

/// A call to `method` on `contract` with positional `args`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub contract: ScAddress,
    pub method: String,
    pub args: Vec<Value>,
}

impl Invocation {
    pub fn new(contract: impl Into<ScAddress>, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            contract: contract.into(),
            method: method.into(),
            args,
        }
    }
}

/// Unix-seconds validity window; `max_time == 0` means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

/// An unsigned transaction carrying one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub source: AccountId,
    /// Total fee in stroops: inclusion fee plus resource fee once assembled
    pub fee: u32,
    pub sequence: i64,
    pub time_bounds: Option<TimeBounds>,
    pub invocation: Invocation,
    /// Encoded authorization entries, from simulation
    pub auth: Vec<Vec<u8>>,
    /// Encoded Soroban transaction data, from simulation
    pub soroban_data: Option<Vec<u8>>,
}

impl Transaction {
    fn write(&self, w: &mut XdrWriter) {
        // MuxedAccount
        w.u32(KEY_TYPE_ED25519);
        w.fixed(self.source.as_bytes());
        w.u32(self.fee);
        w.i64(self.sequence);

        match self.time_bounds {
            Some(tb) => {
                w.u32(PRECOND_TIME);
                w.u64(tb.min_time);
                w.u64(tb.max_time);
            }
            None => w.u32(PRECOND_NONE),
        }
        w.u32(MEMO_NONE);

        // operations<100>: exactly one, without its own source account
        w.u32(1);
        w.bool(false);
        w.u32(OP_INVOKE_HOST_FUNCTION);
        w.u32(HOST_FUNCTION_INVOKE_CONTRACT);
        w.sc_address(&self.invocation.contract);
        w.var(self.invocation.method.as_bytes());
        w.u32(self.invocation.args.len() as u32);
        for arg in &self.invocation.args {
            w.value(arg);
        }
        w.u32(self.auth.len() as u32);
        for entry in &self.auth {
            w.raw(entry);
        }

        match &self.soroban_data {
            Some(data) => {
                w.i32(1);
                w.raw(data);
            }
            None => w.i32(0),
        }
    }

    pub fn to_xdr(&self) -> Vec<u8> {
        let mut w = XdrWriter::new();
        self.write(&mut w);
        w.into_bytes()
    }

    /// The identifier the network assigns this transaction
    pub fn hash(&self, network_id: &[u8; 32]) -> [u8; 32] {
        let mut w = XdrWriter::new();
        w.fixed(network_id);
        w.u32(ENVELOPE_TYPE_TX);
        self.write(&mut w);
        Sha256::digest(w.into_bytes()).into()
    }

    pub fn hash_hex(&self, network_id: &[u8; 32]) -> String {
        hex::encode(self.hash(network_id))
    }

    /// Wrap in a v1 envelope with no signatures
    pub fn to_envelope_xdr(&self) -> Vec<u8> {
        let mut w = XdrWriter::new();
        w.u32(ENVELOPE_TYPE_TX);
        self.write(&mut w);
        w.u32(0);
        w.into_bytes()
    }

    pub fn to_envelope_base64(&self) -> String {
        to_base64(&self.to_envelope_xdr())
    }
}

/// Key for an account's ledger entry, as `getLedgerEntries` expects it
pub fn account_ledger_key(account: &AccountId) -> Vec<u8> {
    let mut w = XdrWriter::new();
    w.u32(LEDGER_ENTRY_ACCOUNT);
    w.account_id(account);
    w.into_bytes()
}

/// The leading fields of an account ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountEntry {
    pub account: AccountId,
    pub balance: i64,
    pub sequence: i64,
}

/// Read the account id, balance and sequence from encoded ledger entry data
pub fn parse_account_entry(bytes: &[u8]) -> Result<AccountEntry, XdrError> {
    let mut r = XdrReader::new(bytes);
    match r.u32()? {
        LEDGER_ENTRY_ACCOUNT => {}
        tag => {
            return Err(XdrError::UnsupportedType {
                kind: "ledger entry",
                tag: tag as i32,
            })
        }
    }
    Ok(AccountEntry {
        account: r.account_id()?,
        balance: r.i64()?,
        sequence: r.i64()?,
    })
}

fn tx_result_name(code: i32) -> (&'static str, &'static str) {
    match code {
        1 => ("txFEE_BUMP_INNER_SUCCESS", "fee bump succeeded"),
        0 => ("txSUCCESS", "all operations succeeded"),
        -1 => ("txFAILED", "an operation failed"),
        -2 => ("txTOO_EARLY", "submitted before its validity window opened"),
        -3 => ("txTOO_LATE", "validity window expired before inclusion"),
        -4 => ("txMISSING_OPERATION", "no operation was specified"),
        -5 => ("txBAD_SEQ", "sequence number does not match the source account"),
        -6 => ("txBAD_AUTH", "missing or invalid signatures, or wrong network"),
        -7 => ("txINSUFFICIENT_BALANCE", "fee would drop the source account below its reserve"),
        -8 => ("txNO_ACCOUNT", "source account does not exist"),
        -9 => ("txINSUFFICIENT_FEE", "fee is below the network minimum"),
        -10 => ("txBAD_AUTH_EXTRA", "unused signatures attached"),
        -11 => ("txINTERNAL_ERROR", "internal error on the node"),
        -12 => ("txNOT_SUPPORTED", "transaction type not supported"),
        -13 => ("txFEE_BUMP_INNER_FAILED", "inner transaction of a fee bump failed"),
        -14 => ("txBAD_SPONSORSHIP", "sponsorship not confirmed"),
        -15 => ("txBAD_MIN_SEQ_AGE_OR_GAP", "minimum sequence age or gap not met"),
        -16 => ("txMALFORMED", "transaction is malformed"),
        -17 => ("txSOROBAN_INVALID", "resource declarations do not match execution"),
        _ => ("txUNKNOWN", "unrecognized result code"),
    }
}

fn invoke_result_name(code: i32) -> &'static str {
    match code {
        0 => "invocation succeeded",
        -1 => "invocation malformed",
        -2 => "contract execution trapped",
        -3 => "resource limit exceeded",
        -4 => "contract state is archived",
        -5 => "refundable fee too low",
        _ => "unrecognized invocation result",
    }
}

fn op_result_name(code: i32) -> &'static str {
    match code {
        -1 => "operation has bad auth",
        -2 => "operation source account missing",
        -3 => "operation not supported",
        -4 => "too many subentries",
        -5 => "work limit exceeded",
        -6 => "too many sponsoring",
        _ => "unrecognized operation result",
    }
}

/// What a `TransactionResult` says, in words
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResultSummary {
    pub fee_charged: i64,
    pub code: i32,
    pub code_name: &'static str,
    pub description: &'static str,
    /// Detail from the first operation's result, when it could be read
    pub operation: Option<&'static str>,
}

impl TransactionResultSummary {
    pub fn is_success(&self) -> bool {
        self.code == 0 || self.code == 1
    }

    pub fn message(&self) -> String {
        match self.operation {
            Some(op) => format!("{} ({}): {}", self.code_name, self.description, op),
            None => format!("{} ({})", self.code_name, self.description),
        }
    }
}

/// Decode an encoded `TransactionResult` far enough to explain it
pub fn describe_transaction_result(bytes: &[u8]) -> Result<TransactionResultSummary, XdrError> {
    let mut r = XdrReader::new(bytes);
    let fee_charged = r.i64()?;
    let mut code = r.i32()?;

    // Unwrap a fee bump to the inner result
    if code == 1 || code == -13 {
        r.fixed(32)?;
        r.i64()?;
        code = r.i32()?;
    }

    let operation = if code == 0 || code == -1 {
        first_operation_detail(&mut r)?
    } else {
        None
    };

    let (code_name, description) = tx_result_name(code);
    Ok(TransactionResultSummary {
        fee_charged,
        code,
        code_name,
        description,
        operation,
    })
}

fn first_operation_detail(r: &mut XdrReader<'_>) -> Result<Option<&'static str>, XdrError> {
    if r.u32()? == 0 {
        return Ok(None);
    }
    let op_code = r.i32()?;
    if op_code != 0 {
        return Ok(Some(op_result_name(op_code)));
    }
    if r.u32()? != OP_INVOKE_HOST_FUNCTION {
        return Ok(None);
    }
    Ok(Some(invoke_result_name(r.i32()?)))
}
