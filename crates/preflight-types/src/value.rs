//! The tagged value model used for contract arguments and return values

use crate::error::DecodeError;
use crate::strkey::{AccountId, ContractId, ScAddress};

/// A contract value. Exactly one variant is active; consumers match
/// exhaustively so a new kind cannot slip through unhandled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Void,
    U32(u32),
    U64(u64),
    I128 { hi: i64, lo: u64 },
    Bytes(Vec<u8>),
    Str(String),
    Symbol(String),
    Vec(Vec<Value>),
    /// Ordered key/value entries, in the order the remote produced them
    Map(Vec<(Value, Value)>),
    Address(ScAddress),
}

/// Join the two 64-bit words of an i128 as `(hi << 64) | lo`
#[inline]
pub fn i128_from_parts(hi: i64, lo: u64) -> i128 {
    ((hi as i128) << 64) | (lo as i128)
}

/// Split an i128 into its high (signed) and low (unsigned) words
#[inline]
pub fn i128_to_parts(value: i128) -> (i64, u64) {
    ((value >> 64) as i64, value as u64)
}

impl Value {
    /// Name of the active variant, used in mismatch errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Void => "void",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::I128 { .. } => "i128",
            Self::Bytes(_) => "bytes",
            Self::Str(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Vec(_) => "vec",
            Self::Map(_) => "map",
            Self::Address(_) => "address",
        }
    }

    pub fn i128(value: i128) -> Self {
        let (hi, lo) = i128_to_parts(value);
        Self::I128 { hi, lo }
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Self::Symbol(name.into())
    }

    /// Look up a map entry by its symbol key.
    ///
    /// Fails with `TypeMismatch` if `self` is not a map and with
    /// `MissingField` if no entry has that key.
    pub fn field(&self, name: &str) -> Result<&Value, DecodeError> {
        let entries = match self {
            Self::Map(entries) => entries,
            other => return Err(DecodeError::mismatch("map", other.type_name())),
        };
        entries
            .iter()
            .find_map(|(key, value)| match key {
                Self::Symbol(k) if k == name => Some(value),
                _ => None,
            })
            .ok_or_else(|| DecodeError::MissingField(name.to_string()))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::U32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}

impl From<i128> for Value {
    fn from(v: i128) -> Self {
        Self::i128(v)
    }
}

impl From<ScAddress> for Value {
    fn from(v: ScAddress) -> Self {
        Self::Address(v)
    }
}

impl From<AccountId> for Value {
    fn from(v: AccountId) -> Self {
        Self::Address(v.into())
    }
}

impl From<ContractId> for Value {
    fn from(v: ContractId) -> Self {
        Self::Address(v.into())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}
