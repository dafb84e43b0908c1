//! Conversion between [`Value`] and native Rust types
//!
//! Decoding is driven by the type the caller asks for: a value whose tag
//! does not match is a `TypeMismatch`, never a default. Encoding takes a
//! [`TypeHint`] naming the target variant and fails with `Overflow` when an
//! integer does not fit it.

use crate::error::{DecodeError, EncodeError};
use crate::strkey::{AccountId, ContractId, ScAddress};
use crate::value::{i128_from_parts, Value};

/// Decode a native value out of a [`Value`]
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, DecodeError>;
}

/// Decode `value` as `T`
pub fn decode<T: FromValue>(value: &Value) -> Result<T, DecodeError> {
    T::from_value(value)
}

/// Look up `name` in a symbol-keyed map and decode it as `T`
pub fn field<T: FromValue>(map: &Value, name: &str) -> Result<T, DecodeError> {
    T::from_value(map.field(name)?)
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        Ok(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(DecodeError::mismatch("bool", other.type_name())),
        }
    }
}

impl FromValue for u32 {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::U32(n) => Ok(*n),
            other => Err(DecodeError::mismatch("u32", other.type_name())),
        }
    }
}

impl FromValue for u64 {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::U64(n) => Ok(*n),
            other => Err(DecodeError::mismatch("u64", other.type_name())),
        }
    }
}

impl FromValue for i128 {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::I128 { hi, lo } => Ok(i128_from_parts(*hi, *lo)),
            other => Err(DecodeError::mismatch("i128", other.type_name())),
        }
    }
}

/// Strings and symbols both decode to `String`
impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::Str(s) | Value::Symbol(s) => Ok(s.clone()),
            other => Err(DecodeError::mismatch("string", other.type_name())),
        }
    }
}

impl FromValue for ScAddress {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::Address(addr) => Ok(*addr),
            other => Err(DecodeError::mismatch("address", other.type_name())),
        }
    }
}

impl FromValue for AccountId {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        match ScAddress::from_value(value)? {
            ScAddress::Account(id) => Ok(id),
            ScAddress::Contract(_) => Err(DecodeError::mismatch("account address", "contract address")),
        }
    }
}

impl FromValue for ContractId {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        match ScAddress::from_value(value)? {
            ScAddress::Contract(id) => Ok(id),
            ScAddress::Account(_) => Err(DecodeError::mismatch("contract address", "account address")),
        }
    }
}

impl FromValue for () {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::Void => Ok(()),
            other => Err(DecodeError::mismatch("void", other.type_name())),
        }
    }
}

/// `Void` decodes to `None`; anything else must decode as `T`
impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::Void => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::Vec(items) => items.iter().map(T::from_value).collect(),
            other => Err(DecodeError::mismatch("vec", other.type_name())),
        }
    }
}

/// The target variant for [`encode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeHint {
    Bool,
    U32,
    U64,
    I128,
    Str,
    Symbol,
    Address,
}

impl TypeHint {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I128 => "i128",
            Self::Str => "string",
            Self::Symbol => "symbol",
            Self::Address => "address",
        }
    }
}

/// An untyped native input, typically straight from a form field or flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Native {
    Bool(bool),
    /// A signed integer up to 128 bits
    Int(i128),
    /// A raw token amount; amounts are unsigned and may use all 128 bits
    Amount(u128),
    Text(String),
}

impl Native {
    fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Amount(_) => "amount",
            Self::Text(_) => "text",
        }
    }
}

fn overflow(value: impl ToString, target: TypeHint) -> EncodeError {
    EncodeError::Overflow {
        value: value.to_string(),
        target: target.name(),
    }
}

/// Encode `native` as the variant named by `hint`
pub fn encode(native: &Native, hint: TypeHint) -> Result<Value, EncodeError> {
    match (native, hint) {
        (Native::Bool(b), TypeHint::Bool) => Ok(Value::Bool(*b)),

        (Native::Int(n), TypeHint::U32) => u32::try_from(*n)
            .map(Value::U32)
            .map_err(|_| overflow(n, hint)),
        (Native::Amount(n), TypeHint::U32) => u32::try_from(*n)
            .map(Value::U32)
            .map_err(|_| overflow(n, hint)),

        (Native::Int(n), TypeHint::U64) => u64::try_from(*n)
            .map(Value::U64)
            .map_err(|_| overflow(n, hint)),
        (Native::Amount(n), TypeHint::U64) => u64::try_from(*n)
            .map(Value::U64)
            .map_err(|_| overflow(n, hint)),

        (Native::Int(n), TypeHint::I128) => Ok(Value::i128(*n)),
        (Native::Amount(n), TypeHint::I128) => i128::try_from(*n)
            .map(Value::i128)
            .map_err(|_| overflow(n, hint)),

        (Native::Text(s), TypeHint::Str) => Ok(Value::Str(s.clone())),
        (Native::Text(s), TypeHint::Symbol) => encode_symbol(s),
        (Native::Text(s), TypeHint::Address) => Ok(Value::Address(s.parse()?)),

        (native, hint) => Err(EncodeError::Incompatible {
            native: native.kind(),
            target: hint.name(),
        }),
    }
}

/// Symbols are at most 32 characters from `[a-zA-Z0-9_]`
pub const MAX_SYMBOL_LEN: usize = 32;

fn encode_symbol(s: &str) -> Result<Value, EncodeError> {
    let valid = s.len() <= MAX_SYMBOL_LEN
        && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if valid {
        Ok(Value::Symbol(s.to_string()))
    } else {
        Err(EncodeError::Incompatible {
            native: "text with non-symbol characters",
            target: "symbol",
        })
    }
}
