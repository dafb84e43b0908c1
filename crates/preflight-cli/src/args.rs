//! `TYPE:VALUE` contract arguments from the command line

use anyhow::{bail, Context};

use preflight_types::codec::{encode, Native, TypeHint};
use preflight_types::Value;

/// Parse one argument such as `u32:7`, `i128:-5`, `address:G...` or
/// `symbol:transfer`. Everything after the first `:` is the value.
pub fn parse_arg(input: &str) -> anyhow::Result<Value> {
    let (kind, raw) = input
        .split_once(':')
        .with_context(|| format!("argument '{}' must look like TYPE:VALUE", input))?;

    let (native, hint) = match kind {
        "bool" => (
            Native::Bool(raw.parse().with_context(|| format!("'{}' is not a bool", raw))?),
            TypeHint::Bool,
        ),
        "u32" => (Native::Int(integer(raw)?), TypeHint::U32),
        "u64" => (Native::Int(integer(raw)?), TypeHint::U64),
        "i128" => (Native::Int(integer(raw)?), TypeHint::I128),
        "string" | "str" => (Native::Text(raw.to_string()), TypeHint::Str),
        "symbol" | "sym" => (Native::Text(raw.to_string()), TypeHint::Symbol),
        "address" | "addr" => (Native::Text(raw.to_string()), TypeHint::Address),
        other => bail!(
            "unknown argument type '{}' (expected bool, u32, u64, i128, string, symbol or address)",
            other
        ),
    };

    encode(&native, hint).with_context(|| format!("cannot encode '{}'", input))
}

fn integer(raw: &str) -> anyhow::Result<i128> {
    raw.trim()
        .parse()
        .with_context(|| format!("'{}' is not an integer", raw))
}
