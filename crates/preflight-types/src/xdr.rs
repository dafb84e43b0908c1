//! XDR wire encoding for [`Value`]
//!
//! XDR is big-endian with every item padded to a 4-byte boundary. Vec and
//! Map bodies are optional on the wire and carry a presence flag.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::XdrError;
use crate::strkey::{AccountId, ContractId, ScAddress};
use crate::value::Value;

const SCV_BOOL: u32 = 0;
const SCV_VOID: u32 = 1;
const SCV_U32: u32 = 3;
const SCV_U64: u32 = 5;
const SCV_I128: u32 = 10;
const SCV_BYTES: u32 = 13;
const SCV_STRING: u32 = 14;
const SCV_SYMBOL: u32 = 15;
const SCV_VEC: u32 = 16;
const SCV_MAP: u32 = 17;
const SCV_ADDRESS: u32 = 18;

const SC_ADDRESS_ACCOUNT: u32 = 0;
const SC_ADDRESS_CONTRACT: u32 = 1;
const PUBLIC_KEY_ED25519: u32 = 0;

/// Nesting limit for vec/map values read off the wire
const MAX_DEPTH: usize = 64;

/// Append-only XDR encoder
#[derive(Debug, Default)]
pub struct XdrWriter {
    buf: Vec<u8>,
}

impl XdrWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn bool(&mut self, v: bool) {
        self.u32(v as u32);
    }

    /// Fixed-length opaque data (no length prefix)
    pub fn fixed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        self.pad(bytes.len());
    }

    /// Variable-length opaque data or string
    pub fn var(&mut self, bytes: &[u8]) {
        self.u32(bytes.len() as u32);
        self.fixed(bytes);
    }

    /// Splice already-encoded XDR verbatim
    pub fn raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn pad(&mut self, len: usize) {
        let rem = len % 4;
        if rem != 0 {
            self.buf.extend(std::iter::repeat(0u8).take(4 - rem));
        }
    }

    pub fn account_id(&mut self, id: &AccountId) {
        self.u32(PUBLIC_KEY_ED25519);
        self.fixed(id.as_bytes());
    }

    pub fn sc_address(&mut self, addr: &ScAddress) {
        match addr {
            ScAddress::Account(id) => {
                self.u32(SC_ADDRESS_ACCOUNT);
                self.account_id(id);
            }
            ScAddress::Contract(id) => {
                self.u32(SC_ADDRESS_CONTRACT);
                self.fixed(id.as_bytes());
            }
        }
    }

    pub fn value(&mut self, value: &Value) {
        match value {
            Value::Bool(b) => {
                self.u32(SCV_BOOL);
                self.bool(*b);
            }
            Value::Void => self.u32(SCV_VOID),
            Value::U32(n) => {
                self.u32(SCV_U32);
                self.u32(*n);
            }
            Value::U64(n) => {
                self.u32(SCV_U64);
                self.u64(*n);
            }
            Value::I128 { hi, lo } => {
                self.u32(SCV_I128);
                self.i64(*hi);
                self.u64(*lo);
            }
            Value::Bytes(b) => {
                self.u32(SCV_BYTES);
                self.var(b);
            }
            Value::Str(s) => {
                self.u32(SCV_STRING);
                self.var(s.as_bytes());
            }
            Value::Symbol(s) => {
                self.u32(SCV_SYMBOL);
                self.var(s.as_bytes());
            }
            Value::Vec(items) => {
                self.u32(SCV_VEC);
                self.bool(true);
                self.u32(items.len() as u32);
                for item in items {
                    self.value(item);
                }
            }
            Value::Map(entries) => {
                self.u32(SCV_MAP);
                self.bool(true);
                self.u32(entries.len() as u32);
                for (k, v) in entries {
                    self.value(k);
                    self.value(v);
                }
            }
            Value::Address(addr) => {
                self.u32(SCV_ADDRESS);
                self.sc_address(addr);
            }
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over XDR input
#[derive(Debug)]
pub struct XdrReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> XdrReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], XdrError> {
        if self.remaining() < n {
            return Err(XdrError::UnexpectedEof(self.pos));
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], XdrError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u32(&mut self) -> Result<u32, XdrError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    pub fn i32(&mut self) -> Result<i32, XdrError> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    pub fn u64(&mut self) -> Result<u64, XdrError> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    pub fn i64(&mut self) -> Result<i64, XdrError> {
        Ok(i64::from_be_bytes(self.array()?))
    }

    pub fn bool(&mut self) -> Result<bool, XdrError> {
        match self.u32()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(XdrError::Invalid("bool")),
        }
    }

    pub fn fixed(&mut self, len: usize) -> Result<&'a [u8], XdrError> {
        let out = self.take(len)?;
        let rem = len % 4;
        if rem != 0 {
            let padding = self.take(4 - rem)?;
            if padding.iter().any(|b| *b != 0) {
                return Err(XdrError::Invalid("padding"));
            }
        }
        Ok(out)
    }

    pub fn var(&mut self) -> Result<&'a [u8], XdrError> {
        let len = self.u32()? as usize;
        if len > self.remaining() {
            return Err(XdrError::UnexpectedEof(self.pos));
        }
        self.fixed(len)
    }

    fn string(&mut self) -> Result<String, XdrError> {
        let bytes = self.var()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| XdrError::Utf8)
    }

    fn key32(&mut self) -> Result<[u8; 32], XdrError> {
        self.array()
    }

    pub fn account_id(&mut self) -> Result<AccountId, XdrError> {
        match self.u32()? {
            PUBLIC_KEY_ED25519 => Ok(AccountId(self.key32()?)),
            tag => Err(XdrError::UnsupportedType {
                kind: "public key",
                tag: tag as i32,
            }),
        }
    }

    pub fn sc_address(&mut self) -> Result<ScAddress, XdrError> {
        match self.u32()? {
            SC_ADDRESS_ACCOUNT => Ok(ScAddress::Account(self.account_id()?)),
            SC_ADDRESS_CONTRACT => Ok(ScAddress::Contract(ContractId(self.key32()?))),
            tag => Err(XdrError::UnsupportedType {
                kind: "address",
                tag: tag as i32,
            }),
        }
    }

    pub fn value(&mut self) -> Result<Value, XdrError> {
        self.value_at_depth(0)
    }

    fn value_at_depth(&mut self, depth: usize) -> Result<Value, XdrError> {
        if depth > MAX_DEPTH {
            return Err(XdrError::Invalid("nesting depth"));
        }
        let value = match self.u32()? {
            SCV_BOOL => Value::Bool(self.bool()?),
            SCV_VOID => Value::Void,
            SCV_U32 => Value::U32(self.u32()?),
            SCV_U64 => Value::U64(self.u64()?),
            SCV_I128 => Value::I128 {
                hi: self.i64()?,
                lo: self.u64()?,
            },
            SCV_BYTES => Value::Bytes(self.var()?.to_vec()),
            SCV_STRING => Value::Str(self.string()?),
            SCV_SYMBOL => Value::Symbol(self.string()?),
            SCV_VEC => {
                if !self.bool()? {
                    return Err(XdrError::Invalid("absent vec body"));
                }
                let len = self.u32()? as usize;
                let mut items = Vec::with_capacity(len.min(self.remaining() / 4));
                for _ in 0..len {
                    items.push(self.value_at_depth(depth + 1)?);
                }
                Value::Vec(items)
            }
            SCV_MAP => {
                if !self.bool()? {
                    return Err(XdrError::Invalid("absent map body"));
                }
                let len = self.u32()? as usize;
                let mut entries = Vec::with_capacity(len.min(self.remaining() / 8));
                for _ in 0..len {
                    let k = self.value_at_depth(depth + 1)?;
                    let v = self.value_at_depth(depth + 1)?;
                    entries.push((k, v));
                }
                Value::Map(entries)
            }
            SCV_ADDRESS => Value::Address(self.sc_address()?),
            tag => {
                return Err(XdrError::UnsupportedType {
                    kind: "value",
                    tag: tag as i32,
                })
            }
        };
        Ok(value)
    }

    /// Fail unless every input byte has been consumed
    pub fn finish(self) -> Result<(), XdrError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(XdrError::TrailingBytes(n)),
        }
    }
}

impl Value {
    pub fn to_xdr(&self) -> Vec<u8> {
        let mut w = XdrWriter::new();
        w.value(self);
        w.into_bytes()
    }

    pub fn from_xdr(bytes: &[u8]) -> Result<Self, XdrError> {
        let mut r = XdrReader::new(bytes);
        let value = r.value()?;
        r.finish()?;
        Ok(value)
    }

    pub fn to_xdr_base64(&self) -> String {
        STANDARD.encode(self.to_xdr())
    }

    pub fn from_xdr_base64(s: &str) -> Result<Self, XdrError> {
        Self::from_xdr(&from_base64(s)?)
    }
}

pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn from_base64(s: &str) -> Result<Vec<u8>, XdrError> {
    Ok(STANDARD.decode(s.trim())?)
}
