//! Account and contract addresses in their canonical strkey form
//!
//! A strkey is `base32(version || payload || crc16_le(version || payload))`
//! without padding. Accounts start with `G`, contracts with `C`.

use std::fmt;
use std::str::FromStr;

use base32::Alphabet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::StrkeyError;

const VERSION_ACCOUNT: u8 = 6 << 3;
const VERSION_CONTRACT: u8 = 2 << 3;

const PAYLOAD_LEN: usize = 32;
const RAW_LEN: usize = 1 + PAYLOAD_LEN + 2;
const ENCODED_LEN: usize = 56;

const ALPHABET: Alphabet = Alphabet::RFC4648 { padding: false };

/// CRC16-XModem (poly 0x1021, init 0)
fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for byte in data {
        crc ^= (*byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

fn encode(version: u8, payload: &[u8; PAYLOAD_LEN]) -> String {
    let mut raw = Vec::with_capacity(RAW_LEN);
    raw.push(version);
    raw.extend_from_slice(payload);
    let checksum = crc16(&raw);
    raw.extend_from_slice(&checksum.to_le_bytes());
    base32::encode(ALPHABET, &raw)
}

fn decode(s: &str) -> Result<(u8, [u8; PAYLOAD_LEN]), StrkeyError> {
    if s.len() != ENCODED_LEN {
        return Err(StrkeyError::InvalidLength(s.len()));
    }
    if s.bytes().any(|b| b.is_ascii_lowercase()) {
        return Err(StrkeyError::InvalidEncoding);
    }
    let raw = base32::decode(ALPHABET, s).ok_or(StrkeyError::InvalidEncoding)?;
    if raw.len() != RAW_LEN {
        return Err(StrkeyError::InvalidLength(raw.len()));
    }

    let (body, checksum) = raw.split_at(1 + PAYLOAD_LEN);
    let expected = u16::from_le_bytes([checksum[0], checksum[1]]);
    if crc16(body) != expected {
        return Err(StrkeyError::ChecksumMismatch);
    }

    let mut payload = [0u8; PAYLOAD_LEN];
    payload.copy_from_slice(&body[1..]);
    Ok((body[0], payload))
}

/// An ed25519 account (`G...`)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(pub [u8; 32]);

/// A deployed contract (`C...`)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContractId(pub [u8; 32]);

impl AccountId {
    /// The all-zero account, used as the source of simulation-only envelopes
    pub const PLACEHOLDER: Self = AccountId([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl ContractId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(VERSION_ACCOUNT, &self.0))
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(VERSION_CONTRACT, &self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self)
    }
}

impl fmt::Debug for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContractId({})", self)
    }
}

impl FromStr for AccountId {
    type Err = StrkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match decode(s)? {
            (VERSION_ACCOUNT, payload) => Ok(AccountId(payload)),
            (version, _) => Err(StrkeyError::UnknownVersion(version)),
        }
    }
}

impl FromStr for ContractId {
    type Err = StrkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match decode(s)? {
            (VERSION_CONTRACT, payload) => Ok(ContractId(payload)),
            (version, _) => Err(StrkeyError::UnknownVersion(version)),
        }
    }
}

/// Either kind of address a contract can receive or return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScAddress {
    Account(AccountId),
    Contract(ContractId),
}

impl ScAddress {
    pub fn is_contract(&self) -> bool {
        matches!(self, Self::Contract(_))
    }
}

impl From<AccountId> for ScAddress {
    fn from(id: AccountId) -> Self {
        Self::Account(id)
    }
}

impl From<ContractId> for ScAddress {
    fn from(id: ContractId) -> Self {
        Self::Contract(id)
    }
}

impl fmt::Display for ScAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account(id) => id.fmt(f),
            Self::Contract(id) => id.fmt(f),
        }
    }
}

impl FromStr for ScAddress {
    type Err = StrkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match decode(s)? {
            (VERSION_ACCOUNT, payload) => Ok(Self::Account(AccountId(payload))),
            (VERSION_CONTRACT, payload) => Ok(Self::Contract(ContractId(payload))),
            (version, _) => Err(StrkeyError::UnknownVersion(version)),
        }
    }
}

impl Serialize for ScAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ScAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known keys from the public network documentation
    const ACCOUNT: &str = "GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ";
    const CONTRACT: &str = "CA3D5KRYM6CB7OWQ6TWYRR3Z4T7GNZLKERYNZGGA5SOAOPIFY6YQGAXE";

    #[test]
    fn test_crc16_xmodem_vector() {
        assert_eq!(crc16(b"123456789"), 0x31C3);
    }

    #[test]
    fn test_account_roundtrip() {
        let id: AccountId = ACCOUNT.parse().unwrap();
        assert_eq!(id.to_string(), ACCOUNT);
    }

    #[test]
    fn test_contract_roundtrip() {
        let id: ContractId = CONTRACT.parse().unwrap();
        assert_eq!(id.to_string(), CONTRACT);
    }

    #[test]
    fn test_sc_address_dispatches_on_version() {
        assert!(matches!(ACCOUNT.parse::<ScAddress>(), Ok(ScAddress::Account(_))));
        assert!(matches!(CONTRACT.parse::<ScAddress>(), Ok(ScAddress::Contract(_))));
    }

    #[test]
    fn test_wrong_kind_rejected() {
        assert_eq!(
            CONTRACT.parse::<AccountId>(),
            Err(StrkeyError::UnknownVersion(VERSION_CONTRACT))
        );
    }

    #[test]
    fn test_checksum_detects_typo() {
        let mut broken = ACCOUNT.to_string();
        broken.replace_range(10..11, if &ACCOUNT[10..11] == "A" { "B" } else { "A" });
        assert!(broken.parse::<AccountId>().is_err());
    }

    #[test]
    fn test_length_and_case_checked() {
        assert_eq!("GABC".parse::<AccountId>(), Err(StrkeyError::InvalidLength(4)));
        assert!(ACCOUNT.to_lowercase().parse::<AccountId>().is_err());
    }

    #[test]
    fn test_placeholder_is_valid_strkey() {
        let s = AccountId::PLACEHOLDER.to_string();
        assert!(s.starts_with('G'));
        assert_eq!(s.parse::<AccountId>().unwrap(), AccountId::PLACEHOLDER);
    }
}
