//! Error types for the pure codec layer
//!
//! Every error here means the caller built or received something malformed.
//! Nothing in this crate defaults silently on bad input.

use thiserror::Error;

/// Decoding a [`Value`](crate::Value) into a native type failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The value carried a different tag than the caller expected
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// A map lookup by symbol key found nothing
    #[error("Missing field: {0}")]
    MissingField(String),

    /// The value was well-tagged but its content is out of domain
    #[error("Invalid {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl DecodeError {
    pub fn mismatch(expected: &'static str, actual: &'static str) -> Self {
        Self::TypeMismatch { expected, actual }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::Invalid { .. } => "INVALID_VALUE",
        }
    }
}

/// Encoding a native value into a [`Value`](crate::Value) failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The integer does not fit the target width
    #[error("Overflow: {value} does not fit in {target}")]
    Overflow { value: String, target: &'static str },

    /// The native kind cannot be expressed as the requested type
    #[error("Cannot encode {native} as {target}")]
    Incompatible {
        native: &'static str,
        target: &'static str,
    },

    /// An address string failed strkey validation
    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] StrkeyError),
}

impl EncodeError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Overflow { .. } => "OVERFLOW",
            Self::Incompatible { .. } => "INCOMPATIBLE_TYPE",
            Self::InvalidAddress(_) => "INVALID_ADDRESS",
        }
    }
}

/// Strkey (G.../C... address) parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrkeyError {
    #[error("not valid base32")]
    InvalidEncoding,

    #[error("unexpected length {0}")]
    InvalidLength(usize),

    #[error("unknown version byte {0:#04x}")]
    UnknownVersion(u8),

    #[error("checksum mismatch")]
    ChecksumMismatch,
}

/// Binary wire format failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XdrError {
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEof(usize),

    #[error("unsupported {kind} discriminant {tag}")]
    UnsupportedType { kind: &'static str, tag: i32 },

    #[error("invalid {0}")]
    Invalid(&'static str),

    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),

    #[error("invalid base64: {0}")]
    Base64(String),

    #[error("invalid utf-8 in string")]
    Utf8,
}

impl From<base64::DecodeError> for XdrError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Base64(err.to_string())
    }
}

/// User-input validation failures for amount strings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// More fractional digits than the token supports
    #[error("Too many decimal places in '{input}' (max {decimals})")]
    PrecisionError { input: String, decimals: u32 },

    #[error("Invalid amount '{0}'")]
    InvalidFormat(String),

    #[error("Negative amounts are not allowed: '{0}'")]
    Negative(String),

    #[error("Amount '{0}' exceeds 128 bits")]
    Overflow(String),

    #[error("Unsupported decimals {0} (max {})", crate::amount::MAX_DECIMALS)]
    UnsupportedDecimals(u32),
}

impl AmountError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PrecisionError { .. } => "PRECISION_ERROR",
            Self::InvalidFormat(_) => "INVALID_AMOUNT",
            Self::Negative(_) => "NEGATIVE_AMOUNT",
            Self::Overflow(_) => "AMOUNT_OVERFLOW",
            Self::UnsupportedDecimals(_) => "UNSUPPORTED_DECIMALS",
        }
    }
}
