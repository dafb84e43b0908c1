//! Classification of free-form remote error text
//!
//! The node reports failures as prose (diagnostic events, panic messages,
//! transport errors). [`classify`] maps that text onto a closed taxonomy by
//! ordered, case-insensitive substring matching against [`RULES`]. It never
//! fails: text no rule recognizes comes back as [`ErrorKind::Unknown`] with
//! the raw text kept for display.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Every failure category the UI knows how to explain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InsufficientBalance,
    InsufficientAllowance,
    AllowanceOverflow,
    SupplyCapExceeded,
    AccountFrozen,
    NotInitialized,
    AlreadyInitialized,
    Unauthorized,
    VestingNotFound,
    VestingRevoked,
    VestingNothingToRelease,
    InvalidScheduleRange,
    NetworkTimeout,
    Unknown,
}

impl ErrorKind {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientBalance => "INSUFFICIENT_BALANCE",
            Self::InsufficientAllowance => "INSUFFICIENT_ALLOWANCE",
            Self::AllowanceOverflow => "ALLOWANCE_OVERFLOW",
            Self::SupplyCapExceeded => "SUPPLY_CAP_EXCEEDED",
            Self::AccountFrozen => "ACCOUNT_FROZEN",
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::VestingNotFound => "VESTING_NOT_FOUND",
            Self::VestingRevoked => "VESTING_REVOKED",
            Self::VestingNothingToRelease => "VESTING_NOTHING_TO_RELEASE",
            Self::InvalidScheduleRange => "INVALID_SCHEDULE_RANGE",
            Self::NetworkTimeout => "NETWORK_TIMEOUT",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Only transport trouble is worth retrying unchanged
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::NetworkTimeout)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.error_code())
    }
}

/// One row of the classification table
#[derive(Debug)]
pub struct Rule {
    pub kind: ErrorKind,
    /// Lowercase substrings, any of which selects this rule
    pub patterns: &'static [&'static str],
    pub message: &'static str,
}

/// Checked top to bottom; the first rule with a matching pattern wins.
///
/// Allowance rules sit above the balance rule so "insufficient allowance"
/// is never read as a balance problem. Each pattern is covered by a test
/// asserting it reaches its own rule.
pub static RULES: &[Rule] = &[
    Rule {
        kind: ErrorKind::InsufficientAllowance,
        patterns: &["insufficient allowance", "allowance is insufficient", "allowance exceeded"],
        message: "Insufficient allowance: the spender is not approved for this amount.",
    },
    Rule {
        kind: ErrorKind::AllowanceOverflow,
        patterns: &["allowance overflow", "allowance would overflow"],
        message: "Allowance overflow: the approved amount would exceed the maximum.",
    },
    Rule {
        kind: ErrorKind::InsufficientBalance,
        patterns: &["insufficient balance", "balance is not sufficient", "balance too low"],
        message: "Insufficient token balance for this operation.",
    },
    Rule {
        kind: ErrorKind::SupplyCapExceeded,
        patterns: &["max_supply", "max supply", "supply cap", "exceeds cap"],
        message: "This would exceed the token's maximum supply.",
    },
    Rule {
        kind: ErrorKind::AccountFrozen,
        patterns: &["account is frozen", "account frozen"],
        message: "The account is frozen and cannot move tokens.",
    },
    Rule {
        kind: ErrorKind::AlreadyInitialized,
        patterns: &["already initialized", "already initialised"],
        message: "The contract has already been initialized.",
    },
    Rule {
        kind: ErrorKind::NotInitialized,
        patterns: &["not initialized", "not initialised", "uninitialized"],
        message: "The contract has not been initialized yet.",
    },
    Rule {
        kind: ErrorKind::Unauthorized,
        patterns: &["unauthorized", "not authorized", "require_auth", "error(auth"],
        message: "Unauthorized: the signer is not allowed to perform this action.",
    },
    Rule {
        kind: ErrorKind::VestingRevoked,
        patterns: &["schedule revoked", "schedule is revoked", "already revoked"],
        message: "This vesting schedule has been revoked.",
    },
    Rule {
        kind: ErrorKind::VestingNothingToRelease,
        patterns: &["nothing to release", "no tokens to release", "nothing vested"],
        message: "Nothing to release: no newly vested tokens are available yet.",
    },
    Rule {
        kind: ErrorKind::VestingNotFound,
        patterns: &["schedule not found", "no vesting schedule", "vesting not found", "no schedule"],
        message: "No vesting schedule exists for this recipient.",
    },
    Rule {
        kind: ErrorKind::InvalidScheduleRange,
        patterns: &["invalid schedule", "cliff_ledger", "cliff ledger", "end_ledger"],
        message: "Invalid vesting schedule: the cliff must not be after the end ledger.",
    },
    Rule {
        kind: ErrorKind::NetworkTimeout,
        patterns: &["timed out", "timeout", "connection refused", "connection reset", "network error"],
        message: "The network did not respond in time. Please try again.",
    },
];

/// Shown for text no rule recognizes; the raw text follows it
pub const UNKNOWN_MESSAGE: &str = "An unrecognized error occurred.";

/// A classified remote failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    /// Human-readable explanation; for `Unknown` it carries the raw text
    /// as a labelled fallback
    pub message: String,
    /// The text exactly as the remote produced it
    pub raw: String,
}

impl ClassifiedError {
    /// Build an error of a known kind without going through the table
    pub fn new(kind: ErrorKind, message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// An error of `kind` carrying that kind's table message
    pub fn of_kind(kind: ErrorKind, raw: impl Into<String>) -> Self {
        let message = RULES
            .iter()
            .find(|rule| rule.kind == kind)
            .map(|rule| rule.message)
            .unwrap_or(UNKNOWN_MESSAGE);
        Self::new(kind, message, raw)
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Classify raw remote error text. Total: always returns a value.
pub fn classify(raw: &str) -> ClassifiedError {
    let haystack = raw.to_lowercase();
    let matched = RULES
        .iter()
        .find(|rule| rule.patterns.iter().any(|p| haystack.contains(p)));

    match matched {
        Some(rule) => ClassifiedError::new(rule.kind, rule.message, raw),
        None => ClassifiedError::new(
            ErrorKind::Unknown,
            format!("{} Raw error: {}", UNKNOWN_MESSAGE, raw),
            raw,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_balance() {
        let err = classify("insufficient balance for transfer");
        assert_eq!(err.kind, ErrorKind::InsufficientBalance);
        assert!(err.message.contains("Insufficient token balance"));
    }

    #[test]
    fn test_supply_cap() {
        assert_eq!(
            classify("mint would exceed max_supply").kind,
            ErrorKind::SupplyCapExceeded
        );
    }

    #[test]
    fn test_unknown_keeps_raw_text() {
        let err = classify("totally unrecognized xyz");
        assert_eq!(err.kind, ErrorKind::Unknown);
        assert!(err.message.contains("totally unrecognized xyz"));
        assert!(err.message.starts_with(UNKNOWN_MESSAGE));
        assert_eq!(err.raw, "totally unrecognized xyz");
    }

    #[test]
    fn test_allowance_not_shadowed_by_balance() {
        assert_eq!(
            classify("Error: insufficient allowance (insufficient balance check skipped)").kind,
            ErrorKind::InsufficientAllowance
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("ACCOUNT IS FROZEN").kind, ErrorKind::AccountFrozen);
        assert_eq!(
            classify("HostError: Error(Auth, InvalidAction)").kind,
            ErrorKind::Unauthorized
        );
    }

    #[test]
    fn test_bare_words_do_not_classify() {
        for raw in [
            "account unfrozen",
            "trustline not frozen",
            "signer not revoked",
            "key revoked by issuer",
        ] {
            assert_eq!(classify(raw).kind, ErrorKind::Unknown, "{}", raw);
        }
        assert_eq!(classify("account frozen by admin").kind, ErrorKind::AccountFrozen);
        assert_eq!(classify("schedule is revoked").kind, ErrorKind::VestingRevoked);
    }

    #[test]
    fn test_initialized_pair() {
        assert_eq!(classify("contract already initialized").kind, ErrorKind::AlreadyInitialized);
        assert_eq!(classify("contract not initialized").kind, ErrorKind::NotInitialized);
    }

    #[test]
    fn test_vesting_kinds() {
        assert_eq!(classify("vesting schedule revoked").kind, ErrorKind::VestingRevoked);
        assert_eq!(classify("nothing to release").kind, ErrorKind::VestingNothingToRelease);
        assert_eq!(classify("schedule not found for recipient").kind, ErrorKind::VestingNotFound);
        assert_eq!(
            classify("cliff_ledger must be <= end_ledger").kind,
            ErrorKind::InvalidScheduleRange
        );
    }

    #[test]
    fn test_of_kind_uses_table_message() {
        let err = ClassifiedError::of_kind(ErrorKind::NetworkTimeout, "operation timed out");
        assert_eq!(err.message, "The network did not respond in time. Please try again.");
        assert_eq!(err.raw, "operation timed out");
        assert_eq!(
            ClassifiedError::of_kind(ErrorKind::Unknown, "x").message,
            UNKNOWN_MESSAGE
        );
    }

    #[test]
    fn test_empty_input_is_unknown() {
        assert_eq!(classify("").kind, ErrorKind::Unknown);
    }

    /// Every pattern must reach its own rule. A pattern that an earlier rule
    /// also matches would be shadowed and fail here.
    #[test]
    fn test_no_pattern_is_shadowed() {
        for rule in RULES {
            for pattern in rule.patterns {
                assert_eq!(
                    classify(pattern).kind,
                    rule.kind,
                    "pattern {:?} of {:?} is shadowed",
                    pattern,
                    rule.kind
                );
                assert_eq!(
                    classify(&format!("HostError: {} (contract call)", pattern)).kind,
                    rule.kind
                );
            }
        }
    }

    #[test]
    fn test_patterns_are_lowercase() {
        for rule in RULES {
            for pattern in rule.patterns {
                assert_eq!(*pattern, pattern.to_lowercase());
            }
        }
    }

    #[test]
    fn test_every_kind_but_unknown_has_a_rule() {
        let kinds = [
            ErrorKind::InsufficientBalance,
            ErrorKind::InsufficientAllowance,
            ErrorKind::AllowanceOverflow,
            ErrorKind::SupplyCapExceeded,
            ErrorKind::AccountFrozen,
            ErrorKind::NotInitialized,
            ErrorKind::AlreadyInitialized,
            ErrorKind::Unauthorized,
            ErrorKind::VestingNotFound,
            ErrorKind::VestingRevoked,
            ErrorKind::VestingNothingToRelease,
            ErrorKind::InvalidScheduleRange,
            ErrorKind::NetworkTimeout,
        ];
        for kind in kinds {
            assert!(RULES.iter().any(|r| r.kind == kind), "{:?} has no rule", kind);
        }
    }
}
