//! Exact conversion between raw token amounts and decimal display strings
//!
//! No floating point anywhere. Conversion works on the decimal digits of
//! the raw integer, so any precision the protocol allows is exact, not only
//! the ones where `10^decimals` fits a machine word.

use std::fmt;

use serde::Serialize;

use crate::error::AmountError;

/// Largest decimal precision the protocol can declare
pub const MAX_DECIMALS: u32 = 255;

/// Reject precisions no token can declare. Decimals read from a contract
/// pass through here before anything is formatted with them.
pub fn check_decimals(decimals: u32) -> Result<u32, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::UnsupportedDecimals(decimals));
    }
    Ok(decimals)
}

/// Render `raw` as a decimal string with `decimals` fractional digits.
///
/// Trailing fractional zeros are stripped and the point is dropped when
/// nothing remains after it, so `(10_000_000_000, 7)` renders as `"1000"`
/// and `(0, 7)` as `"0"`.
///
/// `decimals` is trusted here; precision from outside goes through
/// [`check_decimals`] or [`TokenAmount`] first.
pub fn to_display(raw: u128, decimals: u32) -> String {
    let digits = raw.to_string();
    if decimals == 0 {
        return digits;
    }

    let decimals = decimals as usize;
    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };

    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}

/// Parse a user-entered decimal string into a raw amount.
///
/// The fractional part may have at most `decimals` digits; more is a
/// `PrecisionError` rather than a silent truncation. Either side of the
/// point may be empty (`".5"`, `"1."`) but not both. Negative input is
/// rejected.
pub fn parse_to_raw(display: &str, decimals: u32) -> Result<u128, AmountError> {
    check_decimals(decimals)?;

    let input = display.trim();
    if input.starts_with('-') {
        return Err(AmountError::Negative(input.to_string()));
    }

    let (whole, fraction) = input.split_once('.').unwrap_or((input, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(AmountError::InvalidFormat(input.to_string()));
    }

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) {
        return Err(AmountError::InvalidFormat(input.to_string()));
    }

    if fraction.len() > decimals as usize {
        return Err(AmountError::PrecisionError {
            input: input.to_string(),
            decimals,
        });
    }

    // whole * 10^decimals + fraction, written as one digit string
    let combined = format!("{}{:0<width$}", whole, fraction, width = decimals as usize);
    let combined = combined.trim_start_matches('0');
    if combined.is_empty() {
        return Ok(0);
    }
    combined
        .parse::<u128>()
        .map_err(|_| AmountError::Overflow(input.to_string()))
}

/// Parse an amount for use as an on-chain `i128` argument
pub fn parse_to_i128(display: &str, decimals: u32) -> Result<i128, AmountError> {
    let raw = parse_to_raw(display, decimals)?;
    i128::try_from(raw).map_err(|_| AmountError::Overflow(display.trim().to_string()))
}

/// A raw amount together with its token's precision.
///
/// Every constructor checks `decimals`, so displaying one never has to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TokenAmount {
    raw: u128,
    decimals: u32,
}

impl TokenAmount {
    pub fn new(raw: u128, decimals: u32) -> Result<Self, AmountError> {
        Ok(Self {
            raw,
            decimals: check_decimals(decimals)?,
        })
    }

    /// From an on-chain `i128`; negative amounts are rejected, not clamped
    pub fn from_i128(raw: i128, decimals: u32) -> Result<Self, AmountError> {
        let unsigned = u128::try_from(raw).map_err(|_| AmountError::Negative(raw.to_string()))?;
        Self::new(unsigned, decimals)
    }

    pub fn parse(display: &str, decimals: u32) -> Result<Self, AmountError> {
        Ok(Self {
            raw: parse_to_raw(display, decimals)?,
            decimals,
        })
    }

    pub fn raw(&self) -> u128 {
        self.raw
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn to_i128(&self) -> Result<i128, AmountError> {
        i128::try_from(self.raw).map_err(|_| AmountError::Overflow(self.raw.to_string()))
    }

    pub fn is_zero(&self) -> bool {
        self.raw == 0
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_display(self.raw, self.decimals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_renders_as_zero() {
        assert_eq!(to_display(0, 7), "0");
        assert_eq!(to_display(0, 0), "0");
    }

    #[test]
    fn test_whole_amount_drops_point() {
        assert_eq!(to_display(10_000_000_000, 7), "1000");
    }

    #[test]
    fn test_fraction_trimmed() {
        assert_eq!(to_display(12_345_000, 7), "1.2345");
        assert_eq!(to_display(5, 7), "0.0000005");
        assert_eq!(to_display(1, 18), "0.000000000000000001");
    }

    #[test]
    fn test_max_u128() {
        assert_eq!(
            to_display(u128::MAX, 18),
            "340282366920938463463.374607431768211455"
        );
        assert_eq!(
            parse_to_raw("340282366920938463463.374607431768211455", 18).unwrap(),
            u128::MAX
        );
    }

    #[test]
    fn test_parse_pads_fraction() {
        assert_eq!(parse_to_raw("1.5", 7).unwrap(), 15_000_000);
        assert_eq!(parse_to_raw("1000", 7).unwrap(), 10_000_000_000);
        assert_eq!(parse_to_raw("0.0000001", 7).unwrap(), 1);
        assert_eq!(parse_to_raw(".25", 2).unwrap(), 25);
        assert_eq!(parse_to_raw("1.", 7).unwrap(), 10_000_000);
        assert_eq!(parse_to_raw("1.", 0).unwrap(), 1);
        assert_eq!(parse_to_raw(" 42 ", 0).unwrap(), 42);
    }

    #[test]
    fn test_parse_excess_precision() {
        assert_eq!(
            parse_to_raw("1.12345678", 7),
            Err(AmountError::PrecisionError {
                input: "1.12345678".into(),
                decimals: 7
            })
        );
        assert!(matches!(
            parse_to_raw("1.5", 0),
            Err(AmountError::PrecisionError { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", ".", " . ", "abc", "1.2.3", "1e5", "+1", "1,000", " "] {
            assert!(
                matches!(parse_to_raw(bad, 7), Err(AmountError::InvalidFormat(_))),
                "expected InvalidFormat for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_parse_rejects_negative() {
        assert_eq!(
            parse_to_raw("-1", 7),
            Err(AmountError::Negative("-1".into()))
        );
        assert!(TokenAmount::from_i128(-5, 7).is_err());
    }

    #[test]
    fn test_parse_overflow() {
        assert!(matches!(
            parse_to_raw("340282366920938463463.374607431768211456", 18),
            Err(AmountError::Overflow(_))
        ));
        // fits u128 but not the on-chain i128
        assert!(matches!(
            parse_to_i128("340282366920938463463", 18),
            Err(AmountError::Overflow(_))
        ));
    }

    #[test]
    fn test_wide_precision_is_exact() {
        assert_eq!(to_display(1, 60), format!("0.{}1", "0".repeat(59)));
        assert_eq!(parse_to_raw(&format!("0.{}1", "0".repeat(59)), 60).unwrap(), 1);
        assert!(matches!(parse_to_raw("1", 256), Err(AmountError::UnsupportedDecimals(256))));
    }

    #[test]
    fn test_token_amount_display() {
        let amt = TokenAmount::parse("50.25", 7).unwrap();
        assert_eq!(amt.raw(), 502_500_000);
        assert_eq!(amt.decimals(), 7);
        assert_eq!(amt.to_string(), "50.25");
        assert_eq!(amt.to_i128().unwrap(), 502_500_000);
    }

    #[test]
    fn test_token_amount_rejects_unsupported_decimals() {
        assert_eq!(
            TokenAmount::new(1, MAX_DECIMALS + 1),
            Err(AmountError::UnsupportedDecimals(256))
        );
        assert_eq!(
            TokenAmount::from_i128(1, u32::MAX),
            Err(AmountError::UnsupportedDecimals(u32::MAX))
        );
        assert_eq!(TokenAmount::new(1, MAX_DECIMALS).unwrap().decimals(), 255);
        assert_eq!(check_decimals(7), Ok(7));
    }

    proptest! {
        #[test]
        fn prop_display_then_parse_is_identity(raw in any::<u128>(), decimals in 0u32..=18) {
            prop_assert_eq!(parse_to_raw(&to_display(raw, decimals), decimals).unwrap(), raw);
        }

        #[test]
        fn prop_display_has_no_trailing_fraction_zeros(raw in any::<u64>(), decimals in 1u32..=18) {
            let s = to_display(raw as u128, decimals);
            if s.contains('.') {
                prop_assert!(!s.ends_with('0'));
            }
        }
    }
}
