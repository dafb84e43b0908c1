//! Cliff + linear vesting math over ledger heights
//!
//! Nothing vests before the cliff, everything has vested at the end ledger,
//! and in between the vested share grows linearly:
//!
//! ```text
//! vested = floor(total * (ledger - cliff) / (end - cliff))
//! ```
//!
//! # Revocation
//!
//! Revoking a schedule pays the vested portion to the recipient and returns
//! the remainder to the admin, so after revocation nothing further vests.
//! When the schedule records the ledger it was revoked at, vesting is
//! evaluated at that ledger. When it does not, the amount already released
//! is the frozen vested amount.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{field, FromValue};
use crate::error::DecodeError;
use crate::strkey::ScAddress;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VestingError {
    #[error("cliff ledger {cliff} is after end ledger {end}")]
    InvalidScheduleRange { cliff: u32, end: u32 },

    #[error("total amount {0} is negative")]
    NegativeTotal(i128),

    #[error("released amount {released} is outside 0..={total}")]
    ReleasedOutOfRange { released: i128, total: i128 },
}

/// A recipient's vesting schedule as read from the contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VestingSchedule {
    recipient: ScAddress,
    total_amount: i128,
    cliff_ledger: u32,
    end_ledger: u32,
    released: i128,
    revoked: bool,
    revoked_at_ledger: Option<u32>,
}

impl VestingSchedule {
    pub fn new(
        recipient: ScAddress,
        total_amount: i128,
        cliff_ledger: u32,
        end_ledger: u32,
    ) -> Result<Self, VestingError> {
        Self {
            recipient,
            total_amount,
            cliff_ledger,
            end_ledger,
            released: 0,
            revoked: false,
            revoked_at_ledger: None,
        }
        .validated()
    }

    pub fn with_released(mut self, released: i128) -> Result<Self, VestingError> {
        self.released = released;
        self.validated()
    }

    /// Mark as revoked; `at_ledger` is the freeze point when known
    pub fn revoke(mut self, at_ledger: Option<u32>) -> Self {
        self.revoked = true;
        self.revoked_at_ledger = at_ledger;
        self
    }

    fn validated(self) -> Result<Self, VestingError> {
        if self.cliff_ledger > self.end_ledger {
            return Err(VestingError::InvalidScheduleRange {
                cliff: self.cliff_ledger,
                end: self.end_ledger,
            });
        }
        if self.total_amount < 0 {
            return Err(VestingError::NegativeTotal(self.total_amount));
        }
        if self.released < 0 || self.released > self.total_amount {
            return Err(VestingError::ReleasedOutOfRange {
                released: self.released,
                total: self.total_amount,
            });
        }
        Ok(self)
    }

    pub fn recipient(&self) -> &ScAddress {
        &self.recipient
    }

    pub fn total_amount(&self) -> i128 {
        self.total_amount
    }

    pub fn cliff_ledger(&self) -> u32 {
        self.cliff_ledger
    }

    pub fn end_ledger(&self) -> u32 {
        self.end_ledger
    }

    pub fn released(&self) -> i128 {
        self.released
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    pub fn revoked_at_ledger(&self) -> Option<u32> {
        self.revoked_at_ledger
    }
}

/// Decodes the contract's schedule struct, a symbol-keyed map.
/// `revoked_at_ledger` is optional; everything else is required.
impl FromValue for VestingSchedule {
    fn from_value(value: &Value) -> Result<Self, DecodeError> {
        let revoked_at_ledger = match value.field("revoked_at_ledger") {
            Ok(v) => Option::<u32>::from_value(v)?,
            Err(DecodeError::MissingField(_)) => None,
            Err(e) => return Err(e),
        };
        let schedule = Self {
            recipient: field(value, "recipient")?,
            total_amount: field(value, "total_amount")?,
            cliff_ledger: field(value, "cliff_ledger")?,
            end_ledger: field(value, "end_ledger")?,
            released: field(value, "released")?,
            revoked: field(value, "revoked")?,
            revoked_at_ledger,
        };
        schedule
            .validated()
            .map_err(|e| DecodeError::invalid("vesting schedule", e.to_string()))
    }
}

/// `floor(amount * num / den)` for `0 <= num < den`, exact for any
/// non-negative i128 `amount`.
///
/// With `amount = q * den + r` the product splits into `q * num`, which is
/// below `amount`, and `r * num / den`, where `r * num < 2^64`.
pub fn mul_div_floor(amount: i128, num: u32, den: u32) -> i128 {
    debug_assert!(amount >= 0 && num < den);
    let (amount, num, den) = (amount as u128, num as u128, den as u128);
    let q = amount / den;
    let r = amount % den;
    (q * num + (r * num) / den) as i128
}

/// Vested amount of `schedule` at `current_ledger`
pub fn vested_amount(schedule: &VestingSchedule, current_ledger: u32) -> i128 {
    if schedule.revoked {
        return match schedule.revoked_at_ledger {
            Some(at) => linear_vested(schedule, current_ledger.min(at)),
            None => schedule.released,
        };
    }
    linear_vested(schedule, current_ledger)
}

fn linear_vested(schedule: &VestingSchedule, ledger: u32) -> i128 {
    if ledger < schedule.cliff_ledger {
        return 0;
    }
    // also covers cliff == end: full vesting at the cliff
    if ledger >= schedule.end_ledger {
        return schedule.total_amount;
    }
    mul_div_floor(
        schedule.total_amount,
        ledger - schedule.cliff_ledger,
        schedule.end_ledger - schedule.cliff_ledger,
    )
}

/// What `release` would pay out now
pub fn releasable_amount(schedule: &VestingSchedule, current_ledger: u32) -> i128 {
    (vested_amount(schedule, current_ledger) - schedule.released).max(0)
}

/// A schedule evaluated at one ledger, for progress displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingProgress {
    pub ledger: u32,
    pub total: i128,
    pub vested: i128,
    pub released: i128,
    pub releasable: i128,
    pub unvested: i128,
    /// Vested share in basis points (0..=10000)
    pub vested_bps: u32,
    pub revoked: bool,
}

impl VestingProgress {
    pub fn at(schedule: &VestingSchedule, ledger: u32) -> Self {
        let vested = vested_amount(schedule, ledger);
        let total = schedule.total_amount;
        Self {
            ledger,
            total,
            vested,
            released: schedule.released,
            releasable: releasable_amount(schedule, ledger),
            unvested: total - vested,
            vested_bps: basis_points(vested, total),
            revoked: schedule.revoked,
        }
    }
}

/// `part / whole` in basis points, rounded down. A zero total counts as
/// fully vested. Totals too large for the product are scaled down first,
/// which only affects the display ratio.
fn basis_points(part: i128, whole: i128) -> u32 {
    if whole <= 0 {
        return 10_000;
    }
    let (mut part, mut whole) = (part.max(0) as u128, whole as u128);
    while part > u128::MAX / 10_000 {
        part >>= 1;
        whole >>= 1;
    }
    (part * 10_000 / whole).min(10_000) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strkey::AccountId;
    use proptest::prelude::*;

    fn recipient() -> ScAddress {
        ScAddress::Account(AccountId([1u8; 32]))
    }

    fn schedule(total: i128, cliff: u32, end: u32) -> VestingSchedule {
        VestingSchedule::new(recipient(), total, cliff, end).unwrap()
    }

    #[test]
    fn test_reference_schedule() {
        let s = schedule(1000, 100, 1100);
        assert_eq!(vested_amount(&s, 100), 0);
        assert_eq!(vested_amount(&s, 600), 500);
        assert_eq!(vested_amount(&s, 1100), 1000);
        assert_eq!(vested_amount(&s, 1200), 1000);
    }

    #[test]
    fn test_before_cliff() {
        let s = schedule(1000, 100, 1100);
        assert_eq!(vested_amount(&s, 0), 0);
        assert_eq!(vested_amount(&s, 99), 0);
    }

    #[test]
    fn test_floor_rounding() {
        let s = schedule(10, 0, 3);
        assert_eq!(vested_amount(&s, 1), 3);
        assert_eq!(vested_amount(&s, 2), 6);
    }

    #[test]
    fn test_cliff_equals_end_is_instant() {
        let s = schedule(777, 50, 50);
        assert_eq!(vested_amount(&s, 49), 0);
        assert_eq!(vested_amount(&s, 50), 777);
    }

    #[test]
    fn test_zero_total() {
        let s = schedule(0, 10, 20);
        assert_eq!(vested_amount(&s, 15), 0);
        assert_eq!(releasable_amount(&s, 30), 0);
        assert_eq!(VestingProgress::at(&s, 15).vested_bps, 10_000);
    }

    #[test]
    fn test_huge_total_does_not_overflow() {
        let s = schedule(i128::MAX, 0, u32::MAX);
        let half = vested_amount(&s, u32::MAX / 2);
        let expected = mul_div_floor(i128::MAX, u32::MAX / 2, u32::MAX);
        assert_eq!(half, expected);
        assert!(half > i128::MAX / 2 - i128::MAX / (u32::MAX as i128));
        assert!(half <= i128::MAX / 2);
    }

    #[test]
    fn test_releasable_subtracts_released() {
        let s = schedule(1000, 100, 1100).with_released(300).unwrap();
        assert_eq!(releasable_amount(&s, 600), 200);
        assert_eq!(releasable_amount(&s, 300), 0);
    }

    #[test]
    fn test_revoked_without_freeze_ledger() {
        let s = schedule(1000, 100, 1100)
            .with_released(400)
            .unwrap()
            .revoke(None);
        assert_eq!(vested_amount(&s, 1100), 400);
        assert_eq!(releasable_amount(&s, 1100), 0);
    }

    #[test]
    fn test_revoked_with_freeze_ledger() {
        let s = schedule(1000, 100, 1100).revoke(Some(600));
        assert_eq!(vested_amount(&s, 400), 300);
        assert_eq!(vested_amount(&s, 1100), 500);
    }

    #[test]
    fn test_invalid_schedules() {
        assert_eq!(
            VestingSchedule::new(recipient(), 1, 10, 5),
            Err(VestingError::InvalidScheduleRange { cliff: 10, end: 5 })
        );
        assert!(VestingSchedule::new(recipient(), -1, 0, 5).is_err());
        assert!(schedule(10, 0, 5).with_released(11).is_err());
    }

    #[test]
    fn test_progress_view() {
        let s = schedule(1000, 100, 1100).with_released(100).unwrap();
        let p = VestingProgress::at(&s, 600);
        assert_eq!(p.vested, 500);
        assert_eq!(p.releasable, 400);
        assert_eq!(p.unvested, 500);
        assert_eq!(p.vested_bps, 5_000);
        assert_eq!(VestingProgress::at(&s, 2000).vested_bps, 10_000);
    }

    #[test]
    fn test_decode_from_map() {
        let map = Value::Map(vec![
            (Value::symbol("recipient"), Value::Address(recipient())),
            (Value::symbol("total_amount"), Value::i128(1000)),
            (Value::symbol("cliff_ledger"), Value::U32(100)),
            (Value::symbol("end_ledger"), Value::U32(1100)),
            (Value::symbol("released"), Value::i128(0)),
            (Value::symbol("revoked"), Value::Bool(false)),
        ]);
        let s = VestingSchedule::from_value(&map).unwrap();
        assert_eq!(s.total_amount(), 1000);
        assert_eq!(s.revoked_at_ledger(), None);
    }

    #[test]
    fn test_decode_missing_field() {
        let map = Value::Map(vec![(Value::symbol("recipient"), Value::Address(recipient()))]);
        assert_eq!(
            VestingSchedule::from_value(&map),
            Err(DecodeError::MissingField("total_amount".into()))
        );
    }

    #[test]
    fn test_decode_rejects_bad_range() {
        let map = Value::Map(vec![
            (Value::symbol("recipient"), Value::Address(recipient())),
            (Value::symbol("total_amount"), Value::i128(1000)),
            (Value::symbol("cliff_ledger"), Value::U32(2000)),
            (Value::symbol("end_ledger"), Value::U32(1100)),
            (Value::symbol("released"), Value::i128(0)),
            (Value::symbol("revoked"), Value::Bool(false)),
        ]);
        assert!(matches!(
            VestingSchedule::from_value(&map),
            Err(DecodeError::Invalid { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_mul_div_matches_wide_reference(amount in 0i128..=(u64::MAX as i128), num in 0u32..1000, extra in 1u32..1000) {
            let den = num + extra;
            // amount * num fits u128 for amount < 2^64
            let reference = (amount as u128 * num as u128 / den as u128) as i128;
            prop_assert_eq!(mul_div_floor(amount, num, den), reference);
        }

        #[test]
        fn prop_vested_is_monotonic_and_bounded(total in 0i128..=i128::MAX, cliff in 0u32..10_000, len in 0u32..10_000, a in 0u32..30_000, b in 0u32..30_000) {
            let s = schedule(total, cliff, cliff + len);
            let (lo, hi) = (a.min(b), a.max(b));
            let (v_lo, v_hi) = (vested_amount(&s, lo), vested_amount(&s, hi));
            prop_assert!(v_lo <= v_hi);
            prop_assert!(v_hi <= total);
            prop_assert!(v_lo >= 0);
        }
    }
}
