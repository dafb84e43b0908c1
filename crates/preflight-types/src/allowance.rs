//! Spender allowances bounded by an expiration ledger

use serde::{Deserialize, Serialize};

use crate::strkey::ScAddress;

/// An amount `spender` may move on `owner`'s behalf until `expiration_ledger`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceGrant {
    pub owner: ScAddress,
    pub spender: ScAddress,
    pub amount: i128,
    pub expiration_ledger: u32,
}

impl AllowanceGrant {
    pub fn new(owner: ScAddress, spender: ScAddress, amount: i128, expiration_ledger: u32) -> Self {
        Self {
            owner,
            spender,
            amount,
            expiration_ledger,
        }
    }

    pub fn is_expired(&self, current_ledger: u32) -> bool {
        current_ledger >= self.expiration_ledger
    }

    /// What the spender can actually use at `current_ledger`.
    ///
    /// Checked locally: a stored amount past its expiration is worth
    /// nothing even if the node still reports it. Negative stored amounts
    /// read as zero.
    pub fn effective_amount(&self, current_ledger: u32) -> i128 {
        if self.is_expired(current_ledger) {
            0
        } else {
            self.amount.max(0)
        }
    }

    pub fn covers(&self, amount: i128, current_ledger: u32) -> bool {
        amount <= self.effective_amount(current_ledger)
    }
}
