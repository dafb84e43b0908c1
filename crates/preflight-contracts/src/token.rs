//! Token contract (SEP-41 interface)
//!
//! Reads decode the return value into native types. Writes are only ever
//! simulated here; amount strings are parsed against the token's decimals
//! before anything reaches the node.

use preflight_rpc::simulation::SIMULATION_INCOMPLETE;
use preflight_rpc::{PreflightResult, QueryError, SimulationClient};
use preflight_types::codec::{encode, Native, TypeHint};
use preflight_types::{
    check_decimals, parse_to_raw, AccountId, AllowanceGrant, ClassifiedError, ContractId,
    ErrorKind, ScAddress, TokenAmount, Value,
};
use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Display metadata for a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

/// Encode a user-entered amount as an `i128` argument
pub fn amount_arg(display: &str, decimals: u32) -> Result<Value, InputError> {
    let raw = parse_to_raw(display, decimals)?;
    Ok(encode(&Native::Amount(raw), TypeHint::I128)?)
}

#[derive(Clone)]
pub struct TokenClient {
    sim: SimulationClient,
    contract: ContractId,
}

impl TokenClient {
    pub fn new(sim: SimulationClient, contract: ContractId) -> Self {
        Self { sim, contract }
    }

    pub fn contract(&self) -> &ContractId {
        &self.contract
    }

    pub async fn balance(&self, id: &ScAddress) -> Result<i128, QueryError> {
        self.sim
            .query(self.contract, "balance", vec![id.clone().into()])
            .await
    }

    /// The token's precision, rejected when it exceeds
    /// [`preflight_types::MAX_DECIMALS`]
    pub async fn decimals(&self) -> Result<u32, QueryError> {
        let decimals: u32 = self.sim.query(self.contract, "decimals", vec![]).await?;
        Ok(check_decimals(decimals)?)
    }

    pub async fn name(&self) -> Result<String, QueryError> {
        self.sim.query(self.contract, "name", vec![]).await
    }

    pub async fn symbol(&self) -> Result<String, QueryError> {
        self.sim.query(self.contract, "symbol", vec![]).await
    }

    pub async fn total_supply(&self) -> Result<i128, QueryError> {
        self.sim.query(self.contract, "total_supply", vec![]).await
    }

    pub async fn admin(&self) -> Result<ScAddress, QueryError> {
        self.sim.query(self.contract, "admin", vec![]).await
    }

    /// Name, symbol and decimals, fetched concurrently
    pub async fn metadata(&self) -> Result<TokenMetadata, QueryError> {
        let (name, symbol, decimals) =
            futures::try_join!(self.name(), self.symbol(), self.decimals())?;
        Ok(TokenMetadata {
            name,
            symbol,
            decimals,
        })
    }

    /// Balance together with the token's precision, ready to display
    pub async fn balance_amount(&self, id: &ScAddress) -> Result<TokenAmount, QueryError> {
        let (raw, decimals) = futures::try_join!(self.balance(id), self.decimals())?;
        Ok(TokenAmount::from_i128(raw, decimals)?)
    }

    /// The stored allowance, as the contract reports it
    pub async fn allowance(&self, from: &ScAddress, spender: &ScAddress) -> Result<i128, QueryError> {
        self.sim
            .query(
                self.contract,
                "allowance",
                vec![from.clone().into(), spender.clone().into()],
            )
            .await
    }

    /// What `spender` can actually move right now.
    ///
    /// The stored amount is checked against `expiration_ledger` at the
    /// ledger the simulation ran on, so an expired grant reads as zero even
    /// when the node still stores a positive amount.
    pub async fn usable_allowance(
        &self,
        from: &ScAddress,
        spender: &ScAddress,
        expiration_ledger: u32,
    ) -> Result<i128, QueryError> {
        let result = self
            .sim
            .simulate(
                self.contract,
                "allowance",
                vec![from.clone().into(), spender.clone().into()],
                None,
            )
            .await;
        let amount: i128 = result.decode()?;
        let grant = AllowanceGrant::new(from.clone(), spender.clone(), amount, expiration_ledger);

        let ledger = result.latest_ledger().ok_or_else(|| {
            QueryError::Simulation(ClassifiedError::new(
                ErrorKind::Unknown,
                SIMULATION_INCOMPLETE,
                "simulation did not report a ledger",
            ))
        })?;
        let usable = grant.effective_amount(ledger);
        if usable != amount {
            tracing::debug!(
                stored = amount,
                expiration_ledger,
                ledger,
                "Allowance expired or negative; treating as zero"
            );
        }
        Ok(usable)
    }

    pub async fn preflight_transfer(
        &self,
        from: AccountId,
        to: &ScAddress,
        amount: &str,
        decimals: u32,
    ) -> Result<PreflightResult, InputError> {
        let amount = amount_arg(amount, decimals)?;
        let args = vec![ScAddress::from(from).into(), to.clone().into(), amount];
        Ok(self.sim.simulate(self.contract, "transfer", args, Some(from)).await)
    }

    pub async fn preflight_mint(
        &self,
        admin: AccountId,
        to: &ScAddress,
        amount: &str,
        decimals: u32,
    ) -> Result<PreflightResult, InputError> {
        let amount = amount_arg(amount, decimals)?;
        let args = vec![to.clone().into(), amount];
        Ok(self.sim.simulate(self.contract, "mint", args, Some(admin)).await)
    }

    pub async fn preflight_burn(
        &self,
        from: AccountId,
        amount: &str,
        decimals: u32,
    ) -> Result<PreflightResult, InputError> {
        let amount = amount_arg(amount, decimals)?;
        let args = vec![ScAddress::from(from).into(), amount];
        Ok(self.sim.simulate(self.contract, "burn", args, Some(from)).await)
    }

    pub async fn preflight_approve(
        &self,
        from: AccountId,
        spender: &ScAddress,
        amount: &str,
        decimals: u32,
        expiration_ledger: u32,
    ) -> Result<PreflightResult, InputError> {
        let amount = amount_arg(amount, decimals)?;
        let args = vec![
            ScAddress::from(from).into(),
            spender.clone().into(),
            amount,
            Value::U32(expiration_ledger),
        ];
        Ok(self.sim.simulate(self.contract, "approve", args, Some(from)).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preflight_types::AmountError;

    #[test]
    fn test_amount_arg() {
        assert_eq!(amount_arg("1.5", 7).unwrap(), Value::i128(15_000_000));
        assert_eq!(
            amount_arg("1.12345678", 7),
            Err(InputError::Amount(AmountError::PrecisionError {
                input: "1.12345678".into(),
                decimals: 7
            }))
        );
        // fits u128 but not i128
        assert!(matches!(
            amount_arg("340282366920938463463", 18),
            Err(InputError::Encode(_))
        ));
        assert!(matches!(amount_arg("-1", 7), Err(InputError::Amount(AmountError::Negative(_)))));
    }
}
