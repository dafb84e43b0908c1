//! Vesting contract
//!
//! Schedules are read fresh on every call. [`VestingClient::progress`]
//! evaluates the schedule at the ledger the simulation ran on, so the
//! numbers shown match what `release` would see.

use preflight_rpc::simulation::SIMULATION_INCOMPLETE;
use preflight_rpc::{PreflightResult, QueryError, SimulationClient};
use preflight_types::{
    parse_to_i128, AccountId, ClassifiedError, ContractId, ErrorKind, ScAddress, Value, VestingProgress,
    VestingSchedule,
};

use crate::error::InputError;

#[derive(Clone)]
pub struct VestingClient {
    sim: SimulationClient,
    contract: ContractId,
}

impl VestingClient {
    pub fn new(sim: SimulationClient, contract: ContractId) -> Self {
        Self { sim, contract }
    }

    pub fn contract(&self) -> &ContractId {
        &self.contract
    }

    /// Vested amount as the contract computes it
    pub async fn vested_amount(&self, recipient: &ScAddress) -> Result<i128, QueryError> {
        self.sim
            .query(self.contract, "vested_amount", vec![recipient.clone().into()])
            .await
    }

    pub async fn released_amount(&self, recipient: &ScAddress) -> Result<i128, QueryError> {
        self.sim
            .query(self.contract, "released_amount", vec![recipient.clone().into()])
            .await
    }

    pub async fn get_schedule(&self, recipient: &ScAddress) -> Result<VestingSchedule, QueryError> {
        self.sim
            .query(self.contract, "get_schedule", vec![recipient.clone().into()])
            .await
    }

    /// The schedule evaluated locally at the current ledger
    pub async fn progress(&self, recipient: &ScAddress) -> Result<VestingProgress, QueryError> {
        let result = self
            .sim
            .simulate(
                self.contract,
                "get_schedule",
                vec![recipient.clone().into()],
                None,
            )
            .await;
        let schedule: VestingSchedule = result.decode()?;
        let ledger = result.latest_ledger().ok_or_else(|| {
            QueryError::Simulation(ClassifiedError::new(
                ErrorKind::Unknown,
                SIMULATION_INCOMPLETE,
                "simulation did not report a ledger",
            ))
        })?;

        let progress = VestingProgress::at(&schedule, ledger);
        tracing::debug!(
            recipient = %recipient,
            ledger,
            vested = %progress.vested,
            releasable = %progress.releasable,
            "Evaluated vesting progress"
        );
        Ok(progress)
    }

    pub async fn preflight_release(&self, caller: AccountId, recipient: &ScAddress) -> PreflightResult {
        self.sim
            .simulate(self.contract, "release", vec![recipient.clone().into()], Some(caller))
            .await
    }

    pub async fn preflight_revoke(&self, admin: AccountId, recipient: &ScAddress) -> PreflightResult {
        self.sim
            .simulate(self.contract, "revoke", vec![recipient.clone().into()], Some(admin))
            .await
    }

    /// Validates the amount and the cliff/end range locally first
    pub async fn preflight_create_schedule(
        &self,
        admin: AccountId,
        recipient: &ScAddress,
        total_amount: &str,
        decimals: u32,
        cliff_ledger: u32,
        end_ledger: u32,
    ) -> Result<PreflightResult, InputError> {
        let total = parse_to_i128(total_amount, decimals)?;
        VestingSchedule::new(recipient.clone(), total, cliff_ledger, end_ledger)?;

        let args = vec![
            recipient.clone().into(),
            Value::i128(total),
            Value::U32(cliff_ledger),
            Value::U32(end_ledger),
        ];
        Ok(self
            .sim
            .simulate(self.contract, "create_schedule", args, Some(admin))
            .await)
    }
}
