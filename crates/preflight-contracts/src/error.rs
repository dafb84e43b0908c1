use preflight_types::{AmountError, EncodeError, VestingError};
use thiserror::Error;

/// Rejected user input, caught before anything is sent to the node
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Schedule(#[from] VestingError),
}

impl InputError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Amount(err) => err.error_code(),
            Self::Encode(err) => err.error_code(),
            Self::Schedule(_) => "INVALID_SCHEDULE",
        }
    }
}
