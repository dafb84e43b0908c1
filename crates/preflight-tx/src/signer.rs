//! The external signer collaborator
//!
//! Keys never enter this layer. A wallet receives the unsigned envelope and
//! hands back the signed one, or refuses.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error("Signing was rejected by the user")]
    UserRejected,

    #[error("Signer failed: {0}")]
    Failed(String),
}

impl SignError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UserRejected => "USER_REJECTED",
            Self::Failed(_) => "SIGNER_FAILED",
        }
    }
}

#[async_trait]
pub trait Signer: Send + Sync {
    /// Sign an encoded unsigned envelope for the given network.
    ///
    /// May wait on a person; callers wanting a deadline wrap this in their
    /// own timeout.
    async fn sign(&self, unsigned_envelope: &[u8], network_passphrase: &str)
        -> Result<Vec<u8>, SignError>;
}
