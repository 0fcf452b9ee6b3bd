use thiserror::Error;

use crate::gateway::GatewayError;
use crate::store::DeploymentRequestId;

/// Failures surfaced by the request services.
///
/// Reconciliation-time chain mismatches are never errors; they come back as the
/// `Failed` status value. Only lookup, attach, expiry, and infrastructure
/// problems land here.
#[derive(Debug, Error)]
pub enum IntentError {
    #[error("resource not found: {0}")]
    NotFound(String),
    /// The persistence layer reported no row changed on an attach. The record
    /// exists but the field was already set, or the id went stale underneath.
    #[error("cannot attach to request: {0}")]
    AttachFailed(String),
    /// A deployment request was asked for its contract address before any mined
    /// transaction confirmed one. Retryable by the caller.
    #[error("contract not yet deployed for request {0}")]
    NotYetDeployed(DeploymentRequestId),
    #[error("wallet login failed: {0}")]
    LoginFailed(#[from] LoginFailure),
    #[error("chain gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("configuration error: {0}")]
    Config(String),
}

/// Why a wallet login was rejected. Both causes are one "login failed" family
/// toward the caller, but the distinction matters for diagnostics.
#[derive(Debug, Error)]
pub enum LoginFailure {
    #[error("login request has expired")]
    Expired,
    #[error("signature does not match expected signer")]
    VerificationFailed,
}

pub type IntentResult<T> = Result<T, IntentError>;
