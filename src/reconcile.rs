//! The shared reconciliation core.
//!
//! [`TransactionReconciler`] turns an expected transaction plus live chain data
//! into one status; [`SignatureReconciler`] does the same for message-signing
//! flows. The per-request-type services supply the expected field sets and
//! interpret the results; nothing here is persisted or cached between calls.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::gateway::{ChainQueryGateway, GatewayError};
use crate::signature::SignatureVerifier;
use crate::types::{ChainSpec, EventSelector, FieldCheck, MinedTransaction, Status};

/// Where the expected transaction must land.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedDestination {
    /// A call into an existing contract: the mined `to` must equal this
    /// address and the transaction must not have created a contract.
    Call(Address),
    /// A contract creation: the mined `to` must be the zero address and a
    /// deployed contract address must be present, matching the known one when
    /// the deployment has already been resolved.
    Deployment(Option<Address>),
}

/// The policy-supplied expectation a mined transaction is verified against.
///
/// A missing `tx_hash` means the transaction has not been submitted yet.
/// `Unchecked` fields are skipped entirely, e.g. when a request never recorded
/// a caller address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedTransaction {
    pub tx_hash: Option<B256>,
    pub destination: ExpectedDestination,
    pub from: FieldCheck<Address>,
    pub data: FieldCheck<Bytes>,
    pub value: FieldCheck<U256>,
}

/// Result of one transaction reconciliation pass. The mined transaction is
/// attached on FAILED as well, so callers can surface diagnostic chain data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReconciliation {
    pub status: Status,
    pub mined: Option<MinedTransaction>,
}

impl TxReconciliation {
    fn pending() -> Self {
        Self {
            status: Status::Pending,
            mined: None,
        }
    }
}

/// Fetches chain data for an expected correlation and classifies the outcome.
#[derive(Clone)]
pub struct TransactionReconciler {
    gateway: Arc<dyn ChainQueryGateway>,
}

impl TransactionReconciler {
    pub fn new(gateway: Arc<dyn ChainQueryGateway>) -> Self {
        Self { gateway }
    }

    /// Classifies the current state of `expected` on `chain`.
    ///
    /// No transaction hash or a not-yet-mined transaction yields PENDING
    /// without further checks. Once mined, fields are verified in a fixed
    /// order, short-circuiting on the first mismatch; comparing the mined data
    /// against the expectation (instead of trusting the caller-supplied hash)
    /// is what stops a syntactically valid but unrelated transaction from
    /// passing as this intent.
    pub async fn reconcile(
        &self,
        chain: &ChainSpec,
        expected: &ExpectedTransaction,
        events: &[EventSelector],
    ) -> Result<TxReconciliation, GatewayError> {
        let Some(tx_hash) = expected.tx_hash else {
            return Ok(TxReconciliation::pending());
        };

        let Some(mined) = self.gateway.fetch_transaction(chain, tx_hash, events).await? else {
            return Ok(TxReconciliation::pending());
        };

        let status = classify(tx_hash, expected, &mined);
        Ok(TxReconciliation {
            status,
            mined: Some(mined),
        })
    }
}

fn classify(tx_hash: B256, expected: &ExpectedTransaction, mined: &MinedTransaction) -> Status {
    // Hash equality is defensive; the gateway queried by this hash.
    if mined.hash != tx_hash {
        debug!(field = "hash", "mined transaction mismatch");
        return Status::Failed;
    }
    if !destination_matches(&expected.destination, mined) {
        debug!(field = "destination", "mined transaction mismatch");
        return Status::Failed;
    }
    if !expected.from.matches(&mined.from) {
        debug!(field = "from", "mined transaction mismatch");
        return Status::Failed;
    }
    if !expected.data.matches(&mined.data) {
        debug!(field = "data", "mined transaction mismatch");
        return Status::Failed;
    }
    if !expected.value.matches(&mined.value) {
        debug!(field = "value", "mined transaction mismatch");
        return Status::Failed;
    }
    if !mined.success {
        debug!("on-chain execution reverted");
        return Status::Failed;
    }
    Status::Success
}

fn destination_matches(expected: &ExpectedDestination, mined: &MinedTransaction) -> bool {
    match expected {
        ExpectedDestination::Call(to) => {
            mined.to == *to && mined.deployed_contract_address.is_none()
        }
        ExpectedDestination::Deployment(known) => {
            if mined.to != Address::ZERO {
                return false;
            }
            match (known, mined.deployed_contract_address) {
                (Some(expected_addr), Some(actual)) => *expected_addr == actual,
                (None, Some(_)) => true,
                (_, None) => false,
            }
        }
    }
}

/// The challenge a signature flow reconciles against. `expected_signer` absent
/// means any signer is acceptable as long as the signature verifies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageChallenge {
    pub expected_message: String,
    pub expected_signer: Option<Address>,
}

/// What the wallet actually supplied so far. Both fields are attached together
/// exactly once by the external attach operation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualSignature {
    pub signer: Option<Address>,
    pub signed_message: Option<String>,
}

/// Classifies message-signing flows (balance proofs, wallet login).
#[derive(Clone)]
pub struct SignatureReconciler {
    verifier: Arc<dyn SignatureVerifier>,
}

impl SignatureReconciler {
    pub fn new(verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self { verifier }
    }

    /// PENDING until both a signer address and a signed message are present;
    /// FAILED on an expected-signer mismatch (without invoking signature
    /// verification) or an invalid signature; SUCCESS otherwise.
    pub fn reconcile(&self, challenge: &MessageChallenge, actual: &ActualSignature) -> Status {
        let Some(signer) = actual.signer else {
            return Status::Pending;
        };
        let Some(signed_message) = actual.signed_message.as_deref() else {
            return Status::Pending;
        };

        if let Some(expected) = challenge.expected_signer {
            if expected != signer {
                debug!(%signer, %expected, "signer address mismatch");
                return Status::Failed;
            }
        }

        if !self
            .verifier
            .matches(&challenge.expected_message, signed_message, signer)
        {
            debug!(%signer, "signature verification failed");
            return Status::Failed;
        }

        Status::Success
    }
}
