use std::sync::Arc;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::config::IntentsConfig;
use crate::errors::{IntentError, IntentResult, LoginFailure};
use crate::reconcile::{ActualSignature, MessageChallenge, SignatureReconciler};
use crate::signature::SignatureVerifier;
use crate::store::{LoginRequest, LoginRequestId, LoginRequestStore};
use crate::types::Status;

use super::common::RequestContext;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateLoginRequest {
    pub wallet_address: Address,
}

/// Proof that a login challenge was answered by the wallet's owner. Session
/// token minting belongs to the API layer, not here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedLogin {
    pub wallet_address: Address,
    #[serde(with = "time::serde::rfc3339")]
    pub verified_at: OffsetDateTime,
}

/// Wallet-login flow: a signature challenge bound to one wallet address, valid
/// for a configured window after creation.
pub struct LoginService {
    ctx: RequestContext,
    reconciler: SignatureReconciler,
    verifier: Arc<dyn SignatureVerifier>,
    store: Arc<dyn LoginRequestStore>,
    config: IntentsConfig,
}

impl LoginService {
    pub fn new(
        ctx: RequestContext,
        reconciler: SignatureReconciler,
        verifier: Arc<dyn SignatureVerifier>,
        store: Arc<dyn LoginRequestStore>,
        config: IntentsConfig,
    ) -> Self {
        Self {
            ctx,
            reconciler,
            verifier,
            store,
            config,
        }
    }

    pub fn create(&self, params: CreateLoginRequest) -> LoginRequest {
        info!(wallet = %params.wallet_address, "creating wallet login request");
        let (id, created_at) = self.ctx.new_record_meta();
        let timestamp = created_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| created_at.unix_timestamp().to_string());
        let message_to_sign = format!(
            "Sign this message to confirm that you are the owner of the wallet: {}\nID to sign: {id}, timestamp: {timestamp}",
            params.wallet_address
        );
        self.store.store(LoginRequest {
            id: LoginRequestId(id),
            wallet_address: params.wallet_address,
            message_to_sign,
            signed_message: None,
            created_at,
        })
    }

    /// Status view of a login challenge; side-effect free.
    pub fn get(&self, id: LoginRequestId) -> IntentResult<(LoginRequest, Status)> {
        debug!(%id, "fetching wallet login request");
        let request = RequestContext::found(
            self.store.get_by_id(id),
            format!("wallet login request not found for id: {id}"),
        )?;
        let status = self.reconciler.reconcile(
            &MessageChallenge {
                expected_message: request.message_to_sign.clone(),
                expected_signer: Some(request.wallet_address),
            },
            &ActualSignature {
                signer: request.signed_message.as_ref().map(|_| request.wallet_address),
                signed_message: request.signed_message.clone(),
            },
        );
        Ok((request, status))
    }

    /// Attaches the signed challenge (at most once) and verifies it in one
    /// step, returning the proven wallet identity.
    ///
    /// Expiry is checked before the attach so that a late signature never
    /// consumes the single write.
    pub fn attach_and_verify(
        &self,
        id: LoginRequestId,
        signed_message: String,
    ) -> IntentResult<VerifiedLogin> {
        debug!(%id, "verifying wallet login request");
        let request = RequestContext::found(
            self.store.get_by_id(id),
            format!("wallet login request not found for id: {id}"),
        )?;

        let now = self.ctx.now();
        let valid_until = request.created_at + self.config.login_request_validity();
        if now > valid_until {
            warn!(%id, "wallet login request has expired");
            return Err(IntentError::LoginFailed(LoginFailure::Expired));
        }

        info!(%id, "attaching signed message to wallet login request");
        if !self.store.set_signed_message(id, signed_message.clone()) {
            return Err(IntentError::AttachFailed(format!(
                "unable to attach signed message to wallet login request with id: {id}"
            )));
        }

        if !self.verifier.matches(
            &request.message_to_sign,
            &signed_message,
            request.wallet_address,
        ) {
            warn!(%id, wallet = %request.wallet_address, "wallet login signature mismatch");
            return Err(IntentError::LoginFailed(LoginFailure::VerificationFailed));
        }

        Ok(VerifiedLogin {
            wallet_address: request.wallet_address,
            verified_at: now,
        })
    }
}
