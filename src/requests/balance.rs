use std::sync::Arc;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{IntentError, IntentResult};
use crate::reconcile::{ActualSignature, MessageChallenge, SignatureReconciler};
use crate::store::{BalanceRequest, BalanceRequestId, BalanceRequestStore, Project, ProjectId, ProjectStore};
use crate::types::{BlockRef, ChainId, Status};

use super::common::{chain_spec, RequestContext};

/// Creation parameters for an asset-balance check; validation happens in the
/// excluded creation layer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateBalanceRequest {
    pub chain_id: ChainId,
    pub token_address: Option<Address>,
    pub block_number: Option<u64>,
    pub requested_wallet_address: Option<Address>,
    pub arbitrary_data: Option<serde_json::Value>,
}

/// A balance request with its live status and, whenever the answering wallet
/// is known, its current on-chain balance. PENDING and FAILED views still
/// carry the balance for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceView {
    pub request: BalanceRequest,
    pub status: Status,
    pub balance: Option<U256>,
}

/// Balance policy: a signature flow whose challenge is the per-request signing
/// prompt, with an independent balance probe.
pub struct BalanceService {
    ctx: RequestContext,
    reconciler: SignatureReconciler,
    store: Arc<dyn BalanceRequestStore>,
    projects: Arc<dyn ProjectStore>,
}

impl BalanceService {
    pub fn new(
        ctx: RequestContext,
        reconciler: SignatureReconciler,
        store: Arc<dyn BalanceRequestStore>,
        projects: Arc<dyn ProjectStore>,
    ) -> Self {
        Self {
            ctx,
            reconciler,
            store,
            projects,
        }
    }

    pub fn create(&self, params: CreateBalanceRequest, project: &Project) -> BalanceRequest {
        info!(project = %project.id, chain = %params.chain_id, "creating balance request");
        let (id, created_at) = self.ctx.new_record_meta();
        self.store.store(BalanceRequest {
            id: BalanceRequestId(id),
            project_id: project.id,
            chain_id: params.chain_id,
            token_address: params.token_address,
            block_number: params.block_number,
            requested_wallet_address: params.requested_wallet_address,
            actual_wallet_address: None,
            signed_message: None,
            arbitrary_data: params.arbitrary_data,
            created_at,
        })
    }

    pub async fn get(&self, id: BalanceRequestId) -> IntentResult<BalanceView> {
        debug!(%id, "fetching balance request");
        let request = RequestContext::found(
            self.store.get_by_id(id),
            format!("asset balance request not found for id: {id}"),
        )?;
        let project = RequestContext::found(
            self.projects.get_by_id(request.project_id),
            format!("project not found for id: {}", request.project_id),
        )?;
        self.view(request, &project).await
    }

    /// Reconciles every request of the project; an unknown project yields an
    /// empty list, not an error.
    pub async fn list_by_project(&self, project_id: ProjectId) -> IntentResult<Vec<BalanceView>> {
        debug!(%project_id, "listing balance requests");
        let Some(project) = self.projects.get_by_id(project_id) else {
            return Ok(Vec::new());
        };
        let mut views = Vec::new();
        for request in self.store.list_by_project(project_id) {
            views.push(self.view(request, &project).await?);
        }
        Ok(views)
    }

    /// Binds the answering wallet and its signed message to the request, once.
    pub fn attach_wallet_and_signature(
        &self,
        id: BalanceRequestId,
        wallet_address: Address,
        signed_message: String,
    ) -> IntentResult<()> {
        info!(%id, %wallet_address, "attaching signed message to balance request");
        if self.store.set_signed_message(id, wallet_address, signed_message) {
            Ok(())
        } else {
            Err(IntentError::AttachFailed(format!(
                "unable to attach signed message to asset balance request with id: {id}"
            )))
        }
    }

    async fn view(&self, request: BalanceRequest, project: &Project) -> IntentResult<BalanceView> {
        // The balance probe is independent of signature state: it runs
        // whenever the answering wallet is known, so even PENDING and FAILED
        // views show current chain context.
        let balance = match request.actual_wallet_address {
            Some(wallet) => Some(self.fetch_balance(&request, project, wallet).await?),
            None => None,
        };

        let challenge = MessageChallenge {
            expected_message: request.message_to_sign(),
            expected_signer: request.requested_wallet_address,
        };
        let actual = ActualSignature {
            signer: request.actual_wallet_address,
            signed_message: request.signed_message.clone(),
        };
        let status = self.reconciler.reconcile(&challenge, &actual);

        Ok(BalanceView {
            request,
            status,
            balance,
        })
    }

    async fn fetch_balance(
        &self,
        request: &BalanceRequest,
        project: &Project,
        wallet: Address,
    ) -> IntentResult<U256> {
        let chain = chain_spec(request.chain_id, project);
        let block = request
            .block_number
            .map(BlockRef::Number)
            .unwrap_or_default();
        let balance = match request.token_address {
            Some(token) => {
                self.ctx
                    .gateway()
                    .fetch_token_balance(&chain, token, wallet, block)
                    .await?
            }
            None => {
                self.ctx
                    .gateway()
                    .fetch_native_balance(&chain, wallet, block)
                    .await?
            }
        };
        Ok(balance)
    }
}
