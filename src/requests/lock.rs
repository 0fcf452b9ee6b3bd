use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::encode::FunctionEncoder;
use crate::errors::{IntentError, IntentResult};
use crate::reconcile::{ExpectedDestination, ExpectedTransaction, TransactionReconciler};
use crate::store::{Project, ProjectId, ProjectStore, TokenLockRequest, TokenLockRequestId, TokenLockRequestStore};
use crate::types::{ChainId, FieldCheck, FunctionArgument};

use super::common::{chain_spec, RequestContext, WithFunctionData, WithTransactionData};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateTokenLockRequest {
    pub chain_id: ChainId,
    pub token_address: Address,
    pub token_amount: U256,
    pub lock_duration_secs: u64,
    pub lock_contract_address: Address,
    /// `None` leaves the transaction sender unconstrained.
    pub token_sender_address: Option<Address>,
    pub arbitrary_data: Option<serde_json::Value>,
}

/// Token-lock policy: the expected transaction is a `lock(...)` call into the
/// lock contract, carrying no native value. Call data is re-encoded from the
/// stored parameters on every read.
pub struct TokenLockService {
    ctx: RequestContext,
    reconciler: TransactionReconciler,
    store: Arc<dyn TokenLockRequestStore>,
    projects: Arc<dyn ProjectStore>,
    encoder: Arc<dyn FunctionEncoder>,
}

impl TokenLockService {
    pub fn new(
        ctx: RequestContext,
        reconciler: TransactionReconciler,
        store: Arc<dyn TokenLockRequestStore>,
        projects: Arc<dyn ProjectStore>,
        encoder: Arc<dyn FunctionEncoder>,
    ) -> Self {
        Self {
            ctx,
            reconciler,
            store,
            projects,
            encoder,
        }
    }

    pub fn create(
        &self,
        params: CreateTokenLockRequest,
        project: &Project,
    ) -> WithFunctionData<TokenLockRequest> {
        info!(project = %project.id, chain = %params.chain_id, "creating token lock request");
        let (id, created_at) = self.ctx.new_record_meta();
        let request = self.store.store(TokenLockRequest {
            id: TokenLockRequestId(id),
            project_id: project.id,
            chain_id: params.chain_id,
            token_address: params.token_address,
            token_amount: params.token_amount,
            lock_duration_secs: params.lock_duration_secs,
            lock_contract_address: params.lock_contract_address,
            token_sender_address: params.token_sender_address,
            tx_hash: None,
            arbitrary_data: params.arbitrary_data,
            created_at,
        });
        let data = self.encode_lock_data(&request);
        WithFunctionData {
            value: request,
            data,
        }
    }

    pub async fn get(
        &self,
        id: TokenLockRequestId,
    ) -> IntentResult<WithTransactionData<TokenLockRequest>> {
        debug!(%id, "fetching token lock request");
        let request = RequestContext::found(
            self.store.get_by_id(id),
            format!("token lock request not found for id: {id}"),
        )?;
        let project = RequestContext::found(
            self.projects.get_by_id(request.project_id),
            format!("project not found for id: {}", request.project_id),
        )?;
        self.reconciled(request, &project).await
    }

    pub async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> IntentResult<Vec<WithTransactionData<TokenLockRequest>>> {
        debug!(%project_id, "listing token lock requests");
        let Some(project) = self.projects.get_by_id(project_id) else {
            return Ok(Vec::new());
        };
        let mut views = Vec::new();
        for request in self.store.list_by_project(project_id) {
            views.push(self.reconciled(request, &project).await?);
        }
        Ok(views)
    }

    pub fn attach_tx_info(
        &self,
        id: TokenLockRequestId,
        tx_hash: B256,
        caller: Address,
    ) -> IntentResult<()> {
        info!(%id, %tx_hash, %caller, "attaching tx info to token lock request");
        if self.store.set_tx_info(id, tx_hash, caller) {
            Ok(())
        } else {
            Err(IntentError::AttachFailed(format!(
                "unable to attach transaction info to token lock request with id: {id}"
            )))
        }
    }

    async fn reconciled(
        &self,
        request: TokenLockRequest,
        project: &Project,
    ) -> IntentResult<WithTransactionData<TokenLockRequest>> {
        let chain = chain_spec(request.chain_id, project);
        let expected = self.expected(&request);
        let outcome = self.reconciler.reconcile(&chain, &expected, &[]).await?;
        Ok(WithTransactionData {
            value: request,
            status: outcome.status,
            mined: outcome.mined,
        })
    }

    fn expected(&self, request: &TokenLockRequest) -> ExpectedTransaction {
        ExpectedTransaction {
            tx_hash: request.tx_hash,
            destination: ExpectedDestination::Call(request.lock_contract_address),
            from: request.token_sender_address.into(),
            data: FieldCheck::Checked(self.encode_lock_data(request)),
            // Locking moves ERC-20 balance, not native value.
            value: FieldCheck::Checked(U256::ZERO),
        }
    }

    fn encode_lock_data(&self, request: &TokenLockRequest) -> Bytes {
        self.encoder.encode_function_call(
            "lock",
            &[
                FunctionArgument::Address(request.token_address),
                FunctionArgument::Uint(request.token_amount),
                FunctionArgument::Uint(U256::from(request.lock_duration_secs)),
                FunctionArgument::String(request.id.to_string()),
                FunctionArgument::Address(Address::ZERO),
            ],
        )
    }
}
