use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::encode::FunctionEncoder;
use crate::errors::{IntentError, IntentResult};
use crate::reconcile::{ExpectedDestination, ExpectedTransaction, TransactionReconciler};
use crate::store::{FunctionCallRequest, FunctionCallRequestId, FunctionCallRequestStore, Project, ProjectId, ProjectStore};
use crate::types::{ChainId, EventSelector, FieldCheck, FunctionArgument};

use super::common::{chain_spec, RequestContext, WithFunctionData, WithTransactionData};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateFunctionCallRequest {
    pub chain_id: ChainId,
    pub contract_address: Address,
    pub function_name: String,
    pub function_params: Vec<FunctionArgument>,
    pub eth_amount: U256,
    /// `None` leaves the caller unconstrained.
    pub caller_address: Option<Address>,
    pub arbitrary_data: Option<serde_json::Value>,
}

/// Function-call policy: the expected transaction targets the stored contract
/// with data re-encoded from the stored function name and arguments, so
/// storage-layer tampering with parameters surfaces as FAILED.
pub struct FunctionCallService {
    ctx: RequestContext,
    reconciler: TransactionReconciler,
    store: Arc<dyn FunctionCallRequestStore>,
    projects: Arc<dyn ProjectStore>,
    encoder: Arc<dyn FunctionEncoder>,
    /// Event selectors supplied by the contract-metadata layer, applied when
    /// decoding mined transaction logs.
    event_selectors: Vec<EventSelector>,
}

impl FunctionCallService {
    pub fn new(
        ctx: RequestContext,
        reconciler: TransactionReconciler,
        store: Arc<dyn FunctionCallRequestStore>,
        projects: Arc<dyn ProjectStore>,
        encoder: Arc<dyn FunctionEncoder>,
    ) -> Self {
        Self {
            ctx,
            reconciler,
            store,
            projects,
            encoder,
            event_selectors: Vec::new(),
        }
    }

    pub fn with_event_selectors(mut self, selectors: Vec<EventSelector>) -> Self {
        self.event_selectors = selectors;
        self
    }

    pub fn create(
        &self,
        params: CreateFunctionCallRequest,
        project: &Project,
    ) -> WithFunctionData<FunctionCallRequest> {
        info!(
            project = %project.id,
            chain = %params.chain_id,
            function = %params.function_name,
            "creating function call request"
        );
        let (id, created_at) = self.ctx.new_record_meta();
        let data = self
            .encoder
            .encode_function_call(&params.function_name, &params.function_params);
        let request = self.store.store(FunctionCallRequest {
            id: FunctionCallRequestId(id),
            project_id: project.id,
            chain_id: params.chain_id,
            contract_address: params.contract_address,
            function_name: params.function_name,
            function_params: params.function_params,
            eth_amount: params.eth_amount,
            caller_address: params.caller_address,
            tx_hash: None,
            arbitrary_data: params.arbitrary_data,
            created_at,
        });
        WithFunctionData {
            value: request,
            data,
        }
    }

    pub async fn get(
        &self,
        id: FunctionCallRequestId,
    ) -> IntentResult<WithTransactionData<FunctionCallRequest>> {
        debug!(%id, "fetching function call request");
        let request = RequestContext::found(
            self.store.get_by_id(id),
            format!("contract function call request not found for id: {id}"),
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
    ) -> IntentResult<Vec<WithTransactionData<FunctionCallRequest>>> {
        debug!(%project_id, "listing function call requests");
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
        id: FunctionCallRequestId,
        tx_hash: B256,
        caller: Address,
    ) -> IntentResult<()> {
        info!(%id, %tx_hash, %caller, "attaching tx info to function call request");
        if self.store.set_tx_info(id, tx_hash, caller) {
            Ok(())
        } else {
            Err(IntentError::AttachFailed(format!(
                "unable to attach transaction info to contract function call request with id: {id}"
            )))
        }
    }

    async fn reconciled(
        &self,
        request: FunctionCallRequest,
        project: &Project,
    ) -> IntentResult<WithTransactionData<FunctionCallRequest>> {
        let chain = chain_spec(request.chain_id, project);
        let expected = self.expected(&request);
        let outcome = self
            .reconciler
            .reconcile(&chain, &expected, &self.event_selectors)
            .await?;
        Ok(WithTransactionData {
            value: request,
            status: outcome.status,
            mined: outcome.mined,
        })
    }

    fn expected(&self, request: &FunctionCallRequest) -> ExpectedTransaction {
        let data = self
            .encoder
            .encode_function_call(&request.function_name, &request.function_params);
        ExpectedTransaction {
            tx_hash: request.tx_hash,
            destination: ExpectedDestination::Call(request.contract_address),
            from: request.caller_address.into(),
            data: FieldCheck::Checked(data),
            value: FieldCheck::Checked(request.eth_amount),
        }
    }
}
