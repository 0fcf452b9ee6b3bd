use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{IntentError, IntentResult};
use crate::reconcile::{ExpectedDestination, ExpectedTransaction, TransactionReconciler};
use crate::store::{DeploymentRequest, DeploymentRequestId, DeploymentRequestStore, Project, ProjectId, ProjectStore};
use crate::types::{ChainId, EventSelector, FieldCheck};

use super::common::{chain_spec, RequestContext, WithTransactionData};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateDeploymentRequest {
    pub chain_id: ChainId,
    /// Constructor-encoded init bytecode the client will submit.
    pub contract_data: Bytes,
    pub initial_eth_amount: U256,
    /// `None` leaves the deployer unconstrained.
    pub deployer_address: Option<Address>,
    pub arbitrary_data: Option<serde_json::Value>,
}

/// Deployment policy: the expected destination is the zero address
/// (contract-creation semantics), and a successful reconciliation yields the
/// deployed contract address.
///
/// A newly learned address is written back into the stored record; this is the
/// only path where reconciliation output feeds persistence, and it is
/// idempotent.
pub struct DeploymentService {
    ctx: RequestContext,
    reconciler: TransactionReconciler,
    store: Arc<dyn DeploymentRequestStore>,
    projects: Arc<dyn ProjectStore>,
    event_selectors: Vec<EventSelector>,
}

impl DeploymentService {
    pub fn new(
        ctx: RequestContext,
        reconciler: TransactionReconciler,
        store: Arc<dyn DeploymentRequestStore>,
        projects: Arc<dyn ProjectStore>,
    ) -> Self {
        Self {
            ctx,
            reconciler,
            store,
            projects,
            event_selectors: Vec::new(),
        }
    }

    pub fn with_event_selectors(mut self, selectors: Vec<EventSelector>) -> Self {
        self.event_selectors = selectors;
        self
    }

    pub fn create(&self, params: CreateDeploymentRequest, project: &Project) -> DeploymentRequest {
        info!(project = %project.id, chain = %params.chain_id, "creating deployment request");
        let (id, created_at) = self.ctx.new_record_meta();
        self.store.store(DeploymentRequest {
            id: DeploymentRequestId(id),
            project_id: project.id,
            chain_id: params.chain_id,
            contract_data: params.contract_data,
            initial_eth_amount: params.initial_eth_amount,
            deployer_address: params.deployer_address,
            contract_address: None,
            tx_hash: None,
            arbitrary_data: params.arbitrary_data,
            created_at,
        })
    }

    pub async fn get(
        &self,
        id: DeploymentRequestId,
    ) -> IntentResult<WithTransactionData<DeploymentRequest>> {
        debug!(%id, "fetching deployment request");
        let request = RequestContext::found(
            self.store.get_by_id(id),
            format!("contract deployment request not found for id: {id}"),
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
    ) -> IntentResult<Vec<WithTransactionData<DeploymentRequest>>> {
        debug!(%project_id, "listing deployment requests");
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
        id: DeploymentRequestId,
        tx_hash: B256,
        deployer: Address,
    ) -> IntentResult<()> {
        info!(%id, %tx_hash, %deployer, "attaching tx info to deployment request");
        if self.store.set_tx_info(id, tx_hash, deployer) {
            Ok(())
        } else {
            Err(IntentError::AttachFailed(format!(
                "unable to attach transaction info to contract deployment request with id: {id}"
            )))
        }
    }

    /// Resolves the deployed contract address, reading the chain when the
    /// stored record has not been updated yet. `NotYetDeployed` until a mined
    /// transaction confirms an address.
    pub async fn resolve_contract_address(&self, id: DeploymentRequestId) -> IntentResult<Address> {
        let view = self.get(id).await?;
        view.value
            .contract_address
            .ok_or(IntentError::NotYetDeployed(id))
    }

    async fn reconciled(
        &self,
        mut request: DeploymentRequest,
        project: &Project,
    ) -> IntentResult<WithTransactionData<DeploymentRequest>> {
        let chain = chain_spec(request.chain_id, project);
        let expected = self.expected(&request);
        let outcome = self
            .reconciler
            .reconcile(&chain, &expected, &self.event_selectors)
            .await?;

        if request.contract_address.is_none() {
            if let Some(deployed) = outcome
                .mined
                .as_ref()
                .and_then(|mined| mined.deployed_contract_address)
            {
                info!(id = %request.id, address = %deployed, "resolved deployed contract address");
                self.store.set_contract_address(request.id, deployed);
                request.contract_address = Some(deployed);
            }
        }

        Ok(WithTransactionData {
            value: request,
            status: outcome.status,
            mined: outcome.mined,
        })
    }

    fn expected(&self, request: &DeploymentRequest) -> ExpectedTransaction {
        ExpectedTransaction {
            tx_hash: request.tx_hash,
            destination: ExpectedDestination::Deployment(request.contract_address),
            from: request.deployer_address.into(),
            data: FieldCheck::Checked(request.contract_data.clone()),
            value: FieldCheck::Checked(request.initial_eth_amount),
        }
    }
}
