use std::sync::Arc;

use alloy_primitives::Bytes;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::errors::{IntentError, IntentResult};
use crate::gateway::ChainQueryGateway;
use crate::providers::{Clock, IdProvider, SystemProviders};
use crate::store::Project;
use crate::types::{ChainId, ChainSpec, MinedTransaction, Status};

/// Shared collaborators of the request services: the chain gateway plus the
/// id and time providers used at creation.
#[derive(Clone)]
pub struct RequestContext {
    gateway: Arc<dyn ChainQueryGateway>,
    ids: Arc<dyn IdProvider>,
    clock: Arc<dyn Clock>,
}

impl RequestContext {
    pub fn new(
        gateway: Arc<dyn ChainQueryGateway>,
        ids: Arc<dyn IdProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { gateway, ids, clock }
    }

    /// Context with random ids and the system clock.
    pub fn with_system_providers(gateway: Arc<dyn ChainQueryGateway>) -> Self {
        let providers = Arc::new(SystemProviders);
        Self::new(gateway, providers.clone(), providers)
    }

    pub fn gateway(&self) -> &dyn ChainQueryGateway {
        self.gateway.as_ref()
    }

    pub fn new_record_meta(&self) -> (Uuid, OffsetDateTime) {
        (self.ids.new_request_id(), self.clock.now())
    }

    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    /// Maps a missing record to `NotFound`.
    pub fn found<T>(resource: Option<T>, message: impl Into<String>) -> IntentResult<T> {
        resource.ok_or_else(|| IntentError::NotFound(message.into()))
    }
}

/// Builds the chain spec for a request, taking the project's RPC override.
pub fn chain_spec(chain_id: ChainId, project: &Project) -> ChainSpec {
    ChainSpec {
        chain_id,
        custom_rpc_url: project.custom_rpc_url.clone(),
    }
}

/// A request together with its live reconciliation outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithTransactionData<T> {
    pub value: T,
    pub status: Status,
    pub mined: Option<MinedTransaction>,
}

/// A freshly created request together with the call data the client must
/// submit on chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithFunctionData<T> {
    pub value: T,
    pub data: Bytes,
}
