//! Persistence boundary: stored request records and the store traits the
//! services consume. The real implementation (schema, SQL, CAS updates) lives
//! outside this crate; [`InMemoryStore`] mirrors its contract for tests and
//! embedded use.
//!
//! Attach operations are at-most-once. A `set_*` returning `false` means no
//! row changed, either because the field was already set or the id was stale;
//! the services surface that as `AttachFailed`.

use std::collections::HashMap;
use std::sync::Mutex;

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::types::{ChainId, FunctionArgument};

macro_rules! request_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

request_id!(ProjectId);
request_id!(BalanceRequestId);
request_id!(TokenLockRequestId);
request_id!(FunctionCallRequestId);
request_id!(DeploymentRequestId);
request_id!(LoginRequestId);

/// The owning project of a request; only its RPC override matters here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub custom_rpc_url: Option<String>,
}

/// A stored asset-balance check. The wallet proves ownership by signing a
/// per-request message; the balance itself is read from chain on every get.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRequest {
    pub id: BalanceRequestId,
    pub project_id: ProjectId,
    pub chain_id: ChainId,
    /// ERC-20 token to check; `None` means the native asset.
    pub token_address: Option<Address>,
    pub block_number: Option<u64>,
    /// Constrains who may answer the challenge; `None` accepts any signer.
    pub requested_wallet_address: Option<Address>,
    pub actual_wallet_address: Option<Address>,
    pub signed_message: Option<String>,
    pub arbitrary_data: Option<serde_json::Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl BalanceRequest {
    pub fn message_to_sign(&self) -> String {
        format!("Verification message ID to sign: {}", self.id)
    }
}

/// A stored ERC-20 token lock intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLockRequest {
    pub id: TokenLockRequestId,
    pub project_id: ProjectId,
    pub chain_id: ChainId,
    pub token_address: Address,
    pub token_amount: U256,
    pub lock_duration_secs: u64,
    pub lock_contract_address: Address,
    /// `None` leaves the transaction sender unconstrained.
    pub token_sender_address: Option<Address>,
    pub tx_hash: Option<B256>,
    pub arbitrary_data: Option<serde_json::Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A stored contract function call intent. Call data is re-encoded from
/// `function_name` + `function_params` at read time, never read back as bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCallRequest {
    pub id: FunctionCallRequestId,
    pub project_id: ProjectId,
    pub chain_id: ChainId,
    pub contract_address: Address,
    pub function_name: String,
    pub function_params: Vec<FunctionArgument>,
    pub eth_amount: U256,
    pub caller_address: Option<Address>,
    pub tx_hash: Option<B256>,
    pub arbitrary_data: Option<serde_json::Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A stored contract deployment intent. `contract_address` starts empty and is
/// resolved from the mined transaction's receipt exactly once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRequest {
    pub id: DeploymentRequestId,
    pub project_id: ProjectId,
    pub chain_id: ChainId,
    /// Constructor-encoded init bytecode, as submitted.
    pub contract_data: Bytes,
    pub initial_eth_amount: U256,
    pub deployer_address: Option<Address>,
    pub contract_address: Option<Address>,
    pub tx_hash: Option<B256>,
    pub arbitrary_data: Option<serde_json::Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A stored wallet login challenge, valid for a configured window after
/// creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub id: LoginRequestId,
    pub wallet_address: Address,
    pub message_to_sign: String,
    pub signed_message: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub trait ProjectStore: Send + Sync {
    fn get_by_id(&self, id: ProjectId) -> Option<Project>;
}

pub trait BalanceRequestStore: Send + Sync {
    fn store(&self, request: BalanceRequest) -> BalanceRequest;
    fn get_by_id(&self, id: BalanceRequestId) -> Option<BalanceRequest>;
    fn list_by_project(&self, project_id: ProjectId) -> Vec<BalanceRequest>;
    /// Attaches the wallet address and signed message together, once.
    fn set_signed_message(
        &self,
        id: BalanceRequestId,
        wallet_address: Address,
        signed_message: String,
    ) -> bool;
}

pub trait TokenLockRequestStore: Send + Sync {
    fn store(&self, request: TokenLockRequest) -> TokenLockRequest;
    fn get_by_id(&self, id: TokenLockRequestId) -> Option<TokenLockRequest>;
    fn list_by_project(&self, project_id: ProjectId) -> Vec<TokenLockRequest>;
    fn set_tx_info(&self, id: TokenLockRequestId, tx_hash: B256, caller: Address) -> bool;
}

pub trait FunctionCallRequestStore: Send + Sync {
    fn store(&self, request: FunctionCallRequest) -> FunctionCallRequest;
    fn get_by_id(&self, id: FunctionCallRequestId) -> Option<FunctionCallRequest>;
    fn list_by_project(&self, project_id: ProjectId) -> Vec<FunctionCallRequest>;
    fn set_tx_info(&self, id: FunctionCallRequestId, tx_hash: B256, caller: Address) -> bool;
}

pub trait DeploymentRequestStore: Send + Sync {
    fn store(&self, request: DeploymentRequest) -> DeploymentRequest;
    fn get_by_id(&self, id: DeploymentRequestId) -> Option<DeploymentRequest>;
    fn list_by_project(&self, project_id: ProjectId) -> Vec<DeploymentRequest>;
    fn set_tx_info(&self, id: DeploymentRequestId, tx_hash: B256, deployer: Address) -> bool;
    /// Records the resolved contract address. Idempotent: setting the same
    /// address again is a no-op returning `true`; overwriting a different
    /// resolved address returns `false`.
    fn set_contract_address(&self, id: DeploymentRequestId, address: Address) -> bool;
}

pub trait LoginRequestStore: Send + Sync {
    fn store(&self, request: LoginRequest) -> LoginRequest;
    fn get_by_id(&self, id: LoginRequestId) -> Option<LoginRequest>;
    fn set_signed_message(&self, id: LoginRequestId, signed_message: String) -> bool;
}

/// In-memory store implementing every trait with the same conditional-update
/// discipline the real persistence layer applies (set only while the column is
/// still null).
#[derive(Default)]
pub struct InMemoryStore {
    projects: Mutex<HashMap<ProjectId, Project>>,
    balance: Mutex<HashMap<BalanceRequestId, BalanceRequest>>,
    lock: Mutex<HashMap<TokenLockRequestId, TokenLockRequest>>,
    call: Mutex<HashMap<FunctionCallRequestId, FunctionCallRequest>>,
    deploy: Mutex<HashMap<DeploymentRequestId, DeploymentRequest>>,
    login: Mutex<HashMap<LoginRequestId, LoginRequest>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_project(&self, project: Project) {
        self.projects.lock().unwrap().insert(project.id, project);
    }
}

impl ProjectStore for InMemoryStore {
    fn get_by_id(&self, id: ProjectId) -> Option<Project> {
        self.projects.lock().unwrap().get(&id).cloned()
    }
}

impl BalanceRequestStore for InMemoryStore {
    fn store(&self, request: BalanceRequest) -> BalanceRequest {
        self.balance
            .lock()
            .unwrap()
            .insert(request.id, request.clone());
        request
    }

    fn get_by_id(&self, id: BalanceRequestId) -> Option<BalanceRequest> {
        self.balance.lock().unwrap().get(&id).cloned()
    }

    fn list_by_project(&self, project_id: ProjectId) -> Vec<BalanceRequest> {
        let mut requests: Vec<_> = self
            .balance
            .lock()
            .unwrap()
            .values()
            .filter(|req| req.project_id == project_id)
            .cloned()
            .collect();
        requests.sort_by_key(|req| req.created_at);
        requests
    }

    fn set_signed_message(
        &self,
        id: BalanceRequestId,
        wallet_address: Address,
        signed_message: String,
    ) -> bool {
        let mut requests = self.balance.lock().unwrap();
        match requests.get_mut(&id) {
            Some(req) if req.signed_message.is_none() && req.actual_wallet_address.is_none() => {
                req.actual_wallet_address = Some(wallet_address);
                req.signed_message = Some(signed_message);
                true
            }
            _ => false,
        }
    }
}

impl TokenLockRequestStore for InMemoryStore {
    fn store(&self, request: TokenLockRequest) -> TokenLockRequest {
        self.lock.lock().unwrap().insert(request.id, request.clone());
        request
    }

    fn get_by_id(&self, id: TokenLockRequestId) -> Option<TokenLockRequest> {
        self.lock.lock().unwrap().get(&id).cloned()
    }

    fn list_by_project(&self, project_id: ProjectId) -> Vec<TokenLockRequest> {
        let mut requests: Vec<_> = self
            .lock
            .lock()
            .unwrap()
            .values()
            .filter(|req| req.project_id == project_id)
            .cloned()
            .collect();
        requests.sort_by_key(|req| req.created_at);
        requests
    }

    fn set_tx_info(&self, id: TokenLockRequestId, tx_hash: B256, caller: Address) -> bool {
        let mut requests = self.lock.lock().unwrap();
        match requests.get_mut(&id) {
            Some(req) if req.tx_hash.is_none() => {
                req.tx_hash = Some(tx_hash);
                req.token_sender_address.get_or_insert(caller);
                true
            }
            _ => false,
        }
    }
}

impl FunctionCallRequestStore for InMemoryStore {
    fn store(&self, request: FunctionCallRequest) -> FunctionCallRequest {
        self.call.lock().unwrap().insert(request.id, request.clone());
        request
    }

    fn get_by_id(&self, id: FunctionCallRequestId) -> Option<FunctionCallRequest> {
        self.call.lock().unwrap().get(&id).cloned()
    }

    fn list_by_project(&self, project_id: ProjectId) -> Vec<FunctionCallRequest> {
        let mut requests: Vec<_> = self
            .call
            .lock()
            .unwrap()
            .values()
            .filter(|req| req.project_id == project_id)
            .cloned()
            .collect();
        requests.sort_by_key(|req| req.created_at);
        requests
    }

    fn set_tx_info(&self, id: FunctionCallRequestId, tx_hash: B256, caller: Address) -> bool {
        let mut requests = self.call.lock().unwrap();
        match requests.get_mut(&id) {
            Some(req) if req.tx_hash.is_none() => {
                req.tx_hash = Some(tx_hash);
                req.caller_address.get_or_insert(caller);
                true
            }
            _ => false,
        }
    }
}

impl DeploymentRequestStore for InMemoryStore {
    fn store(&self, request: DeploymentRequest) -> DeploymentRequest {
        self.deploy
            .lock()
            .unwrap()
            .insert(request.id, request.clone());
        request
    }

    fn get_by_id(&self, id: DeploymentRequestId) -> Option<DeploymentRequest> {
        self.deploy.lock().unwrap().get(&id).cloned()
    }

    fn list_by_project(&self, project_id: ProjectId) -> Vec<DeploymentRequest> {
        let mut requests: Vec<_> = self
            .deploy
            .lock()
            .unwrap()
            .values()
            .filter(|req| req.project_id == project_id)
            .cloned()
            .collect();
        requests.sort_by_key(|req| req.created_at);
        requests
    }

    fn set_tx_info(&self, id: DeploymentRequestId, tx_hash: B256, deployer: Address) -> bool {
        let mut requests = self.deploy.lock().unwrap();
        match requests.get_mut(&id) {
            Some(req) if req.tx_hash.is_none() => {
                req.tx_hash = Some(tx_hash);
                req.deployer_address.get_or_insert(deployer);
                true
            }
            _ => false,
        }
    }

    fn set_contract_address(&self, id: DeploymentRequestId, address: Address) -> bool {
        let mut requests = self.deploy.lock().unwrap();
        match requests.get_mut(&id) {
            Some(req) => match req.contract_address {
                None => {
                    req.contract_address = Some(address);
                    true
                }
                Some(existing) => existing == address,
            },
            None => false,
        }
    }
}

impl LoginRequestStore for InMemoryStore {
    fn store(&self, request: LoginRequest) -> LoginRequest {
        self.login
            .lock()
            .unwrap()
            .insert(request.id, request.clone());
        request
    }

    fn get_by_id(&self, id: LoginRequestId) -> Option<LoginRequest> {
        self.login.lock().unwrap().get(&id).cloned()
    }

    fn set_signed_message(&self, id: LoginRequestId, signed_message: String) -> bool {
        let mut requests = self.login.lock().unwrap();
        match requests.get_mut(&id) {
            Some(req) if req.signed_message.is_none() => {
                req.signed_message = Some(signed_message);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn lock_request(id: Uuid) -> TokenLockRequest {
        TokenLockRequest {
            id: TokenLockRequestId(id),
            project_id: ProjectId(Uuid::nil()),
            chain_id: ChainId(1),
            token_address: Address::repeat_byte(0x01),
            token_amount: U256::from(10u64),
            lock_duration_secs: 600,
            lock_contract_address: Address::repeat_byte(0x02),
            token_sender_address: None,
            tx_hash: None,
            arbitrary_data: None,
            created_at: datetime!(2024-05-01 12:00 UTC),
        }
    }

    #[test]
    fn tx_info_attaches_once() {
        let store = InMemoryStore::new();
        let id = TokenLockRequestId(Uuid::from_u128(1));
        TokenLockRequestStore::store(&store, lock_request(id.0));

        let caller = Address::repeat_byte(0xaa);
        assert!(TokenLockRequestStore::set_tx_info(&store, id, B256::repeat_byte(0x0f), caller));
        assert!(!TokenLockRequestStore::set_tx_info(&store, id, B256::repeat_byte(0x1f), caller));

        let stored = TokenLockRequestStore::get_by_id(&store, id).unwrap();
        assert_eq!(stored.tx_hash, Some(B256::repeat_byte(0x0f)));
        assert_eq!(stored.token_sender_address, Some(caller));
    }

    #[test]
    fn tx_info_attach_fails_for_unknown_id() {
        let store = InMemoryStore::new();
        let missing = TokenLockRequestId(Uuid::from_u128(9));
        assert!(!TokenLockRequestStore::set_tx_info(&store, missing, B256::ZERO, Address::ZERO));
    }

    #[test]
    fn contract_address_set_is_idempotent() {
        let store = InMemoryStore::new();
        let id = DeploymentRequestId(Uuid::from_u128(2));
        DeploymentRequestStore::store(
            &store,
            DeploymentRequest {
                id,
                project_id: ProjectId(Uuid::nil()),
                chain_id: ChainId(1),
                contract_data: Bytes::from_static(b"\x60\x60"),
                initial_eth_amount: U256::ZERO,
                deployer_address: None,
                contract_address: None,
                tx_hash: None,
                arbitrary_data: None,
                created_at: datetime!(2024-05-01 12:00 UTC),
            },
        );

        let deployed = Address::repeat_byte(0xcd);
        assert!(store.set_contract_address(id, deployed));
        assert!(store.set_contract_address(id, deployed));
        assert!(!store.set_contract_address(id, Address::repeat_byte(0xce)));
    }

    #[test]
    fn list_by_project_filters_and_orders() {
        let store = InMemoryStore::new();
        let project = ProjectId(Uuid::from_u128(7));

        let mut first = lock_request(Uuid::from_u128(10));
        first.project_id = project;
        first.created_at = datetime!(2024-05-01 10:00 UTC);
        let mut second = lock_request(Uuid::from_u128(11));
        second.project_id = project;
        second.created_at = datetime!(2024-05-01 11:00 UTC);
        let other = lock_request(Uuid::from_u128(12));

        TokenLockRequestStore::store(&store, second.clone());
        TokenLockRequestStore::store(&store, first.clone());
        TokenLockRequestStore::store(&store, other);

        let listed = TokenLockRequestStore::list_by_project(&store, project);
        assert_eq!(listed, vec![first, second]);
    }
}
