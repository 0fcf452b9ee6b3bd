#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy_primitives::{eip191_hash_message, hex, Address, Bytes, B256, U256};
use async_trait::async_trait;
use k256::ecdsa::SigningKey;
use time::macros::datetime;
use time::OffsetDateTime;

use chain_intents::encode::FunctionEncoder;
use chain_intents::gateway::{ChainQueryGateway, GatewayError};
use chain_intents::providers::Clock;
use chain_intents::types::{BlockRef, ChainSpec, EventSelector, FunctionArgument, MinedTransaction};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Gateway stub serving one scripted mined transaction and fixed balances,
/// counting how often the chain is actually queried.
#[derive(Default)]
pub struct StubGateway {
    mined: Mutex<Option<MinedTransaction>>,
    serve_any_hash: AtomicBool,
    pub native_balance: U256,
    pub token_balance: U256,
    pub fetch_count: AtomicUsize,
}

impl StubGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balances(native: U256, token: U256) -> Self {
        Self {
            native_balance: native,
            token_balance: token,
            ..Self::default()
        }
    }

    pub fn set_mined(&self, tx: Option<MinedTransaction>) {
        *self.mined.lock().unwrap() = tx;
    }

    /// Serve the scripted transaction for any queried hash, simulating a
    /// misbehaving node that answers with an unrelated transaction.
    pub fn serve_any_hash(&self) {
        self.serve_any_hash.store(true, Ordering::SeqCst);
    }

    pub fn fetches(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainQueryGateway for StubGateway {
    async fn fetch_transaction(
        &self,
        _chain: &ChainSpec,
        tx_hash: B256,
        _events: &[EventSelector],
    ) -> Result<Option<MinedTransaction>, GatewayError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let mined = self.mined.lock().unwrap().clone();
        if self.serve_any_hash.load(Ordering::SeqCst) {
            return Ok(mined);
        }
        Ok(mined.filter(|tx| tx.hash == tx_hash))
    }

    async fn fetch_native_balance(
        &self,
        _chain: &ChainSpec,
        _wallet: Address,
        _block: BlockRef,
    ) -> Result<U256, GatewayError> {
        Ok(self.native_balance)
    }

    async fn fetch_token_balance(
        &self,
        _chain: &ChainSpec,
        _token: Address,
        _wallet: Address,
        _block: BlockRef,
    ) -> Result<U256, GatewayError> {
        Ok(self.token_balance)
    }
}

/// Deterministic encoder: distinct name or argument lists yield distinct
/// bytes, which is all the reconciliation checks care about.
pub struct JsonEncoder;

impl FunctionEncoder for JsonEncoder {
    fn encode_function_call(&self, name: &str, args: &[FunctionArgument]) -> Bytes {
        let payload = serde_json::json!({ "function": name, "args": args });
        Bytes::from(serde_json::to_vec(&payload).expect("encode call"))
    }
}

/// Clock whose readings the test controls.
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: time::Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap()
    }
}

pub fn test_signing_key() -> SigningKey {
    SigningKey::from_slice(&[0x01; 32]).expect("valid key")
}

pub fn wallet_address(key: &SigningKey) -> Address {
    Address::from_public_key(key.verifying_key())
}

/// Produces the hex signature a `personal_sign` wallet would return for the
/// given plaintext.
pub fn sign_message(key: &SigningKey, message: &str) -> String {
    let digest = eip191_hash_message(message.as_bytes());
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(digest.as_slice())
        .expect("sign");
    let mut bytes = signature.to_bytes().to_vec();
    bytes.push(27 + recovery_id.to_byte());
    hex::encode_prefixed(bytes)
}

pub fn mined_tx(hash: B256) -> MinedTransaction {
    MinedTransaction {
        hash,
        from: Address::repeat_byte(0xaa),
        to: Address::repeat_byte(0xbb),
        deployed_contract_address: None,
        data: Bytes::new(),
        value: U256::ZERO,
        block_confirmations: 12,
        timestamp: datetime!(2024-05-01 12:00 UTC),
        success: true,
        events: Vec::new(),
    }
}
