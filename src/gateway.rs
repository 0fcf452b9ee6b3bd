use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use thiserror::Error;

use crate::types::{BlockRef, ChainId, ChainSpec, EventSelector, MinedTransaction};

/// Infrastructure failures from the chain client. These are outside the
/// reconciliation taxonomy and propagate to the caller unchanged; the
/// reconcilers never retry or classify them.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("rpc transport error: {0}")]
    Transport(String),
    #[error("chain id {0} not supported and no custom rpc url given")]
    UnsupportedChain(ChainId),
}

/// Read-only access to chain state, consumed by the reconcilers and the
/// balance policy. Implementations live outside this crate.
///
/// No caching, retries, or deadlines are expected here beyond what the
/// transport itself applies; every reconciliation re-reads current state.
#[async_trait]
pub trait ChainQueryGateway: Send + Sync {
    /// Fetches receipt-level facts for a mined transaction, decoding log
    /// payloads with the given selectors. `Ok(None)` means the transaction is
    /// not yet mined.
    ///
    /// Contract-creation transactions are reported with `to` set to the zero
    /// address and `deployed_contract_address` taken from the receipt.
    async fn fetch_transaction(
        &self,
        chain: &ChainSpec,
        tx_hash: B256,
        events: &[EventSelector],
    ) -> Result<Option<MinedTransaction>, GatewayError>;

    /// Native-asset balance of `wallet` at the given block.
    async fn fetch_native_balance(
        &self,
        chain: &ChainSpec,
        wallet: Address,
        block: BlockRef,
    ) -> Result<U256, GatewayError>;

    /// ERC-20 balance of `wallet` for the given token contract.
    async fn fetch_token_balance(
        &self,
        chain: &ChainSpec,
        token: Address,
        wallet: Address,
        block: BlockRef,
    ) -> Result<U256, GatewayError>;
}
