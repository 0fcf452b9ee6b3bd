//! Status reconciliation for stored blockchain action intents.
//!
//! A client registers an intent tied to an on-chain action (a balance proof, an
//! ERC-20 token lock, a contract function call, a contract deployment, or a
//! wallet login challenge) and later asks "what happened?". The answer is never
//! stored: every read recomputes a PENDING / FAILED / SUCCESS status from the
//! persisted intent plus live chain data, with field-level verification so that
//! an unrelated but mined transaction hash cannot masquerade as the intended
//! action.
//!
//! The core lives in [`reconcile`]: [`reconcile::TransactionReconciler`] for
//! hash-correlated flows and [`reconcile::SignatureReconciler`] for
//! message-signing flows. The per-request-type services in [`requests`] adapt
//! stored records into reconciler inputs and map the generic outcome into typed
//! views. Persistence ([`store`]), RPC transport ([`gateway`]), and ABI encoding
//! ([`encode`]) are consumed through traits; this crate submits no transactions
//! and caches no chain state.

pub mod config;
pub mod encode;
pub mod errors;
pub mod gateway;
pub mod providers;
pub mod reconcile;
pub mod requests;
pub mod signature;
pub mod store;
pub mod types;

pub use config::IntentsConfig;
pub use errors::{IntentError, IntentResult, LoginFailure};
pub use gateway::{ChainQueryGateway, GatewayError};
pub use reconcile::{SignatureReconciler, TransactionReconciler};
pub use signature::{EthereumSignatureVerifier, SignatureVerifier};
pub use types::{ChainId, ChainSpec, Status};
