//! Per-request-type services: thin policies over the shared reconcilers.
//!
//! Each service adapts its stored record into reconciler inputs (the expected
//! field set or the message challenge) and maps the generic outcome into a
//! typed view. Creation validation, HTTP, and persistence internals are
//! external; these services only orchestrate.

pub mod balance;
pub mod call;
pub mod common;
pub mod deploy;
pub mod lock;
pub mod login;

pub use balance::{BalanceService, BalanceView, CreateBalanceRequest};
pub use call::{CreateFunctionCallRequest, FunctionCallService};
pub use common::{RequestContext, WithFunctionData, WithTransactionData};
pub use deploy::{CreateDeploymentRequest, DeploymentService};
pub use lock::{CreateTokenLockRequest, TokenLockService};
pub use login::{CreateLoginRequest, LoginService, VerifiedLogin};
