use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// EVM chain identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Which network and endpoint to query. Equality by value; a custom RPC URL
/// overrides whatever default the gateway knows for the chain id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSpec {
    pub chain_id: ChainId,
    pub custom_rpc_url: Option<String>,
}

/// Outcome of a single reconciliation pass. Never persisted; recomputed on
/// every read because chain state changes outside this system's control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pending,
    Failed,
    Success,
}

/// An expected transaction field that is either compared against the mined
/// value or deliberately skipped.
///
/// The explicit `Unchecked` variant keeps "caller address intentionally
/// unconstrained" visible at the type level instead of hiding it behind an
/// uninitialized option.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldCheck<T> {
    Checked(T),
    Unchecked,
}

impl<T: PartialEq> FieldCheck<T> {
    /// True when the field is unchecked or the actual value equals the
    /// expected one.
    pub fn matches(&self, actual: &T) -> bool {
        match self {
            FieldCheck::Checked(expected) => expected == actual,
            FieldCheck::Unchecked => true,
        }
    }
}

impl<T> From<Option<T>> for FieldCheck<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => FieldCheck::Checked(inner),
            None => FieldCheck::Unchecked,
        }
    }
}

/// Block parameter for balance queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockRef {
    Latest,
    Number(u64),
}

impl Default for BlockRef {
    fn default() -> Self {
        BlockRef::Latest
    }
}

/// Receipt-level facts about a mined transaction, as reported by the chain
/// gateway. Absent entirely while the transaction is still pending.
///
/// For contract-creation transactions the node reports no `to` address; the
/// gateway maps that to [`Address::ZERO`] and fills `deployed_contract_address`
/// from the receipt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinedTransaction {
    pub hash: B256,
    pub from: Address,
    pub to: Address,
    pub deployed_contract_address: Option<Address>,
    pub data: Bytes,
    pub value: U256,
    pub block_confirmations: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub success: bool,
    pub events: Vec<DecodedEvent>,
}

/// A log entry decoded with one of the supplied event selectors. Events the
/// gateway cannot match stay undecoded with a `None` signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedEvent {
    pub signature: Option<String>,
    pub arguments: Vec<EventArgument>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventArgument {
    pub name: String,
    pub value: String,
}

/// Describes an event the gateway should attempt to decode from transaction
/// logs. Interpretation of the signature is the gateway's concern.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSelector {
    pub signature: String,
}

/// A value handed to the excluded function encoder. Function call data is
/// re-encoded from these at read time instead of trusting stored bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FunctionArgument {
    Address(Address),
    Uint(U256),
    String(String),
    Bytes(Bytes),
    Bool(bool),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchecked_field_matches_anything() {
        let check: FieldCheck<Address> = FieldCheck::Unchecked;
        assert!(check.matches(&Address::ZERO));
        assert!(check.matches(&Address::repeat_byte(0xde)));
    }

    #[test]
    fn checked_field_requires_equality() {
        let expected = Address::repeat_byte(0x11);
        let check = FieldCheck::Checked(expected);
        assert!(check.matches(&expected));
        assert!(!check.matches(&Address::repeat_byte(0x22)));
    }

    #[test]
    fn status_serializes_screaming_case() {
        assert_eq!(
            serde_json::to_string(&Status::Pending).unwrap(),
            "\"PENDING\""
        );
        assert_eq!(serde_json::to_string(&Status::Failed).unwrap(), "\"FAILED\"");
        assert_eq!(
            serde_json::to_string(&Status::Success).unwrap(),
            "\"SUCCESS\""
        );
    }

    #[test]
    fn chain_spec_equality_by_value() {
        let a = ChainSpec {
            chain_id: ChainId(137),
            custom_rpc_url: Some("https://rpc.example.com".into()),
        };
        assert_eq!(a, a.clone());
        let b = ChainSpec {
            chain_id: ChainId(137),
            custom_rpc_url: None,
        };
        assert_ne!(a, b);
    }
}
