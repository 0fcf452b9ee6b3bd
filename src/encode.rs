use alloy_primitives::Bytes;

use crate::types::FunctionArgument;

/// ABI encoding boundary, implemented outside this crate.
///
/// The request services call this at read time to re-derive expected call data
/// from the stored function name and arguments. Comparing against freshly
/// encoded bytes instead of stored ones means tampering with persisted
/// parameters shows up as a FAILED status rather than passing silently.
pub trait FunctionEncoder: Send + Sync {
    fn encode_function_call(&self, name: &str, args: &[FunctionArgument]) -> Bytes;
}
