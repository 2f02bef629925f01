//! JSON-RPC error classification.
//!
//! Node implementations disagree on codes and wording, so the dispatcher
//! scans both. Rule order is fixed: revert, insufficient funds, the nonce
//! family, replacement underpriced, then the generic server error. Every
//! (code, message) pair maps to exactly one kind.

use serde_json::Value;

use ember_abi::{DecodedError, Interface};
use ember_primitives::hex_ops;

use crate::error::ClientError;

/// EIP-1474 "execution reverted" code
const CODE_EXECUTION_REVERTED: i64 = 3;

/// Classify a JSON-RPC error response into a [`ClientError`].
///
/// `action` names the request that failed (usually the RPC method);
/// `data` is the revert payload from the error object, when present.
pub fn classify_rpc_error(
    code: i64,
    message: &str,
    data: Option<&str>,
    action: &str,
) -> ClientError {
    let lowered = message.to_lowercase();

    // revert first: code 3 is explicit, and geth-style nodes report
    // reverts under -32000 with revert data or a revert marker
    let has_revert_data = data.map(|d| !hex_ops::strip_prefix(d).is_empty()).unwrap_or(false);
    if code == CODE_EXECUTION_REVERTED || has_revert_data || lowered.contains("revert") {
        let reason = data.and_then(decode_reason);
        return ClientError::CallException {
            action: action.to_string(),
            reason,
            data: data.map(|d| d.to_string()),
            transaction: None,
            rpc_code: Some(code),
        };
    }

    if lowered.contains("insufficient funds")
        || lowered.contains("insufficient balance")
        || lowered.contains("not enough")
        || lowered.contains("gas required exceeds allowance")
    {
        return ClientError::InsufficientFunds { message: message.to_string(), transaction: None };
    }

    if lowered.contains("nonce too low")
        || lowered.contains("already been used")
        || lowered.contains("nonce too high")
        || lowered.contains("invalid nonce")
    {
        return ClientError::NonceExpired {
            message: "nonce has already been used".to_string(),
            transaction: None,
        };
    }

    if lowered.contains("replacement transaction underpriced") {
        return ClientError::ReplacementUnderpriced { transaction: None };
    }

    ClientError::ServerError { rpc_code: code, message: message.to_string(), url: None }
}

/// Classify the error member of a JSON-RPC response object
pub fn classify_rpc_value(error: &Value, action: &str) -> ClientError {
    let code = error.get("code").and_then(Value::as_i64).unwrap_or(-32603);
    let message = error.get("message").and_then(Value::as_str).unwrap_or("missing error message");
    let data = error.get("data").and_then(Value::as_str);
    classify_rpc_error(code, message, data, action)
}

/// Pull an `Error(string)` reason out of 0x-hex revert data
fn decode_reason(data: &str) -> Option<String> {
    let bytes = hex_ops::hex_to_bytes(data).ok()?;
    // an empty interface still decodes the standard revert
    let empty = Interface::new(Vec::new());
    match empty.decode_error_result(&bytes) {
        Ok(DecodedError::Revert { reason }) => Some(reason),
        _ => None,
    }
}
