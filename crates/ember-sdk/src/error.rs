//! SDK error taxonomy.
//!
//! Every failure surfaces as a [`ClientError`] variant from a closed set
//! of kinds. Errors are the only value-carrying failure channel; no
//! operation returns a sentinel. Private key material never appears in
//! any payload.

use serde_json::{json, Value};
use thiserror::Error;

use ember_abi::AbiError;
use ember_crypto::CryptoError;
use ember_primitives::PrimitiveError;

/// The closed set of error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Node reported reverted execution
    CallException,
    /// Sender balance cannot cover value + gas
    InsufficientFunds,
    /// Nonce already consumed (or otherwise unusable)
    NonceExpired,
    /// Replacement transaction underpriced
    ReplacementUnderpriced,
    /// A different transaction was mined at this sender/nonce
    TransactionReplaced,
    /// Any other RPC-level error
    ServerError,
    /// Connect failure at the HTTP layer
    NetworkError,
    /// Poll or HTTP deadline exceeded
    Timeout,
    /// ABI shape or length violation
    BadData,
    /// Caller-supplied value fails a precondition
    InvalidArgument,
    /// Operation requires an absent collaborator
    UnsupportedOperation,
    /// Cooperative cancellation at caller request
    Cancelled,
    /// Fallback wrapper
    UnknownError,
}

impl ErrorKind {
    /// Stable string code for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::CallException => "CALL_EXCEPTION",
            ErrorKind::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorKind::NonceExpired => "NONCE_EXPIRED",
            ErrorKind::ReplacementUnderpriced => "REPLACEMENT_UNDERPRICED",
            ErrorKind::TransactionReplaced => "TRANSACTION_REPLACED",
            ErrorKind::ServerError => "SERVER_ERROR",
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::BadData => "BAD_DATA",
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::UnsupportedOperation => "UNSUPPORTED_OPERATION",
            ErrorKind::Cancelled => "CANCELLED",
            ErrorKind::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SDK error with structured context
#[derive(Debug, Error)]
pub enum ClientError {
    /// Node reported reverted execution (eth_call / estimateGas /
    /// sendTransaction)
    #[error("execution reverted during {action}{}", fmt_reason(.reason))]
    CallException {
        /// The operation that reverted
        action: String,
        /// Parsed revert reason, when the data carried one
        reason: Option<String>,
        /// Raw revert data, 0x-hex
        data: Option<String>,
        /// The transaction or call that was attempted
        transaction: Option<Value>,
        /// RPC error code reported by the node
        rpc_code: Option<i64>,
    },

    /// Sender balance cannot cover value + gas
    #[error("insufficient funds: {message}")]
    InsufficientFunds {
        /// Node-reported detail
        message: String,
        /// The transaction that was attempted
        transaction: Option<Value>,
    },

    /// Nonce already consumed
    #[error("{message}")]
    NonceExpired {
        /// Normalized message
        message: String,
        /// The transaction that was attempted
        transaction: Option<Value>,
    },

    /// Replacement transaction underpriced
    #[error("replacement transaction underpriced")]
    ReplacementUnderpriced {
        /// The transaction that was attempted
        transaction: Option<Value>,
    },

    /// A different transaction was mined at this sender/nonce
    #[error("transaction was {reason}")]
    TransactionReplaced {
        /// What happened: "cancelled", "replaced", or "repriced"
        reason: String,
        /// Hash of the transaction that was displaced
        hash: String,
    },

    /// Any other RPC-level error
    #[error("server error {rpc_code}: {message}")]
    ServerError {
        /// JSON-RPC error code
        rpc_code: i64,
        /// Node-reported message
        message: String,
        /// Request URL, when known
        url: Option<String>,
    },

    /// Connect failure at the HTTP layer
    #[error("network error: {message}")]
    NetworkError {
        /// Transport-level detail
        message: String,
    },

    /// Poll or HTTP deadline exceeded
    #[error("timed out after {seconds}s waiting for {operation}")]
    Timeout {
        /// What was being waited on
        operation: String,
        /// The deadline that elapsed
        seconds: u64,
    },

    /// ABI decode/encode failed shape or length checks
    #[error("bad data: {message}")]
    BadData {
        /// What was malformed
        message: String,
    },

    /// Caller-supplied value fails a precondition
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Which precondition failed
        message: String,
    },

    /// Operation requires a collaborator that is absent
    #[error("unsupported operation {operation}: {message}")]
    UnsupportedOperation {
        /// The operation that was attempted
        operation: String,
        /// What was missing
        message: String,
    },

    /// Cooperative cancellation at caller request
    #[error("cancelled: {operation}")]
    Cancelled {
        /// The operation that was cancelled
        operation: String,
    },

    /// Fallback wrapper
    #[error("unknown error: {message}")]
    UnknownError {
        /// Whatever detail is available
        message: String,
    },
}

fn fmt_reason(reason: &Option<String>) -> String {
    match reason {
        Some(r) => format!(": {}", r),
        None => String::new(),
    }
}

impl ClientError {
    /// The kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::CallException { .. } => ErrorKind::CallException,
            ClientError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            ClientError::NonceExpired { .. } => ErrorKind::NonceExpired,
            ClientError::ReplacementUnderpriced { .. } => ErrorKind::ReplacementUnderpriced,
            ClientError::TransactionReplaced { .. } => ErrorKind::TransactionReplaced,
            ClientError::ServerError { .. } => ErrorKind::ServerError,
            ClientError::NetworkError { .. } => ErrorKind::NetworkError,
            ClientError::Timeout { .. } => ErrorKind::Timeout,
            ClientError::BadData { .. } => ErrorKind::BadData,
            ClientError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            ClientError::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
            ClientError::Cancelled { .. } => ErrorKind::Cancelled,
            ClientError::UnknownError { .. } => ErrorKind::UnknownError,
        }
    }

    /// Stable string code
    pub fn code(&self) -> &'static str {
        self.kind().as_str()
    }

    /// One-line summary without embedded context
    pub fn short_message(&self) -> String {
        match self {
            ClientError::CallException { reason: Some(r), .. } => {
                format!("execution reverted: {}", r)
            }
            ClientError::CallException { .. } => "execution reverted".to_string(),
            ClientError::NonceExpired { message, .. } => message.clone(),
            ClientError::Timeout { operation, .. } => format!("timed out waiting for {}", operation),
            other => other.to_string(),
        }
    }

    /// Structured context as a JSON object
    pub fn info(&self) -> Value {
        let mut obj = serde_json::Map::new();
        obj.insert("code".into(), json!(self.code()));
        match self {
            ClientError::CallException { action, reason, data, transaction, rpc_code } => {
                obj.insert("action".into(), json!(action));
                if let Some(reason) = reason {
                    obj.insert("reason".into(), json!(reason));
                }
                if let Some(data) = data {
                    obj.insert("data".into(), json!(data));
                }
                if let Some(tx) = transaction {
                    obj.insert("transaction".into(), tx.clone());
                }
                if let Some(code) = rpc_code {
                    obj.insert("rpcCode".into(), json!(code));
                }
            }
            ClientError::InsufficientFunds { transaction, .. }
            | ClientError::NonceExpired { transaction, .. }
            | ClientError::ReplacementUnderpriced { transaction } => {
                if let Some(tx) = transaction {
                    obj.insert("transaction".into(), tx.clone());
                }
            }
            ClientError::TransactionReplaced { reason, hash } => {
                obj.insert("reason".into(), json!(reason));
                obj.insert("hash".into(), json!(hash));
            }
            ClientError::ServerError { rpc_code, url, .. } => {
                obj.insert("rpcCode".into(), json!(rpc_code));
                if let Some(url) = url {
                    obj.insert("url".into(), json!(url));
                }
            }
            ClientError::Timeout { operation, seconds } => {
                obj.insert("operation".into(), json!(operation));
                obj.insert("seconds".into(), json!(seconds));
            }
            _ => {}
        }
        Value::Object(obj)
    }

    /// Attach the attempted transaction to revert-class errors; other
    /// kinds pass through untouched
    pub fn with_transaction(mut self, tx: Value) -> Self {
        match &mut self {
            ClientError::CallException { transaction, .. }
            | ClientError::InsufficientFunds { transaction, .. }
            | ClientError::NonceExpired { transaction, .. }
            | ClientError::ReplacementUnderpriced { transaction } => {
                *transaction = Some(tx);
            }
            _ => {}
        }
        self
    }

    /// Shorthand constructors used across the SDK
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ClientError::InvalidArgument { message: message.into() }
    }

    /// Shorthand for an `UnsupportedOperation` error
    pub fn unsupported(operation: impl Into<String>, message: impl Into<String>) -> Self {
        ClientError::UnsupportedOperation {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a caller-requested cancellation
    pub fn cancelled(operation: impl Into<String>) -> Self {
        ClientError::Cancelled { operation: operation.into() }
    }
}

impl From<AbiError> for ClientError {
    fn from(e: AbiError) -> Self {
        match e {
            AbiError::BadData(message) => ClientError::BadData { message },
            AbiError::InvalidArgument(message) => ClientError::InvalidArgument { message },
        }
    }
}

impl From<CryptoError> for ClientError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::InvalidPrivateKey => ClientError::InvalidArgument {
                message: "invalid private key".to_string(),
            },
            other => ClientError::UnknownError { message: other.to_string() },
        }
    }
}

impl From<PrimitiveError> for ClientError {
    fn from(e: PrimitiveError) -> Self {
        ClientError::InvalidArgument { message: e.to_string() }
    }
}

impl From<ember_primitives::HexError> for ClientError {
    fn from(e: ember_primitives::HexError) -> Self {
        ClientError::InvalidArgument { message: e.to_string() }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::BadData { message: e.to_string() }
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout { operation: "http request".to_string(), seconds: 30 }
        } else {
            ClientError::NetworkError { message: e.to_string() }
        }
    }
}
