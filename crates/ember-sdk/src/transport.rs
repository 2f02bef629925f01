//! Transport layer for JSON-RPC communication.
//!
//! A [`Transport`] carries single requests and batches. Batch responses
//! may arrive in any order; the transport re-keys them by response id and
//! returns results in request order, with per-entry errors embedded so
//! the caller decides what to do with partial failures.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::classify::{classify_rpc_error, classify_rpc_value};
use crate::error::ClientError;

/// One entry of a batch request. The context rides along so per-entry
/// error classification can fold transaction data into the error record.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    /// RPC method name
    pub method: String,
    /// Positional parameters
    pub params: Vec<Value>,
    /// Caller context attached to classified errors
    pub context: Option<Value>,
}

impl BatchEntry {
    /// Create an entry without context
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self { method: method.into(), params, context: None }
    }

    /// Attach caller context
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }
}

/// Object-safe transport trait
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one RPC request and return the result member
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, ClientError>;

    /// Send a batch. The outer error covers transport-level failure;
    /// per-entry errors are embedded in the slots, in request order.
    async fn request_batch(
        &self,
        entries: Vec<BatchEntry>,
    ) -> Result<Vec<Result<Value, ClientError>>, ClientError>;
}

/// Re-key raw batch responses by id into request order.
///
/// `ids[i]` is the request id assigned to `entries[i]`. Responses with
/// unknown ids are dropped; missing responses surface as per-entry
/// server errors.
pub fn order_batch_responses(
    ids: &[u64],
    raw: Vec<Value>,
    entries: &[BatchEntry],
) -> Vec<Result<Value, ClientError>> {
    let position_by_id: HashMap<u64, usize> =
        ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
    let mut slots: Vec<Option<Result<Value, ClientError>>> = (0..ids.len()).map(|_| None).collect();

    for response in raw {
        let Some(position) = response
            .get("id")
            .and_then(Value::as_u64)
            .and_then(|id| position_by_id.get(&id).copied())
        else {
            continue;
        };

        let outcome = match response.get("error") {
            Some(error) if !error.is_null() => {
                let mut classified = classify_rpc_value(error, &entries[position].method);
                if let Some(context) = &entries[position].context {
                    classified = classified.with_transaction(context.clone());
                }
                Err(classified)
            }
            _ => match response.get("result") {
                Some(result) => Ok(result.clone()),
                None => Err(ClientError::ServerError {
                    rpc_code: -32603,
                    message: "response carries neither result nor error".to_string(),
                    url: None,
                }),
            },
        };
        slots[position] = Some(outcome);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            slot.unwrap_or_else(|| {
                Err(ClientError::ServerError {
                    rpc_code: -32603,
                    message: format!("no response for batch entry {}", i),
                    url: None,
                })
            })
        })
        .collect()
}

/// HTTP transport over reqwest
#[cfg(feature = "http")]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    request_id: std::sync::atomic::AtomicU64,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Create a transport for the given endpoint, 30 s request timeout
    pub fn new(url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.to_string(),
            request_id: std::sync::atomic::AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, std::sync::atomic::Ordering::SeqCst)
    }

    fn tag_url(&self, mut error: ClientError) -> ClientError {
        if let ClientError::ServerError { url, .. } = &mut error {
            *url = Some(self.url.clone());
        }
        error
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for HttpTransport {
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, ClientError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": self.next_id(),
            "method": method,
            "params": params,
        });

        let response = self.client.post(&self.url).json(&payload).send().await?;
        let body: Value = response.json().await?;

        if let Some(error) = body.get("error") {
            if !error.is_null() {
                return Err(self.tag_url(classify_rpc_value(error, method)));
            }
        }

        match body.get("result") {
            Some(result) => Ok(result.clone()),
            None => Err(ClientError::ServerError {
                rpc_code: -32603,
                message: "response carries no result".to_string(),
                url: Some(self.url.clone()),
            }),
        }
    }

    async fn request_batch(
        &self,
        entries: Vec<BatchEntry>,
    ) -> Result<Vec<Result<Value, ClientError>>, ClientError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<u64> = entries.iter().map(|_| self.next_id()).collect();
        let payload: Vec<Value> = ids
            .iter()
            .zip(entries.iter())
            .map(|(id, entry)| {
                json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "method": entry.method,
                    "params": entry.params,
                })
            })
            .collect();

        let response = self.client.post(&self.url).json(&payload).send().await?;
        let body: Value = response.json().await?;
        let raw = match body {
            Value::Array(items) => items,
            other => {
                // some servers report a top-level error object instead
                if let Some(error) = other.get("error") {
                    return Err(self.tag_url(classify_rpc_value(error, "batch")));
                }
                return Err(ClientError::BadData {
                    message: "batch response is not an array".to_string(),
                });
            }
        };

        Ok(order_batch_responses(&ids, raw, &entries))
    }
}

/// Mock transport for testing.
///
/// Per-method responses with sensible defaults; queued responses drain
/// first so polling flows can see state change between calls.
pub struct MockTransport {
    responses: Mutex<HashMap<String, Value>>,
    queued: Mutex<HashMap<String, VecDeque<Value>>>,
    errors: Mutex<HashMap<String, (i64, String, Option<String>)>>,
    defaults: HashMap<String, Value>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl MockTransport {
    /// Create a mock with default responses for the common methods
    pub fn new() -> Self {
        let mut defaults = HashMap::new();
        defaults.insert("eth_chainId".to_string(), json!("0x1"));
        defaults.insert("eth_gasPrice".to_string(), json!("0x3b9aca00")); // 1 gwei
        defaults.insert("eth_blockNumber".to_string(), json!("0x100"));
        defaults.insert("eth_getBalance".to_string(), json!("0xde0b6b3a7640000")); // 1 ETH
        defaults.insert("eth_getTransactionCount".to_string(), json!("0x0"));
        defaults.insert("eth_estimateGas".to_string(), json!("0x5208")); // 21000
        defaults.insert(
            "eth_sendRawTransaction".to_string(),
            json!("0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b"),
        );
        defaults.insert("eth_call".to_string(), json!("0x"));
        defaults.insert("eth_getCode".to_string(), json!("0x"));
        defaults.insert("eth_getTransactionReceipt".to_string(), Value::Null);
        defaults.insert("eth_getTransactionByHash".to_string(), Value::Null);
        defaults.insert(
            "eth_getBlockByNumber".to_string(),
            json!({
                "number": "0x100",
                "hash": "0x2222222222222222222222222222222222222222222222222222222222222222",
                "timestamp": "0x5f5e100",
                "baseFeePerGas": "0x3b9aca00",
                "transactions": [],
            }),
        );
        defaults.insert("eth_getLogs".to_string(), json!([]));

        Self {
            responses: Mutex::new(HashMap::new()),
            queued: Mutex::new(HashMap::new()),
            errors: Mutex::new(HashMap::new()),
            defaults,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Set a fixed response for a method
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    pub fn set_response(&self, method: &str, response: Value) {
        self.responses
            .lock()
            .expect("MockTransport mutex poisoned")
            .insert(method.to_string(), response);
    }

    /// Queue a one-shot response; queued responses drain before fixed
    /// ones
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn push_response(&self, method: &str, response: Value) {
        self.queued
            .lock()
            .expect("MockTransport mutex poisoned")
            .entry(method.to_string())
            .or_default()
            .push_back(response);
    }

    /// Make a method fail with the given RPC error
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn set_error(&self, method: &str, code: i64, message: &str) {
        self.errors
            .lock()
            .expect("MockTransport mutex poisoned")
            .insert(method.to_string(), (code, message.to_string(), None));
    }

    /// Make a method fail with an RPC error carrying revert data
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn set_error_with_data(&self, method: &str, code: i64, message: &str, data: &str) {
        self.errors
            .lock()
            .expect("MockTransport mutex poisoned")
            .insert(method.to_string(), (code, message.to_string(), Some(data.to_string())));
    }

    /// The calls observed so far, in order
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().expect("MockTransport mutex poisoned").clone()
    }

    fn serve(&self, method: &str, params: Vec<Value>) -> Result<Value, ClientError> {
        self.calls
            .lock()
            .map_err(|_| ClientError::UnknownError { message: "mock lock poisoned".into() })?
            .push((method.to_string(), params));

        let queued = self
            .queued
            .lock()
            .map_err(|_| ClientError::UnknownError { message: "mock lock poisoned".into() })?
            .get_mut(method)
            .and_then(VecDeque::pop_front);
        if let Some(response) = queued {
            return Ok(response);
        }

        let error = self
            .errors
            .lock()
            .map_err(|_| ClientError::UnknownError { message: "mock lock poisoned".into() })?
            .get(method)
            .cloned();
        if let Some((code, message, data)) = error {
            return Err(classify_rpc_error(code, &message, data.as_deref(), method));
        }

        let custom = self
            .responses
            .lock()
            .map_err(|_| ClientError::UnknownError { message: "mock lock poisoned".into() })?
            .get(method)
            .cloned();
        if let Some(response) = custom {
            return Ok(response);
        }

        if let Some(response) = self.defaults.get(method) {
            return Ok(response.clone());
        }

        Err(ClientError::ServerError {
            rpc_code: -32601,
            message: format!("method not found: {}", method),
            url: None,
        })
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, ClientError> {
        self.serve(method, params)
    }

    async fn request_batch(
        &self,
        entries: Vec<BatchEntry>,
    ) -> Result<Vec<Result<Value, ClientError>>, ClientError> {
        Ok(entries
            .into_iter()
            .map(|entry| {
                self.serve(&entry.method, entry.params).map_err(|e| match &entry.context {
                    Some(context) => e.with_transaction(context.clone()),
                    None => e,
                })
            })
            .collect())
    }
}
