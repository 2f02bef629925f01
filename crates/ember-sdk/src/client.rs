//! JSON-RPC client.
//!
//! `Client` wraps a [`Transport`] with typed method wrappers, a
//! race-free chain-id cache, batching, and receipt polling. It holds no
//! other state, so one instance can be shared across tasks.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use serde_json::{json, Value};

use ember_primitives::{hex_ops, Address, H256, U256};

use crate::error::ClientError;
use crate::transport::{BatchEntry, MockTransport, Transport};
use crate::types::{parse_block, parse_log, parse_receipt, Block, BlockId, CallRequest, LogFilter, Log, Receipt};

#[cfg(feature = "http")]
use crate::transport::HttpTransport;

/// JSON-RPC client over a pluggable transport
pub struct Client {
    transport: Arc<dyn Transport>,
    chain_id: OnceLock<u64>,
}

impl Client {
    /// Create a client over any transport
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    /// Create a client over a shared transport
    pub fn from_arc(transport: Arc<dyn Transport>) -> Self {
        Self { transport, chain_id: OnceLock::new() }
    }

    /// Create a client with a mock transport (for testing)
    pub fn new_mock() -> Self {
        Self::new(MockTransport::new())
    }

    /// Connect over HTTP and eagerly cache the chain id
    #[cfg(feature = "http")]
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let client = Self::new(HttpTransport::new(url));
        client.chain_id().await?;
        Ok(client)
    }

    /// The underlying transport
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, ClientError> {
        let value = self.transport.request_json(method, params).await?;
        serde_json::from_value(value)
            .map_err(|e| ClientError::BadData { message: format!("{}: {}", method, e) })
    }

    // ---- chain info ----

    /// Chain id, cached after the first successful fetch
    pub async fn chain_id(&self) -> Result<u64, ClientError> {
        if let Some(id) = self.chain_id.get() {
            return Ok(*id);
        }
        let hex: String = self.request("eth_chainId", vec![]).await?;
        let id = hex_ops::hex_to_u64(&hex)?;
        // another task may have won the race; both saw the same chain
        let _ = self.chain_id.set(id);
        Ok(id)
    }

    /// Current block number
    pub async fn block_number(&self) -> Result<u64, ClientError> {
        let hex: String = self.request("eth_blockNumber", vec![]).await?;
        Ok(hex_ops::hex_to_u64(&hex)?)
    }

    /// Node gas price
    pub async fn gas_price(&self) -> Result<U256, ClientError> {
        let hex: String = self.request("eth_gasPrice", vec![]).await?;
        Ok(hex_ops::hex_to_u256(&hex)?)
    }

    // ---- account queries ----

    /// Balance of an address at a block
    pub async fn get_balance(&self, address: &Address, block: BlockId) -> Result<U256, ClientError> {
        let hex: String = self
            .request("eth_getBalance", vec![json!(address.to_hex()), json!(block)])
            .await?;
        Ok(hex_ops::hex_to_u256(&hex)?)
    }

    /// Transaction count (nonce) of an address at a block tag
    pub async fn get_transaction_count(
        &self,
        address: &Address,
        block: BlockId,
    ) -> Result<u64, ClientError> {
        let hex: String = self
            .request("eth_getTransactionCount", vec![json!(address.to_hex()), json!(block)])
            .await?;
        Ok(hex_ops::hex_to_u64(&hex)?)
    }

    /// Deployed code at an address
    pub async fn get_code(&self, address: &Address, block: BlockId) -> Result<Vec<u8>, ClientError> {
        let hex: String = self
            .request("eth_getCode", vec![json!(address.to_hex()), json!(block)])
            .await?;
        Ok(hex_ops::hex_to_bytes(&hex)?)
    }

    // ---- blocks and transactions ----

    /// Block by id; `full` controls whether transactions are expanded
    pub async fn get_block(&self, block: BlockId, full: bool) -> Result<Option<Block>, ClientError> {
        let value: Value = self
            .request("eth_getBlockByNumber", vec![json!(block), json!(full)])
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        parse_block(&value).map(Some)
    }

    /// Block by hash
    pub async fn get_block_by_hash(&self, hash: &H256, full: bool) -> Result<Option<Block>, ClientError> {
        let value: Value = self
            .request("eth_getBlockByHash", vec![json!(hash.to_hex()), json!(full)])
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        parse_block(&value).map(Some)
    }

    /// Raw transaction object by hash, `None` when the node has dropped it
    pub async fn get_transaction(&self, hash: &H256) -> Result<Option<Value>, ClientError> {
        let value: Value = self
            .request("eth_getTransactionByHash", vec![json!(hash.to_hex())])
            .await?;
        Ok(if value.is_null() { None } else { Some(value) })
    }

    /// Receipt by transaction hash, `None` while pending
    pub async fn get_transaction_receipt(
        &self,
        hash: &H256,
    ) -> Result<Option<Receipt>, ClientError> {
        let value: Value = self
            .request("eth_getTransactionReceipt", vec![json!(hash.to_hex())])
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        parse_receipt(&value).map(Some)
    }

    /// Logs matching a filter
    pub async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, ClientError> {
        let value: Value = self.request("eth_getLogs", vec![filter.to_json()]).await?;
        let entries = value
            .as_array()
            .ok_or_else(|| ClientError::BadData { message: "eth_getLogs: not an array".into() })?;
        entries.iter().map(parse_log).collect()
    }

    // ---- calls and submission ----

    /// Execute a read-only call
    pub async fn call(&self, request: &CallRequest, block: BlockId) -> Result<Vec<u8>, ClientError> {
        let hex: String = self
            .request("eth_call", vec![serde_json::to_value(request)?, json!(block)])
            .await?;
        Ok(hex_ops::hex_to_bytes(&hex)?)
    }

    /// Ask the node for a gas estimate
    pub async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, ClientError> {
        let hex: String = self
            .request("eth_estimateGas", vec![serde_json::to_value(request)?])
            .await?;
        Ok(hex_ops::hex_to_u64(&hex)?)
    }

    /// Submit a signed transaction and return its hash
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<H256, ClientError> {
        let hex: String = self
            .request("eth_sendRawTransaction", vec![json!(hex_ops::bytes_to_hex(raw))])
            .await?;
        H256::from_hex(&hex).map_err(|e| ClientError::BadData { message: e.to_string() })
    }

    /// Send a JSON-RPC batch; results come back in request order with
    /// per-entry errors embedded
    pub async fn send_batch(
        &self,
        entries: Vec<BatchEntry>,
    ) -> Result<Vec<Result<Value, ClientError>>, ClientError> {
        self.transport.request_batch(entries).await
    }

    /// Poll for a receipt every second until `confirmations` blocks have
    /// built on it or `timeout` elapses
    pub async fn wait_for_transaction(
        &self,
        hash: &H256,
        confirmations: u64,
        timeout: Duration,
    ) -> Result<Receipt, ClientError> {
        let started = Instant::now();
        loop {
            if let Some(receipt) = self.get_transaction_receipt(hash).await? {
                if confirmations <= 1 {
                    return Ok(receipt);
                }
                if let Some(included) = receipt.block_number {
                    let current = self.block_number().await?;
                    if current + 1 >= included + confirmations {
                        return Ok(receipt);
                    }
                }
            }

            if started.elapsed() > timeout {
                return Err(ClientError::Timeout {
                    operation: format!("receipt of {}", hash),
                    seconds: timeout.as_secs(),
                });
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }
}

/// Handle for a submitted transaction.
///
/// `wait` polls for the receipt and, when the sender and nonce are
/// known, reports `TRANSACTION_REPLACED` if a different transaction
/// consumed the nonce.
#[derive(Clone)]
pub struct PendingTransaction {
    hash: H256,
    client: Arc<Client>,
    from: Option<Address>,
    nonce: Option<u64>,
}

impl std::fmt::Debug for PendingTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTransaction")
            .field("hash", &self.hash)
            .field("from", &self.from)
            .field("nonce", &self.nonce)
            .finish()
    }
}

impl PendingTransaction {
    /// Wrap a submitted transaction hash
    pub fn new(hash: H256, client: Arc<Client>) -> Self {
        Self { hash, client, from: None, nonce: None }
    }

    pub(crate) fn with_sender(mut self, from: Address, nonce: u64) -> Self {
        self.from = Some(from);
        self.nonce = Some(nonce);
        self
    }

    /// The transaction hash
    pub fn hash(&self) -> &H256 {
        &self.hash
    }

    /// Wait for inclusion with the given confirmation depth.
    ///
    /// Defaults used by callers are 1 confirmation and 60 seconds. A
    /// receipt with status 0 is returned as-is for the caller to
    /// inspect.
    pub async fn wait(&self, confirmations: u64, timeout: Duration) -> Result<Receipt, ClientError> {
        let started = Instant::now();
        loop {
            if let Some(receipt) = self.client.get_transaction_receipt(&self.hash).await? {
                if confirmations <= 1 {
                    return Ok(receipt);
                }
                if let Some(included) = receipt.block_number {
                    let current = self.client.block_number().await?;
                    if current + 1 >= included + confirmations {
                        return Ok(receipt);
                    }
                }
            } else if let (Some(from), Some(nonce)) = (self.from, self.nonce) {
                // no receipt: check whether something else consumed the nonce
                let mined_nonce =
                    self.client.get_transaction_count(&from, BlockId::Latest).await?;
                if mined_nonce > nonce
                    && self.client.get_transaction(&self.hash).await?.is_none()
                {
                    return Err(ClientError::TransactionReplaced {
                        reason: "replaced".to_string(),
                        hash: self.hash.to_hex(),
                    });
                }
            }

            if started.elapsed() > timeout {
                return Err(ClientError::Timeout {
                    operation: format!("receipt of {}", self.hash),
                    seconds: timeout.as_secs(),
                });
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_chain_id_cached() {
        let transport = Arc::new(MockTransport::new());
        let client = Client::from_arc(transport.clone());

        assert_eq!(client.chain_id().await.unwrap(), 1);
        assert_eq!(client.chain_id().await.unwrap(), 1);
        // only the first call reaches the transport
        let chain_calls = transport
            .calls()
            .iter()
            .filter(|(m, _)| m == "eth_chainId")
            .count();
        assert_eq!(chain_calls, 1);
    }

    #[tokio::test]
    async fn test_get_balance() {
        let client = Client::new_mock();
        let balance = client.get_balance(&Address::ZERO, BlockId::Latest).await.unwrap();
        assert_eq!(balance, U256::from(1_000_000_000_000_000_000u128));
    }

    #[tokio::test]
    async fn test_block_tag_reaches_wire() {
        let transport = Arc::new(MockTransport::new());
        let client = Client::from_arc(transport.clone());
        client
            .get_transaction_count(&Address::ZERO, BlockId::Pending)
            .await
            .unwrap();
        let calls = transport.calls();
        assert_eq!(calls[0].1[1], json!("pending"));
    }

    #[tokio::test]
    async fn test_get_block_parses_base_fee() {
        let client = Client::new_mock();
        let block = client.get_block(BlockId::Latest, false).await.unwrap().unwrap();
        assert_eq!(block.base_fee_per_gas, Some(U256::from(1_000_000_000u64)));
    }

    #[tokio::test]
    async fn test_send_raw_transaction_returns_hash() {
        let client = Client::new_mock();
        let hash = client.send_raw_transaction(&[0x02, 0x01]).await.unwrap();
        assert_eq!(
            hash.to_hex(),
            "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b"
        );
    }

    #[tokio::test]
    async fn test_wait_for_transaction_times_out() {
        let client = Client::new_mock();
        let hash = H256::from_bytes([0x11; 32]);
        let err = client
            .wait_for_transaction(&hash, 1, Duration::from_millis(0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_wait_for_transaction_returns_receipt() {
        let transport = Arc::new(MockTransport::new());
        let client = Client::from_arc(transport.clone());
        transport.set_response(
            "eth_getTransactionReceipt",
            json!({
                "transactionHash":
                    "0x1111111111111111111111111111111111111111111111111111111111111111",
                "blockNumber": "0x10",
                "status": "0x1",
                "gasUsed": "0x5208",
            }),
        );
        let hash = H256::from_bytes([0x11; 32]);
        let receipt = client
            .wait_for_transaction(&hash, 1, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(receipt.is_success());
    }

    #[tokio::test]
    async fn test_failed_receipt_returned_as_is() {
        let transport = Arc::new(MockTransport::new());
        let client = Client::from_arc(transport.clone());
        transport.set_response(
            "eth_getTransactionReceipt",
            json!({
                "transactionHash":
                    "0x1111111111111111111111111111111111111111111111111111111111111111",
                "status": "0x0",
            }),
        );
        let hash = H256::from_bytes([0x11; 32]);
        let receipt = client
            .wait_for_transaction(&hash, 1, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(!receipt.is_success());
    }
}
