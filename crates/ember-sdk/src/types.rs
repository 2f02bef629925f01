//! Request and response types for the JSON-RPC surface.
//!
//! Quantities serialize as minimal 0x-hex; `data` and addresses pass as
//! hex strings. Response objects parse leniently since nodes disagree on
//! optional fields.

use bytes::Bytes;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use ember_primitives::{hex_ops, Address, H256, U256};

use crate::error::ClientError;

/// Block identifier for RPC queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockId {
    /// Block number
    Number(u64),
    /// Latest block
    #[default]
    Latest,
    /// Pending block (includes pending transactions)
    Pending,
    /// Earliest block (genesis)
    Earliest,
}

impl Serialize for BlockId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BlockId::Number(n) => serializer.serialize_str(&hex_ops::u64_to_quantity(*n)),
            BlockId::Latest => serializer.serialize_str("latest"),
            BlockId::Pending => serializer.serialize_str("pending"),
            BlockId::Earliest => serializer.serialize_str("earliest"),
        }
    }
}

/// Call request for eth_call and eth_estimateGas
#[derive(Debug, Clone, Default)]
pub struct CallRequest {
    /// Sender address
    pub from: Option<Address>,
    /// Recipient address
    pub to: Option<Address>,
    /// Gas limit
    pub gas: Option<u64>,
    /// Gas price (legacy)
    pub gas_price: Option<U256>,
    /// Max fee per gas (EIP-1559)
    pub max_fee_per_gas: Option<U256>,
    /// Max priority fee per gas (EIP-1559)
    pub max_priority_fee_per_gas: Option<U256>,
    /// Value to transfer
    pub value: Option<U256>,
    /// Input data
    pub data: Option<Bytes>,
}

impl Serialize for CallRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        if let Some(from) = &self.from {
            map.serialize_entry("from", &from.to_hex())?;
        }
        if let Some(to) = &self.to {
            map.serialize_entry("to", &to.to_hex())?;
        }
        if let Some(gas) = &self.gas {
            map.serialize_entry("gas", &hex_ops::u64_to_quantity(*gas))?;
        }
        if let Some(gas_price) = &self.gas_price {
            map.serialize_entry("gasPrice", &hex_ops::u256_to_quantity(*gas_price))?;
        }
        if let Some(max_fee) = &self.max_fee_per_gas {
            map.serialize_entry("maxFeePerGas", &hex_ops::u256_to_quantity(*max_fee))?;
        }
        if let Some(max_priority) = &self.max_priority_fee_per_gas {
            map.serialize_entry(
                "maxPriorityFeePerGas",
                &hex_ops::u256_to_quantity(*max_priority),
            )?;
        }
        if let Some(value) = &self.value {
            map.serialize_entry("value", &hex_ops::u256_to_quantity(*value))?;
        }
        if let Some(data) = &self.data {
            map.serialize_entry("data", &hex_ops::bytes_to_hex(data))?;
        }
        map.end()
    }
}

/// A user-supplied transaction under construction.
///
/// Unset fields are auto-filled by a bound account before signing.
/// Presence of `max_fee_per_gas` selects the EIP-1559 envelope; an empty
/// `to` means contract creation.
#[derive(Debug, Clone, Default)]
pub struct TransactionRequest {
    /// Sender address (defaults to the signing account)
    pub from: Option<Address>,
    /// Recipient address (None for contract creation)
    pub to: Option<Address>,
    /// Value to transfer in wei
    pub value: U256,
    /// Input data
    pub data: Bytes,
    /// Sender nonce
    pub nonce: Option<u64>,
    /// Gas limit
    pub gas_limit: Option<u64>,
    /// Gas price (legacy transactions)
    pub gas_price: Option<U256>,
    /// Max fee per gas (EIP-1559)
    pub max_fee_per_gas: Option<U256>,
    /// Max priority fee per gas (EIP-1559)
    pub max_priority_fee_per_gas: Option<U256>,
    /// Chain id
    pub chain_id: Option<u64>,
}

impl TransactionRequest {
    /// Whether this request targets the EIP-1559 envelope
    pub fn is_eip1559(&self) -> bool {
        self.max_fee_per_gas.is_some()
    }

    /// The eth_call / eth_estimateGas view of this request
    pub fn as_call_request(&self) -> CallRequest {
        CallRequest {
            from: self.from,
            to: self.to,
            gas: self.gas_limit,
            gas_price: self.gas_price,
            max_fee_per_gas: self.max_fee_per_gas,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            value: if self.value.is_zero() { None } else { Some(self.value) },
            data: if self.data.is_empty() { None } else { Some(self.data.clone()) },
        }
    }

    /// JSON view used for error context
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self.as_call_request()).unwrap_or(Value::Null)
    }
}

/// Log filter for eth_getLogs
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    /// Restrict to logs from this address
    pub address: Option<Address>,
    /// Topic filter; None entries are wildcards
    pub topics: Vec<Option<H256>>,
    /// Start of the block range
    pub from_block: Option<BlockId>,
    /// End of the block range
    pub to_block: Option<BlockId>,
}

impl LogFilter {
    /// The JSON filter object
    pub fn to_json(&self) -> Value {
        let mut obj = serde_json::Map::new();
        if let Some(address) = &self.address {
            obj.insert("address".into(), json!(address.to_hex()));
        }
        if !self.topics.is_empty() {
            let topics: Vec<Value> = self
                .topics
                .iter()
                .map(|t| match t {
                    Some(topic) => json!(topic.to_hex()),
                    None => Value::Null,
                })
                .collect();
            obj.insert("topics".into(), Value::Array(topics));
        }
        if let Some(from) = &self.from_block {
            obj.insert("fromBlock".into(), json!(from));
        }
        if let Some(to) = &self.to_block {
            obj.insert("toBlock".into(), json!(to));
        }
        Value::Object(obj)
    }
}

/// A log entry returned by the node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    /// Emitting contract
    pub address: Address,
    /// Indexed topics
    pub topics: Vec<H256>,
    /// Non-indexed data
    pub data: Vec<u8>,
    /// Block the log landed in
    pub block_number: Option<u64>,
    /// Transaction that emitted it
    pub transaction_hash: Option<H256>,
    /// Position within the block
    pub log_index: Option<u64>,
}

/// A transaction receipt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Transaction hash
    pub transaction_hash: H256,
    /// Position within the block
    pub transaction_index: u64,
    /// Containing block hash
    pub block_hash: Option<H256>,
    /// Containing block number
    pub block_number: Option<u64>,
    /// Sender
    pub from: Address,
    /// Recipient (None for contract creation)
    pub to: Option<Address>,
    /// Created contract address, for creation transactions
    pub contract_address: Option<Address>,
    /// Gas consumed by this transaction
    pub gas_used: u64,
    /// Execution status: 1 success, 0 reverted
    pub status: u64,
    /// Logs emitted
    pub logs: Vec<Log>,
}

impl Receipt {
    /// Whether execution succeeded
    pub fn is_success(&self) -> bool {
        self.status == 1
    }
}

/// A block header view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Block number
    pub number: u64,
    /// Block hash
    pub hash: Option<H256>,
    /// Parent hash
    pub parent_hash: Option<H256>,
    /// Timestamp (seconds)
    pub timestamp: u64,
    /// EIP-1559 base fee, absent on pre-London chains
    pub base_fee_per_gas: Option<U256>,
    /// Transaction hashes included in the block
    pub transactions: Vec<H256>,
}

// ---- lenient JSON parsing ----

fn get_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn get_u64(value: &Value, key: &str) -> Result<Option<u64>, ClientError> {
    match get_str(value, key) {
        Some(s) => hex_ops::hex_to_u64(s)
            .map(Some)
            .map_err(|e| ClientError::BadData { message: format!("{}: {}", key, e) }),
        None => Ok(None),
    }
}

fn get_u256(value: &Value, key: &str) -> Result<Option<U256>, ClientError> {
    match get_str(value, key) {
        Some(s) => hex_ops::hex_to_u256(s)
            .map(Some)
            .map_err(|e| ClientError::BadData { message: format!("{}: {}", key, e) }),
        None => Ok(None),
    }
}

fn get_hash(value: &Value, key: &str) -> Result<Option<H256>, ClientError> {
    match get_str(value, key) {
        Some(s) => H256::from_hex(s)
            .map(Some)
            .map_err(|e| ClientError::BadData { message: format!("{}: {}", key, e) }),
        None => Ok(None),
    }
}

fn get_address(value: &Value, key: &str) -> Result<Option<Address>, ClientError> {
    match get_str(value, key) {
        Some(s) => Address::from_hex(s)
            .map(Some)
            .map_err(|e| ClientError::BadData { message: format!("{}: {}", key, e) }),
        None => Ok(None),
    }
}

/// Parse a log object
pub(crate) fn parse_log(value: &Value) -> Result<Log, ClientError> {
    let address = get_address(value, "address")?.unwrap_or(Address::ZERO);
    let topics = value
        .get("topics")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(|s| {
                    H256::from_hex(s)
                        .map_err(|e| ClientError::BadData { message: format!("topic: {}", e) })
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?
        .unwrap_or_default();
    let data = match get_str(value, "data") {
        Some(s) => hex_ops::hex_to_bytes(s)
            .map_err(|e| ClientError::BadData { message: format!("log data: {}", e) })?,
        None => Vec::new(),
    };

    Ok(Log {
        address,
        topics,
        data,
        block_number: get_u64(value, "blockNumber")?,
        transaction_hash: get_hash(value, "transactionHash")?,
        log_index: get_u64(value, "logIndex")?,
    })
}

/// Parse a receipt object
pub(crate) fn parse_receipt(value: &Value) -> Result<Receipt, ClientError> {
    let transaction_hash = get_hash(value, "transactionHash")?.ok_or_else(|| {
        ClientError::BadData { message: "receipt missing transactionHash".to_string() }
    })?;
    let logs = value
        .get("logs")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().map(parse_log).collect::<Result<Vec<_>, _>>())
        .transpose()?
        .unwrap_or_default();

    Ok(Receipt {
        transaction_hash,
        transaction_index: get_u64(value, "transactionIndex")?.unwrap_or(0),
        block_hash: get_hash(value, "blockHash")?,
        block_number: get_u64(value, "blockNumber")?,
        from: get_address(value, "from")?.unwrap_or(Address::ZERO),
        to: get_address(value, "to")?,
        contract_address: get_address(value, "contractAddress")?,
        gas_used: get_u64(value, "gasUsed")?.unwrap_or(0),
        status: get_u64(value, "status")?.unwrap_or(1),
        logs,
    })
}

/// Parse a block object
pub(crate) fn parse_block(value: &Value) -> Result<Block, ClientError> {
    let transactions = value
        .get("transactions")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .map(|tx| {
                    // either a hash string or a full object carrying one
                    let hash = match tx {
                        Value::String(s) => Some(s.as_str()),
                        Value::Object(_) => get_str(tx, "hash"),
                        _ => None,
                    };
                    match hash {
                        Some(s) => H256::from_hex(s).map_err(|e| ClientError::BadData {
                            message: format!("transaction hash: {}", e),
                        }),
                        None => Err(ClientError::BadData {
                            message: "malformed transactions entry".to_string(),
                        }),
                    }
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?
        .unwrap_or_default();

    Ok(Block {
        number: get_u64(value, "number")?.unwrap_or(0),
        hash: get_hash(value, "hash")?,
        parent_hash: get_hash(value, "parentHash")?,
        timestamp: get_u64(value, "timestamp")?.unwrap_or(0),
        base_fee_per_gas: get_u256(value, "baseFeePerGas")?,
        transactions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_id_serialization() {
        assert_eq!(serde_json::to_string(&BlockId::Latest).unwrap(), "\"latest\"");
        assert_eq!(serde_json::to_string(&BlockId::Pending).unwrap(), "\"pending\"");
        assert_eq!(serde_json::to_string(&BlockId::Earliest).unwrap(), "\"earliest\"");
        assert_eq!(serde_json::to_string(&BlockId::Number(256)).unwrap(), "\"0x100\"");
    }

    #[test]
    fn test_call_request_skips_unset_fields() {
        let req = CallRequest {
            to: Some(Address::ZERO),
            data: Some(Bytes::from(vec![0xa9, 0x05, 0x9c, 0xbb])),
            ..Default::default()
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["to"], "0x0000000000000000000000000000000000000000");
        assert_eq!(json["data"], "0xa9059cbb");
        assert!(json.get("from").is_none());
        assert!(json.get("value").is_none());
    }

    #[test]
    fn test_call_request_hex_quantities() {
        let req = CallRequest {
            gas: Some(21000),
            value: Some(U256::from(0)),
            gas_price: Some(U256::from(20_000_000_000u64)),
            ..Default::default()
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["gas"], "0x5208");
        assert_eq!(json["value"], "0x0");
        assert_eq!(json["gasPrice"], "0x4a817c800");
    }

    #[test]
    fn test_transaction_request_envelope_selection() {
        let mut req = TransactionRequest::default();
        assert!(!req.is_eip1559());
        req.max_fee_per_gas = Some(U256::from(30_000_000_000u64));
        assert!(req.is_eip1559());
    }

    #[test]
    fn test_log_filter_json() {
        let filter = LogFilter {
            address: Some(Address::ZERO),
            topics: vec![Some(H256::from_bytes([0xaa; 32])), None],
            from_block: Some(BlockId::Number(5)),
            to_block: Some(BlockId::Latest),
        };
        let json = filter.to_json();
        assert_eq!(json["fromBlock"], "0x5");
        assert_eq!(json["toBlock"], "latest");
        assert_eq!(json["topics"][1], Value::Null);
    }

    #[test]
    fn test_parse_receipt() {
        let value = serde_json::json!({
            "transactionHash": "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b",
            "transactionIndex": "0x1",
            "blockNumber": "0x10",
            "from": "0x1111111111111111111111111111111111111111",
            "to": "0x2222222222222222222222222222222222222222",
            "gasUsed": "0x5208",
            "status": "0x1",
            "logs": [{
                "address": "0x2222222222222222222222222222222222222222",
                "topics": ["0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"],
                "data": "0x",
                "logIndex": "0x0"
            }]
        });
        let receipt = parse_receipt(&value).unwrap();
        assert!(receipt.is_success());
        assert_eq!(receipt.gas_used, 21000);
        assert_eq!(receipt.block_number, Some(16));
        assert_eq!(receipt.logs.len(), 1);
    }

    #[test]
    fn test_parse_receipt_missing_hash_is_bad_data() {
        assert!(parse_receipt(&serde_json::json!({})).is_err());
    }

    #[test]
    fn test_parse_block_with_base_fee() {
        let value = serde_json::json!({
            "number": "0x100",
            "timestamp": "0x5f5e100",
            "baseFeePerGas": "0x3b9aca00",
            "transactions": [
                "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b"
            ]
        });
        let block = parse_block(&value).unwrap();
        assert_eq!(block.number, 256);
        assert_eq!(block.base_fee_per_gas, Some(U256::from(1_000_000_000u64)));
        assert_eq!(block.transactions.len(), 1);
    }

    #[test]
    fn test_parse_block_pre_london() {
        let block = parse_block(&serde_json::json!({"number": "0x1"})).unwrap();
        assert_eq!(block.base_fee_per_gas, None);
    }
}
