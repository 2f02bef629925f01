//! Client integration tests for ember-sdk
//!
//! Exercises the typed RPC wrappers, batching, error classification,
//! and the account auto-fill pipeline against a mock transport.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use ember_primitives::{Address, H256, U256};
use ember_sdk::{
    Account, BatchEntry, Client, ErrorKind, MockTransport, TransactionRequest,
};

fn mock_client() -> (Arc<Client>, Arc<MockTransport>) {
    let transport = Arc::new(MockTransport::new());
    let client = Arc::new(Client::from_arc(transport.clone()));
    (client, transport)
}

// ==================== Chain Info Tests ====================

#[tokio::test]
async fn test_chain_id_and_block_number() {
    let (client, _) = mock_client();
    assert_eq!(client.chain_id().await.unwrap(), 1);
    assert_eq!(client.block_number().await.unwrap(), 256);
}

#[tokio::test]
async fn test_chain_id_cache_survives_transport_change() {
    let (client, transport) = mock_client();
    assert_eq!(client.chain_id().await.unwrap(), 1);
    // a later (bogus) change must not be observed: the cache holds
    transport.set_response("eth_chainId", json!("0x5"));
    assert_eq!(client.chain_id().await.unwrap(), 1);
}

#[tokio::test]
async fn test_gas_price() {
    let (client, _) = mock_client();
    assert_eq!(client.gas_price().await.unwrap(), U256::from(1_000_000_000u64));
}

// ==================== Query Tests ====================

#[tokio::test]
async fn test_get_balance_latest() {
    let (client, transport) = mock_client();
    let balance = client
        .get_balance(&Address::ZERO, ember_sdk::BlockId::Latest)
        .await
        .unwrap();
    assert_eq!(balance, U256::from(1_000_000_000_000_000_000u128));
    assert_eq!(transport.calls()[0].1[1], json!("latest"));
}

#[tokio::test]
async fn test_get_code_empty() {
    let (client, _) = mock_client();
    let code = client
        .get_code(&Address::ZERO, ember_sdk::BlockId::Latest)
        .await
        .unwrap();
    assert!(code.is_empty());
}

// ==================== Batch Tests ====================

#[tokio::test]
async fn test_batch_returns_request_order() {
    let (client, transport) = mock_client();
    transport.push_response("eth_call", json!("0x01"));
    transport.push_response("eth_call", json!("0x02"));
    transport.push_response("eth_call", json!("0x03"));

    let results = client
        .send_batch(vec![
            BatchEntry::new("eth_call", vec![json!({}), json!("latest")]),
            BatchEntry::new("eth_call", vec![json!({}), json!("latest")]),
            BatchEntry::new("eth_call", vec![json!({}), json!("latest")]),
        ])
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap(), &json!("0x01"));
    assert_eq!(results[1].as_ref().unwrap(), &json!("0x02"));
    assert_eq!(results[2].as_ref().unwrap(), &json!("0x03"));
}

#[tokio::test]
async fn test_batch_embeds_entry_errors() {
    let (client, transport) = mock_client();
    transport.set_error("eth_estimateGas", -32000, "insufficient funds for transfer");

    let results = client
        .send_batch(vec![
            BatchEntry::new("eth_chainId", vec![]),
            BatchEntry::new("eth_estimateGas", vec![json!({})])
                .with_context(json!({"to": "0xdead"})),
        ])
        .await
        .unwrap();

    assert!(results[0].is_ok());
    let err = results[1].as_ref().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    assert_eq!(err.info()["transaction"]["to"], "0xdead");
}

// ==================== Error Classification Tests ====================

#[tokio::test]
async fn test_nonce_classification() {
    let (client, transport) = mock_client();
    transport.set_error("eth_sendRawTransaction", -32000, "nonce too low");
    let err = client.send_raw_transaction(&[0x01]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NonceExpired);
    assert_eq!(err.short_message(), "nonce has already been used");
}

#[tokio::test]
async fn test_replacement_underpriced_classification() {
    let (client, transport) = mock_client();
    transport.set_error(
        "eth_sendRawTransaction",
        -32000,
        "replacement transaction underpriced",
    );
    let err = client.send_raw_transaction(&[0x01]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReplacementUnderpriced);
}

#[tokio::test]
async fn test_revert_classification_with_reason() {
    let (client, transport) = mock_client();
    // Error("too low!") revert payload
    let data = concat!(
        "0x08c379a0",
        "0000000000000000000000000000000000000000000000000000000000000020",
        "0000000000000000000000000000000000000000000000000000000000000008",
        "746f6f206c6f7721000000000000000000000000000000000000000000000000",
    );
    transport.set_error_with_data("eth_call", 3, "execution reverted", data);

    let err = client
        .call(&Default::default(), ember_sdk::BlockId::Latest)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CallException);
    assert_eq!(err.short_message(), "execution reverted: too low!");
    assert_eq!(err.info()["reason"], "too low!");
}

// ==================== Receipt Polling Tests ====================

#[tokio::test]
async fn test_wait_appears_after_polls() {
    let (client, transport) = mock_client();
    let receipt = json!({
        "transactionHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
        "blockNumber": "0x10",
        "status": "0x1",
        "gasUsed": "0x5208",
    });
    // two empty polls, then the receipt
    transport.push_response("eth_getTransactionReceipt", json!(null));
    transport.push_response("eth_getTransactionReceipt", json!(null));
    transport.push_response("eth_getTransactionReceipt", receipt);

    let hash = H256::from_bytes([0x11; 32]);
    let receipt = client
        .wait_for_transaction(&hash, 1, Duration::from_secs(10))
        .await
        .unwrap();
    assert_eq!(receipt.block_number, Some(16));
}

#[tokio::test]
async fn test_wait_confirmation_depth() {
    let (client, transport) = mock_client();
    transport.set_response(
        "eth_getTransactionReceipt",
        json!({
            "transactionHash":
                "0x1111111111111111111111111111111111111111111111111111111111111111",
            "blockNumber": "0x100",
            "status": "0x1",
        }),
    );
    // chain head: first at the inclusion block, then two blocks later
    transport.push_response("eth_blockNumber", json!("0x100"));
    transport.push_response("eth_blockNumber", json!("0x102"));

    let hash = H256::from_bytes([0x11; 32]);
    let receipt = client
        .wait_for_transaction(&hash, 3, Duration::from_secs(10))
        .await
        .unwrap();
    assert_eq!(receipt.block_number, Some(256));
}

// ==================== Auto-fill Pipeline Tests ====================

#[tokio::test]
async fn test_autofill_orders_rpc_calls() {
    let (client, transport) = mock_client();
    let account = Account::from_private_key_hex(
        "0x0123012301230123012301230123012301230123012301230123012301230123",
    )
    .unwrap()
    .connect(client);

    account
        .send_transaction(TransactionRequest {
            to: Some(Address::from_hex("0x1234567890123456789012345678901234567890").unwrap()),
            value: U256::from(1u64),
            ..Default::default()
        })
        .await
        .unwrap();

    let methods: Vec<String> = transport.calls().iter().map(|(m, _)| m.clone()).collect();
    let pos = |name: &str| methods.iter().position(|m| m == name).unwrap();
    assert!(pos("eth_getTransactionCount") < pos("eth_estimateGas"));
    assert!(pos("eth_estimateGas") < pos("eth_sendRawTransaction"));
}

#[tokio::test]
async fn test_autofill_eip1559_fee_math() {
    let (client, transport) = mock_client();
    // base fee 2 gwei -> maxFee = 2 * base + 1.5 gwei = 5.5 gwei
    transport.set_response(
        "eth_getBlockByNumber",
        json!({
            "number": "0x100",
            "timestamp": "0x0",
            "baseFeePerGas": "0x77359400",
            "transactions": [],
        }),
    );
    let account = Account::from_private_key_hex(
        "0x0123012301230123012301230123012301230123012301230123012301230123",
    )
    .unwrap()
    .connect(client);

    account
        .send_transaction(TransactionRequest {
            to: Some(Address::ZERO),
            ..Default::default()
        })
        .await
        .unwrap();

    let raw = transport
        .calls()
        .iter()
        .find(|(m, _)| m == "eth_sendRawTransaction")
        .map(|(_, p)| p[0].as_str().unwrap().to_string())
        .unwrap();
    assert!(raw.starts_with("0x02"));
    // 5.5 gwei = 0x147d35700 appears in the fee field
    assert!(raw.contains("147d35700"));
    // 1.5 gwei priority fee = 0x59682f00
    assert!(raw.contains("59682f00"));
}
