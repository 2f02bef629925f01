//! # ember-sdk
//!
//! Client SDK for Ethereum-compatible chains.
//!
//! ## Features
//!
//! - **Client**: JSON-RPC client with batching and receipt polling
//! - **Account**: key management, auto-fill, and transaction submission
//! - **TxBuilder**: legacy (EIP-155) and EIP-1559 envelopes
//! - **Contract**: typed facade over an ABI [`Interface`]
//! - **ClientError**: a closed error taxonomy with structured context
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ember_sdk::{Account, Client, TransactionRequest};
//! use ember_primitives::{Address, U256};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(Client::connect("http://localhost:8545").await?);
//!
//!     let account = Account::from_private_key_hex(
//!         "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
//!     )?
//!     .connect(client.clone());
//!
//!     let to = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d")?;
//!     let pending = account
//!         .send_transaction(TransactionRequest {
//!             to: Some(to),
//!             value: U256::from_dec_str("1000000000000000000")?, // 1 ETH
//!             ..Default::default()
//!         })
//!         .await?;
//!     let receipt = pending.wait(1, std::time::Duration::from_secs(60)).await?;
//!     println!("mined in block {:?}", receipt.block_number);
//!     Ok(())
//! }
//! ```
//!
//! ## Contract interaction
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ember_sdk::{contract, Client, Runner};
//! use ember_abi::Token;
//! use ember_primitives::Address;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(Client::connect("http://localhost:8545").await?);
//!     let token = Address::from_hex("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48")?;
//!     let usdc = contract::erc20(token, Runner::Provider(client));
//!
//!     let owner = Token::address("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d")?;
//!     let balance = usdc.call("balanceOf", &[owner]).await?;
//!     println!("balance: {:?}", balance[0]);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod account;
mod classify;
mod client;
pub mod contract;
mod error;
mod transport;
mod tx_builder;
pub mod types;
mod wallet;

pub use account::{Account, DEFAULT_PRIORITY_FEE_WEI};
pub use classify::classify_rpc_error;
pub use client::{Client, PendingTransaction};
pub use contract::{
    compute_contract_address, Contract, ContractFactory, ContractFunction, Deployment, Runner,
};
pub use error::{ClientError, ErrorKind};
pub use transport::{BatchEntry, MockTransport, Transport};
pub use tx_builder::{DynamicFeeTx, LegacyTx, SignedTransaction, TxBuilder};
pub use types::{Block, BlockId, CallRequest, Log, LogFilter, Receipt, TransactionRequest};
pub use wallet::Wallet;

#[cfg(feature = "http")]
pub use transport::HttpTransport;

// Re-export the layers below for convenience
pub use ember_abi::{self as abi, id, DecodedParams, Interface, Token};
pub use ember_crypto::{is_checksum_valid, is_valid_address, keccak256, to_checksum};
pub use ember_primitives::units::{format_ether, format_units, parse_ether, parse_units};
pub use ember_primitives::{Address, H256, U256};
