//! Contract facade.
//!
//! Binds an [`Interface`] to an address and a runner. A read-only
//! runner routes through `eth_call`; writes require a signing account.
//! Method handles are explicit ([`Contract::function`]) rather than any
//! field-access magic.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde_json::json;

use ember_abi::{DecodedLog, DecodedParams, Interface, Token};
use ember_crypto::{hash_to_address, keccak256};
use ember_primitives::{hex_ops, Address};
use ember_rlp::RlpList;

use crate::account::Account;
use crate::client::{Client, PendingTransaction};
use crate::error::ClientError;
use crate::transport::BatchEntry;
use crate::types::{BlockId, CallRequest, LogFilter, Receipt, TransactionRequest};

/// Who executes contract operations: a read-only provider or a signer
#[derive(Clone)]
pub enum Runner {
    /// Read-only access through a client
    Provider(Arc<Client>),
    /// Read/write access through a bound account
    Signer(Account),
}

impl Runner {
    fn client(&self, operation: &str) -> Result<Arc<Client>, ClientError> {
        match self {
            Runner::Provider(client) => Ok(client.clone()),
            Runner::Signer(account) => account
                .client()
                .cloned()
                .ok_or_else(|| ClientError::unsupported(operation, "account is not bound to a client")),
        }
    }

    fn account(&self, operation: &str) -> Result<&Account, ClientError> {
        match self {
            Runner::Signer(account) => Ok(account),
            Runner::Provider(_) => Err(ClientError::unsupported(
                operation,
                "runner is read-only; connect an account to send transactions",
            )),
        }
    }

    fn caller(&self) -> Option<Address> {
        match self {
            Runner::Signer(account) => Some(account.address()),
            Runner::Provider(_) => None,
        }
    }
}

/// A deployed contract bound to an interface and runner
#[derive(Clone)]
pub struct Contract {
    address: Address,
    interface: Interface,
    runner: Runner,
}

impl Contract {
    /// Bind an interface to an on-chain address
    pub fn new(address: Address, interface: Interface, runner: Runner) -> Self {
        Self { address, interface, runner }
    }

    /// The bound address
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The bound interface
    pub fn interface(&self) -> &Interface {
        &self.interface
    }

    /// Explicit method handle; resolution errors surface on use
    pub fn function(&self, key: &str) -> ContractFunction<'_> {
        ContractFunction { contract: self, key: key.to_string() }
    }

    fn call_request(&self, data: Vec<u8>) -> CallRequest {
        CallRequest {
            from: self.runner.caller(),
            to: Some(self.address),
            data: Some(Bytes::from(data)),
            ..Default::default()
        }
    }

    /// Execute a read-only call and decode the result
    pub async fn call(&self, key: &str, args: &[Token]) -> Result<DecodedParams, ClientError> {
        let client = self.runner.client("call")?;
        let data = self.interface.encode_function_data(key, args)?;
        let output = client.call(&self.call_request(data), BlockId::Latest).await?;
        Ok(self.interface.decode_function_result(key, &output)?)
    }

    /// Execute a state-changing method as a read-only probe
    pub async fn static_call(&self, key: &str, args: &[Token]) -> Result<DecodedParams, ClientError> {
        self.call(key, args).await
    }

    /// Submit a state-changing call through the signing account
    pub async fn send(&self, key: &str, args: &[Token]) -> Result<PendingTransaction, ClientError> {
        self.send_with_request(key, args, TransactionRequest::default()).await
    }

    /// Submit with caller-supplied overrides (value, gas, fees)
    pub async fn send_with_request(
        &self,
        key: &str,
        args: &[Token],
        mut base: TransactionRequest,
    ) -> Result<PendingTransaction, ClientError> {
        let account = self.runner.account("send")?;
        let data = self.interface.encode_function_data(key, args)?;
        base.to = Some(self.address);
        base.data = Bytes::from(data);
        account.send_transaction(base).await
    }

    /// Ask the node for a gas estimate of this call
    pub async fn estimate_gas(&self, key: &str, args: &[Token]) -> Result<u64, ClientError> {
        let client = self.runner.client("estimate_gas")?;
        let data = self.interface.encode_function_data(key, args)?;
        client.estimate_gas(&self.call_request(data)).await
    }

    /// Compose several read calls into one JSON-RPC batch.
    ///
    /// Results come back in request order (a transport property);
    /// per-entry failures stay embedded so one revert does not void the
    /// rest.
    pub async fn multicall(
        &self,
        calls: &[(&str, Vec<Token>)],
    ) -> Result<Vec<Result<DecodedParams, ClientError>>, ClientError> {
        let client = self.runner.client("multicall")?;

        let mut entries = Vec::with_capacity(calls.len());
        for (key, args) in calls {
            let data = self.interface.encode_function_data(key, args)?;
            let request = serde_json::to_value(self.call_request(data))?;
            entries.push(
                BatchEntry::new("eth_call", vec![request.clone(), json!("latest")])
                    .with_context(json!({ "method": key, "request": request })),
            );
        }

        let outcomes = client.send_batch(entries).await?;
        Ok(outcomes
            .into_iter()
            .zip(calls.iter())
            .map(|(outcome, (key, _))| {
                outcome.and_then(|value| {
                    let hex = value.as_str().ok_or_else(|| ClientError::BadData {
                        message: format!("{}: eth_call result is not a string", key),
                    })?;
                    let bytes = hex_ops::hex_to_bytes(hex)
                        .map_err(|e| ClientError::BadData { message: e.to_string() })?;
                    Ok(self.interface.decode_function_result(key, &bytes)?)
                })
            })
            .collect())
    }

    /// Fetch and decode logs for one event over a block range
    pub async fn query_filter(
        &self,
        event: &str,
        from_block: Option<BlockId>,
        to_block: Option<BlockId>,
    ) -> Result<Vec<DecodedLog>, ClientError> {
        let client = self.runner.client("query_filter")?;
        let topics = self.interface.encode_event_topics(event, &[])?;
        let filter = LogFilter { address: Some(self.address), topics, from_block, to_block };

        let logs = client.get_logs(&filter).await?;
        logs.iter()
            .map(|log| Ok(self.interface.decode_event_log(&log.topics, &log.data)?))
            .collect()
    }
}

/// Explicit handle for one contract method
pub struct ContractFunction<'a> {
    contract: &'a Contract,
    key: String,
}

impl ContractFunction<'_> {
    /// The selector this handle resolves to
    pub fn selector(&self) -> Result<[u8; 4], ClientError> {
        Ok(self.contract.interface.get_function(&self.key)?.selector())
    }

    /// Read-only call
    pub async fn call(&self, args: &[Token]) -> Result<DecodedParams, ClientError> {
        self.contract.call(&self.key, args).await
    }

    /// State-changing send
    pub async fn send(&self, args: &[Token]) -> Result<PendingTransaction, ClientError> {
        self.contract.send(&self.key, args).await
    }

    /// Gas estimate
    pub async fn estimate_gas(&self, args: &[Token]) -> Result<u64, ClientError> {
        self.contract.estimate_gas(&self.key, args).await
    }
}

/// The address a deployment from `sender` with `nonce` lands at:
/// low 20 bytes of keccak-256 over RLP([sender, nonce])
pub fn compute_contract_address(sender: &Address, nonce: u64) -> Address {
    let mut list = RlpList::new();
    list.push_bytes(sender.as_bytes()).push_u64(nonce);
    hash_to_address(&keccak256(list.finish()))
}

/// The outcome of a deployment
pub struct Deployment {
    /// Facade bound to the created address
    pub contract: Contract,
    /// The created address
    pub address: Address,
    /// Receipt of the deployment transaction
    pub receipt: Receipt,
}

/// Deploys contracts from bytecode plus constructor arguments
pub struct ContractFactory {
    interface: Interface,
    bytecode: Vec<u8>,
    account: Account,
}

impl ContractFactory {
    /// Create a factory; the account must be bound to a client
    pub fn new(interface: Interface, bytecode: impl Into<Vec<u8>>, account: Account) -> Self {
        Self { interface, bytecode: bytecode.into(), account }
    }

    /// Create a factory from 0x-hex bytecode
    pub fn from_hex(
        interface: Interface,
        bytecode_hex: &str,
        account: Account,
    ) -> Result<Self, ClientError> {
        let bytecode = hex_ops::hex_to_bytes(bytecode_hex)
            .map_err(|e| ClientError::invalid_argument(format!("bytecode: {}", e)))?;
        Ok(Self::new(interface, bytecode, account))
    }

    /// Deploy: submit bytecode with encoded constructor arguments, wait
    /// one confirmation, and derive the created address from
    /// RLP([sender, nonce])
    pub async fn deploy(&self, args: &[Token]) -> Result<Deployment, ClientError> {
        let nonce = self.account.get_nonce().await?;

        let mut data = self.bytecode.clone();
        data.extend(self.interface.encode_deploy(args)?);

        let pending = self
            .account
            .send_transaction(TransactionRequest {
                to: None,
                data: Bytes::from(data),
                nonce: Some(nonce),
                ..Default::default()
            })
            .await?;
        let receipt = pending.wait(1, Duration::from_secs(60)).await?;

        let address = compute_contract_address(&self.account.address(), nonce);
        let contract = Contract::new(
            address,
            self.interface.clone(),
            Runner::Signer(self.account.clone()),
        );
        Ok(Deployment { contract, address, receipt })
    }
}

/// A ready-made ERC-20 interface bound to `address`
///
/// # Panics
///
/// Never: the embedded description is static and known to parse.
pub fn erc20(address: Address, runner: Runner) -> Contract {
    let interface = Interface::from_human_readable([
        "function name() view returns (string)",
        "function symbol() view returns (string)",
        "function decimals() view returns (uint8)",
        "function totalSupply() view returns (uint256)",
        "function balanceOf(address owner) view returns (uint256)",
        "function transfer(address to, uint256 amount) returns (bool)",
        "function approve(address spender, uint256 amount) returns (bool)",
        "function allowance(address owner, address spender) view returns (uint256)",
        "function transferFrom(address from, address to, uint256 amount) returns (bool)",
        "event Transfer(address indexed from, address indexed to, uint256 value)",
        "event Approval(address indexed owner, address indexed spender, uint256 value)",
    ])
    .expect("static ERC-20 description parses");
    Contract::new(address, interface, runner)
}
