//! Transport-bound account.
//!
//! An `Account` pairs a [`Wallet`] with an optional [`Client`]. Binding
//! yields a new account value sharing the same key; the original is
//! unaffected. Network-touching operations fail with
//! `UNSUPPORTED_OPERATION` on an unbound account.

use std::sync::Arc;

use ember_primitives::{Address, U256};

use crate::client::{Client, PendingTransaction};
use crate::error::ClientError;
use crate::types::{BlockId, TransactionRequest};
use crate::wallet::Wallet;

/// Default priority fee used by auto-fill: 1.5 gwei
pub const DEFAULT_PRIORITY_FEE_WEI: u64 = 1_500_000_000;

/// A signing account, optionally bound to a client
#[derive(Clone)]
pub struct Account {
    wallet: Arc<Wallet>,
    client: Option<Arc<Client>>,
}

impl Account {
    /// Wrap a wallet into an unbound account
    pub fn new(wallet: Wallet) -> Self {
        Self { wallet: Arc::new(wallet), client: None }
    }

    /// Create an unbound account from a hex private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, ClientError> {
        Ok(Self::new(Wallet::from_private_key_hex(hex_key)?))
    }

    /// Create an unbound account with a fresh random key
    pub fn new_random() -> Self {
        Self::new(Wallet::new_random())
    }

    /// Bind to a client, sharing the key with the original account
    pub fn connect(&self, client: Arc<Client>) -> Account {
        Account { wallet: self.wallet.clone(), client: Some(client) }
    }

    /// The account address
    pub fn address(&self) -> Address {
        *self.wallet.address()
    }

    /// The bound client, when present
    pub fn client(&self) -> Option<&Arc<Client>> {
        self.client.as_ref()
    }

    fn require_client(&self, operation: &str) -> Result<&Arc<Client>, ClientError> {
        self.client
            .as_ref()
            .ok_or_else(|| ClientError::unsupported(operation, "account is not bound to a client"))
    }

    /// Sign a message with the personal_sign prefix, returning the
    /// 65-byte signature as 0x-hex
    pub fn sign_message(&self, message: &[u8]) -> Result<String, ClientError> {
        Ok(self.wallet.sign_message(message)?.to_hex())
    }

    /// Sign a finalized transaction request without submitting it
    pub fn sign_transaction(
        &self,
        req: &TransactionRequest,
    ) -> Result<crate::tx_builder::SignedTransaction, ClientError> {
        self.wallet.sign_transaction(req)
    }

    /// Pending-tag nonce of this account
    pub async fn get_nonce(&self) -> Result<u64, ClientError> {
        let client = self.require_client("get_nonce")?;
        client.get_transaction_count(&self.address(), BlockId::Pending).await
    }

    /// Latest balance of this account
    pub async fn get_balance(&self) -> Result<U256, ClientError> {
        let client = self.require_client("get_balance")?;
        client.get_balance(&self.address(), BlockId::Latest).await
    }

    /// Finalize, sign, and submit a transaction.
    ///
    /// Auto-fill order: sender, nonce (pending tag), gas limit (node
    /// estimate), fees (EIP-1559 when the latest block exposes a base
    /// fee, legacy gas price otherwise), chain id (cached). Underlying
    /// errors propagate with the transaction attached as context.
    pub async fn send_transaction(
        &self,
        mut req: TransactionRequest,
    ) -> Result<PendingTransaction, ClientError> {
        let client = self.require_client("send_transaction")?.clone();

        match &req.from {
            None => req.from = Some(self.address()),
            Some(from) if from != self.wallet.address() => {
                return Err(ClientError::invalid_argument(format!(
                    "from {} does not match account {}",
                    from,
                    self.address()
                )));
            }
            Some(_) => {}
        }

        if req.nonce.is_none() {
            let nonce = client
                .get_transaction_count(&self.address(), BlockId::Pending)
                .await
                .map_err(|e| e.with_transaction(req.to_json()))?;
            req.nonce = Some(nonce);
        }

        if req.gas_limit.is_none() {
            let estimate = client
                .estimate_gas(&req.as_call_request())
                .await
                .map_err(|e| e.with_transaction(req.to_json()))?;
            req.gas_limit = Some(estimate);
        }

        if req.gas_price.is_none() && req.max_fee_per_gas.is_none() {
            let gas_price = client
                .gas_price()
                .await
                .map_err(|e| e.with_transaction(req.to_json()))?;
            let block = client
                .get_block(BlockId::Latest, false)
                .await
                .map_err(|e| e.with_transaction(req.to_json()))?;
            match block.and_then(|b| b.base_fee_per_gas) {
                Some(base_fee) => {
                    let priority = U256::from(DEFAULT_PRIORITY_FEE_WEI);
                    req.max_priority_fee_per_gas = Some(priority);
                    req.max_fee_per_gas = Some(base_fee * 2u64 + priority);
                }
                None => req.gas_price = Some(gas_price),
            }
        }

        if req.chain_id.is_none() {
            req.chain_id = Some(client.chain_id().await?);
        }

        let signed = self.wallet.sign_transaction(&req)?;
        let hash = client
            .send_raw_transaction(signed.raw())
            .await
            .map_err(|e| e.with_transaction(req.to_json()))?;

        let nonce = req.nonce.unwrap_or_default();
        Ok(PendingTransaction::new(hash, client).with_sender(self.address(), nonce))
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address())
            .field("bound", &self.client.is_some())
            .finish()
    }
}
