//! Key holder and signer.
//!
//! Note: Clone is intentionally not implemented so key material is never
//! duplicated by accident. Rebuild from the private key if a second
//! holder is genuinely needed, or share through an `Account`.

use ember_crypto::{hash_message, public_key_to_address, sign, PrivateKey, PublicKey, Signature};
use ember_primitives::{Address, H256, U256};
use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::error::ClientError;
use crate::tx_builder::{SignedTransaction, TxBuilder};
use crate::types::TransactionRequest;

/// Private key holder deriving its address on construction
pub struct Wallet {
    private_key: PrivateKey,
    address: Address,
}

impl Wallet {
    /// Generate a wallet from OS randomness
    pub fn new_random() -> Self {
        let private_key = SigningKey::random(&mut OsRng);
        let address = public_key_to_address(private_key.verifying_key());
        Self { private_key, address }
    }

    /// Create a wallet from a 32-byte private key
    pub fn from_private_key(key: &[u8; 32]) -> Result<Self, ClientError> {
        let private_key = SigningKey::from_slice(key)
            .map_err(|e| ClientError::invalid_argument(format!("invalid private key: {}", e)))?;
        let address = public_key_to_address(private_key.verifying_key());
        Ok(Self { private_key, address })
    }

    /// Create a wallet from a hex-encoded private key, with or without
    /// `0x` prefix
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, ClientError> {
        let stripped = hex_key.strip_prefix("0x").unwrap_or(hex_key);
        let mut bytes = hex::decode(stripped)
            .map_err(|e| ClientError::invalid_argument(format!("invalid private key hex: {}", e)))?;
        if bytes.len() != 32 {
            let got = bytes.len();
            bytes.zeroize();
            return Err(ClientError::invalid_argument(format!(
                "private key must be 32 bytes, got {}",
                got
            )));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes);
        bytes.zeroize();

        let result = Self::from_private_key(&key);
        key.zeroize();
        result
    }

    /// The derived address
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The verifying key
    pub fn public_key(&self) -> &PublicKey {
        self.private_key.verifying_key()
    }

    pub(crate) fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Sign a 32-byte digest
    pub fn sign_hash(&self, digest: &H256) -> Result<Signature, ClientError> {
        Ok(sign(digest, &self.private_key)?)
    }

    /// Sign a message with the `personal_sign` prefix.
    ///
    /// The digest comes from [`hash_message`]; the returned signature
    /// renders `r || s || v` with v in 27/28 via [`Signature::to_hex`].
    pub fn sign_message(&self, message: &[u8]) -> Result<Signature, ClientError> {
        self.sign_hash(&hash_message(message))
    }

    /// Sign a finalized transaction request.
    ///
    /// Every field the envelope needs must be present; accounts fill
    /// them before calling. Presence of `max_fee_per_gas` selects the
    /// EIP-1559 envelope.
    pub fn sign_transaction(&self, req: &TransactionRequest) -> Result<SignedTransaction, ClientError> {
        let chain_id = req
            .chain_id
            .ok_or_else(|| ClientError::invalid_argument("missing field: chain_id"))?;
        if let Some(from) = &req.from {
            if from != &self.address {
                return Err(ClientError::invalid_argument(format!(
                    "from {} does not match signer {}",
                    from, self.address
                )));
            }
        }

        let mut builder = TxBuilder::new(chain_id).value(req.value).data(req.data.clone());
        if let Some(to) = req.to {
            builder = builder.to(to);
        }
        if let Some(nonce) = req.nonce {
            builder = builder.nonce(nonce);
        }
        if let Some(gas_limit) = req.gas_limit {
            builder = builder.gas_limit(gas_limit);
        }

        if req.is_eip1559() {
            if let Some(max_fee) = req.max_fee_per_gas {
                builder = builder.max_fee_per_gas(max_fee);
            }
            builder = builder.max_priority_fee_per_gas(
                req.max_priority_fee_per_gas.unwrap_or_else(U256::zero),
            );
            builder.sign_eip1559(self)
        } else {
            if let Some(gas_price) = req.gas_price {
                builder = builder.gas_price(gas_price);
            }
            builder.sign_legacy(self)
        }
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet").field("address", &self.address).finish_non_exhaustive()
    }
}
