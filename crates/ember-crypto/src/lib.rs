//! # ember-crypto
//!
//! Cryptographic primitives for the Ember Ethereum SDK.
//!
//! - Keccak-256 and `personal_sign` message digests
//! - ECDSA signing/verification (secp256k1), low-s canonical
//! - Public key recovery
//! - Address derivation and EIP-55 checksums

#![warn(missing_docs)]
#![warn(clippy::all)]

mod checksum;
mod error;
mod hash;
mod signature;

pub use checksum::{is_checksum_valid, is_valid_address, to_checksum};
pub use error::CryptoError;
pub use hash::{hash_message, keccak256};
pub use signature::{
    hash_to_address, public_key_to_address, recover_public_key, sign, verify, PrivateKey,
    PublicKey, Signature,
};
