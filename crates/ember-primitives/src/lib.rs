//! # ember-primitives
//!
//! Primitive types for the Ember Ethereum SDK.
//!
//! This crate provides the fundamental data types shared by every other
//! Ember crate: the 20-byte [`Address`], the 32-byte [`H256`] hash, the
//! hex/quantity codec used on the JSON-RPC wire, and decimal unit
//! conversion helpers.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
pub mod hex_ops;
mod hash;
pub mod units;

pub use address::{Address, AddressError};
pub use error::PrimitiveError;
pub use hash::{H256, Hash, HashError};
pub use hex_ops::HexError;
pub use units::UnitsError;

// Re-export primitive-types for U256
pub use primitive_types::U256;

/// Block height type
pub type BlockHeight = u64;

/// Transaction nonce type
pub type Nonce = u64;

/// Gas type
pub type Gas = u64;
