//! Common error type for primitives

use thiserror::Error;

use crate::address::AddressError;
use crate::hash::HashError;
use crate::hex_ops::HexError;
use crate::units::UnitsError;

/// Primitive operation error
#[derive(Debug, Error)]
pub enum PrimitiveError {
    /// Address error
    #[error("address error: {0}")]
    Address(#[from] AddressError),

    /// Hash error
    #[error("hash error: {0}")]
    Hash(#[from] HashError),

    /// Hex codec error
    #[error("hex error: {0}")]
    Hex(#[from] HexError),

    /// Unit conversion error
    #[error("units error: {0}")]
    Units(#[from] UnitsError),
}
