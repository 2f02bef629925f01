//! Hex and quantity codec used on the JSON-RPC wire.
//!
//! JSON-RPC quantities are minimal 0x-prefixed hex (`0x0` for zero);
//! RLP integer fields are minimal big-endian bytes (empty for zero).
//! Both forms are produced here so callers never hand-format hex.

use primitive_types::U256;
use thiserror::Error;

/// Hex codec error
#[derive(Debug, Error)]
pub enum HexError {
    /// Input contains non-hex characters
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    /// Value does not fit the requested integer width
    #[error("hex value out of range for {0}")]
    Overflow(&'static str),
}

/// Strip a leading `0x`/`0X` prefix if present
pub fn strip_prefix(s: &str) -> &str {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s)
}

/// Apply a `0x` prefix if missing
pub fn add_prefix(s: &str) -> String {
    if s.starts_with("0x") || s.starts_with("0X") {
        s.to_string()
    } else {
        format!("0x{}", s)
    }
}

/// Check whether a string is valid 0x-prefixed hex (empty payload allowed)
pub fn is_hex_str(s: &str) -> bool {
    match s.strip_prefix("0x") {
        Some(rest) => rest.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// Parse a hex quantity into a u64
pub fn hex_to_u64(s: &str) -> Result<u64, HexError> {
    let stripped = strip_prefix(s);
    if stripped.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(stripped, 16).map_err(|e| HexError::InvalidHex(e.to_string()))
}

/// Parse a hex quantity into a u128
pub fn hex_to_u128(s: &str) -> Result<u128, HexError> {
    let stripped = strip_prefix(s);
    if stripped.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(stripped, 16).map_err(|e| HexError::InvalidHex(e.to_string()))
}

/// Parse a hex quantity into a U256
pub fn hex_to_u256(s: &str) -> Result<U256, HexError> {
    let stripped = strip_prefix(s);
    if stripped.is_empty() {
        return Ok(U256::zero());
    }
    if stripped.len() > 64 {
        return Err(HexError::Overflow("U256"));
    }
    let padded = format!("{:0>64}", stripped);
    let bytes = hex::decode(&padded).map_err(|e| HexError::InvalidHex(e.to_string()))?;
    Ok(U256::from_big_endian(&bytes))
}

/// Decode a hex string into bytes.
///
/// An odd-length payload gets a leading `0` nibble, matching node
/// behavior for loosely formatted inputs.
pub fn hex_to_bytes(s: &str) -> Result<Vec<u8>, HexError> {
    let stripped = strip_prefix(s);
    if stripped.is_empty() {
        return Ok(Vec::new());
    }
    let owned;
    let even = if stripped.len() % 2 == 1 {
        owned = format!("0{}", stripped);
        owned.as_str()
    } else {
        stripped
    };
    hex::decode(even).map_err(|e| HexError::InvalidHex(e.to_string()))
}

/// Encode bytes as 0x-prefixed hex
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Format a u64 as a JSON-RPC quantity (minimal hex, zero is `0x0`)
pub fn u64_to_quantity(value: u64) -> String {
    format!("0x{:x}", value)
}

/// Format a U256 as a JSON-RPC quantity (minimal hex, zero is `0x0`)
pub fn u256_to_quantity(value: U256) -> String {
    format!("0x{:x}", value)
}

/// Minimal big-endian bytes of a U256: leading zero bytes stripped,
/// zero encodes as empty (the RLP field framing form)
pub fn u256_to_be_minimal(value: U256) -> Vec<u8> {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    let start = buf.iter().position(|&b| b != 0).unwrap_or(32);
    buf[start..].to_vec()
}

/// Left-pad bytes with zeros to `len`; inputs already at least `len` are
/// returned unchanged
pub fn pad_left(bytes: &[u8], len: usize) -> Vec<u8> {
    if bytes.len() >= len {
        return bytes.to_vec();
    }
    let mut out = vec![0u8; len - bytes.len()];
    out.extend_from_slice(bytes);
    out
}

/// Right-pad bytes with zeros to `len`
pub fn pad_right(bytes: &[u8], len: usize) -> Vec<u8> {
    let mut out = bytes.to_vec();
    if out.len() < len {
        out.resize(len, 0);
    }
    out
}
