//! EIP-55 mixed-case address checksums

use ember_primitives::Address;

use crate::keccak256;

/// Render an address in EIP-55 checksummed form.
///
/// Each alphabetic hex digit is uppercased when the corresponding nibble
/// of keccak-256 over the lowercase hex (without `0x`) is >= 8.
pub fn to_checksum(address: &Address) -> String {
    let hex_addr = hex::encode(address.as_bytes());
    let hash = keccak256(hex_addr.as_bytes());
    let hash_bytes = hash.as_bytes();

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in hex_addr.chars().enumerate() {
        if c.is_ascii_alphabetic() {
            let nibble = if i % 2 == 0 {
                hash_bytes[i / 2] >> 4
            } else {
                hash_bytes[i / 2] & 0x0f
            };
            if nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Check whether a string is a well-formed address (0x + 40 hex digits,
/// any case)
pub fn is_valid_address(s: &str) -> bool {
    match s.strip_prefix("0x") {
        Some(rest) => rest.len() == 40 && rest.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// Check whether a string carries a correct EIP-55 checksum.
///
/// All-lowercase and all-uppercase inputs are accepted as unchecksummed;
/// mixed case must match the checksum exactly.
pub fn is_checksum_valid(s: &str) -> bool {
    if !is_valid_address(s) {
        return false;
    }
    let payload = &s[2..];
    let has_lower = payload.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = payload.chars().any(|c| c.is_ascii_uppercase());
    if !(has_lower && has_upper) {
        return true;
    }
    match Address::from_hex(s) {
        Ok(addr) => to_checksum(&addr) == s,
        Err(_) => false,
    }
}
