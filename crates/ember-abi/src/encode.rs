//! ABI encoding with strict head/tail layout.
//!
//! The head region holds one 32-byte slot per parameter; dynamic
//! parameters put a byte offset there and their payload in the tail.
//! Nested composites open a fresh head/tail scope, so offsets are always
//! relative to the enclosing tuple start.

use ember_primitives::U256;

use crate::{AbiError, I256, ParamType, Token};

/// Encode a value tuple against a type tuple
pub fn encode(types: &[ParamType], tokens: &[Token]) -> Result<Vec<u8>, AbiError> {
    encode_params(types, tokens)
}

/// Encode a function call: 4-byte selector followed by the tuple encoding
pub fn encode_function_call(
    selector: [u8; 4],
    types: &[ParamType],
    tokens: &[Token],
) -> Result<Vec<u8>, AbiError> {
    let mut out = selector.to_vec();
    out.extend(encode_params(types, tokens)?);
    Ok(out)
}

fn encode_params(types: &[ParamType], tokens: &[Token]) -> Result<Vec<u8>, AbiError> {
    if types.len() != tokens.len() {
        return Err(AbiError::invalid(format!(
            "expected {} values, got {}",
            types.len(),
            tokens.len()
        )));
    }

    let head_size: usize = types.iter().map(head_length).sum();
    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for (kind, token) in types.iter().zip(tokens.iter()) {
        if kind.is_dynamic() {
            head.extend(u256_word(U256::from(head_size + tail.len())));
            tail.extend(encode_single(kind, token)?);
        } else {
            head.extend(encode_single(kind, token)?);
        }
    }

    head.extend(tail);
    Ok(head)
}

/// Head slot width of a type: static composites inline their components,
/// everything else takes one 32-byte slot
fn head_length(kind: &ParamType) -> usize {
    match kind {
        ParamType::FixedArray(inner, size) if !inner.is_dynamic() => head_length(inner) * size,
        ParamType::Tuple(types) if !kind.is_dynamic() => types.iter().map(head_length).sum(),
        _ => 32,
    }
}

fn encode_single(kind: &ParamType, token: &Token) -> Result<Vec<u8>, AbiError> {
    match (kind, token) {
        (ParamType::Address, Token::Address(addr)) => {
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(addr.as_bytes());
            Ok(word.to_vec())
        }
        (ParamType::Uint(bits), Token::Uint(value)) => {
            if value.bits() > *bits {
                return Err(AbiError::invalid(format!(
                    "value {} does not fit uint{}",
                    value, bits
                )));
            }
            Ok(u256_word(*value))
        }
        (ParamType::Int(bits), Token::Int(value)) => encode_int(*bits, value),
        (ParamType::Bool, Token::Bool(b)) => {
            let mut word = [0u8; 32];
            word[31] = *b as u8;
            Ok(word.to_vec())
        }
        (ParamType::FixedBytes(size), Token::FixedBytes(data)) => {
            if data.len() != *size {
                return Err(AbiError::invalid(format!(
                    "expected bytes{}, got {} bytes",
                    size,
                    data.len()
                )));
            }
            let mut word = [0u8; 32];
            word[..data.len()].copy_from_slice(data);
            Ok(word.to_vec())
        }
        (ParamType::Bytes, Token::Bytes(data)) => Ok(encode_byte_string(data)),
        (ParamType::String, Token::String(s)) => Ok(encode_byte_string(s.as_bytes())),
        (ParamType::Array(inner), Token::Array(tokens)) => {
            let mut out = u256_word(U256::from(tokens.len()));
            let inner_types = vec![(**inner).clone(); tokens.len()];
            out.extend(encode_params(&inner_types, tokens)?);
            Ok(out)
        }
        (ParamType::FixedArray(inner, size), Token::FixedArray(tokens)) => {
            if tokens.len() != *size {
                return Err(AbiError::invalid(format!(
                    "expected {} elements, got {}",
                    size,
                    tokens.len()
                )));
            }
            let inner_types = vec![(**inner).clone(); tokens.len()];
            encode_params(&inner_types, tokens)
        }
        (ParamType::Tuple(components), Token::Tuple(tokens)) => encode_params(components, tokens),
        (kind, token) => Err(AbiError::invalid(format!(
            "value {:?} does not match type {}",
            token,
            kind.canonical()
        ))),
    }
}

fn encode_int(bits: usize, value: &I256) -> Result<Vec<u8>, AbiError> {
    let limit_bits = bits - 1;
    let in_range = if value.negative {
        // -2^(bits-1) is representable
        value.abs <= (U256::one() << limit_bits)
    } else {
        value.abs.bits() <= limit_bits
    };
    if !in_range {
        return Err(AbiError::invalid(format!(
            "value {} does not fit int{}",
            value.to_decimal(),
            bits
        )));
    }

    if value.negative {
        // two's complement: !abs + 1, sign-extended with 0xff
        let abs = u256_word(value.abs);
        let mut word = [0u8; 32];
        for i in 0..32 {
            word[i] = !abs[i];
        }
        let mut carry = 1u16;
        for i in (0..32).rev() {
            let sum = word[i] as u16 + carry;
            word[i] = sum as u8;
            carry = sum >> 8;
        }
        Ok(word.to_vec())
    } else {
        Ok(u256_word(value.abs))
    }
}

/// Length word followed by the data, right-padded to a 32-byte multiple
fn encode_byte_string(data: &[u8]) -> Vec<u8> {
    let mut out = u256_word(U256::from(data.len()));
    let padded_len = data.len().div_ceil(32) * 32;
    let mut padded = vec![0u8; padded_len];
    padded[..data.len()].copy_from_slice(data);
    out.extend(padded);
    out
}

pub(crate) fn u256_word(value: U256) -> Vec<u8> {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word.to_vec()
}
