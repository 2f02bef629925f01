//! ABI decoding.
//!
//! Offsets are bytes from the enclosing tuple start, so every composite
//! decodes against its own frame slice. Shape violations (short data,
//! out-of-range or misaligned offsets, invalid UTF-8) surface as
//! `BadData`.

use ember_primitives::U256;

use crate::{AbiError, I256, ParamType, Token};

/// Decode a byte string against a type tuple
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, AbiError> {
    decode_params(types, data)
}

fn decode_params(types: &[ParamType], frame: &[u8]) -> Result<Vec<Token>, AbiError> {
    let head_size: usize = types.iter().map(head_length).sum();
    if frame.len() < head_size {
        return Err(AbiError::bad_data(format!(
            "frame too short: need {} head bytes, have {}",
            head_size,
            frame.len()
        )));
    }

    let mut tokens = Vec::with_capacity(types.len());
    let mut cursor = 0usize;

    for kind in types {
        if kind.is_dynamic() {
            let offset = read_offset(frame, cursor)?;
            if offset < head_size || offset % 32 != 0 || offset + 32 > frame.len() {
                return Err(AbiError::bad_data(format!(
                    "dynamic offset {} out of range (head {}, frame {})",
                    offset,
                    head_size,
                    frame.len()
                )));
            }
            tokens.push(decode_dynamic(kind, &frame[offset..])?);
            cursor += 32;
        } else {
            let (token, consumed) = decode_static(kind, frame, cursor)?;
            tokens.push(token);
            cursor += consumed;
        }
    }

    Ok(tokens)
}

fn head_length(kind: &ParamType) -> usize {
    match kind {
        ParamType::FixedArray(inner, size) if !inner.is_dynamic() => head_length(inner) * size,
        ParamType::Tuple(types) if !kind.is_dynamic() => types.iter().map(head_length).sum(),
        _ => 32,
    }
}

fn decode_static(
    kind: &ParamType,
    frame: &[u8],
    offset: usize,
) -> Result<(Token, usize), AbiError> {
    match kind {
        ParamType::Address => {
            let word = read_word(frame, offset)?;
            let mut addr = [0u8; 20];
            addr.copy_from_slice(&word[12..]);
            Ok((Token::Address(addr.into()), 32))
        }
        ParamType::Uint(_) => {
            let word = read_word(frame, offset)?;
            Ok((Token::Uint(U256::from_big_endian(&word)), 32))
        }
        ParamType::Int(_) => {
            let word = read_word(frame, offset)?;
            Ok((Token::Int(decode_int_word(&word)), 32))
        }
        ParamType::Bool => {
            let word = read_word(frame, offset)?;
            Ok((Token::Bool(word[31] != 0), 32))
        }
        ParamType::FixedBytes(size) => {
            let word = read_word(frame, offset)?;
            Ok((Token::FixedBytes(word[..*size].to_vec()), 32))
        }
        ParamType::FixedArray(inner, size) => {
            let mut tokens = Vec::with_capacity(*size);
            let mut cursor = offset;
            for _ in 0..*size {
                let (token, consumed) = decode_static(inner, frame, cursor)?;
                tokens.push(token);
                cursor += consumed;
            }
            Ok((Token::FixedArray(tokens), cursor - offset))
        }
        ParamType::Tuple(components) => {
            let mut tokens = Vec::with_capacity(components.len());
            let mut cursor = offset;
            for component in components {
                let (token, consumed) = decode_static(component, frame, cursor)?;
                tokens.push(token);
                cursor += consumed;
            }
            Ok((Token::Tuple(tokens), cursor - offset))
        }
        // dynamic types never reach the static path
        _ => Err(AbiError::bad_data(format!(
            "dynamic type {} in static position",
            kind.canonical()
        ))),
    }
}

fn decode_dynamic(kind: &ParamType, sub: &[u8]) -> Result<Token, AbiError> {
    match kind {
        ParamType::Bytes => Ok(Token::Bytes(decode_byte_string(sub)?)),
        ParamType::String => {
            let bytes = decode_byte_string(sub)?;
            let s = String::from_utf8(bytes)
                .map_err(|e| AbiError::bad_data(format!("invalid utf-8 in string: {}", e)))?;
            Ok(Token::String(s))
        }
        ParamType::Array(inner) => {
            let len = read_offset(sub, 0)?;
            let elements = &sub[32..];
            // each element needs at least one head slot
            if len > elements.len() / 32 {
                return Err(AbiError::bad_data(format!(
                    "array length {} exceeds available data",
                    len
                )));
            }
            let inner_types = vec![(**inner).clone(); len];
            Ok(Token::Array(decode_params(&inner_types, elements)?))
        }
        ParamType::FixedArray(inner, size) => {
            let inner_types = vec![(**inner).clone(); *size];
            Ok(Token::FixedArray(decode_params(&inner_types, sub)?))
        }
        ParamType::Tuple(components) => Ok(Token::Tuple(decode_params(components, sub)?)),
        _ => Err(AbiError::bad_data(format!(
            "static type {} in dynamic position",
            kind.canonical()
        ))),
    }
}

fn decode_byte_string(sub: &[u8]) -> Result<Vec<u8>, AbiError> {
    let len = read_offset(sub, 0)?;
    if sub.len() < 32 + len {
        return Err(AbiError::bad_data(format!(
            "byte string length {} exceeds available data",
            len
        )));
    }
    Ok(sub[32..32 + len].to_vec())
}

fn decode_int_word(word: &[u8; 32]) -> I256 {
    if word[0] & 0x80 == 0 {
        return I256::new(U256::from_big_endian(word), false);
    }
    // negative: magnitude is the two's complement
    let mut flipped = [0u8; 32];
    for i in 0..32 {
        flipped[i] = !word[i];
    }
    let mut carry = 1u16;
    for i in (0..32).rev() {
        let sum = flipped[i] as u16 + carry;
        flipped[i] = sum as u8;
        carry = sum >> 8;
    }
    I256::new(U256::from_big_endian(&flipped), true)
}

fn read_word(frame: &[u8], offset: usize) -> Result<[u8; 32], AbiError> {
    if frame.len() < offset + 32 {
        return Err(AbiError::bad_data(format!(
            "expected 32 bytes at offset {}, frame is {} bytes",
            offset,
            frame.len()
        )));
    }
    let mut word = [0u8; 32];
    word.copy_from_slice(&frame[offset..offset + 32]);
    Ok(word)
}

/// Read a word and narrow it to usize; anything that does not fit a
/// 32-bit length is malformed
fn read_offset(frame: &[u8], offset: usize) -> Result<usize, AbiError> {
    let word = read_word(frame, offset)?;
    let value = U256::from_big_endian(&word);
    if value.bits() > 32 {
        return Err(AbiError::bad_data(format!("offset/length too large: {}", value)));
    }
    Ok(value.as_usize())
}
