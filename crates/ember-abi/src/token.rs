//! ABI value model.
//!
//! `Token` is the typed value crossing the ABI boundary. Integers cross
//! the boundary loosely (decimal strings, 0x-hex strings, or native
//! integers) via [`Token::coerce`]; internally everything is
//! arbitrary-precision.

use ember_primitives::{hex_ops, Address, H256, U256};
use serde_json::Value;

use crate::{AbiError, ParamType};

/// Signed 256-bit integer, sign-magnitude form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct I256 {
    /// Absolute value
    pub abs: U256,
    /// Sign (true if negative)
    pub negative: bool,
}

impl I256 {
    /// Create from magnitude and sign
    pub fn new(abs: U256, negative: bool) -> Self {
        // normalize the zero sign
        let negative = negative && !abs.is_zero();
        Self { abs, negative }
    }

    /// Create from a native i128
    pub fn from_i128(value: i128) -> Self {
        if value < 0 {
            Self::new(U256::from(value.unsigned_abs()), true)
        } else {
            Self::new(U256::from(value as u128), false)
        }
    }

    /// Parse from a decimal string with optional leading `-`
    pub fn from_dec_str(s: &str) -> Result<Self, AbiError> {
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let abs = U256::from_dec_str(digits)
            .map_err(|_| AbiError::invalid(format!("invalid decimal integer: {}", s)))?;
        Ok(Self::new(abs, negative))
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.abs.is_zero()
    }

    /// Decimal rendering with sign
    pub fn to_decimal(&self) -> String {
        if self.negative {
            format!("-{}", self.abs)
        } else {
            self.abs.to_string()
        }
    }
}

/// ABI value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Address (20 bytes)
    Address(Address),
    /// Unsigned integer
    Uint(U256),
    /// Signed integer
    Int(I256),
    /// Boolean
    Bool(bool),
    /// Dynamic byte string
    Bytes(Vec<u8>),
    /// Fixed-size bytes (1-32)
    FixedBytes(Vec<u8>),
    /// UTF-8 string
    String(String),
    /// Dynamic array
    Array(Vec<Token>),
    /// Fixed-size array
    FixedArray(Vec<Token>),
    /// Tuple (struct)
    Tuple(Vec<Token>),
}

impl Token {
    /// Create a uint token from anything convertible to U256
    pub fn uint(value: impl Into<U256>) -> Self {
        Token::Uint(value.into())
    }

    /// Create an address token from a hex string
    pub fn address(s: &str) -> Result<Self, AbiError> {
        let addr = Address::from_hex(s)
            .map_err(|e| AbiError::invalid(format!("invalid address: {}", e)))?;
        Ok(Token::Address(addr))
    }

    /// Create a bytes32 token from an H256
    pub fn bytes32(hash: H256) -> Self {
        Token::FixedBytes(hash.as_bytes().to_vec())
    }

    /// Coerce a loosely typed JSON value into a token of the given type.
    ///
    /// Integers are accepted as decimal strings, 0x-hex strings, or
    /// native JSON integers; addresses and byte strings as hex strings;
    /// composites as JSON arrays.
    pub fn coerce(kind: &ParamType, value: &Value) -> Result<Token, AbiError> {
        match kind {
            ParamType::Address => match value {
                Value::String(s) => Token::address(s),
                _ => Err(coerce_err(kind, value)),
            },
            ParamType::Uint(_) => Ok(Token::Uint(coerce_uint(value)?)),
            ParamType::Int(_) => Ok(Token::Int(coerce_int(value)?)),
            ParamType::Bool => match value {
                Value::Bool(b) => Ok(Token::Bool(*b)),
                _ => Err(coerce_err(kind, value)),
            },
            ParamType::Bytes => Ok(Token::Bytes(coerce_hex_bytes(value)?)),
            ParamType::FixedBytes(size) => {
                let bytes = coerce_hex_bytes(value)?;
                if bytes.len() != *size {
                    return Err(AbiError::invalid(format!(
                        "expected {} bytes, got {}",
                        size,
                        bytes.len()
                    )));
                }
                Ok(Token::FixedBytes(bytes))
            }
            ParamType::String => match value {
                Value::String(s) => Ok(Token::String(s.clone())),
                _ => Err(coerce_err(kind, value)),
            },
            ParamType::Array(inner) => {
                let items = as_array(kind, value)?;
                let tokens = items
                    .iter()
                    .map(|v| Token::coerce(inner, v))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Token::Array(tokens))
            }
            ParamType::FixedArray(inner, size) => {
                let items = as_array(kind, value)?;
                if items.len() != *size {
                    return Err(AbiError::invalid(format!(
                        "expected {} elements, got {}",
                        size,
                        items.len()
                    )));
                }
                let tokens = items
                    .iter()
                    .map(|v| Token::coerce(inner, v))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Token::FixedArray(tokens))
            }
            ParamType::Tuple(components) => {
                let items = as_array(kind, value)?;
                if items.len() != components.len() {
                    return Err(AbiError::invalid(format!(
                        "expected {} tuple components, got {}",
                        components.len(),
                        items.len()
                    )));
                }
                let tokens = components
                    .iter()
                    .zip(items.iter())
                    .map(|(c, v)| Token::coerce(c, v))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Token::Tuple(tokens))
            }
        }
    }

    /// Render a decoded token back into loose JSON form.
    ///
    /// Integers become decimal strings, addresses lowercase hex, byte
    /// strings 0x-hex.
    pub fn to_value(&self) -> Value {
        match self {
            Token::Address(addr) => Value::String(addr.to_hex()),
            Token::Uint(n) => Value::String(n.to_string()),
            Token::Int(n) => Value::String(n.to_decimal()),
            Token::Bool(b) => Value::Bool(*b),
            Token::Bytes(b) | Token::FixedBytes(b) => Value::String(hex_ops::bytes_to_hex(b)),
            Token::String(s) => Value::String(s.clone()),
            Token::Array(items) | Token::FixedArray(items) | Token::Tuple(items) => {
                Value::Array(items.iter().map(|t| t.to_value()).collect())
            }
        }
    }
}

fn as_array<'a>(kind: &ParamType, value: &'a Value) -> Result<&'a Vec<Value>, AbiError> {
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(coerce_err(kind, value)),
    }
}

fn coerce_err(kind: &ParamType, value: &Value) -> AbiError {
    AbiError::invalid(format!("cannot coerce {} into {}", value, kind.canonical()))
}

fn coerce_uint(value: &Value) -> Result<U256, AbiError> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Ok(U256::from(u))
            } else {
                Err(AbiError::invalid(format!("negative or fractional uint: {}", n)))
            }
        }
        Value::String(s) => {
            if s.starts_with("0x") || s.starts_with("0X") {
                hex_ops::hex_to_u256(s).map_err(|e| AbiError::invalid(e.to_string()))
            } else if s.starts_with('-') {
                Err(AbiError::invalid(format!("negative value for uint: {}", s)))
            } else {
                U256::from_dec_str(s)
                    .map_err(|_| AbiError::invalid(format!("invalid decimal integer: {}", s)))
            }
        }
        _ => Err(AbiError::invalid(format!("cannot coerce {} into uint", value))),
    }
}

fn coerce_int(value: &Value) -> Result<I256, AbiError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(I256::from_i128(i as i128))
            } else {
                Err(AbiError::invalid(format!("fractional int: {}", n)))
            }
        }
        Value::String(s) => {
            if s.starts_with("0x") || s.starts_with("0X") {
                let abs = hex_ops::hex_to_u256(s).map_err(|e| AbiError::invalid(e.to_string()))?;
                Ok(I256::new(abs, false))
            } else {
                I256::from_dec_str(s)
            }
        }
        _ => Err(AbiError::invalid(format!("cannot coerce {} into int", value))),
    }
}

fn coerce_hex_bytes(value: &Value) -> Result<Vec<u8>, AbiError> {
    match value {
        Value::String(s) if s.starts_with("0x") || s.starts_with("0X") => {
            hex_ops::hex_to_bytes(s).map_err(|e| AbiError::invalid(e.to_string()))
        }
        _ => Err(AbiError::invalid(format!("expected 0x-hex string, got {}", value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_uint_forms() {
        let kind = ParamType::Uint(256);
        let expected = Token::Uint(U256::from(1_000_000_000_000_000_000u128));

        assert_eq!(Token::coerce(&kind, &json!("1000000000000000000")).unwrap(), expected);
        assert_eq!(Token::coerce(&kind, &json!("0xde0b6b3a7640000")).unwrap(), expected);
        assert_eq!(
            Token::coerce(&kind, &json!(21000u64)).unwrap(),
            Token::Uint(U256::from(21000u64))
        );
    }

    #[test]
    fn test_coerce_negative_uint_rejected() {
        assert!(Token::coerce(&ParamType::Uint(256), &json!("-5")).is_err());
        assert!(Token::coerce(&ParamType::Uint(256), &json!(-5)).is_err());
    }

    #[test]
    fn test_coerce_int() {
        let token = Token::coerce(&ParamType::Int(256), &json!("-42")).unwrap();
        assert_eq!(token, Token::Int(I256::from_i128(-42)));
    }

    #[test]
    fn test_coerce_address_lowercases() {
        let token = Token::coerce(
            &ParamType::Address,
            &json!("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d"),
        )
        .unwrap();
        assert_eq!(
            token.to_value(),
            json!("0x742d35cc6634c0532925a3b844bc9e7595f0ab3d")
        );
    }

    #[test]
    fn test_coerce_fixed_bytes_length_checked() {
        assert!(Token::coerce(&ParamType::FixedBytes(4), &json!("0x12345678")).is_ok());
        assert!(Token::coerce(&ParamType::FixedBytes(4), &json!("0x1234")).is_err());
    }

    #[test]
    fn test_coerce_composites() {
        let kind = ParamType::parse("(address,uint256)[]").unwrap();
        let token = Token::coerce(
            &kind,
            &json!([["0x1234567890123456789012345678901234567890", "7"]]),
        )
        .unwrap();
        match token {
            Token::Array(items) => {
                assert_eq!(items.len(), 1);
                assert!(matches!(items[0], Token::Tuple(_)));
            }
            _ => panic!("expected array token"),
        }
    }

    #[test]
    fn test_i256_zero_sign_normalized() {
        assert_eq!(I256::new(U256::zero(), true), I256::from_i128(0));
        assert_eq!(I256::from_dec_str("-0").unwrap().to_decimal(), "0");
    }

    #[test]
    fn test_i256_decimal_roundtrip() {
        for s in ["0", "1", "-1", "340282366920938463463374607431768211456"] {
            assert_eq!(I256::from_dec_str(s).unwrap().to_decimal(), s);
        }
    }
}
