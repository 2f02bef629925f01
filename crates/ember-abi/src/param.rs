//! Solidity parameter type grammar.
//!
//! `ParamType` is the canonical on-wire type used for selector and topic
//! hashing: elementary names, tuples rendered `(t1,t2,...)`, and array
//! suffixes `[]`/`[K]`. Parameter names, `indexed` flags, and storage
//! locations never appear in canonical forms.

use crate::AbiError;

/// Solidity parameter type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// 20-byte address
    Address,
    /// Unsigned integer with bit size (8, 16, ..., 256)
    Uint(usize),
    /// Signed integer with bit size
    Int(usize),
    /// Boolean
    Bool,
    /// Dynamic byte string
    Bytes,
    /// Fixed-size bytes (1-32)
    FixedBytes(usize),
    /// UTF-8 string
    String,
    /// Dynamic array
    Array(Box<ParamType>),
    /// Fixed-size array
    FixedArray(Box<ParamType>, usize),
    /// Tuple (struct)
    Tuple(Vec<ParamType>),
}

impl ParamType {
    /// Whether this type is dynamic (encoded in the tail region).
    ///
    /// Fixed arrays and tuples inherit dynamicness from their components.
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::Bytes | ParamType::String | ParamType::Array(_) => true,
            ParamType::FixedArray(inner, _) => inner.is_dynamic(),
            ParamType::Tuple(types) => types.iter().any(|t| t.is_dynamic()),
            _ => false,
        }
    }

    /// Canonical type string used for selector/topic hashing
    pub fn canonical(&self) -> String {
        match self {
            ParamType::Address => "address".to_string(),
            ParamType::Uint(bits) => format!("uint{}", bits),
            ParamType::Int(bits) => format!("int{}", bits),
            ParamType::Bool => "bool".to_string(),
            ParamType::Bytes => "bytes".to_string(),
            ParamType::FixedBytes(size) => format!("bytes{}", size),
            ParamType::String => "string".to_string(),
            ParamType::Array(inner) => format!("{}[]", inner.canonical()),
            ParamType::FixedArray(inner, size) => format!("{}[{}]", inner.canonical(), size),
            ParamType::Tuple(types) => {
                let inner: Vec<String> = types.iter().map(|t| t.canonical()).collect();
                format!("({})", inner.join(","))
            }
        }
    }

    /// Parse a type string.
    ///
    /// Accepts the full grammar including nested arrays (`uint256[3][]`)
    /// and tuples (`(address,uint256)[]`); `uint`/`int` alias to 256 bits.
    /// Component names and storage words inside tuples are tolerated and
    /// discarded.
    pub fn parse(s: &str) -> Result<Self, AbiError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AbiError::invalid("empty type string"));
        }

        // Trailing array suffix binds last: "(a,b)[2][]" is array-of-fixed
        if let Some(stripped) = s.strip_suffix(']') {
            let open = stripped
                .rfind('[')
                .ok_or_else(|| AbiError::invalid(format!("unbalanced brackets in type: {}", s)))?;
            let base = ParamType::parse(&stripped[..open])?;
            let count = stripped[open + 1..].trim();
            return if count.is_empty() {
                Ok(ParamType::Array(Box::new(base)))
            } else {
                let size: usize = count
                    .parse()
                    .map_err(|_| AbiError::invalid(format!("invalid array size: {}", count)))?;
                Ok(ParamType::FixedArray(Box::new(base), size))
            };
        }

        if let Some(inner) = s.strip_prefix('(') {
            let inner = inner
                .strip_suffix(')')
                .ok_or_else(|| AbiError::invalid(format!("unbalanced parens in type: {}", s)))?;
            if inner.trim().is_empty() {
                return Ok(ParamType::Tuple(Vec::new()));
            }
            let components = split_top_level(inner)
                .into_iter()
                .map(|c| {
                    // A tuple component may carry a name or storage word:
                    // "address owner" parses as its leading type token.
                    let type_part = first_type_token(c.trim());
                    ParamType::parse(type_part)
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(ParamType::Tuple(components));
        }

        Self::parse_elementary(s)
    }

    fn parse_elementary(s: &str) -> Result<Self, AbiError> {
        match s {
            "address" => return Ok(ParamType::Address),
            "bool" => return Ok(ParamType::Bool),
            "string" => return Ok(ParamType::String),
            "bytes" => return Ok(ParamType::Bytes),
            "uint" => return Ok(ParamType::Uint(256)),
            "int" => return Ok(ParamType::Int(256)),
            _ => {}
        }

        if let Some(rest) = s.strip_prefix("uint") {
            let bits = parse_int_bits(rest)?;
            return Ok(ParamType::Uint(bits));
        }
        if let Some(rest) = s.strip_prefix("int") {
            let bits = parse_int_bits(rest)?;
            return Ok(ParamType::Int(bits));
        }
        if let Some(rest) = s.strip_prefix("bytes") {
            let size: usize = rest
                .parse()
                .map_err(|_| AbiError::invalid(format!("invalid bytes size: {}", rest)))?;
            if !(1..=32).contains(&size) {
                return Err(AbiError::invalid(format!("bytes size out of range: {}", size)));
            }
            return Ok(ParamType::FixedBytes(size));
        }

        Err(AbiError::invalid(format!("unknown type: {}", s)))
    }
}

fn parse_int_bits(s: &str) -> Result<usize, AbiError> {
    let bits: usize = s
        .parse()
        .map_err(|_| AbiError::invalid(format!("invalid integer width: {}", s)))?;
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(AbiError::invalid(format!("integer width out of range: {}", bits)));
    }
    Ok(bits)
}

/// Split on commas at bracket/paren depth zero
pub(crate) fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// The leading whitespace-delimited token, where parens/brackets keep
/// their contents together ("(address, uint256)[2] pair" yields the type)
pub(crate) fn first_type_token(s: &str) -> &str {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => return &s[..i],
            _ => {}
        }
    }
    s
}
