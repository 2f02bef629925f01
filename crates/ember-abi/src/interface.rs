//! Indexed contract description.
//!
//! An [`Interface`] holds the fragments of one contract and resolves
//! them by name, canonical signature, or selector/topic. It owns every
//! call/result/event/error codec the SDK layers on top of it.

use std::collections::HashMap;

use ember_crypto::keccak256;
use ember_primitives::H256;
use serde_json::Value;

use crate::encode::encode_function_call;
use crate::fragment::{
    ConstructorFragment, ErrorFragment, EventFragment, FormatStyle, Fragment, FunctionFragment,
    Param,
};
use crate::{decode, encode, AbiError, ParamType, Token};

/// Selector of the standard `Error(string)` revert
pub const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Ordered decode result with name aliases.
///
/// Elements are positional; parameters with a non-empty ABI name can
/// also be fetched by name, anonymous positions alias `argN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedParams {
    tokens: Vec<Token>,
    names: Vec<String>,
}

impl DecodedParams {
    pub(crate) fn new(tokens: Vec<Token>, params: &[Param]) -> Self {
        let names = params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                if p.name.is_empty() {
                    format!("arg{}", i)
                } else {
                    p.name.clone()
                }
            })
            .collect();
        Self { tokens, names }
    }

    /// Number of decoded values
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the result is empty
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Positional access
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Access by parameter name (or `argN` alias)
    pub fn by_name(&self, name: &str) -> Option<&Token> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.tokens.get(i))
    }

    /// The decoded tokens in declaration order
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Consume into the token list
    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    /// Parameter names in declaration order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Loose JSON rendering (integers as decimal strings)
    pub fn to_json(&self) -> Value {
        Value::Array(self.tokens.iter().map(|t| t.to_value()).collect())
    }
}

impl std::ops::Index<usize> for DecodedParams {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}

/// A decoded event log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLog {
    /// Event name
    pub name: String,
    /// Event parameters in declaration order. Indexed reference types
    /// surface the raw 32-byte topic since the value is unrecoverable.
    pub params: DecodedParams,
}

/// A decoded revert payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedError {
    /// Standard `Error(string)` revert
    Revert {
        /// The embedded reason string
        reason: String,
    },
    /// A custom error known to this interface
    Custom {
        /// Error name
        name: String,
        /// Decoded error parameters
        params: DecodedParams,
    },
    /// Revert data whose selector matches nothing known
    Unknown {
        /// Leading 4 bytes
        selector: [u8; 4],
        /// Full revert payload
        data: Vec<u8>,
    },
}

/// The indexed collection of fragments belonging to one contract
#[derive(Debug, Clone)]
pub struct Interface {
    fragments: Vec<Fragment>,
    functions: Vec<FunctionFragment>,
    events: Vec<EventFragment>,
    errors: Vec<ErrorFragment>,
    constructor: Option<ConstructorFragment>,
    functions_by_name: HashMap<String, Vec<usize>>,
    events_by_name: HashMap<String, Vec<usize>>,
}

impl Interface {
    /// Build an interface from parsed fragments
    pub fn new(fragments: Vec<Fragment>) -> Self {
        let mut functions = Vec::new();
        let mut events = Vec::new();
        let mut errors = Vec::new();
        let mut constructor = None;
        let mut functions_by_name: HashMap<String, Vec<usize>> = HashMap::new();
        let mut events_by_name: HashMap<String, Vec<usize>> = HashMap::new();

        for fragment in &fragments {
            match fragment {
                Fragment::Function(f) => {
                    functions_by_name
                        .entry(f.name.clone())
                        .or_default()
                        .push(functions.len());
                    functions.push(f.clone());
                }
                Fragment::Event(e) => {
                    events_by_name.entry(e.name.clone()).or_default().push(events.len());
                    events.push(e.clone());
                }
                Fragment::Error(e) => errors.push(e.clone()),
                Fragment::Constructor(c) => constructor = Some(c.clone()),
                Fragment::Receive | Fragment::Fallback { .. } => {}
            }
        }

        Self {
            fragments,
            functions,
            events,
            errors,
            constructor,
            functions_by_name,
            events_by_name,
        }
    }

    /// Parse an interface from terse human-readable fragment strings
    pub fn from_human_readable<I, S>(fragments: I) -> Result<Self, AbiError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = fragments
            .into_iter()
            .map(|s| Fragment::parse(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(parsed))
    }

    /// Parse an interface from a JSON ABI array
    pub fn from_json(json: &str) -> Result<Self, AbiError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| AbiError::invalid(format!("malformed ABI JSON: {}", e)))?;
        let entries = value
            .as_array()
            .ok_or_else(|| AbiError::invalid("ABI JSON must be an array"))?;
        let parsed = entries
            .iter()
            .map(Fragment::from_json)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(parsed))
    }

    /// All fragments in declaration order
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// All function fragments
    pub fn functions(&self) -> &[FunctionFragment] {
        &self.functions
    }

    /// All event fragments
    pub fn events(&self) -> &[EventFragment] {
        &self.events
    }

    /// All custom error fragments
    pub fn errors(&self) -> &[ErrorFragment] {
        &self.errors
    }

    /// The constructor fragment, if declared
    pub fn constructor(&self) -> Option<&ConstructorFragment> {
        self.constructor.as_ref()
    }

    /// Format every fragment; `Json` yields a JSON ABI array, the other
    /// styles join one fragment per line
    pub fn format(&self, style: FormatStyle) -> String {
        match style {
            FormatStyle::Json => {
                Value::Array(self.fragments.iter().map(|f| f.to_json()).collect()).to_string()
            }
            style => {
                let lines: Vec<String> =
                    self.fragments.iter().map(|f| f.format(style)).collect();
                lines.join("\n")
            }
        }
    }

    // ---- fragment resolution ----

    /// Resolve a function by name, full signature, or 0x-selector.
    ///
    /// A bare name that is overloaded fails with `InvalidArgument`
    /// unless the arity disambiguates it; pass the full signature then.
    pub fn get_function(&self, key: &str) -> Result<&FunctionFragment, AbiError> {
        self.resolve_function(key, None)
    }

    fn resolve_function(
        &self,
        key: &str,
        arity: Option<usize>,
    ) -> Result<&FunctionFragment, AbiError> {
        let key = key.trim();

        if let Some(selector) = parse_hex_selector(key) {
            return self
                .functions
                .iter()
                .find(|f| f.selector() == selector)
                .ok_or_else(|| AbiError::invalid(format!("no function with selector {}", key)));
        }

        if key.contains('(') {
            let canonical = canonicalize_signature("function", key)?;
            return self
                .functions
                .iter()
                .find(|f| f.signature() == canonical)
                .ok_or_else(|| AbiError::invalid(format!("no function matching {}", canonical)));
        }

        let candidates = self
            .functions_by_name
            .get(key)
            .map(|v| v.as_slice())
            .unwrap_or_default();
        match candidates {
            [] => Err(AbiError::invalid(format!("unknown function: {}", key))),
            [single] => Ok(&self.functions[*single]),
            many => {
                if let Some(arity) = arity {
                    let matching: Vec<usize> = many
                        .iter()
                        .copied()
                        .filter(|&i| self.functions[i].inputs.len() == arity)
                        .collect();
                    if let [single] = matching.as_slice() {
                        return Ok(&self.functions[*single]);
                    }
                }
                Err(AbiError::invalid(format!(
                    "ambiguous function name {}: pass the full signature",
                    key
                )))
            }
        }
    }

    /// Resolve an event by name, full signature, or 0x-topic
    pub fn get_event(&self, key: &str) -> Result<&EventFragment, AbiError> {
        let key = key.trim();

        if let Some(topic) = parse_hex_topic(key) {
            return self
                .events
                .iter()
                .find(|e| e.topic() == topic)
                .ok_or_else(|| AbiError::invalid(format!("no event with topic {}", key)));
        }

        if key.contains('(') {
            let canonical = canonicalize_signature("event", key)?;
            return self
                .events
                .iter()
                .find(|e| e.signature() == canonical)
                .ok_or_else(|| AbiError::invalid(format!("no event matching {}", canonical)));
        }

        let candidates = self
            .events_by_name
            .get(key)
            .map(|v| v.as_slice())
            .unwrap_or_default();
        match candidates {
            [] => Err(AbiError::invalid(format!("unknown event: {}", key))),
            [single] => Ok(&self.events[*single]),
            _ => Err(AbiError::invalid(format!(
                "ambiguous event name {}: pass the full signature",
                key
            ))),
        }
    }

    /// Resolve a custom error by name, full signature, or 0x-selector
    pub fn get_error(&self, key: &str) -> Result<&ErrorFragment, AbiError> {
        let key = key.trim();

        if let Some(selector) = parse_hex_selector(key) {
            return self
                .errors
                .iter()
                .find(|e| e.selector() == selector)
                .ok_or_else(|| AbiError::invalid(format!("no error with selector {}", key)));
        }

        if key.contains('(') {
            let canonical = canonicalize_signature("error", key)?;
            return self
                .errors
                .iter()
                .find(|e| e.signature() == canonical)
                .ok_or_else(|| AbiError::invalid(format!("no error matching {}", canonical)));
        }

        self.errors
            .iter()
            .find(|e| e.name == key)
            .ok_or_else(|| AbiError::invalid(format!("unknown error: {}", key)))
    }

    // ---- call data ----

    /// Encode a function call: selector followed by the argument tuple
    pub fn encode_function_data(&self, key: &str, args: &[Token]) -> Result<Vec<u8>, AbiError> {
        let function = self.resolve_function(key, Some(args.len()))?;
        if args.len() != function.inputs.len() {
            return Err(AbiError::invalid(format!(
                "{} expects {} arguments, got {}",
                function.signature(),
                function.inputs.len(),
                args.len()
            )));
        }
        let types = param_types(&function.inputs);
        encode_function_call(function.selector(), &types, args)
    }

    /// Decode the argument tuple of an encoded call
    pub fn decode_function_data(&self, key: &str, data: &[u8]) -> Result<DecodedParams, AbiError> {
        let function = self.resolve_function(key, None)?;
        if data.len() < 4 || data[..4] != function.selector() {
            return Err(AbiError::bad_data(format!(
                "data does not start with the {} selector",
                function.signature()
            )));
        }
        let tokens = decode(&param_types(&function.inputs), &data[4..])?;
        Ok(DecodedParams::new(tokens, &function.inputs))
    }

    /// Decode a call result against the function's outputs
    pub fn decode_function_result(
        &self,
        key: &str,
        data: &[u8],
    ) -> Result<DecodedParams, AbiError> {
        let function = self.resolve_function(key, None)?;
        let tokens = decode(&param_types(&function.outputs), data)?;
        Ok(DecodedParams::new(tokens, &function.outputs))
    }

    /// Encode constructor arguments for deployment; empty when the
    /// contract declares no constructor
    pub fn encode_deploy(&self, args: &[Token]) -> Result<Vec<u8>, AbiError> {
        match &self.constructor {
            Some(constructor) => {
                if args.len() != constructor.inputs.len() {
                    return Err(AbiError::invalid(format!(
                        "constructor expects {} arguments, got {}",
                        constructor.inputs.len(),
                        args.len()
                    )));
                }
                encode(&param_types(&constructor.inputs), args)
            }
            None if args.is_empty() => Ok(Vec::new()),
            None => Err(AbiError::invalid("contract has no constructor")),
        }
    }

    // ---- events ----

    /// Build the topic filter for an event: topic0 plus one slot per
    /// provided indexed value, nulls preserved as wildcards
    pub fn encode_event_topics(
        &self,
        key: &str,
        args: &[Option<Token>],
    ) -> Result<Vec<Option<H256>>, AbiError> {
        let event = self.get_event(key)?;
        let indexed: Vec<&Param> = event.inputs.iter().filter(|p| p.indexed).collect();
        if args.len() > indexed.len() {
            return Err(AbiError::invalid(format!(
                "{} has {} indexed parameters, got {} filter values",
                event.signature(),
                indexed.len(),
                args.len()
            )));
        }

        let mut topics = Vec::with_capacity(1 + args.len());
        if !event.anonymous {
            topics.push(Some(event.topic()));
        }
        for (param, arg) in indexed.iter().zip(args.iter()) {
            match arg {
                None => topics.push(None),
                Some(token) => topics.push(Some(topic_for_value(&param.kind, token)?)),
            }
        }
        Ok(topics)
    }

    /// Decode an event log: indexed values from topics[1..], the rest
    /// from the data tuple
    pub fn decode_event_log(&self, topics: &[H256], data: &[u8]) -> Result<DecodedLog, AbiError> {
        let topic0 = topics
            .first()
            .ok_or_else(|| AbiError::bad_data("log has no topics"))?;
        let event = self
            .events
            .iter()
            .find(|e| !e.anonymous && e.topic() == *topic0)
            .ok_or_else(|| AbiError::invalid(format!("no event matches topic {}", topic0)))?;

        let indexed_count = event.inputs.iter().filter(|p| p.indexed).count();
        if topics.len() != indexed_count + 1 {
            return Err(AbiError::bad_data(format!(
                "{} expects {} topics, log has {}",
                event.signature(),
                indexed_count + 1,
                topics.len()
            )));
        }

        let body_types: Vec<ParamType> = event
            .inputs
            .iter()
            .filter(|p| !p.indexed)
            .map(|p| p.kind.clone())
            .collect();
        let mut body_tokens = decode(&body_types, data)?.into_iter();
        let mut topic_cursor = 1usize;

        let mut tokens = Vec::with_capacity(event.inputs.len());
        for param in &event.inputs {
            if param.indexed {
                let topic = topics[topic_cursor];
                topic_cursor += 1;
                tokens.push(decode_topic_value(&param.kind, &topic)?);
            } else {
                // counts were checked above, the iterator cannot run dry
                let token = body_tokens
                    .next()
                    .ok_or_else(|| AbiError::bad_data("event data shorter than declared"))?;
                tokens.push(token);
            }
        }

        Ok(DecodedLog {
            name: event.name.clone(),
            params: DecodedParams::new(tokens, &event.inputs),
        })
    }

    // ---- errors ----

    /// Decode revert data: the standard `Error(string)` revert, a custom
    /// error known to this interface, or `Unknown` with the raw payload
    pub fn decode_error_result(&self, data: &[u8]) -> Result<DecodedError, AbiError> {
        if data.len() < 4 {
            return Err(AbiError::bad_data(format!(
                "revert data too short: {} bytes",
                data.len()
            )));
        }
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&data[..4]);

        if selector == ERROR_STRING_SELECTOR {
            let tokens = decode(&[ParamType::String], &data[4..])?;
            if let Some(Token::String(reason)) = tokens.into_iter().next() {
                return Ok(DecodedError::Revert { reason });
            }
            return Err(AbiError::bad_data("malformed Error(string) payload"));
        }

        if let Some(error) = self.errors.iter().find(|e| e.selector() == selector) {
            let tokens = decode(&param_types(&error.inputs), &data[4..])?;
            return Ok(DecodedError::Custom {
                name: error.name.clone(),
                params: DecodedParams::new(tokens, &error.inputs),
            });
        }

        Ok(DecodedError::Unknown { selector, data: data.to_vec() })
    }

    /// Extract a human-readable revert reason when the data carries one
    pub fn decode_revert_reason(&self, data: &[u8]) -> Option<String> {
        match self.decode_error_result(data) {
            Ok(DecodedError::Revert { reason }) => Some(reason),
            Ok(DecodedError::Custom { name, params }) => {
                Some(format!("{}{}", name, params.to_json()))
            }
            _ => None,
        }
    }
}

fn param_types(params: &[Param]) -> Vec<ParamType> {
    params.iter().map(|p| p.kind.clone()).collect()
}

fn parse_hex_selector(key: &str) -> Option<[u8; 4]> {
    let rest = key.strip_prefix("0x")?;
    if rest.len() != 8 {
        return None;
    }
    let bytes = hex::decode(rest).ok()?;
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&bytes);
    Some(selector)
}

fn parse_hex_topic(key: &str) -> Option<H256> {
    let rest = key.strip_prefix("0x")?;
    if rest.len() != 64 {
        return None;
    }
    H256::from_hex(key).ok()
}

/// Normalize a user-supplied signature ("transfer(address to, uint256)")
/// to canonical form via the fragment parser
fn canonicalize_signature(keyword: &str, key: &str) -> Result<String, AbiError> {
    let fragment = Fragment::parse(&format!("{} {}", keyword, key))?;
    match fragment {
        Fragment::Function(f) => Ok(f.signature()),
        Fragment::Event(e) => Ok(e.signature()),
        Fragment::Error(e) => Ok(e.signature()),
        _ => Err(AbiError::invalid(format!("not a {} signature: {}", keyword, key))),
    }
}

/// The topic word for an indexed value: static types encode in place,
/// reference types hash with keccak-256 (the original value is not
/// recoverable from the topic)
fn topic_for_value(kind: &ParamType, token: &Token) -> Result<H256, AbiError> {
    match (kind, token) {
        (ParamType::String, Token::String(s)) => Ok(keccak256(s.as_bytes())),
        (ParamType::Bytes, Token::Bytes(b)) => Ok(keccak256(b)),
        (kind, token) if !kind.is_dynamic() && !matches!(kind, ParamType::Tuple(_) | ParamType::FixedArray(..)) => {
            let word = encode(std::slice::from_ref(kind), std::slice::from_ref(token))?;
            H256::from_slice(&word).map_err(|e| AbiError::bad_data(e.to_string()))
        }
        (kind, token) => {
            // arrays and structs hash their element encoding
            let encoded = encode(std::slice::from_ref(kind), std::slice::from_ref(token))?;
            Ok(keccak256(&encoded))
        }
    }
}

fn decode_topic_value(kind: &ParamType, topic: &H256) -> Result<Token, AbiError> {
    if kind.is_dynamic() || matches!(kind, ParamType::Tuple(_) | ParamType::FixedArray(..)) {
        // reference type: only the hash survives
        return Ok(Token::FixedBytes(topic.as_bytes().to_vec()));
    }
    let tokens = decode(std::slice::from_ref(kind), topic.as_bytes())?;
    tokens
        .into_iter()
        .next()
        .ok_or_else(|| AbiError::bad_data("empty topic decode"))
}

/// 4-byte selector of a canonical signature, e.g.
/// `id("transfer(address,uint256)")`
pub fn id(signature: &str) -> [u8; 4] {
    crate::fragment::signature_selector(signature)
}

/// Full 32-byte topic hash of a canonical event signature
pub fn event_topic(signature: &str) -> H256 {
    keccak256(signature.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_primitives::{Address, U256};

    fn erc20() -> Interface {
        Interface::from_human_readable([
            "function name() view returns (string)",
            "function symbol() view returns (string)",
            "function decimals() view returns (uint8)",
            "function totalSupply() view returns (uint256)",
            "function balanceOf(address owner) view returns (uint256)",
            "function transfer(address to, uint256 amount) returns (bool)",
            "function approve(address spender, uint256 amount) returns (bool)",
            "function transferFrom(address from, address to, uint256 amount) returns (bool)",
            "event Transfer(address indexed from, address indexed to, uint256 value)",
            "event Approval(address indexed owner, address indexed spender, uint256 value)",
            "error InsufficientBalance(uint256 available, uint256 required)",
        ])
        .unwrap()
    }

    #[test]
    fn test_encode_transfer_call() {
        let iface = erc20();
        let data = iface
            .encode_function_data(
                "transfer",
                &[
                    Token::address("0x1234567890123456789012345678901234567890").unwrap(),
                    Token::Uint(U256::from_dec_str("1000000000000000000").unwrap()),
                ],
            )
            .unwrap();
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(data.len(), 68);
        // second word ends with 0x0de0b6b3a7640000
        assert_eq!(&data[60..], &[0x0d, 0xe0, 0xb6, 0xb3, 0xa7, 0x64, 0x00, 0x00]);
    }

    #[test]
    fn test_decode_function_data_roundtrip() {
        let iface = erc20();
        let args = vec![
            Token::address("0x742d35cc6634c0532925a3b844bc9e7595f0ab3d").unwrap(),
            Token::uint(777u64),
        ];
        let data = iface.encode_function_data("transfer", &args).unwrap();
        let decoded = iface.decode_function_data("transfer", &data).unwrap();
        assert_eq!(decoded.tokens(), &args[..]);
        assert_eq!(decoded.by_name("to"), Some(&args[0]));
        assert_eq!(decoded.by_name("amount"), Some(&args[1]));
    }

    #[test]
    fn test_decode_function_result() {
        let iface = erc20();
        let mut data = vec![0u8; 32];
        data[31] = 18;
        let decoded = iface.decode_function_result("decimals", &data).unwrap();
        assert_eq!(decoded[0], Token::Uint(U256::from(18)));
        // anonymous output aliases arg0
        assert_eq!(decoded.by_name("arg0"), Some(&decoded[0]));
    }

    #[test]
    fn test_lookup_by_selector_and_signature() {
        let iface = erc20();
        assert_eq!(iface.get_function("0xa9059cbb").unwrap().name, "transfer");
        assert_eq!(
            iface.get_function("transfer(address,uint256)").unwrap().name,
            "transfer"
        );
        // named parameters in the lookup signature are fine
        assert_eq!(
            iface.get_function("transfer(address to, uint256 amount)").unwrap().name,
            "transfer"
        );
        assert!(iface.get_function("mint").is_err());
    }

    #[test]
    fn test_overload_resolution() {
        let iface = Interface::from_human_readable([
            "function withdraw()",
            "function withdraw(uint256 amount)",
        ])
        .unwrap();

        // bare ambiguous name fails
        assert!(iface.get_function("withdraw").is_err());
        // arity disambiguates through encode
        let data = iface
            .encode_function_data("withdraw", &[Token::uint(5u64)])
            .unwrap();
        assert_eq!(&data[..4], &id("withdraw(uint256)"));
        let empty = iface.encode_function_data("withdraw", &[]).unwrap();
        assert_eq!(&empty[..], &id("withdraw()"));
        // full signature always works
        assert!(iface.get_function("withdraw(uint256)").is_ok());
    }

    #[test]
    fn test_encode_deploy() {
        let iface = Interface::from_human_readable([
            "constructor(string name, string symbol)",
            "function name() view returns (string)",
        ])
        .unwrap();
        let data = iface
            .encode_deploy(&[
                Token::String("Ember".to_string()),
                Token::String("EMB".to_string()),
            ])
            .unwrap();
        // two offset slots followed by two string payloads
        assert_eq!(data.len(), 192);

        let bare = Interface::from_human_readable(["function f()"]).unwrap();
        assert!(bare.encode_deploy(&[]).unwrap().is_empty());
        assert!(bare.encode_deploy(&[Token::Bool(true)]).is_err());
    }

    #[test]
    fn test_encode_event_topics() {
        let iface = erc20();
        let from = "0x1111111111111111111111111111111111111111";
        let topics = iface
            .encode_event_topics("Transfer", &[Some(Token::address(from).unwrap()), None])
            .unwrap();
        assert_eq!(topics.len(), 3);
        assert_eq!(
            topics[0].unwrap(),
            event_topic("Transfer(address,address,uint256)")
        );
        let word = topics[1].unwrap();
        assert_eq!(&word.as_bytes()[12..], Address::from_hex(from).unwrap().as_bytes());
        assert!(topics[2].is_none());
    }

    #[test]
    fn test_encode_event_topics_hashes_reference_types() {
        let iface =
            Interface::from_human_readable(["event Named(string indexed tag, uint256 value)"])
                .unwrap();
        let topics = iface
            .encode_event_topics("Named", &[Some(Token::String("hello".to_string()))])
            .unwrap();
        assert_eq!(topics[1].unwrap(), keccak256(b"hello"));
    }

    #[test]
    fn test_decode_event_log() {
        let iface = erc20();
        let from = Address::from_hex("0x1111111111111111111111111111111111111111").unwrap();
        let to = Address::from_hex("0x2222222222222222222222222222222222222222").unwrap();

        let mut topic1 = [0u8; 32];
        topic1[12..].copy_from_slice(from.as_bytes());
        let mut topic2 = [0u8; 32];
        topic2[12..].copy_from_slice(to.as_bytes());

        let mut data = vec![0u8; 32];
        data[31] = 99;

        let log = iface
            .decode_event_log(
                &[
                    event_topic("Transfer(address,address,uint256)"),
                    H256::from_bytes(topic1),
                    H256::from_bytes(topic2),
                ],
                &data,
            )
            .unwrap();

        assert_eq!(log.name, "Transfer");
        assert_eq!(log.params[0], Token::Address(from));
        assert_eq!(log.params[1], Token::Address(to));
        assert_eq!(log.params[2], Token::Uint(U256::from(99)));
        assert_eq!(log.params.by_name("value"), Some(&log.params[2]));
    }

    #[test]
    fn test_decode_event_log_topic_count_mismatch() {
        let iface = erc20();
        let result = iface.decode_event_log(
            &[event_topic("Transfer(address,address,uint256)")],
            &[0u8; 32],
        );
        assert!(matches!(result, Err(AbiError::BadData(_))));
    }

    #[test]
    fn test_decode_error_result_standard_revert() {
        let iface = erc20();
        let mut data = ERROR_STRING_SELECTOR.to_vec();
        data.extend(encode(&[ParamType::String], &[Token::String("too low!".into())]).unwrap());
        assert_eq!(
            iface.decode_error_result(&data).unwrap(),
            DecodedError::Revert { reason: "too low!".to_string() }
        );
        assert_eq!(iface.decode_revert_reason(&data), Some("too low!".to_string()));
    }

    #[test]
    fn test_decode_error_result_custom() {
        let iface = erc20();
        let mut data = id("InsufficientBalance(uint256,uint256)").to_vec();
        data.extend(
            encode(
                &[ParamType::Uint(256), ParamType::Uint(256)],
                &[Token::uint(5u64), Token::uint(10u64)],
            )
            .unwrap(),
        );
        match iface.decode_error_result(&data).unwrap() {
            DecodedError::Custom { name, params } => {
                assert_eq!(name, "InsufficientBalance");
                assert_eq!(params.by_name("available"), Some(&Token::Uint(U256::from(5))));
            }
            other => panic!("expected custom error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_error_result_unknown() {
        let iface = erc20();
        let data = [0xde, 0xad, 0xbe, 0xef, 0x00];
        match iface.decode_error_result(&data).unwrap() {
            DecodedError::Unknown { selector, .. } => {
                assert_eq!(selector, [0xde, 0xad, 0xbe, 0xef]);
            }
            other => panic!("expected unknown error, got {:?}", other),
        }
    }

    #[test]
    fn test_id_known_selectors() {
        assert_eq!(id("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(id("balanceOf(address)"), [0x70, 0xa0, 0x82, 0x31]);
    }

    #[test]
    fn test_from_json_matches_human_readable() {
        let human = Interface::from_human_readable([
            "function transfer(address to, uint256 amount) returns (bool)",
            "event Transfer(address indexed from, address indexed to, uint256 value)",
        ])
        .unwrap();
        let json = human.format(FormatStyle::Json);
        let parsed = Interface::from_json(&json).unwrap();
        assert_eq!(
            parsed.get_function("transfer").unwrap().signature(),
            "transfer(address,uint256)"
        );
        assert_eq!(
            parsed.get_event("Transfer").unwrap().topic(),
            human.get_event("Transfer").unwrap().topic()
        );
    }
}
