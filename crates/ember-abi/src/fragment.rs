//! Contract description fragments.
//!
//! A fragment is one element of a contract description: a function,
//! event, constructor, custom error, receive, or fallback. Fragments
//! parse from the terse human-readable form
//! (`"function transfer(address to, uint256 amount) returns (bool)"`)
//! or from the normalized JSON ABI form, and format back to either.

use ember_primitives::H256;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::param::{first_type_token, split_top_level};
use crate::{AbiError, ParamType};

/// Function state mutability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateMutability {
    /// Reads nothing, writes nothing
    Pure,
    /// Reads state, writes nothing
    View,
    /// Writes state, rejects value
    #[default]
    NonPayable,
    /// Writes state, accepts value
    Payable,
}

impl StateMutability {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "pure" => Some(StateMutability::Pure),
            "view" => Some(StateMutability::View),
            "nonpayable" => Some(StateMutability::NonPayable),
            "payable" => Some(StateMutability::Payable),
            _ => None,
        }
    }

    /// JSON ABI rendering
    pub fn as_str(&self) -> &'static str {
        match self {
            StateMutability::Pure => "pure",
            StateMutability::View => "view",
            StateMutability::NonPayable => "nonpayable",
            StateMutability::Payable => "payable",
        }
    }
}

/// One typed parameter of a fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name; empty when the description omitted it
    pub name: String,
    /// Parameter type
    pub kind: ParamType,
    /// Indexed flag (events only)
    pub indexed: bool,
}

impl Param {
    /// Create an unindexed parameter
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self { name: name.into(), kind, indexed: false }
    }
}

/// Function fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionFragment {
    /// Function name (case-sensitive)
    pub name: String,
    /// Input parameters
    pub inputs: Vec<Param>,
    /// Output parameters
    pub outputs: Vec<Param>,
    /// State mutability
    pub state_mutability: StateMutability,
}

/// Event fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFragment {
    /// Event name
    pub name: String,
    /// Event parameters, each carrying an indexed flag
    pub inputs: Vec<Param>,
    /// Anonymous events emit no topic0
    pub anonymous: bool,
}

/// Constructor fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorFragment {
    /// Constructor parameters
    pub inputs: Vec<Param>,
    /// Whether deployment may carry value
    pub payable: bool,
}

/// Custom error fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorFragment {
    /// Error name
    pub name: String,
    /// Error parameters
    pub inputs: Vec<Param>,
}

/// One element of a contract description
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Callable function
    Function(FunctionFragment),
    /// Log event
    Event(EventFragment),
    /// Deployment constructor
    Constructor(ConstructorFragment),
    /// Custom revert error
    Error(ErrorFragment),
    /// Plain value receiver
    Receive,
    /// Fallback handler
    Fallback {
        /// Whether the fallback accepts value
        payable: bool,
    },
}

fn canonical_inputs(inputs: &[Param]) -> String {
    let types: Vec<String> = inputs.iter().map(|p| p.kind.canonical()).collect();
    types.join(",")
}

impl FunctionFragment {
    /// Canonical signature, e.g. `transfer(address,uint256)`
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, canonical_inputs(&self.inputs))
    }

    /// 4-byte selector: the leading bytes of keccak-256 over the signature
    pub fn selector(&self) -> [u8; 4] {
        signature_selector(&self.signature())
    }
}

impl EventFragment {
    /// Canonical signature, e.g. `Transfer(address,address,uint256)`
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, canonical_inputs(&self.inputs))
    }

    /// topic0: the full keccak-256 of the signature
    pub fn topic(&self) -> H256 {
        ember_crypto::keccak256(self.signature().as_bytes())
    }
}

impl ErrorFragment {
    /// Canonical signature, e.g. `InsufficientBalance(uint256,uint256)`
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, canonical_inputs(&self.inputs))
    }

    /// 4-byte selector
    pub fn selector(&self) -> [u8; 4] {
        signature_selector(&self.signature())
    }
}

/// Selector of an arbitrary canonical signature
pub fn signature_selector(signature: &str) -> [u8; 4] {
    let hash = ember_crypto::keccak256(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash.as_bytes()[..4]);
    selector
}

/// Output style for [`Fragment::format`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatStyle {
    /// Keyword plus canonical signature, no names
    Minimal,
    /// Human-readable form with names, flags and outputs
    Full,
    /// Normalized JSON object
    Json,
}

impl Fragment {
    /// Parse one human-readable fragment string
    pub fn parse(s: &str) -> Result<Self, AbiError> {
        let s = s.trim().trim_end_matches(';').trim();

        if let Some(rest) = s.strip_prefix("function ") {
            return parse_function(rest);
        }
        if let Some(rest) = s.strip_prefix("event ") {
            return parse_event(rest);
        }
        if let Some(rest) = s.strip_prefix("error ") {
            return parse_error(rest);
        }
        if let Some(rest) = s.strip_prefix("constructor") {
            return parse_constructor(rest);
        }
        if let Some(rest) = s.strip_prefix("receive") {
            return parse_receive(rest);
        }
        if let Some(rest) = s.strip_prefix("fallback") {
            return parse_fallback(rest);
        }

        Err(AbiError::invalid(format!("unrecognized fragment: {}", s)))
    }

    /// Parse one normalized JSON ABI entry
    pub fn from_json(value: &Value) -> Result<Self, AbiError> {
        let entry: JsonFragment = serde_json::from_value(value.clone())
            .map_err(|e| AbiError::invalid(format!("malformed ABI entry: {}", e)))?;
        entry.into_fragment()
    }

    /// Format the fragment, inverse of the parsers
    pub fn format(&self, style: FormatStyle) -> String {
        match style {
            FormatStyle::Minimal => self.format_minimal(),
            FormatStyle::Full => self.format_full(),
            FormatStyle::Json => self.to_json().to_string(),
        }
    }

    fn format_minimal(&self) -> String {
        match self {
            Fragment::Function(f) => format!("function {}", f.signature()),
            Fragment::Event(e) => format!("event {}", e.signature()),
            Fragment::Error(e) => format!("error {}", e.signature()),
            Fragment::Constructor(c) => format!("constructor({})", canonical_inputs(&c.inputs)),
            Fragment::Receive => "receive() external payable".to_string(),
            Fragment::Fallback { .. } => "fallback() external".to_string(),
        }
    }

    fn format_full(&self) -> String {
        match self {
            Fragment::Function(f) => {
                let mut out = format!("function {}({})", f.name, format_params(&f.inputs, false));
                match f.state_mutability {
                    StateMutability::NonPayable => {}
                    m => {
                        out.push(' ');
                        out.push_str(m.as_str());
                    }
                }
                if !f.outputs.is_empty() {
                    out.push_str(&format!(" returns ({})", format_params(&f.outputs, false)));
                }
                out
            }
            Fragment::Event(e) => {
                let mut out = format!("event {}({})", e.name, format_params(&e.inputs, true));
                if e.anonymous {
                    out.push_str(" anonymous");
                }
                out
            }
            Fragment::Error(e) => {
                format!("error {}({})", e.name, format_params(&e.inputs, false))
            }
            Fragment::Constructor(c) => {
                let mut out = format!("constructor({})", format_params(&c.inputs, false));
                if c.payable {
                    out.push_str(" payable");
                }
                out
            }
            Fragment::Receive => "receive() external payable".to_string(),
            Fragment::Fallback { payable } => {
                if *payable {
                    "fallback() external payable".to_string()
                } else {
                    "fallback() external".to_string()
                }
            }
        }
    }

    /// Normalized JSON ABI object for this fragment
    pub fn to_json(&self) -> Value {
        match self {
            Fragment::Function(f) => json!({
                "type": "function",
                "name": f.name,
                "inputs": params_to_json(&f.inputs, false),
                "outputs": params_to_json(&f.outputs, false),
                "stateMutability": f.state_mutability.as_str(),
            }),
            Fragment::Event(e) => json!({
                "type": "event",
                "name": e.name,
                "inputs": params_to_json(&e.inputs, true),
                "anonymous": e.anonymous,
            }),
            Fragment::Error(e) => json!({
                "type": "error",
                "name": e.name,
                "inputs": params_to_json(&e.inputs, false),
            }),
            Fragment::Constructor(c) => json!({
                "type": "constructor",
                "inputs": params_to_json(&c.inputs, false),
                "stateMutability": if c.payable { "payable" } else { "nonpayable" },
            }),
            Fragment::Receive => json!({
                "type": "receive",
                "stateMutability": "payable",
            }),
            Fragment::Fallback { payable } => json!({
                "type": "fallback",
                "stateMutability": if *payable { "payable" } else { "nonpayable" },
            }),
        }
    }
}

fn format_params(params: &[Param], with_indexed: bool) -> String {
    let rendered: Vec<String> = params
        .iter()
        .map(|p| {
            let mut s = p.kind.canonical();
            if with_indexed && p.indexed {
                s.push_str(" indexed");
            }
            if !p.name.is_empty() {
                s.push(' ');
                s.push_str(&p.name);
            }
            s
        })
        .collect();
    rendered.join(", ")
}

fn params_to_json(params: &[Param], with_indexed: bool) -> Value {
    Value::Array(params.iter().map(|p| param_to_json(p, with_indexed)).collect())
}

fn param_to_json(param: &Param, with_indexed: bool) -> Value {
    let mut obj = serde_json::Map::new();
    obj.insert("name".to_string(), Value::String(param.name.clone()));
    obj.insert("type".to_string(), Value::String(json_type_name(&param.kind)));
    if let Some(components) = tuple_components(&param.kind) {
        obj.insert(
            "components".to_string(),
            Value::Array(
                components
                    .iter()
                    .map(|c| param_to_json(&Param::new("", c.clone()), false))
                    .collect(),
            ),
        );
    }
    if with_indexed {
        obj.insert("indexed".to_string(), Value::Bool(param.indexed));
    }
    Value::Object(obj)
}

/// JSON ABI spells tuples as "tuple" with a components array; arrays of
/// tuples keep the suffix on the type name
fn json_type_name(kind: &ParamType) -> String {
    match kind {
        ParamType::Tuple(_) => "tuple".to_string(),
        ParamType::Array(inner) => format!("{}[]", json_type_name(inner)),
        ParamType::FixedArray(inner, size) => format!("{}[{}]", json_type_name(inner), size),
        other => other.canonical(),
    }
}

fn tuple_components(kind: &ParamType) -> Option<&Vec<ParamType>> {
    match kind {
        ParamType::Tuple(components) => Some(components),
        ParamType::Array(inner) | ParamType::FixedArray(inner, _) => tuple_components(inner),
        _ => None,
    }
}

// ---- human-readable parsing ----

fn parse_function(rest: &str) -> Result<Fragment, AbiError> {
    let (name, params, trailer) = split_signature(rest)?;
    if name.is_empty() {
        return Err(AbiError::invalid("function requires a name"));
    }
    let inputs = parse_params(params, false)?;

    let mut state_mutability = StateMutability::NonPayable;
    let mut outputs = Vec::new();

    let mut tokens = trailer.trim();
    while !tokens.is_empty() {
        if let Some(after) = tokens.strip_prefix("returns") {
            let after = after.trim_start();
            let inner = strip_paren_group(after)?;
            outputs = parse_params(inner.0, false)?;
            tokens = inner.1.trim();
            continue;
        }
        let (word, remainder) = next_word(tokens);
        match word {
            "external" | "public" | "override" | "virtual" => {}
            w => {
                if let Some(m) = StateMutability::parse(w) {
                    state_mutability = m;
                } else {
                    return Err(AbiError::invalid(format!("unexpected modifier: {}", w)));
                }
            }
        }
        tokens = remainder.trim();
    }

    Ok(Fragment::Function(FunctionFragment {
        name: name.to_string(),
        inputs,
        outputs,
        state_mutability,
    }))
}

fn parse_event(rest: &str) -> Result<Fragment, AbiError> {
    let (name, params, trailer) = split_signature(rest)?;
    if name.is_empty() {
        return Err(AbiError::invalid("event requires a name"));
    }
    let inputs = parse_params(params, true)?;
    let anonymous = trailer.trim() == "anonymous";
    if !anonymous && !trailer.trim().is_empty() {
        return Err(AbiError::invalid(format!("unexpected event trailer: {}", trailer)));
    }
    Ok(Fragment::Event(EventFragment { name: name.to_string(), inputs, anonymous }))
}

fn parse_error(rest: &str) -> Result<Fragment, AbiError> {
    let (name, params, trailer) = split_signature(rest)?;
    if name.is_empty() {
        return Err(AbiError::invalid("error requires a name"));
    }
    if !trailer.trim().is_empty() {
        return Err(AbiError::invalid(format!("unexpected error trailer: {}", trailer)));
    }
    let inputs = parse_params(params, false)?;
    Ok(Fragment::Error(ErrorFragment { name: name.to_string(), inputs }))
}

fn parse_constructor(rest: &str) -> Result<Fragment, AbiError> {
    let rest = rest.trim_start();
    let (params, trailer) = strip_paren_group(rest)?;
    let inputs = parse_params(params, false)?;
    let mut payable = false;
    for word in trailer.split_whitespace() {
        match word {
            "payable" => payable = true,
            "public" => {}
            w => return Err(AbiError::invalid(format!("unexpected constructor modifier: {}", w))),
        }
    }
    Ok(Fragment::Constructor(ConstructorFragment { inputs, payable }))
}

fn parse_receive(rest: &str) -> Result<Fragment, AbiError> {
    let rest = rest.trim_start();
    let (params, trailer) = strip_paren_group(rest)?;
    if !params.trim().is_empty() {
        return Err(AbiError::invalid("receive takes no parameters"));
    }
    for word in trailer.split_whitespace() {
        if !matches!(word, "external" | "payable") {
            return Err(AbiError::invalid(format!("unexpected receive modifier: {}", word)));
        }
    }
    Ok(Fragment::Receive)
}

fn parse_fallback(rest: &str) -> Result<Fragment, AbiError> {
    let rest = rest.trim_start();
    let (params, trailer) = strip_paren_group(rest)?;
    if !params.trim().is_empty() {
        return Err(AbiError::invalid("fallback takes no parameters"));
    }
    let mut payable = false;
    for word in trailer.split_whitespace() {
        match word {
            "external" => {}
            "payable" => payable = true,
            w => return Err(AbiError::invalid(format!("unexpected fallback modifier: {}", w))),
        }
    }
    Ok(Fragment::Fallback { payable })
}

fn next_word(s: &str) -> (&str, &str) {
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], &s[i..]),
        None => (s, ""),
    }
}

/// Split `name(params) trailer`, respecting nested parens in params
fn split_signature(s: &str) -> Result<(&str, &str, &str), AbiError> {
    let open = s
        .find('(')
        .ok_or_else(|| AbiError::invalid(format!("missing parameter list: {}", s)))?;
    let name = s[..open].trim();
    let (params, trailer) = strip_paren_group(&s[open..])?;
    Ok((name, params, trailer))
}

/// Given a string starting with `(`, return the group interior and the
/// remainder after the matching `)`
fn strip_paren_group(s: &str) -> Result<(&str, &str), AbiError> {
    if !s.starts_with('(') {
        return Err(AbiError::invalid(format!("expected '(' in: {}", s)));
    }
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&s[1..i], &s[i + 1..]));
                }
            }
            _ => {}
        }
    }
    Err(AbiError::invalid(format!("unbalanced parens: {}", s)))
}

fn parse_params(s: &str, allow_indexed: bool) -> Result<Vec<Param>, AbiError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(Vec::new());
    }
    split_top_level(s)
        .into_iter()
        .map(|p| parse_param(p.trim(), allow_indexed))
        .collect()
}

fn parse_param(s: &str, allow_indexed: bool) -> Result<Param, AbiError> {
    if s.is_empty() {
        return Err(AbiError::invalid("empty parameter"));
    }
    let type_str = first_type_token(s);
    let kind = ParamType::parse(type_str)?;

    let mut indexed = false;
    let mut name = String::new();
    for word in s[type_str.len()..].split_whitespace() {
        match word {
            "indexed" if allow_indexed => indexed = true,
            "indexed" => {
                return Err(AbiError::invalid("indexed is only valid on event parameters"))
            }
            // storage locations are a source-language detail, not ABI
            "memory" | "calldata" | "storage" => {}
            w => {
                if !name.is_empty() {
                    return Err(AbiError::invalid(format!("unexpected token in parameter: {}", w)));
                }
                name = w.to_string();
            }
        }
    }

    Ok(Param { name, kind, indexed })
}

// ---- JSON ABI form ----

#[derive(Debug, Deserialize)]
struct JsonFragment {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    inputs: Option<Vec<JsonParam>>,
    #[serde(default)]
    outputs: Option<Vec<JsonParam>>,
    #[serde(rename = "stateMutability", default)]
    state_mutability: Option<String>,
    #[serde(default)]
    anonymous: Option<bool>,
    #[serde(default)]
    payable: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct JsonParam {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    indexed: Option<bool>,
    #[serde(default)]
    components: Option<Vec<JsonParam>>,
}

impl JsonFragment {
    fn into_fragment(self) -> Result<Fragment, AbiError> {
        let inputs = convert_json_params(self.inputs.unwrap_or_default())?;
        match self.kind.as_str() {
            "function" => {
                let name = self
                    .name
                    .ok_or_else(|| AbiError::invalid("function entry missing name"))?;
                let outputs = convert_json_params(self.outputs.unwrap_or_default())?;
                let state_mutability = match self.state_mutability.as_deref() {
                    Some(m) => StateMutability::parse(m)
                        .ok_or_else(|| AbiError::invalid(format!("unknown mutability: {}", m)))?,
                    // legacy entries carry a bare payable flag
                    None if self.payable == Some(true) => StateMutability::Payable,
                    None => StateMutability::NonPayable,
                };
                Ok(Fragment::Function(FunctionFragment { name, inputs, outputs, state_mutability }))
            }
            "event" => {
                let name = self
                    .name
                    .ok_or_else(|| AbiError::invalid("event entry missing name"))?;
                Ok(Fragment::Event(EventFragment {
                    name,
                    inputs,
                    anonymous: self.anonymous.unwrap_or(false),
                }))
            }
            "error" => {
                let name = self
                    .name
                    .ok_or_else(|| AbiError::invalid("error entry missing name"))?;
                Ok(Fragment::Error(ErrorFragment { name, inputs }))
            }
            "constructor" => Ok(Fragment::Constructor(ConstructorFragment {
                inputs,
                payable: self.state_mutability.as_deref() == Some("payable")
                    || self.payable == Some(true),
            })),
            "receive" => Ok(Fragment::Receive),
            "fallback" => Ok(Fragment::Fallback {
                payable: self.state_mutability.as_deref() == Some("payable")
                    || self.payable == Some(true),
            }),
            other => Err(AbiError::invalid(format!("unknown fragment type: {}", other))),
        }
    }
}

fn convert_json_params(params: Vec<JsonParam>) -> Result<Vec<Param>, AbiError> {
    params
        .into_iter()
        .map(|p| {
            let indexed = p.indexed.unwrap_or(false);
            let name = p.name.clone().unwrap_or_default();
            let kind = json_param_type(&p)?;
            Ok(Param { name, kind, indexed })
        })
        .collect()
}

/// Resolve a JSON parameter type, expanding "tuple" via its components
fn json_param_type(param: &JsonParam) -> Result<ParamType, AbiError> {
    if let Some(suffix) = param.kind.strip_prefix("tuple") {
        let components = param
            .components
            .as_ref()
            .ok_or_else(|| AbiError::invalid("tuple type missing components"))?
            .iter()
            .map(json_param_type)
            .collect::<Result<Vec<_>, _>>()?;
        let mut kind = ParamType::Tuple(components);
        // apply array suffixes left to right: "tuple[2][]"
        let mut rest = suffix;
        while let Some(after_open) = rest.strip_prefix('[') {
            let close = after_open
                .find(']')
                .ok_or_else(|| AbiError::invalid(format!("unbalanced suffix: {}", param.kind)))?;
            let count = &after_open[..close];
            kind = if count.is_empty() {
                ParamType::Array(Box::new(kind))
            } else {
                let size: usize = count
                    .parse()
                    .map_err(|_| AbiError::invalid(format!("invalid array size: {}", count)))?;
                ParamType::FixedArray(Box::new(kind), size)
            };
            rest = &after_open[close + 1..];
        }
        if !rest.is_empty() {
            return Err(AbiError::invalid(format!("malformed tuple type: {}", param.kind)));
        }
        Ok(kind)
    } else {
        ParamType::parse(&param.kind)
    }
}
