//! Call-argument serialization for R plotting routines.

use serde_json::Value;

/// Prefix marking a value that is already valid R call syntax (a
/// multi-value constructor such as `c("a", "b")`) and must pass through
/// verbatim.
const RAW_PREFIX: &str = "c(";

/// One resolved parameter value. Form fields are dynamically typed, so a
/// value is classified once, here, and encoded from the variant — never
/// spliced into the script as free-form text.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Absent / null sentinel; encodes as `NULL`.
    Empty,
    /// Pre-formed R expression, emitted verbatim and unquoted.
    Raw(String),
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ParamValue {
    /// Classify a textual field value. Priority order is part of the call
    /// contract: a value can satisfy several checks and the first match
    /// wins.
    pub fn classify(text: &str) -> Self {
        if text.is_empty() || text.eq_ignore_ascii_case("null") {
            return ParamValue::Empty;
        }
        if text.starts_with(RAW_PREFIX) {
            return ParamValue::Raw(text.to_string());
        }
        if let Ok(n) = text.trim().parse::<f64>() {
            // Numeric-looking categorical labels get coerced too; known
            // limitation of the dynamic form contract.
            return ParamValue::Number(n);
        }
        ParamValue::Text(text.to_string())
    }

    /// Map a JSON request value onto a variant. Arrays and objects have no
    /// R encoding here and fall back to quoted text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => ParamValue::Empty,
            Value::Bool(b) => ParamValue::Bool(*b),
            Value::Number(n) => ParamValue::Number(n.as_f64().unwrap_or(0.0)),
            Value::String(s) => ParamValue::classify(s),
            other => ParamValue::Text(other.to_string()),
        }
    }

    /// Render the R literal for this value.
    pub fn encode(&self) -> String {
        match self {
            ParamValue::Empty => "NULL".to_string(),
            ParamValue::Raw(expr) => expr.clone(),
            ParamValue::Bool(true) => "TRUE".to_string(),
            ParamValue::Bool(false) => "FALSE".to_string(),
            ParamValue::Number(n) => encode_number(*n),
            ParamValue::Text(s) => quote_r_string(s),
        }
    }
}

// Integral values print without a fractional part, matching how the form
// layer coerces numbers.
fn encode_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Double-quoted R string literal with backslashes and quotes escaped.
/// All user text entering the generated script goes through here.
pub fn quote_r_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// `container$member` pair naming the summarized-experiment object inside
/// a loaded session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReference {
    pub container: String,
    pub member: String,
}

impl SessionReference {
    /// Split a combined identifier on its first `$`. The member is trimmed
    /// of surrounding whitespace; a missing member leaves the container
    /// usable on its own.
    pub fn parse(combined: &str) -> Self {
        match combined.split_once('$') {
            Some((container, member)) => Self {
                container: container.to_string(),
                member: member.trim().to_string(),
            },
            None => Self {
                container: combined.to_string(),
                member: String::new(),
            },
        }
    }

    fn expobj_token(&self) -> String {
        format!("ExpObj = {}${}", self.container, self.member)
    }
}

/// Insertion-ordered parameter mapping. Iteration order is the order
/// tokens appear in the generated call.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    entries: Vec<(String, ParamValue)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a key resolves to exactly one variant.
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, ParamValue)> {
        self.entries.iter()
    }
}

/// Build the full argument list for a routine call: the mandatory
/// `ExpObj = container$member` token first, then one `name=value` token
/// per parameter, joined by `, ` with no trailing separators.
pub fn serialize(session: &SessionReference, params: &ParameterSet) -> String {
    let mut tokens = Vec::with_capacity(params.len() + 1);
    tokens.push(session.expobj_token());
    for (name, value) in params.iter() {
        tokens.push(format!("{}={}", name, value.encode()));
    }
    tokens.join(", ")
}
