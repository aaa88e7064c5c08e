//! Scalar values stored in instance slots.
//!
//! One tagged variant per scalar template kind. `Decimal` wraps a
//! `serde_json::Number` built with the `arbitrary_precision` feature, so
//! decimal literals keep their exact digits through decode and re-encode
//! (no float conversion anywhere on the path).

use serde_json::{Number, Value};

use crate::template::Kind;

/// A scalar slot value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Str(String),
    Long(i64),
    Decimal(Number),
    Bool(bool),
}

impl ScalarValue {
    /// The template kind this value satisfies.
    pub fn kind(&self) -> Kind {
        match self {
            ScalarValue::Str(_) => Kind::String,
            ScalarValue::Long(_) => Kind::Long,
            ScalarValue::Decimal(_) => Kind::Decimal,
            ScalarValue::Bool(_) => Kind::Bool,
        }
    }

    /// The default slot value for a scalar kind.
    ///
    /// Panics if `kind` is not a scalar kind; container templates do not
    /// have slot values.
    pub fn default_for(kind: Kind) -> ScalarValue {
        match kind {
            Kind::String => ScalarValue::Str(String::new()),
            Kind::Long => ScalarValue::Long(0),
            Kind::Decimal => ScalarValue::Decimal(Number::from(0)),
            Kind::Bool => ScalarValue::Bool(false),
            Kind::Object | Kind::Array => {
                panic!("{kind:?} templates have no scalar default")
            }
        }
    }

    /// Encode into a JSON value.
    pub fn to_json_value(&self) -> Value {
        match self {
            ScalarValue::Str(s) => Value::String(s.clone()),
            ScalarValue::Long(n) => Value::Number(Number::from(*n)),
            ScalarValue::Decimal(n) => Value::Number(n.clone()),
            ScalarValue::Bool(b) => Value::Bool(*b),
        }
    }

    /// Decode a JSON value against an expected scalar kind.
    ///
    /// Returns `None` when the JSON kind is incompatible with the template
    /// kind: callers turn that into their own type-mismatch error with the
    /// path context they have at hand.
    pub fn from_json_value(kind: Kind, value: &Value) -> Option<ScalarValue> {
        match (kind, value) {
            (Kind::String, Value::String(s)) => Some(ScalarValue::Str(s.clone())),
            (Kind::Long, Value::Number(n)) => n.as_i64().map(ScalarValue::Long),
            (Kind::Decimal, Value::Number(n)) => Some(ScalarValue::Decimal(n.clone())),
            (Kind::Bool, Value::Bool(b)) => Some(ScalarValue::Bool(*b)),
            _ => None,
        }
    }
}

/// The JSON kind name of a value, for error messages.
pub fn json_kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
