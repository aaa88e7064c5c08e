//! Full-document JSON materialization.
//!
//! Encoding walks the instance tree through binding-aware reads, emitting
//! object keys in slot order (`preserve_order` keeps them there on the
//! wire). Decoding matches keys against the schema by literal template name
//! and writes through binding-aware sets, growing arrays as needed.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::binding::BindingError;
use crate::changelog::ChangeLog;
use crate::instance::{Json, NodeId};
use crate::template::Kind;
use crate::value::{json_kind_name, ScalarValue};

/// How unknown object keys are treated during populate.
///
/// `Strict` (the default) fails on the first unknown key; `Lenient` skips
/// them with a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopulateMode {
    #[default]
    Strict,
    Lenient,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PopulateError {
    #[error("PARSE: {0}")]
    Parse(String),
    #[error("UNKNOWN_KEY: '{0}'")]
    UnknownKey(String),
    #[error("TYPE_MISMATCH at '{key}': expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error(transparent)]
    Binding(#[from] BindingError),
}

// ── Encoding ──────────────────────────────────────────────────────────────

/// Materialize a node (and everything below it) as a JSON value.
pub fn to_json_value(doc: &Json, node: NodeId) -> Result<Value, BindingError> {
    let schema = doc.schema().clone();
    let template = doc.template_of(node);
    match schema.template(template).kind() {
        Kind::Object => {
            let mut map = Map::new();
            for property in schema.template(template).properties() {
                let t = schema.template(*property);
                let value = if t.kind().is_scalar() {
                    doc.get_value(node, *property)?.to_json_value()
                } else {
                    to_json_value(doc, doc.child_node(node, *property))?
                };
                map.insert(t.template_name().to_string(), value);
            }
            Ok(Value::Object(map))
        }
        Kind::Array => {
            let mut items = Vec::with_capacity(doc.array_len(node));
            for index in 0..doc.array_len(node) {
                let element = doc
                    .array_item(node, index)
                    .unwrap_or_else(|| panic!("array shrank during encoding"));
                items.push(to_json_value(doc, element)?);
            }
            Ok(Value::Array(items))
        }
        kind => panic!("{}-kind templates are slots, not nodes", kind.as_str()),
    }
}

/// Encode the whole document as JSON text.
pub fn to_json(doc: &Json) -> Result<String, BindingError> {
    let value = to_json_value(doc, doc.root())?;
    // Serializing a Value tree cannot fail.
    Ok(value.to_string())
}

// ── Decoding ──────────────────────────────────────────────────────────────

/// Populate a node from a parsed JSON value.
///
/// Objects are merged key by key; arrays are a full overwrite (existing
/// elements are removed first). Mutations go through the same binding-aware
/// setters as direct calls and are recorded into `log` unless it is `None`.
pub fn populate_value(
    doc: &mut Json,
    node: NodeId,
    value: &Value,
    mode: PopulateMode,
    mut log: Option<&mut ChangeLog>,
) -> Result<(), PopulateError> {
    let schema = doc.schema().clone();
    let template = doc.template_of(node);
    match schema.template(template).kind() {
        Kind::Object => {
            let map = value.as_object().ok_or_else(|| PopulateError::TypeMismatch {
                key: schema.template(template).template_name().to_string(),
                expected: "object",
                found: json_kind_name(value),
            })?;
            for (key, member) in map {
                let property = match schema.property_by_name(template, key) {
                    Some(p) => p,
                    None => match mode {
                        PopulateMode::Strict => {
                            return Err(PopulateError::UnknownKey(key.clone()))
                        }
                        PopulateMode::Lenient => {
                            log::warn!("populate: unknown key '{key}' skipped");
                            continue;
                        }
                    },
                };
                let t = schema.template(property);
                if t.kind().is_scalar() {
                    let scalar = ScalarValue::from_json_value(t.kind(), member).ok_or_else(
                        || PopulateError::TypeMismatch {
                            key: key.clone(),
                            expected: t.kind().as_str(),
                            found: json_kind_name(member),
                        },
                    )?;
                    doc.set_value(node, property, scalar, log.as_deref_mut())?;
                } else {
                    let child = doc.child_node(node, property);
                    populate_value(doc, child, member, mode, log.as_deref_mut())?;
                }
            }
            Ok(())
        }
        Kind::Array => {
            let items = value.as_array().ok_or_else(|| PopulateError::TypeMismatch {
                key: schema.template(template).template_name().to_string(),
                expected: "array",
                found: json_kind_name(value),
            })?;
            doc.array_clear(node, log.as_deref_mut());
            for item in items {
                let element = doc.array_add(node, log.as_deref_mut());
                populate_value(doc, element, item, mode, log.as_deref_mut())?;
            }
            Ok(())
        }
        kind => panic!("{}-kind templates are slots, not nodes", kind.as_str()),
    }
}

/// Parse JSON text and populate the document root from it.
pub fn populate_from_json(
    doc: &mut Json,
    text: &str,
    mode: PopulateMode,
    log: Option<&mut ChangeLog>,
) -> Result<(), PopulateError> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| PopulateError::Parse(err.to_string()))?;
    let root = doc.root();
    populate_value(doc, root, &value, mode, log)
}
