//! Patch operation types and the RFC 6902 wire codec.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::binding::BindingError;
use crate::pointer::PointerError;
use crate::ser::PopulateError;

// ── Error ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PatchError {
    #[error(transparent)]
    Pointer(#[from] PointerError),
    #[error("TYPE_MISMATCH at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("TEST_FAILED at '{path}'")]
    TestFailed { path: String },
    #[error("INVALID_PATCH: {0}")]
    InvalidPatch(String),
    #[error("UNSUPPORTED_OP: '{0}'")]
    UnsupportedOp(String),
    #[error(transparent)]
    Binding(#[from] BindingError),
    #[error(transparent)]
    Populate(#[from] PopulateError),
}

// ── Operations ────────────────────────────────────────────────────────────

/// The patch verbs this protocol produces and consumes.
///
/// `test` appears in generated sets for the version handshake and is
/// accepted inbound; `move` and `copy` are not part of the sync protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOpKind {
    Add,
    Remove,
    Replace,
    Test,
}

impl PatchOpKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PatchOpKind::Add => "add",
            PatchOpKind::Remove => "remove",
            PatchOpKind::Replace => "replace",
            PatchOpKind::Test => "test",
        }
    }

    pub fn parse(op: &str) -> Result<Self, PatchError> {
        match op {
            "add" => Ok(PatchOpKind::Add),
            "remove" => Ok(PatchOpKind::Remove),
            "replace" => Ok(PatchOpKind::Replace),
            "test" => Ok(PatchOpKind::Test),
            "move" | "copy" => Err(PatchError::UnsupportedOp(op.to_string())),
            other => Err(PatchError::InvalidPatch(format!("unknown op: '{other}'"))),
        }
    }
}

/// One wire operation: `{"op": ..., "path": ..., "value"?: ...}`.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOp {
    pub op: PatchOpKind,
    pub path: String,
    pub value: Option<Value>,
}

// ── Codec ─────────────────────────────────────────────────────────────────

/// Serialize one operation to its wire object. Member order is fixed:
/// `op`, `path`, `value`.
pub fn to_json(op: &PatchOp) -> Value {
    let mut m = Map::new();
    m.insert("op".into(), Value::String(op.op.as_str().to_string()));
    m.insert("path".into(), Value::String(op.path.clone()));
    if let Some(value) = &op.value {
        m.insert("value".into(), value.clone());
    }
    Value::Object(m)
}

/// Deserialize one wire object into an operation.
pub fn from_json(v: &Value) -> Result<PatchOp, PatchError> {
    let obj = v
        .as_object()
        .ok_or_else(|| PatchError::InvalidPatch("operation must be an object".into()))?;
    let op_str = obj
        .get("op")
        .and_then(|v| v.as_str())
        .ok_or_else(|| PatchError::InvalidPatch("missing 'op' member".into()))?;
    let op = PatchOpKind::parse(op_str)?;
    let path = obj
        .get("path")
        .and_then(|v| v.as_str())
        .ok_or_else(|| PatchError::InvalidPatch("missing 'path' member".into()))?
        .to_string();
    let value = obj.get("value").cloned();
    if value.is_none() && op != PatchOpKind::Remove {
        return Err(PatchError::InvalidPatch(format!(
            "'{}' requires 'value'",
            op.as_str()
        )));
    }
    Ok(PatchOp { op, path, value })
}

/// Serialize a patch set to the wire array form.
pub fn to_json_patch(ops: &[PatchOp]) -> Value {
    Value::Array(ops.iter().map(to_json).collect())
}

/// Deserialize a wire array into operations, strictly in array order.
pub fn from_json_patch(v: &Value) -> Result<Vec<PatchOp>, PatchError> {
    let arr = v
        .as_array()
        .ok_or_else(|| PatchError::InvalidPatch("patch must be an array".into()))?;
    arr.iter().map(from_json).collect()
}

/// Render a patch set as JSON text.
pub fn patch_to_string(ops: &[PatchOp]) -> String {
    to_json_patch(ops).to_string()
}
