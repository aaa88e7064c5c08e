//! Applying inbound patch sets to a document.

use serde_json::Value;

use crate::changelog::ChangeLog;
use crate::instance::{Json, NodeId};
use crate::pointer::{evaluate, PointerError, Target};
use crate::ser::{populate_value, to_json_value, PopulateMode};
use crate::value::{json_kind_name, ScalarValue};

use super::types::{from_json_patch, PatchError, PatchOp, PatchOpKind};

/// Parse a JSON Patch body and apply each operation in array order.
///
/// `log` is the echo-suppression switch: pass `Some` to record the applied
/// mutations for other observers, `None` to apply silently so the patch is
/// not bounced back to the client that sent it.
///
/// Returns the number of operations applied. The first failing operation
/// aborts the batch with its error; operations before it remain applied and
/// the tree is left structurally intact, so the caller decides whether to
/// continue with a corrected batch or discard the document.
pub fn apply_patches(
    doc: &mut Json,
    body: &str,
    mut log: Option<&mut ChangeLog>,
) -> Result<usize, PatchError> {
    let parsed: Value =
        serde_json::from_str(body).map_err(|err| PatchError::InvalidPatch(err.to_string()))?;
    let ops = from_json_patch(&parsed)?;
    let mut applied = 0;
    for op in &ops {
        apply_op(doc, op, log.as_deref_mut())?;
        applied += 1;
    }
    log::debug!("applied {applied} patch operation(s)");
    Ok(applied)
}

/// Apply a single operation.
pub fn apply_op(
    doc: &mut Json,
    op: &PatchOp,
    log: Option<&mut ChangeLog>,
) -> Result<(), PatchError> {
    let target = evaluate(doc, &op.path)?;
    match op.op {
        PatchOpKind::Add | PatchOpKind::Replace => apply_set(doc, op, target, log),
        PatchOpKind::Remove => apply_remove(doc, target, log),
        PatchOpKind::Test => apply_test(doc, op, target),
    }
}

fn required_value<'a>(op: &'a PatchOp) -> Result<&'a Value, PatchError> {
    op.value.as_ref().ok_or_else(|| {
        PatchError::InvalidPatch(format!("'{}' requires 'value'", op.op.as_str()))
    })
}

fn apply_set(
    doc: &mut Json,
    op: &PatchOp,
    target: Target,
    mut log: Option<&mut ChangeLog>,
) -> Result<(), PatchError> {
    let value = required_value(op)?;
    match target {
        Target::Root => {
            let root = doc.root();
            populate_value(doc, root, value, PopulateMode::Strict, log)?;
            Ok(())
        }
        Target::Slot { instance, template } => {
            let kind = doc.schema().template(template).kind();
            if kind.is_scalar() {
                let scalar = ScalarValue::from_json_value(kind, value).ok_or_else(|| {
                    PatchError::TypeMismatch {
                        path: op.path.clone(),
                        expected: kind.as_str(),
                        found: json_kind_name(value),
                    }
                })?;
                doc.set_value(instance, template, scalar, log)?;
            } else {
                let child = doc.child_node(instance, template);
                check_container_kind(op, kind.as_str(), value)?;
                populate_value(doc, child, value, PopulateMode::Strict, log)?;
            }
            Ok(())
        }
        Target::Element { array, index } => {
            if !value.is_object() {
                return Err(PatchError::TypeMismatch {
                    path: op.path.clone(),
                    expected: "object",
                    found: json_kind_name(value),
                });
            }
            let element = match op.op {
                PatchOpKind::Add => doc.array_insert_at(array, index, log.as_deref_mut())?,
                _ => existing_element(doc, array, index)?,
            };
            populate_value(doc, element, value, PopulateMode::Strict, log)?;
            Ok(())
        }
    }
}

fn check_container_kind(op: &PatchOp, expected: &'static str, value: &Value) -> Result<(), PatchError> {
    let compatible = match expected {
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => false,
    };
    if compatible {
        Ok(())
    } else {
        Err(PatchError::TypeMismatch {
            path: op.path.clone(),
            expected,
            found: json_kind_name(value),
        })
    }
}

fn apply_remove(
    doc: &mut Json,
    target: Target,
    log: Option<&mut ChangeLog>,
) -> Result<(), PatchError> {
    match target {
        Target::Root => {
            let root = doc.root();
            doc.reset_node(root, log)?;
            Ok(())
        }
        Target::Slot { instance, template } => {
            let schema = doc.schema().clone();
            let t = schema.template(template);
            if t.kind().is_scalar() {
                doc.set_value(instance, template, t.default_value(), log)?;
            } else {
                let child = doc.child_node(instance, template);
                doc.reset_node(child, log)?;
            }
            Ok(())
        }
        Target::Element { array, index } => {
            doc.array_remove_at(array, index, log)?;
            Ok(())
        }
    }
}

fn apply_test(doc: &Json, op: &PatchOp, target: Target) -> Result<(), PatchError> {
    let expected = required_value(op)?;
    let actual = match target {
        Target::Root => to_json_value(doc, doc.root())?,
        Target::Slot { instance, template } => {
            if doc.schema().template(template).kind().is_scalar() {
                doc.get_value(instance, template)?.to_json_value()
            } else {
                to_json_value(doc, doc.child_node(instance, template))?
            }
        }
        Target::Element { array, index } => {
            let element = existing_element(doc, array, index)?;
            to_json_value(doc, element)?
        }
    };
    if actual == *expected {
        Ok(())
    } else {
        Err(PatchError::TestFailed {
            path: op.path.clone(),
        })
    }
}

fn existing_element(doc: &Json, array: NodeId, index: usize) -> Result<NodeId, PointerError> {
    doc.array_item(array, index)
        .ok_or(PointerError::IndexOutOfRange {
            index,
            len: doc.array_len(array),
        })
}
