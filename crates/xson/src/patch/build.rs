//! Outgoing patch construction from logged changes.

use serde_json::Value;
use xson_json_pointer::escape_component;

use crate::binding::BindingError;
use crate::changelog::{ChangeLog, ChangeType};
use crate::instance::{Json, NodeId};
use crate::pointer::{pointer_for_element, pointer_for_node, pointer_for_slot};
use crate::ser::to_json_value;
use crate::template::TemplateId;

use super::types::{PatchOp, PatchOpKind};

/// Build one patch operation for a mutation of `template` on `instance`.
///
/// The path is assembled by walking from the instance to the document root:
/// template names at object levels, element positions at array levels, and
/// `index` as the final segment for array-level changes. The value is the
/// current state read through binding: the slot value for scalar updates,
/// the serialized subtree for container updates, the serialized element
/// (`item`) for adds, nothing for removes.
pub fn build_patch(
    doc: &Json,
    op: ChangeType,
    instance: NodeId,
    template: TemplateId,
    index: Option<usize>,
    item: Option<NodeId>,
) -> Result<PatchOp, BindingError> {
    let schema = doc.schema().clone();
    let own_template = doc.template_of(instance);

    let path = if template == own_template {
        match index {
            Some(i) => pointer_for_element(doc, instance, i),
            None => pointer_for_node(doc, instance),
        }
    } else {
        let slot = pointer_for_slot(doc, instance, template);
        match index {
            Some(i) => format!("{slot}/{i}"),
            None => slot,
        }
    };

    let value = match op {
        ChangeType::Remove => None,
        ChangeType::Add => {
            let element = item.or_else(|| index.and_then(|i| doc.array_item(instance, i)));
            match element {
                Some(node) => Some(to_json_value(doc, node)?),
                None => Some(Value::Null),
            }
        }
        ChangeType::Update => {
            let t = schema.template(template);
            if template == own_template {
                Some(to_json_value(doc, instance)?)
            } else if t.kind().is_scalar() {
                Some(doc.get_value(instance, template)?.to_json_value())
            } else {
                Some(to_json_value(doc, doc.child_node(instance, template))?)
            }
        }
    };

    Ok(PatchOp {
        op: match op {
            ChangeType::Update => PatchOpKind::Replace,
            ChangeType::Add => PatchOpKind::Add,
            ChangeType::Remove => PatchOpKind::Remove,
        },
        path,
        value,
    })
}

/// Convert the logged changes into an ordered patch set, clearing the log.
///
/// Record order is preserved verbatim; array adds and removes are only
/// valid relative to the state the preceding operations produce. Two kinds
/// of record are dropped: changes whose instance (or, for adds, whose
/// inserted element) has since been detached from the document, and changes
/// inside a subtree whose own `add` is still pending in this set, since the
/// add op serializes the element's current state and already carries them.
/// With versioning enabled the set leads with a `replace` of the bumped
/// local version and a `test` of the last remote version seen.
pub fn create_patches(doc: &Json, log: &mut ChangeLog) -> Result<Vec<PatchOp>, BindingError> {
    let mut ops = Vec::new();

    if let Some(version) = log.version_mut() {
        version.local += 1;
        ops.push(PatchOp {
            op: PatchOpKind::Replace,
            path: format!("/{}", escape_component(&version.local_property)),
            value: Some(Value::from(version.local)),
        });
        ops.push(PatchOp {
            op: PatchOpKind::Test,
            path: format!("/{}", escape_component(&version.remote_property)),
            value: Some(Value::from(version.remote)),
        });
    }

    let changes = log.flush();
    let pending_adds: std::collections::HashSet<NodeId> = changes
        .iter()
        .filter(|c| c.op == ChangeType::Add)
        .filter_map(|c| c.item)
        .collect();

    for change in &changes {
        if !doc.is_attached(change.instance) {
            continue;
        }
        if change.op == ChangeType::Add {
            match change.item {
                Some(item) if doc.is_attached(item) => {}
                _ => continue,
            }
        }
        if inside_pending_add(doc, &pending_adds, change.instance) {
            continue;
        }
        ops.push(build_patch(
            doc,
            change.op,
            change.instance,
            change.template,
            change.index,
            change.item,
        )?);
    }

    Ok(ops)
}

/// True when the node, or any of its ancestors, is an element whose `add`
/// record is part of the set being generated. For add records themselves
/// the walk starts at the array, so an add is never swallowed by its own
/// element.
fn inside_pending_add(
    doc: &Json,
    pending_adds: &std::collections::HashSet<NodeId>,
    node: NodeId,
) -> bool {
    let mut current = Some(node);
    while let Some(n) = current {
        if pending_adds.contains(&n) {
            return true;
        }
        current = doc.parent(n);
    }
    false
}
