//! JSON Pointer resolution against a template + instance pair.
//!
//! The string layer (escaping, tokenizing) lives in `xson-json-pointer`;
//! this module walks the tokens against a document. Object levels match the
//! current template's properties by literal name, array levels parse the
//! token as an element index. The inverse direction, instance-to-pointer,
//! is [`index_path_for`] and the `pointer_steps` helpers the patch builder
//! renders paths with.

use thiserror::Error;
use xson_json_pointer::{format_json_pointer, validate_json_pointer, JsonPointer};

use crate::instance::{Json, NodeId};
use crate::template::{Kind, TemplateId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointerError {
    #[error("MALFORMED_POINTER: '{0}'")]
    Malformed(String),
    #[error("UNKNOWN_TOKEN: '{0}'")]
    UnknownToken(String),
    #[error("NOT_A_NUMBER: '{0}' is not a valid array index")]
    NotANumber(String),
    #[error("INDEX_OUT_OF_RANGE: {index} (length {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("TRAILING_TOKENS: nothing below '{0}'")]
    TrailingTokens(String),
}

/// What a pointer resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The document root.
    Root,
    /// A property slot (scalar, object, or array) of an object instance.
    Slot { instance: NodeId, template: TemplateId },
    /// An element position of an array instance. `index` equal to the
    /// array's length is the append position; it resolves, but only an
    /// insertion may use it.
    Element { array: NodeId, index: usize },
}

/// Resolve a pointer against a document.
///
/// The empty pointer is the root. Each token is matched against the current
/// object template's properties by `template_name`, or parsed as an index
/// when the current instance is an array. Tokens below a scalar leaf are
/// [`PointerError::TrailingTokens`].
pub fn evaluate(doc: &Json, pointer: &str) -> Result<Target, PointerError> {
    validate_json_pointer(pointer).map_err(|_| PointerError::Malformed(pointer.to_string()))?;
    let schema = doc.schema().clone();
    let mut cursor = JsonPointer::new(pointer);
    let mut node = doc.root();

    let mut token = match cursor.next_token() {
        None => return Ok(Target::Root),
        Some(t) => t.to_string(),
    };

    loop {
        let node_template = doc.template_of(node);
        match schema.template(node_template).kind() {
            Kind::Object => {
                let template = schema
                    .property_by_name(node_template, &token)
                    .ok_or_else(|| PointerError::UnknownToken(token.clone()))?;
                match schema.template(template).kind() {
                    Kind::Object | Kind::Array => match cursor.next_token() {
                        None => return Ok(Target::Slot { instance: node, template }),
                        Some(next) => {
                            let next = next.to_string();
                            node = doc.child_node(node, template);
                            token = next;
                        }
                    },
                    _scalar => {
                        if cursor.next_token().is_some() {
                            return Err(PointerError::TrailingTokens(token));
                        }
                        return Ok(Target::Slot { instance: node, template });
                    }
                }
            }
            Kind::Array => {
                let index = cursor
                    .current_as_index()
                    .ok_or_else(|| PointerError::NotANumber(token.clone()))?;
                let len = doc.array_len(node);
                if index > len {
                    return Err(PointerError::IndexOutOfRange { index, len });
                }
                match cursor.next_token() {
                    None => return Ok(Target::Element { array: node, index }),
                    Some(next) => {
                        let next = next.to_string();
                        node = doc
                            .array_item(node, index)
                            .ok_or(PointerError::IndexOutOfRange { index, len })?;
                        token = next;
                    }
                }
            }
            kind => panic!("{}-kind instances cannot be traversed", kind.as_str()),
        }
    }
}

/// Positions from the document root down to `node` itself: slot positions
/// at object levels, element positions at array levels.
pub fn node_index_path(doc: &Json, node: NodeId) -> Vec<usize> {
    let schema = doc.schema().clone();
    let mut steps = Vec::new();
    let mut current = node;
    while let Some(parent) = doc.parent(current) {
        let parent_kind = schema.template(doc.template_of(parent)).kind();
        match parent_kind {
            Kind::Array => {
                let position = doc
                    .position_in_array(parent, current)
                    .unwrap_or_else(|| panic!("node is detached from its array"));
                steps.push(position);
            }
            Kind::Object => {
                let t = schema.template(doc.template_of(current));
                match t.template_index() {
                    Some(index) => steps.push(index),
                    None => panic!("instance template has no slot position"),
                }
            }
            kind => panic!("{}-kind instances cannot be parents", kind.as_str()),
        }
        current = parent;
    }
    steps.reverse();
    steps
}

/// The exact sequence of slot/element positions from the root down to a
/// property `template` of `instance`. Positional inverse of [`evaluate`]:
/// rendering these steps as a pointer and resolving it yields the same
/// (instance, template) pair back.
pub fn index_path_for(doc: &Json, instance: NodeId, template: TemplateId) -> Vec<usize> {
    let mut steps = node_index_path(doc, instance);
    match doc.schema().template(template).template_index() {
        Some(index) => steps.push(index),
        None => panic!("template has no slot position"),
    }
    steps
}

/// Pointer segments from the root down to `node`: template names at object
/// levels, decimal indices at array levels.
pub(crate) fn node_pointer_steps(doc: &Json, node: NodeId) -> Vec<String> {
    let schema = doc.schema().clone();
    let mut steps = Vec::new();
    let mut current = node;
    while let Some(parent) = doc.parent(current) {
        match schema.template(doc.template_of(parent)).kind() {
            Kind::Array => {
                let position = doc
                    .position_in_array(parent, current)
                    .unwrap_or_else(|| panic!("node is detached from its array"));
                steps.push(position.to_string());
            }
            _ => {
                let t = schema.template(doc.template_of(current));
                steps.push(t.template_name().to_string());
            }
        }
        current = parent;
    }
    steps.reverse();
    steps
}

/// Render the pointer addressing a property slot of an object instance.
pub fn pointer_for_slot(doc: &Json, instance: NodeId, template: TemplateId) -> String {
    let mut steps = node_pointer_steps(doc, instance);
    steps.push(doc.schema().template(template).template_name().to_string());
    format_json_pointer(&steps)
}

/// Render the pointer addressing an element position of an array instance.
pub fn pointer_for_element(doc: &Json, array: NodeId, index: usize) -> String {
    let mut steps = node_pointer_steps(doc, array);
    steps.push(index.to_string());
    format_json_pointer(&steps)
}

/// Render the pointer addressing the node itself.
pub fn pointer_for_node(doc: &Json, node: NodeId) -> String {
    format_json_pointer(&node_pointer_steps(doc, node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::SchemaBuilder;
    use std::sync::Arc;

    fn todo_doc() -> (Json, TemplateId, TemplateId, TemplateId, TemplateId) {
        let mut b = SchemaBuilder::new();
        let root = b.root();
        let first = b.add_string(root, "FirstName").unwrap();
        let last = b.add_string(root, "LastName").unwrap();
        let (items, element) = b.add_array(root, "Items").unwrap();
        b.add_string(element, "Description").unwrap();
        b.add_bool(element, "IsDone").unwrap();
        (Json::new(b.freeze()), first, last, items, element)
    }

    #[test]
    fn empty_pointer_is_root() {
        let (doc, ..) = todo_doc();
        assert_eq!(evaluate(&doc, "").unwrap(), Target::Root);
    }

    #[test]
    fn resolves_top_level_property() {
        let (doc, first, ..) = todo_doc();
        assert_eq!(
            evaluate(&doc, "/FirstName").unwrap(),
            Target::Slot { instance: doc.root(), template: first }
        );
    }

    #[test]
    fn unknown_token_fails() {
        let (doc, ..) = todo_doc();
        assert_eq!(
            evaluate(&doc, "/Nonono"),
            Err(PointerError::UnknownToken("Nonono".to_string()))
        );
    }

    #[test]
    fn nested_element_property_resolves() {
        let (mut doc, _, _, items, element) = todo_doc();
        let array = doc.child_node(doc.root(), items);
        doc.array_add(array, None);
        let second = doc.array_add(array, None);
        let is_done = doc.schema().property_by_name(element, "IsDone").unwrap();

        assert_eq!(
            evaluate(&doc, "/Items/1/IsDone").unwrap(),
            Target::Slot { instance: second, template: is_done }
        );
    }

    #[test]
    fn array_index_validation() {
        let (mut doc, _, _, items, _) = todo_doc();
        let array = doc.child_node(doc.root(), items);
        doc.array_add(array, None);

        assert_eq!(
            evaluate(&doc, "/Items/x"),
            Err(PointerError::NotANumber("x".to_string()))
        );
        assert_eq!(
            evaluate(&doc, "/Items/5"),
            Err(PointerError::IndexOutOfRange { index: 5, len: 1 })
        );
        // The append position resolves as an element target.
        assert_eq!(
            evaluate(&doc, "/Items/1").unwrap(),
            Target::Element { array, index: 1 }
        );
        // But it cannot be traversed through.
        assert_eq!(
            evaluate(&doc, "/Items/1/IsDone"),
            Err(PointerError::IndexOutOfRange { index: 1, len: 1 })
        );
    }

    #[test]
    fn pointer_without_leading_slash_is_malformed() {
        let (doc, ..) = todo_doc();
        assert_eq!(
            evaluate(&doc, "FirstName"),
            Err(PointerError::Malformed("FirstName".to_string()))
        );
    }

    #[test]
    fn trailing_tokens_below_scalar_fail() {
        let (doc, ..) = todo_doc();
        assert_eq!(
            evaluate(&doc, "/FirstName/more"),
            Err(PointerError::TrailingTokens("FirstName".to_string()))
        );
    }

    #[test]
    fn index_path_inverts_evaluate() {
        let (mut doc, _, _, items, element) = todo_doc();
        let array = doc.child_node(doc.root(), items);
        doc.array_add(array, None);
        let second = doc.array_add(array, None);
        let is_done = doc.schema().property_by_name(element, "IsDone").unwrap();

        // IsDone is slot 1 of the element; the element sits at position 1 of
        // the array, which is slot 2 of the root.
        assert_eq!(index_path_for(&doc, second, is_done), vec![2, 1, 1]);

        let pointer = pointer_for_slot(&doc, second, is_done);
        assert_eq!(pointer, "/Items/1/IsDone");
        assert_eq!(
            evaluate(&doc, &pointer).unwrap(),
            Target::Slot { instance: second, template: is_done }
        );
    }

    #[test]
    fn pointer_escapes_template_names() {
        let mut b = SchemaBuilder::new();
        let root = b.root();
        let odd = b.add_string(root, "a/b").unwrap();
        let doc = Json::new(b.freeze());
        let pointer = pointer_for_slot(&doc, doc.root(), odd);
        assert_eq!(pointer, "/a~1b");
        assert_eq!(
            evaluate(&doc, &pointer).unwrap(),
            Target::Slot { instance: doc.root(), template: odd }
        );
    }

    #[test]
    fn schema_shared_across_threads() {
        let mut b = SchemaBuilder::new();
        let root = b.root();
        b.add_string(root, "Name").unwrap();
        let schema = b.freeze();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let schema = Arc::clone(&schema);
                std::thread::spawn(move || {
                    let doc = Json::new(schema);
                    evaluate(&doc, "/Name").is_ok()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
