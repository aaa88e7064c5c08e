//! The instance model: mutable document trees built from a frozen schema.
//!
//! A [`Json`] document owns an arena of nodes; [`NodeId`] 0 is the root.
//! Object nodes hold one slot per sibling template, indexed by the
//! template's slot position, each slot being either a raw scalar or a child
//! node. Array nodes hold an ordered list of element nodes. Parent links are
//! plain non-owning ids; ownership flows root-to-leaf through the arena.
//!
//! The arena is append-only: removing an array element detaches its subtree
//! (parent link cleared) but the nodes stay in place, so change records that
//! still reference a removed element can be recognized and invalidated at
//! patch-build time instead of silently pointing at recycled storage.
//!
//! Every instance created from the same schema has an identical slot
//! layout; the slot position is the only way a slot is ever addressed.

use std::sync::Arc;

use crate::binding::{BindingError, DataObject};
use crate::changelog::ChangeLog;
use crate::pointer::PointerError;
use crate::template::{Kind, Schema, TemplateId};
use crate::value::ScalarValue;

/// Index of an instance node in its document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

#[derive(Debug)]
enum Slot {
    Scalar(ScalarValue),
    Child(NodeId),
}

#[derive(Debug)]
enum NodeData {
    Object {
        slots: Vec<Slot>,
        data: Option<Box<dyn DataObject>>,
    },
    Array {
        items: Vec<NodeId>,
    },
}

#[derive(Debug)]
struct Node {
    template: TemplateId,
    parent: Option<NodeId>,
    data: NodeData,
}

/// One document: a shared schema plus the node arena holding its values.
#[derive(Debug)]
pub struct Json {
    schema: Arc<Schema>,
    nodes: Vec<Node>,
}

impl Json {
    /// Create a document from a frozen schema. The whole tree named by the
    /// schema is instantiated up front with slot defaults; arrays start
    /// empty.
    pub fn new(schema: Arc<Schema>) -> Json {
        let mut doc = Json {
            schema: Arc::clone(&schema),
            nodes: Vec::new(),
        };
        let root = doc.instantiate(schema.root(), None);
        debug_assert_eq!(root, NodeId(0));
        doc
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn template_of(&self, node: NodeId) -> TemplateId {
        self.node(node).template
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    /// True while the node is reachable from the document root. Removed
    /// subtrees stay in the arena but are no longer attached.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = node;
        while let Some(parent) = self.node(current).parent {
            current = parent;
        }
        current == self.root()
    }

    // ── Slot access ───────────────────────────────────────────────────────

    /// Read a scalar slot through its binding.
    ///
    /// Unbound slots return the raw stored value. Bound slots read the
    /// attached data object's property; with no data object attached the
    /// template default is returned, and a data object lacking the property
    /// is a [`BindingError`]. The raw slot is never consulted for a bound
    /// template.
    pub fn get_value(
        &self,
        node: NodeId,
        template: TemplateId,
    ) -> Result<ScalarValue, BindingError> {
        let schema = Arc::clone(&self.schema);
        let t = schema.template(template);
        let index = self.slot_index(node, template);
        match t.effective_bind() {
            None => match &self.object_slots(node)[index] {
                Slot::Scalar(v) => Ok(v.clone()),
                Slot::Child(_) => panic!(
                    "template '{}' is {}-kind, not a scalar slot",
                    t.template_name(),
                    t.kind().as_str()
                ),
            },
            Some(property) => match self.data(node) {
                None => Ok(t.default_value()),
                Some(data) => match data.get_property(property) {
                    Some(v) if v.kind() == t.kind() => Ok(v),
                    Some(v) => Err(BindingError::KindMismatch {
                        property: property.to_string(),
                        template: t.template_name().to_string(),
                        expected: t.kind().as_str(),
                        found: v.kind().as_str(),
                    }),
                    None => Err(BindingError::PropertyMissing {
                        property: property.to_string(),
                        template: t.template_name().to_string(),
                    }),
                },
            },
        }
    }

    /// Write a scalar slot through its binding and record the update.
    ///
    /// The value's kind must match the template kind; passing a mismatched
    /// value is a programming error and panics. Wire-facing layers check
    /// kinds before calling. Pass `None` as the log to mutate without
    /// recording.
    pub fn set_value(
        &mut self,
        node: NodeId,
        template: TemplateId,
        value: ScalarValue,
        log: Option<&mut ChangeLog>,
    ) -> Result<(), BindingError> {
        let schema = Arc::clone(&self.schema);
        let t = schema.template(template);
        assert_eq!(
            value.kind(),
            t.kind(),
            "value kind {} does not match template '{}' of kind {}",
            value.kind().as_str(),
            t.template_name(),
            t.kind().as_str()
        );
        let index = self.slot_index(node, template);
        match t.effective_bind() {
            None => {
                self.object_slots_mut(node)[index] = Slot::Scalar(value);
            }
            Some(property) => match self.data_mut(node) {
                None => {
                    return Err(BindingError::NoDataObject {
                        template: t.template_name().to_string(),
                    })
                }
                Some(data) => {
                    if !data.set_property(property, value) {
                        return Err(BindingError::PropertyMissing {
                            property: property.to_string(),
                            template: t.template_name().to_string(),
                        });
                    }
                }
            },
        }
        if let Some(log) = log {
            log.update_value(node, template);
        }
        Ok(())
    }

    /// The child object or array node stored in a container slot.
    pub fn child_node(&self, node: NodeId, template: TemplateId) -> NodeId {
        let index = self.slot_index(node, template);
        match &self.object_slots(node)[index] {
            Slot::Child(child) => *child,
            Slot::Scalar(_) => panic!(
                "template '{}' is a scalar slot, not a container",
                self.schema.template(template).template_name()
            ),
        }
    }

    // ── Typed accessors ───────────────────────────────────────────────────

    pub fn get_string(&self, node: NodeId, template: TemplateId) -> Result<String, BindingError> {
        match self.get_value(node, template)? {
            ScalarValue::Str(s) => Ok(s),
            other => panic!("expected a String-kind slot, found {:?}", other.kind()),
        }
    }

    pub fn set_string(
        &mut self,
        node: NodeId,
        template: TemplateId,
        value: impl Into<String>,
        log: Option<&mut ChangeLog>,
    ) -> Result<(), BindingError> {
        self.set_value(node, template, ScalarValue::Str(value.into()), log)
    }

    pub fn get_long(&self, node: NodeId, template: TemplateId) -> Result<i64, BindingError> {
        match self.get_value(node, template)? {
            ScalarValue::Long(n) => Ok(n),
            other => panic!("expected a Long-kind slot, found {:?}", other.kind()),
        }
    }

    pub fn set_long(
        &mut self,
        node: NodeId,
        template: TemplateId,
        value: i64,
        log: Option<&mut ChangeLog>,
    ) -> Result<(), BindingError> {
        self.set_value(node, template, ScalarValue::Long(value), log)
    }

    pub fn get_decimal(
        &self,
        node: NodeId,
        template: TemplateId,
    ) -> Result<serde_json::Number, BindingError> {
        match self.get_value(node, template)? {
            ScalarValue::Decimal(n) => Ok(n),
            other => panic!("expected a Decimal-kind slot, found {:?}", other.kind()),
        }
    }

    pub fn set_decimal(
        &mut self,
        node: NodeId,
        template: TemplateId,
        value: serde_json::Number,
        log: Option<&mut ChangeLog>,
    ) -> Result<(), BindingError> {
        self.set_value(node, template, ScalarValue::Decimal(value), log)
    }

    pub fn get_bool(&self, node: NodeId, template: TemplateId) -> Result<bool, BindingError> {
        match self.get_value(node, template)? {
            ScalarValue::Bool(b) => Ok(b),
            other => panic!("expected a Bool-kind slot, found {:?}", other.kind()),
        }
    }

    pub fn set_bool(
        &mut self,
        node: NodeId,
        template: TemplateId,
        value: bool,
        log: Option<&mut ChangeLog>,
    ) -> Result<(), BindingError> {
        self.set_value(node, template, ScalarValue::Bool(value), log)
    }

    // ── Data objects ──────────────────────────────────────────────────────

    /// Attach a data object to an object instance. Bound templates of this
    /// instance read and write its properties from now on.
    pub fn set_data(&mut self, node: NodeId, data: Box<dyn DataObject>) {
        match &mut self.node_mut(node).data {
            NodeData::Object { data: slot, .. } => *slot = Some(data),
            NodeData::Array { .. } => panic!("data objects attach to object instances"),
        }
    }

    pub fn take_data(&mut self, node: NodeId) -> Option<Box<dyn DataObject>> {
        match &mut self.node_mut(node).data {
            NodeData::Object { data, .. } => data.take(),
            NodeData::Array { .. } => None,
        }
    }

    pub fn data(&self, node: NodeId) -> Option<&dyn DataObject> {
        match &self.node(node).data {
            NodeData::Object { data, .. } => data.as_deref(),
            NodeData::Array { .. } => None,
        }
    }

    fn data_mut(&mut self, node: NodeId) -> Option<&mut Box<dyn DataObject>> {
        match &mut self.node_mut(node).data {
            NodeData::Object { data, .. } => data.as_mut(),
            NodeData::Array { .. } => None,
        }
    }

    // ── Arrays ────────────────────────────────────────────────────────────

    pub fn array_len(&self, array: NodeId) -> usize {
        self.array_items(array).len()
    }

    pub fn array_item(&self, array: NodeId, index: usize) -> Option<NodeId> {
        self.array_items(array).get(index).copied()
    }

    /// Position of an element in its array, or `None` if detached.
    pub fn position_in_array(&self, array: NodeId, element: NodeId) -> Option<usize> {
        self.array_items(array).iter().position(|id| *id == element)
    }

    /// Append a new element instantiated from the array's element template.
    /// Records an `Add` at the new tail index.
    pub fn array_add(&mut self, array: NodeId, log: Option<&mut ChangeLog>) -> NodeId {
        let tail = self.array_len(array);
        self.insert_element(array, tail, log)
    }

    /// Insert a new element at `index`, shifting the rest up. `index` may be
    /// at most the current length (the append position).
    pub fn array_insert_at(
        &mut self,
        array: NodeId,
        index: usize,
        log: Option<&mut ChangeLog>,
    ) -> Result<NodeId, PointerError> {
        let len = self.array_len(array);
        if index > len {
            return Err(PointerError::IndexOutOfRange { index, len });
        }
        Ok(self.insert_element(array, index, log))
    }

    fn insert_element(
        &mut self,
        array: NodeId,
        index: usize,
        log: Option<&mut ChangeLog>,
    ) -> NodeId {
        let array_template = self.template_of(array);
        let element_template = match self.schema.template(array_template).element() {
            Some(t) => t,
            None => panic!("node is not an array instance"),
        };
        let element = self.instantiate(element_template, Some(array));
        self.array_items_mut(array).insert(index, element);
        if let Some(log) = log {
            log.add_item_in_list(array, array_template, index, element);
        }
        element
    }

    /// Detach the element at `index` and record a `Remove` at that index.
    /// Subsequent elements shift down by one.
    pub fn array_remove_at(
        &mut self,
        array: NodeId,
        index: usize,
        log: Option<&mut ChangeLog>,
    ) -> Result<(), PointerError> {
        let len = self.array_len(array);
        if index >= len {
            return Err(PointerError::IndexOutOfRange { index, len });
        }
        self.remove_element(array, index, log);
        Ok(())
    }

    fn remove_element(&mut self, array: NodeId, index: usize, log: Option<&mut ChangeLog>) {
        let element = self.array_items_mut(array).remove(index);
        self.node_mut(element).parent = None;
        if let Some(log) = log {
            let array_template = self.template_of(array);
            log.remove_item_in_list(array, array_template, index);
        }
    }

    /// Remove every element, tail first.
    pub fn array_clear(&mut self, array: NodeId, mut log: Option<&mut ChangeLog>) {
        while self.array_len(array) > 0 {
            let tail = self.array_len(array) - 1;
            self.remove_element(array, tail, log.as_deref_mut());
        }
    }

    /// Reset a subtree to its schema defaults: scalar slots to their
    /// template defaults, arrays emptied, nested objects recursed into.
    pub fn reset_node(
        &mut self,
        node: NodeId,
        mut log: Option<&mut ChangeLog>,
    ) -> Result<(), BindingError> {
        let schema = Arc::clone(&self.schema);
        let template = self.template_of(node);
        match schema.template(template).kind() {
            Kind::Array => {
                self.array_clear(node, log);
                Ok(())
            }
            Kind::Object => {
                for property in schema.template(template).properties() {
                    let t = schema.template(*property);
                    if t.kind().is_scalar() {
                        self.set_value(node, *property, t.default_value(), log.as_deref_mut())?;
                    } else {
                        let child = self.child_node(node, *property);
                        self.reset_node(child, log.as_deref_mut())?;
                    }
                }
                Ok(())
            }
            kind => panic!("reset of a {}-kind node", kind.as_str()),
        }
    }

    // ── Arena internals ───────────────────────────────────────────────────

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    fn instantiate(&mut self, template: TemplateId, parent: Option<NodeId>) -> NodeId {
        let schema = Arc::clone(&self.schema);
        match schema.template(template).kind() {
            Kind::Object => {
                let id = self.alloc(Node {
                    template,
                    parent,
                    data: NodeData::Object {
                        slots: Vec::new(),
                        data: None,
                    },
                });
                let properties = schema.template(template).properties().to_vec();
                let mut slots = Vec::with_capacity(properties.len());
                for property in properties {
                    let t = schema.template(property);
                    if t.kind().is_scalar() {
                        slots.push(Slot::Scalar(t.default_value()));
                    } else {
                        let child = self.instantiate(property, Some(id));
                        slots.push(Slot::Child(child));
                    }
                }
                match &mut self.node_mut(id).data {
                    NodeData::Object { slots: out, .. } => *out = slots,
                    NodeData::Array { .. } => unreachable!(),
                }
                id
            }
            Kind::Array => self.alloc(Node {
                template,
                parent,
                data: NodeData::Array { items: Vec::new() },
            }),
            kind => panic!("{}-kind templates are slots, not instances", kind.as_str()),
        }
    }

    /// Slot position of a property template inside this object instance.
    fn slot_index(&self, node: NodeId, template: TemplateId) -> usize {
        let t = self.schema.template(template);
        assert_eq!(
            t.parent(),
            Some(self.template_of(node)),
            "template '{}' is not a property of this instance",
            t.template_name()
        );
        match t.template_index() {
            Some(index) => index,
            None => panic!("template '{}' is not a slot", t.template_name()),
        }
    }

    fn object_slots(&self, node: NodeId) -> &[Slot] {
        match &self.node(node).data {
            NodeData::Object { slots, .. } => slots,
            NodeData::Array { .. } => panic!("array instances have no property slots"),
        }
    }

    fn object_slots_mut(&mut self, node: NodeId) -> &mut Vec<Slot> {
        match &mut self.node_mut(node).data {
            NodeData::Object { slots, .. } => slots,
            NodeData::Array { .. } => panic!("array instances have no property slots"),
        }
    }

    fn array_items(&self, array: NodeId) -> &[NodeId] {
        match &self.node(array).data {
            NodeData::Array { items } => items,
            NodeData::Object { .. } => panic!("node is not an array instance"),
        }
    }

    fn array_items_mut(&mut self, array: NodeId) -> &mut Vec<NodeId> {
        match &mut self.node_mut(array).data {
            NodeData::Array { items } => items,
            NodeData::Object { .. } => panic!("node is not an array instance"),
        }
    }
}
