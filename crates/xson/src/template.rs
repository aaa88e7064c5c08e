//! The template (schema) system.
//!
//! A template tree defines the shape of a document: one node per property,
//! plus one element template per array. Templates live in an append-only
//! arena owned by [`Schema`] and are addressed by stable [`TemplateId`]
//! indices, so parent back-references never own anything and the whole tree
//! is shared read-only across every instance built from it.
//!
//! Schemas are constructed through [`SchemaBuilder`] and sealed with
//! [`SchemaBuilder::freeze`], which consumes the builder and returns an
//! `Arc<Schema>`. Instances can only be created from the frozen form, so
//! mutating a schema that is already attached to an instance is not
//! expressible.

use std::sync::Arc;

use thiserror::Error;

use crate::value::ScalarValue;

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("DUPLICATE_PROPERTY: '{0}'")]
    DuplicateProperty(String),
    #[error("NOT_AN_OBJECT: '{0}' cannot hold properties")]
    NotAnObject(String),
    #[error("NOT_A_SCALAR: '{0}' cannot carry a default value")]
    NotAScalar(String),
    #[error("BINDING_MISCONFIGURED: {0}")]
    BindingMisconfigured(String),
}

// ── Kinds and binding ─────────────────────────────────────────────────────

/// The shape a template describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Object,
    Array,
    String,
    Long,
    Decimal,
    Bool,
}

impl Kind {
    pub fn is_scalar(self) -> bool {
        !matches!(self, Kind::Object | Kind::Array)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Object => "object",
            Kind::Array => "array",
            Kind::String => "string",
            Kind::Long => "long",
            Kind::Decimal => "decimal",
            Kind::Bool => "bool",
        }
    }
}

/// Declared binding of a template to a data-object property.
///
/// `Auto` defers to the parent object's `bind_children` default; `Unbound`
/// is the explicit opt-out that wins over that default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bind {
    Auto,
    Path(String),
    Unbound,
}

// ── Template node ─────────────────────────────────────────────────────────

/// Stable index of a template in its schema's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(pub(crate) u32);

/// One immutable schema node.
#[derive(Debug)]
pub struct Template {
    kind: Kind,
    /// Literal JSON key, `$` conventions and all. Empty for the root and
    /// for array element templates.
    template_name: String,
    /// Binding identifier: `template_name` with `$` stripped.
    property_name: String,
    /// Slot position among siblings. `None` for the root and for array
    /// element templates, which are not slots.
    template_index: Option<usize>,
    parent: Option<TemplateId>,
    properties: Vec<TemplateId>,
    element: Option<TemplateId>,
    bind: Bind,
    bind_children: bool,
    default_value: Option<ScalarValue>,
    /// Resolved once at freeze; `None` means the slot is unbound.
    effective_bind: Option<String>,
}

impl Template {
    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    pub fn template_index(&self) -> Option<usize> {
        self.template_index
    }

    pub fn parent(&self) -> Option<TemplateId> {
        self.parent
    }

    /// Ordered child templates (object kind; empty otherwise).
    pub fn properties(&self) -> &[TemplateId] {
        &self.properties
    }

    /// The element template (array kind only).
    pub fn element(&self) -> Option<TemplateId> {
        self.element
    }

    pub fn bind(&self) -> &Bind {
        &self.bind
    }

    pub fn bind_children(&self) -> bool {
        self.bind_children
    }

    /// The data-object property this template reads and writes, resolved at
    /// freeze time. `None` for unbound templates.
    pub fn effective_bind(&self) -> Option<&str> {
        self.effective_bind.as_deref()
    }

    /// The slot default: the declared default if one was set, the kind
    /// default otherwise. Scalar kinds only.
    pub fn default_value(&self) -> ScalarValue {
        self.default_value
            .clone()
            .unwrap_or_else(|| ScalarValue::default_for(self.kind))
    }
}

// ── Schema ────────────────────────────────────────────────────────────────

/// A frozen template tree: an arena of [`Template`] nodes with the root at
/// index 0. Shared via `Arc`; never mutated after freeze.
#[derive(Debug)]
pub struct Schema {
    templates: Vec<Template>,
}

impl Schema {
    pub fn root(&self) -> TemplateId {
        TemplateId(0)
    }

    pub fn template(&self, id: TemplateId) -> &Template {
        &self.templates[id.0 as usize]
    }

    /// Look up a child of an object template by its literal JSON key.
    pub fn property_by_name(&self, object: TemplateId, name: &str) -> Option<TemplateId> {
        self.template(object)
            .properties
            .iter()
            .copied()
            .find(|id| self.template(*id).template_name == name)
    }

    /// The child at a given slot position of an object template.
    pub fn property_at(&self, object: TemplateId, index: usize) -> Option<TemplateId> {
        self.template(object).properties.get(index).copied()
    }

    pub fn property_count(&self, object: TemplateId) -> usize {
        self.template(object).properties.len()
    }
}

// ── Builder ───────────────────────────────────────────────────────────────

/// Mutable schema under construction. `freeze` seals it.
#[derive(Debug)]
pub struct SchemaBuilder {
    templates: Vec<Template>,
}

impl SchemaBuilder {
    /// Start a schema with an empty root object template.
    pub fn new() -> Self {
        SchemaBuilder {
            templates: vec![Template {
                kind: Kind::Object,
                template_name: String::new(),
                property_name: String::new(),
                template_index: None,
                parent: None,
                properties: Vec::new(),
                element: None,
                bind: Bind::Auto,
                bind_children: false,
                default_value: None,
                effective_bind: None,
            }],
        }
    }

    pub fn root(&self) -> TemplateId {
        TemplateId(0)
    }

    fn template(&self, id: TemplateId) -> &Template {
        &self.templates[id.0 as usize]
    }

    fn push(&mut self, template: Template) -> TemplateId {
        let id = TemplateId(self.templates.len() as u32);
        self.templates.push(template);
        id
    }

    /// Append a child template to an object, assigning the next slot index.
    fn add_property(
        &mut self,
        parent: TemplateId,
        name: &str,
        kind: Kind,
    ) -> Result<TemplateId, SchemaError> {
        let p = self.template(parent);
        if p.kind != Kind::Object {
            return Err(SchemaError::NotAnObject(p.template_name.clone()));
        }
        if p.properties
            .iter()
            .any(|id| self.template(*id).template_name == name)
        {
            return Err(SchemaError::DuplicateProperty(name.to_string()));
        }
        let index = self.template(parent).properties.len();
        let id = self.push(Template {
            kind,
            template_name: name.to_string(),
            property_name: name.replace('$', ""),
            template_index: Some(index),
            parent: Some(parent),
            properties: Vec::new(),
            element: None,
            bind: Bind::Auto,
            bind_children: false,
            default_value: None,
            effective_bind: None,
        });
        self.templates[parent.0 as usize].properties.push(id);
        Ok(id)
    }

    pub fn add_string(&mut self, parent: TemplateId, name: &str) -> Result<TemplateId, SchemaError> {
        self.add_property(parent, name, Kind::String)
    }

    pub fn add_long(&mut self, parent: TemplateId, name: &str) -> Result<TemplateId, SchemaError> {
        self.add_property(parent, name, Kind::Long)
    }

    pub fn add_decimal(&mut self, parent: TemplateId, name: &str) -> Result<TemplateId, SchemaError> {
        self.add_property(parent, name, Kind::Decimal)
    }

    pub fn add_bool(&mut self, parent: TemplateId, name: &str) -> Result<TemplateId, SchemaError> {
        self.add_property(parent, name, Kind::Bool)
    }

    pub fn add_object(&mut self, parent: TemplateId, name: &str) -> Result<TemplateId, SchemaError> {
        self.add_property(parent, name, Kind::Object)
    }

    /// Append an array property. Returns the array template and its element
    /// object template; properties of the elements are added to the latter.
    pub fn add_array(
        &mut self,
        parent: TemplateId,
        name: &str,
    ) -> Result<(TemplateId, TemplateId), SchemaError> {
        let array = self.add_property(parent, name, Kind::Array)?;
        let element = self.push(Template {
            kind: Kind::Object,
            template_name: String::new(),
            property_name: format!("{}Element", name.replace('$', "")),
            template_index: None,
            parent: Some(array),
            properties: Vec::new(),
            element: None,
            bind: Bind::Auto,
            bind_children: false,
            default_value: None,
            effective_bind: None,
        });
        self.templates[array.0 as usize].element = Some(element);
        Ok((array, element))
    }

    /// Bind a scalar template to a named data-object property.
    pub fn bind(&mut self, template: TemplateId, property: &str) -> Result<(), SchemaError> {
        self.check_bindable(template)?;
        self.templates[template.0 as usize].bind = Bind::Path(property.to_string());
        Ok(())
    }

    /// Force a template unbound, overriding any `bind_children` default on
    /// its parent.
    pub fn unbound(&mut self, template: TemplateId) -> Result<(), SchemaError> {
        self.check_bindable(template)?;
        self.templates[template.0 as usize].bind = Bind::Unbound;
        Ok(())
    }

    fn check_bindable(&self, template: TemplateId) -> Result<(), SchemaError> {
        let t = self.template(template);
        if !t.kind.is_scalar() {
            return Err(SchemaError::BindingMisconfigured(format!(
                "'{}' is {}-kind; only scalar templates bind to data properties",
                t.template_name,
                t.kind.as_str()
            )));
        }
        match t.parent.map(|p| self.template(p).kind) {
            Some(Kind::Object) => Ok(()),
            _ => Err(SchemaError::BindingMisconfigured(format!(
                "'{}' is not a property of an object template",
                t.template_name
            ))),
        }
    }

    /// Default-bind every `Auto` child of this object template to its
    /// property name.
    pub fn bind_children(&mut self, object: TemplateId) -> Result<(), SchemaError> {
        let t = self.template(object);
        if t.kind != Kind::Object {
            return Err(SchemaError::BindingMisconfigured(format!(
                "'{}' is {}-kind; bind_children applies to object templates",
                t.template_name,
                t.kind.as_str()
            )));
        }
        self.templates[object.0 as usize].bind_children = true;
        Ok(())
    }

    fn set_default(
        &mut self,
        template: TemplateId,
        value: ScalarValue,
    ) -> Result<(), SchemaError> {
        let t = self.template(template);
        if t.kind != value.kind() {
            return Err(SchemaError::NotAScalar(t.template_name.clone()));
        }
        self.templates[template.0 as usize].default_value = Some(value);
        Ok(())
    }

    pub fn default_string(
        &mut self,
        template: TemplateId,
        value: impl Into<String>,
    ) -> Result<(), SchemaError> {
        self.set_default(template, ScalarValue::Str(value.into()))
    }

    pub fn default_long(&mut self, template: TemplateId, value: i64) -> Result<(), SchemaError> {
        self.set_default(template, ScalarValue::Long(value))
    }

    pub fn default_bool(&mut self, template: TemplateId, value: bool) -> Result<(), SchemaError> {
        self.set_default(template, ScalarValue::Bool(value))
    }

    /// Seal the schema. Resolves every template's effective binding and
    /// returns the shared, read-only form instances are created from.
    pub fn freeze(mut self) -> Arc<Schema> {
        for i in 0..self.templates.len() {
            let t = &self.templates[i];
            if !t.kind.is_scalar() {
                continue;
            }
            let resolved = match &t.bind {
                Bind::Path(p) => Some(p.clone()),
                Bind::Unbound => None,
                Bind::Auto => t.parent.and_then(|p| {
                    let parent = &self.templates[p.0 as usize];
                    (parent.kind == Kind::Object && parent.bind_children)
                        .then(|| t.property_name.clone())
                }),
            };
            self.templates[i].effective_bind = resolved;
        }
        Arc::new(Schema {
            templates: self.templates,
        })
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
