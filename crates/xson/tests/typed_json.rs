//! Schema construction and typed instance behavior.

use std::sync::Arc;

use xson::{
    BindingError, DataObject, Json, ScalarValue, Schema, SchemaBuilder, SchemaError, TemplateId,
};

fn person_schema() -> (Arc<Schema>, TemplateId, TemplateId, TemplateId) {
    let mut b = SchemaBuilder::new();
    let root = b.root();
    let first = b.add_string(root, "FirstName").unwrap();
    let last = b.add_string(root, "LastName").unwrap();
    let age = b.add_long(root, "Age").unwrap();
    (b.freeze(), first, last, age)
}

#[test]
fn new_instances_carry_defaults() {
    let mut b = SchemaBuilder::new();
    let root = b.root();
    let name = b.add_string(root, "Name").unwrap();
    b.default_string(name, "unnamed").unwrap();
    let misc = b.add_long(root, "Misc").unwrap();
    let done = b.add_bool(root, "Done").unwrap();
    b.default_bool(done, true).unwrap();
    let schema = b.freeze();

    let doc = Json::new(schema);
    assert_eq!(doc.get_string(doc.root(), name).unwrap(), "unnamed");
    assert_eq!(doc.get_long(doc.root(), misc).unwrap(), 0);
    assert!(doc.get_bool(doc.root(), done).unwrap());
}

#[test]
fn many_instances_share_one_schema() {
    let (schema, first, ..) = person_schema();
    let docs: Vec<Json> = (0..16).map(|_| Json::new(Arc::clone(&schema))).collect();
    for doc in &docs {
        assert_eq!(doc.get_string(doc.root(), first).unwrap(), "");
    }
    // The schema arena itself is shared, not copied per instance.
    assert_eq!(Arc::strong_count(&schema), 17);
}

#[test]
fn duplicate_property_fails_at_build_time() {
    let mut b = SchemaBuilder::new();
    let root = b.root();
    b.add_string(root, "Twice").unwrap();
    assert_eq!(
        b.add_bool(root, "Twice"),
        Err(SchemaError::DuplicateProperty("Twice".to_string()))
    );
}

// ── Data binding ──────────────────────────────────────────────────────────

#[derive(Debug)]
struct Account {
    owner: String,
    balance: i64,
}

impl DataObject for Account {
    fn get_property(&self, name: &str) -> Option<ScalarValue> {
        match name {
            "Owner" => Some(ScalarValue::Str(self.owner.clone())),
            "Balance" => Some(ScalarValue::Long(self.balance)),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: ScalarValue) -> bool {
        match (name, value) {
            ("Owner", ScalarValue::Str(s)) => {
                self.owner = s;
                true
            }
            ("Balance", ScalarValue::Long(n)) => {
                self.balance = n;
                true
            }
            _ => false,
        }
    }
}

#[test]
fn bind_children_delegates_by_property_name() {
    let mut b = SchemaBuilder::new();
    let root = b.root();
    let owner = b.add_string(root, "Owner").unwrap();
    let balance = b.add_long(root, "Balance").unwrap();
    b.bind_children(root).unwrap();
    let mut doc = Json::new(b.freeze());
    doc.set_data(
        doc.root(),
        Box::new(Account {
            owner: "Alice".to_string(),
            balance: 1200,
        }),
    );

    assert_eq!(doc.get_string(doc.root(), owner).unwrap(), "Alice");
    doc.set_long(doc.root(), balance, 900, None).unwrap();
    assert_eq!(doc.get_long(doc.root(), balance).unwrap(), 900);
}

#[test]
fn explicit_unbound_wins_over_bind_children() {
    let mut b = SchemaBuilder::new();
    let root = b.root();
    let owner = b.add_string(root, "Owner").unwrap();
    b.bind_children(root).unwrap();
    b.unbound(owner).unwrap();
    let mut doc = Json::new(b.freeze());
    doc.set_data(
        doc.root(),
        Box::new(Account {
            owner: "from data".to_string(),
            balance: 0,
        }),
    );

    // The raw slot is authoritative even though the data object has a
    // same-named property.
    assert_eq!(doc.get_string(doc.root(), owner).unwrap(), "");
    doc.set_string(doc.root(), owner, "raw", None).unwrap();
    assert_eq!(doc.get_string(doc.root(), owner).unwrap(), "raw");
}

#[test]
fn dollar_suffix_strips_only_for_binding() {
    let mut b = SchemaBuilder::new();
    let root = b.root();
    let owner = b.add_string(root, "Owner$").unwrap();
    b.bind_children(root).unwrap();
    let mut doc = Json::new(b.freeze());
    doc.set_data(
        doc.root(),
        Box::new(Account {
            owner: "Bob".to_string(),
            balance: 0,
        }),
    );

    // Binding uses the sanitized property name; the wire keeps the suffix.
    assert_eq!(doc.get_string(doc.root(), owner).unwrap(), "Bob");
    assert_eq!(xson::to_json(&doc).unwrap(), r#"{"Owner$":"Bob"}"#);
}

#[test]
fn bind_to_explicit_property_path() {
    let mut b = SchemaBuilder::new();
    let root = b.root();
    let display = b.add_string(root, "DisplayName").unwrap();
    b.bind(display, "Owner").unwrap();
    let mut doc = Json::new(b.freeze());
    doc.set_data(
        doc.root(),
        Box::new(Account {
            owner: "Carol".to_string(),
            balance: 0,
        }),
    );
    assert_eq!(doc.get_string(doc.root(), display).unwrap(), "Carol");
}

#[test]
fn missing_bound_property_surfaces_binding_error() {
    let mut b = SchemaBuilder::new();
    let root = b.root();
    let ghost = b.add_string(root, "Ghost").unwrap();
    b.bind(ghost, "NoSuchProperty").unwrap();
    let mut doc = Json::new(b.freeze());
    doc.set_data(
        doc.root(),
        Box::new(Account {
            owner: String::new(),
            balance: 0,
        }),
    );
    assert!(matches!(
        doc.get_string(doc.root(), ghost),
        Err(BindingError::PropertyMissing { .. })
    ));
}
