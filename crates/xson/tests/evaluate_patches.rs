//! Inbound patch evaluation: pointer resolution and application.

use xson::{
    apply_patches, evaluate, index_path_for, ChangeLog, Json, PatchError, PointerError,
    SchemaBuilder, Target, TemplateId,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn todo_doc() -> (Json, TemplateId, TemplateId, TemplateId) {
    let mut b = SchemaBuilder::new();
    let root = b.root();
    let first = b.add_string(root, "FirstName").unwrap();
    b.add_string(root, "LastName").unwrap();
    let (items, element) = b.add_array(root, "Items").unwrap();
    b.add_string(element, "Description").unwrap();
    let is_done = b.add_bool(element, "IsDone").unwrap();
    (Json::new(b.freeze()), first, items, is_done)
}

#[test]
fn replace_resolves_and_applies() {
    init_logging();
    let (mut doc, ..) = todo_doc();
    apply_patches(
        &mut doc,
        r#"[{"op":"replace","path":"/FirstName","value":"Douglas"}]"#,
        None,
    )
    .unwrap();
    assert!(xson::to_json(&doc).unwrap().contains(r#""FirstName":"Douglas""#));
}

#[test]
fn unknown_token_fails_resolution() {
    let (mut doc, ..) = todo_doc();
    let err = apply_patches(
        &mut doc,
        r#"[{"op":"replace","path":"/Nonono","value":1}]"#,
        None,
    )
    .unwrap_err();
    assert_eq!(
        err,
        PatchError::Pointer(PointerError::UnknownToken("Nonono".to_string()))
    );
}

#[test]
fn nested_boolean_addressed_through_two_elements() {
    let (mut doc, _, items, is_done) = todo_doc();
    let array = doc.child_node(doc.root(), items);
    doc.array_add(array, None);
    let second = doc.array_add(array, None);
    doc.set_bool(second, is_done, true, None).unwrap();

    match evaluate(&doc, "/Items/1/IsDone").unwrap() {
        Target::Slot { instance, template } => {
            assert_eq!(instance, second);
            assert_eq!(template, is_done);
            assert!(doc.get_bool(instance, template).unwrap());
        }
        other => panic!("unexpected target: {other:?}"),
    }
}

#[test]
fn pointer_built_from_index_path_resolves_back() {
    let (mut doc, _, items, is_done) = todo_doc();
    let array = doc.child_node(doc.root(), items);
    doc.array_add(array, None);
    let second = doc.array_add(array, None);

    assert_eq!(index_path_for(&doc, second, is_done), vec![2, 1, 1]);
    assert_eq!(
        evaluate(&doc, "/Items/1/IsDone").unwrap(),
        Target::Slot { instance: second, template: is_done }
    );
}

#[test]
fn escaped_tokens_resolve() {
    let mut b = SchemaBuilder::new();
    let root = b.root();
    let odd = b.add_string(root, "a/b").unwrap();
    let tilde = b.add_string(root, "b~r").unwrap();
    let doc = Json::new(b.freeze());

    assert_eq!(
        evaluate(&doc, "/a~1b").unwrap(),
        Target::Slot { instance: doc.root(), template: odd }
    );
    assert_eq!(
        evaluate(&doc, "/b~0r").unwrap(),
        Target::Slot { instance: doc.root(), template: tilde }
    );
}

#[test]
fn array_token_must_be_a_number_in_range() {
    let (mut doc, _, items, _) = todo_doc();
    let array = doc.child_node(doc.root(), items);
    doc.array_add(array, None);

    assert_eq!(
        evaluate(&doc, "/Items/first"),
        Err(PointerError::NotANumber("first".to_string()))
    );
    assert_eq!(
        evaluate(&doc, "/Items/7"),
        Err(PointerError::IndexOutOfRange { index: 7, len: 1 })
    );
}

#[test]
fn suppressed_apply_leaves_log_empty_recorded_apply_fills_it() {
    init_logging();
    let (mut doc, ..) = todo_doc();
    let mut log = ChangeLog::new();

    apply_patches(
        &mut doc,
        r#"[{"op":"replace","path":"/FirstName","value":"silent"}]"#,
        None,
    )
    .unwrap();
    assert!(log.is_empty());

    apply_patches(
        &mut doc,
        r#"[{"op":"replace","path":"/FirstName","value":"recorded"}]"#,
        Some(&mut log),
    )
    .unwrap();
    assert_eq!(log.len(), 1);
}

#[test]
fn incoming_add_and_remove_on_arrays() {
    let (mut doc, _, items, _) = todo_doc();
    apply_patches(
        &mut doc,
        r#"[
            {"op":"add","path":"/Items/0","value":{"Description":"one","IsDone":false}},
            {"op":"add","path":"/Items/1","value":{"Description":"two","IsDone":true}},
            {"op":"remove","path":"/Items/0"}
        ]"#,
        None,
    )
    .unwrap();
    let array = doc.child_node(doc.root(), items);
    assert_eq!(doc.array_len(array), 1);
    assert!(xson::to_json(&doc).unwrap().contains(r#""Description":"two""#));
}

#[test]
fn failed_op_reports_but_earlier_ops_stick() {
    let (mut doc, ..) = todo_doc();
    let err = apply_patches(
        &mut doc,
        r#"[
            {"op":"replace","path":"/LastName","value":"kept"},
            {"op":"replace","path":"/Items/0/IsDone","value":true}
        ]"#,
        None,
    )
    .unwrap_err();
    assert_eq!(
        err,
        PatchError::Pointer(PointerError::IndexOutOfRange { index: 0, len: 0 })
    );
    assert!(xson::to_json(&doc).unwrap().contains("kept"));
}

#[test]
fn incoming_value_kind_is_checked_before_writing() {
    let (mut doc, ..) = todo_doc();
    let err = apply_patches(
        &mut doc,
        r#"[{"op":"replace","path":"/FirstName","value":true}]"#,
        None,
    )
    .unwrap_err();
    assert_eq!(
        err,
        PatchError::TypeMismatch {
            path: "/FirstName".to_string(),
            expected: "string",
            found: "boolean",
        }
    );
    // The slot is untouched.
    assert!(xson::to_json(&doc).unwrap().contains(r#""FirstName":"""#));
}
