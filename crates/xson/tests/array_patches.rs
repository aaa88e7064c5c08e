//! Array mutation ordering through the change log and patch builder.

use xson::{
    create_patches, patch_to_string, ChangeLog, ChangeType, Json, SchemaBuilder,
};

fn list_doc() -> (Json, xson::TemplateId, xson::TemplateId) {
    let mut b = SchemaBuilder::new();
    let root = b.root();
    let (items, element) = b.add_array(root, "Items").unwrap();
    let desc = b.add_string(element, "Description").unwrap();
    (Json::new(b.freeze()), items, desc)
}

#[test]
fn add_then_remove_on_empty_array() {
    let (mut doc, items, _) = list_doc();
    let array = doc.child_node(doc.root(), items);
    let mut log = ChangeLog::new();

    doc.array_add(array, Some(&mut log));
    doc.array_remove_at(array, 0, Some(&mut log)).unwrap();

    assert_eq!(doc.array_len(array), 0);
    let changes = log.flush();
    assert_eq!(changes.len(), 2);
    assert_eq!((changes[0].op, changes[0].index), (ChangeType::Add, Some(0)));
    assert_eq!((changes[1].op, changes[1].index), (ChangeType::Remove, Some(0)));
}

#[test]
fn consecutive_adds_use_tail_indices() {
    let (mut doc, items, desc) = list_doc();
    let array = doc.child_node(doc.root(), items);
    let mut log = ChangeLog::new();

    let a = doc.array_add(array, Some(&mut log));
    doc.set_string(a, desc, "a", Some(&mut log)).unwrap();
    let b = doc.array_add(array, Some(&mut log));
    doc.set_string(b, desc, "b", Some(&mut log)).unwrap();

    let ops = create_patches(&doc, &mut log).unwrap();
    assert_eq!(
        patch_to_string(&ops),
        concat!(
            r#"[{"op":"add","path":"/Items/0","value":{"Description":"a"}},"#,
            r#"{"op":"add","path":"/Items/1","value":{"Description":"b"}}]"#
        )
    );
}

#[test]
fn remove_records_the_pre_removal_index() {
    let (mut doc, items, desc) = list_doc();
    let array = doc.child_node(doc.root(), items);

    for label in ["a", "b", "c"] {
        let item = doc.array_add(array, None);
        doc.set_string(item, desc, label, None).unwrap();
    }

    let mut log = ChangeLog::new();
    doc.array_remove_at(array, 1, Some(&mut log)).unwrap();

    let ops = create_patches(&doc, &mut log).unwrap();
    assert_eq!(patch_to_string(&ops), r#"[{"op":"remove","path":"/Items/1"}]"#);
    assert_eq!(doc.array_len(array), 2);
}

#[test]
fn interleaved_adds_and_removes_stay_in_record_order() {
    let (mut doc, items, desc) = list_doc();
    let array = doc.child_node(doc.root(), items);
    let mut log = ChangeLog::new();

    let a = doc.array_add(array, Some(&mut log));
    doc.set_string(a, desc, "a", Some(&mut log)).unwrap();
    doc.array_remove_at(array, 0, Some(&mut log)).unwrap();
    let b = doc.array_add(array, Some(&mut log));
    doc.set_string(b, desc, "b", Some(&mut log)).unwrap();

    // Each subsequent index is only valid relative to the ops before it:
    // the add of "a" is invalidated by its removal, the remove itself and
    // the add of "b" keep their recorded positions.
    let ops = create_patches(&doc, &mut log).unwrap();
    assert_eq!(
        patch_to_string(&ops),
        concat!(
            r#"[{"op":"remove","path":"/Items/0"},"#,
            r#"{"op":"add","path":"/Items/0","value":{"Description":"b"}}]"#
        )
    );
}

#[test]
fn update_after_earlier_removal_uses_current_position() {
    let (mut doc, items, desc) = list_doc();
    let array = doc.child_node(doc.root(), items);

    for label in ["a", "b", "c"] {
        let item = doc.array_add(array, None);
        doc.set_string(item, desc, label, None).unwrap();
    }
    let last = doc.array_item(array, 2).unwrap();

    let mut log = ChangeLog::new();
    doc.array_remove_at(array, 0, Some(&mut log)).unwrap();
    doc.set_string(last, desc, "c2", Some(&mut log)).unwrap();

    // After the remove shifts everything down, "c" sits at position 1.
    let ops = create_patches(&doc, &mut log).unwrap();
    assert_eq!(
        patch_to_string(&ops),
        concat!(
            r#"[{"op":"remove","path":"/Items/0"},"#,
            r#"{"op":"replace","path":"/Items/1/Description","value":"c2"}]"#
        )
    );
}
