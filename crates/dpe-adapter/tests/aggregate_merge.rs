mod common;

use std::rc::Rc;

use common::{
    as_ptr, differ_row, flat_doc, fresh_merge, row_with_children, Consumer, ScriptedAdapter,
};
use dpe_adapter::message::SET_VALUE;
use dpe_adapter::{
    AdapterEvents, AdapterMessage, AggregateError, AggregateOptions, DocumentAdapter,
    LabeledRowAggregateAdapter, LabeledRowPolicy, ValueAdapter,
};
use dpe_dom::{AdapterBuilder, Patch, PatchOperation, Path, Value};
use serde_json::json;

fn aggregate() -> (Rc<LabeledRowAggregateAdapter>, Consumer) {
    let aggregate = Rc::new(LabeledRowAggregateAdapter::new(LabeledRowPolicy));
    let view: Rc<dyn DocumentAdapter> = aggregate.clone();
    let consumer = Consumer::attach(&view);
    (aggregate, consumer)
}

fn path(pointer: &str) -> Path {
    pointer.parse().unwrap()
}

fn replace(pointer: &str, value: Value) -> Patch {
    Patch::from(vec![PatchOperation::Replace {
        path: path(pointer),
        value,
    }])
}

fn assert_in_sync(aggregate: &LabeledRowAggregateAdapter, consumer: &Consumer) {
    assert_eq!(consumer.snapshot(), aggregate.generate_contents());
}

#[test]
fn single_source_is_reproduced_exactly() {
    let doc = AdapterBuilder::new()
        .begin_row()
        .label("Transform")
        .property_editor("Vector3", json!([0, 1, 2]))
        .begin_row()
        .label("Scale")
        .property_editor("SpinBox", json!(1.5))
        .end_row()
        .end_row()
        .begin_row()
        .label("Visible")
        .property_editor("CheckBox", json!(true))
        .end_row()
        .finish()
        .unwrap();

    let (aggregate, consumer) = aggregate();
    aggregate.add_adapter(ValueAdapter::shared(doc.clone())).unwrap();
    assert_eq!(aggregate.generate_contents(), doc);
    assert_eq!(consumer.resets.get(), 1);
    assert_in_sync(&aggregate, &consumer);
}

#[test]
fn matching_rows_merge_and_conflicts_show_differ_row() {
    let a = flat_doc(&[("Width", json!(1)), ("Height", json!(2))]);
    let b = flat_doc(&[("Width", json!(1.0)), ("Height", json!(3))]);

    let (aggregate, consumer) = aggregate();
    aggregate.add_adapter(ValueAdapter::shared(a.clone())).unwrap();
    aggregate.add_adapter(ValueAdapter::shared(b)).unwrap();

    let merged = aggregate.generate_contents();
    assert_eq!(merged["$children"][0], a["$children"][0]);
    assert_eq!(merged["$children"][1], differ_row("Height", 2, 0));
    assert_eq!(consumer.resets.get(), 1);
    assert_eq!(consumer.take_patches().len(), 1);
    assert_in_sync(&aggregate, &consumer);
}

#[test]
fn rows_missing_from_a_source_do_not_match() {
    let a = flat_doc(&[("Width", json!(1)), ("Height", json!(2))]);
    let b = flat_doc(&[("Depth", json!(7)), ("Width", json!(1))]);

    let (aggregate, _consumer) = aggregate();
    aggregate.add_adapter(ValueAdapter::shared(a.clone())).unwrap();
    aggregate.add_adapter(ValueAdapter::shared(b)).unwrap();

    let merged = aggregate.generate_contents();
    let rows = merged["$children"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], a["$children"][0]);
    assert_eq!(rows[1], differ_row("Height", 1, 1));
    // Rows only the second source has come after the primary's rows.
    assert_eq!(rows[2], differ_row("Depth", 1, 1));
}

#[test]
fn attach_emits_patch_or_reset_per_options() {
    let a = flat_doc(&[("Width", json!(1))]);
    let b = flat_doc(&[("Width", json!(2))]);

    let (aggregate, consumer) = aggregate();
    aggregate.add_adapter(ValueAdapter::shared(a.clone())).unwrap();
    aggregate.add_adapter(ValueAdapter::shared(b.clone())).unwrap();
    assert_eq!(consumer.resets.get(), 1);
    assert_eq!(consumer.take_patches().len(), 1);

    let resetting = Rc::new(LabeledRowAggregateAdapter::with_options(
        LabeledRowPolicy,
        AggregateOptions {
            reset_on_attach_change: true,
        },
    ));
    let view: Rc<dyn DocumentAdapter> = resetting.clone();
    let watcher = Consumer::attach(&view);
    resetting.add_adapter(ValueAdapter::shared(a)).unwrap();
    resetting.add_adapter(ValueAdapter::shared(b)).unwrap();
    assert_eq!(watcher.resets.get(), 2);
    assert!(watcher.take_patches().is_empty());
    assert!(resetting.options().reset_on_attach_change);
    assert_eq!(resetting.generate_contents(), aggregate.generate_contents());
}

#[test]
fn conflicting_edit_flips_row_and_back() {
    let a = ValueAdapter::shared(flat_doc(&[("Width", json!(1)), ("Height", json!(2))]));
    let b = ValueAdapter::shared(flat_doc(&[("Width", json!(1)), ("Height", json!(2))]));
    let (aggregate, consumer) = aggregate();
    aggregate.add_adapter(as_ptr(&a)).unwrap();
    aggregate.add_adapter(as_ptr(&b)).unwrap();
    consumer.take_patches();
    let matched = aggregate.generate_contents();

    b.apply_patch(&replace("/1/1/Value", json!(3))).unwrap();
    let patches = consumer.take_patches();
    assert_eq!(patches.len(), 1);
    assert_eq!(
        patches[0].operations(),
        &[PatchOperation::Replace {
            path: path("/1/1"),
            value: differ_row("Height", 2, 0)["$children"][1].clone(),
        }]
    );
    assert_in_sync(&aggregate, &consumer);

    b.apply_patch(&replace("/1/1/Value", json!(2.0))).unwrap();
    assert_eq!(aggregate.generate_contents(), matched);
    assert_in_sync(&aggregate, &consumer);
}

#[test]
fn unchanged_regeneration_emits_nothing() {
    let a = ValueAdapter::shared(flat_doc(&[("Width", json!(1))]));
    let b = ValueAdapter::shared(flat_doc(&[("Width", json!(2))]));
    let (aggregate, consumer) = aggregate();
    aggregate.add_adapter(as_ptr(&a)).unwrap();
    aggregate.add_adapter(as_ptr(&b)).unwrap();
    consumer.take_patches();

    // Still two distinct values: the differ row stays the same.
    b.apply_patch(&replace("/0/1/Value", json!(3))).unwrap();
    assert!(consumer.take_patches().is_empty());
    assert_in_sync(&aggregate, &consumer);
}

#[test]
fn source_structure_edits_track_a_fresh_merge() {
    let a = ValueAdapter::shared(flat_doc(&[("Width", json!(1)), ("Height", json!(2))]));
    let b = ValueAdapter::shared(flat_doc(&[("Width", json!(1)), ("Height", json!(2))]));
    let (aggregate, consumer) = aggregate();
    aggregate.add_adapter(as_ptr(&a)).unwrap();
    aggregate.add_adapter(as_ptr(&b)).unwrap();

    let check = || {
        assert_in_sync(&aggregate, &consumer);
        assert_eq!(
            aggregate.generate_contents(),
            fresh_merge(&[a.contents(), b.contents()])
        );
    };

    let depth = flat_doc(&[("Depth", json!(4))])["$children"][0].clone();
    a.apply_patch(&Patch::from(vec![PatchOperation::Add {
        path: path("/0"),
        value: depth,
    }]))
    .unwrap();
    check();

    a.apply_patch(&Patch::from(vec![PatchOperation::Remove { path: path("/2") }]))
        .unwrap();
    check();

    // Renaming a label pairs the row with a different logical row.
    b.apply_patch(&replace("/1/0/Value", json!("Depth"))).unwrap();
    check();

    let nested = flat_doc(&[("Unit", json!("mm"))])["$children"][0].clone();
    a.apply_patch(&Patch::from(vec![PatchOperation::Add {
        path: path("/1/-"),
        value: nested,
    }]))
    .unwrap();
    check();

    b.apply_patch(&Patch::from(vec![PatchOperation::Replace {
        path: path("/0"),
        value: row_with_children("Width", json!(1), &[("Unit", json!("mm"))]),
    }]))
    .unwrap();
    check();
    let merged = aggregate.generate_contents();
    let unit = &merged["$children"][1]["$children"][2];
    assert_eq!(unit["$children"][1]["Value"], json!("mm"));
}

#[test]
fn add_then_remove_adapter_converges() {
    let a = flat_doc(&[("Width", json!(1)), ("Height", json!(2))]);
    let b = ValueAdapter::shared(flat_doc(&[("Height", json!(5)), ("Depth", json!(1))]));

    let (aggregate, consumer) = aggregate();
    aggregate.add_adapter(ValueAdapter::shared(a)).unwrap();
    let before = aggregate.generate_contents();

    aggregate.add_adapter(as_ptr(&b)).unwrap();
    assert_ne!(aggregate.generate_contents(), before);
    aggregate.remove_adapter(&as_ptr(&b)).unwrap();

    assert_eq!(aggregate.generate_contents(), before);
    assert_eq!(aggregate.adapter_count(), 1);
    assert_eq!(consumer.resets.get(), 1);
    assert_in_sync(&aggregate, &consumer);
}

#[test]
fn registry_misuse_is_rejected() {
    let a = ValueAdapter::shared(flat_doc(&[("Width", json!(1))]));
    let stranger = ValueAdapter::shared(flat_doc(&[("Width", json!(2))]));
    let (aggregate, consumer) = aggregate();
    aggregate.add_adapter(as_ptr(&a)).unwrap();
    let before = aggregate.generate_contents();

    assert_eq!(
        aggregate.add_adapter(as_ptr(&a)),
        Err(AggregateError::AdapterAlreadyAttached)
    );
    assert_eq!(
        aggregate.remove_adapter(&as_ptr(&stranger)),
        Err(AggregateError::AdapterNotAttached)
    );
    assert_eq!(aggregate.generate_contents(), before);
    assert_eq!(aggregate.adapter_count(), 1);
    assert_eq!(consumer.resets.get(), 1);
    assert!(consumer.take_patches().is_empty());
}

#[test]
fn removal_disconnects_source_listeners() {
    let a = ValueAdapter::shared(flat_doc(&[("Width", json!(1))]));
    let b = ValueAdapter::shared(flat_doc(&[("Width", json!(1))]));
    let (aggregate, consumer) = aggregate();
    aggregate.add_adapter(as_ptr(&a)).unwrap();
    aggregate.add_adapter(as_ptr(&b)).unwrap();
    assert_eq!(b.events().listener_count(), 3);

    consumer.take_patches();
    aggregate.remove_adapter(&as_ptr(&b)).unwrap();
    assert_eq!(b.events().listener_count(), 0);
    // Both sources agreed, so the merged row is unchanged.
    assert!(consumer.take_patches().is_empty());

    // Edits of a detached source no longer reach the aggregate.
    b.apply_patch(&replace("/0/1/Value", json!(9))).unwrap();
    assert!(consumer.take_patches().is_empty());

    drop(aggregate);
    assert_eq!(a.events().listener_count(), 0);
}

#[test]
fn clear_adapters_resets_to_empty() {
    let a = ValueAdapter::shared(flat_doc(&[("Width", json!(1))]));
    let (aggregate, consumer) = aggregate();
    aggregate.add_adapter(as_ptr(&a)).unwrap();
    aggregate.clear_adapters();

    assert_eq!(aggregate.adapter_count(), 0);
    assert_eq!(
        aggregate.generate_contents(),
        json!({"$type": "Adapter", "$children": []})
    );
    assert_eq!(consumer.resets.get(), 2);
    assert_eq!(a.events().listener_count(), 0);
    assert_in_sync(&aggregate, &consumer);
}

#[test]
fn source_reset_rebuilds_its_contribution() {
    let a = ValueAdapter::shared(flat_doc(&[("Width", json!(1)), ("Height", json!(2))]));
    let b = ValueAdapter::shared(flat_doc(&[("Width", json!(1))]));
    let (aggregate, consumer) = aggregate();
    aggregate.add_adapter(as_ptr(&a)).unwrap();
    aggregate.add_adapter(as_ptr(&b)).unwrap();

    b.set_contents(flat_doc(&[("Height", json!(2)), ("Width", json!(1))]));
    assert_eq!(consumer.resets.get(), 2);
    assert_eq!(aggregate.generate_contents(), fresh_merge(&[a.contents(), b.contents()]));

    a.set_contents(flat_doc(&[("Depth", json!(0))]));
    assert_eq!(consumer.resets.get(), 3);
    assert_eq!(aggregate.generate_contents(), fresh_merge(&[a.contents(), b.contents()]));
    assert_in_sync(&aggregate, &consumer);
}

#[test]
fn identical_reset_is_idempotent() {
    let a = ValueAdapter::shared(flat_doc(&[("Width", json!(1)), ("Height", json!(2))]));
    let b = ValueAdapter::shared(flat_doc(&[("Height", json!(3))]));
    let (aggregate, _consumer) = aggregate();
    aggregate.add_adapter(as_ptr(&a)).unwrap();
    aggregate.add_adapter(as_ptr(&b)).unwrap();
    let before = aggregate.generate_contents();

    a.set_contents(a.contents());
    b.set_contents(b.contents());
    assert_eq!(aggregate.generate_contents(), before);
}

#[test]
fn malformed_source_patch_falls_back_to_reset() {
    let doc = flat_doc(&[("Width", json!(1))]);
    let scripted = ScriptedAdapter::shared(doc);
    let (aggregate, consumer) = aggregate();
    aggregate.add_adapter(as_ptr(&scripted)).unwrap();

    let actual = flat_doc(&[("Width", json!(1)), ("Height", json!(2))]);
    let bogus = Patch::from(vec![PatchOperation::Remove { path: path("/7") }]);
    scripted.announce(actual.clone(), &bogus);

    assert_eq!(consumer.resets.get(), 2);
    assert_eq!(aggregate.generate_contents(), actual);
    assert_in_sync(&aggregate, &consumer);
}

#[test]
fn set_value_reaches_every_contributor() {
    let a = ValueAdapter::shared(flat_doc(&[("Width", json!(1)), ("Height", json!(2))]));
    let b = ValueAdapter::shared(flat_doc(&[("Height", json!(3)), ("Width", json!(1))]));
    let (aggregate, consumer) = aggregate();
    aggregate.add_adapter(as_ptr(&a)).unwrap();
    aggregate.add_adapter(as_ptr(&b)).unwrap();
    assert_eq!(aggregate.generate_contents()["$children"][1], differ_row("Height", 2, 0));

    let response =
        aggregate.handle_message(&AdapterMessage::new(SET_VALUE, path("/1/1"), json!(8)));
    assert_eq!(response, Value::Null);
    assert_eq!(a.contents()["$children"][1]["$children"][1]["Value"], json!(8));
    assert_eq!(b.contents()["$children"][0]["$children"][1]["Value"], json!(8));
    assert_eq!(
        aggregate.generate_contents()["$children"][1],
        a.contents()["$children"][1]
    );
    assert_in_sync(&aggregate, &consumer);
}

#[test]
fn messages_are_routed_to_source_paths() {
    let extra = flat_doc(&[("Extra", json!(0))])["$children"][0].clone();
    let a = ScriptedAdapter::shared(
        AdapterBuilder::new()
            .value(row_with_children("Width", json!(1), &[("Unit", json!("mm"))]))
            .finish()
            .unwrap(),
    );
    let b = ScriptedAdapter::shared(
        AdapterBuilder::new()
            .value(extra)
            .value(row_with_children("Width", json!(1), &[("Unit", json!("cm"))]))
            .finish()
            .unwrap(),
    );
    let (aggregate, _consumer) = aggregate();
    aggregate.add_adapter(as_ptr(&a)).unwrap();
    aggregate.add_adapter(as_ptr(&b)).unwrap();

    let response =
        aggregate.handle_message(&AdapterMessage::new("Ping", path("/0/2/1"), json!(null)));
    assert_eq!(response, json!("handled /0/2/1"));
    assert_eq!(a.received.borrow()[0].origin, path("/0/2/1"));
    assert_eq!(b.received.borrow()[0].origin, path("/1/2/1"));

    // The "Extra" row only exists in the second source.
    aggregate.handle_message(&AdapterMessage::new("Ping", path("/1/0"), json!(null)));
    assert_eq!(a.received.borrow().len(), 1);
    assert_eq!(b.received.borrow()[1].origin, path("/0/0"));
}

#[test]
fn source_messages_are_forwarded_in_aggregate_space() {
    let a = ValueAdapter::shared(flat_doc(&[("Width", json!(1))]));
    let b = ValueAdapter::shared(flat_doc(&[("Extra", json!(0)), ("Width", json!(1))]));
    let (aggregate, _consumer) = aggregate();
    aggregate.add_adapter(as_ptr(&a)).unwrap();
    aggregate.add_adapter(as_ptr(&b)).unwrap();

    let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    aggregate.events().connect_message(move |message| {
        sink.borrow_mut().push(message.origin.clone());
        json!("ack")
    });

    let response = b.send_message(&AdapterMessage::new("Focus", path("/1/1"), Value::Null));
    assert_eq!(response, json!("ack"));
    let unresolved = b.send_message(&AdapterMessage::new("Focus", path("/Title"), Value::Null));
    assert_eq!(unresolved, json!("ack"));
    assert_eq!(*seen.borrow(), vec![path("/0/1"), path("/Title")]);
}

#[test]
fn aggregates_nest() {
    let a = ValueAdapter::shared(flat_doc(&[("Width", json!(1))]));
    let b = ValueAdapter::shared(flat_doc(&[("Width", json!(1))]));
    let c = ValueAdapter::shared(flat_doc(&[("Width", json!(2))]));

    let inner = Rc::new(LabeledRowAggregateAdapter::new(LabeledRowPolicy));
    inner.add_adapter(as_ptr(&a)).unwrap();
    inner.add_adapter(as_ptr(&b)).unwrap();

    let (outer, consumer) = aggregate();
    outer.add_adapter(as_ptr(&inner)).unwrap();
    outer.add_adapter(as_ptr(&c)).unwrap();
    assert_eq!(outer.generate_contents()["$children"][0], differ_row("Width", 2, 0));

    a.apply_patch(&replace("/0/1/Value", json!(2))).unwrap();
    b.apply_patch(&replace("/0/1/Value", json!(2))).unwrap();
    assert_eq!(outer.generate_contents(), c.contents());
    assert_in_sync(&outer, &consumer);
}

#[test]
fn edits_that_change_row_kind_track_a_fresh_merge() {
    let a = ValueAdapter::shared(flat_doc(&[("A", json!(1)), ("B", json!(2))]));
    let b = ValueAdapter::shared(flat_doc(&[("A", json!(1))]));
    let (aggregate, consumer) = aggregate();
    aggregate.add_adapter(as_ptr(&a)).unwrap();
    aggregate.add_adapter(as_ptr(&b)).unwrap();

    let check = || {
        assert_in_sync(&aggregate, &consumer);
        assert_eq!(
            aggregate.generate_contents(),
            fresh_merge(&[a.contents(), b.contents()])
        );
    };

    a.apply_patch(&replace("/0/$type", json!("Label"))).unwrap();
    check();
    let merged = aggregate.generate_contents();
    assert_eq!(merged["$children"][1], differ_row("A", 1, 1));

    a.apply_patch(&replace("/0/$type", json!("Row"))).unwrap();
    check();
    assert_eq!(consumer.resets.get(), 1);

    // Same at a nested level, where the parent row's header changes too.
    let width = row_with_children("Width", json!(1), &[("Unit", json!("mm"))]);
    a.apply_patch(&Patch::from(vec![PatchOperation::Add {
        path: path("/-"),
        value: width.clone(),
    }]))
    .unwrap();
    b.apply_patch(&Patch::from(vec![PatchOperation::Add {
        path: path("/-"),
        value: width,
    }]))
    .unwrap();
    check();

    b.apply_patch(&replace("/1/2/$type", json!("Label"))).unwrap();
    check();
    b.apply_patch(&replace("/1/2/$type", json!("Row"))).unwrap();
    check();
    assert_eq!(consumer.resets.get(), 1);
}

#[test]
fn removing_primary_and_middle_adapters_tracks_a_fresh_merge() {
    let a = ValueAdapter::shared(flat_doc(&[("Width", json!(1)), ("Height", json!(2))]));
    let b = ValueAdapter::shared(flat_doc(&[
        ("Depth", json!(3)),
        ("Width", json!(1)),
        ("Nested", json!(0)),
    ]));
    let c = ValueAdapter::shared(flat_doc(&[("Nested", json!(0)), ("Depth", json!(4))]));
    b.apply_patch(&Patch::from(vec![PatchOperation::Replace {
        path: path("/2"),
        value: row_with_children("Nested", json!(0), &[("Unit", json!("mm"))]),
    }]))
    .unwrap();

    let (aggregate, consumer) = aggregate();
    for source in [&a, &b, &c] {
        aggregate.add_adapter(as_ptr(source)).unwrap();
    }
    assert_eq!(
        aggregate.generate_contents(),
        fresh_merge(&[a.contents(), b.contents(), c.contents()])
    );

    aggregate.remove_adapter(&as_ptr(&b)).unwrap();
    assert_in_sync(&aggregate, &consumer);
    assert_eq!(
        aggregate.generate_contents(),
        fresh_merge(&[a.contents(), c.contents()])
    );

    // Rows only `c` had become primary there and move into its order.
    aggregate.remove_adapter(&as_ptr(&a)).unwrap();
    assert_in_sync(&aggregate, &consumer);
    assert_eq!(aggregate.generate_contents(), c.contents());

    // Later edits still land on the right rows.
    c.apply_patch(&replace("/1/1/Value", json!(5))).unwrap();
    assert_in_sync(&aggregate, &consumer);
    assert_eq!(aggregate.generate_contents(), c.contents());
    assert_eq!(consumer.resets.get(), 1);
}

#[test]
fn multi_operation_patches_emit_one_consistent_patch() {
    let a = ValueAdapter::shared(flat_doc(&[("Width", json!(1)), ("Height", json!(2))]));
    let b = ValueAdapter::shared(flat_doc(&[("Width", json!(1)), ("Height", json!(2))]));
    let (aggregate, consumer) = aggregate();
    aggregate.add_adapter(as_ptr(&a)).unwrap();
    aggregate.add_adapter(as_ptr(&b)).unwrap();
    consumer.take_patches();

    let depth = flat_doc(&[("Depth", json!(4))])["$children"][0].clone();
    a.apply_patch(&Patch::from(vec![
        PatchOperation::Replace {
            path: path("/0/1/Value"),
            value: json!(7),
        },
        PatchOperation::Replace {
            path: path("/0/1/Value"),
            value: json!(1),
        },
        PatchOperation::Add {
            path: path("/0"),
            value: depth,
        },
        PatchOperation::Remove { path: path("/2") },
    ]))
    .unwrap();

    assert_eq!(consumer.take_patches().len(), 1);
    assert_in_sync(&aggregate, &consumer);
    assert_eq!(
        aggregate.generate_contents(),
        fresh_merge(&[a.contents(), b.contents()])
    );
}

/// Raises a message every time its document is read.
#[derive(Debug)]
struct ChattyAdapter {
    contents: Value,
    events: AdapterEvents,
}

impl DocumentAdapter for ChattyAdapter {
    fn generate_contents(&self) -> Value {
        self.events
            .notify_message(&AdapterMessage::new("Loaded", path("/0"), Value::Null));
        self.contents.clone()
    }

    fn handle_message(&self, _message: &AdapterMessage) -> Value {
        Value::Null
    }

    fn events(&self) -> &AdapterEvents {
        &self.events
    }
}

#[test]
fn source_messages_raised_during_attach_are_forwarded_untranslated() {
    let first = ValueAdapter::shared(flat_doc(&[("Extra", json!(0)), ("Width", json!(1))]));
    let chatty = Rc::new(ChattyAdapter {
        contents: flat_doc(&[("Width", json!(1))]),
        events: AdapterEvents::new(),
    });
    let (aggregate, _consumer) = aggregate();
    aggregate.add_adapter(as_ptr(&first)).unwrap();

    let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    aggregate.events().connect_message(move |message| {
        sink.borrow_mut().push(message.origin.clone());
        Value::Null
    });

    aggregate.add_adapter(as_ptr(&chatty)).unwrap();
    chatty
        .events
        .notify_message(&AdapterMessage::new("Loaded", path("/0"), Value::Null));

    assert_eq!(*seen.borrow(), vec![path("/0"), path("/1")]);
}
