#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use dpe_adapter::{AdapterEvents, AdapterMessage, DocumentAdapter, DocumentAdapterPtr};
use dpe_dom::{AdapterBuilder, Patch, Value};

/// A flat document with one labeled spin box row per entry.
pub fn flat_doc(rows: &[(&str, Value)]) -> Value {
    let mut builder = AdapterBuilder::new();
    for (label, value) in rows {
        builder = builder
            .begin_row()
            .label(label)
            .property_editor("SpinBox", value.clone())
            .end_row();
    }
    builder.finish().unwrap()
}

/// A labeled row with nested rows, as built by [`AdapterBuilder`].
pub fn row_with_children(label: &str, value: Value, nested: &[(&str, Value)]) -> Value {
    let mut builder = AdapterBuilder::new()
        .begin_row()
        .label(label)
        .property_editor("SpinBox", value);
    for (nested_label, nested_value) in nested {
        builder = builder
            .begin_row()
            .label(nested_label)
            .property_editor("SpinBox", nested_value.clone())
            .end_row();
    }
    let doc = builder.end_row().finish().unwrap();
    doc["$children"][0].clone()
}

/// Mirrors an adapter the way an editor would: re-reads the document on
/// reset and applies every patch to its copy.
pub struct Consumer {
    pub snapshot: Rc<RefCell<Value>>,
    pub resets: Rc<Cell<usize>>,
    pub patches: Rc<RefCell<Vec<Patch>>>,
}

impl Consumer {
    pub fn attach(adapter: &Rc<dyn DocumentAdapter>) -> Consumer {
        let snapshot = Rc::new(RefCell::new(adapter.generate_contents()));
        let resets = Rc::new(Cell::new(0));
        let patches = Rc::new(RefCell::new(Vec::new()));

        let weak: Weak<dyn DocumentAdapter> = Rc::downgrade(adapter);
        let on_reset = Rc::clone(&snapshot);
        let reset_count = Rc::clone(&resets);
        adapter.events().connect_reset(move || {
            if let Some(adapter) = weak.upgrade() {
                *on_reset.borrow_mut() = adapter.generate_contents();
            }
            reset_count.set(reset_count.get() + 1);
        });

        let on_change = Rc::clone(&snapshot);
        let log = Rc::clone(&patches);
        adapter.events().connect_changed(move |patch| {
            patch
                .apply(&mut on_change.borrow_mut())
                .unwrap_or_else(|e| panic!("emitted patch does not apply: {e}\n{:#}", patch.to_json()));
            log.borrow_mut().push(patch.clone());
        });

        Consumer {
            snapshot,
            resets,
            patches,
        }
    }

    pub fn snapshot(&self) -> Value {
        self.snapshot.borrow().clone()
    }

    pub fn take_patches(&self) -> Vec<Patch> {
        std::mem::take(&mut *self.patches.borrow_mut())
    }
}

/// A source whose events are raised by hand, without touching the document
/// first.
#[derive(Debug)]
pub struct ScriptedAdapter {
    pub contents: RefCell<Value>,
    pub events: AdapterEvents,
    pub received: RefCell<Vec<AdapterMessage>>,
}

impl ScriptedAdapter {
    pub fn shared(contents: Value) -> Rc<ScriptedAdapter> {
        Rc::new(ScriptedAdapter {
            contents: RefCell::new(contents),
            events: AdapterEvents::new(),
            received: RefCell::new(Vec::new()),
        })
    }

    /// Replaces the document and announces `patch` as the change.
    pub fn announce(&self, contents: Value, patch: &Patch) {
        *self.contents.borrow_mut() = contents;
        self.events.notify_changed(patch);
    }
}

impl DocumentAdapter for ScriptedAdapter {
    fn generate_contents(&self) -> Value {
        self.contents.borrow().clone()
    }

    fn handle_message(&self, message: &AdapterMessage) -> Value {
        self.received.borrow_mut().push(message.clone());
        Value::String(format!("handled {}", message.origin))
    }

    fn events(&self) -> &AdapterEvents {
        &self.events
    }
}

pub fn as_ptr<T: DocumentAdapter + 'static>(adapter: &Rc<T>) -> DocumentAdapterPtr {
    Rc::clone(adapter) as DocumentAdapterPtr
}

/// The row shown for a label whose sources disagree.
pub fn differ_row(label: &str, distinct: usize, missing: usize) -> Value {
    serde_json::json!({"$type": "Row", "$children": [
        {"$type": "Label", "Value": label},
        {
            "$type": "PropertyEditor",
            "Type": "ValuesDiffer",
            "Value": null,
            "DistinctValues": distinct,
            "MissingSources": missing
        }
    ]})
}

/// Merge of `docs` computed from scratch.
pub fn fresh_merge(docs: &[Value]) -> Value {
    dpe_adapter::cli::merge_documents(docs.to_vec()).unwrap()
}
