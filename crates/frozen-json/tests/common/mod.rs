#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use frozen_json::{
    freeze, replace, Freezer, FreezerOptions, Frozen, Input, Key, Listener, ListenerEvent,
    NotifyConfig, Update,
};
use serde_json::{json, Value};

pub fn cfg() -> NotifyConfig {
    NotifyConfig::default()
}

pub fn path(keys: &[&str]) -> Vec<Key> {
    keys.iter()
        .map(|k| match k.parse::<usize>() {
            Ok(i) => Key::Index(i),
            Err(_) => Key::Name((*k).to_string()),
        })
        .collect()
}

/// Record `(event name, payload json)` for every event on `listener`.
pub fn record(listener: &Listener) -> Rc<RefCell<Vec<(&'static str, Value)>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    listener.on(move |ev| {
        let payload = match ev {
            ListenerEvent::Update(node) => node.to_json(),
            ListenerEvent::Immediate { current, .. } => current.to_json(),
        };
        sink.borrow_mut().push((ev.name(), payload));
    });
    seen
}

pub fn set(key: &str, value: impl Into<Input>) -> Update {
    Update::Replace(vec![(Key::from(key), value.into())])
}

/// Two independent roots sharing one child snapshot under `"c"`.
pub fn two_roots_sharing_child() -> (Frozen, Frozen, Frozen) {
    let cfg = cfg();
    let p1 = freeze(json!({"c": {"v": 1}, "tag": "p1"}), &cfg).unwrap();
    let shared = p1.node("c").unwrap();
    let p2 = freeze(json!({"tag": "p2"}), &cfg).unwrap();
    let p2 = replace(&p2, [("c", &shared)]).unwrap();
    (p1, p2, shared)
}

/// A store shaped `root → mid1/mid2 → leaf`, with `leaf` shared by both mids.
pub fn diamond_store() -> (Freezer, Frozen) {
    let store = Freezer::new(
        json!({"mid1": {"leaf": {"v": 1}}, "mid2": {"own": true}}),
        FreezerOptions::default(),
    )
    .unwrap();
    let leaf = store.get().unwrap().find(&path(&["mid1", "leaf"])).unwrap();
    let leaf = leaf.as_node().unwrap().clone();
    store
        .update_at(&path(&["mid2"]), set("leaf", &leaf))
        .unwrap();
    (store, leaf)
}
