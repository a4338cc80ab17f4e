mod common;

use common::{cfg, diamond_store, path, set, two_roots_sharing_child};
use frozen_json::{
    clean, freeze, refresh, remove, replace, splice, update, Entry, FrozenError, Update,
};
use serde_json::json;

#[test]
fn fan_out_rebuilds_first_parent_and_marks_the_rest() {
    let (p1, p2, shared) = two_roots_sharing_child();
    assert_eq!(shared.parents(), vec![p1.clone(), p2.clone()]);

    let next = replace(&shared, [("v", json!(2))]).unwrap();

    assert!(!p1.is_dirty());
    assert!(p2.is_dirty());
    assert!(p2.node("c").unwrap().ptr_eq(&shared));

    let p2_clean = clean(&p2).unwrap();
    assert!(p2_clean.node("c").unwrap().ptr_eq(&next));
    assert_eq!(p2_clean.to_json(), json!({"tag": "p2", "c": {"v": 2}}));
    assert!(next.has_parent(&p2_clean));
    assert!(matches!(clean(&p2_clean), Err(FrozenError::NoPendingUpdate)));
}

#[test]
fn dirty_mark_reaches_ancestors_without_a_direct_entry() {
    let (store, leaf) = diamond_store();
    let root = store.peek();
    let mid2 = root.node("mid2").unwrap();
    assert_eq!(leaf.parents().len(), 2);
    assert!(leaf.has_parent(&mid2));

    store
        .update_at(&path(&["mid1", "leaf"]), set("v", json!(2)))
        .unwrap();

    let root = store.peek();
    assert!(root.is_dirty());
    assert!(root.get("leaf").is_none());
    let mid1 = root.node("mid1").unwrap();
    let mid2 = root.node("mid2").unwrap();
    assert!(!mid1.is_dirty());
    assert!(mid2.is_dirty());
    assert_eq!(mid1.to_json(), json!({"leaf": {"v": 2}}));
    assert!(mid2.node("leaf").unwrap().ptr_eq(&leaf));

    let pending = root.pending().unwrap();
    assert!(pending.old.ptr_eq(&leaf));
    let new_leaf = pending.new.clone();

    let resolved = store.get().unwrap();
    assert!(!resolved.is_dirty());
    assert!(resolved.find(&path(&["mid2", "leaf"])).unwrap().as_node().unwrap().ptr_eq(&new_leaf));
    assert!(resolved.find(&path(&["mid1", "leaf"])).unwrap().as_node().unwrap().ptr_eq(&new_leaf));
    assert_eq!(
        resolved.to_json(),
        json!({"mid1": {"leaf": {"v": 2}}, "mid2": {"own": true, "leaf": {"v": 2}}})
    );
    assert!(new_leaf.has_parent(&resolved.node("mid2").unwrap()));
}

#[test]
fn remove_example() {
    let node = freeze(json!({"a": 1, "b": [1, 2]}), &cfg()).unwrap();
    let seq = node.node("b").unwrap();
    assert!(seq.has_parent(&node));

    let node2 = remove(&node, ["b"]).unwrap();
    assert_eq!(node2.get("a"), Some(&Entry::Leaf(json!(1))));
    assert!(node2.get("b").is_none());
    assert!(!seq.has_parent(&node));
    assert!(!seq.has_parent(&node2));
}

#[test]
fn splice_example() {
    let seq = freeze(json!([["a"], ["b"], ["c"], ["d"]]), &cfg()).unwrap();
    let items: Vec<_> = (0..4usize).map(|i| seq.node(i).unwrap()).collect();

    let next = splice(&seq, 1, 2, [json!("x")]).unwrap();
    assert_eq!(next.to_json(), json!([["a"], "x", ["d"]]));
    assert!(next.node(0usize).unwrap().ptr_eq(&items[0]));
    assert!(next.node(2usize).unwrap().ptr_eq(&items[3]));
    assert!(items[1].parents().is_empty());
    assert!(items[2].parents().is_empty());
    assert_eq!(items[0].parents(), vec![next.clone()]);
    assert_eq!(items[3].parents(), vec![next]);
}

#[test]
fn eager_path_climbs_to_the_root() {
    let cfg = cfg();
    let root = freeze(json!({"a": {"b": {"c": [1]}}}), &cfg).unwrap();
    let listener = frozen_json::create_listener(&root);
    let latest = std::rc::Rc::new(std::cell::RefCell::new(None));
    let sink = std::rc::Rc::clone(&latest);
    listener.on_immediate(move |_, current| *sink.borrow_mut() = Some(current.clone()));

    let c = root.find(&path(&["a", "b", "c"])).unwrap().as_node().unwrap().clone();
    splice(&c, 1, 0, [json!(2)]).unwrap();

    let new_root = latest.borrow().clone().unwrap();
    assert_eq!(new_root.to_json(), json!({"a": {"b": {"c": [1, 2]}}}));
    assert_eq!(root.to_json(), json!({"a": {"b": {"c": [1]}}}));
    assert!(!new_root.is_dirty());
}

#[test]
fn chained_writes_resolve_through_an_inherited_parent() {
    let (_p1, p2, shared) = two_roots_sharing_child();
    let listener = frozen_json::create_listener(&p2);
    let latest = std::rc::Rc::new(std::cell::RefCell::new(None));
    let sink = std::rc::Rc::clone(&latest);
    listener.on_immediate(move |_, current| *sink.borrow_mut() = Some(current.clone()));

    let first = replace(&shared, [("v", json!(2))]).unwrap();
    assert!(p2.is_dirty());
    assert!(latest.borrow().is_none());

    // `first` inherited p2 as a parent, so the next write refreshes p2
    // eagerly and applies both substitutions at once.
    let second = replace(&first, [("v", json!(3))]).unwrap();
    assert!(!p2.is_dirty());
    let p2_next = latest.borrow().clone().unwrap();
    assert!(p2_next.node("c").unwrap().ptr_eq(&second));
    assert_eq!(p2_next.to_json(), json!({"tag": "p2", "c": {"v": 3}}));
}

#[test]
fn later_fan_out_overwrites_pending_mark() {
    let (p1, p2, shared) = two_roots_sharing_child();
    let other = p1.node("c").unwrap();
    assert!(other.ptr_eq(&shared));

    let first = replace(&shared, [("v", json!(2))]).unwrap();
    let second = replace(&shared, [("v", json!(9))]).unwrap();

    let pending = p2.pending().unwrap();
    assert!(pending.old.ptr_eq(&shared));
    assert!(pending.new.ptr_eq(&second));
    assert!(!pending.new.ptr_eq(&first));
    assert_eq!(clean(&p2).unwrap().to_json(), json!({"tag": "p2", "c": {"v": 9}}));
}

#[test]
fn refresh_rejects_an_ancestor_as_replacement() {
    let root = freeze(json!({"a": {"b": {"v": 1}}}), &cfg()).unwrap();
    let a = root.node("a").unwrap();
    let b = a.node("b").unwrap();

    for return_updated in [true, false] {
        let op = Update::Refresh {
            old: b.clone(),
            new: root.clone(),
            return_updated,
        };
        assert!(matches!(update(&a, op), Err(FrozenError::CyclicGraph)));
    }
    assert!(matches!(refresh(&a, &b, &a, true), Err(FrozenError::CyclicGraph)));

    assert!(root.parents().is_empty());
    assert_eq!(a.parents(), vec![root.clone()]);
    assert_eq!(b.parents(), vec![a.clone()]);
    assert!(!a.is_dirty());
    assert!(!root.is_dirty());
    assert_eq!(root.to_json(), json!({"a": {"b": {"v": 1}}}));
}
