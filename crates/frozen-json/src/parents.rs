//! Parent-graph bookkeeping.
//!
//! Each snapshot keeps a deduplicated list of weak links to the snapshots
//! that contain it. The list is the only thing propagation walks, so the
//! graph it describes must stay acyclic.

use crate::error::FrozenError;
use crate::node::Frozen;

/// Register `parent` as a parent of `child`, once.
///
/// Fails with [`FrozenError::CyclicGraph`] when `child` is `parent` or one of
/// its ancestors; the links are left untouched in that case.
pub fn add_parent(child: &Frozen, parent: &Frozen) -> Result<(), FrozenError> {
    ensure_adoptable(child, parent)?;
    link_parent(child, parent);
    Ok(())
}

/// [`add_parent`] without the ancestry walk, for children of a snapshot
/// that was just allocated from validated entries.
fn link_parent(child: &Frozen, parent: &Frozen) {
    let mut meta = child.meta_mut();
    meta.parents.retain(|w| w.strong_count() > 0);
    if !meta.parents.iter().any(|w| parent.is(w)) {
        meta.parents.push(parent.downgrade());
    }
}

/// Drop the first link from `child` to `parent`, if any.
pub fn remove_parent(child: &Frozen, parent: &Frozen) {
    let mut meta = child.meta_mut();
    if let Some(pos) = meta.parents.iter().position(|w| parent.is(w)) {
        meta.parents.remove(pos);
    }
}

/// Whether `candidate` is `node` or one of its ancestors.
pub fn is_self_or_ancestor(candidate: &Frozen, node: &Frozen) -> bool {
    let mut stack = vec![node.clone()];
    let mut seen: Vec<Frozen> = Vec::new();
    while let Some(current) = stack.pop() {
        if current.ptr_eq(candidate) {
            return true;
        }
        if seen.iter().any(|s| s.ptr_eq(&current)) {
            continue;
        }
        stack.extend(current.parents());
        seen.push(current);
    }
    false
}

/// Reject adopting `candidate` anywhere below `node`.
pub(crate) fn ensure_adoptable(candidate: &Frozen, node: &Frozen) -> Result<(), FrozenError> {
    if is_self_or_ancestor(candidate, node) {
        tracing::debug!("rejecting link that would close a cycle");
        return Err(FrozenError::CyclicGraph);
    }
    Ok(())
}

/// Unregister `node` from every child snapshot it holds.
pub(crate) fn detach_children(node: &Frozen) {
    for child in node.entries().nodes() {
        remove_parent(child, node);
    }
}

/// Register `node` as parent of every child snapshot it holds.
pub(crate) fn attach_children(node: &Frozen) {
    for child in node.entries().nodes() {
        link_parent(child, node);
    }
}
