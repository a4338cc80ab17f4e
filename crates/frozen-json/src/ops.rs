//! Persistent update operations.
//!
//! Every operation builds a new snapshot from an existing one, sharing every
//! untouched child by identity. The sequence is fixed: validate and freeze
//! the incoming values, unregister the old node from its children, allocate
//! the new node with a copy of the old bookkeeping, register it as parent of
//! its children, then hand the `(old, new)` pair to propagation.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::config::NotifyConfig;
use crate::error::FrozenError;
use crate::freeze::{freeze_value, to_entry};
use crate::node::{Entries, Entry, Frozen, Input, Key, Meta, PendingUpdate};
use crate::parents::{attach_children, detach_children, ensure_adoptable, remove_parent};
use crate::propagate::refresh_parents;

/// Replace `node` wholesale with `value`.
///
/// A snapshot value is adopted as-is: it takes over `node`'s listener and
/// forgets its previous parents. A raw value is frozen with `node`'s notify
/// config. Nothing is shared with `node`'s children either way. Resetting a
/// node to itself is a no-op.
pub fn reset(node: &Frozen, value: impl Into<Input>) -> Result<Frozen, FrozenError> {
    let (replacement, adopted) = match value.into() {
        Input::Frozen(candidate) => {
            if candidate.ptr_eq(node) {
                return Ok(candidate);
            }
            ensure_adoptable(&candidate, node)?;
            (candidate, true)
        }
        Input::Raw(raw) => (freeze_value(raw, &node.notify_config())?, false),
    };
    tracing::debug!(op = "reset", adopted, "replacing snapshot");

    detach_children(node);
    if adopted {
        let listener = node.listener();
        let mut meta = replacement.meta_mut();
        meta.listener = listener;
        meta.parents.clear();
    }
    refresh_parents(node, &replacement)?;
    Ok(replacement)
}

/// Overwrite or add entries, keeping every other entry shared.
///
/// Mappings keep their key order; new keys are appended. Sequences accept
/// indices inside the current length only.
pub fn replace<I, K, V>(node: &Frozen, attrs: I) -> Result<Frozen, FrozenError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Key>,
    V: Into<Input>,
{
    let notify = node.notify_config();
    let entries = match node.entries() {
        Entries::Mapping(current) => {
            let mut incoming: IndexMap<String, Entry> = IndexMap::new();
            for (key, value) in attrs {
                let entry = admit(value.into(), node, &notify)?;
                incoming.insert(key.into().as_name(), entry);
            }
            let mut next = IndexMap::with_capacity(current.len() + incoming.len());
            for (key, entry) in current {
                let entry = incoming.shift_remove(key).unwrap_or_else(|| entry.clone());
                next.insert(key.clone(), entry);
            }
            next.extend(incoming);
            Entries::Mapping(next)
        }
        Entries::Sequence(current) => {
            let mut next = current.clone();
            for (key, value) in attrs {
                let index = key.into().as_index()?;
                if index >= next.len() {
                    return Err(FrozenError::IndexOutOfBounds {
                        index,
                        len: next.len(),
                    });
                }
                next[index] = admit(value.into(), node, &notify)?;
            }
            Entries::Sequence(next)
        }
    };
    tracing::debug!(op = "replace", kind = ?node.kind(), "rebuilding snapshot");
    commit(node, entries)
}

/// Drop the entries named by `keys`. Absent keys are ignored; sequences are
/// compacted.
pub fn remove<I, K>(node: &Frozen, keys: I) -> Result<Frozen, FrozenError>
where
    I: IntoIterator<Item = K>,
    K: Into<Key>,
{
    let entries = match node.entries() {
        Entries::Mapping(current) => {
            let dropped: HashSet<String> = keys.into_iter().map(|k| k.into().as_name()).collect();
            Entries::Mapping(
                current
                    .iter()
                    .filter(|(k, _)| !dropped.contains(*k))
                    .map(|(k, e)| (k.clone(), e.clone()))
                    .collect(),
            )
        }
        Entries::Sequence(current) => {
            let dropped = keys
                .into_iter()
                .map(|k| k.into().as_index())
                .collect::<Result<HashSet<usize>, _>>()?;
            Entries::Sequence(
                current
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !dropped.contains(i))
                    .map(|(_, e)| e.clone())
                    .collect(),
            )
        }
    };
    tracing::debug!(op = "remove", kind = ?node.kind(), "rebuilding snapshot");
    commit(node, entries)
}

/// Remove `delete_count` entries at `index` and insert `items` there.
///
/// Both bounds are clamped to the sequence length.
pub fn splice<I, V>(
    node: &Frozen,
    index: usize,
    delete_count: usize,
    items: I,
) -> Result<Frozen, FrozenError>
where
    I: IntoIterator<Item = V>,
    V: Into<Input>,
{
    let Entries::Sequence(current) = node.entries() else {
        return Err(FrozenError::NotASequence);
    };
    let notify = node.notify_config();
    let start = index.min(current.len());
    let end = start + delete_count.min(current.len() - start);
    let incoming = items
        .into_iter()
        .map(|item| admit(item.into(), node, &notify))
        .collect::<Result<Vec<_>, _>>()?;

    let mut next = current.clone();
    next.splice(start..end, incoming);
    tracing::debug!(op = "splice", start, end, "rebuilding snapshot");
    commit(node, Entries::Sequence(next))
}

/// Rebuild `node` with every entry identical to `old` swapped for `new`.
///
/// Retained children that carry a pending dirty mark are resolved first. With
/// `return_updated` the new snapshot is handed back without propagating;
/// otherwise propagation continues upward and nothing is returned.
///
/// `new` must not be `node` or one of its ancestors.
pub fn refresh(
    node: &Frozen,
    old: &Frozen,
    new: &Frozen,
    return_updated: bool,
) -> Result<Option<Frozen>, FrozenError> {
    ensure_adoptable(new, node)?;
    if !return_updated {
        refresh_eager(node, old, new)?;
        return Ok(None);
    }
    rebuild(node, old, new).map(Some)
}

/// Rebuild `node` around `new` and keep propagating. `new` was produced
/// below `node`, so no ancestry check is needed.
pub(crate) fn refresh_eager(node: &Frozen, old: &Frozen, new: &Frozen) -> Result<(), FrozenError> {
    let frozen = rebuild(node, old, new)?;
    refresh_parents(node, &frozen)
}

/// Materialize the pending substitution recorded on `node`.
pub fn clean(node: &Frozen) -> Result<Frozen, FrozenError> {
    let pending = node.pending().ok_or(FrozenError::NoPendingUpdate)?;
    rebuild(node, &pending.old, &pending.new)
}

fn rebuild(node: &Frozen, old: &Frozen, new: &Frozen) -> Result<Frozen, FrozenError> {
    // A node rebuilt while dirty also applies its own pending substitution,
    // otherwise clearing the mark below would lose it.
    let own = node.pending();
    let substitute = |child: &Frozen| -> Frozen {
        let mut child = child.clone();
        if let Some(PendingUpdate { old, new }) = &own {
            if child.ptr_eq(old) {
                child = new.clone();
            }
        }
        if child.ptr_eq(old) {
            child = new.clone();
        }
        child
    };
    let entries = node.entries().try_map(|entry| {
        let Entry::Node(child) = entry else {
            return Ok(entry.clone());
        };
        let mut child = substitute(child);
        if let Some(pending) = child.pending() {
            tracing::trace!("resolving dirty child");
            child = rebuild(&child, &pending.old, &pending.new)?;
        }
        remove_parent(&child, node);
        Ok(Entry::Node(child))
    })?;
    let frozen = Frozen::alloc(entries, copy_meta(node));
    attach_children(&frozen);
    node.meta_mut().dirty = None;
    Ok(frozen)
}

/// Freeze an incoming value after checking it cannot close a cycle.
fn admit(input: Input, node: &Frozen, notify: &NotifyConfig) -> Result<Entry, FrozenError> {
    if let Input::Frozen(candidate) = &input {
        ensure_adoptable(candidate, node)?;
    }
    to_entry(input, notify)
}

fn commit(node: &Frozen, entries: Entries) -> Result<Frozen, FrozenError> {
    detach_children(node);
    let frozen = Frozen::alloc(entries, copy_meta(node));
    attach_children(&frozen);
    refresh_parents(node, &frozen)?;
    Ok(frozen)
}

fn copy_meta(node: &Frozen) -> Meta {
    let meta = node.meta();
    Meta {
        parents: meta.parents.clone(),
        notify: meta.notify.clone(),
        listener: meta.listener.clone(),
        dirty: None,
    }
}
