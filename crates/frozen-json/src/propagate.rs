//! Upward propagation of a replaced snapshot.
//!
//! Only one parent path is rebuilt eagerly per replacement. Every other
//! parent, and transitively all of its ancestors, receives a dirty mark
//! instead and is rebuilt when someone cleans it. This keeps a write to a
//! widely shared node linear in the depth of the eager path.

use crate::error::FrozenError;
use crate::listener::{schedule_update, ListenerEvent};
use crate::node::{Frozen, PendingUpdate};
use crate::ops::refresh_eager;

/// Propagate the replacement of `old` by `new` to every container of `old`.
///
/// Schedules an "update" on `new` when `old` was listened to. A root fires
/// "immediate" synchronously before that, so live "update" subscribers
/// already see the new root. Otherwise the first parent is refreshed eagerly
/// and the remaining parents are marked dirty.
pub fn refresh_parents(old: &Frozen, new: &Frozen) -> Result<(), FrozenError> {
    let (listener, parents) = {
        let meta = old.meta();
        (meta.listener.clone(), meta.live_parents())
    };
    let Some(eager) = parents.first().cloned() else {
        if let Some(listener) = listener {
            tracing::trace!("root replaced");
            listener.trigger(&ListenerEvent::Immediate {
                previous: old.clone(),
                current: new.clone(),
            });
            schedule_update(new);
        }
        return Ok(());
    };
    if listener.is_some() {
        schedule_update(new);
    }

    tracing::trace!(fan_out = parents.len(), "refreshing parents");
    refresh_eager(&eager, old, new)?;

    // The eager path may have rebuilt other holders of `old`; re-reading the
    // links marks their replacements rather than the stale versions.
    let pending = PendingUpdate {
        old: old.clone(),
        new: new.clone(),
    };
    for parent in old.parents() {
        if !parent.ptr_eq(&eager) {
            mark_dirty(&parent, &pending);
        }
    }
    Ok(())
}

/// Record `dirt` on `node` and on every ancestor, overwriting older marks.
pub fn mark_dirty(node: &Frozen, dirt: &PendingUpdate) {
    let parents = {
        let mut meta = node.meta_mut();
        meta.dirty = Some(dirt.clone());
        meta.live_parents()
    };
    tracing::trace!(parents = parents.len(), "marked dirty");
    for parent in parents {
        mark_dirty(&parent, dirt);
    }
}
