//! Conversion of plain JSON into snapshots.

use serde_json::Value;

use crate::config::NotifyConfig;
use crate::error::FrozenError;
use crate::node::{Entries, Entry, Frozen, Input, Meta};
use crate::parents::attach_children;

/// Freeze `raw` into a snapshot tree.
///
/// A value that is already a snapshot comes back unchanged, with no new
/// parent links. Arrays become sequences and objects become mappings; nested
/// containers are frozen with the same `notify` config.
pub fn freeze(raw: impl Into<Input>, notify: &NotifyConfig) -> Result<Frozen, FrozenError> {
    match raw.into() {
        Input::Frozen(frozen) => Ok(frozen),
        Input::Raw(value) => freeze_value(value, notify),
    }
}

pub(crate) fn freeze_value(value: Value, notify: &NotifyConfig) -> Result<Frozen, FrozenError> {
    let entries = match value {
        Value::Array(items) => Entries::Sequence(
            items
                .into_iter()
                .map(|v| to_entry(Input::Raw(v), notify))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => Entries::Mapping(
            map.into_iter()
                .map(|(k, v)| Ok((k, to_entry(Input::Raw(v), notify)?)))
                .collect::<Result<_, FrozenError>>()?,
        ),
        other => return Err(FrozenError::NotAContainer(other.to_string())),
    };
    let frozen = Frozen::alloc(entries, Meta::new(notify.clone()));
    attach_children(&frozen);
    Ok(frozen)
}

/// Turn an op input into an entry, freezing raw containers.
pub(crate) fn to_entry(input: Input, notify: &NotifyConfig) -> Result<Entry, FrozenError> {
    match input {
        Input::Frozen(frozen) => Ok(Entry::Node(frozen)),
        Input::Raw(v @ (Value::Array(_) | Value::Object(_))) => {
            Ok(Entry::Node(freeze_value(v, notify)?))
        }
        Input::Raw(v) => Ok(Entry::Leaf(v)),
    }
}
