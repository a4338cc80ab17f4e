//! Closed set of update operations and their dynamic (by-name) form.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::FrozenError;
use crate::node::{Frozen, Input, Key};
use crate::ops;

/// Name of an update operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Reset,
    Replace,
    Remove,
    Splice,
    Refresh,
}

impl UpdateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateKind::Reset => "reset",
            UpdateKind::Replace => "replace",
            UpdateKind::Remove => "remove",
            UpdateKind::Splice => "splice",
            UpdateKind::Refresh => "refresh",
        }
    }
}

impl FromStr for UpdateKind {
    type Err = FrozenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reset" => Ok(UpdateKind::Reset),
            "replace" => Ok(UpdateKind::Replace),
            "remove" => Ok(UpdateKind::Remove),
            "splice" => Ok(UpdateKind::Splice),
            "refresh" => Ok(UpdateKind::Refresh),
            other => Err(FrozenError::UnknownUpdateKind(other.to_string())),
        }
    }
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An update operation with its typed payload.
#[derive(Debug, Clone)]
pub enum Update {
    Reset(Input),
    Replace(Vec<(Key, Input)>),
    Remove(Vec<Key>),
    Splice {
        index: usize,
        delete_count: usize,
        items: Vec<Input>,
    },
    Refresh {
        old: Frozen,
        new: Frozen,
        return_updated: bool,
    },
}

impl Update {
    pub fn kind(&self) -> UpdateKind {
        match self {
            Update::Reset(_) => UpdateKind::Reset,
            Update::Replace(_) => UpdateKind::Replace,
            Update::Remove(_) => UpdateKind::Remove,
            Update::Splice { .. } => UpdateKind::Splice,
            Update::Refresh { .. } => UpdateKind::Refresh,
        }
    }

    /// Build an operation from its name and JSON options.
    ///
    /// | kind      | options                              |
    /// |-----------|--------------------------------------|
    /// | `reset`   | any JSON value                       |
    /// | `replace` | object of key → value                |
    /// | `remove`  | array of keys (strings or indices)   |
    /// | `splice`  | `[index, deleteCount, ...items]`     |
    ///
    /// `refresh` takes snapshot operands and has no JSON form.
    pub fn from_json(kind: &str, options: Value) -> Result<Update, FrozenError> {
        match kind.parse::<UpdateKind>()? {
            UpdateKind::Reset => Ok(Update::Reset(Input::Raw(options))),
            UpdateKind::Replace => match options {
                Value::Object(map) => Ok(Update::Replace(
                    map.into_iter()
                        .map(|(k, v)| (Key::Name(k), Input::Raw(v)))
                        .collect(),
                )),
                other => Err(FrozenError::InvalidOptions(format!(
                    "replace expects an object, got {other}"
                ))),
            },
            UpdateKind::Remove => match options {
                Value::Array(keys) => keys
                    .iter()
                    .map(|k| {
                        Key::from_json(k).ok_or_else(|| {
                            FrozenError::InvalidOptions(format!("invalid key {k}"))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Update::Remove),
                Value::String(key) => Ok(Update::Remove(vec![Key::Name(key)])),
                other => Err(FrozenError::InvalidOptions(format!(
                    "remove expects an array of keys, got {other}"
                ))),
            },
            UpdateKind::Splice => {
                let Value::Array(args) = options else {
                    return Err(FrozenError::InvalidOptions(
                        "splice expects [index, deleteCount, ...items]".to_string(),
                    ));
                };
                let mut args = args.into_iter();
                let index = splice_arg(args.next(), "index")?;
                let delete_count = match args.next() {
                    Some(v) => splice_arg(Some(v), "deleteCount")?,
                    None => usize::MAX,
                };
                Ok(Update::Splice {
                    index,
                    delete_count,
                    items: args.map(Input::Raw).collect(),
                })
            }
            UpdateKind::Refresh => Err(FrozenError::InvalidOptions(
                "refresh needs snapshot operands".to_string(),
            )),
        }
    }
}

fn splice_arg(arg: Option<Value>, name: &str) -> Result<usize, FrozenError> {
    arg.as_ref()
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .ok_or_else(|| FrozenError::InvalidOptions(format!("splice {name} must be a non-negative integer")))
}

/// Apply `op` to `node`.
///
/// Returns the new snapshot; only `Refresh` without `return_updated` returns
/// `None`, since it hands its result to the parents instead.
pub fn update(node: &Frozen, op: Update) -> Result<Option<Frozen>, FrozenError> {
    match op {
        Update::Reset(value) => ops::reset(node, value).map(Some),
        Update::Replace(attrs) => ops::replace(node, attrs).map(Some),
        Update::Remove(keys) => ops::remove(node, keys).map(Some),
        Update::Splice {
            index,
            delete_count,
            items,
        } => ops::splice(node, index, delete_count, items).map(Some),
        Update::Refresh {
            old,
            new,
            return_updated,
        } => ops::refresh(node, &old, &new, return_updated),
    }
}

/// Apply an operation given by name and JSON options.
pub fn update_by_name(
    kind: &str,
    node: &Frozen,
    options: Value,
) -> Result<Option<Frozen>, FrozenError> {
    update(node, Update::from_json(kind, options)?)
}
