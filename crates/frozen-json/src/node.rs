//! Snapshot nodes.
//!
//! A [`Frozen`] handle points at a reference-counted snapshot. Its entries are
//! fixed when the snapshot is built and never change afterwards; only the
//! bookkeeping block ([`Meta`]) mutates: the parent back-references, the
//! listener and the pending dirty mark.
//!
//! Ownership runs root→leaf through [`Entry::Node`]. Parent links are
//! [`Weak`] back-references, so a snapshot is dropped as soon as no container
//! entry and no external handle retains it.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::config::NotifyConfig;
use crate::error::FrozenError;
use crate::listener::Listener;

/// Container kind of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Mapping,
    Sequence,
}

/// Address of an entry inside a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Name(String),
    Index(usize),
}

impl Key {
    /// Interpret a JSON path token: strings are names, non-negative integers
    /// are indices.
    pub fn from_json(token: &Value) -> Option<Key> {
        match token {
            Value::String(s) => Some(Key::Name(s.clone())),
            Value::Number(n) => n.as_u64().map(|i| Key::Index(i as usize)),
            _ => None,
        }
    }

    pub(crate) fn as_name(&self) -> String {
        match self {
            Key::Name(s) => s.clone(),
            Key::Index(i) => i.to_string(),
        }
    }

    pub(crate) fn as_index(&self) -> Result<usize, FrozenError> {
        match self {
            Key::Index(i) => Ok(*i),
            Key::Name(s) => s
                .parse::<usize>()
                .map_err(|_| FrozenError::KeyMismatch { key: self.clone() }),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(s) => write!(f, "{s:?}"),
            Key::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Name(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Name(s)
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Index(i)
    }
}

/// One value stored in a snapshot.
#[derive(Debug, Clone)]
pub enum Entry {
    /// A JSON scalar.
    Leaf(Value),
    /// A nested snapshot, possibly shared with other containers.
    Node(Frozen),
}

impl Entry {
    pub fn as_node(&self) -> Option<&Frozen> {
        match self {
            Entry::Node(n) => Some(n),
            Entry::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Value> {
        match self {
            Entry::Leaf(v) => Some(v),
            Entry::Node(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Entry::Leaf(v) => v.clone(),
            Entry::Node(n) => n.to_json(),
        }
    }
}

/// Leaves compare by value, nodes by identity.
impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Entry::Leaf(a), Entry::Leaf(b)) => a == b,
            (Entry::Node(a), Entry::Node(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// Value accepted by update operations.
#[derive(Debug, Clone)]
pub enum Input {
    /// Plain JSON; containers are frozen on the way in.
    Raw(Value),
    /// An existing snapshot, shared as-is.
    Frozen(Frozen),
}

impl From<Value> for Input {
    fn from(v: Value) -> Self {
        Input::Raw(v)
    }
}

impl From<Frozen> for Input {
    fn from(f: Frozen) -> Self {
        Input::Frozen(f)
    }
}

impl From<&Frozen> for Input {
    fn from(f: &Frozen) -> Self {
        Input::Frozen(f.clone())
    }
}

/// A deferred `(old, new)` child substitution recorded on an ancestor.
#[derive(Debug, Clone)]
pub struct PendingUpdate {
    pub old: Frozen,
    pub new: Frozen,
}

#[derive(Debug, Clone)]
pub(crate) enum Entries {
    Mapping(IndexMap<String, Entry>),
    Sequence(Vec<Entry>),
}

impl Entries {
    pub(crate) fn kind(&self) -> Kind {
        match self {
            Entries::Mapping(_) => Kind::Mapping,
            Entries::Sequence(_) => Kind::Sequence,
        }
    }

    pub(crate) fn values(&self) -> Box<dyn Iterator<Item = &Entry> + '_> {
        match self {
            Entries::Mapping(m) => Box::new(m.values()),
            Entries::Sequence(v) => Box::new(v.iter()),
        }
    }

    pub(crate) fn nodes(&self) -> impl Iterator<Item = &Frozen> + '_ {
        self.values().filter_map(Entry::as_node)
    }

    /// Rebuild with the same keys, passing every entry through `f`.
    pub(crate) fn try_map<F>(&self, mut f: F) -> Result<Entries, FrozenError>
    where
        F: FnMut(&Entry) -> Result<Entry, FrozenError>,
    {
        Ok(match self {
            Entries::Mapping(m) => Entries::Mapping(
                m.iter()
                    .map(|(k, e)| Ok((k.clone(), f(e)?)))
                    .collect::<Result<_, FrozenError>>()?,
            ),
            Entries::Sequence(v) => {
                Entries::Sequence(v.iter().map(&mut f).collect::<Result<_, _>>()?)
            }
        })
    }
}

pub(crate) struct Meta {
    pub(crate) parents: Vec<Weak<Snapshot>>,
    pub(crate) notify: NotifyConfig,
    pub(crate) listener: Option<Listener>,
    pub(crate) dirty: Option<PendingUpdate>,
}

impl Meta {
    pub(crate) fn new(notify: NotifyConfig) -> Self {
        Self {
            parents: Vec::new(),
            notify,
            listener: None,
            dirty: None,
        }
    }

    pub(crate) fn live_parents(&self) -> Vec<Frozen> {
        self.parents
            .iter()
            .filter_map(|w| w.upgrade().map(Frozen))
            .collect()
    }
}

pub(crate) struct Snapshot {
    entries: Entries,
    meta: RefCell<Meta>,
}

/// Handle to an immutable snapshot. Cloning is cheap and preserves identity.
#[derive(Clone)]
pub struct Frozen(Rc<Snapshot>);

impl Frozen {
    /// Allocate a snapshot. Parent links to its children are the caller's job.
    pub(crate) fn alloc(entries: Entries, meta: Meta) -> Frozen {
        Frozen(Rc::new(Snapshot {
            entries,
            meta: RefCell::new(meta),
        }))
    }

    pub(crate) fn entries(&self) -> &Entries {
        &self.0.entries
    }

    pub(crate) fn meta(&self) -> Ref<'_, Meta> {
        self.0.meta.borrow()
    }

    pub(crate) fn meta_mut(&self) -> RefMut<'_, Meta> {
        self.0.meta.borrow_mut()
    }

    pub(crate) fn downgrade(&self) -> Weak<Snapshot> {
        Rc::downgrade(&self.0)
    }

    pub(crate) fn is(&self, link: &Weak<Snapshot>) -> bool {
        std::ptr::eq(Rc::as_ptr(&self.0), link.as_ptr())
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Frozen) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn kind(&self) -> Kind {
        self.0.entries.kind()
    }

    pub fn len(&self) -> usize {
        match &self.0.entries {
            Entries::Mapping(m) => m.len(),
            Entries::Sequence(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: impl Into<Key>) -> Option<&Entry> {
        let key = key.into();
        match &self.0.entries {
            Entries::Mapping(m) => m.get(key.as_name().as_str()),
            Entries::Sequence(v) => key.as_index().ok().and_then(|i| v.get(i)),
        }
    }

    /// The child snapshot stored at `key`, if that entry is a container.
    pub fn node(&self, key: impl Into<Key>) -> Option<Frozen> {
        self.get(key).and_then(Entry::as_node).cloned()
    }

    /// Walk `path` from this snapshot. An empty path yields the snapshot itself.
    pub fn find(&self, path: &[Key]) -> Option<Entry> {
        let mut current = Entry::Node(self.clone());
        for key in path {
            let next = current.as_node()?.get(key.clone())?.clone();
            current = next;
        }
        Some(current)
    }

    /// Entries in order, keyed by name for mappings and by index for sequences.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (Key, &Entry)> + '_> {
        match &self.0.entries {
            Entries::Mapping(m) => Box::new(m.iter().map(|(k, e)| (Key::Name(k.clone()), e))),
            Entries::Sequence(v) => Box::new(v.iter().enumerate().map(|(i, e)| (Key::Index(i), e))),
        }
    }

    /// Thaw into plain JSON.
    pub fn to_json(&self) -> Value {
        match &self.0.entries {
            Entries::Mapping(m) => {
                let mut out = Map::with_capacity(m.len());
                for (k, e) in m {
                    out.insert(k.clone(), e.to_json());
                }
                Value::Object(out)
            }
            Entries::Sequence(v) => Value::Array(v.iter().map(Entry::to_json).collect()),
        }
    }

    /// Snapshots currently listing this one as a child and still alive.
    pub fn parents(&self) -> Vec<Frozen> {
        self.meta().live_parents()
    }

    pub fn has_parent(&self, parent: &Frozen) -> bool {
        self.meta().parents.iter().any(|w| parent.is(w))
    }

    pub fn is_dirty(&self) -> bool {
        self.meta().dirty.is_some()
    }

    pub fn pending(&self) -> Option<PendingUpdate> {
        self.meta().dirty.clone()
    }

    pub fn listener(&self) -> Option<Listener> {
        self.meta().listener.clone()
    }

    pub fn notify_config(&self) -> NotifyConfig {
        self.meta().notify.clone()
    }
}

/// Identity, not structural, equality.
impl PartialEq for Frozen {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Frozen {}

impl fmt::Debug for Frozen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frozen({:?} {})", self.kind(), self.to_json())
    }
}
