//! Single-tree store.
//!
//! [`Freezer`] owns the current root of one logical tree and funnels every
//! write through it, which is the single-writer discipline the propagation
//! algorithm relies on. It follows root replacement through the root
//! listener's "immediate" events, so the store always hands out the newest
//! root, whichever node an update started from.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::config::{FreezerOptions, NotifyConfig};
use crate::error::FrozenError;
use crate::freeze::freeze;
use crate::listener::{create_listener, Listener};
use crate::node::{Entry, Frozen, Input, Key};
use crate::ops::{clean, reset};
use crate::scheduler::Scheduler;
use crate::update::{update, Update};

pub struct Freezer {
    state: Rc<RefCell<Frozen>>,
    listener: Listener,
    notify: NotifyConfig,
}

impl Freezer {
    pub fn new(raw: Value, options: FreezerOptions) -> Result<Self, FrozenError> {
        Self::with_config(raw, NotifyConfig::new(options))
    }

    /// Build a store whose deferred events run on an existing scheduler.
    pub fn with_scheduler(
        raw: Value,
        options: FreezerOptions,
        scheduler: Scheduler,
    ) -> Result<Self, FrozenError> {
        Self::with_config(raw, NotifyConfig::with_scheduler(options, scheduler))
    }

    fn with_config(raw: Value, notify: NotifyConfig) -> Result<Self, FrozenError> {
        let root = freeze(raw, &notify)?;
        let listener = create_listener(&root);
        let state = Rc::new(RefCell::new(root));
        let tracked = Rc::downgrade(&state);
        listener.on_immediate(move |_, current| {
            if let Some(state) = tracked.upgrade() {
                *state.borrow_mut() = current.clone();
            }
        });
        Ok(Self {
            state,
            listener,
            notify,
        })
    }

    /// The current root as stored, pending dirty mark included.
    pub fn peek(&self) -> Frozen {
        self.state.borrow().clone()
    }

    /// The current root with any pending substitution materialized.
    pub fn get(&self) -> Result<Frozen, FrozenError> {
        let root = self.peek();
        if !root.is_dirty() {
            return Ok(root);
        }
        tracing::debug!("resolving dirty root on read");
        let cleaned = clean(&root)?;
        *self.state.borrow_mut() = cleaned.clone();
        Ok(cleaned)
    }

    /// Replace the whole tree. Raw values are frozen with the store's config.
    pub fn set(&self, value: impl Into<Input>) -> Result<Frozen, FrozenError> {
        let value = match value.into() {
            Input::Raw(raw) => Input::Frozen(freeze(raw, &self.notify)?),
            adopted => adopted,
        };
        let root = self.peek();
        reset(&root, value)?;
        Ok(self.peek())
    }

    /// Apply `op` to the container at `path` below the current root.
    ///
    /// A reset of the root goes through [`Freezer::set`] so the replacement
    /// keeps the store's listener.
    pub fn update_at(&self, path: &[Key], op: Update) -> Result<Option<Frozen>, FrozenError> {
        let op = match op {
            Update::Reset(value) if path.is_empty() => return self.set(value).map(Some),
            op => op,
        };
        let root = self.get()?;
        let target = match root.find(path) {
            Some(Entry::Node(node)) => node,
            _ => return Err(FrozenError::PathNotFound(format_path(path))),
        };
        update(&target, op)
    }

    pub fn to_json(&self) -> Result<Value, FrozenError> {
        Ok(self.get()?.to_json())
    }

    pub fn on_update<F>(&self, handler: F) -> u64
    where
        F: FnMut(&Frozen) + 'static,
    {
        self.listener.on_update(handler)
    }

    pub fn off(&self, id: u64) -> bool {
        self.listener.off(id)
    }

    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    pub fn scheduler(&self) -> &Scheduler {
        self.notify.scheduler()
    }

    /// Run one scheduler tick, delivering coalesced events.
    pub fn tick(&self) -> usize {
        self.scheduler().tick()
    }
}

fn format_path(path: &[Key]) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.iter()
        .map(|k| format!("/{}", k.as_name()))
        .collect()
}
