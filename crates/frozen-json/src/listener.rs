//! Per-snapshot listeners and debounced delivery.
//!
//! A listener is shared by every version of the snapshot it was created on:
//! rebuilt snapshots inherit their predecessor's listener. Synchronous
//! "update" triggers land in a single pending slot (last write wins) and one
//! event goes out when the scheduler ticks.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::node::Frozen;
use crate::scheduler::Scheduler;

/// Event delivered to listener subscribers.
#[derive(Debug, Clone)]
pub enum ListenerEvent {
    /// Debounced: the latest snapshot produced for the listened node.
    Update(Frozen),
    /// Synchronous: a root snapshot was replaced.
    Immediate { previous: Frozen, current: Frozen },
}

impl ListenerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ListenerEvent::Update(_) => "update",
            ListenerEvent::Immediate { .. } => "immediate",
        }
    }
}

type Handler = Rc<RefCell<Box<dyn FnMut(&ListenerEvent)>>>;

struct Inner {
    next_id: Cell<u64>,
    handlers: RefCell<BTreeMap<u64, Handler>>,
    pending: RefCell<Option<Frozen>>,
    ticking: Cell<bool>,
}

/// Notification endpoint of a snapshot.
#[derive(Clone)]
pub struct Listener {
    inner: Rc<Inner>,
}

impl Listener {
    pub(crate) fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                next_id: Cell::new(1),
                handlers: RefCell::new(BTreeMap::new()),
                pending: RefCell::new(None),
                ticking: Cell::new(false),
            }),
        }
    }

    /// Subscribe to every event. Returns an id for [`Listener::off`].
    pub fn on<F>(&self, handler: F) -> u64
    where
        F: FnMut(&ListenerEvent) + 'static,
    {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id.saturating_add(1));
        self.inner
            .handlers
            .borrow_mut()
            .insert(id, Rc::new(RefCell::new(Box::new(handler))));
        id
    }

    pub fn on_update<F>(&self, mut handler: F) -> u64
    where
        F: FnMut(&Frozen) + 'static,
    {
        self.on(move |ev| {
            if let ListenerEvent::Update(node) = ev {
                handler(node);
            }
        })
    }

    pub fn on_immediate<F>(&self, mut handler: F) -> u64
    where
        F: FnMut(&Frozen, &Frozen) + 'static,
    {
        self.on(move |ev| {
            if let ListenerEvent::Immediate { previous, current } = ev {
                handler(previous, current);
            }
        })
    }

    pub fn off(&self, id: u64) -> bool {
        self.inner.handlers.borrow_mut().remove(&id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.handlers.borrow().len()
    }

    /// Whether a deferred delivery is waiting for the next tick.
    pub fn is_ticking(&self) -> bool {
        self.inner.ticking.get()
    }

    pub fn ptr_eq(&self, other: &Listener) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Deliver `event` to current subscribers right now.
    ///
    /// Subscribers registered or removed while delivering take effect for
    /// the next event.
    pub fn trigger(&self, event: &ListenerEvent) {
        let handlers: Vec<(u64, Handler)> = self
            .inner
            .handlers
            .borrow()
            .iter()
            .map(|(id, h)| (*id, Rc::clone(h)))
            .collect();
        for (id, handler) in handlers {
            if !self.inner.handlers.borrow().contains_key(&id) {
                continue;
            }
            match handler.try_borrow_mut() {
                Ok(mut f) => (&mut **f)(event),
                Err(_) => tracing::warn!(
                    subscriber = id,
                    event = event.name(),
                    "skipping re-entrant delivery"
                ),
            }
        }
    }

    /// Store `payload` in the pending slot and make sure one delivery is
    /// queued on `scheduler`.
    pub(crate) fn defer_update(&self, scheduler: &Scheduler, payload: Frozen) {
        *self.inner.pending.borrow_mut() = Some(payload);
        if self.inner.ticking.replace(true) {
            return;
        }
        let inner = Rc::clone(&self.inner);
        scheduler.schedule_once(move || {
            inner.ticking.set(false);
            let payload = inner.pending.borrow_mut().take();
            if let Some(node) = payload {
                Listener { inner }.trigger(&ListenerEvent::Update(node));
            }
        });
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("subscribers", &self.subscriber_count())
            .field("ticking", &self.is_ticking())
            .finish()
    }
}

/// Return the listener of `node`, attaching a fresh one on first use.
pub fn create_listener(node: &Frozen) -> Listener {
    let mut meta = node.meta_mut();
    meta.listener.get_or_insert_with(Listener::new).clone()
}

/// Queue an "update" for `node` on its own listener, if it has one.
///
/// Live configs deliver synchronously; otherwise the payload is coalesced
/// until the next tick of the node's scheduler.
pub(crate) fn schedule_update(node: &Frozen) {
    let (listener, notify) = {
        let meta = node.meta();
        (meta.listener.clone(), meta.notify.clone())
    };
    let Some(listener) = listener else {
        return;
    };
    if notify.is_live() {
        listener.trigger(&ListenerEvent::Update(node.clone()));
    } else {
        listener.defer_update(notify.scheduler(), node.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotifyConfig;
    use crate::freeze::freeze;
    use serde_json::json;

    #[test]
    fn create_listener_is_lazy_and_stable() {
        let node = freeze(json!({}), &NotifyConfig::default()).unwrap();
        assert!(node.listener().is_none());
        let a = create_listener(&node);
        let b = create_listener(&node);
        assert!(a.ptr_eq(&b));
        assert!(node.listener().unwrap().ptr_eq(&a));
    }

    #[test]
    fn deferred_updates_coalesce() {
        let cfg = NotifyConfig::default();
        let first = freeze(json!([1]), &cfg).unwrap();
        let second = freeze(json!([2]), &cfg).unwrap();
        let listener = create_listener(&first);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        listener.on_update(move |n| sink.borrow_mut().push(n.to_json()));

        listener.defer_update(cfg.scheduler(), first);
        listener.defer_update(cfg.scheduler(), second);
        assert!(listener.is_ticking());
        assert_eq!(cfg.scheduler().pending(), 1);
        assert!(seen.borrow().is_empty());

        cfg.scheduler().tick();
        assert!(!listener.is_ticking());
        assert_eq!(*seen.borrow(), vec![json!([2])]);
    }

    #[test]
    fn off_stops_delivery() {
        let node = freeze(json!({}), &NotifyConfig::default()).unwrap();
        let listener = create_listener(&node);
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let id = listener.on(move |_| h.set(h.get() + 1));
        listener.trigger(&ListenerEvent::Update(node.clone()));
        assert!(listener.off(id));
        assert!(!listener.off(id));
        listener.trigger(&ListenerEvent::Update(node));
        assert_eq!(hits.get(), 1);
        assert_eq!(listener.subscriber_count(), 0);
    }

    #[test]
    fn subscriber_removed_mid_delivery_is_skipped() {
        let node = freeze(json!({}), &NotifyConfig::default()).unwrap();
        let listener = create_listener(&node);
        let hits = Rc::new(Cell::new(0));
        let remover = listener.clone();
        listener.on(move |_| {
            remover.off(2);
        });
        let h = Rc::clone(&hits);
        listener.on(move |_| h.set(h.get() + 1));
        listener.trigger(&ListenerEvent::Update(node));
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn event_names() {
        let node = freeze(json!({}), &NotifyConfig::default()).unwrap();
        assert_eq!(ListenerEvent::Update(node.clone()).name(), "update");
        let ev = ListenerEvent::Immediate {
            previous: node.clone(),
            current: node,
        };
        assert_eq!(ev.name(), "immediate");
    }
}
