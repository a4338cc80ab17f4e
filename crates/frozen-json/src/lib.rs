//! Persistent, observed immutable JSON trees.
//!
//! Plain JSON is frozen into read-only snapshots. Updates never mutate a
//! snapshot; they build a new one that shares every untouched child by
//! identity. Because children can be shared by several containers at once,
//! each snapshot keeps weak links to all of its parents, and a replacement
//! travels up every path that reaches it: one path is rebuilt right away,
//! the others are marked dirty and rebuilt on demand.
//!
//! Change notifications are coalesced per listener and delivered on the next
//! tick of a cooperative [`Scheduler`].
//!
//! # Example
//!
//! ```
//! use frozen_json::{freeze, replace, NotifyConfig};
//! use serde_json::json;
//!
//! let cfg = NotifyConfig::default();
//! let node = freeze(json!({"a": 1, "b": [1, 2]}), &cfg).unwrap();
//! let next = replace(&node, [("a", json!(2))]).unwrap();
//!
//! assert_eq!(next.to_json(), json!({"a": 2, "b": [1, 2]}));
//! assert!(next.node("b").unwrap().ptr_eq(&node.node("b").unwrap()));
//! ```
//!
//! # Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`node`] | [`Frozen`] snapshots, entries, keys |
//! | [`freeze`](mod@freeze) | JSON → snapshot conversion |
//! | [`ops`] | `reset`, `replace`, `remove`, `splice`, `refresh`, `clean` |
//! | [`parents`] | parent back-reference bookkeeping |
//! | [`propagate`] | eager refresh and dirty marking |
//! | [`listener`] | listeners and debounced delivery |
//! | [`scheduler`] | cooperative tick queue |
//! | [`update`] | typed and by-name operation dispatch |
//! | [`store`] | [`Freezer`], a single-tree store |

pub mod cli;
pub mod config;
pub mod error;
pub mod freeze;
pub mod listener;
pub mod node;
pub mod ops;
pub mod parents;
pub mod propagate;
pub mod scheduler;
pub mod store;
pub mod update;

pub use config::{FreezerOptions, NotifyConfig};
pub use error::FrozenError;
pub use freeze::freeze;
pub use listener::{create_listener, Listener, ListenerEvent};
pub use node::{Entry, Frozen, Input, Key, Kind, PendingUpdate};
pub use ops::{clean, refresh, remove, replace, reset, splice};
pub use propagate::{mark_dirty, refresh_parents};
pub use scheduler::Scheduler;
pub use store::Freezer;
pub use update::{update, update_by_name, Update, UpdateKind};
