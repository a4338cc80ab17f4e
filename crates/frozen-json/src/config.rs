//! Notification configuration carried by every snapshot.

use serde::{Deserialize, Serialize};

use crate::scheduler::Scheduler;

/// User-facing options of a frozen tree.
///
/// Deserializes from any serde format; missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FreezerOptions {
    /// Deliver "update" events synchronously instead of on the next tick.
    pub live: bool,
}

/// Options plus the scheduler that drives deferred delivery.
///
/// Cloning shares the scheduler, so every snapshot frozen with clones of one
/// config queues onto the same tick.
#[derive(Debug, Clone, Default)]
pub struct NotifyConfig {
    options: FreezerOptions,
    scheduler: Scheduler,
}

impl NotifyConfig {
    pub fn new(options: FreezerOptions) -> Self {
        Self {
            options,
            scheduler: Scheduler::new(),
        }
    }

    pub fn with_scheduler(options: FreezerOptions, scheduler: Scheduler) -> Self {
        Self { options, scheduler }
    }

    /// A config delivering events synchronously.
    pub fn live() -> Self {
        Self::new(FreezerOptions { live: true })
    }

    pub fn options(&self) -> FreezerOptions {
        self.options
    }

    pub fn is_live(&self) -> bool {
        self.options.live
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}
