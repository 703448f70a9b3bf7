//! # Debounced alert dispatch

use crate::prelude::v1::*;
use log::*;
use std::time::{Duration, Instant};

/// Alert delivery capability.
///
/// Implementations deliver exactly one alert message per call and manage their own
/// connections. The dispatcher only cares whether the call succeeded.
pub trait Publisher {
    /// Deliver a single alert message.
    fn publish(&mut self) -> Result<()>;
}

/// Outcome of a motion event reaching the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The alert was handed to the publisher and the cooldown window restarted.
    Dispatched,
    /// The event fell within the cooldown window and was dropped.
    Suppressed {
        /// Time left until the next alert may fire.
        remaining: Duration,
    },
}

/// Debounced alert dispatcher.
///
/// Gates alert delivery so that at most one alert fires per cooldown window. The first
/// motion event always fires.
pub struct AlertDispatcher {
    cooldown: Duration,
    last_trigger: Option<Instant>,
}

impl AlertDispatcher {
    /// Create a dispatcher enforcing `cooldown` between two dispatched alerts.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_trigger: None,
        }
    }

    /// Dispatch an alert for a motion event, unless the cooldown window is still open.
    ///
    /// On dispatch the publisher is invoked and the window restarts from `now`, whether
    /// or not the publish succeeded. Publish errors are logged and otherwise dropped.
    /// A suppressed event leaves the dispatcher untouched.
    ///
    /// # Arguments
    ///
    /// * `now` - monotonic timestamp of the motion event.
    /// * `publisher` - alert delivery capability.
    pub fn maybe_trigger(
        &mut self,
        now: Instant,
        publisher: &mut dyn Publisher,
    ) -> DispatchOutcome {
        if let Some(last) = self.last_trigger {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.cooldown {
                return DispatchOutcome::Suppressed {
                    remaining: self.cooldown - elapsed,
                };
            }
        }

        if let Err(e) = publisher.publish() {
            warn!("alert publish failed: {:#}", e);
        }

        self.last_trigger = Some(now);

        DispatchOutcome::Dispatched
    }
}
