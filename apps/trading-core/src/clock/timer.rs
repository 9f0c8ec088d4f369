//! Scheduled timers and the events they emit.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::shared::UnixNanos;

/// Callback invoked when a timer fires.
///
/// Shared and interiorly mutable so a firing clock can invoke the callback
/// after releasing its own internal borrows (callbacks may re-enter the
/// clock to schedule or cancel timers).
pub type TimerCallback = Rc<RefCell<dyn FnMut(TimeEvent)>>;

/// Event emitted when a timer reaches its scheduled time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEvent {
    /// Name of the timer that fired.
    pub name: String,
    /// Unique event identifier.
    pub event_id: Uuid,
    /// The scheduled fire time.
    pub ts_event: UnixNanos,
    /// When the event object was created.
    pub ts_init: UnixNanos,
}

/// A named recurring timer.
///
/// Fires at `start_time_ns + interval_ns`, then every `interval_ns` until
/// the optional stop time is passed.
pub struct Timer {
    pub(crate) name: String,
    pub(crate) interval_ns: u64,
    pub(crate) stop_time_ns: Option<UnixNanos>,
    pub(crate) next_time_ns: UnixNanos,
    pub(crate) seq: u64,
    pub(crate) callback: TimerCallback,
}

impl Timer {
    /// Get the timer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the firing interval in nanoseconds.
    #[must_use]
    pub const fn interval_ns(&self) -> u64 {
        self.interval_ns
    }

    /// Get the next scheduled fire time.
    #[must_use]
    pub const fn next_time_ns(&self) -> UnixNanos {
        self.next_time_ns
    }

    /// Produce the event for the current scheduled time and advance to the
    /// next interval.
    pub(crate) fn advance(&mut self, ts_init: UnixNanos) -> TimeEvent {
        let event = TimeEvent {
            name: self.name.clone(),
            event_id: Uuid::new_v4(),
            ts_event: self.next_time_ns,
            ts_init,
        };
        self.next_time_ns += self.interval_ns;
        event
    }

    /// Returns true once the next fire time is past the stop time.
    pub(crate) fn is_expired(&self) -> bool {
        self.stop_time_ns
            .is_some_and(|stop| self.next_time_ns > stop)
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("name", &self.name)
            .field("interval_ns", &self.interval_ns)
            .field("stop_time_ns", &self.stop_time_ns)
            .field("next_time_ns", &self.next_time_ns)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> TimerCallback {
        Rc::new(RefCell::new(|_event: TimeEvent| {}))
    }

    #[test]
    fn timer_advance_steps_by_interval() {
        let mut timer = Timer {
            name: "t1".to_string(),
            interval_ns: 100,
            stop_time_ns: None,
            next_time_ns: UnixNanos::new(100),
            seq: 0,
            callback: noop(),
        };

        let event = timer.advance(UnixNanos::new(100));
        assert_eq!(event.ts_event, UnixNanos::new(100));
        assert_eq!(event.name, "t1");
        assert_eq!(timer.next_time_ns(), UnixNanos::new(200));
    }

    #[test]
    fn timer_expires_past_stop_time() {
        let mut timer = Timer {
            name: "t1".to_string(),
            interval_ns: 100,
            stop_time_ns: Some(UnixNanos::new(150)),
            next_time_ns: UnixNanos::new(100),
            seq: 0,
            callback: noop(),
        };

        assert!(!timer.is_expired());
        timer.advance(UnixNanos::new(100));
        assert!(timer.is_expired());
    }

    #[test]
    fn time_event_serde_round_trip() {
        let event = TimeEvent {
            name: "bar-timer".to_string(),
            event_id: Uuid::new_v4(),
            ts_event: UnixNanos::new(60_000_000_000),
            ts_init: UnixNanos::new(60_000_000_001),
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: TimeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
