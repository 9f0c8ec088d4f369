//! Time and clock abstractions.
//!
//! Two implementations satisfy the [`Clock`] contract: [`RealClock`] derives
//! times from the operating system, [`TestClock`] advances only by explicit
//! [`TestClock::advance_time_to`] calls and fires due timers inline while
//! advancing. All methods take `&self`: the core is single-threaded
//! cooperative and clocks use interior mutability so timer callbacks can
//! re-enter the clock they were fired from.

mod error;
mod timer;

pub use error::ClockError;
pub use timer::{TimeEvent, Timer, TimerCallback};

use std::cell::RefCell;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

use crate::domain::shared::UnixNanos;

/// The clock contract shared by live and simulated time sources.
pub trait Clock {
    /// Current time in nanoseconds since the Unix epoch.
    fn timestamp_ns(&self) -> UnixNanos;

    /// Current time as a UTC datetime.
    fn utc_now(&self) -> DateTime<Utc> {
        self.timestamp_ns().to_datetime()
    }

    /// Returns true for simulated clocks that advance only on request.
    fn is_simulated(&self) -> bool;

    /// Schedule a recurring timer.
    ///
    /// The first fire is at `start_time_ns + interval_ns` (a zero start
    /// means "now"); subsequent fires follow every `interval_ns` until the
    /// optional stop time is passed. Scheduling a timer under an existing
    /// name replaces the prior timer.
    ///
    /// # Errors
    ///
    /// Returns error if the name is empty, the interval is zero, or the
    /// timer would never fire before its stop time.
    fn set_timer(
        &self,
        name: &str,
        interval_ns: u64,
        start_time_ns: UnixNanos,
        stop_time_ns: Option<UnixNanos>,
        callback: TimerCallback,
    ) -> Result<(), ClockError>;

    /// Cancel the named timer.
    ///
    /// # Errors
    ///
    /// Returns error if no timer exists under the name.
    fn cancel_timer(&self, name: &str) -> Result<(), ClockError>;

    /// Cancel all timers.
    fn cancel_timers(&self);

    /// Names of all registered timers, in creation order.
    fn timer_names(&self) -> Vec<String>;

    /// Number of registered timers.
    fn timer_count(&self) -> usize;

    /// The next scheduled fire time of the named timer, if it exists.
    fn next_time_ns(&self, name: &str) -> Option<UnixNanos>;
}

/// Timer storage shared by both clock implementations.
#[derive(Debug, Default)]
struct TimerRegistry {
    timers: Vec<Timer>,
    next_seq: u64,
}

impl TimerRegistry {
    fn insert(
        &mut self,
        name: &str,
        interval_ns: u64,
        start_time_ns: UnixNanos,
        stop_time_ns: Option<UnixNanos>,
        callback: TimerCallback,
    ) -> Result<(), ClockError> {
        if name.is_empty() {
            return Err(ClockError::InvalidTimer {
                name: name.to_string(),
                message: "name cannot be empty".to_string(),
            });
        }
        if interval_ns == 0 {
            return Err(ClockError::InvalidTimer {
                name: name.to_string(),
                message: "interval must be positive".to_string(),
            });
        }
        let next_time_ns = start_time_ns + interval_ns;
        if let Some(stop) = stop_time_ns {
            if next_time_ns > stop {
                return Err(ClockError::InvalidTimer {
                    name: name.to_string(),
                    message: format!(
                        "stop time {stop} precedes first fire at {next_time_ns}"
                    ),
                });
            }
        }
        // Duplicate names replace the prior timer.
        self.timers.retain(|t| t.name != name);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.push(Timer {
            name: name.to_string(),
            interval_ns,
            stop_time_ns,
            next_time_ns,
            seq,
            callback,
        });
        Ok(())
    }

    fn cancel(&mut self, name: &str) -> Result<(), ClockError> {
        let before = self.timers.len();
        self.timers.retain(|t| t.name != name);
        if self.timers.len() == before {
            return Err(ClockError::TimerNotFound(name.to_string()));
        }
        Ok(())
    }

    fn names(&self) -> Vec<String> {
        self.timers.iter().map(|t| t.name.clone()).collect()
    }

    fn next_time_ns(&self, name: &str) -> Option<UnixNanos> {
        self.timers
            .iter()
            .find(|t| t.name == name)
            .map(Timer::next_time_ns)
    }

    /// Index of the next timer due at or before `target`, earliest fire time
    /// first, ties broken by creation order.
    fn next_due(&self, target: UnixNanos) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.next_time_ns <= target)
            .min_by_key(|(_, t)| (t.next_time_ns, t.seq))
            .map(|(i, _)| i)
    }
}

/// A clock whose time only moves via explicit advances.
///
/// Advancing fires due timers inline, in timestamp order; each callback is
/// invoked after the clock's internal borrows are released, so callbacks may
/// schedule or cancel timers on the same clock.
#[derive(Debug)]
pub struct TestClock {
    inner: RefCell<TestClockState>,
}

#[derive(Debug)]
struct TestClockState {
    time_ns: UnixNanos,
    registry: TimerRegistry,
}

impl TestClock {
    /// Create a test clock starting at the given time.
    #[must_use]
    pub fn new(start: UnixNanos) -> Self {
        Self {
            inner: RefCell::new(TestClockState {
                time_ns: start,
                registry: TimerRegistry::default(),
            }),
        }
    }

    /// Advance time to `to`, firing every timer whose `next_time_ns` is at
    /// or before the target, in timestamp order (ties by timer creation
    /// order). The clock reads the fire time while each callback runs.
    ///
    /// Returns the fired events in order.
    ///
    /// # Errors
    ///
    /// Returns error if `to` precedes the current time.
    pub fn advance_time_to(&self, to: UnixNanos) -> Result<Vec<TimeEvent>, ClockError> {
        {
            let state = self.inner.borrow();
            if to < state.time_ns {
                return Err(ClockError::TimeBackwards {
                    current: state.time_ns,
                    target: to,
                });
            }
        }

        let mut fired = Vec::new();
        loop {
            // Pick and advance a single due timer per iteration so timers
            // scheduled by callbacks are seen, then release the borrow
            // before invoking the callback.
            let next = {
                let mut state = self.inner.borrow_mut();
                match state.registry.next_due(to) {
                    None => {
                        state.time_ns = to;
                        None
                    }
                    Some(idx) => {
                        let fire_time = state.registry.timers[idx].next_time_ns;
                        state.time_ns = fire_time;
                        let event = state.registry.timers[idx].advance(fire_time);
                        let callback = state.registry.timers[idx].callback.clone();
                        if state.registry.timers[idx].is_expired() {
                            state.registry.timers.remove(idx);
                        }
                        Some((event, callback))
                    }
                }
            };
            match next {
                None => break,
                Some((event, callback)) => {
                    fired.push(event.clone());
                    (callback.borrow_mut())(event);
                }
            }
        }
        Ok(fired)
    }
}

impl Clock for TestClock {
    fn timestamp_ns(&self) -> UnixNanos {
        self.inner.borrow().time_ns
    }

    fn is_simulated(&self) -> bool {
        true
    }

    fn set_timer(
        &self,
        name: &str,
        interval_ns: u64,
        start_time_ns: UnixNanos,
        stop_time_ns: Option<UnixNanos>,
        callback: TimerCallback,
    ) -> Result<(), ClockError> {
        let mut state = self.inner.borrow_mut();
        let start = if start_time_ns.as_u64() == 0 {
            state.time_ns
        } else {
            start_time_ns
        };
        state
            .registry
            .insert(name, interval_ns, start, stop_time_ns, callback)
    }

    fn cancel_timer(&self, name: &str) -> Result<(), ClockError> {
        self.inner.borrow_mut().registry.cancel(name)
    }

    fn cancel_timers(&self) {
        self.inner.borrow_mut().registry.timers.clear();
    }

    fn timer_names(&self) -> Vec<String> {
        self.inner.borrow().registry.names()
    }

    fn timer_count(&self) -> usize {
        self.inner.borrow().registry.timers.len()
    }

    fn next_time_ns(&self, name: &str) -> Option<UnixNanos> {
        self.inner.borrow().registry.next_time_ns(name)
    }
}

/// A clock deriving time from the operating system.
///
/// Timers are registered and queryable; live firing is driven by the host
/// engine's event loop.
#[derive(Debug, Default)]
pub struct RealClock {
    registry: RefCell<TimerRegistry>,
}

impl RealClock {
    /// Create a real clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for RealClock {
    fn timestamp_ns(&self) -> UnixNanos {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        UnixNanos::new(nanos)
    }

    fn is_simulated(&self) -> bool {
        false
    }

    fn set_timer(
        &self,
        name: &str,
        interval_ns: u64,
        start_time_ns: UnixNanos,
        stop_time_ns: Option<UnixNanos>,
        callback: TimerCallback,
    ) -> Result<(), ClockError> {
        let start = if start_time_ns.as_u64() == 0 {
            self.timestamp_ns()
        } else {
            start_time_ns
        };
        self.registry
            .borrow_mut()
            .insert(name, interval_ns, start, stop_time_ns, callback)
    }

    fn cancel_timer(&self, name: &str) -> Result<(), ClockError> {
        self.registry.borrow_mut().cancel(name)
    }

    fn cancel_timers(&self) {
        self.registry.borrow_mut().timers.clear();
    }

    fn timer_names(&self) -> Vec<String> {
        self.registry.borrow().names()
    }

    fn timer_count(&self) -> usize {
        self.registry.borrow().timers.len()
    }

    fn next_time_ns(&self, name: &str) -> Option<UnixNanos> {
        self.registry.borrow().next_time_ns(name)
    }
}
