//! Animation scheduler
//!
//! A single shared tick source for every animation. Instead of each
//! animation owning an independent timer, animations register repeating
//! timers here and the host drives them all through [`AnimationScheduler::tick`]
//! (from its own event loop) or [`AnimationScheduler::run_until_idle`].
//!
//! Components receive a [`SchedulerHandle`], a weak reference that never keeps
//! the scheduler alive and degrades to no-ops once it is dropped.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::thread;
use std::time::Duration;

use slotmap::{new_key_type, SlotMap};

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;

new_key_type! {
    /// Handle to a registered repeating timer
    pub struct TimerId;
}

/// Callback invoked each time a timer fires
pub type TickCallback = Rc<dyn Fn()>;

struct Timer {
    interval: Duration,
    deadline: Duration,
    callback: TickCallback,
}

/// Internal state of the animation scheduler
struct SchedulerInner {
    timers: SlotMap<TimerId, Timer>,
    clock: Rc<dyn Clock>,
    config: EngineConfig,
}

impl SchedulerInner {
    fn schedule(&mut self, interval_ms: u32, callback: TickCallback) -> TimerId {
        let interval = Duration::from_millis(u64::from(interval_ms.max(1)));
        let deadline = self.clock.now() + interval;
        self.timers.insert(Timer {
            interval,
            deadline,
            callback,
        })
    }
}

/// The scheduler that fires every registered timer
///
/// Single-threaded: timers, callbacks and the animations they drive all live
/// on the thread that owns the scheduler.
///
/// ```ignore
/// let scheduler = AnimationScheduler::new();
/// let anim = Animation::new(&scheduler.handle());
/// // ... configure and start animations ...
/// scheduler.run_until_idle();
/// ```
pub struct AnimationScheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl AnimationScheduler {
    /// Scheduler on the system clock with the standard configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::standard(), SystemClock::new())
    }

    /// Scheduler on a custom clock (e.g. [`ManualClock`](crate::ManualClock))
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self::with_config(EngineConfig::standard(), clock)
    }

    pub fn with_config(config: EngineConfig, clock: impl Clock + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                timers: SlotMap::with_key(),
                clock: Rc::new(clock),
                config,
            })),
        }
    }

    /// Get a handle to this scheduler for passing to components
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Current clock reading
    pub fn now(&self) -> Duration {
        let clock = Rc::clone(&self.inner.borrow().clock);
        clock.now()
    }

    pub fn config(&self) -> EngineConfig {
        self.inner.borrow().config.clone()
    }

    /// Register a repeating timer
    ///
    /// The first call happens one interval from now. Intervals below 1ms are
    /// raised to 1ms.
    pub fn schedule_repeating<F>(&self, interval_ms: u32, callback: F) -> TimerId
    where
        F: Fn() + 'static,
    {
        self.inner.borrow_mut().schedule(interval_ms, Rc::new(callback))
    }

    /// Cancel a timer. Returns false if it was not registered.
    pub fn cancel(&self, id: TimerId) -> bool {
        self.inner.borrow_mut().timers.remove(id).is_some()
    }

    /// Fire every timer whose deadline has passed
    ///
    /// Each due timer fires at most once per call and is re-armed one
    /// interval from now. Callbacks may register or cancel timers; a timer
    /// cancelled by an earlier callback in the same tick does not fire.
    ///
    /// Returns true if any timers remain registered.
    pub fn tick(&self) -> bool {
        let now = self.now();

        let due: Vec<(TimerId, TickCallback)> = {
            let mut inner = self.inner.borrow_mut();
            inner
                .timers
                .iter_mut()
                .filter(|(_, timer)| timer.deadline <= now)
                .map(|(id, timer)| {
                    timer.deadline = now + timer.interval;
                    (id, Rc::clone(&timer.callback))
                })
                .collect()
        };

        for (id, callback) in due {
            if !self.inner.borrow().timers.contains_key(id) {
                continue;
            }
            callback();
        }

        self.has_active_timers()
    }

    /// Earliest pending deadline, if any timers are registered
    pub fn next_deadline(&self) -> Option<Duration> {
        self.inner
            .borrow()
            .timers
            .values()
            .map(|timer| timer.deadline)
            .min()
    }

    pub fn has_active_timers(&self) -> bool {
        !self.inner.borrow().timers.is_empty()
    }

    pub fn timer_count(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    /// Drive timers in real time until none remain
    ///
    /// Sleeps until the next deadline between ticks. Only meaningful with a
    /// clock that advances on its own, such as [`SystemClock`].
    pub fn run_until_idle(&self) {
        let max_sleep =
            Duration::from_millis(u64::from(self.inner.borrow().config.max_idle_sleep_ms));
        tracing::debug!("AnimationScheduler: running {} timers", self.timer_count());

        while self.tick() {
            if let Some(deadline) = self.next_deadline() {
                let now = self.now();
                if deadline > now {
                    thread::sleep((deadline - now).min(max_sleep));
                }
            }
        }

        tracing::debug!("AnimationScheduler: idle");
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-owning access to an [`AnimationScheduler`]
///
/// Animations keep one of these instead of the scheduler itself. Every call
/// upgrades the inner `Weak`; once the scheduler is dropped, registration and
/// clock reads return `None` and cancellation does nothing.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<RefCell<SchedulerInner>>,
}

impl SchedulerHandle {
    /// Register a repeating timer, `None` if the scheduler is gone
    pub fn schedule_repeating<F>(&self, interval_ms: u32, callback: F) -> Option<TimerId>
    where
        F: Fn() + 'static,
    {
        self.inner
            .upgrade()
            .map(|inner| inner.borrow_mut().schedule(interval_ms, Rc::new(callback)))
    }

    /// Cancel a timer
    pub fn cancel(&self, id: TimerId) {
        if let Some(inner) = self.inner.upgrade() {
            inner.borrow_mut().timers.remove(id);
        }
    }

    /// Current clock reading, `None` if the scheduler is gone
    pub fn now(&self) -> Option<Duration> {
        self.inner.upgrade().map(|inner| {
            let clock = Rc::clone(&inner.borrow().clock);
            clock.now()
        })
    }

    /// Scheduler configuration, `None` if the scheduler is gone
    pub fn config(&self) -> Option<EngineConfig> {
        self.inner
            .upgrade()
            .map(|inner| inner.borrow().config.clone())
    }

    /// Check if a timer is still registered
    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| inner.borrow().timers.contains_key(id))
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}
