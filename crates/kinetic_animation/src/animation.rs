//! Timed property animation
//!
//! An [`Animation`] drives one named property of one target from a start
//! value to an end value over a fixed duration. Progress is anchored to the
//! scheduler clock rather than counted per tick, so late or coalesced ticks
//! never accumulate error.
//!
//! Clock progress always runs from 0 to 1. The direction only decides which
//! end of the path that progress maps to: `Forward` walks start → end,
//! `Backward` walks end → start. Reversing mid-flight re-anchors the clock so
//! the rendered value stays where it is.
//!
//! ```ignore
//! let scheduler = AnimationScheduler::new();
//! let panel = PropertyMap::new().with_property("x", 0).into_shared();
//!
//! let slide = Animation::new(&scheduler.handle());
//! slide.set_target(&panel);
//! slide.set_property_name("x");
//! slide.set_start_value(0);
//! slide.set_end_value(100);
//! slide.set_duration(1000);
//! slide.start(false)?;
//!
//! scheduler.run_until_idle();
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use kinetic_core::{PropertyTarget, SharedTarget, Value, WeakTarget};
use smallvec::{smallvec, SmallVec};

use crate::clock::duration_ms;
use crate::config::EngineConfig;
use crate::error::{AnimationError, Result};
use crate::events::{AnimationEvent, AnimationState, Direction, ListenerId, Listeners};
use crate::scheduler::{SchedulerHandle, TimerId};

/// Duration used until `set_duration` is called
pub const DEFAULT_DURATION_MS: u32 = 250;

type Events = SmallVec<[AnimationEvent; 4]>;

/// Pick a tick interval fine enough to render every visible step
///
/// Integer properties aim for one tick per unit of change, float properties
/// for one tick per `float_step`. The result is clamped to the configured
/// bounds. Other shapes, and animations with nothing to step through, use the
/// default interval.
pub fn adaptive_interval(
    start: &Value,
    end: &Value,
    duration_ms: u32,
    config: &EngineConfig,
) -> u32 {
    let steps = match (start, end) {
        (Value::Int(a), Value::Int(b)) => u64::from(a.abs_diff(*b)),
        (Value::Float(a), Value::Float(b)) => {
            let steps = ((b - a).abs() / config.float_step).ceil();
            if steps.is_finite() {
                steps as u64
            } else {
                0
            }
        }
        _ => 0,
    };

    if steps == 0 {
        return config.default_interval_ms;
    }

    let interval = u64::from(duration_ms) / steps;
    let min = u64::from(config.min_interval_ms);
    let max = u64::from(config.max_interval_ms);
    // max() then min() so an inverted range cannot panic
    interval.max(min).min(max) as u32
}

struct AnimationCore {
    scheduler: SchedulerHandle,
    target: Option<WeakTarget>,
    property: String,
    start_value: Option<Value>,
    end_value: Option<Value>,
    duration_ms: u32,
    direction: Direction,
    state: AnimationState,
    /// Clock reading (ms) at which clock progress was 0
    start_time: f64,
    paused_at: f64,
    /// Last clock reading seen, used once the scheduler is gone
    last_now: f64,
    /// Clock progress as of the last update
    progress: f64,
    previous: Option<Value>,
    current: Option<Value>,
    auto_delete: bool,
    expired: bool,
    timer: Option<TimerId>,
    interval_ms: Option<u32>,
}

impl AnimationCore {
    fn now_ms(&mut self) -> f64 {
        if let Some(now) = self.scheduler.now() {
            self.last_now = duration_ms(now);
        }
        self.last_now
    }

    fn duration(&self) -> f64 {
        f64::from(self.duration_ms)
    }

    fn progress_at(&self, at: f64) -> f64 {
        ((at - self.start_time) / self.duration()).clamp(0.0, 1.0)
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            self.scheduler.cancel(timer);
        }
    }

    /// Enter `Stopped`. Expires the animation if it was started with auto-delete.
    fn halt(&mut self) -> AnimationEvent {
        self.cancel_timer();
        self.previous = None;
        self.state = AnimationState::Stopped;
        if self.auto_delete {
            self.expired = true;
        }
        AnimationEvent::StateChanged(AnimationState::Stopped)
    }

    /// Validate the configuration against the target and convert both
    /// values to the property's kind
    fn resolve_values(&self) -> Result<(Value, Value)> {
        let shared = self
            .target
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or(AnimationError::TargetAbsent)?;
        // The target may be mid-write, starting us from its own setter
        let target = shared.try_borrow().map_err(|_| AnimationError::TargetBusy)?;

        if !target.has_property(&self.property) {
            return Err(AnimationError::UnknownProperty(self.property.clone()));
        }
        if !target.is_writable(&self.property) {
            return Err(AnimationError::ReadOnlyProperty(self.property.clone()));
        }

        let start = self.start_value.ok_or(AnimationError::MissingValue("start"))?;
        let end = self.end_value.ok_or(AnimationError::MissingValue("end"))?;
        if start.kind() != end.kind() {
            return Err(AnimationError::KindMismatch {
                start: start.kind(),
                end: end.kind(),
            });
        }

        let expected = target.value_kind(&self.property);
        let incompatible = || AnimationError::IncompatibleValue {
            property: self.property.clone(),
            expected,
            found: start.kind(),
        };
        let start = start.convert(expected).ok_or_else(incompatible)?;
        let end = end.convert(expected).ok_or_else(incompatible)?;
        Ok((start, end))
    }
}

struct AnimationShared {
    core: RefCell<AnimationCore>,
    listeners: Listeners<AnimationEvent>,
}

/// Handle to a single property animation
///
/// Cloning the handle yields another reference to the same animation. While
/// running, the scheduler keeps the animation alive, so a started animation
/// runs to completion even if every handle is dropped.
#[derive(Clone)]
pub struct Animation {
    shared: Rc<AnimationShared>,
}

impl Animation {
    /// Create a stopped animation driven by `scheduler`
    pub fn new(scheduler: &SchedulerHandle) -> Self {
        Self {
            shared: Rc::new(AnimationShared {
                core: RefCell::new(AnimationCore {
                    scheduler: scheduler.clone(),
                    target: None,
                    property: String::new(),
                    start_value: None,
                    end_value: None,
                    duration_ms: DEFAULT_DURATION_MS,
                    direction: Direction::Forward,
                    state: AnimationState::Stopped,
                    start_time: 0.0,
                    paused_at: 0.0,
                    last_now: 0.0,
                    progress: 0.0,
                    previous: None,
                    current: None,
                    auto_delete: false,
                    expired: false,
                    timer: None,
                    interval_ms: None,
                }),
                listeners: Listeners::new(),
            }),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Set the object to animate. Only a weak reference is kept.
    pub fn set_target<T: PropertyTarget + 'static>(&self, target: &Rc<RefCell<T>>) {
        let shared: SharedTarget = target.clone();
        self.set_shared_target(&shared);
    }

    pub fn set_shared_target(&self, target: &SharedTarget) {
        let mut core = self.shared.core.borrow_mut();
        if !core.expired {
            core.target = Some(Rc::downgrade(target));
        }
    }

    pub fn set_property_name(&self, name: impl Into<String>) {
        let mut core = self.shared.core.borrow_mut();
        if !core.expired {
            core.property = name.into();
        }
    }

    pub fn set_start_value(&self, value: impl Into<Value>) {
        let mut core = self.shared.core.borrow_mut();
        if !core.expired {
            core.start_value = Some(value.into());
        }
    }

    pub fn set_end_value(&self, value: impl Into<Value>) {
        let mut core = self.shared.core.borrow_mut();
        if !core.expired {
            core.end_value = Some(value.into());
        }
    }

    /// Set the duration in milliseconds. Zero is ignored.
    ///
    /// A running or paused animation keeps its current progress.
    pub fn set_duration(&self, duration_ms: u32) {
        if duration_ms == 0 {
            tracing::debug!("Animation: ignoring zero duration");
            return;
        }

        let mut guard = self.shared.core.borrow_mut();
        let core = &mut *guard;
        if core.expired {
            return;
        }

        let new_duration = f64::from(duration_ms);
        match core.state {
            AnimationState::Running => {
                let now = core.now_ms();
                let progress = core.progress_at(now);
                core.start_time = now - new_duration * progress;
            }
            AnimationState::Paused => {
                let progress = core.progress_at(core.paused_at);
                core.start_time = core.paused_at - new_duration * progress;
            }
            AnimationState::Stopped => {}
        }
        core.duration_ms = duration_ms;
    }

    /// Set the direction of travel
    ///
    /// A running or paused animation continues from its current value toward
    /// the other end instead of jumping.
    pub fn set_direction(&self, direction: Direction) {
        let mut guard = self.shared.core.borrow_mut();
        let core = &mut *guard;
        if core.expired || core.direction == direction {
            return;
        }

        match core.state {
            AnimationState::Running => {
                let now = core.now_ms();
                let progress = core.progress_at(now);
                core.start_time = now - core.duration() * (1.0 - progress);
                core.progress = 1.0 - progress;
            }
            AnimationState::Paused => {
                let progress = core.progress_at(core.paused_at);
                core.start_time = core.paused_at - core.duration() * (1.0 - progress);
                core.progress = 1.0 - progress;
            }
            AnimationState::Stopped => {}
        }

        tracing::debug!(
            "Animation '{}': direction {:?} -> {:?}",
            core.property,
            core.direction,
            direction
        );
        core.direction = direction;
    }

    // =========================================================================
    // Playback
    // =========================================================================

    /// Start the animation, or continue it from where it was paused
    ///
    /// Configuration problems are returned as errors and leave the animation
    /// stopped. Starting an animation that is already running does nothing.
    /// With `auto_delete`, the animation expires once it stops.
    pub fn start(&self, auto_delete: bool) -> Result<()> {
        let events: Events = {
            let mut guard = self.shared.core.borrow_mut();
            let core = &mut *guard;
            if core.expired {
                return Err(AnimationError::Expired);
            }
            if core.state == AnimationState::Running {
                return Ok(());
            }

            let (start, end) = core.resolve_values().map_err(|err| {
                tracing::warn!("Animation '{}': not started: {}", core.property, err);
                err
            })?;
            let config = core
                .scheduler
                .config()
                .ok_or(AnimationError::SchedulerUnavailable)?;
            let interval = adaptive_interval(&start, &end, core.duration_ms, &config);
            let timer = self
                .arm(core, interval)
                .ok_or(AnimationError::SchedulerUnavailable)?;

            let progress = match core.state {
                AnimationState::Paused => core.progress_at(core.paused_at),
                _ => 0.0,
            };
            let now = core.now_ms();

            core.start_value = Some(start);
            core.end_value = Some(end);
            core.start_time = now - core.duration() * progress;
            core.progress = progress;
            core.auto_delete = auto_delete;
            core.timer = Some(timer);
            core.interval_ms = Some(interval);
            core.state = AnimationState::Running;

            tracing::debug!(
                "Animation '{}': started ({}ms, tick {}ms, {:?}, progress {:.3})",
                core.property,
                core.duration_ms,
                interval,
                core.direction,
                progress
            );

            smallvec![
                AnimationEvent::StateChanged(AnimationState::Running),
                AnimationEvent::Started,
            ]
        };

        self.shared.listeners.emit(&events);
        Ok(())
    }

    /// Pause a running animation
    pub fn pause(&self) {
        {
            let mut guard = self.shared.core.borrow_mut();
            let core = &mut *guard;
            if core.state != AnimationState::Running {
                return;
            }
            core.cancel_timer();
            core.paused_at = core.now_ms();
            core.progress = core.progress_at(core.paused_at);
            core.state = AnimationState::Paused;
            tracing::debug!("Animation '{}': paused at {:.3}", core.property, core.progress);
        }

        self.shared
            .listeners
            .emit(&[AnimationEvent::StateChanged(AnimationState::Paused)]);
    }

    /// Resume a paused animation. Paused time does not count toward the duration.
    pub fn resume(&self) {
        {
            let mut guard = self.shared.core.borrow_mut();
            let core = &mut *guard;
            if core.state != AnimationState::Paused {
                return;
            }

            let interval = core.interval_ms.unwrap_or_else(|| {
                core.scheduler
                    .config()
                    .map_or(16, |config| config.default_interval_ms)
            });
            let Some(timer) = self.arm(core, interval) else {
                tracing::warn!("Animation '{}': scheduler gone, cannot resume", core.property);
                return;
            };

            let now = core.now_ms();
            core.start_time += now - core.paused_at;
            core.timer = Some(timer);
            core.state = AnimationState::Running;
            tracing::debug!("Animation '{}': resumed", core.property);
        }

        self.shared
            .listeners
            .emit(&[AnimationEvent::StateChanged(AnimationState::Running)]);
    }

    /// Stop the animation without finishing it
    ///
    /// No `Finished` event is sent. The target keeps whatever value was last
    /// written.
    pub fn stop(&self) {
        let event = {
            let mut core = self.shared.core.borrow_mut();
            if core.state == AnimationState::Stopped {
                return;
            }
            tracing::debug!("Animation '{}': stopped", core.property);
            core.halt()
        };

        self.shared.listeners.emit(&[event]);
        self.release_if_expired();
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Register a listener for this animation's events
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&AnimationEvent) + 'static,
    {
        if self.is_expired() {
            return ListenerId::default();
        }
        self.shared.listeners.add(Rc::new(listener))
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.shared.listeners.remove(id)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn state(&self) -> AnimationState {
        self.shared.core.borrow().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == AnimationState::Running
    }

    pub fn direction(&self) -> Direction {
        self.shared.core.borrow().direction
    }

    pub fn duration_ms(&self) -> u32 {
        self.shared.core.borrow().duration_ms
    }

    pub fn property_name(&self) -> String {
        self.shared.core.borrow().property.clone()
    }

    pub fn start_value(&self) -> Option<Value> {
        self.shared.core.borrow().start_value
    }

    pub fn end_value(&self) -> Option<Value> {
        self.shared.core.borrow().end_value
    }

    /// Clock progress in `[0, 1]`
    ///
    /// Live while running. This is time progress: under `Backward` the
    /// rendered path position is `1 - progress`.
    pub fn progress(&self) -> f64 {
        let mut guard = self.shared.core.borrow_mut();
        let core = &mut *guard;
        match core.state {
            AnimationState::Running => {
                let now = core.now_ms();
                core.progress_at(now)
            }
            AnimationState::Paused | AnimationState::Stopped => core.progress,
        }
    }

    /// Last value written to the target
    pub fn current_value(&self) -> Option<Value> {
        self.shared.core.borrow().current
    }

    /// True once an auto-deleting animation has stopped
    pub fn is_expired(&self) -> bool {
        self.shared.core.borrow().expired
    }

    /// Tick interval chosen by the last successful `start`
    pub fn tick_interval_ms(&self) -> Option<u32> {
        self.shared.core.borrow().interval_ms
    }

    /// Check whether two handles refer to the same animation
    pub fn ptr_eq(&self, other: &Animation) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn arm(&self, core: &AnimationCore, interval: u32) -> Option<TimerId> {
        let animation = self.clone();
        core.scheduler
            .schedule_repeating(interval, move || animation.on_tick())
    }

    fn on_tick(&self) {
        let (target, property, value, terminal, events) = {
            let mut guard = self.shared.core.borrow_mut();
            let core = &mut *guard;
            if core.state != AnimationState::Running {
                return;
            }

            let Some(target) = core.target.as_ref().and_then(Weak::upgrade) else {
                tracing::warn!("Animation '{}': target dropped while running", core.property);
                let event = core.halt();
                drop(guard);
                self.shared.listeners.emit(&[event]);
                self.release_if_expired();
                return;
            };
            let (Some(start), Some(end)) = (core.start_value, core.end_value) else {
                return;
            };

            let now = core.now_ms();
            let raw = ((now - core.start_time) / core.duration()).max(0.0);
            let terminal = raw >= 1.0 || start == end;

            let value = if terminal {
                core.progress = 1.0;
                match core.direction {
                    Direction::Forward => end,
                    Direction::Backward => start,
                }
            } else {
                core.progress = raw;
                let position = match core.direction {
                    Direction::Forward => raw,
                    Direction::Backward => 1.0 - raw,
                };
                match start.lerp(&end, position) {
                    Some(value) => value,
                    None => {
                        tracing::trace!("Animation '{}': values not interpolatable", core.property);
                        return;
                    }
                }
            };

            let mut events = Events::new();
            events.push(AnimationEvent::ValueChanged(value));
            if let Some(increment) = core.previous.and_then(|previous| value.delta(&previous)) {
                events.push(AnimationEvent::IncrementChanged(increment));
            }
            core.current = Some(value);

            if terminal {
                events.push(core.halt());
                events.push(AnimationEvent::Finished);
                tracing::debug!("Animation '{}': finished at {:?}", core.property, value);
            } else {
                core.previous = Some(value);
                tracing::trace!("Animation '{}': {:.3} -> {:?}", core.property, raw, value);
            }

            (target, core.property.clone(), value, terminal, events)
        };

        match target.try_borrow_mut() {
            Ok(mut target) => target.set_value(&property, value),
            Err(_) => tracing::warn!("Animation '{}': target busy, write skipped", property),
        }

        self.shared.listeners.emit(&events);
        if terminal {
            self.release_if_expired();
        }
    }

    fn release_if_expired(&self) {
        {
            let mut core = self.shared.core.borrow_mut();
            if !core.expired {
                return;
            }
            core.target = None;
            tracing::debug!("Animation '{}': expired", core.property);
        }
        self.shared.listeners.clear();
    }
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.shared.core.borrow();
        f.debug_struct("Animation")
            .field("property", &core.property)
            .field("state", &core.state)
            .field("direction", &core.direction)
            .field("duration_ms", &core.duration_ms)
            .field("expired", &core.expired)
            .finish()
    }
}
