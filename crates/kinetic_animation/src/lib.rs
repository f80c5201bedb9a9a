//! Kinetic Animation Engine
//!
//! Timed property animations, staged animation groups and the shared
//! scheduler that drives them.
//!
//! # Features
//!
//! - **Clock-anchored progress**: values are computed from elapsed time, not
//!   counted frames, so late ticks never drift
//! - **Adaptive tick rate**: each animation picks an interval fine enough for
//!   the change it renders and no finer
//! - **Pause, resume and reverse**: reversing mid-flight continues from the
//!   current value instead of jumping
//! - **Exact boundaries**: natural completion writes the configured end (or
//!   start) value verbatim
//! - **Staged groups**: batches of concurrent animations that run one stage
//!   after another, in either direction
//! - **Shared scheduler**: one tick source for every animation, driven by the
//!   host loop or by [`AnimationScheduler::run_until_idle`]
//!
//! # Example
//!
//! ```rust
//! use kinetic_animation::{Animation, AnimationScheduler, ManualClock, PropertyMap, Value};
//!
//! let clock = ManualClock::new();
//! let scheduler = AnimationScheduler::with_clock(clock.clone());
//! let panel = PropertyMap::new().with_property("x", 0).into_shared();
//!
//! let slide = Animation::new(&scheduler.handle());
//! slide.set_target(&panel);
//! slide.set_property_name("x");
//! slide.set_start_value(0);
//! slide.set_end_value(100);
//! slide.set_duration(1000);
//! slide.start(false).unwrap();
//!
//! clock.advance_ms(500);
//! scheduler.tick();
//! assert_eq!(panel.borrow().get("x"), Some(Value::Int(50)));
//! ```

pub mod animation;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod group;
pub mod scheduler;

#[cfg(test)]
mod tests;

pub use animation::{adaptive_interval, Animation, DEFAULT_DURATION_MS};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use error::{AnimationError, ConfigError, Result};
pub use events::{AnimationEvent, AnimationState, Direction, GroupEvent, ListenerId};
pub use group::{AnimationGroup, StageOrder};
pub use scheduler::{AnimationScheduler, SchedulerHandle, TickCallback, TimerId};

pub use kinetic_core::{
    Color, Interpolate, Point, PropertyMap, PropertyTarget, Rect, SharedTarget, Size, Value,
    ValueKind, WeakTarget,
};
