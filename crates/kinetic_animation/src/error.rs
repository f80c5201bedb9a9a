//! Engine error types

use kinetic_core::ValueKind;
use thiserror::Error;

/// Reasons an animation refuses to start
///
/// Only configuration problems are errors. Calling an operation in the wrong
/// state (pausing a stopped animation, starting a running one) stays a
/// silent no-op.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnimationError {
    /// The target was never set or has been dropped by its owner
    #[error("Animation target is absent")]
    TargetAbsent,

    /// The target has no property with this name
    #[error("Unknown property '{0}'")]
    UnknownProperty(String),

    /// The property exists but rejects writes
    #[error("Property '{0}' is not writable")]
    ReadOnlyProperty(String),

    /// The target is being written to and cannot be inspected
    #[error("Animation target is busy")]
    TargetBusy,

    /// A start or end value was never configured
    #[error("Missing {0} value")]
    MissingValue(&'static str),

    /// Start and end values have different shapes
    #[error("Start value is {start} but end value is {end}")]
    KindMismatch { start: ValueKind, end: ValueKind },

    /// The values cannot be converted to the property's shape
    #[error("Property '{property}' holds {expected} values, cannot animate {found}")]
    IncompatibleValue {
        property: String,
        expected: ValueKind,
        found: ValueKind,
    },

    /// The scheduler driving this animation has been dropped
    #[error("Animation scheduler is no longer available")]
    SchedulerUnavailable,

    /// The animation auto-deleted itself after stopping
    #[error("Animation has expired")]
    Expired,
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a configuration file
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Parsed values are inconsistent
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
