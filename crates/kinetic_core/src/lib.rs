//! Kinetic Core
//!
//! Foundational types for the Kinetic animation engine:
//!
//! - **Geometry**: `Point`, `Size`, `Rect` and linear-space `Color`
//! - **Values**: the closed [`Value`] sum type and its [`ValueKind`] tag
//! - **Interpolation**: the [`Interpolate`] trait for every animatable shape
//! - **Targets**: the [`PropertyTarget`] contract the engine drives, plus a
//!   ready-made hash-map backed [`PropertyMap`]
//!
//! # Example
//!
//! ```rust
//! use kinetic_core::{PropertyMap, PropertyTarget, Value};
//!
//! let mut target = PropertyMap::new().with_property("opacity", 0.0);
//! target.set_value("opacity", Value::Float(0.5));
//! assert_eq!(target.get_value("opacity"), Some(Value::Float(0.5)));
//! ```

pub mod geometry;
pub mod interpolate;
pub mod target;
pub mod value;

pub use geometry::{Color, Point, Rect, Size};
pub use interpolate::Interpolate;
pub use target::{PropertyMap, PropertyTarget, SharedTarget, WeakTarget};
pub use value::{Value, ValueKind};
