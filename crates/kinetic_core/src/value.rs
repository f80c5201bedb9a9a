//! Animatable values
//!
//! [`Value`] is the closed set of data shapes the engine can drive. Every
//! variant has one interpolation rule, so checking that two values are
//! compatible is a plain tag comparison on [`ValueKind`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{Color, Point, Rect, Size};
use crate::interpolate::Interpolate;

/// Tag describing the shape of a [`Value`] or of a target property
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Int,
    Float,
    Point,
    Size,
    Rect,
    Color,
    /// A property shape the engine cannot animate
    Unsupported,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Point => "point",
            ValueKind::Size => "size",
            ValueKind::Rect => "rect",
            ValueKind::Color => "color",
            ValueKind::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// A typed value that can be written to a target property
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Int(i32),
    Float(f64),
    Point(Point),
    Size(Size),
    Rect(Rect),
    Color(Color),
}

impl Value {
    /// The shape tag of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Point(_) => ValueKind::Point,
            Value::Size(_) => ValueKind::Size,
            Value::Rect(_) => ValueKind::Rect,
            Value::Color(_) => ValueKind::Color,
        }
    }

    /// Convert to another kind
    ///
    /// Identity for equal kinds. Integers and floats convert into each other
    /// (floats round to the nearest integer); every other pair yields `None`.
    pub fn convert(&self, kind: ValueKind) -> Option<Value> {
        if self.kind() == kind {
            return Some(*self);
        }
        match (self, kind) {
            (Value::Int(v), ValueKind::Float) => Some(Value::Float(f64::from(*v))),
            (Value::Float(v), ValueKind::Int) if v.is_finite() => {
                Some(Value::Int(v.round() as i32))
            }
            _ => None,
        }
    }

    /// Interpolate from `self` toward `end` by `t`
    ///
    /// Returns `None` when the two values have different kinds.
    pub fn lerp(&self, end: &Value, t: f64) -> Option<Value> {
        let value = match (self, end) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a.lerp(b, t)),
            (Value::Float(a), Value::Float(b)) => Value::Float(a.lerp(b, t)),
            (Value::Point(a), Value::Point(b)) => Value::Point(a.lerp(b, t)),
            (Value::Size(a), Value::Size(b)) => Value::Size(a.lerp(b, t)),
            (Value::Rect(a), Value::Rect(b)) => Value::Rect(a.lerp(b, t)),
            (Value::Color(a), Value::Color(b)) => Value::Color(a.lerp(b, t)),
            _ => return None,
        };
        Some(value)
    }

    /// Component-wise `self - previous`, the increment between two updates
    ///
    /// Color deltas are signed and therefore not clamped.
    pub fn delta(&self, previous: &Value) -> Option<Value> {
        let value = match (self, previous) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_sub(*b)),
            (Value::Float(a), Value::Float(b)) => Value::Float(a - b),
            (Value::Point(a), Value::Point(b)) => Value::Point(Point::new(a.x - b.x, a.y - b.y)),
            (Value::Size(a), Value::Size(b)) => {
                Value::Size(Size::new(a.width - b.width, a.height - b.height))
            }
            (Value::Rect(a), Value::Rect(b)) => Value::Rect(Rect::new(
                a.x() - b.x(),
                a.y() - b.y(),
                a.width() - b.width(),
                a.height() - b.height(),
            )),
            (Value::Color(a), Value::Color(b)) => {
                Value::Color(Color::rgba(a.r - b.r, a.g - b.g, a.b - b.b, a.a - b.a))
            }
            _ => return None,
        };
        Some(value)
    }

    /// Check if two values of the same kind are approximately equal
    pub fn approx_eq(&self, other: &Value, epsilon: f64) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.approx_eq(b, epsilon),
            (Value::Float(a), Value::Float(b)) => a.approx_eq(b, epsilon),
            (Value::Point(a), Value::Point(b)) => a.approx_eq(b, epsilon),
            (Value::Size(a), Value::Size(b)) => a.approx_eq(b, epsilon),
            (Value::Rect(a), Value::Rect(b)) => a.approx_eq(b, epsilon),
            (Value::Color(a), Value::Color(b)) => a.approx_eq(b, epsilon),
            _ => false,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            Value::Point(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_size(&self) -> Option<Size> {
        match self {
            Value::Size(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_rect(&self) -> Option<Rect> {
        match self {
            Value::Rect(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Value::Color(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Point> for Value {
    fn from(v: Point) -> Self {
        Value::Point(v)
    }
}

impl From<Size> for Value {
    fn from(v: Size) -> Self {
        Value::Size(v)
    }
}

impl From<Rect> for Value {
    fn from(v: Rect) -> Self {
        Value::Rect(v)
    }
}

impl From<Color> for Value {
    fn from(v: Color) -> Self {
        Value::Color(v)
    }
}
