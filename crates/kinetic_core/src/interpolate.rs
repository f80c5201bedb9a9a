//! Interpolatable value shapes
//!
//! Provides the [`Interpolate`] trait and its implementations for every
//! shape the engine animates: integer and float scalars, points, sizes,
//! rectangles and colors. All interpolation is component-wise linear.

use crate::geometry::{Color, Point, Rect, Size};

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone {
    /// Linearly interpolate between self and other by factor t (0.0 to 1.0)
    fn lerp(&self, other: &Self, t: f64) -> Self;

    /// Check if two values are approximately equal
    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool;
}

// ============================================================================
// Scalars
// ============================================================================

impl Interpolate for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self - other).abs() < epsilon
    }
}

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t as f32
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        f64::from((self - other).abs()) < epsilon
    }
}

impl Interpolate for i32 {
    /// Integer steps round to the nearest whole unit
    fn lerp(&self, other: &Self, t: f64) -> Self {
        let start = f64::from(*self);
        let end = f64::from(*other);
        (start + (end - start) * t).round() as i32
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (f64::from(*self) - f64::from(*other)).abs() < epsilon
    }
}

// ============================================================================
// Geometry
// ============================================================================

impl Interpolate for Point {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Point::new(self.x.lerp(&other.x, t), self.y.lerp(&other.y, t))
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.x.approx_eq(&other.x, epsilon) && self.y.approx_eq(&other.y, epsilon)
    }
}

impl Interpolate for Size {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Size::new(
            self.width.lerp(&other.width, t),
            self.height.lerp(&other.height, t),
        )
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.width.approx_eq(&other.width, epsilon) && self.height.approx_eq(&other.height, epsilon)
    }
}

impl Interpolate for Rect {
    /// x, y, width and height move independently
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Rect::from_origin_size(self.origin.lerp(&other.origin, t), self.size.lerp(&other.size, t))
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.origin.approx_eq(&other.origin, epsilon) && self.size.approx_eq(&other.size, epsilon)
    }
}

// ============================================================================
// Color
// ============================================================================

impl Interpolate for Color {
    /// Per-channel interpolation, each channel clamped to the valid range
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Color::rgba(
            self.r.lerp(&other.r, t),
            self.g.lerp(&other.g, t),
            self.b.lerp(&other.b, t),
            self.a.lerp(&other.a, t),
        )
        .clamped()
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.r.approx_eq(&other.r, epsilon)
            && self.g.approx_eq(&other.g, epsilon)
            && self.b.approx_eq(&other.b, epsilon)
            && self.a.approx_eq(&other.a, epsilon)
    }
}
