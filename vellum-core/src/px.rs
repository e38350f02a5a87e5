//! Pixel coordinate types used at the rendering boundary.
//!
//! The engine itself addresses text by character offset; pixel values only
//! appear where it talks to a host renderer: caret rectangles, pointer
//! offsets and viewport clamping for the floating cursor.
//!
//! Origin is top-left, x grows right, y grows down. Negative values are
//! allowed for off-screen positions.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// A physical pixel coordinate value.
///
/// Plain `i32` newtype with saturating helpers for the few places that mix
/// pixel arithmetic with float interpolation.
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct Px(pub i32);

impl Px {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(i32::MAX);

    pub fn new(value: i32) -> Self {
        Self(value)
    }

    /// Returns the raw i32 value.
    pub fn raw(self) -> i32 {
        self.0
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32
    }

    /// Converts from f32, clamping values outside the i32 range.
    pub fn saturating_from_f32(value: f32) -> Self {
        if value >= i32::MAX as f32 {
            Self(i32::MAX)
        } else if value <= i32::MIN as f32 {
            Self(i32::MIN)
        } else {
            Self(value as i32)
        }
    }

    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }

    pub fn clamp(self, lo: Self, hi: Self) -> Self {
        Self(self.0.clamp(lo.0, hi.0))
    }
}

impl Add for Px {
    type Output = Px;
    fn add(self, rhs: Self) -> Px {
        Px(self.0 + rhs.0)
    }
}

impl Sub for Px {
    type Output = Px;
    fn sub(self, rhs: Self) -> Px {
        Px(self.0 - rhs.0)
    }
}

impl Mul<i32> for Px {
    type Output = Px;
    fn mul(self, rhs: i32) -> Px {
        Px(self.0 * rhs)
    }
}

impl Div<i32> for Px {
    type Output = Px;
    fn div(self, rhs: i32) -> Px {
        Px(self.0 / rhs)
    }
}

impl Neg for Px {
    type Output = Px;
    fn neg(self) -> Px {
        Px(-self.0)
    }
}

impl AddAssign for Px {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Px {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl From<i32> for Px {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// A 2D position in physical pixel space.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PxPosition {
    pub x: Px,
    pub y: Px,
}

impl PxPosition {
    pub const ZERO: Self = Self {
        x: Px::ZERO,
        y: Px::ZERO,
    };

    pub fn new(x: Px, y: Px) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: Px, dy: Px) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl Add for PxPosition {
    type Output = PxPosition;
    fn add(self, rhs: Self) -> PxPosition {
        PxPosition::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for PxPosition {
    type Output = PxPosition;
    fn sub(self, rhs: Self) -> PxPosition {
        PxPosition::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// An axis-aligned rectangle in physical pixel space.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PxRect {
    pub x: Px,
    pub y: Px,
    pub width: Px,
    pub height: Px,
}

impl PxRect {
    pub fn new(x: Px, y: Px, width: Px, height: Px) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(self) -> PxPosition {
        PxPosition::new(self.x, self.y)
    }

    pub fn center(self) -> PxPosition {
        PxPosition::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn contains(self, position: PxPosition) -> bool {
        position.x >= self.x
            && position.x <= self.x + self.width
            && position.y >= self.y
            && position.y <= self.y + self.height
    }

    /// Clamps a position into this rectangle's bounds.
    pub fn clamp_position(self, position: PxPosition) -> PxPosition {
        PxPosition::new(
            position.x.clamp(self.x, self.x + self.width),
            position.y.clamp(self.y, self.y + self.height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_px_arithmetic() {
        let a = Px(10);
        let b = Px(5);

        assert_eq!(a + b, Px(15));
        assert_eq!(a - b, Px(5));
        assert_eq!(a * 2, Px(20));
        assert_eq!(a / 2, Px(5));
        assert_eq!(-a, Px(-10));
    }

    #[test]
    fn test_px_saturating_arithmetic() {
        let max = Px(i32::MAX);
        let min = Px(i32::MIN);
        assert_eq!(max.saturating_add(Px(1)), max);
        assert_eq!(min.saturating_sub(Px(1)), min);
    }

    #[test]
    fn test_saturating_from_f32() {
        assert_eq!(Px::saturating_from_f32(f32::MAX), Px(i32::MAX));
        assert_eq!(Px::saturating_from_f32(f32::MIN), Px(i32::MIN));
        assert_eq!(Px::saturating_from_f32(100.5), Px(100));
    }

    #[test]
    fn test_position_offset() {
        let pos = PxPosition::new(Px(10), Px(-5));
        assert_eq!(pos.offset(Px(2), Px(3)), PxPosition::new(Px(12), Px(-2)));
        assert_eq!(
            pos + PxPosition::new(Px(1), Px(1)),
            PxPosition::new(Px(11), Px(-4))
        );
    }

    #[test]
    fn test_rect_center_and_clamp() {
        let rect = PxRect::new(Px(0), Px(0), Px(100), Px(40));
        assert_eq!(rect.center(), PxPosition::new(Px(50), Px(20)));
        assert!(rect.contains(PxPosition::new(Px(100), Px(0))));
        assert!(!rect.contains(PxPosition::new(Px(101), Px(0))));

        let clamped = rect.clamp_position(PxPosition::new(Px(150), Px(-10)));
        assert_eq!(clamped, PxPosition::new(Px(100), Px(0)));
    }
}
