use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

const NORMALIZE_EPSILON: f32 = 1.0e-6;

/// World-space vector. `+y` points down the screen, matching tile rows.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const UNIT_X: Vec2 = Vec2 { x: 1.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance_squared(self, other: Vec2) -> f32 {
        (self - other).length_squared()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Unit vector in the same direction, or `fallback` when the length is
    /// too small to divide by.
    pub fn normalize_or(self, fallback: Vec2) -> Vec2 {
        let length = self.length();
        if length > NORMALIZE_EPSILON && length.is_finite() {
            self * (1.0 / length)
        } else {
            fallback
        }
    }

    pub fn normalize_or_zero(self) -> Vec2 {
        self.normalize_or(Vec2::ZERO)
    }

    pub fn lerp(self, other: Vec2, t: f32) -> Vec2 {
        self + (other - self) * t
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Clamps `value` into `[min, max]`; an inverted range collapses to its midpoint
/// instead of panicking like `f32::clamp`.
pub fn clamp_or_center(value: f32, min: f32, max: f32) -> f32 {
    if min > max {
        return (min + max) * 0.5;
    }
    value.clamp(min, max)
}

/// Keeps a circle fully inside `[0, world_size]` on both axes.
pub fn clamp_circle_to_world(position: Vec2, radius: f32, world_size: Vec2) -> Vec2 {
    Vec2 {
        x: clamp_or_center(position.x, radius, world_size.x - radius),
        y: clamp_or_center(position.y, radius, world_size.y - radius),
    }
}
