//! Plain 2D value types shared by both games: vectors, box sizes, axis-aligned
//! bounding boxes and the rectangular play-field.

use std::ops::{Add, AddAssign, Mul, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector for a heading where angle 0 points "up" the screen
    /// (negative y), turning clockwise with positive angles.
    pub fn from_heading(angle: f64) -> Self {
        let a = angle - std::f64::consts::FRAC_PI_2;
        Self::new(a.cos(), a.sin())
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Normalized copy, or `None` for the zero vector.
    pub fn normalized(self) -> Option<Vec2> {
        let len = self.length();
        if len > 0.0 { Some(self * (1.0 / len)) } else { None }
    }

    /// Rescale to `max` if longer than `max`; direction is preserved.
    pub fn clamp_length(self, max: f64) -> Vec2 {
        let len = self.length();
        if len > max { self * (max / len) } else { self }
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

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    pub const fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }

    pub const fn square(side: f64) -> Self {
        Self { w: side, h: side }
    }
}

/// Axis-aligned box anchored at its top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Aabb {
    pub fn from_origin(origin: Vec2, size: Size) -> Self {
        Self {
            left: origin.x,
            top: origin.y,
            right: origin.x + size.w,
            bottom: origin.y + size.h,
        }
    }

    /// Inclusive overlap: boxes that merely touch count as colliding.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(self.right < other.left
            || self.left > other.right
            || self.bottom < other.top
            || self.top > other.bottom)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }
}

/// Rectangular play-field `[0, width] x [0, height]`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Field {
    pub width: f64,
    pub height: f64,
}

impl Field {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True once `p` is strictly beyond any edge by more than `margin`.
    pub fn is_outside(&self, p: Vec2, margin: f64) -> bool {
        p.x < -margin || p.x > self.width + margin || p.y < -margin || p.y > self.height + margin
    }

    /// Screen-wrap: leaving one edge by more than `margin` re-enters at the
    /// opposite edge, `margin` outside of it.
    pub fn wrap(&self, p: Vec2, margin: f64) -> Vec2 {
        let mut out = p;
        if out.x < -margin {
            out.x = self.width + margin;
        }
        if out.x > self.width + margin {
            out.x = -margin;
        }
        if out.y < -margin {
            out.y = self.height + margin;
        }
        if out.y > self.height + margin {
            out.y = -margin;
        }
        out
    }
}
