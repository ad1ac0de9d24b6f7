//! Basic building blocks.

use std::{
    f64::consts::PI,
    ops::{Add, Neg, Sub},
};

use nalgebra::{Rotation2, Vector2};

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Position {
    x: f64,
    y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn distance(&self, position: Self) -> f64 {
        (position - *self).norm()
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }

    /// Rotates this point about `pivot`.
    pub fn rotated_about(&self, pivot: Position, angle: Angle) -> Position {
        pivot + Rotation2::new(angle.0) * (*self - pivot)
    }

    /// Direction from this point to `position`, measured counter-clockwise from the positive
    /// x-axis.
    pub fn heading_to(&self, position: Position) -> Angle {
        Angle::new((position.y - self.y).atan2(position.x - self.x))
    }

    /// Point at `length` along `heading`.
    pub fn project(&self, heading: Angle, length: f64) -> Position {
        *self + heading.unit_vector() * length
    }
}

impl From<Position> for (f32, f32) {
    fn from(value: Position) -> Self {
        (value.x as f32, value.y as f32)
    }
}

impl From<Position> for (f64, f64) {
    fn from(value: Position) -> Self {
        (value.x, value.y)
    }
}

impl From<Position> for Vector2<f64> {
    fn from(value: Position) -> Self {
        Vector2::new(value.x, value.y)
    }
}

impl Add<Vector2<f64>> for Position {
    type Output = Position;

    fn add(self, rhs: Vector2<f64>) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Position {
    type Output = Vector2<f64>;

    fn sub(self, rhs: Self) -> Self::Output {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Angle stored in radians. Constructors and accessors for degrees are provided since sensor
/// layouts are configured in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Angle(f64);

impl Angle {
    pub const fn new(radians: f64) -> Self {
        Self(radians)
    }

    pub fn from_deg(degree: f64) -> Self {
        Self(degree * PI / 180.0)
    }

    pub fn radians(self) -> f64 {
        self.0
    }

    pub fn deg(self) -> f64 {
        self.0 * (180.0 / PI)
    }

    /// Degrees normalized into `[0, 360)`.
    pub fn to_deg(self) -> f64 {
        normalize_deg(self.deg())
    }

    pub fn unit_vector(self) -> Vector2<f64> {
        Vector2::new(self.0.cos(), self.0.sin())
    }

    /// Unsigned angle between two vectors.
    pub fn between(a: &Vector2<f64>, b: &Vector2<f64>) -> Angle {
        if a.norm() == 0.0 || b.norm() == 0.0 {
            return Angle::default();
        }
        Angle(a.angle(b))
    }
}

/// Maps any angle in degrees into `[0, 360)`.
pub fn normalize_deg(degree: f64) -> f64 {
    let normalized = degree.rem_euclid(360.0);
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

impl Neg for Angle {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Angle(-self.0)
    }
}

impl Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Angle {
    type Output = Angle;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl From<Angle> for f64 {
    fn from(value: Angle) -> Self {
        value.0
    }
}

impl From<Angle> for f32 {
    fn from(value: Angle) -> Self {
        value.0 as f32
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Velocity(f64);

impl Velocity {
    pub const fn new(velocity: f64) -> Self {
        Self(velocity)
    }
}

impl From<Velocity> for f64 {
    fn from(value: Velocity) -> Self {
        value.0
    }
}
