//! 2D arithmetic primitives.

use serde::{Deserialize, Serialize};

/// A 2D position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Displacement from `other` to `self`.
    pub fn delta(&self, other: &Point) -> Vector2 {
        Vector2::new(self.x - other.x, self.y - other.y)
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        self.delta(other).length()
    }

    /// Move the point by a vector.
    pub fn translate(&mut self, by: Vector2) {
        self.x += by.x;
        self.y += by.y;
    }
}

/// A 2D vector used for velocities and forces.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Add another vector in place.
    pub fn add(&mut self, other: Vector2) {
        self.x += other.x;
        self.y += other.y;
    }

    /// Multiply both components in place.
    pub fn scale(&mut self, multiplier: f64) {
        self.x *= multiplier;
        self.y *= multiplier;
    }

    /// Add `other * multiplier` in place.
    pub fn add_scaled(&mut self, other: Vector2, multiplier: f64) {
        self.x += other.x * multiplier;
        self.y += other.y * multiplier;
    }

    /// Return a scaled copy.
    pub fn scaled(self, multiplier: f64) -> Vector2 {
        Vector2::new(self.x * multiplier, self.y * multiplier)
    }

    /// Sum of absolute components.
    pub fn l1_norm(&self) -> f64 {
        self.x.abs() + self.y.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_scale() {
        let mut v = Vector2::new(1.0, 2.0);
        v.add(Vector2::new(0.5, -1.0));
        assert_eq!(v, Vector2::new(1.5, 1.0));

        v.scale(2.0);
        assert_eq!(v, Vector2::new(3.0, 2.0));
    }

    #[test]
    fn test_add_scaled() {
        let mut v = Vector2::ZERO;
        v.add_scaled(Vector2::new(2.0, -4.0), 0.5);
        assert_eq!(v, Vector2::new(1.0, -2.0));
    }

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.delta(&a), Vector2::new(3.0, 4.0));
    }

    #[test]
    fn test_translate() {
        let mut p = Point::new(1.0, 1.0);
        p.translate(Vector2::new(-1.0, 2.0));
        assert_eq!(p, Point::new(0.0, 3.0));
    }
}
