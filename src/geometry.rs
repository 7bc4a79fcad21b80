//! 2D primitives and the distance functions used for hit-testing edges.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Step between the samples taken along a curve when hit-testing it.
pub const CURVE_SAMPLE_STEP: f64 = 0.05;

/// A point (or vector) in model or device space.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance_sq(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(self, other: Point) -> f64 {
        self.distance_sq(other).sqrt()
    }

    /// Unit vector in the same direction, `None` for the zero vector.
    pub fn normalized(self) -> Option<Point> {
        let len = self.length();
        (len > f64::EPSILON).then(|| Point::new(self.x / len, self.y / len))
    }

    /// The vector rotated by 90 degrees (clockwise on a y-down screen).
    pub fn perpendicular(self) -> Point {
        Point::new(-self.y, self.x)
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Unit vector at `angle` radians.
    pub fn from_angle(angle: f64) -> Point {
        Point::new(angle.cos(), angle.sin())
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// An axis-aligned rectangle given by its two corners, `(x, y)` top-left and `(xx, yy)`
/// bottom-right.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub xx: f64,
    pub yy: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, xx: f64, yy: f64) -> Self {
        Self { x, y, xx, yy }
    }

    pub fn width(&self) -> f64 {
        self.xx - self.x
    }

    pub fn height(&self) -> f64 {
        self.yy - self.y
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.xx && p.y >= self.y && p.y <= self.yy
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.xx.max(other.xx),
            self.yy.max(other.yy),
        )
    }

    pub fn expand(&self, margin: f64) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.xx + margin,
            self.yy + margin,
        )
    }
}

/// Projects `p` onto the segment `a..b`.
///
/// Returns the squared perpendicular distance to the supporting line and the unclamped
/// projection parameter `t` (`0` at `a`, `1` at `b`). A degenerate segment yields the
/// distance to `a` and `t = 0`.
pub fn project_on_segment(p: Point, a: Point, b: Point) -> (f64, f64) {
    let v = b - a;
    let w = p - a;
    let vv = v.x * v.x + v.y * v.y;
    if vv <= 0.0 {
        return (p.distance_sq(a), 0.0);
    }

    let t = (w.x * v.x + w.y * v.y) / vv;
    let proj = a + v * t;
    (p.distance_sq(proj), t)
}

/// Point on the quadratic Bezier `p0, p1, p2` at `t`.
pub fn quad_point(t: f64, p0: Point, p1: Point, p2: Point) -> Point {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}

/// Derivative of the quadratic Bezier `p0, p1, p2` at `t`.
pub fn quad_tangent(t: f64, p0: Point, p1: Point, p2: Point) -> Point {
    (p1 - p0) * (2.0 * (1.0 - t)) + (p2 - p1) * (2.0 * t)
}

/// Approximate squared distance from `p` to a quadratic Bezier, sampled every
/// `CURVE_SAMPLE_STEP`.
pub fn quad_distance_sq(p: Point, p0: Point, p1: Point, p2: Point) -> f64 {
    let steps = (1.0 / CURVE_SAMPLE_STEP).round() as usize;

    (0..=steps)
        .map(|i| quad_point(i as f64 / steps as f64, p0, p1, p2))
        .map(|q| p.distance_sq(q))
        .fold(f64::INFINITY, f64::min)
}

/// Samples a quadratic Bezier into `segments + 1` points, for backends without native curves.
pub fn quad_polyline(p0: Point, p1: Point, p2: Point, segments: usize) -> Vec<Point> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| quad_point(i as f64 / segments as f64, p0, p1, p2))
        .collect()
}

/// Samples a circular arc from `start` to `end` (radians, increasing) into points.
pub fn arc_polyline(center: Point, radius: f64, start: f64, end: f64, segments: usize) -> Vec<Point> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| start + (end - start) * i as f64 / segments as f64)
        .map(|angle| center + Point::from_angle(angle) * radius)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_point_arithmetic() {
        let a = Point::new(3.0, 4.0);
        let b = Point::new(1.0, 1.0);

        assert_eq!(a + b, Point::new(4.0, 5.0));
        assert_eq!(a - b, Point::new(2.0, 3.0));
        assert_eq!(a * 2.0, Point::new(6.0, 8.0));
        assert!((a.length() - 5.0).abs() < EPS);
        assert!((a.distance(b) - 13.0_f64.sqrt()).abs() < EPS);
        assert_eq!(Point::new(0.0, 0.0).normalized(), None);
    }

    #[test]
    fn test_projection_inside_segment() {
        let (d2, t) = project_on_segment(
            Point::new(5.0, 3.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
        );

        assert!((d2 - 9.0).abs() < EPS);
        assert!((t - 0.5).abs() < EPS);
    }

    #[test]
    fn test_projection_outside_segment_is_unclamped() {
        let (_, t) = project_on_segment(
            Point::new(-5.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
        );
        assert!(t < 0.0);
    }

    #[test]
    fn test_quad_endpoints_and_apex() {
        let p0 = Point::new(0.0, 0.0);
        let p1 = Point::new(5.0, 10.0);
        let p2 = Point::new(10.0, 0.0);

        assert_eq!(quad_point(0.0, p0, p1, p2), p0);
        assert_eq!(quad_point(1.0, p0, p1, p2), p2);
        assert_eq!(quad_point(0.5, p0, p1, p2), Point::new(5.0, 5.0));
        assert!(quad_distance_sq(Point::new(5.0, 5.0), p0, p1, p2) < EPS);
    }

    #[test]
    fn test_quad_tangent_direction() {
        let p0 = Point::new(0.0, 0.0);
        let p1 = Point::new(5.0, 10.0);
        let p2 = Point::new(10.0, 0.0);

        let tangent = quad_tangent(1.0, p0, p1, p2);
        assert!(tangent.x > 0.0 && tangent.y < 0.0);
    }

    #[test]
    fn test_rect_union_and_contains() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(-5.0, 2.0, 8.0, 20.0);
        let u = a.union(&b);

        assert_eq!(u, Rect::new(-5.0, 0.0, 10.0, 20.0));
        assert!(u.contains(Point::new(-5.0, 20.0)));
        assert!(!a.contains(Point::new(11.0, 5.0)));
        assert_eq!(a.width(), 10.0);
    }

    #[test]
    fn test_polylines() {
        let points = quad_polyline(
            Point::new(0.0, 0.0),
            Point::new(5.0, 10.0),
            Point::new(10.0, 0.0),
            8,
        );
        assert_eq!(points.len(), 9);

        let arc = arc_polyline(Point::new(0.0, 0.0), 2.0, 0.0, std::f64::consts::PI, 4);
        assert_eq!(arc.len(), 5);
        assert!((arc[2].y - 2.0).abs() < EPS);
    }
}
