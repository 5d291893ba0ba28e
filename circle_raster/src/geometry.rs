use serde::{Deserialize, Serialize};

/// A single stroke sample in surface coordinates (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }
}

/// A target circle: center plus radius, in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl Circle {
    pub fn new(x: f32, y: f32, radius: f32) -> Self {
        Circle { x, y, radius }
    }

    pub fn circumference(&self) -> f64 {
        2.0 * std::f64::consts::PI * self.radius as f64
    }

    pub fn contains(&self, point: Point) -> bool {
        let dx = point.x - self.x;
        let dy = point.y - self.y;
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circumference_matches_geometry() {
        let circle = Circle::new(0.0, 0.0, 150.0);
        assert!((circle.circumference() - 942.477).abs() < 0.01);
    }

    #[test]
    fn contains_includes_boundary_and_excludes_exterior() {
        let circle = Circle::new(10.0, 10.0, 5.0);
        assert!(circle.contains(Point::new(10.0, 10.0)));
        assert!(circle.contains(Point::new(15.0, 10.0)));
        assert!(!circle.contains(Point::new(15.1, 10.0)));
    }
}
