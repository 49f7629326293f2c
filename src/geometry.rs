// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Positions on the canvas.

use serde::{Deserialize, Serialize};

/// A position on the canvas. The engine doesn't care about units, but all
/// positions and catchment areas in a [Scene](crate::scene::Scene) must agree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, derive_more::Display)]
#[display(fmt = "({}, {})", x, y)]
pub struct Point {
    #[allow(missing_docs)]
    pub x: f64,
    #[allow(missing_docs)]
    pub y: f64,
}
impl Point {
    /// The origin.
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    #[allow(missing_docs)]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between two points.
    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}
impl From<(f64, f64)> for Point {
    fn from(value: (f64, f64)) -> Self {
        Self::new(value.0, value.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn distance_is_euclidean_and_symmetric() {
        let a = Point::new(0.0, 0.0);
        let b = Point::from((3.0, 4.0));
        assert!(approx_eq!(f64, a.distance_to(b), 5.0, ulps = 2));
        assert!(approx_eq!(f64, b.distance_to(a), 5.0, ulps = 2));
        assert_eq!(a.distance_to(a), 0.0);
        assert_eq!(format!("{b}"), "(3, 4)");
    }
}
