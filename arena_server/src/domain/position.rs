// Spatial primitive shared by every positioned entity.

/// World-space position and heading.
///
/// Heading 0 points up (-Y); positive angles turn the nose clockwise in the
/// +Y-down screen convention.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    /// Heading in radians.
    pub angle: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, angle: f64) -> Self {
        Self { x, y, angle }
    }

    /// Moves `distance` units along the current heading. Negative distances move backwards.
    pub fn forward(&mut self, distance: f64) {
        self.y -= distance * self.angle.cos();
        self.x += distance * self.angle.sin();
    }

    pub fn rotate(&mut self, delta: f64) {
        self.angle += delta;
    }

    /// Returns a copy moved `distance` units along the heading.
    pub fn advanced(mut self, distance: f64) -> Self {
        self.forward(distance);
        self
    }

    pub fn distance_squared(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Circular hit test: true iff the squared distance is within `radius` squared.
    pub fn intersects_with(&self, other: &Position, radius: f64) -> bool {
        self.distance_squared(other) <= radius * radius
    }

    /// Drift check used by reconciliation; heading error counts like a positional axis.
    pub fn is_within_tolerance(&self, other: &Position, tolerance: f64) -> bool {
        let da = self.angle - other.angle;
        self.distance_squared(other) + da * da <= tolerance * tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::PI;

    const EPSILON: f64 = 1e-6;

    fn coord() -> impl Strategy<Value = f64> {
        (-100_000i32..100_000i32).prop_map(|v| v as f64 * 0.05)
    }

    fn heading() -> impl Strategy<Value = f64> {
        (-7_000i32..7_000i32).prop_map(|v| v as f64 * 0.001)
    }

    #[test]
    fn forward_at_zero_heading_moves_up() {
        let mut position = Position::new(10.0, 10.0, 0.0);
        position.forward(5.0);
        assert!((position.x - 10.0).abs() < EPSILON);
        assert!((position.y - 5.0).abs() < EPSILON);
    }

    #[test]
    fn forward_at_quarter_turn_moves_right() {
        let mut position = Position::new(0.0, 0.0, PI / 2.0);
        position.forward(3.0);
        assert!((position.x - 3.0).abs() < EPSILON);
        assert!(position.y.abs() < EPSILON);
    }

    #[test]
    fn intersection_includes_the_boundary() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 4.0, 1.0);
        assert!(a.intersects_with(&b, 5.0));
        assert!(!a.intersects_with(&b, 4.99));
    }

    #[test]
    fn tolerance_counts_heading_difference() {
        let a = Position::new(0.0, 0.0, 0.0);
        assert!(a.is_within_tolerance(&Position::new(2.0, 2.0, 0.0), 3.0));
        assert!(!a.is_within_tolerance(&Position::new(2.0, 2.0, 1.5), 3.0));
        assert!(!a.is_within_tolerance(&Position::new(10.0, 0.0, 0.0), 3.0));
    }

    proptest! {
        #[test]
        fn forward_is_reversible(x in coord(), y in coord(), angle in heading(), d in coord()) {
            let start = Position::new(x, y, angle);
            let mut moved = start;
            moved.forward(d);
            moved.forward(-d);
            prop_assert!((moved.x - start.x).abs() < EPSILON);
            prop_assert!((moved.y - start.y).abs() < EPSILON);
            prop_assert_eq!(moved.angle, start.angle);
        }

        #[test]
        fn intersection_is_symmetric(
            ax in coord(), ay in coord(), bx in coord(), by in coord(), r in 0u32..500
        ) {
            let a = Position::new(ax, ay, 0.0);
            let b = Position::new(bx, by, 0.0);
            let radius = r as f64;
            prop_assert_eq!(a.intersects_with(&b, radius), b.intersects_with(&a, radius));
        }
    }
}
