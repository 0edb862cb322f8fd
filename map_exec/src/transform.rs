//! # Transform
//!
//! Rigid 2D transforms between frames.
//!
//! A [`Pose2`] is used both for the pose of a body (robot, sensor) in some parent frame and for
//! the transform from that body's frame into the parent frame. The two are the same thing: a point
//! expressed in the body frame is moved into the parent frame by rotating it by `theta_rad` and
//! then translating it by `(x_m, y_m)`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// An ordered set of 2D points.
///
/// Order only matters for rendering (outlines are drawn as a polyline through the points).
pub type PointCloud = Vec<Point2<f64>>;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// A pose in (or transform into) a parent frame.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose2 {
    /// Position along the parent X axis.
    ///
    /// Units: meters
    pub x_m: f64,

    /// Position along the parent Y axis.
    ///
    /// Units: meters
    pub y_m: f64,

    /// Rotation of the body X axis from the parent X axis, positive counter-clockwise.
    ///
    /// Units: radians
    pub theta_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Pose2 {
    /// The identity transform.
    pub const IDENTITY: Pose2 = Pose2 {
        x_m: 0.0,
        y_m: 0.0,
        theta_rad: 0.0,
    };

    pub fn new(x_m: f64, y_m: f64, theta_rad: f64) -> Self {
        Self { x_m, y_m, theta_rad }
    }

    /// The translation part of the pose as a point in the parent frame.
    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x_m, self.y_m)
    }

    /// Move a single point from this pose's local frame into the parent frame.
    pub fn transform_point(&self, local: &Point2<f64>) -> Point2<f64> {
        let (sin, cos) = self.theta_rad.sin_cos();

        Point2::new(
            local.x * cos - local.y * sin + self.x_m,
            local.x * sin + local.y * cos + self.y_m,
        )
    }

    /// Return the single transform equivalent to applying `self` and then `outer`.
    ///
    /// If `self` maps frame A into frame B and `outer` maps frame B into frame C, the result maps
    /// frame A directly into frame C.
    pub fn then(&self, outer: &Pose2) -> Pose2 {
        let position = outer.transform_point(&self.position());

        Pose2 {
            x_m: position.x,
            y_m: position.y,
            theta_rad: self.theta_rad + outer.theta_rad,
        }
    }

    /// Add an offset to this pose component-wise.
    ///
    /// This is not a frame composition. It is used to apply a calibration correction to a nominal
    /// mounting pose, and must happen before the result is composed with anything else.
    pub fn offset_by(&self, offset: &Pose2) -> Pose2 {
        Pose2 {
            x_m: self.x_m + offset.x_m,
            y_m: self.y_m + offset.y_m,
            theta_rad: self.theta_rad + offset.theta_rad,
        }
    }
}

impl From<[f64; 3]> for Pose2 {
    fn from(p: [f64; 3]) -> Self {
        Pose2::new(p[0], p[1], p[2])
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Move every point in `local_points` from the local frame into the parent frame described by
/// `transform`.
///
/// `gx = px cos(theta) - py sin(theta) + tx`, `gy = px sin(theta) + py cos(theta) + ty`.
///
/// NaN inputs propagate into the output, no validation is performed.
pub fn compose_points(local_points: &[Point2<f64>], transform: &Pose2) -> PointCloud {
    local_points
        .iter()
        .map(|p| transform.transform_point(p))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::{Isometry2, Vector2};
    use std::f64::consts::{FRAC_PI_2, PI};

    const TOL: f64 = 1e-9;

    fn assert_points_close(a: &[Point2<f64>], b: &[Point2<f64>]) {
        assert_eq!(a.len(), b.len());
        for (pa, pb) in a.iter().zip(b.iter()) {
            assert!(
                (pa - pb).norm() < TOL,
                "points differ: {:?} vs {:?}",
                pa,
                pb
            );
        }
    }

    fn isometry(p: &Pose2) -> Isometry2<f64> {
        Isometry2::new(Vector2::new(p.x_m, p.y_m), p.theta_rad)
    }

    fn test_points() -> PointCloud {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(-2.5, 3.25),
            Point2::new(0.125, -7.0),
        ]
    }

    #[test]
    fn test_identity() {
        let points = test_points();
        assert_eq!(compose_points(&points, &Pose2::IDENTITY), points);
        assert!(compose_points(&[], &Pose2::new(1.0, 2.0, 3.0)).is_empty());
    }

    #[test]
    fn test_rotation_and_translation() {
        let out = compose_points(&[Point2::new(1.0, 0.0)], &Pose2::new(2.0, 3.0, FRAC_PI_2));
        assert_points_close(&out, &[Point2::new(2.0, 4.0)]);

        let out = compose_points(&[Point2::new(1.0, 1.0)], &Pose2::new(0.0, 0.0, PI));
        assert_points_close(&out, &[Point2::new(-1.0, -1.0)]);
    }

    #[test]
    fn test_associative() {
        let points = test_points();
        let poses = [
            Pose2::new(0.3, -0.2, 0.7),
            Pose2::new(10.0, 5.0, -2.1),
            Pose2::new(-4.0, 0.0, PI),
            Pose2::new(0.0, 0.0, 0.0),
        ];

        for t1 in poses.iter() {
            for t2 in poses.iter() {
                let sequential = compose_points(&compose_points(&points, t1), t2);
                let combined = compose_points(&points, &t1.then(t2));
                assert_points_close(&sequential, &combined);
            }
        }
    }

    #[test]
    fn test_then_matches_isometry() {
        let t1 = Pose2::new(0.3, -0.2, 0.7);
        let t2 = Pose2::new(10.0, 5.0, -2.1);

        let expected = isometry(&t2) * isometry(&t1);
        let actual = t1.then(&t2);

        assert!((expected.translation.vector.x - actual.x_m).abs() < TOL);
        assert!((expected.translation.vector.y - actual.y_m).abs() < TOL);
        assert!((expected.rotation.angle() - actual.theta_rad).abs() < TOL);
    }

    #[test]
    fn test_nan_propagates() {
        let out = compose_points(&[Point2::new(std::f64::NAN, 0.0)], &Pose2::new(1.0, 1.0, 0.0));
        assert!(out[0].x.is_nan());
    }

    #[test]
    fn test_offset_by() {
        let p = Pose2::new(0.1, 0.2, 0.0).offset_by(&Pose2::new(0.01, -0.02, 0.05));
        assert_eq!(p, Pose2::new(0.1 + 0.01, 0.2 - 0.02, 0.05));
    }

    #[test]
    fn test_from_array() {
        assert_eq!(Pose2::from([1.0, -2.0, 0.5]), Pose2::new(1.0, -2.0, 0.5));
    }
}
