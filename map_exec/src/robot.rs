//! # Robot
//!
//! Builds world-frame geometry for the robot from a telemetry update: the footprint outline and
//! centre cross at both the true and the localised pose, and the active sensor's scan.
//!
//! Scan points are moved sensor frame -> robot body frame -> world frame, using the (possibly
//! calibrated) sensor offset from the [`SensorTable`] and then the robot pose.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{trace, warn};
use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

use crate::{
    map::ViewBounds,
    model::{Chassis, SensorTable},
    transform::{compose_points, PointCloud, Pose2},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Half size of the centre cross drawn at the robot origin.
///
/// Units: meters
pub const CENTRE_CROSS_HALF_SIZE_M: f64 = 0.05;

/// Position the robot is drawn at before any pose is known and with nothing in view.
///
/// Units: meters
pub const FALLBACK_POSITION_M: [f64; 2] = [0.5, 0.5];

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// A single telemetry update from the robot.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Telemetry {
    /// Pose of the robot in the world frame.
    pub robot_pose: Pose2,

    /// Pose estimated by localisation in the world frame.
    pub loc_pose: Pose2,

    /// Id of the sensor which produced `scan`.
    pub sensor_id: u32,

    /// Scan returns in the sensor frame.
    #[serde(default)]
    pub scan: PointCloud,
}

/// World-frame robot geometry for one telemetry update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobotSnapshot {
    /// Footprint outline at the robot pose.
    pub outline: PointCloud,

    /// Centre cross at the robot pose.
    pub cross: PointCloud,

    /// Footprint outline at the localised pose.
    pub loc_outline: PointCloud,

    /// Centre cross at the localised pose.
    pub loc_cross: PointCloud,

    /// World position of the active sensor's origin, `None` if the sensor is unknown.
    pub sensor_origin: Option<Point2<f64>>,

    /// Scan returns in the world frame, `None` if the sensor is unknown.
    pub scan: Option<PointCloud>,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl RobotSnapshot {
    /// Build the snapshot for a telemetry update.
    ///
    /// Returns `None` if there is no chassis to draw. An unknown sensor id only drops the scan.
    pub fn build(
        chassis: Option<&Chassis>,
        sensors: &SensorTable,
        telemetry: &Telemetry,
    ) -> Option<Self> {
        let chassis = chassis?;

        let outline_local = chassis.outline();
        let cross_local = centre_cross();

        let (sensor_origin, scan) = match sensors.get(telemetry.sensor_id) {
            Some(frame) => {
                let origin = telemetry
                    .robot_pose
                    .transform_point(&frame.offset.position());

                let in_body = compose_points(&telemetry.scan, &frame.offset);
                let in_world = compose_points(&in_body, &telemetry.robot_pose);
                trace!(
                    "Sensor {} scan of {} points moved into world",
                    frame.id,
                    in_world.len()
                );

                (Some(origin), Some(in_world))
            }
            None => {
                warn!(
                    "Telemetry from unknown sensor {}, known sensors: {:?}",
                    telemetry.sensor_id,
                    sensors.frames().map(|f| f.id).collect::<Vec<_>>()
                );
                (None, None)
            }
        };

        Some(Self {
            outline: compose_points(&outline_local, &telemetry.robot_pose),
            cross: compose_points(&cross_local, &telemetry.robot_pose),
            loc_outline: compose_points(&outline_local, &telemetry.loc_pose),
            loc_cross: compose_points(&cross_local, &telemetry.loc_pose),
            sensor_origin,
            scan,
        })
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Pose to draw the robot at before any pose has been received: the centre of the view, facing
/// along +x.
pub fn default_pose(view: Option<&ViewBounds>) -> Pose2 {
    match view {
        Some(bounds) => {
            let centre = bounds.centre();
            Pose2::new(centre.x, centre.y, 0.0)
        }
        None => Pose2::new(FALLBACK_POSITION_M[0], FALLBACK_POSITION_M[1], 0.0),
    }
}

/// Centre cross in the body frame, drawn as one polyline: left, right, centre, up, down.
pub fn centre_cross() -> PointCloud {
    let s = CENTRE_CROSS_HALF_SIZE_M;

    vec![
        Point2::new(-s, 0.0),
        Point2::new(s, 0.0),
        Point2::new(0.0, 0.0),
        Point2::new(0.0, s),
        Point2::new(0.0, -s),
    ]
}

/// Closed arrow polygon of the given length pointing along the pose's heading, in the pose's
/// parent frame.
pub fn pose_arrow(pose: &Pose2, length_m: f64) -> PointCloud {
    let l = length_m;

    let local = [
        Point2::new(l, 0.0),
        Point2::new(-0.5 * l, 0.5 * l),
        Point2::new(-0.25 * l, 0.0),
        Point2::new(-0.5 * l, -0.5 * l),
        Point2::new(l, 0.0),
    ];

    compose_points(&local, pose)
}

/// Split depth camera returns into holes (`z < 0`) and obstacles (`z >= 0`), dropping `z`.
pub fn split_depth_points(points: &[Point3<f64>]) -> (PointCloud, PointCloud) {
    let mut holes = PointCloud::new();
    let mut obstacles = PointCloud::new();

    for p in points.iter() {
        if p.z < 0.0 {
            holes.push(p.xy());
        } else {
            obstacles.push(p.xy());
        }
    }

    (holes, obstacles)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::SensorFrame;
    use std::f64::consts::FRAC_PI_2;

    const TOL: f64 = 1e-9;

    fn chassis() -> Chassis {
        Chassis {
            head_m: 0.5,
            tail_m: 0.5,
            width_m: 0.4,
        }
    }

    fn sensors() -> SensorTable {
        let mut table = SensorTable::new();
        table.insert(
            SensorFrame {
                id: 1,
                offset: Pose2::new(0.2, 0.0, FRAC_PI_2),
            },
            Some("front".to_string()),
        );
        table
    }

    fn close(a: &Point2<f64>, b: &Point2<f64>) -> bool {
        (a - b).norm() < TOL
    }

    #[test]
    fn test_snapshot() {
        let telemetry = Telemetry {
            robot_pose: Pose2::new(10.0, 5.0, FRAC_PI_2),
            loc_pose: Pose2::new(10.1, 5.0, FRAC_PI_2),
            sensor_id: 1,
            scan: vec![Point2::new(1.0, 0.0)],
        };

        let snap = RobotSnapshot::build(Some(&chassis()), &sensors(), &telemetry).unwrap();

        // Sensor at 0.2 ahead of the robot, which faces +y
        assert!(close(&snap.sensor_origin.unwrap(), &Point2::new(10.0, 5.2)));

        // A return 1m ahead of a sensor facing left of the robot: robot frame (0.2, 1.0), world
        // frame rotated by a further quarter turn
        let scan = snap.scan.unwrap();
        assert_eq!(scan.len(), 1);
        assert!(close(&scan[0], &Point2::new(9.0, 5.2)));

        assert_eq!(snap.outline.len(), 5);
        assert!(close(&snap.outline[2], &Point2::new(10.2, 5.5)));
        assert!(close(&snap.cross[2], &Point2::new(10.0, 5.0)));
        assert!(close(&snap.loc_cross[2], &Point2::new(10.1, 5.0)));
        assert!(close(&snap.loc_outline[2], &Point2::new(10.3, 5.5)));
    }

    #[test]
    fn test_snapshot_unknown_sensor() {
        let telemetry = Telemetry {
            sensor_id: 4,
            scan: vec![Point2::new(1.0, 0.0)],
            ..Default::default()
        };

        let snap = RobotSnapshot::build(Some(&chassis()), &sensors(), &telemetry).unwrap();
        assert_eq!(snap.scan, None);
        assert_eq!(snap.sensor_origin, None);
        assert_eq!(snap.outline, chassis().outline());
    }

    #[test]
    fn test_snapshot_no_chassis() {
        assert!(RobotSnapshot::build(None, &sensors(), &Telemetry::default()).is_none());
    }

    #[test]
    fn test_pose_arrow() {
        let arrow = pose_arrow(&Pose2::new(1.0, 1.0, FRAC_PI_2), 0.4);
        assert_eq!(arrow.len(), 5);
        assert!(close(&arrow[0], &Point2::new(1.0, 1.4)));
        assert!(close(&arrow[2], &Point2::new(1.0, 0.9)));
    }

    #[test]
    fn test_default_pose() {
        let map_view = ViewBounds {
            min: Point2::new(100.0, 20.0),
            max: Point2::new(140.0, 60.0),
        };
        assert_eq!(default_pose(Some(&map_view)), Pose2::new(120.0, 40.0, 0.0));
        assert_eq!(default_pose(None), Pose2::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn test_split_depth_points() {
        let (holes, obstacles) = split_depth_points(&[
            Point3::new(1.0, 1.0, -0.1),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(3.0, 3.0, 0.4),
        ]);

        assert_eq!(holes, vec![Point2::new(1.0, 1.0)]);
        assert_eq!(obstacles, vec![Point2::new(2.0, 2.0), Point2::new(3.0, 3.0)]);
    }
}
