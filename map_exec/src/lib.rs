//! # Map viewer library.
//!
//! This library provides the geometry core of the map viewer: reconstruction of renderable
//! primitives from map description documents, robot model and calibration parsing, and the
//! composition of local frames (robot body, sensor) into the world frame.
//!
//! Every function in this library is pure with respect to its inputs. A new load produces a new
//! snapshot which the host swaps in wholesale.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Transform module - rigid 2D poses and their composition
pub mod transform;

/// Device list module - raw serde types shared by the robot model and calibration documents
pub mod device_list;

/// Map module - converts map description documents into a normalised scene
pub mod map;

/// Robot model module - chassis and sensor frames from robot model documents
pub mod model;

/// Calibration module - per-sensor calibration offsets
pub mod calib;

/// Robot module - world-frame robot snapshots built from telemetry
pub mod robot;

/// Parameters for the map executable
pub mod params;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use transform::{compose_points, PointCloud, Pose2};
