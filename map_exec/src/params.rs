//! # Map Executable Parameters
//!
//! This module provide parameters for the map executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapExecParams {
    /// Directory (relative to the software root) in which sessions are created
    pub sessions_dir: String,

    /// Minimum log level, e.g. "info" or "debug"
    pub log_level: String,

    /// Radius of the circle drawn for each map marker.
    ///
    /// Units: meters
    pub marker_radius_m: f64,

    /// Length of the heading arrow drawn for each map marker and for the robot pose.
    ///
    /// Units: meters
    pub heading_arrow_length_m: f64,

    /// Half size of the view window centred on the robot when no map is loaded.
    ///
    /// Units: meters
    pub robot_view_margin_m: f64,

    /// Margin added around the trajectory's extent to form the view window when no map is loaded.
    ///
    /// Units: meters
    pub trajectory_view_margin_m: f64,
}

impl Default for MapExecParams {
    fn default() -> Self {
        Self {
            sessions_dir: "sessions".to_string(),
            log_level: "info".to_string(),
            marker_radius_m: 0.25,
            heading_arrow_length_m: 0.25,
            robot_view_margin_m: 10.0,
            trajectory_view_margin_m: 10.0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_shipped_params() {
        let params: MapExecParams =
            util::params::parse(include_str!("../../params/map_exec.toml")).unwrap();

        assert_eq!(params.sessions_dir, "sessions");
        assert!(util::logger::parse_level(&params.log_level).is_some());
        assert!(params.marker_radius_m > 0.0);
        assert!(params.heading_arrow_length_m > 0.0);
        assert!(params.robot_view_margin_m > 0.0);
        assert!(params.trajectory_view_margin_m > 0.0);
    }
}
