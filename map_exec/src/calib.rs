//! # Calibration
//!
//! A calibration document holds per-sensor corrections to the nominal mounting poses of the robot
//! model. Entries are keyed by the sensor's display name.
//!
//! Corrections are added to the nominal offset component-wise, *before* the sensor frame is
//! composed with anything. Composing the nominal and correction offsets separately and summing
//! the results gives a different answer whenever the correction has a rotation.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{collections::BTreeMap, fs::read_to_string, path::Path};

use log::{debug, info, warn};
use serde::Serialize;

use crate::{device_list::DeviceList, model::SensorTable, transform::Pose2};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const LASER_DEVICE: &str = "laser";

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Calibration offsets by sensor display name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Calibration {
    lasers: BTreeMap<String, Pose2>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CalibError {
    #[error("Cannot read the calibration file: {0}")]
    FileLoadError(std::io::Error),

    #[error("The calibration document is not valid JSON: {0}")]
    DeserialiseError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Calibration {
    /// Load a calibration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CalibError> {
        let calib_str = read_to_string(path.as_ref()).map_err(CalibError::FileLoadError)?;

        let calib = Self::from_json_str(&calib_str)?;
        info!("Calibration loaded from {:?}", path.as_ref());

        Ok(calib)
    }

    /// Parse a calibration from the contents of a calibration document.
    ///
    /// A document without a `laser` device type gives an empty calibration.
    pub fn from_json_str(calib_str: &str) -> Result<Self, CalibError> {
        let doc: DeviceList =
            serde_json::from_str(calib_str).map_err(CalibError::DeserialiseError)?;

        Ok(Self::from_device_list(&doc))
    }

    pub fn from_device_list(doc: &DeviceList) -> Self {
        let mut lasers = BTreeMap::new();

        match doc.device_type(LASER_DEVICE) {
            Some(t) => {
                for device in t.devices.iter() {
                    let offset = device.basic_pose();
                    debug!("Calibration for \"{}\": {:?}", device.name, offset);
                    lasers.insert(device.name.clone(), offset);
                }
            }
            None => warn!("Calibration has no laser devices"),
        }

        info!("Calibration built: {} lasers", lasers.len());

        Self { lasers }
    }

    pub fn insert(&mut self, name: &str, offset: Pose2) {
        self.lasers.insert(name.to_string(), offset);
    }

    /// Calibration offset for the named sensor.
    pub fn get(&self, name: &str) -> Option<&Pose2> {
        self.lasers.get(name)
    }

    pub fn len(&self) -> usize {
        self.lasers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lasers.is_empty()
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Return the sensor table with calibration offsets applied.
///
/// Each sensor whose display name has a calibration entry gets `nominal + calibration` summed
/// component-wise. Sensors without a name or without an entry keep their nominal offset.
pub fn apply_calibration(sensors: &SensorTable, calib: &Calibration) -> SensorTable {
    sensors.map_offsets(|frame, name| match name.and_then(|n| calib.get(n)) {
        Some(correction) => frame.offset.offset_by(correction),
        None => {
            debug!("No calibration for sensor {} ({:?})", frame.id, name);
            frame.offset
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{model::SensorFrame, transform::compose_points};
    use nalgebra::Point2;

    const CALIB_DOC: &str = r#"{
        "deviceTypes": [
            { "name": "chassis", "devices": [] },
            { "name": "laser", "devices": [
                { "name": "front", "deviceParams": [ { "key": "basic", "arrayParam": { "params": [
                    { "key": "x", "doubleValue": 0.01 },
                    { "key": "y", "doubleValue": -0.02 },
                    { "key": "yaw", "doubleValue": 180.0 }
                ] } } ] }
            ] }
        ]
    }"#;

    fn sensor_table() -> SensorTable {
        let mut table = SensorTable::new();
        table.insert(
            SensorFrame {
                id: 0,
                offset: Pose2::new(0.1, 0.2, 0.0),
            },
            Some("front".to_string()),
        );
        table.insert(
            SensorFrame {
                id: 1,
                offset: Pose2::new(-0.1, 0.0, 0.5),
            },
            Some("rear".to_string()),
        );
        table
    }

    #[test]
    fn test_parse_calibration() {
        let calib = Calibration::from_json_str(CALIB_DOC).unwrap();

        assert_eq!(calib.len(), 1);
        let front = calib.get("front").unwrap();
        assert_eq!(front.x_m, 0.01);
        assert_eq!(front.y_m, -0.02);
        assert!((front.theta_rad - std::f64::consts::PI).abs() < 1e-12);
        assert_eq!(calib.get("rear"), None);

        assert!(Calibration::from_json_str("{}").unwrap().is_empty());
        assert!(matches!(
            Calibration::from_json_str("not json"),
            Err(CalibError::DeserialiseError(_))
        ));
    }

    #[test]
    fn test_apply_calibration() {
        let mut calib = Calibration::default();
        calib.insert("front", Pose2::new(0.01, -0.02, 0.05));

        let calibrated = apply_calibration(&sensor_table(), &calib);

        assert_eq!(
            calibrated.get(0).unwrap().offset,
            Pose2::new(0.1 + 0.01, 0.2 - 0.02, 0.0 + 0.05)
        );
        assert_eq!(calibrated.get(1).unwrap().offset, Pose2::new(-0.1, 0.0, 0.5));
        assert_eq!(calibrated.name(0), Some("front"));
    }

    #[test]
    fn test_sum_then_compose() {
        let mut calib = Calibration::default();
        calib.insert("front", Pose2::new(0.01, -0.02, 0.05));
        let robot_pose = Pose2::new(10.0, 0.0, 0.0);

        let calibrated = apply_calibration(&sensor_table(), &calib);
        let sensor_origin_world =
            compose_points(&[calibrated.get(0).unwrap().offset.position()], &robot_pose);

        assert_eq!(
            sensor_origin_world,
            compose_points(&[Point2::new(0.1 + 0.01, 0.2 - 0.02)], &robot_pose)
        );
    }
}
