//! # Robot Model
//!
//! Extracts the chassis footprint and the laser sensor frames from a robot model document.
//!
//! Two document layouts are supported and resolved once into a [`ModelSchema`]:
//!
//! - **Direct**: a `chassis` record with `head`, `tail` and `width`, and a single laser under
//!   `laser.index[0]` with `x`, `y` and `r` (degrees).
//! - **Device list**: a `deviceTypes` list (see [`crate::device_list`]). The `chassis` device
//!   carries a `shape` combo selecting either a `rectangle` (`head`, `tail`, `width`) or a `circle`
//!   (`radius`). Each `laser` device carries `x`, `y`, `yaw` (degrees), `id` and
//!   `useForLocalization` in its `basic` parameters.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{collections::BTreeMap, fs::read_to_string, path::Path};

use log::{debug, info, warn};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::{
    device_list::{self, lenient, DeviceType},
    transform::{PointCloud, Pose2},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const CHASSIS_DEVICE: &str = "chassis";
const LASER_DEVICE: &str = "laser";
const SHAPE_PARAM: &str = "shape";

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Raw robot model document. Only one of the layouts is expected to be present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawModelDoc {
    #[serde(default)]
    pub chassis: Option<RawChassis>,

    #[serde(default)]
    pub laser: Option<RawLaserGroup>,

    #[serde(default)]
    pub device_types: Option<Vec<DeviceType>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawChassis {
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub head: Option<f64>,

    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub tail: Option<f64>,

    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub width: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLaserGroup {
    #[serde(default)]
    pub index: Vec<RawLaser>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLaser {
    #[serde(default, deserialize_with = "lenient::number")]
    pub x: f64,

    #[serde(default, deserialize_with = "lenient::number")]
    pub y: f64,

    /// Yaw in degrees
    #[serde(default, deserialize_with = "lenient::number")]
    pub r: f64,
}

/// Rectangular extents of the robot footprint about the body origin.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Chassis {
    /// Distance from the origin to the front edge.
    ///
    /// Units: meters
    pub head_m: f64,

    /// Distance from the origin to the rear edge.
    ///
    /// Units: meters
    pub tail_m: f64,

    /// Full width, centred on the body X axis.
    ///
    /// Units: meters
    pub width_m: f64,
}

/// A sensor's mounting pose in the robot body frame.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct SensorFrame {
    pub id: u32,
    pub offset: Pose2,
}

/// All sensor frames of a robot, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SensorTable {
    frames: BTreeMap<u32, SensorFrame>,

    /// Display names by id, used to look up calibration entries.
    names: BTreeMap<u32, String>,

    /// Id of the sensor flagged for localisation, if any.
    localisation_id: Option<u32>,
}

/// Everything extracted from a robot model document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RobotModel {
    /// `None` if the document has no usable chassis description.
    pub chassis: Option<Chassis>,

    pub sensors: SensorTable,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The layout of a robot model document.
#[derive(Debug, Copy, Clone)]
pub enum ModelSchema<'a> {
    Direct {
        chassis: &'a RawChassis,
        laser: Option<&'a RawLaserGroup>,
    },
    DeviceList(&'a [DeviceType]),
}

/// The footprint shapes a device list chassis can select.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ChassisShape {
    Rectangle {
        head_m: f64,
        tail_m: f64,
        width_m: f64,
    },
    Circle {
        radius_m: f64,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Cannot read the robot model file: {0}")]
    FileLoadError(std::io::Error),

    #[error("The robot model document is not valid JSON: {0}")]
    DeserialiseError(serde_json::Error),

    #[error("The robot model document has neither a chassis record nor a device list")]
    UnknownSchema,

    #[error("No chassis description found")]
    NoChassis,

    #[error("The chassis shape \"{0}\" is not supported")]
    UnsupportedShape(String),

    #[error("The {0} chassis description is missing the \"{1}\" parameter")]
    IncompleteChassis(&'static str, &'static str),

    #[error("No laser sensors found")]
    NoSensors,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl RawModelDoc {
    /// Resolve which layout this document uses.
    ///
    /// A `chassis` record takes precedence over a device list.
    pub fn schema(&self) -> Result<ModelSchema<'_>, ModelError> {
        if let Some(ref chassis) = self.chassis {
            Ok(ModelSchema::Direct {
                chassis,
                laser: self.laser.as_ref(),
            })
        } else if let Some(ref types) = self.device_types {
            Ok(ModelSchema::DeviceList(types))
        } else {
            Err(ModelError::UnknownSchema)
        }
    }
}

impl From<ChassisShape> for Chassis {
    fn from(shape: ChassisShape) -> Self {
        match shape {
            ChassisShape::Rectangle {
                head_m,
                tail_m,
                width_m,
            } => Chassis {
                head_m,
                tail_m,
                width_m,
            },
            ChassisShape::Circle { radius_m } => Chassis {
                head_m: radius_m,
                tail_m: radius_m,
                width_m: radius_m,
            },
        }
    }
}

impl Chassis {
    /// Closed outline of the footprint in the body frame.
    ///
    /// Five vertices, the first repeated at the end: rear left, rear right, front right, front
    /// left, rear left.
    pub fn outline(&self) -> PointCloud {
        let half_width_m = self.width_m / 2.0;

        vec![
            Point2::new(-self.tail_m, half_width_m),
            Point2::new(-self.tail_m, -half_width_m),
            Point2::new(self.head_m, -half_width_m),
            Point2::new(self.head_m, half_width_m),
            Point2::new(-self.tail_m, half_width_m),
        ]
    }
}

impl SensorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a sensor frame, replacing and returning any frame with the same id.
    pub fn insert(&mut self, frame: SensorFrame, name: Option<String>) -> Option<SensorFrame> {
        if let Some(name) = name {
            self.names.insert(frame.id, name);
        }
        self.frames.insert(frame.id, frame)
    }

    pub fn get(&self, id: u32) -> Option<&SensorFrame> {
        self.frames.get(&id)
    }

    /// Display name of the sensor, if the document gave one.
    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Sensor frames in ascending id order.
    pub fn frames(&self) -> impl Iterator<Item = &SensorFrame> {
        self.frames.values()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Id of the sensor flagged for localisation.
    pub fn localisation_id(&self) -> Option<u32> {
        self.localisation_id
    }

    pub fn set_localisation_id(&mut self, id: Option<u32>) {
        self.localisation_id = id;
    }

    /// The sensor whose data should be displayed by default: the localisation sensor if one is
    /// flagged and present, otherwise the sensor with the lowest id.
    pub fn active_id(&self) -> Option<u32> {
        match self.localisation_id {
            Some(id) if self.frames.contains_key(&id) => Some(id),
            _ => self.frames.keys().next().copied(),
        }
    }

    /// Return a copy of this table with each frame's offset replaced by `f(frame, name)`.
    pub fn map_offsets<F>(&self, mut f: F) -> SensorTable
    where
        F: FnMut(&SensorFrame, Option<&str>) -> Pose2,
    {
        let frames = self
            .frames
            .iter()
            .map(|(id, frame)| {
                let offset = f(frame, self.name(*id));
                (*id, SensorFrame { id: *id, offset })
            })
            .collect();

        SensorTable {
            frames,
            names: self.names.clone(),
            localisation_id: self.localisation_id,
        }
    }
}

impl RobotModel {
    /// Load a robot model from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let model_str = read_to_string(path.as_ref()).map_err(ModelError::FileLoadError)?;

        let model = Self::from_json_str(&model_str)?;
        info!("Robot model loaded from {:?}", path.as_ref());

        Ok(model)
    }

    /// Parse a robot model from the contents of a model document.
    ///
    /// Only invalid JSON is an error. A missing chassis or missing sensors are reported and left
    /// empty so that whatever did parse can still be used.
    pub fn from_json_str(model_str: &str) -> Result<Self, ModelError> {
        let doc: RawModelDoc =
            serde_json::from_str(model_str).map_err(ModelError::DeserialiseError)?;

        Ok(Self::from_doc(&doc))
    }

    pub fn from_doc(doc: &RawModelDoc) -> Self {
        let chassis = match parse_chassis(doc) {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("Robot model has no usable chassis: {}", e);
                None
            }
        };

        let sensors = match parse_sensors(doc) {
            Ok(s) => s,
            Err(e) => {
                warn!("Robot model has no usable sensors: {}", e);
                SensorTable::new()
            }
        };

        info!(
            "Robot model built: chassis {:?}, {} sensors, active sensor {:?}",
            chassis,
            sensors.len(),
            sensors.active_id()
        );

        Self { chassis, sensors }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Extract the chassis footprint from a robot model document.
///
/// No default footprint is ever synthesised, a document without a recognised chassis description
/// is an error.
pub fn parse_chassis(doc: &RawModelDoc) -> Result<Chassis, ModelError> {
    match doc.schema()? {
        ModelSchema::Direct { chassis, .. } => {
            let shape = ChassisShape::Rectangle {
                head_m: chassis
                    .head
                    .ok_or(ModelError::IncompleteChassis("rectangle", "head"))?,
                tail_m: chassis
                    .tail
                    .ok_or(ModelError::IncompleteChassis("rectangle", "tail"))?,
                width_m: chassis
                    .width
                    .ok_or(ModelError::IncompleteChassis("rectangle", "width"))?,
            };
            Ok(shape.into())
        }
        ModelSchema::DeviceList(types) => {
            let combo = device_list::find_device_type(types, CHASSIS_DEVICE)
                .and_then(|t| t.devices.first())
                .and_then(|d| d.param_group(SHAPE_PARAM))
                .and_then(|g| g.combo_param.as_ref())
                .ok_or(ModelError::NoChassis)?;

            let selected = combo
                .selected()
                .ok_or_else(|| ModelError::UnsupportedShape(combo.child_key.clone()))?;
            let params = &selected.params;

            let shape = match selected.key.as_str() {
                "rectangle" => ChassisShape::Rectangle {
                    head_m: device_list::double_param(params, "head")
                        .ok_or(ModelError::IncompleteChassis("rectangle", "head"))?,
                    tail_m: device_list::double_param(params, "tail")
                        .ok_or(ModelError::IncompleteChassis("rectangle", "tail"))?,
                    width_m: device_list::double_param(params, "width")
                        .ok_or(ModelError::IncompleteChassis("rectangle", "width"))?,
                },
                "circle" => ChassisShape::Circle {
                    radius_m: device_list::double_param(params, "radius")
                        .ok_or(ModelError::IncompleteChassis("circle", "radius"))?,
                },
                other => return Err(ModelError::UnsupportedShape(other.to_string())),
            };

            debug!("Chassis shape: {:?}", shape);
            Ok(shape.into())
        }
    }
}

/// Extract the laser sensor frames from a robot model document.
///
/// Yaw angles are converted from degrees to radians here.
pub fn parse_sensors(doc: &RawModelDoc) -> Result<SensorTable, ModelError> {
    let mut table = SensorTable::new();

    match doc.schema()? {
        ModelSchema::Direct { laser, .. } => {
            let laser = laser
                .and_then(|l| l.index.first())
                .ok_or(ModelError::NoSensors)?;

            table.insert(
                SensorFrame {
                    id: 0,
                    offset: Pose2::new(laser.x, laser.y, laser.r.to_radians()),
                },
                None,
            );
        }
        ModelSchema::DeviceList(types) => {
            let lasers = device_list::find_device_type(types, LASER_DEVICE)
                .ok_or(ModelError::NoSensors)?;

            for device in lasers.devices.iter() {
                let params = device.basic_params();

                let id = device_list::find_param(params, "id")
                    .and_then(|p| p.uint32_value)
                    .unwrap_or(0);

                let use_for_loc = device_list::find_param(params, "useForLocalization")
                    .and_then(|p| p.bool_value)
                    .unwrap_or(false);
                if use_for_loc {
                    table.set_localisation_id(Some(id));
                }

                let frame = SensorFrame {
                    id,
                    offset: device.basic_pose(),
                };
                debug!("Laser \"{}\": {:?}", device.name, frame);

                if table.insert(frame, Some(device.name.clone())).is_some() {
                    warn!(
                        "Duplicate laser id {}, keeping the later device \"{}\"",
                        id, device.name
                    );
                }
            }

            if table.is_empty() {
                return Err(ModelError::NoSensors);
            }
        }
    }

    Ok(table)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn device_list_model(shape: &str) -> String {
        format!(
            r#"{{
            "deviceTypes": [
                {{
                    "name": "chassis",
                    "devices": [ {{
                        "name": "chassis",
                        "deviceParams": [ {{
                            "key": "shape",
                            "comboParam": {{
                                "childKey": "{}",
                                "childParams": [
                                    {{ "key": "rectangle", "params": [
                                        {{ "key": "head", "doubleValue": 0.6 }},
                                        {{ "key": "tail", "doubleValue": 0.4 }},
                                        {{ "key": "width", "doubleValue": 0.7 }}
                                    ] }},
                                    {{ "key": "circle", "params": [
                                        {{ "key": "radius", "doubleValue": 0.5 }}
                                    ] }}
                                ]
                            }}
                        }} ]
                    }} ]
                }},
                {{
                    "name": "laser",
                    "devices": [
                        {{ "name": "front", "deviceParams": [ {{ "key": "basic", "arrayParam": {{ "params": [
                            {{ "key": "x", "doubleValue": 0.3 }},
                            {{ "key": "y", "doubleValue": 0.0 }},
                            {{ "key": "yaw", "doubleValue": 0.0 }},
                            {{ "key": "id", "uint32Value": 2 }}
                        ] }} }} ] }},
                        {{ "name": "rear", "deviceParams": [ {{ "key": "basic", "arrayParam": {{ "params": [
                            {{ "key": "useForLocalization", "boolValue": true }},
                            {{ "key": "x", "doubleValue": -0.3 }},
                            {{ "key": "yaw", "doubleValue": 90.0 }},
                            {{ "key": "id", "uint32Value": 5 }}
                        ] }} }} ] }}
                    ]
                }}
            ]
        }}"#,
            shape
        )
    }

    #[test]
    fn test_direct_schema() {
        let model = RobotModel::from_json_str(
            r#"{
                "chassis": { "head": 0.5, "tail": "0.3", "width": 0.6 },
                "laser": { "index": [ { "x": 0.2, "y": 0.1, "r": 90 }, { "x": 9, "y": 9, "r": 9 } ] }
            }"#,
        )
        .unwrap();

        assert_eq!(
            model.chassis,
            Some(Chassis {
                head_m: 0.5,
                tail_m: 0.3,
                width_m: 0.6
            })
        );
        assert_eq!(model.sensors.len(), 1);

        let frame = model.sensors.get(0).unwrap();
        assert_eq!(frame.offset.x_m, 0.2);
        assert_eq!(frame.offset.y_m, 0.1);
        assert!((frame.offset.theta_rad - FRAC_PI_2).abs() < 1e-12);
        assert_eq!(model.sensors.name(0), None);
        assert_eq!(model.sensors.active_id(), Some(0));
    }

    #[test]
    fn test_device_list_rectangle() {
        let doc: RawModelDoc = serde_json::from_str(&device_list_model("rectangle")).unwrap();
        assert_eq!(
            parse_chassis(&doc).unwrap(),
            Chassis {
                head_m: 0.6,
                tail_m: 0.4,
                width_m: 0.7
            }
        );
    }

    #[test]
    fn test_device_list_circle() {
        let doc: RawModelDoc = serde_json::from_str(&device_list_model("circle")).unwrap();
        assert_eq!(
            parse_chassis(&doc).unwrap(),
            Chassis {
                head_m: 0.5,
                tail_m: 0.5,
                width_m: 0.5
            }
        );
    }

    #[test]
    fn test_unsupported_shape() {
        let doc: RawModelDoc = serde_json::from_str(&device_list_model("triangle")).unwrap();
        assert!(matches!(
            parse_chassis(&doc),
            Err(ModelError::UnsupportedShape(ref s)) if s == "triangle"
        ));

        // The sensors are still usable
        let model = RobotModel::from_doc(&doc);
        assert_eq!(model.chassis, None);
        assert_eq!(model.sensors.len(), 2);
    }

    #[test]
    fn test_device_list_sensors() {
        let doc: RawModelDoc = serde_json::from_str(&device_list_model("rectangle")).unwrap();
        let sensors = parse_sensors(&doc).unwrap();

        assert_eq!(sensors.len(), 2);
        assert_eq!(sensors.frames().map(|f| f.id).collect::<Vec<_>>(), vec![2, 5]);
        assert_eq!(sensors.name(2), Some("front"));
        assert_eq!(sensors.name(5), Some("rear"));

        // The flag comes before the id in the parameters but still selects the rear laser
        assert_eq!(sensors.localisation_id(), Some(5));
        assert_eq!(sensors.active_id(), Some(5));

        let rear = sensors.get(5).unwrap();
        assert_eq!(rear.offset.x_m, -0.3);
        assert_eq!(rear.offset.y_m, 0.0);
        assert!((rear.offset.theta_rad - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_schema() {
        let model = RobotModel::from_json_str(r#"{ "name": "robot" }"#).unwrap();
        assert_eq!(model, RobotModel::default());

        let doc = RawModelDoc::default();
        assert!(matches!(parse_chassis(&doc), Err(ModelError::UnknownSchema)));
        assert!(matches!(parse_sensors(&doc), Err(ModelError::UnknownSchema)));
    }

    #[test]
    fn test_incomplete_direct_chassis() {
        let model = RobotModel::from_json_str(r#"{ "chassis": { "head": 0.5, "width": 0.6 } }"#)
            .unwrap();
        assert_eq!(model.chassis, None);
        assert!(model.sensors.is_empty());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            RobotModel::from_json_str("{ chassis: }"),
            Err(ModelError::DeserialiseError(_))
        ));
    }

    #[test]
    fn test_outline() {
        let chassis = Chassis {
            head_m: 0.6,
            tail_m: 0.4,
            width_m: 0.5,
        };
        let outline = chassis.outline();

        assert_eq!(outline.len(), 5);
        assert_eq!(outline.first(), outline.last());
        assert_eq!(outline[0], Point2::new(-0.4, 0.25));
        assert_eq!(outline[2], Point2::new(0.6, -0.25));
    }

    #[test]
    fn test_active_id_fallback() {
        let mut table = SensorTable::new();
        assert_eq!(table.active_id(), None);

        table.insert(SensorFrame { id: 7, offset: Pose2::IDENTITY }, None);
        table.insert(SensorFrame { id: 3, offset: Pose2::IDENTITY }, None);
        assert_eq!(table.active_id(), Some(3));

        // A flagged id with no frame falls back too
        table.set_localisation_id(Some(9));
        assert_eq!(table.active_id(), Some(3));
    }
}
