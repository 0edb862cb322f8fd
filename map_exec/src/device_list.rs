//! # Device List Documents
//!
//! Robot model and calibration documents share a generic "device list" layout: a list of device
//! types, each holding named devices, each holding keyed parameters. This module provides the raw
//! serde types for that layout and lookups over them. Interpretation of the parameters lives in
//! [`crate::model`] and [`crate::calib`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Deserializer};

use crate::transform::Pose2;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Key of the parameter group holding a device's mounting pose.
pub const BASIC_PARAMS_KEY: &str = "basic";

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Top level of a device list document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceList {
    #[serde(default)]
    pub device_types: Vec<DeviceType>,
}

/// A group of devices of the same kind, e.g. all lasers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceType {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub devices: Vec<Device>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Display name of the device, used to match calibration entries.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub device_params: Vec<DeviceParam>,
}

/// A keyed parameter group of a device.
///
/// Either a flat array of parameters, or a combo in which one of several child groups is selected
/// by `childKey`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceParam {
    #[serde(default)]
    pub key: String,

    #[serde(default)]
    pub array_param: Option<ArrayParam>,

    #[serde(default)]
    pub combo_param: Option<ComboParam>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArrayParam {
    #[serde(default)]
    pub params: Vec<Param>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboParam {
    /// Key of the selected child group.
    #[serde(default)]
    pub child_key: String,

    #[serde(default)]
    pub child_params: Vec<ChildParam>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChildParam {
    #[serde(default)]
    pub key: String,

    #[serde(default)]
    pub params: Vec<Param>,
}

/// A single keyed value. Only the field matching the parameter's type is present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Param {
    #[serde(default)]
    pub key: String,

    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub double_value: Option<f64>,

    #[serde(default)]
    pub uint32_value: Option<u32>,

    #[serde(default)]
    pub bool_value: Option<bool>,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl DeviceList {
    /// Get the first device type with the given name.
    pub fn device_type(&self, name: &str) -> Option<&DeviceType> {
        find_device_type(&self.device_types, name)
    }
}

impl Device {
    /// Get the parameter group with the given key.
    pub fn param_group(&self, key: &str) -> Option<&DeviceParam> {
        self.device_params.iter().find(|p| p.key == key)
    }

    /// Get the flat parameters of the `basic` group, or an empty slice if there are none.
    pub fn basic_params(&self) -> &[Param] {
        self.param_group(BASIC_PARAMS_KEY)
            .and_then(|g| g.array_param.as_ref())
            .map(|a| a.params.as_slice())
            .unwrap_or(&[])
    }

    /// Get the mounting pose from the `basic` parameters.
    ///
    /// `x` and `y` are in meters, `yaw` is in degrees and is converted to radians here. Any of the
    /// three that is missing defaults to zero.
    pub fn basic_pose(&self) -> Pose2 {
        let params = self.basic_params();

        Pose2 {
            x_m: double_param(params, "x").unwrap_or(0.0),
            y_m: double_param(params, "y").unwrap_or(0.0),
            theta_rad: double_param(params, "yaw").unwrap_or(0.0).to_radians(),
        }
    }
}

impl ComboParam {
    /// Get the child group selected by `childKey`.
    pub fn selected(&self) -> Option<&ChildParam> {
        self.child_params.iter().find(|c| c.key == self.child_key)
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Get the first device type with the given name.
pub fn find_device_type<'a>(types: &'a [DeviceType], name: &str) -> Option<&'a DeviceType> {
    types.iter().find(|t| t.name == name)
}

/// Find a parameter by key. If the key is repeated the last occurence is used.
pub fn find_param<'a>(params: &'a [Param], key: &str) -> Option<&'a Param> {
    params.iter().rev().find(|p| p.key == key)
}

/// Get the `doubleValue` of the parameter with the given key.
pub fn double_param(params: &[Param], key: &str) -> Option<f64> {
    find_param(params, key).and_then(|p| p.double_value)
}

// ------------------------------------------------------------------------------------------------
// LENIENT NUMBERS
// ------------------------------------------------------------------------------------------------

/// Deserialisers accepting either a JSON number or a string holding one.
///
/// Hand-edited model files sometimes quote their numbers.
pub(crate) mod lenient {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(f64),
        Str(String),
    }

    impl NumOrStr {
        fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
            match self {
                NumOrStr::Num(v) => Ok(v),
                NumOrStr::Str(s) => s
                    .trim()
                    .parse()
                    .map_err(|_| E::custom(format!("expected a number, found \"{}\"", s))),
            }
        }
    }

    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        NumOrStr::deserialize(deserializer)?.into_f64()
    }

    pub fn opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<NumOrStr>::deserialize(deserializer)? {
            Some(v) => v.into_f64().map(Some),
            None => Ok(None),
        }
    }
}
