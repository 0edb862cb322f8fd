//! # Map
//!
//! This module converts a map description document into a [`MapScene`]: the plain position point
//! cloud, the advanced curves as renderable segments and the advanced points as labelled markers.
//!
//! Parsing is permissive. Missing coordinates default to zero and a curve with an unknown class is
//! reported and skipped. Only a document which cannot be read as JSON at all fails the load.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Bezier, arc and straight curve reconstruction
pub mod curve;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{fs::read_to_string, path::Path};

use log::{debug, info, warn};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::{device_list::lenient, transform::PointCloud};
pub use curve::{ArcSegment, BezierSegment, CurveSegment, LineSegment, RawCurve};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Raw map description document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMapDoc {
    #[serde(default)]
    pub normal_pos_list: Option<Vec<RawPos>>,

    #[serde(default)]
    pub advanced_curve_list: Vec<RawCurve>,

    #[serde(default)]
    pub advanced_point_list: Vec<RawMarker>,
}

/// A raw position record. Either coordinate may be missing.
#[derive(Debug, Copy, Clone, Default, Deserialize)]
pub struct RawPos {
    #[serde(default, deserialize_with = "lenient::number")]
    pub x: f64,

    #[serde(default, deserialize_with = "lenient::number")]
    pub y: f64,
}

/// A curve end point, which wraps the position in a `pos` record.
#[derive(Debug, Copy, Clone, Default, Deserialize)]
pub struct RawStation {
    #[serde(default)]
    pub pos: RawPos,
}

/// A raw advanced point record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMarker {
    #[serde(default)]
    pub pos: RawPos,

    /// Heading in radians
    #[serde(default)]
    pub dir: Option<f64>,

    #[serde(default)]
    pub ignore_dir: bool,

    #[serde(default)]
    pub instance_name: String,
}

/// A labelled point of interest on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub position: Point2<f64>,

    pub label: String,

    /// Heading of the marker in radians, or `None` if the direction is to be ignored.
    pub heading_rad: Option<f64>,
}

/// The normalised renderable content of a map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapScene {
    /// Plain map positions
    pub points: PointCloud,

    /// Advanced curves, in document order
    pub curves: Vec<CurveSegment>,

    /// Advanced points, in document order
    pub markers: Vec<MapMarker>,
}

/// An axis aligned viewing window.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ViewBounds {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Cannot read the map file: {0}")]
    FileLoadError(std::io::Error),

    #[error("The map document is not valid JSON: {0}")]
    DeserialiseError(serde_json::Error),

    #[error("Unknown curve class \"{0}\"")]
    UnknownCurveClass(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl RawPos {
    pub fn point(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
}

impl MapMarker {
    /// End point of the heading arrow of the given length, or `None` if the marker has no heading.
    pub fn heading_tip(&self, length_m: f64) -> Option<Point2<f64>> {
        self.heading_rad.map(|h| {
            let (sin, cos) = h.sin_cos();
            Point2::new(
                self.position.x + length_m * cos,
                self.position.y + length_m * sin,
            )
        })
    }
}

impl MapScene {
    /// Load a map scene from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        let map_str = read_to_string(path.as_ref()).map_err(MapError::FileLoadError)?;

        let scene = Self::from_json_str(&map_str)?;
        info!("Map loaded from {:?}", path.as_ref());

        Ok(scene)
    }

    /// Parse a map scene from the contents of a map document.
    pub fn from_json_str(map_str: &str) -> Result<Self, MapError> {
        let doc: RawMapDoc = serde_json::from_str(map_str).map_err(MapError::DeserialiseError)?;

        Ok(Self::from_doc(&doc))
    }

    /// Build the scene from an already parsed document.
    pub fn from_doc(doc: &RawMapDoc) -> Self {
        let points = match doc.normal_pos_list {
            Some(ref list) => parse_points(list),
            None => {
                warn!("Map has no normalPosList, the point cloud will be empty");
                PointCloud::new()
            }
        };

        let mut curves = Vec::with_capacity(doc.advanced_curve_list.len());
        for (i, raw) in doc.advanced_curve_list.iter().enumerate() {
            match curve::parse_curve(raw) {
                Ok(c) => curves.push(c),
                Err(e) => warn!("Skipping advanced curve {}: {}", i, e),
            }
        }

        let markers = parse_markers(&doc.advanced_point_list);

        let scene = Self {
            points,
            curves,
            markers,
        };

        info!(
            "Map scene built: {} points, {} beziers, {} arcs, {} lines, {} markers",
            scene.points.len(),
            scene.beziers().count(),
            scene.arcs().count(),
            scene.lines().count(),
            scene.markers.len()
        );

        scene
    }

    pub fn beziers(&self) -> impl Iterator<Item = &BezierSegment> {
        self.curves.iter().filter_map(|c| match c {
            CurveSegment::Bezier(b) => Some(b),
            _ => None,
        })
    }

    pub fn arcs(&self) -> impl Iterator<Item = &ArcSegment> {
        self.curves.iter().filter_map(|c| match c {
            CurveSegment::Arc(a) => Some(a),
            _ => None,
        })
    }

    /// Straight curves, including arcs which degraded to a line.
    pub fn lines(&self) -> impl Iterator<Item = &LineSegment> {
        self.curves.iter().filter_map(|c| match c {
            CurveSegment::Line(l) => Some(l),
            _ => None,
        })
    }

    /// Square viewing window over the point cloud.
    ///
    /// The shorter axis is extended from its minimum so both axes cover the same span. Returns
    /// `None` if there are no points.
    pub fn view_bounds(&self) -> Option<ViewBounds> {
        let (min, mut max) = bounding_box(&self.points)?;

        let span_x = max.x - min.x;
        let span_y = max.y - min.y;
        if span_x > span_y {
            max.y = min.y + span_x;
        } else {
            max.x = min.x + span_y;
        }

        Some(ViewBounds { min, max })
    }
}

impl ViewBounds {
    /// A window extending `margin_m` in every direction from `centre`.
    pub fn around(centre: Point2<f64>, margin_m: f64) -> Self {
        Self {
            min: Point2::new(centre.x - margin_m, centre.y - margin_m),
            max: Point2::new(centre.x + margin_m, centre.y + margin_m),
        }
    }

    /// The bounding box of `points` grown by `margin_m` on every side, `None` if there are no
    /// points.
    pub fn around_points(points: &[Point2<f64>], margin_m: f64) -> Option<Self> {
        let (min, max) = bounding_box(points)?;

        Some(Self {
            min: Point2::new(min.x - margin_m, min.y - margin_m),
            max: Point2::new(max.x + margin_m, max.y + margin_m),
        })
    }

    pub fn centre(&self) -> Point2<f64> {
        nalgebra::center(&self.min, &self.max)
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert raw position records into a point cloud, defaulting missing coordinates to zero.
pub fn parse_points(raw_positions: &[RawPos]) -> PointCloud {
    raw_positions.iter().map(RawPos::point).collect()
}

/// Convert raw advanced point records into markers.
///
/// `ignoreDir` wins over `dir`. A marker with neither has a heading of zero.
pub fn parse_markers(raw_points: &[RawMarker]) -> Vec<MapMarker> {
    raw_points
        .iter()
        .map(|raw| {
            let heading_rad = if raw.ignore_dir {
                None
            } else {
                Some(raw.dir.unwrap_or(0.0))
            };

            if raw.instance_name.is_empty() {
                debug!("Advanced point at {:?} has no instance name", raw.pos.point());
            }

            MapMarker {
                position: raw.pos.point(),
                label: raw.instance_name.clone(),
                heading_rad,
            }
        })
        .collect()
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Component-wise minimum and maximum of the points.
fn bounding_box(points: &[Point2<f64>]) -> Option<(Point2<f64>, Point2<f64>)> {
    let first = points.first()?;

    Some(points.iter().skip(1).fold((*first, *first), |(min, max), p| {
        (
            Point2::new(min.x.min(p.x), min.y.min(p.y)),
            Point2::new(max.x.max(p.x), max.y.max(p.y)),
        )
    }))
}
