//! # Curves
//!
//! Reconstruction of renderable curve segments from the advanced curve records of a map.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use super::{MapError, RawPos, RawStation};
use util::maths;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Three points whose circumcircle determinant is at or below this magnitude are treated as
/// collinear.
pub const COLLINEAR_THRESHOLD: f64 = 1e-12;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Raw advanced curve record as found in a map document.
///
/// The meaning of the control points depends on `className`: a bezier uses both, an arc uses
/// `controlPos1` as a point on the arc, a straight uses neither.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCurve {
    #[serde(default)]
    pub class_name: String,

    #[serde(default)]
    pub start_pos: RawStation,

    #[serde(default)]
    pub control_pos1: RawPos,

    #[serde(default)]
    pub control_pos2: RawPos,

    #[serde(default)]
    pub end_pos: RawStation,
}

/// Cubic bezier control quad.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct BezierSegment {
    pub p0: Point2<f64>,
    pub p1: Point2<f64>,
    pub p2: Point2<f64>,
    pub p3: Point2<f64>,
}

/// A circular arc.
///
/// Angles are in **degrees**, unlike everything else in this crate, because arc renderers take
/// degrees. The arc is swept counter-clockwise from `start_deg` to `end_deg`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ArcSegment {
    pub centre: Point2<f64>,

    /// Units: meters
    pub radius_m: f64,

    /// Units: degrees, in [-180, 180]
    pub start_deg: f64,

    /// Units: degrees, in [-180, 180]
    pub end_deg: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct LineSegment {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A renderable curve segment.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum CurveSegment {
    Bezier(BezierSegment),
    Arc(ArcSegment),
    Line(LineSegment),
}

/// Known values of the `className` discriminant.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CurveClass {
    Bezier,
    Arc,
    Straight,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl CurveClass {
    pub fn from_class_name(name: &str) -> Option<Self> {
        match name {
            "BezierPath" => Some(CurveClass::Bezier),
            "ArcPath" => Some(CurveClass::Arc),
            "StraightPath" => Some(CurveClass::Straight),
            _ => None,
        }
    }
}

impl ArcSegment {
    /// Returns true if the ray from the centre through `point` crosses the arc.
    pub fn spans(&self, point: &Point2<f64>) -> bool {
        let angle_rad = (point.y - self.centre.y).atan2(point.x - self.centre.x);

        maths::in_ccw_sweep(
            angle_rad,
            self.start_deg.to_radians(),
            self.end_deg.to_radians(),
        )
    }

    /// Point on the circle at the given angle in degrees.
    pub fn point_at_deg(&self, angle_deg: f64) -> Point2<f64> {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        Point2::new(
            self.centre.x + self.radius_m * cos,
            self.centre.y + self.radius_m * sin,
        )
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert a raw curve record into a renderable segment.
///
/// Missing coordinates default to zero. An unrecognised `className` is an error so the caller can
/// report and skip the record.
pub fn parse_curve(raw: &RawCurve) -> Result<CurveSegment, MapError> {
    let class = CurveClass::from_class_name(&raw.class_name)
        .ok_or_else(|| MapError::UnknownCurveClass(raw.class_name.clone()))?;

    let start = raw.start_pos.pos.point();
    let end = raw.end_pos.pos.point();

    Ok(match class {
        CurveClass::Bezier => CurveSegment::Bezier(BezierSegment {
            p0: start,
            p1: raw.control_pos1.point(),
            p2: raw.control_pos2.point(),
            p3: end,
        }),
        CurveClass::Arc => arc_from_three_points(start, raw.control_pos1.point(), end),
        CurveClass::Straight => CurveSegment::Line(LineSegment { start, end }),
    })
}

/// Build the arc starting at `start`, passing through `control` and finishing at `end`.
///
/// The circle is the circumcircle of the three points. If the points are collinear (no finite
/// circumcircle) a straight line from `start` to `end` is returned instead.
///
/// The stored angle order is chosen from the turn direction at `control`: for a left turn (or a
/// zero cross product) the arc is stored start to end, for a right turn end to start, so that a
/// counter-clockwise sweep always passes through `control`.
pub fn arc_from_three_points(
    start: Point2<f64>,
    control: Point2<f64>,
    end: Point2<f64>,
) -> CurveSegment {
    let (x1, y1) = (start.x, start.y);
    let (x2, y2) = (control.x, control.y);
    let (x3, y3) = (end.x, end.y);

    let a = x1 * (y2 - y3) - y1 * (x2 - x3) + x2 * y3 - x3 * y2;

    if a.abs() <= COLLINEAR_THRESHOLD {
        return CurveSegment::Line(LineSegment { start, end });
    }

    let s1 = x1 * x1 + y1 * y1;
    let s2 = x2 * x2 + y2 * y2;
    let s3 = x3 * x3 + y3 * y3;

    let b = s1 * (y3 - y2) + s2 * (y1 - y3) + s3 * (y2 - y1);
    let c = s1 * (x2 - x3) + s2 * (x3 - x1) + s3 * (x1 - x2);
    let d = s1 * (x3 * y2 - x2 * y3) + s2 * (x1 * y3 - x3 * y1) + s3 * (x2 * y1 - x1 * y2);

    let centre = Point2::new(-b / (2.0 * a), -c / (2.0 * a));
    let radius_m = ((b * b + c * c - 4.0 * a * d) / (4.0 * a * a)).sqrt();

    let theta1_deg = (y1 - centre.y).atan2(x1 - centre.x).to_degrees();
    let theta3_deg = (y3 - centre.y).atan2(x3 - centre.x).to_degrees();

    // Cross product of start->control and control->end, positive for a left turn
    let turn = (x2 - x1) * (y3 - y2) - (y2 - y1) * (x3 - x2);

    let (start_deg, end_deg) = if turn >= 0.0 {
        (theta1_deg, theta3_deg)
    } else {
        (theta3_deg, theta1_deg)
    };

    CurveSegment::Arc(ArcSegment {
        centre,
        radius_m,
        start_deg,
        end_deg,
    })
}
