//! Headless map viewer executable.
//!
//! # Architecture
//!
//! This executable plays the role of the viewer host for one update cycle:
//!
//!     - Load the map, robot model and calibration documents given on the command line
//!     - Apply the calibration to the robot model's sensor frames
//!     - Pick the view window from the map, or failing that the trajectory
//!     - Build the robot snapshot for the given telemetry (pose and optional scan)
//!     - Log a summary and archive the resulting scene as JSON in the session directory
//!
//! A document which fails to load is reported and treated as absent, the remaining documents are
//! still processed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{error, info, warn};
use nalgebra::Point2;
use serde::Serialize;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

// Internal
use map_lib::{
    calib::{apply_calibration, Calibration},
    map::{MapScene, ViewBounds},
    model::{RobotModel, SensorTable},
    params::MapExecParams,
    robot::{default_pose, pose_arrow, RobotSnapshot, Telemetry},
    transform::{PointCloud, Pose2},
};
use util::{
    host,
    logger::{logger_init, parse_level, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const EXEC_NAME: &str = "map_exec";

/// Name of the scene archive within the session's archive directory.
const SCENE_ARCHIVE: &str = "scene.json";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command line arguments
#[derive(Debug, StructOpt)]
#[structopt(name = "map_exec", about = "Build the renderable scene for a robot map")]
struct Args {
    /// Map description file
    #[structopt(long, parse(from_os_str))]
    map: Option<PathBuf>,

    /// Robot model file
    #[structopt(long, parse(from_os_str))]
    model: Option<PathBuf>,

    /// Sensor calibration file
    #[structopt(long, parse(from_os_str))]
    calib: Option<PathBuf>,

    /// Robot pose in the world frame: x [m], y [m], theta [rad]. Defaults to the centre of the view.
    #[structopt(long, number_of_values = 3, allow_hyphen_values = true)]
    pose: Option<Vec<f64>>,

    /// Localised pose in the world frame: x [m], y [m], theta [rad]. Defaults to the robot pose.
    #[structopt(long, number_of_values = 3, allow_hyphen_values = true)]
    loc_pose: Option<Vec<f64>>,

    /// JSON file holding a list of [x, y] scan returns in the sensor frame
    #[structopt(long, parse(from_os_str))]
    scan: Option<PathBuf>,

    /// Id of the sensor which produced the scan. Defaults to the model's active sensor.
    #[structopt(long)]
    sensor: Option<u32>,

    /// JSON file holding the list of [x, y] trajectory points in the world frame
    #[structopt(long, parse(from_os_str))]
    trajectory: Option<PathBuf>,
}

/// Everything produced for one update, as archived.
#[derive(Serialize)]
struct SceneArchive<'a> {
    map: Option<&'a MapScene>,
    model: Option<&'a RobotModel>,
    calibrated_sensors: &'a SensorTable,
    view_bounds: Option<ViewBounds>,
    marker_arrows: Vec<(Point2<f64>, Point2<f64>)>,
    marker_radius_m: f64,
    trajectory: &'a PointCloud,
    robot: Option<RobotSnapshot>,
    robot_arrow: PointCloud,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let args = Args::from_args();

    // ---- EARLY INITIALISATION ----

    let sw_root = host::get_sw_root().ok();

    // Parameters live under the software root, fall back to defaults if it isn't set
    let params: MapExecParams = match sw_root {
        Some(_) => util::params::load("map_exec.toml")
            .wrap_err("Could not load map_exec params")?,
        None => MapExecParams::default(),
    };

    let session = match sw_root {
        Some(_) => Session::new(EXEC_NAME, &params.sessions_dir),
        None => Session::new_in(EXEC_NAME, &params.sessions_dir),
    }
    .wrap_err("Failed to create the session")?;

    let log_level = parse_level(&params.log_level).unwrap_or(LevelFilter::Info);
    logger_init(log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("Map Viewer Executable\n");
    info!("Session directory: {:?}", session.session_root);
    if sw_root.is_none() {
        warn!("{} is not set, using default parameters", host::SW_ROOT_ENV_VAR);
    }
    info!("Arguments: {:?}\n", args);

    // ---- LOAD DOCUMENTS ----

    let map = args.map.as_ref().and_then(|p| match MapScene::load(p) {
        Ok(m) => Some(m),
        Err(e) => {
            error!("Failed to load map {:?}: {}", p, e);
            None
        }
    });

    let model = args.model.as_ref().and_then(|p| match RobotModel::load(p) {
        Ok(m) => Some(m),
        Err(e) => {
            error!("Failed to load robot model {:?}: {}", p, e);
            None
        }
    });

    let calib = args.calib.as_ref().and_then(|p| match Calibration::load(p) {
        Ok(c) => Some(c),
        Err(e) => {
            error!("Failed to load calibration {:?}: {}", p, e);
            None
        }
    });

    let trajectory: PointCloud = match args.trajectory {
        Some(ref path) => read_points(path).wrap_err("Failed to load the trajectory")?,
        None => PointCloud::new(),
    };

    // ---- BUILD SCENE ----

    // The map decides the view, the trajectory only does if there is no map
    let content_bounds = map.as_ref().and_then(MapScene::view_bounds).or_else(|| {
        ViewBounds::around_points(&trajectory, params.trajectory_view_margin_m)
    });

    let nominal_sensors = model.as_ref().map(|m| m.sensors.clone()).unwrap_or_default();
    let calibrated_sensors = match calib {
        Some(ref c) => apply_calibration(&nominal_sensors, c),
        None => nominal_sensors,
    };

    let telemetry = build_telemetry(&args, &calibrated_sensors, content_bounds.as_ref())?;

    let robot = model
        .as_ref()
        .and_then(|m| RobotSnapshot::build(m.chassis.as_ref(), &calibrated_sensors, &telemetry));
    if model.is_some() && robot.is_none() {
        warn!("The robot model has no chassis, the robot will not be drawn");
    }

    let view_bounds = content_bounds.or_else(|| {
        model.as_ref().map(|_| {
            ViewBounds::around(telemetry.robot_pose.position(), params.robot_view_margin_m)
        })
    });

    let marker_arrows = map
        .as_ref()
        .map(|m| {
            m.markers
                .iter()
                .filter_map(|mk| {
                    mk.heading_tip(params.heading_arrow_length_m)
                        .map(|tip| (mk.position, tip))
                })
                .collect()
        })
        .unwrap_or_default();

    let archive = SceneArchive {
        map: map.as_ref(),
        model: model.as_ref(),
        calibrated_sensors: &calibrated_sensors,
        view_bounds,
        marker_arrows,
        marker_radius_m: params.marker_radius_m,
        trajectory: &trajectory,
        robot,
        robot_arrow: pose_arrow(&telemetry.robot_pose, params.heading_arrow_length_m),
    };

    info!("View bounds: {:?}", archive.view_bounds);
    if let Some(ref robot) = archive.robot {
        info!(
            "Robot drawn with {} scan points",
            robot.scan.as_ref().map(Vec::len).unwrap_or(0)
        );
    }

    // ---- ARCHIVE ----

    let path = session
        .save_json(SCENE_ARCHIVE, &archive)
        .wrap_err("Failed to archive the scene")?;
    info!("Scene archived to {:?}", path);

    Ok(())
}

/// Build the telemetry update from the command line arguments.
///
/// Without a pose the robot is placed at the centre of `view`, both for its real and localised
/// pose.
fn build_telemetry(
    args: &Args,
    sensors: &SensorTable,
    view: Option<&ViewBounds>,
) -> Result<Telemetry, Report> {
    let robot_pose = args
        .pose
        .as_deref()
        .map(pose_from_arg)
        .unwrap_or_else(|| default_pose(view));

    let loc_pose = args
        .loc_pose
        .as_deref()
        .map(pose_from_arg)
        .unwrap_or(robot_pose);

    let scan: PointCloud = match args.scan {
        Some(ref path) => read_points(path).wrap_err("Failed to load the scan")?,
        None => PointCloud::new(),
    };

    let sensor_id = match args.sensor.or_else(|| sensors.active_id()) {
        Some(id) => id,
        None => {
            if !scan.is_empty() {
                warn!("No sensor available for the scan, it will not be drawn");
            }
            0
        }
    };

    Ok(Telemetry {
        robot_pose,
        loc_pose,
        sensor_id,
        scan,
    })
}

/// Convert a three value pose argument, structopt guarantees the count.
fn pose_from_arg(values: &[f64]) -> Pose2 {
    Pose2::from([values[0], values[1], values[2]])
}

/// Read a JSON list of [x, y] points.
fn read_points(path: &Path) -> Result<PointCloud, Report> {
    let points_str = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Could not read {:?}", path))?;

    serde_json::from_str(&points_str).wrap_err_with(|| format!("Could not parse {:?}", path))
}
