//! Main UAV pursuit executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logger and equipment
//!     - Main loop:
//!         - Step the mission manager (one tick of the active phase)
//!         - In simulated modes, advance the equipment models
//!         - Sleep out the remainder of the cycle
//!
//! The loop runs until the mission manager reports Terminated, which only
//! happens after the Descend phase has landed the vehicle and released the
//! equipment.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::info;
use std::str::FromStr;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use eqpt_if::ranging::TfLuna;
use uav_lib::{
    cancel::KeyboardCancel,
    mission::{MissionError, MissionMgr},
    pursuit::RegMode,
    sim_eqpt::{SimPercep, SimRanging, SimVehicle},
};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one control cycle.
const CYCLE_PERIOD_S: f64 = 0.05;

/// Range to the simulated target at startup in metres.
const SIM_INITIAL_RANGE_M: f64 = 4.0;

// ---------------------------------------------------------------------------
// COMMAND LINE
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "uav_exec", about = "UAV target pursuit executable")]
struct Opt {
    /// Equipment mode: "active" (serial rangefinder), "sim" (fully
    /// simulated) or "display" (simulated, with per-tick detail logging)
    #[structopt(short, long, default_value = "sim")]
    mode: Mode,

    /// Regulation algorithm: "pid" or "simple" (proportional only)
    #[structopt(short, long, default_value = "pid")]
    algorithm: Algorithm,

    /// Serial port of the rangefinder in active mode
    #[structopt(long, default_value = "/dev/ttyTHS1")]
    ranging_port: String,
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Active,
    Sim,
    Display,
}

#[derive(Debug, Clone, Copy)]
enum Algorithm {
    Pid,
    Simple,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Mode::Active),
            "sim" => Ok(Mode::Sim),
            "display" => Ok(Mode::Display),
            _ => Err(format!(
                "unknown mode {:?}, expected active, sim or display",
                s
            )),
        }
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pid" => Ok(Algorithm::Pid),
            "simple" => Ok(Algorithm::Simple),
            _ => Err(format!("unknown algorithm {:?}, expected pid or simple", s)),
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session =
        Session::new("uav_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger, noisier in display mode
    let level = match opt.mode {
        Mode::Display => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };
    logger_init(level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution
    info!("UAV Pursuit Executable\n");
    info!("Mode: {:?}, algorithm: {:?}", opt.mode, opt.algorithm);
    info!("Session directory: {:?}\n", session.session_root);

    let reg_mode = match opt.algorithm {
        Algorithm::Pid => RegMode::Pid,
        Algorithm::Simple => RegMode::Proportional,
    };

    // ---- EQUIPMENT AND MISSION INITIALISATION ----

    match opt.mode {
        Mode::Active => {
            let ranging = TfLuna::open(&opt.ranging_port)
                .wrap_err("Failed to open the rangefinder serial port")?;

            let mgr = MissionMgr::init(
                "mission.toml",
                "pursuit.toml",
                reg_mode,
                &session,
                SimPercep::new(),
                ranging,
                SimVehicle::new(),
                KeyboardCancel,
            )
            .wrap_err("Failed to initialise the mission manager")?;

            run(mgr, |_| ()).wrap_err("Mission aborted")?;
        }
        Mode::Sim | Mode::Display => {
            let mgr = MissionMgr::init(
                "mission.toml",
                "pursuit.toml",
                reg_mode,
                &session,
                SimPercep::new(),
                SimRanging::new(SIM_INITIAL_RANGE_M),
                SimVehicle::new(),
                KeyboardCancel,
            )
            .wrap_err("Failed to initialise the mission manager")?;

            // Couple the simulated rangefinder to the vehicle's commanded
            // motion so the standoff regulation has something to act on
            let mut last_tick = Instant::now();
            run(mgr, move |m| {
                let now = Instant::now();
                let cmd = m.persistent.vehicle.last_cmd();
                m.persistent.ranging.advance(&cmd, now - last_tick);
                last_tick = now;
            })
            .wrap_err("Mission aborted")?;
        }
    }

    info!("Execution complete");

    Ok(())
}

/// Run the mission to termination, pacing the loop at the cycle period.
///
/// `on_tick` runs after every step, it is how the simulated modes advance
/// their equipment models.
fn run<P, R, V, C>(
    mut mgr: MissionMgr<P, R, V, C>,
    mut on_tick: impl FnMut(&mut MissionMgr<P, R, V, C>),
) -> Result<(), MissionError>
where
    P: eqpt_if::percep::PercepSource,
    R: eqpt_if::ranging::RangingSensor,
    V: eqpt_if::vehicle::VehicleLink,
    C: uav_lib::cancel::CancelSource,
{
    let cycle_period = Duration::from_secs_f64(CYCLE_PERIOD_S);

    while !mgr.is_terminated() {
        let cycle_start = Instant::now();

        mgr.step()?;
        on_tick(&mut mgr);

        // Sleep out the rest of the cycle
        if let Some(remaining) = cycle_period.checked_sub(cycle_start.elapsed()) {
            thread::sleep(remaining);
        }
    }

    Ok(())
}
