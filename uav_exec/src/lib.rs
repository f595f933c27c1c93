//! # UAV pursuit library
//!
//! Library backing the `uav_exec` executable. The mission manager
//! ([`mission::MissionMgr`]) owns the flight as a linear phase machine, with
//! the pursuit controller ([`pursuit::PursuitCtrl`]) doing the per-tick
//! regulation work during the Pursue phase. Equipment sits behind the traits
//! in `eqpt_if`, with simulated implementations in [`sim_eqpt`] so the whole
//! mission can run on a desk.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod cancel;
pub mod mission;
pub mod pursuit;
pub mod sim_eqpt;

#[cfg(test)]
pub(crate) mod test_eqpt;
