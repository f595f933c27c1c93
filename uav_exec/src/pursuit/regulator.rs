//! # Axis regulator
//!
//! A single-axis feedback regulator converting a filtered deviation into a
//! clamped motion demand. The same type is instantiated twice, once for the
//! yaw-rate axis and once for the forward-speed axis, with distinct gains and
//! clamp limits.
//!
//! The setpoint is fixed at zero: the regulator always drives the deviation
//! it is fed towards zero. The raw PID output is clamped to the configured
//! symmetric limit and then negated, the negation is a fixed part of the
//! contract, a positive deviation (target to the right, or farther away than
//! the standoff) must produce a demand in the corrective direction.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use std::time::Instant;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gain triple for one regulated axis.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct AxisGains {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,
}

/// A single-axis regulator with a clamped, sign-inverted output.
#[derive(Debug, Clone)]
pub struct AxisRegulator {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Derivative gain
    k_d: f64,

    /// Symmetric output clamp, the demand always lies in
    /// `[-output_limit, output_limit]`.
    output_limit: f64,

    /// Previous instant that a deviation was passed in
    prev_time: Option<Instant>,

    /// Previous deviation
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Regulation algorithm selection.
///
/// `Proportional` keeps the configured proportional gain but zeroes the
/// integral and derivative terms, this is the "simple" algorithm of the
/// process-level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegMode {
    Pid,
    Proportional,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AxisRegulator {
    /// Create a new regulator from the given gains, mode and clamp limit.
    pub fn new(gains: &AxisGains, mode: RegMode, output_limit: f64) -> Self {
        let (k_i, k_d) = match mode {
            RegMode::Pid => (gains.k_i, gains.k_d),
            RegMode::Proportional => (0.0, 0.0),
        };

        Self {
            k_p: gains.k_p,
            k_i,
            k_d,
            output_limit,
            prev_time: None,
            prev_error: None,
            integral: 0f64,
        }
    }

    /// Drive the regulator with the given deviation, returning the demand.
    ///
    /// This function is time-aware so there is no need to pass in a
    /// delta-time value. On the first call there is no time base, so the
    /// integral and derivative terms contribute nothing.
    pub fn update(&mut self, error: f64) -> f64 {
        let curr_time = Instant::now();

        let dt = self
            .prev_time
            .map(|t0| (curr_time - t0).as_secs_f64());

        // Accumulate the integral term.
        //
        // If there's no time difference then we don't accumulate the
        // integral. The other option is to add on the error, and that would
        // produce a large spike in integral compared to normal operation.
        if let Some(t) = dt {
            self.integral += error * t;
        }

        // Calculate the derivative, again assuming no derivative when there
        // is no time base.
        let deriv = match (self.prev_error, dt) {
            (Some(e), Some(t)) => (error - e) / t,
            (None, Some(t)) => error / t,
            _ => 0f64,
        };

        let out = self.k_p * error + self.k_i * self.integral + self.k_d * deriv;

        self.prev_error = Some(error);
        self.prev_time = Some(curr_time);

        // Clamp then invert, see the module docs for the sign contract
        -out.clamp(-self.output_limit, self.output_limit)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn gains(k_p: f64) -> AxisGains {
        AxisGains {
            k_p,
            k_i: 0.5,
            k_d: 0.1,
        }
    }

    #[test]
    fn test_sign_inversion() {
        let mut reg = AxisRegulator::new(&gains(0.2), RegMode::Proportional, 3.0);

        // Positive deviation of 0.5 with k_p 0.2 gives a raw output of 0.1,
        // inverted to -0.1
        let out = reg.update(0.5);
        assert!((out - (-0.1)).abs() < 1e-12);

        // Negative deviation inverts the other way
        let out = reg.update(-0.5);
        assert!((out - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_output_clamped_at_saturation() {
        let mut reg = AxisRegulator::new(&gains(1.0), RegMode::Proportional, 20.0);

        assert_eq!(reg.update(20.0), -20.0);
        assert_eq!(reg.update(1e9), -20.0);
        assert_eq!(reg.update(-1e9), 20.0);
    }

    #[test]
    fn test_output_always_within_clamp() {
        let mut reg = AxisRegulator::new(&gains(0.6), RegMode::Pid, 20.0);

        for e in &[-1e6, -500.0, -20.0, 0.0, 0.1, 33.3, 1e6] {
            let out = reg.update(*e);
            assert!(out.abs() <= 20.0, "output {} exceeds clamp", out);
        }
    }

    #[test]
    fn test_proportional_mode_zeroes_i_and_d() {
        let mut pid = AxisRegulator::new(&gains(0.2), RegMode::Proportional, 3.0);

        // Several updates with a constant error, a live integral term would
        // grow the output, proportional mode must not
        let first = pid.update(1.0);
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = pid.update(1.0);

        assert_eq!(first, second);
    }

    #[test]
    fn test_first_update_is_pure_proportional() {
        // Even in full PID mode the first update has no time base, so only
        // the proportional term contributes
        let mut reg = AxisRegulator::new(&gains(0.6), RegMode::Pid, 20.0);

        let out = reg.update(10.0);
        assert!((out - (-6.0)).abs() < 1e-12);
    }

    #[test]
    fn test_zero_deviation_gives_zero_demand() {
        let mut reg = AxisRegulator::new(&gains(0.6), RegMode::Proportional, 20.0);

        assert_eq!(reg.update(0.0), 0.0);
    }
}
