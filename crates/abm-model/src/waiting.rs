//! Waiting-time laws: samplers of the delay until a rule fires.
//!
//! A waiting time is a *delay* from the current time, never an absolute
//! time; the rule adds it to "now" when scheduling.  A sample of `+∞` means
//! "never" and suppresses the event entirely, which is how a zero-rate
//! exponential disables a transition without a special case anywhere else.

use abm_core::{SimRng, Time};
use rand_distr::{Distribution, Gamma};

use crate::error::{ModelError, ModelResult};

/// A sampler of non-negative delays.
///
/// Plain closures `Fn(Time, &mut SimRng) -> f64` implement this, so a test
/// can pass `|_, _| 1.0` as a deterministic law.
pub trait WaitingTime {
    /// Sample the delay from `time` until the transition occurs.
    fn waiting_time(&self, time: Time, rng: &mut SimRng) -> f64;
}

impl<F> WaitingTime for F
where
    F: Fn(Time, &mut SimRng) -> f64,
{
    fn waiting_time(&self, time: Time, rng: &mut SimRng) -> f64 {
        self(time, rng)
    }
}

/// Sample a law directly; for tests and calibration scripts.
pub fn get_waiting_time(law: &dyn WaitingTime, time: Time, rng: &mut SimRng) -> f64 {
    law.waiting_time(time, rng)
}

// ── Exponential ───────────────────────────────────────────────────────────────

/// Exponentially distributed delays with the given rate.
///
/// A rate of zero yields `+∞` — the transition never fires.  Negative rates
/// are refused at construction.
pub struct Exponential {
    rate: f64,
}

impl Exponential {
    pub fn new(rate: f64) -> ModelResult<Exponential> {
        if rate < 0.0 || rate.is_nan() {
            return Err(ModelError::InvalidRate(rate));
        }
        Ok(Exponential { rate })
    }
}

impl WaitingTime for Exponential {
    fn waiting_time(&self, _time: Time, rng: &mut SimRng) -> f64 {
        if self.rate == 0.0 {
            return f64::INFINITY;
        }
        // Inverse-transform sample: u ∈ [0, 1) keeps the argument positive.
        let u: f64 = rng.random();
        -(1.0 - u).ln() / self.rate
    }
}

// ── Gamma ─────────────────────────────────────────────────────────────────────

/// Gamma distributed delays with the given shape and scale (1/rate).
pub struct GammaLaw {
    dist: Gamma<f64>,
}

impl GammaLaw {
    pub fn new(shape: f64, scale: f64) -> ModelResult<GammaLaw> {
        Gamma::new(shape, scale)
            .map(|dist| GammaLaw { dist })
            .map_err(|_| ModelError::InvalidGamma { shape, scale })
    }
}

impl WaitingTime for GammaLaw {
    fn waiting_time(&self, _time: Time, rng: &mut SimRng) -> f64 {
        self.dist.sample(rng.inner())
    }
}
