//! `abm-model` — transition rules and supporting laws for the `rust_abm`
//! framework.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                |
//! |----------------|---------------------------------------------------------|
//! | [`waiting`]    | `WaitingTime` trait, `Exponential`, `GammaLaw`          |
//! | [`transition`] | `Spontaneous` and `ContactRule` transition rules        |
//! | [`mixing`]     | `RandomMixing` contact pattern                          |
//! | [`error`]      | `ModelError`, `ModelResult`                             |
//!
//! # Quick-start — an SIR epidemic
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use abm_core::{Pattern, State};
//! use abm_engine::{shared, Counter, Logger, Simulation};
//! use abm_model::{ContactRule, Exponential, RandomMixing, Spontaneous};
//!
//! let mut sim = Simulation::with_initializer(100, |i| {
//!     State::of("status", if i == 0 { "I" } else { "S" })
//! });
//! let root = sim.root();
//! let mixing = shared(RandomMixing::new(7));
//! sim.add_contact(root, mixing.clone()).unwrap();
//!
//! sim.add_transition(Rc::new(ContactRule::new(
//!     Pattern::of("status", "I"), Pattern::of("status", "S"),
//!     State::of("status", "I"),  State::of("status", "I"),
//!     mixing, Exponential::new(0.3)?,
//! )));
//! sim.add_transition(Rc::new(Spontaneous::new(
//!     Pattern::of("status", "I"), State::of("status", "R"),
//!     Exponential::new(0.1)?,
//! )));
//! sim.add_logger(Counter::occupancy("I", Pattern::of("status", "I")).shared());
//!
//! let times: Vec<f64> = (0..=20).map(f64::from).collect();
//! let result = sim.run(&times);
//! ```

pub mod error;
pub mod mixing;
pub mod transition;
pub mod waiting;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{ModelError, ModelResult};
pub use mixing::RandomMixing;
pub use transition::{ContactRule, Spontaneous};
pub use waiting::{get_waiting_time, Exponential, GammaLaw, WaitingTime};
