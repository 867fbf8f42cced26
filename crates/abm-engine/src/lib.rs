//! `abm-engine` — hierarchical event calendar and simulation loop for the
//! `rust_abm` framework.
//!
//! # The calendar tree
//!
//! Everything that can happen is an event, and events nest: an agent is an
//! event whose time is its earliest pending event, a population is an event
//! over its agents, and the simulation is the outermost calendar.  Finding
//! the globally earliest event is a walk down minimum children; keeping the
//! minimums consistent under insertion and removal is the calendar's
//! re-keying discipline (see [`calendar`]).
//!
//! # Crate layout
//!
//! | Module         | Contents                                               |
//! |----------------|--------------------------------------------------------|
//! | `arena`        | Generation-checked node storage (internal)             |
//! | `calendar`     | The nested priority queue and its re-key algorithms    |
//! | [`event`]      | `EventHandler` and event creation                      |
//! | `agent`        | Agent operations: state, scheduling, leave/death       |
//! | `population`   | Membership, contact-pattern wiring, reporting          |
//! | [`simulation`] | `Simulation`, `run`/`resume`, state-change fan-out     |
//! | [`logger`]     | `Logger` trait, `Counter`, `StateLogger`               |
//! | [`contact`]    | `ContactPattern` trait                                 |
//! | [`rule`]       | `TransitionRule` trait (edge-triggered activation)     |
//! | [`storage`]    | Typed per-agent storage with a name → handle registry  |
//! | [`error`]      | `EngineError`, `EngineResult`                          |
//!
//! # Concurrency
//!
//! The engine is single-threaded and cooperative: exactly one handler runs
//! at a time, runs to completion, and may re-enter the simulation freely.
//! Nothing here is `Send`; parallel runs are separate `Simulation` values.

mod agent;
mod arena;
mod calendar;
mod population;

pub mod contact;
pub mod error;
pub mod event;
pub mod logger;
pub mod rule;
pub mod simulation;
pub mod storage;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use contact::{shared, ContactPattern, SharedContact};
pub use error::{EngineError, EngineResult};
pub use event::EventHandler;
pub use logger::{Counter, Logger, SharedLogger, StateLogger};
pub use rule::{SharedRule, TransitionRule};
pub use simulation::{RunResult, Simulation};
pub use storage::{request_storage, Storage};
