//! `abm-core` — foundational types for the `rust_abm` agent-based
//! simulation framework.
//!
//! This crate is a dependency of every other `abm-*` crate.  It intentionally
//! has no `abm-*` dependencies and minimal external ones (only `rand`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                              |
//! |-------------|-------------------------------------------------------|
//! | [`ids`]     | `EventId`, `AgentId`, `PopulationId` handles          |
//! | [`time`]    | `Time` — totally ordered f64 time with `NEVER` (+∞)   |
//! | [`state`]   | `Value`, `State`, `Pattern` and the match predicate   |
//! | [`rng`]     | `SimRng` — deterministic simulation RNG               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to the plain-data types     |
//! |         | (`Time`, handles, `Value`, `State`).  `Pattern` carries    |
//! |         | closures and is never serializable.                        |

pub mod ids;
pub mod rng;
pub mod state;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use ids::{AgentId, EventId, PopulationId};
pub use rng::SimRng;
pub use state::{Matcher, Pattern, State, Value};
pub use time::Time;
