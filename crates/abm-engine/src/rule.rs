//! The transition-rule capability.
//!
//! Rules are activated with edge-trigger semantics: on every state change
//! the simulation compares the previous and current state against each
//! rule's source pattern, and schedules the rule exactly when the agent
//! *entered* the source state — matching now but not before.  Re-entries
//! require a prior exit, so one entry yields one scheduling.

use std::rc::Rc;

use abm_core::{AgentId, Pattern, Time};

use crate::Simulation;

/// Shared handle under which rules are registered.
pub type SharedRule = Rc<dyn TransitionRule>;

/// A rule that turns state entries into future events.
///
/// Implementations are immutable after construction; scheduling draws
/// randomness from the simulation's RNG and places events through the
/// normal scheduling API.
pub trait TransitionRule {
    /// The source pattern whose entry activates the rule.
    fn from(&self) -> &Pattern;

    /// The agent just entered the source state at `time`: schedule whatever
    /// future event the rule calls for.
    ///
    /// Takes `Rc<Self>` so the scheduled event can keep the rule alive and
    /// re-consult it (patterns, predicates) when it fires.
    fn schedule(self: Rc<Self>, sim: &mut Simulation, time: Time, agent: AgentId);
}
