//! The contact-pattern capability.
//!
//! A contact pattern answers "who are `agent`'s neighbors at time `t`?" for
//! one population.  Concrete constructions (random mixing, contact
//! networks) live outside the engine; the engine only drives the four
//! hooks below.

use std::cell::RefCell;
use std::rc::Rc;

use abm_core::{AgentId, PopulationId, Time};

use crate::Simulation;

/// Shared handle to a contact pattern.  The population's pattern list and
/// any contact rules referencing the pattern hold the same `Rc`.
pub type SharedContact = Rc<RefCell<dyn ContactPattern>>;

/// A population's contact structure.
///
/// Membership hooks fire as agents come and go; [`attach`] fires once per
/// run, immediately before the first step, when every agent is present —
/// the place to build structures (like configuration-model networks) that
/// cannot grow one agent at a time.  Implementations must tolerate repeated
/// `attach` calls.
///
/// [`attach`]: ContactPattern::attach
pub trait ContactPattern {
    /// An agent joined the population.
    fn add_agent(&mut self, _agent: AgentId) {}

    /// An agent left the population.
    fn remove_agent(&mut self, _agent: AgentId) {}

    /// Finalize against the population, all members present.
    fn attach(&mut self, sim: &Simulation, population: PopulationId);

    /// The neighbors of `agent` at `time`, in order.  May be empty.  The
    /// returned handles are only guaranteed to resolve until the next
    /// scheduler event.
    fn contact(&mut self, sim: &Simulation, time: Time, agent: AgentId) -> Vec<AgentId>;
}

/// Wrap a pattern for sharing between a population and contact rules.
pub fn shared<C: ContactPattern + 'static>(contact: C) -> SharedContact {
    Rc::new(RefCell::new(contact))
}
