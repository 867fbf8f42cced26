//! The leaf-event capability and event-facing `Simulation` methods.

use abm_core::{AgentId, EventId, Time};

use crate::arena::{Body, Node};
use crate::error::{EngineError, EngineResult};
use crate::Simulation;

/// A scheduled unit of work.
///
/// The handler runs after the event has been popped from its calendar, so
/// the event is detached while `handle` executes and `agent` carries the
/// identity the calendar chain descended through (the agent the event is
/// semantically associated with).  Returning `true` asks the parent calendar
/// to reinsert the event — re-time it first with
/// [`Simulation::retime_event`], or it fires again at the same instant.
/// Returning `false` releases the event unless the handler scheduled it
/// somewhere itself.
///
/// A handler may freely call back into the simulation: schedule or cancel
/// events on any agent, change states, even remove agents.  The calendar
/// tree is consistent at every point a handler can observe it.
pub trait EventHandler {
    fn handle(&mut self, sim: &mut Simulation, event: EventId, agent: AgentId) -> bool;
}

impl<F> EventHandler for F
where
    F: FnMut(&mut Simulation, EventId, AgentId) -> bool,
{
    fn handle(&mut self, sim: &mut Simulation, event: EventId, agent: AgentId) -> bool {
        self(sim, event, agent)
    }
}

impl Simulation {
    /// Create a detached event with an explicit handler.
    ///
    /// The event does nothing until scheduled on an agent (or other
    /// calendar) with [`Simulation::schedule`].
    pub fn create_event(
        &mut self,
        time: Time,
        handler: impl EventHandler + 'static,
    ) -> EventId {
        self.arena.alloc(Node::leaf(time, Box::new(handler)))
    }

    /// Create a detached one-shot event from a plain action.
    ///
    /// The action receives the simulation and the agent the event fired on;
    /// the event is released after it runs.
    pub fn create_timeout(
        &mut self,
        time: Time,
        mut action: impl FnMut(&mut Simulation, AgentId) + 'static,
    ) -> EventId {
        self.create_event(time, move |sim: &mut Simulation, _ev: EventId, agent: AgentId| {
            action(sim, agent);
            false
        })
    }

    /// The scheduled time of an event.
    pub fn event_time(&self, event: EventId) -> EngineResult<Time> {
        self.arena
            .get(event)
            .map(|n| n.time)
            .ok_or(EngineError::StaleEvent(event))
    }

    /// Re-time a detached event (e.g. from its own handler, before
    /// returning `true` to be reinserted).
    ///
    /// Fails with [`EngineError::StillScheduled`] while the event sits in a
    /// calendar — unschedule it first, or let it pop.
    pub fn retime_event(&mut self, event: EventId, time: Time) -> EngineResult<()> {
        let node = self
            .arena
            .get_mut(event)
            .ok_or(EngineError::StaleEvent(event))?;
        if !node.is_detached() {
            return Err(EngineError::StillScheduled(event));
        }
        node.time = time;
        Ok(())
    }

    /// Release a detached leaf event without running it.
    ///
    /// A cancelled event ([`Simulation::unschedule`]) stays alive so it can
    /// be rescheduled; call this when it is no longer wanted.  Stale handles
    /// and non-leaf nodes are a no-op.
    pub fn release_event(&mut self, event: EventId) {
        if let Some(node) = self.arena.get(event) {
            if node.is_detached() && matches!(node.body, Body::Leaf(_)) {
                self.arena.free(event);
            }
        }
    }
}
