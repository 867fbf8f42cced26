//! Agents: calendars that carry a state.
//!
//! An agent is an event (its own earliest sub-event), a calendar (its queue
//! of pending events), and a bag of state.  Every agent also owns a contact
//! sub-calendar — a single child of the agent holding the events its contact
//! rules keep re-arming — created with the agent and attached to it for the
//! agent's whole life.
//!
//! All operations are handle-based methods on [`Simulation`]; the agent
//! node itself never leaves the arena.

use std::any::Any;

use abm_core::{AgentId, EventId, Pattern, PopulationId, State, Time};

use crate::arena::{Body, Node};
use crate::calendar::{self, CalendarCore};
use crate::error::{EngineError, EngineResult};
use crate::Simulation;

// ── AgentCore ─────────────────────────────────────────────────────────────────

pub(crate) struct AgentCore {
    pub calendar: CalendarCore,
    pub state: State,
    /// The contact sub-calendar, always a child of this agent.
    pub contact_events: EventId,
    /// Containing population; `INVALID` outside any population.
    pub population: PopulationId,
    /// Simulation-unique id, assigned on first attachment; 0 = never attached.
    pub id: u64,
    /// Position in the containing population's member vector.
    pub index: u32,
    /// Typed per-agent storage slots, indexed by registry handle.
    pub storage: Vec<Option<Box<dyn Any>>>,
}

impl AgentCore {
    pub(crate) fn new(state: State) -> AgentCore {
        AgentCore {
            calendar: CalendarCore::new(),
            state,
            contact_events: EventId::INVALID,
            population: PopulationId::INVALID,
            id: 0,
            index: 0,
            storage: Vec::new(),
        }
    }
}

// ── Agent-facing Simulation methods ───────────────────────────────────────────

impl Simulation {
    /// Create a detached agent with an empty state.
    pub fn create_agent(&mut self) -> AgentId {
        self.create_agent_with(State::new())
    }

    /// Create a detached agent with the given initial state.
    ///
    /// The agent's contact sub-calendar is created alongside it and
    /// scheduled on the agent immediately.
    pub fn create_agent_with(&mut self, state: State) -> AgentId {
        let ev = self
            .arena
            .alloc(Node::with_body(Time::NEVER, Body::Agent(AgentCore::new(state))));
        let agent = AgentId::issue(ev.index, ev.generation);
        self.init_contact_calendar(agent);
        agent
    }

    /// Create the contact sub-calendar for a freshly allocated agent-like
    /// node and attach it.  Shared with population construction.
    pub(crate) fn init_contact_calendar(&mut self, agent: AgentId) {
        let sub = self
            .arena
            .alloc(Node::with_body(Time::NEVER, Body::Calendar(CalendarCore::new())));
        self.agent_core_mut(agent)
            .expect("freshly allocated agent")
            .contact_events = sub;
        calendar::attach(&mut self.arena, agent.into(), sub).expect("fresh agent is a calendar");
    }

    /// The agent's current state.
    pub fn state(&self, agent: AgentId) -> EngineResult<&State> {
        self.agent_core(agent).map(|a| &a.state)
    }

    /// `true` iff the agent's state matches `pattern`.  Stale handles match
    /// nothing.
    pub fn matches(&self, agent: AgentId, pattern: &Pattern) -> bool {
        self.state(agent).map(|s| s.matches(pattern)).unwrap_or(false)
    }

    /// Merge `patch` into the agent's state and notify loggers and
    /// transition rules of the change.
    pub fn set_state(&mut self, agent: AgentId, patch: State) -> EngineResult<()> {
        let core = self.agent_core_mut(agent)?;
        let from = core.state.clone();
        core.state.merge(&patch);
        self.state_changed(agent, &from);
        Ok(())
    }

    /// Schedule `event` on `target` (an agent or any calendar).  The event
    /// is detached from its current owner first.
    pub fn schedule(&mut self, target: impl Into<EventId>, event: EventId) -> EngineResult<()> {
        calendar::attach(&mut self.arena, target.into(), event)
    }

    /// Cancel `event` if — and only if — it is currently scheduled in
    /// `target`.  Anything else (detached, stale, scheduled elsewhere) is a
    /// silent no-op.  The event stays alive for rescheduling.
    pub fn unschedule(&mut self, target: impl Into<EventId>, event: EventId) -> EngineResult<()> {
        let target = target.into();
        match self.arena.get(event) {
            Some(node) if node.owner == target => {
                calendar::detach(&mut self.arena, event);
            }
            _ => {}
        }
        Ok(())
    }

    /// Drop every pending event of `target`.
    ///
    /// Detached leaf events are released.  On an agent the contact
    /// sub-calendar is emptied as well, then re-attached, so it remains the
    /// agent's child.
    pub fn clear_events(&mut self, target: impl Into<EventId>) -> EngineResult<()> {
        let target = target.into();
        calendar::clear(&mut self.arena, target)?;
        if let Some(core) = self.arena.get(target).and_then(|n| n.body.agent()) {
            let sub = core.contact_events;
            calendar::clear(&mut self.arena, sub)?;
            calendar::attach(&mut self.arena, target, sub)?;
        }
        Ok(())
    }

    /// The agent's contact sub-calendar, for contact rules to schedule
    /// their events on.
    pub fn contact_events(&self, agent: AgentId) -> EngineResult<EventId> {
        self.agent_core(agent).map(|a| a.contact_events)
    }

    /// The agent's simulation-unique id; 0 until first attached.
    pub fn agent_id(&self, agent: AgentId) -> EngineResult<u64> {
        self.agent_core(agent).map(|a| a.id)
    }

    /// The agent's index within its population.
    pub fn agent_index(&self, agent: AgentId) -> EngineResult<usize> {
        self.agent_core(agent).map(|a| a.index as usize)
    }

    /// The population the agent belongs to, if any.
    pub fn population_of(&self, agent: AgentId) -> Option<PopulationId> {
        self.agent_core(agent)
            .ok()
            .map(|a| a.population)
            .filter(|p| p.is_valid())
    }

    /// Remove the agent from its population.
    ///
    /// The state is emptied and a final change emitted first — so loggers
    /// observe the departure — then restored on the departed agent, which is
    /// returned for reuse.
    pub fn leave(&mut self, agent: AgentId) -> EngineResult<AgentId> {
        if self.population_of(agent).is_none() {
            return Err(EngineError::NotInPopulation(agent));
        }
        let core = self.agent_core_mut(agent)?;
        let save = std::mem::take(&mut core.state);
        self.state_changed(agent, &save);
        self.remove(agent)?;
        self.agent_core_mut(agent)?.state = save;
        Ok(agent)
    }

    /// Schedule the agent's departure: at `time` the agent leaves its
    /// population.  Returns the death event so it can be cancelled.
    pub fn set_death_time(&mut self, agent: AgentId, time: Time) -> EngineResult<EventId> {
        let ev = self.create_timeout(time, |sim, agent| {
            // Already-departed agents are fine; the event just expires.
            let _ = sim.leave(agent);
        });
        self.schedule(agent, ev)?;
        Ok(ev)
    }

    /// Free a departed agent's nodes (its calendar, contact sub-calendar,
    /// pending events and typed storage).
    ///
    /// Fails while the agent is still a member of a population — call
    /// [`Simulation::leave`] first.
    pub fn release(&mut self, agent: AgentId) -> EngineResult<()> {
        if self.population_of(agent).is_some() {
            return Err(EngineError::StillMember(agent));
        }
        self.clear_events(agent)?;
        let sub = self.contact_events(agent)?;
        calendar::detach(&mut self.arena, sub);
        calendar::detach(&mut self.arena, agent.into());
        self.arena.free(sub);
        self.arena.free(agent.into());
        Ok(())
    }

    // ── Internal accessors ────────────────────────────────────────────────

    pub(crate) fn agent_core(&self, agent: AgentId) -> EngineResult<&AgentCore> {
        let node = self
            .arena
            .get(agent)
            .ok_or(EngineError::StaleEvent(agent.into()))?;
        node.body.agent().ok_or(EngineError::NotAnAgent(agent.into()))
    }

    pub(crate) fn agent_core_mut(&mut self, agent: AgentId) -> EngineResult<&mut AgentCore> {
        let node = self
            .arena
            .get_mut(agent)
            .ok_or(EngineError::StaleEvent(agent.into()))?;
        node.body
            .agent_mut()
            .ok_or(EngineError::NotAnAgent(agent.into()))
    }
}
