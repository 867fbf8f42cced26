//! Populations: calendars whose children are their member agents.
//!
//! A population is itself an agent (populations nest), so its node body
//! embeds an [`AgentCore`].  Beyond that it keeps the member vector — the
//! position of an agent in it *is* the agent's `index` — and the ordered
//! list of contact patterns attached to it.
//!
//! Removal swaps the departing agent with the last member and truncates, so
//! `members[a.index] == a` holds for every member at every instant.

use abm_core::{AgentId, PopulationId, State, Time};
use log::debug;

use crate::agent::AgentCore;
use crate::arena::{Body, Node};
use crate::calendar;
use crate::contact::{ContactPattern, SharedContact};
use crate::error::{EngineError, EngineResult};
use crate::Simulation;

// ── PopulationCore ────────────────────────────────────────────────────────────

pub(crate) struct PopulationCore {
    pub agent: AgentCore,
    pub members: Vec<AgentId>,
    pub contacts: Vec<SharedContact>,
}

impl PopulationCore {
    pub(crate) fn new() -> PopulationCore {
        PopulationCore {
            agent: AgentCore::new(State::new()),
            members: Vec::new(),
            contacts: Vec::new(),
        }
    }
}

// ── Population-facing Simulation methods ──────────────────────────────────────

impl Simulation {
    /// Create a detached, empty population.
    ///
    /// Add it to another population (or the simulation root) like any other
    /// agent; its members travel with it.
    pub fn create_population(&mut self) -> PopulationId {
        let ev = self
            .arena
            .alloc(Node::with_body(Time::NEVER, Body::Population(PopulationCore::new())));
        let pop = PopulationId::issue(ev.index, ev.generation);
        self.init_contact_calendar(pop.into());
        pop
    }

    /// Add `agent` to `pop`.
    ///
    /// Adding a member of `pop` again is a no-op; an agent belonging to a
    /// *different* population is refused.  The arrival is reported as a
    /// state change from the empty state, contact patterns get their
    /// membership hook, and — if `pop` hangs off the simulation root — the
    /// agent receives its simulation-unique id.
    pub fn add(&mut self, pop: PopulationId, agent: AgentId) -> EngineResult<()> {
        match self.population_of(agent) {
            Some(p) if p == pop => return Ok(()),
            Some(_) => return Err(EngineError::AlreadyMember(agent)),
            None => {}
        }

        let index = self.population_core(pop)?.members.len() as u32;
        {
            let core = self.agent_core_mut(agent)?;
            core.population = pop;
            core.index = index;
        }
        self.population_core_mut(pop)?.members.push(agent);
        calendar::attach(&mut self.arena, pop.into(), agent.into())?;

        // Arrival is a state change from the empty state, so occupancy
        // counters see the agent appear.
        self.state_changed(agent, &State::new());

        let contacts = self.population_core(pop)?.contacts.clone();
        for contact in contacts {
            contact.borrow_mut().add_agent(agent);
        }

        if self.agent_core(agent)?.id == 0 && self.is_attached(pop.into()) {
            self.assign_ids(agent);
        }
        Ok(())
    }

    /// Remove `agent` from its population and return it.
    ///
    /// Contact patterns get their removal hook, the agent's contact
    /// sub-calendar is emptied, and the last member is swapped into the
    /// vacated index.
    pub fn remove(&mut self, agent: AgentId) -> EngineResult<AgentId> {
        let pop = self
            .population_of(agent)
            .ok_or(EngineError::NotInPopulation(agent))?;

        let contacts = self.population_core(pop)?.contacts.clone();
        for contact in contacts {
            contact.borrow_mut().remove_agent(agent);
        }

        let sub = self.contact_events(agent)?;
        calendar::clear(&mut self.arena, sub)?;

        let index = {
            let core = self.agent_core_mut(agent)?;
            core.population = PopulationId::INVALID;
            std::mem::replace(&mut core.index, 0) as usize
        };
        let members = &mut self.population_core_mut(pop)?.members;
        debug_assert_eq!(members[index], agent);
        members.swap_remove(index);
        if let Some(&moved) = members.get(index) {
            self.agent_core_mut(moved)?.index = index as u32;
        }

        calendar::detach(&mut self.arena, agent.into());
        debug!("removed agent {agent} from {pop}");
        Ok(agent)
    }

    /// Attach a contact pattern to `pop` and feed it the current members.
    pub fn add_contact(&mut self, pop: PopulationId, contact: SharedContact) -> EngineResult<()> {
        self.population_core_mut(pop)?.contacts.push(contact.clone());
        let members = self.population_core(pop)?.members.clone();
        let mut c = contact.borrow_mut();
        for agent in members {
            c.add_agent(agent);
        }
        Ok(())
    }

    /// Number of member agents.
    pub fn size(&self, pop: PopulationId) -> EngineResult<usize> {
        self.population_core(pop).map(|p| p.members.len())
    }

    /// The member at `index` (the agent's own `index` value).
    pub fn agent_at(&self, pop: PopulationId, index: usize) -> EngineResult<AgentId> {
        let members = &self.population_core(pop)?.members;
        members
            .get(index)
            .copied()
            .ok_or(EngineError::OutOfRange { index, len: members.len() })
    }

    /// All members, in index order.
    pub fn members(&self, pop: PopulationId) -> EngineResult<&[AgentId]> {
        self.population_core(pop).map(|p| p.members.as_slice())
    }

    /// Re-initialize every member's state from a function of its index.
    pub fn initialize(
        &mut self,
        pop: PopulationId,
        init: impl Fn(usize) -> State,
    ) -> EngineResult<()> {
        let members = self.population_core(pop)?.members.clone();
        for (i, agent) in members.into_iter().enumerate() {
            self.set_state(agent, init(i))?;
        }
        Ok(())
    }

    /// Report the population's state downward: finalize contact patterns,
    /// emit the population's own arrival, then every member's, recursively.
    pub(crate) fn report_population(&mut self, pop: PopulationId) {
        let Ok(core) = self.population_core(pop) else { return };
        let contacts = core.contacts.clone();
        for contact in contacts {
            contact.borrow_mut().attach(self, pop);
        }
        self.state_changed(pop.into(), &State::new());
        let Ok(core) = self.population_core(pop) else { return };
        for agent in core.members.clone() {
            match self.arena.get(agent).map(|n| n.body.population().is_some()) {
                Some(true) => {
                    self.report_population(PopulationId::issue(agent.index, agent.generation));
                }
                Some(false) => self.state_changed(agent, &State::new()),
                None => {}
            }
        }
    }

    /// Assign simulation ids to an agent — and, for a population, to its
    /// members, recursively.
    pub(crate) fn assign_ids(&mut self, agent: AgentId) {
        if self.agent_core(agent).map(|c| c.id == 0).unwrap_or(false) {
            let id = self.next_id();
            if let Ok(core) = self.agent_core_mut(agent) {
                core.id = id;
            }
        }
        if let Some(members) = self
            .arena
            .get(agent)
            .and_then(|n| n.body.population())
            .map(|p| p.members.clone())
        {
            for member in members {
                self.assign_ids(member);
            }
        }
    }

    // ── Internal accessors ────────────────────────────────────────────────

    pub(crate) fn population_core(&self, pop: PopulationId) -> EngineResult<&PopulationCore> {
        let node = self
            .arena
            .get(pop)
            .ok_or(EngineError::StaleEvent(pop.into()))?;
        node.body
            .population()
            .ok_or(EngineError::NotAPopulation(pop.into()))
    }

    pub(crate) fn population_core_mut(
        &mut self,
        pop: PopulationId,
    ) -> EngineResult<&mut PopulationCore> {
        let node = self
            .arena
            .get_mut(pop)
            .ok_or(EngineError::StaleEvent(pop.into()))?;
        node.body
            .population_mut()
            .ok_or(EngineError::NotAPopulation(pop.into()))
    }
}
