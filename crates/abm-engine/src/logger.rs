//! State-change observers and the two stock implementations.
//!
//! Loggers turn the stream of state changes into one scalar per reporting
//! tick: the simulation calls [`Logger::log`] on every change and snapshots
//! [`Logger::report`] into the run's result table at each requested time.

use std::cell::RefCell;
use std::rc::Rc;

use abm_core::{AgentId, Pattern, State, Value};

use crate::Simulation;

/// Shared handle under which loggers are registered.
pub type SharedLogger = Rc<RefCell<dyn Logger>>;

/// A state-change observer producing a time series.
pub trait Logger {
    /// Column name in the run result.
    fn name(&self) -> &str;

    /// An agent's state just changed from `from` to its current state.
    fn log(&mut self, sim: &Simulation, agent: AgentId, from: &State);

    /// The current scalar.  Whether this resets internal state is up to the
    /// logger (see [`Counter`]).
    fn report(&mut self) -> f64;

    /// Wrap for registration with [`Simulation::add_logger`].
    fn shared(self) -> SharedLogger
    where
        Self: Sized + 'static,
    {
        Rc::new(RefCell::new(self))
    }
}

// ── Counter ───────────────────────────────────────────────────────────────────

/// Counts agents in a state, or transitions between states.
///
/// *Occupancy mode* (no `to`): the running number of agents whose state
/// matches the pattern — decremented when an agent's previous state
/// matched, incremented when its new state does.  `report` does not reset.
///
/// *Transition mode* (`to` present): the number of observed changes whose
/// previous state matched `state` and whose new state matches `to`.
/// `report` returns the count **and resets it**, so each reporting interval
/// sees only its own transitions.
pub struct Counter {
    name: String,
    state: Pattern,
    to: Option<Pattern>,
    count: i64,
}

impl Counter {
    /// Occupancy counter: how many agents currently match `state`.
    pub fn occupancy(name: impl Into<String>, state: impl Into<Pattern>) -> Counter {
        Counter { name: name.into(), state: state.into(), to: None, count: 0 }
    }

    /// Transition counter: how many `state → to` changes since the last
    /// report.
    pub fn transitions(
        name: impl Into<String>,
        state: impl Into<Pattern>,
        to: impl Into<Pattern>,
    ) -> Counter {
        Counter {
            name: name.into(),
            state: state.into(),
            to: Some(to.into()),
            count: 0,
        }
    }

    /// Start counting from `initial` instead of zero.
    pub fn with_initial(mut self, initial: i64) -> Counter {
        self.count = initial;
        self
    }
}

impl Logger for Counter {
    fn name(&self) -> &str {
        &self.name
    }

    fn log(&mut self, sim: &Simulation, agent: AgentId, from: &State) {
        match &self.to {
            None => {
                if from.matches(&self.state) {
                    self.count -= 1;
                }
                if sim.matches(agent, &self.state) {
                    self.count += 1;
                }
            }
            Some(to) => {
                if from.matches(&self.state) && sim.matches(agent, to) {
                    self.count += 1;
                }
            }
        }
    }

    fn report(&mut self) -> f64 {
        let count = self.count;
        if self.to.is_some() {
            self.count = 0;
        }
        count as f64
    }
}

// ── StateLogger ───────────────────────────────────────────────────────────────

/// Tracks one numeric slot of one agent (or of whichever agent changed
/// last, when no agent is pinned) and reports its last observed value.
pub struct StateLogger {
    name: String,
    agent: Option<AgentId>,
    domain: String,
    value: f64,
}

impl StateLogger {
    /// Track `domain` of the agent whose state is currently changing.
    pub fn of_changing(name: impl Into<String>, domain: impl Into<String>) -> StateLogger {
        StateLogger {
            name: name.into(),
            agent: None,
            domain: domain.into(),
            value: f64::NAN,
        }
    }

    /// Track `domain` of one specific agent.
    pub fn of_agent(
        name: impl Into<String>,
        agent: AgentId,
        domain: impl Into<String>,
    ) -> StateLogger {
        StateLogger {
            name: name.into(),
            agent: Some(agent),
            domain: domain.into(),
            value: f64::NAN,
        }
    }
}

impl Logger for StateLogger {
    fn name(&self) -> &str {
        &self.name
    }

    fn log(&mut self, sim: &Simulation, agent: AgentId, _from: &State) {
        let target = self.agent.unwrap_or(agent);
        if let Ok(state) = sim.state(target) {
            if let Some(v) = state.get(&self.domain).and_then(Value::as_f64) {
                self.value = v;
            }
        }
    }

    fn report(&mut self) -> f64 {
        self.value
    }
}
