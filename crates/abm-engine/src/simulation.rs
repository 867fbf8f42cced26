//! The `Simulation` struct and its event loop.
//!
//! The simulation *is* the root population: its children are the top-level
//! agents, each agent's children are that agent's pending events, and the
//! globally earliest event is found by walking minimum children down the
//! tree.  One step of the loop pops that leaf, runs its handler, and lets
//! state changes fan out to loggers and transition rules.
//!
//! ```text
//! resume(times):
//!   for t in times:
//!     while root.time() ≤ t:
//!       current_time = root.time()
//!       handle the root   (descends to the true earliest leaf)
//!     snapshot every logger into the column row for t
//! ```

use std::collections::BTreeMap;
use std::rc::Rc;

use abm_core::{AgentId, EventId, PopulationId, SimRng, State, Time};
use log::debug;

use crate::arena::{Arena, Body, Node};
use crate::calendar;
use crate::logger::{Logger, SharedLogger};
use crate::rule::{SharedRule, TransitionRule};

/// Seed used when the caller does not provide one.  Runs are deterministic
/// either way; reseed with [`Simulation::set_seed`] for replication studies.
const DEFAULT_SEED: u64 = 0x5eed_ab1e;

// ── Simulation ────────────────────────────────────────────────────────────────

/// The root population and entry point of a run.
pub struct Simulation {
    pub(crate) arena: Arena,
    root: PopulationId,
    loggers: Vec<SharedLogger>,
    rules: Vec<SharedRule>,
    /// Time of the handler currently executing; `None` before the first
    /// `run`.  State changes are only observed while this is set.
    current_time: Option<Time>,
    next_id: u64,
    rng: SimRng,
}

impl Simulation {
    /// A simulation with `n` empty-state agents.
    pub fn new(n: usize) -> Simulation {
        Simulation::with_initializer(n, |_| State::new())
    }

    /// A simulation with `n` agents whose states come from `init(i)`.
    pub fn with_initializer(n: usize, init: impl Fn(usize) -> State) -> Simulation {
        let mut sim = Simulation::empty();
        let root = sim.root;
        for i in 0..n {
            let agent = sim.create_agent_with(init(i));
            sim.add(root, agent).expect("fresh agent joins the root");
        }
        sim
    }

    /// A simulation with one agent per given state.
    pub fn from_states(states: Vec<State>) -> Simulation {
        let mut sim = Simulation::empty();
        let root = sim.root;
        for state in states {
            let agent = sim.create_agent_with(state);
            sim.add(root, agent).expect("fresh agent joins the root");
        }
        sim
    }

    fn empty() -> Simulation {
        let mut sim = Simulation {
            arena: Arena::new(),
            root: PopulationId::INVALID,
            loggers: Vec::new(),
            rules: Vec::new(),
            current_time: None,
            next_id: 0,
            rng: SimRng::new(DEFAULT_SEED),
        };
        sim.root = sim.create_population();
        sim
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// The root population.
    pub fn root(&self) -> PopulationId {
        self.root
    }

    /// Time of the earliest pending event anywhere; `NEVER` when idle.
    pub fn time(&self) -> Time {
        self.arena
            .get(self.root)
            .map(|n| n.time)
            .expect("the root outlives the simulation")
    }

    /// The time of the handler currently (or most recently) executing.
    /// `None` until `run` seeds it.
    pub fn now(&self) -> Option<Time> {
        self.current_time
    }

    /// The simulation RNG, for waiting-time laws and other model code.
    pub fn rng(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    /// Reseed the RNG (e.g. per replicate run).
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = SimRng::new(seed);
    }

    /// The next simulation-unique agent id.  The first id issued is 1, so
    /// 0 always means "never attached".
    pub fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    // ── Observers and rules ───────────────────────────────────────────────

    /// Append a logger.  Re-adding the same shared logger is ignored.
    /// Loggers observe every state change from the moment of insertion.
    pub fn add_logger(&mut self, logger: SharedLogger) {
        if self.loggers.iter().any(|l| Rc::ptr_eq(l, &logger)) {
            return;
        }
        self.loggers.push(logger);
    }

    /// Append a transition rule.  Re-adding the same shared rule is
    /// ignored.  Rules fire in insertion order.
    pub fn add_transition(&mut self, rule: SharedRule) {
        if self.rules.iter().any(|r| Rc::ptr_eq(r, &rule)) {
            return;
        }
        self.rules.push(rule);
    }

    // ── Running ───────────────────────────────────────────────────────────

    /// Run from a cold start: seed the clock to the earlier of the first
    /// reporting time and the first pending event, report the initial state
    /// to loggers and rules, then [`resume`](Simulation::resume).
    pub fn run(&mut self, times: &[f64]) -> RunResult {
        if !times.is_empty() {
            let start = self.time().min(Time::new(times[0]));
            self.current_time = Some(start);
            debug!("run: initial report at {start}");
            self.report_population(self.root);
        }
        self.resume(times)
    }

    /// Handle events up to each reporting time in turn, snapshotting every
    /// logger at each one.  Events scheduled exactly at a reporting time
    /// fire before the snapshot.
    pub fn resume(&mut self, times: &[f64]) -> RunResult {
        let n = times.len();
        let mut columns: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for logger in &self.loggers {
            columns
                .entry(logger.borrow().name().to_string())
                .or_insert_with(|| vec![0.0; n]);
        }

        for (i, &t) in times.iter().enumerate() {
            let until = Time::new(t);
            loop {
                let next = self.time();
                if next > until {
                    break;
                }
                self.current_time = Some(next);
                self.handle_node(self.root.into(), self.root.into());
            }
            for logger in self.loggers.clone() {
                let mut logger = logger.borrow_mut();
                if let Some(column) = columns.get_mut(logger.name()) {
                    column[i] = logger.report();
                }
            }
        }
        debug!("resume: processed {} reporting times", n);
        RunResult { times: times.to_vec(), columns }
    }

    // ── State-change fan-out ──────────────────────────────────────────────

    /// An agent's state changed from `from`.  Does nothing before the run
    /// starts or for agents not hanging off the root.  Loggers run first,
    /// in insertion order; then every rule whose source state the agent
    /// just *entered* is scheduled (edge trigger).
    pub(crate) fn state_changed(&mut self, agent: AgentId, from: &State) {
        let Some(now) = self.current_time else { return };
        if !self.is_attached(agent) {
            return;
        }
        let loggers = self.loggers.clone();
        for logger in &loggers {
            logger.borrow_mut().log(self, agent, from);
        }
        let rules = self.rules.clone();
        for rule in rules {
            if !from.matches(rule.from()) && self.matches(agent, rule.from()) {
                rule.schedule(self, now, agent);
            }
        }
    }

    /// `true` if `agent` is the root or reaches it through its population
    /// chain.
    pub(crate) fn is_attached(&self, agent: AgentId) -> bool {
        let root: AgentId = self.root.into();
        let mut current = agent;
        loop {
            if current == root {
                return true;
            }
            match self.agent_core(current).ok().map(|c| c.population) {
                Some(pop) if pop.is_valid() => current = pop.into(),
                _ => return false,
            }
        }
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    /// Handle one event node: descend through calendars to the earliest
    /// leaf, run it, and report whether the node wants to stay scheduled.
    pub(crate) fn handle_node(&mut self, ev: EventId, ctx: AgentId) -> bool {
        match self.arena.get(ev).map(|n| matches!(n.body, Body::Leaf(_))) {
            Some(true) => self.handle_leaf(ev, ctx),
            Some(false) => self.handle_calendar_node(ev, ctx),
            None => false,
        }
    }

    fn handle_calendar_node(&mut self, ev: EventId, outer: AgentId) -> bool {
        let node = self.arena.get(ev).expect("caller checked");
        // Descending through an agent substitutes it as the context the
        // leaf handler will receive.
        let ctx = if node.body.agent().is_some() {
            AgentId::issue(ev.index, ev.generation)
        } else {
            outer
        };
        let min_child = node.body.calendar().expect("calendar-like node").peek_min();

        if let Some(child) = min_child {
            calendar::detach(&mut self.arena, child);
            let keep = self.handle_node(child, ctx);
            if keep {
                let _ = self.schedule(ev, child);
            }
        }

        match self.arena.get(ev).map(|n| &n.body) {
            Some(Body::Calendar(cal)) => !cal.is_empty(),
            Some(Body::Agent(agent)) => agent.population.is_valid(),
            Some(Body::Population(pop)) => pop.agent.population.is_valid(),
            _ => false,
        }
    }

    fn handle_leaf(&mut self, ev: EventId, ctx: AgentId) -> bool {
        // Take the handler out of the node so it can borrow the simulation.
        let handler = match self.arena.get_mut(ev) {
            Some(Node { body: Body::Leaf(slot), .. }) => slot.take(),
            _ => return false,
        };
        let Some(mut handler) = handler else { return false };

        let keep = handler.handle(self, ev, ctx);

        // The handler may have rescheduled — or released — its own event.
        let mut release = false;
        if let Some(node) = self.arena.get_mut(ev) {
            if let Body::Leaf(slot) = &mut node.body {
                *slot = Some(handler);
            }
            release = !keep && node.is_detached();
        }
        if release {
            self.arena.free(ev);
        }
        keep
    }

    /// Number of live event nodes, for diagnostics and leak tests.
    pub fn event_count(&self) -> usize {
        self.arena.len()
    }

    #[cfg(test)]
    pub(crate) fn arena_ref(&self) -> &Arena {
        &self.arena
    }
}

// ── RunResult ─────────────────────────────────────────────────────────────────

/// The time series produced by [`Simulation::run`]: the reporting times and
/// one column per logger name.
#[derive(Clone, Debug)]
pub struct RunResult {
    pub times: Vec<f64>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl RunResult {
    /// The column reported by the logger(s) named `name`.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// All columns, sorted by name.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }
}
