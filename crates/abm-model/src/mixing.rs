//! Random mixing: everyone may contact everyone.

use abm_core::{AgentId, PopulationId, SimRng, Time};
use abm_engine::{ContactPattern, Simulation};

/// The random-mixing contact pattern: each query returns one member of the
/// population chosen uniformly among everyone but the caller.
///
/// With fewer than two members there is no one to meet and the neighbor
/// list is empty.  Membership changes need no bookkeeping here — the
/// population's member vector is the sampling frame.
pub struct RandomMixing {
    population: Option<PopulationId>,
    rng: SimRng,
}

impl RandomMixing {
    pub fn new(seed: u64) -> RandomMixing {
        RandomMixing { population: None, rng: SimRng::new(seed) }
    }
}

impl ContactPattern for RandomMixing {
    fn attach(&mut self, _sim: &Simulation, population: PopulationId) {
        self.population = Some(population);
    }

    fn contact(&mut self, sim: &Simulation, _time: Time, agent: AgentId) -> Vec<AgentId> {
        let Some(population) = self.population else { return Vec::new() };
        let Ok(members) = sim.members(population) else { return Vec::new() };
        if members.len() <= 1 {
            return Vec::new();
        }
        loop {
            let pick = members[self.rng.gen_range(0..members.len())];
            if pick != agent {
                return vec![pick];
            }
        }
    }
}
