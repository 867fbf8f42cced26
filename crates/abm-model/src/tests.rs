//! Integration tests for abm-model: waiting-time laws, rule scheduling,
//! and full epidemic scenarios.

use std::cell::RefCell;
use std::rc::Rc;

use abm_core::{AgentId, Pattern, PopulationId, SimRng, State, Time};
use abm_engine::{shared, ContactPattern, Counter, Logger, Simulation};

use crate::error::ModelError;
use crate::{get_waiting_time, ContactRule, Exponential, GammaLaw, RandomMixing, Spontaneous};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn status(s: &str) -> State {
    State::of("status", s)
}

fn status_is(s: &str) -> Pattern {
    Pattern::of("status", s)
}

/// Deterministic unit-delay law.
fn unit_delay() -> impl crate::WaitingTime + 'static {
    |_: Time, _: &mut SimRng| 1.0
}

/// A fixed-pair contact pattern: each of the two agents is the other's only
/// neighbor.
struct Pair(AgentId, AgentId);

impl ContactPattern for Pair {
    fn attach(&mut self, _sim: &Simulation, _population: PopulationId) {}

    fn contact(&mut self, _sim: &Simulation, _time: Time, agent: AgentId) -> Vec<AgentId> {
        if agent == self.0 {
            vec![self.1]
        } else if agent == self.1 {
            vec![self.0]
        } else {
            Vec::new()
        }
    }
}

// ── Waiting times ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod waiting_times {
    use super::*;

    #[test]
    fn exponential_zero_rate_never_fires() {
        let law = Exponential::new(0.0).unwrap();
        let mut rng = SimRng::new(1);
        assert!(get_waiting_time(&law, Time::ZERO, &mut rng).is_infinite());
    }

    #[test]
    fn exponential_negative_rate_is_refused() {
        assert!(matches!(Exponential::new(-0.5), Err(ModelError::InvalidRate(_))));
    }

    #[test]
    fn exponential_samples_are_non_negative_and_finite() {
        let law = Exponential::new(2.0).unwrap();
        let mut rng = SimRng::new(42);
        for _ in 0..256 {
            let d = get_waiting_time(&law, Time::ZERO, &mut rng);
            assert!(d.is_finite() && d >= 0.0, "bad sample {d}");
        }
    }

    #[test]
    fn gamma_invalid_shape_is_refused() {
        assert!(matches!(
            GammaLaw::new(0.0, 1.0),
            Err(ModelError::InvalidGamma { .. })
        ));
    }

    #[test]
    fn gamma_samples_look_like_the_law() {
        let law = GammaLaw::new(2.0, 3.0).unwrap(); // mean = shape * scale = 6
        let mut rng = SimRng::new(42);
        let n = 400;
        let mut sum = 0.0;
        for _ in 0..n {
            let d = get_waiting_time(&law, Time::ZERO, &mut rng);
            assert!(d.is_finite() && d >= 0.0, "bad sample {d}");
            sum += d;
        }
        let mean = sum / n as f64;
        assert!((2.0..12.0).contains(&mean), "sample mean {mean} far from 6");
    }

    #[test]
    fn closures_are_waiting_times() {
        let law = |t: Time, _: &mut SimRng| t.0 * 2.0;
        let mut rng = SimRng::new(1);
        assert_eq!(get_waiting_time(&law, Time::new(3.0), &mut rng), 6.0);
    }
}

// ── Spontaneous rules ─────────────────────────────────────────────────────────

#[cfg(test)]
mod spontaneous {
    use super::*;

    #[test]
    fn second_rule_loses_the_race_and_expires() {
        // Two rules out of A, both firing at t = 1.0.  The first (insertion
        // order) moves the agent to B; the second finds the source state
        // gone and does nothing.
        let mut sim = Simulation::with_initializer(1, |_| status("A"));
        sim.add_transition(Rc::new(Spontaneous::new(status_is("A"), status("B"), unit_delay())));
        sim.add_transition(Rc::new(Spontaneous::new(status_is("A"), status("C"), unit_delay())));
        sim.run(&[0.0, 2.0]);

        let a = sim.agent_at(sim.root(), 0).unwrap();
        assert!(sim.matches(a, &status_is("B")));
        assert!(!sim.matches(a, &status_is("C")));
    }

    #[test]
    fn predicate_rejection_skips_the_change_once() {
        let consulted = Rc::new(RefCell::new(0));
        let consulted2 = Rc::clone(&consulted);
        let mut sim = Simulation::with_initializer(1, |_| status("I"));
        sim.add_transition(Rc::new(
            Spontaneous::new(status_is("I"), status("R"), unit_delay()).with_predicate(
                move |_sim, _t, _agent| {
                    *consulted2.borrow_mut() += 1;
                    false
                },
            ),
        ));
        sim.run(&[0.0, 5.0]);

        let a = sim.agent_at(sim.root(), 0).unwrap();
        assert!(sim.matches(a, &status_is("I")), "vetoed change leaves the state alone");
        assert_eq!(*consulted.borrow(), 1, "a spontaneous event is one-shot");
    }

    #[test]
    fn notify_runs_after_the_change() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen2 = Rc::clone(&seen);
        let mut sim = Simulation::with_initializer(1, |_| status("I"));
        sim.add_transition(Rc::new(
            Spontaneous::new(status_is("I"), status("R"), unit_delay()).with_notify(
                move |sim, t, agent| {
                    let recovered = sim.matches(agent, &Pattern::of("status", "R"));
                    seen2.borrow_mut().push((t.0, recovered));
                },
            ),
        ));
        sim.run(&[0.0, 2.0]);
        assert_eq!(*seen.borrow(), vec![(1.0, true)]);
    }

    #[test]
    fn reentry_schedules_again() {
        // I → S and S → I with unit delays: the agent oscillates, each
        // entry scheduling the next exit.
        let mut sim = Simulation::with_initializer(1, |_| status("I"));
        sim.add_transition(Rc::new(Spontaneous::new(status_is("I"), status("S"), unit_delay())));
        sim.add_transition(Rc::new(Spontaneous::new(status_is("S"), status("I"), unit_delay())));
        sim.add_logger(Counter::occupancy("I", status_is("I")).shared());

        let result = sim.run(&[0.5, 1.5, 2.5, 3.5]);
        assert_eq!(result.column("I").unwrap(), &[1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn zero_rate_schedules_nothing() {
        let mut sim = Simulation::with_initializer(1, |_| status("I"));
        sim.add_transition(Rc::new(Spontaneous::new(
            status_is("I"),
            status("R"),
            Exponential::new(0.0).unwrap(),
        )));
        sim.run(&[10.0]);
        let a = sim.agent_at(sim.root(), 0).unwrap();
        assert!(sim.matches(a, &status_is("I")));
        assert!(sim.time().is_never(), "no event was ever scheduled");
    }
}

// ── Contact rules ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod contact {
    use super::*;

    /// Two-agent simulation with a fixed-pair pattern wired into the root.
    fn pair_sim() -> (Simulation, AgentId, AgentId, abm_engine::SharedContact) {
        let mut sim = Simulation::with_initializer(2, |i| {
            status(if i == 0 { "I" } else { "S" })
        });
        let root = sim.root();
        let a = sim.agent_at(root, 0).unwrap();
        let b = sim.agent_at(root, 1).unwrap();
        let pair = shared(Pair(a, b));
        sim.add_contact(root, Rc::clone(&pair)).unwrap();
        (sim, a, b, pair)
    }

    #[test]
    fn accepted_contact_infects_the_neighbor() {
        let (mut sim, _a, b, pair) = pair_sim();
        sim.add_transition(Rc::new(ContactRule::new(
            status_is("I"),
            status_is("S"),
            status("I"),
            status("I"),
            pair,
            unit_delay(),
        )));
        sim.add_logger(Counter::occupancy("I", status_is("I")).shared());

        let result = sim.run(&[0.0, 1.0]);
        assert_eq!(result.column("I").unwrap(), &[1.0, 2.0]);
        assert!(sim.matches(b, &status_is("I")));
    }

    #[test]
    fn rejected_contacts_rearm_at_uniform_spacing() {
        let (mut sim, _a, b, pair) = pair_sim();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen2 = Rc::clone(&seen);
        sim.add_transition(Rc::new(
            ContactRule::new(
                status_is("I"),
                status_is("S"),
                status("I"),
                status("I"),
                pair,
                unit_delay(),
            )
            .with_predicate(move |_sim, t, _agent, _contact| {
                seen2.borrow_mut().push(t.0);
                false
            }),
        ));
        sim.run(&[0.0, 5.5]);

        assert_eq!(*seen.borrow(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(sim.matches(b, &status_is("S")), "every contact was vetoed");
    }

    #[test]
    fn contact_event_expires_when_populations_diverge() {
        let (mut sim, _a, b, pair) = pair_sim();
        sim.add_transition(Rc::new(ContactRule::new(
            status_is("I"),
            status_is("S"),
            status("I"),
            status("I"),
            pair,
            unit_delay(),
        )));
        sim.add_logger(Counter::occupancy("I", status_is("I")).shared());
        // The susceptible partner leaves before the contact at t = 1.0.
        sim.set_death_time(b, Time::new(0.5)).unwrap();

        let result = sim.run(&[0.0, 3.0]);
        assert_eq!(result.column("I").unwrap(), &[1.0, 1.0]);
        assert!(sim.matches(b, &status_is("S")), "the departed agent was never infected");
        assert!(sim.time().is_never(), "the expired contact did not re-arm");
    }

    #[test]
    fn notify_sees_both_parties() {
        let (mut sim, a, b, pair) = pair_sim();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen2 = Rc::clone(&seen);
        sim.add_transition(Rc::new(
            ContactRule::new(
                status_is("I"),
                status_is("S"),
                status("I"),
                status("I"),
                pair,
                unit_delay(),
            )
            .with_notify(move |_sim, t, agent, contact| {
                seen2.borrow_mut().push((t.0, agent, contact));
            }),
        ));
        sim.run(&[0.0, 1.0]);
        assert_eq!(*seen.borrow(), vec![(1.0, a, b)]);
    }
}

// ── Scenario: SIR over random mixing ──────────────────────────────────────────

#[cfg(test)]
mod sir {
    use super::*;

    #[test]
    fn sir_over_random_mixing_conserves_and_orders() {
        let mut sim = Simulation::with_initializer(100, |i| {
            status(if i == 0 { "I" } else { "S" })
        });
        sim.set_seed(20_24);
        let root = sim.root();
        let mixing = shared(RandomMixing::new(99));
        sim.add_contact(root, Rc::clone(&mixing)).unwrap();

        sim.add_transition(Rc::new(ContactRule::new(
            status_is("I"),
            status_is("S"),
            status("I"),
            status("I"),
            mixing,
            Exponential::new(0.3).unwrap(),
        )));
        sim.add_transition(Rc::new(Spontaneous::new(
            status_is("I"),
            status("R"),
            Exponential::new(0.1).unwrap(),
        )));
        sim.add_logger(Counter::occupancy("S", status_is("S")).shared());
        sim.add_logger(Counter::occupancy("I", status_is("I")).shared());
        sim.add_logger(Counter::occupancy("R", status_is("R")).shared());

        let times: Vec<f64> = (0..=20).map(f64::from).collect();
        let result = sim.run(&times);
        let s = result.column("S").unwrap();
        let i = result.column("I").unwrap();
        let r = result.column("R").unwrap();

        assert_eq!((s[0], i[0], r[0]), (99.0, 1.0, 0.0));
        for k in 0..times.len() {
            assert_eq!(s[k] + i[k] + r[k], 100.0, "conservation at t={}", times[k]);
        }
        for k in 1..times.len() {
            assert!(s[k] <= s[k - 1], "S must never increase");
            assert!(r[k] >= r[k - 1], "R must never decrease");
        }
    }
}
