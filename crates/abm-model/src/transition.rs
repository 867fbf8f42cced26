//! Spontaneous and contact-mediated transition rules.
//!
//! Both rules react to an agent *entering* their source state (the engine's
//! edge trigger) by sampling a waiting time and scheduling a future event:
//!
//! - a spontaneous rule puts a one-shot event on the agent's main queue —
//!   recovery, progression, anything the agent does on its own;
//! - a contact rule samples an independent delay per current neighbor,
//!   keeps the soonest, and puts the event on the agent's **contact
//!   sub-calendar**.  When it fires it may infect the chosen neighbor, and
//!   it re-arms itself for as long as the agent stays in the source state —
//!   the sub-calendar always holds the agent's next potential contact.
//!
//! The `to` states are patches: slots they name are overwritten, everything
//! else the agent carries is kept.

use std::rc::Rc;

use abm_core::{AgentId, EventId, Pattern, State, Time};
use abm_engine::rule::TransitionRule;
use abm_engine::{ContactPattern, SharedContact, Simulation};

use crate::waiting::WaitingTime;

/// Pre-change veto for a spontaneous rule: `(sim, time, agent)`.
pub type Predicate = Box<dyn Fn(&mut Simulation, Time, AgentId) -> bool>;
/// Post-change notification for a spontaneous rule.
pub type Notify = Box<dyn Fn(&mut Simulation, Time, AgentId)>;
/// Pre-change veto for a contact rule: `(sim, time, agent, contact)`.
pub type ContactPredicate = Box<dyn Fn(&mut Simulation, Time, AgentId, AgentId) -> bool>;
/// Post-change notification for a contact rule.
pub type ContactNotify = Box<dyn Fn(&mut Simulation, Time, AgentId, AgentId)>;

// ── Spontaneous ───────────────────────────────────────────────────────────────

/// A spontaneous state transition: `from → to` after a sampled delay.
pub struct Spontaneous {
    from: Pattern,
    to: State,
    waiting: Box<dyn WaitingTime>,
    predicate: Option<Predicate>,
    notify: Option<Notify>,
}

impl Spontaneous {
    pub fn new(
        from: impl Into<Pattern>,
        to: State,
        waiting: impl WaitingTime + 'static,
    ) -> Spontaneous {
        Spontaneous {
            from: from.into(),
            to,
            waiting: Box::new(waiting),
            predicate: None,
            notify: None,
        }
    }

    /// Veto callback consulted at fire time, after the source state is
    /// re-checked.  Returning `false` skips the change; the event is spent
    /// either way.
    pub fn with_predicate(
        mut self,
        predicate: impl Fn(&mut Simulation, Time, AgentId) -> bool + 'static,
    ) -> Spontaneous {
        self.predicate = Some(Box::new(predicate));
        self
    }

    /// Callback invoked after the state change is applied.
    pub fn with_notify(
        mut self,
        notify: impl Fn(&mut Simulation, Time, AgentId) + 'static,
    ) -> Spontaneous {
        self.notify = Some(Box::new(notify));
        self
    }

    fn fire(&self, sim: &mut Simulation, time: Time, agent: AgentId) {
        if !sim.matches(agent, &self.from) {
            return;
        }
        let allowed = match &self.predicate {
            None => true,
            Some(predicate) => predicate(sim, time, agent),
        };
        if allowed {
            let _ = sim.set_state(agent, self.to.clone());
            if let Some(notify) = &self.notify {
                notify(sim, time, agent);
            }
        }
    }
}

impl TransitionRule for Spontaneous {
    fn from(&self) -> &Pattern {
        &self.from
    }

    fn schedule(self: Rc<Self>, sim: &mut Simulation, time: Time, agent: AgentId) {
        let delay = self.waiting.waiting_time(time, sim.rng());
        if !delay.is_finite() {
            return;
        }
        let rule = Rc::clone(&self);
        let event = sim.create_event(
            time + delay,
            move |sim: &mut Simulation, event: EventId, agent: AgentId| {
                let t = sim.event_time(event).expect("live while handling");
                rule.fire(sim, t, agent);
                false
            },
        );
        let _ = sim.schedule(agent, event);
    }
}

// ── ContactRule ───────────────────────────────────────────────────────────────

/// A contact-mediated transition.
///
/// While an agent matches `from`, its contact sub-calendar holds one pending
/// contact event: the neighbor with the soonest sampled delay.  At fire
/// time, if both sides still match their source patterns (and the predicate
/// agrees), both are patched toward their target states; and whenever the
/// agent still matches `from` afterwards, the rule samples the next contact.
pub struct ContactRule {
    from: Pattern,
    contact_from: Pattern,
    to: State,
    contact_to: State,
    to_pattern: Pattern,
    contact_to_pattern: Pattern,
    pattern: SharedContact,
    waiting: Box<dyn WaitingTime>,
    predicate: Option<ContactPredicate>,
    notify: Option<ContactNotify>,
}

impl ContactRule {
    pub fn new(
        from: impl Into<Pattern>,
        contact_from: impl Into<Pattern>,
        to: State,
        contact_to: State,
        pattern: SharedContact,
        waiting: impl WaitingTime + 'static,
    ) -> ContactRule {
        let to_pattern = Pattern::from(&to);
        let contact_to_pattern = Pattern::from(&contact_to);
        ContactRule {
            from: from.into(),
            contact_from: contact_from.into(),
            to,
            contact_to,
            to_pattern,
            contact_to_pattern,
            pattern,
            waiting: Box::new(waiting),
            predicate: None,
            notify: None,
        }
    }

    /// Veto callback consulted at fire time.  A rejected contact skips the
    /// state changes but the rule still re-arms, so the agent takes another
    /// draw while it remains in the source state.
    pub fn with_predicate(
        mut self,
        predicate: impl Fn(&mut Simulation, Time, AgentId, AgentId) -> bool + 'static,
    ) -> ContactRule {
        self.predicate = Some(Box::new(predicate));
        self
    }

    /// Callback invoked after the state changes are applied.
    pub fn with_notify(
        mut self,
        notify: impl Fn(&mut Simulation, Time, AgentId, AgentId) + 'static,
    ) -> ContactRule {
        self.notify = Some(Box::new(notify));
        self
    }

    fn fire(self: Rc<Self>, sim: &mut Simulation, time: Time, agent: AgentId, contact: AgentId) {
        // The pair must still share a population; a contact who left (or
        // moved) silently expires the event, with no re-arm.
        if sim.population_of(agent).is_none()
            || sim.population_of(agent) != sim.population_of(contact)
        {
            return;
        }
        if !sim.matches(agent, &self.from) {
            return;
        }

        if sim.matches(contact, &self.contact_from) {
            let allowed = match &self.predicate {
                None => true,
                Some(predicate) => predicate(sim, time, agent, contact),
            };
            if allowed {
                if !sim.matches(agent, &self.to_pattern) {
                    let _ = sim.set_state(agent, self.to.clone());
                }
                if !sim.matches(contact, &self.contact_to_pattern) {
                    let _ = sim.set_state(contact, self.contact_to.clone());
                }
                if let Some(notify) = &self.notify {
                    notify(sim, time, agent, contact);
                }
            }
        }

        // Keep the contact stream alive while the agent remains in the
        // source state.
        if sim.matches(agent, &self.from) {
            self.schedule(sim, time, agent);
        }
    }
}

impl TransitionRule for ContactRule {
    fn from(&self) -> &Pattern {
        &self.from
    }

    fn schedule(self: Rc<Self>, sim: &mut Simulation, time: Time, agent: AgentId) {
        let neighbors = self.pattern.borrow_mut().contact(sim, time, agent);
        let mut best: Option<(f64, AgentId)> = None;
        for neighbor in neighbors {
            let delay = self.waiting.waiting_time(time, sim.rng());
            if best.map_or(true, |(soonest, _)| delay < soonest) {
                best = Some((delay, neighbor));
            }
        }
        let Some((delay, contact)) = best else { return };
        if !delay.is_finite() {
            return;
        }

        let rule = Rc::clone(&self);
        let event = sim.create_event(
            time + delay,
            move |sim: &mut Simulation, event: EventId, agent: AgentId| {
                let t = sim.event_time(event).expect("live while handling");
                Rc::clone(&rule).fire(sim, t, agent, contact);
                false
            },
        );
        if let Ok(sub) = sim.contact_events(agent) {
            let _ = sim.schedule(sub, event);
        }
    }
}
