//! The event arena: generation-checked storage for every node of a
//! simulation.
//!
//! # Design
//!
//! Leaf events, calendars, agents and populations are all *events* — a node
//! with a scheduled time, an owning calendar, and a body.  Storing them in
//! one slotted arena turns the object graph of the simulation into plain
//! indices: an event's owner is an [`EventId`], an agent's population is a
//! handle, and no node ever borrows another.  That is what lets a handler
//! take `&mut Simulation` and still schedule, unschedule or mutate any node
//! it likes.
//!
//! Freed slots go on a free list and bump their generation; a handle issued
//! before the free fails the generation check and resolves to `None`, so a
//! caller holding a handle to a long-gone transition event can never touch
//! the node that reused its slot.

use abm_core::{EventId, Time};

use crate::agent::AgentCore;
use crate::calendar::CalendarCore;
use crate::event::EventHandler;
use crate::population::PopulationCore;

// ── Node ──────────────────────────────────────────────────────────────────────

/// What a node *is*, beyond being an event.
pub(crate) enum Body {
    /// A user or rule event: a boxed handler, absent only while the handler
    /// is being executed.
    Leaf(Option<Box<dyn EventHandler>>),
    /// A plain sub-calendar (an agent's contact-event queue).
    Calendar(CalendarCore),
    /// An agent: a calendar plus state and bookkeeping.
    Agent(AgentCore),
    /// A population: an agent plus members and contact patterns.
    Population(PopulationCore),
}

impl Body {
    pub(crate) fn calendar(&self) -> Option<&CalendarCore> {
        match self {
            Body::Leaf(_) => None,
            Body::Calendar(c) => Some(c),
            Body::Agent(a) => Some(&a.calendar),
            Body::Population(p) => Some(&p.agent.calendar),
        }
    }

    pub(crate) fn calendar_mut(&mut self) -> Option<&mut CalendarCore> {
        match self {
            Body::Leaf(_) => None,
            Body::Calendar(c) => Some(c),
            Body::Agent(a) => Some(&mut a.calendar),
            Body::Population(p) => Some(&mut p.agent.calendar),
        }
    }

    pub(crate) fn agent(&self) -> Option<&AgentCore> {
        match self {
            Body::Agent(a) => Some(a),
            Body::Population(p) => Some(&p.agent),
            _ => None,
        }
    }

    pub(crate) fn agent_mut(&mut self) -> Option<&mut AgentCore> {
        match self {
            Body::Agent(a) => Some(a),
            Body::Population(p) => Some(&mut p.agent),
            _ => None,
        }
    }

    pub(crate) fn population(&self) -> Option<&PopulationCore> {
        match self {
            Body::Population(p) => Some(p),
            _ => None,
        }
    }

    pub(crate) fn population_mut(&mut self) -> Option<&mut PopulationCore> {
        match self {
            Body::Population(p) => Some(p),
            _ => None,
        }
    }
}

/// One event node.
///
/// Invariants, maintained by `calendar::attach`/`detach`:
/// - `owner` is valid iff this node's `(time, seq)` key is present in the
///   owner's queue and maps back to this node;
/// - for calendar-like nodes, `time` equals the queue minimum (`NEVER` when
///   empty).
pub(crate) struct Node {
    /// Scheduled time; for calendars, the time of the earliest child.
    pub time: Time,
    /// The calendar this node is scheduled in; `INVALID` when detached.
    pub owner: EventId,
    /// Sequence component of this node's key in the owner's queue.
    /// Meaningless while detached.
    pub seq: u64,
    pub body: Body,
}

impl Node {
    pub(crate) fn leaf(time: Time, handler: Box<dyn EventHandler>) -> Node {
        Node { time, owner: EventId::INVALID, seq: 0, body: Body::Leaf(Some(handler)) }
    }

    pub(crate) fn with_body(time: Time, body: Body) -> Node {
        Node { time, owner: EventId::INVALID, seq: 0, body }
    }

    #[inline]
    pub(crate) fn is_detached(&self) -> bool {
        !self.owner.is_valid()
    }
}

// ── Arena ─────────────────────────────────────────────────────────────────────

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Slotted, generation-checked node storage.
#[derive(Default)]
pub(crate) struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Arena {
    pub(crate) fn new() -> Arena {
        Arena::default()
    }

    /// Store `node`, reusing a freed slot if one is available.
    pub(crate) fn alloc(&mut self, node: Node) -> EventId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                debug_assert!(slot.node.is_none());
                slot.node = Some(node);
                EventId::issue(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot { generation: 0, node: Some(node) });
                EventId::issue(index, 0)
            }
        }
    }

    /// Free the slot behind `id`, returning the node.  Stale handles return
    /// `None` and change nothing.
    pub(crate) fn free(&mut self, id: EventId) -> Option<Node> {
        let slot = self.slot_mut(id)?;
        let node = slot.node.take();
        if node.is_some() {
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
        }
        node
    }

    pub(crate) fn get(&self, id: impl Into<EventId>) -> Option<&Node> {
        let id = id.into();
        self.slots
            .get(id.index())
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: impl Into<EventId>) -> Option<&mut Node> {
        let id = id.into();
        self.slot_mut(id).and_then(|s| s.node.as_mut())
    }

    pub(crate) fn contains(&self, id: impl Into<EventId>) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    fn slot_mut(&mut self, id: EventId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index())
            .filter(|s| s.generation == id.generation)
    }

    /// Iterate all live nodes with their handles.
    #[cfg(test)]
    pub(crate) fn iter_live(&self) -> impl Iterator<Item = (EventId, &Node)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.node
                .as_ref()
                .map(|n| (EventId::issue(i as u32, slot.generation), n))
        })
    }
}
