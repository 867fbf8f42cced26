//! The hierarchical event calendar.
//!
//! # Why this exists
//!
//! The simulation is a tree of calendars: the root's children are agents,
//! an agent's children are its pending events plus one contact sub-calendar.
//! Finding the globally earliest event must not scan that tree, so every
//! calendar keeps its children in an ordered map keyed by time and carries
//! its own minimum as its event time.  Inserting or removing a child that
//! changes a calendar's minimum re-keys the calendar inside *its* parent by
//! removing and reinserting it — never by scanning siblings — so each
//! mutation costs O(log n) per level and O(depth · log n) end to end.
//!
//! # Tie-breaking
//!
//! Queue keys are `(Time, u64)` where the second component is a
//! per-calendar monotone sequence number: equal-time children dispatch in
//! insertion order.  Re-keying a calendar reinserts it, so among equal-time
//! siblings a re-keyed calendar goes last, exactly as if it had just been
//! scheduled.

use std::collections::BTreeMap;

use abm_core::{EventId, Time};
use log::trace;

use crate::arena::{Arena, Body};
use crate::error::{EngineError, EngineResult};

// ── CalendarCore ──────────────────────────────────────────────────────────────

/// The queue half of a calendar node: children keyed by `(time, seq)`.
#[derive(Default)]
pub(crate) struct CalendarCore {
    queue: BTreeMap<(Time, u64), EventId>,
    next_seq: u64,
}

impl CalendarCore {
    pub(crate) fn new() -> CalendarCore {
        CalendarCore::default()
    }

    /// Time of the earliest child; `NEVER` when empty.
    pub(crate) fn min_time(&self) -> Time {
        self.queue.keys().next().map_or(Time::NEVER, |k| k.0)
    }

    /// Earliest child, if any.
    pub(crate) fn peek_min(&self) -> Option<EventId> {
        self.queue.values().next().copied()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Insert a child and return the sequence number it was keyed with.
    fn insert(&mut self, time: Time, child: EventId) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert((time, seq), child);
        seq
    }

    fn remove(&mut self, time: Time, seq: u64) -> Option<EventId> {
        self.queue.remove(&(time, seq))
    }

    /// Drain every child, in time order.
    fn drain(&mut self) -> Vec<EventId> {
        std::mem::take(&mut self.queue).into_values().collect()
    }

    #[cfg(test)]
    pub(crate) fn entries(&self) -> impl Iterator<Item = ((Time, u64), EventId)> + '_ {
        self.queue.iter().map(|(&k, &v)| (k, v))
    }
}

// ── Tree operations ───────────────────────────────────────────────────────────

/// Schedule `ev` under `target`, detaching it from its current owner first.
///
/// If the insertion lowers `target`'s minimum, `target` is re-keyed inside
/// its own parent, recursively up to the root.
pub(crate) fn attach(arena: &mut Arena, target: EventId, ev: EventId) -> EngineResult<()> {
    debug_assert_ne!(target, ev, "an event cannot be scheduled on itself");
    if !arena.contains(ev) {
        return Err(EngineError::StaleEvent(ev));
    }
    match arena.get(target) {
        None => return Err(EngineError::StaleEvent(target)),
        Some(node) if node.body.calendar().is_none() => {
            return Err(EngineError::NotACalendar(target));
        }
        Some(_) => {}
    }
    detach(arena, ev);

    let time = arena.get(ev).expect("checked above").time;
    let target_node = arena.get_mut(target).expect("checked above");
    let cal = target_node
        .body
        .calendar_mut()
        .expect("checked above");
    let old_min = cal.min_time();
    let seq = cal.insert(time, ev);

    let ev_node = arena.get_mut(ev).expect("checked above");
    ev_node.owner = target;
    ev_node.seq = seq;
    trace!("attach {ev} at {time} under {target}");

    if time < old_min {
        let target_node = arena.get_mut(target).expect("checked above");
        let prev = target_node.time;
        target_node.time = time;
        rekey_upward(arena, target, prev);
    }
    Ok(())
}

/// Unschedule `ev` from whatever calendar owns it.  Detached or stale
/// events are left alone.
///
/// If the removal changes the owner's minimum, the owner is re-keyed inside
/// its parent, recursively.
pub(crate) fn detach(arena: &mut Arena, ev: EventId) {
    let Some(node) = arena.get(ev) else { return };
    let owner = node.owner;
    if !owner.is_valid() {
        return;
    }
    let (time, seq) = (node.time, node.seq);

    let owner_node = arena
        .get_mut(owner)
        .expect("owned events always have a live owner");
    let cal = owner_node
        .body
        .calendar_mut()
        .expect("owners are always calendars");
    let removed = cal.remove(time, seq);
    debug_assert_eq!(removed, Some(ev));
    let new_min = cal.min_time();

    arena.get_mut(ev).expect("checked above").owner = EventId::INVALID;
    trace!("detach {ev} from {owner}");

    let owner_node = arena.get_mut(owner).expect("checked above");
    if owner_node.time != new_min {
        let prev = owner_node.time;
        owner_node.time = new_min;
        rekey_upward(arena, owner, prev);
    }
}

/// Detach all children of `target`.  Detached leaf children are freed;
/// calendar-like children stay alive for their owners to reuse.
///
/// On an agent this clears the whole queue including the contact
/// sub-calendar, so [`crate::Simulation::clear_events`] re-attaches the
/// (emptied) sub-calendar afterwards.
pub(crate) fn clear(arena: &mut Arena, target: EventId) -> EngineResult<()> {
    let target_node = arena.get_mut(target).ok_or(EngineError::StaleEvent(target))?;
    let cal = target_node
        .body
        .calendar_mut()
        .ok_or(EngineError::NotACalendar(target))?;
    let children = cal.drain();

    for child in children {
        let node = arena.get_mut(child).expect("queued children are live");
        node.owner = EventId::INVALID;
        if matches!(node.body, Body::Leaf(_)) {
            arena.free(child);
        }
    }

    let target_node = arena.get_mut(target).expect("checked above");
    if target_node.time != Time::NEVER {
        let prev = target_node.time;
        target_node.time = Time::NEVER;
        rekey_upward(arena, target, prev);
    }
    Ok(())
}

/// `node`'s stored time just changed from `old_time`: fix its key in each
/// ancestor calendar until a minimum stops changing.
fn rekey_upward(arena: &mut Arena, mut node_id: EventId, mut old_time: Time) {
    loop {
        let node = arena.get(node_id).expect("re-keyed nodes are live");
        let parent = node.owner;
        if !parent.is_valid() {
            return;
        }
        let (new_time, seq) = (node.time, node.seq);

        let parent_node = arena.get_mut(parent).expect("owners are live");
        let cal = parent_node
            .body
            .calendar_mut()
            .expect("owners are always calendars");
        let removed = cal.remove(old_time, seq);
        debug_assert_eq!(removed, Some(node_id));
        let new_seq = cal.insert(new_time, node_id);
        let new_min = cal.min_time();

        arena.get_mut(node_id).expect("checked above").seq = new_seq;

        let parent_node = arena.get_mut(parent).expect("checked above");
        if parent_node.time == new_min {
            return;
        }
        old_time = parent_node.time;
        parent_node.time = new_min;
        node_id = parent;
    }
}
