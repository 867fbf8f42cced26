//! Generation-scoped, copyable handles into the event arena.
//!
//! Every node of a simulation — leaf events, calendars, agents, populations —
//! lives in one arena owned by the simulation.  A handle pairs the slot index
//! with the slot's generation at allocation time, so a handle held across the
//! freeing and reuse of its slot is detected in O(1) and never aliases a
//! newer node.
//!
//! The three handle types form a widening chain: every population is an
//! agent, every agent is an event.  The `From` impls go in the widening
//! direction only; narrowing is the engine's job (it knows the node bodies).

use std::fmt;

/// Generate a generation-scoped handle type.
macro_rules! arena_handle {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name {
            /// Slot index in the arena.
            pub index: u32,
            /// Arena generation of the slot when this handle was issued.
            pub generation: u32,
        }

        impl $name {
            /// Sentinel meaning "no node" — never resolves.
            pub const INVALID: $name = $name { index: u32::MAX, generation: u32::MAX };

            pub(crate) const fn from_raw(index: u32, generation: u32) -> Self {
                Self { index, generation }
            }

            /// `true` unless this is the `INVALID` sentinel.
            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self.index != u32::MAX
            }

            /// Cast the slot index to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.index as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized handles are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({}v{})", stringify!($name), self.index, self.generation)
                } else {
                    write!(f, "{}(-)", stringify!($name))
                }
            }
        }
    };
}

arena_handle! {
    /// Handle to any node in the event arena.
    pub struct EventId;
}

arena_handle! {
    /// Handle to an agent node.  An agent is itself an event (its own
    /// earliest sub-event), so the handle widens into [`EventId`].
    pub struct AgentId;
}

arena_handle! {
    /// Handle to a population node.  A population is an agent whose children
    /// are its member agents.
    pub struct PopulationId;
}

impl AgentId {
    /// Issue an `AgentId` for an arena slot.  Engine-internal.
    #[doc(hidden)]
    pub fn issue(index: u32, generation: u32) -> Self {
        Self::from_raw(index, generation)
    }
}

impl EventId {
    /// Issue an `EventId` for an arena slot.  Engine-internal.
    #[doc(hidden)]
    pub fn issue(index: u32, generation: u32) -> Self {
        Self::from_raw(index, generation)
    }
}

impl PopulationId {
    /// Issue a `PopulationId` for an arena slot.  Engine-internal.
    #[doc(hidden)]
    pub fn issue(index: u32, generation: u32) -> Self {
        Self::from_raw(index, generation)
    }
}

impl From<AgentId> for EventId {
    #[inline(always)]
    fn from(id: AgentId) -> EventId {
        EventId { index: id.index, generation: id.generation }
    }
}

impl From<PopulationId> for AgentId {
    #[inline(always)]
    fn from(id: PopulationId) -> AgentId {
        AgentId { index: id.index, generation: id.generation }
    }
}

impl From<PopulationId> for EventId {
    #[inline(always)]
    fn from(id: PopulationId) -> EventId {
        EventId { index: id.index, generation: id.generation }
    }
}
