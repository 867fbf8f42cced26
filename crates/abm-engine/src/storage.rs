//! Typed per-agent storage for external subsystems.
//!
//! # Design
//!
//! Subsystems that hang private data off agents (a network's adjacency
//! record, a spatial region's position) coordinate through a process-wide
//! name → handle registry: the first request for a name allocates the next
//! dense slot index, later requests return the same one.  Each agent
//! carries a sparse `Vec<Option<Box<dyn Any>>>` indexed by handle, and a
//! [`Storage<T>`] wrapper pins the slot to a concrete type.
//!
//! The boxed value's destructor runs when the slot is overwritten, taken,
//! or the agent is released — the owner never frees anything by hand.

use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Mutex, OnceLock};

use abm_core::AgentId;

use crate::error::EngineResult;
use crate::Simulation;

static REGISTRY: OnceLock<Mutex<HashMap<String, usize>>> = OnceLock::new();

/// The stable slot index for `name`, allocating one on first request.
pub fn request_storage(name: &str) -> usize {
    let registry = REGISTRY.get_or_init(|| Mutex::new(HashMap::new()));
    let mut map = registry.lock().expect("storage registry poisoned");
    let next = map.len();
    *map.entry(name.to_string()).or_insert(next)
}

/// A typed view of one per-agent storage slot.
///
/// Two `Storage`s constructed from the same name share the slot; giving
/// them different `T`s makes `get` return `None` rather than misread.
pub struct Storage<T> {
    handle: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> Storage<T> {
    /// Bind to the slot registered under `name`.
    pub fn new(name: &str) -> Storage<T> {
        Storage { handle: request_storage(name), _marker: PhantomData }
    }

    /// The value stored for `agent`, if present and of type `T`.
    pub fn get<'a>(&self, sim: &'a Simulation, agent: AgentId) -> Option<&'a T> {
        sim.agent_core(agent)
            .ok()?
            .storage
            .get(self.handle)?
            .as_ref()?
            .downcast_ref::<T>()
    }

    /// Mutable access to the value stored for `agent`.
    pub fn get_mut<'a>(&self, sim: &'a mut Simulation, agent: AgentId) -> Option<&'a mut T> {
        sim.agent_core_mut(agent)
            .ok()?
            .storage
            .get_mut(self.handle)?
            .as_mut()?
            .downcast_mut::<T>()
    }

    /// Store `value` for `agent`, dropping any previous value in the slot.
    pub fn insert(&self, sim: &mut Simulation, agent: AgentId, value: T) -> EngineResult<()> {
        let slots = &mut sim.agent_core_mut(agent)?.storage;
        if slots.len() <= self.handle {
            slots.resize_with(self.handle + 1, || None);
        }
        slots[self.handle] = Some(Box::new(value));
        Ok(())
    }

    /// Remove and return the value stored for `agent`.
    pub fn take(&self, sim: &mut Simulation, agent: AgentId) -> Option<T> {
        let slots = &mut sim.agent_core_mut(agent).ok()?.storage;
        let boxed = slots.get_mut(self.handle)?.take()?;
        match boxed.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(boxed) => {
                // Foreign type in our slot: put it back untouched.
                slots[self.handle] = Some(boxed);
                None
            }
        }
    }
}
