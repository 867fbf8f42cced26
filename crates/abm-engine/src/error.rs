use abm_core::{AgentId, EventId};
use thiserror::Error;

/// Errors surfaced by engine operations.
///
/// Misuse that the design documents as a silent no-op (unscheduling an event
/// that belongs to a different owner, removing an agent twice from a contact
/// pattern) is *not* an error and never appears here.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The handle refers to a freed arena slot (or one reused since).
    #[error("event {0} is stale or was released")]
    StaleEvent(EventId),

    /// The target of a schedule/unschedule is not a calendar-like node.
    #[error("event {0} is not a calendar")]
    NotACalendar(EventId),

    /// The handle does not refer to an agent (or population) node.
    #[error("event {0} is not an agent")]
    NotAnAgent(EventId),

    /// The handle does not refer to a population node.
    #[error("event {0} is not a population")]
    NotAPopulation(EventId),

    /// The agent is not a member of any population.
    #[error("agent {0} is not a member of any population")]
    NotInPopulation(AgentId),

    /// The agent is already a member of a different population.
    #[error("agent {0} is already a member of another population")]
    AlreadyMember(AgentId),

    /// An index-based accessor was called out of bounds.
    #[error("index {index} out of range for population of size {len}")]
    OutOfRange { index: usize, len: usize },

    /// The operation requires a detached event.
    #[error("event {0} is still scheduled; unschedule it first")]
    StillScheduled(EventId),

    /// The operation requires an agent outside any population.
    #[error("agent {0} is still a member of a population")]
    StillMember(AgentId),
}

pub type EngineResult<T> = Result<T, EngineError>;
