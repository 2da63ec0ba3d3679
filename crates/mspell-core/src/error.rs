//! Engine errors

use thiserror::Error;

use crate::ability::{AbilityId, AbilitySet};
use crate::actor::ActorId;
use crate::filter::FilterPass;
use crate::race::RaceId;

/// Everything that can go wrong while deciding or configuring.
///
/// Ordinary "nothing to do" outcomes are not errors; they are reported as
/// [`crate::TurnOutcome::NoAction`]. The variants here are broken
/// invariants or bad input.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("filter pass {pass} added abilities {added}")]
    FilterAddedAbilities { pass: FilterPass, added: AbilitySet },

    #[error("selection returned {0}, which is not a candidate")]
    SelectionOutsideCandidates(AbilityId),

    #[error("actor {0} resolved itself as its target")]
    SelfTarget(ActorId),

    #[error("unknown actor {0}")]
    UnknownActor(ActorId),

    #[error("unknown race {0}")]
    UnknownRace(RaceId),

    #[error("actor {0} has no race and cannot cast")]
    NotACaster(ActorId),

    #[error("race table entry {found} is stored at index {expected}")]
    MisnumberedRace { expected: u16, found: u16 },

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Invalid value '{1}' for option '{0}'")]
    InvalidValue(String, String),

    #[error("Missing value for option '{0}'")]
    MissingValue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
