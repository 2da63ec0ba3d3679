//! Actors as the decision engine sees them
//!
//! The engine never owns actors. The world hands out [`ActorView`] snapshots
//! and keeps the caster-private [`CasterMind`] on the engine's behalf.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::race::RaceId;
use crate::resist::ResistanceLedger;

/// Unique identifier for an actor on the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Transient conditions an actor can be under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActorStatus {
    pub confused: bool,
    pub afraid: bool,
    pub stunned: bool,
    pub blinded: bool,
    pub slowed: bool,
    pub paralyzed: bool,
    pub hasted: bool,
    pub invulnerable: bool,
    /// Asleep or otherwise unaware of its surroundings
    pub unaware: bool,
    /// Appeared this turn; acts from the next turn on
    pub just_arrived: bool,
}

/// Read-only snapshot of one actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorView {
    pub id: ActorId,
    /// `None` for actors without a race entry (the player)
    pub race: Option<RaceId>,
    pub pos: Point,
    pub hp: i32,
    pub max_hp: i32,
    pub level: u8,
    pub status: ActorStatus,
    /// Owning actor for pets
    pub owner: Option<ActorId>,
    pub is_player: bool,
    /// Whether the player can currently see this actor
    pub visible: bool,
    /// Shown as something else; casts are not attributed to the race
    pub disguised: bool,
}

impl ActorView {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// `hp < max_hp * num / den`, without integer truncation.
    pub fn hp_below(&self, num: i32, den: i32) -> bool {
        (self.hp as i64) * (den as i64) < (self.max_hp as i64) * (num as i64)
    }
}

bitflags! {
    /// What an owner lets its pets do.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PetPermissions: u8 {
        const TELEPORT = 1 << 0;
        const ATTACK_SPELL = 1 << 1;
        const SUMMON_SPELL = 1 << 2;
        /// Balls and breaths may be used even when the owner stands near
        /// the blast (never inside the safety distance)
        const BALL_SPELL = 1 << 3;
    }
}

impl Serialize for PetPermissions {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PetPermissions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(PetPermissions::from_bits_truncate(bits))
    }
}

/// Per-caster memory the engine reads and writes between turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CasterMind {
    pub ledger: ResistanceLedger,
    /// Target of the last successful decision
    pub last_target: Option<ActorId>,
    /// Explicitly assigned target; wins over everything else while valid
    pub pinned_target: Option<ActorId>,
}
