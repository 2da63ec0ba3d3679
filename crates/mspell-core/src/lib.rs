//! mspell-core: Monster special-ability decision engine
//!
//! Decides, once per turn, whether a monster uses one of its special
//! abilities, which one, and against whom, then resolves the chosen ability
//! through the host's [`world::World`]. The crate holds no global state; a
//! [`SpellEngine`] owns the race table, options and player lore, and every
//! random decision draws from a caller-supplied [`GameRng`].

pub mod ability;
pub mod actor;
pub mod classify;
pub mod deliver;
pub mod engine;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod level;
pub mod lore;
pub mod options;
pub mod race;
pub mod resist;
pub mod select;
pub mod special;
pub mod target;
pub mod world;

mod rng;

pub use ability::{AbilityId, AbilitySet, Category, DeliveryShape};
pub use actor::{ActorId, ActorView};
pub use engine::{Cast, NoActionReason, SpellEngine, TurnOutcome};
pub use error::EngineError;
pub use level::Level;
pub use options::EngineOptions;
pub use race::{MonsterRace, RaceId, RaceTable};
pub use rng::GameRng;
