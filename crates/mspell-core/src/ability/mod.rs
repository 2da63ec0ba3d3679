//! Abilities: identifiers, sets and static records

mod id;
mod masks;
mod record;
mod set;

pub use id::{AbilityGroup, AbilityId};
pub use masks::{Masks, masks};
pub use record::{
    ABILITY_TABLE, AbilityRecord, AbilityTraits, Category, DeliveryShape, EffectKind, Magnitude,
    Radius, Roles, SummonKind, record,
};
pub use set::AbilitySet;
