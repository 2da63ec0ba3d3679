//! Derived ability masks
//!
//! Sets of abilities sharing a property, computed once from the record
//! table. Filters and the classifier work on these instead of enumerating
//! identifiers by hand.

use std::sync::OnceLock;

use strum::IntoEnumIterator;

use super::id::AbilityId;
use super::record::{AbilityRecord, AbilityTraits, Category, DeliveryShape, Roles, record};
use super::set::AbilitySet;

/// Every derived mask.
#[derive(Debug, Clone)]
pub struct Masks {
    pub innate: AbilitySet,
    pub riding_unsafe: AbilitySet,
    pub requires_los: AbilitySet,
    /// Abilities that need an ally-free line stopping at the target
    pub clean_shot: AbilitySet,
    pub beams: AbilitySet,
    pub balls: AbilitySet,
    pub breaths: AbilitySet,
    pub summons: AbilitySet,
    pub teleports: AbilitySet,
    /// Abilities that hurt or hinder a target; gated by a pet's
    /// attack permission
    pub hostile: AbilitySet,
    /// Barred where summoning is forbidden
    pub no_summon_zone: AbilitySet,
    /// Kept when a SMART caster is badly hurt
    pub desperate: AbilitySet,
    pub self_targeted: AbilitySet,
    pub damaging: AbilitySet,
    categories: [AbilitySet; 13],
}

impl Masks {
    pub fn category(&self, category: Category) -> AbilitySet {
        self.categories[category as usize]
    }
}

fn collect(pred: impl Fn(&AbilityRecord) -> bool) -> AbilitySet {
    AbilityId::iter().filter(|id| pred(record(*id))).collect()
}

/// The process-wide masks.
pub fn masks() -> &'static Masks {
    static MASKS: OnceLock<Masks> = OnceLock::new();
    MASKS.get_or_init(|| {
        let mut categories = [AbilitySet::EMPTY; 13];
        for id in AbilityId::iter() {
            categories[record(id).category() as usize].insert(id);
        }

        let summons = collect(|r| r.roles.contains(Roles::SUMMON));
        let desperate = categories[Category::SummonAlly as usize]
            | categories[Category::DispelTarget as usize]
            | categories[Category::Escape as usize]
            | categories[Category::Tactic as usize];

        Masks {
            innate: collect(|r| r.is_innate()),
            riding_unsafe: collect(|r| r.traits.contains(AbilityTraits::RIDING_UNSAFE)),
            requires_los: collect(|r| r.requires_los()),
            clean_shot: collect(|r| r.needs_clean_shot()),
            beams: collect(|r| r.shape == DeliveryShape::Beam),
            balls: collect(|r| r.shape == DeliveryShape::Ball),
            breaths: collect(|r| r.shape == DeliveryShape::Breath),
            summons,
            teleports: collect(|r| r.traits.contains(AbilityTraits::TELEPORT)),
            hostile: collect(|r| {
                r.roles
                    .intersects(Roles::ATTACK | Roles::ANNOY | Roles::UNIQUE_BEAM | Roles::DISPEL)
            }),
            no_summon_zone: summons | AbilitySet::single(AbilityId::TeleportLevel),
            desperate,
            self_targeted: collect(|r| r.targets_self()),
            damaging: collect(|r| r.deals_damage()),
            categories,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_partition_every_ability() {
        let m = masks();
        let mut union = AbilitySet::EMPTY;
        for category in Category::iter() {
            let set = m.category(category);
            assert!(!union.intersects(set), "{category} overlaps");
            union = union | set;
        }
        assert_eq!(union, AbilitySet::all());
    }

    #[test]
    fn test_innate_mask() {
        let m = masks();
        assert!(m.innate.contains(AbilityId::BreathFire));
        assert!(m.innate.contains(AbilityId::Rocket));
        assert!(m.innate.contains(AbilityId::Special));
        assert!(!m.innate.contains(AbilityId::BallFire));
        assert!(!m.innate.contains(AbilityId::MagicMissile));
    }

    #[test]
    fn test_riding_unsafe_mask() {
        let expected = AbilitySet::from([
            AbilityId::Shriek,
            AbilityId::Blink,
            AbilityId::Teleport,
            AbilityId::CreateTraps,
            AbilityId::Darkness,
            AbilityId::Special,
        ]);
        assert_eq!(masks().riding_unsafe, expected);
    }

    #[test]
    fn test_desperate_set() {
        let m = masks();
        assert!(m.desperate.contains(AbilityId::Teleport));
        assert!(m.desperate.contains(AbilityId::Blink));
        assert!(m.desperate.contains(AbilityId::SummonKin));
        assert!(m.desperate.contains(AbilityId::Dispel));
        assert!(!m.desperate.contains(AbilityId::Heal));
        assert!(!m.desperate.contains(AbilityId::BoltFire));
    }

    #[test]
    fn test_only_beam_is_psychic_spear() {
        assert_eq!(masks().beams, AbilitySet::single(AbilityId::PsychicSpear));
    }
}
