//! Static ability records
//!
//! One record per [`AbilityId`] says how the ability is delivered, what it
//! does, which tactical roles it can fill and how hard it hits. Everything
//! else the engine knows about abilities (masks, categories) is derived from
//! this table.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter};

use super::id::AbilityId;
use crate::resist::ResistKind;
use crate::rng::GameRng;

// ============================================================================
// Delivery and effect kinds
// ============================================================================

/// Geometric shape used to resolve an ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum DeliveryShape {
    /// Applied straight to one grid, aimed but hidden
    Point,
    /// Single-target projectile, stops at the first obstruction
    Bolt,
    /// Penetrating line to full range
    Beam,
    /// Area centered on an impact point
    Ball,
    /// Cone from the caster that may reshape terrain
    Breath,
    /// Race-specific scripted behavior
    Special,
}

/// What an ability does to whatever it reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum EffectKind {
    Acid,
    Elec,
    Fire,
    Cold,
    Poison,
    Nuke,
    Nether,
    Water,
    Mana,
    Plasma,
    Ice,
    Missile,
    Arrow,
    Rocket,
    Light,
    Dark,
    Confusion,
    Sound,
    Chaos,
    Disenchant,
    Nexus,
    Time,
    Inertia,
    Gravity,
    Shards,
    Force,
    Disintegrate,
    MindBlast,
    BrainSmash,
    Wounds,
    /// Takes a percentage of the victim's current hit points
    Doom,
    DrainMana,
    PsychicSpear,
    Scare,
    Blind,
    Slow,
    Paralyze,
    Amnesia,
    Darkness,
    Traps,
    Shriek,
    Dispel,
    TeleportTo,
    TeleportAway,
    TeleportLevel,
    Heal,
    Haste,
    Invulnerability,
    Blink,
    Teleport,
    TimeStop,
    Summon,
    RaiseDead,
    /// Lifted and dropped; used by diving fliers
    Fall,
    /// Caster closes to the target's side
    Approach,
    Special,
}

impl EffectKind {
    /// The resistance that blunts this effect, if any.
    pub const fn resist_kind(self) -> Option<ResistKind> {
        match self {
            EffectKind::Acid => Some(ResistKind::Acid),
            EffectKind::Elec => Some(ResistKind::Elec),
            EffectKind::Fire => Some(ResistKind::Fire),
            EffectKind::Cold | EffectKind::Ice => Some(ResistKind::Cold),
            EffectKind::Poison | EffectKind::Nuke => Some(ResistKind::Poison),
            EffectKind::Nether => Some(ResistKind::Nether),
            EffectKind::Light => Some(ResistKind::Light),
            EffectKind::Dark => Some(ResistKind::Dark),
            EffectKind::Confusion => Some(ResistKind::Confusion),
            EffectKind::Sound => Some(ResistKind::Sound),
            EffectKind::Chaos => Some(ResistKind::Chaos),
            EffectKind::Disenchant => Some(ResistKind::Disenchant),
            EffectKind::Nexus | EffectKind::TeleportLevel => Some(ResistKind::Nexus),
            EffectKind::Shards => Some(ResistKind::Shards),
            EffectKind::Scare => Some(ResistKind::Fear),
            EffectKind::Blind => Some(ResistKind::Blindness),
            _ => None,
        }
    }
}

/// Creatures a summoning ability calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum SummonKind {
    Kin,
    Cyberdemon,
    Monster,
    Ant,
    Spider,
    Hound,
    Hydra,
    Angel,
    Demon,
    Undead,
    Dragon,
    GreaterUndead,
    AncientDragon,
    Amberite,
    Unique,
}

// ============================================================================
// Tactical roles
// ============================================================================

/// Tactical role an ability is classified into for selection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumIter, EnumCount,
)]
#[repr(u8)]
pub enum Category {
    Attack,
    Escape,
    /// Short hop used to close in or reposition
    Tactic,
    HealSelf,
    /// Ultimate self-buff (time stop)
    BuffSelf,
    HasteSelf,
    InvulnerabilitySelf,
    DebuffTarget,
    SummonAlly,
    RaiseUndead,
    DispelTarget,
    ScriptedSpecial,
    UniqueBeam,
}

bitflags! {
    /// Every role an ability can fill. An ability may carry several; its
    /// [`Category`] is the first match in [`Category::PRECEDENCE`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Roles: u16 {
        const ATTACK = 1 << 0;
        const ESCAPE = 1 << 1;
        const TACTIC = 1 << 2;
        const HEAL = 1 << 3;
        const BUFF = 1 << 4;
        const HASTE = 1 << 5;
        const INVULNER = 1 << 6;
        const ANNOY = 1 << 7;
        const SUMMON = 1 << 8;
        const RAISE = 1 << 9;
        const DISPEL = 1 << 10;
        const SPECIAL = 1 << 11;
        const UNIQUE_BEAM = 1 << 12;
    }
}

impl Category {
    /// Fixed precedence used when an ability fills several roles.
    pub const PRECEDENCE: [(Roles, Category); Category::COUNT] = [
        (Roles::SPECIAL, Category::ScriptedSpecial),
        (Roles::BUFF, Category::BuffSelf),
        (Roles::UNIQUE_BEAM, Category::UniqueBeam),
        (Roles::SUMMON, Category::SummonAlly),
        (Roles::RAISE, Category::RaiseUndead),
        (Roles::DISPEL, Category::DispelTarget),
        (Roles::HEAL, Category::HealSelf),
        (Roles::HASTE, Category::HasteSelf),
        (Roles::INVULNER, Category::InvulnerabilitySelf),
        (Roles::TACTIC, Category::Tactic),
        (Roles::ESCAPE, Category::Escape),
        (Roles::ATTACK, Category::Attack),
        (Roles::ANNOY, Category::DebuffTarget),
    ];

    pub fn from_roles(roles: Roles) -> Option<Category> {
        Self::PRECEDENCE
            .iter()
            .find(|(role, _)| roles.intersects(*role))
            .map(|(_, category)| *category)
    }
}

bitflags! {
    /// Delivery-independent properties of an ability.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AbilityTraits: u8 {
        /// Physical or innate; works where magic is suppressed and never fumbles
        const INNATE = 1 << 0;
        /// Resolved on the caster's own grid
        const SELF_TARGET = 1 << 1;
        /// Pointless or harmful while something rides the caster
        const RIDING_UNSAFE = 1 << 2;
        /// A teleport effect, gated by the owner's teleport permission
        const TELEPORT = 1 << 3;
        /// Needs an ally-free straight path even though it is not a bolt
        const CLEAN_SHOT = 1 << 4;
    }
}

// ============================================================================
// Magnitude and radius
// ============================================================================

/// Blast radius class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Radius {
    None,
    /// 2, or 3 for powerful casters
    Standard,
    /// 4 regardless of caster
    Big,
    Fixed(u8),
}

impl Radius {
    pub const fn grids(self, powerful: bool) -> u32 {
        match self {
            Radius::None => 0,
            Radius::Standard => {
                if powerful {
                    3
                } else {
                    2
                }
            }
            Radius::Big => 4,
            Radius::Fixed(r) => r as u32,
        }
    }
}

/// How an ability's strength is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Magnitude {
    None,
    /// Caster's current hit points over `divisor`, capped
    Breath { divisor: i32, cap: i32 },
    /// `base + n`d`s` plus `level * num / den`; the level term doubles for
    /// powerful casters
    Roll {
        base: i32,
        n: u8,
        s: u8,
        num: i32,
        den: i32,
    },
    /// `level * num / den`, at least 1
    Level { num: i32, den: i32 },
}

impl Magnitude {
    pub fn roll(self, caster_hp: i32, level: u8, powerful: bool, rng: &mut GameRng) -> i32 {
        match self {
            Magnitude::None => 0,
            Magnitude::Breath { divisor, cap } => (caster_hp.max(0) / divisor.max(1)).min(cap),
            Magnitude::Roll {
                base,
                n,
                s,
                num,
                den,
            } => {
                let mut level_term = level as i32 * num / den.max(1);
                if powerful {
                    level_term *= 2;
                }
                base + rng.dice(n as u32, s as u32) as i32 + level_term
            }
            Magnitude::Level { num, den } => (level as i32 * num / den.max(1)).max(1),
        }
    }

    pub const fn deals_damage(self) -> bool {
        matches!(self, Magnitude::Breath { .. } | Magnitude::Roll { .. })
    }
}

// ============================================================================
// Records
// ============================================================================

/// Static description of one ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbilityRecord {
    pub id: AbilityId,
    pub shape: DeliveryShape,
    pub effect: EffectKind,
    pub roles: Roles,
    pub traits: AbilityTraits,
    pub radius: Radius,
    pub magnitude: Magnitude,
    pub summon: Option<SummonKind>,
}

impl AbilityRecord {
    pub fn category(&self) -> Category {
        // every record carries at least one role (checked by tests)
        Category::from_roles(self.roles).unwrap_or(Category::DebuffTarget)
    }

    pub const fn is_innate(&self) -> bool {
        self.traits.contains(AbilityTraits::INNATE)
    }

    pub const fn targets_self(&self) -> bool {
        self.traits.contains(AbilityTraits::SELF_TARGET)
    }

    /// Needs an unobstructed line to the target's own grid.
    pub fn requires_los(&self) -> bool {
        match self.shape {
            DeliveryShape::Bolt | DeliveryShape::Beam | DeliveryShape::Breath => true,
            DeliveryShape::Point => !self.targets_self() && self.summon.is_none(),
            DeliveryShape::Ball | DeliveryShape::Special => false,
        }
    }

    pub fn needs_clean_shot(&self) -> bool {
        self.shape == DeliveryShape::Bolt || self.traits.contains(AbilityTraits::CLEAN_SHOT)
    }

    pub const fn deals_damage(&self) -> bool {
        self.magnitude.deals_damage()
    }
}

const fn rec(
    id: AbilityId,
    shape: DeliveryShape,
    effect: EffectKind,
    roles: Roles,
    traits: AbilityTraits,
    radius: Radius,
    magnitude: Magnitude,
) -> AbilityRecord {
    AbilityRecord {
        id,
        shape,
        effect,
        roles,
        traits,
        radius,
        magnitude,
        summon: None,
    }
}

const fn roll(base: i32, n: u8, s: u8, num: i32, den: i32) -> Magnitude {
    Magnitude::Roll {
        base,
        n,
        s,
        num,
        den,
    }
}

const fn breath(id: AbilityId, effect: EffectKind, divisor: i32, cap: i32) -> AbilityRecord {
    rec(
        id,
        DeliveryShape::Breath,
        effect,
        Roles::ATTACK,
        AbilityTraits::INNATE,
        Radius::Standard,
        Magnitude::Breath { divisor, cap },
    )
}

const fn ball(id: AbilityId, effect: EffectKind, radius: Radius, magnitude: Magnitude) -> AbilityRecord {
    rec(
        id,
        DeliveryShape::Ball,
        effect,
        Roles::ATTACK,
        AbilityTraits::empty(),
        radius,
        magnitude,
    )
}

const fn bolt(id: AbilityId, effect: EffectKind, magnitude: Magnitude) -> AbilityRecord {
    rec(
        id,
        DeliveryShape::Bolt,
        effect,
        Roles::ATTACK,
        AbilityTraits::empty(),
        Radius::None,
        magnitude,
    )
}

const fn aimed(id: AbilityId, effect: EffectKind, roles: Roles, magnitude: Magnitude) -> AbilityRecord {
    rec(
        id,
        DeliveryShape::Point,
        effect,
        roles,
        AbilityTraits::empty(),
        Radius::None,
        magnitude,
    )
}

const fn on_self(id: AbilityId, effect: EffectKind, roles: Roles, traits: AbilityTraits) -> AbilityRecord {
    rec(
        id,
        DeliveryShape::Point,
        effect,
        roles,
        traits.union(AbilityTraits::SELF_TARGET),
        Radius::None,
        Magnitude::None,
    )
}

const fn summon(id: AbilityId, kind: SummonKind, base: i32, s: u8) -> AbilityRecord {
    AbilityRecord {
        id,
        shape: DeliveryShape::Point,
        effect: EffectKind::Summon,
        roles: Roles::SUMMON,
        traits: AbilityTraits::empty(),
        radius: Radius::None,
        magnitude: roll(base, 1, s, 0, 1),
        summon: Some(kind),
    }
}

const STATUS: Magnitude = Magnitude::Level { num: 1, den: 1 };

use AbilityId as A;
use EffectKind as E;

/// The ability table, in declaration order of [`AbilityId`].
pub static ABILITY_TABLE: [AbilityRecord; 92] = [
    // Group A
    on_self(
        A::Shriek,
        E::Shriek,
        Roles::ANNOY,
        AbilityTraits::INNATE.union(AbilityTraits::RIDING_UNSAFE),
    ),
    aimed(A::Dispel, E::Dispel, Roles::DISPEL, Magnitude::None),
    rec(
        A::Rocket,
        DeliveryShape::Ball,
        E::Rocket,
        Roles::ATTACK,
        AbilityTraits::INNATE.union(AbilityTraits::CLEAN_SHOT),
        Radius::Fixed(2),
        Magnitude::Breath { divisor: 4, cap: 800 },
    ),
    rec(
        A::Shoot,
        DeliveryShape::Bolt,
        E::Arrow,
        Roles::ATTACK,
        AbilityTraits::INNATE,
        Radius::None,
        roll(0, 3, 6, 1, 4),
    ),
    breath(A::BreathAcid, E::Acid, 3, 1600),
    breath(A::BreathElec, E::Elec, 3, 1600),
    breath(A::BreathFire, E::Fire, 3, 1600),
    breath(A::BreathCold, E::Cold, 3, 1600),
    breath(A::BreathPoison, E::Poison, 3, 800),
    breath(A::BreathNether, E::Nether, 6, 550),
    breath(A::BreathLight, E::Light, 6, 400),
    breath(A::BreathDark, E::Dark, 6, 400),
    breath(A::BreathConfusion, E::Confusion, 6, 400),
    breath(A::BreathSound, E::Sound, 6, 450),
    breath(A::BreathChaos, E::Chaos, 6, 600),
    breath(A::BreathDisenchant, E::Disenchant, 6, 500),
    breath(A::BreathNexus, E::Nexus, 3, 250),
    breath(A::BreathTime, E::Time, 3, 150),
    breath(A::BreathInertia, E::Inertia, 6, 200),
    breath(A::BreathGravity, E::Gravity, 3, 200),
    breath(A::BreathShards, E::Shards, 6, 500),
    breath(A::BreathPlasma, E::Plasma, 6, 150),
    breath(A::BreathForce, E::Force, 6, 200),
    breath(A::BreathMana, E::Mana, 3, 250),
    ball(A::BallNuke, E::Nuke, Radius::Standard, roll(0, 10, 6, 1, 1)),
    breath(A::BreathNuke, E::Nuke, 3, 800),
    ball(A::BallChaos, E::Chaos, Radius::Big, roll(0, 10, 10, 2, 1)),
    breath(A::BreathDisintegrate, E::Disintegrate, 6, 150),
    // Group B
    ball(A::BallAcid, E::Acid, Radius::Standard, roll(15, 3, 10, 3, 2)),
    ball(A::BallElec, E::Elec, Radius::Standard, roll(8, 3, 8, 3, 2)),
    ball(A::BallFire, E::Fire, Radius::Standard, roll(10, 3, 10, 7, 2)),
    ball(A::BallCold, E::Cold, Radius::Standard, roll(10, 3, 10, 3, 2)),
    ball(A::BallPoison, E::Poison, Radius::Standard, roll(0, 12, 2, 0, 1)),
    ball(A::BallNether, E::Nether, Radius::Standard, roll(50, 10, 10, 1, 1)),
    ball(A::BallWater, E::Water, Radius::Big, roll(50, 10, 10, 5, 2)),
    ball(A::BallMana, E::Mana, Radius::Big, roll(0, 10, 10, 4, 1)),
    ball(A::BallDark, E::Dark, Radius::Big, roll(0, 10, 10, 4, 1)),
    aimed(A::DrainMana, E::DrainMana, Roles::ANNOY, Magnitude::Level { num: 1, den: 2 }),
    aimed(A::MindBlast, E::MindBlast, Roles::ANNOY, roll(0, 7, 8, 0, 1)),
    aimed(A::BrainSmash, E::BrainSmash, Roles::ANNOY, roll(0, 12, 15, 0, 1)),
    aimed(
        A::CauseLight,
        E::Wounds,
        Roles::ATTACK.union(Roles::ANNOY),
        roll(0, 3, 8, 0, 1),
    ),
    aimed(
        A::CauseSerious,
        E::Wounds,
        Roles::ATTACK.union(Roles::ANNOY),
        roll(0, 8, 8, 0, 1),
    ),
    aimed(
        A::CauseCritical,
        E::Wounds,
        Roles::ATTACK.union(Roles::ANNOY),
        roll(0, 10, 15, 0, 1),
    ),
    aimed(A::CauseMortal, E::Wounds, Roles::ATTACK, roll(0, 15, 15, 0, 1)),
    bolt(A::BoltAcid, E::Acid, roll(0, 7, 8, 1, 3)),
    bolt(A::BoltElec, E::Elec, roll(0, 4, 8, 1, 3)),
    bolt(A::BoltFire, E::Fire, roll(0, 9, 8, 1, 3)),
    bolt(A::BoltCold, E::Cold, roll(0, 6, 8, 1, 3)),
    ball(A::BallLight, E::Light, Radius::Big, roll(0, 10, 10, 4, 1)),
    bolt(A::BoltNether, E::Nether, roll(30, 5, 5, 3, 2)),
    bolt(A::BoltWater, E::Water, roll(0, 10, 10, 1, 1)),
    bolt(A::BoltMana, E::Mana, roll(50, 1, 50, 7, 2)),
    bolt(A::BoltPlasma, E::Plasma, roll(10, 8, 7, 1, 1)),
    bolt(A::BoltIce, E::Ice, roll(0, 6, 6, 1, 1)),
    bolt(A::MagicMissile, E::Missile, roll(0, 2, 4, 1, 3)),
    aimed(A::Scare, E::Scare, Roles::ANNOY, STATUS),
    aimed(A::Blind, E::Blind, Roles::ANNOY, STATUS),
    aimed(A::Confuse, E::Confusion, Roles::ANNOY, STATUS),
    aimed(A::Slow, E::Slow, Roles::ANNOY, STATUS),
    aimed(A::Hold, E::Paralyze, Roles::ANNOY, STATUS),
    // Group C
    on_self(A::Haste, E::Haste, Roles::HASTE, AbilityTraits::empty()),
    aimed(A::HandOfDoom, E::Doom, Roles::ATTACK, roll(40, 1, 20, 0, 1)),
    rec(
        A::Heal,
        DeliveryShape::Point,
        E::Heal,
        Roles::HEAL,
        AbilityTraits::SELF_TARGET,
        Radius::None,
        Magnitude::Level { num: 6, den: 1 },
    ),
    on_self(
        A::Invulnerability,
        E::Invulnerability,
        Roles::INVULNER,
        AbilityTraits::empty(),
    ),
    on_self(
        A::Blink,
        E::Blink,
        Roles::TACTIC.union(Roles::ESCAPE),
        AbilityTraits::TELEPORT.union(AbilityTraits::RIDING_UNSAFE),
    ),
    on_self(
        A::Teleport,
        E::Teleport,
        Roles::ESCAPE,
        AbilityTraits::TELEPORT.union(AbilityTraits::RIDING_UNSAFE),
    ),
    on_self(A::TimeStop, E::TimeStop, Roles::BUFF, AbilityTraits::empty()),
    rec(
        A::Special,
        DeliveryShape::Special,
        E::Special,
        Roles::SPECIAL,
        AbilityTraits::INNATE.union(AbilityTraits::RIDING_UNSAFE),
        Radius::None,
        Magnitude::None,
    ),
    rec(
        A::TeleportTo,
        DeliveryShape::Point,
        E::TeleportTo,
        Roles::ANNOY,
        AbilityTraits::TELEPORT,
        Radius::None,
        Magnitude::None,
    ),
    rec(
        A::TeleportAway,
        DeliveryShape::Point,
        E::TeleportAway,
        Roles::ESCAPE,
        AbilityTraits::TELEPORT,
        Radius::None,
        Magnitude::None,
    ),
    rec(
        A::TeleportLevel,
        DeliveryShape::Point,
        E::TeleportLevel,
        Roles::ESCAPE.union(Roles::ANNOY),
        AbilityTraits::TELEPORT,
        Radius::None,
        Magnitude::None,
    ),
    rec(
        A::PsychicSpear,
        DeliveryShape::Beam,
        E::PsychicSpear,
        Roles::ATTACK.union(Roles::UNIQUE_BEAM),
        AbilityTraits::empty(),
        Radius::None,
        roll(100, 1, 100, 3, 1),
    ),
    on_self(
        A::Darkness,
        E::Darkness,
        Roles::ANNOY,
        AbilityTraits::RIDING_UNSAFE,
    ),
    rec(
        A::CreateTraps,
        DeliveryShape::Point,
        E::Traps,
        Roles::ANNOY,
        AbilityTraits::RIDING_UNSAFE,
        Radius::None,
        Magnitude::None,
    ),
    aimed(A::Forget, E::Amnesia, Roles::ANNOY, Magnitude::None),
    rec(
        A::RaiseDead,
        DeliveryShape::Point,
        E::RaiseDead,
        Roles::RAISE,
        AbilityTraits::SELF_TARGET,
        Radius::Fixed(5),
        Magnitude::None,
    ),
    summon(A::SummonKin, SummonKind::Kin, 1, 3),
    summon(A::SummonCyberdemon, SummonKind::Cyberdemon, 0, 2),
    summon(A::SummonMonster, SummonKind::Monster, 0, 1),
    summon(A::SummonMonsters, SummonKind::Monster, 4, 3),
    summon(A::SummonAnts, SummonKind::Ant, 2, 3),
    summon(A::SummonSpiders, SummonKind::Spider, 2, 3),
    summon(A::SummonHounds, SummonKind::Hound, 2, 3),
    summon(A::SummonHydras, SummonKind::Hydra, 2, 3),
    summon(A::SummonAngel, SummonKind::Angel, 0, 1),
    summon(A::SummonDemon, SummonKind::Demon, 0, 1),
    summon(A::SummonUndead, SummonKind::Undead, 0, 1),
    summon(A::SummonDragon, SummonKind::Dragon, 0, 1),
    summon(A::SummonGreaterUndead, SummonKind::GreaterUndead, 3, 3),
    summon(A::SummonAncientDragons, SummonKind::AncientDragon, 3, 3),
    summon(A::SummonAmberites, SummonKind::Amberite, 1, 2),
    summon(A::SummonUniques, SummonKind::Unique, 1, 2),
];

/// The static record for `id`.
pub fn record(id: AbilityId) -> &'static AbilityRecord {
    &ABILITY_TABLE[id.ordinal()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_table_follows_declaration_order() {
        assert_eq!(ABILITY_TABLE.len(), AbilityId::COUNT);
        for (row, id) in ABILITY_TABLE.iter().zip(AbilityId::iter()) {
            assert_eq!(row.id, id);
            assert_eq!(record(id).id, id);
        }
    }

    #[test]
    fn test_every_record_has_a_category() {
        for row in ABILITY_TABLE.iter() {
            assert!(!row.roles.is_empty(), "{} has no role", row.id);
            assert!(Category::from_roles(row.roles).is_some());
        }
    }

    #[test]
    fn test_precedence_resolves_overlaps() {
        assert_eq!(record(A::CauseSerious).category(), Category::Attack);
        assert_eq!(record(A::PsychicSpear).category(), Category::UniqueBeam);
        assert_eq!(record(A::Blink).category(), Category::Tactic);
        assert_eq!(record(A::TeleportLevel).category(), Category::Escape);
        assert_eq!(record(A::Confuse).category(), Category::DebuffTarget);
        assert_eq!(record(A::TimeStop).category(), Category::BuffSelf);
    }

    #[test]
    fn test_requires_los_by_shape() {
        assert!(record(A::BoltFire).requires_los());
        assert!(record(A::BreathFire).requires_los());
        assert!(record(A::Scare).requires_los());
        assert!(!record(A::BallFire).requires_los());
        assert!(!record(A::Heal).requires_los());
        assert!(!record(A::SummonKin).requires_los());
    }

    #[test]
    fn test_breath_magnitude_is_capped_fraction() {
        let mut rng = GameRng::new(1);
        let m = record(A::BreathFire).magnitude;
        assert_eq!(m.roll(300, 20, false, &mut rng), 100);
        assert_eq!(m.roll(9000, 20, false, &mut rng), 1600);
    }

    #[test]
    fn test_powerful_doubles_level_term() {
        let m = roll(0, 0, 0, 1, 1);
        let mut rng = GameRng::new(1);
        assert_eq!(m.roll(10, 30, false, &mut rng), 30);
        assert_eq!(m.roll(10, 30, true, &mut rng), 60);
    }

    #[test]
    fn test_radius_classes() {
        assert_eq!(record(A::BallFire).radius.grids(false), 2);
        assert_eq!(record(A::BallFire).radius.grids(true), 3);
        assert_eq!(record(A::BallMana).radius.grids(false), 4);
        assert_eq!(record(A::Rocket).radius.grids(true), 2);
    }
}
