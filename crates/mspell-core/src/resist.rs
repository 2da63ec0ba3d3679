//! Resistances, the per-caster resistance ledger and suppression rules
//!
//! A caster only avoids what it believes the target resists. That belief
//! comes from the ledger (what earlier casts revealed) and, when cheating is
//! enabled, from the target's true profile.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use tracing::trace;

use crate::ability::{AbilityId, AbilitySet};
use crate::actor::ActorId;
use crate::rng::GameRng;

// ============================================================================
// Kinds and profiles
// ============================================================================

/// Something a target can resist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[repr(u8)]
pub enum ResistKind {
    Acid,
    Elec,
    Fire,
    Cold,
    Poison,
    Nether,
    Light,
    Dark,
    Fear,
    Confusion,
    Chaos,
    Disenchant,
    Blindness,
    Nexus,
    Sound,
    Shards,
}

impl ResistKind {
    pub const fn flag(self) -> ResistSet {
        ResistSet::from_bits_truncate(1 << self as u32)
    }
}

bitflags! {
    /// One bit per [`ResistKind`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ResistSet: u32 {
        const ACID = 1 << 0;
        const ELEC = 1 << 1;
        const FIRE = 1 << 2;
        const COLD = 1 << 3;
        const POISON = 1 << 4;
        const NETHER = 1 << 5;
        const LIGHT = 1 << 6;
        const DARK = 1 << 7;
        const FEAR = 1 << 8;
        const CONFUSION = 1 << 9;
        const CHAOS = 1 << 10;
        const DISENCHANT = 1 << 11;
        const BLINDNESS = 1 << 12;
        const NEXUS = 1 << 13;
        const SOUND = 1 << 14;
        const SHARDS = 1 << 15;
    }
}

bitflags! {
    /// Defenses that are not resistances to an element.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Defenses: u8 {
        /// Bounces bolts back
        const REFLECT = 1 << 0;
        /// Immune to slowing and paralysis
        const FREE_ACTION = 1 << 1;
        /// Nothing to drain
        const NO_MANA = 1 << 2;
    }
}

impl Serialize for ResistSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResistSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        Ok(ResistSet::from_bits_truncate(bits))
    }
}

impl Serialize for Defenses {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Defenses {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(Defenses::from_bits_truncate(bits))
    }
}

/// How strongly a kind is resisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
pub enum ResistLevel {
    None,
    Single,
    /// Permanent and temporary resistance together
    Double,
    Immune,
}

/// A target's resistance profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resistances {
    /// Permanent resistances
    pub resist: ResistSet,
    /// Temporary resistances
    pub oppose: ResistSet,
    pub immune: ResistSet,
    pub defenses: Defenses,
}

impl Resistances {
    pub fn level_for(&self, kind: ResistKind) -> ResistLevel {
        let flag = kind.flag();
        if self.immune.contains(flag) {
            ResistLevel::Immune
        } else if self.resist.contains(flag) && self.oppose.contains(flag) {
            ResistLevel::Double
        } else if self.resist.contains(flag) || self.oppose.contains(flag) {
            ResistLevel::Single
        } else {
            ResistLevel::None
        }
    }

    /// Scale incoming damage of `kind` by resistance level.
    pub fn adjust_damage(&self, kind: ResistKind, damage: i32) -> i32 {
        match self.level_for(kind) {
            ResistLevel::Immune => 0,
            ResistLevel::Double => damage / 9,
            ResistLevel::Single => (damage + 2) / 3,
            ResistLevel::None => damage,
        }
    }

    pub fn union(&self, other: &Resistances) -> Resistances {
        Resistances {
            resist: self.resist | other.resist,
            oppose: self.oppose | other.oppose,
            immune: self.immune | other.immune,
            defenses: self.defenses | other.defenses,
        }
    }

    /// Copy the part of `actual` that `aspect` tests.
    fn copy_aspect(&mut self, actual: &Resistances, aspect: Aspect) {
        match aspect {
            Aspect::Resist(kind) => {
                let flag = kind.flag();
                self.resist.set(flag, actual.resist.contains(flag));
                self.oppose.set(flag, actual.oppose.contains(flag));
                self.immune.set(flag, actual.immune.contains(flag));
            }
            Aspect::Defense(defense) => {
                self.defenses.set(defense, actual.defenses.contains(defense));
            }
        }
    }
}

// ============================================================================
// Suppression
// ============================================================================

/// The resistance aspect a rule tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aspect {
    Resist(ResistKind),
    Defense(Defenses),
}

/// Clears `abilities` with the given percentage when the tested aspect is
/// believed present. Immunity always clears.
#[derive(Debug, Clone, Copy)]
pub struct SuppressionRule {
    pub aspect: Aspect,
    pub abilities: &'static [AbilityId],
    pub single: u32,
    pub double: u32,
}

const fn rule(aspect: Aspect, abilities: &'static [AbilityId], single: u32, double: u32) -> SuppressionRule {
    SuppressionRule {
        aspect,
        abilities,
        single,
        double,
    }
}

use AbilityId as A;
use ResistKind as K;

/// Every suppression rule, in evaluation order.
pub static SUPPRESSION_RULES: &[SuppressionRule] = &[
    rule(
        Aspect::Resist(K::Acid),
        &[A::BreathAcid, A::BallAcid, A::BoltAcid],
        30,
        80,
    ),
    rule(
        Aspect::Resist(K::Elec),
        &[A::BreathElec, A::BallElec, A::BoltElec],
        30,
        80,
    ),
    rule(
        Aspect::Resist(K::Fire),
        &[A::BreathFire, A::BallFire, A::BoltFire],
        30,
        80,
    ),
    rule(
        Aspect::Resist(K::Cold),
        &[A::BreathCold, A::BallCold, A::BoltCold, A::BoltIce],
        30,
        80,
    ),
    rule(
        Aspect::Resist(K::Poison),
        &[A::BreathPoison, A::BallPoison, A::BallNuke, A::BreathNuke],
        30,
        80,
    ),
    rule(
        Aspect::Resist(K::Nether),
        &[A::BreathNether, A::BallNether, A::BoltNether],
        50,
        50,
    ),
    rule(Aspect::Resist(K::Light), &[A::BreathLight, A::BallLight], 50, 50),
    rule(Aspect::Resist(K::Dark), &[A::BreathDark, A::BallDark], 50, 50),
    rule(Aspect::Resist(K::Fear), &[A::Scare], 100, 100),
    rule(Aspect::Resist(K::Confusion), &[A::BreathConfusion], 50, 50),
    rule(Aspect::Resist(K::Confusion), &[A::Confuse], 100, 100),
    rule(Aspect::Resist(K::Chaos), &[A::BreathChaos, A::BallChaos], 20, 20),
    rule(Aspect::Resist(K::Disenchant), &[A::BreathDisenchant], 40, 40),
    rule(Aspect::Resist(K::Blindness), &[A::Blind], 100, 100),
    rule(Aspect::Resist(K::Nexus), &[A::BreathNexus], 50, 50),
    rule(Aspect::Resist(K::Nexus), &[A::TeleportLevel], 100, 100),
    rule(Aspect::Resist(K::Sound), &[A::BreathSound], 50, 50),
    rule(Aspect::Resist(K::Shards), &[A::BreathShards], 40, 40),
    rule(
        Aspect::Defense(Defenses::REFLECT),
        &[
            A::Shoot,
            A::BoltAcid,
            A::BoltElec,
            A::BoltFire,
            A::BoltCold,
            A::BoltNether,
            A::BoltWater,
            A::BoltMana,
            A::BoltPlasma,
            A::BoltIce,
            A::MagicMissile,
        ],
        150,
        150,
    ),
    rule(Aspect::Defense(Defenses::FREE_ACTION), &[A::Slow, A::Hold], 100, 100),
    rule(Aspect::Defense(Defenses::NO_MANA), &[A::DrainMana], 100, 100),
];

/// Percentage roll that is halved for casters without cunning.
pub fn int_outof(percent: u32, smart: bool, rng: &mut GameRng) -> bool {
    let percent = if smart { percent } else { percent / 2 };
    rng.percent(percent)
}

/// Remove abilities the caster believes `known` makes pointless.
///
/// Only rules touching a surviving ability roll, once per ability they
/// touch. The result is always a
/// subset of `set`.
pub fn suppress(set: AbilitySet, known: &Resistances, smart: bool, rng: &mut GameRng) -> AbilitySet {
    let mut out = set;
    for rule in SUPPRESSION_RULES {
        let affected = rule.abilities.iter().copied().collect::<AbilitySet>() & out;
        if affected.is_empty() {
            continue;
        }
        let percent = match rule.aspect {
            Aspect::Resist(kind) => match known.level_for(kind) {
                ResistLevel::Immune => {
                    trace!(%kind, "immunity clears {affected}");
                    out = out.without(affected);
                    continue;
                }
                ResistLevel::Double => rule.double,
                ResistLevel::Single => rule.single,
                ResistLevel::None => continue,
            },
            Aspect::Defense(defense) => {
                if !known.defenses.contains(defense) {
                    continue;
                }
                rule.single
            }
        };
        for ability in affected.iter() {
            if int_outof(percent, smart, rng) {
                trace!(percent, "suppressed {ability}");
                out.remove(ability);
            }
        }
    }
    out
}

/// Aspects a cast of `ability` reveals about its target.
pub fn aspects_for(ability: AbilityId) -> impl Iterator<Item = Aspect> {
    SUPPRESSION_RULES
        .iter()
        .filter(move |rule| rule.abilities.contains(&ability))
        .map(|rule| rule.aspect)
}

// ============================================================================
// Ledger
// ============================================================================

/// What a caster has learned about one target's resistances.
///
/// The ledger tracks a single subject; learning about a new target starts
/// from a clean slate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResistanceLedger {
    pub subject: Option<ActorId>,
    pub known: Resistances,
}

impl ResistanceLedger {
    /// Believed profile of `target`; empty for anyone but the subject.
    pub fn knowledge_of(&self, target: ActorId) -> Resistances {
        if self.subject == Some(target) {
            self.known
        } else {
            Resistances::default()
        }
    }

    /// Record what casting `ability` at `target` revealed.
    pub fn learn(&mut self, target: ActorId, actual: &Resistances, ability: AbilityId) {
        if self.subject != Some(target) {
            self.subject = Some(target);
            self.known = Resistances::default();
        }
        for aspect in aspects_for(ability) {
            self.known.copy_aspect(actual, aspect);
        }
    }

    pub fn forget(&mut self) {
        self.subject = None;
        self.known = Resistances::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fire_set() -> AbilitySet {
        AbilitySet::from([A::BoltFire, A::BallFire, A::BoltCold])
    }

    #[test]
    fn test_level_for() {
        let r = Resistances {
            resist: ResistSet::FIRE | ResistSet::COLD,
            oppose: ResistSet::FIRE,
            immune: ResistSet::ACID,
            defenses: Defenses::empty(),
        };
        assert_eq!(r.level_for(K::Fire), ResistLevel::Double);
        assert_eq!(r.level_for(K::Cold), ResistLevel::Single);
        assert_eq!(r.level_for(K::Acid), ResistLevel::Immune);
        assert_eq!(r.level_for(K::Elec), ResistLevel::None);
    }

    #[test]
    fn test_adjust_damage() {
        let r = Resistances {
            resist: ResistSet::FIRE,
            immune: ResistSet::COLD,
            ..Default::default()
        };
        assert_eq!(r.adjust_damage(K::Fire, 30), 10);
        assert_eq!(r.adjust_damage(K::Cold, 30), 0);
        assert_eq!(r.adjust_damage(K::Acid, 30), 30);
    }

    #[test]
    fn test_immunity_always_suppresses() {
        let known = Resistances {
            immune: ResistSet::FIRE,
            ..Default::default()
        };
        for seed in 0..50 {
            let mut rng = GameRng::new(seed);
            let out = suppress(fire_set(), &known, false, &mut rng);
            assert_eq!(out, AbilitySet::single(A::BoltCold));
        }
    }

    #[test]
    fn test_unknown_resistance_suppresses_nothing() {
        let mut rng = GameRng::new(3);
        let out = suppress(fire_set(), &Resistances::default(), true, &mut rng);
        assert_eq!(out, fire_set());
    }

    #[test]
    fn test_status_resistance_clears_for_smart_casters() {
        let known = Resistances {
            resist: ResistSet::CONFUSION,
            ..Default::default()
        };
        let set = AbilitySet::from([A::Confuse, A::MagicMissile]);
        let mut rng = GameRng::new(11);
        assert_eq!(
            suppress(set, &known, true, &mut rng),
            AbilitySet::single(A::MagicMissile)
        );
    }

    #[test]
    fn test_dumb_casters_suppress_less_often() {
        let known = Resistances {
            resist: ResistSet::FIRE,
            oppose: ResistSet::FIRE,
            ..Default::default()
        };
        let set = AbilitySet::single(A::BoltFire);
        let mut smart_hits = 0;
        let mut dumb_hits = 0;
        for seed in 0..400 {
            let mut rng = GameRng::new(seed);
            if suppress(set, &known, true, &mut rng).is_empty() {
                smart_hits += 1;
            }
            let mut rng = GameRng::new(seed);
            if suppress(set, &known, false, &mut rng).is_empty() {
                dumb_hits += 1;
            }
        }
        assert!(smart_hits > dumb_hits);
        assert!((260..=360).contains(&smart_hits));
    }

    #[test]
    fn test_each_ability_rolls_on_its_own() {
        let known = Resistances {
            resist: ResistSet::FIRE,
            oppose: ResistSet::FIRE,
            ..Default::default()
        };
        let family = AbilitySet::from([A::BreathFire, A::BallFire, A::BoltFire]);
        let mut partial = 0;
        for seed in 0..1000 {
            let mut rng = GameRng::new(seed);
            let out = suppress(family, &known, true, &mut rng);
            if !out.is_empty() && out != family {
                partial += 1;
            }
        }
        // 1 - 0.8^3 - 0.2^3 of the runs keep part of the family
        assert!((400..=560).contains(&partial), "partial = {partial}");
    }

    #[test]
    fn test_suppression_is_subset() {
        let known = Resistances {
            resist: ResistSet::all(),
            defenses: Defenses::all(),
            ..Default::default()
        };
        for seed in 0..50 {
            let mut rng = GameRng::new(seed);
            let out = suppress(AbilitySet::all(), &known, true, &mut rng);
            assert!(out.is_subset(AbilitySet::all()));
        }
    }

    #[test]
    fn test_ledger_learns_revealed_aspects() {
        let actual = Resistances {
            resist: ResistSet::FIRE | ResistSet::COLD,
            defenses: Defenses::REFLECT,
            ..Default::default()
        };
        let mut ledger = ResistanceLedger::default();
        ledger.learn(ActorId(7), &actual, A::BoltFire);

        let known = ledger.knowledge_of(ActorId(7));
        assert_eq!(known.level_for(K::Fire), ResistLevel::Single);
        assert!(known.defenses.contains(Defenses::REFLECT));
        // cold was never revealed
        assert_eq!(known.level_for(K::Cold), ResistLevel::None);
        assert_eq!(ledger.knowledge_of(ActorId(8)), Resistances::default());
    }

    #[test]
    fn test_ledger_resets_on_new_subject() {
        let actual = Resistances {
            resist: ResistSet::FIRE,
            ..Default::default()
        };
        let mut ledger = ResistanceLedger::default();
        ledger.learn(ActorId(1), &actual, A::BallFire);
        ledger.learn(ActorId(2), &Resistances::default(), A::BallCold);
        assert_eq!(ledger.subject, Some(ActorId(2)));
        assert_eq!(ledger.known, Resistances::default());

        ledger.forget();
        assert_eq!(ledger.subject, None);
    }
}
