//! Ability identifiers
//!
//! Identifiers keep their legacy storage address: three 32-bit groups
//! (historically split by activation-cost tier) with `group_base + bit`
//! as the discriminant. The address is a storage detail only; nothing in the
//! engine infers meaning from a numeric range.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, IntoEnumIterator, IntoStaticStr};

/// Storage group of an ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum AbilityGroup {
    /// Innate attacks: shrieks, missiles, breaths
    A,
    /// Spells proper: balls, bolts, mind attacks, status effects
    B,
    /// Self magic, teleports, scripted specials and summons
    C,
}

impl AbilityGroup {
    pub const fn base(self) -> u8 {
        match self {
            AbilityGroup::A => 0,
            AbilityGroup::B => 32,
            AbilityGroup::C => 64,
        }
    }
}

/// Every special ability a monster can have.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumCount,
    IntoStaticStr,
)]
#[repr(u8)]
pub enum AbilityId {
    // Group A
    Shriek = 0,
    Dispel = 2,
    Rocket = 3,
    Shoot = 4,
    BreathAcid = 8,
    BreathElec = 9,
    BreathFire = 10,
    BreathCold = 11,
    BreathPoison = 12,
    BreathNether = 13,
    BreathLight = 14,
    BreathDark = 15,
    BreathConfusion = 16,
    BreathSound = 17,
    BreathChaos = 18,
    BreathDisenchant = 19,
    BreathNexus = 20,
    BreathTime = 21,
    BreathInertia = 22,
    BreathGravity = 23,
    BreathShards = 24,
    BreathPlasma = 25,
    BreathForce = 26,
    BreathMana = 27,
    BallNuke = 28,
    BreathNuke = 29,
    BallChaos = 30,
    BreathDisintegrate = 31,

    // Group B
    BallAcid = 32,
    BallElec = 33,
    BallFire = 34,
    BallCold = 35,
    BallPoison = 36,
    BallNether = 37,
    BallWater = 38,
    BallMana = 39,
    BallDark = 40,
    DrainMana = 41,
    MindBlast = 42,
    BrainSmash = 43,
    CauseLight = 44,
    CauseSerious = 45,
    CauseCritical = 46,
    CauseMortal = 47,
    BoltAcid = 48,
    BoltElec = 49,
    BoltFire = 50,
    BoltCold = 51,
    BallLight = 52,
    BoltNether = 53,
    BoltWater = 54,
    BoltMana = 55,
    BoltPlasma = 56,
    BoltIce = 57,
    MagicMissile = 58,
    Scare = 59,
    Blind = 60,
    Confuse = 61,
    Slow = 62,
    Hold = 63,

    // Group C
    Haste = 64,
    HandOfDoom = 65,
    Heal = 66,
    Invulnerability = 67,
    Blink = 68,
    Teleport = 69,
    TimeStop = 70,
    Special = 71,
    TeleportTo = 72,
    TeleportAway = 73,
    TeleportLevel = 74,
    PsychicSpear = 75,
    Darkness = 76,
    CreateTraps = 77,
    Forget = 78,
    RaiseDead = 79,
    SummonKin = 80,
    SummonCyberdemon = 81,
    SummonMonster = 82,
    SummonMonsters = 83,
    SummonAnts = 84,
    SummonSpiders = 85,
    SummonHounds = 86,
    SummonHydras = 87,
    SummonAngel = 88,
    SummonDemon = 89,
    SummonUndead = 90,
    SummonDragon = 91,
    SummonGreaterUndead = 92,
    SummonAncientDragons = 93,
    SummonAmberites = 94,
    SummonUniques = 95,
}

impl AbilityId {
    /// Storage address (`group_base + bit`).
    pub const fn index(self) -> u8 {
        self as u8
    }

    pub const fn group(self) -> AbilityGroup {
        match self.index() / 32 {
            0 => AbilityGroup::A,
            1 => AbilityGroup::B,
            _ => AbilityGroup::C,
        }
    }

    /// Bit position inside the storage group.
    pub const fn bit(self) -> u8 {
        self.index() % 32
    }

    /// Look an identifier up by storage address.
    pub fn from_index(index: u8) -> Option<AbilityId> {
        static BY_INDEX: OnceLock<[Option<AbilityId>; 128]> = OnceLock::new();
        let table = BY_INDEX.get_or_init(|| {
            let mut table = [None; 128];
            for id in AbilityId::iter() {
                table[id.index() as usize] = Some(id);
            }
            table
        });
        table.get(index as usize).copied().flatten()
    }

    /// Position of this identifier in declaration order, used to index the
    /// static record table.
    pub fn ordinal(self) -> usize {
        static ORDINALS: OnceLock<[u8; 128]> = OnceLock::new();
        let table = ORDINALS.get_or_init(|| {
            let mut table = [0u8; 128];
            for (ordinal, id) in AbilityId::iter().enumerate() {
                table[id.index() as usize] = ordinal as u8;
            }
            table
        });
        table[self.index() as usize] as usize
    }
}
