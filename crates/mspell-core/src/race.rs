//! Monster races
//!
//! Static data for each kind of caster: level, how often it casts, what it
//! knows and how clever it is about using it.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::ability::{AbilityId, AbilitySet};
use crate::error::EngineError;
use crate::special::SpecialBehavior;

/// Index into the race table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct RaceId(pub u16);

impl std::fmt::Display for RaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "race {}", self.0)
    }
}

bitflags! {
    /// Behavioral flags of a race.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RaceFlags: u8 {
        /// Avoids resisted attacks and flees when desperate
        const SMART = 1 << 0;
        /// Picks abilities blindly and never fumbles
        const STUPID = 1 << 1;
        /// Bigger blasts and harder hits
        const POWERFUL = 1 << 2;
        const UNIQUE = 1 << 3;
    }
}

impl Serialize for RaceFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RaceFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(RaceFlags::from_bits_truncate(bits))
    }
}

/// Static description of one race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterRace {
    pub id: RaceId,
    pub name: String,
    pub level: u8,
    /// Chance in percent of using an ability on a given turn
    pub spell_freq: u8,
    #[serde(default)]
    pub flags: RaceFlags,
    pub abilities: AbilitySet,
    #[serde(default)]
    pub special: SpecialBehavior,
}

impl MonsterRace {
    pub fn is_smart(&self) -> bool {
        self.flags.contains(RaceFlags::SMART)
    }

    pub fn is_stupid(&self) -> bool {
        self.flags.contains(RaceFlags::STUPID)
    }

    pub fn is_powerful(&self) -> bool {
        self.flags.contains(RaceFlags::POWERFUL)
    }
}

/// Every race, indexed by [`RaceId`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RaceTable {
    races: Vec<MonsterRace>,
}

impl RaceTable {
    /// Build a table, checking that every entry sits at its own index.
    pub fn new(races: Vec<MonsterRace>) -> Result<Self, EngineError> {
        for (index, race) in races.iter().enumerate() {
            if race.id.0 as usize != index {
                return Err(EngineError::MisnumberedRace {
                    expected: index as u16,
                    found: race.id.0,
                });
            }
        }
        Ok(Self { races })
    }

    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let races: Vec<MonsterRace> = serde_json::from_str(json)?;
        Self::new(races)
    }

    pub fn get(&self, id: RaceId) -> Option<&MonsterRace> {
        self.races.get(id.0 as usize)
    }

    pub fn find(&self, name: &str) -> Option<&MonsterRace> {
        self.races.iter().find(|r| r.name == name)
    }

    /// Abilities the race knows; empty for unknown races.
    pub fn abilities(&self, id: RaceId) -> AbilitySet {
        self.get(id).map(|r| r.abilities).unwrap_or_default()
    }

    pub fn can_use(&self, id: RaceId, ability: AbilityId) -> bool {
        self.abilities(id).contains(ability)
    }

    pub fn len(&self) -> usize {
        self.races.len()
    }

    pub fn is_empty(&self) -> bool {
        self.races.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonsterRace> {
        self.races.iter()
    }

    /// A small built-in bestiary covering every kind of caster.
    pub fn builtin() -> Self {
        use AbilityId::*;

        let race = |id: u16, name: &str, level: u8, spell_freq: u8, flags: RaceFlags, abilities: &[AbilityId]| {
            MonsterRace {
                id: RaceId(id),
                name: name.to_string(),
                level,
                spell_freq,
                flags,
                abilities: abilities.iter().copied().collect(),
                special: SpecialBehavior::None,
            }
        };

        let mut races = vec![
            race(0, "kobold shaman", 4, 20, RaceFlags::empty(), &[MagicMissile]),
            race(
                1,
                "dark elven priest",
                10,
                20,
                RaceFlags::SMART,
                &[Blind, Confuse, Scare, CauseSerious, Darkness, Heal],
            ),
            race(
                2,
                "young red dragon",
                30,
                9,
                RaceFlags::POWERFUL,
                &[BreathFire, Scare],
            ),
            race(
                3,
                "lich",
                34,
                25,
                RaceFlags::SMART,
                &[
                    Blink, TeleportTo, Blind, Hold, Slow, Scare, CauseCritical, DrainMana,
                    BrainSmash,
                ],
            ),
            race(
                4,
                "Banor",
                40,
                20,
                RaceFlags::SMART | RaceFlags::UNIQUE,
                &[Special, Heal, Blink, CauseCritical, BoltCold, BoltFire],
            ),
            race(
                5,
                "Lupart",
                40,
                20,
                RaceFlags::SMART | RaceFlags::UNIQUE,
                &[Special, Haste, Teleport, BallElec, BoltElec, Scare],
            ),
            race(
                6,
                "Banor=Lupart",
                45,
                25,
                RaceFlags::SMART | RaceFlags::UNIQUE | RaceFlags::POWERFUL,
                &[Special, Heal, Haste, BallFire, BallCold, BallElec, BoltMana],
            ),
            race(
                7,
                "Rolento",
                30,
                25,
                RaceFlags::UNIQUE,
                &[Special, BallFire, Blink],
            ),
            race(8, "hand grenade", 1, 0, RaceFlags::STUPID, &[]),
            race(9, "diving raptor", 12, 10, RaceFlags::empty(), &[Special, Shriek]),
            race(
                10,
                "archmage",
                50,
                50,
                RaceFlags::SMART,
                &[
                    Blink, Teleport, TeleportAway, Heal, Haste, Invulnerability, TimeStop,
                    BoltFire, BoltCold, BallFire, BallCold, BallMana, Confuse, Slow,
                    SummonMonster, SummonUndead, Dispel, RaiseDead, PsychicSpear,
                ],
            ),
            race(
                11,
                "cave orc",
                7,
                0,
                RaceFlags::STUPID,
                &[],
            ),
        ];

        races[4].special = SpecialBehavior::MergeHalf {
            partner: RaceId(5),
            combined: RaceId(6),
        };
        races[5].special = SpecialBehavior::MergeHalf {
            partner: RaceId(4),
            combined: RaceId(6),
        };
        races[6].special = SpecialBehavior::MergedWhole {
            halves: [RaceId(4), RaceId(5)],
        };
        races[7].special = SpecialBehavior::GrenadeThrower { minion: RaceId(8) };
        races[9].special = SpecialBehavior::DiveBomber;

        Self { races }
    }
}
