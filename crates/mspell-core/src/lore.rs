//! Player-facing bestiary of observed abilities
//!
//! Written by the engine after each successful, attributable cast. The
//! decision pipeline never reads it.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::ability::{AbilityId, AbilitySet};
use crate::race::RaceId;

/// What the player has seen one race do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoreRecord {
    pub observed: AbilitySet,
    /// Saturates at `u8::MAX`
    pub casts: u8,
    /// Times an observed cast killed the player
    pub deaths: u16,
}

/// Lore for every race, created lazily on first sighting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoreBook {
    records: HashMap<RaceId, LoreRecord>,
}

impl LoreBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, race: RaceId) -> Option<&LoreRecord> {
        self.records.get(&race)
    }

    pub fn has_observed(&self, race: RaceId, ability: AbilityId) -> bool {
        self.get(race).is_some_and(|r| r.observed.contains(ability))
    }

    /// Note a cast of `ability` by `race`.
    pub fn observe(&mut self, race: RaceId, ability: AbilityId) {
        let record = self.records.entry(race).or_default();
        record.observed.insert(ability);
        record.casts = record.casts.saturating_add(1);
    }

    pub fn note_death(&mut self, race: RaceId) {
        let record = self.records.entry(race).or_default();
        record.deaths = record.deaths.saturating_add(1);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RaceId, &LoreRecord)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_marks_ability() {
        let mut lore = LoreBook::new();
        assert!(lore.is_empty());
        lore.observe(RaceId(3), AbilityId::Blink);
        assert!(lore.has_observed(RaceId(3), AbilityId::Blink));
        assert!(!lore.has_observed(RaceId(3), AbilityId::Hold));
        assert!(!lore.has_observed(RaceId(4), AbilityId::Blink));
        assert_eq!(lore.get(RaceId(3)).map(|r| r.casts), Some(1));
    }

    #[test]
    fn test_cast_counter_saturates() {
        let mut lore = LoreBook::new();
        for _ in 0..300 {
            lore.observe(RaceId(1), AbilityId::MagicMissile);
        }
        assert_eq!(lore.get(RaceId(1)).map(|r| r.casts), Some(u8::MAX));
    }

    #[test]
    fn test_deaths() {
        let mut lore = LoreBook::new();
        lore.note_death(RaceId(2));
        lore.note_death(RaceId(2));
        let record = lore.get(RaceId(2)).copied().unwrap_or_default();
        assert_eq!(record.deaths, 2);
        assert!(record.observed.is_empty());
    }

    #[test]
    fn test_serde_keeps_records() {
        let mut lore = LoreBook::new();
        lore.observe(RaceId(5), AbilityId::BreathFire);
        let json = serde_json::to_string(&lore).unwrap();
        let back: LoreBook = serde_json::from_str(&json).unwrap();
        assert_eq!(back, lore);
    }
}
