//! Category classification of surviving candidates

use crate::ability::{AbilityId, AbilitySet, Category, masks, record};

/// The filtered ability set with one [`Category`] per member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    set: AbilitySet,
    entries: Vec<(AbilityId, Category)>,
}

impl CandidateSet {
    pub fn classify(set: AbilitySet) -> Self {
        let entries = set.iter().map(|id| (id, record(id).category())).collect();
        Self { set, entries }
    }

    pub fn set(&self) -> AbilitySet {
        self.set
    }

    pub fn entries(&self) -> &[(AbilityId, Category)] {
        &self.entries
    }

    pub fn ids(&self) -> Vec<AbilityId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    pub fn contains(&self, id: AbilityId) -> bool {
        self.set.contains(id)
    }

    pub fn category_of(&self, id: AbilityId) -> Option<Category> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, category)| *category)
    }

    /// Members classified as `category`.
    pub fn in_category(&self, category: Category) -> AbilitySet {
        self.set & masks().category(category)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_member_gets_one_category() {
        let set = AbilitySet::from([
            AbilityId::BallFire,
            AbilityId::Teleport,
            AbilityId::Heal,
            AbilityId::PsychicSpear,
            AbilityId::CauseLight,
        ]);
        let candidates = CandidateSet::classify(set);
        assert_eq!(candidates.len(), 5);
        assert_eq!(candidates.category_of(AbilityId::BallFire), Some(Category::Attack));
        assert_eq!(candidates.category_of(AbilityId::Teleport), Some(Category::Escape));
        assert_eq!(candidates.category_of(AbilityId::Heal), Some(Category::HealSelf));
        assert_eq!(candidates.category_of(AbilityId::PsychicSpear), Some(Category::UniqueBeam));
        assert_eq!(candidates.category_of(AbilityId::CauseLight), Some(Category::Attack));
        assert_eq!(candidates.category_of(AbilityId::Blink), None);
    }

    #[test]
    fn test_in_category_matches_entries() {
        let candidates = CandidateSet::classify(AbilitySet::all());
        for (id, category) in candidates.entries() {
            assert!(candidates.in_category(*category).contains(*id));
        }
    }

    #[test]
    fn test_empty() {
        let candidates = CandidateSet::classify(AbilitySet::EMPTY);
        assert!(candidates.is_empty());
        assert!(candidates.ids().is_empty());
    }
}
