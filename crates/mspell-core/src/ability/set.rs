//! Ability sets
//!
//! A fixed-width bitset over [`AbilityId`] storage addresses. Only addresses
//! that name an ability are ever set.

use std::fmt;
use std::ops::{BitAnd, BitOr};
use std::sync::OnceLock;

use serde::de::{SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::IntoEnumIterator;

use super::id::{AbilityGroup, AbilityId};

/// Set of abilities, one bit per identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AbilitySet(u128);

impl AbilitySet {
    pub const EMPTY: AbilitySet = AbilitySet(0);

    /// Every defined ability.
    pub fn all() -> AbilitySet {
        static ALL: OnceLock<AbilitySet> = OnceLock::new();
        *ALL.get_or_init(|| AbilityId::iter().collect())
    }

    pub const fn single(id: AbilityId) -> AbilitySet {
        AbilitySet(1u128 << id.index())
    }

    /// Build a set from the three legacy storage groups. Bits that do not
    /// name an ability are dropped.
    pub fn from_groups(a: u32, b: u32, c: u32) -> AbilitySet {
        let raw = (a as u128)
            | ((b as u128) << AbilityGroup::B.base())
            | ((c as u128) << AbilityGroup::C.base());
        AbilitySet(raw & Self::all().0)
    }

    /// The storage word for one group.
    pub fn group_bits(self, group: AbilityGroup) -> u32 {
        (self.0 >> group.base()) as u32
    }

    pub const fn contains(self, id: AbilityId) -> bool {
        self.0 & (1u128 << id.index()) != 0
    }

    pub fn insert(&mut self, id: AbilityId) {
        self.0 |= 1u128 << id.index();
    }

    pub fn remove(&mut self, id: AbilityId) {
        self.0 &= !(1u128 << id.index());
    }

    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn is_subset(self, other: AbilitySet) -> bool {
        self.0 & !other.0 == 0
    }

    pub const fn intersects(self, other: AbilitySet) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: AbilitySet) -> AbilitySet {
        AbilitySet(self.0 | other.0)
    }

    pub const fn intersection(self, other: AbilitySet) -> AbilitySet {
        AbilitySet(self.0 & other.0)
    }

    /// `self` with every member of `other` cleared.
    pub const fn without(self, other: AbilitySet) -> AbilitySet {
        AbilitySet(self.0 & !other.0)
    }

    /// Iterate members in storage order.
    pub fn iter(self) -> impl Iterator<Item = AbilityId> {
        (0u8..128)
            .filter(move |bit| self.0 & (1u128 << bit) != 0)
            .filter_map(AbilityId::from_index)
    }
}

impl BitOr for AbilitySet {
    type Output = AbilitySet;

    fn bitor(self, rhs: AbilitySet) -> AbilitySet {
        self.union(rhs)
    }
}

impl BitAnd for AbilitySet {
    type Output = AbilitySet;

    fn bitand(self, rhs: AbilitySet) -> AbilitySet {
        self.intersection(rhs)
    }
}

impl FromIterator<AbilityId> for AbilitySet {
    fn from_iter<I: IntoIterator<Item = AbilityId>>(iter: I) -> Self {
        let mut set = AbilitySet::EMPTY;
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl<const N: usize> From<[AbilityId; N]> for AbilitySet {
    fn from(ids: [AbilityId; N]) -> Self {
        ids.into_iter().collect()
    }
}

impl fmt::Display for AbilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, id) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{id}")?;
        }
        write!(f, "}}")
    }
}

// Serialized as a list of ability names so race tables stay readable.
impl Serialize for AbilitySet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.len() as usize))?;
        for id in self.iter() {
            seq.serialize_element(&id)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for AbilitySet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SetVisitor;

        impl<'de> Visitor<'de> for SetVisitor {
            type Value = AbilitySet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a list of ability names")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<AbilitySet, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut set = AbilitySet::EMPTY;
                while let Some(id) = seq.next_element::<AbilityId>()? {
                    set.insert(id);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_seq(SetVisitor)
    }
}
