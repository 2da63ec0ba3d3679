//! The world interface
//!
//! The engine decides; the world answers questions and carries out
//! projections. Implementors provide terrain queries ([`Geometry`]), actor
//! queries ([`ActorQuery`]) and effect resolution ([`Projector`]). See
//! [`crate::level::Level`] for a complete grid-based implementation.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::ability::{AbilityId, DeliveryShape, EffectKind, SummonKind};
use crate::actor::{ActorId, ActorView, CasterMind, PetPermissions};
use crate::geometry::{self, Point};
use crate::race::RaceId;
use crate::resist::Resistances;
use crate::rng::GameRng;

// ============================================================================
// Zone rules
// ============================================================================

bitflags! {
    /// Restrictions imposed by the current zone.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ZoneFlags: u8 {
        /// Only innate abilities work
        const NO_MAGIC = 1 << 0;
        /// Arena: no summoning, no level teleport
        const NO_SUMMON = 1 << 1;
        /// Scripted specials only for listed races
        const SCRIPTED_RESTRICTED = 1 << 2;
    }
}

impl Serialize for ZoneFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ZoneFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(ZoneFlags::from_bits_truncate(bits))
    }
}

/// Zone restrictions plus the races exempt from the scripted restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRules {
    pub flags: ZoneFlags,
    #[serde(default)]
    pub scripted_allow: Vec<RaceId>,
}

impl ZoneRules {
    pub fn allows_scripted(&self, race: RaceId) -> bool {
        !self.flags.contains(ZoneFlags::SCRIPTED_RESTRICTED) || self.scripted_allow.contains(&race)
    }
}

// ============================================================================
// Projection requests
// ============================================================================

bitflags! {
    /// Resolution flags passed along with a projection.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ProjectFlags: u16 {
        /// Stop at the first actor
        const STOP = 1 << 0;
        /// Continue past the target grid
        const THRU = 1 << 1;
        /// Affect every grid along the path
        const BEAM = 1 << 2;
        const REFLECTABLE = 1 << 3;
        /// Aimed straight at the target grid
        const AIMED = 1 << 4;
        /// No visual
        const HIDE = 1 << 5;
        /// Affect terrain
        const GRID = 1 << 6;
        /// Affect floor items
        const ITEM = 1 << 7;
        /// Affect actors
        const KILL = 1 << 8;
        /// Start at the target without tracing a path
        const JUMP = 1 << 9;
        /// Cone-shaped area
        const ARC = 1 << 10;
        /// Destroys walls it reaches
        const DISI = 1 << 11;
    }
}

/// One projection for the world to resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRequest {
    pub source: ActorId,
    pub ability: AbilityId,
    pub origin: Point,
    /// Aim point: target grid, ball impact grid, or the caster's own grid
    pub target: Point,
    pub shape: DeliveryShape,
    pub radius: u32,
    pub effect: EffectKind,
    pub magnitude: i32,
    pub flags: ProjectFlags,
    pub summon: Option<SummonKind>,
    pub range: u32,
}

/// What a projection did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectOutcome {
    pub affected: Vec<ActorId>,
    /// Total damage dealt
    pub damage: i32,
    pub target_died: bool,
    pub reflected: bool,
    /// Grids whose terrain changed
    pub terrain_changed: usize,
    pub summoned: Vec<ActorId>,
}

impl ProjectOutcome {
    pub fn merge(&mut self, other: ProjectOutcome) {
        self.affected.extend(other.affected);
        self.damage += other.damage;
        self.target_died |= other.target_died;
        self.reflected |= other.reflected;
        self.terrain_changed += other.terrain_changed;
        self.summoned.extend(other.summoned);
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Terrain and line queries.
pub trait Geometry {
    fn in_bounds(&self, p: Point) -> bool;

    /// Projections can pass through `p`.
    fn is_open(&self, p: Point) -> bool;

    fn line_of_sight(&self, from: Point, to: Point) -> bool;

    /// Path a projection takes from `from` toward `to`, ending before the
    /// first grid that blocks it.
    fn project_path(&self, from: Point, to: Point, range: u32, past_target: bool) -> Vec<Point> {
        geometry::line_path(from, to, range, past_target)
            .into_iter()
            .take_while(|p| self.in_bounds(*p) && self.is_open(*p))
            .collect()
    }

    /// A projection from `from` reaches `to`.
    fn projectable(&self, from: Point, to: Point, range: u32) -> bool {
        from == to || self.project_path(from, to, range, false).last() == Some(&to)
    }

    /// A summoned creature could appear near `p`.
    fn summon_possible(&self, near: Point) -> bool;

    /// A corpse lies within `radius` of `center`.
    fn corpse_in_range(&self, center: Point, radius: u32) -> bool;

    /// Grids a ball of `radius` bursting at `center` reaches.
    fn ball_area(&self, center: Point, radius: u32) -> Vec<Point> {
        geometry::disc(center, radius)
            .into_iter()
            .filter(|p| self.in_bounds(*p) && self.projectable(center, *p, radius))
            .collect()
    }

    /// Grids a breath cone from `origin` toward `target` reaches.
    fn breath_area(&self, origin: Point, target: Point, radius: u32, range: u32) -> Vec<Point> {
        geometry::cone(origin, target, radius)
            .into_iter()
            .filter(|p| self.in_bounds(*p) && self.projectable(origin, *p, range))
            .collect()
    }
}

/// Actor and zone queries.
pub trait ActorQuery {
    fn actor(&self, id: ActorId) -> Option<ActorView>;

    fn actor_ids(&self) -> Vec<ActorId>;

    fn actor_at(&self, p: Point) -> Option<ActorId>;

    fn are_enemies(&self, a: ActorId, b: ActorId) -> bool;

    /// True resistance profile.
    fn resistances(&self, id: ActorId) -> Resistances;

    /// What `owner` lets its pets do.
    fn owner_permissions(&self, owner: ActorId) -> PetPermissions;

    /// Who is riding `mount`, if anyone.
    fn rider_of(&self, mount: ActorId) -> Option<ActorId>;

    /// `id` carries something a dispel would strip.
    fn dispellable(&self, id: ActorId) -> bool;

    fn mind(&self, id: ActorId) -> Option<&CasterMind>;

    fn zone(&self) -> &ZoneRules;

    fn time_stop_active(&self) -> bool;

    /// Some living actor of `race`.
    fn find_race(&self, race: RaceId) -> Option<ActorId> {
        self.actor_ids().into_iter().find(|id| {
            self.actor(*id)
                .is_some_and(|a| a.is_alive() && a.race == Some(race))
        })
    }
}

/// Carries out projections.
pub trait Projector {
    fn project(&mut self, request: &ProjectRequest, rng: &mut GameRng) -> ProjectOutcome;
}

/// Everything the engine needs from the host.
pub trait World: Geometry + ActorQuery + Projector {
    fn mind_mut(&mut self, id: ActorId) -> Option<&mut CasterMind>;

    /// Place a new actor of `race` near `near`, on `ally_of`'s side when
    /// given.
    fn spawn(&mut self, race: RaceId, near: Point, hp: i32, ally_of: Option<ActorId>) -> Option<ActorId>;

    fn remove(&mut self, id: ActorId);
}

// ============================================================================
// Shared queries
// ============================================================================

/// No friend of `caster` stands on the line from `from` to `to`.
///
/// With `past_target` the line runs on to `range` and anyone beyond the
/// target counts too.
pub fn clean_shot<W>(world: &W, caster: ActorId, from: Point, to: Point, range: u32, past_target: bool) -> bool
where
    W: Geometry + ActorQuery + ?Sized,
{
    world
        .project_path(from, to, range, past_target)
        .into_iter()
        .filter(|p| past_target || *p != to)
        .filter_map(|p| world.actor_at(p))
        .all(|id| id == caster || world.are_enemies(caster, id))
}
