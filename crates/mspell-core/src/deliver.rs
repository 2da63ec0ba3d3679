//! Delivery and resolution
//!
//! Turns a chosen ability into a [`ProjectRequest`] for its shape and hands
//! it to the world. Scripted specials bypass the projector and run their
//! own behavior.

use tracing::debug;

use crate::ability::{AbilityId, DeliveryShape, EffectKind, record};
use crate::actor::ActorView;
use crate::geometry::Point;
use crate::race::MonsterRace;
use crate::race::RaceTable;
use crate::rng::GameRng;
use crate::world::{ActorQuery, Geometry, ProjectFlags, ProjectOutcome, ProjectRequest, World};

/// Blast radius of `ability` for a caster of the given power.
pub fn blast_radius(ability: AbilityId, powerful: bool) -> u32 {
    record(ability).radius.grids(powerful)
}

/// Where a ball thrown from `caster` at `target` bursts.
///
/// With a clear path the ball stops at the first actor on it (usually the
/// target). Otherwise it is thrown at the open grid next to the target that
/// is nearest the caster and still reaches the target. `None` when neither
/// works.
pub fn impact_point<W>(world: &W, caster: &ActorView, target: &ActorView, range: u32) -> Option<Point>
where
    W: Geometry + ActorQuery + ?Sized,
{
    let path = world.project_path(caster.pos, target.pos, range, false);
    if path.last() == Some(&target.pos) {
        return path
            .into_iter()
            .find(|p| world.actor_at(*p).is_some_and(|id| id != caster.id));
    }

    target
        .pos
        .neighbours()
        .into_iter()
        .filter(|p| {
            world.in_bounds(*p)
                && world.is_open(*p)
                && world.actor_at(*p).is_none()
                && world.projectable(caster.pos, *p, range)
                && world.projectable(*p, target.pos, 1)
        })
        .min_by_key(|p| caster.pos.distance(*p))
}

/// Projection flags for a shape.
pub fn shape_flags(shape: DeliveryShape, effect: EffectKind) -> ProjectFlags {
    match shape {
        DeliveryShape::Point => ProjectFlags::AIMED | ProjectFlags::HIDE | ProjectFlags::KILL,
        DeliveryShape::Bolt => ProjectFlags::STOP | ProjectFlags::KILL | ProjectFlags::REFLECTABLE,
        DeliveryShape::Beam => {
            ProjectFlags::BEAM | ProjectFlags::THRU | ProjectFlags::KILL | ProjectFlags::GRID
        }
        DeliveryShape::Ball => {
            ProjectFlags::STOP | ProjectFlags::KILL | ProjectFlags::GRID | ProjectFlags::ITEM
        }
        DeliveryShape::Breath => {
            let flags =
                ProjectFlags::ARC | ProjectFlags::KILL | ProjectFlags::GRID | ProjectFlags::ITEM;
            if effect == EffectKind::Disintegrate {
                flags | ProjectFlags::DISI
            } else {
                flags
            }
        }
        DeliveryShape::Special => ProjectFlags::empty(),
    }
}

/// Everything needed to resolve one chosen ability.
#[derive(Debug, Clone)]
pub struct CastPlan<'a> {
    pub ability: AbilityId,
    pub caster: &'a ActorView,
    pub race: &'a MonsterRace,
    pub target: &'a ActorView,
    /// Ball burst point computed while filtering
    pub impact: Option<Point>,
    pub range: u32,
}

/// What a resolved ability did.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub ability: AbilityId,
    pub shape: DeliveryShape,
    pub origin: Point,
    /// Grid the projection was aimed at
    pub aim: Point,
    pub radius: u32,
    pub magnitude: i32,
    pub outcome: ProjectOutcome,
}

/// Resolve `plan` against the world.
pub fn resolve<W: World + ?Sized>(
    world: &mut W,
    races: &RaceTable,
    plan: &CastPlan<'_>,
    rng: &mut GameRng,
) -> Resolution {
    let rec = record(plan.ability);
    let caster = plan.caster;
    let powerful = plan.race.is_powerful();
    let radius = rec.radius.grids(powerful);

    if rec.shape == DeliveryShape::Special {
        let outcome = plan
            .race
            .special
            .execute(world, races, caster, plan.target, rng);
        debug!("{} performs its special at {}", caster.id, plan.target.id);
        return Resolution {
            ability: plan.ability,
            shape: rec.shape,
            origin: caster.pos,
            aim: plan.target.pos,
            radius,
            magnitude: 0,
            outcome,
        };
    }

    let aim = match rec.shape {
        DeliveryShape::Point if rec.targets_self() => caster.pos,
        DeliveryShape::Ball => plan.impact.unwrap_or(plan.target.pos),
        _ => plan.target.pos,
    };
    let magnitude = rec
        .magnitude
        .roll(caster.hp, plan.race.level, powerful, rng);

    let request = ProjectRequest {
        source: caster.id,
        ability: plan.ability,
        origin: caster.pos,
        target: aim,
        shape: rec.shape,
        radius,
        effect: rec.effect,
        magnitude,
        flags: shape_flags(rec.shape, rec.effect),
        summon: rec.summon,
        range: plan.range,
    };
    let outcome = world.project(&request, rng);
    debug!(
        "{} resolves {} ({}) at ({}, {}) for {magnitude}",
        caster.id, plan.ability, rec.shape, aim.x, aim.y
    );

    Resolution {
        ability: plan.ability,
        shape: rec.shape,
        origin: caster.pos,
        aim,
        radius,
        magnitude,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_is_aimed_and_hidden() {
        let flags = shape_flags(DeliveryShape::Point, EffectKind::Scare);
        assert!(flags.contains(ProjectFlags::AIMED | ProjectFlags::HIDE));
    }

    #[test]
    fn test_bolt_stops_and_reflects() {
        let flags = shape_flags(DeliveryShape::Bolt, EffectKind::Fire);
        assert!(flags.contains(ProjectFlags::STOP | ProjectFlags::REFLECTABLE));
        assert!(!flags.contains(ProjectFlags::THRU));
    }

    #[test]
    fn test_beam_penetrates() {
        let flags = shape_flags(DeliveryShape::Beam, EffectKind::PsychicSpear);
        assert!(flags.contains(ProjectFlags::BEAM | ProjectFlags::THRU));
        assert!(!flags.contains(ProjectFlags::STOP));
    }

    #[test]
    fn test_only_disintegration_reshapes_terrain() {
        assert!(shape_flags(DeliveryShape::Breath, EffectKind::Disintegrate).contains(ProjectFlags::DISI));
        assert!(!shape_flags(DeliveryShape::Breath, EffectKind::Fire).contains(ProjectFlags::DISI));
    }

    #[test]
    fn test_blast_radius() {
        assert_eq!(blast_radius(AbilityId::BallFire, false), 2);
        assert_eq!(blast_radius(AbilityId::BreathFire, true), 3);
        assert_eq!(blast_radius(AbilityId::BallChaos, false), 4);
        assert_eq!(blast_radius(AbilityId::BoltFire, true), 0);
    }
}
