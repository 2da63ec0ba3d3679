//! Availability filter
//!
//! Narrows a race's static ability set to what is legal and sensible this
//! turn. Passes run in a fixed order and may only clear bits; a pass that
//! sets one is a contract violation and aborts the decision.

use strum::{Display, EnumIter};
use tracing::{trace, warn};

use crate::ability::{AbilityId, AbilitySet, masks};
use crate::actor::{ActorView, PetPermissions};
use crate::deliver::{blast_radius, impact_point};
use crate::error::EngineError;
use crate::geometry::Point;
use crate::options::EngineOptions;
use crate::race::MonsterRace;
use crate::resist::{Resistances, suppress};
use crate::rng::GameRng;
use crate::target::resolve_target;
use crate::world::{World, ZoneFlags, clean_shot};

/// One narrowing pass, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum FilterPass {
    HardStop,
    TargetResolution,
    ZoneRules,
    RiderExclusions,
    AllySafety,
    Geometry,
    ResistanceSuppression,
    SelfPreservation,
}

/// The caster-side inputs of a filter run.
#[derive(Debug, Clone, Copy)]
pub struct FilterInput<'a> {
    pub caster: &'a ActorView,
    pub race: &'a MonsterRace,
    pub options: &'a EngineOptions,
}

/// Set sizes around one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassTrace {
    pub pass: FilterPass,
    pub before: AbilitySet,
    pub after: AbilitySet,
}

/// Result of a filter run.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterReport {
    pub surviving: AbilitySet,
    pub target: Option<ActorView>,
    /// Ball burst point, when one exists
    pub impact: Option<Point>,
    /// The self-preservation pass restricted the set
    pub desperate: bool,
    /// First pass that left nothing
    pub emptied_by: Option<FilterPass>,
    pub trace: Vec<PassTrace>,
}

impl FilterReport {
    fn new(working: AbilitySet) -> Self {
        Self {
            surviving: working,
            target: None,
            impact: None,
            desperate: false,
            emptied_by: None,
            trace: Vec::new(),
        }
    }

    /// Apply the result of `pass`. Returns `Ok(false)` once the set is empty.
    pub(crate) fn narrow(&mut self, pass: FilterPass, after: AbilitySet) -> Result<bool, EngineError> {
        let before = self.surviving;
        let added = after.without(before);
        if !added.is_empty() {
            warn!(%pass, "filter pass added {added}");
            return Err(EngineError::FilterAddedAbilities { pass, added });
        }
        trace!(%pass, before = before.len(), after = after.len(), "narrowed");
        self.trace.push(PassTrace {
            pass,
            before,
            after,
        });
        self.surviving = after;
        if after.is_empty() {
            self.emptied_by = Some(pass);
            return Ok(false);
        }
        Ok(true)
    }
}

/// Run every pass over `working`.
pub fn run<W: World + ?Sized>(
    world: &W,
    input: &FilterInput<'_>,
    working: AbilitySet,
    rng: &mut GameRng,
) -> Result<FilterReport, EngineError> {
    let caster = input.caster;
    let mut report = FilterReport::new(working);

    // 1. Hard stop
    let after = if caster.status.confused {
        AbilitySet::EMPTY
    } else {
        working
    };
    if !report.narrow(FilterPass::HardStop, after)? {
        return Ok(report);
    }

    // 2. Target
    let target = resolve_target(
        world,
        caster,
        world.mind(caster.id),
        input.options.max_range,
        rng,
    );
    if let Some(t) = &target {
        if t.id == caster.id {
            return Err(EngineError::SelfTarget(caster.id));
        }
    }
    let after = if target.is_some() {
        report.surviving
    } else {
        AbilitySet::EMPTY
    };
    if !report.narrow(FilterPass::TargetResolution, after)? {
        return Ok(report);
    }
    let Some(target) = target else {
        return Ok(report);
    };
    report.impact = impact_point(world, caster, &target, input.options.max_range);
    report.target = Some(target);

    for pass in [
        FilterPass::ZoneRules,
        FilterPass::RiderExclusions,
        FilterPass::AllySafety,
        FilterPass::Geometry,
        FilterPass::ResistanceSuppression,
        FilterPass::SelfPreservation,
    ] {
        let after = match pass {
            FilterPass::ZoneRules => zone_rules(world, input, &report),
            FilterPass::RiderExclusions => rider_exclusions(world, input, &report),
            FilterPass::AllySafety => ally_safety(world, input, &report),
            FilterPass::Geometry => geometry_gating(world, input, &report),
            FilterPass::ResistanceSuppression => {
                resistance_suppression(world, input, &report, rng)
            }
            FilterPass::SelfPreservation => {
                let after = self_preservation(input, &report, rng);
                report.desperate = after != report.surviving;
                after
            }
            FilterPass::HardStop | FilterPass::TargetResolution => report.surviving,
        };
        if !report.narrow(pass, after)? {
            break;
        }
    }

    Ok(report)
}

fn zone_rules<W: World + ?Sized>(
    world: &W,
    input: &FilterInput<'_>,
    report: &FilterReport,
) -> AbilitySet {
    let m = masks();
    let zone = world.zone();
    let mut set = report.surviving;
    if zone.flags.contains(ZoneFlags::NO_MAGIC) {
        set = set & m.innate;
    }
    if zone.flags.contains(ZoneFlags::NO_SUMMON) {
        set = set.without(m.no_summon_zone);
    }
    if !zone.allows_scripted(input.race.id) {
        set.remove(AbilityId::Special);
    }
    set
}

fn rider_exclusions<W: World + ?Sized>(
    world: &W,
    input: &FilterInput<'_>,
    report: &FilterReport,
) -> AbilitySet {
    let m = masks();
    if world.rider_of(input.caster.id).is_some() {
        report.surviving.without(m.riding_unsafe)
    } else {
        report.surviving
    }
}

fn ally_safety<W: World + ?Sized>(
    world: &W,
    input: &FilterInput<'_>,
    report: &FilterReport,
) -> AbilitySet {
    let m = masks();
    let caster = input.caster;
    let mut set = report.surviving;
    let (Some(owner_id), Some(target)) = (caster.owner, report.target.as_ref()) else {
        return set;
    };

    let perms = world.owner_permissions(owner_id);
    if !perms.contains(PetPermissions::TELEPORT) {
        set = set.without(m.teleports);
    }
    if !perms.contains(PetPermissions::ATTACK_SPELL) {
        set = set.without(m.hostile);
    }
    if !perms.contains(PetPermissions::SUMMON_SPELL) {
        set = set.without(m.summons);
    }

    let Some(owner) = world.actor(owner_id) else {
        return set;
    };

    let range = input.options.max_range;
    let safe = input.options.ally_safe_distance;
    let powerful = input.race.is_powerful();
    // the safety distance holds regardless; only the blast estimate is waived
    let free_blasting = perms.contains(PetPermissions::BALL_SPELL)
        || world.rider_of(caster.id) == Some(owner_id);

    // balls burst at the impact point
    if let Some(impact) = report.impact {
        let dist = impact.distance(owner.pos);
        for ball in (set & m.balls).iter() {
            let radius = blast_radius(ball, powerful);
            let too_close = dist <= safe;
            let in_blast = !free_blasting
                && dist <= radius
                && world.projectable(impact, owner.pos, radius);
            if too_close || in_blast {
                set.remove(ball);
            }
        }
    }

    // breaths fan out toward the target
    let breaths = set & m.breaths;
    if !breaths.is_empty() {
        let too_close = target.pos.distance(owner.pos) <= safe;
        for breath in breaths.iter() {
            let radius = blast_radius(breath, powerful);
            let reaches_owner = !free_blasting
                && (!clean_shot(world, caster.id, caster.pos, target.pos, range, false)
                    || world
                        .breath_area(caster.pos, target.pos, radius, range)
                        .contains(&owner.pos));
            if too_close || reaches_owner {
                set.remove(breath);
            }
        }
    }

    // beams run on past the target
    if set.intersects(m.beams) && !clean_shot(world, caster.id, caster.pos, target.pos, range, true) {
        set = set.without(m.beams);
    }

    set
}

fn geometry_gating<W: World + ?Sized>(
    world: &W,
    input: &FilterInput<'_>,
    report: &FilterReport,
) -> AbilitySet {
    let m = masks();
    let caster = input.caster;
    let range = input.options.max_range;
    let mut set = report.surviving;
    let Some(target) = report.target.as_ref() else {
        return AbilitySet::EMPTY;
    };

    let sighted = world.line_of_sight(caster.pos, target.pos)
        && world.projectable(caster.pos, target.pos, range);
    if !sighted {
        set = set.without(m.requires_los);
    }
    if report.impact.is_none() {
        set = set.without(m.balls);
    }
    if set.intersects(m.clean_shot)
        && !clean_shot(world, caster.id, caster.pos, target.pos, range, false)
    {
        set = set.without(m.clean_shot);
    }
    if set.intersects(m.beams) && !clean_shot(world, caster.id, caster.pos, target.pos, range, true) {
        set = set.without(m.beams);
    }
    if set.intersects(m.summons) && !world.summon_possible(target.pos) {
        set = set.without(m.summons);
    }
    if set.contains(AbilityId::Dispel) && !world.dispellable(target.id) {
        set.remove(AbilityId::Dispel);
    }
    if set.contains(AbilityId::RaiseDead)
        && !world.corpse_in_range(caster.pos, blast_radius(AbilityId::RaiseDead, false))
    {
        set.remove(AbilityId::RaiseDead);
    }
    if set.contains(AbilityId::TimeStop) && world.time_stop_active() {
        set.remove(AbilityId::TimeStop);
    }
    if set.contains(AbilityId::Special)
        && !input.race.special.is_legal(world, caster, target, range)
    {
        set.remove(AbilityId::Special);
    }
    set
}

/// The resistance profile the caster acts on: what it learned, what it is
/// allowed to peek at, or both.
pub fn believed_resistances<W: World + ?Sized>(
    world: &W,
    caster: &ActorView,
    target: &ActorView,
    options: &EngineOptions,
) -> Resistances {
    let mut known = Resistances::default();
    if options.smart_learn {
        if let Some(mind) = world.mind(caster.id) {
            known = known.union(&mind.ledger.knowledge_of(target.id));
        }
    }
    if options.smart_cheat {
        known = known.union(&world.resistances(target.id));
    }
    known
}

fn resistance_suppression<W: World + ?Sized>(
    world: &W,
    input: &FilterInput<'_>,
    report: &FilterReport,
    rng: &mut GameRng,
) -> AbilitySet {
    let Some(target) = report.target.as_ref() else {
        return AbilitySet::EMPTY;
    };
    if input.race.is_stupid() {
        return report.surviving;
    }
    let known = believed_resistances(world, input.caster, target, input.options);
    suppress(report.surviving, &known, input.race.is_smart(), rng)
}

fn self_preservation(input: &FilterInput<'_>, report: &FilterReport, rng: &mut GameRng) -> AbilitySet {
    let m = masks();
    if input.race.is_smart() && input.caster.hp_below(1, 3) && rng.one_in(2) {
        report.surviving & m.desperate
    } else {
        report.surviving
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrow_rejects_added_bits() {
        let mut report = FilterReport::new(AbilitySet::single(AbilityId::BoltFire));
        let grown = AbilitySet::from([AbilityId::BoltFire, AbilityId::Heal]);
        let err = report.narrow(FilterPass::Geometry, grown).unwrap_err();
        match err {
            EngineError::FilterAddedAbilities { pass, added } => {
                assert_eq!(pass, FilterPass::Geometry);
                assert_eq!(added, AbilitySet::single(AbilityId::Heal));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_narrow_records_emptying_pass() {
        let mut report = FilterReport::new(AbilitySet::single(AbilityId::BoltFire));
        assert!(!report.narrow(FilterPass::ZoneRules, AbilitySet::EMPTY).unwrap());
        assert_eq!(report.emptied_by, Some(FilterPass::ZoneRules));
        assert_eq!(report.trace.len(), 1);
    }
}
