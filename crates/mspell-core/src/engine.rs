//! The per-turn decision pipeline
//!
//! `take_turn` runs, in order: readiness checks, the frequency gate, the
//! availability filter, classification, selection, the failure roll,
//! delivery, and finally the lore and ledger updates. Every early exit
//! leaves the ledger and lore untouched.

use strum::Display;
use tracing::{debug, warn};

use crate::ability::{AbilityId, Category, record};
use crate::actor::{ActorId, ActorView};
use crate::classify::CandidateSet;
use crate::deliver::{self, CastPlan, Resolution};
use crate::error::EngineError;
use crate::filter::{self, FilterInput, FilterPass, FilterReport};
use crate::lore::LoreBook;
use crate::options::EngineOptions;
use crate::race::{MonsterRace, RaceTable};
use crate::rng::GameRng;
use crate::select::{self, SelectionContext};
use crate::world::World;

/// Why a turn produced no special action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum NoActionReason {
    Confused,
    JustArrived,
    /// The casting-frequency roll failed
    NotThisTurn,
    NoAbilities,
    NoTarget,
    /// A filter pass cleared the last candidate
    Filtered(FilterPass),
    /// No selection tier fired
    NothingChosen,
}

/// A successful cast.
#[derive(Debug, Clone, PartialEq)]
pub struct Cast {
    pub ability: AbilityId,
    pub category: Category,
    pub target: ActorId,
    /// The self-preservation pass restricted the choice
    pub desperate: bool,
    pub resolution: Resolution,
}

/// Result of one caster turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    NoAction(NoActionReason),
    /// Fumbled; the turn is spent and nothing is learned
    Failed { ability: AbilityId, target: ActorId },
    Cast(Box<Cast>),
}

impl TurnOutcome {
    /// The ability used or attempted.
    pub fn ability(&self) -> Option<AbilityId> {
        match self {
            TurnOutcome::NoAction(_) => None,
            TurnOutcome::Failed { ability, .. } => Some(*ability),
            TurnOutcome::Cast(cast) => Some(cast.ability),
        }
    }

    pub fn target(&self) -> Option<ActorId> {
        match self {
            TurnOutcome::NoAction(_) => None,
            TurnOutcome::Failed { target, .. } => Some(*target),
            TurnOutcome::Cast(cast) => Some(cast.target),
        }
    }

    pub fn is_no_action(&self) -> bool {
        matches!(self, TurnOutcome::NoAction(_))
    }
}

/// Percent chance that `race` fumbles a non-innate ability.
pub fn failure_rate(race: &MonsterRace, stunned: bool) -> u32 {
    if race.is_stupid() {
        return 0;
    }
    let rate = 25u32.saturating_sub((race.level as u32 + 3) / 4);
    if stunned { rate.max(50) } else { rate }
}

/// Decides and resolves special abilities for every caster on a level.
#[derive(Debug, Clone, Default)]
pub struct SpellEngine {
    races: RaceTable,
    options: EngineOptions,
    lore: LoreBook,
}

impl SpellEngine {
    pub fn new(races: RaceTable, options: EngineOptions) -> Self {
        Self {
            races,
            options,
            lore: LoreBook::new(),
        }
    }

    pub fn races(&self) -> &RaceTable {
        &self.races
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: EngineOptions) {
        self.options = options;
    }

    pub fn lore(&self) -> &LoreBook {
        &self.lore
    }

    fn caster_and_race<W: World + ?Sized>(
        &self,
        world: &W,
        caster: ActorId,
    ) -> Result<(ActorView, &MonsterRace), EngineError> {
        let view = world.actor(caster).ok_or(EngineError::UnknownActor(caster))?;
        let race_id = view.race.ok_or(EngineError::NotACaster(caster))?;
        let race = self
            .races
            .get(race_id)
            .ok_or(EngineError::UnknownRace(race_id))?;
        Ok((view, race))
    }

    /// Run only the availability filter for `caster`, without the readiness
    /// checks or the frequency gate.
    pub fn filter<W: World + ?Sized>(
        &self,
        world: &W,
        caster: ActorId,
        rng: &mut GameRng,
    ) -> Result<FilterReport, EngineError> {
        let (view, race) = self.caster_and_race(world, caster)?;
        let input = FilterInput {
            caster: &view,
            race,
            options: &self.options,
        };
        filter::run(world, &input, race.abilities, rng)
    }

    /// Decide and resolve one turn for `caster`.
    pub fn take_turn<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        caster_id: ActorId,
        rng: &mut GameRng,
    ) -> Result<TurnOutcome, EngineError> {
        let (caster, race) = self.caster_and_race(world, caster_id)?;
        let race = race.clone();

        if caster.status.confused {
            debug!("{caster_id} is confused");
            return Ok(TurnOutcome::NoAction(NoActionReason::Confused));
        }
        if caster.status.just_arrived {
            return Ok(TurnOutcome::NoAction(NoActionReason::JustArrived));
        }
        if race.abilities.is_empty() {
            return Ok(TurnOutcome::NoAction(NoActionReason::NoAbilities));
        }
        if self.options.frequency_gate && !rng.percent(race.spell_freq as u32) {
            return Ok(TurnOutcome::NoAction(NoActionReason::NotThisTurn));
        }

        // filter
        let input = FilterInput {
            caster: &caster,
            race: &race,
            options: &self.options,
        };
        let report = filter::run(&*world, &input, race.abilities, rng)?;
        let Some(target) = report.target.clone() else {
            debug!("{caster_id} has no target");
            return Ok(TurnOutcome::NoAction(NoActionReason::NoTarget));
        };
        if let Some(pass) = report.emptied_by {
            debug!("{caster_id}: {pass} left nothing to cast");
            return Ok(TurnOutcome::NoAction(NoActionReason::Filtered(pass)));
        }

        // classify and select
        let candidates = CandidateSet::classify(report.surviving);
        let ctx = SelectionContext {
            hp: caster.hp,
            max_hp: caster.max_hp,
            afraid: caster.status.afraid,
            invulnerable: caster.status.invulnerable,
            hasted: caster.status.hasted,
            distance: caster.pos.distance(target.pos),
            time_stop_active: world.time_stop_active(),
            special_odds: race.special.odds(),
            special_urgent: race.special.is_urgent(&*world, &caster),
            dispel_effective: world.dispellable(target.id),
            has_traps: candidates.contains(AbilityId::CreateTraps),
            stupid: race.is_stupid(),
        };
        let Some(ability) = select::choose(&candidates, &ctx, rng) else {
            return Ok(TurnOutcome::NoAction(NoActionReason::NothingChosen));
        };
        let Some(category) = candidates.category_of(ability) else {
            warn!("{caster_id} selected {ability} outside its candidates");
            return Err(EngineError::SelectionOutsideCandidates(ability));
        };

        // fumble
        if self.options.spell_failure && !record(ability).is_innate() {
            let rate = failure_rate(&race, caster.status.stunned);
            if rng.percent(rate) {
                debug!("{caster_id} fumbles {ability}");
                return Ok(TurnOutcome::Failed {
                    ability,
                    target: target.id,
                });
            }
        }

        // deliver
        let actual = world.resistances(target.id);
        let plan = CastPlan {
            ability,
            caster: &caster,
            race: &race,
            target: &target,
            impact: report.impact,
            range: self.options.max_range,
        };
        let resolution = deliver::resolve(world, &self.races, &plan, rng);
        debug!(
            "{caster_id} casts {ability} ({category}) at {}, {} damage",
            target.id, resolution.outcome.damage
        );

        // lore
        if caster.visible && !caster.disguised {
            self.lore.observe(race.id, ability);
            if target.is_player && resolution.outcome.target_died {
                self.lore.note_death(race.id);
            }
        }

        // ledger and memory; the caster may have merged or split away
        let revealed = resolution.outcome.affected.contains(&target.id) || resolution.outcome.reflected;
        let can_learn = self.options.smart_learn
            && race.is_smart()
            && !caster.status.confused
            && !caster.status.unaware;
        if let Some(mind) = world.mind_mut(caster_id) {
            if self.options.smart_learn && rng.one_in(100) {
                mind.ledger.forget();
            }
            if can_learn && revealed {
                mind.ledger.learn(target.id, &actual, ability);
            }
            mind.last_target = Some(target.id);
        }

        Ok(TurnOutcome::Cast(Box::new(Cast {
            ability,
            category,
            target: target.id,
            desperate: report.desperate,
            resolution,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::{RaceFlags, RaceId};

    fn race(level: u8, flags: RaceFlags) -> MonsterRace {
        MonsterRace {
            id: RaceId(0),
            name: "test".to_string(),
            level,
            spell_freq: 100,
            flags,
            abilities: Default::default(),
            special: Default::default(),
        }
    }

    #[test]
    fn test_failure_rate_drops_with_level() {
        assert_eq!(failure_rate(&race(1, RaceFlags::empty()), false), 24);
        assert_eq!(failure_rate(&race(41, RaceFlags::empty()), false), 14);
        assert_eq!(failure_rate(&race(200, RaceFlags::empty()), false), 0);
    }

    #[test]
    fn test_stunned_casters_fail_half_the_time() {
        assert_eq!(failure_rate(&race(100, RaceFlags::empty()), true), 50);
    }

    #[test]
    fn test_dumb_casters_never_fumble() {
        assert_eq!(failure_rate(&race(1, RaceFlags::STUPID), true), 0);
    }

    #[test]
    fn test_outcome_accessors() {
        let outcome = TurnOutcome::Failed {
            ability: AbilityId::Blink,
            target: ActorId(2),
        };
        assert_eq!(outcome.ability(), Some(AbilityId::Blink));
        assert_eq!(outcome.target(), Some(ActorId(2)));
        assert!(!outcome.is_no_action());
        assert!(TurnOutcome::NoAction(NoActionReason::NoTarget).is_no_action());
    }
}
