//! Scripted special behaviors
//!
//! A race's [`SpecialBehavior`] decides when its `Special` ability is legal,
//! how eagerly it is used and what it does. The behavior is data on the
//! race entry, so new scripted casters need no engine changes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ability::{AbilityId, DeliveryShape, EffectKind};
use crate::actor::ActorView;
use crate::race::{RaceId, RaceTable};
use crate::rng::GameRng;
use crate::world::{ProjectFlags, ProjectOutcome, ProjectRequest, World};

/// What a race's special ability does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpecialBehavior {
    #[default]
    None,
    /// One half of a pair that can fuse into `combined`
    MergeHalf { partner: RaceId, combined: RaceId },
    /// Fused form that can split back into its halves
    MergedWhole { halves: [RaceId; 2] },
    /// Lobs short-lived minions at the target
    GrenadeThrower { minion: RaceId },
    /// Swoops at the target, or snatches it up and drops it
    DiveBomber,
}

impl SpecialBehavior {
    /// Percent chance of using the special when it competes normally.
    pub fn odds(&self) -> u32 {
        match self {
            SpecialBehavior::MergedWhole { .. } => 70,
            SpecialBehavior::GrenadeThrower { .. } => 40,
            SpecialBehavior::MergeHalf { .. } => 0,
            SpecialBehavior::None | SpecialBehavior::DiveBomber => 50,
        }
    }

    /// The special should preempt everything but time stop.
    pub fn is_urgent<W: World + ?Sized>(&self, world: &W, caster: &ActorView) -> bool {
        match self {
            SpecialBehavior::MergeHalf { partner, .. } => {
                caster.hp_below(1, 2) && world.find_race(*partner).is_some()
            }
            _ => false,
        }
    }

    /// The special can be performed right now.
    pub fn is_legal<W: World + ?Sized>(
        &self,
        world: &W,
        caster: &ActorView,
        target: &ActorView,
        range: u32,
    ) -> bool {
        match self {
            SpecialBehavior::None => false,
            SpecialBehavior::MergeHalf { partner, .. } => world.find_race(*partner).is_some(),
            SpecialBehavior::MergedWhole { .. } => true,
            SpecialBehavior::GrenadeThrower { .. } => world.summon_possible(target.pos),
            SpecialBehavior::DiveBomber => world.projectable(caster.pos, target.pos, range),
        }
    }

    /// Perform the special.
    pub fn execute<W: World + ?Sized>(
        &self,
        world: &mut W,
        races: &RaceTable,
        caster: &ActorView,
        target: &ActorView,
        rng: &mut GameRng,
    ) -> ProjectOutcome {
        let mut outcome = ProjectOutcome::default();
        match *self {
            SpecialBehavior::None => {}
            SpecialBehavior::MergeHalf { partner, combined } => {
                let Some(partner_view) = world.find_race(partner).and_then(|id| world.actor(id))
                else {
                    return outcome;
                };
                let hp = caster.hp + partner_view.hp;
                if let Some(whole) = world.spawn(combined, caster.pos, hp, Some(caster.id)) {
                    debug!("{} and {} merge into {whole}", caster.id, partner_view.id);
                    world.remove(caster.id);
                    world.remove(partner_view.id);
                    outcome.summoned.push(whole);
                }
            }
            SpecialBehavior::MergedWhole { halves } => {
                let hp = (caster.hp / 2).max(1);
                for half in halves {
                    if let Some(id) = world.spawn(half, caster.pos, hp, Some(caster.id)) {
                        outcome.summoned.push(id);
                    }
                }
                if !outcome.summoned.is_empty() {
                    debug!("{} splits into {:?}", caster.id, outcome.summoned);
                    world.remove(caster.id);
                }
            }
            SpecialBehavior::GrenadeThrower { minion } => {
                let level = races.get(minion).map_or(1, |r| r.level.max(1));
                for _ in 0..rng.rnd(3) {
                    let hp = rng.dice(level as u32, 8).max(1) as i32;
                    if let Some(id) = world.spawn(minion, target.pos, hp, Some(caster.id)) {
                        outcome.summoned.push(id);
                    }
                }
            }
            SpecialBehavior::DiveBomber => {
                let (effect, magnitude) = if rng.one_in(3) {
                    (EffectKind::Approach, 0)
                } else {
                    (EffectKind::Fall, rng.dice(4, 8) as i32)
                };
                let request = ProjectRequest {
                    source: caster.id,
                    ability: AbilityId::Special,
                    origin: caster.pos,
                    target: target.pos,
                    shape: DeliveryShape::Point,
                    radius: 0,
                    effect,
                    magnitude,
                    flags: ProjectFlags::AIMED | ProjectFlags::HIDE | ProjectFlags::KILL,
                    summon: None,
                    range: 1,
                };
                outcome = world.project(&request, rng);
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odds_by_role() {
        assert_eq!(
            SpecialBehavior::MergedWhole {
                halves: [RaceId(1), RaceId(2)]
            }
            .odds(),
            70
        );
        assert_eq!(
            SpecialBehavior::GrenadeThrower { minion: RaceId(1) }.odds(),
            40
        );
        assert_eq!(
            SpecialBehavior::MergeHalf {
                partner: RaceId(1),
                combined: RaceId(2)
            }
            .odds(),
            0
        );
        assert_eq!(SpecialBehavior::DiveBomber.odds(), 50);
    }

    #[test]
    fn test_serde_shape() {
        let behavior = SpecialBehavior::GrenadeThrower { minion: RaceId(8) };
        let json = serde_json::to_string(&behavior).unwrap();
        assert_eq!(json, r#"{"GrenadeThrower":{"minion":8}}"#);
        let back: SpecialBehavior = serde_json::from_str(&json).unwrap();
        assert_eq!(back, behavior);
    }

    use crate::actor::ActorId;
    use crate::geometry::Point;
    use crate::level::Level;
    use crate::world::ActorQuery;

    fn view_of(level: &Level, id: ActorId) -> ActorView {
        level.actor(id).unwrap()
    }

    fn behavior_of(table: &RaceTable, race: u16) -> SpecialBehavior {
        table.get(RaceId(race)).unwrap().special
    }

    #[test]
    fn test_halves_merge_into_the_whole() {
        let table = RaceTable::builtin();
        let mut level = Level::new(14, 5);
        let banor = level.add_monster(RaceId(4), 40, Point::new(2, 2), 30);
        let lupart = level.add_monster(RaceId(5), 40, Point::new(6, 2), 20);
        let player = level.add_player(Point::new(11, 2), 50);
        let (caster, target) = (view_of(&level, banor), view_of(&level, player));
        let mut rng = GameRng::new(1);

        let outcome = behavior_of(&table, 4).execute(&mut level, &table, &caster, &target, &mut rng);

        assert_eq!(outcome.summoned.len(), 1);
        let whole = view_of(&level, outcome.summoned[0]);
        assert_eq!(whole.race, Some(RaceId(6)));
        assert_eq!(whole.hp, 50);
        assert!(level.get(banor).is_none());
        assert!(level.get(lupart).is_none());
        assert!(level.are_enemies(whole.id, player));
    }

    #[test]
    fn test_whole_splits_back_into_halves() {
        let table = RaceTable::builtin();
        let mut level = Level::new(14, 5);
        let merged = level.add_monster(RaceId(6), 45, Point::new(5, 2), 81);
        let player = level.add_player(Point::new(11, 2), 50);
        let (caster, target) = (view_of(&level, merged), view_of(&level, player));
        let mut rng = GameRng::new(2);

        let outcome = behavior_of(&table, 6).execute(&mut level, &table, &caster, &target, &mut rng);

        assert_eq!(outcome.summoned.len(), 2);
        let mut races: Vec<_> = outcome
            .summoned
            .iter()
            .map(|id| view_of(&level, *id))
            .inspect(|half| assert_eq!(half.hp, 40))
            .filter_map(|half| half.race)
            .collect();
        races.sort();
        assert_eq!(races, vec![RaceId(4), RaceId(5)]);
        assert!(level.get(merged).is_none());
    }

    #[test]
    fn test_grenades_land_near_the_target_on_the_throwers_side() {
        let table = RaceTable::builtin();
        for seed in 0..20 {
            let mut level = Level::new(16, 7);
            let thrower = level.add_monster(RaceId(7), 30, Point::new(2, 3), 60);
            let player = level.add_player(Point::new(11, 3), 50);
            let (caster, target) = (view_of(&level, thrower), view_of(&level, player));
            let mut rng = GameRng::new(seed);

            let outcome = behavior_of(&table, 7).execute(&mut level, &table, &caster, &target, &mut rng);

            assert!((1..=3).contains(&outcome.summoned.len()));
            for id in &outcome.summoned {
                let grenade = view_of(&level, *id);
                assert_eq!(grenade.race, Some(RaceId(8)));
                assert!(grenade.pos.distance(target.pos) <= 3);
                assert!(!level.are_enemies(thrower, *id));
                assert!(level.are_enemies(player, *id));
            }
        }
    }

    #[test]
    fn test_dive_either_drops_or_swoops() {
        let table = RaceTable::builtin();
        let (mut dropped, mut swooped) = (0, 0);
        for seed in 0..60 {
            let mut level = Level::new(12, 5);
            let raptor = level.add_monster(RaceId(9), 12, Point::new(2, 2), 40);
            let player = level.add_player(Point::new(7, 2), 200);
            let (caster, target) = (view_of(&level, raptor), view_of(&level, player));
            let mut rng = GameRng::new(seed);

            let outcome = behavior_of(&table, 9).execute(&mut level, &table, &caster, &target, &mut rng);

            assert_eq!(outcome.affected, vec![player]);
            if view_of(&level, player).hp < 200 {
                dropped += 1;
            } else {
                assert!(view_of(&level, raptor).pos.distance(target.pos) <= 1);
                swooped += 1;
            }
        }
        assert!(dropped > 0 && swooped > 0, "dropped {dropped}, swooped {swooped}");
    }
}
