//! Target resolution
//!
//! Preference order: an explicitly pinned target, then the target remembered
//! from the last decision, then the first reachable enemy found by a scan
//! that starts at a random actor and walks the list in a random direction.
//! Reachable means a projection from the caster gets to the target's grid.
//! Only when no enemy is reachable does the scan settle for one a ball could
//! still hit from an adjacent grid.

use tracing::trace;

use crate::actor::{ActorView, CasterMind};
use crate::deliver::impact_point;
use crate::rng::GameRng;
use crate::world::{ActorQuery, Geometry};

/// Pick the caster's target. Never returns the caster itself.
pub fn resolve_target<W>(
    world: &W,
    caster: &ActorView,
    mind: Option<&CasterMind>,
    range: u32,
    rng: &mut GameRng,
) -> Option<ActorView>
where
    W: Geometry + ActorQuery + ?Sized,
{
    let reachable = |view: &ActorView| world.projectable(caster.pos, view.pos, range);

    if let Some(mind) = mind {
        if let Some(pinned) = mind.pinned_target.filter(|id| *id != caster.id) {
            if let Some(view) = world
                .actor(pinned)
                .filter(|view| view.is_alive() && reachable(view))
            {
                trace!("{} keeps pinned target {}", caster.id, view.id);
                return Some(view);
            }
        }

        if let Some(last) = mind.last_target.filter(|id| *id != caster.id) {
            let remembered = world.actor(last).filter(|view| {
                view.is_alive() && world.are_enemies(caster.id, view.id) && reachable(view)
            });
            if remembered.is_some() {
                return remembered;
            }
        }
    }

    let ids = world.actor_ids();
    if ids.is_empty() {
        return None;
    }
    let len = ids.len() as i64;
    let start = rng.rn2(ids.len() as u32) as i64;
    let step = if rng.one_in(2) { 1 } else { -1 };

    let enemies: Vec<ActorView> = (0..len)
        .map(|i| ids[(start + step * i).rem_euclid(len) as usize])
        .filter(|id| *id != caster.id && world.are_enemies(caster.id, *id))
        .filter_map(|id| world.actor(id))
        .filter(|view| view.is_alive() && world.line_of_sight(caster.pos, view.pos))
        .collect();

    if let Some(direct) = enemies.iter().find(|view| reachable(view)) {
        return Some(direct.clone());
    }
    let fallback = enemies
        .into_iter()
        .find(|view| impact_point(world, caster, view, range).is_some());
    if let Some(view) = &fallback {
        trace!("{} settles for {} behind cover", caster.id, view.id);
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorId;
    use crate::geometry::{MAX_RANGE, Point};
    use crate::level::Terrain;
    use crate::level::Level;
    use crate::race::RaceId;
    use crate::world::World;

    fn arena() -> (Level, ActorView, ActorId) {
        let mut level = Level::new(12, 5);
        let caster = level.add_monster(RaceId(0), 5, Point::new(1, 2), 20);
        let player = level.add_player(Point::new(8, 2), 30);
        let view = level.actor(caster).unwrap();
        (level, view, player)
    }

    #[test]
    fn test_scan_finds_visible_enemy() {
        let (level, caster, player) = arena();
        for seed in 0..20 {
            let mut rng = GameRng::new(seed);
            let target = resolve_target(&level, &caster, None, MAX_RANGE, &mut rng);
            assert_eq!(target.map(|t| t.id), Some(player));
        }
    }

    #[test]
    fn test_never_targets_self_or_friends() {
        let mut level = Level::new(12, 5);
        let caster = level.add_monster(RaceId(0), 5, Point::new(1, 2), 20);
        level.add_monster(RaceId(1), 5, Point::new(4, 2), 20);
        let view = level.actor(caster).unwrap();
        let mind = CasterMind {
            pinned_target: Some(caster),
            last_target: Some(caster),
            ..Default::default()
        };
        let mut rng = GameRng::new(3);
        assert!(resolve_target(&level, &view, Some(&mind), MAX_RANGE, &mut rng).is_none());
    }

    #[test]
    fn test_hidden_enemy_is_not_found() {
        let (mut level, caster, _) = arena();
        for y in 0..5 {
            level.set_terrain(Point::new(5, y), Terrain::Wall);
        }
        let mut rng = GameRng::new(1);
        assert!(resolve_target(&level, &caster, None, MAX_RANGE, &mut rng).is_none());
    }

    #[test]
    fn test_pinned_target_wins() {
        let (mut level, caster, player) = arena();
        let decoy = level.add_player(Point::new(3, 2), 30);
        let mind = CasterMind {
            pinned_target: Some(player),
            last_target: Some(decoy),
            ..Default::default()
        };
        let mut rng = GameRng::new(9);
        let target = resolve_target(&level, &caster, Some(&mind), MAX_RANGE, &mut rng);
        assert_eq!(target.map(|t| t.id), Some(player));
    }

    #[test]
    fn test_remembered_target_needs_sight() {
        let (mut level, caster, player) = arena();
        let other = level.add_player(Point::new(3, 2), 30);
        let mind = CasterMind {
            last_target: Some(player),
            ..Default::default()
        };
        let mut rng = GameRng::new(2);
        let target = resolve_target(&level, &caster, Some(&mind), MAX_RANGE, &mut rng);
        // (3, 2) does not block sight, so the remembered target is kept
        assert_eq!(target.map(|t| t.id), Some(player));

        level.set_terrain(Point::new(6, 2), Terrain::Wall);
        let target = resolve_target(&level, &caster, Some(&mind), MAX_RANGE, &mut rng);
        assert_eq!(target.map(|t| t.id), Some(other));
    }

    #[test]
    fn test_scan_prefers_reachable_enemy_over_one_behind_glass() {
        let mut level = Level::new(12, 8);
        let caster = level.add_monster(RaceId(0), 5, Point::new(2, 3), 20);
        for y in 0..8 {
            level.set_terrain(Point::new(5, y), Terrain::Glass);
        }
        let behind_glass = level.add_player(Point::new(8, 3), 30);
        let in_the_open = level.add_player(Point::new(2, 6), 30);
        let view = level.actor(caster).unwrap();
        assert!(level.line_of_sight(view.pos, Point::new(8, 3)));

        for seed in 0..100 {
            let mut rng = GameRng::new(seed);
            let target = resolve_target(&level, &view, None, MAX_RANGE, &mut rng);
            assert_eq!(target.map(|t| t.id), Some(in_the_open), "seed {seed}");
        }

        // a full glass wall leaves no grid a ball could burst on either
        level.remove(in_the_open);
        let mut rng = GameRng::new(4);
        assert!(resolve_target(&level, &view, None, MAX_RANGE, &mut rng).is_none());
        assert!(level.actor(behind_glass).is_some());
    }

    #[test]
    fn test_unreachable_pinned_target_is_dropped() {
        let (mut level, caster, player) = arena();
        level.set_terrain(Point::new(5, 1), Terrain::Glass);
        level.set_terrain(Point::new(5, 2), Terrain::Glass);
        level.set_terrain(Point::new(5, 3), Terrain::Glass);
        let near = level.add_player(Point::new(3, 4), 30);
        let mind = CasterMind {
            pinned_target: Some(player),
            last_target: Some(player),
            ..Default::default()
        };
        let mut rng = GameRng::new(5);
        let target = resolve_target(&level, &caster, Some(&mind), MAX_RANGE, &mut rng);
        assert_eq!(target.map(|t| t.id), Some(near));
    }

    #[test]
    fn test_enemy_reachable_only_by_ball_is_a_last_resort() {
        let (mut level, caster, player) = arena();
        level.set_terrain(Point::new(5, 2), Terrain::Glass);
        assert!(!level.projectable(caster.pos, Point::new(8, 2), MAX_RANGE));
        let mut rng = GameRng::new(8);
        let target = resolve_target(&level, &caster, None, MAX_RANGE, &mut rng);
        assert_eq!(target.map(|t| t.id), Some(player));
    }
}
