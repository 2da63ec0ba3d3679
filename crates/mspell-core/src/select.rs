//! Selection policy
//!
//! Tiers are tried top to bottom. A tier only rolls when its category has
//! candidates, and a winning tier picks uniformly inside that one category.

use tracing::trace;

use crate::ability::{AbilityId, AbilitySet, Category};
use crate::classify::CandidateSet;
use crate::rng::GameRng;

/// Caster state the tiers look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionContext {
    pub hp: i32,
    pub max_hp: i32,
    pub afraid: bool,
    pub invulnerable: bool,
    pub hasted: bool,
    /// Distance to the target
    pub distance: u32,
    /// Someone already froze time
    pub time_stop_active: bool,
    /// Percent chance of the role-dependent special tier
    pub special_odds: u32,
    /// The special should preempt the self-care tiers
    pub special_urgent: bool,
    /// A dispel would strip something from the target
    pub dispel_effective: bool,
    /// Can lay traps (counts as offense for the closing-in tier)
    pub has_traps: bool,
    /// Dumb casters pick blindly
    pub stupid: bool,
}

impl SelectionContext {
    fn below(&self, num: i32, den: i32) -> bool {
        (self.hp as i64) * (den as i64) < (self.max_hp as i64) * (num as i64)
    }
}

fn tier(name: &str, set: AbilitySet, rng: &mut GameRng) -> Option<AbilityId> {
    let ids: Vec<_> = set.iter().collect();
    let chosen = rng.choose(&ids).copied();
    trace!(tier = name, ?chosen, "tier won");
    chosen
}

/// Choose one ability from `candidates`, or none.
pub fn choose(candidates: &CandidateSet, ctx: &SelectionContext, rng: &mut GameRng) -> Option<AbilityId> {
    if candidates.is_empty() {
        return None;
    }
    if ctx.stupid {
        return rng.choose(&candidates.ids()).copied();
    }

    let of = |category| candidates.in_category(category);

    let time_stop = of(Category::BuffSelf);
    if !time_stop.is_empty() && !ctx.time_stop_active && rng.percent(15) {
        return tier("time stop", time_stop, rng);
    }

    let special = of(Category::ScriptedSpecial);
    if !special.is_empty() && ctx.special_urgent {
        return tier("urgent special", special, rng);
    }

    let heal = of(Category::HealSelf);
    if !heal.is_empty() && ctx.below(1, 3) && rng.one_in(2) {
        return tier("heal", heal, rng);
    }

    let escape = of(Category::Escape);
    if !escape.is_empty() && (ctx.below(1, 3) || ctx.afraid) && rng.one_in(2) {
        return tier("escape", escape, rng);
    }

    if !special.is_empty() && rng.percent(ctx.special_odds) {
        return tier("special", special, rng);
    }

    let tactic = of(Category::Tactic);
    let attack = of(Category::Attack);
    let unique_beam = of(Category::UniqueBeam);
    let offensive = !attack.is_empty() || !unique_beam.is_empty() || ctx.has_traps;
    if !tactic.is_empty()
        && ctx.distance < 4
        && offensive
        && !ctx.time_stop_active
        && rng.percent(75)
    {
        return tier("close in", tactic, rng);
    }

    let summon = of(Category::SummonAlly);
    if !summon.is_empty() && rng.percent(40) {
        return tier("summon", summon, rng);
    }

    let dispel = of(Category::DispelTarget);
    if !dispel.is_empty() && ctx.dispel_effective && rng.one_in(2) {
        return tier("dispel", dispel, rng);
    }

    let raise = of(Category::RaiseUndead);
    if !raise.is_empty() && rng.percent(40) {
        return tier("raise", raise, rng);
    }

    if ctx.invulnerable {
        if !unique_beam.is_empty() && rng.percent(50) {
            return tier("unique beam", unique_beam, rng);
        }
        if !attack.is_empty() && rng.percent(40) {
            return tier("attack", attack, rng);
        }
    } else {
        let pool = attack.len() + unique_beam.len();
        if pool > 0 && rng.percent(85) {
            // each category wins in proportion to its members
            if rng.rn2(pool) < unique_beam.len() {
                return tier("unique beam", unique_beam, rng);
            }
            return tier("attack", attack, rng);
        }
    }

    if !tactic.is_empty() && !ctx.time_stop_active && rng.percent(50) {
        return tier("tactic", tactic, rng);
    }

    let invulner = of(Category::InvulnerabilitySelf);
    if !invulner.is_empty() && !ctx.invulnerable && rng.percent(50) {
        return tier("invulnerability", invulner, rng);
    }

    if !heal.is_empty() && ctx.below(3, 4) && rng.percent(25) {
        return tier("heal", heal, rng);
    }

    let haste = of(Category::HasteSelf);
    if !haste.is_empty() && !ctx.hasted && rng.percent(20) {
        return tier("haste", haste, rng);
    }

    let debuff = of(Category::DebuffTarget);
    if !debuff.is_empty() && rng.percent(80) {
        return tier("debuff", debuff, rng);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(hp: i32) -> SelectionContext {
        SelectionContext {
            hp,
            max_hp: 100,
            distance: 6,
            special_odds: 50,
            ..Default::default()
        }
    }

    fn chosen_counts(
        set: AbilitySet,
        ctx: &SelectionContext,
        runs: u64,
    ) -> hashbrown::HashMap<Option<AbilityId>, u32> {
        let candidates = CandidateSet::classify(set);
        let mut counts = hashbrown::HashMap::new();
        for seed in 0..runs {
            let mut rng = GameRng::new(seed);
            *counts.entry(choose(&candidates, ctx, &mut rng)).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_empty_candidates_choose_nothing() {
        let mut rng = GameRng::new(1);
        let candidates = CandidateSet::classify(AbilitySet::EMPTY);
        assert_eq!(choose(&candidates, &ctx(100), &mut rng), None);
    }

    #[test]
    fn test_choice_is_always_a_candidate() {
        let set = AbilitySet::from([
            AbilityId::BoltFire,
            AbilityId::Teleport,
            AbilityId::Heal,
            AbilityId::Scare,
            AbilityId::SummonKin,
        ]);
        let candidates = CandidateSet::classify(set);
        for seed in 0..300 {
            let mut rng = GameRng::new(seed);
            if let Some(id) = choose(&candidates, &ctx((seed % 100) as i32 + 1), &mut rng) {
                assert!(candidates.contains(id));
            }
        }
    }

    #[test]
    fn test_hurt_caster_escapes_about_half_the_time() {
        let set = AbilitySet::from([AbilityId::Teleport, AbilityId::BoltFire]);
        let counts = chosen_counts(set, &ctx(20), 1000);
        let escapes = counts.get(&Some(AbilityId::Teleport)).copied().unwrap_or(0);
        assert!((420..=580).contains(&escapes), "escapes = {escapes}");
    }

    #[test]
    fn test_healthy_caster_mostly_attacks() {
        let set = AbilitySet::from([AbilityId::Teleport, AbilityId::BoltFire]);
        let counts = chosen_counts(set, &ctx(100), 1000);
        let attacks = counts.get(&Some(AbilityId::BoltFire)).copied().unwrap_or(0);
        assert!((800..=900).contains(&attacks), "attacks = {attacks}");
    }

    #[test]
    fn test_urgent_special_preempts_healing() {
        let set = AbilitySet::from([AbilityId::Special, AbilityId::Heal]);
        let urgent = SelectionContext {
            special_urgent: true,
            ..ctx(10)
        };
        let candidates = CandidateSet::classify(set);
        for seed in 0..50 {
            let mut rng = GameRng::new(seed);
            assert_eq!(
                choose(&candidates, &urgent, &mut rng),
                Some(AbilityId::Special)
            );
        }
    }

    #[test]
    fn test_zero_odds_special_never_chosen_unless_urgent() {
        let set = AbilitySet::single(AbilityId::Special);
        let calm = SelectionContext {
            special_odds: 0,
            ..ctx(100)
        };
        assert_eq!(chosen_counts(set, &calm, 200).get(&None), Some(&200));
    }

    #[test]
    fn test_invulnerable_caster_prefers_unique_beam() {
        let set = AbilitySet::from([AbilityId::PsychicSpear, AbilityId::BoltFire]);
        let shielded = SelectionContext {
            invulnerable: true,
            ..ctx(100)
        };
        let counts = chosen_counts(set, &shielded, 1000);
        let beams = counts.get(&Some(AbilityId::PsychicSpear)).copied().unwrap_or(0);
        let bolts = counts.get(&Some(AbilityId::BoltFire)).copied().unwrap_or(0);
        assert!(beams > bolts);
    }

    #[test]
    fn test_unique_beam_shares_the_attack_tier() {
        let set = AbilitySet::from([AbilityId::PsychicSpear, AbilityId::BoltFire]);
        let counts = chosen_counts(set, &ctx(100), 2000);
        let beams = counts.get(&Some(AbilityId::PsychicSpear)).copied().unwrap_or(0);
        let bolts = counts.get(&Some(AbilityId::BoltFire)).copied().unwrap_or(0);
        // 85% attack tier, split evenly between the two categories
        assert!((700..=1000).contains(&beams), "beams = {beams}");
        assert!((700..=1000).contains(&bolts), "bolts = {bolts}");
    }

    #[test]
    fn test_time_stop_needs_a_still_world() {
        let set = AbilitySet::single(AbilityId::TimeStop);
        let frozen = SelectionContext {
            time_stop_active: true,
            ..ctx(100)
        };
        assert_eq!(chosen_counts(set, &frozen, 100).get(&None), Some(&100));
    }

    #[test]
    fn test_stupid_caster_picks_any_candidate() {
        let set = AbilitySet::from([AbilityId::Heal, AbilityId::Blink, AbilityId::Scare]);
        let dumb = SelectionContext {
            stupid: true,
            ..ctx(100)
        };
        let counts = chosen_counts(set, &dumb, 300);
        assert!(counts.get(&None).is_none());
        assert_eq!(counts.len(), 3);
    }
}
