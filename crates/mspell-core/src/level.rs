//! A grid level that implements [`World`]
//!
//! Cells are stored column-major (`cells[x][y]`). Actors live in one list in
//! creation order; dead actors stay in it (with `hp <= 0`) until removed so
//! that outcomes can still be inspected, but they no longer occupy a grid.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::{debug, trace};

use crate::ability::{DeliveryShape, EffectKind, SummonKind};
use crate::actor::{ActorId, ActorStatus, ActorView, CasterMind, PetPermissions};
use crate::geometry::{self, MAX_RANGE, Point};
use crate::race::RaceId;
use crate::resist::{Defenses, ResistKind, ResistLevel, Resistances};
use crate::rng::GameRng;
use crate::world::{
    ActorQuery, Geometry, ProjectFlags, ProjectOutcome, ProjectRequest, Projector, World, ZoneRules,
};

/// Distance a blink moves the caster.
const BLINK_DISTANCE: u32 = 10;

/// Search radius when placing a new actor.
const PLACE_RADIUS: u32 = 3;

// ============================================================================
// Terrain and cells
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
pub enum Terrain {
    #[default]
    Floor,
    Wall,
    /// Survives disintegration
    PermanentWall,
    /// Lets sight through but stops projections
    Glass,
    ClosedDoor,
    OpenDoor,
}

impl Terrain {
    pub const fn blocks_sight(self) -> bool {
        matches!(
            self,
            Terrain::Wall | Terrain::PermanentWall | Terrain::ClosedDoor
        )
    }

    pub const fn blocks_projection(self) -> bool {
        !matches!(self, Terrain::Floor | Terrain::OpenDoor)
    }

    pub const fn is_walkable(self) -> bool {
        matches!(self, Terrain::Floor | Terrain::OpenDoor)
    }

    /// Disintegration turns it into floor.
    pub const fn is_destructible(self) -> bool {
        matches!(self, Terrain::Wall | Terrain::Glass | Terrain::ClosedDoor)
    }

    /// Map symbol; anything unknown reads as floor.
    pub fn from_symbol(c: char) -> Terrain {
        match c {
            '#' => Terrain::Wall,
            'X' => Terrain::PermanentWall,
            '=' => Terrain::Glass,
            '+' => Terrain::ClosedDoor,
            '\'' => Terrain::OpenDoor,
            _ => Terrain::Floor,
        }
    }
}

/// A single grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell {
    pub terrain: Terrain,
    pub corpse: bool,
    pub trap: bool,
}

// ============================================================================
// Actors
// ============================================================================

/// Side an actor fights on. Actors on different sides are enemies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Faction {
    /// The player and their pets
    Hero,
    Monsters,
}

/// An actor plus the state the level keeps for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelActor {
    pub view: ActorView,
    pub faction: Faction,
    pub resistances: Resistances,
    pub mind: CasterMind,
    /// What this actor lets its pets do
    pub permissions: PetPermissions,
    /// Actor riding this one
    pub rider: Option<ActorId>,
}

impl LevelActor {
    pub fn new(id: ActorId, race: Option<RaceId>, pos: Point, hp: i32, level: u8, faction: Faction) -> Self {
        Self {
            view: ActorView {
                id,
                race,
                pos,
                hp,
                max_hp: hp,
                level,
                status: ActorStatus::default(),
                owner: None,
                is_player: false,
                visible: true,
                disguised: false,
            },
            faction,
            resistances: Resistances::default(),
            mind: CasterMind::default(),
            permissions: PetPermissions::empty(),
            rider: None,
        }
    }
}

// ============================================================================
// Level
// ============================================================================

/// A rectangular level with actors on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub width: i32,
    pub height: i32,
    /// Grid cells, indexed `[x][y]`
    cells: Vec<Vec<Cell>>,
    actors: Vec<LevelActor>,
    pub zone: ZoneRules,
    /// Actor whose time stop is in effect
    time_stop: Option<ActorId>,
    /// Race each summon kind produces; unmapped kinds call the caster's kin
    summons: HashMap<SummonKind, RaceId>,
    next_actor_id: u32,
}

impl Level {
    /// An open level of plain floor.
    pub fn new(width: i32, height: i32) -> Self {
        let (w, h) = (width.max(0) as usize, height.max(0) as usize);
        Self {
            width,
            height,
            cells: vec![vec![Cell::default(); h]; w],
            actors: Vec::new(),
            zone: ZoneRules::default(),
            time_stop: None,
            summons: HashMap::new(),
            next_actor_id: 1,
        }
    }

    /// Build a level from rows of map symbols (see [`Terrain::from_symbol`]);
    /// `%` marks a corpse and `^` a trap on floor.
    pub fn from_map(rows: &[&str]) -> Self {
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as i32;
        let mut level = Level::new(width, rows.len() as i32);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                let p = Point::new(x as i32, y as i32);
                if let Some(cell) = level.cell_mut(p) {
                    cell.terrain = Terrain::from_symbol(c);
                    cell.corpse = c == '%';
                    cell.trap = c == '^';
                }
            }
        }
        level
    }

    pub const fn is_valid_pos(&self, p: Point) -> bool {
        p.x >= 0 && p.x < self.width && p.y >= 0 && p.y < self.height
    }

    pub fn cell(&self, p: Point) -> Option<&Cell> {
        if !self.is_valid_pos(p) {
            return None;
        }
        self.cells.get(p.x as usize)?.get(p.y as usize)
    }

    pub fn cell_mut(&mut self, p: Point) -> Option<&mut Cell> {
        if !self.is_valid_pos(p) {
            return None;
        }
        self.cells.get_mut(p.x as usize)?.get_mut(p.y as usize)
    }

    pub fn terrain(&self, p: Point) -> Option<Terrain> {
        self.cell(p).map(|c| c.terrain)
    }

    pub fn set_terrain(&mut self, p: Point, terrain: Terrain) {
        if let Some(cell) = self.cell_mut(p) {
            cell.terrain = terrain;
        }
    }

    pub fn place_corpse(&mut self, p: Point) {
        if let Some(cell) = self.cell_mut(p) {
            cell.corpse = true;
        }
    }

    /// Walkable and unoccupied.
    pub fn is_vacant(&self, p: Point) -> bool {
        self.cell(p).is_some_and(|c| c.terrain.is_walkable()) && self.living_at(p).is_none()
    }

    // ------------------------------------------------------------------------
    // Actors
    // ------------------------------------------------------------------------

    pub fn add_actor(&mut self, race: Option<RaceId>, pos: Point, hp: i32, level: u8, faction: Faction) -> ActorId {
        let id = ActorId(self.next_actor_id);
        self.next_actor_id += 1;
        self.actors
            .push(LevelActor::new(id, race, pos, hp, level, faction));
        id
    }

    pub fn add_player(&mut self, pos: Point, hp: i32) -> ActorId {
        let id = self.add_actor(None, pos, hp, 1, Faction::Hero);
        if let Some(player) = self.get_mut(id) {
            player.view.is_player = true;
        }
        id
    }

    pub fn add_monster(&mut self, race: RaceId, level: u8, pos: Point, hp: i32) -> ActorId {
        self.add_actor(Some(race), pos, hp, level, Faction::Monsters)
    }

    /// Make `pet` belong to `owner` and fight on its side.
    pub fn tame(&mut self, pet: ActorId, owner: ActorId) {
        let Some(faction) = self.get(owner).map(|o| o.faction) else {
            return;
        };
        if let Some(actor) = self.get_mut(pet) {
            actor.view.owner = Some(owner);
            actor.faction = faction;
        }
    }

    pub fn get(&self, id: ActorId) -> Option<&LevelActor> {
        self.actors.iter().find(|a| a.view.id == id)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut LevelActor> {
        self.actors.iter_mut().find(|a| a.view.id == id)
    }

    pub fn actors(&self) -> impl Iterator<Item = &LevelActor> {
        self.actors.iter()
    }

    pub fn set_summon_race(&mut self, kind: SummonKind, race: RaceId) {
        self.summons.insert(kind, race);
    }

    pub fn time_stopper(&self) -> Option<ActorId> {
        self.time_stop
    }

    pub fn end_time_stop(&mut self) {
        self.time_stop = None;
    }

    fn index_of(&self, id: ActorId) -> Option<usize> {
        self.actors.iter().position(|a| a.view.id == id)
    }

    fn living_at(&self, p: Point) -> Option<usize> {
        self.actors
            .iter()
            .position(|a| a.view.pos == p && a.view.is_alive())
    }

    /// Nearest vacant grid to `near` that `near` can project to.
    fn vacant_near(&self, near: Point, radius: u32) -> Option<Point> {
        let mut spots = geometry::disc(near, radius);
        spots.sort_by_key(|p| near.distance(*p));
        spots
            .into_iter()
            .find(|p| self.is_vacant(*p) && self.projectable(near, *p, radius))
    }

    /// Create an actor near `near` on `ally_of`'s side.
    fn place(&mut self, race: RaceId, near: Point, hp: i32, level: u8, ally_of: Option<ActorId>) -> Option<ActorId> {
        let pos = self.vacant_near(near, PLACE_RADIUS)?;
        let (faction, owner) = ally_of
            .and_then(|a| self.get(a))
            .map_or((Faction::Monsters, None), |a| (a.faction, a.view.owner));
        let id = self.add_actor(Some(race), pos, hp.max(1), level, faction);
        if let Some(actor) = self.get_mut(id) {
            actor.view.owner = owner;
            actor.view.status.just_arrived = true;
        }
        Some(id)
    }

    /// Move the actor at `idx` to a random vacant grid between `min` and
    /// `max` away.
    fn teleport(&mut self, idx: usize, min: u32, max: u32, rng: &mut GameRng) -> bool {
        let from = self.actors[idx].view.pos;
        let spots: Vec<Point> = geometry::disc(from, max)
            .into_iter()
            .filter(|p| from.distance(*p) >= min && self.is_vacant(*p))
            .collect();
        match rng.choose(&spots).copied() {
            Some(to) => {
                trace!("{} teleports to ({}, {})", self.actors[idx].view.id, to.x, to.y);
                self.actors[idx].view.pos = to;
                true
            }
            None => false,
        }
    }

    /// Move the actor at `idx` next to `anchor`.
    fn pull_beside(&mut self, idx: usize, anchor: Point) {
        if let Some(to) = self.vacant_near(anchor, 1) {
            self.actors[idx].view.pos = to;
        }
    }

    // ------------------------------------------------------------------------
    // Projection
    // ------------------------------------------------------------------------

    /// Actors a projection reaches, with their distance from the blast
    /// center.
    fn reach(&mut self, request: &ProjectRequest, outcome: &mut ProjectOutcome) -> Vec<(ActorId, u32)> {
        let source = request.source;
        let others = |level: &Level, points: Vec<Point>, center: Point| -> Vec<(ActorId, u32)> {
            points
                .into_iter()
                .filter_map(|p| level.actor_at(p).map(|id| (id, center.distance(p))))
                .filter(|(id, _)| *id != source)
                .collect()
        };

        match request.shape {
            DeliveryShape::Special => Vec::new(),
            DeliveryShape::Point if request.target == request.origin => vec![(source, 0)],
            DeliveryShape::Point => self
                .actor_at(request.target)
                .map(|id| vec![(id, 0)])
                .unwrap_or_default(),
            DeliveryShape::Bolt => {
                let path = self.project_path(request.origin, request.target, request.range, false);
                let mut hit = others(self, path, request.origin);
                hit.truncate(1);
                hit.iter_mut().for_each(|(_, d)| *d = 0);
                hit
            }
            DeliveryShape::Beam => {
                let path = self.project_path(request.origin, request.target, request.range, true);
                others(self, path, request.origin)
                    .into_iter()
                    .map(|(id, _)| (id, 0))
                    .collect()
            }
            DeliveryShape::Ball => {
                let area = self.ball_area(request.target, request.radius);
                others(self, area, request.target)
            }
            DeliveryShape::Breath => {
                if request.flags.contains(ProjectFlags::DISI) {
                    outcome.terrain_changed += self.disintegrate(request);
                }
                let area = self.breath_area(request.origin, request.target, request.radius, request.range);
                others(self, area, request.target)
            }
        }
    }

    /// Clear destructible terrain in a disintegration cone.
    fn disintegrate(&mut self, request: &ProjectRequest) -> usize {
        let mut changed = 0;
        for p in geometry::cone(request.origin, request.target, request.radius) {
            if request.origin.distance(p) > request.range {
                continue;
            }
            if let Some(cell) = self.cell_mut(p) {
                if cell.terrain.is_destructible() {
                    cell.terrain = Terrain::Floor;
                    changed += 1;
                }
            }
        }
        changed
    }

    fn take_damage(&mut self, idx: usize, amount: i32, outcome: &mut ProjectOutcome) {
        let actor = &mut self.actors[idx];
        if actor.view.status.invulnerable || amount <= 0 {
            return;
        }
        actor.view.hp -= amount;
        outcome.damage += amount;
        if !actor.view.is_alive() {
            let (id, pos, is_player) = (actor.view.id, actor.view.pos, actor.view.is_player);
            debug!("{id} dies");
            if !is_player {
                self.place_corpse(pos);
            }
        }
    }

    /// Apply `request`'s effect to the actor at `idx` with strength `amount`.
    fn apply(&mut self, idx: usize, request: &ProjectRequest, amount: i32, rng: &mut GameRng, outcome: &mut ProjectOutcome) {
        let resist = self.actors[idx].resistances;
        let unresisted = |kind: ResistKind| resist.level_for(kind) == ResistLevel::None;
        let free_action = resist.defenses.contains(Defenses::FREE_ACTION);
        let source_pos = self.get(request.source).map(|a| a.view.pos);

        match request.effect {
            EffectKind::Heal => {
                let view = &mut self.actors[idx].view;
                view.hp = (view.hp + amount).min(view.max_hp);
                view.status.afraid = false;
            }
            EffectKind::Haste => self.actors[idx].view.status.hasted = true,
            EffectKind::Invulnerability => self.actors[idx].view.status.invulnerable = true,
            EffectKind::TimeStop => self.time_stop = Some(request.source),
            EffectKind::Blink => {
                self.teleport(idx, 1, BLINK_DISTANCE, rng);
            }
            EffectKind::Teleport | EffectKind::TeleportAway => {
                self.teleport(idx, BLINK_DISTANCE, MAX_RANGE * 3, rng);
            }
            EffectKind::TeleportTo => {
                if let Some(anchor) = source_pos {
                    self.pull_beside(idx, anchor);
                }
            }
            EffectKind::Approach => {
                let anchor = self.actors[idx].view.pos;
                if let Some(src) = self.index_of(request.source) {
                    self.pull_beside(src, anchor);
                }
            }
            EffectKind::TeleportLevel => {
                if unresisted(ResistKind::Nexus) {
                    let gone = self.actors.remove(idx);
                    debug!("{} leaves the level", gone.view.id);
                }
            }
            EffectKind::Dispel => {
                let status = &mut self.actors[idx].view.status;
                status.hasted = false;
                status.invulnerable = false;
            }
            EffectKind::Scare if unresisted(ResistKind::Fear) => {
                self.actors[idx].view.status.afraid = true;
            }
            EffectKind::Blind if unresisted(ResistKind::Blindness) => {
                self.actors[idx].view.status.blinded = true;
            }
            EffectKind::Slow if !free_action => self.actors[idx].view.status.slowed = true,
            EffectKind::Paralyze if !free_action => {
                self.actors[idx].view.status.paralyzed = true;
            }
            EffectKind::Scare | EffectKind::Blind | EffectKind::Slow | EffectKind::Paralyze => {}
            EffectKind::Amnesia => {
                let mind = &mut self.actors[idx].mind;
                mind.ledger.forget();
                mind.last_target = None;
            }
            EffectKind::DrainMana => {
                if !resist.defenses.contains(Defenses::NO_MANA) {
                    if let Some(src) = self.index_of(request.source) {
                        let view = &mut self.actors[src].view;
                        view.hp = (view.hp + amount).min(view.max_hp);
                    }
                }
            }
            EffectKind::Doom => {
                let hp = self.actors[idx].view.hp.max(0);
                self.take_damage(idx, hp * amount / 100, outcome);
            }
            effect => {
                let dealt = match effect.resist_kind() {
                    Some(kind) => resist.adjust_damage(kind, amount),
                    None => amount,
                };
                self.take_damage(idx, dealt, outcome);
                if effect == EffectKind::Confusion && unresisted(ResistKind::Confusion) {
                    self.actors[idx].view.status.confused = true;
                }
            }
        }
    }

    fn summon(&mut self, request: &ProjectRequest, rng: &mut GameRng, outcome: &mut ProjectOutcome) {
        let Some(source) = self.get(request.source) else {
            return;
        };
        let level = source.view.level.max(1);
        let kin = source.view.race;
        let race = request
            .summon
            .and_then(|kind| self.summons.get(&kind).copied())
            .or(kin);
        let Some(race) = race else {
            return;
        };
        for _ in 0..request.magnitude.max(1) {
            let hp = rng.dice(level as u32, 8) as i32;
            match self.place(race, request.target, hp, level, Some(request.source)) {
                Some(id) => outcome.summoned.push(id),
                None => break,
            }
        }
    }

    fn raise_dead(&mut self, request: &ProjectRequest, rng: &mut GameRng, outcome: &mut ProjectOutcome) {
        let Some(source) = self.get(request.source) else {
            return;
        };
        let level = source.view.level.max(1);
        let Some(race) = self
            .summons
            .get(&SummonKind::Undead)
            .copied()
            .or(source.view.race)
        else {
            return;
        };
        let corpses: Vec<Point> = geometry::disc(request.origin, request.radius)
            .into_iter()
            .filter(|p| {
                self.cell(*p).is_some_and(|c| c.corpse) && self.line_of_sight(request.origin, *p)
            })
            .collect();
        for p in corpses {
            if let Some(cell) = self.cell_mut(p) {
                cell.corpse = false;
            }
            let hp = rng.dice(level as u32, 8) as i32;
            if let Some(id) = self.place(race, p, hp, level, Some(request.source)) {
                outcome.summoned.push(id);
            }
        }
    }

    fn lay_traps(&mut self, center: Point) -> usize {
        let mut laid = 0;
        for p in geometry::disc(center, 1) {
            if !self.is_vacant(p) {
                continue;
            }
            if let Some(cell) = self.cell_mut(p) {
                if !cell.trap {
                    cell.trap = true;
                    laid += 1;
                }
            }
        }
        laid
    }
}

// ============================================================================
// World
// ============================================================================

impl Geometry for Level {
    fn in_bounds(&self, p: Point) -> bool {
        self.is_valid_pos(p)
    }

    fn is_open(&self, p: Point) -> bool {
        self.terrain(p).is_some_and(|t| !t.blocks_projection())
    }

    fn line_of_sight(&self, from: Point, to: Point) -> bool {
        if !self.is_valid_pos(to) {
            return false;
        }
        geometry::line_path(from, to, u32::MAX, false)
            .into_iter()
            .filter(|p| *p != to)
            .all(|p| self.terrain(p).is_some_and(|t| !t.blocks_sight()))
    }

    fn summon_possible(&self, near: Point) -> bool {
        self.vacant_near(near, 2).is_some()
    }

    fn corpse_in_range(&self, center: Point, radius: u32) -> bool {
        geometry::disc(center, radius)
            .into_iter()
            .any(|p| self.cell(p).is_some_and(|c| c.corpse) && self.line_of_sight(center, p))
    }
}

impl ActorQuery for Level {
    fn actor(&self, id: ActorId) -> Option<ActorView> {
        self.get(id).map(|a| a.view.clone())
    }

    fn actor_ids(&self) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter(|a| a.view.is_alive())
            .map(|a| a.view.id)
            .collect()
    }

    fn actor_at(&self, p: Point) -> Option<ActorId> {
        self.living_at(p).map(|idx| self.actors[idx].view.id)
    }

    fn are_enemies(&self, a: ActorId, b: ActorId) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(a), Some(b)) => a.view.id != b.view.id && a.faction != b.faction,
            _ => false,
        }
    }

    fn resistances(&self, id: ActorId) -> Resistances {
        self.get(id).map(|a| a.resistances).unwrap_or_default()
    }

    fn owner_permissions(&self, owner: ActorId) -> PetPermissions {
        self.get(owner).map(|a| a.permissions).unwrap_or_default()
    }

    fn rider_of(&self, mount: ActorId) -> Option<ActorId> {
        self.get(mount).and_then(|a| a.rider)
    }

    fn dispellable(&self, id: ActorId) -> bool {
        self.get(id)
            .is_some_and(|a| a.view.status.hasted || a.view.status.invulnerable)
    }

    fn mind(&self, id: ActorId) -> Option<&CasterMind> {
        self.get(id).map(|a| &a.mind)
    }

    fn zone(&self) -> &ZoneRules {
        &self.zone
    }

    fn time_stop_active(&self) -> bool {
        self.time_stop.is_some()
    }
}

impl Projector for Level {
    fn project(&mut self, request: &ProjectRequest, rng: &mut GameRng) -> ProjectOutcome {
        let mut outcome = ProjectOutcome::default();
        let target = self.actor_at(request.target);

        match request.effect {
            EffectKind::Summon => {
                self.summon(request, rng, &mut outcome);
                return outcome;
            }
            EffectKind::RaiseDead => {
                self.raise_dead(request, rng, &mut outcome);
                return outcome;
            }
            EffectKind::Traps => {
                outcome.terrain_changed = self.lay_traps(request.target);
                return outcome;
            }
            EffectKind::Shriek => {
                for actor in &mut self.actors {
                    actor.view.status.unaware = false;
                }
                return outcome;
            }
            EffectKind::Darkness => return outcome,
            _ => {}
        }

        let reflectable = request.flags.contains(ProjectFlags::REFLECTABLE);
        for (id, d) in self.reach(request, &mut outcome) {
            let Some(idx) = self.index_of(id) else {
                continue;
            };
            if reflectable && self.actors[idx].resistances.defenses.contains(Defenses::REFLECT) {
                trace!("{id} reflects {}", request.ability);
                outcome.reflected = true;
                continue;
            }
            let amount = if d == 0 {
                request.magnitude
            } else {
                (request.magnitude + d as i32) / (d as i32 + 1)
            };
            outcome.affected.push(id);
            self.apply(idx, request, amount, rng, &mut outcome);
        }

        outcome.target_died = target.is_some_and(|id| {
            outcome.affected.contains(&id) && self.get(id).is_some_and(|a| !a.view.is_alive())
        });
        outcome
    }
}

impl World for Level {
    fn mind_mut(&mut self, id: ActorId) -> Option<&mut CasterMind> {
        self.get_mut(id).map(|a| &mut a.mind)
    }

    fn spawn(&mut self, race: RaceId, near: Point, hp: i32, ally_of: Option<ActorId>) -> Option<ActorId> {
        let level = ally_of.and_then(|a| self.get(a)).map_or(1, |a| a.view.level);
        self.place(race, near, hp, level, ally_of)
    }

    fn remove(&mut self, id: ActorId) {
        self.actors.retain(|a| a.view.id != id);
        for actor in &mut self.actors {
            if actor.rider == Some(id) {
                actor.rider = None;
            }
        }
        if self.time_stop == Some(id) {
            self.time_stop = None;
        }
    }
}
