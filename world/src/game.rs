//! Authoritative simulation: entities, catalogs, tick and round lifecycle.

use std::{collections::VecDeque, time::Duration};

use duel_defence_core::{
    Cell, Event, PlacementError, Point, RoundState, Side, TargetStyle, TowerId, UnitFate, UnitId,
    UnitView,
};
use duel_defence_system_tower_targeting::TowerTargeting;

use crate::{
    board::Board,
    catalog::Catalog,
    config::{ConfigError, MatchConfig},
    towers::{Tower, TowerRegistry},
    units::{Unit, UnitRegistry},
};

/// A queued unit waiting for its slot in the spawn stagger.
#[derive(Clone, Debug, PartialEq, Eq)]
struct PendingSpawn {
    due: Duration,
    side: Side,
    kind: String,
}

/// Board, entities and round state shared by both sides.
#[derive(Debug)]
pub struct GameState {
    board: Board,
    towers: TowerRegistry,
    units: UnitRegistry,
    catalog: Catalog,
    targeting: TowerTargeting,
    round_state: RoundState,
    round_elapsed: Duration,
    pending: VecDeque<PendingSpawn>,
    cooldown: Option<Duration>,
    round_cooldown: Duration,
    spawn_stagger: Duration,
    rounds_completed: u32,
}

impl GameState {
    /// Creates the board with both spawners and an empty Waiting round.
    pub fn new(config: &MatchConfig, catalog: Catalog) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut board = Board::new(config.extent());
        board.create_spawners(config.top_spawner, config.bottom_spawner);

        Ok(Self {
            board,
            towers: TowerRegistry::new(),
            units: UnitRegistry::new(),
            catalog,
            targeting: TowerTargeting::new(),
            round_state: RoundState::Waiting,
            round_elapsed: Duration::ZERO,
            pending: VecDeque::new(),
            cooldown: None,
            round_cooldown: config.round_cooldown(),
            spawn_stagger: config.spawn_stagger(),
            rounds_completed: 0,
        })
    }

    /// Grid occupancy.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Tower and unit type tables.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Every tower, tombstones included.
    #[must_use]
    pub const fn towers(&self) -> &TowerRegistry {
        &self.towers
    }

    /// Every unit, tombstones included.
    #[must_use]
    pub const fn units(&self) -> &UnitRegistry {
        &self.units
    }

    /// Current phase of the round lifecycle.
    #[must_use]
    pub const fn round_state(&self) -> RoundState {
        self.round_state
    }

    /// Rounds that ended with every unit cleared.
    #[must_use]
    pub const fn rounds_completed(&self) -> u32 {
        self.rounds_completed
    }

    /// Units bought for the running round that have not spawned yet.
    #[must_use]
    pub fn pending_spawns(&self) -> usize {
        self.pending.len()
    }

    /// Time left before Waiting turns into Constructing.
    #[must_use]
    pub const fn cooldown_remaining(&self) -> Option<Duration> {
        self.cooldown
    }

    /// Live tower by identifier.
    #[must_use]
    pub fn tower(&self, id: TowerId) -> Option<&Tower> {
        self.towers.get(id)
    }

    /// Live tower covering a board cell.
    #[must_use]
    pub fn tower_at(&self, cell: Point) -> Option<&Tower> {
        self.towers.at(cell)
    }

    /// Live unit by identifier.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    /// Clamped origin and footprint cells of a hypothetical placement.
    #[must_use]
    pub fn tower_footprint(&self, origin: Point, kind: &str) -> Option<(Point, Vec<Point>)> {
        let tower_type = self.catalog.tower(kind)?;
        Some(self.board.square_poses(origin, tower_type.extent()))
    }

    /// Checks type, bounds and occupancy of a placement and returns its footprint.
    pub fn check_tower_placement(
        &self,
        origin: Point,
        kind: &str,
    ) -> Result<Vec<Point>, PlacementError> {
        let tower_type = self
            .catalog
            .tower(kind)
            .ok_or(PlacementError::UnknownTowerType)?;
        if !self.board.in_bounds(origin) {
            return Err(PlacementError::OutOfBounds);
        }

        let (_, cells) = self.board.square_poses(origin, tower_type.extent());
        if cells.iter().any(|cell| !self.board.in_bounds(*cell)) {
            return Err(PlacementError::OutOfBounds);
        }
        if cells.iter().any(|cell| self.board.cell(*cell) != Cell::Empty) {
            return Err(PlacementError::Occupied);
        }
        Ok(cells)
    }

    /// Reports whether a tower fits at `origin` without overlapping anything.
    #[must_use]
    pub fn can_place_tower(&self, origin: Point, kind: &str) -> bool {
        self.check_tower_placement(origin, kind).is_ok()
    }

    /// Route from `from`'s spawner to the opposite one, avoiding `exclude`.
    pub fn solution(&mut self, from: Side, exclude: &[Point]) -> Vec<Point> {
        self.board.solution(from, exclude)
    }

    /// Constructs a tower. Callers validate the placement and debit the cost.
    ///
    /// Returns `None` only for an unknown tower type.
    pub fn add_tower(&mut self, origin: Point, kind: &str, side: Side) -> Option<TowerId> {
        let tower_type = self.catalog.tower(kind)?;
        let id = self.towers.allocate_id();
        let tower = Tower::place(id, origin, side, tower_type, &mut self.board);
        self.towers.insert(tower);
        self.repair_paths();
        Some(id)
    }

    /// Clears a live tower's footprint, tombstones it and repairs unit paths.
    pub fn remove_tower(&mut self, id: TowerId) -> bool {
        if !self.clear_tower(id) {
            return false;
        }
        self.repair_paths();
        true
    }

    /// Changes the targeting policy of a live tower.
    pub fn set_target_style(&mut self, id: TowerId, style: TargetStyle) -> bool {
        match self.towers.get_mut(id) {
            Some(tower) => {
                tower.set_style(style);
                true
            }
            None => false,
        }
    }

    /// Spawns a unit on `side`'s spawner using the current route.
    pub fn spawn_unit(&mut self, side: Side, kind: &str, out_events: &mut Vec<Event>) -> Option<UnitId> {
        let Some(unit_type) = self.catalog.unit(kind) else {
            tracing::warn!(?side, kind, "unknown unit type in spawn queue");
            return None;
        };

        let id = self.units.allocate_id();
        let Some(unit) = Unit::spawn(id, side, unit_type, &mut self.board) else {
            tracing::warn!(?side, kind, "no route between spawners; unit dropped");
            return None;
        };

        out_events.push(Event::UnitSpawned {
            unit: id,
            side,
            kind: kind.to_owned(),
            cell: unit.position(),
        });
        self.units.insert(unit);
        Some(id)
    }

    /// Hands the match over from the lobby by opening the first construction phase.
    pub fn open_construction(&mut self, out_events: &mut Vec<Event>) -> bool {
        if self.round_state != RoundState::Waiting || self.cooldown.is_some() {
            return false;
        }
        self.set_round_state(RoundState::Constructing, out_events);
        true
    }

    /// Starts a round with each side's bought units.
    ///
    /// Units of one side are released `index * spawn_stagger` apart in
    /// simulated round time; the first ones enter the board immediately.
    pub fn start_round(&mut self, queues: Vec<(Side, Vec<String>)>, out_events: &mut Vec<Event>) {
        self.set_round_state(RoundState::Playing, out_events);
        self.round_elapsed = Duration::ZERO;

        let stagger = self.spawn_stagger;
        let mut pending: Vec<PendingSpawn> = queues
            .into_iter()
            .flat_map(|(side, kinds)| {
                kinds.into_iter().enumerate().map(move |(index, kind)| PendingSpawn {
                    due: stagger.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX)),
                    side,
                    kind,
                })
            })
            .collect();
        pending.sort_by_key(|spawn| spawn.due);
        self.pending = pending.into();

        tracing::info!(
            round = self.rounds_completed + 1,
            queued = self.pending.len(),
            "round started"
        );
        self.release_due_spawns(out_events);
    }

    /// Advances the round by `dt` of simulated time.
    pub fn update_round(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        match self.round_state {
            RoundState::Waiting => self.count_down(dt, out_events),
            RoundState::Constructing => {}
            RoundState::Playing => self.play(dt, out_events),
        }
    }

    fn count_down(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Some(remaining) = self.cooldown else {
            return;
        };
        let remaining = remaining.saturating_sub(dt);
        if remaining.is_zero() {
            self.cooldown = None;
            self.set_round_state(RoundState::Constructing, out_events);
        } else {
            self.cooldown = Some(remaining);
        }
    }

    fn play(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.round_elapsed = self.round_elapsed.saturating_add(dt);

        self.move_units(dt, out_events);
        self.release_due_spawns(out_events);
        self.tower_attack(dt, out_events);
        self.remove_destroyed_towers(out_events);

        if self.units.live().next().is_none() && self.pending.is_empty() {
            self.rounds_completed = self.rounds_completed.saturating_add(1);
            tracing::info!(rounds_completed = self.rounds_completed, "round over");
            self.cooldown = Some(self.round_cooldown);
            self.set_round_state(RoundState::Waiting, out_events);
        }
    }

    fn move_units(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let arrived: Vec<UnitId> = self
            .units
            .live_mut()
            .filter_map(|unit| unit.advance(dt, out_events).then(|| unit.id()))
            .collect();

        for id in arrived {
            self.destroy_unit(id, UnitFate::ReachedBase, out_events);
        }
    }

    fn release_due_spawns(&mut self, out_events: &mut Vec<Event>) {
        while self
            .pending
            .front()
            .is_some_and(|spawn| spawn.due <= self.round_elapsed)
        {
            let Some(spawn) = self.pending.pop_front() else {
                break;
            };
            let _ = self.spawn_unit(spawn.side, &spawn.kind, out_events);
        }
    }

    fn tower_attack(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Self {
            towers,
            units,
            targeting,
            ..
        } = self;

        for tower in towers.live_mut() {
            let view = UnitView::from_snapshots(units.live().map(Unit::snapshot).collect());
            let snapshot = tower.snapshot();
            let target = targeting.select(&snapshot, &view, |unit| tower.reaches(unit.cell));
            tower.set_target(target);

            let Some(unit) = target.and_then(|id| units.get_mut(id)) else {
                continue;
            };

            unit.take_damage(tower.damage_over(dt));
            tower.take_damage(unit.damage_over(dt));
            out_events.push(Event::TowerAttacked {
                tower: tower.id(),
                unit: unit.id(),
            });

            if unit.health() <= 0.0 {
                unit.mark_deleted();
                tracing::debug!(unit = unit.id().get(), tower = tower.id().get(), "unit killed");
                out_events.push(Event::UnitDestroyed {
                    unit: unit.id(),
                    side: unit.side(),
                    fate: UnitFate::Killed,
                });
            }
        }
    }

    fn remove_destroyed_towers(&mut self, out_events: &mut Vec<Event>) {
        let destroyed: Vec<(TowerId, Side)> = self
            .towers
            .live()
            .filter(|tower| tower.health() <= 0.0)
            .map(|tower| (tower.id(), tower.side()))
            .collect();
        if destroyed.is_empty() {
            return;
        }

        for (tower, side) in destroyed {
            let _ = self.clear_tower(tower);
            tracing::info!(tower = tower.get(), ?side, "tower destroyed");
            out_events.push(Event::TowerDestroyed { tower, side });
        }
        self.repair_paths();
    }

    fn destroy_unit(&mut self, id: UnitId, fate: UnitFate, out_events: &mut Vec<Event>) {
        let Some(unit) = self.units.get_mut(id) else {
            return;
        };
        unit.mark_deleted();
        if fate == UnitFate::ReachedBase {
            tracing::info!(unit = id.get(), side = ?unit.side(), "unit reached the opposing base");
        }
        out_events.push(Event::UnitDestroyed {
            unit: id,
            side: unit.side(),
            fate,
        });
    }

    fn clear_tower(&mut self, id: TowerId) -> bool {
        let Some(tower) = self.towers.get_mut(id) else {
            return false;
        };
        for cell in tower.cells() {
            self.board.set_cell(*cell, Cell::Empty);
        }
        tower.mark_deleted();
        true
    }

    fn repair_paths(&mut self) {
        let Self { board, units, .. } = self;
        for unit in units.live_mut() {
            unit.update_path(board);
        }
    }

    fn set_round_state(&mut self, state: RoundState, out_events: &mut Vec<Event>) {
        if self.round_state == state {
            return;
        }
        tracing::info!(from = ?self.round_state, to = ?state, "round state changed");
        self.round_state = state;
        out_events.push(Event::RoundStateChanged { state });
    }
}
