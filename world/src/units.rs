//! Unit entities walking between the spawners.

use std::time::Duration;

use duel_defence_core::{Event, Point, Side, UnitId, UnitSnapshot};

use crate::{board::Board, catalog::UnitType};

/// A unit travelling from its own spawner towards the opposing one.
#[derive(Clone, Debug)]
pub struct Unit {
    id: UnitId,
    kind: String,
    side: Side,
    health: f64,
    damage_per_second: f64,
    step: Duration,
    accumulated: Duration,
    position: Point,
    next_position: Point,
    destination: Point,
    path: Vec<Point>,
    path_index: usize,
    deleted: bool,
}

impl Unit {
    /// Spawns a unit on its side's spawner following the current solution.
    ///
    /// Returns `None` when no route exists between the spawners.
    pub(crate) fn spawn(id: UnitId, side: Side, unit_type: &UnitType, board: &mut Board) -> Option<Self> {
        let path = board.solution(side, &[]);
        let position = *path.first()?;
        let destination = *path.last()?;

        Some(Self {
            id,
            kind: unit_type.name().to_owned(),
            side,
            health: f64::from(unit_type.health()),
            damage_per_second: unit_type.damage_per_second(),
            step: unit_type.step(),
            accumulated: Duration::ZERO,
            position,
            next_position: path.get(1).copied().unwrap_or(position),
            destination,
            path,
            path_index: 0,
            deleted: false,
        })
    }

    /// Identifier of the unit.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Unit type name.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Owner.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Remaining health.
    #[must_use]
    pub const fn health(&self) -> f64 {
        self.health
    }

    /// Time spent in the current cell.
    #[must_use]
    pub const fn accumulated(&self) -> Duration {
        self.accumulated
    }

    /// Current cell.
    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    /// Cell the unit moves to next; equals the position at the end of the path.
    #[must_use]
    pub const fn next_position(&self) -> Point {
        self.next_position
    }

    /// Final cell of the path.
    #[must_use]
    pub const fn destination(&self) -> Point {
        self.destination
    }

    /// Planned route from the spawn cell to the destination.
    #[must_use]
    pub fn path(&self) -> &[Point] {
        &self.path
    }

    /// Index of the current cell within the path.
    #[must_use]
    pub const fn path_index(&self) -> usize {
        self.path_index
    }

    /// Tombstone flag.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Captures the fields targeting needs.
    #[must_use]
    pub const fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            side: self.side,
            cell: self.position,
            path_index: self.path_index,
            health: self.health,
        }
    }

    /// Accumulates `dt` and walks as many cells as the accumulated time pays for.
    ///
    /// Returns `true` once a full step elapses while the unit already stands
    /// on its destination, meaning it reached the opposing base.
    pub(crate) fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) -> bool {
        self.accumulated = self.accumulated.saturating_add(dt);

        while self.accumulated >= self.step {
            if self.position == self.destination || self.path_index + 1 >= self.path.len() {
                return true;
            }

            self.accumulated -= self.step;
            let from = self.position;
            self.path_index += 1;
            self.position = self.path[self.path_index];
            self.next_position = self.path.get(self.path_index + 1).copied().unwrap_or(self.position);
            out_events.push(Event::UnitAdvanced {
                unit: self.id,
                from,
                to: self.position,
            });
        }
        false
    }

    /// Replans the part of the path ahead of the unit against the current board.
    ///
    /// The traversed prefix is kept verbatim. Planning starts from the next
    /// cell, or from the current cell when the next one has become a tower
    /// cell. Without any route the previous path stays in place.
    pub(crate) fn update_path(&mut self, board: &Board) {
        let Some(&next) = self.path.get(self.path_index + 1) else {
            return;
        };

        let (keep, from) = if board.cell(next).is_walkable() {
            (self.path_index + 1, next)
        } else {
            (self.path_index, self.position)
        };

        let suffix = board.find_path(from, self.destination, &[]);
        if suffix.is_empty() {
            return;
        }

        self.path.truncate(keep);
        self.path.extend(suffix);
        self.next_position = self.path.get(self.path_index + 1).copied().unwrap_or(self.position);
    }

    /// Damage dealt back to an attacker over `dt`.
    pub(crate) fn damage_over(&self, dt: Duration) -> f64 {
        self.damage_per_second * dt.as_secs_f64()
    }

    pub(crate) fn take_damage(&mut self, amount: f64) {
        self.health -= amount;
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.deleted = true;
    }
}

/// Registry that stores units and manages identifier allocation.
#[derive(Clone, Debug)]
pub struct UnitRegistry {
    entries: Vec<Unit>,
    next_unit_id: UnitId,
}

impl UnitRegistry {
    /// Creates an empty registry whose first identifier is 1.
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_unit_id: UnitId::new(1),
        }
    }

    pub(crate) fn allocate_id(&mut self) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id = UnitId::new(id.get().saturating_add(1));
        id
    }

    pub(crate) fn insert(&mut self, unit: Unit) {
        debug_assert!(
            self.entries.last().map_or(true, |last| last.id < unit.id),
            "units must be inserted in identifier order"
        );
        self.entries.push(unit);
    }

    /// Live unit with the provided identifier.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        let index = self.position(id)?;
        Some(&self.entries[index]).filter(|unit| !unit.deleted)
    }

    pub(crate) fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        let index = self.position(id)?;
        Some(&mut self.entries[index]).filter(|unit| !unit.deleted)
    }

    /// Live units in identifier order.
    pub fn live(&self) -> impl Iterator<Item = &Unit> {
        self.entries.iter().filter(|unit| !unit.deleted)
    }

    pub(crate) fn live_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.entries.iter_mut().filter(|unit| !unit.deleted)
    }

    /// Every unit ever spawned, tombstones included.
    #[must_use]
    pub fn all(&self) -> &[Unit] {
        &self.entries
    }

    fn position(&self, id: UnitId) -> Option<usize> {
        self.entries.binary_search_by_key(&id, |unit| unit.id).ok()
    }
}
