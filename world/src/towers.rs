//! Tower entities and their tombstoning registry.

use std::time::Duration;

use duel_defence_core::{
    Cell, Extent, HalfCellPoint, Point, Side, TargetStyle, TowerId, TowerSnapshot, UnitId,
};

use crate::{board::Board, catalog::TowerType};

/// A placed tower.
#[derive(Clone, Debug)]
pub struct Tower {
    id: TowerId,
    origin: Point,
    center: HalfCellPoint,
    extent: Extent,
    side: Side,
    kind: String,
    cells: Vec<Point>,
    health: f64,
    damage_per_second: f64,
    target: Option<UnitId>,
    style: TargetStyle,
    deleted: bool,
    reachable: Vec<Point>,
}

impl Tower {
    /// Builds a tower and stamps its footprint onto the board.
    ///
    /// `origin` is clamped the same way [`Board::square_poses`] clamps it and
    /// the clamped value is the one stored. Callers validate the placement.
    pub(crate) fn place(
        id: TowerId,
        origin: Point,
        side: Side,
        tower_type: &TowerType,
        board: &mut Board,
    ) -> Self {
        let extent = tower_type.extent();
        let (origin, cells) = board.square_poses(origin, extent);
        for cell in &cells {
            board.set_cell(*cell, Cell::Tower(id));
        }

        let reachable = tower_type
            .reachable()
            .iter()
            .map(|offset| origin.offset(*offset))
            .filter(|cell| board.in_bounds(*cell))
            .collect();

        Self {
            id,
            origin,
            center: HalfCellPoint::of_footprint(origin, extent),
            extent,
            side,
            kind: tower_type.name().to_owned(),
            cells,
            health: f64::from(tower_type.health()),
            damage_per_second: tower_type.damage_per_second(),
            target: None,
            style: TargetStyle::default(),
            deleted: false,
            reachable,
        }
    }

    /// Identifier of the tower.
    #[must_use]
    pub const fn id(&self) -> TowerId {
        self.id
    }

    /// Clamped upper-left footprint cell.
    #[must_use]
    pub const fn origin(&self) -> Point {
        self.origin
    }

    /// Footprint centre.
    #[must_use]
    pub const fn center(&self) -> HalfCellPoint {
        self.center
    }

    /// Footprint size.
    #[must_use]
    pub const fn extent(&self) -> Extent {
        self.extent
    }

    /// Owner.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Tower type name.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Cells covered by the footprint.
    #[must_use]
    pub fn cells(&self) -> &[Point] {
        &self.cells
    }

    /// Remaining health.
    #[must_use]
    pub const fn health(&self) -> f64 {
        self.health
    }

    /// Unit attacked during the most recent tick.
    #[must_use]
    pub const fn target(&self) -> Option<UnitId> {
        self.target
    }

    /// Active target-selection policy.
    #[must_use]
    pub const fn style(&self) -> TargetStyle {
        self.style
    }

    /// Tombstone flag.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Board cells within attack range, sorted and clipped to the board.
    #[must_use]
    pub fn reachable(&self) -> &[Point] {
        &self.reachable
    }

    /// Reports whether `cell` lies within attack range.
    #[must_use]
    pub fn reaches(&self, cell: Point) -> bool {
        self.reachable.binary_search(&cell).is_ok()
    }

    /// Reports whether `cell` belongs to the footprint.
    #[must_use]
    pub fn covers(&self, cell: Point) -> bool {
        self.cells.contains(&cell)
    }

    /// Captures the fields targeting needs.
    #[must_use]
    pub const fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            side: self.side,
            style: self.style,
            center: self.center,
        }
    }

    /// Damage dealt over `dt`.
    pub(crate) fn damage_over(&self, dt: Duration) -> f64 {
        self.damage_per_second * dt.as_secs_f64()
    }

    pub(crate) fn take_damage(&mut self, amount: f64) {
        self.health -= amount;
    }

    pub(crate) fn set_style(&mut self, style: TargetStyle) {
        self.style = style;
    }

    pub(crate) fn set_target(&mut self, target: Option<UnitId>) {
        self.target = target;
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.deleted = true;
        self.target = None;
    }
}

/// Registry that stores towers and manages identifier allocation.
///
/// Entries are never removed; deleted towers keep their slot with the
/// tombstone flag set, so identifiers stay unique for the whole match.
#[derive(Clone, Debug)]
pub struct TowerRegistry {
    entries: Vec<Tower>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty registry whose first identifier is 1.
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_tower_id: TowerId::new(1),
        }
    }

    /// Reserves the next identifier.
    pub(crate) fn allocate_id(&mut self) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        id
    }

    pub(crate) fn insert(&mut self, tower: Tower) {
        debug_assert!(
            self.entries.last().map_or(true, |last| last.id < tower.id),
            "towers must be inserted in identifier order"
        );
        self.entries.push(tower);
    }

    /// Live tower with the provided identifier.
    #[must_use]
    pub fn get(&self, id: TowerId) -> Option<&Tower> {
        let index = self.position(id)?;
        Some(&self.entries[index]).filter(|tower| !tower.deleted)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        let index = self.position(id)?;
        Some(&mut self.entries[index]).filter(|tower| !tower.deleted)
    }

    /// Live towers in identifier order.
    pub fn live(&self) -> impl Iterator<Item = &Tower> {
        self.entries.iter().filter(|tower| !tower.deleted)
    }

    pub(crate) fn live_mut(&mut self) -> impl Iterator<Item = &mut Tower> {
        self.entries.iter_mut().filter(|tower| !tower.deleted)
    }

    /// Every tower ever placed, tombstones included.
    #[must_use]
    pub fn all(&self) -> &[Tower] {
        &self.entries
    }

    /// Live tower whose footprint covers `cell`.
    #[must_use]
    pub fn at(&self, cell: Point) -> Option<&Tower> {
        self.live().find(|tower| tower.covers(cell))
    }

    fn position(&self, id: TowerId) -> Option<usize> {
        self.entries
            .binary_search_by_key(&id, |tower| tower.id)
            .ok()
    }
}
