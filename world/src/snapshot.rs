//! Serializable broadcast state of a match.

use duel_defence_core::{Cell, Extent, Point, RoundState, Side, TargetStyle, TowerId, UnitId};
use serde::Serialize;

use crate::{board::Spawners, client::ClientState, towers::Tower, units::Unit};

/// Everything a client needs to render the match.
#[derive(Clone, Debug, Serialize)]
pub struct MatchState {
    /// Grid occupancy.
    pub board: BoardState,
    /// Every tower, tombstones included.
    pub towers: Vec<TowerState>,
    /// Every unit, tombstones included.
    pub units: Vec<UnitState>,
    /// Current phase of the round lifecycle.
    pub round: RoundState,
    /// Rounds that ended with every unit cleared.
    pub rounds_completed: u32,
    /// Per-side economy, in [`Side::ALL`] order.
    pub clients: Vec<ClientSummary>,
}

/// Grid occupancy and spawners.
#[derive(Clone, Debug, Serialize)]
pub struct BoardState {
    /// Board dimensions.
    pub extent: Extent,
    /// Row-major cells.
    pub cells: Vec<Cell>,
    /// Spawner positions.
    pub spawners: Option<Spawners>,
}

/// Broadcast form of a tower.
#[derive(Clone, Debug, Serialize)]
pub struct TowerState {
    /// Identifier.
    pub id: TowerId,
    /// Owner.
    pub side: Side,
    /// Tower type name.
    pub kind: String,
    /// Clamped origin.
    pub origin: Point,
    /// Footprint centre in cell units.
    pub center: (f32, f32),
    /// Footprint size.
    pub extent: Extent,
    /// Footprint cells.
    pub cells: Vec<Point>,
    /// Remaining health.
    pub health: f64,
    /// Unit attacked during the latest tick.
    pub target: Option<UnitId>,
    /// Target-selection policy.
    pub style: TargetStyle,
    /// Tombstone flag.
    pub deleted: bool,
    /// Board cells within attack range.
    pub reachable: Vec<Point>,
}

impl From<&Tower> for TowerState {
    fn from(tower: &Tower) -> Self {
        Self {
            id: tower.id(),
            side: tower.side(),
            kind: tower.kind().to_owned(),
            origin: tower.origin(),
            center: tower.center().to_cells(),
            extent: tower.extent(),
            cells: tower.cells().to_vec(),
            health: tower.health(),
            target: tower.target(),
            style: tower.style(),
            deleted: tower.is_deleted(),
            reachable: tower.reachable().to_vec(),
        }
    }
}

/// Broadcast form of a unit.
#[derive(Clone, Debug, Serialize)]
pub struct UnitState {
    /// Identifier.
    pub id: UnitId,
    /// Unit type name.
    pub kind: String,
    /// Owner.
    pub side: Side,
    /// Remaining health.
    pub health: f64,
    /// Milliseconds spent in the current cell.
    pub accumulated_ms: u64,
    /// Current cell.
    pub position: Point,
    /// Cell the unit moves to next.
    pub next_position: Point,
    /// Final cell of the path.
    pub destination: Point,
    /// Planned route.
    pub path: Vec<Point>,
    /// Index of the current cell within the route.
    pub path_index: usize,
    /// Tombstone flag.
    pub deleted: bool,
}

impl From<&Unit> for UnitState {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id(),
            kind: unit.kind().to_owned(),
            side: unit.side(),
            health: unit.health(),
            accumulated_ms: u64::try_from(unit.accumulated().as_millis()).unwrap_or(u64::MAX),
            position: unit.position(),
            next_position: unit.next_position(),
            destination: unit.destination(),
            path: unit.path().to_vec(),
            path_index: unit.path_index(),
            deleted: unit.is_deleted(),
        }
    }
}

/// Economy of one side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClientSummary {
    /// Side described.
    pub side: Side,
    /// Remaining money.
    pub money: u32,
    /// Ready flag.
    pub ready: bool,
    /// Units bought for the next round.
    pub unit_queue: Vec<String>,
}

impl From<&ClientState> for ClientSummary {
    fn from(client: &ClientState) -> Self {
        Self {
            side: client.side(),
            money: client.money(),
            ready: client.is_ready(),
            unit_queue: client.unit_queue().to_vec(),
        }
    }
}
