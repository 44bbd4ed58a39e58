#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Duel Defence engine.
//!
//! This crate defines the message surface that connects the room adapter, the
//! authoritative world, and pure systems. Clients submit [`Command`] values
//! describing desired mutations, the world validates and executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! describing what actually changed. Requests that fail validation never
//! mutate state; they are answered with a rejection event instead.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One of the two opposing sides of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Side whose spawner sits on the top edge of the board.
    Top,
    /// Side whose spawner sits on the bottom edge of the board.
    Bottom,
}

impl Side {
    /// Both sides in a stable order.
    pub const ALL: [Side; 2] = [Side::Top, Side::Bottom];

    /// Returns the opposing side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
        }
    }
}

/// Location of a single grid cell expressed as integer coordinates.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Point {
    x: i32,
    y: i32,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the point.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the point.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the point shifted by the provided offset.
    #[must_use]
    pub const fn offset(self, by: Point) -> Self {
        Self::new(self.x + by.x, self.y + by.y)
    }

    /// Squared Euclidean distance between two points.
    #[must_use]
    pub fn distance_sq(self, other: Point) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }
}

/// Width and height of a grid region measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    width: i32,
    height: i32,
}

impl Extent {
    /// Creates a new extent.
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Width in cells.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height in cells.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Number of cells covered by the extent, zero when either side is not positive.
    #[must_use]
    pub fn area(&self) -> usize {
        let width = usize::try_from(self.width).unwrap_or(0);
        let height = usize::try_from(self.height).unwrap_or(0);
        width.saturating_mul(height)
    }

    /// Reports whether the point lies within `[0, width) x [0, height)`.
    #[must_use]
    pub const fn contains(&self, point: Point) -> bool {
        point.x >= 0 && point.y >= 0 && point.x < self.width && point.y < self.height
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl Rect {
    /// Creates a rectangle anchored at `(x, y)`.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Upper-left cell of the rectangle.
    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Dimensions of the rectangle.
    #[must_use]
    pub const fn extent(&self) -> Extent {
        Extent::new(self.width, self.height)
    }

    /// Half-open containment test: `x <= p.x < x + width`, same for `y`.
    #[must_use]
    pub const fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }
}

/// Point measured in half cells so that cell and footprint centres stay integral.
///
/// The centre of cell `(x, y)` is `(2x + 1, 2y + 1)`; the centre of a footprint
/// anchored at `o` with extent `e` is `(2o.x + e.width, 2o.y + e.height)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HalfCellPoint {
    x: i64,
    y: i64,
}

impl HalfCellPoint {
    /// Centre of a single cell.
    #[must_use]
    pub fn of_cell(cell: Point) -> Self {
        Self {
            x: i64::from(cell.x) * 2 + 1,
            y: i64::from(cell.y) * 2 + 1,
        }
    }

    /// Centre of a footprint anchored at `origin`.
    #[must_use]
    pub fn of_footprint(origin: Point, extent: Extent) -> Self {
        Self {
            x: i64::from(origin.x) * 2 + i64::from(extent.width),
            y: i64::from(origin.y) * 2 + i64::from(extent.height),
        }
    }

    /// Squared distance measured in half-cell units.
    #[must_use]
    pub fn distance_sq(self, other: HalfCellPoint) -> i64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Converts the point back into fractional cell units.
    #[must_use]
    pub fn to_cells(self) -> (f32, f32) {
        (self.x as f32 / 2.0, self.y as f32 / 2.0)
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the unit identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Occupancy of a single board cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Nothing occupies the cell.
    #[default]
    Empty,
    /// One of the two fixed unit entry points.
    Spawner,
    /// Part of the footprint of the referenced tower.
    Tower(TowerId),
}

impl Cell {
    /// Units may walk through empty cells and spawners.
    #[must_use]
    pub const fn is_walkable(&self) -> bool {
        matches!(self, Self::Empty | Self::Spawner)
    }
}

/// Policy a tower uses to choose between enemy units in range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetStyle {
    /// Unit furthest along its path.
    #[default]
    First,
    /// Unit least far along its path.
    Last,
    /// Unit with the most remaining health.
    Strongest,
    /// Unit with the least remaining health.
    Weakest,
    /// Unit closest to the tower centre.
    Nearest,
    /// Unit furthest from the tower centre.
    Furthest,
}

impl TargetStyle {
    /// Every selectable style.
    pub const ALL: [TargetStyle; 6] = [
        TargetStyle::First,
        TargetStyle::Last,
        TargetStyle::Strongest,
        TargetStyle::Weakest,
        TargetStyle::Nearest,
        TargetStyle::Furthest,
    ];
}

/// Phase of the round lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundState {
    /// Nothing happens; either before the match opens or during the cooldown.
    #[default]
    Waiting,
    /// Both sides may build towers and queue units.
    Constructing,
    /// Queued units are released and combat runs every tick.
    Playing,
}

/// Configuration record describing a tower type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerTypeRecord {
    /// Unique name used by clients to request the type.
    pub name: String,
    /// Footprint as `[width, height]` in cells.
    pub extent: [i32; 2],
    /// Maximum health.
    pub health: u32,
    /// Damage dealt to the current target per second of simulated time.
    #[serde(alias = "damagePerSecond")]
    pub damage_per_second: f64,
    /// Attack radius in cells measured from the footprint centre.
    pub range: u32,
    /// Money debited on placement and refunded on demolition.
    pub cost: u32,
}

/// Configuration record describing a unit type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitTypeRecord {
    /// Unique name used by clients to request the type.
    pub name: String,
    /// Milliseconds of simulated time needed to advance one cell.
    #[serde(alias = "msPerMove")]
    pub ms_per_move: u64,
    /// Maximum health.
    pub health: u32,
    /// Damage dealt back to an attacking tower per second of simulated time.
    #[serde(alias = "damagePerSecond")]
    pub damage_per_second: f64,
    /// Money debited when the unit is queued.
    pub cost: u32,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Hands the match over from the lobby, opening the first construction phase.
    OpenConstruction,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests placement of a tower anchored at the provided origin cell.
    PlaceTower {
        /// Side issuing the request.
        side: Side,
        /// Name of the tower type to construct.
        kind: String,
        /// Upper-left cell that defines the tower's footprint.
        origin: Point,
    },
    /// Requests demolition of one of the side's towers.
    RemoveTower {
        /// Side issuing the request.
        side: Side,
        /// Identifier of the tower targeted for removal.
        tower: TowerId,
    },
    /// Changes the target-selection policy of one of the side's towers.
    SetTargetStyle {
        /// Side issuing the request.
        side: Side,
        /// Tower whose policy changes.
        tower: TowerId,
        /// Newly selected policy.
        style: TargetStyle,
    },
    /// Buys a unit that will spawn when the next round starts.
    QueueUnit {
        /// Side issuing the request.
        side: Side,
        /// Name of the unit type to queue.
        kind: String,
    },
    /// Declares the side ready to start the round.
    Ready {
        /// Side issuing the request.
        side: Side,
    },
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The round is not in the construction phase.
    InvalidRoundState,
    /// The side already declared itself ready.
    AlreadyReady,
    /// No tower type with the requested name exists.
    UnknownTowerType,
    /// The origin or footprint leaves the board.
    OutOfBounds,
    /// The footprint overlaps a spawner or another tower.
    Occupied,
    /// The footprint leaves the side's playable region.
    OutsideRegion,
    /// The footprint would cut the route between the spawners.
    BlocksPath,
    /// The side cannot afford the tower.
    InsufficientFunds,
}

/// Reasons a request addressing an existing tower may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TowerAccessError {
    /// No live tower with the provided identifier exists.
    MissingTower,
    /// The tower belongs to the other side.
    NotOwner,
}

/// Reasons a unit queue request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueError {
    /// The round is not in the construction phase.
    InvalidRoundState,
    /// The side already declared itself ready.
    AlreadyReady,
    /// No unit type with the requested name exists.
    UnknownUnitType,
    /// The side cannot afford the unit.
    InsufficientFunds,
}

/// Reasons a ready declaration may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadyError {
    /// The round is not in the construction phase.
    InvalidRoundState,
    /// The side already declared itself ready.
    AlreadyReady,
}

/// How a unit left the battlefield.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitFate {
    /// Health dropped to zero under tower fire.
    Killed,
    /// The unit walked its whole path and reached the opposing spawner.
    ReachedBase,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the round lifecycle entered a new state.
    RoundStateChanged {
        /// State that became active.
        state: RoundState,
    },
    /// Confirms that a tower was placed.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Owner of the tower.
        side: Side,
        /// Tower type name.
        kind: String,
        /// Origin after clamping to the board.
        origin: Point,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Side that issued the request.
        side: Side,
        /// Requested tower type name.
        kind: String,
        /// Origin cell provided in the request.
        origin: Point,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower was demolished by its owner.
    TowerRemoved {
        /// Identifier of the removed tower.
        tower: TowerId,
        /// Owner credited with the refund.
        side: Side,
        /// Money returned to the owner.
        refund: u32,
    },
    /// Reports that a tower removal request was rejected.
    TowerRemovalRejected {
        /// Side that issued the request.
        side: Side,
        /// Identifier provided in the request.
        tower: TowerId,
        /// Specific reason the removal failed.
        reason: TowerAccessError,
    },
    /// Announces that a tower ran out of health and was removed.
    TowerDestroyed {
        /// Identifier of the destroyed tower.
        tower: TowerId,
        /// Former owner of the tower.
        side: Side,
    },
    /// Confirms a new target-selection policy for a tower.
    TargetStyleChanged {
        /// Tower whose policy changed.
        tower: TowerId,
        /// Newly active policy.
        style: TargetStyle,
    },
    /// Reports that a target-style request was rejected.
    TargetStyleRejected {
        /// Side that issued the request.
        side: Side,
        /// Identifier provided in the request.
        tower: TowerId,
        /// Specific reason the request failed.
        reason: TowerAccessError,
    },
    /// Confirms that a unit was bought and queued for the next round.
    UnitQueued {
        /// Side that bought the unit.
        side: Side,
        /// Unit type name.
        kind: String,
    },
    /// Reports that a unit queue request was rejected.
    UnitQueueRejected {
        /// Side that issued the request.
        side: Side,
        /// Requested unit type name.
        kind: String,
        /// Specific reason the request failed.
        reason: QueueError,
    },
    /// Confirms a change of a side's ready flag.
    ReadyChanged {
        /// Side whose flag changed.
        side: Side,
        /// New value of the flag.
        ready: bool,
    },
    /// Reports that a ready declaration was rejected.
    ReadyRejected {
        /// Side that issued the request.
        side: Side,
        /// Specific reason the request failed.
        reason: ReadyError,
    },
    /// Reports a side's new balance after a debit or credit.
    MoneyChanged {
        /// Side whose balance changed.
        side: Side,
        /// Balance after the change.
        money: u32,
    },
    /// Confirms that a unit entered the board.
    UnitSpawned {
        /// Identifier assigned to the unit.
        unit: UnitId,
        /// Owner of the unit.
        side: Side,
        /// Unit type name.
        kind: String,
        /// Spawner cell the unit starts on.
        cell: Point,
    },
    /// Confirms that a unit advanced one cell along its path.
    UnitAdvanced {
        /// Identifier of the unit.
        unit: UnitId,
        /// Cell occupied before the move.
        from: Point,
        /// Cell occupied after the move.
        to: Point,
    },
    /// Reports that a tower hit a unit during the tick.
    TowerAttacked {
        /// Attacking tower.
        tower: TowerId,
        /// Unit that was hit.
        unit: UnitId,
    },
    /// Announces that a unit left the battlefield.
    UnitDestroyed {
        /// Identifier of the unit.
        unit: UnitId,
        /// Owner of the unit.
        side: Side,
        /// Why the unit left.
        fate: UnitFate,
    },
}

/// Immutable representation of a tower used by targeting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Owner of the tower.
    pub side: Side,
    /// Active target-selection policy.
    pub style: TargetStyle,
    /// Centre of the tower footprint.
    pub center: HalfCellPoint,
}

/// Immutable representation of a unit used by targeting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Identifier allocated to the unit by the world.
    pub id: UnitId,
    /// Owner of the unit.
    pub side: Side,
    /// Cell currently occupied by the unit.
    pub cell: Point,
    /// Index of the current cell within the unit's path.
    pub path_index: usize,
    /// Remaining health.
    pub health: f64,
}

/// Read-only snapshot describing the live units on the board.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
