//! Immutable tower and unit type tables.

use std::{collections::BTreeMap, time::Duration};

use duel_defence_core::{Extent, Point, TowerTypeRecord, UnitTypeRecord};
use thiserror::Error;

/// Largest attack radius a tower type may declare.
pub const MAX_TOWER_RANGE: u32 = 64;

/// Failures detected while turning raw records into a [`Catalog`].
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    /// Two tower records share a name.
    #[error("duplicate tower type `{0}`")]
    DuplicateTower(String),
    /// Two unit records share a name.
    #[error("duplicate unit type `{0}`")]
    DuplicateUnit(String),
    /// A tower footprint has a non-positive side.
    #[error("tower type `{name}` has an empty footprint {width}x{height}")]
    EmptyFootprint {
        /// Offending tower type.
        name: String,
        /// Requested width.
        width: i32,
        /// Requested height.
        height: i32,
    },
    /// The attack radius exceeds [`MAX_TOWER_RANGE`].
    #[error("tower type `{name}` has range {range}, above the maximum of {MAX_TOWER_RANGE}")]
    RangeTooLarge {
        /// Offending tower type.
        name: String,
        /// Requested range.
        range: u32,
    },
    /// A unit would never advance.
    #[error("unit type `{0}` has a zero ms_per_move")]
    ZeroStep(String),
    /// Damage must be a finite, non-negative rate.
    #[error("type `{0}` has an invalid damage_per_second")]
    InvalidDamage(String),
    /// The tower table is empty.
    #[error("catalog defines no tower types")]
    NoTowerTypes,
    /// The unit table is empty.
    #[error("catalog defines no unit types")]
    NoUnitTypes,
}

/// Tower statistics together with the precomputed attack area.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerType {
    name: String,
    extent: Extent,
    health: u32,
    damage_per_second: f64,
    range: u32,
    cost: u32,
    reachable: Vec<Point>,
}

impl TowerType {
    fn from_record(record: &TowerTypeRecord) -> Result<Self, CatalogError> {
        let [width, height] = record.extent;
        if width <= 0 || height <= 0 {
            return Err(CatalogError::EmptyFootprint {
                name: record.name.clone(),
                width,
                height,
            });
        }
        if !valid_rate(record.damage_per_second) {
            return Err(CatalogError::InvalidDamage(record.name.clone()));
        }
        if record.range > MAX_TOWER_RANGE {
            return Err(CatalogError::RangeTooLarge {
                name: record.name.clone(),
                range: record.range,
            });
        }

        let extent = Extent::new(width, height);
        Ok(Self {
            name: record.name.clone(),
            extent,
            health: record.health,
            damage_per_second: record.damage_per_second,
            range: record.range,
            cost: record.cost,
            reachable: reachable_offsets(extent, record.range),
        })
    }

    /// Name clients use to request the type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Footprint in cells.
    #[must_use]
    pub const fn extent(&self) -> Extent {
        self.extent
    }

    /// Maximum health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Damage dealt per second of simulated time.
    #[must_use]
    pub const fn damage_per_second(&self) -> f64 {
        self.damage_per_second
    }

    /// Attack radius in cells.
    #[must_use]
    pub const fn range(&self) -> u32 {
        self.range
    }

    /// Placement cost and demolition refund.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Offsets relative to a tower origin whose cell centres lie within range
    /// of the footprint centre, sorted by column then row.
    #[must_use]
    pub fn reachable(&self) -> &[Point] {
        &self.reachable
    }

    /// Evaluates the range circle for a single offset.
    #[must_use]
    pub fn reaches(&self, offset: Point) -> bool {
        in_circle(self.extent, self.range, offset)
    }
}

/// Unit statistics.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitType {
    name: String,
    step: Duration,
    health: u32,
    damage_per_second: f64,
    cost: u32,
}

impl UnitType {
    fn from_record(record: &UnitTypeRecord) -> Result<Self, CatalogError> {
        if record.ms_per_move == 0 {
            return Err(CatalogError::ZeroStep(record.name.clone()));
        }
        if !valid_rate(record.damage_per_second) {
            return Err(CatalogError::InvalidDamage(record.name.clone()));
        }

        Ok(Self {
            name: record.name.clone(),
            step: Duration::from_millis(record.ms_per_move),
            health: record.health,
            damage_per_second: record.damage_per_second,
            cost: record.cost,
        })
    }

    /// Name clients use to request the type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Simulated time needed to advance one cell.
    #[must_use]
    pub const fn step(&self) -> Duration {
        self.step
    }

    /// Maximum health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Return damage dealt to an attacking tower per second.
    #[must_use]
    pub const fn damage_per_second(&self) -> f64 {
        self.damage_per_second
    }

    /// Queueing cost.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }
}

/// Tower and unit tables keyed by type name.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    towers: BTreeMap<String, TowerType>,
    units: BTreeMap<String, UnitType>,
}

impl Catalog {
    /// Validates raw records and builds the lookup tables.
    pub fn from_records(
        towers: &[TowerTypeRecord],
        units: &[UnitTypeRecord],
    ) -> Result<Self, CatalogError> {
        if towers.is_empty() {
            return Err(CatalogError::NoTowerTypes);
        }
        if units.is_empty() {
            return Err(CatalogError::NoUnitTypes);
        }

        let mut catalog = Self::default();
        for record in towers {
            let tower = TowerType::from_record(record)?;
            if catalog.towers.insert(record.name.clone(), tower).is_some() {
                return Err(CatalogError::DuplicateTower(record.name.clone()));
            }
        }
        for record in units {
            let unit = UnitType::from_record(record)?;
            if catalog.units.insert(record.name.clone(), unit).is_some() {
                return Err(CatalogError::DuplicateUnit(record.name.clone()));
            }
        }
        Ok(catalog)
    }

    /// Looks up a tower type by name.
    #[must_use]
    pub fn tower(&self, name: &str) -> Option<&TowerType> {
        self.towers.get(name)
    }

    /// Looks up a unit type by name.
    #[must_use]
    pub fn unit(&self, name: &str) -> Option<&UnitType> {
        self.units.get(name)
    }

    /// Tower types in name order.
    pub fn towers(&self) -> impl Iterator<Item = &TowerType> {
        self.towers.values()
    }

    /// Unit types in name order.
    pub fn units(&self) -> impl Iterator<Item = &UnitType> {
        self.units.values()
    }
}

fn valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate >= 0.0
}

/// Circle test in half-cell units: the centre of offset cell `(x, y)` is
/// `(2x + 1, 2y + 1)` and the footprint centre is `(w, h)`.
fn in_circle(extent: Extent, range: u32, offset: Point) -> bool {
    let dx = 2 * i64::from(offset.x()) + 1 - i64::from(extent.width());
    let dy = 2 * i64::from(offset.y()) + 1 - i64::from(extent.height());
    let radius = 2 * i64::from(range);
    dx * dx + dy * dy <= radius * radius
}

fn reachable_offsets(extent: Extent, range: u32) -> Vec<Point> {
    let reach = i32::try_from(range.min(MAX_TOWER_RANGE)).unwrap_or_default();
    let mut offsets = Vec::new();
    for x in -reach - 1..=extent.width() + reach {
        for y in -reach - 1..=extent.height() + reach {
            let offset = Point::new(x, y);
            if in_circle(extent, range, offset) {
                offsets.push(offset);
            }
        }
    }
    offsets
}
