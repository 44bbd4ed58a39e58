//! Match setup parameters.

use std::time::Duration;

use duel_defence_core::{Extent, Point, Rect, Side};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures detected while validating a [`MatchConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Width or height is not positive.
    #[error("board extent {width}x{height} is empty")]
    EmptyBoard {
        /// Configured width.
        width: i32,
        /// Configured height.
        height: i32,
    },
    /// A spawner lies outside the board.
    #[error("{side:?} spawner {position:?} lies outside the board")]
    SpawnerOutOfBounds {
        /// Owner of the spawner.
        side: Side,
        /// Configured position.
        position: Point,
    },
    /// Both spawners occupy the same cell.
    #[error("both spawners share cell {0:?}")]
    SpawnersOverlap(Point),
}

/// Board layout, economy and pacing of a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Board width in cells.
    pub width: i32,
    /// Board height in cells.
    pub height: i32,
    /// Entry point of the top side's units.
    pub top_spawner: Point,
    /// Entry point of the bottom side's units.
    pub bottom_spawner: Point,
    /// Cells where the top side may build.
    pub top_region: Rect,
    /// Cells where the bottom side may build.
    pub bottom_region: Rect,
    /// Money each side starts with.
    pub starting_money: u32,
    /// Simulated delay between consecutive spawns of one side.
    pub spawn_stagger_ms: u64,
    /// Simulated delay between the end of a round and the next construction phase.
    pub round_cooldown_ms: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            width: 25,
            height: 33,
            top_spawner: Point::new(12, 0),
            bottom_spawner: Point::new(12, 32),
            top_region: Rect::new(0, 0, 25, 16),
            bottom_region: Rect::new(0, 17, 25, 16),
            starting_money: 200,
            spawn_stagger_ms: 500,
            round_cooldown_ms: 1000,
        }
    }
}

impl MatchConfig {
    /// Board dimensions.
    #[must_use]
    pub const fn extent(&self) -> Extent {
        Extent::new(self.width, self.height)
    }

    /// Spawner owned by `side`.
    #[must_use]
    pub const fn spawner(&self, side: Side) -> Point {
        match side {
            Side::Top => self.top_spawner,
            Side::Bottom => self.bottom_spawner,
        }
    }

    /// Building region of `side`.
    #[must_use]
    pub const fn region(&self, side: Side) -> Rect {
        match side {
            Side::Top => self.top_region,
            Side::Bottom => self.bottom_region,
        }
    }

    /// Delay between staggered spawns.
    #[must_use]
    pub const fn spawn_stagger(&self) -> Duration {
        Duration::from_millis(self.spawn_stagger_ms)
    }

    /// Delay from Waiting to Constructing.
    #[must_use]
    pub const fn round_cooldown(&self) -> Duration {
        Duration::from_millis(self.round_cooldown_ms)
    }

    /// Checks that the board and spawners describe a playable layout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(ConfigError::EmptyBoard {
                width: self.width,
                height: self.height,
            });
        }

        let extent = self.extent();
        for side in Side::ALL {
            let position = self.spawner(side);
            if !extent.contains(position) {
                return Err(ConfigError::SpawnerOutOfBounds { side, position });
            }
        }

        if self.top_spawner == self.bottom_spawner {
            return Err(ConfigError::SpawnersOverlap(self.top_spawner));
        }
        Ok(())
    }
}
