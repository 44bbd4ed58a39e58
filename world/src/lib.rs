#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Duel Defence.
//!
//! The [`World`] owns the shared [`GameState`] and one [`ClientState`] per
//! side. Every mutation enters through [`apply`]; invalid intents never touch
//! the state and are answered with a rejection event instead.

pub mod board;
pub mod catalog;
pub mod client;
pub mod config;
pub mod game;
mod navigation;
pub mod snapshot;
pub mod towers;
pub mod units;

use duel_defence_core::{
    Command, Event, PlacementError, Point, QueueError, ReadyError, RoundState, Side, TargetStyle,
    TowerAccessError, TowerId,
};

pub use crate::{
    catalog::{Catalog, CatalogError},
    client::ClientState,
    config::{ConfigError, MatchConfig},
    game::GameState,
};
use crate::{catalog::TowerType, towers::Tower};

/// Authoritative state of one match.
#[derive(Debug)]
pub struct World {
    game: GameState,
    top: ClientState,
    bottom: ClientState,
}

impl World {
    /// Creates a match in the Waiting state with both sides' starting money.
    pub fn new(config: &MatchConfig, catalog: Catalog) -> Result<Self, ConfigError> {
        let game = GameState::new(config, catalog)?;
        Ok(Self {
            game,
            top: ClientState::new(Side::Top, config.region(Side::Top), config.starting_money),
            bottom: ClientState::new(
                Side::Bottom,
                config.region(Side::Bottom),
                config.starting_money,
            ),
        })
    }

    /// Shared simulation state.
    #[must_use]
    pub const fn game(&self) -> &GameState {
        &self.game
    }

    /// Economy and placement gate of `side`.
    #[must_use]
    pub const fn client(&self, side: Side) -> &ClientState {
        match side {
            Side::Top => &self.top,
            Side::Bottom => &self.bottom,
        }
    }

    fn split(&mut self, side: Side) -> (&mut GameState, &mut ClientState) {
        let client = match side {
            Side::Top => &mut self.top,
            Side::Bottom => &mut self.bottom,
        };
        (&mut self.game, client)
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::OpenConstruction => {
            if !world.game.open_construction(out_events) {
                tracing::debug!(state = ?world.game.round_state(), "construction already opened");
            }
        }
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
            world.game.update_round(dt, out_events);
        }
        Command::PlaceTower { side, kind, origin } => {
            if let Err(reason) = place_tower(world, side, &kind, origin, out_events) {
                tracing::debug!(?side, %kind, ?origin, ?reason, "tower placement rejected");
                out_events.push(Event::TowerPlacementRejected {
                    side,
                    kind,
                    origin,
                    reason,
                });
            }
        }
        Command::RemoveTower { side, tower } => {
            if let Err(reason) = remove_tower(world, side, tower, out_events) {
                tracing::debug!(?side, tower = tower.get(), ?reason, "tower removal rejected");
                out_events.push(Event::TowerRemovalRejected {
                    side,
                    tower,
                    reason,
                });
            }
        }
        Command::SetTargetStyle { side, tower, style } => {
            if let Err(reason) = set_target_style(world, side, tower, style, out_events) {
                tracing::debug!(?side, tower = tower.get(), ?reason, "target style rejected");
                out_events.push(Event::TargetStyleRejected {
                    side,
                    tower,
                    reason,
                });
            }
        }
        Command::QueueUnit { side, kind } => {
            if let Err(reason) = queue_unit(world, side, &kind, out_events) {
                tracing::debug!(?side, %kind, ?reason, "unit queue rejected");
                out_events.push(Event::UnitQueueRejected { side, kind, reason });
            }
        }
        Command::Ready { side } => {
            if let Err(reason) = ready(world, side, out_events) {
                tracing::debug!(?side, ?reason, "ready rejected");
                out_events.push(Event::ReadyRejected { side, reason });
            }
        }
    }
}

fn place_tower(
    world: &mut World,
    side: Side,
    kind: &str,
    origin: Point,
    out_events: &mut Vec<Event>,
) -> Result<(), PlacementError> {
    let (game, client) = world.split(side);
    if game.round_state() != RoundState::Constructing {
        return Err(PlacementError::InvalidRoundState);
    }
    if client.is_ready() {
        return Err(PlacementError::AlreadyReady);
    }

    client.validate_tower_with_path(game, origin, kind)?;
    let cost = game
        .catalog()
        .tower(kind)
        .map(TowerType::cost)
        .ok_or(PlacementError::UnknownTowerType)?;
    if !client.can_spend(cost) {
        return Err(PlacementError::InsufficientFunds);
    }

    let tower = game
        .add_tower(origin, kind, side)
        .ok_or(PlacementError::UnknownTowerType)?;
    client.debit(cost);

    let placed_at = game.tower(tower).map_or(origin, Tower::origin);
    out_events.push(Event::TowerPlaced {
        tower,
        side,
        kind: kind.to_owned(),
        origin: placed_at,
    });
    out_events.push(Event::MoneyChanged {
        side,
        money: client.money(),
    });
    Ok(())
}

fn owned_tower(game: &GameState, side: Side, tower: TowerId) -> Result<&Tower, TowerAccessError> {
    let found = game.tower(tower).ok_or(TowerAccessError::MissingTower)?;
    if found.side() != side {
        return Err(TowerAccessError::NotOwner);
    }
    Ok(found)
}

fn remove_tower(
    world: &mut World,
    side: Side,
    tower: TowerId,
    out_events: &mut Vec<Event>,
) -> Result<(), TowerAccessError> {
    let (game, client) = world.split(side);
    let refund = {
        let found = owned_tower(game, side, tower)?;
        game.catalog().tower(found.kind()).map_or(0, TowerType::cost)
    };

    if !game.remove_tower(tower) {
        return Err(TowerAccessError::MissingTower);
    }
    client.credit(refund);

    out_events.push(Event::TowerRemoved {
        tower,
        side,
        refund,
    });
    out_events.push(Event::MoneyChanged {
        side,
        money: client.money(),
    });
    Ok(())
}

fn set_target_style(
    world: &mut World,
    side: Side,
    tower: TowerId,
    style: TargetStyle,
    out_events: &mut Vec<Event>,
) -> Result<(), TowerAccessError> {
    let _ = owned_tower(&world.game, side, tower)?;
    if !world.game.set_target_style(tower, style) {
        return Err(TowerAccessError::MissingTower);
    }
    out_events.push(Event::TargetStyleChanged { tower, style });
    Ok(())
}

fn queue_unit(
    world: &mut World,
    side: Side,
    kind: &str,
    out_events: &mut Vec<Event>,
) -> Result<(), QueueError> {
    let (game, client) = world.split(side);
    if game.round_state() != RoundState::Constructing {
        return Err(QueueError::InvalidRoundState);
    }
    if client.is_ready() {
        return Err(QueueError::AlreadyReady);
    }

    let unit_type = game.catalog().unit(kind).ok_or(QueueError::UnknownUnitType)?;
    if !client.can_spend(unit_type.cost()) {
        return Err(QueueError::InsufficientFunds);
    }

    client.debit(unit_type.cost());
    client.queue_unit(kind.to_owned());
    out_events.push(Event::UnitQueued {
        side,
        kind: kind.to_owned(),
    });
    out_events.push(Event::MoneyChanged {
        side,
        money: client.money(),
    });
    Ok(())
}

fn ready(world: &mut World, side: Side, out_events: &mut Vec<Event>) -> Result<(), ReadyError> {
    let (game, client) = world.split(side);
    if game.round_state() != RoundState::Constructing {
        return Err(ReadyError::InvalidRoundState);
    }
    if client.is_ready() {
        return Err(ReadyError::AlreadyReady);
    }

    client.set_ready(true);
    out_events.push(Event::ReadyChanged { side, ready: true });
    check_start(world, out_events);
    Ok(())
}

/// Starts the round once both sides are ready during construction.
fn check_start(world: &mut World, out_events: &mut Vec<Event>) {
    if world.game.round_state() != RoundState::Constructing
        || !world.top.is_ready()
        || !world.bottom.is_ready()
    {
        return;
    }

    let mut queues = Vec::with_capacity(Side::ALL.len());
    for side in Side::ALL {
        let (_, client) = world.split(side);
        client.set_ready(false);
        queues.push((side, client.take_queue()));
        out_events.push(Event::ReadyChanged { side, ready: false });
    }
    world.game.start_round(queues, out_events);
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use duel_defence_core::{Point, RoundState, Side, TowerId, UnitId};

    use super::World;
    use crate::{
        board::Board,
        snapshot::{BoardState, ClientSummary, MatchState, TowerState, UnitState},
        towers::Tower,
        units::Unit,
    };

    /// Current phase of the round lifecycle.
    #[must_use]
    pub fn round_state(world: &World) -> RoundState {
        world.game.round_state()
    }

    /// Rounds that ended with every unit cleared.
    #[must_use]
    pub fn rounds_completed(world: &World) -> u32 {
        world.game.rounds_completed()
    }

    /// Remaining money of `side`.
    #[must_use]
    pub fn money(world: &World, side: Side) -> u32 {
        world.client(side).money()
    }

    /// Whether `side` declared itself ready.
    #[must_use]
    pub fn is_ready(world: &World, side: Side) -> bool {
        world.client(side).is_ready()
    }

    /// Units `side` bought for the next round.
    #[must_use]
    pub fn unit_queue(world: &World, side: Side) -> &[String] {
        world.client(side).unit_queue()
    }

    /// Grid occupancy.
    #[must_use]
    pub fn board(world: &World) -> &Board {
        world.game.board()
    }

    /// Live tower by identifier.
    #[must_use]
    pub fn tower(world: &World, id: TowerId) -> Option<&Tower> {
        world.game.tower(id)
    }

    /// Live tower covering a board cell.
    #[must_use]
    pub fn tower_at(world: &World, cell: Point) -> Option<&Tower> {
        world.game.tower_at(cell)
    }

    /// Live unit by identifier.
    #[must_use]
    pub fn unit(world: &World, id: UnitId) -> Option<&Unit> {
        world.game.unit(id)
    }

    /// Live towers in identifier order.
    pub fn towers(world: &World) -> impl Iterator<Item = &Tower> {
        world.game.towers().live()
    }

    /// Live units in identifier order.
    pub fn units(world: &World) -> impl Iterator<Item = &Unit> {
        world.game.units().live()
    }

    /// Captures the broadcast state of the whole match.
    #[must_use]
    pub fn match_state(world: &World) -> MatchState {
        let board = world.game.board();
        MatchState {
            board: BoardState {
                extent: board.extent(),
                cells: board.cells().to_vec(),
                spawners: board.spawners(),
            },
            towers: world.game.towers().all().iter().map(TowerState::from).collect(),
            units: world.game.units().all().iter().map(UnitState::from).collect(),
            round: world.game.round_state(),
            rounds_completed: world.game.rounds_completed(),
            clients: Side::ALL
                .into_iter()
                .map(|side| ClientSummary::from(world.client(side)))
                .collect(),
        }
    }
}
