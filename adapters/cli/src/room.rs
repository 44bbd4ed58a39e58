//! Hosts one match on a fixed-interval timer.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use duel_defence_core::{Command, Event};
use duel_defence_world::{self as world, query, snapshot::MatchState, World};
use tokio::{
    sync::{broadcast, mpsc, watch, Notify},
    task::JoinHandle,
    time::MissedTickBehavior,
};

/// Timing and channel sizing of a room.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RoomSettings {
    /// Simulated time advanced by every tick.
    pub(crate) tick: Duration,
    /// Wall-clock time between ticks.
    pub(crate) interval: Duration,
    /// Capacity of the intent queue.
    pub(crate) intent_capacity: usize,
    /// Capacity of the event broadcast.
    pub(crate) event_capacity: usize,
}

/// A running match. Dropping the room aborts its timer.
pub(crate) struct Room {
    intents: mpsc::Sender<Command>,
    state: watch::Receiver<MatchState>,
    events: broadcast::Sender<Event>,
    shutdown: Arc<Notify>,
    task: Option<JoinHandle<World>>,
}

impl Room {
    /// Starts ticking `world` on the current runtime.
    pub(crate) fn spawn(world: World, settings: RoomSettings) -> Self {
        let (intents, intent_rx) = mpsc::channel(settings.intent_capacity);
        let (state_tx, state) = watch::channel(query::match_state(&world));
        let (events, _) = broadcast::channel(settings.event_capacity);
        let shutdown = Arc::new(Notify::new());

        let task = tokio::spawn(run(
            world,
            settings,
            intent_rx,
            state_tx,
            events.clone(),
            Arc::clone(&shutdown),
        ));

        Self {
            intents,
            state,
            events,
            shutdown,
            task: Some(task),
        }
    }

    /// Sender for client intents; they are applied before the next tick.
    pub(crate) fn intents(&self) -> mpsc::Sender<Command> {
        self.intents.clone()
    }

    /// Receiver of the snapshot published after every tick.
    pub(crate) fn subscribe(&self) -> watch::Receiver<MatchState> {
        self.state.clone()
    }

    /// Receiver of every event the match produces from now on.
    pub(crate) fn events(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Stops the timer and hands back the final world.
    pub(crate) async fn dispose(mut self) -> Result<World> {
        self.shutdown.notify_one();
        let task = self.task.take().context("room already disposed")?;
        task.await.context("room task failed")
    }
}

impl Drop for Room {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(
    mut world: World,
    settings: RoomSettings,
    mut intents: mpsc::Receiver<Command>,
    state: watch::Sender<MatchState>,
    events: broadcast::Sender<Event>,
    shutdown: Arc<Notify>,
) -> World {
    let mut interval = tokio::time::interval(settings.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut out_events = Vec::new();
    let mut ticks: u64 = 0;

    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            _ = interval.tick() => {}
        }

        while let Ok(command) = intents.try_recv() {
            world::apply(&mut world, command, &mut out_events);
        }
        world::apply(&mut world, Command::Tick { dt: settings.tick }, &mut out_events);
        ticks += 1;

        for event in out_events.drain(..) {
            // No subscribers is fine.
            let _ = events.send(event);
        }
        let _ = state.send_replace(query::match_state(&world));
    }

    tracing::info!(ticks, "room closed");
    world
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_defence_core::{RoundState, Side, TowerTypeRecord, UnitTypeRecord};
    use duel_defence_world::{Catalog, MatchConfig};

    fn world() -> World {
        let catalog = Catalog::from_records(
            &[TowerTypeRecord {
                name: "normal".to_owned(),
                extent: [2, 2],
                health: 100,
                damage_per_second: 10.0,
                range: 3,
                cost: 50,
            }],
            &[UnitTypeRecord {
                name: "normal".to_owned(),
                ms_per_move: 50,
                health: 100,
                damage_per_second: 5.0,
                cost: 10,
            }],
        )
        .expect("catalog");
        World::new(&MatchConfig::default(), catalog).expect("world")
    }

    fn settings() -> RoomSettings {
        RoomSettings {
            tick: Duration::from_millis(50),
            interval: Duration::from_millis(50),
            intent_capacity: 64,
            event_capacity: 1024,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn intents_are_applied_on_the_next_tick() {
        let room = Room::spawn(world(), settings());
        let mut state = room.subscribe();
        let intents = room.intents();

        intents.send(Command::OpenConstruction).await.expect("send");
        let _ = state
            .wait_for(|state| state.round == RoundState::Constructing)
            .await
            .expect("room alive");

        let world = room.dispose().await.expect("dispose");
        assert_eq!(query::round_state(&world), RoundState::Constructing);
    }

    #[tokio::test(start_paused = true)]
    async fn a_full_round_is_played_and_reported() {
        let room = Room::spawn(world(), settings());
        let mut state = room.subscribe();
        let mut events = room.events();
        let intents = room.intents();

        for command in [
            Command::OpenConstruction,
            Command::QueueUnit {
                side: Side::Top,
                kind: "normal".to_owned(),
            },
            Command::Ready { side: Side::Top },
            Command::Ready { side: Side::Bottom },
        ] {
            intents.send(command).await.expect("send");
        }

        let _ = state
            .wait_for(|state| state.rounds_completed == 1)
            .await
            .expect("room alive");
        let world = room.dispose().await.expect("dispose");

        let mut reached = 0;
        while let Ok(event) = events.try_recv() {
            if let Event::UnitDestroyed { side: Side::Top, .. } = event {
                reached += 1;
            }
        }
        assert_eq!(reached, 1);
        assert_eq!(query::rounds_completed(&world), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_room_stops_publishing() {
        let room = Room::spawn(world(), settings());
        let mut state = room.subscribe();

        drop(room);

        // The sender is dropped together with the aborted task.
        assert!(state.changed().await.is_err());
    }
}
