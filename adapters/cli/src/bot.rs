//! Seeded bot clients that play one side of a match.

use duel_defence_core::{Command, Point, Rect, RoundState, Side};
use duel_defence_world::{snapshot::MatchState, Catalog};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::sync::{mpsc, watch};

const MAX_QUEUED_UNITS: usize = 20;

/// Bot tuning.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BotSettings {
    /// Placement attempts per construction phase.
    pub(crate) placements: usize,
    /// Percentage of the available money reserved for towers.
    pub(crate) tower_share: u32,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            placements: 4,
            tower_share: 50,
        }
    }
}

/// Random but reproducible player for one side.
#[derive(Debug)]
pub(crate) struct Bot {
    side: Side,
    region: Rect,
    towers: Vec<(String, u32)>,
    units: Vec<(String, u32)>,
    settings: BotSettings,
    rng: ChaCha8Rng,
    planned_phase: Option<u32>,
}

impl Bot {
    /// Creates a bot that builds inside `region` using the catalog's types.
    pub(crate) fn new(
        side: Side,
        region: Rect,
        catalog: &Catalog,
        settings: BotSettings,
        seed: u64,
    ) -> Self {
        Self {
            side,
            region,
            towers: catalog
                .towers()
                .map(|tower| (tower.name().to_owned(), tower.cost()))
                .collect(),
            units: catalog
                .units()
                .map(|unit| (unit.name().to_owned(), unit.cost()))
                .collect(),
            settings,
            rng: ChaCha8Rng::seed_from_u64(seed),
            planned_phase: None,
        }
    }

    /// Intents for the current construction phase, or nothing if the bot
    /// already acted in it or the match is not constructing.
    pub(crate) fn plan(&mut self, state: &MatchState) -> Vec<Command> {
        let Some(client) = state.clients.iter().find(|client| client.side == self.side) else {
            return Vec::new();
        };
        if state.round != RoundState::Constructing
            || client.ready
            || self.planned_phase == Some(state.rounds_completed)
        {
            return Vec::new();
        }
        self.planned_phase = Some(state.rounds_completed);

        let mut money = client.money;
        let mut tower_budget = money.saturating_mul(self.settings.tower_share) / 100;
        let mut commands = Vec::new();

        for _ in 0..self.settings.placements {
            let Some((kind, cost)) = self.pick(Choice::Tower, tower_budget) else {
                break;
            };
            let origin = self.random_origin();
            commands.push(Command::PlaceTower {
                side: self.side,
                kind,
                origin,
            });
            tower_budget -= cost;
            money -= cost;
        }

        while commands.len() < self.settings.placements + MAX_QUEUED_UNITS {
            let Some((kind, cost)) = self.pick(Choice::Unit, money) else {
                break;
            };
            commands.push(Command::QueueUnit {
                side: self.side,
                kind,
            });
            money -= cost;
        }

        commands.push(Command::Ready { side: self.side });
        commands
    }

    fn pick(&mut self, choice: Choice, budget: u32) -> Option<(String, u32)> {
        let table = match choice {
            Choice::Tower => &self.towers,
            Choice::Unit => &self.units,
        };
        let affordable: Vec<&(String, u32)> =
            table.iter().filter(|(_, cost)| *cost <= budget).collect();
        affordable
            .choose(&mut self.rng)
            .map(|(name, cost)| (name.clone(), *cost))
    }

    fn random_origin(&mut self) -> Point {
        let origin = self.region.origin();
        let extent = self.region.extent();
        Point::new(
            origin.x() + self.rng.gen_range(0..extent.width().max(1)),
            origin.y() + self.rng.gen_range(0..extent.height().max(1)),
        )
    }
}

#[derive(Clone, Copy)]
enum Choice {
    Tower,
    Unit,
}

/// Drives `bot` from published snapshots until the room closes.
pub(crate) async fn run(
    mut bot: Bot,
    intents: mpsc::Sender<Command>,
    mut state: watch::Receiver<MatchState>,
) {
    while state.changed().await.is_ok() {
        let commands = bot.plan(&state.borrow_and_update());
        if commands.is_empty() {
            continue;
        }
        tracing::debug!(side = ?bot.side, count = commands.len(), "bot submitting intents");
        for command in commands {
            if intents.send(command).await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_defence_core::{TowerTypeRecord, UnitTypeRecord};
    use duel_defence_world::{self as world, query, MatchConfig, World};

    fn catalog() -> Catalog {
        Catalog::from_records(
            &[
                TowerTypeRecord {
                    name: "normal".to_owned(),
                    extent: [2, 2],
                    health: 100,
                    damage_per_second: 10.0,
                    range: 3,
                    cost: 50,
                },
                TowerTypeRecord {
                    name: "needle".to_owned(),
                    extent: [1, 1],
                    health: 40,
                    damage_per_second: 6.0,
                    range: 6,
                    cost: 30,
                },
            ],
            &[UnitTypeRecord {
                name: "normal".to_owned(),
                ms_per_move: 100,
                health: 100,
                damage_per_second: 5.0,
                cost: 10,
            }],
        )
        .expect("catalog")
    }

    fn constructing() -> World {
        let mut world = World::new(&MatchConfig::default(), catalog()).expect("world");
        let mut events = Vec::new();
        world::apply(&mut world, Command::OpenConstruction, &mut events);
        world
    }

    fn bot(side: Side, seed: u64) -> Bot {
        let config = MatchConfig::default();
        Bot::new(side, config.region(side), &catalog(), BotSettings::default(), seed)
    }

    #[test]
    fn waiting_match_yields_no_intents() {
        let world = World::new(&MatchConfig::default(), catalog()).expect("world");

        assert!(bot(Side::Top, 1).plan(&query::match_state(&world)).is_empty());
    }

    #[test]
    fn plan_stays_within_budget_and_region() {
        let world = constructing();
        let mut bot = bot(Side::Bottom, 9);

        let commands = bot.plan(&query::match_state(&world));

        assert_eq!(commands.last(), Some(&Command::Ready { side: Side::Bottom }));
        let mut spent = 0;
        for command in &commands {
            match command {
                Command::PlaceTower { side, kind, origin } => {
                    assert_eq!(*side, Side::Bottom);
                    assert!(MatchConfig::default().region(Side::Bottom).contains(*origin));
                    spent += if kind == "normal" { 50 } else { 30 };
                }
                Command::QueueUnit { .. } => spent += 10,
                _ => {}
            }
        }
        assert!(spent <= 200);
        assert!(spent > 150, "bot left {} unspent", 200 - spent);
    }

    #[test]
    fn bot_acts_once_per_construction_phase() {
        let world = constructing();
        let state = query::match_state(&world);
        let mut bot = bot(Side::Top, 3);

        assert!(!bot.plan(&state).is_empty());
        assert!(bot.plan(&state).is_empty());
    }

    #[test]
    fn same_seed_same_plan() {
        let state = query::match_state(&constructing());

        assert_eq!(bot(Side::Top, 42).plan(&state), bot(Side::Top, 42).plan(&state));
    }

    #[test]
    fn applied_plan_readies_the_side() {
        let mut world = constructing();
        let mut bot = bot(Side::Top, 5);
        let mut events = Vec::new();

        for command in bot.plan(&query::match_state(&world)) {
            world::apply(&mut world, command, &mut events);
        }

        assert!(query::is_ready(&world, Side::Top));
        assert!(!query::unit_queue(&world, Side::Top).is_empty());
    }
}
