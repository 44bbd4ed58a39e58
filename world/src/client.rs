//! Per-side economy and placement gate.

use duel_defence_core::{PlacementError, Point, Rect, Side};

use crate::game::GameState;

/// Money, building region, unit queue and ready flag of one side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientState {
    side: Side,
    region: Rect,
    money: u32,
    unit_queue: Vec<String>,
    ready: bool,
}

impl ClientState {
    /// Creates the state of a side that has not bought anything yet.
    #[must_use]
    pub fn new(side: Side, region: Rect, money: u32) -> Self {
        Self {
            side,
            region,
            money,
            unit_queue: Vec::new(),
            ready: false,
        }
    }

    /// Side this state belongs to.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Cells where the side may build.
    #[must_use]
    pub const fn region(&self) -> Rect {
        self.region
    }

    /// Remaining money.
    #[must_use]
    pub const fn money(&self) -> u32 {
        self.money
    }

    /// Unit types bought for the next round, in purchase order.
    #[must_use]
    pub fn unit_queue(&self) -> &[String] {
        &self.unit_queue
    }

    /// Whether the side declared itself ready.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    /// Reports whether `amount` is affordable.
    #[must_use]
    pub const fn can_spend(&self, amount: u32) -> bool {
        self.money >= amount
    }

    /// Reports whether every cell lies inside the side's region.
    #[must_use]
    pub fn can_place(&self, cells: &[Point]) -> bool {
        cells.iter().all(|cell| self.region.contains(*cell))
    }

    /// Full placement check short of the budget: type, bounds, occupancy,
    /// region, and a route that survives in both directions with the
    /// footprint treated as blocked. The board is never mutated.
    pub fn validate_tower_with_path(
        &self,
        game: &mut GameState,
        origin: Point,
        kind: &str,
    ) -> Result<(), PlacementError> {
        let cells = game.check_tower_placement(origin, kind)?;
        if !self.can_place(&cells) {
            return Err(PlacementError::OutsideRegion);
        }

        let severed = Side::ALL
            .into_iter()
            .any(|from| game.solution(from, &cells).is_empty());
        if severed {
            return Err(PlacementError::BlocksPath);
        }
        Ok(())
    }

    /// Boolean form of [`ClientState::validate_tower_with_path`].
    pub fn can_place_tower_with_path(&self, game: &mut GameState, origin: Point, kind: &str) -> bool {
        self.validate_tower_with_path(game, origin, kind).is_ok()
    }

    pub(crate) fn debit(&mut self, amount: u32) {
        debug_assert!(self.can_spend(amount), "debit exceeds balance");
        self.money = self.money.saturating_sub(amount);
    }

    pub(crate) fn credit(&mut self, amount: u32) {
        self.money = self.money.saturating_add(amount);
    }

    pub(crate) fn queue_unit(&mut self, kind: String) {
        self.unit_queue.push(kind);
    }

    pub(crate) fn take_queue(&mut self) -> Vec<String> {
        std::mem::take(&mut self.unit_queue)
    }

    pub(crate) fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::Catalog, config::MatchConfig};
    use duel_defence_core::{TowerTypeRecord, UnitTypeRecord};

    fn game() -> GameState {
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
                name: "grunt".to_owned(),
                ms_per_move: 100,
                health: 100,
                damage_per_second: 1.0,
                cost: 10,
            }],
        )
        .expect("valid catalog");
        GameState::new(&MatchConfig::default(), catalog).expect("valid config")
    }

    fn client(side: Side) -> ClientState {
        let config = MatchConfig::default();
        ClientState::new(side, config.region(side), config.starting_money)
    }

    #[test]
    fn placement_outside_region_is_rejected() {
        let mut game = game();
        let top = client(Side::Top);
        let bottom = client(Side::Bottom);

        assert_eq!(
            top.validate_tower_with_path(&mut game, Point::new(12, 16), "normal"),
            Err(PlacementError::OutsideRegion)
        );
        assert_eq!(
            bottom.validate_tower_with_path(&mut game, Point::new(12, 16), "normal"),
            Err(PlacementError::OutsideRegion)
        );
        assert!(top.can_place_tower_with_path(&mut game, Point::new(12, 10), "normal"));
    }

    #[test]
    fn placement_that_seals_the_board_is_rejected() {
        let mut game = game();
        let top = client(Side::Top);
        // A wall across rows 8 and 9 with a single open column at x = 22.
        for x in (0..22).step_by(2).chain([23]) {
            let _ = game.add_tower(Point::new(x, 8), "normal", Side::Top);
        }
        assert!(!game.solution(Side::Top, &[]).is_empty());

        assert_eq!(
            top.validate_tower_with_path(&mut game, Point::new(22, 10), "normal"),
            Err(PlacementError::BlocksPath)
        );
        assert!(game.can_place_tower(Point::new(22, 10), "normal"));
        assert!(!game.solution(Side::Bottom, &[]).is_empty());
    }

    #[test]
    fn budget_tracks_debits_and_credits() {
        let mut top = client(Side::Top);
        assert!(top.can_spend(200));
        top.debit(150);
        assert!(!top.can_spend(60));
        top.credit(50);
        assert_eq!(top.money(), 100);
    }

    #[test]
    fn queue_is_drained_in_order() {
        let mut top = client(Side::Top);
        top.queue_unit("grunt".to_owned());
        top.queue_unit("tank".to_owned());

        assert_eq!(top.take_queue(), vec!["grunt".to_owned(), "tank".to_owned()]);
        assert!(top.unit_queue().is_empty());
    }
}
