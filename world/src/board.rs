//! Grid occupancy and the lazily refreshed spawner-to-spawner solution.

use std::collections::HashSet;

use duel_defence_core::{Cell, Extent, Point, Side};
use serde::Serialize;

use crate::navigation;

/// Fixed entry points of both sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Spawners {
    top: Point,
    bottom: Point,
}

impl Spawners {
    /// Spawner owned by the provided side.
    #[must_use]
    pub const fn get(&self, side: Side) -> Point {
        match side {
            Side::Top => self.top,
            Side::Bottom => self.bottom,
        }
    }
}

/// Cached routes between the spawners together with the exclusion set they honour.
#[derive(Clone, Debug, Default)]
struct Solution {
    stale: bool,
    exclude: Vec<Point>,
    top: Vec<Point>,
    bottom: Vec<Point>,
}

/// Row-major grid of cells with two spawners and a cached route in each direction.
#[derive(Clone, Debug)]
pub struct Board {
    extent: Extent,
    cells: Vec<Cell>,
    spawners: Option<Spawners>,
    solution: Solution,
}

impl Board {
    /// Creates an empty board of the provided extent.
    #[must_use]
    pub fn new(extent: Extent) -> Self {
        Self {
            extent,
            cells: vec![Cell::Empty; extent.area()],
            spawners: None,
            solution: Solution {
                stale: true,
                ..Solution::default()
            },
        }
    }

    /// Dimensions of the board.
    #[must_use]
    pub const fn extent(&self) -> Extent {
        self.extent
    }

    /// Reports whether the position lies on the board.
    #[must_use]
    pub const fn in_bounds(&self, pos: Point) -> bool {
        self.extent.contains(pos)
    }

    /// All cells in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Spawner positions, once created.
    #[must_use]
    pub const fn spawners(&self) -> Option<Spawners> {
        self.spawners
    }

    /// Reads a cell. Callers must bounds-check `pos` first.
    #[must_use]
    pub fn cell(&self, pos: Point) -> Cell {
        debug_assert!(self.in_bounds(pos), "cell {pos:?} outside the board");
        self.cells[self.index(pos)]
    }

    /// Writes a cell and marks the cached solution stale. Callers must bounds-check `pos` first.
    pub fn set_cell(&mut self, pos: Point, cell: Cell) {
        debug_assert!(self.in_bounds(pos), "cell {pos:?} outside the board");
        let index = self.index(pos);
        self.cells[index] = cell;
        self.solution.stale = true;
    }

    /// Enumerates the footprint cells of a placement anchored at `origin`.
    ///
    /// The origin is pulled back so that the footprint never crosses the right
    /// or bottom edge; the clamped origin is returned next to the cells, which
    /// are listed row by row.
    #[must_use]
    pub fn square_poses(&self, origin: Point, footprint: Extent) -> (Point, Vec<Point>) {
        let max_x = self.extent.width() - footprint.width();
        let max_y = self.extent.height() - footprint.height();
        let clamped = Point::new(origin.x().min(max_x), origin.y().min(max_y));

        let mut poses = Vec::with_capacity(footprint.area());
        for y in 0..footprint.height() {
            for x in 0..footprint.width() {
                poses.push(clamped.offset(Point::new(x, y)));
            }
        }
        (clamped, poses)
    }

    /// Places both spawner cells and remembers their positions.
    ///
    /// Spawners are fixed once created; later calls leave the board untouched.
    pub fn create_spawners(&mut self, top: Point, bottom: Point) {
        if let Some(existing) = self.spawners {
            tracing::warn!(?existing, ?top, ?bottom, "spawners already placed");
            return;
        }
        self.set_cell(top, Cell::Spawner);
        self.set_cell(bottom, Cell::Spawner);
        self.spawners = Some(Spawners { top, bottom });
        self.solution.stale = true;
    }

    /// Shortest route from `from`'s spawner to the opposite spawner.
    ///
    /// Cells listed in `exclude` are treated as impassable without touching the
    /// board. The cached routes are reused until a cell changes or a different
    /// exclusion set is requested. The returned route is a copy owned by the
    /// caller and is empty when no route exists.
    pub fn solution(&mut self, from: Side, exclude: &[Point]) -> Vec<Point> {
        if self.solution.exclude.as_slice() != exclude {
            self.solution.exclude = exclude.to_vec();
            self.solution.stale = true;
        }

        if self.solution.stale {
            self.refresh_solution();
        }

        match from {
            Side::Top => self.solution.top.clone(),
            Side::Bottom => self.solution.bottom.clone(),
        }
    }

    /// Runs a fresh search between two arbitrary cells, bypassing the cache.
    #[must_use]
    pub fn find_path(&self, start: Point, end: Point, exclude: &[Point]) -> Vec<Point> {
        let excluded: HashSet<Point> = exclude.iter().copied().collect();
        navigation::shortest_path(self.extent, start, end, |cell| {
            excluded.contains(&cell) || !self.cell(cell).is_walkable()
        })
    }

    fn refresh_solution(&mut self) {
        let (top, bottom) = match self.spawners {
            Some(spawners) => {
                let exclude = &self.solution.exclude;
                (
                    self.find_path(spawners.top, spawners.bottom, exclude),
                    self.find_path(spawners.bottom, spawners.top, exclude),
                )
            }
            None => (Vec::new(), Vec::new()),
        };
        self.solution.top = top;
        self.solution.bottom = bottom;
        self.solution.stale = false;
    }

    #[cfg(test)]
    fn solution_is_stale(&self) -> bool {
        self.solution.stale
    }

    fn index(&self, pos: Point) -> usize {
        (pos.y() * self.extent.width() + pos.x()) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_defence_core::TowerId;

    fn duel_board() -> Board {
        let mut board = Board::new(Extent::new(25, 33));
        board.create_spawners(Point::new(12, 0), Point::new(12, 32));
        board
    }

    fn block(board: &mut Board, origin: Point, footprint: Extent) {
        let (_, poses) = board.square_poses(origin, footprint);
        for pos in poses {
            board.set_cell(pos, Cell::Tower(TowerId::new(1)));
        }
    }

    #[test]
    fn open_board_routes_straight_between_spawners() {
        let mut board = duel_board();
        let route = board.solution(Side::Top, &[]);

        assert_eq!(route.len(), 33);
        assert_eq!(route.first(), Some(&Point::new(12, 0)));
        assert_eq!(route.last(), Some(&Point::new(12, 32)));
        assert!(route.iter().all(|cell| cell.x() == 12));

        let reverse = board.solution(Side::Bottom, &[]);
        assert_eq!(reverse.first(), Some(&Point::new(12, 32)));
        assert_eq!(reverse.last(), Some(&Point::new(12, 0)));
    }

    #[test]
    fn solution_reroutes_around_a_block() {
        let mut board = duel_board();
        block(&mut board, Point::new(12, 10), Extent::new(2, 2));

        let route = board.solution(Side::Top, &[]);

        assert_eq!(route.len(), 35);
        assert!(route.iter().all(|cell| board.cell(*cell).is_walkable()));
    }

    #[test]
    fn several_writes_leave_one_stale_cache_until_read() {
        let mut board = duel_board();
        let _ = board.solution(Side::Top, &[]);
        assert!(!board.solution_is_stale());

        block(&mut board, Point::new(11, 5), Extent::new(3, 3));
        assert!(board.solution_is_stale());

        let cached = board.solution(Side::Top, &[]);
        assert!(!board.solution_is_stale());
        let fresh = board.find_path(Point::new(12, 0), Point::new(12, 32), &[]);
        assert_eq!(cached, fresh);
    }

    #[test]
    fn exclusion_does_not_mutate_board() {
        let mut board = duel_board();
        let (_, footprint) = board.square_poses(Point::new(0, 16), Extent::new(25, 1));

        assert!(board.solution(Side::Top, &footprint).is_empty());
        assert!(board.solution(Side::Bottom, &footprint).is_empty());
        assert!(footprint.iter().all(|cell| board.cell(*cell) == Cell::Empty));
        assert_eq!(board.solution(Side::Top, &[]).len(), 33);
    }

    #[test]
    fn square_poses_clamp_to_board_edges() {
        let board = Board::new(Extent::new(25, 33));
        let footprint = Extent::new(3, 3);

        let (origin, poses) = board.square_poses(Point::new(24, 32), footprint);

        assert_eq!(origin, Point::new(22, 30));
        assert_eq!(poses.len(), 9);
        assert!(poses.iter().all(|pos| board.in_bounds(*pos)));
        assert_eq!(poses.first(), Some(&Point::new(22, 30)));
        assert_eq!(poses.last(), Some(&Point::new(24, 32)));
    }

    #[test]
    fn square_poses_keep_origin_when_room_remains() {
        let board = Board::new(Extent::new(10, 10));
        let (origin, poses) = board.square_poses(Point::new(3, 4), Extent::new(2, 2));

        assert_eq!(origin, Point::new(3, 4));
        assert_eq!(
            poses,
            vec![
                Point::new(3, 4),
                Point::new(4, 4),
                Point::new(3, 5),
                Point::new(4, 5),
            ]
        );
    }

    #[test]
    fn board_without_spawners_has_no_solution() {
        let mut board = Board::new(Extent::new(5, 5));
        assert!(board.solution(Side::Top, &[]).is_empty());
    }

    #[test]
    fn clearing_a_cell_reopens_the_route() {
        let mut board = Board::new(Extent::new(3, 3));
        board.create_spawners(Point::new(1, 0), Point::new(1, 2));
        for x in 0..3 {
            board.set_cell(Point::new(x, 1), Cell::Tower(TowerId::new(4)));
        }
        assert!(board.solution(Side::Top, &[]).is_empty());

        board.set_cell(Point::new(0, 1), Cell::Empty);

        assert_eq!(board.solution(Side::Top, &[]).len(), 5);
    }

    #[test]
    fn spawners_do_not_move_once_created() {
        let mut board = duel_board();
        let before = board.spawners();

        board.create_spawners(Point::new(3, 3), Point::new(3, 20));

        assert_eq!(board.spawners(), before);
        assert_eq!(board.cell(Point::new(3, 3)), Cell::Empty);
        assert_eq!(board.cell(Point::new(3, 20)), Cell::Empty);
        assert_eq!(board.cell(Point::new(12, 0)), Cell::Spawner);
        assert_eq!(board.solution(Side::Top, &[]).len(), 33);
    }
}
