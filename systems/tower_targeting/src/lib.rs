#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that picks one target per tower according to its target style.

use std::cmp::Ordering;

use duel_defence_core::{HalfCellPoint, TargetStyle, TowerSnapshot, UnitId, UnitSnapshot, UnitView};

/// Tower targeting system that reuses a scratch buffer between towers.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    candidates: Vec<Candidate>,
}

impl TowerTargeting {
    /// Creates a new targeting system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the unit the tower attacks this tick.
    ///
    /// Candidates are the units of the opposing side for which `in_range`
    /// holds. They are ordered by the tower's style and ties fall back to the
    /// smaller unit identifier, so the outcome never depends on iteration
    /// order. Returns `None` when no enemy is in range.
    pub fn select<F>(&mut self, tower: &TowerSnapshot, units: &UnitView, mut in_range: F) -> Option<UnitId>
    where
        F: FnMut(&UnitSnapshot) -> bool,
    {
        self.candidates.clear();
        for unit in units.iter() {
            if unit.side == tower.side || !in_range(unit) {
                continue;
            }
            self.candidates.push(Candidate {
                unit: *unit,
                distance_sq: tower.center.distance_sq(HalfCellPoint::of_cell(unit.cell)),
            });
        }

        let style = tower.style;
        self.candidates
            .sort_by(|a, b| compare(style, a, b).then_with(|| a.unit.id.cmp(&b.unit.id)));
        self.candidates.first().map(|candidate| candidate.unit.id)
    }

    /// Candidates of the most recent selection, best first.
    #[cfg(test)]
    fn ranked(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.candidates.iter().map(|candidate| candidate.unit.id)
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    unit: UnitSnapshot,
    distance_sq: i64,
}

fn compare(style: TargetStyle, a: &Candidate, b: &Candidate) -> Ordering {
    match style {
        TargetStyle::First => b.unit.path_index.cmp(&a.unit.path_index),
        TargetStyle::Last => a.unit.path_index.cmp(&b.unit.path_index),
        TargetStyle::Strongest => b.unit.health.total_cmp(&a.unit.health),
        TargetStyle::Weakest => a.unit.health.total_cmp(&b.unit.health),
        TargetStyle::Nearest => a.distance_sq.cmp(&b.distance_sq),
        TargetStyle::Furthest => b.distance_sq.cmp(&a.distance_sq),
    }
}

#[cfg(test)]
mod tests {
    use super::TowerTargeting;
    use duel_defence_core::{
        Extent, HalfCellPoint, Point, Side, TargetStyle, TowerId, TowerSnapshot, UnitId,
        UnitSnapshot, UnitView,
    };

    fn tower(style: TargetStyle) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(1),
            side: Side::Top,
            style,
            center: HalfCellPoint::of_footprint(Point::new(4, 4), Extent::new(2, 2)),
        }
    }

    fn unit(id: u32, side: Side, cell: (i32, i32), path_index: usize, health: f64) -> UnitSnapshot {
        UnitSnapshot {
            id: UnitId::new(id),
            side,
            cell: Point::new(cell.0, cell.1),
            path_index,
            health,
        }
    }

    fn enemies() -> UnitView {
        UnitView::from_snapshots(vec![
            unit(1, Side::Bottom, (5, 6), 10, 30.0),
            unit(2, Side::Bottom, (8, 5), 12, 10.0),
            unit(3, Side::Bottom, (4, 3), 4, 50.0),
        ])
    }

    fn pick(style: TargetStyle) -> Option<UnitId> {
        TowerTargeting::new().select(&tower(style), &enemies(), |_| true)
    }

    #[test]
    fn first_prefers_furthest_along_path() {
        assert_eq!(pick(TargetStyle::First), Some(UnitId::new(2)));
    }

    #[test]
    fn last_prefers_least_progress() {
        assert_eq!(pick(TargetStyle::Last), Some(UnitId::new(3)));
    }

    #[test]
    fn strongest_and_weakest_compare_health() {
        assert_eq!(pick(TargetStyle::Strongest), Some(UnitId::new(3)));
        assert_eq!(pick(TargetStyle::Weakest), Some(UnitId::new(2)));
    }

    #[test]
    fn nearest_and_furthest_measure_from_footprint_centre() {
        // Units 1 and 3 are equally close; unit 2 is the furthest.
        assert_eq!(pick(TargetStyle::Nearest), Some(UnitId::new(1)));
        assert_eq!(pick(TargetStyle::Furthest), Some(UnitId::new(2)));
    }

    #[test]
    fn friendly_units_are_ignored() {
        let units = UnitView::from_snapshots(vec![unit(1, Side::Top, (5, 5), 3, 10.0)]);
        let mut system = TowerTargeting::new();
        assert_eq!(system.select(&tower(TargetStyle::First), &units, |_| true), None);
        assert_eq!(system.ranked().count(), 0);
    }

    #[test]
    fn out_of_range_units_are_ignored() {
        let mut system = TowerTargeting::new();
        let selected = system.select(&tower(TargetStyle::First), &enemies(), |unit| unit.id != UnitId::new(2));
        assert_eq!(selected, Some(UnitId::new(1)));
        assert_eq!(system.ranked().collect::<Vec<_>>(), vec![UnitId::new(1), UnitId::new(3)]);
    }

    #[test]
    fn ties_fall_back_to_smaller_identifier() {
        let units = UnitView::from_snapshots(vec![
            unit(9, Side::Bottom, (6, 6), 5, 20.0),
            unit(4, Side::Bottom, (3, 3), 5, 20.0),
        ]);
        let mut system = TowerTargeting::new();
        for style in TargetStyle::ALL {
            assert_eq!(system.select(&tower(style), &units, |_| true), Some(UnitId::new(4)));
        }
    }

    #[test]
    fn empty_view_yields_no_target() {
        let mut system = TowerTargeting::new();
        assert_eq!(system.select(&tower(TargetStyle::Nearest), &UnitView::default(), |_| true), None);
    }
}
