#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Threat-aware A* search over the 8-connected cell grid.
//!
//! Stepping into a cell costs `1` (or `sqrt(2)` diagonally) plus the cell's
//! danger scaled by [`DangerTuning::penalty_factor`]. The Manhattan heuristic
//! is scaled down by [`DangerTuning::heuristic_weight`] so that it only breaks
//! ties between otherwise equal frontiers.

use std::{cmp::Ordering, collections::BinaryHeap};

use portal_defence_core::{config::DangerTuning, CellCoord, GridDimensions};
use portal_defence_system_danger_field::DangerField;

const CARDINAL_COST: f64 = 1.0;
const DIAGONAL_COST: f64 = std::f64::consts::SQRT_2;

/// Reusable A* workspace.
///
/// The planner keeps its bookkeeping buffers between calls so repeated
/// searches on the same grid do not reallocate.
#[derive(Debug, Default)]
pub struct PathPlanner {
    g_score: Vec<f64>,
    came_from: Vec<Option<usize>>,
    closed: Vec<bool>,
    open: BinaryHeap<Frontier>,
}

impl PathPlanner {
    /// Finds the cheapest path from `start` to `goal`.
    ///
    /// The returned path begins with `start`, ends with `goal`, and every
    /// consecutive pair is 8-adjacent. Cells for which `is_blocked` returns
    /// `true` are never entered; the start cell itself is exempt so an enemy
    /// standing next to a freshly placed tower can still be re-planned.
    /// Returns `None` when the goal cannot be reached.
    pub fn plan<F>(
        &mut self,
        dimensions: GridDimensions,
        start: CellCoord,
        goal: CellCoord,
        danger: &DangerField,
        tuning: &DangerTuning,
        is_blocked: F,
    ) -> Option<Vec<CellCoord>>
    where
        F: Fn(CellCoord) -> bool,
    {
        let start_index = dimensions.index(start)?;
        let goal_index = dimensions.index(goal)?;
        if start == goal {
            return Some(vec![start]);
        }
        if is_blocked(goal) {
            return None;
        }

        self.prepare(dimensions.cell_count());
        self.g_score[start_index] = 0.0;
        self.open.push(Frontier {
            f_score: heuristic(start, goal, tuning),
            index: start_index,
        });

        while let Some(Frontier { index, .. }) = self.open.pop() {
            if index == goal_index {
                return Some(self.reconstruct(dimensions, goal_index));
            }
            if self.closed[index] {
                continue;
            }
            self.closed[index] = true;

            let Some(current) = dimensions.cell_at(index) else {
                continue;
            };
            let current_g = self.g_score[index];

            for neighbor in dimensions.neighbors(current) {
                if is_blocked(neighbor.cell) {
                    continue;
                }
                let Some(neighbor_index) = dimensions.index(neighbor.cell) else {
                    continue;
                };
                if self.closed[neighbor_index] {
                    continue;
                }

                let base = if neighbor.diagonal {
                    DIAGONAL_COST
                } else {
                    CARDINAL_COST
                };
                let penalty = danger.danger(neighbor.cell) * tuning.penalty_factor;
                let tentative = current_g + base + penalty;
                if tentative < self.g_score[neighbor_index] {
                    self.g_score[neighbor_index] = tentative;
                    self.came_from[neighbor_index] = Some(index);
                    self.open.push(Frontier {
                        f_score: tentative + heuristic(neighbor.cell, goal, tuning),
                        index: neighbor_index,
                    });
                }
            }
        }

        None
    }

    fn prepare(&mut self, cell_count: usize) {
        self.g_score.clear();
        self.g_score.resize(cell_count, f64::INFINITY);
        self.came_from.clear();
        self.came_from.resize(cell_count, None);
        self.closed.clear();
        self.closed.resize(cell_count, false);
        self.open.clear();
    }

    fn reconstruct(&self, dimensions: GridDimensions, goal_index: usize) -> Vec<CellCoord> {
        let mut path = Vec::new();
        let mut cursor = Some(goal_index);
        while let Some(index) = cursor {
            if let Some(cell) = dimensions.cell_at(index) {
                path.push(cell);
            }
            cursor = self.came_from[index];
        }
        path.reverse();
        path
    }
}

fn heuristic(cell: CellCoord, goal: CellCoord, tuning: &DangerTuning) -> f64 {
    f64::from(cell.manhattan_distance(goal)) * tuning.heuristic_weight
}

#[derive(Clone, Copy, Debug)]
struct Frontier {
    f_score: f64,
    index: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    // Reversed so the max-heap pops the lowest score; lower indices win ties.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.index.cmp(&self.index))
    }
}
