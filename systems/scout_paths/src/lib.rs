#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Danger-agnostic randomized walks for scout enemies.
//!
//! A scout repeatedly steps to an unvisited traversable neighbor. Most steps
//! take the neighbor closest to the goal; the rest pick uniformly at random.
//! Dead ends fall back to the goal-closest neighbor even if already visited.
//! Walks are capped at one step per grid cell.

use portal_defence_core::{config::ScoutTuning, CellCoord, GridDimensions};
use rand::Rng;

/// Outcome of a scout walk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoutWalk {
    /// Visited cells in order, starting with the spawn cell.
    pub path: Vec<CellCoord>,
    /// Whether the walk ended on the goal before hitting the step cap.
    pub reached_goal: bool,
}

impl ScoutWalk {
    /// Returns the path when it reaches the goal, discarding partial walks.
    #[must_use]
    pub fn into_complete(self) -> Option<Vec<CellCoord>> {
        self.reached_goal.then_some(self.path)
    }
}

/// Generator that keeps its visited buffer between walks.
#[derive(Debug, Default)]
pub struct ScoutPathGenerator {
    visited: Vec<bool>,
    candidates: Vec<CellCoord>,
}

impl ScoutPathGenerator {
    /// Walks from `start` toward `goal`, never entering blocked cells.
    pub fn generate<R, F>(
        &mut self,
        dimensions: GridDimensions,
        start: CellCoord,
        goal: CellCoord,
        tuning: &ScoutTuning,
        rng: &mut R,
        is_blocked: F,
    ) -> ScoutWalk
    where
        R: Rng + ?Sized,
        F: Fn(CellCoord) -> bool,
    {
        let mut path = vec![start];
        let Some(start_index) = dimensions.index(start) else {
            return ScoutWalk {
                path,
                reached_goal: false,
            };
        };

        self.visited.clear();
        self.visited.resize(dimensions.cell_count(), false);
        self.visited[start_index] = true;

        let step_cap = dimensions.cell_count();
        let progress_bias = tuning.progress_bias.clamp(0.0, 1.0);
        let mut current = start;

        while current != goal {
            self.candidates.clear();
            let mut fallback: Option<CellCoord> = None;

            for neighbor in dimensions.neighbors(current) {
                if is_blocked(neighbor.cell) {
                    continue;
                }
                fallback = Some(closer_to(goal, fallback, neighbor.cell));
                let unvisited = dimensions
                    .index(neighbor.cell)
                    .is_some_and(|index| !self.visited[index]);
                if unvisited {
                    self.candidates.push(neighbor.cell);
                }
            }

            let next = if self.candidates.is_empty() {
                match fallback {
                    Some(cell) => cell,
                    None => break,
                }
            } else if rng.gen_bool(progress_bias) {
                self.candidates
                    .iter()
                    .copied()
                    .fold(None, |best, cell| Some(closer_to(goal, best, cell)))
                    .unwrap_or(current)
            } else {
                self.candidates[rng.gen_range(0..self.candidates.len())]
            };

            if let Some(index) = dimensions.index(next) {
                self.visited[index] = true;
            }
            path.push(next);
            current = next;

            if path.len() > step_cap {
                break;
            }
        }

        ScoutWalk {
            reached_goal: current == goal,
            path,
        }
    }
}

// Keeps the earlier candidate on ties.
fn closer_to(goal: CellCoord, best: Option<CellCoord>, candidate: CellCoord) -> CellCoord {
    match best {
        Some(best) if best.manhattan_distance(goal) <= candidate.manhattan_distance(goal) => best,
        _ => candidate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn greedy() -> ScoutTuning {
        ScoutTuning {
            progress_bias: 1.0,
            portal_jitter_rows: 1,
        }
    }

    #[test]
    fn greedy_walk_heads_straight_for_goal() {
        let dimensions = GridDimensions::new(20, 15);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut generator = ScoutPathGenerator::default();

        let walk = generator.generate(
            dimensions,
            CellCoord::new(0, 7),
            CellCoord::new(19, 7),
            &greedy(),
            &mut rng,
            |_| false,
        );

        assert!(walk.reached_goal);
        assert_eq!(walk.path.len(), 20);
        assert!(walk.path.iter().all(|cell| cell.row() == 7));
    }

    #[test]
    fn walks_never_enter_blocked_cells() {
        let dimensions = GridDimensions::new(20, 15);
        let wall: Vec<CellCoord> = (2..15).map(|row| CellCoord::new(9, row)).collect();
        let mut generator = ScoutPathGenerator::default();

        for seed in 0..32 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let walk = generator.generate(
                dimensions,
                CellCoord::new(0, 7),
                CellCoord::new(19, 7),
                &ScoutTuning::default(),
                &mut rng,
                |cell| wall.contains(&cell),
            );

            assert!(walk.path.iter().all(|cell| !wall.contains(cell)));
            for pair in walk.path.windows(2) {
                assert!(pair[0].is_adjacent(pair[1]));
            }
            assert!(walk.path.len() <= dimensions.cell_count() + 1);
        }
    }

    #[test]
    fn enclosed_start_stops_without_reaching_goal() {
        let dimensions = GridDimensions::new(5, 5);
        let start = CellCoord::new(0, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut generator = ScoutPathGenerator::default();

        let walk = generator.generate(
            dimensions,
            start,
            CellCoord::new(4, 4),
            &ScoutTuning::default(),
            &mut rng,
            |cell| cell != start,
        );

        assert!(!walk.reached_goal);
        assert_eq!(walk.path, vec![start]);
        assert!(walk.into_complete().is_none());
    }

    #[test]
    fn dead_end_walk_is_capped() {
        // A sealed pocket of two cells forces the walk to bounce until the cap.
        let dimensions = GridDimensions::new(4, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut generator = ScoutPathGenerator::default();

        let walk = generator.generate(
            dimensions,
            CellCoord::new(0, 0),
            CellCoord::new(3, 0),
            &ScoutTuning::default(),
            &mut rng,
            |cell| cell == CellCoord::new(2, 0),
        );

        assert!(!walk.reached_goal);
        assert_eq!(walk.path.len(), dimensions.cell_count() + 1);
    }

    #[test]
    fn same_seed_reproduces_walk() {
        let dimensions = GridDimensions::new(12, 9);
        let mut generator = ScoutPathGenerator::default();
        let walk = |generator: &mut ScoutPathGenerator| {
            let mut rng = ChaCha8Rng::seed_from_u64(77);
            generator.generate(
                dimensions,
                CellCoord::new(0, 4),
                CellCoord::new(11, 4),
                &ScoutTuning::default(),
                &mut rng,
                |_| false,
            )
        };

        let first = walk(&mut generator);
        let second = walk(&mut generator);
        assert_eq!(first, second);
    }
}
