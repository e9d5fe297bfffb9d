#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-cell threat field derived from the current tower layout.
//!
//! Every tower contributes `dps * scale * (1 - d)^exponent` to each cell whose
//! center lies within its effective range, where `d` is the cell's distance
//! from the tower normalised by that range. Contributions sum across towers.

use portal_defence_core::{
    config::DangerTuning, CellCoord, Grid, GridDimensions, TowerSnapshot,
};

/// Dense danger values stored in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct DangerField {
    dimensions: GridDimensions,
    values: Vec<f64>,
}

impl DangerField {
    /// Creates an all-zero field covering the provided dimensions.
    #[must_use]
    pub fn new(dimensions: GridDimensions) -> Self {
        Self {
            dimensions,
            values: vec![0.0; dimensions.cell_count()],
        }
    }

    /// Recomputes the field from scratch for the provided towers.
    pub fn rebuild<'a, I>(&mut self, grid: &Grid, towers: I, tuning: &DangerTuning)
    where
        I: IntoIterator<Item = &'a TowerSnapshot>,
    {
        let dimensions = grid.dimensions();
        if self.dimensions != dimensions {
            self.dimensions = dimensions;
            self.values.clear();
            self.values.resize(dimensions.cell_count(), 0.0);
        } else {
            self.values.fill(0.0);
        }

        for tower in towers {
            self.accumulate(grid, tower, tuning);
        }
    }

    fn accumulate(&mut self, grid: &Grid, tower: &TowerSnapshot, tuning: &DangerTuning) {
        let profile = tower.profile();
        let range = f64::from(profile.range);
        let dps = f64::from(profile.damage_per_second());
        if range <= 0.0 || dps <= 0.0 || grid.cell_size() <= 0.0 {
            return;
        }

        let reach = (range / f64::from(grid.cell_size())).ceil() as i64;
        let center = grid.cell_center(tower.cell);
        let origin_column = i64::from(tower.cell.column());
        let origin_row = i64::from(tower.cell.row());

        for row in (origin_row - reach)..=(origin_row + reach) {
            for column in (origin_column - reach)..=(origin_column + reach) {
                let (Ok(column), Ok(row)) = (u32::try_from(column), u32::try_from(row)) else {
                    continue;
                };
                let cell = CellCoord::new(column, row);
                let Some(index) = self.dimensions.index(cell) else {
                    continue;
                };

                let distance = f64::from(grid.cell_center(cell).distance(center));
                if distance > range {
                    continue;
                }

                let normalized = distance / range;
                let falloff = (1.0 - normalized).powi(tuning.exponent);
                self.values[index] += dps * tuning.scale * falloff;
            }
        }
    }

    /// Danger at the provided cell; zero outside the grid.
    #[must_use]
    pub fn danger(&self, cell: CellCoord) -> f64 {
        self.dimensions
            .index(cell)
            .and_then(|index| self.values.get(index).copied())
            .unwrap_or(0.0)
    }

    /// Raw values in row-major order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Reports whether no cell carries any danger.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.values.iter().all(|value| *value == 0.0)
    }
}
