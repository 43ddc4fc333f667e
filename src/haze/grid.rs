//! Environmental haze grid (stigmergic trail marking)

use serde::Serialize;

use crate::core::types::Vec2;

/// Index of one haze cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct HazeCell {
    pub col: usize,
    pub row: usize,
}

/// Coarse scalar field over the world, values in [0, 1]
#[derive(Debug, Clone, Serialize)]
pub struct HazeGrid {
    cell_size: f32,
    cols: usize,
    rows: usize,
    values: Vec<f32>,
}

impl HazeGrid {
    /// Grid covering a `width` x `height` world, one extra cell per axis
    pub fn new(width: f32, height: f32, cell_size: f32) -> Self {
        let cols = (width / cell_size) as usize + 1;
        let rows = (height / cell_size) as usize + 1;
        Self {
            cell_size,
            cols,
            rows,
            values: vec![0.0; cols * rows],
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Cell containing `pos`, clamped to the grid
    pub fn cell_of(&self, pos: Vec2) -> HazeCell {
        let col = (pos.x / self.cell_size).floor().max(0.0) as usize;
        let row = (pos.y / self.cell_size).floor().max(0.0) as usize;
        HazeCell {
            col: col.min(self.cols - 1),
            row: row.min(self.rows - 1),
        }
    }

    #[inline]
    fn index(&self, cell: HazeCell) -> usize {
        cell.row * self.cols + cell.col
    }

    pub fn get(&self, cell: HazeCell) -> f32 {
        self.values[self.index(cell)]
    }

    /// Haze at the cell containing `pos`
    pub fn sample(&self, pos: Vec2) -> f32 {
        self.get(self.cell_of(pos))
    }

    /// Add haze to a cell, capped at 1.0
    pub fn deposit(&mut self, cell: HazeCell, amount: f32) {
        let i = self.index(cell);
        self.values[i] = (self.values[i] + amount).min(1.0);
    }

    /// Multiplicative decay of every cell
    pub fn decay(&mut self, factor: f32) {
        for v in &mut self.values {
            *v *= factor;
        }
    }

    pub fn max_value(&self) -> f32 {
        self.values.iter().copied().fold(0.0, f32::max)
    }

    pub fn total(&self) -> f32 {
        self.values.iter().sum()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_include_edge_cell() {
        let grid = HazeGrid::new(800.0, 600.0, 20.0);
        assert_eq!(grid.dimensions(), (41, 31));
        assert_eq!(grid.total(), 0.0);
    }

    #[test]
    fn test_cell_lookup_clamps() {
        let grid = HazeGrid::new(100.0, 100.0, 20.0);
        assert_eq!(grid.cell_of(Vec2::new(25.0, 45.0)), HazeCell { col: 1, row: 2 });
        assert_eq!(grid.cell_of(Vec2::new(-3.0, 500.0)), HazeCell { col: 0, row: 5 });
    }

    #[test]
    fn test_deposit_is_capped() {
        let mut grid = HazeGrid::new(100.0, 100.0, 20.0);
        let cell = grid.cell_of(Vec2::new(50.0, 50.0));
        for _ in 0..15 {
            grid.deposit(cell, 0.1);
        }
        assert_eq!(grid.get(cell), 1.0);
        assert_eq!(grid.sample(Vec2::new(41.0, 59.0)), 1.0);
        assert_eq!(grid.sample(Vec2::new(10.0, 10.0)), 0.0);
    }

    #[test]
    fn test_decay() {
        let mut grid = HazeGrid::new(100.0, 100.0, 20.0);
        let cell = HazeCell { col: 2, row: 3 };
        grid.deposit(cell, 0.5);
        grid.decay(0.99);
        assert!((grid.get(cell) - 0.495).abs() < 1e-6);
        assert!((grid.max_value() - 0.495).abs() < 1e-6);
    }
}
