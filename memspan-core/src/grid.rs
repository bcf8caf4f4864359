use serde::{Deserialize, Serialize};

/// Grid dimensions, rows first. Config files spell this `[size_y, size_x]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct GridSize {
    pub rows: usize,
    pub cols: usize,
}

impl GridSize {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub const fn cells(&self) -> usize {
        self.rows * self.cols
    }

    /// Row-major index of a cell
    pub const fn index_of(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Inverse of [`GridSize::index_of`]
    pub const fn row_col(&self, index: usize) -> (usize, usize) {
        (index / self.cols, index % self.cols)
    }
}

impl From<[usize; 2]> for GridSize {
    fn from([rows, cols]: [usize; 2]) -> Self {
        Self { rows, cols }
    }
}

impl From<GridSize> for [usize; 2] {
    fn from(size: GridSize) -> Self {
        [size.rows, size.cols]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips_through_row_col() {
        let size = GridSize::new(3, 4);
        assert_eq!(size.cells(), 12);
        assert_eq!(size.index_of(2, 1), 9);
        assert_eq!(size.row_col(9), (2, 1));
    }

    #[test]
    fn deserializes_from_y_x_pair() {
        let size: GridSize = serde_json::from_str("[2, 5]").unwrap();
        assert_eq!(size, GridSize::new(2, 5));
        assert_eq!(serde_json::to_string(&size).unwrap(), "[2,5]");
    }
}
