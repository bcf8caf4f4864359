use crate::config::ExperimentConfig;
use crate::error::MatrixError;
use memspan_core::{GridSize, Rgba, StimulusContent, StimulusKind};
use rand::Rng;
use std::collections::HashSet;

/// Pixel layout of a grid: cell spacing, cell size and where the grid centre sits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixGeometry {
    pub size: GridSize,
    pub stimulus_dist: f32,
    pub stimulus_size: f32,
    pub central_pos: (f32, f32),
}

impl MatrixGeometry {
    pub fn from_config(config: &ExperimentConfig, size: GridSize) -> Self {
        Self {
            size,
            stimulus_dist: config.stimulus_dist,
            stimulus_size: config.stimulus_size,
            central_pos: config.stimulus_central_pos,
        }
    }

    /// Centre of a cell; row 0 is the top row.
    pub fn cell_center(&self, row: usize, col: usize) -> (f32, f32) {
        let half_cols = (self.size.cols as f32 - 1.0) / 2.0;
        let half_rows = (self.size.rows as f32 - 1.0) / 2.0;
        (
            self.central_pos.0 + (col as f32 - half_cols) * self.stimulus_dist,
            self.central_pos.1 + (half_rows - row as f32) * self.stimulus_dist,
        )
    }

    /// Width and height covered by the grid's stimuli
    pub fn extent(&self) -> (f32, f32) {
        (
            (self.size.cols as f32 - 1.0) * self.stimulus_dist + self.stimulus_size,
            (self.size.rows as f32 - 1.0) * self.stimulus_dist + self.stimulus_size,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    pub width: f32,
    pub color: Rgba,
}

/// A stimulus placed on a grid cell
#[derive(Debug, Clone, PartialEq)]
pub struct MountedStimulus {
    pub identity: String,
    pub content: StimulusContent,
    pub cell: (usize, usize),
    pub pos: (f32, f32),
    pub selected: bool,
}

impl MountedStimulus {
    /// Hit test against the `size` x `size` square centred on the stimulus
    pub fn contains(&self, point: (f32, f32), size: f32) -> bool {
        let half = size / 2.0;
        (point.0 - self.pos.0).abs() <= half && (point.1 - self.pos.1).abs() <= half
    }
}

#[derive(Debug, Clone)]
pub struct Matrix {
    geometry: MatrixGeometry,
    n: usize,
    slots: Vec<usize>,
    stimuli: Vec<MountedStimulus>,
    border: Option<Border>,
}

impl Matrix {
    /// Picks which `n` cells will hold stimuli.
    ///
    /// A full grid is filled row-major. Otherwise `group_elements` places the
    /// elements in one contiguous row-major run at a random offset, and
    /// without grouping the cells are scattered uniformly over the grid.
    pub fn new<R: Rng + ?Sized>(
        geometry: MatrixGeometry,
        n: usize,
        group_elements: bool,
        rng: &mut R,
    ) -> Result<Self, MatrixError> {
        let cells = geometry.size.cells();
        if n == 0 {
            return Err(MatrixError::Empty);
        }
        if n > cells {
            return Err(MatrixError::TooManyElements { n, cells });
        }

        let slots = if n == cells {
            (0..cells).collect()
        } else if group_elements {
            let start = rng.random_range(0..=cells - n);
            (start..start + n).collect()
        } else {
            let mut picked = rand::seq::index::sample(rng, cells, n).into_vec();
            picked.sort_unstable();
            picked
        };

        Ok(Self {
            geometry,
            n,
            slots,
            stimuli: Vec::new(),
            border: None,
        })
    }

    /// Binds content and border styling to every slot, in slot order.
    /// Allowed once per matrix.
    pub fn prepare_to_draw(
        &mut self,
        identities: &[String],
        kind: StimulusKind,
        border: Border,
    ) -> Result<(), MatrixError> {
        if self.is_prepared() {
            return Err(MatrixError::AlreadyPrepared);
        }
        if identities.len() != self.n {
            return Err(MatrixError::WrongStimulusCount {
                expected: self.n,
                got: identities.len(),
            });
        }
        let mut seen = HashSet::with_capacity(identities.len());
        if let Some(dup) = identities.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(MatrixError::DuplicateIdentity(dup.clone()));
        }

        self.stimuli = self
            .slots
            .iter()
            .zip(identities)
            .map(|(&slot, identity)| {
                let (row, col) = self.geometry.size.row_col(slot);
                MountedStimulus {
                    identity: identity.clone(),
                    content: StimulusContent::from_identity(kind, identity),
                    cell: (row, col),
                    pos: self.geometry.cell_center(row, col),
                    selected: false,
                }
            })
            .collect();
        self.border = Some(border);
        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.border.is_some()
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn size(&self) -> GridSize {
        self.geometry.size
    }

    pub fn geometry(&self) -> &MatrixGeometry {
        &self.geometry
    }

    pub fn slots(&self) -> &[usize] {
        &self.slots
    }

    pub fn border(&self) -> Option<Border> {
        self.border
    }

    pub fn stimuli(&self) -> &[MountedStimulus] {
        &self.stimuli
    }

    pub fn stimuli_mut(&mut self) -> &mut [MountedStimulus] {
        &mut self.stimuli
    }

    pub fn identities(&self) -> Vec<String> {
        self.stimuli.iter().map(|s| s.identity.clone()).collect()
    }

    /// Index of the stimulus under `point`, if any
    pub fn hit(&self, point: (f32, f32)) -> Option<usize> {
        let size = self.geometry.stimulus_size;
        self.stimuli.iter().position(|s| s.contains(point, size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn geometry(rows: usize, cols: usize) -> MatrixGeometry {
        MatrixGeometry {
            size: GridSize::new(rows, cols),
            stimulus_dist: 100.0,
            stimulus_size: 80.0,
            central_pos: (10.0, -20.0),
        }
    }

    fn border() -> Border {
        Border {
            width: 4.0,
            color: Rgba::rgb(255, 0, 0),
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn positions_are_symmetric_around_centre() {
        let g = geometry(3, 3);
        assert_eq!(g.cell_center(1, 1), (10.0, -20.0));
        assert_eq!(g.cell_center(0, 0), (-90.0, 80.0));
        assert_eq!(g.cell_center(2, 2), (110.0, -120.0));
        assert_eq!(g.extent(), (280.0, 280.0));
    }

    #[test]
    fn even_grids_straddle_the_centre() {
        let g = geometry(2, 4);
        assert_eq!(g.cell_center(0, 0), (-140.0, 30.0));
        assert_eq!(g.cell_center(1, 3), (160.0, -70.0));
    }

    #[test]
    fn full_grid_is_filled_row_major() {
        let mut rng = StdRng::seed_from_u64(5);
        let m = Matrix::new(geometry(2, 3), 6, true, &mut rng).unwrap();
        assert_eq!(m.slots(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn grouped_slots_are_contiguous() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let m = Matrix::new(geometry(4, 4), 5, true, &mut rng).unwrap();
            let slots = m.slots();
            assert_eq!(slots.len(), 5);
            assert!(slots.windows(2).all(|w| w[1] == w[0] + 1));
            assert!(*slots.last().unwrap() < 16);
        }
    }

    #[test]
    fn scattered_slots_are_distinct_and_in_range() {
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..50 {
            let m = Matrix::new(geometry(4, 4), 6, false, &mut rng).unwrap();
            let slots = m.slots();
            assert_eq!(slots.len(), 6);
            assert!(slots.windows(2).all(|w| w[0] < w[1]));
            assert!(slots.iter().all(|&s| s < 16));
        }
    }

    #[test]
    fn rejects_impossible_element_counts() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            Matrix::new(geometry(2, 2), 5, false, &mut rng).unwrap_err(),
            MatrixError::TooManyElements { n: 5, cells: 4 }
        );
        assert_eq!(
            Matrix::new(geometry(2, 2), 0, false, &mut rng).unwrap_err(),
            MatrixError::Empty
        );
    }

    #[test]
    fn prepare_to_draw_binds_in_slot_order() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut m = Matrix::new(geometry(2, 2), 4, false, &mut rng).unwrap();
        m.prepare_to_draw(&ids(&["a", "b", "c", "d"]), StimulusKind::Text, border())
            .unwrap();
        assert!(m.is_prepared());
        let s = &m.stimuli()[2];
        assert_eq!(s.identity, "c");
        assert_eq!(s.cell, (1, 0));
        assert_eq!(s.content, StimulusContent::Text("c".into()));
        assert_eq!(m.identities(), ids(&["a", "b", "c", "d"]));
    }

    #[test]
    fn prepare_to_draw_only_once() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut m = Matrix::new(geometry(1, 2), 2, false, &mut rng).unwrap();
        m.prepare_to_draw(&ids(&["a", "b"]), StimulusKind::Text, border())
            .unwrap();
        assert_eq!(
            m.prepare_to_draw(&ids(&["a", "b"]), StimulusKind::Text, border()),
            Err(MatrixError::AlreadyPrepared)
        );
    }

    #[test]
    fn prepare_to_draw_rejects_bad_identity_lists() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut m = Matrix::new(geometry(1, 3), 3, false, &mut rng).unwrap();
        assert_eq!(
            m.prepare_to_draw(&ids(&["a", "b"]), StimulusKind::Text, border()),
            Err(MatrixError::WrongStimulusCount {
                expected: 3,
                got: 2
            })
        );
        assert_eq!(
            m.prepare_to_draw(&ids(&["a", "b", "a"]), StimulusKind::Text, border()),
            Err(MatrixError::DuplicateIdentity("a".into()))
        );
        assert!(!m.is_prepared());
    }

    #[test]
    fn hit_testing_uses_stimulus_square() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut m = Matrix::new(geometry(1, 2), 2, false, &mut rng).unwrap();
        m.prepare_to_draw(&ids(&["left", "right"]), StimulusKind::Text, border())
            .unwrap();
        // cells at x = -40 and x = 60, y = -20, half size 40
        assert_eq!(m.hit((-40.0, -20.0)), Some(0));
        assert_eq!(m.hit((95.0, 15.0)), Some(1));
        assert_eq!(m.hit((0.0, -20.0)), Some(0));
        assert_eq!(m.hit((10.0, -20.0)), None);
        assert_eq!(m.hit((60.0, 30.0)), None);
    }
}
