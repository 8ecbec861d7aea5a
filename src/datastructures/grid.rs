//! Exploration grid over projected coordinates
//!
//! Each motion is projected, the projection is floor-divided by the cell
//! sizes, and the motion is filed under the resulting integer cell key. Every
//! cell carries a selection weight of `1 / (1 + occupancy)`, so cells that
//! produced few motions are drawn more often than crowded ones.

use std::collections::HashMap;

use nalgebra::DVector;
use rand::Rng;

use crate::common::{MotionId, PlannerError, PlannerResult};
use crate::datastructures::pdf::{Pdf, PdfElement};

/// Integer key of a grid cell
pub type CellCoord = Vec<i64>;

/// Handle to a cell of an `ExplorationGrid`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(usize);

/// A grid cell and the motions whose projection falls inside it
#[derive(Debug, Clone)]
pub struct Cell {
    coord: CellCoord,
    motions: Vec<MotionId>,
    element: PdfElement,
}

impl Cell {
    pub fn coord(&self) -> &CellCoord {
        &self.coord
    }

    pub fn motions(&self) -> &[MotionId] {
        &self.motions
    }

    pub fn occupancy(&self) -> usize {
        self.motions.len()
    }
}

/// Grid of cells plus the weighted table used to pick the next cell to expand
#[derive(Debug, Clone)]
pub struct ExplorationGrid {
    cell_sizes: Vec<f64>,
    lookup: HashMap<CellCoord, CellId>,
    cells: Vec<Cell>,
    pdf: Pdf<CellId>,
    motion_count: usize,
}

impl ExplorationGrid {
    pub fn new(cell_sizes: Vec<f64>) -> PlannerResult<Self> {
        if cell_sizes.is_empty() {
            return Err(PlannerError::InvalidParameter(
                "exploration grid needs at least one dimension".to_string(),
            ));
        }
        if let Some(size) = cell_sizes.iter().find(|s| !(**s > 0.0) || !s.is_finite()) {
            return Err(PlannerError::InvalidParameter(format!(
                "grid cell size must be positive and finite, got {}",
                size
            )));
        }
        Ok(Self {
            cell_sizes,
            lookup: HashMap::new(),
            cells: Vec::new(),
            pdf: Pdf::new(),
            motion_count: 0,
        })
    }

    /// Selection weight of a cell holding `occupancy` motions
    pub fn cell_weight(occupancy: usize) -> f64 {
        1.0 / (1.0 + occupancy as f64)
    }

    pub fn dimension(&self) -> usize {
        self.cell_sizes.len()
    }

    pub fn cell_sizes(&self) -> &[f64] {
        &self.cell_sizes
    }

    /// Number of cells created so far
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of motions bucketed so far
    pub fn motion_count(&self) -> usize {
        self.motion_count
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.0)
    }

    pub fn cells(&self) -> impl Iterator<Item = (CellId, &Cell)> + '_ {
        self.cells.iter().enumerate().map(|(i, c)| (CellId(i), c))
    }

    /// Current selection weight of a cell
    pub fn weight(&self, id: CellId) -> Option<f64> {
        self.cell(id).and_then(|c| self.pdf.weight(c.element))
    }

    /// Cell key of a projected coordinate
    pub fn coordinates(&self, projection: &DVector<f64>) -> PlannerResult<CellCoord> {
        if projection.len() != self.cell_sizes.len() {
            return Err(PlannerError::DimensionMismatch {
                expected: self.cell_sizes.len(),
                found: projection.len(),
            });
        }
        Ok(projection
            .iter()
            .zip(self.cell_sizes.iter())
            .map(|(p, size)| (p / size).floor() as i64)
            .collect())
    }

    /// Projected coordinate of the middle of a cell
    pub fn cell_center(&self, coord: &CellCoord) -> DVector<f64> {
        DVector::from_iterator(
            coord.len(),
            coord
                .iter()
                .zip(self.cell_sizes.iter())
                .map(|(&c, size)| (c as f64 + 0.5) * size),
        )
    }

    /// Cell containing a projected coordinate, if it exists
    pub fn cell_at(&self, projection: &DVector<f64>) -> Option<CellId> {
        let coord = self.coordinates(projection).ok()?;
        self.lookup.get(&coord).copied()
    }

    /// Get the cell for `coord`, creating it empty when absent
    pub fn create_cell(&mut self, coord: CellCoord) -> PlannerResult<CellId> {
        if coord.len() != self.cell_sizes.len() {
            return Err(PlannerError::DimensionMismatch {
                expected: self.cell_sizes.len(),
                found: coord.len(),
            });
        }
        if let Some(&id) = self.lookup.get(&coord) {
            return Ok(id);
        }
        let id = CellId(self.cells.len());
        let element = self.pdf.add(id, Self::cell_weight(0))?;
        self.lookup.insert(coord.clone(), id);
        self.cells.push(Cell {
            coord,
            motions: Vec::new(),
            element,
        });
        Ok(id)
    }

    /// File `motion` under the cell of its projection and reweight that cell
    pub fn bucket(&mut self, motion: MotionId, projection: &DVector<f64>) -> PlannerResult<CellId> {
        let coord = self.coordinates(projection)?;
        self.bucket_at(motion, coord)
    }

    /// Add `motion` to the cell at `coord`, creating the cell if needed
    pub fn bucket_at(&mut self, motion: MotionId, coord: CellCoord) -> PlannerResult<CellId> {
        let id = self.create_cell(coord)?;
        let cell = &mut self.cells[id.0];
        cell.motions.push(motion);
        let weight = Self::cell_weight(cell.motions.len());
        self.pdf.update(cell.element, weight)?;
        self.motion_count += 1;
        Ok(id)
    }

    /// Draw a cell with probability proportional to its weight
    pub fn select_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<CellId> {
        self.pdf.sample(rng.gen::<f64>()).copied()
    }

    /// Draw a cell, then a motion from it uniformly at random. An empty cell
    /// falls back to `nearest_to`, called with the cell's projected center.
    pub fn pick_seed<R, F>(&self, rng: &mut R, nearest_to: F) -> Option<MotionId>
    where
        R: Rng + ?Sized,
        F: FnOnce(&DVector<f64>) -> Option<MotionId>,
    {
        let cell = self.cell(self.select_cell(rng)?)?;
        if cell.motions.is_empty() {
            return nearest_to(&self.cell_center(&cell.coord));
        }
        Some(cell.motions[rng.gen_range(0..cell.motions.len())])
    }

    pub fn clear(&mut self) {
        self.lookup.clear();
        self.cells.clear();
        self.pdf.clear();
        self.motion_count = 0;
    }
}
