//! Weighted selection table
//!
//! Elements live in the leaves of an array-backed sum tree, so drawing an
//! element proportionally to its weight, changing a weight and appending an
//! element all cost O(log n). Internal sums are recomputed from the leaves on
//! every update, so they never drift away from the stored weights.

use crate::common::{PlannerError, PlannerResult};

/// Handle to an element of a `Pdf`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PdfElement(usize);

/// Discrete distribution over elements of type `T`
#[derive(Debug, Clone)]
pub struct Pdf<T> {
    data: Vec<T>,
    /// Sum tree: leaves at `capacity..2*capacity`, node `i` sums `2i` and `2i+1`
    tree: Vec<f64>,
    capacity: usize,
}

impl<T> Pdf<T> {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            tree: vec![0.0; 2],
            capacity: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sum of all weights
    pub fn total_weight(&self) -> f64 {
        self.tree[1]
    }

    /// Append `data` with `weight`
    pub fn add(&mut self, data: T, weight: f64) -> PlannerResult<PdfElement> {
        check_weight(weight)?;
        if self.data.len() == self.capacity {
            self.grow();
        }
        let index = self.data.len();
        self.data.push(data);
        self.set_leaf(index, weight);
        Ok(PdfElement(index))
    }

    /// Change the weight of an existing element
    pub fn update(&mut self, element: PdfElement, weight: f64) -> PlannerResult<()> {
        check_weight(weight)?;
        if element.0 >= self.data.len() {
            return Err(PlannerError::InvalidParameter(format!(
                "pdf element {} out of range ({} elements)",
                element.0,
                self.data.len()
            )));
        }
        self.set_leaf(element.0, weight);
        Ok(())
    }

    pub fn weight(&self, element: PdfElement) -> Option<f64> {
        (element.0 < self.data.len()).then(|| self.tree[self.capacity + element.0])
    }

    pub fn get(&self, element: PdfElement) -> Option<&T> {
        self.data.get(element.0)
    }

    /// Draw an element; `r` is uniform in [0, 1).
    /// Returns `None` when the table is empty or all weights are zero.
    pub fn sample(&self, r: f64) -> Option<&T> {
        let total = self.total_weight();
        if self.data.is_empty() || !(total > 0.0) {
            return None;
        }

        let mut target = r.clamp(0.0, 1.0) * total;
        let mut node = 1;
        while node < self.capacity {
            let left = 2 * node;
            if target < self.tree[left] || self.tree[left + 1] <= 0.0 {
                node = left;
            } else {
                target -= self.tree[left];
                node = left + 1;
            }
        }
        self.data.get(node - self.capacity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> + '_ {
        self.data
            .iter()
            .enumerate()
            .map(move |(i, d)| (d, self.tree[self.capacity + i]))
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.tree = vec![0.0; 2];
        self.capacity = 1;
    }

    fn set_leaf(&mut self, index: usize, weight: f64) {
        let mut node = self.capacity + index;
        self.tree[node] = weight;
        while node > 1 {
            node /= 2;
            self.tree[node] = self.tree[2 * node] + self.tree[2 * node + 1];
        }
    }

    fn grow(&mut self) {
        let old_capacity = self.capacity;
        let new_capacity = old_capacity * 2;
        let mut tree = vec![0.0; 2 * new_capacity];
        tree[new_capacity..new_capacity + old_capacity]
            .copy_from_slice(&self.tree[old_capacity..2 * old_capacity]);
        for node in (1..new_capacity).rev() {
            tree[node] = tree[2 * node] + tree[2 * node + 1];
        }
        self.tree = tree;
        self.capacity = new_capacity;
    }
}

impl<T> Default for Pdf<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn check_weight(weight: f64) -> PlannerResult<()> {
    if !(weight >= 0.0) || !weight.is_finite() {
        return Err(PlannerError::InvalidParameter(format!(
            "pdf weight must be finite and non-negative, got {}",
            weight
        )));
    }
    Ok(())
}
