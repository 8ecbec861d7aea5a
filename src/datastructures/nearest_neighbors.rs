//! Geometric near-neighbor access tree (GNAT)
//!
//! A metric tree: every internal node splits its points among a set of pivot
//! children, and each child remembers the range of distances from its own
//! pivot to everything stored under each sibling. Queries use those ranges
//! and the triangle inequality to skip whole subtrees, so `nearest` is exact
//! while touching only a fraction of the entries.
//!
//! Removal is lazy: removed entries go into a bounded cache, are skipped by
//! queries, and the tree is rebuilt from the live entries once the cache is
//! full. Once the size has reached `rebuild_size`, the next leaf overflow
//! rebuilds the whole tree instead of splitting that leaf, and the threshold
//! doubles until it exceeds the size again.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::{debug, warn};
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::common::{PlannerError, PlannerResult};
use crate::datastructures::greedy_k_centers::greedy_k_centers;

/// Distance function the tree is built on. Must be a metric.
pub type DistanceFn<T> = Box<dyn Fn(&T, &T) -> f64>;

/// Shape parameters of the tree
#[derive(Debug, Clone)]
pub struct NearestNeighborsConfig {
    /// Number of children created when a leaf splits
    pub degree: usize,
    /// Lower bound on the number of children of a split node
    pub min_degree: usize,
    /// Upper bound on the number of children of a split node
    pub max_degree: usize,
    /// Leaf capacity before it splits
    pub max_num_pts_per_leaf: usize,
    /// Removed entries kept before the tree is rebuilt
    pub removed_cache_size: usize,
    /// Size from which a leaf overflow rebuilds the tree (doubles after each
    /// rebuild). Defaults to `degree * max_num_pts_per_leaf`.
    pub rebuild_size: Option<usize>,
    /// Seed for the pivot selection
    pub seed: u64,
}

impl Default for NearestNeighborsConfig {
    fn default() -> Self {
        Self {
            degree: 16,
            min_degree: 2,
            max_degree: 24,
            max_num_pts_per_leaf: 8,
            removed_cache_size: 50,
            rebuild_size: None,
            seed: 0,
        }
    }
}

impl NearestNeighborsConfig {
    pub fn validate(&self) -> PlannerResult<()> {
        if self.min_degree < 2 {
            return Err(PlannerError::InvalidParameter(format!(
                "min_degree must be at least 2, got {}",
                self.min_degree
            )));
        }
        if self.min_degree > self.degree || self.degree > self.max_degree {
            return Err(PlannerError::InvalidParameter(format!(
                "degrees must satisfy min_degree <= degree <= max_degree, got {} <= {} <= {}",
                self.min_degree, self.degree, self.max_degree
            )));
        }
        if self.max_num_pts_per_leaf == 0 {
            return Err(PlannerError::InvalidParameter(
                "max_num_pts_per_leaf must be positive".to_string(),
            ));
        }
        if self.removed_cache_size == 0 {
            return Err(PlannerError::InvalidParameter(
                "removed_cache_size must be positive".to_string(),
            ));
        }
        if self.rebuild_size == Some(0) {
            return Err(PlannerError::InvalidParameter(
                "rebuild_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn initial_rebuild_size(&self) -> usize {
        self.rebuild_size
            .unwrap_or(self.degree * self.max_num_pts_per_leaf)
    }
}

/// Tree node: a pivot entry plus either leaf points or pivot children
struct Node<T> {
    pivot: T,
    /// Number of children this node gets when it splits
    degree: usize,
    points: Vec<T>,
    children: Vec<Node<T>>,
    /// Distance range from `pivot` to the entries below it (pivot excluded)
    min_radius: f64,
    max_radius: f64,
    /// `[min_range[j], max_range[j]]` bounds the distance from `pivot` to every
    /// entry under sibling `j` (sibling pivot included)
    min_range: Vec<f64>,
    max_range: Vec<f64>,
}

/// Borrowed state the recursive insert and split need
struct InsertContext<'a, T> {
    distance: &'a dyn Fn(&T, &T) -> f64,
    config: &'a NearestNeighborsConfig,
    rng: &'a mut StdRng,
    /// Report an overflowing leaf instead of splitting it
    defer_split: bool,
}

impl<T: Clone> Node<T> {
    fn new(pivot: T, degree: usize, siblings: usize, capacity: usize) -> Self {
        Self {
            pivot,
            degree,
            points: Vec::with_capacity(capacity + 1),
            children: Vec::new(),
            min_radius: f64::INFINITY,
            max_radius: f64::NEG_INFINITY,
            min_range: vec![f64::INFINITY; siblings],
            max_range: vec![f64::NEG_INFINITY; siblings],
        }
    }

    fn update_radius(&mut self, dist: f64) {
        self.min_radius = self.min_radius.min(dist);
        self.max_radius = self.max_radius.max(dist);
    }

    fn update_range(&mut self, sibling: usize, dist: f64) {
        self.min_range[sibling] = self.min_range[sibling].min(dist);
        self.max_range[sibling] = self.max_range[sibling].max(dist);
    }

    fn needs_split(&self, config: &NearestNeighborsConfig) -> bool {
        self.points.len() > config.max_num_pts_per_leaf && self.points.len() > self.degree
    }

    /// Insert below this node. Returns `true` when a leaf overflowed and the
    /// split was deferred to a full rebuild.
    fn add(&mut self, item: T, ctx: &mut InsertContext<'_, T>) -> bool {
        if self.children.is_empty() {
            self.points.push(item);
            if self.needs_split(ctx.config) {
                if ctx.defer_split {
                    return true;
                }
                self.split(ctx);
            }
            return false;
        }

        let dists: Vec<f64> = self
            .children
            .iter()
            .map(|c| (ctx.distance)(&item, &c.pivot))
            .collect();
        let nearest = argmin(&dists);
        for (child, &d) in self.children.iter_mut().zip(dists.iter()) {
            child.update_range(nearest, d);
        }
        let child = &mut self.children[nearest];
        child.update_radius(dists[nearest]);
        child.add(item, ctx)
    }

    /// Turn this leaf into an internal node with `degree` pivot children
    fn split(&mut self, ctx: &mut InsertContext<'_, T>) {
        let points = std::mem::take(&mut self.points);
        let total = points.len();
        let centers = greedy_k_centers(&points, self.degree, ctx.distance, &mut *ctx.rng);
        let k = centers.centers.len();

        let mut center_slot = vec![None; total];
        for (j, &c) in centers.centers.iter().enumerate() {
            center_slot[c] = Some(j);
        }

        let mut pivots: Vec<Option<T>> = vec![None; k];
        let mut others = Vec::with_capacity(total - k);
        for (i, item) in points.into_iter().enumerate() {
            match center_slot[i] {
                Some(j) => pivots[j] = Some(item),
                None => others.push((i, item)),
            }
        }

        let degree = self.degree;
        let capacity = ctx.config.max_num_pts_per_leaf;
        self.children = pivots
            .into_iter()
            .flatten()
            .map(|pivot| Node::new(pivot, degree, k, capacity))
            .collect();

        for (i, child) in self.children.iter_mut().enumerate() {
            for (j, &c) in centers.centers.iter().enumerate() {
                child.update_range(j, centers.distances[c][i]);
            }
        }

        for (i, item) in others {
            let row = &centers.distances[i];
            let nearest = argmin(row);
            for (child, &d) in self.children.iter_mut().zip(row.iter()) {
                child.update_range(nearest, d);
            }
            let child = &mut self.children[nearest];
            child.update_radius(row[nearest]);
            child.points.push(item);
        }

        let config = ctx.config;
        for child in &mut self.children {
            let share = degree * (child.points.len() + 1) / total.max(1);
            child.degree = share.clamp(config.min_degree, config.max_degree);
            if child.needs_split(config) {
                child.split(ctx);
            }
        }
    }

    fn search<'a, R>(
        &'a self,
        query: &T,
        nbh: &mut Neighbors<'a, T>,
        distance: &dyn Fn(&T, &T) -> f64,
        is_removed: &R,
    ) where
        R: Fn(&T) -> bool,
    {
        for p in &self.points {
            if !is_removed(p) {
                nbh.consider(distance(query, p), p);
            }
        }
        if self.children.is_empty() {
            return;
        }

        let n = self.children.len();
        let mut dists = vec![f64::NAN; n];
        let mut alive = vec![true; n];
        for i in 0..n {
            if !alive[i] {
                continue;
            }
            let child = &self.children[i];
            let d = distance(query, &child.pivot);
            dists[i] = d;
            if !is_removed(&child.pivot) {
                nbh.consider(d, &child.pivot);
            }
            let r = nbh.bound();
            for j in 0..n {
                if j != i && alive[j] && (d - r > child.max_range[j] || d + r < child.min_range[j]) {
                    alive[j] = false;
                }
            }
        }

        let mut order: Vec<usize> = (0..n).filter(|&i| alive[i]).collect();
        order.sort_by(|&a, &b| dists[a].total_cmp(&dists[b]));
        for i in order {
            let child = &self.children[i];
            let r = nbh.bound();
            let d = dists[i];
            if d - r <= child.max_radius && d + r >= child.min_radius {
                child.search(query, nbh, distance, is_removed);
            }
        }
    }

    fn collect<'a, R>(&'a self, out: &mut Vec<&'a T>, is_removed: &R)
    where
        R: Fn(&T) -> bool,
    {
        if !is_removed(&self.pivot) {
            out.push(&self.pivot);
        }
        out.extend(self.points.iter().filter(|p| !is_removed(p)));
        for child in &self.children {
            child.collect(out, is_removed);
        }
    }
}

fn argmin(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Candidate result ordered by distance only
struct Candidate<'a, T> {
    dist: OrderedFloat<f64>,
    item: &'a T,
}

impl<T> PartialEq for Candidate<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist
    }
}

impl<T> Eq for Candidate<'_, T> {}

impl<T> PartialOrd for Candidate<'_, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Candidate<'_, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist.cmp(&other.dist)
    }
}

/// Bounded max-heap of the best candidates seen so far
struct Neighbors<'a, T> {
    k: Option<usize>,
    radius: f64,
    heap: BinaryHeap<Candidate<'a, T>>,
}

impl<'a, T> Neighbors<'a, T> {
    fn k_nearest(k: usize) -> Self {
        Self {
            k: Some(k),
            radius: f64::INFINITY,
            heap: BinaryHeap::with_capacity(k + 1),
        }
    }

    fn within(radius: f64) -> Self {
        Self {
            k: None,
            radius,
            heap: BinaryHeap::new(),
        }
    }

    /// Distance a new candidate has to beat
    fn bound(&self) -> f64 {
        match (self.k, self.heap.peek()) {
            (Some(k), Some(worst)) if self.heap.len() >= k => worst.dist.0.min(self.radius),
            _ => self.radius,
        }
    }

    fn consider(&mut self, dist: f64, item: &'a T) {
        if dist > self.radius {
            return;
        }
        let candidate = Candidate { dist: OrderedFloat(dist), item };
        match self.k {
            Some(k) if self.heap.len() >= k => {
                if self.heap.peek().map_or(false, |worst| candidate < *worst) {
                    self.heap.pop();
                    self.heap.push(candidate);
                }
            }
            _ => self.heap.push(candidate),
        }
    }

    fn into_sorted(self) -> Vec<(f64, &'a T)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| (c.dist.0, c.item))
            .collect()
    }
}

/// Exact nearest-neighbor index over entries of type `T`
pub struct Gnat<T> {
    root: Option<Node<T>>,
    distance: DistanceFn<T>,
    config: NearestNeighborsConfig,
    /// Live entries (removed ones excluded)
    size: usize,
    rebuild_size: usize,
    removed: Vec<T>,
    rng: StdRng,
}

impl<T: Clone + PartialEq> Gnat<T> {
    pub fn new(distance: DistanceFn<T>, config: NearestNeighborsConfig) -> PlannerResult<Self> {
        config.validate()?;
        Ok(Self {
            root: None,
            distance,
            rebuild_size: config.initial_rebuild_size(),
            removed: Vec::with_capacity(config.removed_cache_size),
            rng: StdRng::seed_from_u64(config.seed),
            size: 0,
            config,
        })
    }

    pub fn config(&self) -> &NearestNeighborsConfig {
        &self.config
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of entries waiting in the removal cache
    pub fn removed_len(&self) -> usize {
        self.removed.len()
    }

    /// Insert `item`. Re-adding an entry that sits in the removal cache first
    /// rebuilds the tree so the stale copy is dropped.
    pub fn add(&mut self, item: T) {
        if self.is_removed(&item) {
            self.rebuild();
        }
        self.size += 1;
        let defer_split = !self.removed.is_empty() || self.size >= self.rebuild_size;
        if self.insert(item, defer_split) {
            if self.size >= self.rebuild_size {
                while self.rebuild_size <= self.size {
                    self.rebuild_size *= 2;
                }
            }
            self.rebuild();
        }
    }

    pub fn add_all<I: IntoIterator<Item = T>>(&mut self, items: I) {
        for item in items {
            self.add(item);
        }
    }

    /// Closest entry to `query`, or `None` when the index is empty
    pub fn nearest(&self, query: &T) -> Option<T> {
        self.search(query, Neighbors::k_nearest(1))
            .into_iter()
            .next()
            .map(|(_, item)| item.clone())
    }

    /// The `k` closest entries, closest first
    pub fn nearest_k(&self, query: &T, k: usize) -> Vec<T> {
        if k == 0 {
            return Vec::new();
        }
        self.search(query, Neighbors::k_nearest(k))
            .into_iter()
            .map(|(_, item)| item.clone())
            .collect()
    }

    /// All entries within `radius` of `query`, closest first
    pub fn nearest_r(&self, query: &T, radius: f64) -> Vec<T> {
        if !(radius >= 0.0) {
            return Vec::new();
        }
        self.search(query, Neighbors::within(radius))
            .into_iter()
            .map(|(_, item)| item.clone())
            .collect()
    }

    /// Whether `item` is a live entry
    pub fn contains(&self, item: &T) -> bool {
        !self.is_removed(item)
            && self
                .search(item, Neighbors::within(0.0))
                .iter()
                .any(|(_, found)| *found == item)
    }

    /// Retire `item` into the removal cache. Removing an entry that is not
    /// present leaves the index untouched and reports `IndexUnderflow`.
    pub fn remove(&mut self, item: &T) -> PlannerResult<()> {
        if self.size == 0 || !self.contains(item) {
            warn!("attempt to remove an entry that is not in the index");
            return Err(PlannerError::IndexUnderflow);
        }
        self.removed.push(item.clone());
        self.size -= 1;
        if self.removed.len() >= self.config.removed_cache_size {
            self.rebuild();
        }
        Ok(())
    }

    /// Every live entry, in no particular order
    pub fn list(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.size);
        if let Some(root) = &self.root {
            let removed = &self.removed;
            root.collect(&mut out, &|p: &T| removed.contains(p));
        }
        out.into_iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.root = None;
        self.removed.clear();
        self.size = 0;
        self.rebuild_size = self.config.initial_rebuild_size();
    }

    /// Rebuild the tree from its live entries, emptying the removal cache
    pub fn rebuild(&mut self) {
        let items = self.list();
        debug!(
            "rebuilding nearest-neighbor tree: {} entries, {} removed",
            items.len(),
            self.removed.len()
        );
        self.root = None;
        self.removed.clear();
        self.size = items.len();
        for item in items {
            self.insert(item, false);
        }
    }

    fn insert(&mut self, item: T, defer_split: bool) -> bool {
        if self.root.is_none() {
            let capacity = self.config.max_num_pts_per_leaf;
            self.root = Some(Node::new(item, self.config.degree, 0, capacity));
            return false;
        }
        let mut ctx = InsertContext {
            distance: self.distance.as_ref(),
            config: &self.config,
            rng: &mut self.rng,
            defer_split,
        };
        match self.root.as_mut() {
            Some(root) => root.add(item, &mut ctx),
            None => false,
        }
    }

    fn is_removed(&self, item: &T) -> bool {
        !self.removed.is_empty() && self.removed.contains(item)
    }

    fn search<'a>(&'a self, query: &T, mut nbh: Neighbors<'a, T>) -> Vec<(f64, &'a T)> {
        if let Some(root) = &self.root {
            let removed = &self.removed;
            let is_removed = |p: &T| !removed.is_empty() && removed.contains(p);
            let distance = self.distance.as_ref();
            if !is_removed(&root.pivot) {
                nbh.consider(distance(query, &root.pivot), &root.pivot);
            }
            root.search(query, &mut nbh, distance, &is_removed);
        }
        nbh.into_sorted()
    }

    /// Number of children of every internal node
    #[cfg(test)]
    fn internal_degrees(&self) -> Vec<usize> {
        fn walk<T>(node: &Node<T>, out: &mut Vec<usize>) {
            if !node.children.is_empty() {
                out.push(node.children.len());
            }
            for child in &node.children {
                walk(child, out);
            }
        }
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            walk(root, &mut out);
        }
        out
    }

    /// Largest leaf payload
    #[cfg(test)]
    fn max_leaf_len(&self) -> usize {
        fn walk<T>(node: &Node<T>) -> usize {
            node.children
                .iter()
                .map(walk)
                .max()
                .unwrap_or(0)
                .max(node.points.len())
        }
        self.root.as_ref().map_or(0, walk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[derive(Debug, Clone, Copy)]
    struct Pt {
        id: usize,
        x: f64,
        y: f64,
    }

    impl PartialEq for Pt {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }

    fn euclid() -> DistanceFn<Pt> {
        Box::new(|a: &Pt, b: &Pt| ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt())
    }

    fn random_points(n: usize, seed: u64) -> Vec<Pt> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|id| Pt { id, x: rng.gen_range(0.0..10.0), y: rng.gen_range(0.0..10.0) })
            .collect()
    }

    fn brute_force_sorted(points: &[Pt], query: &Pt) -> Vec<(f64, usize)> {
        let dist = euclid();
        let mut all: Vec<(f64, usize)> = points.iter().map(|p| (dist(query, p), p.id)).collect();
        all.sort_by(|a, b| a.0.total_cmp(&b.0));
        all
    }

    fn build(points: &[Pt]) -> Gnat<Pt> {
        let mut gnat = Gnat::new(euclid(), NearestNeighborsConfig::default()).unwrap();
        gnat.add_all(points.iter().copied());
        gnat
    }

    #[test]
    fn test_config_validation() {
        assert!(NearestNeighborsConfig::default().validate().is_ok());
        let bad = NearestNeighborsConfig { min_degree: 1, ..Default::default() };
        assert!(bad.validate().is_err());
        let bad = NearestNeighborsConfig { degree: 30, ..Default::default() };
        assert!(bad.validate().is_err());
        let bad = NearestNeighborsConfig { max_num_pts_per_leaf: 0, ..Default::default() };
        assert!(bad.validate().is_err());
        let bad = NearestNeighborsConfig { removed_cache_size: 0, ..Default::default() };
        assert!(Gnat::new(euclid(), bad).is_err());
    }

    #[test]
    fn test_empty_index_has_no_nearest() {
        let gnat = Gnat::new(euclid(), NearestNeighborsConfig::default()).unwrap();
        let q = Pt { id: 0, x: 1.0, y: 1.0 };
        assert!(gnat.nearest(&q).is_none());
        assert!(gnat.nearest_k(&q, 3).is_empty());
        assert!(gnat.is_empty());
    }

    #[test]
    fn test_nearest_matches_brute_force() {
        let points = random_points(1000, 1);
        let gnat = build(&points);
        assert_eq!(gnat.len(), 1000);

        let mut rng = StdRng::seed_from_u64(99);
        for q in 0..100 {
            let query = Pt { id: usize::MAX - q, x: rng.gen_range(-1.0..11.0), y: rng.gen_range(-1.0..11.0) };
            let expected = brute_force_sorted(&points, &query)[0].1;
            assert_eq!(gnat.nearest(&query).unwrap().id, expected);
        }
    }

    #[test]
    fn test_nearest_k_matches_brute_force() {
        let points = random_points(500, 2);
        let gnat = build(&points);
        let mut rng = StdRng::seed_from_u64(7);
        for q in 0..30 {
            let query = Pt { id: usize::MAX - q, x: rng.gen_range(0.0..10.0), y: rng.gen_range(0.0..10.0) };
            let expected: Vec<usize> = brute_force_sorted(&points, &query).iter().take(7).map(|e| e.1).collect();
            let found: Vec<usize> = gnat.nearest_k(&query, 7).iter().map(|p| p.id).collect();
            assert_eq!(found, expected);
        }
    }

    #[test]
    fn test_nearest_r_matches_brute_force() {
        let points = random_points(400, 3);
        let gnat = build(&points);
        let query = Pt { id: usize::MAX, x: 5.0, y: 5.0 };
        let expected: Vec<usize> = brute_force_sorted(&points, &query)
            .into_iter()
            .filter(|e| e.0 <= 1.5)
            .map(|e| e.1)
            .collect();
        let found: Vec<usize> = gnat.nearest_r(&query, 1.5).iter().map(|p| p.id).collect();
        assert!(!expected.is_empty());
        assert_eq!(found, expected);
    }

    #[test]
    fn test_degree_and_leaf_bounds() {
        let points = random_points(2000, 4);
        let gnat = build(&points);
        let config = gnat.config().clone();
        let degrees = gnat.internal_degrees();
        assert!(!degrees.is_empty());
        for d in degrees {
            assert!(d >= config.min_degree && d <= config.max_degree, "degree {}", d);
        }
        assert!(gnat.max_leaf_len() <= config.max_num_pts_per_leaf.max(config.max_degree));
    }

    #[test]
    fn test_every_entry_listed_once() {
        let points = random_points(300, 5);
        let gnat = build(&points);
        let mut ids: Vec<usize> = gnat.list().iter().map(|p| p.id).collect();
        ids.sort();
        assert_eq!(ids, (0..300).collect::<Vec<_>>());
    }

    #[test]
    fn test_remove_skips_entry_in_queries() {
        let points = random_points(200, 6);
        let mut gnat = build(&points);
        let query = Pt { id: usize::MAX, x: 2.0, y: 8.0 };
        let first = gnat.nearest(&query).unwrap();
        gnat.remove(&first).unwrap();
        assert_eq!(gnat.len(), 199);
        assert_eq!(gnat.removed_len(), 1);
        assert!(!gnat.contains(&first));

        let remaining: Vec<Pt> = points.iter().copied().filter(|p| p.id != first.id).collect();
        let expected = brute_force_sorted(&remaining, &query)[0].1;
        assert_eq!(gnat.nearest(&query).unwrap().id, expected);
    }

    #[test]
    fn test_remove_absent_is_underflow() {
        let points = random_points(50, 7);
        let mut gnat = build(&points);
        let ghost = Pt { id: 10_000, x: 1.0, y: 1.0 };
        assert!(matches!(gnat.remove(&ghost), Err(PlannerError::IndexUnderflow)));
        assert_eq!(gnat.len(), 50);

        gnat.remove(&points[3]).unwrap();
        assert!(matches!(gnat.remove(&points[3]), Err(PlannerError::IndexUnderflow)));
        assert_eq!(gnat.len(), 49);
    }

    #[test]
    fn test_full_cache_triggers_rebuild() {
        let points = random_points(300, 8);
        let config = NearestNeighborsConfig { removed_cache_size: 10, ..Default::default() };
        let mut gnat = Gnat::new(euclid(), config).unwrap();
        gnat.add_all(points.iter().copied());

        for p in &points[..10] {
            gnat.remove(p).unwrap();
        }
        assert_eq!(gnat.removed_len(), 0);
        assert_eq!(gnat.len(), 290);
        assert_eq!(gnat.list().len(), 290);

        let mut rng = StdRng::seed_from_u64(8);
        for q in 0..20 {
            let query = Pt { id: usize::MAX - q, x: rng.gen_range(0.0..10.0), y: rng.gen_range(0.0..10.0) };
            let expected = brute_force_sorted(&points[10..], &query)[0].1;
            assert_eq!(gnat.nearest(&query).unwrap().id, expected);
        }
    }

    #[test]
    fn test_adds_after_removal_stay_exact() {
        let points = random_points(600, 9);
        let mut gnat = build(&points[..300]);
        gnat.remove(&points[0]).unwrap();
        gnat.add_all(points[300..].iter().copied());
        assert_eq!(gnat.len(), 599);

        let mut rng = StdRng::seed_from_u64(10);
        for q in 0..50 {
            let query = Pt { id: usize::MAX - q, x: rng.gen_range(0.0..10.0), y: rng.gen_range(0.0..10.0) };
            let expected = brute_force_sorted(&points[1..], &query)[0].1;
            assert_eq!(gnat.nearest(&query).unwrap().id, expected);
        }
    }

    #[test]
    fn test_readd_after_remove() {
        let points = random_points(20, 12);
        let mut gnat = build(&points);
        gnat.remove(&points[5]).unwrap();
        assert!(!gnat.contains(&points[5]));

        gnat.add(points[5]);
        assert_eq!(gnat.len(), 20);
        assert_eq!(gnat.list().len(), gnat.len());
        assert!(gnat.contains(&points[5]));
        assert_eq!(gnat.nearest(&Pt { id: usize::MAX, ..points[5] }).unwrap().id, 5);

        gnat.rebuild();
        assert_eq!(gnat.list().len(), 20);
        assert!(gnat.contains(&points[5]));
    }

    #[test]
    fn test_rebuild_threshold_doubles_on_overflow() {
        let points = random_points(300, 13);
        let config = NearestNeighborsConfig { rebuild_size: Some(4), ..Default::default() };
        let mut gnat = Gnat::new(euclid(), config).unwrap();

        // the root leaf holds 17 points beside its pivot before it overflows
        for p in &points[..17] {
            gnat.add(*p);
            assert_eq!(gnat.rebuild_size, 4);
        }
        gnat.add(points[17]);
        assert_eq!(gnat.rebuild_size, 32);
        assert!(!gnat.internal_degrees().is_empty());

        let mut last = gnat.rebuild_size;
        for p in &points[18..] {
            gnat.add(*p);
            if gnat.rebuild_size != last {
                assert!(gnat.rebuild_size > gnat.len());
                assert_eq!(gnat.rebuild_size % last, 0);
                assert!((gnat.rebuild_size / last).is_power_of_two());
                last = gnat.rebuild_size;
            }
        }
        assert!(last > 32);
        assert_eq!(gnat.list().len(), 300);

        let query = Pt { id: usize::MAX, x: 3.0, y: 7.0 };
        assert_eq!(gnat.nearest(&query).unwrap().id, brute_force_sorted(&points, &query)[0].1);
    }

    #[test]
    fn test_duplicate_locations() {
        let mut gnat = Gnat::new(euclid(), NearestNeighborsConfig::default()).unwrap();
        for id in 0..100 {
            gnat.add(Pt { id, x: 1.0, y: 1.0 });
        }
        let found = gnat.nearest_r(&Pt { id: usize::MAX, x: 1.0, y: 1.0 }, 0.0);
        assert_eq!(found.len(), 100);
        gnat.remove(&Pt { id: 42, x: 1.0, y: 1.0 }).unwrap();
        assert_eq!(gnat.list().len(), 99);
    }

    #[test]
    fn test_clear() {
        let mut gnat = build(&random_points(100, 11));
        gnat.clear();
        assert!(gnat.is_empty());
        assert!(gnat.nearest(&Pt { id: 0, x: 0.0, y: 0.0 }).is_none());
        gnat.add(Pt { id: 1, x: 3.0, y: 3.0 });
        assert_eq!(gnat.nearest(&Pt { id: 0, x: 0.0, y: 0.0 }).unwrap().id, 1);
    }
}
