//! Motions and the arena that owns them
//!
//! Motions are addressed by `MotionId`, their position in creation order.
//! A parent always exists before its children, so parent ids are strictly
//! smaller than child ids and the parent relation cannot form a cycle.

use crate::common::{MotionId, PlannerError, PlannerResult, State};

/// A state of the growth tree plus the motion it was grown from
#[derive(Debug, Clone)]
pub struct Motion {
    pub state: State,
    pub parent: Option<MotionId>,
}

impl Motion {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Owns every motion of one planning attempt
#[derive(Debug, Clone, Default)]
pub struct MotionStore {
    motions: Vec<Motion>,
    roots: Vec<MotionId>,
}

impl MotionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parentless motion
    pub fn create_root(&mut self, state: State) -> MotionId {
        let id = MotionId(self.motions.len());
        self.motions.push(Motion { state, parent: None });
        self.roots.push(id);
        id
    }

    /// Add a motion grown from `parent`
    pub fn append(&mut self, parent: MotionId, state: State) -> PlannerResult<MotionId> {
        if parent.0 >= self.motions.len() {
            return Err(PlannerError::UnknownMotion(parent));
        }
        let id = MotionId(self.motions.len());
        self.motions.push(Motion {
            state,
            parent: Some(parent),
        });
        Ok(id)
    }

    pub fn get(&self, id: MotionId) -> Option<&Motion> {
        self.motions.get(id.0)
    }

    pub fn state(&self, id: MotionId) -> Option<&State> {
        self.get(id).map(|m| &m.state)
    }

    pub fn parent(&self, id: MotionId) -> Option<MotionId> {
        self.get(id).and_then(|m| m.parent)
    }

    pub fn contains(&self, id: MotionId) -> bool {
        id.0 < self.motions.len()
    }

    pub fn len(&self) -> usize {
        self.motions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motions.is_empty()
    }

    /// Root motions, in creation order
    pub fn roots(&self) -> &[MotionId] {
        &self.roots
    }

    pub fn iter(&self) -> impl Iterator<Item = (MotionId, &Motion)> + '_ {
        self.motions.iter().enumerate().map(|(i, m)| (MotionId(i), m))
    }

    /// Visit every motion in creation order
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(MotionId, &Motion),
    {
        for (id, motion) in self.iter() {
            visitor(id, motion);
        }
    }

    /// Motions from the root down to `id`, both included
    pub fn path_to_root(&self, id: MotionId) -> PlannerResult<Vec<MotionId>> {
        if !self.contains(id) {
            return Err(PlannerError::UnknownMotion(id));
        }
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        Ok(chain)
    }

    /// Number of parent hops from `id` to its root
    pub fn depth(&self, id: MotionId) -> Option<usize> {
        self.path_to_root(id).ok().map(|chain| chain.len() - 1)
    }

    pub fn clear(&mut self) {
        self.motions.clear();
        self.roots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(x: f64) -> State {
        State::from_vec(vec![x])
    }

    #[test]
    fn test_root_and_append() {
        let mut store = MotionStore::new();
        let root = store.create_root(s(0.0));
        let a = store.append(root, s(1.0)).unwrap();
        let b = store.append(a, s(2.0)).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.roots(), &[root]);
        assert!(store.get(root).unwrap().is_root());
        assert_eq!(store.parent(b), Some(a));
        assert_eq!(store.state(b).unwrap()[0], 2.0);
    }

    #[test]
    fn test_append_to_unknown_parent() {
        let mut store = MotionStore::new();
        assert!(matches!(
            store.append(MotionId(3), s(1.0)),
            Err(PlannerError::UnknownMotion(MotionId(3)))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_path_to_root() {
        let mut store = MotionStore::new();
        let root = store.create_root(s(0.0));
        let a = store.append(root, s(1.0)).unwrap();
        let _side = store.append(root, s(-1.0)).unwrap();
        let b = store.append(a, s(2.0)).unwrap();
        assert_eq!(store.path_to_root(b).unwrap(), vec![root, a, b]);
        assert_eq!(store.path_to_root(root).unwrap(), vec![root]);
        assert_eq!(store.depth(b), Some(2));
        assert!(store.path_to_root(MotionId(40)).is_err());
    }

    #[test]
    fn test_every_motion_reaches_a_root() {
        let mut store = MotionStore::new();
        let r0 = store.create_root(s(0.0));
        let r1 = store.create_root(s(10.0));
        for i in 0..50 {
            let parent = MotionId(i % store.len());
            store.append(parent, s(i as f64)).unwrap();
        }
        store.for_each(|id, _| {
            let chain = store.path_to_root(id).unwrap();
            assert!(chain.len() <= store.len());
            assert!(chain[0] == r0 || chain[0] == r1);
            // parents were created before their children
            assert!(chain.windows(2).all(|w| w[0] < w[1]));
        });
    }

    #[test]
    fn test_clear() {
        let mut store = MotionStore::new();
        let root = store.create_root(s(0.0));
        store.append(root, s(1.0)).unwrap();
        store.clear();
        assert!(store.is_empty());
        assert!(store.roots().is_empty());
    }
}
