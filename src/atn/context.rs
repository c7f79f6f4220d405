//! Persistent rule-invocation stacks for configurations.
//!
//! A prediction context records where the simulation returns to when a
//! rule finishes: a singly-linked stack of follow-state numbers with
//! structural sharing. Nodes are immutable behind `Arc` and hash-consed
//! through [`PredictionContextCache`] so equal stacks compare cheaply.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use super::StateId;

/// Return-state marker for the path that leaves the start rule.
pub const EMPTY_RETURN_STATE: StateId = StateId::MAX;

/// A node in the DAG of rule-return stacks.
///
/// `Empty` is the stack of the start rule; `Singleton` is the common
/// one-return case; `Array` holds the merged form when a state is
/// reached through different call stacks. Array return states are sorted
/// ascending, so an empty path, when present, is always last.
#[derive(Debug, PartialEq, Eq, Hash)]
pub enum PredictionContext {
    Empty,
    Singleton {
        parent: Arc<PredictionContext>,
        return_state: StateId,
    },
    Array {
        parents: Vec<Arc<PredictionContext>>,
        return_states: Vec<StateId>,
    },
}

impl PredictionContext {
    /// The interned empty context.
    pub fn empty() -> Arc<PredictionContext> {
        static EMPTY: OnceLock<Arc<PredictionContext>> = OnceLock::new();
        Arc::clone(EMPTY.get_or_init(|| Arc::new(PredictionContext::Empty)))
    }

    /// Number of return-state entries. The empty context reports 1
    /// (its single entry is [`EMPTY_RETURN_STATE`]).
    pub fn size(&self) -> usize {
        match self {
            PredictionContext::Empty | PredictionContext::Singleton { .. } => 1,
            PredictionContext::Array { return_states, .. } => return_states.len(),
        }
    }

    pub fn return_state(&self, index: usize) -> StateId {
        match self {
            PredictionContext::Empty => {
                assert_eq!(index, 0, "empty context has a single entry");
                EMPTY_RETURN_STATE
            }
            PredictionContext::Singleton { return_state, .. } => {
                assert_eq!(index, 0, "singleton context has a single entry");
                *return_state
            }
            PredictionContext::Array { return_states, .. } => return_states[index],
        }
    }

    pub fn parent(&self, index: usize) -> Option<&Arc<PredictionContext>> {
        match self {
            PredictionContext::Empty => None,
            PredictionContext::Singleton { parent, .. } => {
                assert_eq!(index, 0, "singleton context has a single entry");
                Some(parent)
            }
            PredictionContext::Array { parents, .. } => parents.get(index),
        }
    }

    /// Whether this is the empty stack (possibly in array form).
    pub fn is_empty(&self) -> bool {
        match self {
            PredictionContext::Empty => true,
            PredictionContext::Singleton { .. } => false,
            PredictionContext::Array { return_states, .. } => {
                return_states.as_slice() == [EMPTY_RETURN_STATE]
            }
        }
    }

    /// Whether some path through this context ends in the start rule.
    pub fn has_empty_path(&self) -> bool {
        self.return_state(self.size() - 1) == EMPTY_RETURN_STATE
    }

    /// The `(return_state, parent)` entries in ascending state order.
    fn entries(&self) -> Vec<(StateId, Arc<PredictionContext>)> {
        match self {
            PredictionContext::Empty => vec![(EMPTY_RETURN_STATE, PredictionContext::empty())],
            PredictionContext::Singleton {
                parent,
                return_state,
            } => vec![(*return_state, Arc::clone(parent))],
            PredictionContext::Array {
                parents,
                return_states,
            } => return_states
                .iter()
                .copied()
                .zip(parents.iter().cloned())
                .collect(),
        }
    }
}

/// Hash-consing cache for prediction contexts, owned by one simulator.
#[derive(Debug, Default)]
pub struct PredictionContextCache {
    interned: HashSet<Arc<PredictionContext>>,
}

impl PredictionContextCache {
    pub fn new() -> Self {
        PredictionContextCache::default()
    }

    fn intern(&mut self, ctx: PredictionContext) -> Arc<PredictionContext> {
        if let Some(existing) = self.interned.get(&ctx) {
            Arc::clone(existing)
        } else {
            let arc = Arc::new(ctx);
            self.interned.insert(Arc::clone(&arc));
            arc
        }
    }

    /// Push `return_state` onto `parent`.
    pub fn create(
        &mut self,
        parent: Arc<PredictionContext>,
        return_state: StateId,
    ) -> Arc<PredictionContext> {
        if return_state == EMPTY_RETURN_STATE && parent.is_empty() {
            return PredictionContext::empty();
        }
        self.intern(PredictionContext::Singleton {
            parent,
            return_state,
        })
    }

    /// Merge two stacks into the minimal context covering both paths.
    ///
    /// Entries are merged by return state; entries with equal return
    /// states merge their parents recursively. The result collapses back
    /// to a singleton (or the empty context) when only one entry remains.
    pub fn merge(
        &mut self,
        a: &Arc<PredictionContext>,
        b: &Arc<PredictionContext>,
    ) -> Arc<PredictionContext> {
        if Arc::ptr_eq(a, b) || a == b {
            return Arc::clone(a);
        }

        let left = a.entries();
        let right = b.entries();
        let mut merged: Vec<(StateId, Arc<PredictionContext>)> =
            Vec::with_capacity(left.len() + right.len());
        let (mut i, mut j) = (0, 0);
        while i < left.len() && j < right.len() {
            let (ls, lp) = &left[i];
            let (rs, rp) = &right[j];
            if ls == rs {
                let parent = if lp == rp {
                    Arc::clone(lp)
                } else {
                    self.merge(lp, rp)
                };
                merged.push((*ls, parent));
                i += 1;
                j += 1;
            } else if ls < rs {
                merged.push((*ls, Arc::clone(lp)));
                i += 1;
            } else {
                merged.push((*rs, Arc::clone(rp)));
                j += 1;
            }
        }
        merged.extend_from_slice(&left[i..]);
        merged.extend_from_slice(&right[j..]);

        if merged.len() == 1 {
            let (return_state, parent) = merged.pop().expect("one merged entry");
            return self.create(parent, return_state);
        }
        let (return_states, parents): (Vec<StateId>, Vec<Arc<PredictionContext>>) =
            merged.into_iter().unzip();
        self.intern(PredictionContext::Array {
            parents,
            return_states,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_singleton_shape() {
        let empty = PredictionContext::empty();
        assert!(empty.is_empty());
        assert!(empty.has_empty_path());
        assert_eq!(empty.size(), 1);
        assert_eq!(empty.return_state(0), EMPTY_RETURN_STATE);
        assert!(empty.parent(0).is_none());
    }

    #[test]
    fn test_create_interns() {
        let mut cache = PredictionContextCache::new();
        let a = cache.create(PredictionContext::empty(), 7);
        let b = cache.create(PredictionContext::empty(), 7);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.return_state(0), 7);
        assert!(!a.has_empty_path());
    }

    #[test]
    fn test_create_empty_return_collapses() {
        let mut cache = PredictionContextCache::new();
        let c = cache.create(PredictionContext::empty(), EMPTY_RETURN_STATE);
        assert!(Arc::ptr_eq(&c, &PredictionContext::empty()));
    }

    #[test]
    fn test_merge_distinct_singletons() {
        let mut cache = PredictionContextCache::new();
        let a = cache.create(PredictionContext::empty(), 3);
        let b = cache.create(PredictionContext::empty(), 9);
        let m = cache.merge(&a, &b);
        assert_eq!(m.size(), 2);
        assert_eq!(m.return_state(0), 3);
        assert_eq!(m.return_state(1), 9);
    }

    #[test]
    fn test_merge_with_empty_keeps_empty_path_last() {
        let mut cache = PredictionContextCache::new();
        let a = cache.create(PredictionContext::empty(), 3);
        let m = cache.merge(&a, &PredictionContext::empty());
        assert_eq!(m.size(), 2);
        assert_eq!(m.return_state(1), EMPTY_RETURN_STATE);
        assert!(m.has_empty_path());
        assert!(!m.is_empty());
    }

    #[test]
    fn test_merge_equal_is_identity() {
        let mut cache = PredictionContextCache::new();
        let a = cache.create(PredictionContext::empty(), 5);
        let b = cache.create(PredictionContext::empty(), 5);
        let m = cache.merge(&a, &b);
        assert!(Arc::ptr_eq(&m, &a));
    }

    #[test]
    fn test_merge_same_return_merges_parents() {
        let mut cache = PredictionContextCache::new();
        let pa = cache.create(PredictionContext::empty(), 1);
        let pb = cache.create(PredictionContext::empty(), 2);
        let a = cache.create(Arc::clone(&pa), 8);
        let b = cache.create(Arc::clone(&pb), 8);
        let m = cache.merge(&a, &b);
        assert_eq!(m.size(), 1);
        assert_eq!(m.return_state(0), 8);
        let parent = m.parent(0).expect("merged parent");
        assert_eq!(parent.size(), 2);
        assert_eq!(parent.return_state(0), 1);
        assert_eq!(parent.return_state(1), 2);
    }
}
