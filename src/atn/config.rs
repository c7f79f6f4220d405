//! Configurations and the ordered configuration set.
//!
//! A configuration is one point of the nondeterministic simulation. The
//! set container preserves insertion order (reach is deterministic) and
//! dedups by full structural equality; once a set is promoted into the
//! DFA it is frozen and its hash is fixed.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::context::PredictionContext;
use super::StateId;
use crate::action::LexerActionExecutor;

/// `(state, alt, context, executor, passed-non-greedy)`.
///
/// Equality and hashing use all five fields; the executor and the
/// non-greedy flag participate so the DFA cache stays correct when
/// actions are present.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LexerAtnConfig {
    pub state: StateId,
    pub alt: u32,
    pub context: Arc<PredictionContext>,
    pub executor: Option<Arc<LexerActionExecutor>>,
    pub passed_non_greedy: bool,
}

impl LexerAtnConfig {
    /// Configuration at the start of an alternative.
    pub fn initial(state: StateId, alt: u32, context: Arc<PredictionContext>) -> Self {
        LexerAtnConfig {
            state,
            alt,
            context,
            executor: None,
            passed_non_greedy: false,
        }
    }

    /// Step to `target`, keeping context and executor.
    /// `target_non_greedy` marks whether the target is a non-greedy
    /// decision state; the flag is sticky once set.
    pub fn transit(&self, target: StateId, target_non_greedy: bool) -> Self {
        LexerAtnConfig {
            state: target,
            alt: self.alt,
            context: Arc::clone(&self.context),
            executor: self.executor.clone(),
            passed_non_greedy: self.passed_non_greedy || target_non_greedy,
        }
    }

    /// Step to `target` with a replacement call stack.
    pub fn transit_with_context(
        &self,
        target: StateId,
        target_non_greedy: bool,
        context: Arc<PredictionContext>,
    ) -> Self {
        LexerAtnConfig {
            state: target,
            alt: self.alt,
            context,
            executor: self.executor.clone(),
            passed_non_greedy: self.passed_non_greedy || target_non_greedy,
        }
    }

    /// Step to `target` with a replacement executor.
    pub fn transit_with_executor(
        &self,
        target: StateId,
        target_non_greedy: bool,
        executor: Option<Arc<LexerActionExecutor>>,
    ) -> Self {
        LexerAtnConfig {
            state: target,
            alt: self.alt,
            context: Arc::clone(&self.context),
            executor,
            passed_non_greedy: self.passed_non_greedy || target_non_greedy,
        }
    }
}

/// Insertion-ordered, deduplicated set of configurations.
#[derive(Debug, Clone, Default)]
pub struct OrderedConfigSet {
    items: Vec<LexerAtnConfig>,
    index: HashSet<LexerAtnConfig>,
    /// Set when reach traversed a predicate transition; cleared by the
    /// DFA-edge machinery before the set is frozen.
    pub has_semantic_context: bool,
    readonly: bool,
    frozen_hash: Option<u64>,
}

impl OrderedConfigSet {
    pub fn new() -> Self {
        OrderedConfigSet::default()
    }

    /// Add a configuration unless an equal one is already present.
    /// Returns whether the set grew.
    pub fn add(&mut self, config: LexerAtnConfig) -> bool {
        assert!(!self.readonly, "cannot add to a frozen config set");
        if self.index.insert(config.clone()) {
            self.items.push(config);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LexerAtnConfig> {
        self.items.iter()
    }

    pub fn configs(&self) -> &[LexerAtnConfig] {
        &self.items
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Freeze the set and fix its hash. Idempotent.
    pub fn freeze(&mut self) {
        if self.readonly {
            return;
        }
        self.readonly = true;
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.items.hash(&mut hasher);
        self.frozen_hash = Some(hasher.finish());
    }
}

/// Equality is over the ordered configurations only; bookkeeping flags
/// do not participate, so a thawed and a frozen copy of the same set
/// intern to the same DFA state.
impl PartialEq for OrderedConfigSet {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Eq for OrderedConfigSet {}

impl Hash for OrderedConfigSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.frozen_hash {
            Some(h) => h.hash(state),
            None => {
                let mut hasher = std::collections::hash_map::DefaultHasher::new();
                self.items.hash(&mut hasher);
                hasher.finish().hash(state);
            }
        }
    }
}
