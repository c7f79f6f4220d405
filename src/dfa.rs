//! The per-mode DFA cache.
//!
//! DFA states are interned configuration sets: the first scan of an
//! input shape pays for ATN simulation, installs states and edges here,
//! and later scans walk the table. States live in a dense vector and are
//! addressed by id, with [`ERROR_STATE`] marking the memoized dead end.
//! Edges are only kept for the ASCII range `[MIN_DFA_EDGE, MAX_DFA_EDGE]`;
//! anything wider always re-enters the ATN, trading simulation time for
//! bounded tables.

use std::collections::HashMap;
use std::sync::Arc;

use crate::action::LexerActionExecutor;
use crate::atn::config::OrderedConfigSet;
use crate::token::TOKEN_INVALID_TYPE;

/// Identifier for a DFA state within one mode's DFA.
pub type DfaStateId = u32;

/// Sentinel id for the absorbing error state.
pub const ERROR_STATE: DfaStateId = DfaStateId::MAX;

/// Smallest code point that may carry a DFA edge.
pub const MIN_DFA_EDGE: i32 = 0;

/// Largest code point that may carry a DFA edge.
pub const MAX_DFA_EDGE: i32 = 127;

const EDGE_COUNT: usize = (MAX_DFA_EDGE - MIN_DFA_EDGE + 1) as usize;

/// One interned DFA state.
#[derive(Debug)]
pub struct DfaState {
    /// The frozen configuration set this state was interned from.
    pub configs: Arc<OrderedConfigSet>,
    /// Outgoing edges, allocated on first use. `Some(ERROR_STATE)`
    /// memoizes a dead end; `None` means not computed yet.
    edges: Option<Box<[Option<DfaStateId>; EDGE_COUNT]>>,
    pub is_accept: bool,
    /// Token type committed when this state accepts.
    pub prediction: i32,
    /// Deferred actions of the winning configuration.
    pub executor: Option<Arc<LexerActionExecutor>>,
}

impl DfaState {
    pub fn new(configs: Arc<OrderedConfigSet>) -> Self {
        DfaState {
            configs,
            edges: None,
            is_accept: false,
            prediction: TOKEN_INVALID_TYPE,
            executor: None,
        }
    }
}

/// The DFA of one lexer mode.
#[derive(Debug, Default)]
pub struct Dfa {
    /// Start state, absent until the mode has been matched once
    /// (and kept absent while its closure carries semantic context).
    pub s0: Option<DfaStateId>,
    states: Vec<DfaState>,
    intern: HashMap<Arc<OrderedConfigSet>, DfaStateId>,
}

impl Dfa {
    pub fn new() -> Self {
        Dfa::default()
    }

    /// Drop all states and edges, forcing re-materialization.
    pub fn clear(&mut self) {
        self.s0 = None;
        self.states.clear();
        self.intern.clear();
    }

    pub fn state(&self, id: DfaStateId) -> &DfaState {
        &self.states[id as usize]
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Look up the interned state for a configuration set.
    pub fn lookup(&self, configs: &OrderedConfigSet) -> Option<DfaStateId> {
        self.intern.get(configs).copied()
    }

    /// Intern a new state built from a frozen configuration set.
    /// The caller must have checked [`Dfa::lookup`] first.
    pub fn insert(&mut self, state: DfaState) -> DfaStateId {
        let id = self.states.len() as DfaStateId;
        assert!(id < ERROR_STATE, "DFA state table exhausted");
        self.intern.insert(Arc::clone(&state.configs), id);
        self.states.push(state);
        id
    }

    /// The edge from `from` on `symbol`, when `symbol` is in the edge
    /// range and the edge has been computed.
    pub fn edge(&self, from: DfaStateId, symbol: i32) -> Option<DfaStateId> {
        if !(MIN_DFA_EDGE..=MAX_DFA_EDGE).contains(&symbol) {
            return None;
        }
        self.states[from as usize]
            .edges
            .as_ref()
            .and_then(|edges| edges[(symbol - MIN_DFA_EDGE) as usize])
    }

    /// Install an edge. Symbols outside the edge range are ignored.
    pub fn set_edge(&mut self, from: DfaStateId, symbol: i32, to: DfaStateId) {
        if !(MIN_DFA_EDGE..=MAX_DFA_EDGE).contains(&symbol) {
            return;
        }
        let edges = self.states[from as usize]
            .edges
            .get_or_insert_with(|| Box::new([None; EDGE_COUNT]));
        edges[(symbol - MIN_DFA_EDGE) as usize] = Some(to);
    }
}
