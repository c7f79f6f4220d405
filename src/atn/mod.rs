//! The augmented transition network and its simulator.
//!
//! An ATN is the nondeterministic state graph compiled from a lexer
//! grammar: one start state per mode, one start/stop state pair per
//! rule, and tagged transitions between numbered states. The graph is
//! assembled once through [`AtnBuilder`] and immutable afterwards; the
//! simulator in [`simulator`] walks it and lazily materializes the
//! per-mode DFAs in [`crate::dfa`].

pub mod config;
pub mod context;
pub mod simulator;
pub mod transition;

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::action::LexerAction;
use crate::interval::IntervalSet;
use crate::stream::{MAX_CHAR, MIN_CHAR};
use context::{PredictionContext, EMPTY_RETURN_STATE};
use transition::Transition;

/// Identifier for an ATN state.
pub type StateId = u32;

/// What role a state plays in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Basic,
    /// Entry of a lexer rule.
    RuleStart,
    /// Exit of a lexer rule; reaching one means the rule matched.
    RuleStop,
    /// A branch point. `non_greedy` decisions prefer the shortest match:
    /// configurations that crossed one are deprioritized once their
    /// alternative has accepted.
    Decision { non_greedy: bool },
    /// Start state of a lexer mode; its outgoing transitions are the
    /// mode's alternatives in grammar order.
    TokensStart,
}

/// One numbered state: role, owning rule, and outgoing transitions.
#[derive(Debug, Clone)]
pub struct AtnState {
    pub kind: StateKind,
    pub rule_index: usize,
    pub transitions: Vec<Transition>,
    /// All outgoing transitions are epsilon-class; such states are not
    /// themselves recorded in configuration sets.
    pub epsilon_only: bool,
}

impl AtnState {
    pub fn is_rule_stop(&self) -> bool {
        matches!(self.kind, StateKind::RuleStop)
    }

    pub fn is_non_greedy_decision(&self) -> bool {
        matches!(self.kind, StateKind::Decision { non_greedy: true })
    }
}

/// The immutable ATN graph for one lexer grammar.
#[derive(Debug)]
pub struct Atn {
    states: Vec<AtnState>,
    mode_to_start_state: Vec<StateId>,
    rule_to_token_type: Vec<i32>,
    lexer_actions: Vec<LexerAction>,
}

impl Atn {
    pub fn state(&self, id: StateId) -> &AtnState {
        &self.states[id as usize]
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn mode_count(&self) -> usize {
        self.mode_to_start_state.len()
    }

    /// Start state of a mode.
    pub fn mode_start(&self, mode: usize) -> StateId {
        self.mode_to_start_state[mode]
    }

    /// Token type produced when `rule` matches.
    pub fn rule_to_token_type(&self, rule: usize) -> i32 {
        self.rule_to_token_type[rule]
    }

    pub fn lexer_action(&self, index: usize) -> &LexerAction {
        &self.lexer_actions[index]
    }

    /// Code points matchable from `state` given the call stack
    /// `context`, for error reporting. Follows rule invocations and
    /// rule-stop returns without consuming.
    pub fn expected_tokens(
        &self,
        state: StateId,
        context: &Arc<PredictionContext>,
    ) -> IntervalSet {
        let mut set = IntervalSet::new();
        let mut busy = HashSet::new();
        self.look(state, context, &mut set, &mut busy);
        set
    }

    fn look(
        &self,
        state: StateId,
        context: &Arc<PredictionContext>,
        set: &mut IntervalSet,
        busy: &mut HashSet<(StateId, u64)>,
    ) {
        if !busy.insert((state, structural_hash(context))) {
            return;
        }
        let s = self.state(state);
        if s.is_rule_stop() {
            for i in 0..context.size() {
                let return_state = context.return_state(i);
                if return_state != EMPTY_RETURN_STATE {
                    let parent = context
                        .parent(i)
                        .cloned()
                        .unwrap_or_else(PredictionContext::empty);
                    self.look(return_state, &parent, set, busy);
                }
            }
            return;
        }
        for t in &s.transitions {
            match t {
                Transition::Atom { code_point, .. } => set.add_one(*code_point),
                Transition::Range { lo, hi, .. } => set.add(*lo, *hi),
                Transition::Set { set: labels, .. } => set.add_set(labels),
                Transition::NotSet { set: labels, .. } => {
                    set.add_set(&labels.complement(&IntervalSet::of(MIN_CHAR, MAX_CHAR)));
                }
                Transition::Rule {
                    target,
                    follow_state,
                    ..
                } => {
                    let sub = Arc::new(PredictionContext::Singleton {
                        parent: Arc::clone(context),
                        return_state: *follow_state,
                    });
                    self.look(*target, &sub, set, busy);
                }
                Transition::Epsilon { target }
                | Transition::Predicate { target, .. }
                | Transition::Action { target, .. }
                | Transition::Precedence { target, .. } => {
                    self.look(*target, context, set, busy);
                }
            }
        }
    }
}

fn structural_hash(context: &PredictionContext) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    context.hash(&mut hasher);
    hasher.finish()
}

/// Assembles an [`Atn`].
///
/// Usage mirrors graph construction by a grammar compiler: declare
/// rules, allocate states, wire transitions, declare mode start states,
/// then `build()`. The builder checks the wiring it can check; the
/// result is immutable.
#[derive(Debug, Default)]
pub struct AtnBuilder {
    states: Vec<AtnState>,
    mode_to_start_state: Vec<StateId>,
    rule_to_token_type: Vec<i32>,
    lexer_actions: Vec<LexerAction>,
}

impl AtnBuilder {
    pub fn new() -> Self {
        AtnBuilder::default()
    }

    /// Declare a rule producing `token_type`; returns the rule index.
    pub fn add_rule(&mut self, token_type: i32) -> usize {
        self.rule_to_token_type.push(token_type);
        self.rule_to_token_type.len() - 1
    }

    /// Allocate a state owned by `rule_index`.
    pub fn add_state(&mut self, kind: StateKind, rule_index: usize) -> StateId {
        let id = self.states.len() as StateId;
        self.states.push(AtnState {
            kind,
            rule_index,
            transitions: Vec::new(),
            epsilon_only: false,
        });
        id
    }

    pub fn add_transition(&mut self, from: StateId, transition: Transition) {
        self.states[from as usize].transitions.push(transition);
    }

    /// Declare the start state of the next mode; returns the mode index.
    pub fn add_mode(&mut self, start_state: StateId) -> usize {
        assert!(
            matches!(
                self.states[start_state as usize].kind,
                StateKind::TokensStart
            ),
            "mode start must be a TokensStart state"
        );
        self.mode_to_start_state.push(start_state);
        self.mode_to_start_state.len() - 1
    }

    /// Register a deferred lexer action; returns its action index.
    pub fn add_lexer_action(&mut self, action: LexerAction) -> usize {
        self.lexer_actions.push(action);
        self.lexer_actions.len() - 1
    }

    pub fn build(mut self) -> Arc<Atn> {
        let state_count = self.states.len();
        for state in &mut self.states {
            for t in &state.transitions {
                assert!(
                    (t.target() as usize) < state_count,
                    "transition target {} out of range",
                    t.target()
                );
            }
            state.epsilon_only =
                !state.transitions.is_empty() && state.transitions.iter().all(Transition::is_epsilon);
        }
        assert!(
            !self.mode_to_start_state.is_empty(),
            "an ATN needs at least one mode"
        );
        Arc::new(Atn {
            states: self.states,
            mode_to_start_state: self.mode_to_start_state,
            rule_to_token_type: self.rule_to_token_type,
            lexer_actions: self.lexer_actions,
        })
    }
}
