//! The lexer ATN simulator.
//!
//! `match_token` drives one token recognition:
//! 1. Use the mode's DFA start state if it exists, otherwise compute it
//!    by closuring the mode's alternatives (`match_atn`).
//! 2. Walk DFA edges while they exist; compute missing targets by
//!    reaching the current configuration set on the lookahead symbol and
//!    interning the result (`exec_atn`).
//! 3. Snapshot every accept state passed; on dead end, rewind to the
//!    latest snapshot and replay its deferred actions (`fail_or_accept`).
//!
//! Closure over predicate transitions marks the configuration set, which
//! suppresses static DFA edges so predicates are re-evaluated on every
//! scan. Edges are only installed for symbols in
//! `[MIN_DFA_EDGE, MAX_DFA_EDGE]`.

use std::sync::Arc;

use tracing::{debug, trace};

use super::config::{LexerAtnConfig, OrderedConfigSet};
use super::context::{PredictionContext, PredictionContextCache, EMPTY_RETURN_STATE};
use super::transition::Transition;
use super::{Atn, StateId};
use crate::action::LexerActionExecutor;
use crate::dfa::{Dfa, DfaState, DfaStateId, ERROR_STATE};
use crate::error::LexerNoViableAlt;
use crate::interval::Interval;
use crate::lexer::{LexerCallbacks, LexerState};
use crate::stream::{CharStream, EOF, MAX_CHAR, MIN_CHAR};
use crate::token::TOKEN_EOF;

/// Snapshot of the latest accept state passed during one `match_token`.
#[derive(Debug, Clone, Copy, Default)]
struct SimState {
    index: usize,
    line: u32,
    char_pos: u32,
    dfa_state: Option<DfaStateId>,
}

/// Everything a single match borrows from the driver.
struct MatchCtx<'a> {
    input: &'a mut dyn CharStream,
    state: &'a mut LexerState,
    callbacks: Option<&'a mut dyn LexerCallbacks>,
}

/// The simulator: immutable ATN, per-mode DFAs, and the authoritative
/// line/column position of the scan.
#[derive(Debug)]
pub struct LexerAtnSimulator {
    atn: Arc<Atn>,
    dfas: Vec<Dfa>,
    /// 1-based line of the current position.
    pub line: u32,
    /// 0-based column of the current position.
    pub char_position_in_line: u32,
    mode: usize,
    start_index: usize,
    prev_accept: SimState,
    context_cache: PredictionContextCache,
}

impl LexerAtnSimulator {
    pub fn new(atn: Arc<Atn>) -> Self {
        let dfas = (0..atn.mode_count()).map(|_| Dfa::new()).collect();
        LexerAtnSimulator {
            atn,
            dfas,
            line: 1,
            char_position_in_line: 0,
            mode: 0,
            start_index: 0,
            prev_accept: SimState::default(),
            context_cache: PredictionContextCache::new(),
        }
    }

    pub fn atn(&self) -> &Arc<Atn> {
        &self.atn
    }

    /// The DFA materialized so far for a mode.
    pub fn dfa(&self, mode: usize) -> &Dfa {
        &self.dfas[mode]
    }

    /// Drop every per-mode DFA, forcing re-materialization.
    pub fn clear_dfa(&mut self) {
        for dfa in &mut self.dfas {
            dfa.clear();
        }
    }

    /// Reset the authoritative position (new input).
    pub fn reset_position(&mut self) {
        self.line = 1;
        self.char_position_in_line = 0;
    }

    /// Match one token in `state.mode` starting at the current input
    /// position. On success the input rests one past the matched text
    /// and the winning rule's actions have run exactly once. On failure
    /// the input rests where the matcher gave up.
    pub fn match_token(
        &mut self,
        input: &mut dyn CharStream,
        state: &mut LexerState,
        callbacks: Option<&mut dyn LexerCallbacks>,
    ) -> Result<i32, LexerNoViableAlt> {
        self.mode = state.mode;
        let marker = input.mark();
        self.start_index = input.index();
        self.prev_accept = SimState::default();
        let mut ctx = MatchCtx {
            input,
            state,
            callbacks,
        };
        let result = match self.dfas[self.mode].s0 {
            Some(s0) => self.exec_atn(&mut ctx, s0),
            None => self.match_atn(&mut ctx),
        };
        ctx.input.release(marker);
        result
    }

    /// Advance the input, tracking line and column.
    pub fn consume(&mut self, input: &mut dyn CharStream) {
        let cur = input.la(1);
        if cur == '\n' as i32 {
            self.line += 1;
            self.char_position_in_line = 0;
        } else {
            self.char_position_in_line += 1;
        }
        input.consume();
    }

    /// First use of a mode: compute and intern its DFA start state, then
    /// simulate from there.
    fn match_atn(&mut self, ctx: &mut MatchCtx<'_>) -> Result<i32, LexerNoViableAlt> {
        let mode_start = self.atn.mode_start(self.mode);
        debug!(mode = self.mode, "no DFA start state, simulating ATN");
        let mut s0_configs = self.compute_start_state(ctx, mode_start);
        // A predicate in the start closure makes s0 input-dependent; the
        // state is still interned but never installed as the mode's s0.
        let suppress_edge = s0_configs.has_semantic_context;
        s0_configs.has_semantic_context = false;
        let next = self.add_dfa_state(s0_configs);
        if !suppress_edge {
            self.dfas[self.mode].s0 = Some(next);
        }
        self.exec_atn(ctx, next)
    }

    /// The mode's alternatives are the outgoing transitions of its start
    /// state, numbered from 1 in grammar order.
    fn compute_start_state(&mut self, ctx: &mut MatchCtx<'_>, mode_start: StateId) -> OrderedConfigSet {
        let atn = Arc::clone(&self.atn);
        let mut configs = OrderedConfigSet::new();
        for (i, t) in atn.state(mode_start).transitions.iter().enumerate() {
            let config =
                LexerAtnConfig::initial(t.target(), (i + 1) as u32, PredictionContext::empty());
            self.closure(ctx, config, &mut configs, false, false, false);
        }
        configs
    }

    fn exec_atn<'a>(&mut self, ctx: &'a mut MatchCtx<'a>, ds0: DfaStateId) -> Result<i32, LexerNoViableAlt> {
        let mut s = ds0;
        let mut t = ctx.input.la(1);
        loop {
            // Accept states are snapshotted before stepping so that
            // zero-length accepts at the start state are not lost.
            if self.dfas[self.mode].state(s).is_accept {
                self.capture(s, ctx.input.index());
            }
            let target = match self.dfas[self.mode].edge(s, t) {
                Some(target) => target,
                None => self.compute_target(ctx, s, t),
            };
            if target == ERROR_STATE {
                break;
            }
            // Consume before capturing, so the snapshot's line/column
            // reflect the position after the accepted character.
            if t != EOF {
                self.consume(&mut *ctx.input);
            }
            if self.dfas[self.mode].state(target).is_accept {
                self.capture(target, ctx.input.index());
                if t == EOF {
                    break;
                }
            }
            t = ctx.input.la(1);
            s = target;
        }
        self.fail_or_accept(ctx, s, t)
    }

    fn capture(&mut self, dfa_state: DfaStateId, index: usize) {
        self.prev_accept = SimState {
            index,
            line: self.line,
            char_pos: self.char_position_in_line,
            dfa_state: Some(dfa_state),
        };
    }

    /// Reach the state's configurations on `t` and intern the result,
    /// memoizing dead ends with an error edge.
    fn compute_target(&mut self, ctx: &mut MatchCtx<'_>, s: DfaStateId, t: i32) -> DfaStateId {
        let closure_configs = Arc::clone(&self.dfas[self.mode].state(s).configs);
        let mut reach = OrderedConfigSet::new();
        self.reach(ctx, &closure_configs, &mut reach, t);
        if reach.is_empty() {
            if !reach.has_semantic_context {
                trace!(symbol = t, "memoizing dead end");
                self.dfas[self.mode].set_edge(s, t, ERROR_STATE);
            }
            return ERROR_STATE;
        }
        self.add_dfa_edge(s, t, reach)
    }

    /// All configurations reachable by consuming exactly `t`.
    ///
    /// Once an alternative has reached an accept state, its remaining
    /// configurations that crossed a non-greedy decision are skipped:
    /// the shortest match for that alternative already won.
    fn reach(
        &mut self,
        ctx: &mut MatchCtx<'_>,
        closure_configs: &OrderedConfigSet,
        reach: &mut OrderedConfigSet,
        t: i32,
    ) {
        let atn = Arc::clone(&self.atn);
        let mut skip_alt = None;
        for c in closure_configs.iter() {
            let current_alt_accepted = Some(c.alt) == skip_alt;
            if current_alt_accepted && c.passed_non_greedy {
                continue;
            }
            for trans in &atn.state(c.state).transitions {
                if !trans.matches(t, MIN_CHAR, MAX_CHAR) {
                    continue;
                }
                // Bind position-dependent actions to the offset of the
                // character being consumed, relative to the token start.
                let executor = c
                    .executor
                    .as_ref()
                    .map(|e| e.fix_offset_before_match(ctx.input.index() - self.start_index));
                let target = trans.target();
                let config = c.transit_with_executor(
                    target,
                    atn.state(target).is_non_greedy_decision(),
                    executor,
                );
                if self.closure(ctx, config, reach, current_alt_accepted, true, t == EOF) {
                    skip_alt = Some(c.alt);
                    break;
                }
            }
        }
    }

    /// Epsilon-closure of `config` into `configs`. Returns whether an
    /// accept (rule stop with an empty path) was reached for this alt.
    fn closure(
        &mut self,
        ctx: &mut MatchCtx<'_>,
        config: LexerAtnConfig,
        configs: &mut OrderedConfigSet,
        mut current_alt_accepted: bool,
        speculative: bool,
        treat_eof_as_epsilon: bool,
    ) -> bool {
        let atn = Arc::clone(&self.atn);
        let state = atn.state(config.state);
        if state.is_rule_stop() {
            trace!(state = config.state, alt = config.alt, "closure reached rule stop");
            if config.context.is_empty() {
                configs.add(config);
                return true;
            }
            if config.context.has_empty_path() {
                configs.add(config.transit_with_context(
                    config.state,
                    false,
                    PredictionContext::empty(),
                ));
                current_alt_accepted = true;
            }
            let context = Arc::clone(&config.context);
            for i in 0..context.size() {
                let return_state = context.return_state(i);
                if return_state != EMPTY_RETURN_STATE {
                    let parent = context
                        .parent(i)
                        .cloned()
                        .unwrap_or_else(PredictionContext::empty);
                    let c = config.transit_with_context(return_state, false, parent);
                    current_alt_accepted = self.closure(
                        ctx,
                        c,
                        configs,
                        current_alt_accepted,
                        speculative,
                        treat_eof_as_epsilon,
                    );
                }
            }
            return current_alt_accepted;
        }

        if !state.epsilon_only && (!current_alt_accepted || !config.passed_non_greedy) {
            configs.add(config.clone());
        }

        for trans in &state.transitions {
            if let Some(c) =
                self.epsilon_target(ctx, &config, trans, configs, speculative, treat_eof_as_epsilon)
            {
                current_alt_accepted = self.closure(
                    ctx,
                    c,
                    configs,
                    current_alt_accepted,
                    speculative,
                    treat_eof_as_epsilon,
                );
            }
        }
        current_alt_accepted
    }

    /// The configuration produced by traversing `trans` without
    /// consuming input, or `None` when the transition does not apply.
    fn epsilon_target(
        &mut self,
        ctx: &mut MatchCtx<'_>,
        config: &LexerAtnConfig,
        trans: &Transition,
        configs: &mut OrderedConfigSet,
        speculative: bool,
        treat_eof_as_epsilon: bool,
    ) -> Option<LexerAtnConfig> {
        let atn = Arc::clone(&self.atn);
        let target = trans.target();
        let target_non_greedy = atn.state(target).is_non_greedy_decision();
        match trans {
            Transition::Rule { follow_state, .. } => {
                let new_context = self
                    .context_cache
                    .create(Arc::clone(&config.context), *follow_state);
                Some(config.transit_with_context(target, target_non_greedy, new_context))
            }
            Transition::Precedence { .. } => {
                panic!("precedence predicates are not supported in lexers")
            }
            Transition::Predicate {
                rule_index,
                pred_index,
                ..
            } => {
                // The set becomes input-dependent whether or not the
                // predicate passes; the DFA must not cache across it.
                configs.has_semantic_context = true;
                if self.evaluate_predicate(ctx, *rule_index, *pred_index, speculative) {
                    Some(config.transit(target, target_non_greedy))
                } else {
                    None
                }
            }
            Transition::Action { action_index, .. } => {
                if config.context.is_empty() || config.context.has_empty_path() {
                    // Start-rule action: record it for deferred replay.
                    let executor = LexerActionExecutor::append(
                        config.executor.as_ref(),
                        atn.lexer_action(*action_index).clone(),
                    );
                    Some(config.transit_with_executor(target, target_non_greedy, Some(executor)))
                } else {
                    // Actions inside referenced rules are dropped; the
                    // config is carried through unchanged.
                    Some(config.transit(target, target_non_greedy))
                }
            }
            Transition::Epsilon { .. } => Some(config.transit(target, target_non_greedy)),
            Transition::Atom { .. } | Transition::Range { .. } | Transition::Set { .. } => {
                if treat_eof_as_epsilon && trans.matches(EOF, MIN_CHAR, MAX_CHAR) {
                    Some(config.transit(target, target_non_greedy))
                } else {
                    None
                }
            }
            Transition::NotSet { .. } => None,
        }
    }

    /// Evaluate a user predicate. Speculative evaluation temporarily
    /// consumes the pending character so position-sensitive predicates
    /// observe the state the lexer will have at accept time, then
    /// restores index, line, and column exactly.
    fn evaluate_predicate(
        &mut self,
        ctx: &mut MatchCtx<'_>,
        rule_index: usize,
        pred_index: usize,
        speculative: bool,
    ) -> bool {
        if ctx.callbacks.is_none() {
            return true;
        }
        if !speculative {
            let callbacks = ctx.callbacks.as_deref_mut().expect("checked above");
            return callbacks.sempred(&mut *ctx.input, rule_index, pred_index);
        }
        let saved_char_pos = self.char_position_in_line;
        let saved_line = self.line;
        let index = ctx.input.index();
        let marker = ctx.input.mark();
        self.consume(&mut *ctx.input);
        let callbacks = ctx.callbacks.as_deref_mut().expect("checked above");
        let result = callbacks.sempred(&mut *ctx.input, rule_index, pred_index);
        self.char_position_in_line = saved_char_pos;
        self.line = saved_line;
        ctx.input.seek(index);
        ctx.input.release(marker);
        result
    }

    /// Intern `reach` and connect it, unless the set carries semantic
    /// context, in which case the target is returned without a static
    /// edge and the flag is cleared before interning.
    fn add_dfa_edge(&mut self, from: DfaStateId, t: i32, mut reach: OrderedConfigSet) -> DfaStateId {
        let suppress_edge = reach.has_semantic_context;
        reach.has_semantic_context = false;
        let to = self.add_dfa_state(reach);
        if !suppress_edge {
            self.dfas[self.mode].set_edge(from, t, to);
        }
        to
    }

    /// Intern a configuration set as a DFA state. The first rule-stop
    /// configuration in insertion order (lowest alternative) decides the
    /// accept metadata.
    fn add_dfa_state(&mut self, configs: OrderedConfigSet) -> DfaStateId {
        assert!(
            !configs.has_semantic_context,
            "semantic context must be cleared before interning"
        );
        if let Some(existing) = self.dfas[self.mode].lookup(&configs) {
            return existing;
        }
        let atn = Arc::clone(&self.atn);
        let mut configs = configs;
        configs.freeze();
        let configs = Arc::new(configs);
        let mut state = DfaState::new(Arc::clone(&configs));
        if let Some(stop_config) = configs
            .iter()
            .find(|c| atn.state(c.state).is_rule_stop())
        {
            state.is_accept = true;
            state.executor = stop_config.executor.clone();
            state.prediction =
                atn.rule_to_token_type(atn.state(stop_config.state).rule_index);
        }
        let id = self.dfas[self.mode].insert(state);
        debug!(
            mode = self.mode,
            dfa_state = id,
            configs = configs.len(),
            "interned DFA state"
        );
        id
    }

    /// Commit the latest accept snapshot, or report failure.
    fn fail_or_accept<'a>(
        &mut self,
        ctx: &'a mut MatchCtx<'a>,
        s: DfaStateId,
        t: i32,
    ) -> Result<i32, LexerNoViableAlt> {
        if let Some(dfa_state) = self.prev_accept.dfa_state {
            let SimState {
                index,
                line,
                char_pos,
                ..
            } = self.prev_accept;
            let (executor, prediction) = {
                let state = self.dfas[self.mode].state(dfa_state);
                (state.executor.clone(), state.prediction)
            };
            self.accept(ctx, executor, index, line, char_pos);
            Ok(prediction)
        } else if t == EOF && ctx.input.index() == self.start_index {
            Ok(TOKEN_EOF)
        } else {
            let offending_text = ctx
                .input
                .text(Interval::of(self.start_index as i32, self.start_index as i32));
            Err(LexerNoViableAlt {
                start_index: self.start_index,
                offending_text,
                dead_end_configs: (*self.dfas[self.mode].state(s).configs).clone(),
            })
        }
    }

    /// Rewind to the accept point, restore its position snapshot, and
    /// replay the winning rule's deferred actions.
    fn accept<'a>(
        &mut self,
        ctx: &'a mut MatchCtx<'a>,
        executor: Option<Arc<LexerActionExecutor>>,
        index: usize,
        line: u32,
        char_pos: u32,
    ) {
        trace!(index, line, char_pos, "committing accept");
        ctx.input.seek(index);
        self.line = line;
        self.char_position_in_line = char_pos;
        if let Some(executor) = executor {
            executor.execute(
                &mut *ctx.state,
                ctx.callbacks.as_deref_mut(),
                &mut *ctx.input,
                self.start_index,
            );
        }
    }
}
