//! Grammar-construction helpers shared by the scenario tests.
//!
//! Builds lexer ATNs the way a grammar compiler would, from a small
//! rule description: a sequence of elements, an optional leading
//! predicate, and an optional trailing action.

use std::sync::Arc;

use crate::action::LexerAction;
use crate::atn::transition::Transition;
use crate::atn::{Atn, AtnBuilder, StateId, StateKind};
use crate::interval::IntervalSet;
use crate::stream::{MAX_CHAR, MIN_CHAR};

/// One element of a rule body.
pub enum Elem {
    /// A literal code point.
    Ch(char),
    /// A literal string.
    Str(&'static str),
    /// One code point from a set.
    OneOf(IntervalSet),
    /// One or more code points from a set (greedy).
    Plus(IntervalSet),
    /// `.*?`: any code points, as few as possible.
    AnyNonGreedy,
    /// A mid-rule action transition.
    Act(LexerAction),
}

/// A lexer rule: produced token type, body, optional gating predicate
/// (by predicate index), optional trailing action.
pub struct RuleSpec {
    pub token_type: i32,
    pub elems: Vec<Elem>,
    pub predicate: Option<usize>,
    pub action: Option<LexerAction>,
}

pub fn rule(token_type: i32, elems: Vec<Elem>) -> RuleSpec {
    RuleSpec {
        token_type,
        elems,
        predicate: None,
        action: None,
    }
}

impl RuleSpec {
    pub fn with_action(mut self, action: LexerAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_predicate(mut self, pred_index: usize) -> Self {
        self.predicate = Some(pred_index);
        self
    }
}

/// Character set from inclusive ranges.
pub fn set_of(ranges: &[(char, char)]) -> IntervalSet {
    let mut set = IntervalSet::new();
    for &(lo, hi) in ranges {
        set.add(lo as i32, hi as i32);
    }
    set
}

pub fn digits() -> IntervalSet {
    set_of(&[('0', '9')])
}

pub fn lower_letters() -> IntervalSet {
    set_of(&[('a', 'z')])
}

pub fn whitespace() -> IntervalSet {
    let mut set = IntervalSet::new();
    set.add_one(' ' as i32);
    set.add_one('\t' as i32);
    set.add_one('\n' as i32);
    set
}

/// Build an ATN with one entry per mode; rule order within a mode is
/// alternative priority order.
pub fn build_atn(modes: &[Vec<RuleSpec>]) -> Arc<Atn> {
    let mut b = AtnBuilder::new();
    for mode_rules in modes {
        let tokens_start = b.add_state(StateKind::TokensStart, 0);
        b.add_mode(tokens_start);
        for spec in mode_rules {
            let rule_index = b.add_rule(spec.token_type);
            let start = b.add_state(StateKind::RuleStart, rule_index);
            b.add_transition(tokens_start, Transition::Epsilon { target: start });

            let mut cur = start;
            if let Some(pred_index) = spec.predicate {
                let next = b.add_state(StateKind::Basic, rule_index);
                b.add_transition(
                    cur,
                    Transition::Predicate {
                        target: next,
                        rule_index,
                        pred_index,
                        is_ctx_dependent: false,
                    },
                );
                cur = next;
            }
            for elem in &spec.elems {
                cur = append_elem(&mut b, rule_index, cur, elem);
            }
            if let Some(action) = &spec.action {
                let action_index = b.add_lexer_action(action.clone());
                let next = b.add_state(StateKind::Basic, rule_index);
                b.add_transition(
                    cur,
                    Transition::Action {
                        target: next,
                        action_index,
                    },
                );
                cur = next;
            }
            let stop = b.add_state(StateKind::RuleStop, rule_index);
            b.add_transition(cur, Transition::Epsilon { target: stop });
        }
    }
    b.build()
}

fn append_elem(b: &mut AtnBuilder, rule_index: usize, cur: StateId, elem: &Elem) -> StateId {
    match elem {
        Elem::Ch(c) => {
            let next = b.add_state(StateKind::Basic, rule_index);
            b.add_transition(cur, Transition::for_code_point(next, *c as i32));
            next
        }
        Elem::Str(s) => {
            let mut cur = cur;
            for c in s.chars() {
                let next = b.add_state(StateKind::Basic, rule_index);
                b.add_transition(cur, Transition::for_code_point(next, c as i32));
                cur = next;
            }
            cur
        }
        Elem::OneOf(set) => {
            let next = b.add_state(StateKind::Basic, rule_index);
            b.add_transition(
                cur,
                Transition::Set {
                    target: next,
                    set: set.clone(),
                },
            );
            next
        }
        Elem::Plus(set) => {
            let next = b.add_state(StateKind::Basic, rule_index);
            b.add_transition(
                cur,
                Transition::Set {
                    target: next,
                    set: set.clone(),
                },
            );
            b.add_transition(
                next,
                Transition::Set {
                    target: next,
                    set: set.clone(),
                },
            );
            next
        }
        Elem::AnyNonGreedy => {
            // Loop entry ordered exit-first: the continuation is
            // explored before the scan alternative, so once the
            // continuation accepts, lingering scan configurations are
            // suppressed by their non-greedy flag.
            let entry = b.add_state(StateKind::Decision { non_greedy: true }, rule_index);
            let exit = b.add_state(StateKind::Basic, rule_index);
            let scan = b.add_state(StateKind::Basic, rule_index);
            let loopback = b.add_state(StateKind::Basic, rule_index);
            b.add_transition(cur, Transition::Epsilon { target: entry });
            b.add_transition(entry, Transition::Epsilon { target: exit });
            b.add_transition(entry, Transition::Epsilon { target: scan });
            b.add_transition(
                scan,
                Transition::Range {
                    target: loopback,
                    lo: MIN_CHAR,
                    hi: MAX_CHAR,
                },
            );
            b.add_transition(loopback, Transition::Epsilon { target: entry });
            exit
        }
        Elem::Act(action) => {
            let action_index = b.add_lexer_action(action.clone());
            let next = b.add_state(StateKind::Basic, rule_index);
            b.add_transition(
                cur,
                Transition::Action {
                    target: next,
                    action_index,
                },
            );
            next
        }
    }
}
