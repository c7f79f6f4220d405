//! ATN transitions.
//!
//! A transition either consumes a code point (atom, range, set, not-set)
//! or is traversed during closure without consuming (epsilon, rule
//! invocation, predicate, action, precedence). Dispatch is data-driven
//! on the variant tag.

use super::StateId;
use crate::interval::IntervalSet;

/// An edge of the ATN graph. Every variant knows its target state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Consume exactly `code_point`.
    Atom { target: StateId, code_point: i32 },
    /// Consume any code point in `[lo, hi]`.
    Range { target: StateId, lo: i32, hi: i32 },
    /// Consume any member of `set`.
    Set { target: StateId, set: IntervalSet },
    /// Consume any valid code point not in `set`.
    NotSet { target: StateId, set: IntervalSet },
    /// Traverse without consuming.
    Epsilon { target: StateId },
    /// Invoke a lexer rule: jump to `target` (the rule start), resuming
    /// at `follow_state` when the rule finishes.
    Rule {
        target: StateId,
        follow_state: StateId,
        rule_index: usize,
    },
    /// Gate on a user semantic predicate.
    Predicate {
        target: StateId,
        rule_index: usize,
        pred_index: usize,
        is_ctx_dependent: bool,
    },
    /// Record a deferred lexer action.
    Action { target: StateId, action_index: usize },
    /// Precedence predicate. Only meaningful to parsers; rejected by the
    /// lexer simulator.
    Precedence { target: StateId, precedence: u32 },
}

impl Transition {
    pub fn target(&self) -> StateId {
        match *self {
            Transition::Atom { target, .. }
            | Transition::Range { target, .. }
            | Transition::Set { target, .. }
            | Transition::NotSet { target, .. }
            | Transition::Epsilon { target }
            | Transition::Rule { target, .. }
            | Transition::Predicate { target, .. }
            | Transition::Action { target, .. }
            | Transition::Precedence { target, .. } => target,
        }
    }

    /// Whether the transition is traversed during closure rather than
    /// consuming input.
    pub fn is_epsilon(&self) -> bool {
        matches!(
            self,
            Transition::Epsilon { .. }
                | Transition::Rule { .. }
                | Transition::Predicate { .. }
                | Transition::Action { .. }
                | Transition::Precedence { .. }
        )
    }

    /// Whether the transition consumes `symbol`. Epsilon-class
    /// transitions never match.
    pub fn matches(&self, symbol: i32, min_char: i32, max_char: i32) -> bool {
        match self {
            Transition::Atom { code_point, .. } => *code_point == symbol,
            Transition::Range { lo, hi, .. } => *lo <= symbol && symbol <= *hi,
            Transition::Set { set, .. } => set.contains(symbol),
            Transition::NotSet { set, .. } => {
                symbol >= min_char && symbol <= max_char && !set.contains(symbol)
            }
            _ => false,
        }
    }

    /// Transition consuming a single code point. Supplementary-plane
    /// values are carried as sets so edge tables stay byte-sized.
    pub fn for_code_point(target: StateId, code_point: i32) -> Transition {
        if code_point > 0xFFFF {
            Transition::Set {
                target,
                set: IntervalSet::of_one(code_point),
            }
        } else {
            Transition::Atom { target, code_point }
        }
    }

    /// Transition consuming a code-point range; same supplementary-plane
    /// treatment as [`Transition::for_code_point`].
    pub fn for_code_point_range(target: StateId, lo: i32, hi: i32) -> Transition {
        if lo > 0xFFFF || hi > 0xFFFF {
            Transition::Set {
                target,
                set: IntervalSet::of(lo, hi),
            }
        } else {
            Transition::Range { target, lo, hi }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{EOF, MAX_CHAR, MIN_CHAR};

    #[test]
    fn test_atom_matches() {
        let t = Transition::Atom {
            target: 1,
            code_point: 'x' as i32,
        };
        assert!(t.matches('x' as i32, MIN_CHAR, MAX_CHAR));
        assert!(!t.matches('y' as i32, MIN_CHAR, MAX_CHAR));
        assert!(!t.matches(EOF, MIN_CHAR, MAX_CHAR));
    }

    #[test]
    fn test_not_set_excludes_eof() {
        let t = Transition::NotSet {
            target: 1,
            set: IntervalSet::of_one('"' as i32),
        };
        assert!(t.matches('a' as i32, MIN_CHAR, MAX_CHAR));
        assert!(!t.matches('"' as i32, MIN_CHAR, MAX_CHAR));
        // EOF is below MIN_CHAR, so a negated set can never match it.
        assert!(!t.matches(EOF, MIN_CHAR, MAX_CHAR));
    }

    #[test]
    fn test_epsilon_kinds_never_match() {
        let t = Transition::Rule {
            target: 3,
            follow_state: 4,
            rule_index: 0,
        };
        assert!(t.is_epsilon());
        assert!(!t.matches('a' as i32, MIN_CHAR, MAX_CHAR));
    }

    #[test]
    fn test_code_point_constructor_splits_planes() {
        assert!(matches!(
            Transition::for_code_point(1, 'a' as i32),
            Transition::Atom { .. }
        ));
        assert!(matches!(
            Transition::for_code_point(1, 0x1F600),
            Transition::Set { .. }
        ));
        assert!(matches!(
            Transition::for_code_point_range(1, 'a' as i32, 'z' as i32),
            Transition::Range { .. }
        ));
        assert!(matches!(
            Transition::for_code_point_range(1, 0x10000, 0x10010),
            Transition::Set { .. }
        ));
    }
}
