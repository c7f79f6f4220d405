//! Deferred lexer actions and their ordered executor.
//!
//! Actions named by a rule (`skip`, `more`, `type`, `channel`, mode
//! manipulation, custom code) are not run while the simulator is still
//! exploring alternatives. They are collected into an executor attached
//! to the winning configuration and replayed once, after the accept is
//! committed and the input has been repositioned.

use std::sync::Arc;

use crate::lexer::{LexerCallbacks, LexerState};
use crate::stream::CharStream;
use crate::token::{TOKEN_MORE, TOKEN_SKIP};

/// A single deferred action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LexerAction {
    /// Discard the current token.
    Skip,
    /// Keep accumulating into the current token.
    More,
    /// Force the token type.
    Type(i32),
    /// Route the token to a channel.
    Channel(i32),
    /// Switch to a mode.
    Mode(usize),
    /// Push the current mode and switch.
    PushMode(usize),
    /// Return to the pushed mode.
    PopMode,
    /// User code identified by `(rule, action)` indices. Position
    /// dependent: it may inspect the input at the point it appears in
    /// the rule.
    Custom {
        rule_index: usize,
        action_index: usize,
    },
    /// A position-dependent action bound to a fixed offset from the
    /// token start, so it can be replayed after the scanner rewinds.
    Indexed {
        offset: usize,
        action: Box<LexerAction>,
    },
}

impl LexerAction {
    /// Whether replay must position the input where the action appeared.
    pub fn is_position_dependent(&self) -> bool {
        matches!(
            self,
            LexerAction::Custom { .. } | LexerAction::Indexed { .. }
        )
    }
}

/// An immutable ordered list of deferred actions.
///
/// Executors are shared between configurations via `Arc`; `append` and
/// `fix_offset_before_match` return new executors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LexerActionExecutor {
    actions: Vec<LexerAction>,
}

impl LexerActionExecutor {
    pub fn new(actions: Vec<LexerAction>) -> Self {
        LexerActionExecutor { actions }
    }

    pub fn actions(&self) -> &[LexerAction] {
        &self.actions
    }

    /// Executor running `existing` followed by `action`.
    pub fn append(
        existing: Option<&Arc<LexerActionExecutor>>,
        action: LexerAction,
    ) -> Arc<LexerActionExecutor> {
        let mut actions = existing.map(|e| e.actions.clone()).unwrap_or_default();
        actions.push(action);
        Arc::new(LexerActionExecutor::new(actions))
    }

    /// Bind every position-dependent action to `offset` code points past
    /// the token start. Already-bound actions keep their offset. Returns
    /// `self` unchanged when nothing is position dependent.
    pub fn fix_offset_before_match(self: &Arc<Self>, offset: usize) -> Arc<LexerActionExecutor> {
        let mut updated: Option<Vec<LexerAction>> = None;
        for (i, action) in self.actions.iter().enumerate() {
            if action.is_position_dependent() && !matches!(action, LexerAction::Indexed { .. }) {
                let actions = updated.get_or_insert_with(|| self.actions.clone());
                actions[i] = LexerAction::Indexed {
                    offset,
                    action: Box::new(action.clone()),
                };
            }
        }
        match updated {
            Some(actions) => Arc::new(LexerActionExecutor::new(actions)),
            None => Arc::clone(self),
        }
    }

    /// Replay the actions in order against the driver state.
    ///
    /// `start_index` is the token start; indexed actions seek the input
    /// to `start_index + offset` before firing, and the original
    /// position is restored afterwards.
    pub fn execute(
        &self,
        state: &mut LexerState,
        mut callbacks: Option<&mut dyn LexerCallbacks>,
        input: &mut dyn CharStream,
        start_index: usize,
    ) {
        let stop_index = input.index();
        let mut requires_seek = false;
        for action in &self.actions {
            let action = match action {
                LexerAction::Indexed { offset, action } => {
                    input.seek(start_index + offset);
                    requires_seek = start_index + offset != stop_index;
                    action.as_ref()
                }
                a if a.is_position_dependent() => {
                    input.seek(stop_index);
                    requires_seek = false;
                    a
                }
                a => a,
            };
            execute_one(action, state, &mut callbacks, &mut *input);
        }
        if requires_seek {
            input.seek(stop_index);
        }
    }
}

fn execute_one(
    action: &LexerAction,
    state: &mut LexerState,
    callbacks: &mut Option<&mut dyn LexerCallbacks>,
    input: &mut dyn CharStream,
) {
    match action {
        LexerAction::Skip => state.token_type = TOKEN_SKIP,
        LexerAction::More => state.token_type = TOKEN_MORE,
        LexerAction::Type(t) => state.token_type = *t,
        LexerAction::Channel(c) => state.channel = *c,
        LexerAction::Mode(m) => state.mode = *m,
        LexerAction::PushMode(m) => state.push_mode(*m),
        LexerAction::PopMode => {
            state.pop_mode();
        }
        LexerAction::Custom {
            rule_index,
            action_index,
        } => {
            if let Some(cb) = callbacks {
                cb.action(state, input, *rule_index, *action_index);
            }
        }
        LexerAction::Indexed { .. } => unreachable!("indexed actions are unwrapped before execution"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::LexerState;
    use crate::stream::CodePointStream;
    use crate::token::TOKEN_INVALID_TYPE;

    #[test]
    fn test_append_preserves_order() {
        let a = LexerActionExecutor::append(None, LexerAction::Channel(1));
        let b = LexerActionExecutor::append(Some(&a), LexerAction::Skip);
        assert_eq!(
            b.actions(),
            &[LexerAction::Channel(1), LexerAction::Skip]
        );
    }

    #[test]
    fn test_fix_offset_wraps_only_position_dependent() {
        let ex = Arc::new(LexerActionExecutor::new(vec![
            LexerAction::Skip,
            LexerAction::Custom {
                rule_index: 0,
                action_index: 2,
            },
        ]));
        let fixed = ex.fix_offset_before_match(3);
        assert_eq!(fixed.actions()[0], LexerAction::Skip);
        assert_eq!(
            fixed.actions()[1],
            LexerAction::Indexed {
                offset: 3,
                action: Box::new(LexerAction::Custom {
                    rule_index: 0,
                    action_index: 2,
                }),
            }
        );
    }

    #[test]
    fn test_fix_offset_no_op_shares() {
        let ex = Arc::new(LexerActionExecutor::new(vec![LexerAction::More]));
        let fixed = ex.fix_offset_before_match(5);
        assert!(Arc::ptr_eq(&ex, &fixed));
    }

    #[test]
    fn test_execute_state_actions() {
        let ex = LexerActionExecutor::new(vec![
            LexerAction::Channel(1),
            LexerAction::PushMode(2),
            LexerAction::Type(42),
        ]);
        let mut state = LexerState::new();
        let mut input = CodePointStream::new("xyz");
        ex.execute(&mut state, None, &mut input, 0);
        assert_eq!(state.channel, 1);
        assert_eq!(state.mode, 2);
        assert_eq!(state.mode_stack, vec![0]);
        assert_eq!(state.token_type, 42);
    }

    #[test]
    fn test_execute_indexed_restores_position() {
        let ex = LexerActionExecutor::new(vec![LexerAction::Indexed {
            offset: 1,
            action: Box::new(LexerAction::Custom {
                rule_index: 0,
                action_index: 0,
            }),
        }]);
        let mut state = LexerState::new();
        state.token_type = TOKEN_INVALID_TYPE;
        let mut input = CodePointStream::new("abcdef");
        input.seek(4);
        ex.execute(&mut state, None, &mut input, 0);
        assert_eq!(input.index(), 4);
    }

    #[test]
    #[should_panic(expected = "mode stack")]
    fn test_pop_mode_on_empty_stack_panics() {
        let ex = LexerActionExecutor::new(vec![LexerAction::PopMode]);
        let mut state = LexerState::new();
        let mut input = CodePointStream::new("");
        ex.execute(&mut state, None, &mut input, 0);
    }
}
