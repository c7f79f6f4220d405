//! # lexatn: ATN lexer simulation with lazy DFA construction
//!
//! Runtime engine that turns a character stream into tokens by
//! simulating an augmented transition network (ATN) compiled from a
//! lexer grammar, while interning the configuration sets it visits into
//! per-mode DFAs so repeated input shapes skip simulation entirely:
//!
//! ```text
//! CharStream ──▶ Lexer::next_token ──▶ LexerAtnSimulator::match_token
//!                     │                        │
//!                     │              DFA edge hit?──yes──▶ walk table
//!                     │                        │no
//!                     │              closure/reach over ATN configs
//!                     │                        │
//!                     │              intern reach into the mode DFA
//!                     ▼                        ▼
//!                  Token  ◀── accept snapshot + deferred actions
//! ```
//!
//! Matching is maximal munch with grammar-order priority: the simulator
//! consumes while any configuration survives, commits to the latest
//! accept state passed, and breaks ties by the lowest alternative.
//! Deferred rule actions (`skip`, `more`, mode changes, user code) run
//! exactly once, after the accept is committed.
//!
//! The ATN itself is built once via [`atn::AtnBuilder`] and shared
//! read-only; one [`lexer::Lexer`] (or a bare
//! [`atn::simulator::LexerAtnSimulator`]) owns the mutable scan state.

pub mod action;
pub mod atn;
pub mod dfa;
pub mod error;
pub mod escape;
pub mod interval;
pub mod lexer;
pub mod stream;
pub mod token;

#[cfg(test)]
mod tests;

pub use action::{LexerAction, LexerActionExecutor};
pub use atn::config::{LexerAtnConfig, OrderedConfigSet};
pub use atn::context::{PredictionContext, PredictionContextCache, EMPTY_RETURN_STATE};
pub use atn::simulator::LexerAtnSimulator;
pub use atn::transition::Transition;
pub use atn::{Atn, AtnBuilder, AtnState, StateId, StateKind};
pub use dfa::{Dfa, DfaState, DfaStateId, ERROR_STATE, MAX_DFA_EDGE, MIN_DFA_EDGE};
pub use error::{
    CollectingErrorListener, ConsoleErrorListener, ErrorListener, LexerNoViableAlt,
};
pub use escape::{parse_escape, EscapeKind, EscapeResult};
pub use interval::{Interval, IntervalSet};
pub use lexer::{Lexer, LexerCallbacks, LexerState, DEFAULT_MODE};
pub use stream::{CharStream, CodePointStream, EOF, MAX_CHAR, MIN_CHAR};
pub use token::{
    CommonTokenFactory, Token, TokenFactory, DEFAULT_CHANNEL, HIDDEN_CHANNEL, TOKEN_EOF,
    TOKEN_INVALID_TYPE, TOKEN_MORE, TOKEN_SKIP,
};
