//! The lexer driver.
//!
//! [`Lexer::next_token`] asks the simulator for one token at a time and
//! handles everything around the match: `skip` discards and restarts,
//! `more` keeps accumulating into the current token, recognition errors
//! are reported to listeners and recovered by dropping one code point,
//! and accepted tokens are emitted through the token factory.

use tracing::debug;

use std::sync::Arc;

use crate::atn::simulator::LexerAtnSimulator;
use crate::atn::Atn;
use crate::error::{escape_whitespace, ConsoleErrorListener, ErrorListener, LexerNoViableAlt};
use crate::interval::Interval;
use crate::stream::{CharStream, EOF};
use crate::token::{
    CommonTokenFactory, Token, TokenFactory, DEFAULT_CHANNEL, TOKEN_EOF, TOKEN_INVALID_TYPE,
    TOKEN_MORE, TOKEN_SKIP,
};

/// The mode every lexer starts in.
pub const DEFAULT_MODE: usize = 0;

/// The per-token state lexer actions operate on: pending token type and
/// channel, plus the mode stack.
#[derive(Debug, Clone)]
pub struct LexerState {
    pub token_type: i32,
    pub channel: i32,
    pub mode: usize,
    pub mode_stack: Vec<usize>,
}

impl LexerState {
    pub fn new() -> Self {
        LexerState {
            token_type: TOKEN_INVALID_TYPE,
            channel: DEFAULT_CHANNEL,
            mode: DEFAULT_MODE,
            mode_stack: Vec::new(),
        }
    }

    /// Enter `mode`, remembering the current one.
    pub fn push_mode(&mut self, mode: usize) {
        self.mode_stack.push(self.mode);
        self.mode = mode;
    }

    /// Return to the most recently pushed mode.
    pub fn pop_mode(&mut self) -> usize {
        let mode = self
            .mode_stack
            .pop()
            .expect("cannot pop from an empty mode stack");
        self.mode = mode;
        mode
    }
}

impl Default for LexerState {
    fn default() -> Self {
        LexerState::new()
    }
}

/// User hooks referenced by grammar predicates and custom actions.
///
/// `sempred` must behave as a pure predicate: the input handed to it is
/// positioned for inspection only. `action` runs at token-emit time and
/// may adjust the per-token state.
pub trait LexerCallbacks {
    fn sempred(&mut self, _input: &mut dyn CharStream, _rule_index: usize, _pred_index: usize) -> bool {
        true
    }

    fn action(
        &mut self,
        _state: &mut LexerState,
        _input: &mut dyn CharStream,
        _rule_index: usize,
        _action_index: usize,
    ) {
    }
}

/// Turns a character stream into tokens by repeated simulator matches.
pub struct Lexer<S: CharStream> {
    input: S,
    /// The simulator; exposed for DFA inspection and `clear_dfa`.
    pub interp: LexerAtnSimulator,
    state: LexerState,
    factory: Box<dyn TokenFactory>,
    callbacks: Option<Box<dyn LexerCallbacks>>,
    listeners: Vec<Box<dyn ErrorListener>>,
    token_start_char_index: usize,
    token_start_line: u32,
    token_start_column: u32,
    hit_eof: bool,
}

impl<S: CharStream> Lexer<S> {
    pub fn new(input: S, atn: Arc<Atn>) -> Self {
        Lexer {
            input,
            interp: LexerAtnSimulator::new(atn),
            state: LexerState::new(),
            factory: Box::new(CommonTokenFactory),
            callbacks: None,
            listeners: vec![Box::new(ConsoleErrorListener)],
            token_start_char_index: 0,
            token_start_line: 1,
            token_start_column: 0,
            hit_eof: false,
        }
    }

    pub fn set_callbacks(&mut self, callbacks: Box<dyn LexerCallbacks>) {
        self.callbacks = Some(callbacks);
    }

    pub fn set_factory(&mut self, factory: Box<dyn TokenFactory>) {
        self.factory = factory;
    }

    pub fn remove_error_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn add_error_listener(&mut self, listener: Box<dyn ErrorListener>) {
        self.listeners.push(listener);
    }

    pub fn input(&self) -> &S {
        &self.input
    }

    pub fn mode(&self) -> usize {
        self.state.mode
    }

    pub fn set_mode(&mut self, mode: usize) {
        self.state.mode = mode;
    }

    pub fn push_mode(&mut self, mode: usize) {
        self.state.push_mode(mode);
    }

    pub fn pop_mode(&mut self) -> usize {
        self.state.pop_mode()
    }

    /// 1-based line of the current position.
    pub fn line(&self) -> u32 {
        self.interp.line
    }

    /// 0-based column of the current position.
    pub fn column(&self) -> u32 {
        self.interp.char_position_in_line
    }

    /// Produce the next token, recovering from recognition errors.
    pub fn next_token(&mut self) -> Token {
        let marker = self.input.mark();
        let token = 'outer: loop {
            if self.hit_eof {
                break self.emit_eof();
            }
            self.state.channel = DEFAULT_CHANNEL;
            self.token_start_char_index = self.input.index();
            self.token_start_line = self.interp.line;
            self.token_start_column = self.interp.char_position_in_line;
            loop {
                self.state.token_type = TOKEN_INVALID_TYPE;
                let mut callbacks = self.callbacks.take();
                let match_result = self.interp.match_token(
                    &mut self.input,
                    &mut self.state,
                    callbacks.as_deref_mut(),
                );
                self.callbacks = callbacks;
                let ttype = match match_result {
                    Ok(ttype) => ttype,
                    Err(e) => {
                        self.notify_listeners(&e);
                        self.recover();
                        TOKEN_SKIP
                    }
                };
                if self.input.la(1) == EOF {
                    self.hit_eof = true;
                }
                if self.state.token_type == TOKEN_INVALID_TYPE {
                    self.state.token_type = ttype;
                }
                if self.state.token_type == TOKEN_SKIP {
                    continue 'outer;
                }
                if self.state.token_type != TOKEN_MORE {
                    break;
                }
            }
            break self.emit();
        };
        self.input.release(marker);
        token
    }

    /// Drain the stream, returning every token up to and including EOF.
    pub fn all_tokens(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.token_type == TOKEN_EOF;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    fn emit(&mut self) -> Token {
        self.factory.create(
            &self.input,
            self.state.token_type,
            None,
            self.state.channel,
            self.token_start_char_index,
            self.input.index(),
            self.token_start_line,
            self.token_start_column,
        )
    }

    fn emit_eof(&mut self) -> Token {
        let index = self.input.index();
        self.factory.create(
            &self.input,
            TOKEN_EOF,
            None,
            DEFAULT_CHANNEL,
            index,
            index,
            self.interp.line,
            self.interp.char_position_in_line,
        )
    }

    fn notify_listeners(&mut self, error: &LexerNoViableAlt) {
        let text = self.input.text(Interval::of(
            self.token_start_char_index as i32,
            self.input.index() as i32,
        ));
        let message = format!("token recognition error at: '{}'", escape_whitespace(&text));
        for listener in &mut self.listeners {
            listener.syntax_error(
                self.token_start_line,
                self.token_start_column,
                &message,
                error,
            );
        }
    }

    /// Skip one code point so the scan can make progress.
    fn recover(&mut self) {
        if self.input.la(1) != EOF {
            debug!(index = self.input.index(), "recovering by consuming one code point");
            self.interp.consume(&mut self.input);
        }
    }
}
