//! Streaming lexer.
//!
//! Scans the source buffer byte by byte, producing one [`Token`] per call and
//! an endless tail of `Eof` tokens once the buffer is exhausted. The parser
//! drives it with single-token lookahead via [`Lexer::peek`]/[`Lexer::get`].
//!
//! Two details matter for the grammars built on top:
//!
//! - Numeric classification is greedy: `3e2` is one real literal (300.0),
//!   never the integer 3 followed by the word `e2`. The stoichiometric
//!   grammar observes this.
//! - Multi-character operators are matched longest-first, so `<->` wins over
//!   `<` and `->` over `-`.
//!
//! Comments run from `:` or `?` to the end of the line. `\r` is whitespace,
//! which makes CRLF sources scan like LF ones.

use crate::token::{keyword, Token, TokenKind};
use modl_base::{Diagnostic, Location, Status};

pub struct Lexer<'s> {
    source: &'s str,
    bytes: &'s [u8],
    pos: usize,
    line: u32,
    column: u32,
    /// Last token handed out by `get`.
    current: Token<'s>,
    peeked: Option<Token<'s>>,
    /// Byte offset where the peeked token starts.
    peeked_start: usize,
    status: Status,
    diagnostic: Option<Diagnostic>,
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s str) -> Self {
        Self::resume(source, 0, Location::start())
    }

    /// Starts scanning mid-buffer. `location` must be the line/column of the
    /// byte at `offset`; block registrations record both during the
    /// descriptive pass.
    pub fn resume(source: &'s str, offset: usize, location: Location) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: offset,
            line: location.line,
            column: location.column,
            current: Token::new(TokenKind::Eof, "", location),
            peeked: None,
            peeked_start: offset,
            status: Status::Happy,
            diagnostic: None,
        }
    }

    /// The next token, without consuming it.
    pub fn peek(&mut self) -> Token<'s> {
        if self.peeked.is_none() {
            self.peeked_start = self.next_token_start();
            self.peeked = Some(self.scan());
        }
        self.peeked.unwrap()
    }

    /// Consumes and returns the next token.
    pub fn get(&mut self) -> Token<'s> {
        let token = match self.peeked.take() {
            Some(t) => t,
            None => self.scan(),
        };
        self.current = token;
        token
    }

    /// The token most recently returned by [`Lexer::get`].
    pub fn current(&self) -> Token<'s> {
        self.current
    }

    /// Position of the next token (or of the scan head if nothing is peeked).
    pub fn location(&self) -> Location {
        match self.peeked {
            Some(t) => t.location,
            None => Location::new(self.line, self.column),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// The diagnostic behind an `Error` token, if one was produced.
    pub fn take_diagnostic(&mut self) -> Option<Diagnostic> {
        self.diagnostic.take()
    }

    /// Byte offset where the next token begins. Forces a peek.
    pub fn peek_start(&mut self) -> usize {
        self.peek();
        self.peeked_start
    }

    /// Consumes the rest of the current line as raw text, trimmed of
    /// surrounding whitespace (including a trailing `\r`). Used for TITLE.
    ///
    /// Must not be called with a token already peeked.
    pub fn rest_of_line(&mut self) -> &'s str {
        debug_assert!(self.peeked.is_none(), "rest_of_line after peek");
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
            self.column += 1;
        }
        let text = self.source[start..self.pos].trim();
        if self.pos < self.bytes.len() {
            self.pos += 1;
            self.line += 1;
            self.column = 1;
        }
        text
    }

    fn next_token_start(&mut self) -> usize {
        self.skip_trivia();
        self.pos
    }

    fn skip_trivia(&mut self) {
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b' ' | b'\t' | b'\r' => {
                    self.pos += 1;
                    self.column += 1;
                }
                b'\n' => {
                    self.pos += 1;
                    self.line += 1;
                    self.column = 1;
                }
                b':' | b'?' => {
                    while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                        self.pos += 1;
                        self.column += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn scan(&mut self) -> Token<'s> {
        self.skip_trivia();
        let location = Location::new(self.line, self.column);

        if self.pos >= self.bytes.len() {
            return Token::new(TokenKind::Eof, "", location);
        }

        let c = self.bytes[self.pos];
        match c {
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.scan_word(location),
            b'0'..=b'9' => self.scan_number(location),
            b'"' => self.scan_string(location),
            b'(' => self.punct(TokenKind::LParen, location),
            b')' => self.punct(TokenKind::RParen, location),
            b'{' => self.punct(TokenKind::LBrace, location),
            b'}' => self.punct(TokenKind::RBrace, location),
            b',' => self.punct(TokenKind::Comma, location),
            b'+' => self.punct(TokenKind::Plus, location),
            b'*' => self.punct(TokenKind::Star, location),
            b'/' => self.punct(TokenKind::Slash, location),
            b'^' => self.punct(TokenKind::Caret, location),
            b'\'' => self.punct(TokenKind::Prime, location),
            b'~' => self.punct(TokenKind::Tilde, location),
            b'-' => {
                if self.peek_byte(1) == Some(b'>') {
                    self.take(2, TokenKind::Arrow, location)
                } else {
                    self.punct(TokenKind::Minus, location)
                }
            }
            b'<' => {
                if self.peek_byte(1) == Some(b'-') && self.peek_byte(2) == Some(b'>') {
                    self.take(3, TokenKind::ReactionArrow, location)
                } else if self.peek_byte(1) == Some(b'=') {
                    self.take(2, TokenKind::Le, location)
                } else {
                    self.punct(TokenKind::Lt, location)
                }
            }
            b'>' => {
                if self.peek_byte(1) == Some(b'=') {
                    self.take(2, TokenKind::Ge, location)
                } else {
                    self.punct(TokenKind::Gt, location)
                }
            }
            b'=' => {
                if self.peek_byte(1) == Some(b'=') {
                    self.take(2, TokenKind::Eq, location)
                } else {
                    self.punct(TokenKind::Assign, location)
                }
            }
            b'!' => {
                if self.peek_byte(1) == Some(b'=') {
                    self.take(2, TokenKind::Ne, location)
                } else {
                    self.error_token("unexpected character '!'", 1, location)
                }
            }
            _ => {
                let message = format!("unexpected character '{}'", c as char);
                self.error_token(&message, 1, location)
            }
        }
    }

    fn scan_word(&mut self, location: Location) -> Token<'s> {
        let start = self.pos;
        while self.pos < self.bytes.len()
            && matches!(self.bytes[self.pos], b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_')
        {
            self.pos += 1;
            self.column += 1;
        }
        let spelling = &self.source[start..self.pos];
        let kind = keyword(spelling).unwrap_or(TokenKind::Identifier);
        Token::new(kind, spelling, location)
    }

    /// Integer: digits not followed by `.`, `e`, or `E` with a valid
    /// continuation. Real: digits with a fractional part and/or a signed
    /// exponent. `12e` is the integer 12 followed by the word `e`; `3e2` is
    /// the real 300.
    fn scan_number(&mut self, location: Location) -> Token<'s> {
        let start = self.pos;
        self.eat_digits();

        let mut is_real = false;
        if self.peek_byte(0) == Some(b'.') {
            is_real = true;
            self.advance_bytes(1);
            self.eat_digits();
        }
        if matches!(self.peek_byte(0), Some(b'e') | Some(b'E')) {
            let exponent_len = match self.peek_byte(1) {
                Some(b'0'..=b'9') => Some(1),
                Some(b'+') | Some(b'-') if matches!(self.peek_byte(2), Some(b'0'..=b'9')) => {
                    Some(2)
                }
                _ => None,
            };
            if let Some(prefix) = exponent_len {
                is_real = true;
                self.advance_bytes(prefix + 1);
                self.eat_digits();
            }
        }

        let spelling = &self.source[start..self.pos];
        let kind = if is_real {
            TokenKind::Real
        } else {
            TokenKind::Integer
        };
        Token::new(kind, spelling, location)
    }

    fn scan_string(&mut self, location: Location) -> Token<'s> {
        let start = self.pos;
        self.advance_bytes(1);
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'"' => {
                    self.advance_bytes(1);
                    let spelling = &self.source[start..self.pos];
                    return Token::new(TokenKind::Str, spelling, location);
                }
                b'\n' => break,
                _ => self.advance_bytes(1),
            }
        }
        let len = self.pos - start;
        self.pos = start;
        self.column -= len as u32;
        self.error_token("unterminated string literal", len.max(1), location)
    }

    fn punct(&mut self, kind: TokenKind, location: Location) -> Token<'s> {
        self.take(1, kind, location)
    }

    fn take(&mut self, len: usize, kind: TokenKind, location: Location) -> Token<'s> {
        let spelling = &self.source[self.pos..self.pos + len];
        self.advance_bytes(len);
        Token::new(kind, spelling, location)
    }

    fn error_token(&mut self, message: &str, len: usize, location: Location) -> Token<'s> {
        let end = (self.pos + len).min(self.bytes.len());
        let spelling = &self.source[self.pos..end];
        self.advance_bytes(end - self.pos);
        self.status = Status::Error;
        if self.diagnostic.is_none() {
            self.diagnostic = Some(Diagnostic::new(message, location));
        }
        Token::new(TokenKind::Error, spelling, location)
    }

    fn eat_digits(&mut self) {
        while matches!(self.peek_byte(0), Some(b'0'..=b'9')) {
            self.advance_bytes(1);
        }
    }

    fn peek_byte(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn advance_bytes(&mut self, n: usize) {
        self.pos += n;
        self.column += n as u32;
    }
}
