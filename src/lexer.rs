//! Tokenizer for ssh config files
// (c) 2024 Ross Younger
//!
//! The lexer works a line at a time and keeps every byte of the input somewhere:
//! either in a token's text, or in the whitespace recorded in front of it.
//! This is what makes lossless re-serialization possible.
//!
//! CRLF and LF line endings are treated identically. A missing newline at the end
//! of the input is tolerated, and reported via [`Lexer::trailing_newline`].

use std::{collections::VecDeque, fmt::Display, str::Split};

/// A location in the input. Both fields are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord)]
pub struct Position {
    /// Line number
    pub line: usize,
    /// Column, counted in characters
    pub col: usize,
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// The kinds of token we emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// The first word on a line
    Key,
    /// An `=` between key and value
    Equals,
    /// Everything after the key (and `=`, if present) up to the end of the line or a `#`.
    /// This includes any trailing whitespace.
    Value,
    /// The text following a `#`, either on a line of its own or after a value
    Comment,
    /// A line containing only whitespace
    BlankLine,
    /// End of input
    End,
}

/// A single token. Borrows from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// What sort of token this is
    pub kind: TokenKind,
    /// The token itself
    pub text: &'a str,
    /// Whitespace between the previous token (or start of line) and this one
    pub leading: &'a str,
    /// Where `text` begins
    pub position: Position,
}

fn is_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Pull-based tokenizer
#[derive(Debug)]
pub struct Lexer<'a> {
    lines: Option<Split<'a, char>>,
    line_number: usize,
    pending: VecDeque<Token<'a>>,
    finished: bool,
    trailing_newline: bool,
}

impl<'a> Lexer<'a> {
    /// Constructor
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        let (body, trailing_newline) = match input.strip_suffix('\n') {
            Some(body) => (Some(body), true),
            None if input.is_empty() => (None, true),
            None => (Some(input), false),
        };
        Self {
            lines: body.map(|b| b.split('\n')),
            line_number: 0,
            pending: VecDeque::with_capacity(4),
            finished: false,
            trailing_newline,
        }
    }

    /// Whether the input ended with a newline (or was empty)
    #[must_use]
    pub fn trailing_newline(&self) -> bool {
        self.trailing_newline
    }

    fn emit(&mut self, kind: TokenKind, text: &'a str, leading: &'a str, position: Position) {
        self.pending.push_back(Token {
            kind,
            text,
            leading,
            position,
        });
    }

    fn lex_line(&mut self, line: &'a str) {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let line_number = self.line_number;
        let at = |offset: usize| Position {
            line: line_number,
            col: line[..offset].chars().count() + 1,
        };

        let rest = line.trim_start_matches(is_space);
        let indent = &line[..line.len() - rest.len()];
        if rest.is_empty() {
            self.emit(TokenKind::BlankLine, "", indent, at(indent.len()));
            return;
        }
        if let Some(comment) = rest.strip_prefix('#') {
            self.emit(TokenKind::Comment, comment, indent, at(indent.len()));
            return;
        }

        // The keyword may be delimited by whitespace (Key Value) OR equals (Key=Value)
        let key_len = rest
            .find(|c: char| is_space(c) || c == '=')
            .unwrap_or(rest.len());
        self.emit(TokenKind::Key, &rest[..key_len], indent, at(indent.len()));
        let mut offset = indent.len() + key_len;

        let after_key = &line[offset..];
        let mut value = after_key.trim_start_matches(is_space);
        let mut gap = &after_key[..after_key.len() - value.len()];
        if let Some(after_equals) = value.strip_prefix('=') {
            self.emit(TokenKind::Equals, "=", gap, at(offset + gap.len()));
            offset += gap.len() + 1;
            value = after_equals.trim_start_matches(is_space);
            gap = &after_equals[..after_equals.len() - value.len()];
        }
        offset += gap.len();

        let (value, comment) = match value.split_once('#') {
            Some((v, c)) => (v, Some(c)),
            None => (value, None),
        };
        self.emit(TokenKind::Value, value, gap, at(offset));
        if let Some(comment) = comment {
            self.emit(TokenKind::Comment, comment, "", at(offset + value.len()));
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            if self.finished {
                return None;
            }
            match self.lines.as_mut().and_then(Iterator::next) {
                Some(line) => {
                    self.line_number += 1;
                    self.lex_line(line);
                }
                None => {
                    self.finished = true;
                    return Some(Token {
                        kind: TokenKind::End,
                        text: "",
                        leading: "",
                        position: Position {
                            line: self.line_number + 1,
                            col: 1,
                        },
                    });
                }
            }
        }
    }
}

/// Converts a byte offset into a [`Position`]
pub(crate) fn position_of(bytes: &[u8], offset: usize) -> Position {
    let before = &bytes[..offset.min(bytes.len())];
    let line = before.iter().filter(|b| **b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|b| *b == b'\n')
        .map_or(0, |i| i + 1);
    Position {
        line,
        col: offset - line_start + 1,
    }
}

///////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::{position_of, Lexer, Position, TokenKind};
    use TokenKind::{BlankLine, Comment, End, Equals, Key, Value};

    fn kinds(input: &str) -> Vec<(TokenKind, &str)> {
        Lexer::new(input).map(|t| (t.kind, t.text)).collect()
    }

    #[test]
    fn simple_lines() {
        assert_eq!(
            kinds("Host foo\n  User root\n"),
            vec![
                (Key, "Host"),
                (Value, "foo"),
                (Key, "User"),
                (Value, "root"),
                (End, "")
            ]
        );
    }

    #[test]
    fn equals_is_optional() {
        assert_eq!(
            kinds("Port=22\nPort = 23\n"),
            vec![
                (Key, "Port"),
                (Equals, "="),
                (Value, "22"),
                (Key, "Port"),
                (Equals, "="),
                (Value, "23"),
                (End, "")
            ]
        );
    }

    #[test]
    fn comments_and_blanks() {
        assert_eq!(
            kinds("# top\n\n   \nUser bob   # trailing\n"),
            vec![
                (Comment, " top"),
                (BlankLine, ""),
                (BlankLine, ""),
                (Key, "User"),
                (Value, "bob   "),
                (Comment, " trailing"),
                (End, "")
            ]
        );
    }

    #[test]
    fn whitespace_is_kept() {
        let tokens: Vec<_> = Lexer::new("\tPort \t= \t22\n").collect();
        assert_eq!(tokens[0].leading, "\t");
        assert_eq!(tokens[1].leading, " \t");
        assert_eq!(tokens[2].leading, " \t");
        assert_eq!(tokens[2].text, "22");
    }

    #[test]
    fn crlf_matches_lf() {
        assert_eq!(kinds("Host a\r\nUser b\r\n"), kinds("Host a\nUser b\n"));
    }

    #[test]
    fn missing_trailing_newline() {
        let lexer = Lexer::new("User root");
        assert!(!lexer.trailing_newline());
        assert_eq!(
            lexer.map(|t| t.kind).collect::<Vec<_>>(),
            vec![Key, Value, End]
        );
        assert!(Lexer::new("User root\n").trailing_newline());
        assert!(Lexer::new("").trailing_newline());
        assert_eq!(kinds(""), vec![(End, "")]);
    }

    #[test]
    fn positions() {
        let tokens: Vec<_> = Lexer::new("Host a\n  User b # c\n").collect();
        assert_eq!(tokens[0].position, Position { line: 1, col: 1 });
        assert_eq!(tokens[1].position, Position { line: 1, col: 6 });
        assert_eq!(tokens[2].position, Position { line: 2, col: 3 });
        assert_eq!(tokens[3].position, Position { line: 2, col: 8 });
        assert_eq!(tokens[4].position, Position { line: 2, col: 10 });
        assert_eq!(tokens[5].kind, End);
        assert_eq!(tokens[5].position, Position { line: 3, col: 1 });
    }

    #[test]
    fn byte_offsets() {
        assert_eq!(position_of(b"abc", 0), Position { line: 1, col: 1 });
        assert_eq!(position_of(b"ab\ncd", 4), Position { line: 2, col: 2 });
    }
}
