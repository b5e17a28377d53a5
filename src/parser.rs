//! The parser proper
// (c) 2024 Ross Younger

use std::iter::Peekable;

use crate::{
    block::{Block, Condition, Header, HostBlock, MatchAttribute, MatchBlock},
    config::{Config, SourceKind},
    errors::{Error, Result},
    includes::{split_args, Include},
    lexer::{Lexer, Position, Token, TokenKind},
    node::{Directive, Empty, LineFormat, Node},
    pattern::Pattern,
};

/// Parser states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Directive,
    Comment,
    Done,
}

/// A `Key Value` line, broken down
#[derive(Debug)]
struct Line<'a> {
    keyword: &'a str,
    /// The value, without trailing whitespace
    value: &'a str,
    format: LineFormat,
    comment: Option<String>,
    position: Position,
    value_position: Position,
}

impl Line<'_> {
    fn header(&self) -> Header {
        Header {
            keyword: self.keyword.into(),
            args: self.value.into(),
            format: self.format.clone(),
            comment: self.comment.clone(),
            position: self.position,
        }
    }
}

/// The business end of reading a config file.
///
/// Consumes tokens strictly in order, looking ahead by at most one.
/// You can only use this struct once.
pub(crate) struct Parser<'a> {
    tokens: Peekable<Lexer<'a>>,
    config: Config,
    kind: SourceKind,
    depth: u8,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(input: &'a str, kind: SourceKind, depth: u8) -> Self {
        let lexer = Lexer::new(input);
        let mut config = Config::with_depth(depth);
        config.trailing_newline = lexer.trailing_newline();
        config.kind = kind;
        Self {
            tokens: lexer.peekable(),
            config,
            kind,
            depth,
        }
    }

    /// Runs the state machine to completion
    pub(crate) fn parse(mut self) -> Result<Config> {
        let mut state = State::Start;
        loop {
            state = match state {
                State::Start => self.start(),
                State::Directive => self.directive()?,
                State::Comment => self.comment()?,
                State::Done => break,
            };
        }
        Ok(self.config)
    }

    fn next_token(&mut self, after: Position) -> Result<Token<'a>> {
        self.tokens
            .next()
            .ok_or_else(|| Error::parse(after, "unexpected end of input"))
    }

    fn start(&mut self) -> State {
        match self.tokens.peek().map(|t| t.kind) {
            None | Some(TokenKind::End) => State::Done,
            Some(TokenKind::Comment | TokenKind::BlankLine) => State::Comment,
            // Anything else must begin a directive; directive() reports it if not.
            Some(_) => State::Directive,
        }
    }

    fn comment(&mut self) -> Result<State> {
        let token = self.next_token(Position::default())?;
        let comment = match token.kind {
            TokenKind::Comment => Some(token.text.to_owned()),
            TokenKind::BlankLine => None,
            _ => return Err(unexpected(&token)),
        };
        self.config.push_node(Node::Empty(Empty {
            comment,
            indent: token.leading.into(),
            position: token.position,
        }));
        Ok(State::Start)
    }

    fn read_line(&mut self) -> Result<Line<'a>> {
        let key = self.next_token(Position::default())?;
        if key.kind != TokenKind::Key {
            return Err(unexpected(&key));
        }
        if key.text.is_empty() {
            return Err(Error::parse(key.position, "missing keyword"));
        }

        let mut separator = String::new();
        let mut value = self.next_token(key.position)?;
        if value.kind == TokenKind::Equals {
            separator.push_str(value.leading);
            separator.push('=');
            value = self.next_token(value.position)?;
        }
        if value.kind != TokenKind::Value {
            return Err(unexpected(&value));
        }
        separator.push_str(value.leading);

        let comment = match self.tokens.peek() {
            Some(t) if t.kind == TokenKind::Comment && t.position.line == value.position.line => {
                let t = self.next_token(value.position)?;
                Some(t.text.to_owned())
            }
            _ => None,
        };

        let trimmed = value.text.trim_end();
        if trimmed.is_empty() {
            return Err(Error::parse(
                key.position,
                format!("missing argument for {}", key.text),
            ));
        }
        Ok(Line {
            keyword: key.text,
            value: trimmed,
            format: LineFormat {
                indent: key.leading.into(),
                separator,
                trailing: value.text[trimmed.len()..].into(),
            },
            comment,
            position: key.position,
            value_position: value.position,
        })
    }

    fn directive(&mut self) -> Result<State> {
        let line = self.read_line()?;
        match line.keyword.to_ascii_lowercase().as_str() {
            "host" => self.host(&line)?,
            "match" => self.match_(&line)?,
            "include" => self.include(line)?,
            _ => self.config.push_node(Node::Directive(Directive {
                key: line.keyword.into(),
                value: line.value.into(),
                comment: line.comment,
                format: line.format,
                position: line.position,
            })),
        }
        Ok(State::Start)
    }

    fn host(&mut self, line: &Line<'_>) -> Result<()> {
        let patterns = line
            .value
            .split_whitespace()
            .map(|p| {
                Pattern::new(p).map_err(|e| Error::InvalidPattern {
                    position: line.value_position,
                    reason: format!("{p}: {e}"),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let block = Block::Host(HostBlock {
            patterns,
            data: crate::block::BlockData::default(),
        });
        self.config.push_block(block.with_header(line.header()));
        Ok(())
    }

    fn match_(&mut self, line: &Line<'_>) -> Result<()> {
        let unsupported = |directive: &str| Error::UnsupportedDirective {
            position: line.value_position,
            directive: directive.into(),
        };
        let words: Vec<&str> = line.value.split_whitespace().collect();
        let lower: Vec<String> = words.iter().map(|w| w.to_ascii_lowercase()).collect();

        if lower[0].starts_with("canonical") {
            return Err(unsupported("Match Canonical"));
        }
        match lower.as_slice() {
            [f] if f == "final" => return Err(unsupported("Match Final without All")),
            [a] if a == "all" => {
                self.config
                    .push_block(Block::match_all(false).with_header(line.header()));
                return Ok(());
            }
            [f, a] if f == "final" && a == "all" => {
                self.config
                    .push_block(Block::match_all(true).with_header(line.header()));
                return Ok(());
            }
            _ => (),
        }

        if words.len() % 2 != 0 {
            return Err(Error::InvalidPattern {
                position: line.value_position,
                reason: format!(
                    "Match criteria must be attribute/pattern pairs: {}",
                    line.value
                ),
            });
        }
        let mut conditions = Vec::with_capacity(words.len() / 2);
        for pair in words.chunks(2) {
            let attribute = pair[0]
                .parse::<MatchAttribute>()
                .map_err(|_| unsupported(&format!("Match {}", pair[0])))?;
            let pattern = Pattern::new(pair[1]).map_err(|e| Error::InvalidPattern {
                position: line.value_position,
                reason: format!("{}: {e}", pair[1]),
            })?;
            conditions.push(Condition::new(attribute, pattern));
        }
        let block = Block::Match(MatchBlock {
            conditions,
            data: crate::block::BlockData::default(),
        });
        self.config.push_block(block.with_header(line.header()));
        Ok(())
    }

    fn include(&mut self, line: Line<'_>) -> Result<()> {
        let args = split_args(line.value).map_err(|e| Error::parse(line.value_position, e))?;
        let include = Include::resolve(args, self.kind, self.depth + 1, line.position)?
            .with_layout(line.keyword, line.value, line.format, line.comment);
        self.config.push_node(Node::Include(Box::new(include)));
        Ok(())
    }
}

fn unexpected(token: &Token<'_>) -> Error {
    Error::parse(
        token.position,
        format!("unexpected {:?} token {:?}", token.kind, token.text),
    )
}

///////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use anyhow::{anyhow, Context, Result};
    use assertables::{assert_contains, assert_contains_as_result};

    use crate::{
        block::{Block, MatchAttribute},
        config::Config,
        errors::Error,
        node::Node,
        util::make_test_tempfile,
    };

    fn host_patterns(block: &Block) -> Vec<String> {
        match block {
            Block::Host(h) => h.patterns.iter().map(ToString::to_string).collect(),
            Block::Match(_) => panic!("not a host block"),
        }
    }

    #[test]
    fn directives_without_host_block() {
        let config = Config::decode_str(
            r"
            Foo Bar
            Baz=Qux
            # foop is a comment
        ",
        )
        .unwrap();
        assert_eq!(config.blocks().len(), 1);
        let nodes = config.blocks()[0].nodes();
        assert_eq!(nodes.len(), 5);
        let Node::Directive(d) = &nodes[1] else {
            panic!("expected a directive")
        };
        assert_eq!((d.key.as_str(), d.value.as_str()), ("Foo", "Bar"));
        let Node::Directive(d) = &nodes[2] else {
            panic!("expected a directive")
        };
        assert_eq!((d.key.as_str(), d.value.as_str()), ("Baz", "Qux"));
        assert!(d.has_equals());
        let Node::Empty(e) = &nodes[3] else {
            panic!("expected a comment")
        };
        assert_eq!(e.comment.as_deref(), Some(" foop is a comment"));
    }

    #[test]
    fn host_blocks() {
        let config = Config::decode_str(
            "Host Fred\n  Foo Bar\nHost Barney !Wilma *.bedrock # the others\n  Foo Baz\n",
        )
        .unwrap();
        assert_eq!(config.blocks().len(), 3);
        assert_eq!(host_patterns(&config.blocks()[1]), vec!["Fred"]);
        assert_eq!(
            host_patterns(&config.blocks()[2]),
            vec!["Barney", "!Wilma", "*.bedrock"]
        );
        assert_eq!(config.blocks()[2].comment(), Some(" the others"));
        assert_eq!(config.blocks()[2].nodes().len(), 1);
    }

    #[test]
    fn match_blocks() {
        let config = Config::decode_str(
            "Match OriginalHost testhost USER testuser\n  HostName hostname\nMatch all\nMatch final all\n",
        )
        .unwrap();
        let Block::Match(m) = &config.blocks()[1] else {
            panic!("expected a Match block")
        };
        assert_eq!(m.conditions.len(), 2);
        assert_eq!(m.conditions[0].attribute, MatchAttribute::OriginalHost);
        assert_eq!(m.conditions[1].attribute, MatchAttribute::User);
        assert_eq!(m.conditions[1].pattern.as_str(), "testuser");
        assert!(!config.blocks()[1].is_final());

        assert_eq!(host_patterns(&config.blocks()[2]), vec!["*"]);
        assert!(!config.blocks()[2].is_final());
        assert_eq!(host_patterns(&config.blocks()[3]), vec!["*"]);
        assert!(config.blocks()[3].is_final());
    }

    #[test]
    fn match_patterns_keep_their_case() {
        let config = Config::decode_str("Match user TestUser\n").unwrap();
        let Block::Match(m) = &config.blocks()[1] else {
            panic!("expected a Match block")
        };
        assert_eq!(m.conditions[0].pattern.as_str(), "TestUser");
    }

    #[test]
    fn bad_input() -> Result<()> {
        for (input, expected) in [
            ("Match canonical", "Match Canonical"),
            ("Match CANONICAL all", "Match Canonical"),
            ("Match final", "Match Final without All"),
            ("Match final host x", "attribute/pattern pairs"),
            ("Match final all user a", "Match final"),
            ("Match exec true", "Match exec"),
            ("Match user", "attribute/pattern pairs"),
            ("Match user a host", "attribute/pattern pairs"),
            ("Match user !", "empty pattern"),
            ("Host a !", "empty pattern"),
            ("Host", "missing argument"),
            ("Port #", "missing argument"),
            ("=x", "missing keyword"),
            ("Include \"unterminated", "unterminated quote"),
        ] {
            let err = Config::decode_str(input).unwrap_err();
            assert_contains_as_result!(err.to_string(), expected)
                .map_err(|e| anyhow!(e))
                .with_context(|| format!("input \"{input}\" failed"))?;
        }
        Ok(())
    }

    #[test]
    fn error_kinds() {
        assert!(matches!(
            Config::decode_str("Match canonical").unwrap_err(),
            Error::UnsupportedDirective { .. }
        ));
        assert!(matches!(
            Config::decode_str("Match user").unwrap_err(),
            Error::InvalidPattern { .. }
        ));
        assert!(matches!(
            Config::decode_str("Match final host x\n  Port 3\n").unwrap_err(),
            Error::InvalidPattern { .. }
        ));
        assert!(matches!(
            Config::decode_str("Match final all user a").unwrap_err(),
            Error::UnsupportedDirective { .. }
        ));
        assert!(matches!(
            Config::decode_str("Host !").unwrap_err(),
            Error::InvalidPattern { .. }
        ));
    }

    #[test]
    fn errors_carry_positions() {
        let err = Config::decode_str("Host a\n  User b\n  Match final\n").unwrap_err();
        assert_contains!(err.to_string(), "3:");
    }

    #[test]
    fn include_attaches_to_current_block() {
        let (path, _dir) = make_test_tempfile("Port 2222\n", "included.conf");
        let text = format!("Host a\n  Include {}\n", path.display());
        let config = Config::decode_str(&text).unwrap();
        let Node::Include(inc) = &config.blocks()[1].nodes()[0] else {
            panic!("expected an Include")
        };
        assert_eq!(inc.depth(), 1);
        let (file, sub) = inc.configs().next().unwrap();
        assert_eq!(file, path.as_path());
        assert_eq!(sub.depth(), 1);
        assert_eq!(sub.keys(), vec!["Port"]);
    }

    #[test]
    fn recursion_limit() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("test-recursion");
        let contents = format!(
            "
            include {path:?}
        "
        );
        std::fs::write(&path, contents).unwrap();
        let err = Config::from_path(&path).unwrap_err();
        assert!(matches!(err, Error::DepthExceeded));
    }
}
