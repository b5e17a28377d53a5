//! Individual lines within a block
// (c) 2024 Ross Younger

use std::fmt::Display;

use crate::{includes::Include, lexer::Position};

/// Whitespace captured from a line, so we can write it back out exactly as we found it
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LineFormat {
    /// Whitespace before the keyword
    pub(crate) indent: String,
    /// Everything between the keyword and the value, including any `=`
    pub(crate) separator: String,
    /// Whitespace between the value and a trailing comment (or end of line)
    pub(crate) trailing: String,
}

impl Default for LineFormat {
    fn default() -> Self {
        Self {
            indent: String::new(),
            separator: " ".into(),
            trailing: String::new(),
        }
    }
}

impl LineFormat {
    pub(crate) fn has_equals(&self) -> bool {
        self.separator.contains('=')
    }
}

pub(crate) fn write_comment(
    f: &mut std::fmt::Formatter<'_>,
    comment: Option<&str>,
) -> std::fmt::Result {
    match comment {
        Some(c) => write!(f, "#{c}"),
        None => Ok(()),
    }
}

/// A line in a config file
#[derive(Debug, Clone)]
pub enum Node {
    /// A `Key Value` setting
    Directive(Directive),
    /// A line with only whitespace or a comment
    Empty(Empty),
    /// An `Include` directive, together with everything it pulled in
    Include(Box<Include>),
}

impl Node {
    /// Convenience constructor for a directive node
    #[must_use]
    pub fn directive(key: &str, value: &str) -> Self {
        Self::Directive(Directive::new(key, value))
    }

    /// Convenience constructor for a comment line. `text` is whatever follows the `#`.
    #[must_use]
    pub fn comment(text: &str) -> Self {
        Self::Empty(Empty {
            comment: Some(text.into()),
            ..Empty::default()
        })
    }

    /// Convenience constructor for a blank line
    #[must_use]
    pub fn blank() -> Self {
        Self::Empty(Empty::default())
    }

    /// Where this node was found, if it came from a file
    #[must_use]
    pub fn position(&self) -> Position {
        match self {
            Node::Directive(d) => d.position,
            Node::Empty(e) => e.position,
            Node::Include(i) => i.position(),
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Directive(d) => d.fmt(f),
            Node::Empty(e) => e.fmt(f),
            Node::Include(i) => i.fmt(f),
        }
    }
}

/// A `Key Value` line, possibly with a trailing comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// The keyword, as it was written (keys are matched case-insensitively)
    pub key: String,
    /// The value, without trailing whitespace
    pub value: String,
    /// Trailing comment, without the `#`
    pub comment: Option<String>,
    pub(crate) format: LineFormat,
    pub(crate) position: Position,
}

impl Directive {
    /// Constructor
    #[must_use]
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            comment: None,
            format: LineFormat::default(),
            position: Position::default(),
        }
    }

    /// Was this written as `Key = Value`?
    #[must_use]
    pub fn has_equals(&self) -> bool {
        self.format.has_equals()
    }

    /// Where this directive was found
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }
}

impl Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fmt = &self.format;
        write!(
            f,
            "{}{}{}{}{}",
            fmt.indent, self.key, fmt.separator, self.value, fmt.trailing
        )?;
        write_comment(f, self.comment.as_deref())
    }
}

/// A blank or comment-only line
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Empty {
    /// The comment text, without the `#`
    pub comment: Option<String>,
    pub(crate) indent: String,
    pub(crate) position: Position,
}

impl Display for Empty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.indent)?;
        write_comment(f, self.comment.as_deref())
    }
}
