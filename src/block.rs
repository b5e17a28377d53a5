//! Host and Match blocks
// (c) 2024 Ross Younger

use std::fmt::Display;

use crate::{
    lexer::Position,
    node::{write_comment, LineFormat, Node},
    pattern::Pattern,
};

/// The attributes a `Match` line may test
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MatchAttribute {
    /// The target hostname, after any `HostName` substitution
    Host,
    /// The alias as given on the command line
    OriginalHost,
    /// The target user
    User,
    /// The user running the client
    LocalUser,
}

/// One `attribute pattern` pair from a `Match` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// What to test
    pub attribute: MatchAttribute,
    /// What it has to match
    pub pattern: Pattern,
}

impl Condition {
    /// Constructor
    #[must_use]
    pub fn new(attribute: MatchAttribute, pattern: Pattern) -> Self {
        Self { attribute, pattern }
    }
}

/// The header line of a block, as it was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Header {
    pub(crate) keyword: String,
    /// The arguments as they appeared, without trailing whitespace
    pub(crate) args: String,
    pub(crate) format: LineFormat,
    pub(crate) comment: Option<String>,
    pub(crate) position: Position,
}

impl Header {
    pub(crate) fn new(keyword: &str, args: String) -> Self {
        Self {
            keyword: keyword.into(),
            args,
            format: LineFormat::default(),
            comment: None,
            position: Position::default(),
        }
    }

    /// `Match all` and `Match final all` are stored as host blocks, but are written differently
    fn is_match(&self) -> bool {
        self.keyword.eq_ignore_ascii_case("match")
    }

    fn write(&self, f: &mut std::fmt::Formatter<'_>, args: &str) -> std::fmt::Result {
        self.write_as(f, &self.keyword, args)
    }

    fn write_as(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        keyword: &str,
        args: &str,
    ) -> std::fmt::Result {
        let fmt = &self.format;
        write!(
            f,
            "{}{}{}{}{}",
            fmt.indent, keyword, fmt.separator, args, fmt.trailing
        )?;
        write_comment(f, self.comment.as_deref())?;
        writeln!(f)
    }
}

/// Data common to both kinds of block
#[derive(Debug, Clone, Default)]
pub(crate) struct BlockData {
    pub(crate) nodes: Vec<Node>,
    pub(crate) is_final: bool,
    /// None for the implicit block at the top of every file
    pub(crate) header: Option<Header>,
}

impl BlockData {
    fn with_header(header: Header) -> Self {
        Self {
            nodes: Vec::new(),
            is_final: false,
            header: Some(header),
        }
    }
}

/// A `Host` block.
///
/// The implicit block at the top of every file, and `Match all` blocks, are also represented this way.
#[derive(Debug, Clone)]
pub struct HostBlock {
    /// The patterns from the `Host` line
    pub patterns: Vec<Pattern>,
    pub(crate) data: BlockData,
}

/// A `Match` block with one or more conditions, all of which must hold
#[derive(Debug, Clone)]
pub struct MatchBlock {
    /// The conditions from the `Match` line, in the order written
    pub conditions: Vec<Condition>,
    pub(crate) data: BlockData,
}

/// A group of directives, guarded by a `Host` or `Match` line
#[derive(Debug, Clone)]
pub enum Block {
    /// Guarded by host alias patterns
    Host(HostBlock),
    /// Guarded by attribute conditions
    Match(MatchBlock),
}

fn join_patterns(patterns: &[Pattern]) -> String {
    patterns
        .iter()
        .map(Pattern::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

impl Block {
    /// The implicit `Host *` at the top of every file. It has no header line.
    #[must_use]
    pub fn implicit() -> Self {
        Self::Host(HostBlock {
            patterns: vec![Pattern::any()],
            data: BlockData::default(),
        })
    }

    /// Creates a `Host` block
    #[must_use]
    pub fn host(patterns: Vec<Pattern>) -> Self {
        let header = Header::new("Host", join_patterns(&patterns));
        Self::Host(HostBlock {
            patterns,
            data: BlockData::with_header(header),
        })
    }

    /// Creates a `Match` block
    #[must_use]
    pub fn condition(conditions: Vec<Condition>) -> Self {
        let mut block = MatchBlock {
            conditions,
            data: BlockData::with_header(Header::new("Match", String::new())),
        };
        let args = block.render_conditions();
        if let Some(h) = block.data.header.as_mut() {
            h.args = args;
        }
        Self::Match(block)
    }

    /// Creates a `Match all` or `Match final all` block.
    ///
    /// If its patterns are later changed from `*`, it is written out as a `Host` line,
    /// which has no `final` form.
    #[must_use]
    pub fn match_all(is_final: bool) -> Self {
        let args = if is_final { "final all" } else { "all" };
        Self::Host(HostBlock {
            patterns: vec![Pattern::any()],
            data: BlockData {
                nodes: Vec::new(),
                is_final,
                header: Some(Header::new("Match", args.into())),
            },
        })
    }

    pub(crate) fn with_header(mut self, header: Header) -> Self {
        self.data_mut().header = Some(header);
        self
    }

    fn data(&self) -> &BlockData {
        match self {
            Block::Host(h) => &h.data,
            Block::Match(m) => &m.data,
        }
    }

    fn data_mut(&mut self) -> &mut BlockData {
        match self {
            Block::Host(h) => &mut h.data,
            Block::Match(m) => &mut m.data,
        }
    }

    /// The lines within this block
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.data().nodes
    }

    /// Mutable access to the lines within this block
    pub fn nodes_mut(&mut self) -> &mut Vec<Node> {
        &mut self.data_mut().nodes
    }

    /// Appends a line to this block
    pub fn push_node(&mut self, node: Node) {
        self.data_mut().nodes.push(node);
    }

    /// Is this a deferred (`Match final ...`) block?
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.data().is_final
    }

    /// Is this the implicit block at the top of a file?
    #[must_use]
    pub fn is_implicit(&self) -> bool {
        self.data().header.is_none()
    }

    /// The trailing comment on the block's header line, if any
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.data().header.as_ref()?.comment.as_deref()
    }

    /// Where the header line was found
    #[must_use]
    pub fn position(&self) -> Position {
        self.data()
            .header
            .as_ref()
            .map(|h| h.position)
            .unwrap_or_default()
    }
}

impl MatchBlock {
    fn render_conditions(&self) -> String {
        if self.conditions.is_empty() {
            return "all".into();
        }
        self.conditions
            .iter()
            .map(|c| format!("{} {}", c.attribute, c.pattern))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Are the conditions still those we read from the file?
    fn unchanged_since_parse(&self, args: &str) -> bool {
        let words: Vec<_> = args.split_whitespace().collect();
        words.len() == self.conditions.len() * 2
            && words.chunks(2).zip(&self.conditions).all(|(pair, c)| {
                pair[0].eq_ignore_ascii_case(&c.attribute.to_string())
                    && pair[1] == c.pattern.as_str()
            })
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(header) = &self.data().header {
            match self {
                Block::Host(h) if header.is_match() => {
                    if h.patterns.iter().map(Pattern::as_str).eq(["*"]) {
                        header.write(f, &header.args)?;
                    } else {
                        header.write_as(f, "Host", &join_patterns(&h.patterns))?;
                    }
                }
                Block::Host(h) => {
                    if header.args.split_whitespace().eq(h.patterns.iter().map(Pattern::as_str)) {
                        header.write(f, &header.args)?;
                    } else {
                        header.write(f, &join_patterns(&h.patterns))?;
                    }
                }
                Block::Match(m) => {
                    if m.unchanged_since_parse(&header.args) {
                        header.write(f, &header.args)?;
                    } else {
                        header.write(f, &m.render_conditions())?;
                    }
                }
            }
        }
        for node in self.nodes() {
            writeln!(f, "{node}")?;
        }
        Ok(())
    }
}

///////////////////////////////////////////////////////////////////////////////////////
