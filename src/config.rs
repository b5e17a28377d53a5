//! Parsed configuration files
// (c) 2024 Ross Younger

use std::{
    fmt::Display,
    io::Read,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    block::Block,
    errors::{Error, Result},
    lexer::position_of,
    node::Node,
    os::{AbstractPlatform as _, Platform},
    parser::Parser,
};

/// The maximum nesting level for Include directives.
/// Exceeding it is fatal to the whole decode ([`Error::DepthExceeded`]).
pub const INCLUDE_DEPTH_LIMIT: u8 = 5;

/// Whether a file is the user's own configuration or the system-wide one.
///
/// This determines where relative Include paths are resolved from, and is passed
/// down unchanged to included files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    /// Relative includes are found in `~/.ssh`
    #[default]
    User,
    /// Relative includes are found in `/etc/ssh`
    System,
}

impl SourceKind {
    /// Guesses the kind of a file from where it lives
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        if path.starts_with(Platform::system_ssh_dir()) {
            SourceKind::System
        } else {
            SourceKind::User
        }
    }
}

/// An ssh configuration file.
///
/// The file begins with an implicit block matching all hosts, which holds any
/// directives that appear before the first `Host` or `Match` line.
/// It is always present and is never written out with a header line.
///
/// Rendering a `Config` with [`Display`] reproduces the text it was parsed from.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) blocks: Vec<Block>,
    depth: u8,
    pub(crate) kind: SourceKind,
    source: Option<PathBuf>,
    pub(crate) trailing_newline: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Creates an empty configuration, containing only the implicit block
    #[must_use]
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::implicit()],
            depth: 0,
            kind: SourceKind::User,
            source: None,
            trailing_newline: true,
        }
    }

    pub(crate) fn with_depth(depth: u8) -> Self {
        Self {
            depth,
            ..Self::new()
        }
    }

    /// Decodes a user configuration from bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::decode_bytes(bytes, SourceKind::User, 0)
    }

    /// Decodes a user configuration from a string
    pub fn decode_str(s: &str) -> Result<Self> {
        Parser::new(s, SourceKind::User, 0).parse()
    }

    /// Reads and decodes a user configuration
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut buf = Vec::new();
        let _ = reader
            .read_to_end(&mut buf)
            .map_err(|e| Error::io("<reader>", e))?;
        Self::decode(&buf)
    }

    /// Reads and decodes a configuration file.
    /// Files under `/etc/ssh` are taken to be system configuration.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        Self::parse_with_depth(path, SourceKind::for_path(path), 0)
    }

    /// Reads and decodes a configuration file of the given kind
    pub fn from_path_as<P: AsRef<Path>>(path: P, kind: SourceKind) -> Result<Self> {
        Self::parse_with_depth(path.as_ref(), kind, 0)
    }

    pub(crate) fn parse_with_depth(path: &Path, kind: SourceKind, depth: u8) -> Result<Self> {
        debug!("reading {} ({kind:?})", path.display());
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        let mut config = Self::decode_bytes(&bytes, kind, depth)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    pub(crate) fn decode_bytes(bytes: &[u8], kind: SourceKind, depth: u8) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            Error::parse(position_of(bytes, e.valid_up_to()), "invalid UTF-8")
        })?;
        Parser::new(text, kind, depth).parse()
    }

    /// The blocks in this file, starting with the implicit block
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Mutable access to the blocks in this file
    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    /// Appends a block. Subsequent calls to [`Config::push_node`] add to it.
    pub fn push_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Appends a node to the most recent block
    pub fn push_node(&mut self, node: Node) {
        if self.blocks.is_empty() {
            self.blocks.push(Block::implicit());
        }
        if let Some(block) = self.blocks.last_mut() {
            block.push_node(node);
        }
    }

    /// Include nesting level of this file (0 for a top-level file)
    #[must_use]
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// The file this configuration was read from, if any
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Whether this is a user or system file
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Every directive keyword used in this file and anything it includes,
    /// in the order first seen, ignoring case.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut output = Vec::new();
        self.collect_keys(&mut output);
        output
    }

    fn collect_keys(&self, output: &mut Vec<String>) {
        for node in self.blocks.iter().flat_map(Block::nodes) {
            match node {
                Node::Directive(d) => {
                    if !output.iter().any(|k| k.eq_ignore_ascii_case(&d.key)) {
                        output.push(d.key.clone());
                    }
                }
                Node::Include(inc) => {
                    for (_, config) in inc.configs() {
                        config.collect_keys(output);
                    }
                }
                Node::Empty(_) => (),
            }
        }
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.trailing_newline {
            for block in &self.blocks {
                block.fmt(f)?;
            }
            return Ok(());
        }
        // The input had no final newline, so neither do we
        let mut text = String::new();
        for block in &self.blocks {
            text.push_str(&block.to_string());
        }
        f.write_str(text.strip_suffix('\n').unwrap_or(&text))
    }
}

///////////////////////////////////////////////////////////////////////////////////////
