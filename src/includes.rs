//! Include directive logic
// (c) 2024 Ross Younger

use std::{
    collections::{BTreeMap, HashSet},
    fmt::Display,
    path::{Path, PathBuf},
};

use glob::{glob_with, MatchOptions};
use tracing::debug;

use crate::{
    config::{Config, SourceKind, INCLUDE_DEPTH_LIMIT},
    errors::{Error, Result},
    lexer::Position,
    node::{write_comment, LineFormat},
    os::{AbstractPlatform as _, Platform},
};

/// Splits Include arguments.
///
/// Arguments are separated by spaces or tabs. Single or double quotes group words together,
/// and `\\`, `\"` and `\'` escape the following character. Any other backslash is literal.
pub(crate) fn split_args(input: &str) -> std::result::Result<Vec<String>, &'static str> {
    let mut output = Vec::new();
    let mut chars = input.chars().peekable();
    loop {
        while chars.next_if(|c| *c == ' ' || *c == '\t').is_some() {}
        if chars.peek().is_none() {
            return Ok(output);
        }
        let mut word = String::new();
        let mut quote = None;
        while let Some(ch) = chars.next() {
            match (ch, quote) {
                ('\\', _) => match chars.next_if(|n| matches!(*n, '\'' | '"' | '\\')) {
                    Some(escaped) => word.push(escaped),
                    None => word.push(ch),
                },
                (' ' | '\t', None) => break,
                ('\'' | '"', None) => quote = Some(ch),
                (c, Some(q)) if c == q => quote = None,
                (c, _) => word.push(c),
            }
        }
        if quote.is_some() {
            return Err("unterminated quote");
        }
        output.push(word);
    }
}

/// Works out where an Include argument points, before glob expansion.
///
/// `~` expansion is only permitted in user configuration files.
/// Relative paths are taken relative to `~/.ssh` for user files, or `/etc/ssh` for system files.
pub(crate) fn include_path(
    arg: &str,
    kind: SourceKind,
    user_dir: Option<&Path>,
) -> std::result::Result<PathBuf, String> {
    let path = if arg.starts_with('~') {
        if kind == SourceKind::System {
            return Err(
                "include paths may not start with ~ in a system configuration file".into(),
            );
        }
        expanduser::expanduser(arg)
            .map_err(|e| format!("expanding include expression {arg}: {e}"))?
    } else {
        PathBuf::from(arg)
    };
    if path.is_absolute() {
        return Ok(path);
    }
    match kind {
        SourceKind::User => {
            let Some(dir) = user_dir else {
                return Err("could not determine home directory".into());
            };
            Ok(dir.join(path))
        }
        SourceKind::System => Ok(Path::new(Platform::system_ssh_dir()).join(path)),
    }
}

/// Wildcard matching for Include directives.
///
/// Each argument is expanded independently; the results are concatenated in argument order
/// and de-duplicated, keeping the first occurrence.
fn find_include_files(args: &[String], kind: SourceKind) -> std::result::Result<Vec<PathBuf>, String> {
    let user_dir = Platform::user_ssh_dir();
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_leading_dot: true,
        require_literal_separator: true,
    };
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for arg in args {
        let path = include_path(arg, kind, user_dir.as_deref())?;
        let entries = glob_with(path.to_string_lossy().as_ref(), options)
            .map_err(|e| format!("bad include pattern {arg}: {e}"))?;
        for entry in entries.flatten() {
            if seen.insert(entry.clone()) {
                result.push(entry);
            }
        }
    }
    Ok(result)
}

/// An Include directive, together with the files it pulled in.
///
/// Included files are parsed as soon as the directive is read, and are never re-read.
/// Lookups consult them in the order their names were found.
/// At most [`INCLUDE_DEPTH_LIMIT`] levels of nested Include are permitted.
#[derive(Debug, Clone)]
pub struct Include {
    /// Arguments, after unquoting
    args: Vec<String>,
    /// Matching files, in the order found
    matches: Vec<PathBuf>,
    files: BTreeMap<PathBuf, Config>,
    depth: u8,
    position: Position,
    keyword: String,
    /// The arguments as written
    raw_args: String,
    format: LineFormat,
    comment: Option<String>,
}

impl Include {
    /// Expands and parses the files named by `args`.
    ///
    /// `depth` is the nesting level of this directive; the top-level file is at 0,
    /// so an Include within it is at 1.
    ///
    /// Any error within an included file aborts the whole Include.
    /// [`Error::DepthExceeded`] is passed through unchanged.
    pub fn resolve(
        args: Vec<String>,
        kind: SourceKind,
        depth: u8,
        position: Position,
    ) -> Result<Self> {
        if depth > INCLUDE_DEPTH_LIMIT {
            return Err(Error::DepthExceeded);
        }
        let matches =
            find_include_files(&args, kind).map_err(|message| Error::parse(position, message))?;
        let mut files = BTreeMap::new();
        for path in &matches {
            debug!("including {} at depth {depth}", path.display());
            let config = Config::parse_with_depth(path, kind, depth).map_err(|e| match e {
                Error::DepthExceeded => e,
                _ => Error::Include {
                    position,
                    path: path.clone(),
                    source: Box::new(e),
                },
            })?;
            let _ = files.insert(path.clone(), config);
        }
        let raw_args = args.join(" ");
        Ok(Self {
            args,
            matches,
            files,
            depth,
            position,
            keyword: "Include".into(),
            raw_args,
            format: LineFormat::default(),
            comment: None,
        })
    }

    pub(crate) fn with_layout(
        mut self,
        keyword: &str,
        raw_args: &str,
        format: LineFormat,
        comment: Option<String>,
    ) -> Self {
        keyword.clone_into(&mut self.keyword);
        raw_args.clone_into(&mut self.raw_args);
        self.format = format;
        self.comment = comment;
        self
    }

    /// The arguments to the directive
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The files that were included, in lookup order
    pub fn configs(&self) -> impl Iterator<Item = (&Path, &Config)> {
        self.matches
            .iter()
            .filter_map(|m| self.files.get(m).map(|c| (m.as_path(), c)))
    }

    /// Nesting level of this directive
    #[must_use]
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Where the directive was found
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// The trailing comment, if any
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

impl Display for Include {
    /// Writes out the directive as it was written. Included content is not repeated.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fmt = &self.format;
        write!(
            f,
            "{}{}{}{}{}",
            fmt.indent, self.keyword, fmt.separator, self.raw_args, fmt.trailing
        )?;
        write_comment(f, self.comment.as_deref())
    }
}

///////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use std::path::{Path, PathBuf};

    use anyhow::{anyhow, Context, Result};
    use assertables::{assert_contains, assert_contains_as_result, assert_eq_as_result};

    use super::{include_path, split_args, Include};
    use crate::{
        config::{Config, SourceKind},
        errors::Error,
        lexer::Position,
    };

    #[test]
    fn arg_splitting() -> Result<()> {
        for (input, expected) in [
            ("", vec![]),
            ("a", vec!["a"]),
            ("   a    b   ", vec!["a", "b"]),
            (r#"a\ \' \"b"#, vec!["a\\", "'", "\"b"]),
            (r#""a b" 'c d'"#, vec!["a b", "c d"]),
            (r#""a \"b" '\'c d'"#, vec!["a \"b", "'c d"]),
        ] {
            let msg = || format!("input \"{input}\" failed");
            assert_eq_as_result!(split_args(input).map_err(|e| anyhow!(e))?, expected)
                .map_err(|e| anyhow!(e))
                .with_context(msg)?;
        }
        for input in ["aaa\"bbb", "'"] {
            let err = split_args(input).unwrap_err();
            assert_contains_as_result!(err, "unterminated quote")
                .map_err(|e| anyhow!(e))
                .with_context(|| format!("input \"{input}\" failed"))?;
        }
        Ok(())
    }

    #[test]
    fn relative_paths() {
        let home = Path::new("/home/u/.ssh");
        assert_eq!(
            include_path("config.d/*", SourceKind::User, Some(home)).unwrap(),
            PathBuf::from("/home/u/.ssh/config.d/*")
        );
        assert_eq!(
            include_path("config.d/*", SourceKind::System, Some(home)).unwrap(),
            PathBuf::from("/etc/ssh/config.d/*")
        );
        assert_eq!(
            include_path("/abs/file", SourceKind::User, Some(home)).unwrap(),
            PathBuf::from("/abs/file")
        );
        let _ = include_path("x", SourceKind::User, None).unwrap_err();
        let e = include_path("~/x", SourceKind::System, Some(home)).unwrap_err();
        assert_contains!(e, "may not start with ~");
    }

    #[test]
    fn depth_limit() {
        let e = Include::resolve(vec![], SourceKind::User, 6, Position::default()).unwrap_err();
        assert!(matches!(e, Error::DepthExceeded));
        let _ = Include::resolve(vec![], SourceKind::User, 5, Position::default()).unwrap();
    }

    #[test]
    fn merges_and_deduplicates_in_argument_order() {
        let tempdir = tempfile::tempdir().unwrap();
        let b = tempdir.path().join("b.conf");
        let a = tempdir.path().join("a.conf");
        std::fs::write(&b, "User bee\n").unwrap();
        std::fs::write(&a, "User ay\n").unwrap();
        let glob = tempdir.path().join("*.conf");
        let args = vec![
            b.to_string_lossy().to_string(),
            glob.to_string_lossy().to_string(),
        ];
        let inc = Include::resolve(args, SourceKind::User, 1, Position::default()).unwrap();
        let files: Vec<_> = inc.configs().map(|(p, _)| p.to_path_buf()).collect();
        assert_eq!(files, vec![b, a]);
    }

    #[test]
    fn no_matches_is_fine() {
        let tempdir = tempfile::tempdir().unwrap();
        let glob = tempdir.path().join("nothing-*");
        let inc = Include::resolve(
            vec![glob.to_string_lossy().to_string()],
            SourceKind::User,
            1,
            Position::default(),
        )
        .unwrap();
        assert_eq!(inc.configs().count(), 0);
    }

    #[test]
    fn nested_errors_abort() {
        let tempdir = tempfile::tempdir().unwrap();
        let bad = tempdir.path().join("bad.conf");
        std::fs::write(&bad, "Match canonical\n").unwrap();
        let err = Include::resolve(
            vec![bad.to_string_lossy().to_string()],
            SourceKind::User,
            1,
            Position { line: 7, col: 1 },
        )
        .unwrap_err();
        assert!(matches!(err, Error::Include { .. }));
        assert_contains!(err.to_string(), "7:1");
    }

    #[test]
    fn serializes_only_the_directive() {
        let (path, _dir) = crate::util::make_test_tempfile("User x\n", "inc.conf");
        let text = format!("Include {}   # more\n", path.display());
        let config = Config::decode_str(&text).unwrap();
        assert_eq!(config.to_string(), text);
    }
}
