//! Lossless parser and resolver for OpenSSH client configuration files
// (c) 2024 Ross Younger
//!
//! This crate reads `ssh_config` files into a tree of [`Block`]s and [`Node`]s that
//! remembers comments, blank lines and spacing, so that a file can be modified
//! programmatically and written back out with its layout intact.
//!
//! It also answers the question ssh itself asks: "what is the value of this setting
//! when connecting to that host?"
//!
//! ```
//! use sshconf::{Config, MatchContext};
//! let config = Config::decode_str("Host wap\n  User root\n")?;
//! let mut ctx = MatchContext::with_local_user("wap", "", "me");
//! assert_eq!(config.get("User", &mut ctx).as_deref(), Some("root"));
//! assert_eq!(config.to_string(), "Host wap\n  User root\n");
//! # Ok::<(), sshconf::Error>(())
//! ```
//!
//! To look settings up the way ssh does, across the user's and system-wide files, use [`Settings`].
//!
//! Supported `Match` criteria are `all`, `final all`, `host`, `originalhost`, `user` and `localuser`.

mod block;
mod cli;
pub use cli::cli;
mod config;
pub mod defaults;
mod errors;
mod includes;
mod lexer;
mod matching;
mod node;
/// OS abstraction layer
pub mod os;
mod parser;
mod pattern;
mod resolver;
mod settings;
/// Utilities
pub mod util;
mod validators;

pub use block::{Block, Condition, HostBlock, MatchAttribute, MatchBlock};
pub use config::{Config, SourceKind, INCLUDE_DEPTH_LIMIT};
pub use errors::{Error, Result};
pub use includes::Include;
pub use lexer::{Lexer, Position, Token, TokenKind};
pub use matching::MatchContext;
pub use node::{Directive, Empty, Node};
pub use pattern::Pattern;
pub use resolver::{apply_modifiers, resolve, resolve_all};
pub use settings::Settings;
pub use validators::validate;
