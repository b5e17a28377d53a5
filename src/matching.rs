//! Block matching
// (c) 2024 Ross Younger

use tracing::trace;

use crate::{
    block::{Block, Condition, MatchAttribute},
    node::Directive,
    os::{AbstractPlatform as _, Platform},
    pattern::Pattern,
};

/// The state of a lookup, against which blocks are matched.
///
/// A context is created for each top-level lookup. It changes as the lookup proceeds:
/// `User` and `HostName` directives found in matching blocks update `user` and `host`,
/// so that later `Match` blocks can react to them.
/// `Match final` blocks are collected here as they are passed over, to be evaluated
/// once the normal scan is complete.
#[derive(Debug, Clone, Default)]
pub struct MatchContext<'a> {
    /// Remote target user
    pub user: String,
    /// Target host name (initially the alias; updated by `HostName`)
    pub host: String,
    /// The user running the client
    pub local_user: String,
    /// The alias being looked up
    pub original_host: String,
    pub(crate) final_blocks: Vec<&'a Block>,
}

impl MatchContext<'_> {
    /// Creates a context for looking up `alias`.
    /// The local user is determined from the operating system.
    #[must_use]
    pub fn new(alias: &str, user: &str) -> Self {
        Self::with_local_user(alias, user, &Platform::local_username().unwrap_or_default())
    }

    /// Creates a context with an explicitly specified local user
    #[must_use]
    pub fn with_local_user(alias: &str, user: &str, local_user: &str) -> Self {
        Self {
            user: user.into(),
            host: alias.into(),
            local_user: local_user.into(),
            original_host: alias.into(),
            final_blocks: Vec::new(),
        }
    }

    /// The number of deferred `Match final` blocks collected so far
    #[must_use]
    pub fn deferred_count(&self) -> usize {
        self.final_blocks.len()
    }

    /// Updates the context from a directive we walked past in a matching block
    pub(crate) fn observe(&mut self, directive: &Directive) {
        let target = if directive.key.eq_ignore_ascii_case("user") {
            &mut self.user
        } else if directive.key.eq_ignore_ascii_case("hostname") {
            &mut self.host
        } else {
            return;
        };
        trace!("context: {} -> {}", directive.key, directive.value);
        target.clone_from(&directive.value);
    }

    fn attribute(&self, attribute: MatchAttribute) -> &str {
        match attribute {
            MatchAttribute::Host => &self.host,
            MatchAttribute::OriginalHost => &self.original_host,
            MatchAttribute::User => &self.user,
            MatchAttribute::LocalUser => &self.local_user,
        }
    }
}

/// Does a list of host patterns match?
///
/// At least one non-negated pattern must match. A match on any negated pattern
/// overrides everything else.
pub(crate) fn evaluate_host_match(host: &str, patterns: &[Pattern]) -> bool {
    let mut found = false;
    for pattern in patterns {
        if pattern.matches(host) {
            if pattern.is_negated() {
                return false;
            }
            found = true;
        }
    }
    found
}

/// Do all the conditions of a `Match` line hold?
///
/// An empty context value never matches.
pub(crate) fn evaluate_conditions(ctx: &MatchContext<'_>, conditions: &[Condition]) -> bool {
    conditions.iter().all(|c| {
        let value = ctx.attribute(c.attribute);
        !value.is_empty() && c.pattern.is_negated() != c.pattern.matches(value)
    })
}

impl Block {
    /// Does this block apply in the given context?
    ///
    /// Host blocks match against the original alias. Match blocks test their
    /// conditions against the live context.
    #[must_use]
    pub fn matches(&self, ctx: &MatchContext<'_>) -> bool {
        let result = match self {
            Block::Host(h) => evaluate_host_match(&ctx.original_host, &h.patterns),
            Block::Match(m) => evaluate_conditions(ctx, &m.conditions),
        };
        trace!("block at {} matches: {result}", self.position());
        result
    }
}

///////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::{evaluate_host_match, MatchContext};
    use crate::{
        block::{Block, Condition, MatchAttribute},
        node::Directive,
        pattern::Pattern,
    };
    use anyhow::{anyhow, Context, Result};
    use assertables::assert_eq_as_result;

    fn patterns(args: &[&str]) -> Vec<Pattern> {
        args.iter().map(|s| Pattern::new(s).unwrap()).collect()
    }

    #[test]
    fn host_matching() -> Result<()> {
        for (host, args, result) in [
            ("foo", vec!["foo"], true),
            ("foo", vec!["bar"], false),
            ("foo", vec!["bar", "foo"], true),
            ("foo", vec!["f?o"], true),
            ("fooo", vec!["f?o"], false),
            ("foo", vec!["f*"], true),
            ("oof", vec!["*of"], true),
            ("192.168.1.42", vec!["192.168.?.42"], true),
            ("192.168.10.42", vec!["192.168.?.42"], false),
            (
                "foo.dialup.example.com",
                vec!["*.example.com", "!*.dialup.example.com"],
                false,
            ),
            (
                "www.example.com",
                vec!["*.example.com", "!*.dialup.example.com"],
                true,
            ),
            ("foo", vec!["!bar"], false),
            ("foo", vec!["!foo", "*"], false),
        ] {
            assert_eq_as_result!(evaluate_host_match(host, &patterns(&args)), result)
                .map_err(|e| anyhow!(e))
                .with_context(|| format!("host {host}, args {args:?}"))?;
        }
        Ok(())
    }

    fn match_block(pairs: &[(MatchAttribute, &str)]) -> Block {
        Block::condition(
            pairs
                .iter()
                .map(|(a, p)| Condition::new(*a, Pattern::new(p).unwrap()))
                .collect(),
        )
    }

    #[test]
    fn conditions_must_all_hold() {
        let block = match_block(&[
            (MatchAttribute::OriginalHost, "testhost"),
            (MatchAttribute::User, "testuser"),
        ]);
        let ctx = MatchContext::with_local_user("testhost", "testuser", "me");
        assert!(block.matches(&ctx));
        let ctx = MatchContext::with_local_user("testhost", "other", "me");
        assert!(!block.matches(&ctx));
        let ctx = MatchContext::with_local_user("otherhost", "testuser", "me");
        assert!(!block.matches(&ctx));
    }

    #[test]
    fn empty_values_never_match() {
        let block = match_block(&[(MatchAttribute::User, "*")]);
        assert!(!block.matches(&MatchContext::with_local_user("h", "", "me")));
        let block = match_block(&[(MatchAttribute::User, "!root")]);
        assert!(!block.matches(&MatchContext::with_local_user("h", "", "me")));
    }

    #[test]
    fn negated_conditions() {
        let block = match_block(&[(MatchAttribute::LocalUser, "!root")]);
        assert!(block.matches(&MatchContext::with_local_user("h", "", "alice")));
        assert!(!block.matches(&MatchContext::with_local_user("h", "", "root")));
    }

    #[test]
    fn host_attribute_follows_hostname() {
        let block = match_block(&[(MatchAttribute::Host, "*.internal")]);
        let mut ctx = MatchContext::with_local_user("db", "", "me");
        assert!(!block.matches(&ctx));
        ctx.observe(&Directive::new("HOSTNAME", "db.internal"));
        assert!(block.matches(&ctx));
        assert_eq!(ctx.original_host, "db");
        ctx.observe(&Directive::new("user", "admin"));
        assert_eq!(ctx.user, "admin");
        ctx.observe(&Directive::new("Port", "22"));
        assert_eq!(ctx.host, "db.internal");
    }

    #[test]
    fn host_blocks_use_the_alias() {
        let block = Block::host(patterns(&["db"]));
        let mut ctx = MatchContext::with_local_user("db", "", "me");
        ctx.observe(&Directive::new("HostName", "db.internal"));
        assert!(block.matches(&ctx));
        assert!(Block::implicit().matches(&MatchContext::with_local_user("", "", "")));
    }
}
