//! Directive lookup
// (c) 2024 Ross Younger
//!
//! Lookups come in two flavours. `get` returns the first value found and stops looking;
//! `get_all` collects every value for the key from every matching block.
//!
//! Both work against a [`MatchContext`], which the caller shares across all the files it
//! consults. `Match final` blocks are not evaluated where they appear; they are collected
//! in the context, and examined only if nothing else produced a value.

use tracing::trace;

use crate::{
    block::Block,
    config::Config,
    defaults::{default_for, DEFAULT_IDENTITY_FILES},
    errors::Result,
    includes::Include,
    matching::MatchContext,
    node::Node,
    validators::validate,
};

/// Keys whose values may be written relative to their default list with `+`, `-` or `^`
const MODIFIABLE_KEYS: &[&str] = &["Ciphers", "MACs", "HostKeyAlgorithms", "KexAlgorithms"];

fn scan_block<'a>(block: &'a Block, key: &str, ctx: &mut MatchContext<'a>) -> Option<String> {
    for node in block.nodes() {
        match node {
            Node::Empty(_) => (),
            Node::Directive(d) => {
                if d.key.eq_ignore_ascii_case(key) && !d.value.is_empty() {
                    return Some(d.value.clone());
                }
                ctx.observe(d);
            }
            Node::Include(inc) => {
                if let Some(v) = inc.get(key, ctx) {
                    return Some(v);
                }
            }
        }
    }
    None
}

fn scan_block_all<'a>(
    block: &'a Block,
    key: &str,
    ctx: &mut MatchContext<'a>,
    output: &mut Vec<String>,
) {
    for node in block.nodes() {
        match node {
            Node::Empty(_) => (),
            Node::Directive(d) => {
                if d.key.eq_ignore_ascii_case(key) && !d.value.is_empty() {
                    output.push(d.value.clone());
                }
                ctx.observe(d);
            }
            Node::Include(inc) => output.extend(inc.get_all(key, ctx)),
        }
    }
}

impl Config {
    /// Finds the first value for `key` in a block that matches `ctx`.
    ///
    /// Keys are compared without regard to case.
    /// `Match final` blocks are collected into `ctx` rather than examined.
    /// This does not consult defaults, apply modifiers or validate; see [`resolve`].
    pub fn get<'a>(&'a self, key: &str, ctx: &mut MatchContext<'a>) -> Option<String> {
        for block in &self.blocks {
            if block.is_final() {
                ctx.final_blocks.push(block);
                continue;
            }
            if !block.matches(ctx) {
                continue;
            }
            if let Some(v) = scan_block(block, key, ctx) {
                trace!("{key} found at {}", block.position());
                return Some(v);
            }
        }
        None
    }

    /// Finds every value for `key`, in file order, from all blocks that match `ctx`.
    pub fn get_all<'a>(&'a self, key: &str, ctx: &mut MatchContext<'a>) -> Vec<String> {
        let mut output = Vec::new();
        for block in &self.blocks {
            if block.is_final() {
                ctx.final_blocks.push(block);
            } else if block.matches(ctx) {
                scan_block_all(block, key, ctx, &mut output);
            }
        }
        output
    }

    /// Convenience wrapper: resolves `key` for `alias` using this file alone
    pub fn lookup(&self, alias: &str, key: &str, user: &str) -> Result<Option<String>> {
        let mut ctx = MatchContext::new(alias, user);
        resolve(std::slice::from_ref(self), key, &mut ctx)
    }
}

impl Include {
    /// Looks in each included file in turn, returning the first value found
    pub fn get<'a>(&'a self, key: &str, ctx: &mut MatchContext<'a>) -> Option<String> {
        self.configs().find_map(|(_, config)| config.get(key, ctx))
    }

    /// Concatenates the values from every included file
    pub fn get_all<'a>(&'a self, key: &str, ctx: &mut MatchContext<'a>) -> Vec<String> {
        self.configs()
            .flat_map(|(_, config)| config.get_all(key, ctx))
            .collect()
    }
}

impl<'a> MatchContext<'a> {
    /// A copy of this context for examining a deferred block.
    /// Directives within final blocks do not feed back into the lookup.
    fn scratch(&self) -> MatchContext<'a> {
        MatchContext {
            final_blocks: Vec::new(),
            ..self.clone()
        }
    }

    /// Examines the deferred `Match final` blocks, in the order they were found
    pub fn match_final(&self, key: &str) -> Option<String> {
        self.final_blocks
            .iter()
            .copied()
            .filter(|b| b.matches(self))
            .find_map(|b| scan_block(b, key, &mut self.scratch()))
    }

    /// Collects values for `key` from every deferred block that matches
    pub fn match_final_all(&self, key: &str) -> Vec<String> {
        let mut output = Vec::new();
        for block in self.final_blocks.iter().copied().filter(|b| b.matches(self)) {
            scan_block_all(block, key, &mut self.scratch(), &mut output);
        }
        output
    }
}

/// Rewrites a list value that starts with `+`, `-` or `^` relative to the key's default list.
///
/// * `+a,b` appends to the default list
/// * `-a,b` removes from the default list
/// * `^a,b` moves those members of the default list to the front
///
/// Other values, and values for keys that do not take modifiers, are returned unchanged.
#[must_use]
pub fn apply_modifiers(key: &str, value: &str) -> String {
    if !MODIFIABLE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key)) {
        return value.to_owned();
    }
    let mut chars = value.chars();
    let Some(modifier @ ('+' | '-' | '^')) = chars.next() else {
        return value.to_owned();
    };
    let given: Vec<&str> = chars.as_str().split(',').collect();
    let default: Vec<&str> = default_for(key).unwrap_or_default().split(',').collect();

    let output: Vec<&str> = match modifier {
        '+' => default.iter().chain(&given).copied().collect(),
        '-' => default
            .iter()
            .copied()
            .filter(|d| !given.contains(d))
            .collect(),
        _ => {
            let mut front: Vec<&str> = given
                .iter()
                .copied()
                .filter(|g| default.contains(g))
                .collect();
            let rest: Vec<&str> = default
                .iter()
                .copied()
                .filter(|d| !front.contains(d))
                .collect();
            front.extend(rest);
            front
        }
    };
    output.join(",")
}

/// Resolves a single value across a list of sources, in priority order.
///
/// The first source holding a value wins. If none does, the deferred `Match final`
/// blocks collected from every source are examined. A value found either way has
/// list modifiers applied and is then validated.
/// Failing all that, the key's default is returned, or `None` if it has none.
pub fn resolve<'a>(
    sources: &'a [Config],
    key: &str,
    ctx: &mut MatchContext<'a>,
) -> Result<Option<String>> {
    let found = sources
        .iter()
        .find_map(|s| s.get(key, ctx))
        .or_else(|| ctx.match_final(key));
    if let Some(value) = found {
        let value = apply_modifiers(key, &value);
        validate(key, &value)?;
        return Ok(Some(value));
    }
    Ok(default_for(key).map(str::to_owned))
}

/// Resolves every value for a key across a list of sources.
///
/// The first source holding any values wins, then the deferred blocks, then defaults.
/// `IdentityFile` defaults to [`DEFAULT_IDENTITY_FILES`].
/// Values are returned as written.
#[must_use]
pub fn resolve_all<'a>(sources: &'a [Config], key: &str, ctx: &mut MatchContext<'a>) -> Vec<String> {
    for source in sources {
        let found = source.get_all(key, ctx);
        if !found.is_empty() {
            return found;
        }
    }
    let found = ctx.match_final_all(key);
    if !found.is_empty() {
        return found;
    }
    if key.eq_ignore_ascii_case("IdentityFile") {
        return DEFAULT_IDENTITY_FILES.iter().map(|s| (*s).to_owned()).collect();
    }
    default_for(key).map(|d| vec![d.to_owned()]).unwrap_or_default()
}

///////////////////////////////////////////////////////////////////////////////////////
