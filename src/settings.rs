//! Looking things up across the usual configuration files
// (c) 2024 Ross Younger

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use tracing::{debug, warn};

use crate::{
    config::Config,
    errors::{Error, Result},
    matching::MatchContext,
    os::{AbstractPlatform as _, Platform},
    resolver::{resolve, resolve_all},
};

#[derive(Debug)]
struct Loaded {
    sources: Vec<Config>,
    /// The first error we hit, if any
    error: Option<Error>,
}

/// Resolves settings the way ssh does, from a custom config file or from
/// the user's and system-wide files.
///
/// Files are read on first use, and only once, no matter how many threads ask.
/// A problem reading them is remembered and reported to every caller,
/// unless [`Settings::ignore_errors`] is set.
///
/// ```no_run
/// use sshconf::Settings;
/// let settings = Settings::new();
/// let port = settings.get("myhost", "Port", "")?;
/// # Ok::<(), sshconf::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct Settings {
    ignore_errors: bool,
    custom: Option<PathBuf>,
    user: Option<PathBuf>,
    system: Option<PathBuf>,
    loaded: OnceLock<Loaded>,
}

impl Settings {
    /// Uses the platform's standard user and system config files
    #[must_use]
    pub fn new() -> Self {
        Self {
            user: Platform::user_ssh_config(),
            system: Some(Platform::system_ssh_config().into()),
            ..Default::default()
        }
    }

    /// Consults only this file. It must exist.
    #[must_use]
    pub fn with_config_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.custom = Some(path.into());
        self
    }

    /// Replaces the user config file
    #[must_use]
    pub fn with_user_config<P: Into<PathBuf>>(mut self, path: Option<P>) -> Self {
        self.user = path.map(Into::into);
        self
    }

    /// Replaces the system config file
    #[must_use]
    pub fn with_system_config<P: Into<PathBuf>>(mut self, path: Option<P>) -> Self {
        self.system = path.map(Into::into);
        self
    }

    /// If set, files that could not be read are treated as empty
    #[must_use]
    pub fn ignore_errors(mut self, ignore: bool) -> Self {
        self.ignore_errors = ignore;
        self
    }

    fn load(&self) -> Loaded {
        let loaded = self.read_sources();
        if let Some(e) = loaded.error.as_ref().filter(|_| self.ignore_errors) {
            warn!("ignoring configuration error: {e}");
        }
        loaded
    }

    fn read_sources(&self) -> Loaded {
        let mut loaded = Loaded {
            sources: Vec::new(),
            error: None,
        };
        if let Some(path) = &self.custom {
            match Config::from_path(path) {
                Ok(config) => loaded.sources.push(config),
                Err(e) => loaded.error = Some(e),
            }
            return loaded;
        }
        for path in [&self.user, &self.system].into_iter().flatten() {
            match Config::from_path(path) {
                Ok(config) => loaded.sources.push(config),
                Err(e) if e.is_not_found() => debug!("{} not found, skipping", path.display()),
                Err(e) => {
                    loaded.error = Some(e);
                    break;
                }
            }
        }
        loaded
    }

    fn loaded(&self) -> Result<&Loaded> {
        let loaded = self.loaded.get_or_init(|| self.load());
        match &loaded.error {
            Some(e) if !self.ignore_errors => Err(e.clone()),
            _ => Ok(loaded),
        }
    }

    /// The files that were read successfully, in the order they are consulted
    pub fn sources(&self) -> Result<&[Config]> {
        Ok(&self.loaded()?.sources)
    }

    /// The paths of the files that were read successfully
    pub fn source_paths(&self) -> Result<Vec<&Path>> {
        Ok(self.sources()?.iter().filter_map(Config::source).collect())
    }

    /// Looks up a single value for `key` when connecting to `alias` as `user`.
    ///
    /// `user` may be empty if not known. Returns `None` if the key has no value
    /// and no default.
    pub fn get(&self, alias: &str, key: &str, user: &str) -> Result<Option<String>> {
        let sources = self.sources()?;
        let mut ctx = MatchContext::new(alias, user);
        resolve(sources, key, &mut ctx)
    }

    /// Looks up every value for `key` when connecting to `alias` as `user`
    pub fn get_all(&self, alias: &str, key: &str, user: &str) -> Result<Vec<String>> {
        let sources = self.sources()?;
        let mut ctx = MatchContext::new(alias, user);
        Ok(resolve_all(sources, key, &mut ctx))
    }
}

///////////////////////////////////////////////////////////////////////////////////////
