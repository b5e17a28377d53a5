//! OS abstraction layer
// (c) 2024 Ross Younger

use std::path::PathBuf;

/// General platform abstraction trait.
/// The active implementation should be pulled into this crate
/// Implementations should be called `Platform`, e.g. [unix::Platform].
///
/// Usage:
/// ```
///    use sshconf::os::Platform;
///    use sshconf::os::AbstractPlatform as _;
///    println!("{}", Platform::system_ssh_config());
/// ```
pub trait AbstractPlatform {
    /// Path to the system ssh config file.
    /// On most platforms this will be `/etc/ssh/ssh_config`
    fn system_ssh_config() -> &'static str;

    /// The directory that relative Include paths in the system config file are resolved from.
    /// On most platforms this will be `/etc/ssh`
    fn system_ssh_dir() -> &'static str;

    /// Path to the user ssh config file.
    /// On most platforms this will be `${HOME}/.ssh/config`
    /// # Note
    /// This is a _theoretical_ path construction; it does not guarantee that the path actually exists.
    /// That is up to the caller to determine and reason about.
    ///
    /// Returns None if the current user's home directory could not be determined.
    fn user_ssh_config() -> Option<PathBuf>;

    /// The directory that relative Include paths in user config files are resolved from.
    /// On most platforms this will be `${HOME}/.ssh`
    fn user_ssh_dir() -> Option<PathBuf>;

    /// The name of the user running this process, if it can be determined
    fn local_username() -> Option<String>;
}

#[cfg(any(unix, doc))]
mod unix;

#[cfg(any(unix, doc))]
pub use unix::*;

static_assertions::assert_cfg!(unix, "This OS is not yet supported");
