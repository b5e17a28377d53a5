// OS abstraction layer for sshconf - Unix implementation
// (c) 2024 Ross Younger

use std::path::PathBuf;

use nix::unistd::{getuid, User};
use tracing::{trace, warn};

use super::AbstractPlatform;

#[derive(Debug, Clone, Copy)]
/// Concretion of [`AbstractPlatform`] for Unix-like platforms
pub struct Platform {}

impl AbstractPlatform for Platform {
    fn system_ssh_config() -> &'static str {
        "/etc/ssh/ssh_config"
    }

    fn system_ssh_dir() -> &'static str {
        "/etc/ssh"
    }

    fn user_ssh_config() -> Option<PathBuf> {
        Some(Self::user_ssh_dir()?.join("config"))
    }

    fn user_ssh_dir() -> Option<PathBuf> {
        let Some(mut pb) = dirs::home_dir() else {
            warn!("could not determine home directory");
            return None;
        };
        pb.push(".ssh");
        Some(pb)
    }

    fn local_username() -> Option<String> {
        match User::from_uid(getuid()) {
            Ok(Some(user)) => Some(user.name),
            other => {
                trace!("no passwd entry for current user ({other:?}); trying $USER");
                std::env::var("USER").ok()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::Platform;
    use crate::os::AbstractPlatform as _;

    #[test]
    fn config_paths() {
        assert_eq!(Platform::system_ssh_config(), "/etc/ssh/ssh_config");
        let path = Platform::user_ssh_config().unwrap();
        assert!(path.ends_with(".ssh/config"));
        assert_eq!(path.parent(), Platform::user_ssh_dir().as_deref());
    }

    #[test]
    fn username() {
        let name = Platform::local_username().unwrap();
        assert!(!name.is_empty());
    }
}
