// sshconf command-line arguments
// (c) 2024 Ross Younger

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser, Clone)]
#[command(
    author,
    version(env!("SSHCONF_VERSION_STRING")),
    about,
    before_help = "e.g.   sshconf get my-server HostName",
    infer_long_args(true)
)]
#[command(help_template(
    "\
{name} version {version}
{about-with-newline}
{usage-heading} {usage}
{before-help}
{all-args}{after-help}
"
))]
#[command(styles=super::styles::CLAP_STYLES)]
pub(crate) struct CliArgs {
    /// Reads only this configuration file, instead of the user and system files
    #[arg(short = 'F', long = "config", global = true, value_name = "FILE")]
    pub(crate) config_file: Option<PathBuf>,

    /// Carries on if a configuration file could not be read
    #[arg(long, global = true, action)]
    pub(crate) ignore_errors: bool,

    /// Quiet mode
    ///
    /// Reports only errors
    #[arg(short, long, global = true, action, conflicts_with("debug"))]
    pub(crate) quiet: bool,

    /// Enable detailed debug output
    ///
    /// This has the same effect as setting `RUST_LOG=sshconf=trace` in the environment.
    /// If present, `RUST_LOG` overrides this option.
    #[arg(long, global = true, action, help_heading("Debug"))]
    pub(crate) debug: bool,

    /// Log to a file
    ///
    /// By default the log receives everything printed to stderr.
    /// To override this behaviour, set the environment variable `RUST_LOG_FILE_DETAIL` (same semantics as `RUST_LOG`).
    #[arg(short('l'), long, global = true, action, value_name("FILE"), help_heading("Debug"))]
    pub(crate) log_file: Option<String>,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub(crate) enum Command {
    /// Looks up a setting for a host
    Get {
        /// The host alias, as you would give it to ssh
        alias: String,
        /// The setting to look up (case insensitive)
        key: String,
        /// The remote user, if known
        #[arg(short, long, default_value = "")]
        user: String,
        /// Outputs every value for the setting, one per line
        #[arg(short, long, action)]
        all: bool,
    },
    /// Shows every configured setting for a host
    Show {
        /// The host alias, as you would give it to ssh
        alias: String,
        /// The remote user, if known
        #[arg(short, long, default_value = "")]
        user: String,
    },
    /// Reads a configuration file and writes it out again
    Fmt {
        /// The file to read
        file: PathBuf,
        /// Fails if the output would differ from the input, instead of printing it
        #[arg(long, action)]
        check: bool,
    },
}
