// Main CLI entrypoint
// (c) 2024 Ross Younger

use std::{path::Path, process::ExitCode};

use anstream::{eprintln, print, println};
use anyhow::Context as _;
use clap::Parser;
use tabled::{settings::style::Style, Table, Tabled};
use tracing::debug;

use super::{
    args::{CliArgs, Command},
    styles::{ERROR, INFO, WARNING},
};
use crate::{
    config::Config,
    settings::Settings,
    util::setup_tracing,
};

/// Main CLI entrypoint
pub fn cli() -> anyhow::Result<ExitCode> {
    let args = CliArgs::parse();
    let trace_level = if args.debug {
        "trace"
    } else if args.quiet {
        "error"
    } else {
        "info"
    };
    setup_tracing(trace_level, args.log_file.as_deref()).inspect_err(|e| eprintln!("{e:?}"))?;

    let result = match &args.command {
        Command::Get {
            alias,
            key,
            user,
            all,
        } => get(&settings(&args), alias, key, user, *all),
        Command::Show { alias, user } => show(&settings(&args), alias, user, args.quiet),
        Command::Fmt { file, check } => fmt(file, *check),
    };
    result.or_else(|e| {
        eprintln!("{ERROR}ERROR{ERROR:#} {e:#}");
        Ok(ExitCode::FAILURE)
    })
}

fn settings(args: &CliArgs) -> Settings {
    let settings = Settings::new().ignore_errors(args.ignore_errors);
    match &args.config_file {
        Some(file) => settings.with_config_file(file),
        None => settings,
    }
}

/// Outputs the value(s); fails if there were none
fn get(
    settings: &Settings,
    alias: &str,
    key: &str,
    user: &str,
    all: bool,
) -> anyhow::Result<ExitCode> {
    let values = if all {
        settings.get_all(alias, key, user)?
    } else {
        settings.get(alias, key, user)?.into_iter().collect()
    };
    if values.is_empty() {
        debug!("{key} is not set for {alias}");
        return Ok(ExitCode::FAILURE);
    }
    for v in values {
        println!("{v}");
    }
    Ok(ExitCode::SUCCESS)
}

#[derive(Tabled)]
struct ShowRow {
    key: String,
    value: String,
}

/// Resolves every key that appears in any of the files we read
fn show(settings: &Settings, alias: &str, user: &str, quiet: bool) -> anyhow::Result<ExitCode> {
    let mut keys: Vec<String> = Vec::new();
    for config in settings.sources()? {
        for key in config.keys() {
            if !keys.iter().any(|k| k.eq_ignore_ascii_case(&key)) {
                keys.push(key);
            }
        }
    }
    if !quiet {
        for path in settings.source_paths()? {
            eprintln!("{INFO}Reading{INFO:#} {}", path.display());
        }
    }

    let mut rows = Vec::new();
    for key in keys {
        match settings.get(alias, &key, user) {
            Ok(Some(value)) => rows.push(ShowRow { key, value }),
            Ok(None) => (),
            Err(e) => eprintln!("{WARNING}WARNING{WARNING:#}: {e}"),
        }
    }
    println!("{}", Table::new(rows).with(Style::sharp()));
    Ok(ExitCode::SUCCESS)
}

/// Writes the file back out. With `check`, only compares.
fn fmt(file: &Path, check: bool) -> anyhow::Result<ExitCode> {
    let config = Config::from_path(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let output = config.to_string();
    if !check {
        print!("{output}");
        return Ok(ExitCode::SUCCESS);
    }
    let original = std::fs::read_to_string(file)?;
    if original == output {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!(
            "{WARNING}WARNING{WARNING:#}: {} would be rewritten",
            file.display()
        );
        Ok(ExitCode::FAILURE)
    }
}
