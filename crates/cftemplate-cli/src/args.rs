//! Command-line argument definitions for the cftemplate CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Every compile setting given here overrides the value from
//! the configuration file.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use cftemplate::config::WritePolicy;

/// Command-line arguments for the cftemplate compiler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory to load templates from
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory to store the compiled templates in
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// File name pattern to compile (repeatable, replaces the configured set)
    #[arg(long = "include", value_name = "PATTERN")]
    pub includes: Vec<String>,

    /// File name pattern to skip (repeatable, replaces the configured set)
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub excludes: Vec<String>,

    /// Parameter default override as NAME=VALUE (repeatable)
    #[arg(
        short = 'P',
        long = "parameter",
        value_name = "NAME=VALUE",
        value_parser = parse_override
    )]
    pub parameters: Vec<(String, String)>,

    /// When to write documents for templates with errors
    #[arg(long, value_enum)]
    pub write_policy: Option<WritePolicyArg>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Command-line spelling of [`WritePolicy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WritePolicyArg {
    Always,
    SkipOnError,
}

impl From<WritePolicyArg> for WritePolicy {
    fn from(arg: WritePolicyArg) -> Self {
        match arg {
            WritePolicyArg::Always => WritePolicy::Always,
            WritePolicyArg::SkipOnError => WritePolicy::SkipOnError,
        }
    }
}

fn parse_override(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got `{raw}`")),
    }
}
