//! CLI logic for the cftemplate compiler.
//!
//! Loads the configuration, layers the command-line settings on top and runs
//! one batch over the input directory.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, WritePolicyArg};

use log::info;

use cftemplate::{BatchSummary, CftemplateError, config::AppConfig};

/// Run the cftemplate CLI application
///
/// # Errors
///
/// Returns `CftemplateError` for:
/// - Configuration loading errors
/// - File I/O and directory walk errors
/// - Invalid include or exclude patterns
/// - A batch in which any template reported an error
pub fn run(args: &Args) -> Result<BatchSummary, CftemplateError> {
    let mut app_config = config::load_config(args.config.as_ref())?;
    apply_args(&mut app_config, args);

    info!(
        input_dir:% = app_config.compile.input_dir.display(),
        output_dir:% = app_config.compile.output_dir.display();
        "Compiling CloudFormation templates"
    );

    let summary = cftemplate::compile_all(app_config)?;

    info!(compiled = summary.compiled, skipped = summary.skipped; "Templates compiled");

    Ok(summary)
}

/// Command-line settings win over the configuration file.
fn apply_args(config: &mut AppConfig, args: &Args) {
    let compile = &mut config.compile;
    if let Some(input) = &args.input {
        compile.input_dir = input.clone();
    }
    if let Some(output) = &args.output {
        compile.output_dir = output.clone();
    }
    if !args.includes.is_empty() {
        compile.includes = args.includes.clone();
    }
    if !args.excludes.is_empty() {
        compile.excludes = args.excludes.clone();
    }
    if let Some(policy) = args.write_policy {
        compile.write_policy = policy.into();
    }
    for (name, value) in &args.parameters {
        config.parameters.insert(name.clone(), value.clone());
    }
}
