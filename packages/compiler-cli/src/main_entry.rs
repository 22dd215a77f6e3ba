//! Main Entry Point
//!
//! Argument parsing, logging setup and the `ngc` driver.

use crate::perform_compile::{perform_compilation, read_configuration};
use anyhow::{bail, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub fn command() -> Command {
    Command::new("ngc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Angular template compiler (AOT)")
        .arg(
            Arg::new("project")
                .short('p')
                .long("project")
                .value_name("PATH")
                .help("Path to tsconfig.json or to the directory containing it"),
        )
        .arg(
            Arg::new("gen-dir")
                .long("gen-dir")
                .value_name("DIR")
                .help("Overrides angularCompilerOptions.genDir"),
        )
        .arg(
            Arg::new("jit-mode")
                .long("jit-mode")
                .action(ArgAction::SetTrue)
                .help("Not supported; JIT compilation happens at runtime"),
        )
        .arg(
            Arg::new("summaries-only")
                .long("summaries-only")
                .action(ArgAction::SetTrue)
                .help("Only write .ngsummary.json files"),
        )
}

/// Installs a stderr subscriber filtered by `NGC_LOG`, then `RUST_LOG`.
/// Logging stays off when neither is set.
pub fn init_logging() {
    let filter = std::env::var("NGC_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Runs one compilation for the parsed arguments.
pub fn run(matches: &ArgMatches) -> Result<()> {
    if matches.get_flag("jit-mode") {
        bail!("--jit-mode is not supported by ngc; compile modules at runtime with the JIT compiler instead");
    }
    let project = matches
        .get_one::<String>("project")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tsconfig.json"));
    let mut config = read_configuration(&project)?;
    if let Some(gen_dir) = matches.get_one::<String>("gen-dir") {
        config.gen_dir = Path::new(gen_dir).to_path_buf();
    }
    if matches.get_flag("summaries-only") {
        config.options.skip_template_codegen = true;
    }
    let result = perform_compilation(&config)?;
    tracing::info!(files = result.emitted.len(), "compilation finished");
    Ok(())
}

/// Main entry point for the compiler. Returns the process exit code.
pub fn main_fn<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = match command().try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() { 2 } else { 0 };
        }
    };
    match run(&matches) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_reject_jit_mode() {
        let matches = command().get_matches_from(["ngc", "--jit-mode"]);
        let err = run(&matches).unwrap_err();
        assert!(err.to_string().starts_with("--jit-mode is not supported"));
    }

    #[test]
    fn should_fail_without_a_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("tsconfig.json");
        let code = main_fn(["ngc", "-p", project.to_str().unwrap()]);
        assert_eq!(code, 1);
    }
}
