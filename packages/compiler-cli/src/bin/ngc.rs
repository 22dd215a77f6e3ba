/**
 * Angular Compiler CLI - ngc (ng compiler)
 *
 * Main entry point for Angular compilation
 */
use angular_view_compiler_cli::main_entry::{init_logging, main_fn};
use std::process;

fn main() {
    init_logging();
    process::exit(main_fn(std::env::args_os()));
}
