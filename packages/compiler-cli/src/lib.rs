#![deny(clippy::all)]

/**
 * Angular View Compiler CLI
 *
 * Drives ahead-of-time compilation of a project from its metadata files.
 */
pub use angular_view_compiler as compiler;

// CLI-specific modules
pub mod compiler_host;
pub mod main_entry;
pub mod perform_compile;

/// CLI version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
