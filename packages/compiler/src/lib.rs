#![deny(clippy::all)]

/**
 * Angular View Compiler
 *
 * Compiles Angular modules, components and templates into `AppView`
 * classes, ahead of time from static metadata or just in time at runtime.
 */

// Core modules (root level)
pub mod compile_metadata;
pub mod compile_reflector;
pub mod config;
pub mod core;
pub mod error;
pub mod identifiers;
pub mod parse_util;
pub mod resource_loader;
pub mod selector;
pub mod shadow_css;
pub mod style_url_resolver;
pub mod url_resolver;
pub mod util;

// Parser modules
pub mod expression_parser;
pub mod ml_parser;
pub mod template_parser;

// Metadata
pub mod directive_normalizer;
pub mod directive_resolver;
pub mod metadata_resolver;
pub mod ng_module_resolver;
pub mod pipe_resolver;
pub mod provider_analyzer;
pub mod schema;
pub mod summary_resolver;

// Compilation modules
pub mod animation;
pub mod compiler_util;
pub mod directive_wrapper_compiler;
pub mod ng_module_compiler;
pub mod output;
pub mod style_compiler;
pub mod view_compiler;

// Drivers
pub mod aot;
pub mod jit;

#[doc(hidden)]
pub mod testing;

// Re-exports
pub use aot::{create_aot_compiler, AotCompiler, AotCompilerHost, AotCompilerOptions, GeneratedFile};
pub use config::CompilerConfig;
pub use error::{CompilerError, Result};
pub use jit::{create_jit_compiler, JitCompiler, JitEvaluator, SourceEvaluator};
