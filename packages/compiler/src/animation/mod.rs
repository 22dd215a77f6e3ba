//! Animation sub-compiler
//!
//! `AnimationParser` validates the triggers declared on a component and
//! normalizes them into `AnimationEntryAst`s. `AnimationCompiler` turns each
//! trigger into a factory function the generated views call whenever the
//! bound state of an element changes.

pub mod animation_ast;
pub mod animation_compiler;
pub mod animation_parser;

pub use animation_ast::*;
pub use animation_compiler::{AnimationCompiler, AnimationEntryCompileResult};
pub use animation_parser::AnimationParser;

/// State an element is in before it is inserted and after it is removed.
pub const EMPTY_STATE: &str = "void";
/// Matches every state.
pub const ANY_STATE: &str = "*";
/// Style value computed by the renderer when the animation runs.
pub const AUTO_STYLE: &str = "*";
