//! Output Module
//!
//! Language-neutral statement IR produced by the compilers, and the
//! JavaScript emitter that prints it.

pub mod abstract_emitter;
pub mod class_builder;
pub mod js_emitter;
pub mod output_ast;
