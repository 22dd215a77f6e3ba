//! Runtime compilation of modules and components.

pub mod compiler;
pub mod evaluator;

pub use compiler::{create_jit_compiler, JitCompiler, JitComponentFactory, ModuleBoundCompiler, ModuleWithComponentFactories};
pub use evaluator::{resolve_runtime_value, EmittedProgram, JitEvaluator, JitProgram, JitValue, ProxyClass, SourceEvaluator};
