//! Ahead-of-time compilation: static metadata, summaries and the program
//! compiler.

pub mod analyzer;
pub mod compiler;
pub mod compiler_host;
pub mod compiler_options;
pub mod generated_file;
pub mod metadata_host;
pub mod static_reflector;
pub mod static_symbol;
pub mod static_value;
pub mod summary_resolver;
pub mod summary_serializer;

pub use analyzer::{
    analyze_and_validate_ng_modules, analyze_ng_modules, extract_program_symbols, NgAnalyzedFile,
    NgAnalyzedModules,
};
pub use compiler::{create_aot_compiler, AotCompiler};
pub use compiler_host::AotCompilerHost;
pub use compiler_options::AotCompilerOptions;
pub use generated_file::GeneratedFile;
pub use metadata_host::InMemoryMetadataHost;
pub use static_reflector::{StaticReflector, StaticReflectorHost};
pub use static_symbol::{StaticSymbol, StaticSymbolCache};
pub use summary_resolver::AotSummaryResolver;
