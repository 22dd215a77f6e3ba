//! Lookup of pre-compiled summaries for types owned by other compilation
//! units.

use crate::aot::static_symbol::StaticSymbol;
use crate::compile_metadata::CompileTypeSummary;
use crate::error::Result;

pub trait SummaryResolver {
    /// Whether `file_path` belongs to an already compiled library.
    fn is_library_file(&self, file_path: &str) -> bool;

    /// Summary of `reference`, or `None` when it is compiled in this unit.
    fn resolve_summary(&self, reference: &StaticSymbol) -> Result<Option<CompileTypeSummary>>;
}

/// Resolver for compilations that see every type from source.
#[derive(Debug, Default, Clone, Copy)]
pub struct JitSummaryResolver;

impl SummaryResolver for JitSummaryResolver {
    fn is_library_file(&self, _file_path: &str) -> bool {
        false
    }

    fn resolve_summary(&self, _reference: &StaticSymbol) -> Result<Option<CompileTypeSummary>> {
        Ok(None)
    }
}
