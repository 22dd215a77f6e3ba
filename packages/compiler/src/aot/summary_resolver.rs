//! Summary resolution for ahead-of-time compilation.
//!
//! Types declared in library files are never analyzed from source; their
//! summaries are read from the `.ngsummary.json` file next to them.

use super::compiler_host::AotCompilerHost;
use super::compiler_options::AotCompilerOptions;
use super::generated_file::{summary_file_name, GeneratedFile};
use super::static_symbol::{StaticSymbol, StaticSymbolCache};
use super::summary_serializer::{deserialize_summaries, serialize_summaries};
use crate::compile_metadata::CompileTypeSummary;
use crate::error::{CompilerError, Result};
use crate::summary_resolver::SummaryResolver;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

pub struct AotSummaryResolver {
    host: Rc<dyn AotCompilerHost>,
    symbol_cache: Rc<StaticSymbolCache>,
    options: AotCompilerOptions,
    summary_cache: RefCell<HashMap<StaticSymbol, CompileTypeSummary>>,
    loaded_files: RefCell<HashSet<String>>,
}

impl AotSummaryResolver {
    pub fn new(
        host: Rc<dyn AotCompilerHost>,
        symbol_cache: Rc<StaticSymbolCache>,
        options: AotCompilerOptions,
    ) -> Self {
        AotSummaryResolver {
            host,
            symbol_cache,
            options,
            summary_cache: RefCell::new(HashMap::new()),
            loaded_files: RefCell::new(HashSet::new()),
        }
    }

    /// Writes the summaries of one source file. Module summaries pull in the
    /// summaries of the library directives and pipes they re-export, so
    /// consumers never need the library's own summary file.
    pub fn serialize_summaries(
        &self,
        src_file_url: &str,
        summaries: &[CompileTypeSummary],
    ) -> Result<GeneratedFile> {
        let mut all_summaries = summaries.to_vec();
        for summary in summaries {
            if let CompileTypeSummary::NgModule(module) = summary {
                for id in module.exported_directives.iter().chain(&module.exported_pipes) {
                    if self.is_library_file(id.file_path()) {
                        if let Some(reexported) = self.resolve_summary(id)? {
                            all_summaries.push(reexported);
                        }
                    }
                }
            }
        }
        let host = self.host.clone();
        let json = serialize_summaries(&all_summaries, |path| host.get_output_file_name(path))?;
        Ok(GeneratedFile::new(
            src_file_url,
            summary_file_name(src_file_url),
            json,
        ))
    }

    fn load_summary_file(&self, file_path: &str) -> Result<()> {
        let summary_file = summary_file_name(file_path);
        if !self.loaded_files.borrow_mut().insert(summary_file.clone()) {
            return Ok(());
        }
        let json = self.host.load_summary(&summary_file).ok_or_else(|| {
            tracing::error!(file = %summary_file, "error loading summary file");
            CompilerError::Summary {
                path: summary_file.clone(),
                message: "file not found".to_string(),
            }
        })?;
        let summaries = deserialize_summaries(&self.symbol_cache, &summary_file, &json)?;
        tracing::debug!(file = %summary_file, count = summaries.len(), "loaded summaries");
        let mut cache = self.summary_cache.borrow_mut();
        for summary in summaries {
            cache.insert(summary.reference().clone(), summary);
        }
        Ok(())
    }
}

impl SummaryResolver for AotSummaryResolver {
    fn is_library_file(&self, file_path: &str) -> bool {
        !self.options.filter_file(file_path) || !self.host.is_source_file(file_path)
    }

    fn resolve_summary(&self, reference: &StaticSymbol) -> Result<Option<CompileTypeSummary>> {
        let file_path = reference.file_path();
        if !self.is_library_file(file_path) {
            return Ok(None);
        }
        if let Some(summary) = self.summary_cache.borrow().get(reference) {
            return Ok(Some(summary.clone()));
        }
        self.load_summary_file(file_path)?;
        match self.summary_cache.borrow().get(reference) {
            Some(summary) => Ok(Some(summary.clone())),
            None => Err(CompilerError::syntax(format!(
                "Could not find the symbol {} in the summary file {}!",
                reference.name(),
                summary_file_name(file_path)
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aot::metadata_host::InMemoryMetadataHost;
    use crate::compile_metadata::{CompileNgModuleSummary, CompilePipeSummary, CompileTypeMetadata};
    use pretty_assertions::assert_eq;

    fn setup() -> (Rc<InMemoryMetadataHost>, Rc<StaticSymbolCache>, AotSummaryResolver) {
        let host = Rc::new(InMemoryMetadataHost::new());
        let cache = Rc::new(StaticSymbolCache::new());
        let resolver = AotSummaryResolver::new(host.clone(), cache.clone(), AotCompilerOptions::default());
        (host, cache, resolver)
    }

    fn pipe(cache: &StaticSymbolCache, file: &str, name: &str) -> CompileTypeSummary {
        CompileTypeSummary::Pipe(CompilePipeSummary {
            type_: CompileTypeMetadata::new(cache.get(file, name, &[])),
            name: name.to_lowercase(),
            pure: true,
        })
    }

    #[test]
    fn should_not_resolve_summaries_of_source_files() {
        let (_, cache, resolver) = setup();
        let symbol = cache.get("/app/a.ts", "A", &[]);
        assert!(!resolver.is_library_file("/app/a.ts"));
        assert_eq!(resolver.resolve_summary(&symbol).unwrap(), None);
    }

    #[test]
    fn should_load_library_summaries_once_per_file() {
        let (host, cache, resolver) = setup();
        let json = serialize_summaries(
            &[pipe(&cache, "/lib/pipes.d.ts", "LibPipe"), pipe(&cache, "/lib/pipes.d.ts", "OtherPipe")],
            |p| p.to_string(),
        )
        .unwrap();
        host.add_summary("/lib/pipes.ngsummary.json", json);

        let lib_pipe = cache.get("/lib/pipes.d.ts", "LibPipe", &[]);
        let summary = resolver.resolve_summary(&lib_pipe).unwrap().unwrap();
        assert!(summary.reference().ptr_eq(&lib_pipe));

        let missing = cache.get("/lib/pipes.d.ts", "Missing", &[]);
        assert_eq!(
            resolver.resolve_summary(&missing).unwrap_err().to_string(),
            "Could not find the symbol Missing in the summary file /lib/pipes.ngsummary.json!"
        );
    }

    #[test]
    fn should_fail_without_a_summary_file() {
        let (_, cache, resolver) = setup();
        let symbol = cache.get("/lib/none.d.ts", "X", &[]);
        let err = resolver.resolve_summary(&symbol).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid summary file /lib/none.ngsummary.json: file not found"
        );
    }

    #[test]
    fn should_add_reexported_library_summaries_to_module_summaries() {
        let (host, cache, resolver) = setup();
        let lib_pipe = pipe(&cache, "/lib/pipes.d.ts", "LibPipe");
        host.add_summary(
            "/lib/pipes.ngsummary.json",
            serialize_summaries(&[lib_pipe.clone()], |p| p.to_string()).unwrap(),
        );
        let module = CompileTypeSummary::NgModule(CompileNgModuleSummary {
            type_: CompileTypeMetadata::new(cache.get("/app/app.module.ts", "AppModule", &[])),
            entry_components: vec![],
            providers: vec![],
            modules: vec![],
            exported_directives: vec![],
            exported_pipes: vec![lib_pipe.reference().clone()],
        });

        let file = resolver
            .serialize_summaries("/app/app.module.ts", &[module.clone()])
            .unwrap();
        assert_eq!(file.gen_file_url, "/app/app.module.ngsummary.json");

        let reader = Rc::new(StaticSymbolCache::new());
        let read = deserialize_summaries(&reader, &file.gen_file_url, &file.source).unwrap();
        assert_eq!(read, vec![module, lib_pipe]);
    }
}
