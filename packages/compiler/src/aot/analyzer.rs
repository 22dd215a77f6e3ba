//! Program analysis
//!
//! Partitions the symbols of a program into NgModules, indexes declared
//! directives and pipes per source file, and maps each of them to the module
//! that owns it.

use super::compiler_options::AotCompilerOptions;
use super::static_reflector::StaticReflectorHost;
use super::static_symbol::{StaticSymbol, StaticSymbolCache};
use crate::compile_metadata::CompileNgModuleMetadata;
use crate::error::{CompilerError, Result};
use crate::metadata_resolver::CompileMetadataResolver;
use indexmap::{IndexMap, IndexSet};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Everything compiled from one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct NgAnalyzedFile {
    pub src_url: String,
    pub directives: Vec<StaticSymbol>,
    pub pipes: Vec<StaticSymbol>,
    pub ng_modules: Vec<StaticSymbol>,
}

#[derive(Debug, Clone)]
pub struct NgAnalyzedModules {
    pub ng_modules: Vec<Rc<CompileNgModuleMetadata>>,
    pub ng_module_by_pipe_or_directive: HashMap<StaticSymbol, Rc<CompileNgModuleMetadata>>,
    pub files: Vec<NgAnalyzedFile>,
    /// Directives and pipes of the program that no module declares.
    pub symbols_missing_module: Vec<StaticSymbol>,
}

pub fn analyze_ng_modules(
    program_static_symbols: &[StaticSymbol],
    options: &AotCompilerOptions,
    metadata_resolver: &CompileMetadataResolver,
) -> Result<NgAnalyzedModules> {
    let (ng_modules, symbols_missing_module) =
        create_ng_modules(program_static_symbols, options, metadata_resolver)?;
    Ok(index_ng_modules(ng_modules, symbols_missing_module))
}

/// Like `analyze_ng_modules`, but fails when a directive or pipe of the
/// program belongs to no module.
pub fn analyze_and_validate_ng_modules(
    program_static_symbols: &[StaticSymbol],
    options: &AotCompilerOptions,
    metadata_resolver: &CompileMetadataResolver,
) -> Result<NgAnalyzedModules> {
    let result = analyze_ng_modules(program_static_symbols, options, metadata_resolver)?;
    if !result.symbols_missing_module.is_empty() {
        let messages: Vec<String> = result
            .symbols_missing_module
            .iter()
            .map(|s| {
                format!(
                    "Cannot determine the module for class {} in {}!",
                    s.name(),
                    s.file_path()
                )
            })
            .collect();
        return Err(CompilerError::syntax(messages.join("\n")));
    }
    Ok(result)
}

fn index_ng_modules(
    ng_module_metas: Vec<Rc<CompileNgModuleMetadata>>,
    symbols_missing_module: Vec<StaticSymbol>,
) -> NgAnalyzedModules {
    let mut ng_module_by_pipe_or_directive = HashMap::new();
    // Keyed by file, in first-seen order.
    let mut files: IndexMap<String, NgAnalyzedFile> = IndexMap::new();
    fn file_entry<'a>(files: &'a mut IndexMap<String, NgAnalyzedFile>, src_url: &str) -> &'a mut NgAnalyzedFile {
        files
            .entry(src_url.to_string())
            .or_insert_with(|| NgAnalyzedFile {
                src_url: src_url.to_string(),
                directives: Vec::new(),
                pipes: Vec::new(),
                ng_modules: Vec::new(),
            })
    }

    for ng_module_meta in &ng_module_metas {
        let module_ref = ng_module_meta.reference();
        file_entry(&mut files, module_ref.file_path())
            .ng_modules
            .push(module_ref.clone());
        for dir in &ng_module_meta.declared_directives {
            file_entry(&mut files, dir.file_path()).directives.push(dir.clone());
            ng_module_by_pipe_or_directive.insert(dir.clone(), ng_module_meta.clone());
        }
        for pipe in &ng_module_meta.declared_pipes {
            file_entry(&mut files, pipe.file_path()).pipes.push(pipe.clone());
            ng_module_by_pipe_or_directive.insert(pipe.clone(), ng_module_meta.clone());
        }
    }

    NgAnalyzedModules {
        ng_modules: ng_module_metas,
        ng_module_by_pipe_or_directive,
        files: files.into_values().collect(),
        symbols_missing_module,
    }
}

fn create_ng_modules(
    program_static_symbols: &[StaticSymbol],
    options: &AotCompilerOptions,
    metadata_resolver: &CompileMetadataResolver,
) -> Result<(Vec<Rc<CompileNgModuleMetadata>>, Vec<StaticSymbol>)> {
    struct Collector<'a> {
        options: &'a AotCompilerOptions,
        resolver: &'a CompileMetadataResolver,
        ng_modules: IndexMap<StaticSymbol, Rc<CompileNgModuleMetadata>>,
        declared: HashSet<StaticSymbol>,
    }

    impl Collector<'_> {
        fn add_ng_module(&mut self, symbol: &StaticSymbol) -> Result<bool> {
            if self.ng_modules.contains_key(symbol) || !self.options.filter_file(symbol.file_path()) {
                return Ok(false);
            }
            let ng_module = match self.resolver.get_ng_module_metadata(symbol, false)? {
                Some(ng_module) => ng_module,
                None => return Ok(false),
            };
            self.ng_modules
                .insert(ng_module.reference().clone(), ng_module.clone());
            self.declared.extend(ng_module.declared_directives.iter().cloned());
            self.declared.extend(ng_module.declared_pipes.iter().cloned());
            // Transitively imported modules are compiled too, even when the
            // program symbols don't list them.
            for module in &ng_module.transitive_module.modules {
                self.add_ng_module(&module.reference)?;
            }
            Ok(true)
        }
    }

    let mut collector = Collector {
        options,
        resolver: metadata_resolver,
        ng_modules: IndexMap::new(),
        declared: HashSet::new(),
    };
    let mut program_pipes_and_directives = IndexSet::new();
    for symbol in program_static_symbols {
        if !collector.add_ng_module(symbol)?
            && (metadata_resolver.is_directive(symbol)? || metadata_resolver.is_pipe(symbol)?)
        {
            program_pipes_and_directives.insert(symbol.clone());
        }
    }
    let symbols_missing_module = program_pipes_and_directives
        .into_iter()
        .filter(|s| !collector.declared.contains(s))
        .collect();
    Ok((collector.ng_modules.into_values().collect(), symbols_missing_module))
}

/// Every exported symbol of the given source files, skipping entries that
/// only record a metadata collection error.
pub fn extract_program_symbols(
    symbol_cache: &StaticSymbolCache,
    host: &dyn StaticReflectorHost,
    files: &[String],
    options: &AotCompilerOptions,
) -> Vec<StaticSymbol> {
    let mut static_symbols = Vec::new();
    for source_file in files.iter().filter(|f| options.filter_file(f)) {
        let records = match host.get_metadata_for(source_file) {
            Some(records) if !records.is_empty() => records,
            _ => {
                tracing::warn!(file = %source_file, "no metadata found");
                continue;
            }
        };
        let module_metadata = records
            .iter()
            .max_by_key(|record| record["version"].as_i64().unwrap_or(0));
        let metadata = match module_metadata.and_then(|m| m["metadata"].as_object()) {
            Some(metadata) => metadata,
            None => continue,
        };
        for (name, value) in metadata {
            if value["__symbolic"] == "error" {
                continue;
            }
            static_symbols.push(symbol_cache.get(source_file, name, &[]));
        }
    }
    static_symbols
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aot::metadata_host::InMemoryMetadataHost;
    use crate::aot::static_value::{MetadataKind, StaticValue};
    use crate::config::CompilerConfig;
    use crate::directive_normalizer::DirectiveNormalizer;
    use crate::directive_resolver::DirectiveResolver;
    use crate::ng_module_resolver::NgModuleResolver;
    use crate::pipe_resolver::PipeResolver;
    use crate::resource_loader::MapResourceLoader;
    use crate::schema::DomElementSchemaRegistry;
    use crate::summary_resolver::JitSummaryResolver;
    use crate::testing::{annotation, MockReflector};
    use pretty_assertions::assert_eq;
    use regex::Regex;
    use serde_json::json;

    fn resolver(reflector: &Rc<MockReflector>) -> CompileMetadataResolver {
        CompileMetadataResolver::new(
            NgModuleResolver::new(reflector.clone()),
            DirectiveResolver::new(reflector.clone()),
            PipeResolver::new(reflector.clone()),
            Rc::new(JitSummaryResolver),
            Rc::new(DomElementSchemaRegistry::new()),
            DirectiveNormalizer::new(Rc::new(MapResourceLoader::new()), CompilerConfig::default()),
            reflector.clone(),
            None,
        )
    }

    fn list(symbols: &[&StaticSymbol]) -> StaticValue {
        StaticValue::Array(symbols.iter().map(|s| StaticValue::Symbol((*s).clone())).collect())
    }

    /// A small program spread over several files:
    /// `AppModule` (a.ts) declares `DirA` (a.ts), `DirB` and `PipeB` (b.ts)
    /// and imports `SharedModule` (shared.ts), which declares `SharedDir`.
    /// `OrphanDir` and `OrphanPipe` live in their own files with no module.
    struct Program {
        reflector: Rc<MockReflector>,
        symbols: Vec<StaticSymbol>,
    }

    fn program() -> Program {
        let reflector = Rc::new(MockReflector::new());
        let directive = |file: &str, name: &str, selector: &str| {
            let ty = reflector.symbol(file, name);
            reflector.annotate(&ty, annotation(MetadataKind::Directive, &[("selector", selector.into())]));
            ty
        };
        let pipe = |file: &str, name: &str, pipe_name: &str| {
            let ty = reflector.symbol(file, name);
            reflector.annotate(&ty, annotation(MetadataKind::Pipe, &[("name", pipe_name.into())]));
            ty
        };
        let module = |file: &str, name: &str, fields: &[(&str, StaticValue)]| {
            let ty = reflector.symbol(file, name);
            reflector.annotate(&ty, annotation(MetadataKind::NgModule, fields));
            ty
        };

        let shared_dir = directive("/app/shared.ts", "SharedDir", "[shared]");
        let shared = module("/app/shared.ts", "SharedModule", &[("declarations", list(&[&shared_dir]))]);
        let dir_a = directive("/app/a.ts", "DirA", "[a]");
        let dir_b = directive("/app/b.ts", "DirB", "[b]");
        let pipe_b = pipe("/app/b.ts", "PipeB", "b");
        let app = module(
            "/app/a.ts",
            "AppModule",
            &[
                ("declarations", list(&[&dir_a, &pipe_b, &dir_b])),
                ("imports", list(&[&shared])),
            ],
        );
        let orphan_dir = directive("/app/orphan.ts", "OrphanDir", "[orphan]");
        let orphan_pipe = pipe("/app/lonely.ts", "OrphanPipe", "lonely");
        let plain = reflector.symbol("/app/a.ts", "Plain");
        let symbols = vec![app, dir_a, plain, dir_b, pipe_b, orphan_dir, orphan_pipe];
        Program { reflector, symbols }
    }

    fn names(symbols: &[StaticSymbol]) -> Vec<&str> {
        symbols.iter().map(StaticSymbol::name).collect()
    }

    #[test]
    fn should_group_modules_directives_and_pipes_per_file() {
        let program = program();
        let resolver = resolver(&program.reflector);
        let analyzed = analyze_ng_modules(&program.symbols, &AotCompilerOptions::default(), &resolver).unwrap();

        // SharedModule is pulled in through the import although the program
        // symbols don't list it.
        let modules: Vec<&str> = analyzed.ng_modules.iter().map(|m| m.reference().name()).collect();
        assert_eq!(modules, vec!["AppModule", "SharedModule"]);

        let files: Vec<(&str, Vec<&str>, Vec<&str>, Vec<&str>)> = analyzed
            .files
            .iter()
            .map(|f| {
                (
                    f.src_url.as_str(),
                    names(&f.ng_modules),
                    names(&f.directives),
                    names(&f.pipes),
                )
            })
            .collect();
        let expected: Vec<(&str, Vec<&str>, Vec<&str>, Vec<&str>)> = vec![
            ("/app/a.ts", vec!["AppModule"], vec!["DirA"], vec![]),
            ("/app/b.ts", vec![], vec!["DirB"], vec!["PipeB"]),
            ("/app/shared.ts", vec!["SharedModule"], vec!["SharedDir"], vec![]),
        ];
        assert_eq!(files, expected);

        let owner = |file: &str, name: &str| {
            let ty = program.reflector.symbol(file, name);
            analyzed.ng_module_by_pipe_or_directive[&ty].reference().name().to_string()
        };
        assert_eq!(owner("/app/b.ts", "PipeB"), "AppModule");
        assert_eq!(owner("/app/b.ts", "DirB"), "AppModule");
        assert_eq!(owner("/app/shared.ts", "SharedDir"), "SharedModule");

        assert_eq!(names(&analyzed.symbols_missing_module), vec!["OrphanDir", "OrphanPipe"]);
    }

    #[test]
    fn should_skip_modules_of_excluded_files() {
        let program = program();
        let resolver = resolver(&program.reflector);
        let options = AotCompilerOptions {
            exclude_file_pattern: Some(Regex::new(r"shared\.ts$").unwrap()),
            ..Default::default()
        };
        let analyzed = analyze_ng_modules(&program.symbols, &options, &resolver).unwrap();
        let modules: Vec<&str> = analyzed.ng_modules.iter().map(|m| m.reference().name()).collect();
        assert_eq!(modules, vec!["AppModule"]);
        assert!(analyzed.files.iter().all(|f| f.src_url != "/app/shared.ts"));
    }

    #[test]
    fn should_report_every_orphan_in_one_error() {
        let program = program();
        let resolver = resolver(&program.reflector);
        let err = analyze_and_validate_ng_modules(&program.symbols, &AotCompilerOptions::default(), &resolver)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot determine the module for class OrphanDir in /app/orphan.ts!\n\
             Cannot determine the module for class OrphanPipe in /app/lonely.ts!"
        );
    }

    #[test]
    fn should_accept_programs_without_orphans() {
        let mut program = program();
        program.symbols.retain(|s| !s.name().starts_with("Orphan"));
        let resolver = resolver(&program.reflector);
        let analyzed =
            analyze_and_validate_ng_modules(&program.symbols, &AotCompilerOptions::default(), &resolver).unwrap();
        assert!(analyzed.symbols_missing_module.is_empty());
        assert_eq!(analyzed.ng_modules.len(), 2);
    }

    #[test]
    fn should_list_exported_symbols_without_errors() {
        let host = InMemoryMetadataHost::new();
        host.add_module(
            "/app/a.ts",
            json!({
                "A": {"__symbolic": "class"},
                "b": 1,
                "Broken": {"__symbolic": "error", "message": "Reference to a local symbol"}
            }),
        );
        let cache = StaticSymbolCache::new();
        let files = vec!["/app/a.ts".to_string(), "/app/missing.ts".to_string()];
        let symbols = extract_program_symbols(&cache, &host, &files, &AotCompilerOptions::default());
        let names: Vec<&str> = symbols.iter().map(StaticSymbol::name).collect();
        assert_eq!(names, vec!["A", "b"]);
        assert!(symbols[0].ptr_eq(&cache.get("/app/a.ts", "A", &[])));
    }

    #[test]
    fn should_prefer_the_newest_metadata_version() {
        let host = InMemoryMetadataHost::new();
        host.add_metadata("/app/a.ts", json!({"__symbolic": "module", "version": 1, "metadata": {"Old": 1}}));
        host.add_metadata("/app/a.ts", json!({"__symbolic": "module", "version": 3, "metadata": {"New": 1}}));
        let cache = StaticSymbolCache::new();
        let symbols = extract_program_symbols(
            &cache,
            &host,
            &["/app/a.ts".to_string()],
            &AotCompilerOptions::default(),
        );
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name(), "New");
    }
}
