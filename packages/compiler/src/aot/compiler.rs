//! AOT Compiler
//!
//! Compiles a whole program ahead of time. Every source file that declares
//! modules, directives or pipes yields a `.ngsummary.json` file and, unless
//! only summaries are requested, one `.ngfactory` module holding the module
//! factories, directive wrappers, component views and component factories
//! declared in it. External stylesheets get an `.ngstyle` module each.
//!
//! Generated code refers to artifacts of other files by the symbol those
//! files will export, so files can be compiled in any order.

use super::analyzer::{analyze_and_validate_ng_modules, extract_program_symbols, NgAnalyzedFile, NgAnalyzedModules};
use super::compiler_host::AotCompilerHost;
use super::compiler_options::AotCompilerOptions;
use super::generated_file::{generated_code_suffix, ngfactory_module_url, styles_module_url, GeneratedFile};
use super::static_reflector::StaticReflector;
use super::static_symbol::{StaticSymbol, StaticSymbolCache};
use super::summary_resolver::AotSummaryResolver;
use crate::animation::{AnimationCompiler, AnimationParser};
use crate::aot::static_value::StaticValue;
use crate::compile_metadata::{
    create_host_component_meta, identifier_module_url, identifier_name, CompileDirectiveMetadata,
    CompileDirectiveSummary, CompileNgModuleMetadata, CompilePipeSummary, CompileProviderMetadata,
    CompileTokenMetadata, CompileTypeSummary,
};
use crate::compile_reflector::CompileReflector;
use crate::config::CompilerConfig;
use crate::directive_normalizer::DirectiveNormalizer;
use crate::directive_resolver::DirectiveResolver;
use crate::directive_wrapper_compiler::DirectiveWrapperCompiler;
use crate::error::{CompilerError, ErrorCollector, Result};
use crate::identifiers::{resolve_identifier, IdentifierSpec, Identifiers};
use crate::metadata_resolver::CompileMetadataResolver;
use crate::ng_module_compiler::NgModuleCompiler;
use crate::ng_module_resolver::NgModuleResolver;
use crate::output::js_emitter::{ImportResolver, JavaScriptEmitter};
use crate::output::output_ast::{self as o, ResolvedReference, Statement};
use crate::pipe_resolver::PipeResolver;
use crate::schema::{DomElementSchemaRegistry, ElementSchemaRegistry};
use crate::style_compiler::{CompiledStylesheet, StyleCompiler};
use crate::template_parser::TemplateParser;
use crate::view_compiler::{component_factory_name, host_type_name, ViewCompileDependency, ViewCompiler};
use futures::future::{self, FutureExt};
use std::rc::Rc;

/// Names imports of generated code the way the host wants them.
struct HostImportResolver(Rc<dyn AotCompilerHost>);

impl ImportResolver for HostImportResolver {
    fn file_name_to_module_name(&self, imported_file_path: &str, containing_file_path: &str) -> String {
        self.0
            .file_name_to_module_name(imported_file_path, containing_file_path)
    }
}

pub struct AotCompiler {
    options: AotCompilerOptions,
    host: Rc<dyn AotCompilerHost>,
    symbol_cache: Rc<StaticSymbolCache>,
    reflector: Rc<dyn CompileReflector>,
    metadata_resolver: CompileMetadataResolver,
    summary_resolver: Rc<AotSummaryResolver>,
    template_parser: TemplateParser,
    style_compiler: StyleCompiler,
    animation_parser: AnimationParser,
    animation_compiler: AnimationCompiler,
    view_compiler: ViewCompiler,
    dir_wrapper_compiler: DirectiveWrapperCompiler,
    ng_module_compiler: NgModuleCompiler,
    output_emitter: JavaScriptEmitter,
}

/// Wires an `AotCompiler` and all of its collaborators to `host`.
pub fn create_aot_compiler<H>(
    host: Rc<H>,
    options: AotCompilerOptions,
    error_collector: Option<Rc<dyn ErrorCollector>>,
) -> Result<AotCompiler>
where
    H: AotCompilerHost + 'static,
{
    let base_config = options.config.clone().unwrap_or_else(CompilerConfig::aot);
    let config = CompilerConfig {
        gen_debug_info: options.debug || base_config.gen_debug_info,
        log_binding_update: false,
        use_jit: false,
        ..base_config
    };
    let symbol_cache = Rc::new(StaticSymbolCache::new());
    let summary_resolver = Rc::new(AotSummaryResolver::new(
        host.clone(),
        symbol_cache.clone(),
        options.clone(),
    ));
    let reflector: Rc<dyn CompileReflector> = Rc::new(StaticReflector::new(
        host.clone(),
        symbol_cache.clone(),
        error_collector.clone(),
    )?);
    let schema_registry: Rc<dyn ElementSchemaRegistry> = Rc::new(DomElementSchemaRegistry::new());
    let metadata_resolver = CompileMetadataResolver::new(
        NgModuleResolver::new(reflector.clone()),
        DirectiveResolver::new(reflector.clone()),
        PipeResolver::new(reflector.clone()),
        summary_resolver.clone(),
        schema_registry.clone(),
        DirectiveNormalizer::new(host.clone(), config.clone()),
        reflector.clone(),
        error_collector,
    );
    Ok(AotCompiler {
        template_parser: TemplateParser::new(config.clone(), reflector.clone(), schema_registry.clone()),
        style_compiler: StyleCompiler::new(),
        animation_parser: AnimationParser::new(),
        animation_compiler: AnimationCompiler::new(reflector.clone()),
        view_compiler: ViewCompiler::new(config.clone(), reflector.clone(), schema_registry.clone()),
        dir_wrapper_compiler: DirectiveWrapperCompiler::new(config, reflector.clone(), schema_registry),
        ng_module_compiler: NgModuleCompiler::new(reflector.clone()),
        output_emitter: JavaScriptEmitter::new(Rc::new(HostImportResolver(host.clone()))),
        options,
        host,
        symbol_cache,
        reflector,
        metadata_resolver,
        summary_resolver,
    })
}

impl AotCompiler {
    pub fn reflector(&self) -> &Rc<dyn CompileReflector> {
        &self.reflector
    }

    pub fn metadata_resolver(&self) -> &CompileMetadataResolver {
        &self.metadata_resolver
    }

    pub fn symbol_cache(&self) -> &Rc<StaticSymbolCache> {
        &self.symbol_cache
    }

    pub fn clear_cache(&self) {
        self.metadata_resolver.clear_cache();
    }

    /// Symbols of `root_files` partitioned into modules. Fails when a
    /// directive or pipe belongs to no module.
    pub fn analyze_modules(&self, root_files: &[String]) -> Result<NgAnalyzedModules> {
        let program_symbols =
            extract_program_symbols(&self.symbol_cache, self.host.as_ref(), root_files, &self.options);
        tracing::debug!(symbols = program_symbols.len(), "extracted program symbols");
        analyze_and_validate_ng_modules(&program_symbols, &self.options, &self.metadata_resolver)
    }

    /// Compiles `root_files`, waiting for external templates and stylesheets
    /// to load first.
    pub async fn compile_all_async(&self, root_files: &[String]) -> Result<Vec<GeneratedFile>> {
        let analyzed = self.analyze_modules(root_files)?;
        let loading = analyzed
            .ng_modules
            .iter()
            .map(|ng_module| {
                self.metadata_resolver
                    .load_ng_module_directive_and_pipe_metadata(ng_module.reference(), false, true)
            })
            .collect::<Result<Vec<_>>>()?;
        future::try_join_all(loading).await?;
        self.emit_all(&analyzed)
    }

    /// Like `compile_all_async`, failing if any resource still has to load.
    pub fn compile_all_sync(&self, root_files: &[String]) -> Result<Vec<GeneratedFile>> {
        let analyzed = self.analyze_modules(root_files)?;
        for ng_module in &analyzed.ng_modules {
            let loaded = self
                .metadata_resolver
                .load_ng_module_directive_and_pipe_metadata(ng_module.reference(), true, true)?;
            match loaded.now_or_never() {
                Some(result) => result?,
                None => {
                    return Err(CompilerError::ComponentStillLoading {
                        type_name: identifier_name(ng_module.reference()),
                    })
                }
            }
        }
        self.emit_all(&analyzed)
    }

    fn emit_all(&self, analyzed: &NgAnalyzedModules) -> Result<Vec<GeneratedFile>> {
        let mut generated = Vec::new();
        for file in &analyzed.files {
            generated.extend(self.compile_src_file(file, analyzed)?);
        }
        tracing::info!(files = generated.len(), "generated files");
        Ok(generated)
    }

    fn compile_src_file(&self, file: &NgAnalyzedFile, analyzed: &NgAnalyzedModules) -> Result<Vec<GeneratedFile>> {
        let _span = tracing::info_span!("compile_file", file = %file.src_url).entered();
        let file_suffix = generated_code_suffix(&file.src_url);
        let mut generated = vec![self.create_summary(file)?];
        if self.options.skip_template_codegen {
            return Ok(generated);
        }

        let mut statements = Vec::new();
        let mut exported_vars = Vec::new();
        for ng_module_type in &file.ng_modules {
            exported_vars.push(self.compile_module(ng_module_type, &mut statements)?);
        }
        for dir_type in &file.directives {
            let comp_meta = self.metadata_resolver.get_directive_metadata(dir_type)?;
            let wrapper = self.dir_wrapper_compiler.compile(&comp_meta)?;
            statements.extend(wrapper.statements);
            exported_vars.push(wrapper.dir_wrapper_class_var);
            if !comp_meta.is_component {
                continue;
            }
            let ng_module = analyzed.ng_module_by_pipe_or_directive.get(dir_type).ok_or_else(|| {
                CompilerError::illegal_state(format!(
                    "Internal Error: cannot determine the module for component {}!",
                    identifier_name(dir_type)
                ))
            })?;
            let styles = self.style_compiler.compile_component(&comp_meta)?;
            for stylesheet in &styles.external_stylesheets {
                generated.push(self.codegen_styles(&file.src_url, stylesheet, file_suffix)?);
            }
            exported_vars.push(self.compile_component_factory(&comp_meta, ng_module, &mut statements)?);
            exported_vars.push(self.compile_component(
                &comp_meta,
                ng_module,
                self.template_directives(ng_module)?,
                Some(&styles.component_stylesheet),
                file_suffix,
                &mut statements,
            )?);
        }
        if !statements.is_empty() {
            let gen_file_url = ngfactory_module_url(&file.src_url);
            let source = self
                .output_emitter
                .emit_statements(&gen_file_url, &statements, &exported_vars)?;
            generated.push(GeneratedFile::new(&file.src_url, gen_file_url, source));
        }
        Ok(generated)
    }

    fn create_summary(&self, file: &NgAnalyzedFile) -> Result<GeneratedFile> {
        let mut summaries = Vec::new();
        for dir_type in &file.directives {
            summaries.push(CompileTypeSummary::Directive(
                self.metadata_resolver.get_directive_summary(dir_type)?,
            ));
        }
        for pipe_type in &file.pipes {
            summaries.push(CompileTypeSummary::Pipe(
                self.metadata_resolver.get_pipe_summary(pipe_type)?,
            ));
        }
        for ng_module_type in &file.ng_modules {
            if let Some(summary) = self.metadata_resolver.get_ng_module_summary(ng_module_type)? {
                summaries.push(CompileTypeSummary::NgModule(summary));
            }
        }
        self.summary_resolver
            .serialize_summaries(&file.src_url, &summaries)
    }

    fn compile_module(&self, ng_module_type: &StaticSymbol, statements: &mut Vec<Statement>) -> Result<String> {
        let ng_module = self
            .metadata_resolver
            .get_ng_module_metadata(ng_module_type, true)?
            .ok_or_else(|| {
                CompilerError::illegal_state(format!(
                    "Illegal state: no NgModule metadata for {}",
                    identifier_name(ng_module_type)
                ))
            })?;
        let mut providers = Vec::new();
        if let Some(locale) = &self.options.locale {
            providers.push(self.value_provider(&Identifiers::LOCALE_ID, locale)?);
        }
        if let Some(format) = &self.options.i18n_format {
            providers.push(self.value_provider(&Identifiers::TRANSLATIONS_FORMAT, format)?);
        }
        let result = self.ng_module_compiler.compile(&ng_module, &providers)?;
        for dep in &result.dependencies {
            dep.placeholder.resolve(ResolvedReference::Symbol(
                self.factory_file_symbol(&dep.comp, &component_factory_name(&dep.comp)),
            ))?;
        }
        statements.extend(result.statements);
        Ok(result.ng_module_factory_var)
    }

    fn value_provider(&self, token: &IdentifierSpec, value: &str) -> Result<CompileProviderMetadata> {
        let token = resolve_identifier(self.reflector.as_ref(), token)?;
        Ok(CompileProviderMetadata::use_value(
            CompileTokenMetadata::from_symbol(token),
            StaticValue::from(value),
        ))
    }

    /// `const <Comp>NgFactory = new ComponentFactory(selector, <host view>, Comp)`
    fn compile_component_factory(
        &self,
        comp_meta: &CompileDirectiveMetadata,
        ng_module: &CompileNgModuleMetadata,
        statements: &mut Vec<Statement>,
    ) -> Result<String> {
        let comp_type = comp_meta.reference();
        let host_type = self.factory_file_symbol(comp_type, &host_type_name(comp_type));
        let host_meta = create_host_component_meta(host_type, comp_meta);
        let host_view_var = self.compile_component(
            &host_meta,
            ng_module,
            vec![comp_meta.to_summary()],
            None,
            "",
            statements,
        )?;
        let comp_factory_var = component_factory_name(comp_type);
        statements.push(
            o::import_expr(resolve_identifier(self.reflector.as_ref(), &Identifiers::ComponentFactory)?)
                .instantiate(vec![
                    o::literal(comp_meta.selector.clone().unwrap_or_default()),
                    o::variable(host_view_var),
                    o::import_expr(comp_type.clone()),
                ])
                .to_decl_stmt(comp_factory_var.clone(), true),
        );
        Ok(comp_factory_var)
    }

    fn template_directives(&self, ng_module: &CompileNgModuleMetadata) -> Result<Vec<CompileDirectiveSummary>> {
        ng_module
            .transitive_module
            .directives
            .iter()
            .map(|dir| self.metadata_resolver.get_directive_summary(dir))
            .collect()
    }

    fn compile_component(
        &self,
        comp_meta: &CompileDirectiveMetadata,
        ng_module: &CompileNgModuleMetadata,
        directives: Vec<CompileDirectiveSummary>,
        component_styles: Option<&CompiledStylesheet>,
        file_suffix: &str,
        statements: &mut Vec<Statement>,
    ) -> Result<String> {
        let _span = tracing::debug_span!("compile_component", component = %comp_meta.type_.name()).entered();
        let template_meta = comp_meta.template.as_ref().ok_or_else(|| {
            CompilerError::illegal_state(format!(
                "Illegal state: {} is not a component",
                identifier_name(comp_meta.reference())
            ))
        })?;
        let pipes: Vec<CompilePipeSummary> = ng_module
            .transitive_module
            .pipes
            .iter()
            .map(|pipe| self.metadata_resolver.get_pipe_summary(pipe))
            .collect::<Result<_>>()?;
        let template_url = template_meta
            .template_url
            .clone()
            .unwrap_or_else(|| identifier_module_url(comp_meta.reference()).to_string());
        let parsed_template = self.template_parser.parse(
            comp_meta,
            template_meta.template.as_deref().unwrap_or_default(),
            &directives,
            &pipes,
            &ng_module.schemas,
            &template_url,
        )?;
        let parsed_animations = self.animation_parser.parse_component(comp_meta)?;
        let animations = self
            .animation_compiler
            .compile(&identifier_name(comp_meta.reference()), &parsed_animations)?;

        let styles_expr = match component_styles {
            Some(stylesheet) => {
                self.resolve_styles_dependencies(stylesheet, file_suffix)?;
                statements.extend(stylesheet.statements.iter().cloned());
                o::variable(stylesheet.styles_var.clone())
            }
            None => o::literal_arr(Vec::new()),
        };
        for animation in &animations {
            statements.extend(animation.statements.iter().cloned());
        }
        let view_result =
            self.view_compiler
                .compile_component(comp_meta, &parsed_template, styles_expr, &pipes, &animations)?;
        for dep in &view_result.dependencies {
            let symbol = match dep {
                ViewCompileDependency::ViewClass(dep) => self.factory_file_symbol(&dep.comp, &dep.name),
                ViewCompileDependency::DirectiveWrapper(dep) => self.factory_file_symbol(&dep.dir, &dep.name),
                ViewCompileDependency::ComponentFactory(dep) => {
                    self.factory_file_symbol(&dep.comp, &component_factory_name(&dep.comp))
                }
            };
            dep.placeholder().resolve(ResolvedReference::Symbol(symbol))?;
        }
        statements.extend(view_result.statements);
        Ok(view_result.view_class_var)
    }

    /// Symbol `name` exported by the factory file generated for the file
    /// declaring `ty`.
    fn factory_file_symbol(&self, ty: &StaticSymbol, name: &str) -> StaticSymbol {
        self.symbol_cache
            .get(&ngfactory_module_url(identifier_module_url(ty)), name, &[])
    }

    fn resolve_styles_dependencies(&self, stylesheet: &CompiledStylesheet, file_suffix: &str) -> Result<()> {
        for dep in &stylesheet.dependencies {
            let module_url = styles_module_url(&dep.module_url, dep.is_shimmed, file_suffix);
            let symbol = self.symbol_cache.get(&module_url, dep.set_value.name(), &[]);
            dep.set_value.resolve(ResolvedReference::Symbol(symbol))?;
        }
        Ok(())
    }

    fn codegen_styles(
        &self,
        src_file_url: &str,
        stylesheet: &CompiledStylesheet,
        file_suffix: &str,
    ) -> Result<GeneratedFile> {
        self.resolve_styles_dependencies(stylesheet, file_suffix)?;
        let stylesheet_url = stylesheet.meta.module_url.as_deref().unwrap_or(src_file_url);
        let gen_file_url = styles_module_url(stylesheet_url, stylesheet.is_shimmed, file_suffix);
        let source = self.output_emitter.emit_statements(
            &gen_file_url,
            &stylesheet.statements,
            &[stylesheet.styles_var.clone()],
        )?;
        Ok(GeneratedFile::new(src_file_url, gen_file_url, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aot::metadata_host::InMemoryMetadataHost;
    use futures::executor::block_on;
    use serde_json::{json, Value};

    fn core_call(name: &str, args: Value) -> Value {
        json!({
            "__symbolic": "call",
            "expression": {"__symbolic": "reference", "module": "@angular/core", "name": name},
            "arguments": [args]
        })
    }

    fn local(name: &str) -> Value {
        json!({"__symbolic": "reference", "name": name})
    }

    fn app_host(component: Value) -> Rc<InMemoryMetadataHost> {
        let host = InMemoryMetadataHost::with_angular_core();
        host.add_module(
            "/app/app.ts",
            json!({
                "AppComponent": {
                    "__symbolic": "class",
                    "decorators": [core_call("Component", component)],
                    "members": {"title": [{"__symbolic": "property"}]}
                },
                "AppModule": {
                    "__symbolic": "class",
                    "decorators": [core_call("NgModule", json!({
                        "declarations": [local("AppComponent")],
                        "bootstrap": [local("AppComponent")]
                    }))]
                }
            }),
        );
        Rc::new(host)
    }

    fn find<'a>(files: &'a [GeneratedFile], url: &str) -> &'a GeneratedFile {
        files
            .iter()
            .find(|f| f.gen_file_url == url)
            .unwrap_or_else(|| panic!("{} was not generated", url))
    }

    #[test]
    fn should_generate_factory_and_summary_files() {
        let host = app_host(json!({"selector": "app-root", "template": "<h1>{{title}}</h1>"}));
        let compiler = create_aot_compiler(host, AotCompilerOptions::default(), None).unwrap();
        let files = compiler.compile_all_sync(&["/app/app.ts".to_string()]).unwrap();

        let summary = find(&files, "/app/app.ngsummary.json");
        assert!(summary.source.contains("\"AppComponent\""));
        let factory = find(&files, "/app/app.ngfactory.js");
        assert_eq!(factory.src_file_url, "/app/app.ts");
        let source = &factory.source;
        assert!(source.contains("export const AppModuleNgFactory = new "));
        assert!(source.contains("export class Wrapper_AppComponent "));
        assert!(source.contains("export const AppComponentNgFactory = new "));
        assert!(source.contains("'app-root',View_AppComponent_Host0,"));
        assert!(source.contains("export class View_AppComponent0 "));
        assert!(source.contains("this.context.title"));
        assert!(source.contains("const styles_AppComponent = [];"));
        assert!(!source.contains("export class View_AppComponent_Host0"));
    }

    #[test]
    fn should_only_write_summaries_when_codegen_is_skipped() {
        let host = app_host(json!({"selector": "app-root", "template": "<h1>{{title}}</h1>"}));
        let options = AotCompilerOptions {
            skip_template_codegen: true,
            ..Default::default()
        };
        let compiler = create_aot_compiler(host, options, None).unwrap();
        let files = compiler.compile_all_sync(&["/app/app.ts".to_string()]).unwrap();
        let urls: Vec<&str> = files.iter().map(|f| f.gen_file_url.as_str()).collect();
        assert_eq!(urls, vec!["/app/app.ngsummary.json"]);
    }

    #[test]
    fn should_load_external_templates_and_stylesheets() {
        let host = app_host(json!({
            "selector": "app-root",
            "templateUrl": "./app.html",
            "styleUrls": ["./app.css"]
        }));
        host.add_resource("/app/app.html", "<p>{{title}}</p>");
        host.add_resource("/app/app.css", "p {color: red;}");
        let compiler = create_aot_compiler(host, AotCompilerOptions::default(), None).unwrap();
        let files = block_on(compiler.compile_all_async(&["/app/app.ts".to_string()])).unwrap();

        let styles = find(&files, "/app/app.css.shim.ngstyle.js");
        assert!(styles.source.contains("export const styles = ['p[_ngcontent-%COMP%] {color: red;}'];"));
        let factory = find(&files, "/app/app.ngfactory.js");
        assert!(factory.source.contains("from './app.css.shim.ngstyle';"));
        assert!(factory.source.contains("this.context.title"));
    }

    #[test]
    fn should_fail_for_directives_without_module() {
        let host = InMemoryMetadataHost::with_angular_core();
        host.add_module(
            "/app/orphan.ts",
            json!({
                "Orphan": {
                    "__symbolic": "class",
                    "decorators": [core_call("Directive", json!({"selector": "[orphan]"}))]
                }
            }),
        );
        let compiler = create_aot_compiler(Rc::new(host), AotCompilerOptions::default(), None).unwrap();
        let err = compiler
            .compile_all_sync(&["/app/orphan.ts".to_string()])
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("Cannot determine the module for class Orphan in /app/orphan.ts!"));
    }

    #[test]
    fn should_name_every_orphan_across_files() {
        let host = InMemoryMetadataHost::with_angular_core();
        host.add_module(
            "/app/orphan.ts",
            json!({
                "Orphan": {
                    "__symbolic": "class",
                    "decorators": [core_call("Directive", json!({"selector": "[orphan]"}))]
                }
            }),
        );
        host.add_module(
            "/app/stray.ts",
            json!({
                "StrayPipe": {
                    "__symbolic": "class",
                    "decorators": [core_call("Pipe", json!({"name": "stray"}))]
                }
            }),
        );
        let compiler = create_aot_compiler(Rc::new(host), AotCompilerOptions::default(), None).unwrap();
        let err = compiler
            .compile_all_sync(&["/app/orphan.ts".to_string(), "/app/stray.ts".to_string()])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot determine the module for class Orphan in /app/orphan.ts!\n\
             Cannot determine the module for class StrayPipe in /app/stray.ts!"
        );
    }
}
