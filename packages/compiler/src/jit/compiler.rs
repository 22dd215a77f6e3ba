//! JIT Compiler
//!
//! Compiles modules and their components at runtime. Every compiled artifact
//! is cached by type: component views, host views, directive wrappers and
//! module factories. Views refer to each other through proxies, so mutually
//! recursive components compile in any order.

use super::evaluator::{JitEvaluator, JitProgram, JitValue, ProxyClass};
use crate::animation::{AnimationCompiler, AnimationParser};
use crate::aot::static_reflector::{StaticReflector, StaticReflectorHost};
use crate::aot::static_symbol::{StaticSymbol, StaticSymbolCache};
use crate::compile_metadata::{
    create_host_component_meta, identifier_name, CompileDirectiveMetadata, CompileFactoryMetadata,
    CompileNgModuleMetadata, CompileProviderMetadata, CompileTokenMetadata,
};
use crate::compile_reflector::CompileReflector;
use crate::config::CompilerConfig;
use crate::directive_normalizer::DirectiveNormalizer;
use crate::directive_resolver::DirectiveResolver;
use crate::directive_wrapper_compiler::DirectiveWrapperCompiler;
use crate::error::{CompilerError, Result};
use crate::identifiers::{resolve_identifier, Identifiers};
use crate::metadata_resolver::CompileMetadataResolver;
use crate::ng_module_compiler::NgModuleCompiler;
use crate::ng_module_resolver::NgModuleResolver;
use crate::output::output_ast::{self as o, ResolvedReference, Statement};
use crate::pipe_resolver::PipeResolver;
use crate::resource_loader::ResourceLoader;
use crate::schema::{DomElementSchemaRegistry, ElementSchemaRegistry};
use crate::style_compiler::{CompiledStylesheet, StyleCompiler};
use crate::summary_resolver::JitSummaryResolver;
use crate::template_parser::TemplateParser;
use crate::view_compiler::{host_type_name, ViewCompileDependency, ViewCompiler};
use futures::future::{self, FutureExt, LocalBoxFuture, TryFutureExt};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Runtime counterpart of a generated `<Comp>NgFactory`.
#[derive(Clone)]
pub struct JitComponentFactory {
    pub selector: String,
    /// Proxy of the host view class.
    pub view_class: JitValue,
    pub component_type: StaticSymbol,
}

/// Result of `compile_module_and_all_components_*`.
#[derive(Clone)]
pub struct ModuleWithComponentFactories {
    pub ng_module_factory: JitValue,
    pub component_factories: Vec<JitValue>,
}

/// A component view (or host view) to compile, created before any view of
/// the batch is compiled so that every dependency already has a proxy.
struct CompiledTemplate {
    is_host: bool,
    comp_type: StaticSymbol,
    comp_meta: Rc<CompileDirectiveMetadata>,
    ng_module: Rc<CompileNgModuleMetadata>,
    directives: Vec<StaticSymbol>,
    proxy_view_class: ProxyClass,
    proxy_component_factory: Option<JitValue>,
}

impl CompiledTemplate {
    fn new(
        is_host: bool,
        selector: Option<String>,
        comp_type: StaticSymbol,
        comp_meta: Rc<CompileDirectiveMetadata>,
        ng_module: Rc<CompileNgModuleMetadata>,
        directives: Vec<StaticSymbol>,
    ) -> Self {
        let proxy_view_class = ProxyClass::new(identifier_name(&comp_type));
        let proxy_component_factory = if is_host {
            Some(JitValue::new(JitComponentFactory {
                selector: selector.unwrap_or_default(),
                view_class: JitValue::new(proxy_view_class.clone()),
                component_type: comp_type.clone(),
            }))
        } else {
            None
        };
        CompiledTemplate {
            is_host,
            comp_type,
            comp_meta,
            ng_module,
            directives,
            proxy_view_class,
            proxy_component_factory,
        }
    }

    fn is_compiled(&self) -> bool {
        self.proxy_view_class.is_set()
    }

    fn compiled(&self, view_class: JitValue) -> Result<()> {
        self.proxy_view_class.set_delegate(view_class)
    }
}

pub struct JitCompiler {
    config: CompilerConfig,
    reflector: Rc<dyn CompileReflector>,
    symbol_cache: Rc<StaticSymbolCache>,
    metadata_resolver: CompileMetadataResolver,
    template_parser: TemplateParser,
    style_compiler: StyleCompiler,
    animation_parser: AnimationParser,
    animation_compiler: AnimationCompiler,
    view_compiler: ViewCompiler,
    dir_wrapper_compiler: DirectiveWrapperCompiler,
    ng_module_compiler: NgModuleCompiler,
    evaluator: Rc<dyn JitEvaluator>,
    compiled_template_cache: RefCell<HashMap<StaticSymbol, Rc<CompiledTemplate>>>,
    compiled_host_template_cache: RefCell<HashMap<StaticSymbol, Rc<CompiledTemplate>>>,
    compiled_directive_wrapper_cache: RefCell<HashMap<StaticSymbol, JitValue>>,
    compiled_ng_module_cache: RefCell<HashMap<StaticSymbol, JitValue>>,
    this: Weak<JitCompiler>,
}

/// Wires a `JitCompiler` to `host`, which supplies metadata and resources.
pub fn create_jit_compiler<H>(
    host: Rc<H>,
    config: CompilerConfig,
    evaluator: Rc<dyn JitEvaluator>,
) -> Result<Rc<JitCompiler>>
where
    H: StaticReflectorHost + ResourceLoader + 'static,
{
    let symbol_cache = Rc::new(StaticSymbolCache::new());
    let reflector: Rc<dyn CompileReflector> =
        Rc::new(StaticReflector::new(host.clone(), symbol_cache.clone(), None)?);
    let schema_registry: Rc<dyn ElementSchemaRegistry> = Rc::new(DomElementSchemaRegistry::new());
    let metadata_resolver = CompileMetadataResolver::new(
        NgModuleResolver::new(reflector.clone()),
        DirectiveResolver::new(reflector.clone()),
        PipeResolver::new(reflector.clone()),
        Rc::new(JitSummaryResolver),
        schema_registry.clone(),
        DirectiveNormalizer::new(host, config.clone()),
        reflector.clone(),
        None,
    );
    Ok(Rc::new_cyclic(|this| JitCompiler {
        template_parser: TemplateParser::new(config.clone(), reflector.clone(), schema_registry.clone()),
        style_compiler: StyleCompiler::new(),
        animation_parser: AnimationParser::new(),
        animation_compiler: AnimationCompiler::new(reflector.clone()),
        view_compiler: ViewCompiler::new(config.clone(), reflector.clone(), schema_registry.clone()),
        dir_wrapper_compiler: DirectiveWrapperCompiler::new(config.clone(), reflector.clone(), schema_registry),
        ng_module_compiler: NgModuleCompiler::new(reflector.clone()),
        config,
        reflector,
        symbol_cache,
        metadata_resolver,
        evaluator,
        compiled_template_cache: RefCell::new(HashMap::new()),
        compiled_host_template_cache: RefCell::new(HashMap::new()),
        compiled_directive_wrapper_cache: RefCell::new(HashMap::new()),
        compiled_ng_module_cache: RefCell::new(HashMap::new()),
        this: this.clone(),
    }))
}

impl JitCompiler {
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn metadata_resolver(&self) -> &CompileMetadataResolver {
        &self.metadata_resolver
    }

    /// Symbol of `name` declared in `file_path`, as the compiler sees it.
    pub fn symbol(&self, file_path: &str, name: &str) -> StaticSymbol {
        self.symbol_cache.get(file_path, name, &[])
    }

    pub fn compile_module_sync(&self, module_type: &StaticSymbol) -> Result<JitValue> {
        self.load_modules_sync(module_type)?;
        self.compile_components(module_type, None)?;
        self.compile_module(module_type)
    }

    pub async fn compile_module_async(&self, module_type: &StaticSymbol) -> Result<JitValue> {
        self.load_modules(module_type, false)?.await?;
        self.compile_components(module_type, None)?;
        self.compile_module(module_type)
    }

    /// Compiles the module and returns the factories of all components it
    /// declares, including those of imported modules.
    pub fn compile_module_and_all_components_sync(
        &self,
        module_type: &StaticSymbol,
    ) -> Result<ModuleWithComponentFactories> {
        self.load_modules_sync(module_type)?;
        self.module_with_component_factories(module_type)
    }

    pub async fn compile_module_and_all_components_async(
        &self,
        module_type: &StaticSymbol,
    ) -> Result<ModuleWithComponentFactories> {
        self.load_modules(module_type, false)?.await?;
        self.module_with_component_factories(module_type)
    }

    /// The `<ng-content>` selectors of a compiled component.
    pub fn get_ng_content_selectors(&self, component: &StaticSymbol) -> Result<Vec<String>> {
        let cache = self.compiled_template_cache.borrow();
        let template = cache.get(component).ok_or_else(|| {
            CompilerError::illegal_state(format!(
                "The component {} is not yet compiled!",
                identifier_name(component)
            ))
        })?;
        Ok(template
            .comp_meta
            .template
            .as_ref()
            .map(|t| t.ng_content_selectors.clone())
            .unwrap_or_default())
    }

    pub fn clear_cache_for(&self, ty: &StaticSymbol) {
        self.compiled_ng_module_cache.borrow_mut().remove(ty);
        self.metadata_resolver.clear_cache_for(ty);
        self.compiled_host_template_cache.borrow_mut().remove(ty);
        self.compiled_template_cache.borrow_mut().remove(ty);
        self.compiled_directive_wrapper_cache.borrow_mut().remove(ty);
    }

    pub fn clear_cache(&self) {
        self.metadata_resolver.clear_cache();
        self.compiled_template_cache.borrow_mut().clear();
        self.compiled_host_template_cache.borrow_mut().clear();
        self.compiled_directive_wrapper_cache.borrow_mut().clear();
        self.compiled_ng_module_cache.borrow_mut().clear();
    }

    fn module_with_component_factories(&self, module_type: &StaticSymbol) -> Result<ModuleWithComponentFactories> {
        let mut component_factories = Vec::new();
        self.compile_components(module_type, Some(&mut component_factories))?;
        Ok(ModuleWithComponentFactories {
            ng_module_factory: self.compile_module(module_type)?,
            component_factories,
        })
    }

    fn load_modules_sync(&self, main_module: &StaticSymbol) -> Result<()> {
        match self.load_modules(main_module, true)?.now_or_never() {
            Some(result) => result,
            None => Err(CompilerError::ComponentStillLoading {
                type_name: identifier_name(main_module),
            }),
        }
    }

    /// Loads the directives and pipes of `main_module` and of every module
    /// it transitively imports.
    fn load_modules(&self, main_module: &StaticSymbol, is_sync: bool) -> Result<LocalBoxFuture<'static, Result<()>>> {
        let mut loading = vec![self
            .metadata_resolver
            .load_ng_module_directive_and_pipe_metadata(main_module, is_sync, true)?];
        let ng_module = self.ng_module_metadata(main_module)?;
        for local_module in &ng_module.transitive_module.modules {
            loading.push(
                self.metadata_resolver
                    .load_ng_module_directive_and_pipe_metadata(&local_module.reference, is_sync, true)?,
            );
        }
        Ok(future::try_join_all(loading).map_ok(|_| ()).boxed_local())
    }

    fn ng_module_metadata(&self, module_type: &StaticSymbol) -> Result<Rc<CompileNgModuleMetadata>> {
        self.metadata_resolver
            .get_ng_module_metadata(module_type, true)?
            .ok_or_else(|| {
                CompilerError::illegal_state(format!(
                    "Illegal state: no NgModule metadata for {}",
                    identifier_name(module_type)
                ))
            })
    }

    fn compile_module(&self, module_type: &StaticSymbol) -> Result<JitValue> {
        if let Some(factory) = self.compiled_ng_module_cache.borrow().get(module_type) {
            return Ok(factory.clone());
        }
        let module_meta = self.ng_module_metadata(module_type)?;
        let module_name = identifier_name(module_type);
        let _span = tracing::debug_span!("jit_compile_module", module = %module_name).entered();

        // Every module provides a Compiler bound to itself.
        let bound_compiler_factory = self.symbol(&format!("/{}/module_bound_compiler", module_name), "createCompiler");
        let extra_providers = [CompileProviderMetadata {
            token: CompileTokenMetadata::from_symbol(resolve_identifier(
                self.reflector.as_ref(),
                &Identifiers::Compiler,
            )?),
            use_class: None,
            use_value: None,
            use_existing: None,
            use_factory: Some(CompileFactoryMetadata {
                reference: bound_compiler_factory.clone(),
                di_deps: Vec::new(),
            }),
            deps: None,
            multi: false,
        }];
        let compile_result = self.ng_module_compiler.compile(&module_meta, &extra_providers)?;
        for dep in &compile_result.dependencies {
            let factory = self
                .assert_component_known(&dep.comp, true)?
                .proxy_component_factory
                .clone()
                .ok_or_else(|| host_without_factory(&dep.comp))?;
            dep.placeholder.resolve(ResolvedReference::Runtime(factory))?;
        }
        let bound_compiler = ModuleBoundCompiler {
            delegate: self.this.clone(),
            ng_module: module_type.clone(),
        };
        let program = JitProgram::new(&compile_result.statements)
            .with_runtime_symbol(bound_compiler_factory, JitValue::new(bound_compiler));
        let factory = self.evaluator.evaluate(
            &format!("/{}/module.ngfactory.js", module_name),
            &program,
            &compile_result.ng_module_factory_var,
        )?;
        self.compiled_ng_module_cache
            .borrow_mut()
            .insert(module_type.clone(), factory.clone());
        Ok(factory)
    }

    /// Compiles every directive and component the module can see. Host views
    /// are compiled for entry components, and for every component when
    /// `all_component_factories` collects them.
    fn compile_components(
        &self,
        main_module: &StaticSymbol,
        mut all_component_factories: Option<&mut Vec<JitValue>>,
    ) -> Result<()> {
        let ng_module = self.ng_module_metadata(main_module)?;
        let mut module_by_directive: HashMap<StaticSymbol, Rc<CompileNgModuleMetadata>> = HashMap::new();
        let mut templates: Vec<Rc<CompiledTemplate>> = Vec::new();
        fn add(templates: &mut Vec<Rc<CompiledTemplate>>, template: Rc<CompiledTemplate>) {
            if !templates.iter().any(|t| Rc::ptr_eq(t, &template)) {
                templates.push(template);
            }
        }

        let mut local_modules = Vec::with_capacity(ng_module.transitive_module.modules.len());
        for local_module in &ng_module.transitive_module.modules {
            local_modules.push(self.ng_module_metadata(&local_module.reference)?);
        }
        for local_module in &local_modules {
            for dir_type in &local_module.declared_directives {
                module_by_directive.insert(dir_type.clone(), local_module.clone());
                let dir_meta = self.metadata_resolver.get_directive_metadata(dir_type)?;
                self.compile_directive_wrapper(&dir_meta, local_module)?;
                if dir_meta.is_component {
                    add(&mut templates, self.create_compiled_template(&dir_meta, local_module)?);
                    if let Some(factories) = all_component_factories.as_deref_mut() {
                        let template = self.create_compiled_host_template(dir_type, Some(local_module))?;
                        if let Some(factory) = &template.proxy_component_factory {
                            factories.push(factory.clone());
                        }
                        add(&mut templates, template);
                    }
                }
            }
        }
        for local_module in &local_modules {
            for dir_type in &local_module.declared_directives {
                let dir_meta = self.metadata_resolver.get_directive_metadata(dir_type)?;
                if !dir_meta.is_component {
                    continue;
                }
                for entry_component in &dir_meta.entry_components {
                    let template = self
                        .create_compiled_host_template(entry_component, module_by_directive.get(entry_component))?;
                    add(&mut templates, template);
                }
            }
            for entry_component in &local_module.entry_components {
                let template =
                    self.create_compiled_host_template(entry_component, module_by_directive.get(entry_component))?;
                add(&mut templates, template);
            }
        }
        for template in &templates {
            self.compile_template(template)?;
        }
        Ok(())
    }

    fn create_compiled_host_template(
        &self,
        comp_type: &StaticSymbol,
        ng_module: Option<&Rc<CompileNgModuleMetadata>>,
    ) -> Result<Rc<CompiledTemplate>> {
        let ng_module = ng_module.ok_or_else(|| {
            CompilerError::illegal_state(format!(
                "Component {} is not part of any NgModule or the module has not been imported into your module.",
                identifier_name(comp_type)
            ))
        })?;
        if let Some(template) = self.compiled_host_template_cache.borrow().get(comp_type) {
            return Ok(template.clone());
        }
        let comp_meta = self.metadata_resolver.get_directive_metadata(comp_type)?;
        assert_component(&comp_meta)?;
        let host_type = self.symbol(comp_type.file_path(), &host_type_name(comp_type));
        let host_meta = create_host_component_meta(host_type, &comp_meta);
        let template = Rc::new(CompiledTemplate::new(
            true,
            comp_meta.selector.clone(),
            comp_type.clone(),
            Rc::new(host_meta),
            ng_module.clone(),
            vec![comp_type.clone()],
        ));
        self.compiled_host_template_cache
            .borrow_mut()
            .insert(comp_type.clone(), template.clone());
        Ok(template)
    }

    fn create_compiled_template(
        &self,
        comp_meta: &Rc<CompileDirectiveMetadata>,
        ng_module: &Rc<CompileNgModuleMetadata>,
    ) -> Result<Rc<CompiledTemplate>> {
        if let Some(template) = self.compiled_template_cache.borrow().get(comp_meta.reference()) {
            return Ok(template.clone());
        }
        assert_component(comp_meta)?;
        let template = Rc::new(CompiledTemplate::new(
            false,
            comp_meta.selector.clone(),
            comp_meta.reference().clone(),
            comp_meta.clone(),
            ng_module.clone(),
            ng_module.transitive_module.directives.iter().cloned().collect(),
        ));
        self.compiled_template_cache
            .borrow_mut()
            .insert(comp_meta.reference().clone(), template.clone());
        Ok(template)
    }

    fn assert_component_known(&self, comp_type: &StaticSymbol, is_host: bool) -> Result<Rc<CompiledTemplate>> {
        let cache = if is_host {
            &self.compiled_host_template_cache
        } else {
            &self.compiled_template_cache
        };
        cache.borrow().get(comp_type).cloned().ok_or_else(|| {
            CompilerError::illegal_state(format!(
                "Illegal state: Compiled view for component {} (host: {}) does not exist!",
                identifier_name(comp_type),
                is_host
            ))
        })
    }

    fn assert_directive_wrapper(&self, dir_type: &StaticSymbol) -> Result<JitValue> {
        self.compiled_directive_wrapper_cache
            .borrow()
            .get(dir_type)
            .cloned()
            .ok_or_else(|| {
                CompilerError::illegal_state(format!(
                    "Illegal state: Directive wrapper for {} has not been compiled!",
                    identifier_name(dir_type)
                ))
            })
    }

    fn compile_directive_wrapper(
        &self,
        dir_meta: &CompileDirectiveMetadata,
        module_meta: &CompileNgModuleMetadata,
    ) -> Result<()> {
        if self
            .compiled_directive_wrapper_cache
            .borrow()
            .contains_key(dir_meta.reference())
        {
            return Ok(());
        }
        let compile_result = self.dir_wrapper_compiler.compile(dir_meta)?;
        let wrapper_class = self.evaluator.evaluate(
            &format!(
                "/{}/{}/wrapper.ngfactory.js",
                identifier_name(module_meta.reference()),
                identifier_name(dir_meta.reference())
            ),
            &JitProgram::new(&compile_result.statements),
            &compile_result.dir_wrapper_class_var,
        )?;
        self.compiled_directive_wrapper_cache
            .borrow_mut()
            .insert(dir_meta.reference().clone(), wrapper_class);
        Ok(())
    }

    fn compile_template(&self, template: &CompiledTemplate) -> Result<()> {
        if template.is_compiled() {
            return Ok(());
        }
        let comp_meta = &template.comp_meta;
        let comp_name = identifier_name(&template.comp_type);
        let _span = tracing::debug_span!("jit_compile_template", component = %comp_name, host = template.is_host)
            .entered();
        let styles = self.style_compiler.compile_component(comp_meta)?;
        let external_stylesheets: HashMap<&str, &CompiledStylesheet> = styles
            .external_stylesheets
            .iter()
            .map(|stylesheet| (stylesheet.meta.module_url.as_deref().unwrap_or_default(), stylesheet))
            .collect();
        self.resolve_styles_compile_result(&styles.component_stylesheet, &external_stylesheets)?;

        let parsed_animations = self.animation_parser.parse_component(comp_meta)?;
        let directives = template
            .directives
            .iter()
            .map(|dir| self.metadata_resolver.get_directive_summary(dir))
            .collect::<Result<Vec<_>>>()?;
        let pipes = template
            .ng_module
            .transitive_module
            .pipes
            .iter()
            .map(|pipe| self.metadata_resolver.get_pipe_summary(pipe))
            .collect::<Result<Vec<_>>>()?;
        let template_source = comp_meta
            .template
            .as_ref()
            .and_then(|t| t.template.clone())
            .unwrap_or_default();
        let parsed_template = self.template_parser.parse(
            comp_meta,
            &template_source,
            &directives,
            &pipes,
            &template.ng_module.schemas,
            &identifier_name(comp_meta.reference()),
        )?;
        let compiled_animations = self
            .animation_compiler
            .compile(&identifier_name(comp_meta.reference()), &parsed_animations)?;
        let compile_result = self.view_compiler.compile_component(
            comp_meta,
            &parsed_template,
            o::variable(styles.component_stylesheet.styles_var.clone()),
            &pipes,
            &compiled_animations,
        )?;
        for dep in &compile_result.dependencies {
            let value = match dep {
                ViewCompileDependency::ViewClass(dep) => {
                    JitValue::new(self.assert_component_known(&dep.comp, false)?.proxy_view_class.clone())
                }
                ViewCompileDependency::ComponentFactory(dep) => self
                    .assert_component_known(&dep.comp, true)?
                    .proxy_component_factory
                    .clone()
                    .ok_or_else(|| host_without_factory(&dep.comp))?,
                ViewCompileDependency::DirectiveWrapper(dep) => self.assert_directive_wrapper(&dep.dir)?,
            };
            dep.placeholder().resolve(ResolvedReference::Runtime(value))?;
        }

        let mut statements: Vec<Statement> = styles.component_stylesheet.statements.clone();
        for animation in &compiled_animations {
            statements.extend(animation.statements.iter().cloned());
        }
        statements.extend(compile_result.statements);
        let view_class = self.evaluator.evaluate(
            &format!(
                "/{}/{}/{}.ngfactory.js",
                identifier_name(template.ng_module.reference()),
                comp_name,
                if template.is_host { "host" } else { "component" }
            ),
            &JitProgram::new(&statements),
            &compile_result.view_class_var,
        )?;
        template.compiled(view_class)
    }

    fn resolve_styles_compile_result(
        &self,
        result: &CompiledStylesheet,
        external_stylesheets: &HashMap<&str, &CompiledStylesheet>,
    ) -> Result<()> {
        for dep in &result.dependencies {
            if dep.set_value.resolved().is_some() {
                continue;
            }
            let nested = external_stylesheets
                .get(dep.module_url.as_str())
                .ok_or_else(|| {
                    CompilerError::illegal_state(format!(
                        "Illegal state: stylesheet {} was not compiled",
                        dep.module_url
                    ))
                })?;
            let nested_styles = self.resolve_and_eval_styles_compile_result(nested, external_stylesheets)?;
            dep.set_value.resolve(ResolvedReference::Runtime(nested_styles))?;
        }
        Ok(())
    }

    fn resolve_and_eval_styles_compile_result(
        &self,
        result: &CompiledStylesheet,
        external_stylesheets: &HashMap<&str, &CompiledStylesheet>,
    ) -> Result<JitValue> {
        self.resolve_styles_compile_result(result, external_stylesheets)?;
        self.evaluator.evaluate(
            &format!(
                "/{}.ngstyle.js",
                result.meta.module_url.as_deref().unwrap_or_default().trim_start_matches('/')
            ),
            &JitProgram::new(&result.statements),
            &result.styles_var,
        )
    }
}

fn assert_component(meta: &CompileDirectiveMetadata) -> Result<()> {
    if meta.is_component {
        Ok(())
    } else {
        Err(CompilerError::illegal_state(format!(
            "Could not compile '{}' because it is not a component.",
            identifier_name(meta.reference())
        )))
    }
}

fn host_without_factory(comp_type: &StaticSymbol) -> CompilerError {
    CompilerError::illegal_state(format!(
        "Illegal state: host view of {} has no component factory",
        identifier_name(comp_type)
    ))
}

/// The `Compiler` a compiled module provides. Compiles through the JIT
/// compiler that compiled the module.
#[derive(Clone)]
pub struct ModuleBoundCompiler {
    delegate: Weak<JitCompiler>,
    ng_module: StaticSymbol,
}

impl ModuleBoundCompiler {
    /// The module this compiler was provided by.
    pub fn ng_module(&self) -> &StaticSymbol {
        &self.ng_module
    }

    fn delegate(&self) -> Result<Rc<JitCompiler>> {
        self.delegate.upgrade().ok_or_else(|| {
            CompilerError::illegal_state(format!(
                "Illegal state: the compiler of {} was dropped",
                identifier_name(&self.ng_module)
            ))
        })
    }

    pub fn compile_module_sync(&self, module_type: &StaticSymbol) -> Result<JitValue> {
        self.delegate()?.compile_module_sync(module_type)
    }

    pub async fn compile_module_async(&self, module_type: &StaticSymbol) -> Result<JitValue> {
        self.delegate()?.compile_module_async(module_type).await
    }

    pub fn compile_module_and_all_components_sync(
        &self,
        module_type: &StaticSymbol,
    ) -> Result<ModuleWithComponentFactories> {
        self.delegate()?
            .compile_module_and_all_components_sync(module_type)
    }

    pub async fn compile_module_and_all_components_async(
        &self,
        module_type: &StaticSymbol,
    ) -> Result<ModuleWithComponentFactories> {
        self.delegate()?
            .compile_module_and_all_components_async(module_type)
            .await
    }

    pub fn get_ng_content_selectors(&self, component: &StaticSymbol) -> Result<Vec<String>> {
        self.delegate()?.get_ng_content_selectors(component)
    }

    pub fn clear_cache_for(&self, ty: &StaticSymbol) -> Result<()> {
        self.delegate()?.clear_cache_for(ty);
        Ok(())
    }

    pub fn clear_cache(&self) -> Result<()> {
        self.delegate()?.clear_cache();
        Ok(())
    }
}
