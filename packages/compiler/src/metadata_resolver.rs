//! Metadata Resolver
//!
//! Reads decorator annotations through the reflector and produces the
//! normalized compile metadata of directives, pipes and NgModules. Every
//! result is cached per type; summaries of already compiled libraries come
//! from the summary resolver instead.

use crate::aot::static_symbol::StaticSymbol;
use crate::aot::static_value::{Annotation, MetadataKind, StaticValue};
use crate::compile_metadata::{
    flatten_and_dedupe, AnimationStyleToken, CompileAnimationEntryMetadata,
    CompileAnimationMetadata, CompileAnimationStateMetadata, CompileAnimationStyleMetadata,
    CompileDiDependencyMetadata, CompileDirectiveMetadata, CompileDirectiveSummary,
    CompileFactoryMetadata, CompileNgModuleMetadata, CompileNgModuleSummary,
    CompilePipeMetadata, CompilePipeSummary, CompileProviderMetadata, CompileQueryMetadata,
    CompileTemplateMetadata, CompileTokenMetadata, CompileTypeMetadata, CompileTypeSummary,
    DirectiveMetadataInput, TokenKey, TransitiveCompileNgModuleMetadata,
};
use crate::compile_reflector::CompileReflector;
use crate::core::{
    ChangeDetectionStrategy, SchemaMetadata, ViewEncapsulation, CUSTOM_ELEMENTS_SCHEMA_NAME,
    NO_ERRORS_SCHEMA_NAME,
};
use crate::directive_normalizer::{DirectiveNormalizer, PrenormalizedTemplateMetadata};
use crate::directive_resolver::DirectiveResolver;
use crate::error::{report, CompilerError, ErrorCollector, Result};
use crate::identifiers::{resolve_identifier, Identifiers};
use crate::ml_parser::interpolation_config::assert_interpolation_symbols;
use crate::ng_module_resolver::NgModuleResolver;
use crate::pipe_resolver::PipeResolver;
use crate::schema::ElementSchemaRegistry;
use crate::summary_resolver::SummaryResolver;
use crate::util::SyncAsync;
use futures::future::{self, FutureExt, LocalBoxFuture};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

static QUERY_VAR_BINDINGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*,\s*").unwrap());

/// Directive metadata whose template has not been normalized yet, with the
/// annotation it was read from.
#[derive(Debug, Clone)]
pub struct NonNormalizedDirectiveMetadata {
    pub annotation: Annotation,
    pub metadata: CompileDirectiveMetadata,
}

#[derive(Default)]
struct ResolverCaches {
    directives: RefCell<HashMap<StaticSymbol, Rc<CompileDirectiveMetadata>>>,
    summaries: RefCell<HashMap<StaticSymbol, Option<CompileTypeSummary>>>,
    pipes: RefCell<HashMap<StaticSymbol, Rc<CompilePipeMetadata>>>,
    ng_modules: RefCell<HashMap<StaticSymbol, Rc<CompileNgModuleMetadata>>>,
    ng_module_of_types: RefCell<HashMap<StaticSymbol, StaticSymbol>>,
}

impl ResolverCaches {
    fn store_directive(
        &self,
        mut metadata: CompileDirectiveMetadata,
        template: Option<CompileTemplateMetadata>,
    ) -> Rc<CompileDirectiveMetadata> {
        metadata.template = template;
        let reference = metadata.reference().clone();
        self.summaries.borrow_mut().insert(
            reference.clone(),
            Some(CompileTypeSummary::Directive(metadata.to_summary())),
        );
        let metadata = Rc::new(metadata);
        self.directives.borrow_mut().insert(reference, metadata.clone());
        metadata
    }
}

/// A provider before normalization: `{provide, useClass, ...}` or a bare
/// class.
struct ProviderMeta {
    token: StaticValue,
    use_class: Option<StaticValue>,
    use_value: Option<StaticValue>,
    use_existing: Option<StaticValue>,
    use_factory: Option<StaticValue>,
    dependencies: Option<Vec<StaticValue>>,
    multi: bool,
}

impl ProviderMeta {
    fn from_literal(literal: &IndexMap<String, StaticValue>) -> Self {
        let field = |name: &str| literal.get(name).filter(|v| !v.is_nullish()).cloned();
        ProviderMeta {
            token: literal.get("provide").cloned().unwrap_or(StaticValue::Undefined),
            use_class: field("useClass"),
            use_value: literal
                .get("useValue")
                .filter(|v| !matches!(v, StaticValue::Undefined))
                .cloned(),
            use_existing: field("useExisting"),
            use_factory: field("useFactory"),
            dependencies: literal
                .get("deps")
                .and_then(StaticValue::as_array)
                .map(<[StaticValue]>::to_vec),
            multi: literal.get("multi").map_or(false, StaticValue::is_truthy),
        }
    }

    fn for_class(ty: &StaticValue) -> Self {
        ProviderMeta {
            token: ty.clone(),
            use_class: Some(ty.clone()),
            use_value: None,
            use_existing: None,
            use_factory: None,
            dependencies: None,
            multi: false,
        }
    }
}

/// One constructor/factory parameter: a list of type and DI markers, or a
/// bare token from a provider's `deps`.
enum DependencyParam {
    Entries(Vec<StaticValue>),
    Token(StaticValue),
}

pub struct CompileMetadataResolver {
    ng_module_resolver: NgModuleResolver,
    directive_resolver: DirectiveResolver,
    pipe_resolver: PipeResolver,
    summary_resolver: Rc<dyn SummaryResolver>,
    schema_registry: Rc<dyn ElementSchemaRegistry>,
    directive_normalizer: DirectiveNormalizer,
    reflector: Rc<dyn CompileReflector>,
    error_collector: Option<Rc<dyn ErrorCollector>>,
    caches: Rc<ResolverCaches>,
}

impl CompileMetadataResolver {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ng_module_resolver: NgModuleResolver,
        directive_resolver: DirectiveResolver,
        pipe_resolver: PipeResolver,
        summary_resolver: Rc<dyn SummaryResolver>,
        schema_registry: Rc<dyn ElementSchemaRegistry>,
        directive_normalizer: DirectiveNormalizer,
        reflector: Rc<dyn CompileReflector>,
        error_collector: Option<Rc<dyn ErrorCollector>>,
    ) -> Self {
        CompileMetadataResolver {
            ng_module_resolver,
            directive_resolver,
            pipe_resolver,
            summary_resolver,
            schema_registry,
            directive_normalizer,
            reflector,
            error_collector,
            caches: Rc::new(ResolverCaches::default()),
        }
    }

    pub fn reflector(&self) -> &Rc<dyn CompileReflector> {
        &self.reflector
    }

    /// Drops everything cached for `ty`. Module metadata carries transitive
    /// information, so the whole module cache goes as well.
    pub fn clear_cache_for(&self, ty: &StaticSymbol) {
        let dir_meta = self.caches.directives.borrow_mut().remove(ty);
        self.caches.summaries.borrow_mut().remove(ty);
        self.caches.pipes.borrow_mut().remove(ty);
        self.caches.ng_module_of_types.borrow_mut().remove(ty);
        self.caches.ng_modules.borrow_mut().clear();
        if let Some(template) = dir_meta.as_ref().and_then(|meta| meta.template.as_ref()) {
            self.directive_normalizer.clear_cache_for(template);
        }
    }

    pub fn clear_cache(&self) {
        self.caches.directives.borrow_mut().clear();
        self.caches.summaries.borrow_mut().clear();
        self.caches.pipes.borrow_mut().clear();
        self.caches.ng_modules.borrow_mut().clear();
        self.caches.ng_module_of_types.borrow_mut().clear();
        self.directive_normalizer.clear_cache();
    }

    pub fn get_animation_entry_metadata(&self, entry: &Annotation) -> CompileAnimationEntryMetadata {
        CompileAnimationEntryMetadata {
            name: entry.get("name").map(StaticValue::to_js_string).unwrap_or_default(),
            definitions: entry
                .get_array("definitions")
                .iter()
                .filter_map(animation_state_metadata)
                .collect(),
        }
    }

    fn report_error(&self, error: CompilerError, ty: &StaticSymbol) -> Result<()> {
        report::<()>(self.error_collector.as_deref(), error, Some(&ty.to_string())).map(|_| ())
    }

    fn load_summary(&self, ty: &StaticSymbol) -> Result<Option<CompileTypeSummary>> {
        if let Some(summary) = self.caches.summaries.borrow().get(ty) {
            return Ok(summary.clone());
        }
        let summary = self.summary_resolver.resolve_summary(ty)?;
        self.caches
            .summaries
            .borrow_mut()
            .insert(ty.clone(), summary.clone());
        Ok(summary)
    }

    /// Loads and caches the metadata of one directive. Returns a future
    /// when the component template has to be fetched first.
    fn load_directive_metadata(
        &self,
        directive_type: &StaticSymbol,
        is_sync: bool,
    ) -> Result<Option<LocalBoxFuture<'static, Result<()>>>> {
        if self.caches.directives.borrow().contains_key(directive_type) {
            return Ok(None);
        }
        let NonNormalizedDirectiveMetadata { metadata, .. } =
            match self.get_non_normalized_directive_metadata(directive_type)? {
                Some(non_normalized) => non_normalized,
                None => return Ok(None),
            };

        let template = match (&metadata.template, metadata.is_component) {
            (Some(template), true) => template.clone(),
            _ => {
                self.caches.store_directive(metadata, None);
                return Ok(None);
            }
        };

        let template_meta = self
            .directive_normalizer
            .normalize_template(PrenormalizedTemplateMetadata {
                ng_module_type: None,
                component_type: directive_type.clone(),
                module_url: component_module_url(directive_type),
                template: template.template,
                template_url: template.template_url,
                styles: template.styles,
                style_urls: template.style_urls,
                interpolation: template.interpolation,
                encapsulation: template.encapsulation,
                animations: template.animations,
            })?;
        match template_meta {
            SyncAsync {
                sync: Some(normalized),
                ..
            } => {
                self.caches.store_directive(metadata, Some(normalized));
                Ok(None)
            }
            pending if is_sync => {
                drop(pending);
                self.report_error(
                    CompilerError::ComponentStillLoading {
                        type_name: directive_type.to_string(),
                    },
                    directive_type,
                )?;
                Ok(None)
            }
            pending => {
                let caches = self.caches.clone();
                Ok(Some(
                    async move {
                        let normalized = pending.into_future().await?;
                        caches.store_directive(metadata, Some(normalized));
                        Ok(())
                    }
                    .boxed_local(),
                ))
            }
        }
    }

    pub fn get_non_normalized_directive_metadata(
        &self,
        directive_type: &StaticSymbol,
    ) -> Result<Option<NonNormalizedDirectiveMetadata>> {
        let dir_meta = match self.directive_resolver.resolve(directive_type, true)? {
            Some(dir_meta) => dir_meta,
            None => return Ok(None),
        };
        let is_component = dir_meta.kind == MetadataKind::Component;

        let mut template = None;
        let mut change_detection = None;
        let mut view_providers = Vec::new();
        let mut entry_components: Vec<StaticSymbol> = Vec::new();
        let mut selector = dir_meta
            .get_str("selector")
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        if is_component {
            let styles = assert_array_of_strings("styles", dir_meta.get("styles"))?;
            let style_urls = assert_array_of_strings("styleUrls", dir_meta.get("styleUrls"))?;
            let interpolation = match dir_meta.get("interpolation") {
                Some(value) if !value.is_nullish() => {
                    let symbols = assert_array_of_strings("interpolation", Some(value))?;
                    assert_interpolation_symbols("interpolation", &symbols)?;
                    Some((symbols[0].clone(), symbols[1].clone()))
                }
                _ => None,
            };
            let animations = dir_meta
                .get_array("animations")
                .iter()
                .filter_map(StaticValue::as_annotation)
                .map(|entry| self.get_animation_entry_metadata(entry))
                .collect();
            template = Some(CompileTemplateMetadata {
                encapsulation: dir_meta.get("encapsulation").and_then(view_encapsulation),
                template: template_string(&dir_meta, "template", directive_type)?,
                template_url: template_string(&dir_meta, "templateUrl", directive_type)?,
                styles,
                style_urls,
                animations,
                interpolation,
                ..Default::default()
            });
            change_detection = dir_meta.get("changeDetection").and_then(change_detection_strategy);
            if dir_meta.get("viewProviders").is_some() {
                view_providers = self.get_providers_metadata(
                    dir_meta.get_array("viewProviders"),
                    &mut entry_components,
                    Some(&format!("viewProviders for \"{}\"", directive_type)),
                    directive_type,
                )?;
            }
            if dir_meta.get("entryComponents").is_some() {
                let mut declared: Vec<StaticSymbol> =
                    flatten_and_dedupe(dir_meta.get_array("entryComponents"))
                        .iter()
                        .filter_map(|value| value.as_symbol().cloned())
                        .collect();
                declared.append(&mut entry_components);
                entry_components = declared;
            }
            if selector.is_none() {
                selector = Some(self.schema_registry.get_default_component_element_name());
            }
        } else if selector.is_none() {
            self.report_error(
                CompilerError::syntax(format!(
                    "Directive {} has no selector, please add it!",
                    directive_type
                )),
                directive_type,
            )?;
            selector = Some("error".to_string());
        }

        let providers = if dir_meta.get("providers").is_some() {
            self.get_providers_metadata(
                dir_meta.get_array("providers"),
                &mut entry_components,
                Some(&format!("providers for \"{}\"", directive_type)),
                directive_type,
            )?
        } else {
            Vec::new()
        };

        let (queries, view_queries) = match dir_meta.get("queries").and_then(StaticValue::as_object) {
            Some(queries) => (
                self.get_queries_metadata(queries, false, directive_type)?,
                self.get_queries_metadata(queries, true, directive_type)?,
            ),
            None => (Vec::new(), Vec::new()),
        };

        let host = dir_meta
            .get("host")
            .and_then(StaticValue::as_object)
            .map(|host| {
                host.iter()
                    .map(|(key, value)| (key.clone(), value.to_js_string()))
                    .collect()
            })
            .unwrap_or_default();

        let metadata = CompileDirectiveMetadata::create(
            self.get_type_metadata(directive_type, None)?,
            DirectiveMetadataInput {
                is_host: false,
                is_component,
                selector,
                export_as: dir_meta.get_str("exportAs").map(str::to_string),
                change_detection,
                inputs: string_list(dir_meta.get_array("inputs")),
                outputs: string_list(dir_meta.get_array("outputs")),
                host,
                providers,
                view_providers,
                queries,
                view_queries,
                entry_components,
                template,
            },
        );
        Ok(Some(NonNormalizedDirectiveMetadata {
            annotation: dir_meta,
            metadata,
        }))
    }

    /// Metadata of a directive loaded by `load_ng_module_directive_and_pipe_metadata`.
    pub fn get_directive_metadata(&self, directive_type: &StaticSymbol) -> Result<Rc<CompileDirectiveMetadata>> {
        self.caches
            .directives
            .borrow()
            .get(directive_type)
            .cloned()
            .ok_or_else(|| {
                CompilerError::illegal_state(format!(
                    "Illegal state: getDirectiveMetadata can only be called after loadNgModuleMetadata for a module that declares it. Directive {}.",
                    directive_type
                ))
            })
    }

    pub fn get_directive_summary(&self, dir_type: &StaticSymbol) -> Result<CompileDirectiveSummary> {
        match self.load_summary(dir_type)? {
            Some(CompileTypeSummary::Directive(summary)) => Ok(summary),
            _ => Err(CompilerError::illegal_state(format!(
                "Illegal state: Could not load the summary for directive {}.",
                dir_type
            ))),
        }
    }

    pub fn is_directive(&self, ty: &StaticSymbol) -> Result<bool> {
        self.directive_resolver.is_directive(ty)
    }

    pub fn is_pipe(&self, ty: &StaticSymbol) -> Result<bool> {
        self.pipe_resolver.is_pipe(ty)
    }

    pub fn get_ng_module_summary(&self, module_type: &StaticSymbol) -> Result<Option<CompileNgModuleSummary>> {
        if let Some(CompileTypeSummary::NgModule(summary)) = self.load_summary(module_type)? {
            return Ok(Some(summary));
        }
        let summary = self
            .get_ng_module_metadata(module_type, false)?
            .map(|meta| meta.to_summary());
        if let Some(summary) = &summary {
            self.caches.summaries.borrow_mut().insert(
                module_type.clone(),
                Some(CompileTypeSummary::NgModule(summary.clone())),
            );
        }
        Ok(summary)
    }

    /// Loads the metadata of every directive and pipe `module_type`
    /// declares. The returned future completes once all component templates
    /// are normalized; for synchronous loads it is already complete.
    pub fn load_ng_module_directive_and_pipe_metadata(
        &self,
        module_type: &StaticSymbol,
        is_sync: bool,
        throw_if_not_found: bool,
    ) -> Result<LocalBoxFuture<'static, Result<()>>> {
        let mut loading = Vec::new();
        if let Some(ng_module) = self.get_ng_module_metadata(module_type, throw_if_not_found)? {
            for directive in &ng_module.declared_directives {
                if let Some(pending) = self.load_directive_metadata(directive, is_sync)? {
                    loading.push(pending);
                }
            }
            for pipe in &ng_module.declared_pipes {
                self.load_pipe_metadata(pipe)?;
            }
        }
        Ok(async move {
            future::try_join_all(loading).await?;
            Ok(())
        }
        .boxed_local())
    }

    pub fn get_ng_module_metadata(
        &self,
        module_type: &StaticSymbol,
        throw_if_not_found: bool,
    ) -> Result<Option<Rc<CompileNgModuleMetadata>>> {
        if let Some(cached) = self.caches.ng_modules.borrow().get(module_type) {
            return Ok(Some(cached.clone()));
        }
        let meta = match self.ng_module_resolver.resolve(module_type, throw_if_not_found)? {
            Some(meta) => meta,
            None => return Ok(None),
        };
        tracing::debug!(module = %module_type, "resolving NgModule metadata");

        let mut declared_directives = Vec::new();
        let mut exported_non_module_identifiers = Vec::new();
        let mut declared_pipes = Vec::new();
        let mut imported_modules = Vec::new();
        let mut exported_modules = Vec::new();
        let mut providers = Vec::new();
        let mut entry_components: Vec<StaticSymbol> = Vec::new();
        let mut bootstrap_components = Vec::new();
        let mut schemas = Vec::new();

        for imported_type in flatten_and_dedupe(meta.get_array("imports")) {
            let imported_module_type = match &imported_type {
                StaticValue::Symbol(symbol) => Some(symbol.clone()),
                StaticValue::Object(module_with_providers) => {
                    let ng_module = module_with_providers
                        .get("ngModule")
                        .and_then(StaticValue::as_symbol)
                        .cloned();
                    if let (Some(ng_module), Some(extra)) =
                        (&ng_module, module_with_providers.get("providers"))
                    {
                        let extra = extra.as_array().unwrap_or(&[]);
                        providers.extend(self.get_providers_metadata(
                            extra,
                            &mut entry_components,
                            Some(&format!("provider for the NgModule '{}'", ng_module)),
                            module_type,
                        )?);
                    }
                    ng_module
                }
                _ => None,
            };
            match imported_module_type {
                Some(imported_module_type) => {
                    match self.get_ng_module_summary(&imported_module_type)? {
                        Some(summary) => imported_modules.push(summary),
                        None => self.report_error(
                            CompilerError::syntax(format!(
                                "Unexpected {} '{}' imported by the module '{}'",
                                self.get_type_descriptor(&imported_type)?,
                                imported_type.to_js_string(),
                                module_type
                            )),
                            module_type,
                        )?,
                    }
                }
                None => self.report_error(
                    CompilerError::syntax(format!(
                        "Unexpected value '{}' imported by the module '{}'",
                        imported_type.to_js_string(),
                        module_type
                    )),
                    module_type,
                )?,
            }
        }

        for exported_type in flatten_and_dedupe(meta.get_array("exports")) {
            let exported_symbol = match exported_type.as_symbol() {
                Some(symbol) => symbol.clone(),
                None => {
                    self.report_error(
                        CompilerError::syntax(format!(
                            "Unexpected value '{}' exported by the module '{}'",
                            exported_type.to_js_string(),
                            module_type
                        )),
                        module_type,
                    )?;
                    continue;
                }
            };
            match self.get_ng_module_summary(&exported_symbol)? {
                Some(summary) => exported_modules.push(summary),
                None => exported_non_module_identifiers.push(exported_symbol),
            }
        }

        let mut transitive_module =
            self.get_transitive_ng_module_metadata(&imported_modules, &exported_modules);

        for declared_type in flatten_and_dedupe(meta.get_array("declarations")) {
            let declared = match declared_type.as_symbol() {
                Some(symbol) => symbol.clone(),
                None => {
                    self.report_error(
                        CompilerError::syntax(format!(
                            "Unexpected value '{}' declared by the module '{}'",
                            declared_type.to_js_string(),
                            module_type
                        )),
                        module_type,
                    )?;
                    continue;
                }
            };
            if self.directive_resolver.is_directive(&declared)? {
                transitive_module.add_directive(declared.clone());
                declared_directives.push(declared.clone());
                self.add_type_to_module(&declared, module_type)?;
            } else if self.pipe_resolver.is_pipe(&declared)? {
                transitive_module.add_pipe(declared.clone());
                declared_pipes.push(declared.clone());
                self.add_type_to_module(&declared, module_type)?;
            } else {
                self.report_error(
                    CompilerError::syntax(format!(
                        "Unexpected {} '{}' declared by the module '{}'",
                        self.get_type_descriptor(&declared_type)?,
                        declared,
                        module_type
                    )),
                    module_type,
                )?;
            }
        }

        let mut exported_directives = Vec::new();
        let mut exported_pipes = Vec::new();
        for exported_id in exported_non_module_identifiers {
            if transitive_module.directives.contains(&exported_id) {
                transitive_module.add_exported_directive(exported_id.clone());
                exported_directives.push(exported_id);
            } else if transitive_module.pipes.contains(&exported_id) {
                transitive_module.add_exported_pipe(exported_id.clone());
                exported_pipes.push(exported_id);
            } else {
                self.report_error(
                    CompilerError::syntax(format!(
                        "Can't export {} {} from {} as it was neither declared nor imported!",
                        self.get_type_descriptor(&StaticValue::Symbol(exported_id.clone()))?,
                        exported_id,
                        module_type
                    )),
                    module_type,
                )?;
            }
        }

        // Own providers go last so they win over transitively collected ones.
        if meta.get("providers").is_some() {
            providers.extend(self.get_providers_metadata(
                meta.get_array("providers"),
                &mut entry_components,
                Some(&format!("provider for the NgModule '{}'", module_type)),
                module_type,
            )?);
        }

        entry_components.extend(
            flatten_and_dedupe(meta.get_array("entryComponents"))
                .iter()
                .filter_map(|value| value.as_symbol().cloned()),
        );

        for bootstrap in flatten_and_dedupe(meta.get_array("bootstrap")) {
            match bootstrap.as_symbol() {
                Some(symbol) => bootstrap_components.push(symbol.clone()),
                None => self.report_error(
                    CompilerError::syntax(format!(
                        "Unexpected value '{}' used in the bootstrap property of module '{}'",
                        bootstrap.to_js_string(),
                        module_type
                    )),
                    module_type,
                )?,
            }
        }
        entry_components.extend(bootstrap_components.iter().cloned());

        for schema in flatten_and_dedupe(meta.get_array("schemas")) {
            if let Some(schema) = schema_metadata(&schema) {
                schemas.push(schema);
            }
        }

        let type_ = self.get_type_metadata(module_type, None)?;
        for id in &entry_components {
            transitive_module.add_entry_component(id.clone());
        }
        for provider in &providers {
            transitive_module.add_provider(provider.clone(), module_type);
        }
        transitive_module.add_module(type_.clone());

        let compile_meta = Rc::new(CompileNgModuleMetadata {
            type_,
            declared_directives,
            exported_directives,
            declared_pipes,
            exported_pipes,
            entry_components,
            bootstrap_components,
            providers,
            imported_modules,
            exported_modules,
            schemas,
            id: meta.get_str("id").map(str::to_string),
            transitive_module,
        });
        self.caches
            .ng_modules
            .borrow_mut()
            .insert(module_type.clone(), compile_meta.clone());
        Ok(Some(compile_meta))
    }

    fn get_type_descriptor(&self, value: &StaticValue) -> Result<&'static str> {
        if let StaticValue::Symbol(ty) = value {
            if self.directive_resolver.is_directive(ty)? {
                return Ok("directive");
            }
            if self.pipe_resolver.is_pipe(ty)? {
                return Ok("pipe");
            }
            if self.ng_module_resolver.is_ng_module(ty)? {
                return Ok("module");
            }
        }
        match value {
            StaticValue::Object(literal) if literal.contains_key("provide") => Ok("provider"),
            _ => Ok("value"),
        }
    }

    fn add_type_to_module(&self, ty: &StaticSymbol, module_type: &StaticSymbol) -> Result<()> {
        let old_module = self.caches.ng_module_of_types.borrow().get(ty).cloned();
        if let Some(old_module) = old_module.filter(|old| old != module_type) {
            self.report_error(
                CompilerError::syntax(format!(
                    "Type {ty} is part of the declarations of 2 modules: {old} and {new}! \
                     Please consider moving {ty} to a higher module that imports {old} and {new}. \
                     You can also create a new NgModule that exports and includes {ty} then import that NgModule in {old} and {new}.",
                    ty = ty,
                    old = old_module,
                    new = module_type
                )),
                module_type,
            )?;
        }
        self.caches
            .ng_module_of_types
            .borrow_mut()
            .insert(ty.clone(), module_type.clone());
        Ok(())
    }

    fn get_transitive_ng_module_metadata(
        &self,
        imported_modules: &[CompileNgModuleSummary],
        exported_modules: &[CompileNgModuleSummary],
    ) -> TransitiveCompileNgModuleMetadata {
        let mut result = TransitiveCompileNgModuleMetadata::new();
        let mut modules_by_token: HashMap<TokenKey, HashSet<StaticSymbol>> = HashMap::new();
        for mod_summary in imported_modules.iter().chain(exported_modules) {
            for module in &mod_summary.modules {
                result.add_module(module.clone());
            }
            for component in &mod_summary.entry_components {
                result.add_entry_component(component.clone());
            }
            // A module may list several providers for one token (multi
            // providers); all of them are kept.
            let mut added_tokens = HashSet::new();
            for entry in &mod_summary.providers {
                let token_ref = entry.provider.token.key();
                let prev_modules = modules_by_token.entry(token_ref.clone()).or_default();
                if added_tokens.contains(&token_ref) || !prev_modules.contains(&entry.module) {
                    prev_modules.insert(entry.module.clone());
                    added_tokens.insert(token_ref);
                    result.add_provider(entry.provider.clone(), &entry.module);
                }
            }
        }
        for mod_summary in exported_modules {
            for id in &mod_summary.exported_directives {
                result.add_exported_directive(id.clone());
            }
            for id in &mod_summary.exported_pipes {
                result.add_exported_pipe(id.clone());
            }
        }
        for mod_summary in imported_modules {
            for id in &mod_summary.exported_directives {
                result.add_directive(id.clone());
            }
            for id in &mod_summary.exported_pipes {
                result.add_pipe(id.clone());
            }
        }
        result
    }

    pub fn get_type_metadata(
        &self,
        ty: &StaticSymbol,
        dependencies: Option<&[StaticValue]>,
    ) -> Result<CompileTypeMetadata> {
        Ok(CompileTypeMetadata {
            reference: ty.clone(),
            di_deps: self.get_dependencies_metadata(ty, dependencies)?,
            lifecycle_hooks: self.reflector.lifecycle_hooks(ty)?,
        })
    }

    fn get_factory_metadata(
        &self,
        factory: &StaticSymbol,
        dependencies: Option<&[StaticValue]>,
    ) -> Result<CompileFactoryMetadata> {
        Ok(CompileFactoryMetadata {
            reference: factory.clone(),
            di_deps: self.get_dependencies_metadata(factory, dependencies)?,
        })
    }

    pub fn get_pipe_metadata(&self, pipe_type: &StaticSymbol) -> Result<Rc<CompilePipeMetadata>> {
        self.caches
            .pipes
            .borrow()
            .get(pipe_type)
            .cloned()
            .ok_or_else(|| {
                CompilerError::illegal_state(format!(
                    "Illegal state: getPipeMetadata can only be called after loadNgModuleMetadata for a module that declares it. Pipe {}.",
                    pipe_type
                ))
            })
    }

    pub fn get_pipe_summary(&self, pipe_type: &StaticSymbol) -> Result<CompilePipeSummary> {
        match self.load_summary(pipe_type)? {
            Some(CompileTypeSummary::Pipe(summary)) => Ok(summary),
            _ => Err(CompilerError::illegal_state(format!(
                "Illegal state: Could not load the summary for pipe {}.",
                pipe_type
            ))),
        }
    }

    pub fn get_or_load_pipe_metadata(&self, pipe_type: &StaticSymbol) -> Result<Rc<CompilePipeMetadata>> {
        let cached = self.caches.pipes.borrow().get(pipe_type).cloned();
        match cached {
            Some(pipe_meta) => Ok(pipe_meta),
            None => self.load_pipe_metadata(pipe_type),
        }
    }

    fn load_pipe_metadata(&self, pipe_type: &StaticSymbol) -> Result<Rc<CompilePipeMetadata>> {
        let annotation = self
            .pipe_resolver
            .resolve(pipe_type, true)?
            .ok_or_else(|| CompilerError::syntax(format!("No Pipe decorator found on {}", pipe_type)))?;
        let pipe_meta = Rc::new(CompilePipeMetadata {
            type_: self.get_type_metadata(pipe_type, None)?,
            name: annotation.get_str("name").unwrap_or_default().to_string(),
            pure: annotation.get_bool("pure").unwrap_or(true),
        });
        self.caches
            .pipes
            .borrow_mut()
            .insert(pipe_type.clone(), pipe_meta.clone());
        self.caches.summaries.borrow_mut().insert(
            pipe_type.clone(),
            Some(CompileTypeSummary::Pipe(pipe_meta.to_summary())),
        );
        Ok(pipe_meta)
    }

    fn get_dependencies_metadata(
        &self,
        type_or_func: &StaticSymbol,
        dependencies: Option<&[StaticValue]>,
    ) -> Result<Vec<CompileDiDependencyMetadata>> {
        let params: Vec<DependencyParam> = match dependencies {
            Some(deps) => deps
                .iter()
                .map(|dep| match dep {
                    StaticValue::Array(entries) => DependencyParam::Entries(entries.clone()),
                    token => DependencyParam::Token(token.clone()),
                })
                .collect(),
            None => self
                .reflector
                .parameters(type_or_func)?
                .into_iter()
                .map(DependencyParam::Entries)
                .collect(),
        };

        let dependencies_metadata: Vec<Option<CompileDiDependencyMetadata>> = params
            .into_iter()
            .map(|param| {
                let mut dep = CompileDiDependencyMetadata::default();
                let mut token = StaticValue::Undefined;
                match param {
                    DependencyParam::Token(value) => token = value,
                    DependencyParam::Entries(entries) => {
                        for entry in entries {
                            match &entry {
                                StaticValue::Annotation(marker) => match marker.kind {
                                    MetadataKind::Host => dep.is_host = true,
                                    MetadataKind::Self_ => dep.is_self = true,
                                    MetadataKind::SkipSelf => dep.is_skip_self = true,
                                    MetadataKind::Optional => dep.is_optional = true,
                                    MetadataKind::Attribute => {
                                        dep.is_attribute = true;
                                        token = marker
                                            .get("attributeName")
                                            .cloned()
                                            .unwrap_or(StaticValue::Undefined);
                                    }
                                    MetadataKind::Inject => {
                                        token = marker
                                            .get("token")
                                            .cloned()
                                            .unwrap_or(StaticValue::Undefined);
                                    }
                                    _ => {}
                                },
                                StaticValue::Symbol(_) if token.is_nullish() => token = entry.clone(),
                                _ => {}
                            }
                        }
                    }
                }
                if token.is_nullish() {
                    return None;
                }
                dep.token = Some(token_metadata(&token));
                Some(dep)
            })
            .collect();

        if dependencies_metadata.iter().any(Option::is_none) {
            let deps_tokens = dependencies_metadata
                .iter()
                .map(|dep| match dep.as_ref().and_then(|d| d.token.as_ref()) {
                    Some(token) => token_display(token),
                    None => "?".to_string(),
                })
                .collect::<Vec<_>>()
                .join(", ");
            self.report_error(
                CompilerError::syntax(format!(
                    "Can't resolve all parameters for {}: ({}).",
                    type_or_func, deps_tokens
                )),
                type_or_func,
            )?;
        }
        Ok(dependencies_metadata.into_iter().flatten().collect())
    }

    fn get_providers_metadata(
        &self,
        providers: &[StaticValue],
        target_entry_components: &mut Vec<StaticSymbol>,
        debug_info: Option<&str>,
        ty: &StaticSymbol,
    ) -> Result<Vec<CompileProviderMetadata>> {
        let mut compile_providers = Vec::new();
        self.collect_providers(
            providers,
            target_entry_components,
            debug_info,
            &mut compile_providers,
            ty,
        )?;
        Ok(compile_providers)
    }

    fn collect_providers(
        &self,
        providers: &[StaticValue],
        target_entry_components: &mut Vec<StaticSymbol>,
        debug_info: Option<&str>,
        compile_providers: &mut Vec<CompileProviderMetadata>,
        ty: &StaticSymbol,
    ) -> Result<()> {
        for (provider_idx, provider) in providers.iter().enumerate() {
            let provider_meta = match provider {
                StaticValue::Array(nested) => {
                    self.collect_providers(nested, target_entry_components, None, compile_providers, ty)?;
                    continue;
                }
                StaticValue::Object(literal) if literal.contains_key("provide") => {
                    ProviderMeta::from_literal(literal)
                }
                StaticValue::Symbol(_) => ProviderMeta::for_class(provider),
                _ => {
                    let providers_info = providers
                        .iter()
                        .enumerate()
                        .filter_map(|(seen_idx, seen)| {
                            if seen_idx < provider_idx {
                                Some(seen.to_js_string())
                            } else if seen_idx == provider_idx {
                                Some(format!("?{}?", seen.to_js_string()))
                            } else if seen_idx == provider_idx + 1 {
                                Some("...".to_string())
                            } else {
                                None
                            }
                        })
                        .collect::<Vec<_>>()
                        .join(", ");
                    self.report_error(
                        CompilerError::syntax(format!(
                            "Invalid {} - only instances of Provider and Type are allowed, got: [{}]",
                            debug_info.unwrap_or("provider"),
                            providers_info
                        )),
                        ty,
                    )?;
                    continue;
                }
            };
            if self.is_analyze_for_entry_components(&provider_meta.token)? {
                let components = self.get_entry_components_from_provider(&provider_meta, ty)?;
                target_entry_components.extend(components);
            } else {
                compile_providers.push(self.get_provider_metadata(&provider_meta)?);
            }
        }
        Ok(())
    }

    fn is_analyze_for_entry_components(&self, token: &StaticValue) -> Result<bool> {
        match token {
            StaticValue::Symbol(symbol) => Ok(*symbol
                == resolve_identifier(&*self.reflector, &Identifiers::ANALYZE_FOR_ENTRY_COMPONENTS)?),
            _ => Ok(false),
        }
    }

    fn get_entry_components_from_provider(
        &self,
        provider: &ProviderMeta,
        ty: &StaticSymbol,
    ) -> Result<Vec<StaticSymbol>> {
        if provider.use_factory.is_some() || provider.use_existing.is_some() || provider.use_class.is_some() {
            self.report_error(
                CompilerError::syntax("The ANALYZE_FOR_ENTRY_COMPONENTS token only supports useValue!"),
                ty,
            )?;
            return Ok(Vec::new());
        }
        if !provider.multi {
            self.report_error(
                CompilerError::syntax("The ANALYZE_FOR_ENTRY_COMPONENTS token only supports 'multi = true'!"),
                ty,
            )?;
            return Ok(Vec::new());
        }
        let mut collected_identifiers = Vec::new();
        if let Some(value) = &provider.use_value {
            extract_identifiers(value, &mut collected_identifiers);
        }
        let mut components = Vec::new();
        for identifier in collected_identifiers {
            if self.directive_resolver.is_directive(&identifier)? {
                components.push(identifier);
            }
        }
        Ok(components)
    }

    fn get_provider_metadata(&self, provider: &ProviderMeta) -> Result<CompileProviderMetadata> {
        let mut use_class = None;
        let mut use_factory = None;
        let mut deps = None;
        if let Some(StaticValue::Symbol(class)) = &provider.use_class {
            let type_meta = self.get_type_metadata(class, provider.dependencies.as_deref())?;
            deps = Some(type_meta.di_deps.clone());
            use_class = Some(type_meta);
        } else if let Some(StaticValue::Symbol(factory)) = &provider.use_factory {
            let factory_meta = self.get_factory_metadata(factory, provider.dependencies.as_deref())?;
            deps = Some(factory_meta.di_deps.clone());
            use_factory = Some(factory_meta);
        }
        Ok(CompileProviderMetadata {
            token: token_metadata(&provider.token),
            use_class,
            use_value: provider.use_value.clone(),
            use_existing: provider.use_existing.as_ref().map(token_metadata),
            use_factory,
            deps,
            multi: provider.multi,
        })
    }

    fn get_queries_metadata(
        &self,
        queries: &IndexMap<String, StaticValue>,
        is_view_query: bool,
        directive_type: &StaticSymbol,
    ) -> Result<Vec<CompileQueryMetadata>> {
        let mut result = Vec::new();
        for (property_name, query) in queries {
            let query = match query.as_annotation() {
                Some(query) => query,
                None => continue,
            };
            if query.get_bool("isViewQuery").unwrap_or(false) == is_view_query {
                result.push(self.get_query_metadata(query, property_name, directive_type)?);
            }
        }
        Ok(result)
    }

    fn get_query_metadata(
        &self,
        query: &Annotation,
        property_name: &str,
        type_or_func: &StaticSymbol,
    ) -> Result<CompileQueryMetadata> {
        let selectors = match query.get("selector") {
            Some(StaticValue::String(selector)) => QUERY_VAR_BINDINGS
                .split(selector)
                .map(CompileTokenMetadata::from_value)
                .collect(),
            selector => {
                let selector = selector.cloned().unwrap_or(StaticValue::Undefined);
                if !selector.is_truthy() {
                    self.report_error(
                        CompilerError::syntax(format!(
                            "Can't construct a query for the property \"{}\" of \"{}\" since the query selector wasn't defined.",
                            property_name, type_or_func
                        )),
                        type_or_func,
                    )?;
                }
                vec![token_metadata(&selector)]
            }
        };
        Ok(CompileQueryMetadata {
            selectors,
            first: query.get_bool("first").unwrap_or(false),
            descendants: query.get_bool("descendants").unwrap_or(false),
            property_name: property_name.to_string(),
            read: query
                .get("read")
                .filter(|read| read.is_truthy())
                .map(token_metadata),
        })
    }
}

fn component_module_url(ty: &StaticSymbol) -> String {
    ty.file_path().to_string()
}

fn token_metadata(token: &StaticValue) -> CompileTokenMetadata {
    match token {
        StaticValue::Symbol(symbol) => CompileTokenMetadata::Identifier(symbol.clone()),
        other => CompileTokenMetadata::Value(other.clone()),
    }
}

fn token_display(token: &CompileTokenMetadata) -> String {
    match token {
        CompileTokenMetadata::Identifier(symbol) => symbol.to_string(),
        CompileTokenMetadata::Value(value) => value.to_js_string(),
    }
}

fn string_list(values: &[StaticValue]) -> Vec<String> {
    values.iter().map(StaticValue::to_js_string).collect()
}

fn assert_array_of_strings(identifier: &str, value: Option<&StaticValue>) -> Result<Vec<String>> {
    match value {
        None | Some(StaticValue::Undefined) | Some(StaticValue::Null) => Ok(Vec::new()),
        Some(StaticValue::Array(items)) if items.iter().all(|item| item.as_str().is_some()) => {
            Ok(string_list(items))
        }
        Some(_) => Err(CompilerError::syntax(format!(
            "Expected '{}' to be an array of strings.",
            identifier
        ))),
    }
}

fn template_string(annotation: &Annotation, field: &str, ty: &StaticSymbol) -> Result<Option<String>> {
    match annotation.get(field) {
        None => Ok(None),
        Some(value) if value.is_nullish() => Ok(None),
        Some(StaticValue::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(CompilerError::syntax(format!(
            "The {} specified for component {} is not a string",
            field, ty
        ))),
    }
}

fn view_encapsulation(value: &StaticValue) -> Option<ViewEncapsulation> {
    match value {
        StaticValue::Number(index) => ViewEncapsulation::from_index(*index as i64),
        StaticValue::Symbol(symbol) => symbol
            .members()
            .last()
            .and_then(|member| ViewEncapsulation::from_member(member)),
        _ => None,
    }
}

fn change_detection_strategy(value: &StaticValue) -> Option<ChangeDetectionStrategy> {
    match value {
        StaticValue::Number(index) => ChangeDetectionStrategy::from_index(*index as i64),
        StaticValue::Symbol(symbol) => symbol
            .members()
            .last()
            .and_then(|member| ChangeDetectionStrategy::from_member(member)),
        _ => None,
    }
}

fn schema_metadata(value: &StaticValue) -> Option<SchemaMetadata> {
    match value {
        StaticValue::Object(schema) => schema.get("name").and_then(StaticValue::as_str).map(|name| {
            SchemaMetadata {
                name: name.to_string(),
            }
        }),
        StaticValue::Symbol(symbol) => match symbol.name() {
            "CUSTOM_ELEMENTS_SCHEMA" => Some(SchemaMetadata {
                name: CUSTOM_ELEMENTS_SCHEMA_NAME.to_string(),
            }),
            "NO_ERRORS_SCHEMA" => Some(SchemaMetadata {
                name: NO_ERRORS_SCHEMA_NAME.to_string(),
            }),
            _ => None,
        },
        _ => None,
    }
}

/// Every symbol nested anywhere inside `value`.
fn extract_identifiers(value: &StaticValue, target: &mut Vec<StaticSymbol>) {
    match value {
        StaticValue::Array(items) => items.iter().for_each(|item| extract_identifiers(item, target)),
        StaticValue::Object(map) => map.values().for_each(|item| extract_identifiers(item, target)),
        StaticValue::Symbol(symbol) => target.push(symbol.clone()),
        _ => {}
    }
}

fn animation_state_metadata(value: &StaticValue) -> Option<CompileAnimationStateMetadata> {
    let annotation = value.as_annotation()?;
    match annotation.kind {
        MetadataKind::AnimationState => Some(CompileAnimationStateMetadata::Declaration {
            state_name_expr: annotation
                .get("stateNameExpr")
                .map(StaticValue::to_js_string)
                .unwrap_or_default(),
            styles: annotation
                .get("styles")
                .and_then(StaticValue::as_annotation)
                .map(|styles| animation_style_metadata(styles))
                .unwrap_or_default(),
        }),
        MetadataKind::AnimationTransition => Some(CompileAnimationStateMetadata::Transition {
            state_change_expr: annotation
                .get("stateChangeExpr")
                .map(StaticValue::to_js_string)
                .unwrap_or_default(),
            steps: annotation
                .get("steps")
                .and_then(animation_metadata)
                .unwrap_or(CompileAnimationMetadata::Sequence { steps: Vec::new() }),
        }),
        _ => None,
    }
}

fn animation_style_metadata(value: &Annotation) -> CompileAnimationStyleMetadata {
    CompileAnimationStyleMetadata {
        offset: value.get("offset").and_then(StaticValue::as_number),
        styles: value
            .get_array("styles")
            .iter()
            .map(|token| match token {
                StaticValue::Object(map) => AnimationStyleToken::Map(map.clone()),
                other => AnimationStyleToken::Name(other.to_js_string()),
            })
            .collect(),
    }
}

fn animation_metadata(value: &StaticValue) -> Option<CompileAnimationMetadata> {
    let annotation = value.as_annotation()?;
    let steps = || -> Vec<CompileAnimationMetadata> {
        annotation
            .get_array("steps")
            .iter()
            .filter_map(animation_metadata)
            .collect()
    };
    match annotation.kind {
        MetadataKind::AnimationStyle => Some(CompileAnimationMetadata::Style(animation_style_metadata(annotation))),
        MetadataKind::AnimationKeyframes => Some(CompileAnimationMetadata::Keyframes {
            steps: annotation
                .get_array("steps")
                .iter()
                .filter_map(StaticValue::as_annotation)
                .map(|step| animation_style_metadata(step))
                .collect(),
        }),
        MetadataKind::AnimationAnimate => Some(CompileAnimationMetadata::Animate {
            timings: annotation.get("timings").cloned().unwrap_or(StaticValue::Number(0.0)),
            styles: Box::new(
                annotation
                    .get("styles")
                    .and_then(animation_metadata)
                    .unwrap_or_else(|| CompileAnimationMetadata::Style(Default::default())),
            ),
        }),
        MetadataKind::AnimationGroup => Some(CompileAnimationMetadata::Group { steps: steps() }),
        MetadataKind::AnimationSequence => Some(CompileAnimationMetadata::Sequence { steps: steps() }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;
    use crate::error::CollectedErrors;
    use crate::resource_loader::MapResourceLoader;
    use crate::schema::DomElementSchemaRegistry;
    use crate::summary_resolver::JitSummaryResolver;
    use crate::testing::{annotation, object, strings, MockReflector};
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    struct Fixture {
        reflector: Rc<MockReflector>,
        loader: Rc<MapResourceLoader>,
        resolver: CompileMetadataResolver,
    }

    fn fixture(collector: Option<Rc<CollectedErrors>>) -> Fixture {
        let reflector = Rc::new(MockReflector::new());
        let loader = Rc::new(MapResourceLoader::new());
        let resolver = CompileMetadataResolver::new(
            NgModuleResolver::new(reflector.clone()),
            DirectiveResolver::new(reflector.clone()),
            PipeResolver::new(reflector.clone()),
            Rc::new(JitSummaryResolver),
            Rc::new(DomElementSchemaRegistry::new()),
            DirectiveNormalizer::new(loader.clone(), CompilerConfig::default()),
            reflector.clone(),
            collector.map(|c| c as Rc<dyn ErrorCollector>),
        );
        Fixture {
            reflector,
            loader,
            resolver,
        }
    }

    impl Fixture {
        fn class(&self, name: &str) -> StaticSymbol {
            self.reflector.symbol("/app/app.ts", name)
        }

        fn module(&self, name: &str, fields: &[(&str, StaticValue)]) -> StaticSymbol {
            let ty = self.class(name);
            self.reflector.annotate(&ty, annotation(MetadataKind::NgModule, fields));
            ty
        }

        fn component(&self, name: &str, fields: &[(&str, StaticValue)]) -> StaticSymbol {
            let ty = self.class(name);
            self.reflector.annotate(&ty, annotation(MetadataKind::Component, fields));
            ty
        }

        fn directive(&self, name: &str, selector: &str) -> StaticSymbol {
            let ty = self.class(name);
            self.reflector.annotate(
                &ty,
                annotation(MetadataKind::Directive, &[("selector", selector.into())]),
            );
            ty
        }

        fn load(&self, module: &StaticSymbol) -> Result<()> {
            block_on(
                self.resolver
                    .load_ng_module_directive_and_pipe_metadata(module, true, true)?,
            )
        }

        fn module_error(&self, module: &StaticSymbol) -> String {
            self.resolver
                .get_ng_module_metadata(module, true)
                .unwrap_err()
                .to_string()
        }
    }

    fn list(symbols: &[&StaticSymbol]) -> StaticValue {
        StaticValue::Array(symbols.iter().map(|s| StaticValue::Symbol((*s).clone())).collect())
    }

    #[test]
    fn should_read_component_metadata_and_normalize_the_template() {
        let f = fixture(None);
        let comp = f.component(
            "MyComp",
            &[
                ("selector", "my-comp".into()),
                ("template", "<ng-content select=\"header\"></ng-content>".into()),
                ("inputs", strings(&["value: myValue"])),
                ("host", object(&[("(click)", "onClick()".into())])),
            ],
        );
        let module = f.module("AppModule", &[("declarations", list(&[&comp]))]);
        f.load(&module).unwrap();

        let meta = f.resolver.get_directive_metadata(&comp).unwrap();
        assert!(meta.is_component);
        assert_eq!(meta.selector.as_deref(), Some("my-comp"));
        assert_eq!(meta.inputs["value"], "myValue");
        assert_eq!(meta.host_listeners["click"], "onClick()");
        let template = meta.template.as_ref().unwrap();
        assert_eq!(template.ng_content_selectors, vec!["header"]);
        assert_eq!(template.encapsulation, Some(ViewEncapsulation::None));

        let summary = f.resolver.get_directive_summary(&comp).unwrap();
        assert_eq!(summary.template.unwrap().ng_content_selectors, vec!["header"]);
    }

    #[test]
    fn should_use_the_default_element_name_for_components_without_selector() {
        let f = fixture(None);
        let comp = f.component("NoSelector", &[("template", "".into())]);
        let module = f.module("AppModule", &[("declarations", list(&[&comp]))]);
        f.load(&module).unwrap();
        let meta = f.resolver.get_directive_metadata(&comp).unwrap();
        assert_eq!(meta.selector.as_deref(), Some("ng-component"));
    }

    #[test]
    fn should_throw_when_a_template_url_is_loaded_synchronously() {
        let f = fixture(None);
        f.loader.insert("/app/comp.html", "<b>hi</b>");
        let comp = f.component(
            "UrlComp",
            &[("selector", "url-comp".into()), ("templateUrl", "comp.html".into())],
        );
        let module = f.module("AppModule", &[("declarations", list(&[&comp]))]);
        let err = f.load(&module).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Can't compile synchronously as UrlComp is still being loaded!"
        );

        block_on(
            f.resolver
                .load_ng_module_directive_and_pipe_metadata(&module, false, true)
                .unwrap(),
        )
        .unwrap();
        let meta = f.resolver.get_directive_metadata(&comp).unwrap();
        assert_eq!(
            meta.template.as_ref().unwrap().template.as_deref(),
            Some("<b>hi</b>")
        );
    }

    #[test]
    fn should_require_loading_before_get_directive_metadata() {
        let f = fixture(None);
        let dir = f.directive("SomeDir", "[some]");
        let err = f.resolver.get_directive_metadata(&dir).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Illegal state: getDirectiveMetadata can only be called after loadNgModuleMetadata for a module that declares it. Directive SomeDir."
        );
    }

    #[test]
    fn should_report_directives_without_selector() {
        let collector = Rc::new(CollectedErrors::new());
        let f = fixture(Some(collector.clone()));
        let dir = f.class("NoSelectorDir");
        f.reflector.annotate(&dir, annotation(MetadataKind::Directive, &[]));
        let module = f.module("AppModule", &[("declarations", list(&[&dir]))]);
        f.load(&module).unwrap();
        assert_eq!(
            collector.messages(),
            vec!["Directive NoSelectorDir has no selector, please add it!"]
        );
        let meta = f.resolver.get_directive_metadata(&dir).unwrap();
        assert_eq!(meta.selector.as_deref(), Some("error"));
    }

    #[test]
    fn should_reject_types_declared_by_two_modules() {
        let collector = Rc::new(CollectedErrors::new());
        let f = fixture(Some(collector.clone()));
        let dir = f.directive("SharedDir", "[shared]");
        let a = f.module("ModuleA", &[("declarations", list(&[&dir]))]);
        let b = f.module("ModuleB", &[("declarations", list(&[&dir]))]);
        f.resolver.get_ng_module_metadata(&a, true).unwrap();
        f.resolver.get_ng_module_metadata(&b, true).unwrap();
        assert_eq!(
            collector.messages(),
            vec!["Type SharedDir is part of the declarations of 2 modules: ModuleA and ModuleB! \
                  Please consider moving SharedDir to a higher module that imports ModuleA and ModuleB. \
                  You can also create a new NgModule that exports and includes SharedDir then import that NgModule in ModuleA and ModuleB."]
        );
    }

    #[test]
    fn should_report_unexpected_imports() {
        let f = fixture(None);
        let plain = f.class("Plain");
        let module = f.module("AppModule", &[("imports", list(&[&plain]))]);
        assert_eq!(
            f.module_error(&module),
            "Unexpected value 'Plain' imported by the module 'AppModule'"
        );

        let f = fixture(None);
        let dir = f.directive("SomeDir", "[some]");
        let module = f.module("AppModule", &[("imports", list(&[&dir]))]);
        assert_eq!(
            f.module_error(&module),
            "Unexpected directive 'SomeDir' imported by the module 'AppModule'"
        );

        let f = fixture(None);
        let module = f.module("AppModule", &[("imports", StaticValue::Array(vec![StaticValue::Number(1.0)]))]);
        assert_eq!(
            f.module_error(&module),
            "Unexpected value '1' imported by the module 'AppModule'"
        );
    }

    #[test]
    fn should_report_unexpected_declarations() {
        let f = fixture(None);
        let other = f.module("OtherModule", &[]);
        let module = f.module("AppModule", &[("declarations", list(&[&other]))]);
        assert_eq!(
            f.module_error(&module),
            "Unexpected module 'OtherModule' declared by the module 'AppModule'"
        );

        let f = fixture(None);
        let plain = f.class("Plain");
        let module = f.module("AppModule", &[("declarations", list(&[&plain]))]);
        assert_eq!(
            f.module_error(&module),
            "Unexpected value 'Plain' declared by the module 'AppModule'"
        );
    }

    #[test]
    fn should_only_export_reachable_directives() {
        let f = fixture(None);
        let dir = f.directive("LonelyDir", "[lonely]");
        let module = f.module("AppModule", &[("exports", list(&[&dir]))]);
        assert_eq!(
            f.module_error(&module),
            "Can't export directive LonelyDir from AppModule as it was neither declared nor imported!"
        );
    }

    #[test]
    fn should_collect_transitive_directives_and_providers() {
        let f = fixture(None);
        let shared_dir = f.directive("SharedDir", "[shared]");
        let service = f.class("Service");
        let shared = f.module(
            "SharedModule",
            &[
                ("declarations", list(&[&shared_dir])),
                ("exports", list(&[&shared_dir])),
                ("providers", list(&[&service])),
            ],
        );
        let feature = f.module("FeatureModule", &[("imports", list(&[&shared])), ("exports", list(&[&shared]))]);
        let app = f.module("AppModule", &[("imports", list(&[&shared, &feature]))]);

        let meta = f.resolver.get_ng_module_metadata(&app, true).unwrap().unwrap();
        let transitive = &meta.transitive_module;
        assert!(transitive.directives.contains(&shared_dir));
        assert!(transitive.has_module(&shared));
        assert!(transitive.has_module(&feature));
        assert!(transitive.has_module(&app));
        // SharedModule's provider reaches AppModule twice but is kept once.
        let service_providers: Vec<_> = transitive
            .providers
            .iter()
            .filter(|p| p.provider.token.identifier() == Some(&service))
            .collect();
        assert_eq!(service_providers.len(), 1);
        assert_eq!(service_providers[0].module, shared);
    }

    #[test]
    fn should_fold_bootstrap_into_entry_components() {
        let f = fixture(None);
        let comp = f.component("AppComp", &[("selector", "app".into()), ("template", "".into())]);
        let module = f.module(
            "AppModule",
            &[("declarations", list(&[&comp])), ("bootstrap", list(&[&comp]))],
        );
        let meta = f.resolver.get_ng_module_metadata(&module, true).unwrap().unwrap();
        assert_eq!(meta.bootstrap_components, vec![comp.clone()]);
        assert_eq!(meta.entry_components, vec![comp.clone()]);
        assert!(meta.transitive_module.entry_components.contains(&comp));
    }

    #[test]
    fn should_report_unresolvable_constructor_parameters() {
        let f = fixture(None);
        let dep = f.class("Dep");
        let service = f.class("Service");
        f.reflector.set_params(
            &service,
            vec![vec![StaticValue::Symbol(dep.clone())], vec![]],
        );
        let module = f.module("AppModule", &[("providers", list(&[&service]))]);
        assert_eq!(
            f.module_error(&module),
            "Can't resolve all parameters for Service: (Dep, ?)."
        );
    }

    #[test]
    fn should_read_di_markers_of_parameters() {
        let f = fixture(None);
        let dep = f.class("Dep");
        let service = f.class("Service");
        f.reflector.set_params(
            &service,
            vec![
                vec![
                    StaticValue::Symbol(dep.clone()),
                    annotation(MetadataKind::Optional, &[]).into_value(),
                    annotation(MetadataKind::Host, &[]).into_value(),
                ],
                vec![annotation(MetadataKind::Attribute, &[("attributeName", "title".into())]).into_value()],
            ],
        );
        let type_meta = f.resolver.get_type_metadata(&service, None).unwrap();
        assert_eq!(type_meta.di_deps.len(), 2);
        assert!(type_meta.di_deps[0].is_optional && type_meta.di_deps[0].is_host);
        assert_eq!(type_meta.di_deps[0].token, Some(CompileTokenMetadata::Identifier(dep)));
        assert!(type_meta.di_deps[1].is_attribute);
        assert_eq!(type_meta.di_deps[1].token, Some(CompileTokenMetadata::from_value("title")));
    }

    #[test]
    fn should_report_invalid_providers() {
        let f = fixture(None);
        let service = f.class("Service");
        let module = f.module(
            "AppModule",
            &[(
                "providers",
                StaticValue::Array(vec![
                    StaticValue::Symbol(service),
                    StaticValue::Number(1.0),
                    StaticValue::from("a"),
                    StaticValue::from("b"),
                ]),
            )],
        );
        assert_eq!(
            f.module_error(&module),
            "Invalid provider for the NgModule 'AppModule' - only instances of Provider and Type are allowed, got: [Service, ?1?, ...]"
        );
    }

    #[test]
    fn should_normalize_provider_literals() {
        let f = fixture(None);
        let token = f.class("TOKEN");
        let factory = f.class("createThing");
        let module = f.module(
            "AppModule",
            &[(
                "providers",
                StaticValue::Array(vec![
                    object(&[("provide", "config".into()), ("useValue", StaticValue::Number(42.0))]),
                    object(&[
                        ("provide", StaticValue::Symbol(token.clone())),
                        ("useFactory", StaticValue::Symbol(factory.clone())),
                        ("deps", strings(&["config"])),
                        ("multi", StaticValue::Bool(true)),
                    ]),
                ]),
            )],
        );
        let meta = f.resolver.get_ng_module_metadata(&module, true).unwrap().unwrap();
        assert_eq!(meta.providers[0].token, CompileTokenMetadata::from_value("config"));
        assert_eq!(meta.providers[0].use_value, Some(StaticValue::Number(42.0)));
        let factory_provider = &meta.providers[1];
        assert!(factory_provider.multi);
        assert_eq!(factory_provider.use_factory.as_ref().unwrap().reference, factory);
        assert_eq!(
            factory_provider.deps.as_ref().unwrap()[0].token,
            Some(CompileTokenMetadata::from_value("config"))
        );
    }

    #[test]
    fn should_turn_analyze_for_entry_components_into_entry_components() {
        let f = fixture(None);
        let comp = f.component("Dynamic", &[("selector", "dyn".into()), ("template", "".into())]);
        let analyze = f.reflector.symbol(
            Identifiers::ANALYZE_FOR_ENTRY_COMPONENTS.module_url,
            Identifiers::ANALYZE_FOR_ENTRY_COMPONENTS.name,
        );
        let module = f.module(
            "AppModule",
            &[(
                "providers",
                StaticValue::Array(vec![object(&[
                    ("provide", StaticValue::Symbol(analyze.clone())),
                    ("useValue", object(&[("routes", list(&[&comp]))])),
                    ("multi", StaticValue::Bool(true)),
                ])]),
            )],
        );
        let meta = f.resolver.get_ng_module_metadata(&module, true).unwrap().unwrap();
        assert!(meta.providers.is_empty());
        assert_eq!(meta.entry_components, vec![comp]);

        let f = fixture(None);
        let module = f.module(
            "AppModule",
            &[(
                "providers",
                StaticValue::Array(vec![object(&[
                    ("provide", StaticValue::Symbol(analyze)),
                    ("useValue", StaticValue::Array(vec![])),
                ])]),
            )],
        );
        assert_eq!(
            f.module_error(&module),
            "The ANALYZE_FOR_ENTRY_COMPONENTS token only supports 'multi = true'!"
        );
    }

    #[test]
    fn should_split_query_selectors() {
        let f = fixture(None);
        let dir = f.class("QueryDir");
        f.reflector.annotate(
            &dir,
            annotation(MetadataKind::Directive, &[("selector", "[q]".into())]),
        );
        f.reflector.decorate_prop(
            &dir,
            "items",
            annotation(
                MetadataKind::ContentChildren,
                &[
                    ("selector", "a, b".into()),
                    ("first", StaticValue::Bool(false)),
                    ("descendants", StaticValue::Bool(false)),
                    ("isViewQuery", StaticValue::Bool(false)),
                ],
            ),
        );
        f.reflector.decorate_prop(
            &dir,
            "missing",
            annotation(MetadataKind::ViewChild, &[("isViewQuery", StaticValue::Bool(true))]),
        );
        let module = f.module("AppModule", &[("declarations", list(&[&dir]))]);
        let err = f.load(&module).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Can't construct a query for the property \"missing\" of \"QueryDir\" since the query selector wasn't defined."
        );

        let collector = Rc::new(CollectedErrors::new());
        let f2 = fixture(Some(collector));
        let dir2 = f2.class("QueryDir");
        f2.reflector.annotate(
            &dir2,
            annotation(MetadataKind::Directive, &[("selector", "[q]".into())]),
        );
        f2.reflector.decorate_prop(
            &dir2,
            "items",
            annotation(MetadataKind::ContentChildren, &[("selector", "a, b".into())]),
        );
        let module2 = f2.module("AppModule", &[("declarations", list(&[&dir2]))]);
        f2.load(&module2).unwrap();
        let meta = f2.resolver.get_directive_metadata(&dir2).unwrap();
        assert_eq!(
            meta.queries[0].selectors,
            vec![
                CompileTokenMetadata::from_value("a"),
                CompileTokenMetadata::from_value("b")
            ]
        );
    }

    #[test]
    fn should_load_pipes_declared_by_the_module() {
        let f = fixture(None);
        let pipe = f.class("UpperPipe");
        f.reflector.annotate(
            &pipe,
            annotation(MetadataKind::Pipe, &[("name", "upper".into()), ("pure", StaticValue::Bool(false))]),
        );
        let module = f.module("AppModule", &[("declarations", list(&[&pipe]))]);
        f.load(&module).unwrap();
        let meta = f.resolver.get_pipe_metadata(&pipe).unwrap();
        assert_eq!(meta.name, "upper");
        assert!(!meta.pure);
        assert_eq!(f.resolver.get_pipe_summary(&pipe).unwrap().name, "upper");
    }

    #[test]
    fn should_clear_the_module_cache_with_any_type() {
        let f = fixture(None);
        let dir = f.directive("SomeDir", "[some]");
        let module = f.module("AppModule", &[("declarations", list(&[&dir]))]);
        f.load(&module).unwrap();
        let first = f.resolver.get_ng_module_metadata(&module, true).unwrap().unwrap();
        f.resolver.clear_cache_for(&dir);
        assert!(f.resolver.get_directive_metadata(&dir).is_err());
        let second = f.resolver.get_ng_module_metadata(&module, true).unwrap().unwrap();
        assert!(!Rc::ptr_eq(&first, &second));
    }

    fn config_provider(value: &str, multi: bool) -> StaticValue {
        object(&[
            ("provide", "config".into()),
            ("useValue", value.into()),
            ("multi", StaticValue::Bool(multi)),
        ])
    }

    fn config_values(meta: &CompileNgModuleMetadata) -> Vec<(StaticValue, String)> {
        meta.transitive_module
            .providers
            .iter()
            .filter(|p| p.provider.token == CompileTokenMetadata::from_value("config"))
            .map(|p| (p.provider.use_value.clone().unwrap(), p.module.name().to_string()))
            .collect()
    }

    fn resolved_config(f: &Fixture, meta: &CompileNgModuleMetadata) -> crate::template_parser::template_ast::ProviderAst {
        let builtins = crate::provider_analyzer::BuiltinTokens::resolve(&*f.reflector).unwrap();
        crate::provider_analyzer::NgModuleProviderAnalyzer::new(
            meta,
            &[],
            builtins,
            &crate::parse_util::ParseSourceSpan::empty("AppModule"),
        )
        .parse()
        .unwrap()
        .into_iter()
        .find(|p| p.token == CompileTokenMetadata::from_value("config"))
        .unwrap()
    }

    #[test]
    fn should_combine_multi_providers_of_imported_modules_in_import_order() {
        let f = fixture(None);
        let a = f.module("ModuleA", &[("providers", StaticValue::Array(vec![config_provider("a", true)]))]);
        let b = f.module("ModuleB", &[("providers", StaticValue::Array(vec![config_provider("b", true)]))]);
        let app = f.module("AppModule", &[("imports", list(&[&a, &b]))]);

        let meta = f.resolver.get_ng_module_metadata(&app, true).unwrap().unwrap();
        assert_eq!(
            config_values(&meta),
            vec![
                (StaticValue::from("a"), "ModuleA".to_string()),
                (StaticValue::from("b"), "ModuleB".to_string())
            ]
        );
        let resolved = resolved_config(&f, &meta);
        assert!(resolved.multi_provider);
        let values: Vec<_> = resolved.providers.iter().map(|p| p.use_value.clone().unwrap()).collect();
        assert_eq!(values, vec![StaticValue::from("a"), StaticValue::from("b")]);
    }

    #[test]
    fn should_let_the_last_imported_module_win_for_plain_providers() {
        let f = fixture(None);
        let a = f.module("ModuleA", &[("providers", StaticValue::Array(vec![config_provider("a", false)]))]);
        let b = f.module("ModuleB", &[("providers", StaticValue::Array(vec![config_provider("b", false)]))]);
        let app = f.module("AppModule", &[("imports", list(&[&a, &b]))]);
        let meta = f.resolver.get_ng_module_metadata(&app, true).unwrap().unwrap();
        let resolved = resolved_config(&f, &meta);
        assert!(!resolved.multi_provider);
        assert_eq!(resolved.providers.len(), 1);
        assert_eq!(resolved.providers[0].use_value, Some("b".into()));

        let reversed = f.module("ReversedModule", &[("imports", list(&[&b, &a]))]);
        let meta = f.resolver.get_ng_module_metadata(&reversed, true).unwrap().unwrap();
        let resolved = resolved_config(&f, &meta);
        assert_eq!(resolved.providers.len(), 1);
        assert_eq!(resolved.providers[0].use_value, Some("a".into()));
    }

    #[test]
    fn should_order_transitive_lists_by_import_order() {
        let f = fixture(None);
        let dir_a = f.directive("DirA", "[a]");
        let dir_b = f.directive("DirB", "[b]");
        let pipe_a = f.class("PipeA");
        f.reflector.annotate(&pipe_a, annotation(MetadataKind::Pipe, &[("name", "pa".into())]));
        let pipe_b = f.class("PipeB");
        f.reflector.annotate(&pipe_b, annotation(MetadataKind::Pipe, &[("name", "pb".into())]));
        let a = f.module(
            "ModuleA",
            &[("declarations", list(&[&dir_a, &pipe_a])), ("exports", list(&[&dir_a, &pipe_a]))],
        );
        let b = f.module(
            "ModuleB",
            &[("declarations", list(&[&dir_b, &pipe_b])), ("exports", list(&[&dir_b, &pipe_b]))],
        );
        let forward = f.module("ForwardModule", &[("imports", list(&[&a, &b]))]);
        let backward = f.module("BackwardModule", &[("imports", list(&[&b, &a]))]);

        let lists = |module: &StaticSymbol| {
            let meta = f.resolver.get_ng_module_metadata(module, true).unwrap().unwrap();
            let transitive = &meta.transitive_module;
            (
                transitive.modules.iter().map(|m| m.reference.name().to_string()).collect::<Vec<_>>(),
                transitive.directives.iter().map(|d| d.name().to_string()).collect::<Vec<_>>(),
                transitive.pipes.iter().map(|p| p.name().to_string()).collect::<Vec<_>>(),
            )
        };

        let first = lists(&forward);
        assert_eq!(
            first,
            (
                vec!["ModuleA".to_string(), "ModuleB".to_string(), "ForwardModule".to_string()],
                vec!["DirA".to_string(), "DirB".to_string()],
                vec!["PipeA".to_string(), "PipeB".to_string()],
            )
        );
        assert_eq!(
            lists(&backward),
            (
                vec!["ModuleB".to_string(), "ModuleA".to_string(), "BackwardModule".to_string()],
                vec!["DirB".to_string(), "DirA".to_string()],
                vec!["PipeB".to_string(), "PipeA".to_string()],
            )
        );
        // Recomputing after a cache flush yields the same order.
        f.resolver.clear_cache_for(&forward);
        assert_eq!(lists(&forward), first);
    }

    #[test]
    fn should_only_drop_the_cleared_type() {
        let f = fixture(None);
        let cleared = f.directive("ClearedDir", "[cleared]");
        let kept = f.directive("KeptDir", "[kept]");
        let pipe = f.class("KeptPipe");
        f.reflector.annotate(&pipe, annotation(MetadataKind::Pipe, &[("name", "kept".into())]));
        let module = f.module("AppModule", &[("declarations", list(&[&cleared, &kept, &pipe]))]);
        f.load(&module).unwrap();
        let kept_before = f.resolver.get_directive_metadata(&kept).unwrap();
        let pipe_before = f.resolver.get_pipe_metadata(&pipe).unwrap();

        f.resolver.clear_cache_for(&cleared);

        assert!(f.resolver.get_directive_metadata(&cleared).is_err());
        assert!(f.resolver.get_directive_summary(&cleared).is_err());
        assert!(Rc::ptr_eq(&kept_before, &f.resolver.get_directive_metadata(&kept).unwrap()));
        assert!(Rc::ptr_eq(&pipe_before, &f.resolver.get_pipe_metadata(&pipe).unwrap()));
        assert_eq!(f.resolver.get_directive_summary(&kept).unwrap().selector.as_deref(), Some("[kept]"));
    }
}
