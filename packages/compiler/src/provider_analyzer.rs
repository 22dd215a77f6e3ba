//! Provider Analyzer
//!
//! Resolves, per element, which providers the matched directives contribute
//! and which of them must be created eagerly, following dependencies up the
//! element tree. `NgModuleProviderAnalyzer` does the same for the providers of
//! a module injector.

use crate::aot::static_value::StaticValue;
use crate::compile_metadata::{
    CompileDiDependencyMetadata, CompileDirectiveMetadata, CompileDirectiveSummary,
    CompileNgModuleMetadata, CompileProviderMetadata, CompileQueryMetadata, CompileTokenMetadata,
    TokenKey,
};
use crate::compile_reflector::CompileReflector;
use crate::core::LifecycleHooks;
use crate::error::{CompilerError, Result};
use crate::identifiers::{resolve_identifier, Identifiers};
use crate::parse_util::{ParseError, ParseSourceSpan};
use crate::template_parser::template_ast::{AttrAst, DirectiveAst, ProviderAst, ProviderAstType, ReferenceAst};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Tokens the view can always satisfy without a provider.
#[derive(Debug, Clone)]
pub struct BuiltinTokens {
    pub renderer: TokenKey,
    pub element_ref: TokenKey,
    pub change_detector_ref: TokenKey,
    pub template_ref: TokenKey,
    pub view_container_ref: TokenKey,
    pub injector: TokenKey,
    pub component_factory_resolver: TokenKey,
}

impl BuiltinTokens {
    pub fn resolve(reflector: &dyn CompileReflector) -> Result<Self> {
        let key = |spec| resolve_identifier(reflector, spec).map(TokenKey::Symbol);
        Ok(BuiltinTokens {
            renderer: key(&Identifiers::Renderer)?,
            element_ref: key(&Identifiers::ElementRef)?,
            change_detector_ref: key(&Identifiers::ChangeDetectorRef)?,
            template_ref: key(&Identifiers::TemplateRef)?,
            view_container_ref: key(&Identifiers::ViewContainerRef)?,
            injector: key(&Identifiers::Injector)?,
            component_factory_resolver: key(&Identifiers::ComponentFactoryResolver)?,
        })
    }
}

type QueriesByToken = HashMap<TokenKey, Vec<CompileQueryMetadata>>;

fn add_query_to_token_map(map: &mut QueriesByToken, query: &CompileQueryMetadata) {
    for token in &query.selectors {
        map.entry(token.key()).or_default().push(query.clone());
    }
}

/// State shared by every element of one component view.
pub struct ProviderViewContext {
    component_is_host: bool,
    component_type: TokenKey,
    view_queries: QueriesByToken,
    view_providers: HashSet<TokenKey>,
    builtins: BuiltinTokens,
    pub errors: RefCell<Vec<ParseError>>,
}

impl ProviderViewContext {
    pub fn new(component: &CompileDirectiveMetadata, builtins: BuiltinTokens) -> Self {
        let mut view_queries = QueriesByToken::new();
        for query in &component.view_queries {
            add_query_to_token_map(&mut view_queries, query);
        }
        let view_providers = component
            .view_providers
            .iter()
            .map(|provider| provider.token.key())
            .collect();
        ProviderViewContext {
            component_is_host: component.is_host,
            component_type: TokenKey::Symbol(component.reference().clone()),
            view_queries,
            view_providers,
            builtins,
            errors: RefCell::new(Vec::new()),
        }
    }

    fn report(&self, message: String, source_span: &ParseSourceSpan) {
        self.errors
            .borrow_mut()
            .push(ParseError::new(source_span.clone(), message));
    }
}

pub type ProviderElementContextRef = Rc<RefCell<ProviderElementContext>>;

pub struct ProviderElementContext {
    view_context: Rc<ProviderViewContext>,
    parent: Option<ProviderElementContextRef>,
    is_view_root: bool,
    directive_asts: Vec<DirectiveAst>,
    source_span: ParseSourceSpan,
    attrs: HashMap<String, String>,
    content_queries: QueriesByToken,
    all_providers: IndexMap<TokenKey, ProviderAst>,
    transformed_providers: IndexMap<TokenKey, ProviderAst>,
    seen_providers: HashSet<TokenKey>,
    has_view_container: bool,
}

impl ProviderElementContext {
    pub fn new(
        view_context: Rc<ProviderViewContext>,
        parent: Option<ProviderElementContextRef>,
        is_view_root: bool,
        directive_asts: Vec<DirectiveAst>,
        attrs: &[AttrAst],
        refs: &[ReferenceAst],
        source_span: ParseSourceSpan,
    ) -> ProviderElementContextRef {
        let directives: Vec<&CompileDirectiveSummary> =
            directive_asts.iter().map(|d| &d.directive).collect();
        let mut errors = Vec::new();
        let all_providers = resolve_providers_from_directives(&directives, &source_span, &mut errors);
        let mut content_queries = QueriesByToken::new();
        for directive in &directives {
            for query in &directive.queries {
                add_query_to_token_map(&mut content_queries, query);
            }
        }
        view_context.errors.borrow_mut().extend(errors);

        let context = Rc::new(RefCell::new(ProviderElementContext {
            view_context,
            parent,
            is_view_root,
            directive_asts,
            source_span,
            attrs: attrs
                .iter()
                .map(|attr| (attr.name.clone(), attr.value.clone()))
                .collect(),
            content_queries,
            all_providers,
            transformed_providers: IndexMap::new(),
            seen_providers: HashSet::new(),
            has_view_container: false,
        }));

        {
            let mut this = context.borrow_mut();
            let mut queried_tokens = HashSet::new();
            let provider_tokens: Vec<CompileTokenMetadata> =
                this.all_providers.values().map(|p| p.token.clone()).collect();
            for token in &provider_tokens {
                this.add_query_reads_to(token, &mut queried_tokens);
            }
            for reference in refs {
                this.add_query_reads_to(
                    &CompileTokenMetadata::from_value(reference.name.as_str()),
                    &mut queried_tokens,
                );
            }
            if queried_tokens.contains(&this.view_context.builtins.view_container_ref) {
                this.has_view_container = true;
            }
            // eager providers first
            let providers: Vec<(ProviderAstType, CompileTokenMetadata, bool)> = this
                .all_providers
                .values()
                .map(|p| (p.provider_type, p.token.clone(), p.eager))
                .collect();
            for (provider_type, token, eager) in providers {
                if eager || queried_tokens.contains(&token.key()) {
                    this.get_or_create_local_provider(provider_type, &token, true);
                }
            }
        }
        context
    }

    /// Creates the providers nobody asked for eagerly.
    pub fn after_element(&mut self) {
        let providers: Vec<(ProviderAstType, CompileTokenMetadata)> = self
            .all_providers
            .values()
            .map(|p| (p.provider_type, p.token.clone()))
            .collect();
        for (provider_type, token) in providers {
            self.get_or_create_local_provider(provider_type, &token, false);
        }
    }

    pub fn transform_providers(&self) -> Vec<ProviderAst> {
        self.transformed_providers.values().cloned().collect()
    }

    /// Directives ordered by the creation order of their instances.
    pub fn transformed_directive_asts(&self) -> Vec<DirectiveAst> {
        let order: Vec<Option<TokenKey>> = self
            .transformed_providers
            .values()
            .map(|p| p.token.identifier().map(|s| TokenKey::Symbol(s.clone())))
            .collect();
        let position = |dir: &DirectiveAst| -> i64 {
            let key = Some(TokenKey::Symbol(dir.directive.type_.reference.clone()));
            order
                .iter()
                .position(|k| *k == key)
                .map_or(-1, |p| p as i64)
        };
        let mut sorted = self.directive_asts.clone();
        sorted.sort_by_key(|dir| position(dir));
        sorted
    }

    pub fn transformed_has_view_container(&self) -> bool {
        self.has_view_container
    }

    fn add_query_reads_to(&self, token: &CompileTokenMetadata, query_read_tokens: &mut HashSet<TokenKey>) {
        for query in self.get_queries_for(token) {
            let read_token = query.read.as_ref().unwrap_or(token);
            query_read_tokens.insert(read_token.key());
        }
    }

    fn get_queries_for(&self, token: &CompileTokenMetadata) -> Vec<CompileQueryMetadata> {
        let key = token.key();
        let mut result = Vec::new();
        let mut distance = 0;
        self.collect_content_queries(&key, &mut distance, &mut result);
        let mut current = self.parent.clone();
        while let Some(element) = current {
            let element = element.borrow();
            element.collect_content_queries(&key, &mut distance, &mut result);
            current = element.parent.clone();
        }
        if let Some(queries) = self.view_context.view_queries.get(&key) {
            result.extend(queries.iter().cloned());
        }
        result
    }

    fn collect_content_queries(&self, key: &TokenKey, distance: &mut usize, result: &mut Vec<CompileQueryMetadata>) {
        if let Some(queries) = self.content_queries.get(key) {
            result.extend(
                queries
                    .iter()
                    .filter(|query| query.descendants || *distance <= 1)
                    .cloned(),
            );
        }
        if !self.directive_asts.is_empty() {
            *distance += 1;
        }
    }

    fn get_or_create_local_provider(
        &mut self,
        requesting_provider_type: ProviderAstType,
        token: &CompileTokenMetadata,
        eager: bool,
    ) -> Option<ProviderAst> {
        let key = token.key();
        let resolved_provider = self.all_providers.get(&key)?.clone();
        let requests_public = matches!(
            requesting_provider_type,
            ProviderAstType::Directive | ProviderAstType::PublicService
        );
        let requests_service = matches!(
            requesting_provider_type,
            ProviderAstType::PrivateService | ProviderAstType::PublicService
        );
        if (requests_public && resolved_provider.provider_type == ProviderAstType::PrivateService)
            || (requests_service && resolved_provider.provider_type == ProviderAstType::Builtin)
        {
            return None;
        }
        if let Some(transformed) = self.transformed_providers.get(&key) {
            return Some(transformed.clone());
        }
        if !self.seen_providers.insert(key.clone()) {
            self.view_context.report(
                format!("Cannot instantiate cyclic dependency! {}", token.token_name()),
                &self.source_span,
            );
            return None;
        }
        let provider_type = resolved_provider.provider_type;
        let providers = resolved_provider
            .providers
            .iter()
            .map(|provider| {
                transform_provider(provider, |dep| self.get_dependency(provider_type, dep, Some(eager)))
            })
            .collect();
        let transformed = ProviderAst {
            eager,
            providers,
            ..resolved_provider
        };
        self.transformed_providers.insert(key, transformed.clone());
        Some(transformed)
    }

    fn get_local_dependency(
        &mut self,
        requesting_provider_type: ProviderAstType,
        dep: &CompileDiDependencyMetadata,
        eager: Option<bool>,
    ) -> Option<CompileDiDependencyMetadata> {
        if dep.is_attribute {
            let attr_name = dep.token.as_ref().map(|t| t.token_name()).unwrap_or_default();
            let value = match self.attrs.get(&attr_name) {
                Some(value) => StaticValue::String(value.clone()),
                None => StaticValue::Null,
            };
            return Some(value_dependency(value));
        }
        let token = dep.token.as_ref()?;
        let key = token.key();
        let builtins = &self.view_context.builtins;
        if matches!(
            requesting_provider_type,
            ProviderAstType::Directive | ProviderAstType::Component
        ) {
            if key == builtins.renderer
                || key == builtins.element_ref
                || key == builtins.change_detector_ref
                || key == builtins.template_ref
            {
                return Some(dep.clone());
            }
            if key == builtins.view_container_ref {
                self.has_view_container = true;
            }
        }
        if key == self.view_context.builtins.injector {
            return Some(dep.clone());
        }
        self.get_or_create_local_provider(requesting_provider_type, token, eager.unwrap_or(false))
            .map(|_| dep.clone())
    }

    fn get_dependency(
        &mut self,
        requesting_provider_type: ProviderAstType,
        dep: &CompileDiDependencyMetadata,
        eager: Option<bool>,
    ) -> Option<CompileDiDependencyMetadata> {
        let mut result = None;
        if !dep.is_skip_self {
            result = self.get_local_dependency(requesting_provider_type, dep, eager);
        }
        if dep.is_self {
            if result.is_none() && dep.is_optional {
                result = Some(value_dependency(StaticValue::Null));
            }
        } else {
            // walk up the element tree; eagerness stops at view boundaries
            let mut current_eager = eager;
            let mut prev_is_view_root = self.is_view_root;
            let mut current = self.parent.clone();
            while result.is_none() {
                let Some(element) = current else { break };
                if prev_is_view_root {
                    current_eager = Some(false);
                }
                let mut element = element.borrow_mut();
                result = element.get_local_dependency(ProviderAstType::PublicService, dep, current_eager);
                prev_is_view_root = element.is_view_root;
                current = element.parent.clone();
            }
            if result.is_none() {
                let token_key = dep.token.as_ref().map(CompileTokenMetadata::key);
                let view = &self.view_context;
                let host_satisfied = !dep.is_host
                    || view.component_is_host
                    || token_key.as_ref() == Some(&view.component_type)
                    || token_key.as_ref().map_or(false, |k| view.view_providers.contains(k));
                result = if host_satisfied {
                    Some(dep.clone())
                } else if dep.is_optional {
                    Some(value_dependency(StaticValue::Null))
                } else {
                    None
                };
            }
        }
        if result.is_none() {
            let name = dep.token.as_ref().map(|t| t.token_name()).unwrap_or_default();
            self.view_context
                .report(format!("No provider for {}", name), &self.source_span);
        }
        result
    }
}

fn value_dependency(value: StaticValue) -> CompileDiDependencyMetadata {
    CompileDiDependencyMetadata {
        is_value: true,
        value: Some(value),
        ..Default::default()
    }
}

/// Rewrites the dependencies of `provider` through `resolve`. A `useExisting`
/// that resolves to a value becomes a `useValue`.
fn transform_provider(
    provider: &CompileProviderMetadata,
    mut resolve: impl FnMut(&CompileDiDependencyMetadata) -> Option<CompileDiDependencyMetadata>,
) -> CompileProviderMetadata {
    let mut transformed = provider.clone();
    if let Some(existing) = &provider.use_existing {
        let existing_dep = CompileDiDependencyMetadata {
            token: Some(existing.clone()),
            ..Default::default()
        };
        if let Some(resolved) = resolve(&existing_dep) {
            match resolved.token {
                Some(token) => transformed.use_existing = Some(token),
                None => {
                    transformed.use_existing = None;
                    transformed.use_value = resolved.value;
                }
            }
        }
    } else if let Some(factory) = &provider.use_factory {
        let deps = provider.deps.as_ref().unwrap_or(&factory.di_deps);
        transformed.deps = Some(deps.iter().map(|dep| resolve(dep).unwrap_or_else(|| dep.clone())).collect());
    } else if let Some(class) = &provider.use_class {
        let deps = provider.deps.as_ref().unwrap_or(&class.di_deps);
        transformed.deps = Some(deps.iter().map(|dep| resolve(dep).unwrap_or_else(|| dep.clone())).collect());
    }
    transformed
}

fn resolve_providers_from_directives(
    directives: &[&CompileDirectiveSummary],
    source_span: &ParseSourceSpan,
    errors: &mut Vec<ParseError>,
) -> IndexMap<TokenKey, ProviderAst> {
    let mut providers_by_token = IndexMap::new();
    for directive in directives {
        let dir_provider = CompileProviderMetadata::for_type(directive.type_.clone());
        let provider_type = if directive.is_component {
            ProviderAstType::Component
        } else {
            ProviderAstType::Directive
        };
        resolve_providers(&[dir_provider], provider_type, true, source_span, errors, &mut providers_by_token);
    }
    // directives may override the providers of the component
    let component_first = directives
        .iter()
        .filter(|d| d.is_component)
        .chain(directives.iter().filter(|d| !d.is_component));
    for directive in component_first {
        resolve_providers(
            &directive.providers,
            ProviderAstType::PublicService,
            false,
            source_span,
            errors,
            &mut providers_by_token,
        );
        resolve_providers(
            &directive.view_providers,
            ProviderAstType::PrivateService,
            false,
            source_span,
            errors,
            &mut providers_by_token,
        );
    }
    providers_by_token
}

fn resolve_providers(
    providers: &[CompileProviderMetadata],
    provider_type: ProviderAstType,
    eager: bool,
    source_span: &ParseSourceSpan,
    errors: &mut Vec<ParseError>,
    target_providers_by_token: &mut IndexMap<TokenKey, ProviderAst>,
) {
    for provider in providers {
        let key = provider.token.key();
        match target_providers_by_token.get_mut(&key) {
            Some(resolved) => {
                if resolved.multi_provider != provider.multi {
                    errors.push(ParseError::new(
                        source_span.clone(),
                        format!(
                            "Mixing multi and non multi provider is not possible for token {}",
                            resolved.token.token_name()
                        ),
                    ));
                }
                if !provider.multi {
                    resolved.providers.clear();
                }
                resolved.providers.push(provider.clone());
            }
            None => {
                let lifecycle_hooks = provider
                    .use_class
                    .as_ref()
                    .filter(|class| provider.token.identifier() == Some(&class.reference))
                    .map_or(LifecycleHooks::empty(), |class| class.lifecycle_hooks);
                let is_use_value = provider.use_class.is_none()
                    && provider.use_existing.is_none()
                    && provider.use_factory.is_none();
                target_providers_by_token.insert(
                    key,
                    ProviderAst {
                        token: provider.token.clone(),
                        multi_provider: provider.multi,
                        eager: eager || is_use_value,
                        providers: vec![provider.clone()],
                        provider_type,
                        lifecycle_hooks,
                        source_span: source_span.clone(),
                    },
                );
            }
        }
    }
}

/// Providers of an NgModule injector, in creation order.
pub struct NgModuleProviderAnalyzer {
    all_providers: IndexMap<TokenKey, ProviderAst>,
    transformed_providers: IndexMap<TokenKey, ProviderAst>,
    seen_providers: HashSet<TokenKey>,
    builtins: BuiltinTokens,
    errors: Vec<ParseError>,
}

impl NgModuleProviderAnalyzer {
    pub fn new(
        ng_module: &CompileNgModuleMetadata,
        extra_providers: &[CompileProviderMetadata],
        builtins: BuiltinTokens,
        source_span: &ParseSourceSpan,
    ) -> Self {
        let mut all_providers = IndexMap::new();
        let mut errors = Vec::new();
        for module_type in &ng_module.transitive_module.modules {
            let module_provider = CompileProviderMetadata::for_type(module_type.clone());
            resolve_providers(
                &[module_provider],
                ProviderAstType::PublicService,
                true,
                source_span,
                &mut errors,
                &mut all_providers,
            );
        }
        let providers: Vec<CompileProviderMetadata> = ng_module
            .transitive_module
            .providers
            .iter()
            .map(|entry| entry.provider.clone())
            .chain(extra_providers.iter().cloned())
            .collect();
        resolve_providers(
            &providers,
            ProviderAstType::PublicService,
            false,
            source_span,
            &mut errors,
            &mut all_providers,
        );
        NgModuleProviderAnalyzer {
            all_providers,
            transformed_providers: IndexMap::new(),
            seen_providers: HashSet::new(),
            builtins,
            errors,
        }
    }

    pub fn parse(mut self) -> Result<Vec<ProviderAst>> {
        let providers: Vec<(CompileTokenMetadata, bool)> = self
            .all_providers
            .values()
            .map(|p| (p.token.clone(), p.eager))
            .collect();
        for (token, eager) in providers {
            self.get_or_create_local_provider(&token, eager);
        }
        if !self.errors.is_empty() {
            let error_string = self
                .errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n");
            return Err(CompilerError::syntax(format!(
                "Provider parse errors:\n{}",
                error_string
            )));
        }
        Ok(self.transformed_providers.into_values().collect())
    }

    fn get_or_create_local_provider(&mut self, token: &CompileTokenMetadata, eager: bool) -> Option<ProviderAst> {
        let key = token.key();
        let resolved_provider = self.all_providers.get(&key)?.clone();
        if let Some(transformed) = self.transformed_providers.get(&key) {
            return Some(transformed.clone());
        }
        if !self.seen_providers.insert(key.clone()) {
            self.errors.push(ParseError::new(
                resolved_provider.source_span.clone(),
                format!("Cannot instantiate cyclic dependency! {}", token.token_name()),
            ));
            return None;
        }
        let span = resolved_provider.source_span.clone();
        let providers = resolved_provider
            .providers
            .iter()
            .map(|provider| transform_provider(provider, |dep| Some(self.get_dependency(dep, eager, &span))))
            .collect();
        let transformed = ProviderAst {
            eager,
            providers,
            ..resolved_provider
        };
        self.transformed_providers.insert(key, transformed.clone());
        Some(transformed)
    }

    fn get_dependency(
        &mut self,
        dep: &CompileDiDependencyMetadata,
        eager: bool,
        requestor_source_span: &ParseSourceSpan,
    ) -> CompileDiDependencyMetadata {
        let mut found_local = false;
        if !dep.is_skip_self {
            if let Some(token) = &dep.token {
                let key = token.key();
                found_local = key == self.builtins.injector
                    || key == self.builtins.component_factory_resolver
                    || self.get_or_create_local_provider(token, eager).is_some();
            }
        }
        if dep.is_self && !found_local {
            if dep.is_optional {
                return value_dependency(StaticValue::Null);
            }
            let name = dep.token.as_ref().map(|t| t.token_name()).unwrap_or_default();
            self.errors.push(ParseError::new(
                requestor_source_span.clone(),
                format!("No provider for {}", name),
            ));
        }
        dep.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aot::static_symbol::{StaticSymbol, StaticSymbolCache};
    use crate::compile_metadata::{CompileTypeMetadata, DirectiveMetadataInput, TransitiveCompileNgModuleMetadata};

    fn builtins(cache: &StaticSymbolCache) -> BuiltinTokens {
        let key = |name: &str| TokenKey::Symbol(cache.get("@angular/core", name, &[]));
        BuiltinTokens {
            renderer: key("Renderer"),
            element_ref: key("ElementRef"),
            change_detector_ref: key("ChangeDetectorRef"),
            template_ref: key("TemplateRef"),
            view_container_ref: key("ViewContainerRef"),
            injector: key("Injector"),
            component_factory_resolver: key("ComponentFactoryResolver"),
        }
    }

    fn dep_on(symbol: &StaticSymbol) -> CompileDiDependencyMetadata {
        CompileDiDependencyMetadata {
            token: Some(CompileTokenMetadata::from_symbol(symbol.clone())),
            ..Default::default()
        }
    }

    fn directive(cache: &StaticSymbolCache, name: &str, deps: Vec<CompileDiDependencyMetadata>, is_component: bool) -> DirectiveAst {
        let mut type_ = CompileTypeMetadata::new(cache.get("/app/dirs.ts", name, &[]));
        type_.di_deps = deps;
        let meta = CompileDirectiveMetadata::create(
            type_,
            DirectiveMetadataInput {
                is_component,
                selector: Some(format!("[{}]", name)),
                ..Default::default()
            },
        );
        DirectiveAst {
            directive: meta.to_summary(),
            inputs: vec![],
            host_properties: vec![],
            host_events: vec![],
            source_span: ParseSourceSpan::empty("TestComp"),
        }
    }

    fn view_context(cache: &StaticSymbolCache) -> Rc<ProviderViewContext> {
        let comp = CompileDirectiveMetadata::create(
            CompileTypeMetadata::new(cache.get("/app/comp.ts", "Comp", &[])),
            DirectiveMetadataInput {
                is_component: true,
                ..Default::default()
            },
        );
        Rc::new(ProviderViewContext::new(&comp, builtins(cache)))
    }

    #[test]
    fn should_order_directives_by_dependencies() {
        let cache = StaticSymbolCache::new();
        let b = cache.get("/app/dirs.ts", "B", &[]);
        let a = directive(&cache, "A", vec![dep_on(&b)], false);
        let b_dir = directive(&cache, "B", vec![], false);
        let view = view_context(&cache);
        let ctx = ProviderElementContext::new(
            view.clone(),
            None,
            true,
            vec![a, b_dir],
            &[],
            &[],
            ParseSourceSpan::empty("TestComp"),
        );
        ctx.borrow_mut().after_element();
        let names: Vec<String> = ctx
            .borrow()
            .transformed_directive_asts()
            .iter()
            .map(|d| d.directive.type_.name())
            .collect();
        assert_eq!(names, vec!["B", "A"]);
        assert!(view.errors.borrow().is_empty());
    }

    #[test]
    fn should_report_missing_and_cyclic_providers() {
        let cache = StaticSymbolCache::new();
        let a_sym = cache.get("/app/dirs.ts", "A", &[]);
        let b_sym = cache.get("/app/dirs.ts", "B", &[]);
        let a = directive(&cache, "A", vec![dep_on(&b_sym)], false);
        let b = directive(&cache, "B", vec![dep_on(&a_sym)], false);
        let view = view_context(&cache);
        ProviderElementContext::new(view.clone(), None, true, vec![a, b], &[], &[], ParseSourceSpan::empty("T"));
        let messages: Vec<String> = view.errors.borrow().iter().map(|e| e.msg.clone()).collect();
        assert!(messages.contains(&"Cannot instantiate cyclic dependency! A".to_string()));

        let mut host_dep = dep_on(&cache.get("/app/svc.ts", "Missing", &[]));
        host_dep.is_host = true;
        let c = directive(&cache, "C", vec![host_dep], false);
        let view = view_context(&cache);
        ProviderElementContext::new(view.clone(), None, true, vec![c], &[], &[], ParseSourceSpan::empty("T"));
        let messages: Vec<String> = view.errors.borrow().iter().map(|e| e.msg.clone()).collect();
        assert_eq!(messages, vec!["No provider for Missing"]);
    }

    #[test]
    fn should_resolve_dependencies_from_parent_elements() {
        let cache = StaticSymbolCache::new();
        let parent_sym = cache.get("/app/dirs.ts", "Parent", &[]);
        let view = view_context(&cache);
        let parent = ProviderElementContext::new(
            view.clone(),
            None,
            true,
            vec![directive(&cache, "Parent", vec![], false)],
            &[],
            &[],
            ParseSourceSpan::empty("T"),
        );
        let child = ProviderElementContext::new(
            view.clone(),
            Some(parent.clone()),
            false,
            vec![directive(&cache, "Child", vec![dep_on(&parent_sym)], false)],
            &[],
            &[],
            ParseSourceSpan::empty("T"),
        );
        child.borrow_mut().after_element();
        parent.borrow_mut().after_element();
        assert!(view.errors.borrow().is_empty());
        assert_eq!(child.borrow().transform_providers().len(), 1);
    }

    #[test]
    fn should_flag_view_container_requests() {
        let cache = StaticSymbolCache::new();
        let vcr = cache.get("@angular/core", "ViewContainerRef", &[]);
        let view = view_context(&cache);
        let ctx = ProviderElementContext::new(
            view,
            None,
            true,
            vec![directive(&cache, "If", vec![dep_on(&vcr)], false)],
            &[],
            &[],
            ParseSourceSpan::empty("T"),
        );
        assert!(ctx.borrow().transformed_has_view_container());
    }

    #[test]
    fn should_reject_mixed_multi_providers_in_modules() {
        let cache = StaticSymbolCache::new();
        let token = CompileTokenMetadata::from_value("tok");
        let single = CompileProviderMetadata::use_value(token.clone(), StaticValue::Number(1.0));
        let mut multi = single.clone();
        multi.multi = true;
        let module_type = CompileTypeMetadata::new(cache.get("/app/mod.ts", "AppModule", &[]));
        let mut transitive = TransitiveCompileNgModuleMetadata::new();
        transitive.add_module(module_type.clone());
        transitive.add_provider(single, &module_type.reference);
        transitive.add_provider(multi, &module_type.reference);
        let module = CompileNgModuleMetadata {
            type_: module_type,
            declared_directives: vec![],
            exported_directives: vec![],
            declared_pipes: vec![],
            exported_pipes: vec![],
            entry_components: vec![],
            bootstrap_components: vec![],
            providers: vec![],
            imported_modules: vec![],
            exported_modules: vec![],
            schemas: vec![],
            id: None,
            transitive_module: transitive,
        };
        let err = NgModuleProviderAnalyzer::new(&module, &[], builtins(&cache), &ParseSourceSpan::empty("AppModule"))
            .parse()
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("Mixing multi and non multi provider is not possible for token tok"));
    }
}
