//! Compile Metadata
//!
//! Normalized descriptors for types, tokens, providers, queries, templates,
//! directives, pipes and NgModules, plus the serializable summaries other
//! compilation units consume.

use crate::aot::static_symbol::StaticSymbol;
use crate::aot::static_value::StaticValue;
use crate::core::{ChangeDetectionStrategy, LifecycleHooks, SchemaMetadata, ViewEncapsulation};
use crate::selector::CssSelector;
use crate::util::{sanitize_identifier, split_at_colon};
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

static HOST_REG_EXP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:(?:\[([^\]]+)\])|(?:\(([^\)]+)\)))$").unwrap());

/// Name used for generated identifiers derived from `symbol`.
pub fn identifier_name(symbol: &StaticSymbol) -> String {
    sanitize_identifier(&symbol.display_name())
}

/// File that declares `symbol`; generated files are named after it.
pub fn identifier_module_url(symbol: &StaticSymbol) -> &str {
    symbol.file_path()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileTypeMetadata {
    pub reference: StaticSymbol,
    #[serde(default)]
    pub di_deps: Vec<CompileDiDependencyMetadata>,
    #[serde(default)]
    pub lifecycle_hooks: LifecycleHooks,
}

impl CompileTypeMetadata {
    pub fn new(reference: StaticSymbol) -> Self {
        CompileTypeMetadata {
            reference,
            di_deps: Vec::new(),
            lifecycle_hooks: LifecycleHooks::empty(),
        }
    }

    pub fn name(&self) -> String {
        identifier_name(&self.reference)
    }
}

/// A DI token: either a literal value (usually a string) or a type/identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompileTokenMetadata {
    Value(StaticValue),
    Identifier(StaticSymbol),
}

/// Hashable identity of a token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenKey {
    Symbol(StaticSymbol),
    Value(String),
}

impl CompileTokenMetadata {
    pub fn from_symbol(symbol: StaticSymbol) -> Self {
        CompileTokenMetadata::Identifier(symbol)
    }

    pub fn from_value(value: impl Into<StaticValue>) -> Self {
        CompileTokenMetadata::Value(value.into())
    }

    pub fn identifier(&self) -> Option<&StaticSymbol> {
        match self {
            CompileTokenMetadata::Identifier(symbol) => Some(symbol),
            CompileTokenMetadata::Value(_) => None,
        }
    }

    pub fn value(&self) -> Option<&StaticValue> {
        match self {
            CompileTokenMetadata::Value(value) => Some(value),
            CompileTokenMetadata::Identifier(_) => None,
        }
    }

    pub fn key(&self) -> TokenKey {
        match self {
            CompileTokenMetadata::Identifier(symbol) => TokenKey::Symbol(symbol.clone()),
            CompileTokenMetadata::Value(value) => TokenKey::Value(value.to_js_string()),
        }
    }

    pub fn token_name(&self) -> String {
        match self {
            CompileTokenMetadata::Identifier(symbol) => identifier_name(symbol),
            CompileTokenMetadata::Value(value) => value.to_js_string(),
        }
    }
}

impl From<StaticSymbol> for CompileTokenMetadata {
    fn from(symbol: StaticSymbol) -> Self {
        CompileTokenMetadata::Identifier(symbol)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileDiDependencyMetadata {
    pub is_attribute: bool,
    pub is_self: bool,
    pub is_host: bool,
    pub is_skip_self: bool,
    pub is_optional: bool,
    pub is_value: bool,
    pub token: Option<CompileTokenMetadata>,
    pub value: Option<StaticValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileFactoryMetadata {
    pub reference: StaticSymbol,
    #[serde(default)]
    pub di_deps: Vec<CompileDiDependencyMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileProviderMetadata {
    pub token: CompileTokenMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_class: Option<CompileTypeMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_value: Option<StaticValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_existing: Option<CompileTokenMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_factory: Option<CompileFactoryMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deps: Option<Vec<CompileDiDependencyMetadata>>,
    #[serde(default)]
    pub multi: bool,
}

impl CompileProviderMetadata {
    /// Provider of `ty` under its own type token.
    pub fn for_type(ty: CompileTypeMetadata) -> Self {
        CompileProviderMetadata {
            token: CompileTokenMetadata::from_symbol(ty.reference.clone()),
            use_class: Some(ty),
            use_value: None,
            use_existing: None,
            use_factory: None,
            deps: None,
            multi: false,
        }
    }

    pub fn use_value(token: CompileTokenMetadata, value: StaticValue) -> Self {
        CompileProviderMetadata {
            token,
            use_class: None,
            use_value: Some(value),
            use_existing: None,
            use_factory: None,
            deps: None,
            multi: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileQueryMetadata {
    pub selectors: Vec<CompileTokenMetadata>,
    pub descendants: bool,
    pub first: bool,
    pub property_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<CompileTokenMetadata>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileStylesheetMetadata {
    pub module_url: Option<String>,
    pub styles: Vec<String>,
    pub style_urls: Vec<String>,
}

/// One entry of a `style(...)` call: a property map or a bare token such as `*`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnimationStyleToken {
    Map(IndexMap<String, StaticValue>),
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileAnimationStyleMetadata {
    pub offset: Option<f64>,
    pub styles: Vec<AnimationStyleToken>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CompileAnimationMetadata {
    Style(CompileAnimationStyleMetadata),
    /// `timings` is the raw `"1s ease-in"` string or a millisecond number.
    Animate {
        timings: StaticValue,
        styles: Box<CompileAnimationMetadata>,
    },
    Keyframes { steps: Vec<CompileAnimationStyleMetadata> },
    Sequence { steps: Vec<CompileAnimationMetadata> },
    Group { steps: Vec<CompileAnimationMetadata> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CompileAnimationStateMetadata {
    #[serde(rename_all = "camelCase")]
    Declaration {
        state_name_expr: String,
        styles: CompileAnimationStyleMetadata,
    },
    #[serde(rename_all = "camelCase")]
    Transition {
        state_change_expr: String,
        steps: CompileAnimationMetadata,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileAnimationEntryMetadata {
    pub name: String,
    pub definitions: Vec<CompileAnimationStateMetadata>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileTemplateMetadata {
    pub encapsulation: Option<ViewEncapsulation>,
    pub template: Option<String>,
    pub template_url: Option<String>,
    pub styles: Vec<String>,
    pub style_urls: Vec<String>,
    pub external_stylesheets: Vec<CompileStylesheetMetadata>,
    pub animations: Vec<CompileAnimationEntryMetadata>,
    pub ng_content_selectors: Vec<String>,
    pub interpolation: Option<(String, String)>,
}

impl CompileTemplateMetadata {
    pub fn to_summary(&self) -> CompileTemplateSummary {
        CompileTemplateSummary {
            animations: self.animations.iter().map(|a| a.name.clone()).collect(),
            ng_content_selectors: self.ng_content_selectors.clone(),
            encapsulation: self.encapsulation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileTemplateSummary {
    pub animations: Vec<String>,
    pub ng_content_selectors: Vec<String>,
    pub encapsulation: Option<ViewEncapsulation>,
}

/// Reduced view of a directive used when compiling templates that use it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileDirectiveSummary {
    #[serde(rename = "type")]
    pub type_: CompileTypeMetadata,
    pub is_component: bool,
    pub selector: Option<String>,
    pub export_as: Option<String>,
    pub inputs: IndexMap<String, String>,
    pub outputs: IndexMap<String, String>,
    pub host_listeners: IndexMap<String, String>,
    pub host_properties: IndexMap<String, String>,
    pub host_attributes: IndexMap<String, String>,
    pub providers: Vec<CompileProviderMetadata>,
    pub view_providers: Vec<CompileProviderMetadata>,
    pub queries: Vec<CompileQueryMetadata>,
    pub entry_components: Vec<StaticSymbol>,
    pub change_detection: Option<ChangeDetectionStrategy>,
    pub template: Option<CompileTemplateSummary>,
}

/// Inputs of `CompileDirectiveMetadata::create`, before host and binding
/// declarations are split.
#[derive(Debug, Clone, Default)]
pub struct DirectiveMetadataInput {
    pub is_host: bool,
    pub is_component: bool,
    pub selector: Option<String>,
    pub export_as: Option<String>,
    pub change_detection: Option<ChangeDetectionStrategy>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub host: IndexMap<String, String>,
    pub providers: Vec<CompileProviderMetadata>,
    pub view_providers: Vec<CompileProviderMetadata>,
    pub queries: Vec<CompileQueryMetadata>,
    pub view_queries: Vec<CompileQueryMetadata>,
    pub entry_components: Vec<StaticSymbol>,
    pub template: Option<CompileTemplateMetadata>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompileDirectiveMetadata {
    pub is_host: bool,
    pub type_: CompileTypeMetadata,
    pub is_component: bool,
    pub selector: Option<String>,
    pub export_as: Option<String>,
    pub change_detection: Option<ChangeDetectionStrategy>,
    pub inputs: IndexMap<String, String>,
    pub outputs: IndexMap<String, String>,
    pub host_listeners: IndexMap<String, String>,
    pub host_properties: IndexMap<String, String>,
    pub host_attributes: IndexMap<String, String>,
    pub providers: Vec<CompileProviderMetadata>,
    pub view_providers: Vec<CompileProviderMetadata>,
    pub queries: Vec<CompileQueryMetadata>,
    pub view_queries: Vec<CompileQueryMetadata>,
    pub entry_components: Vec<StaticSymbol>,
    pub template: Option<CompileTemplateMetadata>,
}

fn binding_map(configs: &[String]) -> IndexMap<String, String> {
    let mut map = IndexMap::new();
    for config in configs {
        // `dirProp: elProp`; a bare name binds to itself.
        let (dir_prop, bound_prop) = split_at_colon(config, (config, config));
        map.insert(dir_prop, bound_prop);
    }
    map
}

impl CompileDirectiveMetadata {
    pub fn create(type_: CompileTypeMetadata, input: DirectiveMetadataInput) -> Self {
        let mut host_listeners = IndexMap::new();
        let mut host_properties = IndexMap::new();
        let mut host_attributes = IndexMap::new();
        for (key, value) in input.host {
            match HOST_REG_EXP.captures(&key) {
                None => {
                    host_attributes.insert(key, value);
                }
                Some(caps) => {
                    if let Some(property) = caps.get(1) {
                        host_properties.insert(property.as_str().to_string(), value);
                    } else if let Some(event) = caps.get(2) {
                        host_listeners.insert(event.as_str().to_string(), value);
                    }
                }
            }
        }
        CompileDirectiveMetadata {
            is_host: input.is_host,
            type_,
            is_component: input.is_component,
            selector: input.selector,
            export_as: input.export_as,
            change_detection: input.change_detection,
            inputs: binding_map(&input.inputs),
            outputs: binding_map(&input.outputs),
            host_listeners,
            host_properties,
            host_attributes,
            providers: input.providers,
            view_providers: input.view_providers,
            queries: input.queries,
            view_queries: input.view_queries,
            entry_components: input.entry_components,
            template: input.template,
        }
    }

    pub fn reference(&self) -> &StaticSymbol {
        &self.type_.reference
    }

    pub fn to_summary(&self) -> CompileDirectiveSummary {
        CompileDirectiveSummary {
            type_: self.type_.clone(),
            is_component: self.is_component,
            selector: self.selector.clone(),
            export_as: self.export_as.clone(),
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            host_listeners: self.host_listeners.clone(),
            host_properties: self.host_properties.clone(),
            host_attributes: self.host_attributes.clone(),
            providers: self.providers.clone(),
            view_providers: self.view_providers.clone(),
            queries: self.queries.clone(),
            entry_components: self.entry_components.clone(),
            change_detection: self.change_detection,
            template: self.template.as_ref().map(CompileTemplateMetadata::to_summary),
        }
    }
}

/// Metadata of the host view that instantiates `comp_meta` as a root component.
pub fn create_host_component_meta(
    host_type: StaticSymbol,
    comp_meta: &CompileDirectiveMetadata,
) -> CompileDirectiveMetadata {
    let selector = comp_meta.selector.as_deref().unwrap_or_default();
    let template = CssSelector::parse(selector)
        .ok()
        .and_then(|selectors| selectors.into_iter().next())
        .map(|s| s.get_matching_element_template())
        .unwrap_or_default();
    CompileDirectiveMetadata::create(
        CompileTypeMetadata::new(host_type),
        DirectiveMetadataInput {
            is_host: true,
            is_component: true,
            selector: Some("*".to_string()),
            template: Some(CompileTemplateMetadata {
                encapsulation: Some(ViewEncapsulation::None),
                template: Some(template),
                ..Default::default()
            }),
            ..Default::default()
        },
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilePipeSummary {
    #[serde(rename = "type")]
    pub type_: CompileTypeMetadata,
    pub name: String,
    pub pure: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompilePipeMetadata {
    pub type_: CompileTypeMetadata,
    pub name: String,
    pub pure: bool,
}

impl CompilePipeMetadata {
    pub fn to_summary(&self) -> CompilePipeSummary {
        CompilePipeSummary {
            type_: self.type_.clone(),
            name: self.name.clone(),
            pure: self.pure,
        }
    }
}

/// A provider together with the module that contributed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleProvider {
    pub provider: CompileProviderMetadata,
    pub module: StaticSymbol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileNgModuleSummary {
    #[serde(rename = "type")]
    pub type_: CompileTypeMetadata,
    pub entry_components: Vec<StaticSymbol>,
    pub providers: Vec<ModuleProvider>,
    pub modules: Vec<CompileTypeMetadata>,
    pub exported_directives: Vec<StaticSymbol>,
    pub exported_pipes: Vec<StaticSymbol>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompileNgModuleMetadata {
    pub type_: CompileTypeMetadata,
    pub declared_directives: Vec<StaticSymbol>,
    pub exported_directives: Vec<StaticSymbol>,
    pub declared_pipes: Vec<StaticSymbol>,
    pub exported_pipes: Vec<StaticSymbol>,
    pub entry_components: Vec<StaticSymbol>,
    pub bootstrap_components: Vec<StaticSymbol>,
    pub providers: Vec<CompileProviderMetadata>,
    pub imported_modules: Vec<CompileNgModuleSummary>,
    pub exported_modules: Vec<CompileNgModuleSummary>,
    pub schemas: Vec<SchemaMetadata>,
    pub id: Option<String>,
    pub transitive_module: TransitiveCompileNgModuleMetadata,
}

impl CompileNgModuleMetadata {
    pub fn reference(&self) -> &StaticSymbol {
        &self.type_.reference
    }

    pub fn to_summary(&self) -> CompileNgModuleSummary {
        let transitive = &self.transitive_module;
        CompileNgModuleSummary {
            type_: self.type_.clone(),
            entry_components: transitive.entry_components.iter().cloned().collect(),
            providers: transitive.providers.clone(),
            modules: transitive.modules.clone(),
            exported_directives: transitive.exported_directives.iter().cloned().collect(),
            exported_pipes: transitive.exported_pipes.iter().cloned().collect(),
        }
    }
}

/// Everything reachable from a module through its imports and exports,
/// deduplicated by reference.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransitiveCompileNgModuleMetadata {
    pub directives: IndexSet<StaticSymbol>,
    pub exported_directives: IndexSet<StaticSymbol>,
    pub pipes: IndexSet<StaticSymbol>,
    pub exported_pipes: IndexSet<StaticSymbol>,
    pub modules: Vec<CompileTypeMetadata>,
    pub entry_components: IndexSet<StaticSymbol>,
    pub providers: Vec<ModuleProvider>,
    module_set: HashSet<StaticSymbol>,
}

impl TransitiveCompileNgModuleMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_provider(&mut self, provider: CompileProviderMetadata, module: &StaticSymbol) {
        self.providers.push(ModuleProvider {
            provider,
            module: module.clone(),
        });
    }

    pub fn add_directive(&mut self, id: StaticSymbol) {
        self.directives.insert(id);
    }

    pub fn add_exported_directive(&mut self, id: StaticSymbol) {
        self.exported_directives.insert(id);
    }

    pub fn add_pipe(&mut self, id: StaticSymbol) {
        self.pipes.insert(id);
    }

    pub fn add_exported_pipe(&mut self, id: StaticSymbol) {
        self.exported_pipes.insert(id);
    }

    pub fn add_module(&mut self, id: CompileTypeMetadata) {
        if self.module_set.insert(id.reference.clone()) {
            self.modules.push(id);
        }
    }

    pub fn add_entry_component(&mut self, id: StaticSymbol) {
        self.entry_components.insert(id);
    }

    pub fn has_module(&self, reference: &StaticSymbol) -> bool {
        self.module_set.contains(reference)
    }
}

/// A serializable summary of any compiled type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "summaryKind")]
pub enum CompileTypeSummary {
    Directive(CompileDirectiveSummary),
    Pipe(CompilePipeSummary),
    NgModule(CompileNgModuleSummary),
}

impl CompileTypeSummary {
    pub fn reference(&self) -> &StaticSymbol {
        match self {
            CompileTypeSummary::Directive(d) => &d.type_.reference,
            CompileTypeSummary::Pipe(p) => &p.type_.reference,
            CompileTypeSummary::NgModule(m) => &m.type_.reference,
        }
    }
}

/// Flattens nested arrays of metadata values, dropping duplicates while
/// keeping first occurrences.
pub fn flatten_and_dedupe(values: &[StaticValue]) -> Vec<StaticValue> {
    let mut result: Vec<StaticValue> = Vec::new();
    fn walk(values: &[StaticValue], out: &mut Vec<StaticValue>) {
        for value in values {
            match value {
                StaticValue::Array(items) => walk(items, out),
                other => {
                    if !out.contains(other) {
                        out.push(other.clone());
                    }
                }
            }
        }
    }
    walk(values, &mut result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aot::static_symbol::StaticSymbolCache;

    fn comp_type(cache: &StaticSymbolCache, name: &str) -> CompileTypeMetadata {
        CompileTypeMetadata::new(cache.get("/app/comp.ts", name, &[]))
    }

    #[test]
    fn should_split_host_declarations() {
        let cache = StaticSymbolCache::new();
        let mut host = IndexMap::new();
        host.insert("[title]".to_string(), "t".to_string());
        host.insert("(click)".to_string(), "onClick()".to_string());
        host.insert("role".to_string(), "button".to_string());
        let meta = CompileDirectiveMetadata::create(
            comp_type(&cache, "Dir"),
            DirectiveMetadataInput {
                host,
                inputs: vec!["value".to_string(), "dirProp: elProp".to_string()],
                ..Default::default()
            },
        );
        assert_eq!(meta.host_properties["title"], "t");
        assert_eq!(meta.host_listeners["click"], "onClick()");
        assert_eq!(meta.host_attributes["role"], "button");
        assert_eq!(meta.inputs["value"], "value");
        assert_eq!(meta.inputs["dirProp"], "elProp");
    }

    #[test]
    fn should_create_host_meta_from_selector() {
        let cache = StaticSymbolCache::new();
        let comp = CompileDirectiveMetadata::create(
            comp_type(&cache, "Comp"),
            DirectiveMetadataInput {
                is_component: true,
                selector: Some("my-comp[title]".to_string()),
                ..Default::default()
            },
        );
        let host = create_host_component_meta(cache.get("/app/comp.ts", "Comp_Host", &[]), &comp);
        let template = host.template.unwrap();
        assert_eq!(template.template.as_deref(), Some("<my-comp title></my-comp>"));
        assert_eq!(template.encapsulation, Some(ViewEncapsulation::None));
        assert!(host.is_host);
    }

    #[test]
    fn should_dedupe_modules_and_directives() {
        let cache = StaticSymbolCache::new();
        let mut transitive = TransitiveCompileNgModuleMetadata::new();
        transitive.add_module(comp_type(&cache, "M"));
        transitive.add_module(comp_type(&cache, "M"));
        transitive.add_directive(cache.get("/app/comp.ts", "D", &[]));
        transitive.add_directive(cache.get("/app/comp.ts", "D", &[]));
        assert_eq!(transitive.modules.len(), 1);
        assert_eq!(transitive.directives.len(), 1);
    }

    #[test]
    fn should_tag_summaries_by_kind() {
        let cache = StaticSymbolCache::new();
        let summary = CompileTypeSummary::Pipe(CompilePipeSummary {
            type_: comp_type(&cache, "P"),
            name: "p".to_string(),
            pure: true,
        });
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["summaryKind"], "Pipe");
        assert_eq!(json["type"]["reference"]["name"], "P");
        let read: CompileTypeSummary = serde_json::from_value(json).unwrap();
        assert_eq!(read, summary);
    }

    #[test]
    fn token_keys_distinguish_values_and_identifiers() {
        let cache = StaticSymbolCache::new();
        let a = CompileTokenMetadata::from_symbol(cache.get("/a.ts", "A", &[]));
        let b = CompileTokenMetadata::from_value("A");
        assert_ne!(a.key(), b.key());
        assert_eq!(a.token_name(), "A");
        assert_eq!(b.token_name(), "A");
    }
}
