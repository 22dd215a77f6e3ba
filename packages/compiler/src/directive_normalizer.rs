//! Directive Normalizer
//!
//! Loads component templates and stylesheets and turns the raw `@Component`
//! template fields into a `CompileTemplateMetadata`: urls resolved, inline
//! `<style>`/`<link>` collected, `@import`s followed and `<ng-content>`
//! selectors recorded.

use crate::aot::static_symbol::StaticSymbol;
use crate::compile_metadata::{
    CompileAnimationEntryMetadata, CompileStylesheetMetadata, CompileTemplateMetadata,
};
use crate::config::CompilerConfig;
use crate::core::ViewEncapsulation;
use crate::error::{CompilerError, Result};
use crate::ml_parser::ast::Node;
use crate::ml_parser::{HtmlParser, InterpolationConfig};
use crate::resource_loader::ResourceLoader;
use crate::style_url_resolver::{extract_style_urls, is_style_url_resolvable};
use crate::template_parser::{preparse_element, PreparsedElementType};
use crate::url_resolver::resolve_url;
use crate::util::SyncAsync;
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Template fields exactly as written on the component.
#[derive(Debug, Clone)]
pub struct PrenormalizedTemplateMetadata {
    pub ng_module_type: Option<StaticSymbol>,
    pub component_type: StaticSymbol,
    pub module_url: String,
    pub template: Option<String>,
    pub template_url: Option<String>,
    pub styles: Vec<String>,
    pub style_urls: Vec<String>,
    pub interpolation: Option<(String, String)>,
    pub encapsulation: Option<ViewEncapsulation>,
    pub animations: Vec<CompileAnimationEntryMetadata>,
}

type SharedFetch = Shared<LocalBoxFuture<'static, Result<String>>>;

struct NormalizerState {
    resource_loader: Rc<dyn ResourceLoader>,
    html_parser: HtmlParser,
    config: CompilerConfig,
    resource_cache: RefCell<HashMap<String, SharedFetch>>,
}

#[derive(Clone)]
pub struct DirectiveNormalizer {
    state: Rc<NormalizerState>,
}

impl DirectiveNormalizer {
    pub fn new(resource_loader: Rc<dyn ResourceLoader>, config: CompilerConfig) -> Self {
        DirectiveNormalizer {
            state: Rc::new(NormalizerState {
                resource_loader,
                html_parser: HtmlParser::new(),
                config,
                resource_cache: RefCell::new(HashMap::new()),
            }),
        }
    }

    pub fn clear_cache(&self) {
        self.state.resource_cache.borrow_mut().clear();
    }

    /// Forgets the loaded template and stylesheets of one component.
    pub fn clear_cache_for(&self, template: &CompileTemplateMetadata) {
        let mut cache = self.state.resource_cache.borrow_mut();
        if let Some(url) = &template.template_url {
            cache.remove(url);
        }
        for stylesheet in &template.external_stylesheets {
            if let Some(url) = &stylesheet.module_url {
                cache.remove(url);
            }
        }
    }

    /// Normalizes a component template. The result is synchronous when the
    /// template is inline and nothing needs to be fetched.
    pub fn normalize_template(
        &self,
        prenorm: PrenormalizedTemplateMetadata,
    ) -> Result<SyncAsync<CompileTemplateMetadata>> {
        let normalized_sync = match (&prenorm.template, &prenorm.template_url) {
            (Some(_), Some(_)) => {
                return Err(CompilerError::syntax(format!(
                    "'{}' component cannot define both template and templateUrl",
                    prenorm.component_type
                )))
            }
            (Some(template), None) => Some(self.state.normalize_loaded_template(
                &prenorm,
                template,
                &prenorm.module_url,
            )?),
            (None, Some(_)) => None,
            (None, None) => {
                return Err(CompilerError::syntax(format!(
                    "No template specified for component {}",
                    prenorm.component_type
                )))
            }
        };

        match normalized_sync {
            Some(template) if template.style_urls.is_empty() => Ok(SyncAsync::ready(template)),
            Some(template) => {
                let state = self.state.clone();
                Ok(SyncAsync::pending(
                    async move { state.normalize_external_stylesheets(template).await }.boxed_local(),
                ))
            }
            None => {
                let state = self.state.clone();
                Ok(SyncAsync::pending(
                    async move {
                        let template = state.normalize_template_async(prenorm).await?;
                        state.normalize_external_stylesheets(template).await
                    }
                    .boxed_local(),
                ))
            }
        }
    }

    /// Resolves style urls and pulls `@import`s out of the styles.
    pub fn normalize_stylesheet(&self, stylesheet: CompileStylesheetMetadata) -> CompileStylesheetMetadata {
        normalize_stylesheet(stylesheet)
    }
}

impl NormalizerState {
    fn fetch(&self, url: &str) -> SharedFetch {
        self.resource_cache
            .borrow_mut()
            .entry(url.to_string())
            .or_insert_with(|| self.resource_loader.get(url).shared())
            .clone()
    }

    async fn normalize_template_async(
        &self,
        prenorm: PrenormalizedTemplateMetadata,
    ) -> Result<CompileTemplateMetadata> {
        let template_url = resolve_url(
            Some(&prenorm.module_url),
            prenorm.template_url.as_deref().unwrap_or_default(),
        );
        let template = self.fetch(&template_url).await?;
        self.normalize_loaded_template(&prenorm, &template, &template_url)
    }

    fn normalize_loaded_template(
        &self,
        prenorm: &PrenormalizedTemplateMetadata,
        template: &str,
        template_abs_url: &str,
    ) -> Result<CompileTemplateMetadata> {
        let interpolation_config = InterpolationConfig::from_markers(prenorm.interpolation.as_ref());
        let component_name = prenorm.component_type.to_string();
        let parsed = self
            .html_parser
            .parse(template, &component_name, false, &interpolation_config);
        if !parsed.errors.is_empty() {
            return Err(CompilerError::TemplateParse {
                errors: parsed.errors,
            });
        }

        let template_metadata_styles = normalize_stylesheet(CompileStylesheetMetadata {
            module_url: Some(prenorm.module_url.clone()),
            styles: prenorm.styles.clone(),
            style_urls: prenorm.style_urls.clone(),
        });

        let mut visitor = TemplatePreparseVisitor::default();
        visitor.visit_all(&parsed.root_nodes);
        let template_styles = normalize_stylesheet(CompileStylesheetMetadata {
            module_url: Some(template_abs_url.to_string()),
            styles: visitor.styles,
            style_urls: visitor.style_urls,
        });

        let mut styles = template_metadata_styles.styles;
        styles.extend(template_styles.styles);
        let mut style_urls = template_metadata_styles.style_urls;
        style_urls.extend(template_styles.style_urls);

        let mut encapsulation = prenorm
            .encapsulation
            .unwrap_or(self.config.default_encapsulation);
        if encapsulation == ViewEncapsulation::Emulated && styles.is_empty() && style_urls.is_empty() {
            encapsulation = ViewEncapsulation::None;
        }

        Ok(CompileTemplateMetadata {
            encapsulation: Some(encapsulation),
            template: Some(template.to_string()),
            template_url: Some(template_abs_url.to_string()),
            styles,
            style_urls,
            external_stylesheets: Vec::new(),
            animations: prenorm.animations.clone(),
            ng_content_selectors: visitor.ng_content_selectors,
            interpolation: prenorm.interpolation.clone(),
        })
    }

    async fn normalize_external_stylesheets(
        &self,
        template: CompileTemplateMetadata,
    ) -> Result<CompileTemplateMetadata> {
        let external_stylesheets = self
            .load_missing_external_stylesheets(&template.style_urls)
            .await?;
        Ok(CompileTemplateMetadata {
            external_stylesheets,
            ..template
        })
    }

    /// Loads `style_urls` and everything they import, breadth first, each
    /// url once.
    async fn load_missing_external_stylesheets(
        &self,
        style_urls: &[String],
    ) -> Result<Vec<CompileStylesheetMetadata>> {
        let mut loaded: IndexMap<String, CompileStylesheetMetadata> = IndexMap::new();
        let mut pending: Vec<String> = style_urls.to_vec();
        while !pending.is_empty() {
            let mut next = Vec::new();
            for style_url in pending {
                if loaded.contains_key(&style_url) {
                    continue;
                }
                let loaded_style = self.fetch(&style_url).await?;
                let stylesheet = normalize_stylesheet(CompileStylesheetMetadata {
                    module_url: Some(style_url.clone()),
                    styles: vec![loaded_style],
                    style_urls: Vec::new(),
                });
                next.extend(stylesheet.style_urls.iter().cloned());
                loaded.insert(style_url, stylesheet);
            }
            pending = next;
        }
        Ok(loaded.into_values().collect())
    }
}

fn normalize_stylesheet(stylesheet: CompileStylesheetMetadata) -> CompileStylesheetMetadata {
    let module_url = stylesheet.module_url.as_deref();
    let mut all_style_urls: Vec<String> = stylesheet
        .style_urls
        .iter()
        .filter(|url| is_style_url_resolvable(Some(url.as_str())))
        .map(|url| resolve_url(module_url, url))
        .collect();
    let all_styles = stylesheet
        .styles
        .iter()
        .map(|style| {
            let with_imports = extract_style_urls(module_url, style);
            all_style_urls.extend(with_imports.style_urls);
            with_imports.style
        })
        .collect();
    CompileStylesheetMetadata {
        module_url: stylesheet.module_url.clone(),
        styles: all_styles,
        style_urls: all_style_urls,
    }
}

#[derive(Default)]
struct TemplatePreparseVisitor {
    ng_content_selectors: Vec<String>,
    styles: Vec<String>,
    style_urls: Vec<String>,
    ng_non_bindable_stack_count: usize,
}

impl TemplatePreparseVisitor {
    fn visit_all(&mut self, nodes: &[Node]) {
        for node in nodes {
            match node {
                Node::Element(element) => {
                    let preparsed = preparse_element(element);
                    match preparsed.element_type {
                        PreparsedElementType::NgContent => {
                            if self.ng_non_bindable_stack_count == 0 {
                                self.ng_content_selectors.push(preparsed.select_attr.clone());
                            }
                        }
                        PreparsedElementType::Style => {
                            let text_content: String = element
                                .children
                                .iter()
                                .filter_map(|child| match child {
                                    Node::Text(text) => Some(text.value.as_str()),
                                    _ => None,
                                })
                                .collect();
                            self.styles.push(text_content);
                        }
                        PreparsedElementType::Stylesheet => {
                            if let Some(href) = &preparsed.href_attr {
                                self.style_urls.push(href.clone());
                            }
                        }
                        _ => {}
                    }
                    if preparsed.non_bindable {
                        self.ng_non_bindable_stack_count += 1;
                    }
                    self.visit_all(&element.children);
                    if preparsed.non_bindable {
                        self.ng_non_bindable_stack_count -= 1;
                    }
                }
                Node::Expansion(expansion) => {
                    for case in &expansion.cases {
                        self.visit_all(&case.expression);
                    }
                }
                Node::ExpansionCase(case) => self.visit_all(&case.expression),
                _ => {}
            }
        }
    }
}
