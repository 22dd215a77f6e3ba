//! Template Parser
//!
//! Parses a component template into `TemplateAst`s: matches directives
//! against every element, splits attribute bindings between element
//! properties and directive inputs, desugars `*directive` attributes into
//! embedded templates and computes content projection slots.

use super::binding_parser::{BindingParser, BoundProperty};
use super::template_ast::{
    AttrAst, BoundDirectivePropertyAst, BoundElementPropertyAst, BoundEventAst, BoundTextAst,
    DirectiveAst, ElementAst, EmbeddedTemplateAst, NgContentAst, PropertyBindingType, ReferenceAst,
    TemplateAst, TextAst, VariableAst,
};
use super::template_preparser::{preparse_element, PreparsedElementType};
use crate::aot::static_symbol::StaticSymbol;
use crate::compile_metadata::{
    identifier_name, CompileDirectiveMetadata, CompileDirectiveSummary, CompilePipeSummary,
    CompileTokenMetadata,
};
use crate::compile_reflector::CompileReflector;
use crate::config::CompilerConfig;
use crate::core::SchemaMetadata;
use crate::error::{CompilerError, Result};
use crate::expression_parser::{Lexer, Parser};
use crate::identifiers::{identifier_token, Identifiers};
use crate::ml_parser::ast::{Attribute, Element, Node, Text};
use crate::ml_parser::html_whitespaces::remove_whitespaces;
use crate::ml_parser::icu_ast_expander::expand_nodes;
use crate::ml_parser::tags::split_ns_name;
use crate::ml_parser::{HtmlParser, InterpolationConfig, ParseTreeResult};
use crate::parse_util::{ParseError, ParseSourceSpan};
use crate::provider_analyzer::{
    BuiltinTokens, ProviderElementContext, ProviderElementContextRef, ProviderViewContext,
};
use crate::schema::ElementSchemaRegistry;
use crate::selector::{CssSelector, SelectorMatcher};
use crate::style_url_resolver::is_style_url_resolvable;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

// 1: "bind-", 2: "let-", 3: "ref-"/"#", 4: "on-", 5: "bindon-", 6: "@",
// 7: identifier after a keyword, 8: inside [()], 9: inside [], 10: inside ()
static BIND_NAME_REGEXP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?:(?:(bind-)|(let-)|(ref-|#)|(on-)|(bindon-)|(@))(.+))|\[\(([^\)]+)\)\]|\[([^\]]+)\]|\(([^\)]+)\))$",
    )
    .unwrap()
});

const KW_BIND_IDX: usize = 1;
const KW_LET_IDX: usize = 2;
const KW_REF_IDX: usize = 3;
const KW_ON_IDX: usize = 4;
const KW_BINDON_IDX: usize = 5;
const KW_AT_IDX: usize = 6;
const IDENT_KW_IDX: usize = 7;
const IDENT_BANANA_BOX_IDX: usize = 8;
const IDENT_PROPERTY_IDX: usize = 9;
const IDENT_EVENT_IDX: usize = 10;

const TEMPLATE_ELEMENT: &str = "template";
const TEMPLATE_ATTR: &str = "template";
const TEMPLATE_ATTR_PREFIX: &str = "*";

static DATA_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^data-").unwrap());
static XHTML_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^:xhtml:").unwrap());

#[derive(Debug, Clone, Default)]
pub struct TemplateParseResult {
    pub template_ast: Vec<TemplateAst>,
    pub errors: Vec<ParseError>,
}

pub struct TemplateParser {
    config: CompilerConfig,
    expr_parser: Parser,
    html_parser: HtmlParser,
    reflector: Rc<dyn CompileReflector>,
    schema_registry: Rc<dyn ElementSchemaRegistry>,
}

impl TemplateParser {
    pub fn new(
        config: CompilerConfig,
        reflector: Rc<dyn CompileReflector>,
        schema_registry: Rc<dyn ElementSchemaRegistry>,
    ) -> Self {
        TemplateParser {
            config,
            expr_parser: Parser::new(Lexer::new()),
            html_parser: HtmlParser::new(),
            reflector,
            schema_registry,
        }
    }

    pub fn schema_registry(&self) -> &Rc<dyn ElementSchemaRegistry> {
        &self.schema_registry
    }

    /// Parses `template`, logging warnings and failing on any fatal error.
    pub fn parse(
        &self,
        component: &CompileDirectiveMetadata,
        template: &str,
        directives: &[CompileDirectiveSummary],
        pipes: &[CompilePipeSummary],
        schemas: &[SchemaMetadata],
        template_url: &str,
    ) -> Result<Vec<TemplateAst>> {
        let result = self.try_parse(component, template, directives, pipes, schemas, template_url)?;
        let (errors, warnings): (Vec<ParseError>, Vec<ParseError>) =
            result.errors.into_iter().partition(ParseError::is_fatal);
        if !warnings.is_empty() {
            let warning_string = warnings
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n");
            tracing::warn!("Template parse warnings:\n{}", warning_string);
        }
        if !errors.is_empty() {
            return Err(CompilerError::TemplateParse { errors });
        }
        Ok(result.template_ast)
    }

    pub fn try_parse(
        &self,
        component: &CompileDirectiveMetadata,
        template: &str,
        directives: &[CompileDirectiveSummary],
        pipes: &[CompilePipeSummary],
        schemas: &[SchemaMetadata],
        template_url: &str,
    ) -> Result<TemplateParseResult> {
        let interpolation_config = interpolation_config_of(component);
        let mut html_ast = self
            .html_parser
            .parse(template, template_url, true, &interpolation_config);
        if !self.config.preserve_whitespaces {
            html_ast = remove_whitespaces(html_ast);
        }
        self.try_parse_html(self.expand_html(html_ast, false), component, directives, pipes, schemas)
    }

    pub fn try_parse_html(
        &self,
        html_ast_with_errors: ParseTreeResult,
        component: &CompileDirectiveMetadata,
        directives: &[CompileDirectiveSummary],
        pipes: &[CompilePipeSummary],
        schemas: &[SchemaMetadata],
    ) -> Result<TemplateParseResult> {
        let mut errors = html_ast_with_errors.errors;
        let root_nodes = html_ast_with_errors.root_nodes;
        let mut result = Vec::new();
        if !root_nodes.is_empty() {
            let uniq_directives = remove_summary_duplicates(directives, |d| &d.type_.reference);
            let uniq_pipes = remove_summary_duplicates(pipes, |p| &p.type_.reference);
            let builtins = BuiltinTokens::resolve(self.reflector.as_ref())?;
            let provider_view_context = Rc::new(ProviderViewContext::new(component, builtins));
            let binding_parser = BindingParser::new(
                &self.expr_parser,
                interpolation_config_of(component),
                self.schema_registry.as_ref(),
                &uniq_pipes,
            );
            let mut visitor = TemplateParseVisitor {
                selector_matcher: SelectorMatcher::new(),
                directives: uniq_directives,
                ng_content_count: 0,
                provider_view_context: provider_view_context.clone(),
                binding_parser,
                schema_registry: self.schema_registry.as_ref(),
                schemas,
                template_ref_token: identifier_token(self.reflector.as_ref(), &Identifiers::TemplateRef)?,
                component_animations: component
                    .template
                    .as_ref()
                    .map(|t| t.to_summary().animations)
                    .unwrap_or_default(),
                errors: Vec::new(),
            };
            visitor.register_directives()?;
            result = visitor.visit_all(&root_nodes, &ElementContext::empty());
            errors.append(&mut visitor.binding_parser.errors);
            errors.append(&mut visitor.errors);
            errors.extend(provider_view_context.errors.borrow_mut().drain(..));
        }
        assert_no_reference_duplication_on_template(&result, &mut errors);
        Ok(TemplateParseResult {
            template_ast: result,
            errors,
        })
    }

    /// Expands ICU messages into directives; skipped when the template
    /// already has errors unless `forced`.
    pub fn expand_html(&self, html_ast_with_errors: ParseTreeResult, forced: bool) -> ParseTreeResult {
        let mut errors = html_ast_with_errors.errors;
        if !errors.is_empty() && !forced {
            return ParseTreeResult {
                root_nodes: html_ast_with_errors.root_nodes,
                errors,
            };
        }
        let expanded = expand_nodes(html_ast_with_errors.root_nodes);
        errors.extend(expanded.errors);
        ParseTreeResult {
            root_nodes: expanded.nodes,
            errors,
        }
    }
}

fn interpolation_config_of(component: &CompileDirectiveMetadata) -> InterpolationConfig {
    InterpolationConfig::from_markers(
        component
            .template
            .as_ref()
            .and_then(|template| template.interpolation.as_ref()),
    )
}

/// Keeps the first summary per type.
fn remove_summary_duplicates<T: Clone>(
    items: &[T],
    reference: impl Fn(&T) -> &StaticSymbol,
) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(reference(item).clone()))
        .cloned()
        .collect()
}

fn assert_no_reference_duplication_on_template(result: &[TemplateAst], errors: &mut Vec<ParseError>) {
    let mut existing_references: Vec<&str> = Vec::new();
    for ast in result {
        let references = match ast {
            TemplateAst::Element(el) => &el.references,
            TemplateAst::EmbeddedTemplate(tpl) => &tpl.references,
            _ => continue,
        };
        for reference in references {
            if existing_references.contains(&reference.name.as_str()) {
                errors.push(ParseError::new(
                    reference.source_span.clone(),
                    format!("Reference \"#{}\" is defined several times", reference.name),
                ));
            } else {
                existing_references.push(&reference.name);
            }
        }
    }
}

/// `#name="exportAs"` before it is known which directive it points at.
struct ElementOrDirectiveRef {
    name: String,
    value: String,
    source_span: ParseSourceSpan,
}

/// Projection slots offered by the component on the parent element.
struct ElementContext {
    is_template_element: bool,
    ng_content_index_matcher: SelectorMatcher<usize>,
    wildcard_ng_content_index: Option<usize>,
    provider_context: Option<ProviderElementContextRef>,
}

impl ElementContext {
    fn empty() -> Self {
        ElementContext {
            is_template_element: true,
            ng_content_index_matcher: SelectorMatcher::new(),
            wildcard_ng_content_index: None,
            provider_context: None,
        }
    }

    fn create(
        is_template_element: bool,
        directives: &[DirectiveAst],
        provider_context: Option<ProviderElementContextRef>,
    ) -> Self {
        let mut matcher = SelectorMatcher::new();
        let mut wildcard_ng_content_index = None;
        let component = directives.iter().find(|d| d.directive.is_component);
        if let Some(template) = component.and_then(|c| c.directive.template.as_ref()) {
            for (index, selector) in template.ng_content_selectors.iter().enumerate() {
                if selector == "*" {
                    wildcard_ng_content_index = Some(index);
                } else {
                    matcher.add_selectables(&CssSelector::parse(selector).unwrap_or_default(), index);
                }
            }
        }
        ElementContext {
            is_template_element,
            ng_content_index_matcher: matcher,
            wildcard_ng_content_index,
            provider_context,
        }
    }

    fn find_ng_content_index(&self, selector: &CssSelector) -> Option<usize> {
        let mut indices = Vec::new();
        self.ng_content_index_matcher
            .match_selector(selector, |_, index| indices.push(*index));
        indices.sort_unstable();
        indices.extend(self.wildcard_ng_content_index);
        indices.first().copied()
    }
}

fn text_css_selector() -> CssSelector {
    let mut selector = CssSelector::new();
    selector.set_element("*");
    selector
}

fn normalize_attribute_name(attr_name: &str) -> String {
    DATA_PREFIX.replace(attr_name, "").into_owned()
}

fn is_empty_text_node(node: &Node) -> bool {
    matches!(node, Node::Text(text) if text.value.trim().is_empty())
}

struct TemplateParseVisitor<'a> {
    selector_matcher: SelectorMatcher<usize>,
    directives: Vec<CompileDirectiveSummary>,
    ng_content_count: usize,
    provider_view_context: Rc<ProviderViewContext>,
    binding_parser: BindingParser<'a>,
    schema_registry: &'a dyn ElementSchemaRegistry,
    schemas: &'a [SchemaMetadata],
    template_ref_token: CompileTokenMetadata,
    component_animations: Vec<String>,
    errors: Vec<ParseError>,
}

impl<'a> TemplateParseVisitor<'a> {
    fn register_directives(&mut self) -> Result<()> {
        for (index, directive) in self.directives.iter().enumerate() {
            if let Some(selector) = &directive.selector {
                let selectors = CssSelector::parse(selector)?;
                self.selector_matcher.add_selectables(&selectors, index);
            }
        }
        Ok(())
    }

    fn visit_all(&mut self, nodes: &[Node], parent: &ElementContext) -> Vec<TemplateAst> {
        nodes
            .iter()
            .filter_map(|node| match node {
                Node::Element(element) => self.visit_element(element, parent),
                Node::Text(text) => Some(self.visit_text(text, parent)),
                Node::Attribute(attr) => Some(TemplateAst::Attr(visit_attribute(attr))),
                Node::Comment(_) | Node::Expansion(_) | Node::ExpansionCase(_) => None,
            })
            .collect()
    }

    fn visit_text(&mut self, text: &Text, parent: &ElementContext) -> TemplateAst {
        let ng_content_index = parent.find_ng_content_index(&text_css_selector());
        match self.binding_parser.parse_interpolation(&text.value, &text.source_span) {
            Some(expr) => TemplateAst::BoundText(BoundTextAst {
                value: expr,
                ng_content_index,
                source_span: text.source_span.clone(),
            }),
            None => TemplateAst::Text(TextAst {
                value: text.value.clone(),
                ng_content_index,
                source_span: text.source_span.clone(),
            }),
        }
    }

    fn visit_element(&mut self, element: &Element, parent: &ElementContext) -> Option<TemplateAst> {
        let node_name = &element.name;
        let preparsed = preparse_element(element);
        match preparsed.element_type {
            // <script> is never compiled; <style> was handled by the style compiler
            PreparsedElementType::Script | PreparsedElementType::Style => return None,
            PreparsedElementType::Stylesheet
                if is_style_url_resolvable(preparsed.href_attr.as_deref()) =>
            {
                return None
            }
            _ => {}
        }

        let mut matchable_attrs = Vec::new();
        let mut element_or_directive_props = Vec::new();
        let mut element_or_directive_refs = Vec::new();
        let mut element_vars = Vec::new();
        let mut events = Vec::new();
        let mut template_element_or_directive_props = Vec::new();
        let mut template_matchable_attrs = Vec::new();
        let mut template_element_vars = Vec::new();
        let mut has_inline_templates = false;
        let mut attrs = Vec::new();
        let lc_el_name = split_ns_name(&node_name.to_lowercase()).1;
        let is_template_element = lc_el_name == TEMPLATE_ELEMENT;

        for attr in &element.attrs {
            let has_binding = self.parse_attr(
                is_template_element,
                attr,
                &mut matchable_attrs,
                &mut element_or_directive_props,
                &mut events,
                &mut element_or_directive_refs,
                &mut element_vars,
            );
            let normalized_name = normalize_attribute_name(&attr.name);
            let template_binding = if normalized_name == TEMPLATE_ATTR {
                Some(None)
            } else {
                normalized_name
                    .strip_prefix(TEMPLATE_ATTR_PREFIX)
                    .map(|prefix| Some(prefix.to_string()))
            };
            let has_template_binding = template_binding.is_some();
            if let Some(prefix_token) = template_binding {
                if has_inline_templates {
                    self.report_error(
                        "Can't have multiple template bindings on one element. Use only one attribute named 'template' or prefixed with *",
                        &attr.source_span,
                    );
                }
                has_inline_templates = true;
                self.binding_parser.parse_inline_template_binding(
                    prefix_token.as_deref(),
                    &attr.value,
                    &attr.source_span,
                    &mut template_matchable_attrs,
                    &mut template_element_or_directive_props,
                    &mut template_element_vars,
                );
            }
            if !has_binding && !has_template_binding {
                // bound attributes don't also appear as plain attributes
                attrs.push(visit_attribute(attr));
                matchable_attrs.push((attr.name.clone(), attr.value.clone()));
            }
        }

        let element_css_selector = CssSelector::create_element_css_selector(node_name, &matchable_attrs);
        let (directive_metas, match_element) = self.parse_directives(&element_css_selector);
        let mut references = Vec::new();
        let directive_asts = self.create_directive_asts(
            is_template_element,
            node_name,
            &directive_metas,
            &element_or_directive_props,
            &element_or_directive_refs,
            &element.source_span,
            &mut references,
        );
        let element_props =
            self.create_element_property_asts(node_name, &element_or_directive_props, &directive_asts);
        let is_view_root = parent.is_template_element || has_inline_templates;
        let provider_context = ProviderElementContext::new(
            self.provider_view_context.clone(),
            parent.provider_context.clone(),
            is_view_root,
            directive_asts.clone(),
            &attrs,
            &references,
            element.source_span.clone(),
        );
        let children_context = ElementContext::create(
            is_template_element,
            &directive_asts,
            if is_template_element {
                parent.provider_context.clone()
            } else {
                Some(provider_context.clone())
            },
        );
        let children = if preparsed.non_bindable {
            visit_all_non_bindable(&element.children, &children_context)
        } else {
            self.visit_all(&element.children, &children_context)
        };
        provider_context.borrow_mut().after_element();

        // `ngProjectAs` overrides the selector used for content projection
        let projection_selector = preparsed
            .project_as
            .as_deref()
            .and_then(|project_as| CssSelector::parse(project_as).ok())
            .and_then(|selectors| selectors.into_iter().next())
            .unwrap_or_else(|| element_css_selector.clone());
        let ng_content_index = parent.find_ng_content_index(&projection_selector);
        let own_ng_content_index = if has_inline_templates { None } else { ng_content_index };

        let provider_context = provider_context.borrow();
        let mut parsed_element = if preparsed.element_type == PreparsedElementType::NgContent {
            if !element.children.iter().all(is_empty_text_node) {
                self.report_error("<ng-content> element cannot have content.", &element.source_span);
            }
            let index = self.ng_content_count;
            self.ng_content_count += 1;
            TemplateAst::NgContent(NgContentAst {
                index,
                ng_content_index: own_ng_content_index,
                source_span: element.source_span.clone(),
            })
        } else if is_template_element {
            self.assert_all_events_published_by_directives(&directive_asts, &events);
            self.assert_no_components_nor_element_bindings_on_template(
                &directive_asts,
                &element_props,
                &element.source_span,
            );
            TemplateAst::EmbeddedTemplate(EmbeddedTemplateAst {
                attrs,
                outputs: events,
                references,
                variables: element_vars,
                directives: provider_context.transformed_directive_asts(),
                providers: provider_context.transform_providers(),
                has_view_container: provider_context.transformed_has_view_container(),
                children,
                ng_content_index: own_ng_content_index,
                source_span: element.source_span.clone(),
            })
        } else {
            self.assert_element_exists(match_element, element);
            self.assert_only_one_component(&directive_asts, &element.source_span);
            for component in directive_asts.iter().filter(|d| d.directive.is_component) {
                let animations = component
                    .directive
                    .template
                    .as_ref()
                    .map(|t| t.animations.clone())
                    .unwrap_or_default();
                self.validate_element_animation_input_outputs(
                    &component.host_properties,
                    &component.host_events,
                    &animations,
                );
            }
            let component_animations = self.component_animations.clone();
            self.validate_element_animation_input_outputs(&element_props, &events, &component_animations);
            TemplateAst::Element(ElementAst {
                name: node_name.clone(),
                attrs,
                inputs: element_props,
                outputs: events,
                references,
                directives: provider_context.transformed_directive_asts(),
                providers: provider_context.transform_providers(),
                has_view_container: provider_context.transformed_has_view_container(),
                children,
                ng_content_index: own_ng_content_index,
                source_span: element.source_span.clone(),
                end_source_span: element.end_source_span.clone(),
            })
        };
        drop(provider_context);

        if has_inline_templates {
            let template_css_selector =
                CssSelector::create_element_css_selector(TEMPLATE_ELEMENT, &template_matchable_attrs);
            let (template_directive_metas, _) = self.parse_directives(&template_css_selector);
            let template_directive_asts = self.create_directive_asts(
                true,
                node_name,
                &template_directive_metas,
                &template_element_or_directive_props,
                &[],
                &element.source_span,
                &mut Vec::new(),
            );
            let template_element_props = self.create_element_property_asts(
                node_name,
                &template_element_or_directive_props,
                &template_directive_asts,
            );
            self.assert_no_components_nor_element_bindings_on_template(
                &template_directive_asts,
                &template_element_props,
                &element.source_span,
            );
            let template_provider_context = ProviderElementContext::new(
                self.provider_view_context.clone(),
                parent.provider_context.clone(),
                parent.is_template_element,
                template_directive_asts,
                &[],
                &[],
                element.source_span.clone(),
            );
            template_provider_context.borrow_mut().after_element();
            let template_provider_context = template_provider_context.borrow();
            parsed_element = TemplateAst::EmbeddedTemplate(EmbeddedTemplateAst {
                attrs: vec![],
                outputs: vec![],
                references: vec![],
                variables: template_element_vars,
                directives: template_provider_context.transformed_directive_asts(),
                providers: template_provider_context.transform_providers(),
                has_view_container: template_provider_context.transformed_has_view_container(),
                children: vec![parsed_element],
                ng_content_index,
                source_span: element.source_span.clone(),
            });
        }
        Some(parsed_element)
    }

    fn validate_element_animation_input_outputs(
        &mut self,
        inputs: &[BoundElementPropertyAst],
        outputs: &[BoundEventAst],
        trigger_names: &[String],
    ) {
        let animation_inputs: Vec<&BoundElementPropertyAst> =
            inputs.iter().filter(|input| input.is_animation()).collect();
        for input in &animation_inputs {
            if !trigger_names.contains(&input.name) {
                self.report_error(
                    &format!("Couldn't find an animation entry for \"{}\"", input.name),
                    &input.source_span,
                );
            }
        }
        for output in outputs.iter().filter(|output| output.is_animation()) {
            if !animation_inputs.iter().any(|input| input.name == output.name) {
                self.report_error(
                    &format!(
                        "Unable to listen on (@{}.{}) because the animation trigger [@{}] isn't being used on the same element",
                        output.name,
                        output.phase.as_deref().unwrap_or(""),
                        output.name
                    ),
                    &output.source_span,
                );
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn parse_attr(
        &mut self,
        is_template_element: bool,
        attr: &Attribute,
        target_matchable_attrs: &mut Vec<(String, String)>,
        target_props: &mut Vec<BoundProperty>,
        target_events: &mut Vec<BoundEventAst>,
        target_refs: &mut Vec<ElementOrDirectiveRef>,
        target_vars: &mut Vec<VariableAst>,
    ) -> bool {
        let name = normalize_attribute_name(&attr.name);
        let value = attr.value.as_str();
        let src_span = &attr.source_span;
        let mut has_binding = false;

        if let Some(bind_parts) = BIND_NAME_REGEXP.captures(&name) {
            has_binding = true;
            let part = |idx: usize| bind_parts.get(idx).map(|m| m.as_str());
            let ident = part(IDENT_KW_IDX).unwrap_or("");
            if part(KW_BIND_IDX).is_some() {
                self.binding_parser
                    .parse_property_binding(ident, value, false, src_span, target_matchable_attrs, target_props);
            } else if part(KW_LET_IDX).is_some() {
                if is_template_element {
                    if ident.contains('-') {
                        self.report_error("\"-\" is not allowed in variable names", src_span);
                    }
                    target_vars.push(VariableAst {
                        name: ident.to_string(),
                        value: value.to_string(),
                        source_span: src_span.clone(),
                    });
                } else {
                    self.report_error("\"let-\" is only supported on template elements.", src_span);
                }
            } else if part(KW_REF_IDX).is_some() {
                if ident.contains('-') {
                    self.report_error("\"-\" is not allowed in reference names", src_span);
                }
                target_refs.push(ElementOrDirectiveRef {
                    name: ident.to_string(),
                    value: value.to_string(),
                    source_span: src_span.clone(),
                });
            } else if part(KW_ON_IDX).is_some() {
                self.binding_parser
                    .parse_event(ident, value, src_span, target_matchable_attrs, target_events);
            } else if part(KW_BINDON_IDX).is_some() {
                self.binding_parser
                    .parse_property_binding(ident, value, false, src_span, target_matchable_attrs, target_props);
                self.parse_assignment_event(ident, value, src_span, target_matchable_attrs, target_events);
            } else if part(KW_AT_IDX).is_some() {
                self.binding_parser
                    .parse_literal_attr(&name, value, src_span, target_matchable_attrs, target_props);
            } else if let Some(ident) = part(IDENT_BANANA_BOX_IDX) {
                self.binding_parser
                    .parse_property_binding(ident, value, false, src_span, target_matchable_attrs, target_props);
                self.parse_assignment_event(ident, value, src_span, target_matchable_attrs, target_events);
            } else if let Some(ident) = part(IDENT_PROPERTY_IDX) {
                self.binding_parser
                    .parse_property_binding(ident, value, false, src_span, target_matchable_attrs, target_props);
            } else if let Some(ident) = part(IDENT_EVENT_IDX) {
                self.binding_parser
                    .parse_event(ident, value, src_span, target_matchable_attrs, target_events);
            }
        } else {
            has_binding = self.binding_parser.parse_property_interpolation(
                &name,
                value,
                src_span,
                target_matchable_attrs,
                target_props,
            );
        }

        if !has_binding {
            self.binding_parser
                .parse_literal_attr(&name, value, src_span, target_matchable_attrs, target_props);
        }
        has_binding
    }

    fn parse_assignment_event(
        &mut self,
        name: &str,
        expression: &str,
        source_span: &ParseSourceSpan,
        target_matchable_attrs: &mut Vec<(String, String)>,
        target_events: &mut Vec<BoundEventAst>,
    ) {
        self.binding_parser.parse_event(
            &format!("{}Change", name),
            &format!("{}=$event", expression),
            source_span,
            target_matchable_attrs,
            target_events,
        );
    }

    /// Matching directives in declaration order, and whether any selector
    /// matched on the element name.
    fn parse_directives(&self, element_css_selector: &CssSelector) -> (Vec<CompileDirectiveSummary>, bool) {
        let mut matched = vec![false; self.directives.len()];
        let mut match_element = false;
        self.selector_matcher
            .match_selector(element_css_selector, |selector, index| {
                matched[*index] = true;
                match_element = match_element || selector.has_element_selector();
            });
        let directives = self
            .directives
            .iter()
            .zip(matched)
            .filter(|(_, matched)| *matched)
            .map(|(directive, _)| directive.clone())
            .collect();
        (directives, match_element)
    }

    #[allow(clippy::too_many_arguments)]
    fn create_directive_asts(
        &mut self,
        is_template_element: bool,
        element_name: &str,
        directives: &[CompileDirectiveSummary],
        props: &[BoundProperty],
        element_or_directive_refs: &[ElementOrDirectiveRef],
        element_source_span: &ParseSourceSpan,
        target_references: &mut Vec<ReferenceAst>,
    ) -> Vec<DirectiveAst> {
        let mut matched_references = HashSet::new();
        let mut has_component = false;
        let mut directive_asts = Vec::new();
        for directive in directives {
            let source_span = element_source_span
                .clone()
                .with_details(format!("Directive {}", identifier_name(&directive.type_.reference)));
            has_component = has_component || directive.is_component;
            let host_properties = self
                .binding_parser
                .create_directive_host_property_asts(directive, &source_span);
            // host properties are checked here as the element name is only known now
            self.check_properties_in_schema(element_name, &host_properties);
            let host_events = self
                .binding_parser
                .create_directive_host_event_asts(directive, &source_span);
            let inputs = create_directive_property_asts(directive, props);
            for el_or_dir_ref in element_or_directive_refs {
                if (el_or_dir_ref.value.is_empty() && directive.is_component)
                    || directive.export_as.as_deref() == Some(el_or_dir_ref.value.as_str())
                {
                    target_references.push(ReferenceAst {
                        name: el_or_dir_ref.name.clone(),
                        value: Some(CompileTokenMetadata::from_symbol(directive.type_.reference.clone())),
                        source_span: el_or_dir_ref.source_span.clone(),
                    });
                    matched_references.insert(el_or_dir_ref.name.clone());
                }
            }
            directive_asts.push(DirectiveAst {
                directive: directive.clone(),
                inputs,
                host_properties,
                host_events,
                source_span,
            });
        }
        for el_or_dir_ref in element_or_directive_refs {
            if !el_or_dir_ref.value.is_empty() {
                if !matched_references.contains(&el_or_dir_ref.name) {
                    self.report_error(
                        &format!(
                            "There is no directive with \"exportAs\" set to \"{}\"",
                            el_or_dir_ref.value
                        ),
                        &el_or_dir_ref.source_span,
                    );
                }
            } else if !has_component {
                target_references.push(ReferenceAst {
                    name: el_or_dir_ref.name.clone(),
                    value: is_template_element.then(|| self.template_ref_token.clone()),
                    source_span: el_or_dir_ref.source_span.clone(),
                });
            }
        }
        directive_asts
    }

    fn create_element_property_asts(
        &mut self,
        element_name: &str,
        props: &[BoundProperty],
        directives: &[DirectiveAst],
    ) -> Vec<BoundElementPropertyAst> {
        let bound_directive_props: HashSet<&str> = directives
            .iter()
            .flat_map(|d| d.inputs.iter().map(|input| input.template_name.as_str()))
            .collect();
        let bound_element_props: Vec<BoundElementPropertyAst> = props
            .iter()
            .filter(|prop| !prop.is_literal() && !bound_directive_props.contains(prop.name.as_str()))
            .map(|prop| self.binding_parser.create_element_property_ast(element_name, prop))
            .collect();
        self.check_properties_in_schema(element_name, &bound_element_props);
        bound_element_props
    }

    fn component_names(directives: &[DirectiveAst]) -> Vec<String> {
        directives
            .iter()
            .filter(|d| d.directive.is_component)
            .map(|d| identifier_name(&d.directive.type_.reference))
            .collect()
    }

    fn assert_only_one_component(&mut self, directives: &[DirectiveAst], source_span: &ParseSourceSpan) {
        let component_type_names = Self::component_names(directives);
        if component_type_names.len() > 1 {
            self.report_error(
                &format!(
                    "More than one component matched on this element.\n\
                     Make sure that only one component's selector can match a given element.\n\
                     Conflicting components: {}",
                    component_type_names.join(",")
                ),
                source_span,
            );
        }
    }

    /// Non-Angular tags must be known to the schema. An element counts as an
    /// Angular tag once a directive selector matched its name.
    fn assert_element_exists(&mut self, match_element: bool, element: &Element) {
        let el_name = XHTML_PREFIX.replace(&element.name, "").into_owned();
        if !match_element && !self.schema_registry.has_element(&el_name, self.schemas) {
            let error_msg = format!(
                "'{0}' is not a known element:\n\
                 1. If '{0}' is an Angular component, then verify that it is part of this module.\n\
                 2. If '{0}' is a Web Component then add \"CUSTOM_ELEMENTS_SCHEMA\" to the '@NgModule.schemas' of this component to suppress this message.",
                el_name
            );
            self.report_error(&error_msg, &element.source_span);
        }
    }

    fn assert_no_components_nor_element_bindings_on_template(
        &mut self,
        directives: &[DirectiveAst],
        element_props: &[BoundElementPropertyAst],
        source_span: &ParseSourceSpan,
    ) {
        let component_type_names = Self::component_names(directives);
        if !component_type_names.is_empty() {
            self.report_error(
                &format!(
                    "Components on an embedded template: {}",
                    component_type_names.join(",")
                ),
                source_span,
            );
        }
        for prop in element_props {
            self.report_error(
                &format!(
                    "Property binding {} not used by any directive on an embedded template. \
                     Make sure that the property name is spelled correctly and all directives are listed in the \"@NgModule.declarations\".",
                    prop.name
                ),
                source_span,
            );
        }
    }

    fn assert_all_events_published_by_directives(&mut self, directives: &[DirectiveAst], events: &[BoundEventAst]) {
        let all_directive_events: HashSet<&str> = directives
            .iter()
            .flat_map(|d| d.directive.outputs.values().map(String::as_str))
            .collect();
        for event in events {
            if event.target.is_some() || !all_directive_events.contains(event.name.as_str()) {
                self.report_error(
                    &format!(
                        "Event binding {} not emitted by any directive on an embedded template. \
                         Make sure that the event name is spelled correctly and all directives are listed in the \"@NgModule.declarations\".",
                        event.full_name()
                    ),
                    &event.source_span,
                );
            }
        }
    }

    fn check_properties_in_schema(&mut self, element_name: &str, bound_props: &[BoundElementPropertyAst]) {
        for bound_prop in bound_props {
            if bound_prop.type_ == PropertyBindingType::Property
                && !self
                    .schema_registry
                    .has_property(element_name, &bound_prop.name, self.schemas)
            {
                let mut error_msg = format!(
                    "Can't bind to '{}' since it isn't a known property of '{}'.",
                    bound_prop.name, element_name
                );
                if element_name.contains('-') {
                    error_msg.push_str(&format!(
                        "\n1. If '{0}' is an Angular component and it has '{1}' input, then verify that it is part of this module.\
                         \n2. If '{0}' is a Web Component then add \"CUSTOM_ELEMENTS_SCHEMA\" to the '@NgModule.schemas' of this component to suppress this message.\n",
                        element_name, bound_prop.name
                    ));
                }
                self.report_error(&error_msg, &bound_prop.source_span);
            }
        }
    }

    fn report_error(&mut self, message: &str, source_span: &ParseSourceSpan) {
        self.errors.push(ParseError::new(source_span.clone(), message));
    }
}

/// Binds directive inputs to the matching element bindings. `[a]="b"` wins
/// over a literal `a="b"` on the same element.
fn create_directive_property_asts(
    directive: &CompileDirectiveSummary,
    bound_props: &[BoundProperty],
) -> Vec<BoundDirectivePropertyAst> {
    let mut bound_props_by_name: HashMap<&str, &BoundProperty> = HashMap::new();
    for bound_prop in bound_props {
        let replace = bound_props_by_name
            .get(bound_prop.name.as_str())
            .map_or(true, |prev| prev.is_literal());
        if replace {
            bound_props_by_name.insert(&bound_prop.name, bound_prop);
        }
    }
    directive
        .inputs
        .iter()
        .filter_map(|(dir_prop, el_prop)| {
            bound_props_by_name
                .get(el_prop.as_str())
                .map(|bound_prop| BoundDirectivePropertyAst {
                    directive_name: dir_prop.clone(),
                    template_name: bound_prop.name.clone(),
                    value: bound_prop.expression.clone(),
                    source_span: bound_prop.source_span.clone(),
                })
        })
        .collect()
}

fn visit_attribute(attribute: &Attribute) -> AttrAst {
    AttrAst {
        name: attribute.name.clone(),
        value: attribute.value.clone(),
        source_span: attribute.source_span.clone(),
    }
}

/// Children of an `ngNonBindable` element: plain elements and text only.
fn visit_all_non_bindable(nodes: &[Node], parent: &ElementContext) -> Vec<TemplateAst> {
    nodes
        .iter()
        .filter_map(|node| match node {
            Node::Element(element) => {
                let preparsed = preparse_element(element);
                if matches!(
                    preparsed.element_type,
                    PreparsedElementType::Script
                        | PreparsedElementType::Style
                        | PreparsedElementType::Stylesheet
                ) {
                    return None;
                }
                let attr_name_and_values: Vec<(String, String)> = element
                    .attrs
                    .iter()
                    .map(|attr| (attr.name.clone(), attr.value.clone()))
                    .collect();
                let selector = CssSelector::create_element_css_selector(&element.name, &attr_name_and_values);
                let ng_content_index = parent.find_ng_content_index(&selector);
                let children = visit_all_non_bindable(&element.children, &ElementContext::empty());
                Some(TemplateAst::Element(ElementAst {
                    name: element.name.clone(),
                    attrs: element.attrs.iter().map(visit_attribute).collect(),
                    inputs: vec![],
                    outputs: vec![],
                    references: vec![],
                    directives: vec![],
                    providers: vec![],
                    has_view_container: false,
                    children,
                    ng_content_index,
                    source_span: element.source_span.clone(),
                    end_source_span: element.end_source_span.clone(),
                }))
            }
            Node::Text(text) => Some(TemplateAst::Text(TextAst {
                value: text.value.clone(),
                ng_content_index: parent.find_ng_content_index(&text_css_selector()),
                source_span: text.source_span.clone(),
            })),
            Node::Attribute(attr) => Some(TemplateAst::Attr(visit_attribute(attr))),
            Node::Comment(_) | Node::Expansion(_) | Node::ExpansionCase(_) => None,
        })
        .collect()
}
