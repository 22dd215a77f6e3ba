//! Binding Parser
//!
//! Turns attribute names and values into bound properties, events and
//! template variables, and later into `BoundElementPropertyAst`s once the
//! element name (or the directive selector for host bindings) is known.

use super::template_ast::{BoundElementPropertyAst, BoundEventAst, PropertyBindingType, VariableAst};
use crate::compile_metadata::{CompileDirectiveSummary, CompilePipeSummary};
use crate::core::SecurityContext;
use crate::expression_parser::{ASTWithSource, Parser, ParserError, AST};
use crate::ml_parser::tags::merge_ns_and_name;
use crate::ml_parser::InterpolationConfig;
use crate::parse_util::{ParseError, ParseErrorLevel, ParseSourceSpan};
use crate::schema::ElementSchemaRegistry;
use crate::selector::CssSelector;
use crate::util::{split_at_colon, split_at_period};
use std::collections::{BTreeSet, HashMap};

const PROPERTY_PARTS_SEPARATOR: char = '.';
const ATTRIBUTE_PREFIX: &str = "attr";
const CLASS_PREFIX: &str = "class";
const STYLE_PREFIX: &str = "style";
const ANIMATE_PROP_PREFIX: &str = "animate-";

/// Interpolation arity supported by the runtime `interpolate` helper.
pub const MAX_INTERPOLATION_VALUES: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundPropertyType {
    Default,
    LiteralAttr,
    Animation,
}

/// A property binding before it is known whether it targets the element or
/// a directive input.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundProperty {
    pub name: String,
    pub expression: ASTWithSource,
    pub type_: BoundPropertyType,
    pub source_span: ParseSourceSpan,
}

impl BoundProperty {
    pub fn is_literal(&self) -> bool {
        self.type_ == BoundPropertyType::LiteralAttr
    }

    pub fn is_animation(&self) -> bool {
        self.type_ == BoundPropertyType::Animation
    }
}

pub struct BindingParser<'a> {
    expr_parser: &'a Parser,
    interpolation_config: InterpolationConfig,
    schema_registry: &'a dyn ElementSchemaRegistry,
    pipes_by_name: HashMap<String, CompilePipeSummary>,
    pub errors: Vec<ParseError>,
}

impl<'a> BindingParser<'a> {
    pub fn new(
        expr_parser: &'a Parser,
        interpolation_config: InterpolationConfig,
        schema_registry: &'a dyn ElementSchemaRegistry,
        pipes: &[CompilePipeSummary],
    ) -> Self {
        let pipes_by_name = pipes
            .iter()
            .map(|pipe| (pipe.name.clone(), pipe.clone()))
            .collect();
        BindingParser {
            expr_parser,
            interpolation_config,
            schema_registry,
            pipes_by_name,
            errors: Vec::new(),
        }
    }

    pub fn create_directive_host_property_asts(
        &mut self,
        dir_meta: &CompileDirectiveSummary,
        source_span: &ParseSourceSpan,
    ) -> Vec<BoundElementPropertyAst> {
        let mut bound_props = Vec::new();
        for (prop_name, expression) in &dir_meta.host_properties {
            self.parse_property_binding(prop_name, expression, true, source_span, &mut Vec::new(), &mut bound_props);
        }
        let selector = dir_meta.selector.as_deref().unwrap_or("");
        bound_props
            .iter()
            .map(|prop| self.create_element_property_ast(selector, prop))
            .collect()
    }

    pub fn create_directive_host_event_asts(
        &mut self,
        dir_meta: &CompileDirectiveSummary,
        source_span: &ParseSourceSpan,
    ) -> Vec<BoundEventAst> {
        let mut target_events = Vec::new();
        for (prop_name, expression) in &dir_meta.host_listeners {
            self.parse_event(prop_name, expression, source_span, &mut Vec::new(), &mut target_events);
        }
        target_events
    }

    /// `None` when `value` contains no interpolation.
    pub fn parse_interpolation(&mut self, value: &str, source_span: &ParseSourceSpan) -> Option<ASTWithSource> {
        let source_info = source_span.start.to_string();
        let ast = self
            .expr_parser
            .parse_interpolation(value, &source_info, &self.interpolation_config)?;
        self.report_expression_parser_errors(&ast.errors, source_span);
        self.check_pipes(&ast, source_span);
        if let AST::Interpolation { expressions, .. } = &ast.ast {
            if expressions.len() > MAX_INTERPOLATION_VALUES {
                self.report_error(
                    &format!(
                        "Only support at most {} interpolation values!",
                        MAX_INTERPOLATION_VALUES
                    ),
                    source_span,
                );
                return Some(self.expr_parser.wrap_literal_primitive("ERROR", &source_info));
            }
        }
        Some(ast)
    }

    /// Desugars `*prefix="..."` / `template="..."`. `prefix_token` is the
    /// directive name taken from the attribute (`ngIf` for `*ngIf`).
    pub fn parse_inline_template_binding(
        &mut self,
        prefix_token: Option<&str>,
        value: &str,
        source_span: &ParseSourceSpan,
        target_matchable_attrs: &mut Vec<(String, String)>,
        target_props: &mut Vec<BoundProperty>,
        target_vars: &mut Vec<VariableAst>,
    ) {
        let source_info = source_span.start.to_string();
        let input = match prefix_token {
            Some(prefix) => format!("{}: {}", prefix, value),
            None => value.to_string(),
        };
        let result = self.expr_parser.parse_template_bindings(&input, &source_info);
        self.report_expression_parser_errors(&result.errors, source_span);
        for warning in &result.warnings {
            self.errors
                .push(ParseError::warning(source_span.clone(), warning.clone()));
        }
        for binding in result.template_bindings {
            if binding.key_is_var {
                target_vars.push(VariableAst {
                    name: binding.key,
                    value: binding.name.unwrap_or_default(),
                    source_span: source_span.clone(),
                });
            } else if let Some(expression) = binding.expression {
                self.check_pipes(&expression, source_span);
                self.parse_property_ast(&binding.key, expression, source_span, target_matchable_attrs, target_props);
            } else {
                target_matchable_attrs.push((binding.key.clone(), String::new()));
                self.parse_literal_attr(&binding.key, "", source_span, target_matchable_attrs, target_props);
            }
        }
    }

    pub fn parse_property_binding(
        &mut self,
        name: &str,
        expression: &str,
        is_host: bool,
        source_span: &ParseSourceSpan,
        target_matchable_attrs: &mut Vec<(String, String)>,
        target_props: &mut Vec<BoundProperty>,
    ) {
        if let Some(animation) = name.strip_prefix(ANIMATE_PROP_PREFIX) {
            self.parse_animation(animation, expression, source_span, target_matchable_attrs, target_props);
        } else if let Some(animation) = name.strip_prefix('@') {
            self.parse_animation(animation, expression, source_span, target_matchable_attrs, target_props);
        } else {
            let ast = self.parse_binding(expression, is_host, source_span);
            self.parse_property_ast(name, ast, source_span, target_matchable_attrs, target_props);
        }
    }

    /// Returns whether `value` held an interpolation.
    pub fn parse_property_interpolation(
        &mut self,
        name: &str,
        value: &str,
        source_span: &ParseSourceSpan,
        target_matchable_attrs: &mut Vec<(String, String)>,
        target_props: &mut Vec<BoundProperty>,
    ) -> bool {
        match self.parse_interpolation(value, source_span) {
            Some(ast) => {
                self.parse_property_ast(name, ast, source_span, target_matchable_attrs, target_props);
                true
            }
            None => false,
        }
    }

    pub fn parse_literal_attr(
        &mut self,
        name: &str,
        value: &str,
        source_span: &ParseSourceSpan,
        target_matchable_attrs: &mut Vec<(String, String)>,
        target_props: &mut Vec<BoundProperty>,
    ) {
        if let Some(animation) = name.strip_prefix('@') {
            if !value.is_empty() {
                self.report_error(
                    "Assigning animation triggers via @prop=\"exp\" attributes with an expression is invalid. \
                     Use property bindings (e.g. [@prop]=\"exp\") or use an attribute without a value (e.g. @prop) instead.",
                    source_span,
                );
            }
            self.parse_animation(animation, value, source_span, target_matchable_attrs, target_props);
        } else {
            target_props.push(BoundProperty {
                name: name.to_string(),
                expression: self.expr_parser.wrap_literal_primitive(value, ""),
                type_: BoundPropertyType::LiteralAttr,
                source_span: source_span.clone(),
            });
        }
    }

    pub fn parse_event(
        &mut self,
        name: &str,
        expression: &str,
        source_span: &ParseSourceSpan,
        target_matchable_attrs: &mut Vec<(String, String)>,
        target_events: &mut Vec<BoundEventAst>,
    ) {
        match name.strip_prefix('@') {
            Some(animation) => self.parse_animation_event(animation, expression, source_span, target_events),
            None => self.parse_regular_event(name, expression, source_span, target_matchable_attrs, target_events),
        }
    }

    pub fn create_element_property_ast(
        &mut self,
        element_selector: &str,
        bound_prop: &BoundProperty,
    ) -> BoundElementPropertyAst {
        if bound_prop.is_animation() {
            return BoundElementPropertyAst {
                name: bound_prop.name.clone(),
                type_: PropertyBindingType::Animation,
                security_context: SecurityContext::None,
                needs_runtime_security_context: false,
                value: bound_prop.expression.clone(),
                unit: None,
                source_span: bound_prop.source_span.clone(),
            };
        }

        let parts: Vec<&str> = bound_prop.name.split(PROPERTY_PARTS_SEPARATOR).collect();
        let mut unit = None;
        let bound_property_name;
        let binding_type;
        let security_contexts: Vec<SecurityContext>;

        if parts.len() == 1 {
            bound_property_name = self.schema_registry.get_mapped_prop_name(parts[0]);
            security_contexts = calc_possible_security_contexts(
                self.schema_registry,
                element_selector,
                &bound_property_name,
                false,
            );
            binding_type = PropertyBindingType::Property;
            self.validate_property_name(&bound_prop.source_span, &bound_property_name, false);
        } else if parts[0] == ATTRIBUTE_PREFIX {
            let attr_name = parts[1..].join(".");
            self.validate_property_name(&bound_prop.source_span, &attr_name, true);
            let mapped_prop_name = self.schema_registry.get_mapped_prop_name(&attr_name);
            security_contexts = calc_possible_security_contexts(
                self.schema_registry,
                element_selector,
                &mapped_prop_name,
                true,
            );
            bound_property_name = match attr_name.find(':') {
                Some(idx) => merge_ns_and_name(Some(&attr_name[..idx]), &attr_name[idx + 1..]),
                None => attr_name,
            };
            binding_type = PropertyBindingType::Attribute;
        } else if parts[0] == CLASS_PREFIX {
            bound_property_name = parts[1].to_string();
            binding_type = PropertyBindingType::Class;
            security_contexts = vec![SecurityContext::None];
        } else if parts[0] == STYLE_PREFIX {
            unit = parts.get(2).map(|unit| unit.to_string());
            bound_property_name = parts[1].to_string();
            binding_type = PropertyBindingType::Style;
            security_contexts = vec![SecurityContext::Style];
        } else {
            self.report_error(
                &format!("Invalid property name '{}'", bound_prop.name),
                &bound_prop.source_span,
            );
            bound_property_name = bound_prop.name.clone();
            binding_type = PropertyBindingType::Property;
            security_contexts = Vec::new();
        }

        BoundElementPropertyAst {
            name: bound_property_name,
            type_: binding_type,
            security_context: if security_contexts.len() == 1 {
                security_contexts[0]
            } else {
                SecurityContext::None
            },
            needs_runtime_security_context: security_contexts.len() > 1,
            value: bound_prop.expression.clone(),
            unit,
            source_span: bound_prop.source_span.clone(),
        }
    }

    fn parse_animation(
        &mut self,
        name: &str,
        expression: &str,
        source_span: &ParseSourceSpan,
        target_matchable_attrs: &mut Vec<(String, String)>,
        target_props: &mut Vec<BoundProperty>,
    ) {
        // `@trigger` with no value binds the trigger to null.
        let expression = if expression.is_empty() { "null" } else { expression };
        let ast = self.parse_binding(expression, false, source_span);
        target_matchable_attrs.push((name.to_string(), ast.source.clone()));
        target_props.push(BoundProperty {
            name: name.to_string(),
            expression: ast,
            type_: BoundPropertyType::Animation,
            source_span: source_span.clone(),
        });
    }

    fn parse_property_ast(
        &mut self,
        name: &str,
        ast: ASTWithSource,
        source_span: &ParseSourceSpan,
        target_matchable_attrs: &mut Vec<(String, String)>,
        target_props: &mut Vec<BoundProperty>,
    ) {
        target_matchable_attrs.push((name.to_string(), ast.source.clone()));
        target_props.push(BoundProperty {
            name: name.to_string(),
            expression: ast,
            type_: BoundPropertyType::Default,
            source_span: source_span.clone(),
        });
    }

    fn parse_binding(&mut self, value: &str, is_host_binding: bool, source_span: &ParseSourceSpan) -> ASTWithSource {
        let source_info = source_span.start.to_string();
        let ast = if is_host_binding {
            self.expr_parser
                .parse_simple_binding(value, &source_info, &self.interpolation_config)
        } else {
            self.expr_parser
                .parse_binding(value, &source_info, &self.interpolation_config)
        };
        self.report_expression_parser_errors(&ast.errors, source_span);
        self.check_pipes(&ast, source_span);
        ast
    }

    fn parse_animation_event(
        &mut self,
        name: &str,
        expression: &str,
        source_span: &ParseSourceSpan,
        target_events: &mut Vec<BoundEventAst>,
    ) {
        let (event_name, phase) = split_at_period(name, (name, ""));
        let phase = phase.to_lowercase();
        match phase.as_str() {
            "" => self.report_error(
                &format!(
                    "The animation trigger output event (@{}) is missing its phase value name (start or done are currently supported)",
                    event_name
                ),
                source_span,
            ),
            "start" | "done" => {
                let ast = self.parse_action(expression, source_span);
                target_events.push(BoundEventAst {
                    name: event_name,
                    target: None,
                    phase: Some(phase),
                    handler: ast,
                    source_span: source_span.clone(),
                });
            }
            _ => self.report_error(
                &format!(
                    "The provided animation output phase value \"{}\" for \"@{}\" is not supported (use start or done)",
                    phase, event_name
                ),
                source_span,
            ),
        }
    }

    fn parse_regular_event(
        &mut self,
        name: &str,
        expression: &str,
        source_span: &ParseSourceSpan,
        target_matchable_attrs: &mut Vec<(String, String)>,
        target_events: &mut Vec<BoundEventAst>,
    ) {
        // long format: 'target: eventName'
        let (target, event_name) = split_at_colon(name, ("", name));
        let ast = self.parse_action(expression, source_span);
        target_matchable_attrs.push((name.to_string(), ast.source.clone()));
        target_events.push(BoundEventAst {
            name: event_name,
            target: Some(target).filter(|t| !t.is_empty()),
            phase: None,
            handler: ast,
            source_span: source_span.clone(),
        });
    }

    fn parse_action(&mut self, value: &str, source_span: &ParseSourceSpan) -> ASTWithSource {
        let source_info = source_span.start.to_string();
        let ast = self
            .expr_parser
            .parse_action(value, &source_info, &self.interpolation_config);
        self.report_expression_parser_errors(&ast.errors, source_span);
        if matches!(ast.ast, AST::EmptyExpr { .. }) {
            self.report_error("Empty expressions are not allowed", source_span);
            return self.expr_parser.wrap_literal_primitive("ERROR", &source_info);
        }
        self.check_pipes(&ast, source_span);
        ast
    }

    fn check_pipes(&mut self, ast: &ASTWithSource, source_span: &ParseSourceSpan) {
        let mut missing = Vec::new();
        ast.ast.walk(&mut |node| {
            if let AST::BindingPipe { name, span, .. } = node {
                if !self.pipes_by_name.contains_key(name) && !missing.iter().any(|(n, _)| n == name) {
                    missing.push((name.clone(), *span));
                }
            }
        });
        for (name, span) in missing {
            let pipe_span = ParseSourceSpan::new(
                source_span.start.move_by(span.start as i64),
                source_span.start.move_by(span.end as i64),
            );
            self.report_error(&format!("The pipe '{}' could not be found", name), &pipe_span);
        }
    }

    fn validate_property_name(&mut self, source_span: &ParseSourceSpan, prop_name: &str, is_attr: bool) {
        let report = if is_attr {
            self.schema_registry.validate_attribute(prop_name)
        } else {
            self.schema_registry.validate_property(prop_name)
        };
        if report.error {
            if let Some(msg) = report.msg {
                self.report_error(&msg, source_span);
            }
        }
    }

    fn report_expression_parser_errors(&mut self, errors: &[ParserError], source_span: &ParseSourceSpan) {
        for error in errors {
            self.report_error(&error.message, source_span);
        }
    }

    fn report_error(&mut self, message: &str, source_span: &ParseSourceSpan) {
        self.errors.push(ParseError {
            span: source_span.clone(),
            msg: message.to_string(),
            level: ParseErrorLevel::Error,
        });
    }
}

/// Security contexts a property may have on the elements `selector` can
/// match. Without an element name every known element is considered.
pub fn calc_possible_security_contexts(
    registry: &dyn ElementSchemaRegistry,
    selector: &str,
    prop_name: &str,
    is_attribute: bool,
) -> Vec<SecurityContext> {
    let mut ctxs = BTreeSet::new();
    for css_selector in CssSelector::parse(selector).unwrap_or_default() {
        let element_names = match &css_selector.element {
            Some(element) => vec![element.clone()],
            None => registry.all_known_element_names(),
        };
        let not_element_names: Vec<&str> = css_selector
            .not_selectors
            .iter()
            .filter(|s| s.is_element_selector())
            .filter_map(|s| s.element.as_deref())
            .collect();
        for element_name in element_names {
            if !not_element_names.contains(&element_name.as_str()) {
                ctxs.insert(registry.security_context(&element_name, prop_name, is_attribute));
            }
        }
    }
    if ctxs.is_empty() {
        vec![SecurityContext::None]
    } else {
        ctxs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression_parser::{unparse, Lexer};
    use crate::parse_util::{ParseLocation, ParseSourceFile};
    use crate::schema::DomElementSchemaRegistry;

    fn span() -> ParseSourceSpan {
        let file = ParseSourceFile::new("<div></div>", "TestComp");
        ParseSourceSpan::new(ParseLocation::new(file.clone(), 0, 0, 0), ParseLocation::new(file, 5, 0, 5))
    }

    fn messages(parser: &BindingParser) -> Vec<String> {
        parser.errors.iter().map(|e| e.msg.clone()).collect()
    }

    #[test]
    fn should_calc_security_contexts_for_selectors() {
        let registry = DomElementSchemaRegistry::new();
        assert_eq!(
            calc_possible_security_contexts(&registry, "a", "href", false),
            vec![SecurityContext::Url]
        );
        assert_eq!(
            calc_possible_security_contexts(&registry, "div", "title", false),
            vec![SecurityContext::None]
        );
        let ctxs = calc_possible_security_contexts(&registry, "[dir]", "src", false);
        assert!(ctxs.len() > 1);
        assert!(ctxs.contains(&SecurityContext::Url));
    }

    #[test]
    fn should_classify_element_property_bindings() {
        let expr_parser = Parser::new(Lexer::new());
        let registry = DomElementSchemaRegistry::new();
        let mut parser = BindingParser::new(&expr_parser, InterpolationConfig::default(), &registry, &[]);
        let mut props = Vec::new();
        for name in ["title", "attr.aria-label", "class.active", "style.width.px", "@fade"] {
            parser.parse_property_binding(name, "v", false, &span(), &mut Vec::new(), &mut props);
        }
        let asts: Vec<_> = props
            .iter()
            .map(|p| parser.create_element_property_ast("div", p))
            .collect();
        let kinds: Vec<_> = asts.iter().map(|a| (a.type_, a.name.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (PropertyBindingType::Property, "title"),
                (PropertyBindingType::Attribute, "aria-label"),
                (PropertyBindingType::Class, "active"),
                (PropertyBindingType::Style, "width"),
                (PropertyBindingType::Animation, "fade"),
            ]
        );
        assert_eq!(asts[3].unit.as_deref(), Some("px"));
        assert_eq!(asts[3].security_context, SecurityContext::Style);
        assert!(parser.errors.is_empty());
    }

    #[test]
    fn should_desugar_ng_for_microsyntax() {
        let expr_parser = Parser::new(Lexer::new());
        let registry = DomElementSchemaRegistry::new();
        let mut parser = BindingParser::new(&expr_parser, InterpolationConfig::default(), &registry, &[]);
        let mut attrs = Vec::new();
        let mut props = Vec::new();
        let mut vars = Vec::new();
        parser.parse_inline_template_binding(
            Some("ngFor"),
            "let item of items; let i = index",
            &span(),
            &mut attrs,
            &mut props,
            &mut vars,
        );
        let var_pairs: Vec<_> = vars.iter().map(|v| (v.name.as_str(), v.value.as_str())).collect();
        assert_eq!(var_pairs, vec![("item", "$implicit"), ("i", "index")]);
        let of = props.iter().find(|p| p.name == "ngForOf").unwrap();
        assert_eq!(unparse(&of.expression.ast), "items");
        assert!(attrs.contains(&("ngFor".to_string(), String::new())));
    }

    #[test]
    fn should_report_unknown_pipes_and_empty_actions() {
        let expr_parser = Parser::new(Lexer::new());
        let registry = DomElementSchemaRegistry::new();
        let mut parser = BindingParser::new(&expr_parser, InterpolationConfig::default(), &registry, &[]);
        let mut props = Vec::new();
        parser.parse_property_binding("title", "name | upper", false, &span(), &mut Vec::new(), &mut props);
        let mut events = Vec::new();
        parser.parse_event("click", "", &span(), &mut Vec::new(), &mut events);
        assert_eq!(
            messages(&parser),
            vec![
                "The pipe 'upper' could not be found".to_string(),
                "Empty expressions are not allowed".to_string(),
            ]
        );
    }

    #[test]
    fn should_parse_targeted_and_animation_events() {
        let expr_parser = Parser::new(Lexer::new());
        let registry = DomElementSchemaRegistry::new();
        let mut parser = BindingParser::new(&expr_parser, InterpolationConfig::default(), &registry, &[]);
        let mut events = Vec::new();
        parser.parse_event("window:resize", "onResize()", &span(), &mut Vec::new(), &mut events);
        parser.parse_event("@fade.done", "onDone()", &span(), &mut Vec::new(), &mut events);
        parser.parse_event("@fade.middle", "x()", &span(), &mut Vec::new(), &mut events);
        parser.parse_event("@fade", "x()", &span(), &mut Vec::new(), &mut events);
        assert_eq!(events[0].full_name(), "window:resize");
        assert_eq!(events[1].full_name(), "@fade.done");
        assert_eq!(events.len(), 2);
        assert_eq!(
            messages(&parser),
            vec![
                "The provided animation output phase value \"middle\" for \"@fade\" is not supported (use start or done)".to_string(),
                "The animation trigger output event (@fade) is missing its phase value name (start or done are currently supported)".to_string(),
            ]
        );
    }

    #[test]
    fn should_limit_interpolation_values() {
        let expr_parser = Parser::new(Lexer::new());
        let registry = DomElementSchemaRegistry::new();
        let mut parser = BindingParser::new(&expr_parser, InterpolationConfig::default(), &registry, &[]);
        let value = "{{a}}{{b}}{{c}}{{d}}{{e}}{{f}}{{g}}{{h}}{{i}}{{j}}";
        parser.parse_interpolation(value, &span());
        assert_eq!(messages(&parser), vec!["Only support at most 9 interpolation values!"]);
    }
}
