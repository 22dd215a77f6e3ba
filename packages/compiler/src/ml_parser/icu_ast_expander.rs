//! ICU expansion
//!
//! Rewrites ICU messages into `ng-container`/`template` elements driven by
//! `ngPlural` or `ngSwitch`:
//!
//! ```text
//! {count, plural, =0 {none} other {many}}
//! ```
//!
//! becomes
//!
//! ```text
//! <ng-container [ngPlural]="count">
//!   <template ngPluralCase="=0">none</template>
//!   <template ngPluralCase="other">many</template>
//! </ng-container>
//! ```

use super::ast::{Attribute, Element, Expansion, Node};
use super::parser::ParseTreeResult;
use crate::parse_util::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;

const PLURAL_CASES: [&str; 6] = ["zero", "one", "two", "few", "many", "other"];

static EXACT_CASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^=\d+$").unwrap());

#[derive(Debug, Clone)]
pub struct ExpansionResult {
    pub nodes: Vec<Node>,
    pub expanded: bool,
    pub errors: Vec<ParseError>,
}

pub fn expand_nodes(nodes: Vec<Node>) -> ExpansionResult {
    let mut expanded = false;
    let mut errors = Vec::new();
    let nodes = nodes
        .into_iter()
        .map(|node| expand_node(node, &mut expanded, &mut errors))
        .collect();
    ExpansionResult {
        nodes,
        expanded,
        errors,
    }
}

/// Expands ICU messages in a parse result when it parsed without errors.
pub fn expand_parse_tree(result: ParseTreeResult) -> ParseTreeResult {
    if !result.errors.is_empty() {
        return result;
    }
    let expanded = expand_nodes(result.root_nodes);
    ParseTreeResult {
        root_nodes: expanded.nodes,
        errors: expanded.errors,
    }
}

fn expand_node(node: Node, expanded: &mut bool, errors: &mut Vec<ParseError>) -> Node {
    match node {
        Node::Element(mut element) => {
            element.children = element
                .children
                .into_iter()
                .map(|child| expand_node(child, expanded, errors))
                .collect();
            Node::Element(element)
        }
        Node::Expansion(icu) => {
            *expanded = true;
            if icu.type_ == "plural" {
                expand_plural_form(icu, errors)
            } else {
                expand_default_form(icu, errors)
            }
        }
        other => other,
    }
}

fn expand_plural_form(icu: Expansion, errors: &mut Vec<ParseError>) -> Node {
    let children = icu
        .cases
        .into_iter()
        .map(|case| {
            if !PLURAL_CASES.contains(&case.value.as_str()) && !EXACT_CASE.is_match(&case.value) {
                errors.push(ParseError::new(
                    case.value_source_span.clone(),
                    format!(
                        "Plural cases should be \"=<number>\" or one of {}",
                        PLURAL_CASES.join(", ")
                    ),
                ));
            }
            let mut result = expand_nodes(case.expression);
            errors.append(&mut result.errors);
            case_template(
                Attribute::new("ngPluralCase", case.value, case.value_source_span),
                result.nodes,
                case.source_span,
            )
        })
        .collect();
    container(
        Attribute::new("[ngPlural]", icu.switch_value, icu.switch_value_source_span),
        children,
        icu.source_span,
    )
}

fn expand_default_form(icu: Expansion, errors: &mut Vec<ParseError>) -> Node {
    let children = icu
        .cases
        .into_iter()
        .map(|case| {
            let mut result = expand_nodes(case.expression);
            errors.append(&mut result.errors);
            let attr = if case.value == "other" {
                Attribute::new("ngSwitchDefault", "", case.value_source_span)
            } else {
                Attribute::new("ngSwitchCase", case.value, case.value_source_span)
            };
            case_template(attr, result.nodes, case.source_span)
        })
        .collect();
    container(
        Attribute::new("[ngSwitch]", icu.switch_value, icu.switch_value_source_span),
        children,
        icu.source_span,
    )
}

fn case_template(attr: Attribute, children: Vec<Node>, span: crate::parse_util::ParseSourceSpan) -> Node {
    Node::Element(Element {
        name: "template".to_string(),
        attrs: vec![attr],
        children,
        source_span: span.clone(),
        start_source_span: span.clone(),
        end_source_span: Some(span),
    })
}

fn container(attr: Attribute, children: Vec<Node>, span: crate::parse_util::ParseSourceSpan) -> Node {
    Node::Element(Element {
        name: "ng-container".to_string(),
        attrs: vec![attr],
        children,
        source_span: span.clone(),
        start_source_span: span.clone(),
        end_source_span: Some(span),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml_parser::html_parser::HtmlParser;
    use crate::ml_parser::interpolation_config::InterpolationConfig;

    fn expand(source: &str) -> ExpansionResult {
        let parsed =
            HtmlParser::new().parse(source, "url", true, &InterpolationConfig::default());
        assert!(parsed.errors.is_empty());
        expand_nodes(parsed.root_nodes)
    }

    fn element(node: &Node) -> &Element {
        match node {
            Node::Element(el) => el,
            other => panic!("expected element, got {:?}", other),
        }
    }

    #[test]
    fn should_expand_plural_forms() {
        let result = expand("{messages.length, plural,=0 {zero<b>bold</b>}}");
        assert!(result.expanded);
        let container = element(&result.nodes[0]);
        assert_eq!(container.name, "ng-container");
        assert_eq!(container.attrs[0].name, "[ngPlural]");
        assert_eq!(container.attrs[0].value, "messages.length");
        let case = element(&container.children[0]);
        assert_eq!(case.name, "template");
        assert_eq!(case.attrs[0].name, "ngPluralCase");
        assert_eq!(case.attrs[0].value, "=0");
        assert_eq!(case.children.len(), 2);
    }

    #[test]
    fn should_expand_select_forms_with_default() {
        let result = expand("{p.gender, select, male {m} other {o}}");
        let container = element(&result.nodes[0]);
        assert_eq!(container.attrs[0].name, "[ngSwitch]");
        let cases: Vec<_> = container
            .children
            .iter()
            .map(|c| element(c).attrs[0].name.clone())
            .collect();
        assert_eq!(cases, vec!["ngSwitchCase", "ngSwitchDefault"]);
    }

    #[test]
    fn should_reject_invalid_plural_cases() {
        let result = expand("{n, plural, foo {x}}");
        assert_eq!(
            result.errors[0].msg,
            "Plural cases should be \"=<number>\" or one of zero, one, two, few, many, other"
        );
    }
}
