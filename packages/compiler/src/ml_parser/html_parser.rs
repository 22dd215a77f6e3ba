//! HTML Parser
//!
//! Entry point for template markup: tokenizes and builds the node tree.

use super::interpolation_config::InterpolationConfig;
use super::lexer::tokenize;
pub use super::parser::ParseTreeResult;
use super::parser::TreeBuilder;

#[derive(Debug, Clone, Default)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn new() -> Self {
        HtmlParser
    }

    pub fn parse(
        &self,
        source: &str,
        url: &str,
        tokenize_expansion_forms: bool,
        interpolation_config: &InterpolationConfig,
    ) -> ParseTreeResult {
        let tokenized = tokenize(source, url, tokenize_expansion_forms, interpolation_config);
        let mut tree = TreeBuilder::new(tokenized.tokens).build();
        let mut errors = tokenized.errors;
        errors.append(&mut tree.errors);
        ParseTreeResult {
            root_nodes: tree.root_nodes,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml_parser::ast::Node;

    fn parse(source: &str) -> ParseTreeResult {
        HtmlParser::new().parse(source, "TestComp", true, &InterpolationConfig::default())
    }

    /// Flattens the tree into `(kind, name_or_value, depth)` rows.
    fn humanize(nodes: &[Node], depth: usize, out: &mut Vec<(String, String, usize)>) {
        for node in nodes {
            match node {
                Node::Element(el) => {
                    out.push(("Element".into(), el.name.clone(), depth));
                    for attr in &el.attrs {
                        out.push(("Attribute".into(), format!("{}={}", attr.name, attr.value), depth + 1));
                    }
                    humanize(&el.children, depth + 1, out);
                }
                Node::Text(t) => out.push(("Text".into(), t.value.clone(), depth)),
                Node::Comment(c) => {
                    out.push(("Comment".into(), c.value.clone().unwrap_or_default(), depth))
                }
                Node::Expansion(e) => {
                    out.push(("Expansion".into(), format!("{}:{}", e.switch_value, e.type_), depth));
                    for case in &e.cases {
                        out.push(("ExpansionCase".into(), case.value.clone(), depth + 1));
                        humanize(&case.expression, depth + 2, out);
                    }
                }
                Node::Attribute(_) | Node::ExpansionCase(_) => {}
            }
        }
    }

    fn humanized(source: &str) -> Vec<(String, String, usize)> {
        let result = parse(source);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let mut out = Vec::new();
        humanize(&result.root_nodes, 0, &mut out);
        out
    }

    fn row(kind: &str, value: &str, depth: usize) -> (String, String, usize) {
        (kind.to_string(), value.to_string(), depth)
    }

    #[test]
    fn should_parse_nested_elements_and_text() {
        assert_eq!(
            humanized("<div a=\"b\"><span>x</span>y</div>"),
            vec![
                row("Element", "div", 0),
                row("Attribute", "a=b", 1),
                row("Element", "span", 1),
                row("Text", "x", 2),
                row("Text", "y", 1),
            ]
        );
    }

    #[test]
    fn should_close_void_elements_implicitly() {
        assert_eq!(
            humanized("<div><br>text</div>"),
            vec![
                row("Element", "div", 0),
                row("Element", "br", 1),
                row("Text", "text", 1),
            ]
        );
    }

    #[test]
    fn should_close_p_by_following_block() {
        assert_eq!(
            humanized("<p>1<div>2</div>"),
            vec![
                row("Element", "p", 0),
                row("Text", "1", 1),
                row("Element", "div", 0),
                row("Text", "2", 1),
            ]
        );
    }

    #[test]
    fn should_apply_svg_namespace_to_children() {
        assert_eq!(
            humanized("<svg><circle></circle></svg>"),
            vec![row("Element", ":svg:svg", 0), row("Element", ":svg:circle", 1)]
        );
    }

    #[test]
    fn should_drop_first_lf_in_pre() {
        assert_eq!(
            humanized("<pre>\nline</pre>"),
            vec![row("Element", "pre", 0), row("Text", "line", 1)]
        );
    }

    #[test]
    fn should_parse_comments_and_expansions() {
        assert_eq!(
            humanized("<!-- hi -->{n, plural, =0 {none} other {<b>many</b>}}"),
            vec![
                row("Comment", "hi", 0),
                row("Expansion", "n:plural", 0),
                row("ExpansionCase", "=0", 1),
                row("Text", "none", 2),
                row("ExpansionCase", "other", 1),
                row("Element", "b", 2),
                row("Text", "many", 3),
            ]
        );
    }

    #[test]
    fn should_report_unexpected_closing_tags() {
        let result = parse("<div></p></div>");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].msg, "Unexpected closing tag \"p\"");
    }

    #[test]
    fn should_report_self_closed_html_elements() {
        let result = parse("<div/>");
        assert_eq!(
            result.errors[0].msg,
            "Only void and foreign elements can be self closed \"div\""
        );
    }

    #[test]
    fn should_report_end_tags_on_void_elements() {
        let result = parse("<input></input>");
        assert_eq!(
            result.errors[0].msg,
            "Void elements do not have end tags \"input\""
        );
    }
}
