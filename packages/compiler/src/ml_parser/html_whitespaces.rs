//! HTML Whitespace Processing
//!
//! Applied when `preserveWhitespaces` is off:
//! - text nodes consisting of whitespace only are dropped;
//! - other text nodes have runs of whitespace collapsed to one space;
//! - `&ngsp;` becomes a single space.
//!
//! Elements in `SKIP_WS_TRIM_TAGS` or carrying `ngPreserveWhitespaces` keep
//! their content untouched.

use super::ast::{Attribute, Element, Node, Text};
use super::parser::ParseTreeResult;
use once_cell::sync::Lazy;
use regex::Regex;

pub const PRESERVE_WS_ATTR_NAME: &str = "ngPreserveWhitespaces";

pub const NGSP_UNICODE: char = '\u{E500}';

const SKIP_WS_TRIM_TAGS: [&str; 5] = ["pre", "template", "textarea", "script", "style"];

// \s without the non-breaking space
const WS_CHARS: &str = " \u{000C}\n\r\t\u{000B}\u{1680}\u{180E}\u{2000}-\u{200A}\u{2028}\u{2029}\u{202F}\u{205F}\u{3000}\u{FEFF}";

static NO_WS_REGEXP: Lazy<Regex> = Lazy::new(|| Regex::new(&format!("[^{}]", WS_CHARS)).unwrap());

static WS_REPLACE_REGEXP: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("[{}]{{2,}}", WS_CHARS)).unwrap());

pub fn replace_ngsp(value: &str) -> String {
    value.replace(NGSP_UNICODE, " ")
}

fn has_preserve_whitespaces_attr(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| attr.name == PRESERVE_WS_ATTR_NAME)
}

pub fn remove_whitespaces(result: ParseTreeResult) -> ParseTreeResult {
    ParseTreeResult {
        root_nodes: visit_all(result.root_nodes),
        errors: result.errors,
    }
}

fn visit_all(nodes: Vec<Node>) -> Vec<Node> {
    let has_expansion: Vec<bool> = nodes
        .iter()
        .map(|n| matches!(n, Node::Expansion(_)))
        .collect();
    nodes
        .into_iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let expansion_sibling = (index > 0 && has_expansion[index - 1])
                || has_expansion.get(index + 1).copied().unwrap_or(false);
            visit_node(node, expansion_sibling)
        })
        .collect()
}

fn visit_node(node: Node, expansion_sibling: bool) -> Option<Node> {
    match node {
        Node::Element(element) => Some(Node::Element(visit_element(element))),
        Node::Text(text) => visit_text(text, expansion_sibling).map(Node::Text),
        Node::Expansion(mut expansion) => {
            for case in expansion.cases.iter_mut() {
                case.expression = visit_all(std::mem::take(&mut case.expression));
            }
            Some(Node::Expansion(expansion))
        }
        other => Some(other),
    }
}

fn visit_element(mut element: Element) -> Element {
    if SKIP_WS_TRIM_TAGS.contains(&element.name.as_str())
        || has_preserve_whitespaces_attr(&element.attrs)
    {
        // the marker attribute is consumed here
        element.attrs.retain(|attr| attr.name != PRESERVE_WS_ATTR_NAME);
        return element;
    }
    element.children = visit_all(element.children);
    element
}

fn visit_text(text: Text, expansion_sibling: bool) -> Option<Text> {
    if NO_WS_REGEXP.is_match(&text.value) || expansion_sibling {
        let value = WS_REPLACE_REGEXP
            .replace_all(&replace_ngsp(&text.value), " ")
            .into_owned();
        Some(Text {
            value,
            source_span: text.source_span,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml_parser::html_parser::HtmlParser;
    use crate::ml_parser::interpolation_config::InterpolationConfig;

    fn texts(nodes: &[Node], out: &mut Vec<String>) {
        for node in nodes {
            match node {
                Node::Text(t) => out.push(t.value.clone()),
                Node::Element(el) => texts(&el.children, out),
                _ => {}
            }
        }
    }

    fn stripped_texts(source: &str) -> Vec<String> {
        let parsed =
            HtmlParser::new().parse(source, "url", false, &InterpolationConfig::default());
        let result = remove_whitespaces(parsed);
        let mut out = Vec::new();
        texts(&result.root_nodes, &mut out);
        out
    }

    #[test]
    fn should_drop_blank_text_and_collapse_runs() {
        assert_eq!(
            stripped_texts("<div>  \n </div><span>a   b</span>"),
            vec!["a b".to_string()]
        );
    }

    #[test]
    fn should_keep_pre_and_marked_elements() {
        assert_eq!(
            stripped_texts("<pre>  a  </pre><div ngPreserveWhitespaces>  </div>"),
            vec!["  a  ".to_string(), "  ".to_string()]
        );
    }
}
