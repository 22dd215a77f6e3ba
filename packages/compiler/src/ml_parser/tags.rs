//! HTML tag definitions
//!
//! Parsing rules per tag name: void elements, implicit closing, raw text
//! content and implicit namespaces.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagContentType {
    RawText,
    EscapableRawText,
    ParsableData,
}

#[derive(Debug, Clone)]
pub struct HtmlTagDefinition {
    closed_by_children: HashSet<String>,
    pub closed_by_parent: bool,
    pub implicit_namespace_prefix: Option<String>,
    pub content_type: TagContentType,
    pub is_void: bool,
    pub ignore_first_lf: bool,
    pub can_self_close: bool,
}

impl HtmlTagDefinition {
    pub fn new() -> Self {
        HtmlTagDefinition {
            closed_by_children: HashSet::new(),
            closed_by_parent: false,
            implicit_namespace_prefix: None,
            content_type: TagContentType::ParsableData,
            is_void: false,
            ignore_first_lf: false,
            can_self_close: false,
        }
    }

    fn void(mut self) -> Self {
        self.is_void = true;
        self.closed_by_parent = true;
        self
    }

    fn closed_by_children(mut self, children: &[&str]) -> Self {
        self.closed_by_children
            .extend(children.iter().map(|c| c.to_string()));
        self
    }

    fn closed_by_parent(mut self) -> Self {
        self.closed_by_parent = true;
        self
    }

    fn implicit_namespace(mut self, prefix: &str) -> Self {
        self.implicit_namespace_prefix = Some(prefix.to_string());
        self
    }

    fn content_type(mut self, content_type: TagContentType) -> Self {
        self.content_type = content_type;
        self
    }

    fn ignore_first_lf(mut self) -> Self {
        self.ignore_first_lf = true;
        self
    }

    pub fn is_closed_by_child(&self, name: &str) -> bool {
        self.is_void || self.closed_by_children.contains(&name.to_lowercase())
    }
}

impl Default for HtmlTagDefinition {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_TAG_DEFINITION: Lazy<HtmlTagDefinition> = Lazy::new(HtmlTagDefinition::new);

static TAG_DEFINITIONS: Lazy<HashMap<&'static str, HtmlTagDefinition>> = Lazy::new(|| {
    let d = HtmlTagDefinition::new;
    let mut map = HashMap::new();
    for name in [
        "base", "meta", "area", "embed", "link", "img", "input", "param", "hr", "br", "source",
        "track", "wbr", "col",
    ] {
        map.insert(name, d().void());
    }
    map.insert(
        "p",
        d().closed_by_children(&[
            "address", "article", "aside", "blockquote", "div", "dl", "fieldset", "footer",
            "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hgroup", "hr", "main", "nav",
            "ol", "p", "pre", "section", "table", "ul",
        ])
        .closed_by_parent(),
    );
    map.insert("thead", d().closed_by_children(&["tbody", "tfoot"]));
    map.insert("tbody", d().closed_by_children(&["tbody", "tfoot"]).closed_by_parent());
    map.insert("tfoot", d().closed_by_children(&["tbody"]).closed_by_parent());
    map.insert("tr", d().closed_by_children(&["tr"]).closed_by_parent());
    map.insert("td", d().closed_by_children(&["td", "th"]).closed_by_parent());
    map.insert("th", d().closed_by_children(&["td", "th"]).closed_by_parent());
    map.insert("svg", d().implicit_namespace("svg"));
    map.insert("math", d().implicit_namespace("math"));
    map.insert("li", d().closed_by_children(&["li"]).closed_by_parent());
    map.insert("dt", d().closed_by_children(&["dt", "dd"]));
    map.insert("dd", d().closed_by_children(&["dt", "dd"]).closed_by_parent());
    map.insert("rb", d().closed_by_children(&["rb", "rt", "rtc", "rp"]).closed_by_parent());
    map.insert("rt", d().closed_by_children(&["rb", "rt", "rtc", "rp"]).closed_by_parent());
    map.insert("rtc", d().closed_by_children(&["rb", "rtc", "rp"]).closed_by_parent());
    map.insert("rp", d().closed_by_children(&["rb", "rt", "rtc", "rp"]).closed_by_parent());
    map.insert("optgroup", d().closed_by_children(&["optgroup"]).closed_by_parent());
    map.insert("option", d().closed_by_children(&["option", "optgroup"]).closed_by_parent());
    map.insert("pre", d().ignore_first_lf());
    map.insert("listing", d().ignore_first_lf());
    map.insert("style", d().content_type(TagContentType::RawText));
    map.insert("script", d().content_type(TagContentType::RawText));
    map.insert("title", d().content_type(TagContentType::EscapableRawText));
    map.insert(
        "textarea",
        d().content_type(TagContentType::EscapableRawText).ignore_first_lf(),
    );
    map
});

pub fn get_html_tag_definition(tag_name: &str) -> &'static HtmlTagDefinition {
    TAG_DEFINITIONS
        .get(tag_name.to_lowercase().as_str())
        .unwrap_or(&DEFAULT_TAG_DEFINITION)
}

/// Splits `:ns:name` into its namespace and local name.
pub fn split_ns_name(element_name: &str) -> (Option<String>, String) {
    if !element_name.starts_with(':') {
        return (None, element_name.to_string());
    }
    match element_name[1..].find(':') {
        Some(index) => (
            Some(element_name[1..=index].to_string()),
            element_name[index + 2..].to_string(),
        ),
        None => (None, element_name.to_string()),
    }
}

pub fn get_ns_prefix(full_name: &str) -> Option<String> {
    split_ns_name(full_name).0
}

pub fn merge_ns_and_name(prefix: Option<&str>, local_name: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!(":{}:{}", prefix, local_name),
        _ => local_name.to_string(),
    }
}

pub fn is_ng_container(tag_name: &str) -> bool {
    split_ns_name(tag_name).1 == "ng-container"
}

pub fn is_ng_content(tag_name: &str) -> bool {
    split_ns_name(tag_name).1 == "ng-content"
}

/// Named character references the lexer decodes.
pub static NAMED_ENTITIES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("amp", "&"), ("lt", "<"), ("gt", ">"), ("quot", "\""), ("apos", "'"),
        ("nbsp", "\u{00A0}"), ("iexcl", "\u{00A1}"), ("cent", "\u{00A2}"), ("pound", "\u{00A3}"),
        ("curren", "\u{00A4}"), ("yen", "\u{00A5}"), ("brvbar", "\u{00A6}"), ("sect", "\u{00A7}"),
        ("uml", "\u{00A8}"), ("copy", "\u{00A9}"), ("ordf", "\u{00AA}"), ("laquo", "\u{00AB}"),
        ("not", "\u{00AC}"), ("shy", "\u{00AD}"), ("reg", "\u{00AE}"), ("macr", "\u{00AF}"),
        ("deg", "\u{00B0}"), ("plusmn", "\u{00B1}"), ("sup2", "\u{00B2}"), ("sup3", "\u{00B3}"),
        ("acute", "\u{00B4}"), ("micro", "\u{00B5}"), ("para", "\u{00B6}"), ("middot", "\u{00B7}"),
        ("cedil", "\u{00B8}"), ("sup1", "\u{00B9}"), ("ordm", "\u{00BA}"), ("raquo", "\u{00BB}"),
        ("frac14", "\u{00BC}"), ("frac12", "\u{00BD}"), ("frac34", "\u{00BE}"),
        ("iquest", "\u{00BF}"), ("Agrave", "\u{00C0}"), ("Aacute", "\u{00C1}"),
        ("Auml", "\u{00C4}"), ("Ccedil", "\u{00C7}"), ("Eacute", "\u{00C9}"), ("Ntilde", "\u{00D1}"),
        ("Ouml", "\u{00D6}"), ("times", "\u{00D7}"), ("Uuml", "\u{00DC}"), ("szlig", "\u{00DF}"),
        ("agrave", "\u{00E0}"), ("aacute", "\u{00E1}"), ("auml", "\u{00E4}"), ("ccedil", "\u{00E7}"),
        ("egrave", "\u{00E8}"), ("eacute", "\u{00E9}"), ("ecirc", "\u{00EA}"), ("ntilde", "\u{00F1}"),
        ("ouml", "\u{00F6}"), ("divide", "\u{00F7}"), ("uuml", "\u{00FC}"), ("euro", "\u{20AC}"),
        ("ndash", "\u{2013}"), ("mdash", "\u{2014}"), ("lsquo", "\u{2018}"), ("rsquo", "\u{2019}"),
        ("ldquo", "\u{201C}"), ("rdquo", "\u{201D}"), ("bull", "\u{2022}"), ("hellip", "\u{2026}"),
        ("prime", "\u{2032}"), ("trade", "\u{2122}"), ("larr", "\u{2190}"), ("uarr", "\u{2191}"),
        ("rarr", "\u{2192}"), ("darr", "\u{2193}"), ("harr", "\u{2194}"), ("le", "\u{2264}"),
        ("ge", "\u{2265}"), ("ne", "\u{2260}"), ("infin", "\u{221E}"), ("minus", "\u{2212}"),
        ("alpha", "\u{03B1}"), ("beta", "\u{03B2}"), ("gamma", "\u{03B3}"), ("delta", "\u{03B4}"),
        ("pi", "\u{03C0}"), ("sigma", "\u{03C3}"), ("omega", "\u{03C9}"), ("hearts", "\u{2665}"),
        ("ngsp", "\u{E500}"),
    ])
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_split_namespaced_names() {
        assert_eq!(
            split_ns_name(":svg:circle"),
            (Some("svg".to_string()), "circle".to_string())
        );
        assert_eq!(split_ns_name("div"), (None, "div".to_string()));
        assert_eq!(merge_ns_and_name(Some("svg"), "g"), ":svg:g");
    }

    #[test]
    fn should_know_void_and_implicitly_closed_tags() {
        assert!(get_html_tag_definition("BR").is_void);
        assert!(get_html_tag_definition("p").is_closed_by_child("div"));
        assert!(!get_html_tag_definition("div").is_closed_by_child("p"));
        assert_eq!(
            get_html_tag_definition("script").content_type,
            TagContentType::RawText
        );
        assert_eq!(
            get_html_tag_definition("svg").implicit_namespace_prefix.as_deref(),
            Some("svg")
        );
    }
}
