//! Template Preparser
//!
//! Classifies elements the template parser treats specially before any
//! binding is looked at: `<ng-content>`, `<style>`, `<script>` and stylesheet
//! links.

use crate::ml_parser::ast::Element;
use crate::ml_parser::tags::{is_ng_content, split_ns_name};

const NG_CONTENT_SELECT_ATTR: &str = "select";
const LINK_ELEMENT: &str = "link";
const LINK_STYLE_REL_ATTR: &str = "rel";
const LINK_STYLE_HREF_ATTR: &str = "href";
const LINK_STYLE_REL_VALUE: &str = "stylesheet";
const STYLE_ELEMENT: &str = "style";
const SCRIPT_ELEMENT: &str = "script";
const NG_NON_BINDABLE_ATTR: &str = "ngNonBindable";
const NG_PROJECT_AS: &str = "ngProjectAs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreparsedElementType {
    NgContent,
    Style,
    Stylesheet,
    Script,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreparsedElement {
    pub element_type: PreparsedElementType,
    /// `select` of an `<ng-content>`, `*` when absent.
    pub select_attr: String,
    pub href_attr: Option<String>,
    pub non_bindable: bool,
    pub project_as: Option<String>,
}

pub fn preparse_element(ast: &Element) -> PreparsedElement {
    let mut select_attr = None;
    let mut href_attr = None;
    let mut rel_attr = None;
    let mut non_bindable = false;
    let mut project_as = None;

    for attr in &ast.attrs {
        let lc_attr_name = attr.name.to_lowercase();
        if lc_attr_name == NG_CONTENT_SELECT_ATTR {
            select_attr = Some(attr.value.clone());
        } else if lc_attr_name == LINK_STYLE_HREF_ATTR {
            href_attr = Some(attr.value.clone());
        } else if lc_attr_name == LINK_STYLE_REL_ATTR {
            rel_attr = Some(attr.value.clone());
        } else if attr.name == NG_NON_BINDABLE_ATTR {
            non_bindable = true;
        } else if attr.name == NG_PROJECT_AS && !attr.value.is_empty() {
            project_as = Some(attr.value.clone());
        }
    }

    let node_name = split_ns_name(&ast.name).1.to_lowercase();
    let element_type = if is_ng_content(&ast.name) {
        PreparsedElementType::NgContent
    } else if node_name == STYLE_ELEMENT {
        PreparsedElementType::Style
    } else if node_name == SCRIPT_ELEMENT {
        PreparsedElementType::Script
    } else if node_name == LINK_ELEMENT && rel_attr.as_deref() == Some(LINK_STYLE_REL_VALUE) {
        PreparsedElementType::Stylesheet
    } else {
        PreparsedElementType::Other
    };

    PreparsedElement {
        element_type,
        select_attr: normalize_ng_content_select(select_attr),
        href_attr,
        non_bindable,
        project_as,
    }
}

fn normalize_ng_content_select(select_attr: Option<String>) -> String {
    match select_attr {
        Some(select) if !select.is_empty() => select,
        _ => "*".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml_parser::ast::Attribute;
    use crate::parse_util::ParseSourceSpan;

    fn element(name: &str, attrs: &[(&str, &str)]) -> Element {
        let span = ParseSourceSpan::empty("test.html");
        Element {
            name: name.to_string(),
            attrs: attrs
                .iter()
                .map(|(name, value)| Attribute::new(*name, *value, span.clone()))
                .collect(),
            children: vec![],
            source_span: span.clone(),
            start_source_span: span,
            end_source_span: None,
        }
    }

    #[test]
    fn should_default_ng_content_select_to_wildcard() {
        let preparsed = preparse_element(&element("ng-content", &[]));
        assert_eq!(preparsed.element_type, PreparsedElementType::NgContent);
        assert_eq!(preparsed.select_attr, "*");

        let preparsed = preparse_element(&element("ng-content", &[("select", "")]));
        assert_eq!(preparsed.select_attr, "*");
    }

    #[test]
    fn should_keep_ng_content_select() {
        let preparsed = preparse_element(&element("ng-content", &[("select", ".my-class")]));
        assert_eq!(preparsed.select_attr, ".my-class");
    }

    #[test]
    fn should_detect_style_and_script() {
        assert_eq!(
            preparse_element(&element("style", &[])).element_type,
            PreparsedElementType::Style
        );
        assert_eq!(
            preparse_element(&element("SCRIPT", &[])).element_type,
            PreparsedElementType::Script
        );
    }

    #[test]
    fn should_detect_stylesheet_links_only_with_rel() {
        let preparsed = preparse_element(&element(
            "link",
            &[("rel", "stylesheet"), ("href", "styles.css")],
        ));
        assert_eq!(preparsed.element_type, PreparsedElementType::Stylesheet);
        assert_eq!(preparsed.href_attr.as_deref(), Some("styles.css"));

        let preparsed = preparse_element(&element("link", &[("href", "styles.css")]));
        assert_eq!(preparsed.element_type, PreparsedElementType::Other);
    }

    #[test]
    fn should_read_non_bindable_and_project_as() {
        let preparsed = preparse_element(&element(
            "div",
            &[("ngNonBindable", ""), ("ngProjectAs", "my-comp")],
        ));
        assert!(preparsed.non_bindable);
        assert_eq!(preparsed.project_as.as_deref(), Some("my-comp"));
        assert_eq!(preparsed.element_type, PreparsedElementType::Other);
    }
}
