//! CSS Selector Matching
//!
//! Parses the selector subset directives and `<ng-content select>` use, and
//! matches element selectors against a registry of them. Matching walks a
//! tree of partial maps keyed by element name, class name and attribute
//! name/value, so each lookup only touches selectors sharing a prefix with
//! the element.

use crate::error::{CompilerError, Result};
use crate::ml_parser::tags::get_html_tag_definition;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

static SELECTOR_REGEXP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(:not\()|([-\w]+)|(?:\.([-\w]+))|(?:\[([-\w*]+)(?:=([^\]]*))?\])|(\))|(\s*,\s*)")
        .unwrap()
});

const NOT: usize = 1;
const TAG: usize = 2;
const CLASS: usize = 3;
const ATTRIBUTE: usize = 4;
const ATTRIBUTE_VALUE: usize = 5;
const NOT_END: usize = 6;
const SEPARATOR: usize = 7;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CssSelector {
    pub element: Option<String>,
    pub class_names: Vec<String>,
    /// Flattened `[name, value, name, value, ...]`.
    pub attrs: Vec<String>,
    pub not_selectors: Vec<CssSelector>,
}

impl CssSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(selector: &str) -> Result<Vec<CssSelector>> {
        let mut results = Vec::new();
        let mut css_selector = CssSelector::new();
        let mut in_not = false;

        for caps in SELECTOR_REGEXP.captures_iter(selector) {
            if caps.get(NOT).is_some() {
                if in_not {
                    return Err(CompilerError::syntax("Nesting :not is not allowed in a selector"));
                }
                in_not = true;
                css_selector.not_selectors.push(CssSelector::new());
            }
            let current = if in_not {
                match css_selector.not_selectors.last_mut() {
                    Some(not_selector) => not_selector,
                    None => &mut css_selector,
                }
            } else {
                &mut css_selector
            };
            if let Some(tag) = caps.get(TAG) {
                current.set_element(tag.as_str());
            }
            if let Some(class_name) = caps.get(CLASS) {
                current.add_class_name(class_name.as_str());
            }
            if let Some(attr) = caps.get(ATTRIBUTE) {
                let value = caps.get(ATTRIBUTE_VALUE).map_or("", |m| m.as_str());
                current.add_attribute(attr.as_str(), value);
            }
            if caps.get(NOT_END).is_some() {
                in_not = false;
            }
            if caps.get(SEPARATOR).is_some() {
                if in_not {
                    return Err(CompilerError::syntax(
                        "Multiple selectors in :not are not supported",
                    ));
                }
                add_result(&mut results, std::mem::take(&mut css_selector));
            }
        }
        add_result(&mut results, css_selector);
        Ok(results)
    }

    /// Selector describing a concrete element: its tag plus every attribute,
    /// with `class` split into class names.
    pub fn create_element_css_selector(element_name: &str, attributes: &[(String, String)]) -> Self {
        let mut css_selector = CssSelector::new();
        let (_, local_name) = crate::ml_parser::tags::split_ns_name(element_name);
        css_selector.set_element(&local_name);
        for (name, value) in attributes {
            let (_, attr_name) = crate::ml_parser::tags::split_ns_name(name);
            css_selector.add_attribute(&attr_name, value);
            if name.eq_ignore_ascii_case("class") {
                for class_name in value.split_whitespace() {
                    css_selector.add_class_name(class_name);
                }
            }
        }
        css_selector
    }

    pub fn is_element_selector(&self) -> bool {
        self.has_element_selector()
            && self.class_names.is_empty()
            && self.attrs.is_empty()
            && self.not_selectors.is_empty()
    }

    pub fn has_element_selector(&self) -> bool {
        self.element.is_some()
    }

    pub fn set_element(&mut self, element: &str) {
        self.element = Some(element.to_string());
    }

    pub fn add_attribute(&mut self, name: &str, value: &str) {
        self.attrs.push(name.to_string());
        self.attrs.push(value.to_lowercase());
    }

    pub fn add_class_name(&mut self, name: &str) {
        self.class_names.push(name.to_lowercase());
    }

    pub fn attr_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs
            .chunks(2)
            .map(|pair| (pair[0].as_str(), pair.get(1).map_or("", String::as_str)))
    }

    /// Markup for an element this selector matches, used as the template of
    /// host views.
    pub fn get_matching_element_template(&self) -> String {
        let tag_name = self.element.as_deref().unwrap_or("div");
        let class_attr = if self.class_names.is_empty() {
            String::new()
        } else {
            format!(" class=\"{}\"", self.class_names.join(" "))
        };
        let mut attrs = String::new();
        for (name, value) in self.attr_pairs() {
            if value.is_empty() {
                attrs.push_str(&format!(" {}", name));
            } else {
                attrs.push_str(&format!(" {}=\"{}\"", name, value));
            }
        }
        if get_html_tag_definition(tag_name).is_void {
            format!("<{}{}{}/>", tag_name, class_attr, attrs)
        } else {
            format!("<{}{}{}></{}>", tag_name, class_attr, attrs, tag_name)
        }
    }
}

fn add_result(results: &mut Vec<CssSelector>, mut css_selector: CssSelector) {
    if !css_selector.not_selectors.is_empty()
        && css_selector.element.is_none()
        && css_selector.class_names.is_empty()
        && css_selector.attrs.is_empty()
    {
        css_selector.element = Some("*".to_string());
    }
    results.push(css_selector);
}

impl fmt::Display for CssSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(element) = &self.element {
            f.write_str(element)?;
        }
        for class_name in &self.class_names {
            write!(f, ".{}", class_name)?;
        }
        for (name, value) in self.attr_pairs() {
            if value.is_empty() {
                write!(f, "[{}]", name)?;
            } else {
                write!(f, "[{}={}]", name, value)?;
            }
        }
        for not_selector in &self.not_selectors {
            write!(f, ":not({})", not_selector)?;
        }
        Ok(())
    }
}

/// Shared by the selectors of one comma list so the list matches at most once.
#[derive(Debug, Default)]
struct SelectorListContext {
    already_matched: Cell<bool>,
}

#[derive(Debug)]
struct SelectorContext<T> {
    selector: CssSelector,
    context: T,
    list_context: Option<Rc<SelectorListContext>>,
}

impl<T> SelectorContext<T> {
    fn finalize(&self, css_selector: &CssSelector, callback: &mut dyn FnMut(&CssSelector, &T)) -> bool {
        let list_matched = self
            .list_context
            .as_ref()
            .map_or(false, |list| list.already_matched.get());
        let mut result = true;
        if !self.selector.not_selectors.is_empty() && !list_matched {
            let not_matcher = SelectorMatcher::create_not_matcher(&self.selector.not_selectors);
            result = !not_matcher.match_selector(css_selector, |_, _| {});
        }
        if result && !list_matched {
            if let Some(list) = &self.list_context {
                list.already_matched.set(true);
            }
            callback(&self.selector, &self.context);
        }
        result
    }
}

type Terminals<T> = HashMap<String, Vec<Rc<SelectorContext<T>>>>;

/// Registry of selectors, each carrying a context value handed back on match.
#[derive(Debug)]
pub struct SelectorMatcher<T> {
    element_map: Terminals<T>,
    element_partial_map: HashMap<String, SelectorMatcher<T>>,
    class_map: Terminals<T>,
    class_partial_map: HashMap<String, SelectorMatcher<T>>,
    attr_value_map: HashMap<String, Terminals<T>>,
    attr_value_partial_map: HashMap<String, HashMap<String, SelectorMatcher<T>>>,
    list_contexts: Vec<Rc<SelectorListContext>>,
}

impl<T> Default for SelectorMatcher<T> {
    fn default() -> Self {
        SelectorMatcher {
            element_map: HashMap::new(),
            element_partial_map: HashMap::new(),
            class_map: HashMap::new(),
            class_partial_map: HashMap::new(),
            attr_value_map: HashMap::new(),
            attr_value_partial_map: HashMap::new(),
            list_contexts: Vec::new(),
        }
    }
}

impl SelectorMatcher<()> {
    fn create_not_matcher(not_selectors: &[CssSelector]) -> SelectorMatcher<()> {
        let mut not_matcher = SelectorMatcher::new();
        not_matcher.add_selectables(not_selectors, ());
        not_matcher
    }
}

impl<T: Clone> SelectorMatcher<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a comma list of selectors sharing one context.
    pub fn add_selectables(&mut self, css_selectors: &[CssSelector], context: T) {
        let list_context = if css_selectors.len() > 1 {
            let list = Rc::new(SelectorListContext::default());
            self.list_contexts.push(list.clone());
            Some(list)
        } else {
            None
        };
        for css_selector in css_selectors {
            self.add_selectable(css_selector, context.clone(), list_context.clone());
        }
    }

    fn add_selectable(
        &mut self,
        css_selector: &CssSelector,
        context: T,
        list_context: Option<Rc<SelectorListContext>>,
    ) {
        let selectable = Rc::new(SelectorContext {
            selector: css_selector.clone(),
            context,
            list_context,
        });
        let mut matcher = self;
        let class_count = css_selector.class_names.len();
        let attr_count = css_selector.attrs.len();

        if let Some(element) = &css_selector.element {
            if attr_count == 0 && class_count == 0 {
                add_terminal(&mut matcher.element_map, element, selectable);
                return;
            }
            matcher = matcher.element_partial_map.entry(element.clone()).or_default();
        }

        for (index, class_name) in css_selector.class_names.iter().enumerate() {
            if attr_count == 0 && index == class_count - 1 {
                add_terminal(&mut matcher.class_map, class_name, selectable);
                return;
            }
            matcher = matcher.class_partial_map.entry(class_name.clone()).or_default();
        }

        let pairs: Vec<(&str, &str)> = css_selector.attr_pairs().collect();
        for (index, (name, value)) in pairs.iter().enumerate() {
            if index == pairs.len() - 1 {
                let terminal_values = matcher.attr_value_map.entry(name.to_string()).or_default();
                add_terminal(terminal_values, value, selectable);
                return;
            }
            matcher = matcher
                .attr_value_partial_map
                .entry(name.to_string())
                .or_default()
                .entry(value.to_string())
                .or_default();
        }
    }

    /// Calls `callback` for every registered selector matching `css_selector`
    /// and reports whether anything matched.
    pub fn match_selector(&self, css_selector: &CssSelector, mut callback: impl FnMut(&CssSelector, &T)) -> bool {
        self.match_inner(css_selector, &mut callback)
    }

    fn match_inner(&self, css_selector: &CssSelector, callback: &mut dyn FnMut(&CssSelector, &T)) -> bool {
        let mut result = false;
        for list in &self.list_contexts {
            list.already_matched.set(false);
        }

        if let Some(element) = &css_selector.element {
            result = match_terminal(&self.element_map, element, css_selector, callback) || result;
            result = match_partial(&self.element_partial_map, element, css_selector, callback) || result;
        }

        for class_name in &css_selector.class_names {
            result = match_terminal(&self.class_map, class_name, css_selector, callback) || result;
            result = match_partial(&self.class_partial_map, class_name, css_selector, callback) || result;
        }

        for (name, value) in css_selector.attr_pairs() {
            if let Some(terminal_values) = self.attr_value_map.get(name) {
                if !value.is_empty() {
                    result = match_terminal(terminal_values, "", css_selector, callback) || result;
                }
                result = match_terminal(terminal_values, value, css_selector, callback) || result;
            }
            if let Some(partial_values) = self.attr_value_partial_map.get(name) {
                if !value.is_empty() {
                    result = match_partial(partial_values, "", css_selector, callback) || result;
                }
                result = match_partial(partial_values, value, css_selector, callback) || result;
            }
        }
        result
    }
}

fn add_terminal<T>(map: &mut Terminals<T>, name: &str, selectable: Rc<SelectorContext<T>>) {
    map.entry(name.to_string()).or_default().push(selectable);
}

fn match_terminal<T>(
    map: &Terminals<T>,
    name: &str,
    css_selector: &CssSelector,
    callback: &mut dyn FnMut(&CssSelector, &T),
) -> bool {
    let selectables = map.get(name).into_iter().flatten();
    let star = map.get("*").into_iter().flatten();
    let mut result = false;
    for selectable in selectables.chain(star) {
        result = selectable.finalize(css_selector, callback) || result;
    }
    result
}

fn match_partial<T: Clone>(
    map: &HashMap<String, SelectorMatcher<T>>,
    name: &str,
    css_selector: &CssSelector,
    callback: &mut dyn FnMut(&CssSelector, &T),
) -> bool {
    match map.get(name) {
        Some(nested) => nested.match_inner(css_selector, callback),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_selectors() {
        let selectors = CssSelector::parse("div.a.B[title=Hi]:not(.c), span").unwrap();
        assert_eq!(selectors.len(), 2);
        assert_eq!(selectors[0].element.as_deref(), Some("div"));
        assert_eq!(selectors[0].class_names, vec!["a", "b"]);
        assert_eq!(selectors[0].attrs, vec!["title", "hi"]);
        assert_eq!(selectors[0].not_selectors[0].class_names, vec!["c"]);
        assert_eq!(selectors[0].to_string(), "div.a.b[title=hi]:not(.c)");
    }

    #[test]
    fn not_only_selector_gets_wildcard_element() {
        let selectors = CssSelector::parse(":not([a])").unwrap();
        assert_eq!(selectors[0].element.as_deref(), Some("*"));
    }

    #[test]
    fn rejects_nested_not() {
        let err = CssSelector::parse(":not(:not(a))").unwrap_err();
        assert_eq!(err.to_string(), "Nesting :not is not allowed in a selector");
        let err = CssSelector::parse(":not(a, b)").unwrap_err();
        assert_eq!(err.to_string(), "Multiple selectors in :not are not supported");
    }

    #[test]
    fn matching_element_template() {
        let selector = &CssSelector::parse("input.x[type=text][disabled]").unwrap()[0];
        assert_eq!(
            selector.get_matching_element_template(),
            "<input class=\"x\" type=\"text\" disabled/>"
        );
        let selector = &CssSelector::parse("my-app").unwrap()[0];
        assert_eq!(selector.get_matching_element_template(), "<my-app></my-app>");
    }
}
