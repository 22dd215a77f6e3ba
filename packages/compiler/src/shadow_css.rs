//! Emulated view encapsulation.
//!
//! Rewrites component css so that every selector only matches elements of
//! the component: elements inside the view get the content attribute, the
//! host element gets the host attribute. Handles `:host`, `:host(sel)`,
//! `:host-context(sel)`, the `>>>` / `/deep/` piercing combinators and the
//! `polyfill-next-selector` / `polyfill-rule` / `polyfill-unscoped-rule`
//! directives.
//!
//! `@media`, `@supports`, `@page` and `@document` blocks are scoped
//! recursively; other at-rules such as `@keyframes` are left alone.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const POLYFILL_HOST: &str = "-shadowcsshost";
const POLYFILL_HOST_CONTEXT: &str = "-shadowcsscontext";
const POLYFILL_HOST_NO_COMBINATOR: &str = "-shadowcsshost-no-combinator";
const BLOCK_PLACEHOLDER: &str = "%BLOCK%";

const SCOPED_AT_RULES: &[&str] = &["@media", "@supports", "@page", "@document"];

static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static SOURCE_MAPPING_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*\s*#\s*sourceMappingURL=.+?\*/").unwrap());

static CONTENT_NEXT_SELECTOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)polyfill-next-selector[^}]*content:\s*?(?:'([^']*)'|"([^"]*)")[;\s]*\}([^{]*?)\{"#)
        .unwrap()
});
static CONTENT_RULE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)(polyfill-rule)[^}]*(content:\s*(?:'([^']*)'|"([^"]*)"))[;\s]*[^}]*\}"#).unwrap()
});
static CONTENT_UNSCOPED_RULE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)(polyfill-unscoped-rule)[^}]*(content:\s*(?:'([^']*)'|"([^"]*)"))[;\s]*[^}]*\}"#)
        .unwrap()
});

static COLON_HOST_CONTEXT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i):host-context").unwrap());
static COLON_HOST_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i):host").unwrap());

/// `<marker>(<selectors>)<rest up to the next comma or block>`
static CSS_COLON_HOST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(-shadowcsshost)(?:\(((?:\([^)(]*\)|[^)(]*)+?)\))?([^,{]*)").unwrap()
});
static CSS_COLON_HOST_CONTEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(-shadowcsscontext)(?:\(((?:\([^)(]*\)|[^)(]*)+?)\))?([^,{]*)").unwrap()
});

static POLYFILL_HOST_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)-shadowcsshost").unwrap());
static POLYFILL_HOST_NO_COMBINATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-shadowcsshost-no-combinator([^\s]*)").unwrap());

static SHADOW_DOM_SELECTORS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"::shadow|::content|/shadow-deep/|/shadow/").unwrap());
static SHADOW_DEEP_SELECTORS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r">>>|/deep/|::ng-deep").unwrap());

static RULE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\s*)([^;\{\}]+?)(\s*)((?:\{%BLOCK%\}?\s*;?)|(?:\s*;))").unwrap()
});
static CURLY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[{}]").unwrap());
static COMBINATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*([>+~])\s*|\s+").unwrap());

static ATTR_SELECTOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").unwrap());
static NTH_EXPRESSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(:nth-[-\w]+)(\([^)]+\))").unwrap());
static SAFE_PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"__ph-(\d+)__").unwrap());
static IS_ATTR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[is=([^\]]*)\]").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct CssRule {
    pub selector: String,
    pub content: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ShadowCss;

impl ShadowCss {
    pub fn new() -> Self {
        ShadowCss
    }

    /// Scopes `css_text`: `selector` is the attribute every element of the
    /// view carries, `host_selector` the one on the host element.
    pub fn shim_css_text(&self, css_text: &str, selector: &str, host_selector: &str) -> String {
        let source_mapping_url = SOURCE_MAPPING_URL_RE
            .find(css_text)
            .map(|m| format!("\n{}", m.as_str()))
            .unwrap_or_default();
        let css_text = COMMENT_RE.replace_all(css_text, "");
        let css_text = insert_directives(&css_text);
        format!(
            "{}{}",
            scope_css_text(&css_text, selector, host_selector),
            source_mapping_url
        )
    }
}

/// `polyfill-next-selector {content: 'x'} y {` becomes `x {`, and
/// `polyfill-rule {content: 'x'; ...}` becomes `x {...}`.
fn insert_directives(css_text: &str) -> String {
    let css_text = CONTENT_NEXT_SELECTOR_RE.replace_all(css_text, |caps: &Captures| {
        let selector = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        format!("{}{{", selector)
    });
    CONTENT_RULE_RE
        .replace_all(&css_text, |caps: &Captures| {
            let selector = caps.get(3).or_else(|| caps.get(4)).map_or("", |m| m.as_str());
            let rule = caps[0].replacen(&caps[1], "", 1).replacen(&caps[2], "", 1);
            format!("{}{}", selector, rule)
        })
        .into_owned()
}

fn extract_unscoped_rules(css_text: &str) -> String {
    let mut rules = String::new();
    for caps in CONTENT_UNSCOPED_RULE_RE.captures_iter(css_text) {
        let selector = caps.get(3).or_else(|| caps.get(4)).map_or("", |m| m.as_str());
        let rule = caps[0].replacen(&caps[2], "", 1).replacen(&caps[1], selector, 1);
        rules.push_str(&rule);
        rules.push_str("\n\n");
    }
    rules
}

fn scope_css_text(css_text: &str, scope_selector: &str, host_selector: &str) -> String {
    let unscoped_rules = extract_unscoped_rules(css_text);
    let css_text = CONTENT_UNSCOPED_RULE_RE.replace_all(css_text, "");
    let css_text = COLON_HOST_CONTEXT_RE.replace_all(&css_text, POLYFILL_HOST_CONTEXT);
    let css_text = COLON_HOST_RE.replace_all(&css_text, POLYFILL_HOST);
    let css_text = convert_colon_rule(&css_text, &CSS_COLON_HOST_RE, colon_host_part);
    let css_text = convert_colon_rule(&css_text, &CSS_COLON_HOST_CONTEXT_RE, colon_host_context_part);
    let mut css_text = SHADOW_DOM_SELECTORS_RE.replace_all(&css_text, " ").into_owned();
    if !scope_selector.is_empty() {
        css_text = scope_selectors(&css_text, scope_selector, host_selector);
    }
    format!("{}\n{}", css_text, unscoped_rules).trim().to_string()
}

/// Rewrites every `<marker>(a, b) rest` into one no-combinator host part
/// per selector in the parentheses.
fn convert_colon_rule(css_text: &str, re: &Regex, part_replacer: fn(&str, &str) -> String) -> String {
    re.replace_all(css_text, |caps: &Captures| {
        let suffix = caps.get(3).map_or("", |m| m.as_str());
        match caps.get(2) {
            Some(parts) => parts
                .as_str()
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| part_replacer(part, suffix))
                .collect::<Vec<_>>()
                .join(","),
            None => format!("{}{}", POLYFILL_HOST_NO_COMBINATOR, suffix),
        }
    })
    .into_owned()
}

fn colon_host_part(part: &str, suffix: &str) -> String {
    format!(
        "{}{}{}",
        POLYFILL_HOST_NO_COMBINATOR,
        part.replace(POLYFILL_HOST, ""),
        suffix
    )
}

/// `:host-context(.a) b` matches both a host inside `.a` and a host that is
/// itself `.a`.
fn colon_host_context_part(part: &str, suffix: &str) -> String {
    if part.contains(POLYFILL_HOST) {
        return colon_host_part(part, suffix);
    }
    format!(
        "{host}{part}{suffix}, {part} {host}{suffix}",
        host = POLYFILL_HOST_NO_COMBINATOR,
        part = part,
        suffix = suffix
    )
}

fn scope_selectors(css_text: &str, scope_selector: &str, host_selector: &str) -> String {
    process_rules(css_text, |rule| {
        if !rule.selector.starts_with('@') {
            CssRule {
                selector: scope_selector_list(&rule.selector, scope_selector, host_selector),
                content: rule.content,
            }
        } else if SCOPED_AT_RULES.iter().any(|at| rule.selector.starts_with(at)) {
            CssRule {
                content: scope_selectors(&rule.content, scope_selector, host_selector),
                selector: rule.selector,
            }
        } else {
            rule
        }
    })
}

fn scope_selector_list(selector: &str, scope_selector: &str, host_selector: &str) -> String {
    selector
        .split(',')
        .map(|part| {
            let mut deep_parts = SHADOW_DEEP_SELECTORS_RE.split(part.trim()).map(str::trim);
            let shallow = deep_parts.next().unwrap_or_default();
            let scoped = if selector_needs_scoping(shallow, scope_selector) {
                apply_strict_selector_scope(shallow, scope_selector, host_selector)
            } else {
                shallow.to_string()
            };
            std::iter::once(scoped)
                .chain(deep_parts.map(str::to_string))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// False when the selector already starts with the scope attribute.
fn selector_needs_scoping(selector: &str, scope_selector: &str) -> bool {
    match selector.strip_prefix(scope_selector) {
        Some(rest) => !(rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace() || ">~+[.,{:".contains(c))),
        None => true,
    }
}

fn apply_strict_selector_scope(selector: &str, scope_selector: &str, host_selector: &str) -> String {
    let scope_selector = IS_ATTR_RE.replace_all(scope_selector, "$1");
    let attr_name = format!("[{}]", scope_selector);
    let scope_part = |part: &str| -> String {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            return String::new();
        }
        if part.contains(POLYFILL_HOST_NO_COMBINATOR) {
            return apply_simple_selector_scope(part, host_selector);
        }
        let without_host = POLYFILL_HOST_RE.replace_all(part, "");
        if without_host.is_empty() {
            trimmed.to_string()
        } else {
            insert_before_pseudo(&without_host, &attr_name)
        }
    };

    let safe = SafeSelector::new(selector);
    let content = safe.content.as_str();
    // Compound selectors before `:host-context` match ancestors of the host.
    let scope_after = content.find(POLYFILL_HOST_NO_COMBINATOR);
    let mut scoped = String::new();
    let mut start = 0;
    for caps in COMBINATOR_RE.captures_iter(content) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let part = content[start..whole.start()].trim();
        let scoped_part = match scope_after {
            Some(position) if start < position => part.to_string(),
            _ => scope_part(part),
        };
        scoped.push_str(&scoped_part);
        match caps.get(1) {
            Some(combinator) => scoped.push_str(&format!(" {} ", combinator.as_str())),
            None => scoped.push(' '),
        }
        start = whole.end();
    }
    scoped.push_str(&scope_part(&content[start..]));
    safe.restore(&scoped)
}

/// Replaces the host markers of `selector` with the host attribute.
fn apply_simple_selector_scope(selector: &str, host_selector: &str) -> String {
    let replace_by = format!("[{}]", host_selector);
    let selector = POLYFILL_HOST_NO_COMBINATOR_RE.replace_all(selector, |caps: &Captures| {
        insert_before_pseudo(caps.get(1).map_or("", |m| m.as_str()), &replace_by)
    });
    POLYFILL_HOST_RE
        .replace_all(&selector, format!("{} ", replace_by).as_str())
        .into_owned()
}

/// `a:hover` + `[x]` gives `a[x]:hover`.
fn insert_before_pseudo(part: &str, attr: &str) -> String {
    let split = part.find(':').unwrap_or(part.len());
    format!("{}{}{}", &part[..split], attr, &part[split..])
}

/// Hides attribute selectors and `:nth-*()` expressions while a selector is
/// split on combinators.
struct SafeSelector {
    placeholders: Vec<String>,
    content: String,
}

impl SafeSelector {
    fn new(selector: &str) -> Self {
        let mut placeholders = Vec::new();
        let content = ATTR_SELECTOR_RE.replace_all(selector, |caps: &Captures| {
            placeholders.push(caps[0].to_string());
            format!("__ph-{}__", placeholders.len() - 1)
        });
        let content = NTH_EXPRESSION_RE
            .replace_all(&content, |caps: &Captures| {
                placeholders.push(caps[2].to_string());
                format!("{}__ph-{}__", &caps[1], placeholders.len() - 1)
            })
            .into_owned();
        SafeSelector { placeholders, content }
    }

    fn restore(&self, content: &str) -> String {
        SAFE_PLACEHOLDER_RE
            .replace_all(content, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| self.placeholders.get(index))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Calls `rule_callback` for each top-level rule of `input`; nested blocks
/// are passed as the rule content.
pub fn process_rules<F>(input: &str, mut rule_callback: F) -> String
where
    F: FnMut(CssRule) -> CssRule,
{
    let (escaped, blocks) = escape_blocks(input);
    let mut blocks = blocks.into_iter();
    RULE_RE
        .replace_all(&escaped, |caps: &Captures| {
            let mut suffix = caps.get(4).map_or("", |m| m.as_str());
            let mut content = String::new();
            let mut content_prefix = "";
            if let Some(rest) = suffix.strip_prefix('{').and_then(|s| s.strip_prefix(BLOCK_PLACEHOLDER)) {
                content = blocks.next().unwrap_or_default();
                suffix = rest;
                content_prefix = "{";
            }
            let rule = rule_callback(CssRule {
                selector: caps[2].to_string(),
                content,
            });
            format!(
                "{}{}{}{}{}{}",
                &caps[1], rule.selector, &caps[3], content_prefix, rule.content, suffix
            )
        })
        .into_owned()
}

/// Replaces the content of every top-level `{...}` block with a
/// placeholder, returning the blocks in order. Empty blocks count too.
fn escape_blocks(input: &str) -> (String, Vec<String>) {
    let mut result = String::new();
    let mut blocks = Vec::new();
    let mut current_block: Option<String> = None;
    let mut depth = 0usize;
    let mut push_part = |part: &str, depth: usize, result: &mut String, current_block: &mut Option<String>| {
        if depth > 0 {
            current_block.get_or_insert_with(String::new).push_str(part);
        } else {
            if let Some(block) = current_block.take() {
                blocks.push(block);
                result.push_str(BLOCK_PLACEHOLDER);
            }
            result.push_str(part);
        }
    };
    let mut last = 0;
    for m in CURLY_RE.find_iter(input) {
        push_part(&input[last..m.start()], depth, &mut result, &mut current_block);
        let curly = m.as_str();
        if curly == "}" {
            depth = depth.saturating_sub(1);
        }
        push_part(curly, depth, &mut result, &mut current_block);
        if curly == "{" {
            depth += 1;
        }
        last = m.end();
    }
    push_part(&input[last..], depth, &mut result, &mut current_block);
    if let Some(block) = current_block {
        blocks.push(block);
        result.push_str(BLOCK_PLACEHOLDER);
    }
    (result, blocks)
}
