//! DOM Security Schema
//!
//! Maps `element|property` pairs to the sanitization context the runtime
//! applies when a binding writes to them. Keys are lower case; `*` matches
//! any element.

use crate::core::SecurityContext;
use once_cell::sync::Lazy;
use std::collections::HashMap;

static SECURITY_SCHEMA: Lazy<HashMap<&'static str, SecurityContext>> = Lazy::new(|| {
    let mut schema = HashMap::new();
    let mut register = |ctx: SecurityContext, specs: &[&'static str]| {
        for spec in specs {
            schema.insert(*spec, ctx);
        }
    };

    register(
        SecurityContext::Html,
        &["iframe|srcdoc", "*|innerhtml", "*|outerhtml"],
    );
    register(SecurityContext::Style, &["*|style"]);
    register(
        SecurityContext::Url,
        &[
            "*|formaction",
            "area|href",
            "area|ping",
            "audio|src",
            "a|href",
            "a|ping",
            "blockquote|cite",
            "body|background",
            "del|cite",
            "form|action",
            "img|src",
            "img|srcset",
            "input|src",
            "ins|cite",
            "q|cite",
            "source|src",
            "source|srcset",
            "track|src",
            "video|poster",
            "video|src",
        ],
    );
    register(
        SecurityContext::ResourceUrl,
        &[
            "applet|code",
            "applet|codebase",
            "base|href",
            "embed|src",
            "frame|src",
            "head|profile",
            "html|manifest",
            "iframe|src",
            "link|href",
            "media|src",
            "object|codebase",
            "object|data",
            "script|src",
        ],
    );
    schema
});

/// Looks up `tag|prop`, falling back to the `*|prop` wildcard entry.
pub fn lookup_security_context(tag_name: &str, prop_name: &str) -> SecurityContext {
    let tag = tag_name.to_lowercase();
    let prop = prop_name.to_lowercase();
    SECURITY_SCHEMA
        .get(format!("{}|{}", tag, prop).as_str())
        .or_else(|| SECURITY_SCHEMA.get(format!("*|{}", prop).as_str()))
        .copied()
        .unwrap_or(SecurityContext::None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_resolve_element_specific_contexts() {
        assert_eq!(lookup_security_context("a", "href"), SecurityContext::Url);
        assert_eq!(lookup_security_context("IFRAME", "src"), SecurityContext::ResourceUrl);
        assert_eq!(lookup_security_context("div", "href"), SecurityContext::None);
    }

    #[test]
    fn should_fall_back_to_wildcard_entries() {
        assert_eq!(lookup_security_context("div", "innerHTML"), SecurityContext::Html);
        assert_eq!(lookup_security_context("span", "style"), SecurityContext::Style);
    }
}
