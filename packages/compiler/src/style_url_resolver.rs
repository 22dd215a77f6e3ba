//! Stylesheet url handling: which urls the compiler may load and the
//! extraction of `@import` rules from css text.

use crate::url_resolver::{resolve_url, url_schema};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static CSS_IMPORT_REGEXP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@import\s+(?:url\()?\s*(?:(?:['"]([^'"]*))|([^;\)\s]*))[^;]*;?"#).unwrap()
});
static CSS_COMMENT_REGEXP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.+?\*/").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct StyleWithImports {
    pub style: String,
    pub style_urls: Vec<String>,
}

/// Relative urls and the `package:`/`asset:` schemes are loadable; absolute
/// paths and every other scheme are left to the browser.
pub fn is_style_url_resolvable(url: Option<&str>) -> bool {
    match url {
        None | Some("") => false,
        Some(url) if url.starts_with('/') => false,
        Some(url) => match url_schema(url) {
            Some(schema) => schema == "package" || schema == "asset",
            None => true,
        },
    }
}

/// Removes resolvable `@import` rules from `css_text`, returning the
/// imported urls resolved against `base_url`.
pub fn extract_style_urls(base_url: Option<&str>, css_text: &str) -> StyleWithImports {
    let mut found_urls = Vec::new();
    let without_comments = CSS_COMMENT_REGEXP.replace_all(css_text, "");
    let style = CSS_IMPORT_REGEXP
        .replace_all(&without_comments, |caps: &Captures| {
            let url = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            if !is_style_url_resolvable(Some(url)) {
                // Not for us to load; the browser fetches it.
                return caps[0].to_string();
            }
            found_urls.push(resolve_url(base_url, url));
            String::new()
        })
        .into_owned();
    StyleWithImports {
        style,
        style_urls: found_urls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_only_resolve_relative_and_package_urls() {
        assert!(is_style_url_resolvable(Some("some/url.css")));
        assert!(is_style_url_resolvable(Some("package:a/b.css")));
        assert!(is_style_url_resolvable(Some("asset:a/b.css")));
        assert!(!is_style_url_resolvable(Some("/abs.css")));
        assert!(!is_style_url_resolvable(Some("http://a.com/b.css")));
        assert!(!is_style_url_resolvable(Some("")));
        assert!(!is_style_url_resolvable(None));
    }

    #[test]
    fn should_extract_imports_and_strip_them() {
        let css = "@import '1.css';\n@import url(\"2.css\");\ndiv {color: red}";
        let result = extract_style_urls(Some("/app/style.css"), css);
        assert_eq!(result.style_urls, vec!["/app/1.css", "/app/2.css"]);
        assert_eq!(result.style.trim(), "div {color: red}");
    }

    #[test]
    fn should_keep_imports_of_unresolvable_urls() {
        let css = "@import 'http://fonts.com/a.css';";
        let result = extract_style_urls(Some("/app/style.css"), css);
        assert!(result.style_urls.is_empty());
        assert_eq!(result.style, css);
    }

    #[test]
    fn should_ignore_imports_in_comments() {
        let css = "/* @import 'a.css'; */ p {}";
        let result = extract_style_urls(Some("/app/s.css"), css);
        assert!(result.style_urls.is_empty());
        assert_eq!(result.style.trim(), "p {}");
    }
}
