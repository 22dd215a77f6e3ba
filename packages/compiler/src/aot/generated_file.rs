//! Output unit of ahead-of-time compilation.

use crate::url_resolver::split_typescript_suffix;
use once_cell::sync::Lazy;
use regex::Regex;

static STRIP_SRC_FILE_SUFFIXES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\.ts|\.d\.ts|\.js|\.jsx|\.tsx)$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Source file the artifact was produced from.
    pub src_file_url: String,
    pub gen_file_url: String,
    pub source: String,
}

impl GeneratedFile {
    pub fn new(src_file_url: impl Into<String>, gen_file_url: impl Into<String>, source: impl Into<String>) -> Self {
        GeneratedFile {
            src_file_url: src_file_url.into(),
            gen_file_url: gen_file_url.into(),
            source: source.into(),
        }
    }
}

/// Extension of code generated for `path`. Generated sources are
/// JavaScript, so TypeScript inputs map to `.js`.
pub fn generated_code_suffix(path: &str) -> &str {
    match split_typescript_suffix(path).1 {
        ".ts" | ".tsx" => ".js",
        other => other,
    }
}

/// `a/b.ts` -> `a/b.ngfactory.js`
pub fn ngfactory_module_url(dir_url: &str) -> String {
    let (stem, _) = split_typescript_suffix(dir_url);
    format!("{}.ngfactory{}", stem, generated_code_suffix(dir_url))
}

/// `a/b.css` -> `a/b.css[.shim].ngstyle<suffix>`
pub fn styles_module_url(stylesheet_url: &str, shim: bool, suffix: &str) -> String {
    format!(
        "{}{}.ngstyle{}",
        stylesheet_url,
        if shim { ".shim" } else { "" },
        suffix
    )
}

/// `a/b.d.ts` -> `a/b.ngsummary.json`
pub fn summary_file_name(file_name: &str) -> String {
    format!(
        "{}.ngsummary.json",
        STRIP_SRC_FILE_SUFFIXES.replace(file_name, "")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_name_factory_files_after_the_source() {
        assert_eq!(ngfactory_module_url("/app/main.ts"), "/app/main.ngfactory.js");
        assert_eq!(
            ngfactory_module_url("/node_modules/lib/index.d.ts"),
            "/node_modules/lib/index.ngfactory.js"
        );
        assert_eq!(ngfactory_module_url("/app/main.js"), "/app/main.ngfactory.js");
        assert_eq!(ngfactory_module_url("/app/noext"), "/app/noext.ngfactory");
    }

    #[test]
    fn should_emit_javascript_for_typescript_sources() {
        assert_eq!(generated_code_suffix("/app/a.ts"), ".js");
        assert_eq!(generated_code_suffix("/lib/a.d.ts"), ".js");
        assert_eq!(generated_code_suffix("/app/a.tsx"), ".js");
        assert_eq!(generated_code_suffix("/app/a.js"), ".js");
        assert_eq!(generated_code_suffix("/app/noext"), "");
    }

    #[test]
    fn should_name_style_files_with_optional_shim() {
        assert_eq!(styles_module_url("/app/a.css", true, ".js"), "/app/a.css.shim.ngstyle.js");
        assert_eq!(styles_module_url("/app/a.css", false, ".js"), "/app/a.css.ngstyle.js");
    }

    #[test]
    fn should_strip_source_suffixes_for_summaries() {
        assert_eq!(summary_file_name("/lib/a.d.ts"), "/lib/a.ngsummary.json");
        assert_eq!(summary_file_name("/app/a.ts"), "/app/a.ngsummary.json");
        assert_eq!(summary_file_name("/app/a.jsx"), "/app/a.ngsummary.json");
    }
}
