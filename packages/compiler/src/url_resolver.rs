//! URL and module path resolution.

use once_cell::sync::Lazy;
use regex::Regex;

static URL_WITH_SCHEMA: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([a-zA-Z][a-zA-Z0-9+.-]*):").unwrap());

pub fn url_schema(url: &str) -> Option<&str> {
    URL_WITH_SCHEMA
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Resolves `url` against `base_url` the way a browser resolves a relative
/// link: absolute and schema-qualified urls win, everything else is joined
/// to the directory of the base and normalized.
pub fn resolve_url(base_url: Option<&str>, url: &str) -> String {
    if url.starts_with('/') || url_schema(url).is_some() {
        return normalize_path(url);
    }
    match base_url {
        None | Some("") => normalize_path(url),
        Some(base) => {
            let (prefix, base_path) = match url_schema(base) {
                Some(schema) => (format!("{}:", schema), &base[schema.len() + 1..]),
                None => (String::new(), base),
            };
            let dir = match base_path.rfind('/') {
                Some(index) => &base_path[..=index],
                None => "",
            };
            format!("{}{}", prefix, normalize_path(&format!("{}{}", dir, url)))
        }
    }
}

/// Collapses `.` and `..` segments, keeping a leading `/`.
pub fn normalize_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().map_or(false, |last| *last != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }
    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(index) => &path[..index],
        None => ".",
    }
}

/// Relative module specifier from `containing_file` to `imported_file`,
/// without the TypeScript extension: `./foo`, `../lib/bar`.
pub fn relative_module_name(containing_file: &str, imported_file: &str) -> String {
    let from: Vec<&str> = dirname(containing_file).split('/').filter(|s| !s.is_empty()).collect();
    let to_path = strip_module_extension(imported_file);
    let to: Vec<&str> = to_path.split('/').filter(|s| !s.is_empty()).collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut parts: Vec<String> = Vec::new();
    for _ in common..from.len() {
        parts.push("..".to_string());
    }
    parts.extend(to[common..].iter().map(|s| s.to_string()));
    let relative = parts.join("/");
    if relative.starts_with("..") {
        relative
    } else {
        format!("./{}", relative)
    }
}

/// Splits `foo.d.ts` / `foo.ts` / `foo.js` into the base and the suffix the
/// generated files use (`.d.ts` maps to `.ts`).
pub fn split_typescript_suffix(path: &str) -> (&str, &str) {
    if let Some(base) = path.strip_suffix(".d.ts") {
        return (base, ".ts");
    }
    match path.rfind('.') {
        Some(dot) if !path[dot..].contains('/') => (&path[..dot], &path[dot..]),
        _ => (path, ""),
    }
}

/// Drops the `.d.ts`, `.ts` or `.js` extension of a module file.
pub fn strip_module_extension(path: &str) -> &str {
    path.strip_suffix(".d.ts")
        .or_else(|| path.strip_suffix(".ts"))
        .or_else(|| path.strip_suffix(".js"))
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_to_base_directory() {
        assert_eq!(resolve_url(Some("/app/comp.ts"), "./comp.html"), "/app/comp.html");
        assert_eq!(resolve_url(Some("/app/a/comp.ts"), "../b.css"), "/app/b.css");
        assert_eq!(resolve_url(Some("/app/comp.ts"), "/abs.css"), "/abs.css");
        assert_eq!(
            resolve_url(Some("package:app/comp.ts"), "comp.html"),
            "package:app/comp.html"
        );
    }

    #[test]
    fn computes_relative_module_names() {
        assert_eq!(relative_module_name("/app/a.ts", "/app/b.ts"), "./b");
        assert_eq!(
            relative_module_name("/app/sub/a.ts", "/lib/view.d.ts"),
            "../../lib/view"
        );
        assert_eq!(
            relative_module_name("/app/app.ngfactory.js", "/app/hero.ngfactory.js"),
            "./hero.ngfactory"
        );
    }

    #[test]
    fn splits_typescript_suffixes() {
        assert_eq!(split_typescript_suffix("/a/b.d.ts"), ("/a/b", ".ts"));
        assert_eq!(split_typescript_suffix("/a/b.ts"), ("/a/b", ".ts"));
        assert_eq!(split_typescript_suffix("/a.dir/b"), ("/a.dir/b", ""));
    }
}
