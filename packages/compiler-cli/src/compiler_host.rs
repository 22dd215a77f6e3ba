//! Compiler Host
//!
//! On-disk `AotCompilerHost`. Every source file `a/b.ts` (or `a/b.d.ts`) is
//! represented by the metadata file `a/b.metadata.json` next to it; bare
//! module specifiers resolve under `<basePath>/node_modules`.

use angular_view_compiler::aot::AotCompilerHost;
use angular_view_compiler::aot::StaticReflectorHost;
use angular_view_compiler::error::{CompilerError, Result};
use angular_view_compiler::resource_loader::ResourceLoader;
use futures::future::{self, LocalBoxFuture};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const METADATA_SUFFIX: &str = ".metadata.json";

/// `a/b.ts` or `a/b.d.ts` -> `a/b.metadata.json`
pub fn metadata_file_name(file_path: &str) -> String {
    let stem = file_path
        .strip_suffix(".d.ts")
        .or_else(|| file_path.strip_suffix(".ts"))
        .unwrap_or(file_path);
    format!("{}{}", stem, METADATA_SUFFIX)
}

/// `a/b.metadata.json` -> `a/b.ts`
pub fn source_file_name(metadata_path: &str) -> Option<String> {
    metadata_path
        .strip_suffix(METADATA_SUFFIX)
        .map(|stem| format!("{}.ts", stem))
}

pub struct NodeCompilerHost {
    base_path: PathBuf,
    metadata_cache: RefCell<HashMap<String, Option<Vec<Value>>>>,
}

impl NodeCompilerHost {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        NodeCompilerHost {
            base_path: base_path.into(),
            metadata_cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn read_metadata(&self, file_path: &str) -> Option<Vec<Value>> {
        let metadata_path = metadata_file_name(file_path);
        let content = fs::read_to_string(&metadata_path).ok()?;
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Array(records)) => Some(records),
            Ok(record) => Some(vec![record]),
            Err(err) => {
                tracing::warn!(file = %metadata_path, error = %err, "ignoring malformed metadata");
                None
            }
        }
    }

    fn has_metadata(&self, file_path: &str) -> bool {
        Path::new(&metadata_file_name(file_path)).is_file()
    }
}

fn normalize(path: &Path) -> String {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component.as_os_str().to_string_lossy().as_ref() {
            "/" | "." => {}
            ".." => {
                parts.pop();
            }
            part => parts.push(part.to_string()),
        }
    }
    format!("/{}", parts.join("/"))
}

impl StaticReflectorHost for NodeCompilerHost {
    fn get_metadata_for(&self, file_path: &str) -> Option<Vec<Value>> {
        if let Some(cached) = self.metadata_cache.borrow().get(file_path) {
            return cached.clone();
        }
        let metadata = self.read_metadata(file_path);
        self.metadata_cache
            .borrow_mut()
            .insert(file_path.to_string(), metadata.clone());
        metadata
    }

    fn module_name_to_file_name(&self, module_name: &str, containing_file: Option<&str>) -> Option<String> {
        let base = if module_name.starts_with('.') {
            let containing_dir = Path::new(containing_file?).parent()?.to_path_buf();
            normalize(&containing_dir.join(module_name))
        } else if module_name.starts_with('/') {
            normalize(Path::new(module_name))
        } else {
            normalize(&self.base_path.join("node_modules").join(module_name))
        };
        [
            format!("{}.ts", base),
            format!("{}.d.ts", base),
            format!("{}/index.ts", base),
            format!("{}/index.d.ts", base),
        ]
        .into_iter()
        .find(|candidate| self.has_metadata(candidate))
    }
}

impl ResourceLoader for NodeCompilerHost {
    fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<String>> {
        let result = fs::read_to_string(url).map_err(|err| CompilerError::ResourceLoad {
            url: url.to_string(),
            message: err.to_string(),
        });
        Box::pin(future::ready(result))
    }
}

impl AotCompilerHost for NodeCompilerHost {
    fn load_summary(&self, file_path: &str) -> Option<String> {
        fs::read_to_string(file_path).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_map_source_files_to_metadata_files() {
        assert_eq!(metadata_file_name("/app/main.ts"), "/app/main.metadata.json");
        assert_eq!(metadata_file_name("/lib/index.d.ts"), "/lib/index.metadata.json");
        assert_eq!(source_file_name("/app/main.metadata.json").as_deref(), Some("/app/main.ts"));
        assert_eq!(source_file_name("/app/main.ts"), None);
    }

    #[test]
    fn should_resolve_modules_through_metadata_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("app")).unwrap();
        fs::create_dir_all(root.join("node_modules/lib")).unwrap();
        fs::write(root.join("app/util.metadata.json"), "{}").unwrap();
        fs::write(root.join("node_modules/lib/index.metadata.json"), "[{}]").unwrap();

        let host = NodeCompilerHost::new(root);
        let root_str = root.to_string_lossy().to_string();
        let main = format!("{}/app/main.ts", root_str);
        assert_eq!(
            host.module_name_to_file_name("./util", Some(&main)),
            Some(format!("{}/app/util.ts", root_str))
        );
        assert_eq!(
            host.module_name_to_file_name("lib", None),
            Some(format!("{}/node_modules/lib/index.ts", root_str))
        );
        assert_eq!(host.module_name_to_file_name("./missing", Some(&main)), None);
    }

    #[test]
    fn should_read_single_and_multiple_metadata_records() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.metadata.json");
        fs::write(&file, json!({"__symbolic": "module", "version": 2}).to_string()).unwrap();
        let host = NodeCompilerHost::new(dir.path());
        let path = dir.path().join("a.ts").to_string_lossy().to_string();
        assert_eq!(host.get_metadata_for(&path).map(|m| m.len()), Some(1));
        assert_eq!(host.get_metadata_for(&dir.path().join("b.ts").to_string_lossy()), None);
    }
}
