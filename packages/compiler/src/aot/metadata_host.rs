//! In-memory compiler host.
//!
//! Holds metadata records, summaries and resources in maps. The JIT compiler
//! runs on it, and so do the tests. `with_angular_core` seeds the metadata of
//! the framework runtime so decorators, DI markers and runtime identifiers
//! resolve to the same symbols the compiler uses.

use super::compiler_host::AotCompilerHost;
use super::static_reflector::{
    StaticReflectorHost, ANIMATION_METADATA, CORE_DECORATORS, DI_DECORATORS, DI_OPAQUE_TOKEN,
};
use crate::error::{CompilerError, Result};
use crate::identifiers::{Identifiers, ANGULAR_CORE};
use crate::resource_loader::ResourceLoader;
use crate::url_resolver::{dirname, normalize_path};
use futures::future::{self, LocalBoxFuture};
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use std::cell::RefCell;
use std::collections::HashMap;

pub const NODE_MODULES: &str = "/node_modules/";

#[derive(Default)]
pub struct InMemoryMetadataHost {
    metadata: RefCell<HashMap<String, Vec<Value>>>,
    summaries: RefCell<HashMap<String, String>>,
    resources: RefCell<HashMap<String, String>>,
}

impl InMemoryMetadataHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host pre-populated with the framework runtime metadata.
    pub fn with_angular_core() -> Self {
        let host = Self::new();
        for (path, metadata) in angular_core_metadata() {
            host.add_metadata(&path, metadata);
        }
        host
    }

    pub fn add_metadata(&self, file_path: &str, metadata: Value) {
        self.metadata
            .borrow_mut()
            .entry(file_path.to_string())
            .or_default()
            .push(metadata);
    }

    /// Adds a version 2 module record declaring `declarations`.
    pub fn add_module(&self, file_path: &str, declarations: Value) {
        self.add_metadata(
            file_path,
            json!({"__symbolic": "module", "version": 2, "metadata": declarations}),
        );
    }

    pub fn add_summary(&self, file_path: &str, json: impl Into<String>) {
        self.summaries
            .borrow_mut()
            .insert(file_path.to_string(), json.into());
    }

    pub fn add_resource(&self, url: &str, content: impl Into<String>) {
        self.resources
            .borrow_mut()
            .insert(url.to_string(), content.into());
    }

    pub fn file_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.metadata.borrow().keys().cloned().collect();
        paths.sort();
        paths
    }

    fn first_known(&self, candidates: &[String]) -> Option<String> {
        let metadata = self.metadata.borrow();
        candidates.iter().find(|c| metadata.contains_key(*c)).cloned()
    }
}

fn with_extensions(base: &str) -> Vec<String> {
    if base.ends_with(".ts") {
        return vec![base.to_string()];
    }
    vec![
        format!("{}.ts", base),
        format!("{}.d.ts", base),
        format!("{}/index.ts", base),
        format!("{}/index.d.ts", base),
    ]
}

impl StaticReflectorHost for InMemoryMetadataHost {
    fn get_metadata_for(&self, file_path: &str) -> Option<Vec<Value>> {
        self.metadata.borrow().get(file_path).cloned()
    }

    fn module_name_to_file_name(&self, module_name: &str, containing_file: Option<&str>) -> Option<String> {
        let base = if module_name.starts_with('.') {
            let containing = containing_file?;
            normalize_path(&format!("{}/{}", dirname(containing), module_name))
        } else if module_name.starts_with('/') {
            normalize_path(module_name)
        } else {
            format!("{}{}", NODE_MODULES, module_name)
        };
        self.first_known(&with_extensions(&base))
    }
}

impl ResourceLoader for InMemoryMetadataHost {
    fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<String>> {
        let result = self
            .resources
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| CompilerError::ResourceLoad {
                url: url.to_string(),
                message: "not found".to_string(),
            });
        Box::pin(future::ready(result))
    }
}

impl AotCompilerHost for InMemoryMetadataHost {
    fn load_summary(&self, file_path: &str) -> Option<String> {
        self.summaries.borrow().get(file_path).cloned()
    }
}

fn core_file(module: &str) -> String {
    format!("{}{}.d.ts", NODE_MODULES, module)
}

fn module_record(declarations: Map<String, Value>, exports: Vec<Value>) -> Value {
    let mut record = json!({"__symbolic": "module", "version": 2, "metadata": declarations});
    if !exports.is_empty() {
        record["exports"] = Value::Array(exports);
    }
    record
}

fn opaque_token(description: &str) -> Value {
    json!({
        "__symbolic": "new",
        "expression": {"__symbolic": "reference", "module": DI_OPAQUE_TOKEN, "name": "OpaqueToken"},
        "arguments": [description]
    })
}

fn enum_values(members: &[&str]) -> Value {
    let mut map = Map::new();
    for (index, member) in members.iter().enumerate() {
        map.insert(member.to_string(), json!(index));
    }
    Value::Object(map)
}

/// Metadata of the framework runtime as `(file path, module record)` pairs,
/// with `@angular/core` re-exporting every file.
pub fn angular_core_metadata() -> Vec<(String, Value)> {
    let function = || json!({"__symbolic": "function"});
    let class = || json!({"__symbolic": "class"});
    let mut files: IndexMap<String, Map<String, Value>> = IndexMap::new();
    let mut declare = |module: &str, name: &str, value: Value| {
        files
            .entry(module.to_string())
            .or_default()
            .insert(name.to_string(), value);
    };

    for name in [
        "Component", "Directive", "Pipe", "NgModule", "Input", "Output", "HostBinding",
        "HostListener", "ContentChild", "ContentChildren", "ViewChild", "ViewChildren",
        "Attribute",
    ] {
        declare(CORE_DECORATORS, name, function());
    }
    for name in ["Injectable", "Inject", "Optional", "Self", "SkipSelf", "Host"] {
        declare(DI_DECORATORS, name, function());
    }
    declare(DI_OPAQUE_TOKEN, "OpaqueToken", class());
    for name in [
        "trigger", "state", "transition", "style", "animate", "keyframes", "sequence", "group",
    ] {
        declare(ANIMATION_METADATA, name, function());
    }
    declare(ANIMATION_METADATA, "AUTO_STYLE", json!("*"));
    declare(
        "@angular/core/src/metadata/ng_module",
        "CUSTOM_ELEMENTS_SCHEMA",
        json!({"name": crate::core::CUSTOM_ELEMENTS_SCHEMA_NAME}),
    );
    declare(
        "@angular/core/src/metadata/ng_module",
        "NO_ERRORS_SCHEMA",
        json!({"name": crate::core::NO_ERRORS_SCHEMA_NAME}),
    );

    for identifier in Identifiers::ALL {
        let value = match identifier.name {
            "ViewEncapsulation" => enum_values(&["Emulated", "Native", "None"]),
            "ChangeDetectionStrategy" => enum_values(&["OnPush", "Default"]),
            "ChangeDetectorStatus" => enum_values(&[
                "CheckOnce", "Checked", "CheckAlways", "Detached", "Errored", "Destroyed",
            ]),
            "ViewType" => enum_values(&["HOST", "COMPONENT", "EMBEDDED"]),
            "SecurityContext" => enum_values(&["NONE", "HTML", "STYLE", "SCRIPT", "URL", "RESOURCE_URL"]),
            "ANALYZE_FOR_ENTRY_COMPONENTS" => opaque_token("AnalyzeForEntryComponents"),
            "LOCALE_ID" => opaque_token("LocaleId"),
            "TRANSLATIONS_FORMAT" => opaque_token("TranslationsFormat"),
            name if name.starts_with(|c: char| c.is_ascii_lowercase()) => function(),
            _ => class(),
        };
        declare(identifier.module_url, identifier.name, value);
    }

    let mut result: Vec<(String, Value)> = Vec::new();
    let mut index_exports = Vec::new();
    for (module, declarations) in files {
        index_exports.push(json!({"from": module}));
        result.push((core_file(&module), module_record(declarations, Vec::new())));
    }
    result.push((
        format!("{}{}/index.d.ts", NODE_MODULES, ANGULAR_CORE),
        module_record(Map::new(), index_exports),
    ));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_and_package_specifiers() {
        let host = InMemoryMetadataHost::with_angular_core();
        host.add_module("/app/app.module.ts", json!({}));
        host.add_module("/app/app.component.ts", json!({}));
        assert_eq!(
            host.module_name_to_file_name("./app.component", Some("/app/app.module.ts")),
            Some("/app/app.component.ts".to_string())
        );
        assert_eq!(
            host.module_name_to_file_name("@angular/core", None),
            Some("/node_modules/@angular/core/index.d.ts".to_string())
        );
        assert_eq!(host.module_name_to_file_name("./missing", Some("/app/a.ts")), None);
    }

    #[test]
    fn core_index_reexports_every_file() {
        let files = angular_core_metadata();
        let (path, index) = files.last().unwrap();
        assert!(path.ends_with("@angular/core/index.d.ts"));
        assert_eq!(index["exports"].as_array().unwrap().len(), files.len() - 1);
    }

    #[test]
    fn generated_imports_use_package_names() {
        let host = InMemoryMetadataHost::new();
        assert_eq!(
            host.file_name_to_module_name(
                "/node_modules/@angular/core/src/linker/view.d.ts",
                "/app/a.ngfactory.js"
            ),
            "@angular/core/src/linker/view"
        );
        assert_eq!(
            host.file_name_to_module_name("/app/b.ts", "/app/a.ngfactory.js"),
            "./b"
        );
    }
}
