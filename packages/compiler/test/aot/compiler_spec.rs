//! AOT Compiler Tests
//!
//! Whole-program compilation over an in-memory metadata host.

#[path = "../utils.rs"]
mod utils;

use angular_view_compiler::aot::{create_aot_compiler, AotCompilerOptions, GeneratedFile, InMemoryMetadataHost};
use angular_view_compiler::error::{CollectedErrors, ErrorCollector};
use futures::executor::block_on;
use pretty_assertions::assert_eq;
use regex::Regex;
use serde_json::json;
use std::rc::Rc;
use utils::{component, import, local, ng_module};

fn find<'a>(files: &'a [GeneratedFile], url: &str) -> &'a GeneratedFile {
    files
        .iter()
        .find(|f| f.gen_file_url == url)
        .unwrap_or_else(|| panic!("{} was not generated", url))
}

fn gen_urls(files: &[GeneratedFile]) -> Vec<&str> {
    let mut urls: Vec<&str> = files.iter().map(|f| f.gen_file_url.as_str()).collect();
    urls.sort();
    urls
}

/// A library with one exported component, compiled as its own program.
fn add_library(host: &InMemoryMetadataHost) {
    host.add_module(
        "/lib/lib.ts",
        json!({
            "LibComp": component("lib-comp", "<ng-content></ng-content>"),
            "LibModule": ng_module(json!({
                "declarations": [local("LibComp")],
                "exports": [local("LibComp")]
            }))
        }),
    );
}

#[test]
fn should_compile_components_next_to_their_source_files() {
    let host = InMemoryMetadataHost::with_angular_core();
    host.add_module(
        "/app/hero.ts",
        json!({"HeroComponent": component("hero", "<span>hero</span>")}),
    );
    host.add_module(
        "/app/app.module.ts",
        json!({
            "AppModule": ng_module(json!({
                "declarations": [import("./hero", "HeroComponent")],
                "bootstrap": [import("./hero", "HeroComponent")]
            }))
        }),
    );
    let compiler = create_aot_compiler(Rc::new(host), AotCompilerOptions::default(), None).unwrap();
    let files = compiler
        .compile_all_sync(&["/app/hero.ts".to_string(), "/app/app.module.ts".to_string()])
        .unwrap();

    assert_eq!(
        gen_urls(&files),
        vec![
            "/app/app.module.ngfactory.js",
            "/app/app.module.ngsummary.json",
            "/app/hero.ngfactory.js",
            "/app/hero.ngsummary.json",
        ]
    );
    let hero = find(&files, "/app/hero.ngfactory.js");
    assert!(hero.source.contains("export class View_HeroComponent0 "));
    assert!(hero.source.contains("export const HeroComponentNgFactory = new "));
    assert!(hero.source.contains("from './hero';"));

    let module = find(&files, "/app/app.module.ngfactory.js");
    assert!(module.source.contains("export const AppModuleNgFactory = new "));
    assert!(module.source.contains("from './hero.ngfactory';"));
    assert!(module.source.contains(".HeroComponentNgFactory"));
}

#[test]
fn should_use_library_summaries_instead_of_library_sources() {
    let lib_host = InMemoryMetadataHost::with_angular_core();
    add_library(&lib_host);
    let lib_compiler = create_aot_compiler(Rc::new(lib_host), AotCompilerOptions::default(), None).unwrap();
    let lib_files = lib_compiler.compile_all_sync(&["/lib/lib.ts".to_string()]).unwrap();
    let lib_summary = find(&lib_files, "/lib/lib.ngsummary.json").source.clone();

    let host = InMemoryMetadataHost::with_angular_core();
    add_library(&host);
    host.add_summary("/lib/lib.ngsummary.json", lib_summary);
    host.add_module(
        "/app/app.ts",
        json!({
            "AppComponent": component("app-root", "<lib-comp>content</lib-comp>"),
            "AppModule": ng_module(json!({
                "imports": [import("../lib/lib", "LibModule")],
                "declarations": [local("AppComponent")],
                "bootstrap": [local("AppComponent")]
            }))
        }),
    );
    let options = AotCompilerOptions {
        exclude_file_pattern: Some(Regex::new(r"^/lib/").unwrap()),
        ..Default::default()
    };
    let compiler = create_aot_compiler(Rc::new(host), options, None).unwrap();
    let files = compiler.compile_all_sync(&["/app/app.ts".to_string()]).unwrap();

    let factory = find(&files, "/app/app.ngfactory.js");
    assert!(factory.source.contains("from '../lib/lib.ngfactory';"));
    assert!(factory.source.contains(".View_LibComp0("));
    assert!(factory.source.contains(".Wrapper_LibComp("));
    assert!(!gen_urls(&files).contains(&"/lib/lib.ngfactory.js"));
}

#[test]
fn should_fail_when_library_summaries_are_missing() {
    let host = InMemoryMetadataHost::with_angular_core();
    add_library(&host);
    host.add_module(
        "/app/app.ts",
        json!({
            "AppModule": ng_module(json!({"imports": [import("../lib/lib", "LibModule")]}))
        }),
    );
    let options = AotCompilerOptions {
        exclude_file_pattern: Some(Regex::new(r"^/lib/").unwrap()),
        ..Default::default()
    };
    let compiler = create_aot_compiler(Rc::new(host), options, None).unwrap();
    assert!(compiler.compile_all_sync(&["/app/app.ts".to_string()]).is_err());
}

#[test]
fn should_require_async_compilation_for_external_templates() {
    let host = InMemoryMetadataHost::with_angular_core();
    host.add_module(
        "/app/app.ts",
        json!({
            "AppComponent": utils::decorated("Component", json!({"selector": "app-root", "templateUrl": "app.html"})),
            "AppModule": ng_module(json!({"declarations": [local("AppComponent")]}))
        }),
    );
    host.add_resource("/app/app.html", "<b>bold</b>");
    let compiler = create_aot_compiler(Rc::new(host), AotCompilerOptions::default(), None).unwrap();
    let root_files = vec!["/app/app.ts".to_string()];

    let err = compiler.compile_all_sync(&root_files).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Can't compile synchronously as AppComponent is still being loaded!"
    );
    let files = block_on(compiler.compile_all_async(&root_files)).unwrap();
    assert!(find(&files, "/app/app.ngfactory.js").source.contains("'bold'"));
}

#[test]
fn should_collect_metadata_errors() {
    let host = InMemoryMetadataHost::with_angular_core();
    host.add_module(
        "/app/app.ts",
        json!({
            "Plain": {"__symbolic": "class"},
            "AppModule": ng_module(json!({"declarations": [local("Plain")]}))
        }),
    );
    let errors = Rc::new(CollectedErrors::new());
    let collector: Rc<dyn ErrorCollector> = errors.clone();
    let compiler = create_aot_compiler(Rc::new(host), AotCompilerOptions::default(), Some(collector)).unwrap();
    let _ = compiler.compile_all_sync(&["/app/app.ts".to_string()]);
    assert!(errors
        .messages()
        .contains(&"Unexpected value 'Plain' declared by the module 'AppModule'".to_string()));
}
