//! ngc Tests
//!
//! Runs the command line driver against projects laid out in temp dirs.

use angular_view_compiler::aot::metadata_host::angular_core_metadata;
use angular_view_compiler_cli::main_entry::main_fn;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

fn core_call(name: &str, args: Value) -> Value {
    json!({
        "__symbolic": "call",
        "expression": {"__symbolic": "reference", "module": "@angular/core", "name": name},
        "arguments": [args]
    })
}

fn local(name: &str) -> Value {
    json!({"__symbolic": "reference", "name": name})
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Lays out `@angular/core` metadata plus `src/app.metadata.json`.
fn project(app_declarations: Value, angular_options: Value) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    for (path, metadata) in angular_core_metadata() {
        let stem = path.trim_start_matches('/').trim_end_matches(".d.ts");
        write(&root.join(format!("{}.metadata.json", stem)), &metadata.to_string());
    }
    write(
        &root.join("src/app.metadata.json"),
        &json!({"__symbolic": "module", "version": 2, "metadata": app_declarations}).to_string(),
    );
    write(
        &root.join("tsconfig.json"),
        &json!({"angularCompilerOptions": angular_options}).to_string(),
    );
    (dir, root)
}

fn app_declarations() -> Value {
    json!({
        "AppComponent": {
            "__symbolic": "class",
            "decorators": [core_call("Component", json!({"selector": "app-root", "template": "<h1>{{title}}</h1>"}))]
        },
        "AppModule": {
            "__symbolic": "class",
            "decorators": [core_call("NgModule", json!({
                "declarations": [local("AppComponent")],
                "bootstrap": [local("AppComponent")]
            }))]
        }
    })
}

fn ngc(args: &[&str]) -> i32 {
    let mut argv = vec!["ngc"];
    argv.extend_from_slice(args);
    main_fn(argv)
}

#[test]
fn should_write_factories_and_summaries_to_the_gen_dir() {
    let (_dir, root) = project(app_declarations(), json!({"genDir": "gen"}));
    let code = ngc(&["-p", root.join("tsconfig.json").to_str().unwrap()]);
    assert_eq!(code, 0);

    let factory = fs::read_to_string(root.join("gen/src/app.ngfactory.js")).unwrap();
    assert!(factory.contains("export const AppModuleNgFactory = new "));
    assert!(factory.contains("export const AppComponentNgFactory = new "));
    assert!(factory.contains("from '@angular/core/src/linker/"));
    assert!(root.join("gen/src/app.ngsummary.json").is_file());
}

#[test]
fn should_only_write_summaries_when_requested() {
    let (_dir, root) = project(app_declarations(), json!({}));
    let gen = root.join("out");
    let code = ngc(&[
        "-p",
        root.to_str().unwrap(),
        "--gen-dir",
        gen.to_str().unwrap(),
        "--summaries-only",
    ]);
    assert_eq!(code, 0);
    assert!(gen.join("src/app.ngsummary.json").is_file());
    assert!(!gen.join("src/app.ngfactory.js").exists());
}

#[test]
fn should_fail_on_invalid_module_declarations() {
    let mut declarations = app_declarations();
    declarations["Helper"] = json!({"__symbolic": "class"});
    declarations["AppModule"]["decorators"][0]["arguments"][0]["declarations"] =
        json!([local("AppComponent"), local("Helper")]);
    let (_dir, root) = project(declarations, json!({"genDir": "gen"}));
    let code = ngc(&["-p", root.to_str().unwrap()]);
    assert_eq!(code, 1);
    assert!(!root.join("gen/src/app.ngfactory.js").exists());
}

#[test]
fn should_reject_jit_mode() {
    let (_dir, root) = project(app_declarations(), json!({}));
    assert_eq!(ngc(&["-p", root.to_str().unwrap(), "--jit-mode"]), 1);
}
