//! Metadata builders shared by the integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};

pub fn core_call(name: &str, args: Value) -> Value {
    json!({
        "__symbolic": "call",
        "expression": {"__symbolic": "reference", "module": "@angular/core", "name": name},
        "arguments": [args]
    })
}

/// Reference to a declaration of the same file.
pub fn local(name: &str) -> Value {
    json!({"__symbolic": "reference", "name": name})
}

/// Reference to an export of another module.
pub fn import(module: &str, name: &str) -> Value {
    json!({"__symbolic": "reference", "module": module, "name": name})
}

pub fn decorated(decorator: &str, args: Value) -> Value {
    json!({"__symbolic": "class", "decorators": [core_call(decorator, args)]})
}

pub fn component(selector: &str, template: &str) -> Value {
    decorated("Component", json!({"selector": selector, "template": template}))
}

pub fn ng_module(args: Value) -> Value {
    decorated("NgModule", args)
}
