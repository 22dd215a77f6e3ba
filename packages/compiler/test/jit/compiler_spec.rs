//! JIT Compiler Tests
//!
//! Runtime compilation with evaluators that record what they were given.

#[path = "../utils.rs"]
mod utils;

use angular_view_compiler::aot::{InMemoryMetadataHost, StaticSymbol};
use angular_view_compiler::config::CompilerConfig;
use angular_view_compiler::error::Result;
use angular_view_compiler::jit::{
    create_jit_compiler, JitCompiler, JitEvaluator, JitProgram, JitValue, ModuleBoundCompiler,
    SourceEvaluator,
};
use futures::executor::block_on;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use utils::{component, decorated, local, ng_module};

/// Renders programs like `SourceEvaluator` and keeps the runtime-only
/// values handed along with them.
#[derive(Default)]
struct RecordingEvaluator {
    source: SourceEvaluator,
    runtime_values: RefCell<Vec<(StaticSymbol, JitValue)>>,
}

impl JitEvaluator for RecordingEvaluator {
    fn evaluate(&self, source_url: &str, program: &JitProgram<'_>, result_var: &str) -> Result<JitValue> {
        self.runtime_values
            .borrow_mut()
            .extend(program.runtime_symbols.iter().cloned());
        self.source.evaluate(source_url, program, result_var)
    }
}

fn app_host() -> Rc<InMemoryMetadataHost> {
    let host = InMemoryMetadataHost::with_angular_core();
    host.add_module(
        "/app/app.ts",
        json!({
            "TreeComp": component("tree", "<template><leaf></leaf></template>"),
            "LeafComp": component("leaf", "<tree></tree>"),
            "AppModule": ng_module(json!({
                "declarations": [local("TreeComp"), local("LeafComp")],
                "bootstrap": [local("TreeComp")]
            })),
            "LazyComp": component("lazy", "lazy"),
            "LazyModule": ng_module(json!({
                "declarations": [local("LazyComp")],
                "entryComponents": [local("LazyComp")]
            }))
        }),
    );
    Rc::new(host)
}

fn compiler(evaluator: Rc<dyn JitEvaluator>) -> Rc<JitCompiler> {
    create_jit_compiler(app_host(), CompilerConfig::default(), evaluator).unwrap()
}

#[test]
fn should_compile_mutually_recursive_components() {
    let evaluator = Rc::new(SourceEvaluator::new());
    let compiler = compiler(evaluator.clone());
    let module = compiler.symbol("/app/app.ts", "AppModule");
    compiler.compile_module_sync(&module).unwrap();

    let tree = evaluator.program("/AppModule/TreeComp/component.ngfactory.js").unwrap();
    assert!(tree.source.contains("import * as i0 from 'ng:///runtime';"));
    assert!(tree.source.contains("i0.View_LeafComp0"));
    let leaf = evaluator.program("/AppModule/LeafComp/component.ngfactory.js").unwrap();
    assert!(leaf.source.contains("i0.View_TreeComp0"));
    assert!(evaluator.program("/AppModule/TreeComp/host.ngfactory.js").is_some());
}

#[test]
fn should_provide_a_compiler_bound_to_the_module() {
    let evaluator = Rc::new(RecordingEvaluator::default());
    let compiler = compiler(evaluator.clone());
    let module = compiler.symbol("/app/app.ts", "AppModule");
    compiler.compile_module_sync(&module).unwrap();

    let bound = {
        let values = evaluator.runtime_values.borrow();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].0.name(), "createCompiler");
        values[0]
            .1
            .downcast_ref::<ModuleBoundCompiler>()
            .cloned()
            .unwrap()
    };
    assert_eq!(bound.ng_module(), &module);

    let lazy = compiler.symbol("/app/app.ts", "LazyModule");
    let result = bound.compile_module_and_all_components_sync(&lazy).unwrap();
    assert_eq!(result.component_factories.len(), 1);

    drop(compiler);
    let err = bound.compile_module_sync(&lazy).unwrap_err();
    assert_eq!(err.to_string(), "Illegal state: the compiler of AppModule was dropped");
}

#[test]
fn should_recompile_types_after_clearing_their_cache() {
    let evaluator = Rc::new(SourceEvaluator::new());
    let compiler = compiler(evaluator.clone());
    let module = compiler.symbol("/app/app.ts", "LazyModule");
    let first = compiler.compile_module_sync(&module).unwrap();
    let programs = evaluator.programs().len();

    compiler.clear_cache_for(&module);
    let second = compiler.compile_module_sync(&module).unwrap();
    assert!(!first.ptr_eq(&second));
    // Only the module factory is evaluated again.
    assert_eq!(evaluator.programs().len(), programs + 1);
}

#[test]
fn should_evaluate_imported_stylesheets_before_their_importers() {
    let host = InMemoryMetadataHost::with_angular_core();
    host.add_module(
        "/app/styled.ts",
        json!({
            "StyledComp": decorated("Component", json!({
                "selector": "styled",
                "template": "<div></div>",
                "styleUrls": ["styled.css"]
            })),
            "StyledModule": ng_module(json!({"declarations": [local("StyledComp")]}))
        }),
    );
    host.add_resource("/app/styled.css", "@import 'base.css'; div {color: red;}");
    host.add_resource("/app/base.css", "span {}");
    let evaluator = Rc::new(SourceEvaluator::new());
    let compiler = create_jit_compiler(Rc::new(host), CompilerConfig::default(), evaluator.clone()).unwrap();
    let module = compiler.symbol("/app/styled.ts", "StyledModule");

    assert!(compiler.compile_module_sync(&module).is_err());
    block_on(compiler.compile_module_async(&module)).unwrap();

    let urls: Vec<String> = evaluator.programs().into_iter().map(|p| p.source_url).collect();
    let base = urls.iter().position(|u| u == "/app/base.css.ngstyle.js").unwrap();
    let styled = urls.iter().position(|u| u == "/app/styled.css.ngstyle.js").unwrap();
    let view = urls
        .iter()
        .position(|u| u == "/StyledModule/StyledComp/component.ngfactory.js")
        .unwrap();
    assert!(base < styled && styled < view);
    let view_source = evaluator
        .program("/StyledModule/StyledComp/component.ngfactory.js")
        .unwrap()
        .source;
    assert!(view_source.contains("i0.styles"));
}
