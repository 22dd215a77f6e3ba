//! Evaluation of compiled programs at runtime.
//!
//! The JIT compiler never runs generated code itself. It hands each program
//! to a `JitEvaluator`, which turns it into a live value (a view class, a
//! wrapper class, a module factory or a styles array).

use crate::aot::static_symbol::StaticSymbol;
use crate::error::{CompilerError, Result};
use crate::output::js_emitter::{ImportResolver, JavaScriptEmitter};
use crate::output::output_ast::{RuntimeValue, Statement};
use crate::url_resolver::relative_module_name;
use once_cell::unsync::OnceCell;
use std::cell::RefCell;
use std::rc::Rc;

pub type JitValue = RuntimeValue;

/// A statement program plus the in-memory values of symbols it imports
/// that exist only at runtime. Factory symbols map to the value the factory
/// returns.
pub struct JitProgram<'a> {
    pub statements: &'a [Statement],
    pub runtime_symbols: Vec<(StaticSymbol, JitValue)>,
}

impl<'a> JitProgram<'a> {
    pub fn new(statements: &'a [Statement]) -> Self {
        JitProgram {
            statements,
            runtime_symbols: Vec::new(),
        }
    }

    pub fn with_runtime_symbol(mut self, symbol: StaticSymbol, value: JitValue) -> Self {
        self.runtime_symbols.push((symbol, value));
        self
    }
}

pub trait JitEvaluator {
    /// Evaluates `program` as the module at `source_url` and returns the
    /// value of its `result_var` declaration.
    fn evaluate(&self, source_url: &str, program: &JitProgram<'_>, result_var: &str) -> Result<JitValue>;
}

/// Stand-in for a compiled class that may not exist yet. Evaluated code
/// holds the proxy; calls go to the real class once it is set.
#[derive(Clone)]
pub struct ProxyClass {
    name: Rc<str>,
    delegate: Rc<OnceCell<JitValue>>,
}

impl ProxyClass {
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        ProxyClass {
            name: name.into(),
            delegate: Rc::new(OnceCell::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_set(&self) -> bool {
        self.delegate.get().is_some()
    }

    pub fn set_delegate(&self, value: JitValue) -> Result<()> {
        self.delegate.set(value).map_err(|_| {
            CompilerError::illegal_state(format!("Illegal state: {} is already compiled", self.name))
        })
    }

    /// The real class, or an error when it is invoked before compilation.
    pub fn delegate(&self) -> Result<JitValue> {
        self.delegate.get().cloned().ok_or_else(|| {
            CompilerError::illegal_state(format!(
                "Illegal state: CompiledTemplate for {} is not compiled yet!",
                self.name
            ))
        })
    }
}

/// Follows proxies to the value that should actually be invoked.
pub fn resolve_runtime_value(value: &JitValue) -> Result<JitValue> {
    match value.downcast_ref::<ProxyClass>() {
        Some(proxy) => resolve_runtime_value(&proxy.delegate()?),
        None => Ok(value.clone()),
    }
}

/// A program rendered to ES module text, as produced by `SourceEvaluator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedProgram {
    pub source_url: String,
    pub source: String,
    pub result_var: String,
}

/// Evaluator that renders every program to source text and returns it.
/// Runtime references print as members of the `ng:///runtime` module.
/// Hosts embedding a script engine load the text; tests inspect it.
#[derive(Default)]
pub struct SourceEvaluator {
    programs: RefCell<Vec<EmittedProgram>>,
}

const RUNTIME_MODULE: &str = "ng:///runtime";

struct JitImports;

impl ImportResolver for JitImports {
    fn file_name_to_module_name(&self, imported_file_path: &str, containing_file_path: &str) -> String {
        if imported_file_path.starts_with("ng:") || !imported_file_path.starts_with('/') {
            return imported_file_path.to_string();
        }
        relative_module_name(containing_file_path, imported_file_path)
    }
}

impl SourceEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every program evaluated so far, in order.
    pub fn programs(&self) -> Vec<EmittedProgram> {
        self.programs.borrow().clone()
    }

    pub fn program(&self, source_url: &str) -> Option<EmittedProgram> {
        self.programs
            .borrow()
            .iter()
            .find(|p| p.source_url == source_url)
            .cloned()
    }
}

impl JitEvaluator for SourceEvaluator {
    fn evaluate(&self, source_url: &str, program: &JitProgram<'_>, result_var: &str) -> Result<JitValue> {
        let source = JavaScriptEmitter::new(Rc::new(JitImports))
            .with_runtime_module(RUNTIME_MODULE)
            .emit_statements(source_url, program.statements, &[result_var.to_string()])?;
        tracing::trace!(url = %source_url, result = %result_var, "evaluated program");
        let emitted = EmittedProgram {
            source_url: source_url.to_string(),
            source,
            result_var: result_var.to_string(),
        };
        self.programs.borrow_mut().push(emitted.clone());
        Ok(RuntimeValue::new(emitted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::output_ast::{self as o, ResolvedReference};

    #[test]
    fn should_fail_when_a_proxy_is_used_before_compilation() {
        let proxy = ProxyClass::new("MyComp");
        let value = RuntimeValue::new(proxy.clone());
        let err = resolve_runtime_value(&value).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Illegal state: CompiledTemplate for MyComp is not compiled yet!"
        );

        proxy.set_delegate(RuntimeValue::new(42_i32)).unwrap();
        let resolved = resolve_runtime_value(&value).unwrap();
        assert_eq!(resolved.downcast_ref::<i32>(), Some(&42));
        assert!(proxy.set_delegate(RuntimeValue::new(1_i32)).is_err());
    }

    #[test]
    fn should_emit_runtime_references_as_runtime_imports() {
        let placeholder = o::Placeholder::new("View_Child0");
        placeholder
            .resolve(ResolvedReference::Runtime(RuntimeValue::new(ProxyClass::new("Child"))))
            .unwrap();
        let statements = vec![o::placeholder_expr(&placeholder)
            .instantiate(vec![])
            .to_decl_stmt("view", true)];
        let evaluator = SourceEvaluator::new();
        let value = evaluator
            .evaluate("/AppModule/Comp/component.ngfactory.js", &JitProgram::new(&statements), "view")
            .unwrap();

        let emitted = value.downcast_ref::<EmittedProgram>().unwrap();
        assert_eq!(
            emitted.source,
            "import * as i0 from 'ng:///runtime';\nexport const view = new i0.View_Child0();"
        );
        assert_eq!(evaluator.programs().len(), 1);
    }
}
