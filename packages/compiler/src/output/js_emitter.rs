//! JavaScript emitter
//!
//! Prints a program as an ES module. Every referenced file gets one
//! `import * as iN from '...'` line; the module specifier comes from the
//! `ImportResolver`.

use super::abstract_emitter::{
    escape_identifier, escape_single_quote_string, EmitterVisitorContext, CATCH_ERROR_VAR,
    CATCH_STACK_VAR,
};
use super::output_ast as o;
use crate::aot::static_value::format_number;
use crate::error::{CompilerError, Result};
use indexmap::IndexMap;
use std::rc::Rc;

pub trait ImportResolver {
    /// Module specifier `containing_file_path` uses to import `imported_file_path`.
    fn file_name_to_module_name(&self, imported_file_path: &str, containing_file_path: &str) -> String;
}

pub struct JavaScriptEmitter {
    import_resolver: Rc<dyn ImportResolver>,
    runtime_module: Option<String>,
}

impl JavaScriptEmitter {
    pub fn new(import_resolver: Rc<dyn ImportResolver>) -> Self {
        JavaScriptEmitter {
            import_resolver,
            runtime_module: None,
        }
    }

    /// Prints placeholders patched with runtime values as members of
    /// `module_url` instead of failing.
    pub fn with_runtime_module(mut self, module_url: impl Into<String>) -> Self {
        self.runtime_module = Some(module_url.into());
        self
    }

    pub fn emit_statements(
        &self,
        module_url: &str,
        stmts: &[o::Statement],
        exported_vars: &[String],
    ) -> Result<String> {
        let mut converter = JsEmitterVisitor::new(module_url, self.runtime_module.as_deref());
        let mut ctx = EmitterVisitorContext::create_root(exported_vars);
        converter.visit_all_statements(stmts, &mut ctx)?;
        let mut src_parts: Vec<String> = converter
            .imports_with_prefixes
            .iter()
            .map(|(imported_module_url, prefix)| {
                format!(
                    "import * as {} from '{}';",
                    prefix,
                    self.import_resolver
                        .file_name_to_module_name(imported_module_url, module_url)
                )
            })
            .collect();
        src_parts.push(ctx.to_source());
        Ok(src_parts.join("\n"))
    }
}

struct JsEmitterVisitor<'a> {
    module_url: &'a str,
    runtime_module: Option<&'a str>,
    imports_with_prefixes: IndexMap<String, String>,
}

impl<'a> JsEmitterVisitor<'a> {
    fn new(module_url: &'a str, runtime_module: Option<&'a str>) -> Self {
        JsEmitterVisitor {
            module_url,
            runtime_module,
            imports_with_prefixes: IndexMap::new(),
        }
    }

    fn visit_all_statements(&mut self, stmts: &[o::Statement], ctx: &mut EmitterVisitorContext) -> Result<()> {
        for stmt in stmts {
            self.visit_statement(stmt, ctx)?;
        }
        Ok(())
    }

    fn print_export(&self, name: &str, ctx: &mut EmitterVisitorContext) {
        if ctx.is_exported_var(name) {
            ctx.print("export ");
        }
    }

    fn visit_statement(&mut self, stmt: &o::Statement, ctx: &mut EmitterVisitorContext) -> Result<()> {
        match stmt {
            o::Statement::DeclareVar(decl) => {
                self.print_export(&decl.name, ctx);
                let keyword = if decl.modifiers.contains(&o::StmtModifier::Final) {
                    "const"
                } else {
                    "var"
                };
                ctx.print(&format!("{} {} = ", keyword, decl.name));
                self.visit_expression(&decl.value, ctx)?;
                ctx.println(";");
            }
            o::Statement::DeclareFn(decl) => {
                self.print_export(&decl.name, ctx);
                ctx.print(&format!("function {}(", decl.name));
                self.visit_params(&decl.params, ctx);
                ctx.println(") {");
                self.visit_block(&decl.statements, ctx)?;
                ctx.println("}");
            }
            o::Statement::Expression(expr) => {
                self.visit_expression(expr, ctx)?;
                ctx.println(";");
            }
            o::Statement::Return(expr) => {
                ctx.print("return ");
                self.visit_expression(expr, ctx)?;
                ctx.println(";");
            }
            o::Statement::DeclareClass(class) => self.visit_declare_class_stmt(class, ctx)?,
            o::Statement::If(stmt) => {
                ctx.print("if (");
                self.visit_expression(&stmt.condition, ctx)?;
                ctx.println(") {");
                self.visit_block(&stmt.true_case, ctx)?;
                if stmt.false_case.is_empty() {
                    ctx.println("}");
                } else {
                    ctx.println("} else {");
                    self.visit_block(&stmt.false_case, ctx)?;
                    ctx.println("}");
                }
            }
            o::Statement::TryCatch(stmt) => {
                ctx.println("try {");
                self.visit_block(&stmt.body_stmts, ctx)?;
                ctx.println(&format!("}} catch ({}) {{", CATCH_ERROR_VAR));
                ctx.inc_indent();
                ctx.println(&format!(
                    "const {} = {}.stack;",
                    CATCH_STACK_VAR, CATCH_ERROR_VAR
                ));
                self.visit_all_statements(&stmt.catch_stmts, ctx)?;
                ctx.dec_indent();
                ctx.println("}");
            }
            o::Statement::Throw(expr) => {
                ctx.print("throw ");
                self.visit_expression(expr, ctx)?;
                ctx.println(";");
            }
            o::Statement::Comment(comment) => {
                for line in comment.lines() {
                    ctx.println(&format!("// {}", line));
                }
            }
        }
        Ok(())
    }

    fn visit_block(&mut self, stmts: &[o::Statement], ctx: &mut EmitterVisitorContext) -> Result<()> {
        ctx.inc_indent();
        self.visit_all_statements(stmts, ctx)?;
        ctx.dec_indent();
        Ok(())
    }

    fn visit_declare_class_stmt(&mut self, class: &o::ClassStmt, ctx: &mut EmitterVisitorContext) -> Result<()> {
        self.print_export(&class.name, ctx);
        ctx.print(&format!("class {}", class.name));
        if let Some(parent) = &class.parent {
            ctx.print(" extends ");
            self.visit_expression(parent, ctx)?;
        }
        ctx.println(" {");
        ctx.inc_indent();
        if let Some(constructor) = &class.constructor_method {
            ctx.print("constructor(");
            self.visit_params(&constructor.params, ctx);
            ctx.println(") {");
            self.visit_block(&constructor.body, ctx)?;
            ctx.println("}");
        }
        for getter in &class.getters {
            ctx.println(&format!("get {}() {{", getter.name));
            self.visit_block(&getter.body, ctx)?;
            ctx.println("}");
        }
        for method in &class.methods {
            ctx.print(&format!("{}(", method.name));
            self.visit_params(&method.params, ctx);
            ctx.println(") {");
            self.visit_block(&method.body, ctx)?;
            ctx.println("}");
        }
        ctx.dec_indent();
        ctx.println("}");
        Ok(())
    }

    fn visit_params(&self, params: &[o::FnParam], ctx: &mut EmitterVisitorContext) {
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        ctx.print(&names.join(","));
    }

    fn visit_all_expressions(
        &mut self,
        exprs: &[o::Expression],
        ctx: &mut EmitterVisitorContext,
        separator: &str,
    ) -> Result<()> {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                ctx.print(separator);
            }
            self.visit_expression(expr, ctx)?;
        }
        Ok(())
    }

    fn visit_expression(&mut self, expr: &o::Expression, ctx: &mut EmitterVisitorContext) -> Result<()> {
        match expr {
            o::Expression::ReadVar(read) => ctx.print(&read.name),
            o::Expression::WriteVar(write) => {
                ctx.print(&format!("{} = ", write.name));
                self.visit_expression(&write.value, ctx)?;
            }
            o::Expression::ReadProp(read) => {
                self.visit_expression(&read.receiver, ctx)?;
                ctx.print(&format!(".{}", read.name));
            }
            o::Expression::WriteProp(write) => {
                self.visit_expression(&write.receiver, ctx)?;
                ctx.print(&format!(".{} = ", write.name));
                self.visit_expression(&write.value, ctx)?;
            }
            o::Expression::ReadKey(read) => {
                self.visit_expression(&read.receiver, ctx)?;
                ctx.print("[");
                self.visit_expression(&read.index, ctx)?;
                ctx.print("]");
            }
            o::Expression::WriteKey(write) => {
                self.visit_expression(&write.receiver, ctx)?;
                ctx.print("[");
                self.visit_expression(&write.index, ctx)?;
                ctx.print("] = ");
                self.visit_expression(&write.value, ctx)?;
            }
            o::Expression::InvokeMethod(invoke) => {
                self.visit_expression(&invoke.receiver, ctx)?;
                ctx.print(&format!(".{}(", invoke.name));
                self.visit_all_expressions(&invoke.args, ctx, ",")?;
                ctx.print(")");
            }
            o::Expression::InvokeFn(invoke) => {
                let wrap = matches!(*invoke.fn_, o::Expression::Fn(_));
                if wrap {
                    ctx.print("(");
                }
                self.visit_expression(&invoke.fn_, ctx)?;
                if wrap {
                    ctx.print(")");
                }
                ctx.print("(");
                self.visit_all_expressions(&invoke.args, ctx, ",")?;
                ctx.print(")");
            }
            o::Expression::Instantiate(instantiate) => {
                ctx.print("new ");
                self.visit_expression(&instantiate.class_expr, ctx)?;
                ctx.print("(");
                self.visit_all_expressions(&instantiate.args, ctx, ",")?;
                ctx.print(")");
            }
            o::Expression::Literal(value) => ctx.print(&literal_source(value)),
            o::Expression::External(reference) => self.visit_external(reference, ctx)?,
            o::Expression::Conditional(cond) => {
                ctx.print("(");
                self.visit_expression(&cond.condition, ctx)?;
                ctx.print("? ");
                self.visit_expression(&cond.true_case, ctx)?;
                ctx.print(": ");
                match &cond.false_case {
                    Some(false_case) => self.visit_expression(false_case, ctx)?,
                    None => ctx.print("null"),
                }
                ctx.print(")");
            }
            o::Expression::Not(inner) => {
                ctx.print("!");
                self.visit_expression(inner, ctx)?;
            }
            o::Expression::Fn(function) => {
                ctx.print("function(");
                self.visit_params(&function.params, ctx);
                ctx.println(") {");
                self.visit_block(&function.statements, ctx)?;
                ctx.print("}");
            }
            o::Expression::BinaryOp(op) => {
                ctx.print("(");
                self.visit_expression(&op.lhs, ctx)?;
                ctx.print(&format!(" {} ", op.operator.as_str()));
                self.visit_expression(&op.rhs, ctx)?;
                ctx.print(")");
            }
            o::Expression::LiteralArray(entries) => {
                ctx.print("[");
                self.visit_all_expressions(entries, ctx, ",")?;
                ctx.print("]");
            }
            o::Expression::LiteralMap(entries) => {
                ctx.print("{");
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        ctx.print(",");
                    }
                    ctx.print(&format!(
                        "{}: ",
                        escape_identifier(&entry.key, false, entry.quoted)
                    ));
                    self.visit_expression(&entry.value, ctx)?;
                }
                ctx.print("}");
            }
        }
        Ok(())
    }

    fn visit_external(&mut self, reference: &o::ExternalReference, ctx: &mut EmitterVisitorContext) -> Result<()> {
        let symbol = match reference {
            o::ExternalReference::Symbol(symbol) => symbol,
            o::ExternalReference::Placeholder(placeholder) => match placeholder.resolved() {
                Some(o::ResolvedReference::Symbol(symbol)) => symbol,
                Some(o::ResolvedReference::Runtime(_)) => match self.runtime_module {
                    Some(runtime_module) => {
                        self.print_import_prefix(runtime_module, ctx);
                        ctx.print(placeholder.name());
                        return Ok(());
                    }
                    None => {
                        return Err(CompilerError::illegal_state(format!(
                            "Internal error: cannot emit the runtime value of {}",
                            placeholder.name()
                        )))
                    }
                },
                None => {
                    return Err(CompilerError::illegal_state(format!(
                        "Internal error: unknown identifier {}",
                        placeholder.name()
                    )))
                }
            },
        };
        if symbol.file_path() != self.module_url {
            self.print_import_prefix(symbol.file_path(), ctx);
        }
        ctx.print(symbol.name());
        for member in symbol.members() {
            ctx.print(&format!(".{}", member));
        }
        Ok(())
    }

    fn print_import_prefix(&mut self, file_path: &str, ctx: &mut EmitterVisitorContext) {
        let next = format!("i{}", self.imports_with_prefixes.len());
        let prefix = self
            .imports_with_prefixes
            .entry(file_path.to_string())
            .or_insert(next);
        ctx.print(&format!("{}.", prefix));
    }
}

fn literal_source(value: &o::LiteralValue) -> String {
    match value {
        o::LiteralValue::Null => "null".to_string(),
        o::LiteralValue::Undefined => "undefined".to_string(),
        o::LiteralValue::Bool(b) => b.to_string(),
        o::LiteralValue::Number(n) => format_number(*n),
        o::LiteralValue::String(s) => escape_single_quote_string(s, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aot::static_symbol::StaticSymbolCache;
    use crate::url_resolver::relative_module_name;
    use pretty_assertions::assert_eq;

    struct RelativeImports;

    impl ImportResolver for RelativeImports {
        fn file_name_to_module_name(&self, imported: &str, containing: &str) -> String {
            relative_module_name(containing, imported)
        }
    }

    fn emit(stmts: &[o::Statement], exported: &[&str]) -> String {
        let exported: Vec<String> = exported.iter().map(|s| s.to_string()).collect();
        JavaScriptEmitter::new(Rc::new(RelativeImports))
            .emit_statements("/app/a.ngfactory.js", stmts, &exported)
            .unwrap()
    }

    #[test]
    fn should_import_each_external_module_once() {
        let cache = StaticSymbolCache::new();
        let check = cache.get("/core/view_utils.d.ts", "checkBinding", &[]);
        let local = cache.get("/app/a.ngfactory.js", "helper", &[]);
        let emitted = emit(
            &[
                o::import_expr(check.clone()).call_fn(vec![o::literal(1.0)]).to_stmt(),
                o::import_expr(check).call_fn(vec![]).to_stmt(),
                o::import_expr(local).call_fn(vec![]).to_stmt(),
            ],
            &[],
        );
        assert_eq!(
            emitted,
            "import * as i0 from '../core/view_utils';\ni0.checkBinding(1);\ni0.checkBinding();\nhelper();"
        );
    }

    #[test]
    fn should_emit_enum_members_and_exports() {
        let cache = StaticSymbolCache::new();
        let emulated = cache.get("/core/view.d.ts", "ViewEncapsulation", &["Emulated"]);
        let emitted = emit(
            &[o::import_expr(emulated).to_decl_stmt("encapsulation", true)],
            &["encapsulation"],
        );
        assert_eq!(
            emitted,
            "import * as i0 from '../core/view';\nexport const encapsulation = i0.ViewEncapsulation.Emulated;"
        );
    }

    #[test]
    fn should_emit_classes() {
        let class = o::Statement::DeclareClass(o::ClassStmt {
            name: "Foo".to_string(),
            parent: Some(o::variable("Base")),
            fields: vec![o::ClassField::new("x")],
            getters: vec![o::ClassGetter {
                name: "y".to_string(),
                body: vec![o::return_stmt(o::this_expr().prop("x"))],
            }],
            constructor_method: Some(o::ClassMethod::new(
                "constructor",
                vec![o::FnParam::new("a"), o::FnParam::new("b")],
                vec![o::super_expr().call_fn(vec![o::variable("a")]).to_stmt()],
            )),
            methods: vec![o::ClassMethod::new(
                "run",
                vec![],
                vec![o::if_stmt(
                    o::variable("a").and(o::not(o::variable("b"))),
                    vec![o::throw_stmt(o::variable("Error").instantiate(vec![o::literal("it's")]))],
                )],
            )],
        });
        assert_eq!(
            emit(&[class], &["Foo"]),
            "export class Foo extends Base {\n  constructor(a,b) {\n    super(a);\n  }\n  get y() {\n    return this.x;\n  }\n  run() {\n    if ((a && !b)) {\n      throw new Error('it\\'s');\n    }\n  }\n}"
        );
    }

    #[test]
    fn should_fail_on_unresolved_placeholders() {
        let placeholder = o::Placeholder::new("View_B0");
        let err = JavaScriptEmitter::new(Rc::new(RelativeImports))
            .emit_statements("/app/a.ts", &[o::placeholder_expr(&placeholder).to_stmt()], &[])
            .unwrap_err();
        assert_eq!(err.to_string(), "Internal error: unknown identifier View_B0");
    }

    #[test]
    fn should_emit_literals_and_conditionals() {
        let expr = o::variable("a")
            .conditional(
                o::literal_map_of(vec![("b", o::literal(2.5)), ("c-d", o::null_expr())]),
                Some(o::literal_arr(vec![o::literal(true), o::literal("x")])),
            )
            .to_stmt();
        assert_eq!(emit(&[expr], &[]), "(a? {b: 2.5,'c-d': null}: [true,'x']);");
    }
}
