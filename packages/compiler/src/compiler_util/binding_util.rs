//! Change-detection fields and checks for bindings.

use super::expression_converter::ConvertPropertyBindingResult;
use crate::compile_reflector::CompileReflector;
use crate::error::Result;
use crate::identifiers::{resolve_identifier, Identifiers};
use crate::output::class_builder::ClassBuilder;
use crate::output::output_ast::{self as o, Expression, Statement};

/// Field holding the previous value of a binding, and the id used to name
/// the binding's temporaries.
#[derive(Debug, Clone)]
pub struct CheckBindingField {
    pub expression: Expression,
    pub binding_id: String,
}

/// Adds `_expr_<binding_id>` to `builder`, initialized to `UNINITIALIZED`.
pub fn create_check_binding_field(
    builder: &mut ClassBuilder,
    reflector: &dyn CompileReflector,
    binding_id: String,
) -> Result<CheckBindingField> {
    let field_name = format!("_expr_{}", binding_id);
    builder.add_field(field_name.clone());
    builder.ctor_stmts.push(o::assign_prop(
        o::this_expr(),
        field_name.clone(),
        o::import_expr(resolve_identifier(reflector, &Identifiers::UNINITIALIZED)?),
    ));
    Ok(CheckBindingField {
        expression: o::this_expr().prop(field_name),
        binding_id,
    })
}

/// Evaluates the binding, then runs `actions` and stores the new value when
/// it differs from `field_expr`.
pub fn create_check_binding_stmt(
    reflector: &dyn CompileReflector,
    eval_result: &ConvertPropertyBindingResult,
    field_expr: &Expression,
    throw_on_change_var: &Expression,
    actions: Vec<Statement>,
) -> Result<Vec<Statement>> {
    let mut condition = o::import_expr(resolve_identifier(reflector, &Identifiers::checkBinding)?)
        .call_fn(vec![
            throw_on_change_var.clone(),
            field_expr.clone(),
            eval_result.curr_val_expr.clone(),
        ]);
    if let Some(force_update) = &eval_result.force_update {
        condition = force_update.clone().or(condition);
    }
    let mut true_case = actions;
    true_case.push(field_expr.clone().set(eval_result.curr_val_expr.clone())?.to_stmt());

    let mut stmts = eval_result.stmts.clone();
    stmts.push(o::if_stmt(condition, true_case));
    Ok(stmts)
}

/// True during the first change detection run of `view`.
pub fn is_first_view_check(view: Expression) -> Expression {
    view.prop("numberOfChecks").identical(o::literal(0usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::js_emitter::{ImportResolver, JavaScriptEmitter};
    use crate::testing::MockReflector;
    use std::rc::Rc;

    struct Verbatim;

    impl ImportResolver for Verbatim {
        fn file_name_to_module_name(&self, imported: &str, _containing: &str) -> String {
            imported.to_string()
        }
    }

    #[test]
    fn should_store_the_new_value_after_the_actions() {
        let reflector = MockReflector::new();
        let mut builder = ClassBuilder::new();
        let field = create_check_binding_field(&mut builder, &reflector, "0".to_string()).unwrap();
        assert_eq!(field.binding_id, "0");
        assert_eq!(builder.ctor_stmts.len(), 1);

        let eval = ConvertPropertyBindingResult {
            stmts: vec![o::this_expr().prop("context").prop("a").to_decl_stmt("currVal_0", true)],
            curr_val_expr: o::variable("currVal_0"),
            force_update: None,
        };
        let stmts = create_check_binding_stmt(
            &reflector,
            &eval,
            &field.expression,
            &o::variable("throwOnChange"),
            vec![o::variable("render").call_fn(vec![]).to_stmt()],
        )
        .unwrap();
        let source = JavaScriptEmitter::new(Rc::new(Verbatim))
            .emit_statements("/app/a.ngfactory.js", &stmts, &[])
            .unwrap();
        assert_eq!(
            source,
            "import * as i0 from '@angular/core/src/linker/view_utils';\n\
             const currVal_0 = this.context.a;\n\
             if (i0.checkBinding(throwOnChange,this._expr_0,currVal_0)) {\n  render();\n  this._expr_0 = currVal_0;\n}"
        );
    }
}
