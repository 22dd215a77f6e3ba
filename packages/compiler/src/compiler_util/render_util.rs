//! Statements that push bound values to the renderer.

use super::binding_util::is_first_view_check;
use super::expression_converter::ConvertPropertyBindingResult;
use super::identifier_util::create_enum_expression;
use crate::compile_reflector::CompileReflector;
use crate::core::SecurityContext;
use crate::error::{CompilerError, Result};
use crate::identifiers::{resolve_identifier, IdentifierSpec, Identifiers};
use crate::output::output_ast::{self as o, Expression, Statement};
use crate::template_parser::template_ast::{
    BoundElementPropertyAst, BoundEventAst, PropertyBindingType,
};

/// State name of an element that is not (or no longer) in the DOM.
pub const EMPTY_ANIMATION_STATE: &str = "void";

const THROW_ON_CHANGE_VAR: &str = "throwOnChange";

pub fn create_check_render_binding_stmt(
    reflector: &dyn CompileReflector,
    view: Expression,
    render_element: Expression,
    bound_prop: &BoundElementPropertyAst,
    old_value: Expression,
    eval_result: &ConvertPropertyBindingResult,
    security_context_expression: Option<Expression>,
) -> Result<Vec<Statement>> {
    let mut check_stmts = eval_result.stmts.clone();
    let force_update = eval_result
        .force_update
        .clone()
        .unwrap_or_else(|| o::literal(false));
    let check_fn = |spec: &IdentifierSpec| -> Result<Expression> {
        Ok(o::import_expr(resolve_identifier(reflector, spec)?))
    };
    let store_value = old_value.clone().set(eval_result.curr_val_expr.clone())?;
    let stmt = match bound_prop.type_ {
        PropertyBindingType::Property | PropertyBindingType::Attribute => {
            let spec = if bound_prop.type_ == PropertyBindingType::Property {
                &Identifiers::checkRenderProperty
            } else {
                &Identifiers::checkRenderAttribute
            };
            check_fn(spec)?.call_fn(vec![
                view,
                render_element,
                o::literal(bound_prop.name.as_str()),
                old_value,
                store_value,
                force_update,
                calc_security_context(reflector, bound_prop, security_context_expression)?,
            ])
        }
        PropertyBindingType::Class => check_fn(&Identifiers::checkRenderClass)?.call_fn(vec![
            view,
            render_element,
            o::literal(bound_prop.name.as_str()),
            old_value,
            store_value,
            force_update,
        ]),
        PropertyBindingType::Style => check_fn(&Identifiers::checkRenderStyle)?.call_fn(vec![
            view,
            render_element,
            o::literal(bound_prop.name.as_str()),
            match &bound_prop.unit {
                Some(unit) => o::literal(unit.as_str()),
                None => o::null_expr(),
            },
            old_value,
            store_value,
            force_update,
            calc_security_context(reflector, bound_prop, security_context_expression)?,
        ]),
        PropertyBindingType::Animation => {
            return Err(CompilerError::illegal_state(
                "Illegal state: Should not come here!",
            ))
        }
    };
    check_stmts.push(stmt.to_stmt());
    Ok(check_stmts)
}

fn calc_security_context(
    reflector: &dyn CompileReflector,
    bound_prop: &BoundElementPropertyAst,
    security_context_expression: Option<Expression>,
) -> Result<Expression> {
    if bound_prop.security_context == SecurityContext::None {
        return Ok(o::null_expr());
    }
    if !bound_prop.needs_runtime_security_context {
        return create_enum_expression(
            reflector,
            &Identifiers::SecurityContext,
            bound_prop.security_context.member_name(),
        );
    }
    security_context_expression.ok_or_else(|| {
        CompilerError::illegal_state(format!(
            "internal error, no SecurityContext given {}",
            bound_prop.name
        ))
    })
}

#[derive(Debug, Clone)]
pub struct AnimationBindingStmts {
    pub check_update_stmts: Vec<Statement>,
    pub check_detach_stmts: Vec<Statement>,
}

/// Triggers the animation `bound_prop` names whenever its state changes,
/// and with the `void` state when the element is detached.
#[allow(clippy::too_many_arguments)]
pub fn create_check_animation_binding_stmts(
    reflector: &dyn CompileReflector,
    view: Expression,
    component_view: Expression,
    bound_prop: &BoundElementPropertyAst,
    bound_outputs: &[BoundEventAst],
    event_listener: Expression,
    render_element: Expression,
    old_value: Expression,
    eval_result: &ConvertPropertyBindingResult,
) -> Result<AnimationBindingStmts> {
    let animation_name = bound_prop.name.as_str();
    let animation_fn_expr = component_view
        .prop("componentType")
        .prop("animations")
        .key(o::literal(animation_name));
    let empty_state_value = o::literal(EMPTY_ANIMATION_STATE);
    let transition_var_name = format!("animationTransition_{}", animation_name);
    let transition_var = o::variable(transition_var_name.clone());
    let curr_val = eval_result.curr_val_expr.clone();

    let mut update_stmts = vec![
        animation_fn_expr
            .clone()
            .call_fn(vec![
                view.clone(),
                render_element.clone(),
                is_first_view_check(view.clone())
                    .conditional(empty_state_value.clone(), Some(old_value.clone())),
                curr_val.clone(),
            ])
            .to_decl_stmt(transition_var_name.clone(), false),
        old_value.clone().set(curr_val.clone())?.to_stmt(),
    ];
    let mut detach_stmts = vec![animation_fn_expr
        .call_fn(vec![
            view.clone(),
            render_element,
            curr_val.clone(),
            empty_state_value,
        ])
        .to_decl_stmt(transition_var_name, false)];

    let mut register_stmts = Vec::new();
    for (phase, method) in [("start", "onStart"), ("done", "onDone")] {
        let listens = bound_outputs.iter().any(|event| {
            event.is_animation() && event.name == animation_name && event.phase.as_deref() == Some(phase)
        });
        if listens {
            let full_name = BoundEventAst::calc_full_name(animation_name, None, Some(phase));
            register_stmts.push(
                transition_var
                    .clone()
                    .call_method(
                        method,
                        vec![event_listener
                            .clone()
                            .call_method("bind", vec![view.clone(), o::literal(full_name)])],
                    )
                    .to_stmt(),
            );
        }
    }
    update_stmts.extend(register_stmts.iter().cloned());
    detach_stmts.extend(register_stmts);

    let mut changed = o::import_expr(resolve_identifier(reflector, &Identifiers::checkBinding)?)
        .call_fn(vec![o::variable(THROW_ON_CHANGE_VAR), old_value, curr_val]);
    if let Some(force_update) = &eval_result.force_update {
        changed = force_update.clone().or(changed);
    }
    let mut check_update_stmts = eval_result.stmts.clone();
    check_update_stmts.push(o::if_stmt(changed, update_stmts));
    let mut check_detach_stmts = eval_result.stmts.clone();
    check_detach_stmts.extend(detach_stmts);
    Ok(AnimationBindingStmts {
        check_update_stmts,
        check_detach_stmts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression_parser::{ASTWithSource, AST};
    use crate::output::js_emitter::{ImportResolver, JavaScriptEmitter};
    use crate::parse_util::ParseSourceSpan;
    use crate::testing::MockReflector;
    use std::rc::Rc;

    struct Verbatim;

    impl ImportResolver for Verbatim {
        fn file_name_to_module_name(&self, imported: &str, _containing: &str) -> String {
            imported.to_string()
        }
    }

    fn emit(stmts: &[Statement]) -> String {
        JavaScriptEmitter::new(Rc::new(Verbatim))
            .emit_statements("/app/a.ngfactory.js", stmts, &[])
            .unwrap()
    }

    fn bound_prop(name: &str, type_: PropertyBindingType, security_context: SecurityContext) -> BoundElementPropertyAst {
        BoundElementPropertyAst {
            name: name.to_string(),
            type_,
            security_context,
            needs_runtime_security_context: false,
            value: ASTWithSource {
                ast: AST::EmptyExpr { span: Default::default() },
                source: String::new(),
                location: String::new(),
                errors: Vec::new(),
            },
            unit: None,
            source_span: ParseSourceSpan::empty(""),
        }
    }

    fn eval() -> ConvertPropertyBindingResult {
        ConvertPropertyBindingResult {
            stmts: vec![],
            curr_val_expr: o::variable("currVal_0"),
            force_update: None,
        }
    }

    #[test]
    fn should_pass_the_static_security_context() {
        let reflector = MockReflector::new();
        let prop = bound_prop("href", PropertyBindingType::Property, SecurityContext::Url);
        let stmts = create_check_render_binding_stmt(
            &reflector,
            o::this_expr(),
            o::this_expr().prop("_el_0"),
            &prop,
            o::this_expr().prop("_expr_0"),
            &eval(),
            None,
        )
        .unwrap();
        let source = emit(&stmts);
        assert!(source.ends_with(
            "i0.checkRenderProperty(this,this._el_0,'href',this._expr_0,this._expr_0 = currVal_0,false,i1.SecurityContext.URL);"
        ));
    }

    #[test]
    fn should_require_a_runtime_security_context_when_flagged() {
        let reflector = MockReflector::new();
        let mut prop = bound_prop("src", PropertyBindingType::Attribute, SecurityContext::Url);
        prop.needs_runtime_security_context = true;
        let err = create_check_render_binding_stmt(
            &reflector,
            o::this_expr(),
            o::this_expr().prop("_el_0"),
            &prop,
            o::this_expr().prop("_expr_0"),
            &eval(),
            None,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "internal error, no SecurityContext given src");
    }

    #[test]
    fn should_register_animation_callbacks_on_update_and_detach() {
        let reflector = MockReflector::new();
        let prop = bound_prop("open", PropertyBindingType::Animation, SecurityContext::None);
        let done = BoundEventAst {
            name: "open".to_string(),
            target: None,
            phase: Some("done".to_string()),
            handler: prop.value.clone(),
            source_span: ParseSourceSpan::empty(""),
        };
        let stmts = create_check_animation_binding_stmts(
            &reflector,
            o::this_expr(),
            o::this_expr(),
            &prop,
            &[done],
            o::this_expr().prop("handleEvent_0"),
            o::this_expr().prop("_el_0"),
            o::this_expr().prop("_expr_1"),
            &eval(),
        )
        .unwrap();
        let detach = emit(&stmts.check_detach_stmts);
        assert_eq!(
            detach,
            "var animationTransition_open = this.componentType.animations['open'](this,this._el_0,currVal_0,'void');\n\
             animationTransition_open.onDone(this.handleEvent_0.bind(this,'@open.done'));"
        );
        let update = emit(&stmts.check_update_stmts);
        assert!(update.contains("((this.numberOfChecks === 0)? 'void': this._expr_1)"));
        assert!(update.contains("this._expr_1 = currVal_0;"));
    }
}
