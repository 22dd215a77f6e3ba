//! Converts template expressions into output expressions.
//!
//! Property bindings become a `currVal_<id>` declaration the caller compares
//! against the previous value; event bindings become a statement list whose
//! last value decides whether the default action is prevented.

use crate::compile_reflector::CompileReflector;
use crate::error::{CompilerError, Result};
use crate::expression_parser::{LiteralValue as AstLiteral, AST};
use crate::identifiers::{resolve_identifier, Identifiers};
use crate::output::output_ast::{self as o, BinaryOperator, Expression, LiteralValue, Statement};

pub const EVENT_NAME: &str = "$event";

/// Resolves the names an expression can reach besides the implicit receiver.
pub trait NameResolver {
    /// Value of the pipe `name` applied to `input`.
    fn call_pipe(&mut self, name: &str, input: Expression, args: Vec<Expression>) -> Result<Expression>;

    /// Template variable, reference or `$event` named `name`.
    fn get_local(&self, name: &str) -> Option<Expression>;
}

#[derive(Debug, Clone)]
pub struct ConvertPropertyBindingResult {
    pub stmts: Vec<Statement>,
    pub curr_val_expr: Expression,
    pub force_update: Option<Expression>,
}

#[derive(Debug, Clone)]
pub struct ConvertActionBindingResult {
    pub stmts: Vec<Statement>,
    /// `pd_<id>` when the action ends in an expression; `false` from it
    /// prevents the default.
    pub allow_default: Option<Expression>,
}

pub fn convert_property_binding(
    reflector: &dyn CompileReflector,
    name_resolver: &mut dyn NameResolver,
    implicit_receiver: Expression,
    expression: &AST,
    binding_id: &str,
) -> Result<ConvertPropertyBindingResult> {
    let mut converter = AstConverter {
        reflector,
        name_resolver,
        implicit_receiver,
        is_action: false,
    };
    let value = converter.visit(expression)?;
    let curr_val_name = format!("currVal_{}", binding_id);
    Ok(ConvertPropertyBindingResult {
        stmts: vec![value.to_decl_stmt(curr_val_name.clone(), true)],
        curr_val_expr: o::variable(curr_val_name),
        force_update: None,
    })
}

pub fn convert_action_binding(
    reflector: &dyn CompileReflector,
    name_resolver: &mut dyn NameResolver,
    implicit_receiver: Expression,
    action: &AST,
    binding_id: &str,
) -> Result<ConvertActionBindingResult> {
    let mut converter = AstConverter {
        reflector,
        name_resolver,
        implicit_receiver,
        is_action: true,
    };
    let expressions: Vec<&AST> = match action {
        AST::Chain { expressions, .. } => expressions.iter().collect(),
        AST::EmptyExpr { .. } => Vec::new(),
        single => vec![single],
    };
    let mut stmts = Vec::with_capacity(expressions.len());
    let mut allow_default = None;
    let last = expressions.len().saturating_sub(1);
    for (index, ast) in expressions.into_iter().enumerate() {
        let expr = converter.visit(ast)?;
        let is_write = matches!(
            expr,
            Expression::WriteVar(_) | Expression::WriteProp(_) | Expression::WriteKey(_)
        );
        if index == last && !is_write {
            let pd_name = format!("pd_{}", binding_id);
            stmts.push(
                expr.not_identical(o::literal(false))
                    .to_decl_stmt(pd_name.clone(), false),
            );
            allow_default = Some(o::variable(pd_name));
        } else {
            stmts.push(expr.to_stmt());
        }
    }
    Ok(ConvertActionBindingResult {
        stmts,
        allow_default,
    })
}

struct AstConverter<'a> {
    reflector: &'a dyn CompileReflector,
    name_resolver: &'a mut dyn NameResolver,
    implicit_receiver: Expression,
    is_action: bool,
}

impl AstConverter<'_> {
    fn visit_all(&mut self, asts: &[AST]) -> Result<Vec<Expression>> {
        asts.iter().map(|ast| self.visit(ast)).collect()
    }

    fn local_for(&self, receiver: &AST, name: &str) -> Option<Expression> {
        if receiver.is_implicit_receiver() {
            self.name_resolver.get_local(name)
        } else {
            None
        }
    }

    fn visit(&mut self, ast: &AST) -> Result<Expression> {
        Ok(match ast {
            AST::EmptyExpr { .. } => o::literal(LiteralValue::Undefined),
            AST::ImplicitReceiver { .. } => self.implicit_receiver.clone(),
            AST::Quote { .. } => {
                return Err(CompilerError::syntax(
                    "Quotes are not supported for evaluation!",
                ))
            }
            AST::Chain { .. } => {
                return Err(CompilerError::syntax(if self.is_action {
                    "Illegal state: chains are only allowed at the top of an action"
                } else {
                    "Binding expression cannot contain chained expression"
                }))
            }
            AST::Conditional {
                condition,
                true_exp,
                false_exp,
                ..
            } => {
                let condition = self.visit(condition)?;
                let true_case = self.visit(true_exp)?;
                let false_case = self.visit(false_exp)?;
                condition.conditional(true_case, Some(false_case))
            }
            AST::PropertyRead { receiver, name, .. } => match self.local_for(receiver, name) {
                Some(local) => local,
                None => self.visit(receiver)?.prop(name.clone()),
            },
            AST::PropertyWrite {
                receiver,
                name,
                value,
                ..
            } => {
                if self.local_for(receiver, name).is_some() {
                    return Err(CompilerError::syntax(
                        "Cannot assign to a reference or variable!",
                    ));
                }
                let receiver = self.visit(receiver)?;
                let value = self.visit(value)?;
                receiver.prop(name.clone()).set(value)?
            }
            AST::SafePropertyRead { receiver, name, .. } => {
                let receiver = self.visit(receiver)?;
                receiver
                    .clone()
                    .is_blank()
                    .conditional(o::null_expr(), Some(receiver.prop(name.clone())))
            }
            AST::KeyedRead { obj, key, .. } => {
                let obj = self.visit(obj)?;
                let key = self.visit(key)?;
                obj.key(key)
            }
            AST::KeyedWrite { obj, key, value, .. } => {
                let obj = self.visit(obj)?;
                let key = self.visit(key)?;
                let value = self.visit(value)?;
                obj.key(key).set(value)?
            }
            AST::BindingPipe { exp, name, args, .. } => {
                let input = self.visit(exp)?;
                let args = self.visit_all(args)?;
                self.name_resolver.call_pipe(name, input, args)?
            }
            AST::LiteralPrimitive { value, .. } => o::literal(match value {
                AstLiteral::Null => LiteralValue::Null,
                AstLiteral::Undefined => LiteralValue::Undefined,
                AstLiteral::Bool(b) => LiteralValue::Bool(*b),
                AstLiteral::Number(n) => LiteralValue::Number(*n),
                AstLiteral::String(s) => LiteralValue::String(s.clone()),
            }),
            AST::LiteralArray { expressions, .. } => o::literal_arr(self.visit_all(expressions)?),
            AST::LiteralMap { keys, values, .. } => {
                let values = self.visit_all(values)?;
                o::literal_map(
                    keys.iter()
                        .zip(values)
                        .map(|(key, value)| o::LiteralMapEntry {
                            key: key.clone(),
                            value,
                            quoted: true,
                        })
                        .collect(),
                )
            }
            AST::Interpolation {
                strings,
                expressions,
                ..
            } => {
                let mut args = vec![o::literal(expressions.len())];
                for (index, string) in strings.iter().enumerate() {
                    args.push(o::literal(string.as_str()));
                    if let Some(expression) = expressions.get(index) {
                        args.push(self.visit(expression)?);
                    }
                }
                o::import_expr(resolve_identifier(self.reflector, &Identifiers::interpolate)?)
                    .call_fn(args)
            }
            AST::Binary {
                operation,
                left,
                right,
                ..
            } => {
                let operator = BinaryOperator::from_template_operator(operation).ok_or_else(|| {
                    CompilerError::syntax(format!("Unsupported operation {}", operation))
                })?;
                let lhs = self.visit(left)?;
                let rhs = self.visit(right)?;
                lhs.binary(operator, rhs)
            }
            AST::PrefixNot { expression, .. } => o::not(self.visit(expression)?),
            AST::MethodCall {
                receiver,
                name,
                args,
                ..
            } => {
                let args = self.visit_all(args)?;
                match self.local_for(receiver, name) {
                    Some(local) => local.call_fn(args),
                    None => self.visit(receiver)?.call_method(name.clone(), args),
                }
            }
            AST::SafeMethodCall {
                receiver,
                name,
                args,
                ..
            } => {
                let receiver = self.visit(receiver)?;
                let args = self.visit_all(args)?;
                receiver.clone().is_blank().conditional(
                    o::null_expr(),
                    Some(receiver.call_method(name.clone(), args)),
                )
            }
            AST::FunctionCall { target, args, .. } => {
                let target = self.visit(target)?;
                target.call_fn(self.visit_all(args)?)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression_parser::{Lexer, Parser};
    use crate::ml_parser::interpolation_config::InterpolationConfig;
    use crate::output::js_emitter::{ImportResolver, JavaScriptEmitter};
    use crate::testing::MockReflector;
    use std::collections::HashMap;
    use std::rc::Rc;

    struct Locals(HashMap<&'static str, Expression>);

    impl NameResolver for Locals {
        fn call_pipe(&mut self, name: &str, input: Expression, args: Vec<Expression>) -> Result<Expression> {
            let mut all = vec![input];
            all.extend(args);
            Ok(o::this_expr().prop(format!("_pipe_{}", name)).call_method("transform", all))
        }

        fn get_local(&self, name: &str) -> Option<Expression> {
            self.0.get(name).cloned()
        }
    }

    struct SameDir;

    impl ImportResolver for SameDir {
        fn file_name_to_module_name(&self, imported: &str, _containing: &str) -> String {
            imported.to_string()
        }
    }

    fn emit(stmts: Vec<Statement>) -> String {
        JavaScriptEmitter::new(Rc::new(SameDir))
            .emit_statements("/app/a.ngfactory.js", &stmts, &[])
            .unwrap()
    }

    fn parser() -> Parser {
        Parser::new(Lexer::new())
    }

    #[test]
    fn should_read_locals_before_the_implicit_receiver() {
        let reflector = MockReflector::new();
        let ast = parser().parse_binding("item.name | upper", "", &InterpolationConfig::default());
        let mut locals = Locals(HashMap::from([(
            "item",
            o::this_expr().prop("context").prop("$implicit"),
        )]));
        let result = convert_property_binding(
            &reflector,
            &mut locals,
            o::this_expr().prop("context"),
            &ast.ast,
            "0_1",
        )
        .unwrap();
        assert_eq!(
            emit(result.stmts),
            "const currVal_0_1 = this._pipe_upper.transform(this.context.$implicit.name);"
        );
    }

    #[test]
    fn should_guard_safe_navigation() {
        let reflector = MockReflector::new();
        let ast = parser().parse_binding("a?.b", "", &InterpolationConfig::default());
        let result = convert_property_binding(
            &reflector,
            &mut Locals(HashMap::new()),
            o::variable("ctx"),
            &ast.ast,
            "0",
        )
        .unwrap();
        assert_eq!(
            emit(result.stmts),
            "const currVal_0 = ((ctx.a == null)? null: ctx.a.b);"
        );
    }

    #[test]
    fn should_end_actions_with_the_prevent_default_flag() {
        let reflector = MockReflector::new();
        let ast = parser().parse_action("x = 1; onClick($event)", "", &InterpolationConfig::default());
        let mut locals = Locals(HashMap::from([(EVENT_NAME, o::variable(EVENT_NAME))]));
        let result =
            convert_action_binding(&reflector, &mut locals, o::variable("ctx"), &ast.ast, "0_0")
                .unwrap();
        assert!(result.allow_default.is_some());
        assert_eq!(
            emit(result.stmts),
            "ctx.x = 1;\nvar pd_0_0 = (ctx.onClick($event) !== false);"
        );
    }

    #[test]
    fn should_reject_writes_to_locals() {
        let reflector = MockReflector::new();
        let ast = parser().parse_action("item = 1", "", &InterpolationConfig::default());
        let mut locals = Locals(HashMap::from([("item", o::variable("item"))]));
        let err = convert_action_binding(&reflector, &mut locals, o::variable("ctx"), &ast.ast, "0")
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot assign to a reference or variable!");
    }
}
