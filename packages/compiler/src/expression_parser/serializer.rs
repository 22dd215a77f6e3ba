//! Angular Expression Serializer
//!
//! Prints an expression AST back to source form. Used in diagnostics and
//! tests.

use super::ast::{LiteralValue, AST};

pub fn unparse(ast: &AST) -> String {
    let mut out = String::new();
    write_ast(ast, &mut out);
    out
}

fn write_receiver(receiver: &AST, separator: &str, out: &mut String) {
    if !receiver.is_implicit_receiver() {
        write_ast(receiver, out);
        out.push_str(separator);
    }
}

fn write_list(items: &[AST], out: &mut String) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_ast(item, out);
    }
}

fn write_ast(ast: &AST, out: &mut String) {
    match ast {
        AST::EmptyExpr { .. } | AST::ImplicitReceiver { .. } => {}
        AST::Quote {
            prefix,
            uninterpreted_expression,
            ..
        } => {
            out.push_str(prefix);
            out.push(':');
            out.push_str(uninterpreted_expression);
        }
        AST::Chain { expressions, .. } => {
            for (i, e) in expressions.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                }
                write_ast(e, out);
            }
        }
        AST::Conditional {
            condition,
            true_exp,
            false_exp,
            ..
        } => {
            write_ast(condition, out);
            out.push_str(" ? ");
            write_ast(true_exp, out);
            out.push_str(" : ");
            write_ast(false_exp, out);
        }
        AST::PropertyRead { receiver, name, .. } => {
            write_receiver(receiver, ".", out);
            out.push_str(name);
        }
        AST::SafePropertyRead { receiver, name, .. } => {
            write_ast(receiver, out);
            out.push_str("?.");
            out.push_str(name);
        }
        AST::PropertyWrite {
            receiver,
            name,
            value,
            ..
        } => {
            write_receiver(receiver, ".", out);
            out.push_str(name);
            out.push_str(" = ");
            write_ast(value, out);
        }
        AST::KeyedRead { obj, key, .. } => {
            write_ast(obj, out);
            out.push('[');
            write_ast(key, out);
            out.push(']');
        }
        AST::KeyedWrite { obj, key, value, .. } => {
            write_ast(obj, out);
            out.push('[');
            write_ast(key, out);
            out.push_str("] = ");
            write_ast(value, out);
        }
        AST::BindingPipe { exp, name, args, .. } => {
            out.push('(');
            write_ast(exp, out);
            out.push_str(" | ");
            out.push_str(name);
            for arg in args {
                out.push(':');
                write_ast(arg, out);
            }
            out.push(')');
        }
        AST::LiteralPrimitive { value, .. } => match value {
            LiteralValue::Null => out.push_str("null"),
            LiteralValue::Undefined => out.push_str("undefined"),
            LiteralValue::Bool(b) => out.push_str(&b.to_string()),
            LiteralValue::Number(n) => out.push_str(&n.to_string()),
            LiteralValue::String(s) => {
                out.push('"');
                out.push_str(&s.replace('"', "\\\""));
                out.push('"');
            }
        },
        AST::LiteralArray { expressions, .. } => {
            out.push('[');
            write_list(expressions, out);
            out.push(']');
        }
        AST::LiteralMap { keys, values, .. } => {
            out.push('{');
            for (i, (key, value)) in keys.iter().zip(values).enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(key);
                out.push_str(": ");
                write_ast(value, out);
            }
            out.push('}');
        }
        AST::Interpolation {
            strings,
            expressions,
            ..
        } => {
            for (i, s) in strings.iter().enumerate() {
                out.push_str(s);
                if let Some(e) = expressions.get(i) {
                    out.push_str("{{ ");
                    write_ast(e, out);
                    out.push_str(" }}");
                }
            }
        }
        AST::Binary {
            operation,
            left,
            right,
            ..
        } => {
            write_ast(left, out);
            out.push(' ');
            out.push_str(operation);
            out.push(' ');
            write_ast(right, out);
        }
        AST::PrefixNot { expression, .. } => {
            out.push('!');
            write_ast(expression, out);
        }
        AST::MethodCall {
            receiver,
            name,
            args,
            ..
        } => {
            write_receiver(receiver, ".", out);
            out.push_str(name);
            out.push('(');
            write_list(args, out);
            out.push(')');
        }
        AST::SafeMethodCall {
            receiver,
            name,
            args,
            ..
        } => {
            write_ast(receiver, out);
            out.push_str("?.");
            out.push_str(name);
            out.push('(');
            write_list(args, out);
            out.push(')');
        }
        AST::FunctionCall { target, args, .. } => {
            write_ast(target, out);
            out.push('(');
            write_list(args, out);
            out.push(')');
        }
    }
}
