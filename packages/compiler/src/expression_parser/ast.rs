//! Angular Expression AST
//!
//! Node types for template expressions. Spans are offsets into the
//! expression source.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseSpan {
    pub start: usize,
    pub end: usize,
}

impl ParseSpan {
    pub fn new(start: usize, end: usize) -> Self {
        ParseSpan { start, end }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Undefined,
    Bool(bool),
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AST {
    EmptyExpr {
        span: ParseSpan,
    },
    ImplicitReceiver {
        span: ParseSpan,
    },
    /// A binding the expression parser leaves uninterpreted, such as
    /// `javascript:doSomething()`.
    Quote {
        span: ParseSpan,
        prefix: String,
        uninterpreted_expression: String,
        location: String,
    },
    Chain {
        span: ParseSpan,
        expressions: Vec<AST>,
    },
    Conditional {
        span: ParseSpan,
        condition: Box<AST>,
        true_exp: Box<AST>,
        false_exp: Box<AST>,
    },
    PropertyRead {
        span: ParseSpan,
        receiver: Box<AST>,
        name: String,
    },
    PropertyWrite {
        span: ParseSpan,
        receiver: Box<AST>,
        name: String,
        value: Box<AST>,
    },
    SafePropertyRead {
        span: ParseSpan,
        receiver: Box<AST>,
        name: String,
    },
    KeyedRead {
        span: ParseSpan,
        obj: Box<AST>,
        key: Box<AST>,
    },
    KeyedWrite {
        span: ParseSpan,
        obj: Box<AST>,
        key: Box<AST>,
        value: Box<AST>,
    },
    BindingPipe {
        span: ParseSpan,
        exp: Box<AST>,
        name: String,
        args: Vec<AST>,
    },
    LiteralPrimitive {
        span: ParseSpan,
        value: LiteralValue,
    },
    LiteralArray {
        span: ParseSpan,
        expressions: Vec<AST>,
    },
    LiteralMap {
        span: ParseSpan,
        keys: Vec<String>,
        values: Vec<AST>,
    },
    Interpolation {
        span: ParseSpan,
        strings: Vec<String>,
        expressions: Vec<AST>,
    },
    Binary {
        span: ParseSpan,
        operation: String,
        left: Box<AST>,
        right: Box<AST>,
    },
    PrefixNot {
        span: ParseSpan,
        expression: Box<AST>,
    },
    MethodCall {
        span: ParseSpan,
        receiver: Box<AST>,
        name: String,
        args: Vec<AST>,
    },
    SafeMethodCall {
        span: ParseSpan,
        receiver: Box<AST>,
        name: String,
        args: Vec<AST>,
    },
    FunctionCall {
        span: ParseSpan,
        target: Box<AST>,
        args: Vec<AST>,
    },
}

impl AST {
    pub fn span(&self) -> ParseSpan {
        match self {
            AST::EmptyExpr { span }
            | AST::ImplicitReceiver { span }
            | AST::Quote { span, .. }
            | AST::Chain { span, .. }
            | AST::Conditional { span, .. }
            | AST::PropertyRead { span, .. }
            | AST::PropertyWrite { span, .. }
            | AST::SafePropertyRead { span, .. }
            | AST::KeyedRead { span, .. }
            | AST::KeyedWrite { span, .. }
            | AST::BindingPipe { span, .. }
            | AST::LiteralPrimitive { span, .. }
            | AST::LiteralArray { span, .. }
            | AST::LiteralMap { span, .. }
            | AST::Interpolation { span, .. }
            | AST::Binary { span, .. }
            | AST::PrefixNot { span, .. }
            | AST::MethodCall { span, .. }
            | AST::SafeMethodCall { span, .. }
            | AST::FunctionCall { span, .. } => *span,
        }
    }

    pub fn is_implicit_receiver(&self) -> bool {
        matches!(self, AST::ImplicitReceiver { .. })
    }

    /// Visits this node and its descendants, parents first.
    pub fn walk(&self, f: &mut dyn FnMut(&AST)) {
        f(self);
        match self {
            AST::EmptyExpr { .. }
            | AST::ImplicitReceiver { .. }
            | AST::Quote { .. }
            | AST::LiteralPrimitive { .. } => {}
            AST::Chain { expressions, .. }
            | AST::LiteralArray { expressions, .. }
            | AST::Interpolation { expressions, .. } => {
                expressions.iter().for_each(|e| e.walk(f))
            }
            AST::LiteralMap { values, .. } => values.iter().for_each(|e| e.walk(f)),
            AST::Conditional {
                condition,
                true_exp,
                false_exp,
                ..
            } => {
                condition.walk(f);
                true_exp.walk(f);
                false_exp.walk(f);
            }
            AST::PropertyRead { receiver, .. } | AST::SafePropertyRead { receiver, .. } => {
                receiver.walk(f)
            }
            AST::PropertyWrite {
                receiver, value, ..
            } => {
                receiver.walk(f);
                value.walk(f);
            }
            AST::KeyedRead { obj, key, .. } => {
                obj.walk(f);
                key.walk(f);
            }
            AST::KeyedWrite { obj, key, value, .. } => {
                obj.walk(f);
                key.walk(f);
                value.walk(f);
            }
            AST::BindingPipe { exp, args, .. } => {
                exp.walk(f);
                args.iter().for_each(|e| e.walk(f));
            }
            AST::Binary { left, right, .. } => {
                left.walk(f);
                right.walk(f);
            }
            AST::PrefixNot { expression, .. } => expression.walk(f),
            AST::MethodCall { receiver, args, .. } | AST::SafeMethodCall { receiver, args, .. } => {
                receiver.walk(f);
                args.iter().for_each(|e| e.walk(f));
            }
            AST::FunctionCall { target, args, .. } => {
                target.walk(f);
                args.iter().for_each(|e| e.walk(f));
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParserError {
    pub message: String,
    pub input: String,
    pub err_location: String,
    pub ctx_location: String,
}

impl ParserError {
    pub fn new(message: &str, input: &str, err_location: &str, ctx_location: &str) -> Self {
        ParserError {
            message: format!(
                "Parser Error: {} {} [{}] in {}",
                message, err_location, input, ctx_location
            ),
            input: input.to_string(),
            err_location: err_location.to_string(),
            ctx_location: ctx_location.to_string(),
        }
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ASTWithSource {
    pub ast: AST,
    pub source: String,
    pub location: String,
    pub errors: Vec<ParserError>,
}

impl fmt::Display for ASTWithSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.source, self.location)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateBinding {
    pub span: ParseSpan,
    pub key: String,
    pub key_is_var: bool,
    pub name: Option<String>,
    pub expression: Option<ASTWithSource>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateBindingParseResult {
    pub template_bindings: Vec<TemplateBinding>,
    pub warnings: Vec<String>,
    pub errors: Vec<ParserError>,
}
