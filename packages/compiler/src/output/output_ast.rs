//! Output AST
//!
//! Statement and expression tree for generated programs. Compilers build
//! programs with the helpers at the bottom of this file; backends either
//! print them (`JavaScriptEmitter`) or hand them to a `JitEvaluator`.
//!
//! References to code outside the program are `ExternalReference`s: either a
//! resolved `StaticSymbol`, or a `Placeholder` for an artifact whose final
//! location is only known once every component has been compiled.

use crate::aot::static_symbol::StaticSymbol;
use crate::error::{CompilerError, Result};
use once_cell::unsync::OnceCell;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Equals,
    NotEquals,
    Identical,
    NotIdentical,
    Minus,
    Plus,
    Divide,
    Multiply,
    Modulo,
    And,
    Or,
    Lower,
    LowerEquals,
    Bigger,
    BiggerEquals,
}

impl BinaryOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOperator::Equals => "==",
            BinaryOperator::NotEquals => "!=",
            BinaryOperator::Identical => "===",
            BinaryOperator::NotIdentical => "!==",
            BinaryOperator::Minus => "-",
            BinaryOperator::Plus => "+",
            BinaryOperator::Divide => "/",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Modulo => "%",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
            BinaryOperator::Lower => "<",
            BinaryOperator::LowerEquals => "<=",
            BinaryOperator::Bigger => ">",
            BinaryOperator::BiggerEquals => ">=",
        }
    }

    /// Maps a template expression operator to its output counterpart.
    pub fn from_template_operator(op: &str) -> Option<Self> {
        Some(match op {
            "==" => BinaryOperator::Equals,
            "!=" => BinaryOperator::NotEquals,
            "===" => BinaryOperator::Identical,
            "!==" => BinaryOperator::NotIdentical,
            "-" => BinaryOperator::Minus,
            "+" => BinaryOperator::Plus,
            "/" => BinaryOperator::Divide,
            "*" => BinaryOperator::Multiply,
            "%" => BinaryOperator::Modulo,
            "&&" => BinaryOperator::And,
            "||" => BinaryOperator::Or,
            "<" => BinaryOperator::Lower,
            "<=" => BinaryOperator::LowerEquals,
            ">" => BinaryOperator::Bigger,
            ">=" => BinaryOperator::BiggerEquals,
            _ => return None,
        })
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

impl From<String> for LiteralValue {
    fn from(s: String) -> Self {
        LiteralValue::String(s)
    }
}

impl From<&str> for LiteralValue {
    fn from(s: &str) -> Self {
        LiteralValue::String(s.to_string())
    }
}

impl From<f64> for LiteralValue {
    fn from(n: f64) -> Self {
        LiteralValue::Number(n)
    }
}

impl From<usize> for LiteralValue {
    fn from(n: usize) -> Self {
        LiteralValue::Number(n as f64)
    }
}

impl From<bool> for LiteralValue {
    fn from(b: bool) -> Self {
        LiteralValue::Bool(b)
    }
}

/// Opaque value produced by evaluating a program at runtime.
#[derive(Clone)]
pub struct RuntimeValue(Rc<dyn Any>);

impl RuntimeValue {
    pub fn new<T: Any>(value: T) -> Self {
        RuntimeValue(Rc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    pub fn ptr_eq(&self, other: &RuntimeValue) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RuntimeValue(..)")
    }
}

/// What a placeholder was patched with.
#[derive(Debug, Clone)]
pub enum ResolvedReference {
    /// Export of a generated file (AOT).
    Symbol(StaticSymbol),
    /// In-memory artifact (JIT).
    Runtime(RuntimeValue),
}

/// Write-once cell standing in for a not yet compiled artifact. Clones share
/// the cell, so the copy embedded in a program sees the later patch.
#[derive(Clone)]
pub struct Placeholder {
    name: Rc<str>,
    cell: Rc<OnceCell<ResolvedReference>>,
}

impl Placeholder {
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Placeholder {
            name: name.into(),
            cell: Rc::new(OnceCell::new()),
        }
    }

    /// Name the placeholder was created for, used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resolve(&self, reference: ResolvedReference) -> Result<()> {
        self.cell.set(reference).map_err(|_| {
            CompilerError::illegal_state(format!(
                "Illegal state: placeholder for {} is already resolved!",
                self.name
            ))
        })
    }

    pub fn resolved(&self) -> Option<&ResolvedReference> {
        self.cell.get()
    }

    pub fn ptr_eq(&self, other: &Placeholder) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl fmt::Debug for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Placeholder")
            .field("name", &self.name)
            .field("resolved", &self.cell.get())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum ExternalReference {
    Symbol(StaticSymbol),
    Placeholder(Placeholder),
}

impl ExternalReference {
    /// The symbol this reference points to, following a patched placeholder.
    pub fn symbol(&self) -> Option<&StaticSymbol> {
        match self {
            ExternalReference::Symbol(symbol) => Some(symbol),
            ExternalReference::Placeholder(placeholder) => match placeholder.resolved() {
                Some(ResolvedReference::Symbol(symbol)) => Some(symbol),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct FnParam {
    pub name: String,
}

impl FnParam {
    pub fn new(name: impl Into<String>) -> Self {
        FnParam { name: name.into() }
    }
}

#[derive(Debug, Clone)]
pub struct LiteralMapEntry {
    pub key: String,
    pub value: Expression,
    pub quoted: bool,
}

impl LiteralMapEntry {
    pub fn new(key: impl Into<String>, value: Expression) -> Self {
        LiteralMapEntry {
            key: key.into(),
            value,
            quoted: false,
        }
    }
}

///// Expressions

#[derive(Debug, Clone)]
pub enum Expression {
    ReadVar(ReadVarExpr),
    WriteVar(WriteVarExpr),
    ReadProp(ReadPropExpr),
    WriteProp(WritePropExpr),
    ReadKey(ReadKeyExpr),
    WriteKey(WriteKeyExpr),
    InvokeMethod(InvokeMethodExpr),
    InvokeFn(InvokeFunctionExpr),
    Instantiate(InstantiateExpr),
    Literal(LiteralValue),
    External(ExternalReference),
    Conditional(ConditionalExpr),
    Not(Box<Expression>),
    Fn(FunctionExpr),
    BinaryOp(BinaryOperatorExpr),
    LiteralArray(Vec<Expression>),
    LiteralMap(Vec<LiteralMapEntry>),
}

#[derive(Debug, Clone)]
pub struct ReadVarExpr {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct WriteVarExpr {
    pub name: String,
    pub value: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct ReadPropExpr {
    pub receiver: Box<Expression>,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct WritePropExpr {
    pub receiver: Box<Expression>,
    pub name: String,
    pub value: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct ReadKeyExpr {
    pub receiver: Box<Expression>,
    pub index: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct WriteKeyExpr {
    pub receiver: Box<Expression>,
    pub index: Box<Expression>,
    pub value: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct InvokeMethodExpr {
    pub receiver: Box<Expression>,
    pub name: String,
    pub args: Vec<Expression>,
}

#[derive(Debug, Clone)]
pub struct InvokeFunctionExpr {
    pub fn_: Box<Expression>,
    pub args: Vec<Expression>,
}

#[derive(Debug, Clone)]
pub struct InstantiateExpr {
    pub class_expr: Box<Expression>,
    pub args: Vec<Expression>,
}

#[derive(Debug, Clone)]
pub struct ConditionalExpr {
    pub condition: Box<Expression>,
    pub true_case: Box<Expression>,
    pub false_case: Option<Box<Expression>>,
}

#[derive(Debug, Clone)]
pub struct FunctionExpr {
    pub params: Vec<FnParam>,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub struct BinaryOperatorExpr {
    pub operator: BinaryOperator,
    pub lhs: Box<Expression>,
    pub rhs: Box<Expression>,
}

///// Statements

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StmtModifier {
    Final,
    Private,
}

#[derive(Debug, Clone)]
pub enum Statement {
    DeclareVar(DeclareVarStmt),
    DeclareFn(DeclareFunctionStmt),
    Expression(Expression),
    Return(Expression),
    DeclareClass(ClassStmt),
    If(IfStmt),
    TryCatch(TryCatchStmt),
    Throw(Expression),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct DeclareVarStmt {
    pub name: String,
    pub value: Expression,
    pub modifiers: Vec<StmtModifier>,
}

#[derive(Debug, Clone)]
pub struct DeclareFunctionStmt {
    pub name: String,
    pub params: Vec<FnParam>,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub condition: Expression,
    pub true_case: Vec<Statement>,
    pub false_case: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub struct TryCatchStmt {
    pub body_stmts: Vec<Statement>,
    pub catch_stmts: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub struct ClassField {
    pub name: String,
    pub modifiers: Vec<StmtModifier>,
}

impl ClassField {
    pub fn new(name: impl Into<String>) -> Self {
        ClassField {
            name: name.into(),
            modifiers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassGetter {
    pub name: String,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub struct ClassMethod {
    pub name: String,
    pub params: Vec<FnParam>,
    pub body: Vec<Statement>,
}

impl ClassMethod {
    pub fn new(name: impl Into<String>, params: Vec<FnParam>, body: Vec<Statement>) -> Self {
        ClassMethod {
            name: name.into(),
            params,
            body,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassStmt {
    pub name: String,
    pub parent: Option<Expression>,
    pub fields: Vec<ClassField>,
    pub getters: Vec<ClassGetter>,
    pub constructor_method: Option<ClassMethod>,
    pub methods: Vec<ClassMethod>,
}

impl Statement {
    /// Name this statement declares at module level, if any.
    pub fn declared_name(&self) -> Option<&str> {
        match self {
            Statement::DeclareVar(stmt) => Some(&stmt.name),
            Statement::DeclareFn(stmt) => Some(&stmt.name),
            Statement::DeclareClass(stmt) => Some(&stmt.name),
            _ => None,
        }
    }
}

///// Builders

pub fn variable(name: impl Into<String>) -> Expression {
    Expression::ReadVar(ReadVarExpr { name: name.into() })
}

pub fn this_expr() -> Expression {
    variable("this")
}

pub fn super_expr() -> Expression {
    variable("super")
}

pub fn literal(value: impl Into<LiteralValue>) -> Expression {
    Expression::Literal(value.into())
}

pub fn null_expr() -> Expression {
    Expression::Literal(LiteralValue::Null)
}

pub fn literal_arr(values: Vec<Expression>) -> Expression {
    Expression::LiteralArray(values)
}

pub fn literal_map(entries: Vec<LiteralMapEntry>) -> Expression {
    Expression::LiteralMap(entries)
}

/// `{key: value}` from pairs, keys unquoted.
pub fn literal_map_of<K: Into<String>>(entries: impl IntoIterator<Item = (K, Expression)>) -> Expression {
    literal_map(
        entries
            .into_iter()
            .map(|(key, value)| LiteralMapEntry::new(key, value))
            .collect(),
    )
}

pub fn import_expr(symbol: StaticSymbol) -> Expression {
    Expression::External(ExternalReference::Symbol(symbol))
}

pub fn placeholder_expr(placeholder: &Placeholder) -> Expression {
    Expression::External(ExternalReference::Placeholder(placeholder.clone()))
}

pub fn not(expr: Expression) -> Expression {
    Expression::Not(Box::new(expr))
}

pub fn fn_expr(params: Vec<FnParam>, statements: Vec<Statement>) -> Expression {
    Expression::Fn(FunctionExpr { params, statements })
}

pub fn if_stmt(condition: Expression, true_case: Vec<Statement>) -> Statement {
    Statement::If(IfStmt {
        condition,
        true_case,
        false_case: Vec::new(),
    })
}

pub fn return_stmt(value: Expression) -> Statement {
    Statement::Return(value)
}

pub fn throw_stmt(error: Expression) -> Statement {
    Statement::Throw(error)
}

pub fn comment_stmt(comment: impl Into<String>) -> Statement {
    Statement::Comment(comment.into())
}

impl Expression {
    pub fn prop(self, name: impl Into<String>) -> Expression {
        Expression::ReadProp(ReadPropExpr {
            receiver: Box::new(self),
            name: name.into(),
        })
    }

    pub fn key(self, index: Expression) -> Expression {
        Expression::ReadKey(ReadKeyExpr {
            receiver: Box::new(self),
            index: Box::new(index),
        })
    }

    pub fn call_method(self, name: impl Into<String>, args: Vec<Expression>) -> Expression {
        Expression::InvokeMethod(InvokeMethodExpr {
            receiver: Box::new(self),
            name: name.into(),
            args,
        })
    }

    pub fn call_fn(self, args: Vec<Expression>) -> Expression {
        Expression::InvokeFn(InvokeFunctionExpr {
            fn_: Box::new(self),
            args,
        })
    }

    pub fn instantiate(self, args: Vec<Expression>) -> Expression {
        Expression::Instantiate(InstantiateExpr {
            class_expr: Box::new(self),
            args,
        })
    }

    pub fn conditional(self, true_case: Expression, false_case: Option<Expression>) -> Expression {
        Expression::Conditional(ConditionalExpr {
            condition: Box::new(self),
            true_case: Box::new(true_case),
            false_case: false_case.map(Box::new),
        })
    }

    pub fn binary(self, operator: BinaryOperator, rhs: Expression) -> Expression {
        Expression::BinaryOp(BinaryOperatorExpr {
            operator,
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        })
    }

    pub fn equals(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::Equals, rhs)
    }

    pub fn identical(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::Identical, rhs)
    }

    pub fn not_identical(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::NotIdentical, rhs)
    }

    pub fn and(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::And, rhs)
    }

    pub fn or(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::Or, rhs)
    }

    pub fn plus(self, rhs: Expression) -> Expression {
        self.binary(BinaryOperator::Plus, rhs)
    }

    pub fn is_blank(self) -> Expression {
        self.equals(null_expr())
    }

    /// Assignment to this variable, property or key.
    pub fn set(self, value: Expression) -> Result<Expression> {
        let value = Box::new(value);
        Ok(match self {
            Expression::ReadVar(read) => Expression::WriteVar(WriteVarExpr {
                name: read.name,
                value,
            }),
            Expression::ReadProp(read) => Expression::WriteProp(WritePropExpr {
                receiver: read.receiver,
                name: read.name,
                value,
            }),
            Expression::ReadKey(read) => Expression::WriteKey(WriteKeyExpr {
                receiver: read.receiver,
                index: read.index,
                value,
            }),
            other => {
                return Err(CompilerError::illegal_state(format!(
                    "Cannot assign to {:?}",
                    other
                )))
            }
        })
    }

    pub fn to_stmt(self) -> Statement {
        Statement::Expression(self)
    }

    /// `var name = this;` / `const name = this;` when `is_final`.
    pub fn to_decl_stmt(self, name: impl Into<String>, is_final: bool) -> Statement {
        Statement::DeclareVar(DeclareVarStmt {
            name: name.into(),
            value: self,
            modifiers: if is_final {
                vec![StmtModifier::Final]
            } else {
                Vec::new()
            },
        })
    }

    /// Replaces every read of `this` with `receiver`. Function bodies keep
    /// their own `this`.
    pub fn rebase_this(self, receiver: &Expression) -> Expression {
        let rebase = |e: Box<Expression>| Box::new((*e).rebase_this(receiver));
        let rebase_all = |args: Vec<Expression>| -> Vec<Expression> {
            args.into_iter().map(|a| a.rebase_this(receiver)).collect()
        };
        match self {
            Expression::ReadVar(read) if read.name == "this" => receiver.clone(),
            Expression::WriteVar(e) => Expression::WriteVar(WriteVarExpr {
                name: e.name,
                value: rebase(e.value),
            }),
            Expression::ReadProp(e) => Expression::ReadProp(ReadPropExpr {
                receiver: rebase(e.receiver),
                name: e.name,
            }),
            Expression::WriteProp(e) => Expression::WriteProp(WritePropExpr {
                receiver: rebase(e.receiver),
                name: e.name,
                value: rebase(e.value),
            }),
            Expression::ReadKey(e) => Expression::ReadKey(ReadKeyExpr {
                receiver: rebase(e.receiver),
                index: rebase(e.index),
            }),
            Expression::WriteKey(e) => Expression::WriteKey(WriteKeyExpr {
                receiver: rebase(e.receiver),
                index: rebase(e.index),
                value: rebase(e.value),
            }),
            Expression::InvokeMethod(e) => Expression::InvokeMethod(InvokeMethodExpr {
                receiver: rebase(e.receiver),
                name: e.name,
                args: rebase_all(e.args),
            }),
            Expression::InvokeFn(e) => Expression::InvokeFn(InvokeFunctionExpr {
                fn_: rebase(e.fn_),
                args: rebase_all(e.args),
            }),
            Expression::Instantiate(e) => Expression::Instantiate(InstantiateExpr {
                class_expr: rebase(e.class_expr),
                args: rebase_all(e.args),
            }),
            Expression::Conditional(e) => Expression::Conditional(ConditionalExpr {
                condition: rebase(e.condition),
                true_case: rebase(e.true_case),
                false_case: e.false_case.map(rebase),
            }),
            Expression::Not(e) => Expression::Not(rebase(e)),
            Expression::BinaryOp(e) => Expression::BinaryOp(BinaryOperatorExpr {
                operator: e.operator,
                lhs: rebase(e.lhs),
                rhs: rebase(e.rhs),
            }),
            Expression::LiteralArray(entries) => Expression::LiteralArray(rebase_all(entries)),
            Expression::LiteralMap(entries) => Expression::LiteralMap(
                entries
                    .into_iter()
                    .map(|entry| LiteralMapEntry {
                        value: entry.value.rebase_this(receiver),
                        ..entry
                    })
                    .collect(),
            ),
            other => other,
        }
    }

    pub fn is_literal_null(&self) -> bool {
        matches!(self, Expression::Literal(LiteralValue::Null))
    }
}

/// `this.name = value;` without the fallible path of `set`.
pub fn assign_prop(receiver: Expression, name: impl Into<String>, value: Expression) -> Statement {
    Expression::WriteProp(WritePropExpr {
        receiver: Box::new(receiver),
        name: name.into(),
        value: Box::new(value),
    })
    .to_stmt()
}

pub fn assign_var(name: impl Into<String>, value: Expression) -> Statement {
    Expression::WriteVar(WriteVarExpr {
        name: name.into(),
        value: Box::new(value),
    })
    .to_stmt()
}

/// Every external reference in `stmts`, in emission order.
pub fn collect_external_references(stmts: &[Statement]) -> Vec<ExternalReference> {
    let mut refs = Vec::new();
    for stmt in stmts {
        visit_statement(stmt, &mut |expr| {
            if let Expression::External(reference) = expr {
                refs.push(reference.clone());
            }
        });
    }
    refs
}

fn visit_statement(stmt: &Statement, f: &mut dyn FnMut(&Expression)) {
    match stmt {
        Statement::DeclareVar(s) => visit_expression(&s.value, f),
        Statement::DeclareFn(s) => s.statements.iter().for_each(|s| visit_statement(s, f)),
        Statement::Expression(e) | Statement::Return(e) | Statement::Throw(e) => {
            visit_expression(e, f)
        }
        Statement::DeclareClass(class) => {
            if let Some(parent) = &class.parent {
                visit_expression(parent, f);
            }
            for getter in &class.getters {
                getter.body.iter().for_each(|s| visit_statement(s, f));
            }
            for method in class.constructor_method.iter().chain(&class.methods) {
                method.body.iter().for_each(|s| visit_statement(s, f));
            }
        }
        Statement::If(s) => {
            visit_expression(&s.condition, f);
            s.true_case.iter().for_each(|s| visit_statement(s, f));
            s.false_case.iter().for_each(|s| visit_statement(s, f));
        }
        Statement::TryCatch(s) => {
            s.body_stmts.iter().for_each(|s| visit_statement(s, f));
            s.catch_stmts.iter().for_each(|s| visit_statement(s, f));
        }
        Statement::Comment(_) => {}
    }
}

fn visit_expression(expr: &Expression, f: &mut dyn FnMut(&Expression)) {
    f(expr);
    match expr {
        Expression::ReadVar(_) | Expression::Literal(_) | Expression::External(_) => {}
        Expression::WriteVar(e) => visit_expression(&e.value, f),
        Expression::ReadProp(e) => visit_expression(&e.receiver, f),
        Expression::WriteProp(e) => {
            visit_expression(&e.receiver, f);
            visit_expression(&e.value, f);
        }
        Expression::ReadKey(e) => {
            visit_expression(&e.receiver, f);
            visit_expression(&e.index, f);
        }
        Expression::WriteKey(e) => {
            visit_expression(&e.receiver, f);
            visit_expression(&e.index, f);
            visit_expression(&e.value, f);
        }
        Expression::InvokeMethod(e) => {
            visit_expression(&e.receiver, f);
            e.args.iter().for_each(|a| visit_expression(a, f));
        }
        Expression::InvokeFn(e) => {
            visit_expression(&e.fn_, f);
            e.args.iter().for_each(|a| visit_expression(a, f));
        }
        Expression::Instantiate(e) => {
            visit_expression(&e.class_expr, f);
            e.args.iter().for_each(|a| visit_expression(a, f));
        }
        Expression::Conditional(e) => {
            visit_expression(&e.condition, f);
            visit_expression(&e.true_case, f);
            if let Some(false_case) = &e.false_case {
                visit_expression(false_case, f);
            }
        }
        Expression::Not(e) => visit_expression(e, f),
        Expression::Fn(e) => e.statements.iter().for_each(|s| visit_statement(s, f)),
        Expression::BinaryOp(e) => {
            visit_expression(&e.lhs, f);
            visit_expression(&e.rhs, f);
        }
        Expression::LiteralArray(entries) => entries.iter().for_each(|e| visit_expression(e, f)),
        Expression::LiteralMap(entries) => entries.iter().for_each(|e| visit_expression(&e.value, f)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aot::static_symbol::StaticSymbolCache;

    #[test]
    fn should_turn_reads_into_writes() {
        let write = this_expr().prop("x").set(literal(1.0)).unwrap();
        assert!(matches!(write, Expression::WriteProp(ref w) if w.name == "x"));
        let write = variable("a").key(literal("k")).set(null_expr()).unwrap();
        assert!(matches!(write, Expression::WriteKey(_)));
        assert!(literal(1.0).set(null_expr()).is_err());
    }

    #[test]
    fn should_patch_placeholders_once() {
        let cache = StaticSymbolCache::new();
        let placeholder = Placeholder::new("View_App0");
        let expr = placeholder_expr(&placeholder);
        let symbol = cache.get("/app/app.ngfactory.js", "View_App0", &[]);
        placeholder
            .resolve(ResolvedReference::Symbol(symbol.clone()))
            .unwrap();
        match expr {
            Expression::External(reference) => assert!(reference.symbol().unwrap().ptr_eq(&symbol)),
            _ => panic!("expected an external reference"),
        }
        let err = placeholder
            .resolve(ResolvedReference::Symbol(symbol))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Illegal state: placeholder for View_App0 is already resolved!"
        );
    }

    #[test]
    fn should_collect_references_inside_classes() {
        let cache = StaticSymbolCache::new();
        let app_view = cache.get("/core/view.d.ts", "AppView", &[]);
        let noop = cache.get("/core/view_utils.d.ts", "noop", &[]);
        let class = Statement::DeclareClass(ClassStmt {
            name: "View_A0".to_string(),
            parent: Some(import_expr(app_view.clone())),
            fields: vec![],
            getters: vec![],
            constructor_method: None,
            methods: vec![ClassMethod::new(
                "detectChangesInternal",
                vec![],
                vec![import_expr(noop.clone()).call_fn(vec![]).to_stmt()],
            )],
        });
        let names: Vec<String> = collect_external_references(&[class])
            .iter()
            .filter_map(|r| r.symbol().map(|s| s.name().to_string()))
            .collect();
        assert_eq!(names, vec!["AppView", "noop"]);
    }
}
