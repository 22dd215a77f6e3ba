//! Incremental construction of a generated class.

use super::output_ast::{ClassField, ClassGetter, ClassMethod, ClassStmt, Expression, FnParam, Statement};

#[derive(Debug, Default)]
pub struct ClassBuilder {
    pub fields: Vec<ClassField>,
    pub getters: Vec<ClassGetter>,
    pub methods: Vec<ClassMethod>,
    pub ctor_stmts: Vec<Statement>,
}

impl ClassBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_field(&mut self, name: impl Into<String>) {
        self.fields.push(ClassField::new(name));
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn add_method(&mut self, method: ClassMethod) {
        self.methods.push(method);
    }

    /// Finishes the class. `ctor_params` and `ctor_prefix` (usually the
    /// `super(...)` call) go before the collected constructor statements.
    pub fn build(
        self,
        name: impl Into<String>,
        parent: Option<Expression>,
        ctor_params: Vec<FnParam>,
        ctor_prefix: Vec<Statement>,
    ) -> ClassStmt {
        let mut ctor_body = ctor_prefix;
        ctor_body.extend(self.ctor_stmts);
        ClassStmt {
            name: name.into(),
            parent,
            fields: self.fields,
            getters: self.getters,
            constructor_method: Some(ClassMethod::new("constructor", ctor_params, ctor_body)),
            methods: self.methods,
        }
    }
}
