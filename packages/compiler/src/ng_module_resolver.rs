//! Resolves the `@NgModule` annotation of a class.

use crate::aot::static_symbol::StaticSymbol;
use crate::aot::static_value::{Annotation, MetadataKind};
use crate::compile_reflector::CompileReflector;
use crate::error::{CompilerError, Result};
use std::rc::Rc;

pub struct NgModuleResolver {
    reflector: Rc<dyn CompileReflector>,
}

impl NgModuleResolver {
    pub fn new(reflector: Rc<dyn CompileReflector>) -> Self {
        NgModuleResolver { reflector }
    }

    pub fn is_ng_module(&self, ty: &StaticSymbol) -> Result<bool> {
        Ok(self.find(ty)?.is_some())
    }

    pub fn resolve(&self, ty: &StaticSymbol, throw_if_not_found: bool) -> Result<Option<Rc<Annotation>>> {
        match self.find(ty)? {
            Some(metadata) => Ok(Some(metadata)),
            None if throw_if_not_found => Err(CompilerError::syntax(format!(
                "No NgModule metadata found for '{}'.",
                ty
            ))),
            None => Ok(None),
        }
    }

    fn find(&self, ty: &StaticSymbol) -> Result<Option<Rc<Annotation>>> {
        Ok(self
            .reflector
            .annotations(ty)?
            .into_iter()
            .rev()
            .find(|a| a.kind == MetadataKind::NgModule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{annotation, MockReflector};

    #[test]
    fn should_read_out_the_ng_module_metadata() {
        let reflector = Rc::new(MockReflector::new());
        let ty = reflector.symbol("/app/app.module.ts", "AppModule");
        reflector.annotate(&ty, annotation(MetadataKind::NgModule, &[("id", "app".into())]));
        let resolver = NgModuleResolver::new(reflector);
        assert!(resolver.is_ng_module(&ty).unwrap());
        let meta = resolver.resolve(&ty, true).unwrap().unwrap();
        assert_eq!(meta.get_str("id"), Some("app"));
    }

    #[test]
    fn should_throw_when_there_is_no_ng_module_decorator() {
        let reflector = Rc::new(MockReflector::new());
        let ty = reflector.symbol("/app/app.module.ts", "SomeClass");
        reflector.annotate(&ty, annotation(MetadataKind::Injectable, &[]));
        let resolver = NgModuleResolver::new(reflector);
        assert_eq!(
            resolver.resolve(&ty, true).unwrap_err().to_string(),
            "No NgModule metadata found for 'SomeClass'."
        );
    }
}
