//! Resolves the `@Pipe` annotation of a class.

use crate::aot::static_symbol::StaticSymbol;
use crate::aot::static_value::{Annotation, MetadataKind};
use crate::compile_reflector::CompileReflector;
use crate::error::{CompilerError, Result};
use std::rc::Rc;

pub struct PipeResolver {
    reflector: Rc<dyn CompileReflector>,
}

impl PipeResolver {
    pub fn new(reflector: Rc<dyn CompileReflector>) -> Self {
        PipeResolver { reflector }
    }

    pub fn is_pipe(&self, ty: &StaticSymbol) -> Result<bool> {
        Ok(self
            .reflector
            .annotations(ty)?
            .iter()
            .any(|a| a.kind == MetadataKind::Pipe))
    }

    pub fn resolve(&self, ty: &StaticSymbol, throw_if_not_found: bool) -> Result<Option<Rc<Annotation>>> {
        let annotation = self
            .reflector
            .annotations(ty)?
            .into_iter()
            .rev()
            .find(|a| a.kind == MetadataKind::Pipe);
        match annotation {
            Some(metadata) => Ok(Some(metadata)),
            None if throw_if_not_found => Err(CompilerError::syntax(format!(
                "No Pipe decorator found on {}",
                ty
            ))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{annotation, MockReflector};

    #[test]
    fn should_resolve_the_last_pipe_annotation() {
        let reflector = Rc::new(MockReflector::new());
        let ty = reflector.symbol("/app/pipes.ts", "UpperPipe");
        reflector.annotate(&ty, annotation(MetadataKind::Pipe, &[("name", "old".into())]));
        reflector.annotate(&ty, annotation(MetadataKind::Pipe, &[("name", "upper".into())]));
        let resolver = PipeResolver::new(reflector);
        assert!(resolver.is_pipe(&ty).unwrap());
        let meta = resolver.resolve(&ty, true).unwrap().unwrap();
        assert_eq!(meta.get_str("name"), Some("upper"));
    }

    #[test]
    fn should_report_missing_pipe_decorators() {
        let reflector = Rc::new(MockReflector::new());
        let ty = reflector.symbol("/app/pipes.ts", "Plain");
        let resolver = PipeResolver::new(reflector);
        assert!(!resolver.is_pipe(&ty).unwrap());
        assert!(resolver.resolve(&ty, false).unwrap().is_none());
        assert_eq!(
            resolver.resolve(&ty, true).unwrap_err().to_string(),
            "No Pipe decorator found on Plain"
        );
    }
}
