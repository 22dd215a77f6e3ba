//! Reflection seam used by the metadata resolver.
//!
//! Ahead-of-time compilation implements it with the static reflector over
//! metadata files; any other implementation only has to answer the same
//! questions about a type.

use crate::aot::static_symbol::StaticSymbol;
use crate::aot::static_value::{Annotation, StaticValue};
use crate::core::LifecycleHooks;
use crate::error::Result;
use indexmap::IndexMap;
use std::rc::Rc;

pub trait CompileReflector {
    /// Class decorators, inherited ones first.
    fn annotations(&self, ty: &StaticSymbol) -> Result<Vec<Rc<Annotation>>>;

    /// Property decorators keyed by member name.
    fn prop_metadata(&self, ty: &StaticSymbol) -> Result<IndexMap<String, Vec<Rc<Annotation>>>>;

    /// Constructor parameters: the parameter type (if known) followed by its decorators.
    fn parameters(&self, ty: &StaticSymbol) -> Result<Vec<Vec<StaticValue>>>;

    fn has_lifecycle_hook(&self, ty: &StaticSymbol, hook: LifecycleHooks) -> Result<bool>;

    /// Symbol for a runtime identifier exported by `module_url`.
    fn resolve_identifier(&self, name: &str, module_url: &str) -> Result<StaticSymbol>;

    fn resolve_enum(&self, enum_symbol: &StaticSymbol, name: &str) -> StaticSymbol;

    fn import_uri(&self, ty: &StaticSymbol) -> Result<Option<String>>;

    /// Lifecycle hooks implemented by `ty`.
    fn lifecycle_hooks(&self, ty: &StaticSymbol) -> Result<LifecycleHooks> {
        let mut hooks = LifecycleHooks::empty();
        for hook in LifecycleHooks::all_hooks() {
            if self.has_lifecycle_hook(ty, hook)? {
                hooks |= hook;
            }
        }
        Ok(hooks)
    }
}
