//! Test doubles shared by unit tests.

use crate::aot::static_symbol::{StaticSymbol, StaticSymbolCache};
use crate::aot::static_value::{Annotation, MetadataKind, StaticValue};
use crate::compile_reflector::CompileReflector;
use crate::core::LifecycleHooks;
use crate::error::Result;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Reflector answering from tables filled by the test.
#[derive(Default)]
pub struct MockReflector {
    pub cache: Rc<StaticSymbolCache>,
    annotations: RefCell<HashMap<StaticSymbol, Vec<Rc<Annotation>>>>,
    props: RefCell<HashMap<StaticSymbol, IndexMap<String, Vec<Rc<Annotation>>>>>,
    params: RefCell<HashMap<StaticSymbol, Vec<Vec<StaticValue>>>>,
    hooks: RefCell<HashMap<StaticSymbol, LifecycleHooks>>,
}

impl MockReflector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbol(&self, file: &str, name: &str) -> StaticSymbol {
        self.cache.get(file, name, &[])
    }

    pub fn annotate(&self, ty: &StaticSymbol, annotation: Annotation) {
        self.annotations
            .borrow_mut()
            .entry(ty.clone())
            .or_default()
            .push(Rc::new(annotation));
    }

    pub fn decorate_prop(&self, ty: &StaticSymbol, prop: &str, annotation: Annotation) {
        self.props
            .borrow_mut()
            .entry(ty.clone())
            .or_default()
            .entry(prop.to_string())
            .or_default()
            .push(Rc::new(annotation));
    }

    pub fn set_params(&self, ty: &StaticSymbol, params: Vec<Vec<StaticValue>>) {
        self.params.borrow_mut().insert(ty.clone(), params);
    }

    pub fn set_hooks(&self, ty: &StaticSymbol, hooks: LifecycleHooks) {
        self.hooks.borrow_mut().insert(ty.clone(), hooks);
    }
}

impl CompileReflector for MockReflector {
    fn annotations(&self, ty: &StaticSymbol) -> Result<Vec<Rc<Annotation>>> {
        Ok(self.annotations.borrow().get(ty).cloned().unwrap_or_default())
    }

    fn prop_metadata(&self, ty: &StaticSymbol) -> Result<IndexMap<String, Vec<Rc<Annotation>>>> {
        Ok(self.props.borrow().get(ty).cloned().unwrap_or_default())
    }

    fn parameters(&self, ty: &StaticSymbol) -> Result<Vec<Vec<StaticValue>>> {
        Ok(self.params.borrow().get(ty).cloned().unwrap_or_default())
    }

    fn has_lifecycle_hook(&self, ty: &StaticSymbol, hook: LifecycleHooks) -> Result<bool> {
        Ok(self
            .hooks
            .borrow()
            .get(ty)
            .map_or(false, |hooks| hooks.contains(hook)))
    }

    fn resolve_identifier(&self, name: &str, module_url: &str) -> Result<StaticSymbol> {
        Ok(self.cache.get(module_url, name, &[]))
    }

    fn resolve_enum(&self, enum_symbol: &StaticSymbol, name: &str) -> StaticSymbol {
        self.cache
            .get(enum_symbol.file_path(), enum_symbol.name(), &[name])
    }

    fn import_uri(&self, ty: &StaticSymbol) -> Result<Option<String>> {
        Ok(Some(ty.file_path().to_string()))
    }
}

/// `{key: value, ...}` with string values.
pub fn object(entries: &[(&str, StaticValue)]) -> StaticValue {
    StaticValue::Object(
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect(),
    )
}

pub fn strings(values: &[&str]) -> StaticValue {
    StaticValue::Array(values.iter().map(|v| StaticValue::from(*v)).collect())
}

pub fn annotation(kind: MetadataKind, fields: &[(&str, StaticValue)]) -> Annotation {
    fields
        .iter()
        .fold(Annotation::new(kind), |annotation, (key, value)| {
            annotation.with(key, value.clone())
        })
}
