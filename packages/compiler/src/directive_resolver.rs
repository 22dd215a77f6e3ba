//! Directive Resolver
//!
//! Finds the `@Directive`/`@Component` annotation of a class and folds its
//! property decorators (`@Input`, `@Output`, `@HostBinding`, `@HostListener`
//! and queries) into it.

use crate::aot::static_symbol::StaticSymbol;
use crate::aot::static_value::{Annotation, MetadataKind, StaticValue};
use crate::compile_reflector::CompileReflector;
use crate::error::{CompilerError, Result};
use crate::util::split_at_colon;
use indexmap::{IndexMap, IndexSet};
use std::rc::Rc;

pub struct DirectiveResolver {
    reflector: Rc<dyn CompileReflector>,
}

impl DirectiveResolver {
    pub fn new(reflector: Rc<dyn CompileReflector>) -> Self {
        DirectiveResolver { reflector }
    }

    pub fn is_directive(&self, ty: &StaticSymbol) -> Result<bool> {
        Ok(self
            .reflector
            .annotations(ty)?
            .iter()
            .any(|a| a.kind.is_a(MetadataKind::Directive)))
    }

    /// The last directive annotation of `ty`, merged with its property
    /// decorators.
    pub fn resolve(&self, ty: &StaticSymbol, throw_if_not_found: bool) -> Result<Option<Annotation>> {
        let annotations = self.reflector.annotations(ty)?;
        match annotations
            .iter()
            .rev()
            .find(|a| a.kind.is_a(MetadataKind::Directive))
        {
            Some(metadata) => {
                let prop_metadata = self.reflector.prop_metadata(ty)?;
                Ok(Some(merge_with_property_metadata(metadata, &prop_metadata)))
            }
            None if throw_if_not_found => Err(CompilerError::syntax(format!(
                "No Directive annotation found on {}",
                ty
            ))),
            None => Ok(None),
        }
    }
}

fn merge_with_property_metadata(
    directive: &Annotation,
    prop_metadata: &IndexMap<String, Vec<Rc<Annotation>>>,
) -> Annotation {
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    let mut host = IndexMap::new();
    let mut queries = IndexMap::new();

    for (prop_name, decorators) in prop_metadata {
        for decorator in decorators {
            match decorator.kind {
                MetadataKind::Input => inputs.push(binding_config(prop_name, decorator)),
                MetadataKind::Output => outputs.push(binding_config(prop_name, decorator)),
                MetadataKind::HostBinding => {
                    let host_property = decorator.get_str("hostPropertyName").unwrap_or(prop_name);
                    host.insert(
                        format!("[{}]", host_property),
                        StaticValue::String(prop_name.clone()),
                    );
                }
                MetadataKind::HostListener => {
                    let args: Vec<String> = decorator
                        .get_array("args")
                        .iter()
                        .map(StaticValue::to_js_string)
                        .collect();
                    let event_name = decorator.get_str("eventName").unwrap_or_default();
                    host.insert(
                        format!("({})", event_name),
                        StaticValue::String(format!("{}({})", prop_name, args.join(","))),
                    );
                }
                kind if kind.is_query() => {
                    queries.insert(prop_name.clone(), StaticValue::Annotation(decorator.clone()));
                }
                _ => {}
            }
        }
    }
    merge(directive, inputs, outputs, host, queries)
}

fn binding_config(prop_name: &str, decorator: &Annotation) -> String {
    match decorator.get_str("bindingPropertyName") {
        Some(binding_name) => format!("{}: {}", prop_name, binding_name),
        None => prop_name.to_string(),
    }
}

fn string_list(values: &[StaticValue]) -> Vec<String> {
    values.iter().filter_map(|v| v.as_str().map(str::to_string)).collect()
}

/// Keeps the last binding per directive property; property decorators come
/// after the annotation's own list and therefore win.
fn dedupe_bindings(bindings: Vec<String>) -> Vec<String> {
    let mut names = IndexSet::new();
    let mut reversed = Vec::new();
    for binding in bindings.into_iter().rev() {
        let (name, _) = split_at_colon(&binding, (&binding, &binding));
        if names.insert(name) {
            reversed.push(binding);
        }
    }
    reversed.reverse();
    reversed
}

fn merge(
    directive: &Annotation,
    inputs: Vec<String>,
    outputs: Vec<String>,
    host: IndexMap<String, StaticValue>,
    queries: IndexMap<String, StaticValue>,
) -> Annotation {
    let mut merged_inputs = string_list(directive.get_array("inputs"));
    merged_inputs.extend(inputs);
    let mut merged_outputs = string_list(directive.get_array("outputs"));
    merged_outputs.extend(outputs);
    let mut merged_host = directive
        .get("host")
        .and_then(StaticValue::as_object)
        .cloned()
        .unwrap_or_default();
    merged_host.extend(host);
    let mut merged_queries = directive
        .get("queries")
        .and_then(StaticValue::as_object)
        .cloned()
        .unwrap_or_default();
    merged_queries.extend(queries);

    let to_array = |values: Vec<String>| {
        StaticValue::Array(dedupe_bindings(values).into_iter().map(StaticValue::String).collect())
    };
    let mut merged = directive.clone();
    merged.fields.insert("inputs".to_string(), to_array(merged_inputs));
    merged.fields.insert("outputs".to_string(), to_array(merged_outputs));
    merged.fields.insert("host".to_string(), StaticValue::Object(merged_host));
    merged.fields.insert("queries".to_string(), StaticValue::Object(merged_queries));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{annotation, object, strings, MockReflector};

    fn setup() -> (Rc<MockReflector>, DirectiveResolver, StaticSymbol) {
        let reflector = Rc::new(MockReflector::new());
        let resolver = DirectiveResolver::new(reflector.clone());
        let ty = reflector.symbol("/app/dir.ts", "SomeDirective");
        (reflector, resolver, ty)
    }

    #[test]
    fn should_read_out_the_directive_metadata() {
        let (reflector, resolver, ty) = setup();
        reflector.annotate(
            &ty,
            annotation(MetadataKind::Directive, &[("selector", "someDirective".into())]),
        );
        let meta = resolver.resolve(&ty, true).unwrap().unwrap();
        assert_eq!(meta.get_str("selector"), Some("someDirective"));
        assert!(resolver.is_directive(&ty).unwrap());
    }

    #[test]
    fn should_throw_if_not_matching_metadata_is_found() {
        let (_, resolver, ty) = setup();
        let err = resolver.resolve(&ty, true).unwrap_err();
        assert_eq!(err.to_string(), "No Directive annotation found on SomeDirective");
        assert!(resolver.resolve(&ty, false).unwrap().is_none());
    }

    #[test]
    fn should_use_the_last_annotation() {
        let (reflector, resolver, ty) = setup();
        reflector.annotate(&ty, annotation(MetadataKind::Directive, &[("selector", "p".into())]));
        reflector.annotate(&ty, annotation(MetadataKind::Component, &[("selector", "c".into())]));
        let meta = resolver.resolve(&ty, true).unwrap().unwrap();
        assert_eq!(meta.kind, MetadataKind::Component);
        assert_eq!(meta.get_str("selector"), Some("c"));
    }

    #[test]
    fn should_merge_inputs_and_outputs_with_property_decorators() {
        let (reflector, resolver, ty) = setup();
        reflector.annotate(
            &ty,
            annotation(
                MetadataKind::Directive,
                &[
                    ("inputs", strings(&["a", "b: renamed"])),
                    ("outputs", strings(&["c"])),
                ],
            ),
        );
        reflector.decorate_prop(&ty, "b", annotation(MetadataKind::Input, &[]));
        reflector.decorate_prop(
            &ty,
            "d",
            annotation(MetadataKind::Output, &[("bindingPropertyName", "dChange".into())]),
        );
        let meta = resolver.resolve(&ty, true).unwrap().unwrap();
        assert_eq!(meta.get("inputs"), Some(&strings(&["a", "b"])));
        assert_eq!(meta.get("outputs"), Some(&strings(&["c", "d: dChange"])));
    }

    #[test]
    fn should_append_host_bindings_and_listeners() {
        let (reflector, resolver, ty) = setup();
        reflector.annotate(
            &ty,
            annotation(MetadataKind::Directive, &[("host", object(&[("role", "button".into())]))]),
        );
        reflector.decorate_prop(
            &ty,
            "title",
            annotation(MetadataKind::HostBinding, &[("hostPropertyName", "attr.title".into())]),
        );
        reflector.decorate_prop(
            &ty,
            "onClick",
            annotation(
                MetadataKind::HostListener,
                &[("eventName", "click".into()), ("args", strings(&["$event", "1"]))],
            ),
        );
        let meta = resolver.resolve(&ty, true).unwrap().unwrap();
        assert_eq!(
            meta.get("host"),
            Some(&object(&[
                ("role", "button".into()),
                ("[attr.title]", "title".into()),
                ("(click)", "onClick($event,1)".into()),
            ]))
        );
    }

    #[test]
    fn should_collect_query_decorators() {
        let (reflector, resolver, ty) = setup();
        reflector.annotate(&ty, annotation(MetadataKind::Directive, &[]));
        let query = annotation(MetadataKind::ViewChildren, &[("selector", "item".into())]);
        reflector.decorate_prop(&ty, "items", query.clone());
        let meta = resolver.resolve(&ty, true).unwrap().unwrap();
        let queries = meta.get("queries").and_then(StaticValue::as_object).unwrap();
        assert_eq!(queries["items"].as_annotation().unwrap().as_ref(), &query);
    }
}
