//! After-content, after-view and destroy hooks.
//!
//! `ngOnChanges`, `ngOnInit` and `ngDoCheck` run inside the directive
//! wrappers; the hooks here are called by the view itself.

use super::view_builder::ViewBuilder;
use crate::compiler_util::binding_util::is_first_view_check;
use crate::core::LifecycleHooks;
use crate::output::output_ast::{self as o, Expression};
use crate::template_parser::template_ast::{ProviderAst, ProviderAstType};

impl<'a> ViewBuilder<'a> {
    pub(super) fn bind_after_content_and_view_hooks(&mut self, v: usize, n: usize) {
        let contexts: Vec<(LifecycleHooks, Expression)> = self.views[v].nodes[n]
            .directives
            .iter()
            .map(|directive| (directive.directive().type_.lifecycle_hooks, directive.context()))
            .collect();
        let view = &mut self.views[v];
        for (hooks, context) in contexts {
            if hooks.contains(LifecycleHooks::AFTER_CONTENT_INIT) {
                view.after_content_stmts.push(first_check_only(
                    context.clone(),
                    LifecycleHooks::AFTER_CONTENT_INIT,
                ));
            }
            if hooks.contains(LifecycleHooks::AFTER_CONTENT_CHECKED) {
                view.after_content_stmts
                    .push(call_hook(context.clone(), LifecycleHooks::AFTER_CONTENT_CHECKED));
            }
            if hooks.contains(LifecycleHooks::AFTER_VIEW_INIT) {
                view.after_view_stmts.push(first_check_only(
                    context.clone(),
                    LifecycleHooks::AFTER_VIEW_INIT,
                ));
            }
            if hooks.contains(LifecycleHooks::AFTER_VIEW_CHECKED) {
                view.after_view_stmts
                    .push(call_hook(context, LifecycleHooks::AFTER_VIEW_CHECKED));
            }
        }
    }

    pub(super) fn bind_destroy_hooks(&mut self, v: usize, n: usize, providers: &'a [ProviderAst]) {
        let node = &self.views[v].nodes[n];
        let mut stmts = Vec::new();
        for directive in &node.directives {
            let summary = directive.directive();
            if summary.type_.lifecycle_hooks.contains(LifecycleHooks::ON_DESTROY)
                || !summary.outputs.is_empty()
            {
                stmts.push(
                    directive
                        .wrapper
                        .clone()
                        .call_method("ngOnDestroy", vec![])
                        .to_stmt(),
                );
            }
        }
        for provider in providers {
            let is_service = matches!(
                provider.provider_type,
                ProviderAstType::PublicService | ProviderAstType::PrivateService
            );
            if !is_service || !provider.lifecycle_hooks.contains(LifecycleHooks::ON_DESTROY) {
                continue;
            }
            let instance = match node.instances.get(&provider.token.key()) {
                Some(instance) => instance.clone(),
                None => continue,
            };
            let destroy = call_hook(instance.clone(), LifecycleHooks::ON_DESTROY);
            if provider.eager {
                stmts.push(destroy);
            } else if let Some(storage) = lazy_storage(&instance) {
                // Lazy services are only destroyed once created.
                stmts.push(o::if_stmt(storage.not_identical(o::null_expr()), vec![destroy]));
            }
        }
        self.views[v].destroy_stmts.extend(stmts);
    }
}

fn call_hook(context: Expression, hook: LifecycleHooks) -> o::Statement {
    context.call_method(hook.method_name(), vec![]).to_stmt()
}

fn first_check_only(context: Expression, hook: LifecycleHooks) -> o::Statement {
    o::if_stmt(is_first_view_check(o::this_expr()), vec![call_hook(context, hook)])
}

/// Backing field of a lazily created provider: `this.__x` for `this._x`.
fn lazy_storage(instance: &Expression) -> Option<Expression> {
    match instance {
        Expression::ReadProp(read) => Some(o::this_expr().prop(format!("_{}", read.name))),
        _ => None,
    }
}
