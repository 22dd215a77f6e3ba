//! Event listeners of elements and directive host bindings.
//!
//! All events of a node go through one `handleEvent_<n>` method that
//! dispatches on the event name.

use super::constants::{handle_event_method_name, EventHandlerVars};
use super::view_builder::ViewBuilder;
use crate::compiler_util::expression_converter::convert_action_binding;
use crate::error::Result;
use crate::identifiers::Identifiers;
use crate::output::output_ast::{self as o, ClassMethod, FnParam};
use crate::template_parser::template_ast::BoundEventAst;
use indexmap::IndexMap;

const RESULT_VAR: &str = "result";

impl<'a> ViewBuilder<'a> {
    /// Generates the event dispatch method of node `n` and subscribes it.
    /// Returns whether the node listens to any event.
    pub(super) fn bind_outputs(
        &mut self,
        v: usize,
        n: usize,
        outputs: &'a [BoundEventAst],
        bind_to_renderer: bool,
    ) -> Result<bool> {
        let directives = self.views[v].nodes[n].directives.clone();
        let mut used_events: IndexMap<String, (String, Option<String>, bool)> = IndexMap::new();
        let directive_events = directives
            .iter()
            .flat_map(|directive| directive.ast.host_events.iter());
        for event in directive_events.chain(outputs.iter()) {
            used_events
                .entry(event.full_name())
                .or_insert_with(|| (event.name.clone(), event.target.clone(), event.is_animation()));
        }
        if used_events.is_empty() {
            return Ok(false);
        }

        let result = o::variable(RESULT_VAR);
        let event_name = o::variable(EventHandlerVars::EVENT_NAME);
        let event = o::variable(EventHandlerVars::EVENT);
        let mut body = vec![
            o::this_expr()
                .call_method("markPathToRootAsCheckOnce", vec![])
                .to_stmt(),
            o::literal(true).to_decl_stmt(RESULT_VAR, false),
        ];
        for directive in &directives {
            if directive.ast.host_events.is_empty() {
                continue;
            }
            body.push(o::assign_var(
                RESULT_VAR,
                directive
                    .wrapper
                    .clone()
                    .call_method("handleEvent", vec![event_name.clone(), event.clone()])
                    .and(result.clone()),
            ));
        }
        for output in outputs {
            let binding_id = self.views[v].next_binding_id();
            let action = self.with_scope(v, true, |reflector, scope, receiver| {
                convert_action_binding(reflector, scope, receiver, &output.handler.ast, &binding_id)
            })?;
            let mut stmts = action.stmts;
            if let Some(allow_default) = action.allow_default {
                stmts.push(o::assign_var(RESULT_VAR, allow_default.and(result.clone())));
            }
            body.push(o::if_stmt(
                event_name.clone().equals(o::literal(output.full_name())),
                stmts,
            ));
        }
        body.push(o::return_stmt(result));
        self.views[v].builder.add_method(ClassMethod::new(
            handle_event_method_name(n),
            vec![
                FnParam::new(EventHandlerVars::EVENT_NAME),
                FnParam::new(EventHandlerVars::EVENT),
            ],
            body,
        ));

        let handler = ViewBuilder::event_handler_expr(n);
        if bind_to_renderer {
            let names_and_targets: Vec<_> = used_events
                .values()
                .filter(|(_, _, is_animation)| !is_animation)
                .flat_map(|(name, target, _)| {
                    [
                        o::literal(name.as_str()),
                        target.as_deref().map_or_else(o::null_expr, o::literal),
                    ]
                })
                .collect();
            if !names_and_targets.is_empty() {
                let disposable = format!("disposable_{}", self.views[v].disposables.len());
                let subscribe = self.import(&Identifiers::subscribeToRenderElement)?.call_fn(vec![
                    o::this_expr(),
                    self.views[v].nodes[n].render_node.clone(),
                    o::literal_arr(names_and_targets),
                    handler.clone(),
                ]);
                let view = &mut self.views[v];
                view.create_stmts.push(subscribe.to_decl_stmt(disposable.clone(), true));
                view.disposables.push(o::variable(disposable));
            }
        }

        for directive in &directives {
            let needs_subscribe: Vec<bool> = directive
                .directive()
                .outputs
                .values()
                .map(|event| used_events.contains_key(event))
                .collect();
            if needs_subscribe.iter().any(|needed| *needed) {
                let mut args = vec![o::this_expr(), handler.clone()];
                args.extend(needs_subscribe.into_iter().map(o::literal));
                self.views[v]
                    .create_stmts
                    .push(directive.wrapper.clone().call_method("subscribe", args).to_stmt());
            }
        }
        Ok(true)
    }
}
