//! Change detection of text, element and directive bindings.

use super::constants::{handle_event_method_name, DetectChangesVars, ViewProperties};
use super::view_builder::ViewBuilder;
use crate::compiler_util::binding_util::{create_check_binding_field, create_check_binding_stmt};
use crate::compiler_util::expression_converter::convert_property_binding;
use crate::compiler_util::identifier_util::create_enum_expression;
use crate::compiler_util::render_util::{
    create_check_animation_binding_stmts, create_check_render_binding_stmt,
};
use crate::core::ChangeDetectionStrategy;
use crate::error::Result;
use crate::identifiers::Identifiers;
use crate::output::output_ast::{self as o, Expression};
use crate::template_parser::template_ast::{
    BoundElementPropertyAst, BoundEventAst, BoundTextAst, PropertyBindingType,
};

impl<'a> ViewBuilder<'a> {
    pub(super) fn bind_text(&mut self, v: usize, n: usize, ast: &'a BoundTextAst) -> Result<()> {
        let binding_id = self.views[v].next_binding_id();
        let field = create_check_binding_field(&mut self.views[v].builder, self.reflector, binding_id.clone())?;
        let eval = self.with_scope(v, false, |reflector, scope, receiver| {
            convert_property_binding(reflector, scope, receiver, &ast.value.ast, &binding_id)
        })?;
        let render_node = self.views[v].nodes[n].render_node.clone();
        let set_text = ViewProperties::renderer()
            .call_method("setText", vec![render_node, eval.curr_val_expr.clone()])
            .to_stmt();
        let stmts = create_check_binding_stmt(
            self.reflector,
            &eval,
            &field.expression,
            &DetectChangesVars::throw_on_change(),
            vec![set_text],
        )?;
        self.views[v].render_stmts.extend(stmts);
        Ok(())
    }

    /// DOM properties, attributes, classes, styles and animation triggers
    /// bound on an element.
    pub(super) fn bind_render_inputs(
        &mut self,
        v: usize,
        n: usize,
        inputs: &'a [BoundElementPropertyAst],
        outputs: &'a [BoundEventAst],
        has_events: bool,
    ) -> Result<()> {
        let render_node = self.views[v].nodes[n].render_node.clone();
        for input in inputs {
            let binding_id = self.views[v].next_binding_id();
            let field =
                create_check_binding_field(&mut self.views[v].builder, self.reflector, binding_id.clone())?;
            let eval = self.with_scope(v, false, |reflector, scope, receiver| {
                convert_property_binding(reflector, scope, receiver, &input.value.ast, &binding_id)
            })?;
            if input.type_ == PropertyBindingType::Animation {
                let event_listener = if has_events {
                    o::this_expr().prop(handle_event_method_name(n))
                } else {
                    self.import(&Identifiers::noop)?
                };
                let stmts = create_check_animation_binding_stmts(
                    self.reflector,
                    o::this_expr(),
                    o::this_expr(),
                    input,
                    outputs,
                    event_listener,
                    render_node.clone(),
                    field.expression,
                    &eval,
                )?;
                let view = &mut self.views[v];
                view.animation_stmts.extend(stmts.check_update_stmts);
                view.detach_stmts.extend(stmts.check_detach_stmts);
            } else {
                let stmts = create_check_render_binding_stmt(
                    self.reflector,
                    o::this_expr(),
                    render_node.clone(),
                    input,
                    field.expression,
                    &eval,
                    None,
                )?;
                self.views[v].render_stmts.extend(stmts);
            }
        }
        Ok(())
    }

    /// Pushes input values into the wrapper of directive `dir_index`, then
    /// lets the wrapper run `ngOnChanges`/`ngOnInit`/`ngDoCheck`.
    pub(super) fn bind_directive_inputs(&mut self, v: usize, n: usize, dir_index: usize) -> Result<()> {
        let instance = self.views[v].nodes[n].directives[dir_index].clone();
        for input in &instance.ast.inputs {
            let binding_id = self.views[v].next_binding_id();
            let eval = self.with_scope(v, false, |reflector, scope, receiver| {
                convert_property_binding(reflector, scope, receiver, &input.value.ast, &binding_id)
            })?;
            let force_update = eval.force_update.clone().unwrap_or_else(|| o::literal(false));
            let view = &mut self.views[v];
            view.inputs_stmts.extend(eval.stmts);
            view.inputs_stmts.push(
                instance
                    .wrapper
                    .clone()
                    .call_method(
                        format!("check_{}", input.directive_name),
                        vec![eval.curr_val_expr, DetectChangesVars::throw_on_change(), force_update],
                    )
                    .to_stmt(),
            );
        }

        let node = &self.views[v].nodes[n];
        let do_check = instance.wrapper.clone().call_method(
            "ngDoCheck",
            vec![
                o::this_expr(),
                node.render_node.clone(),
                DetectChangesVars::throw_on_change(),
            ],
        );
        let directive = instance.directive();
        let on_push_view = match &node.comp_view {
            Some(comp_view)
                if directive.is_component
                    && directive.change_detection == Some(ChangeDetectionStrategy::OnPush) =>
            {
                Some(comp_view.clone())
            }
            _ => None,
        };
        let stmt = match on_push_view {
            Some(comp_view) => o::if_stmt(
                do_check,
                vec![comp_view.call_method("markAsCheckOnce", vec![]).to_stmt()],
            ),
            None => do_check.to_stmt(),
        };
        self.views[v].inputs_stmts.push(stmt);
        Ok(())
    }

    /// `checkHost` call for the host properties of directive `dir_index`.
    pub(super) fn bind_directive_host_props(
        &mut self,
        v: usize,
        n: usize,
        dir_index: usize,
        element_name: &str,
    ) -> Result<()> {
        let node = &self.views[v].nodes[n];
        let instance = &node.directives[dir_index];
        if instance.ast.host_properties.is_empty() {
            return Ok(());
        }
        let component_view: Expression = node.comp_view.clone().unwrap_or_else(o::this_expr);
        let mut args = vec![
            o::this_expr(),
            component_view,
            node.render_node.clone(),
            DetectChangesVars::throw_on_change(),
        ];
        for host_prop in &instance.ast.host_properties {
            if host_prop.needs_runtime_security_context {
                let context = self.schema_registry.security_context(
                    element_name,
                    &host_prop.name,
                    host_prop.type_ == PropertyBindingType::Attribute,
                );
                args.push(create_enum_expression(
                    self.reflector,
                    &Identifiers::SecurityContext,
                    context.member_name(),
                )?);
            }
        }
        let has_animations = instance
            .ast
            .host_properties
            .iter()
            .any(|prop| prop.type_ == PropertyBindingType::Animation);
        let detach_stmt = if has_animations {
            Some(
                instance
                    .wrapper
                    .clone()
                    .call_method("ngOnDetach", args[..3].to_vec())
                    .to_stmt(),
            )
        } else {
            None
        };
        let stmt = instance.wrapper.clone().call_method("checkHost", args).to_stmt();
        self.views[v].render_stmts.push(stmt);
        self.views[v].detach_stmts.extend(detach_stmt);
        Ok(())
    }
}
