//! Second pass: bindings, events, queries and lifecycle hooks.

use super::compile_view::NodeKind;
use super::constants::DetectChangesVars;
use super::view_builder::ViewBuilder;
use crate::error::Result;

impl<'a> ViewBuilder<'a> {
    pub(super) fn bind(&mut self) -> Result<()> {
        for v in 0..self.views.len() {
            let roots: Vec<usize> = self.views[v]
                .nodes
                .iter()
                .filter(|node| node.parent.is_none())
                .map(|node| node.node_index)
                .collect();
            for root in roots {
                self.bind_node(v, root)?;
            }
        }
        self.bind_queries()
    }

    /// Binds `n` and its subtree. After-hooks of children are registered
    /// before those of their parent.
    fn bind_node(&mut self, v: usize, n: usize) -> Result<()> {
        let kind = self.views[v].nodes[n].kind;
        match kind {
            NodeKind::BoundText(ast) => self.bind_text(v, n, ast)?,
            NodeKind::Element(ast) => {
                self.bind_containers(v, n);
                let has_events = self.bind_outputs(v, n, &ast.outputs, true)?;
                self.bind_render_inputs(v, n, &ast.inputs, &ast.outputs, has_events)?;
                for dir_index in 0..self.views[v].nodes[n].directives.len() {
                    self.bind_directive_inputs(v, n, dir_index)?;
                    self.bind_directive_host_props(v, n, dir_index, &ast.name)?;
                }
                let children: Vec<usize> = self.views[v]
                    .nodes
                    .iter()
                    .filter(|child| child.parent == Some(n))
                    .map(|child| child.node_index)
                    .collect();
                for child in children {
                    self.bind_node(v, child)?;
                }
                self.bind_after_content_and_view_hooks(v, n);
                self.bind_destroy_hooks(v, n, &ast.providers);
            }
            NodeKind::Template(ast) => {
                self.bind_containers(v, n);
                self.bind_outputs(v, n, &ast.outputs, false)?;
                for dir_index in 0..self.views[v].nodes[n].directives.len() {
                    self.bind_directive_inputs(v, n, dir_index)?;
                }
                self.bind_after_content_and_view_hooks(v, n);
                self.bind_destroy_hooks(v, n, &ast.providers);
            }
            NodeKind::Text | NodeKind::NgContent(_) => {}
        }
        Ok(())
    }

    /// Change detection and teardown of nested views and component views.
    fn bind_containers(&mut self, v: usize, n: usize) {
        let node = &self.views[v].nodes[n];
        let view_container = node.view_container.clone();
        let comp_view = node.comp_view.clone();
        let view = &mut self.views[v];
        if let Some(view_container) = view_container {
            view.nested_views_stmts.push(
                view_container
                    .clone()
                    .call_method("detectChangesInNestedViews", vec![DetectChangesVars::throw_on_change()])
                    .to_stmt(),
            );
            view.destroy_stmts
                .push(view_container.call_method("destroyNestedViews", vec![]).to_stmt());
        }
        if let Some(comp_view) = comp_view {
            view.comp_view_stmts.push(
                comp_view
                    .clone()
                    .call_method("internalDetectChanges", vec![DetectChangesVars::throw_on_change()])
                    .to_stmt(),
            );
            view.destroy_stmts
                .push(comp_view.call_method("destroy", vec![]).to_stmt());
        }
    }
}
