//! `QueryList` updates for content and view queries.

use super::compile_view::{CompileNode, CompileQuery};
use super::constants::ViewConstructorVars;
use super::view_builder::ViewBuilder;
use crate::aot::static_value::StaticValue;
use crate::compile_metadata::CompileTokenMetadata;
use crate::error::Result;
use crate::output::output_ast::{self as o, Expression, FnParam};
use std::collections::HashSet;

type NodeFilter<'f, 'a> = &'f dyn Fn(&CompileNode<'a>) -> bool;

impl<'a> ViewBuilder<'a> {
    pub(super) fn bind_queries(&mut self) -> Result<()> {
        let mut dirty_marked = HashSet::new();
        for (query_index, query) in self.queries.clone().into_iter().enumerate() {
            let v = query.view_index;
            let mut dirty = Vec::new();
            let values = {
                let nodes = &self.views[v].nodes;
                match query.node_index {
                    Some(n) if query.meta.descendants => {
                        let in_scope = |node: &CompileNode<'a>| is_descendant_of(nodes, node, n);
                        self.query_values(&query, v, &in_scope, true, 0, &mut dirty)
                    }
                    Some(n) => {
                        let in_scope = |node: &CompileNode<'a>| node.parent == Some(n);
                        self.query_values(&query, v, &in_scope, false, 0, &mut dirty)
                    }
                    None => self.query_values(&query, v, &|_: &CompileNode<'a>| true, true, 0, &mut dirty),
                }
            };

            let query_list = query.query_list.clone();
            let mut update = vec![query_list
                .clone()
                .call_method("reset", vec![o::literal_arr(values)])
                .to_stmt()];
            if query.meta.first {
                update.push(
                    query
                        .owner
                        .clone()
                        .prop(query.meta.property_name.clone())
                        .set(query_list.clone().prop("first"))?
                        .to_stmt(),
                );
            }
            update.push(query_list.clone().call_method("notifyOnChanges", vec![]).to_stmt());
            let stmt = o::if_stmt(query_list.clone().prop("dirty"), update);
            match query.node_index {
                Some(_) => self.views[v].content_query_stmts.push(stmt),
                None => self.views[v].view_query_stmts.push(stmt),
            }

            for (embedded, depth) in dirty {
                if !dirty_marked.insert((embedded, query_index)) {
                    continue;
                }
                let mut receiver = o::this_expr();
                for _ in 0..depth {
                    receiver = receiver.prop(ViewConstructorVars::PARENT_VIEW);
                }
                self.views[embedded].dirty_parent_queries_stmts.push(
                    query_list
                        .clone()
                        .rebase_this(&receiver)
                        .call_method("setDirty", vec![])
                        .to_stmt(),
                );
            }
        }
        Ok(())
    }

    /// Query results among the nodes of view `v` accepted by `in_scope`,
    /// followed by the results of their embedded views. Embedded views that
    /// contribute are recorded in `dirty` with their distance to the query.
    fn query_values(
        &self,
        query: &CompileQuery,
        v: usize,
        in_scope: NodeFilter<'_, 'a>,
        descend_all: bool,
        depth: usize,
        dirty: &mut Vec<(usize, usize)>,
    ) -> Vec<Expression> {
        let mut values = Vec::new();
        for node in &self.views[v].nodes {
            if !in_scope(node) {
                continue;
            }
            for selector in &query.meta.selectors {
                if let Some(value) = query_match(node, selector, query.meta.read.as_ref()) {
                    values.push(value);
                }
            }
            let (embedded, view_container) = match (node.embedded_view, &node.view_container) {
                (Some(embedded), Some(view_container)) => (embedded, view_container),
                _ => continue,
            };
            // Without `descendants`, only the top level of an embedded view
            // counts as direct children of the queried element.
            let nested = if descend_all {
                self.query_values(query, embedded, &|_: &CompileNode<'a>| true, true, depth + 1, dirty)
            } else {
                let top_level = |nested: &CompileNode<'a>| nested.parent.is_none();
                self.query_values(query, embedded, &top_level, false, depth + 1, dirty)
            };
            if nested.is_empty() {
                continue;
            }
            dirty.push((embedded, depth + 1));
            let nested_view = o::variable("nestedView");
            let mapped = o::fn_expr(
                vec![FnParam::new("nestedView")],
                vec![o::return_stmt(o::literal_arr(
                    nested
                        .into_iter()
                        .map(|value| value.rebase_this(&nested_view))
                        .collect(),
                ))],
            );
            values.push(view_container.clone().call_method(
                "mapNestedViews",
                vec![o::variable(self.views[embedded].class_name.clone()), mapped],
            ));
        }
        values
    }
}

fn is_descendant_of(nodes: &[CompileNode<'_>], node: &CompileNode<'_>, ancestor: usize) -> bool {
    let mut current = node.parent;
    while let Some(index) = current {
        if index == ancestor {
            return true;
        }
        current = nodes[index].parent;
    }
    false
}

/// Value `node` contributes for `selector`: the reference or instance it
/// matched, or the `read` token when one is given.
fn query_match(
    node: &CompileNode<'_>,
    selector: &CompileTokenMetadata,
    read: Option<&CompileTokenMetadata>,
) -> Option<Expression> {
    let matched = match selector {
        CompileTokenMetadata::Value(StaticValue::String(name)) => node.references.get(name).cloned(),
        CompileTokenMetadata::Identifier(_) => node.instances.get(&selector.key()).cloned(),
        CompileTokenMetadata::Value(_) => None,
    }?;
    match read {
        Some(read) => node.instances.get(&read.key()).cloned(),
        None => Some(matched),
    }
}
