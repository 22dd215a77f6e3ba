//! Per-view and per-node state collected while compiling a template.
//!
//! A component template compiles into one view class for the template
//! itself and one per embedded `<template>`. Views and nodes are stored in
//! flat vectors and refer to each other by index.

use crate::compile_metadata::{
    CompileDirectiveMetadata, CompileDirectiveSummary, CompileQueryMetadata, TokenKey,
};
use crate::output::class_builder::ClassBuilder;
use crate::output::output_ast::{self as o, Expression, Statement};
use crate::template_parser::template_ast::{BoundTextAst, DirectiveAst, ElementAst, EmbeddedTemplateAst};
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewType {
    Host,
    Component,
    Embedded,
}

impl ViewType {
    /// Member of the runtime `ViewType` enum.
    pub fn member_name(self) -> &'static str {
        match self {
            ViewType::Host => "HOST",
            ViewType::Component => "COMPONENT",
            ViewType::Embedded => "EMBEDDED",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum NodeKind<'a> {
    Element(&'a ElementAst),
    Template(&'a EmbeddedTemplateAst),
    Text,
    BoundText(&'a BoundTextAst),
    NgContent(usize),
}

/// A directive instantiated on a node through its wrapper.
#[derive(Debug, Clone)]
pub struct DirectiveInstance<'a> {
    pub ast: &'a DirectiveAst,
    /// `this._<Dir>_<node>_<index>`
    pub wrapper: Expression,
}

impl DirectiveInstance<'_> {
    pub fn directive(&self) -> &CompileDirectiveSummary {
        &self.ast.directive
    }

    pub fn context(&self) -> Expression {
        self.wrapper.clone().prop("context")
    }
}

#[derive(Debug)]
pub struct CompileNode<'a> {
    pub node_index: usize,
    /// Enclosing element or template in the same view.
    pub parent: Option<usize>,
    pub kind: NodeKind<'a>,
    /// `this._el_<n>`, `this._text_<n>` or `this._anchor_<n>`; `null` for ng-content.
    pub render_node: Expression,
    pub view_container: Option<Expression>,
    pub comp_view: Option<Expression>,
    pub component: Option<CompileDirectiveSummary>,
    pub embedded_view: Option<usize>,
    pub directives: Vec<DirectiveInstance<'a>>,
    /// Injectable values of this node keyed by token.
    pub instances: IndexMap<TokenKey, Expression>,
    /// Tokens answered by `injectorGetInternal`, with whether the answer is
    /// limited to the node itself (view providers).
    pub injectable_providers: Vec<(Expression, Expression, bool)>,
    pub references: IndexMap<String, Expression>,
    /// Projected child nodes of a component element, by `<ng-content>` slot.
    pub content_nodes: Vec<Vec<usize>>,
    /// Number of descendant nodes in the same view.
    pub child_count: usize,
}

impl<'a> CompileNode<'a> {
    pub fn new(node_index: usize, parent: Option<usize>, kind: NodeKind<'a>, render_node: Expression) -> Self {
        CompileNode {
            node_index,
            parent,
            kind,
            render_node,
            view_container: None,
            comp_view: None,
            component: None,
            embedded_view: None,
            directives: Vec::new(),
            instances: IndexMap::new(),
            injectable_providers: Vec::new(),
            references: IndexMap::new(),
            content_nodes: Vec::new(),
            child_count: 0,
        }
    }

    pub fn is_element_or_template(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_) | NodeKind::Template(_))
    }

}

#[derive(Debug, Clone, Copy)]
pub enum RootNode {
    Node(usize),
    NgContent(usize),
}

/// A `QueryList` field and the owner property it is written to.
#[derive(Debug, Clone)]
pub struct CompileQuery {
    pub meta: CompileQueryMetadata,
    pub query_list: Expression,
    pub owner: Expression,
    /// View that declares the query field.
    pub view_index: usize,
    /// Element whose content is queried; `None` for view queries.
    pub node_index: Option<usize>,
}

#[derive(Debug)]
pub struct CompileView<'a> {
    pub component: &'a CompileDirectiveMetadata,
    pub view_type: ViewType,
    pub class_name: String,
    /// Declaring view and template node of an embedded view.
    pub declaration: Option<(usize, usize)>,
    pub nodes: Vec<CompileNode<'a>>,
    pub root_nodes: Vec<RootNode>,
    /// Template variables and references declared in this view.
    pub locals: IndexMap<String, Expression>,
    pub builder: ClassBuilder,
    pub create_stmts: Vec<Statement>,
    pub pipe_stmts: Vec<Statement>,
    pub pipes: IndexMap<String, Expression>,
    pub disposables: Vec<Expression>,
    pub inputs_stmts: Vec<Statement>,
    pub nested_views_stmts: Vec<Statement>,
    pub content_query_stmts: Vec<Statement>,
    pub after_content_stmts: Vec<Statement>,
    pub render_stmts: Vec<Statement>,
    pub animation_stmts: Vec<Statement>,
    pub comp_view_stmts: Vec<Statement>,
    pub view_query_stmts: Vec<Statement>,
    pub after_view_stmts: Vec<Statement>,
    pub destroy_stmts: Vec<Statement>,
    pub detach_stmts: Vec<Statement>,
    pub dirty_parent_queries_stmts: Vec<Statement>,
    pub binding_count: usize,
}

impl<'a> CompileView<'a> {
    pub fn new(
        component: &'a CompileDirectiveMetadata,
        view_type: ViewType,
        class_name: String,
        declaration: Option<(usize, usize)>,
    ) -> Self {
        CompileView {
            component,
            view_type,
            class_name,
            declaration,
            nodes: Vec::new(),
            root_nodes: Vec::new(),
            locals: IndexMap::new(),
            builder: ClassBuilder::new(),
            create_stmts: Vec::new(),
            pipe_stmts: Vec::new(),
            pipes: IndexMap::new(),
            disposables: Vec::new(),
            inputs_stmts: Vec::new(),
            nested_views_stmts: Vec::new(),
            content_query_stmts: Vec::new(),
            after_content_stmts: Vec::new(),
            render_stmts: Vec::new(),
            animation_stmts: Vec::new(),
            comp_view_stmts: Vec::new(),
            view_query_stmts: Vec::new(),
            after_view_stmts: Vec::new(),
            destroy_stmts: Vec::new(),
            detach_stmts: Vec::new(),
            dirty_parent_queries_stmts: Vec::new(),
            binding_count: 0,
        }
    }

    /// Fresh id for the temporaries of one binding.
    pub fn next_binding_id(&mut self) -> String {
        let id = self.binding_count;
        self.binding_count += 1;
        id.to_string()
    }

    /// Declares `this.<name>` and returns it.
    pub fn add_field(&mut self, name: impl Into<String>) -> Expression {
        let name = name.into();
        if !self.builder.has_field(&name) {
            self.builder.add_field(name.clone());
        }
        o::this_expr().prop(name)
    }
}
