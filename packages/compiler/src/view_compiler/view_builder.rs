//! Builds the view classes of one component template.
//!
//! The first pass walks the template and creates render nodes, view
//! containers, provider instances and references in every view. The second
//! pass (see the binder modules) adds bindings, events, queries and
//! lifecycle calls once every view and node exists.

use super::compile_view::{
    CompileNode, CompileQuery, CompileView, DirectiveInstance, NodeKind, RootNode, ViewType,
};
use super::constants::{
    handle_event_method_name, DetectChangesVars, InjectMethodVars, ViewConstructorVars,
    ViewProperties,
};
use super::deps::{
    ComponentFactoryDependency, DirectiveWrapperDependency, ViewClassDependency,
    ViewCompileDependency,
};
use super::{component_factory_name, directive_wrapper_class_name, view_class_name};
use crate::aot::static_symbol::StaticSymbol;
use crate::aot::static_value::StaticValue;
use crate::compile_metadata::{
    CompileDiDependencyMetadata, CompileDirectiveMetadata, CompilePipeSummary,
    CompileProviderMetadata, CompileQueryMetadata, CompileTokenMetadata, TokenKey,
};
use crate::compile_reflector::CompileReflector;
use crate::compiler_util::expression_converter::{NameResolver, EVENT_NAME};
use crate::compiler_util::identifier_util::{
    convert_value_to_output_ast, create_di_token_expression, create_enum_expression,
};
use crate::config::CompilerConfig;
use crate::core::ChangeDetectionStrategy;
use crate::error::{CompilerError, Result};
use crate::identifiers::{resolve_identifier, IdentifierSpec, Identifiers};
use crate::output::output_ast::{self as o, ClassGetter, ClassMethod, Expression, FnParam, Statement};
use crate::provider_analyzer::BuiltinTokens;
use crate::schema::element_schema_registry::ElementSchemaRegistry;
use crate::template_parser::template_ast::{
    AttrAst, BoundTextAst, DirectiveAst, ElementAst, EmbeddedTemplateAst, NgContentAst,
    ProviderAst, ProviderAstType, ReferenceAst, TemplateAst,
};
use crate::util::sanitize_identifier;
use indexmap::IndexMap;

const CLASS_ATTR: &str = "class";
const STYLE_ATTR: &str = "style";
const IMPLICIT_TEMPLATE_VAR: &str = "$implicit";

pub(super) struct ViewBuilder<'a> {
    pub(super) reflector: &'a dyn CompileReflector,
    pub(super) config: &'a CompilerConfig,
    pub(super) schema_registry: &'a dyn ElementSchemaRegistry,
    pub(super) component: &'a CompileDirectiveMetadata,
    pub(super) pipes: &'a [CompilePipeSummary],
    pub(super) builtins: BuiltinTokens,
    pub(super) views: Vec<CompileView<'a>>,
    pub(super) queries: Vec<CompileQuery>,
    pub(super) dependencies: Vec<ViewCompileDependency>,
}

impl<'a> ViewBuilder<'a> {
    pub(super) fn new(
        reflector: &'a dyn CompileReflector,
        config: &'a CompilerConfig,
        schema_registry: &'a dyn ElementSchemaRegistry,
        component: &'a CompileDirectiveMetadata,
        pipes: &'a [CompilePipeSummary],
    ) -> Result<Self> {
        Ok(ViewBuilder {
            reflector,
            config,
            schema_registry,
            component,
            pipes,
            builtins: BuiltinTokens::resolve(reflector)?,
            views: Vec::new(),
            queries: Vec::new(),
            dependencies: Vec::new(),
        })
    }

    pub(super) fn import(&self, spec: &IdentifierSpec) -> Result<Expression> {
        Ok(o::import_expr(resolve_identifier(self.reflector, spec)?))
    }

    /// First pass over the whole template.
    pub(super) fn build(&mut self, template: &'a [TemplateAst]) -> Result<()> {
        let view_type = if self.component.is_host {
            ViewType::Host
        } else {
            ViewType::Component
        };
        let view = self.push_view(view_type, None);
        if view_type == ViewType::Component {
            let view_queries = self.component.view_queries.clone();
            for query in view_queries {
                let field_name = format!("_viewQuery_{}_{}", query.property_name, view);
                self.create_query(view, None, field_name, query, o::this_expr().prop("context"))?;
            }
        }
        self.visit_children(view, None, template)
    }

    fn push_view(&mut self, view_type: ViewType, declaration: Option<(usize, usize)>) -> usize {
        let index = self.views.len();
        let class_name = view_class_name(self.component.reference(), index);
        self.views
            .push(CompileView::new(self.component, view_type, class_name, declaration));
        index
    }

    fn visit_children(&mut self, v: usize, parent: Option<usize>, asts: &'a [TemplateAst]) -> Result<()> {
        for ast in asts {
            match ast {
                TemplateAst::Text(text) => {
                    self.visit_text(v, parent, NodeKind::Text, &text.value, text.ng_content_index)?;
                }
                TemplateAst::BoundText(text) => self.visit_bound_text(v, parent, text)?,
                TemplateAst::Element(element) => self.visit_element(v, parent, element)?,
                TemplateAst::EmbeddedTemplate(template) => {
                    self.visit_embedded_template(v, parent, template)?
                }
                TemplateAst::NgContent(ng_content) => self.visit_ng_content(v, parent, ng_content)?,
                TemplateAst::Attr(_) => {}
            }
        }
        Ok(())
    }

    /// Render node children are appended to; `null` when the children are
    /// projected or live in an embedded view.
    fn parent_render_node(&self, v: usize, parent: Option<usize>) -> Expression {
        let view = &self.views[v];
        match parent {
            Some(p) => {
                let node = &view.nodes[p];
                if node.component.is_some() || !matches!(node.kind, NodeKind::Element(_)) {
                    o::null_expr()
                } else {
                    node.render_node.clone()
                }
            }
            None if view.view_type == ViewType::Component => o::variable("parentRenderNode"),
            None => o::null_expr(),
        }
    }

    fn add_node(
        &mut self,
        v: usize,
        parent: Option<usize>,
        kind: NodeKind<'a>,
        render_node: Expression,
        ng_content_index: Option<usize>,
    ) -> usize {
        let view = &mut self.views[v];
        let index = view.nodes.len();
        view.nodes.push(CompileNode::new(index, parent, kind, render_node));
        let mut ancestor = parent;
        while let Some(a) = ancestor {
            view.nodes[a].child_count += 1;
            ancestor = view.nodes[a].parent;
        }
        match parent {
            None => view.root_nodes.push(match kind {
                NodeKind::NgContent(slot) => RootNode::NgContent(slot),
                _ => RootNode::Node(index),
            }),
            Some(p) if view.nodes[p].component.is_some() => {
                if let Some(slot) = ng_content_index {
                    let content = &mut view.nodes[p].content_nodes;
                    if content.len() <= slot {
                        content.resize(slot + 1, Vec::new());
                    }
                    content[slot].push(index);
                }
            }
            Some(_) => {}
        }
        index
    }

    fn visit_text(
        &mut self,
        v: usize,
        parent: Option<usize>,
        kind: NodeKind<'a>,
        value: &str,
        ng_content_index: Option<usize>,
    ) -> Result<usize> {
        let parent_render_node = self.parent_render_node(v, parent);
        let index = self.views[v].nodes.len();
        let field = format!("_text_{}", index);
        let render_node = self.views[v].add_field(field.clone());
        self.views[v].create_stmts.push(o::assign_prop(
            o::this_expr(),
            field,
            ViewProperties::renderer().call_method(
                "createText",
                vec![parent_render_node, o::literal(value), o::null_expr()],
            ),
        ));
        Ok(self.add_node(v, parent, kind, render_node, ng_content_index))
    }

    fn visit_bound_text(&mut self, v: usize, parent: Option<usize>, ast: &'a BoundTextAst) -> Result<()> {
        self.visit_text(v, parent, NodeKind::BoundText(ast), "", ast.ng_content_index)?;
        Ok(())
    }

    fn visit_ng_content(&mut self, v: usize, parent: Option<usize>, ast: &'a NgContentAst) -> Result<()> {
        let parent_render_node = self.parent_render_node(v, parent);
        self.add_node(v, parent, NodeKind::NgContent(ast.index), o::null_expr(), ast.ng_content_index);
        if !parent_render_node.is_literal_null() {
            self.views[v].create_stmts.push(
                o::this_expr()
                    .call_method(
                        "projectNodes",
                        vec![parent_render_node, o::literal(ast.index)],
                    )
                    .to_stmt(),
            );
        }
        Ok(())
    }

    fn visit_element(&mut self, v: usize, parent: Option<usize>, ast: &'a ElementAst) -> Result<()> {
        let parent_render_node = self.parent_render_node(v, parent);
        let index = self.views[v].nodes.len();
        let field = format!("_el_{}", index);
        let render_node = self.views[v].add_field(field.clone());
        let attrs = o::literal_arr(
            merge_html_and_directive_attrs(&ast.attrs, &ast.directives)
                .into_iter()
                .flat_map(|(name, value)| [o::literal(name), o::literal(value)])
                .collect(),
        );
        let create_expr = if self.views[v].view_type == ViewType::Host && parent.is_none() {
            self.import(&Identifiers::selectOrCreateRenderHostElement)?
                .call_fn(vec![
                    ViewProperties::renderer(),
                    o::literal(ast.name.as_str()),
                    attrs,
                    o::variable("rootSelector"),
                    o::null_expr(),
                ])
        } else {
            self.import(&Identifiers::createRenderElement)?.call_fn(vec![
                ViewProperties::renderer(),
                parent_render_node,
                o::literal(ast.name.as_str()),
                attrs,
                o::null_expr(),
            ])
        };
        self.views[v]
            .create_stmts
            .push(o::assign_prop(o::this_expr(), field, create_expr));

        let n = self.add_node(v, parent, NodeKind::Element(ast), render_node.clone(), ast.ng_content_index);

        let mut comp_view = None;
        if let Some(component) = ast.component() {
            let comp_view_expr = self.views[v].add_field(format!("compView_{}", n));
            let view_class = self.view_class_dependency(&component.type_.reference);
            self.views[v].create_stmts.push(
                comp_view_expr
                    .clone()
                    .set(view_class.instantiate(vec![
                        ViewProperties::view_utils(),
                        o::this_expr(),
                        o::literal(n),
                        render_node,
                    ]))?
                    .to_stmt(),
            );
            let slot_count = component
                .template
                .as_ref()
                .map_or(0, |t| t.ng_content_selectors.len());
            let node = &mut self.views[v].nodes[n];
            node.component = Some(component.clone());
            node.comp_view = Some(comp_view_expr.clone());
            node.content_nodes = vec![Vec::new(); slot_count];
            comp_view = Some((comp_view_expr, component.type_.reference.clone()));
        }

        self.create_node_instances(v, n, &ast.directives, &ast.providers, &ast.references, ast.has_view_container, None)?;
        self.visit_children(v, Some(n), &ast.children)?;

        if let Some((comp_view_expr, comp_type)) = comp_view {
            let instance = self.views[v].nodes[n]
                .instances
                .get(&TokenKey::Symbol(comp_type))
                .cloned()
                .unwrap_or_else(o::null_expr);
            self.views[v]
                .create_stmts
                .push(comp_view_expr.call_method("create", vec![instance]).to_stmt());
        }
        Ok(())
    }

    fn visit_embedded_template(
        &mut self,
        v: usize,
        parent: Option<usize>,
        ast: &'a EmbeddedTemplateAst,
    ) -> Result<()> {
        let parent_render_node = self.parent_render_node(v, parent);
        let index = self.views[v].nodes.len();
        let field = format!("_anchor_{}", index);
        let anchor = self.views[v].add_field(field.clone());
        self.views[v].create_stmts.push(o::assign_prop(
            o::this_expr(),
            field,
            ViewProperties::renderer().call_method(
                "createTemplateAnchor",
                vec![parent_render_node, o::null_expr()],
            ),
        ));
        let n = self.add_node(v, parent, NodeKind::Template(ast), anchor, ast.ng_content_index);

        let embedded = self.push_view(ViewType::Embedded, Some((v, n)));
        self.views[v].nodes[n].embedded_view = Some(embedded);
        self.create_node_instances(
            v,
            n,
            &ast.directives,
            &ast.providers,
            &ast.references,
            ast.has_view_container,
            Some(embedded),
        )?;
        for variable in &ast.variables {
            let value = if variable.value.is_empty() {
                IMPLICIT_TEMPLATE_VAR
            } else {
                variable.value.as_str()
            };
            self.views[embedded]
                .locals
                .insert(variable.name.clone(), o::this_expr().prop("context").prop(value));
        }
        self.visit_children(embedded, None, &ast.children)
    }

    #[allow(clippy::too_many_arguments)]
    fn create_node_instances(
        &mut self,
        v: usize,
        n: usize,
        directives: &'a [DirectiveAst],
        providers: &'a [ProviderAst],
        references: &'a [ReferenceAst],
        has_view_container: bool,
        embedded_view: Option<usize>,
    ) -> Result<()> {
        let render_node = self.views[v].nodes[n].render_node.clone();
        let parent_index = match self.views[v].nodes[n].parent {
            Some(p) => o::literal(p),
            None => o::null_expr(),
        };

        if has_view_container {
            let vc = self.views[v].add_field(format!("_vc_{}", n));
            let create = self.import(&Identifiers::ViewContainer)?.instantiate(vec![
                o::literal(n),
                parent_index,
                o::this_expr(),
                render_node.clone(),
            ]);
            self.views[v].create_stmts.push(vc.clone().set(create)?.to_stmt());
            let node = &mut self.views[v].nodes[n];
            node.view_container = Some(vc.clone());
            node.instances
                .insert(self.builtins.view_container_ref.clone(), vc.prop("vcRef"));
        }

        let element_ref = self.import(&Identifiers::ElementRef)?.instantiate(vec![render_node.clone()]);
        let template_ref = match embedded_view {
            Some(_) => Some(self.import(&Identifiers::TemplateRef_)?.instantiate(vec![
                o::this_expr(),
                o::literal(n),
                render_node.clone(),
            ])),
            None => None,
        };
        {
            let builtins = &self.builtins;
            let node = &mut self.views[v].nodes[n];
            let change_detector = match &node.comp_view {
                Some(comp_view) => comp_view.clone().prop("ref"),
                None => o::this_expr().prop("ref"),
            };
            node.instances
                .insert(builtins.renderer.clone(), ViewProperties::renderer());
            node.instances.insert(builtins.element_ref.clone(), element_ref);
            node.instances
                .insert(builtins.change_detector_ref.clone(), change_detector);
            node.instances.insert(
                builtins.injector.clone(),
                o::this_expr().call_method("injector", vec![o::literal(n)]),
            );
            if let Some(template_ref) = template_ref {
                node.instances.insert(builtins.template_ref.clone(), template_ref);
            }
        }

        if let Some(component) = self.views[v].nodes[n].component.clone() {
            if !component.entry_components.is_empty() {
                self.create_component_factory_resolver(v, n, &component.entry_components)?;
            }
        }

        for (provider_index, provider_ast) in providers.iter().enumerate() {
            self.create_provider_instance(v, n, provider_index, provider_ast, directives)?;
        }

        let instances: Vec<(usize, Expression)> = self.views[v].nodes[n]
            .directives
            .iter()
            .enumerate()
            .map(|(index, directive)| (index, directive.context()))
            .collect();
        for (dir_index, owner) in instances {
            let queries = self.views[v].nodes[n].directives[dir_index].ast.directive.queries.clone();
            for query in queries {
                let field_name = format!("_query_{}_{}_{}", query.property_name, n, dir_index);
                self.create_query(v, Some(n), field_name, query, owner.clone())?;
            }
        }

        for reference in references {
            let value = match &reference.value {
                Some(token) => self.views[v].nodes[n]
                    .instances
                    .get(&token.key())
                    .cloned()
                    .unwrap_or_else(|| render_node.clone()),
                None => render_node.clone(),
            };
            self.views[v].nodes[n]
                .references
                .insert(reference.name.clone(), value.clone());
            self.views[v].locals.insert(reference.name.clone(), value);
        }
        Ok(())
    }

    fn create_component_factory_resolver(
        &mut self,
        v: usize,
        n: usize,
        entry_components: &[StaticSymbol],
    ) -> Result<()> {
        let factories: Vec<Expression> = entry_components
            .iter()
            .map(|comp| self.component_factory_dependency(comp))
            .collect();
        let parent_resolver = self.resolve_dependency(
            v,
            Some(n),
            &CompileDiDependencyMetadata {
                is_skip_self: true,
                is_optional: true,
                token: Some(self.builtins_token(&Identifiers::ComponentFactoryResolver)?),
                ..Default::default()
            },
        )?;
        let resolver = self.import(&Identifiers::CodegenComponentFactoryResolver)?
            .instantiate(vec![o::literal_arr(factories), parent_resolver]);
        let field = self.views[v].add_field(format!("_ComponentFactoryResolver_{}", n));
        self.views[v]
            .create_stmts
            .push(field.clone().set(resolver)?.to_stmt());
        let token = self.import(&Identifiers::ComponentFactoryResolver)?;
        let node = &mut self.views[v].nodes[n];
        node.instances
            .insert(self.builtins.component_factory_resolver.clone(), field.clone());
        node.injectable_providers.push((token, field, false));
        Ok(())
    }

    fn builtins_token(&self, spec: &IdentifierSpec) -> Result<CompileTokenMetadata> {
        Ok(CompileTokenMetadata::from_symbol(resolve_identifier(self.reflector, spec)?))
    }

    fn create_provider_instance(
        &mut self,
        v: usize,
        n: usize,
        provider_index: usize,
        provider_ast: &'a ProviderAst,
        directives: &'a [DirectiveAst],
    ) -> Result<()> {
        let key = provider_ast.token.key();
        let token_expr = create_di_token_expression(&provider_ast.token);
        let field_name = format!(
            "_{}_{}_{}",
            sanitize_identifier(&provider_ast.token.token_name()),
            n,
            provider_index
        );
        let instance = match provider_ast.provider_type {
            ProviderAstType::Builtin => match self.views[v].nodes[n].instances.get(&key) {
                Some(instance) => instance.clone(),
                None => return Ok(()),
            },
            ProviderAstType::Component | ProviderAstType::Directive => {
                let directive = provider_ast
                    .token
                    .identifier()
                    .and_then(|symbol| {
                        directives
                            .iter()
                            .find(|d| d.directive.type_.reference.ptr_eq(symbol))
                    })
                    .ok_or_else(|| {
                        CompilerError::illegal_state(format!(
                            "Illegal state: No directive found for provider {}",
                            provider_ast.token.token_name()
                        ))
                    })?;
                let provider = provider_ast.providers.first().ok_or_else(|| {
                    CompilerError::illegal_state("Illegal state: Directive provider without a definition")
                })?;
                let deps = self.resolve_dependencies(v, Some(n), provider_deps(provider))?;
                let wrapper_class = self.directive_wrapper_dependency(&directive.directive.type_.reference);
                let wrapper = self.views[v].add_field(field_name);
                self.views[v]
                    .create_stmts
                    .push(wrapper.clone().set(wrapper_class.instantiate(deps))?.to_stmt());
                let instance = DirectiveInstance {
                    ast: directive,
                    wrapper,
                };
                let context = instance.context();
                self.views[v].nodes[n].directives.push(instance);
                context
            }
            ProviderAstType::PublicService | ProviderAstType::PrivateService => {
                let mut values = Vec::with_capacity(provider_ast.providers.len());
                for provider in &provider_ast.providers {
                    values.push(self.provider_value(v, n, provider)?);
                }
                let value = if provider_ast.multi_provider {
                    o::literal_arr(values)
                } else {
                    values.into_iter().next().unwrap_or_else(o::null_expr)
                };
                if provider_ast.eager {
                    let field = self.views[v].add_field(field_name);
                    self.views[v].create_stmts.push(field.clone().set(value)?.to_stmt());
                    field
                } else {
                    self.create_lazy_provider_getter(v, field_name, value)?
                }
            }
        };
        let is_private = provider_ast.provider_type == ProviderAstType::PrivateService;
        let node = &mut self.views[v].nodes[n];
        node.instances.insert(key, instance.clone());
        node.injectable_providers.push((token_expr, instance, is_private));
        Ok(())
    }

    /// `get <name>()` creating the value on first access.
    fn create_lazy_provider_getter(&mut self, v: usize, name: String, value: Expression) -> Result<Expression> {
        let view = &mut self.views[v];
        let storage = view.add_field(format!("_{}", name));
        view.builder.getters.push(ClassGetter {
            name: name.clone(),
            body: vec![
                o::if_stmt(
                    storage.clone().is_blank(),
                    vec![storage.clone().set(value)?.to_stmt()],
                ),
                o::return_stmt(storage),
            ],
        });
        Ok(o::this_expr().prop(name))
    }

    fn provider_value(&mut self, v: usize, n: usize, provider: &CompileProviderMetadata) -> Result<Expression> {
        if let Some(existing) = &provider.use_existing {
            return self.resolve_dependency(
                v,
                Some(n),
                &CompileDiDependencyMetadata {
                    token: Some(existing.clone()),
                    ..Default::default()
                },
            );
        }
        if let Some(factory) = &provider.use_factory {
            let deps = self.resolve_dependencies(v, Some(n), provider_deps(provider))?;
            return Ok(o::import_expr(factory.reference.clone()).call_fn(deps));
        }
        if let Some(class) = &provider.use_class {
            let deps = self.resolve_dependencies(v, Some(n), provider_deps(provider))?;
            return Ok(o::import_expr(class.reference.clone()).instantiate(deps));
        }
        Ok(convert_value_to_output_ast(
            provider.use_value.as_ref().unwrap_or(&StaticValue::Null),
        ))
    }

    pub(super) fn resolve_dependencies(
        &self,
        v: usize,
        n: Option<usize>,
        deps: &[CompileDiDependencyMetadata],
    ) -> Result<Vec<Expression>> {
        deps.iter().map(|dep| self.resolve_dependency(v, n, dep)).collect()
    }

    /// Expression for `dep` as seen from node `n` of view `v` (`None` for
    /// the view itself, as pipes see it).
    pub(super) fn resolve_dependency(
        &self,
        v: usize,
        n: Option<usize>,
        dep: &CompileDiDependencyMetadata,
    ) -> Result<Expression> {
        if dep.is_value {
            return Ok(convert_value_to_output_ast(
                dep.value.as_ref().unwrap_or(&StaticValue::Null),
            ));
        }
        let token = match &dep.token {
            Some(token) => token,
            None => return Ok(o::null_expr()),
        };
        let key = token.key();
        let mut view = v;
        let mut receiver = o::this_expr();
        let mut current = match n {
            Some(n) if dep.is_skip_self => self.views[v].nodes[n].parent,
            other => other,
        };
        loop {
            while let Some(index) = current {
                let node = &self.views[view].nodes[index];
                if let Some(instance) = node.instances.get(&key) {
                    return Ok(instance.clone().rebase_this(&receiver));
                }
                if dep.is_self {
                    return Ok(o::null_expr());
                }
                current = node.parent;
            }
            match self.views[view].declaration {
                Some((parent_view, declaring_node)) if !dep.is_self => {
                    receiver = receiver.prop(ViewConstructorVars::PARENT_VIEW);
                    view = parent_view;
                    current = Some(declaring_node);
                }
                _ => break,
            }
        }
        if dep.is_self || (dep.is_host && self.views[view].view_type == ViewType::Component) {
            return Ok(o::null_expr());
        }
        let token_expr = create_di_token_expression(token);
        let mut args = vec![token_expr];
        Ok(match self.views[view].view_type {
            ViewType::Host => {
                if dep.is_optional {
                    args.push(o::null_expr());
                }
                receiver.prop("parentInjector").call_method("get", args)
            }
            _ => {
                args.push(receiver.clone().prop(ViewConstructorVars::PARENT_INDEX));
                if dep.is_optional {
                    args.push(o::null_expr());
                }
                receiver
                    .prop(ViewConstructorVars::PARENT_VIEW)
                    .call_method("injectorGet", args)
            }
        })
    }

    fn create_query(
        &mut self,
        v: usize,
        n: Option<usize>,
        field_name: String,
        meta: CompileQueryMetadata,
        owner: Expression,
    ) -> Result<()> {
        let query_list = self.views[v].add_field(field_name);
        let create = self.import(&Identifiers::QueryList)?.instantiate(vec![]);
        self.views[v]
            .create_stmts
            .push(query_list.clone().set(create)?.to_stmt());
        if !meta.first {
            self.views[v].create_stmts.push(
                owner
                    .clone()
                    .prop(meta.property_name.clone())
                    .set(query_list.clone())?
                    .to_stmt(),
            );
        }
        self.queries.push(CompileQuery {
            meta,
            query_list,
            owner,
            view_index: v,
            node_index: n,
        });
        Ok(())
    }

    fn view_class_dependency(&mut self, comp: &StaticSymbol) -> Expression {
        let name = view_class_name(comp, 0);
        for dep in &self.dependencies {
            if let ViewCompileDependency::ViewClass(existing) = dep {
                if existing.comp.ptr_eq(comp) {
                    return o::placeholder_expr(&existing.placeholder);
                }
            }
        }
        let placeholder = o::Placeholder::new(name.clone());
        self.dependencies.push(ViewCompileDependency::ViewClass(ViewClassDependency {
            comp: comp.clone(),
            name,
            placeholder: placeholder.clone(),
        }));
        o::placeholder_expr(&placeholder)
    }

    fn directive_wrapper_dependency(&mut self, dir: &StaticSymbol) -> Expression {
        for dep in &self.dependencies {
            if let ViewCompileDependency::DirectiveWrapper(existing) = dep {
                if existing.dir.ptr_eq(dir) {
                    return o::placeholder_expr(&existing.placeholder);
                }
            }
        }
        let name = directive_wrapper_class_name(dir);
        let placeholder = o::Placeholder::new(name.clone());
        self.dependencies
            .push(ViewCompileDependency::DirectiveWrapper(DirectiveWrapperDependency {
                dir: dir.clone(),
                name,
                placeholder: placeholder.clone(),
            }));
        o::placeholder_expr(&placeholder)
    }

    fn component_factory_dependency(&mut self, comp: &StaticSymbol) -> Expression {
        for dep in &self.dependencies {
            if let ViewCompileDependency::ComponentFactory(existing) = dep {
                if existing.comp.ptr_eq(comp) {
                    return o::placeholder_expr(&existing.placeholder);
                }
            }
        }
        let placeholder = o::Placeholder::new(component_factory_name(comp));
        self.dependencies
            .push(ViewCompileDependency::ComponentFactory(ComponentFactoryDependency {
                comp: comp.clone(),
                placeholder: placeholder.clone(),
            }));
        o::placeholder_expr(&placeholder)
    }

    /// Locals visible in view `v`, including those of the declaring views.
    pub(super) fn scope_locals(&self, v: usize) -> IndexMap<String, Expression> {
        let mut locals = IndexMap::new();
        let mut view = v;
        let mut receiver = o::this_expr();
        loop {
            for (name, value) in &self.views[view].locals {
                locals
                    .entry(name.clone())
                    .or_insert_with(|| value.clone().rebase_this(&receiver));
            }
            match self.views[view].declaration {
                Some((parent_view, _)) => {
                    receiver = receiver.prop(ViewConstructorVars::PARENT_VIEW);
                    view = parent_view;
                }
                None => break,
            }
        }
        locals
    }

    /// The component instance as seen from view `v`.
    pub(super) fn implicit_receiver(&self, v: usize) -> Expression {
        let mut view = v;
        let mut receiver = o::this_expr();
        while let Some((parent_view, _)) = self.views[view].declaration {
            receiver = receiver.prop(ViewConstructorVars::PARENT_VIEW);
            view = parent_view;
        }
        receiver.prop("context")
    }

    /// Runs `convert` with the name resolver of view `v`, then instantiates
    /// the pipes it used for the first time.
    pub(super) fn with_scope<T>(
        &mut self,
        v: usize,
        event_scope: bool,
        convert: impl FnOnce(&dyn CompileReflector, &mut ViewScope<'a>, Expression) -> Result<T>,
    ) -> Result<T> {
        let mut locals = self.scope_locals(v);
        if event_scope {
            locals.insert(EVENT_NAME.to_string(), o::variable(EVENT_NAME));
        }
        let mut scope = ViewScope {
            locals,
            pipes: self.pipes,
            existing: self.views[v].pipes.clone(),
            view_index: v,
            created: Vec::new(),
        };
        let receiver = self.implicit_receiver(v);
        let result = convert(self.reflector, &mut scope, receiver)?;
        for (name, field_name, pipe) in scope.created {
            self.instantiate_pipe(v, name, field_name, &pipe)?;
        }
        Ok(result)
    }

    fn instantiate_pipe(
        &mut self,
        v: usize,
        name: String,
        field_name: String,
        pipe: &CompilePipeSummary,
    ) -> Result<()> {
        let mut deps = Vec::with_capacity(pipe.type_.di_deps.len());
        for dep in &pipe.type_.di_deps {
            let is_change_detector_ref = dep
                .token
                .as_ref()
                .map_or(false, |token| token.key() == self.builtins.change_detector_ref);
            deps.push(if is_change_detector_ref {
                o::this_expr().prop("ref")
            } else {
                self.resolve_dependency(v, None, dep)?
            });
        }
        let field = self.views[v].add_field(field_name);
        let create = o::import_expr(pipe.type_.reference.clone()).instantiate(deps);
        self.views[v].pipe_stmts.push(field.clone().set(create)?.to_stmt());
        self.views[v].pipes.insert(name, field);
        Ok(())
    }

    /// Generates the statements of every view class.
    pub(super) fn generate_view_classes(&mut self, render_type_var: &Expression) -> Result<Vec<Statement>> {
        let mut statements = Vec::with_capacity(self.views.len());
        for v in 0..self.views.len() {
            statements.push(self.generate_view_class(v, render_type_var)?);
        }
        Ok(statements)
    }

    fn generate_view_class(&mut self, v: usize, render_type_var: &Expression) -> Result<Statement> {
        let create_method = self.generate_create_method(v)?;
        let inject_method = self.generate_injector_get_method(v);
        let detect_changes_method = self.generate_detect_changes_method(v);
        let visit_root_nodes = self.generate_visit_root_nodes_method(v)?;
        let visit_projectable_nodes = self.generate_visit_projectable_nodes_method(v)?;
        let create_embedded_view = self.generate_create_embedded_view_method(v);

        let parent_class = if self.config.gen_debug_info {
            self.import(&Identifiers::DebugAppView)?
        } else {
            self.import(&Identifiers::AppView)?
        };
        let view = &self.views[v];
        let change_detection_status = if view.view_type == ViewType::Component
            && view.component.change_detection == Some(ChangeDetectionStrategy::OnPush)
        {
            "CheckOnce"
        } else {
            "CheckAlways"
        };
        let super_call = o::super_expr()
            .call_fn(vec![
                o::variable(view.class_name.clone()),
                render_type_var.clone(),
                create_enum_expression(self.reflector, &Identifiers::ViewType, view.view_type.member_name())?,
                o::variable(ViewConstructorVars::VIEW_UTILS),
                o::variable(ViewConstructorVars::PARENT_VIEW),
                o::variable(ViewConstructorVars::PARENT_INDEX),
                o::variable(ViewConstructorVars::PARENT_ELEMENT),
                create_enum_expression(
                    self.reflector,
                    &Identifiers::ChangeDetectorStatus,
                    change_detection_status,
                )?,
            ])
            .to_stmt();

        let destroy_stmts = view.destroy_stmts.clone();
        let detach_stmts = view.detach_stmts.clone();
        let dirty_parent_queries_stmts = view.dirty_parent_queries_stmts.clone();
        let class_name = view.class_name.clone();

        let mut methods = vec![create_method, inject_method, detect_changes_method];
        if !dirty_parent_queries_stmts.is_empty() {
            methods.push(ClassMethod::new("dirtyParentQueriesInternal", vec![], dirty_parent_queries_stmts));
        }
        methods.push(ClassMethod::new("destroyInternal", vec![], destroy_stmts));
        if !detach_stmts.is_empty() {
            methods.push(ClassMethod::new("detachInternal", vec![], detach_stmts));
        }
        methods.push(visit_root_nodes);
        if let Some(method) = visit_projectable_nodes {
            methods.push(method);
        }
        if let Some(method) = create_embedded_view {
            methods.push(method);
        }

        let mut builder = std::mem::take(&mut self.views[v].builder);
        let handle_event_methods = std::mem::take(&mut builder.methods);
        builder.methods = methods;
        builder.methods.extend(handle_event_methods);
        let class = builder.build(
            class_name,
            Some(parent_class),
            ViewConstructorVars::params(),
            vec![super_call],
        );
        Ok(Statement::DeclareClass(class))
    }

    fn generate_create_method(&self, v: usize) -> Result<ClassMethod> {
        let view = &self.views[v];
        let mut stmts = Vec::new();
        if view.view_type == ViewType::Component {
            stmts.push(
                ViewProperties::renderer()
                    .call_method(
                        "createViewRoot",
                        vec![o::this_expr().prop(ViewConstructorVars::PARENT_ELEMENT)],
                    )
                    .to_decl_stmt("parentRenderNode", true),
            );
        }
        stmts.extend(view.pipe_stmts.iter().cloned());
        stmts.extend(view.create_stmts.iter().cloned());

        let last_root_node = match view.root_nodes.last() {
            Some(RootNode::Node(index)) => view.nodes[*index].render_node.clone(),
            _ => o::null_expr(),
        };
        let all_nodes = view
            .nodes
            .iter()
            .filter(|node| !matches!(node.kind, NodeKind::NgContent(_)))
            .map(|node| node.render_node.clone())
            .collect();
        stmts.push(
            o::this_expr()
                .call_method(
                    "init",
                    vec![last_root_node, o::literal_arr(all_nodes), o::literal_arr(view.disposables.clone())],
                )
                .to_stmt(),
        );

        let result = if view.view_type == ViewType::Host {
            let host = view.nodes.first().ok_or_else(|| {
                CompilerError::illegal_state("Illegal state: Host view without a host element")
            })?;
            let component = host.component.as_ref().ok_or_else(|| {
                CompilerError::illegal_state("Illegal state: Host element without a component")
            })?;
            let instance = host
                .instances
                .get(&TokenKey::Symbol(component.type_.reference.clone()))
                .cloned()
                .unwrap_or_else(o::null_expr);
            self.import(&Identifiers::ComponentRef_)?.instantiate(vec![
                o::literal(0usize),
                o::this_expr(),
                host.render_node.clone(),
                instance,
            ])
        } else {
            o::null_expr()
        };
        stmts.push(o::return_stmt(result));
        Ok(ClassMethod::new("createInternal", vec![FnParam::new("rootSelector")], stmts))
    }

    fn generate_injector_get_method(&self, v: usize) -> ClassMethod {
        let view = &self.views[v];
        let token = o::variable(InjectMethodVars::TOKEN);
        let request_node_index = o::variable(InjectMethodVars::REQUEST_NODE_INDEX);
        let mut stmts = Vec::new();
        for node in &view.nodes {
            for (provider_token, instance, is_private) in &node.injectable_providers {
                let range = if *is_private { 0 } else { node.child_count };
                let in_range = o::literal(node.node_index)
                    .binary(o::BinaryOperator::LowerEquals, request_node_index.clone())
                    .and(request_node_index.clone().binary(
                        o::BinaryOperator::LowerEquals,
                        o::literal(node.node_index + range),
                    ));
                stmts.push(o::if_stmt(
                    token.clone().identical(provider_token.clone()).and(in_range),
                    vec![o::return_stmt(instance.clone())],
                ));
            }
        }
        stmts.push(o::return_stmt(o::variable(InjectMethodVars::NOT_FOUND_RESULT)));
        ClassMethod::new(
            "injectorGetInternal",
            vec![
                FnParam::new(InjectMethodVars::TOKEN),
                FnParam::new(InjectMethodVars::REQUEST_NODE_INDEX),
                FnParam::new(InjectMethodVars::NOT_FOUND_RESULT),
            ],
            stmts,
        )
    }

    fn generate_detect_changes_method(&self, v: usize) -> ClassMethod {
        let view = &self.views[v];
        let not_throw_on_change = o::not(DetectChangesVars::throw_on_change());
        let mut stmts = Vec::new();
        stmts.extend(view.inputs_stmts.iter().cloned());
        stmts.extend(view.nested_views_stmts.iter().cloned());
        let mut after_content = view.content_query_stmts.clone();
        after_content.extend(view.after_content_stmts.iter().cloned());
        if !after_content.is_empty() {
            stmts.push(o::if_stmt(not_throw_on_change.clone(), after_content));
        }
        stmts.extend(view.render_stmts.iter().cloned());
        stmts.extend(view.animation_stmts.iter().cloned());
        stmts.extend(view.comp_view_stmts.iter().cloned());
        let mut after_view = view.view_query_stmts.clone();
        after_view.extend(view.after_view_stmts.iter().cloned());
        if !after_view.is_empty() {
            stmts.push(o::if_stmt(not_throw_on_change, after_view));
        }
        ClassMethod::new(
            "detectChangesInternal",
            vec![FnParam::new(DetectChangesVars::THROW_ON_CHANGE)],
            stmts,
        )
    }

    /// Statements calling `cb` on `node` and on the nodes it stands for.
    fn visit_node_stmts(&self, v: usize, node_index: usize, cb: &Expression, ctx: &Expression) -> Vec<Statement> {
        let node = &self.views[v].nodes[node_index];
        match node.kind {
            NodeKind::NgContent(slot) => vec![o::this_expr()
                .call_method("visitProjectedNodes", vec![o::literal(slot), cb.clone(), ctx.clone()])
                .to_stmt()],
            _ => {
                let mut stmts = vec![cb
                    .clone()
                    .call_fn(vec![node.render_node.clone(), ctx.clone()])
                    .to_stmt()];
                if let Some(vc) = &node.view_container {
                    stmts.push(
                        vc.clone()
                            .call_method("visitNestedViewRootNodes", vec![cb.clone(), ctx.clone()])
                            .to_stmt(),
                    );
                }
                stmts
            }
        }
    }

    fn generate_visit_root_nodes_method(&self, v: usize) -> Result<ClassMethod> {
        let cb = o::variable("cb");
        let ctx = o::variable("ctx");
        let mut stmts = Vec::new();
        for root in &self.views[v].root_nodes {
            match root {
                RootNode::Node(index) => stmts.extend(self.visit_node_stmts(v, *index, &cb, &ctx)),
                RootNode::NgContent(slot) => stmts.push(
                    o::this_expr()
                        .call_method("visitProjectedNodes", vec![o::literal(*slot), cb.clone(), ctx.clone()])
                        .to_stmt(),
                ),
            }
        }
        Ok(ClassMethod::new(
            "visitRootNodesInternal",
            vec![FnParam::new("cb"), FnParam::new("ctx")],
            stmts,
        ))
    }

    fn generate_visit_projectable_nodes_method(&self, v: usize) -> Result<Option<ClassMethod>> {
        let cb = o::variable("cb");
        let ctx = o::variable("ctx");
        let node_index = o::variable("nodeIndex");
        let ng_content_index = o::variable("ngContentIndex");
        let mut stmts = Vec::new();
        for node in &self.views[v].nodes {
            for (slot, projected) in node.content_nodes.iter().enumerate() {
                if projected.is_empty() {
                    continue;
                }
                let body = projected
                    .iter()
                    .flat_map(|index| self.visit_node_stmts(v, *index, &cb, &ctx))
                    .collect();
                stmts.push(o::if_stmt(
                    node_index
                        .clone()
                        .equals(o::literal(node.node_index))
                        .and(ng_content_index.clone().equals(o::literal(slot))),
                    body,
                ));
            }
        }
        if stmts.is_empty() {
            return Ok(None);
        }
        Ok(Some(ClassMethod::new(
            "visitProjectableNodesInternal",
            vec![
                FnParam::new("nodeIndex"),
                FnParam::new("ngContentIndex"),
                FnParam::new("cb"),
                FnParam::new("ctx"),
            ],
            stmts,
        )))
    }

    fn generate_create_embedded_view_method(&self, v: usize) -> Option<ClassMethod> {
        let node_index = o::variable("nodeIndex");
        let mut stmts = Vec::new();
        for node in &self.views[v].nodes {
            if let Some(embedded) = node.embedded_view {
                let create = o::variable(self.views[embedded].class_name.clone()).instantiate(vec![
                    ViewProperties::view_utils(),
                    o::this_expr(),
                    o::literal(node.node_index),
                    node.render_node.clone(),
                ]);
                stmts.push(o::if_stmt(
                    node_index.clone().equals(o::literal(node.node_index)),
                    vec![o::return_stmt(create)],
                ));
            }
        }
        if stmts.is_empty() {
            return None;
        }
        stmts.push(o::return_stmt(o::null_expr()));
        Some(ClassMethod::new(
            "createEmbeddedViewInternal",
            vec![FnParam::new("nodeIndex")],
            stmts,
        ))
    }

    /// `this.eventHandler(this.handleEvent_<n>)`
    pub(super) fn event_handler_expr(node_index: usize) -> Expression {
        o::this_expr().call_method(
            "eventHandler",
            vec![o::this_expr().prop(handle_event_method_name(node_index))],
        )
    }
}

/// Dependencies a transformed provider is constructed with.
fn provider_deps(provider: &CompileProviderMetadata) -> &[CompileDiDependencyMetadata] {
    if let Some(deps) = &provider.deps {
        return deps;
    }
    if let Some(factory) = &provider.use_factory {
        return &factory.di_deps;
    }
    if let Some(class) = &provider.use_class {
        return &class.di_deps;
    }
    &[]
}

/// Element attributes plus the host attributes of its directives, sorted by
/// name. `class` and `style` values are concatenated.
fn merge_html_and_directive_attrs(html_attrs: &[AttrAst], directives: &[DirectiveAst]) -> Vec<(String, String)> {
    let mut merged: IndexMap<String, String> = IndexMap::new();
    let mut add = |name: &str, value: &str| match merged.get_mut(name) {
        Some(prev) if name == CLASS_ATTR || name == STYLE_ATTR => {
            let separator = if name == CLASS_ATTR { " " } else { ";" };
            *prev = format!("{}{}{}", prev, separator, value);
        }
        _ => {
            merged.insert(name.to_string(), value.to_string());
        }
    };
    for attr in html_attrs {
        add(&attr.name, &attr.value);
    }
    for directive in directives {
        for (name, value) in &directive.directive.host_attributes {
            add(name, value);
        }
    }
    let mut entries: Vec<(String, String)> = merged.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

/// Name resolution for the bindings of one view.
pub(super) struct ViewScope<'a> {
    locals: IndexMap<String, Expression>,
    pipes: &'a [CompilePipeSummary],
    existing: IndexMap<String, Expression>,
    view_index: usize,
    created: Vec<(String, String, CompilePipeSummary)>,
}

impl NameResolver for ViewScope<'_> {
    fn call_pipe(&mut self, name: &str, input: Expression, args: Vec<Expression>) -> Result<Expression> {
        let instance = match self.existing.get(name) {
            Some(instance) => instance.clone(),
            None => {
                let pipe = self
                    .pipes
                    .iter()
                    .find(|pipe| pipe.name == name)
                    .ok_or_else(|| {
                        CompilerError::illegal_state(format!("The pipe '{}' could not be found", name))
                    })?;
                let field_name = format!("_pipe_{}_{}", sanitize_identifier(name), self.view_index);
                let instance = o::this_expr().prop(field_name.clone());
                self.existing.insert(name.to_string(), instance.clone());
                self.created.push((name.to_string(), field_name, pipe.clone()));
                instance
            }
        };
        let mut call_args = Vec::with_capacity(args.len() + 1);
        call_args.push(input);
        call_args.extend(args);
        Ok(instance.call_method("transform", call_args))
    }

    fn get_local(&self, name: &str) -> Option<Expression> {
        self.locals.get(name).cloned()
    }
}
