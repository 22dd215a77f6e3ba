//! View Compiler
//!
//! Turns the parsed template of a component into `AppView` subclasses: one
//! for the template itself and one per embedded `<template>`. Child
//! component views, directive wrappers and entry component factories are
//! referenced through placeholders listed in the result.

mod compile_view;
pub(crate) mod constants;
pub mod deps;
mod event_binder;
mod lifecycle_binder;
mod property_binder;
mod query_binder;
mod view_binder;
mod view_builder;

pub use compile_view::ViewType;
pub use deps::{
    ComponentFactoryDependency, DirectiveWrapperDependency, ViewClassDependency,
    ViewCompileDependency,
};

use crate::animation::AnimationEntryCompileResult;
use crate::aot::static_symbol::StaticSymbol;
use crate::compile_metadata::{identifier_name, CompileDirectiveMetadata, CompilePipeSummary};
use crate::compile_reflector::CompileReflector;
use crate::compiler_util::identifier_util::create_enum_expression;
use crate::config::CompilerConfig;
use crate::error::Result;
use crate::identifiers::{resolve_identifier, Identifiers};
use crate::output::output_ast::{self as o, Expression, Statement};
use crate::schema::element_schema_registry::ElementSchemaRegistry;
use crate::template_parser::template_ast::TemplateAst;
use std::rc::Rc;
use view_builder::ViewBuilder;

/// `View_<Comp><index>`
pub fn view_class_name(comp: &StaticSymbol, view_index: usize) -> String {
    format!("View_{}{}", identifier_name(comp), view_index)
}

/// `<Comp>NgFactory`
pub fn component_factory_name(comp: &StaticSymbol) -> String {
    format!("{}NgFactory", identifier_name(comp))
}

/// Name of the synthetic host type of a component, `<Comp>_Host`.
pub fn host_type_name(comp: &StaticSymbol) -> String {
    format!("{}_Host", identifier_name(comp))
}

/// `Wrapper_<Dir>`
pub fn directive_wrapper_class_name(dir: &StaticSymbol) -> String {
    format!("Wrapper_{}", identifier_name(dir))
}

pub fn render_type_var_name(comp: &StaticSymbol) -> String {
    format!("renderType_{}", identifier_name(comp))
}

#[derive(Debug)]
pub struct ViewCompileResult {
    pub statements: Vec<Statement>,
    /// Class of the component (or host) view.
    pub view_class_var: String,
    pub dependencies: Vec<ViewCompileDependency>,
}

pub struct ViewCompiler {
    config: CompilerConfig,
    reflector: Rc<dyn CompileReflector>,
    schema_registry: Rc<dyn ElementSchemaRegistry>,
}

impl ViewCompiler {
    pub fn new(
        config: CompilerConfig,
        reflector: Rc<dyn CompileReflector>,
        schema_registry: Rc<dyn ElementSchemaRegistry>,
    ) -> Self {
        ViewCompiler {
            config,
            reflector,
            schema_registry,
        }
    }

    /// Compiles the views of `component`. `styles` is the expression of its
    /// compiled styles and `animations` the compiled animation triggers,
    /// both declared in the same output file.
    pub fn compile_component(
        &self,
        component: &CompileDirectiveMetadata,
        template: &[TemplateAst],
        styles: Expression,
        used_pipes: &[CompilePipeSummary],
        animations: &[AnimationEntryCompileResult],
    ) -> Result<ViewCompileResult> {
        let _span = tracing::debug_span!("compile_views", component = %component.type_.name()).entered();
        let render_type_var = render_type_var_name(component.reference());
        let template_meta = component.template.clone().unwrap_or_default();
        let template_url = if self.config.gen_debug_info {
            template_meta.template_url.clone().unwrap_or_default()
        } else {
            String::new()
        };
        let encapsulation = template_meta
            .encapsulation
            .unwrap_or(self.config.default_encapsulation);
        let animation_map = o::literal_map(
            animations
                .iter()
                .map(|animation| o::LiteralMapEntry {
                    key: animation.name.clone(),
                    value: o::variable(animation.fn_name.clone()),
                    quoted: true,
                })
                .collect(),
        );

        let mut statements = vec![o::import_expr(resolve_identifier(
            self.reflector.as_ref(),
            &Identifiers::createRenderComponentType,
        )?)
        .call_fn(vec![
            o::literal(template_url),
            o::literal(template_meta.ng_content_selectors.len()),
            create_enum_expression(
                self.reflector.as_ref(),
                &Identifiers::ViewEncapsulation,
                encapsulation.member_name(),
            )?,
            styles,
            animation_map,
        ])
        .to_decl_stmt(render_type_var.clone(), false)];

        let mut builder = ViewBuilder::new(
            self.reflector.as_ref(),
            &self.config,
            self.schema_registry.as_ref(),
            component,
            used_pipes,
        )?;
        builder.build(template)?;
        builder.bind()?;
        statements.extend(builder.generate_view_classes(&o::variable(render_type_var))?);
        let view_class_var = builder
            .views
            .first()
            .map(|view| view.class_name.clone())
            .unwrap_or_else(|| view_class_name(component.reference(), 0));
        tracing::debug!(
            views = builder.views.len(),
            dependencies = builder.dependencies.len(),
            "compiled component views"
        );
        Ok(ViewCompileResult {
            statements,
            view_class_var,
            dependencies: builder.dependencies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile_metadata::{
        create_host_component_meta, CompileDiDependencyMetadata, CompileDirectiveSummary,
        CompileQueryMetadata, CompileTemplateMetadata, CompileTokenMetadata, CompileTypeMetadata,
        DirectiveMetadataInput,
    };
    use crate::output::js_emitter::{ImportResolver, JavaScriptEmitter};
    use crate::output::output_ast::ResolvedReference;
    use crate::schema::DomElementSchemaRegistry;
    use crate::template_parser::template_parser::TemplateParser;
    use crate::testing::MockReflector;

    struct Verbatim;

    impl ImportResolver for Verbatim {
        fn file_name_to_module_name(&self, imported: &str, _containing: &str) -> String {
            imported.to_string()
        }
    }

    struct Fixture {
        reflector: Rc<MockReflector>,
        parser: TemplateParser,
        compiler: ViewCompiler,
    }

    impl Fixture {
        fn new() -> Self {
            let reflector = Rc::new(MockReflector::new());
            let schema: Rc<dyn ElementSchemaRegistry> = Rc::new(DomElementSchemaRegistry::new());
            Fixture {
                parser: TemplateParser::new(CompilerConfig::default(), reflector.clone(), schema.clone()),
                compiler: ViewCompiler::new(CompilerConfig::default(), reflector.clone(), schema),
                reflector,
            }
        }

        fn component(&self, name: &str, selector: &str, input: DirectiveMetadataInput) -> CompileDirectiveMetadata {
            CompileDirectiveMetadata::create(
                CompileTypeMetadata::new(self.reflector.symbol("/app/comp.ts", name)),
                DirectiveMetadataInput {
                    is_component: true,
                    selector: Some(selector.to_string()),
                    template: Some(input.template.clone().unwrap_or_default()),
                    ..input
                },
            )
        }

        fn compile(
            &self,
            component: &CompileDirectiveMetadata,
            template: &str,
            directives: &[CompileDirectiveSummary],
            pipes: &[CompilePipeSummary],
        ) -> (String, ViewCompileResult) {
            let asts = self
                .parser
                .parse(component, template, directives, pipes, &[], "TestComp")
                .unwrap();
            let result = self
                .compiler
                .compile_component(component, &asts, o::variable("styles_Comp"), pipes, &[])
                .unwrap();
            for dep in &result.dependencies {
                let name = dep.placeholder().name().to_string();
                dep.placeholder()
                    .resolve(ResolvedReference::Symbol(self.reflector.symbol("/app/other.ngfactory.js", &name)))
                    .unwrap();
            }
            let source = JavaScriptEmitter::new(Rc::new(Verbatim))
                .emit_statements("/app/comp.ngfactory.js", &result.statements, &[])
                .unwrap();
            (source, result)
        }
    }

    #[test]
    fn should_create_elements_text_and_event_handlers() {
        let fixture = Fixture::new();
        let comp = fixture.component("Comp", "my-comp", DirectiveMetadataInput::default());
        let (source, result) =
            fixture.compile(&comp, "<div class=\"a\" (click)=\"onClick($event)\">{{name}}</div>", &[], &[]);
        assert_eq!(result.view_class_var, "View_Comp0");
        assert!(source.contains(".createRenderComponentType('',0,"));
        assert!(source.contains(".ViewEncapsulation.Emulated,styles_Comp,{});"));
        assert!(source.contains("class View_Comp0 extends "));
        assert!(source.contains("const parentRenderNode = this.renderer.createViewRoot(this.parentElement);"));
        assert!(source.contains(".createRenderElement(this.renderer,parentRenderNode,'div',['class','a'],null);"));
        assert!(source.contains("this._text_1 = this.renderer.createText(this._el_0,'',null);"));
        assert!(source.contains(".subscribeToRenderElement(this,this._el_0,['click',null],this.eventHandler(this.handleEvent_0));"));
        assert!(source.contains("this.init(this._el_0,[this._el_0,this._text_1],[disposable_0]);"));
        assert!(source.contains("handleEvent_0(eventName,$event) {"));
        assert!(source.contains("var pd_0 = (this.context.onClick($event) !== false);"));
        assert!(source.contains("this.renderer.setText(this._text_1,currVal_1);"));
    }

    #[test]
    fn should_compile_embedded_templates_with_directive_wrappers() {
        let fixture = Fixture::new();
        let vc_ref = resolve_identifier(fixture.reflector.as_ref(), &Identifiers::ViewContainerRef).unwrap();
        let tpl_ref = resolve_identifier(fixture.reflector.as_ref(), &Identifiers::TemplateRef).unwrap();
        let mut if_type = CompileTypeMetadata::new(fixture.reflector.symbol("/app/if.ts", "NgIf"));
        if_type.di_deps = vec![
            CompileDiDependencyMetadata {
                token: Some(CompileTokenMetadata::from_symbol(vc_ref)),
                ..Default::default()
            },
            CompileDiDependencyMetadata {
                token: Some(CompileTokenMetadata::from_symbol(tpl_ref)),
                ..Default::default()
            },
        ];
        let ng_if = CompileDirectiveMetadata::create(
            if_type,
            DirectiveMetadataInput {
                selector: Some("[ngIf]".to_string()),
                inputs: vec!["ngIf".to_string()],
                ..Default::default()
            },
        )
        .to_summary();
        let comp = fixture.component("Comp", "my-comp", DirectiveMetadataInput::default());
        let (source, result) = fixture.compile(&comp, "<div *ngIf=\"show\">{{item}}</div>", &[ng_if], &[]);

        assert!(matches!(
            &result.dependencies[..],
            [ViewCompileDependency::DirectiveWrapper(dep)] if dep.name == "Wrapper_NgIf"
        ));
        assert!(source.contains("this._vc_0 = new "));
        assert!(source.contains(".Wrapper_NgIf(this._vc_0.vcRef,new "));
        assert!(source.contains(".TemplateRef_(this,0,this._anchor_0));"));
        assert!(source.contains(".check_ngIf(currVal_0,throwOnChange,false);"));
        assert!(source.contains("this._vc_0.detectChangesInNestedViews(throwOnChange);"));
        assert!(source.contains("createEmbeddedViewInternal(nodeIndex) {"));
        assert!(source.contains("return new View_Comp1(this.viewUtils,this,0,this._anchor_0);"));
        assert!(source.contains("class View_Comp1 extends "));
        assert!(source.contains("const currVal_0 = this.parentView.context.item;"));
    }

    #[test]
    fn should_compile_host_views() {
        let fixture = Fixture::new();
        let comp = fixture.component("Comp", "my-comp", DirectiveMetadataInput::default());
        let host_type = fixture.reflector.symbol("/app/comp.ts", "Comp_Host");
        let host = create_host_component_meta(host_type, &comp);
        let template = host.template.as_ref().and_then(|t| t.template.clone()).unwrap();
        let (source, result) = fixture.compile(&host, &template, &[comp.to_summary()], &[]);

        assert_eq!(result.view_class_var, "View_Comp_Host0");
        assert!(matches!(
            &result.dependencies[0],
            ViewCompileDependency::ViewClass(dep) if dep.name == "View_Comp0"
        ));
        assert!(source.contains(".selectOrCreateRenderHostElement(this.renderer,'my-comp',[],rootSelector,null);"));
        assert!(source.contains(".View_Comp0(this.viewUtils,this,0,this._el_0);"));
        assert!(source.contains("this.compView_0.create(this._Comp_0_"));
        assert!(source.contains(".ComponentRef_(0,this,this._el_0,this._Comp_0_"));
        assert!(source.contains("this.compView_0.internalDetectChanges(throwOnChange);"));
    }

    #[test]
    fn should_instantiate_pipes_once_per_view() {
        let fixture = Fixture::new();
        let pipe = CompilePipeSummary {
            type_: CompileTypeMetadata::new(fixture.reflector.symbol("/app/upper.ts", "UpperPipe")),
            name: "upper".to_string(),
            pure: true,
        };
        let comp = fixture.component("Comp", "my-comp", DirectiveMetadataInput::default());
        let (source, _) = fixture.compile(&comp, "{{a | upper}}{{b | upper}}", &[], &[pipe]);
        assert_eq!(source.matches("this._pipe_upper_0 = new ").count(), 1);
        assert!(source.contains("this._pipe_upper_0.transform(this.context.a)"));
    }

    #[test]
    fn should_update_view_queries() {
        let fixture = Fixture::new();
        let comp = fixture.component(
            "Comp",
            "my-comp",
            DirectiveMetadataInput {
                view_queries: vec![CompileQueryMetadata {
                    selectors: vec![CompileTokenMetadata::from_value("ref")],
                    descendants: true,
                    first: true,
                    property_name: "child".to_string(),
                    read: None,
                }],
                template: Some(CompileTemplateMetadata::default()),
                ..Default::default()
            },
        );
        let (source, _) = fixture.compile(&comp, "<div #ref></div>", &[], &[]);
        assert!(source.contains("this._viewQuery_child_0 = new "));
        assert!(source.contains("if (this._viewQuery_child_0.dirty) {"));
        assert!(source.contains("this._viewQuery_child_0.reset([this._el_0]);"));
        assert!(source.contains("this.context.child = this._viewQuery_child_0.first;"));
    }
}
