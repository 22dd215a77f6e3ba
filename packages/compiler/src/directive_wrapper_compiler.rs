//! Directive Wrapper Compiler
//!
//! Every directive used in a template is instantiated through a generated
//! `Wrapper_<Dir>` class. The wrapper owns the directive instance, tracks
//! input changes, calls `ngOnChanges`/`ngOnInit`/`ngDoCheck`, evaluates host
//! bindings and listeners, and subscribes the view to the directive outputs.

use crate::compile_metadata::{identifier_module_url, identifier_name, CompileDirectiveMetadata};
use crate::compile_reflector::CompileReflector;
use crate::compiler_util::binding_util::{create_check_binding_field, create_check_binding_stmt};
use crate::compiler_util::expression_converter::{
    convert_action_binding, convert_property_binding, ConvertPropertyBindingResult, NameResolver,
    EVENT_NAME,
};
use crate::compiler_util::render_util::{
    create_check_animation_binding_stmts, create_check_render_binding_stmt,
};
use crate::config::CompilerConfig;
use crate::core::LifecycleHooks;
use crate::error::{CompilerError, Result};
use crate::expression_parser::{Lexer, Parser};
use crate::identifiers::{resolve_identifier, IdentifierSpec, Identifiers};
use crate::ml_parser::InterpolationConfig;
use crate::output::class_builder::ClassBuilder;
use crate::output::output_ast::{self as o, ClassMethod, Expression, FnParam, Statement};
use crate::parse_util::{ParseError, ParseLocation, ParseSourceFile, ParseSourceSpan};
use crate::schema::ElementSchemaRegistry;
use crate::template_parser::binding_parser::BindingParser;
use crate::template_parser::template_ast::{BoundElementPropertyAst, BoundEventAst, PropertyBindingType};
use crate::util::camel_case_to_dash_case;
use crate::view_compiler::directive_wrapper_class_name;
use std::rc::Rc;

const CONTEXT_FIELD_NAME: &str = "context";
const CHANGED_FIELD_NAME: &str = "_changed";
const CHANGES_FIELD_NAME: &str = "_changes";
const EVENT_HANDLER_FIELD_NAME: &str = "_eventHandler";

const VIEW_VAR: &str = "view";
const COMPONENT_VIEW_VAR: &str = "componentView";
const RENDER_EL_VAR: &str = "el";
const CURR_VALUE_VAR: &str = "currValue";
const THROW_ON_CHANGE_VAR: &str = "throwOnChange";
const FORCE_UPDATE_VAR: &str = "forceUpdate";
const EVENT_NAME_VAR: &str = "eventName";
const CHANGED_VAR: &str = "changed";
const RESULT_VAR: &str = "result";

#[derive(Debug)]
pub struct DirectiveWrapperCompileResult {
    pub statements: Vec<Statement>,
    pub dir_wrapper_class_var: String,
}

pub struct DirectiveWrapperCompiler {
    config: CompilerConfig,
    reflector: Rc<dyn CompileReflector>,
    schema_registry: Rc<dyn ElementSchemaRegistry>,
    expr_parser: Parser,
}

impl DirectiveWrapperCompiler {
    pub fn new(
        config: CompilerConfig,
        reflector: Rc<dyn CompileReflector>,
        schema_registry: Rc<dyn ElementSchemaRegistry>,
    ) -> Self {
        DirectiveWrapperCompiler {
            config,
            reflector,
            schema_registry,
            expr_parser: Parser::new(Lexer::new()),
        }
    }

    pub fn compile(&self, dir_meta: &CompileDirectiveMetadata) -> Result<DirectiveWrapperCompileResult> {
        let _span = tracing::debug_span!("compile_wrapper", directive = %dir_meta.type_.name()).entered();
        let (host_props, host_listeners) = self.parse_host_bindings(dir_meta)?;
        let mut builder = WrapperBuilder::new(&self.config, self.reflector.as_ref(), dir_meta);
        for input in dir_meta.inputs.keys() {
            builder.add_check_input_method(input)?;
        }
        builder.add_ng_do_check_method()?;
        builder.add_check_host_method(&host_props, &host_listeners)?;
        builder.add_handle_event_method(&host_listeners)?;
        builder.add_subscribe_method();
        let class_stmt = builder.build()?;
        let dir_wrapper_class_var = class_stmt.name.clone();
        Ok(DirectiveWrapperCompileResult {
            statements: vec![Statement::DeclareClass(class_stmt)],
            dir_wrapper_class_var,
        })
    }

    fn parse_host_bindings(
        &self,
        dir_meta: &CompileDirectiveMetadata,
    ) -> Result<(Vec<BoundElementPropertyAst>, Vec<BoundEventAst>)> {
        let name = identifier_name(dir_meta.reference());
        let module_url = identifier_module_url(dir_meta.reference());
        let source_file_name = if module_url.is_empty() {
            format!("in Directive {}", name)
        } else {
            format!("in Directive {} in {}", name, module_url)
        };
        let file = ParseSourceFile::new("", source_file_name);
        let location = ParseLocation::new(file, 0, 0, 0);
        let source_span = ParseSourceSpan::new(location.clone(), location);

        let summary = dir_meta.to_summary();
        let mut parser = BindingParser::new(
            &self.expr_parser,
            InterpolationConfig::default(),
            self.schema_registry.as_ref(),
            &[],
        );
        let host_props = parser.create_directive_host_property_asts(&summary, &source_span);
        let host_listeners = parser.create_directive_host_event_asts(&summary, &source_span);
        let (errors, warnings): (Vec<ParseError>, Vec<ParseError>) =
            parser.errors.into_iter().partition(ParseError::is_fatal);
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }
        if !errors.is_empty() {
            return Err(CompilerError::TemplateParse { errors });
        }
        Ok((host_props, host_listeners))
    }
}

struct WrapperBuilder<'a> {
    config: &'a CompilerConfig,
    reflector: &'a dyn CompileReflector,
    dir_meta: &'a CompileDirectiveMetadata,
    class: ClassBuilder,
    detach_stmts: Vec<Statement>,
    destroy_stmts: Vec<Statement>,
    gen_changes: bool,
    binding_count: usize,
}

impl<'a> WrapperBuilder<'a> {
    fn new(config: &'a CompilerConfig, reflector: &'a dyn CompileReflector, dir_meta: &'a CompileDirectiveMetadata) -> Self {
        let hooks = dir_meta.type_.lifecycle_hooks;
        let mut destroy_stmts = Vec::new();
        if hooks.contains(LifecycleHooks::ON_DESTROY) {
            destroy_stmts.push(context().call_method("ngOnDestroy", vec![]).to_stmt());
        }
        WrapperBuilder {
            config,
            reflector,
            dir_meta,
            class: ClassBuilder::new(),
            detach_stmts: Vec::new(),
            destroy_stmts,
            gen_changes: hooks.contains(LifecycleHooks::ON_CHANGES) || config.log_binding_update,
            binding_count: 0,
        }
    }

    fn import(&self, spec: &IdentifierSpec) -> Result<Expression> {
        Ok(o::import_expr(resolve_identifier(self.reflector, spec)?))
    }

    fn has_hook(&self, hook: LifecycleHooks) -> bool {
        self.dir_meta.type_.lifecycle_hooks.contains(hook)
    }

    /// `check_<input>(currValue, throwOnChange, forceUpdate)`
    fn add_check_input_method(&mut self, input: &str) -> Result<()> {
        let field_name = format!("_{}", input);
        let field = o::this_expr().prop(field_name.clone());
        self.class.add_field(field_name);
        self.class.ctor_stmts.push(field.clone().set(self.import(&Identifiers::UNINITIALIZED)?)?.to_stmt());

        let curr_value = o::variable(CURR_VALUE_VAR);
        let mut on_change = vec![
            o::this_expr().prop(CHANGED_FIELD_NAME).set(o::literal(true))?.to_stmt(),
            context().prop(input).set(curr_value.clone())?.to_stmt(),
        ];
        if self.gen_changes {
            on_change.push(
                o::this_expr()
                    .prop(CHANGES_FIELD_NAME)
                    .key(o::literal(input))
                    .set(
                        self.import(&Identifiers::SimpleChange)?
                            .instantiate(vec![field.clone(), curr_value.clone()]),
                    )?
                    .to_stmt(),
            );
        }
        let eval = ConvertPropertyBindingResult {
            stmts: Vec::new(),
            curr_val_expr: curr_value,
            force_update: Some(o::variable(FORCE_UPDATE_VAR)),
        };
        let body = create_check_binding_stmt(
            self.reflector,
            &eval,
            &field,
            &o::variable(THROW_ON_CHANGE_VAR),
            on_change,
        )?;
        self.class.add_method(ClassMethod::new(
            format!("check_{}", input),
            vec![
                FnParam::new(CURR_VALUE_VAR),
                FnParam::new(THROW_ON_CHANGE_VAR),
                FnParam::new(FORCE_UPDATE_VAR),
            ],
            body,
        ));
        Ok(())
    }

    /// `ngDoCheck(view, el, throwOnChange)`; returns whether any input changed.
    fn add_ng_do_check_method(&mut self) -> Result<()> {
        let changed = o::variable(CHANGED_VAR);
        let mut stmts = vec![
            o::this_expr().prop(CHANGED_FIELD_NAME).to_decl_stmt(CHANGED_VAR, false),
            o::this_expr().prop(CHANGED_FIELD_NAME).set(o::literal(false))?.to_stmt(),
        ];
        let mut lifecycle_stmts = Vec::new();
        if self.gen_changes {
            let mut on_changes = Vec::new();
            if self.has_hook(LifecycleHooks::ON_CHANGES) {
                on_changes.push(
                    context()
                        .call_method("ngOnChanges", vec![o::this_expr().prop(CHANGES_FIELD_NAME)])
                        .to_stmt(),
                );
            }
            if self.config.log_binding_update {
                for (input, _) in &self.dir_meta.inputs {
                    on_changes.push(
                        self.import(&Identifiers::setBindingDebugInfo)?
                            .call_fn(vec![
                                o::variable(VIEW_VAR).prop("renderer"),
                                o::variable(RENDER_EL_VAR),
                                o::literal(format!("ng-reflect-{}", camel_case_to_dash_case(input))),
                                context().prop(input.as_str()),
                            ])
                            .to_stmt(),
                    );
                }
            }
            on_changes.push(reset_changes_stmt()?);
            lifecycle_stmts.push(o::if_stmt(changed.clone(), on_changes));
        }
        if self.has_hook(LifecycleHooks::ON_INIT) {
            lifecycle_stmts.push(o::if_stmt(
                o::variable(VIEW_VAR).prop("numberOfChecks").identical(o::literal(0usize)),
                vec![context().call_method("ngOnInit", vec![]).to_stmt()],
            ));
        }
        if self.has_hook(LifecycleHooks::DO_CHECK) {
            lifecycle_stmts.push(context().call_method("ngDoCheck", vec![]).to_stmt());
        }
        if !lifecycle_stmts.is_empty() {
            stmts.push(o::if_stmt(o::not(o::variable(THROW_ON_CHANGE_VAR)), lifecycle_stmts));
        }
        stmts.push(o::return_stmt(changed));
        self.class.add_method(ClassMethod::new(
            "ngDoCheck",
            vec![
                FnParam::new(VIEW_VAR),
                FnParam::new(RENDER_EL_VAR),
                FnParam::new(THROW_ON_CHANGE_VAR),
            ],
            stmts,
        ));
        Ok(())
    }

    /// `checkHost(view, componentView, el, throwOnChange, ...secCtx)`. Host
    /// properties whose security context depends on the element get one
    /// extra parameter each.
    fn add_check_host_method(
        &mut self,
        host_props: &[BoundElementPropertyAst],
        host_events: &[BoundEventAst],
    ) -> Result<()> {
        let mut params = vec![
            FnParam::new(VIEW_VAR),
            FnParam::new(COMPONENT_VIEW_VAR),
            FnParam::new(RENDER_EL_VAR),
            FnParam::new(THROW_ON_CHANGE_VAR),
        ];
        let mut stmts = Vec::new();
        for host_prop in host_props {
            let binding_id = self.binding_count.to_string();
            self.binding_count += 1;
            let field = create_check_binding_field(&mut self.class, self.reflector, binding_id.clone())?;
            let eval = convert_property_binding(
                self.reflector,
                &mut HostBindingScope { event: false },
                context(),
                &host_prop.value.ast,
                &binding_id,
            )?;
            let security_context = if host_prop.needs_runtime_security_context {
                let name = format!("secCtx_{}", params.len());
                params.push(FnParam::new(name.clone()));
                Some(o::variable(name))
            } else {
                None
            };
            if host_prop.type_ == PropertyBindingType::Animation {
                let event_listener = o::this_expr()
                    .prop(EVENT_HANDLER_FIELD_NAME)
                    .or(self.import(&Identifiers::noop)?);
                let animation = create_check_animation_binding_stmts(
                    self.reflector,
                    o::variable(VIEW_VAR),
                    o::variable(COMPONENT_VIEW_VAR),
                    host_prop,
                    host_events,
                    event_listener,
                    o::variable(RENDER_EL_VAR),
                    field.expression,
                    &eval,
                )?;
                stmts.extend(animation.check_update_stmts);
                self.detach_stmts.extend(animation.check_detach_stmts);
            } else {
                stmts.extend(create_check_render_binding_stmt(
                    self.reflector,
                    o::variable(VIEW_VAR),
                    o::variable(RENDER_EL_VAR),
                    host_prop,
                    field.expression,
                    &eval,
                    security_context,
                )?);
            }
        }
        self.class.add_method(ClassMethod::new("checkHost", params, stmts));
        Ok(())
    }

    /// `handleEvent(eventName, $event)`; false when a listener prevented the
    /// default action.
    fn add_handle_event_method(&mut self, host_listeners: &[BoundEventAst]) -> Result<()> {
        let result = o::variable(RESULT_VAR);
        let mut stmts = vec![o::literal(true).to_decl_stmt(RESULT_VAR, false)];
        for (index, listener) in host_listeners.iter().enumerate() {
            let action = convert_action_binding(
                self.reflector,
                &mut HostBindingScope { event: true },
                context(),
                &listener.handler.ast,
                &format!("sub_{}", index),
            )?;
            let mut true_case = action.stmts;
            if let Some(allow_default) = action.allow_default {
                true_case.push(o::assign_var(RESULT_VAR, allow_default.and(result.clone())));
            }
            stmts.push(o::if_stmt(
                o::variable(EVENT_NAME_VAR).equals(o::literal(listener.full_name())),
                true_case,
            ));
        }
        stmts.push(o::return_stmt(result));
        self.class.add_method(ClassMethod::new(
            "handleEvent",
            vec![FnParam::new(EVENT_NAME_VAR), FnParam::new(EVENT_NAME)],
            stmts,
        ));
        Ok(())
    }

    /// `subscribe(view, _eventHandler, emit0, emit1, ...)`, one flag per output.
    fn add_subscribe_method(&mut self) {
        let mut params = vec![FnParam::new(VIEW_VAR), FnParam::new(EVENT_HANDLER_FIELD_NAME)];
        let mut stmts = vec![o::assign_prop(
            o::this_expr(),
            EVENT_HANDLER_FIELD_NAME,
            o::variable(EVENT_HANDLER_FIELD_NAME),
        )];
        for (index, (emitter_prop, event_name)) in self.dir_meta.outputs.iter().enumerate() {
            let param_name = format!("emit{}", index);
            let subscription_field = format!("subscription{}", index);
            params.push(FnParam::new(param_name.clone()));
            self.class.add_field(subscription_field.clone());
            let subscription = o::this_expr().prop(subscription_field.clone());
            stmts.push(o::if_stmt(
                o::variable(param_name),
                vec![o::assign_prop(
                    o::this_expr(),
                    subscription_field,
                    context().prop(emitter_prop.as_str()).call_method(
                        "subscribe",
                        vec![o::variable(EVENT_HANDLER_FIELD_NAME)
                            .call_method("bind", vec![o::variable(VIEW_VAR), o::literal(event_name.as_str())])],
                    ),
                )],
            ));
            self.destroy_stmts.push(
                subscription
                    .clone()
                    .and(subscription.call_method("unsubscribe", vec![]))
                    .to_stmt(),
            );
        }
        self.class.add_method(ClassMethod::new("subscribe", params, stmts));
    }

    fn build(mut self) -> Result<o::ClassStmt> {
        let dep_params: Vec<String> = (0..self.dir_meta.type_.di_deps.len())
            .map(|i| format!("p{}", i))
            .collect();
        let mut fields = vec![
            o::ClassField::new(EVENT_HANDLER_FIELD_NAME),
            o::ClassField::new(CONTEXT_FIELD_NAME),
            o::ClassField::new(CHANGED_FIELD_NAME),
        ];
        let mut ctor_stmts = vec![o::this_expr().prop(CHANGED_FIELD_NAME).set(o::literal(false))?.to_stmt()];
        if self.gen_changes {
            fields.push(o::ClassField::new(CHANGES_FIELD_NAME));
            ctor_stmts.push(reset_changes_stmt()?);
        }
        ctor_stmts.push(
            context()
                .set(
                    o::import_expr(self.dir_meta.type_.reference.clone())
                        .instantiate(dep_params.iter().map(o::variable).collect()),
                )?
                .to_stmt(),
        );
        fields.append(&mut self.class.fields);
        self.class.fields = fields;
        ctor_stmts.append(&mut self.class.ctor_stmts);

        self.class.add_method(ClassMethod::new(
            "ngOnDetach",
            vec![
                FnParam::new(VIEW_VAR),
                FnParam::new(COMPONENT_VIEW_VAR),
                FnParam::new(RENDER_EL_VAR),
            ],
            self.detach_stmts,
        ));
        self.class
            .add_method(ClassMethod::new("ngOnDestroy", vec![], self.destroy_stmts));

        Ok(self.class.build(
            directive_wrapper_class_name(self.dir_meta.reference()),
            None,
            dep_params.into_iter().map(FnParam::new).collect(),
            ctor_stmts,
        ))
    }
}

fn context() -> Expression {
    o::this_expr().prop(CONTEXT_FIELD_NAME)
}

fn reset_changes_stmt() -> Result<Statement> {
    Ok(o::this_expr()
        .prop(CHANGES_FIELD_NAME)
        .set(o::literal_map(Vec::new()))?
        .to_stmt())
}

/// Host bindings only see the directive instance and, in listeners, `$event`.
struct HostBindingScope {
    event: bool,
}

impl NameResolver for HostBindingScope {
    fn call_pipe(&mut self, name: &str, _input: Expression, _args: Vec<Expression>) -> Result<Expression> {
        Err(CompilerError::illegal_state(format!(
            "Illegal state: Pipe '{}' in host binding",
            name
        )))
    }

    fn get_local(&self, name: &str) -> Option<Expression> {
        if self.event && name == EVENT_NAME {
            Some(o::variable(EVENT_NAME))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile_metadata::{CompileTypeMetadata, DirectiveMetadataInput};
    use crate::output::js_emitter::{ImportResolver, JavaScriptEmitter};
    use crate::schema::DomElementSchemaRegistry;
    use crate::testing::MockReflector;
    use indexmap::IndexMap;

    struct Verbatim;

    impl ImportResolver for Verbatim {
        fn file_name_to_module_name(&self, imported: &str, _containing: &str) -> String {
            imported.to_string()
        }
    }

    fn compile(config: CompilerConfig, hooks: LifecycleHooks, input: DirectiveMetadataInput) -> String {
        let reflector = Rc::new(MockReflector::new());
        let mut type_ = CompileTypeMetadata::new(reflector.symbol("/app/dir.ts", "MyDir"));
        type_.lifecycle_hooks = hooks;
        let meta = CompileDirectiveMetadata::create(
            type_,
            DirectiveMetadataInput {
                selector: Some("[myDir]".to_string()),
                ..input
            },
        );
        let compiler = DirectiveWrapperCompiler::new(config, reflector, Rc::new(DomElementSchemaRegistry::new()));
        let result = compiler.compile(&meta).unwrap();
        assert_eq!(result.dir_wrapper_class_var, "Wrapper_MyDir");
        JavaScriptEmitter::new(Rc::new(Verbatim))
            .emit_statements("/app/dir.ngfactory.js", &result.statements, &[])
            .unwrap()
    }

    #[test]
    fn should_generate_input_checks_and_lifecycle_calls() {
        let source = compile(
            CompilerConfig::default(),
            LifecycleHooks::ON_CHANGES | LifecycleHooks::ON_INIT | LifecycleHooks::ON_DESTROY,
            DirectiveMetadataInput {
                inputs: vec!["value".to_string()],
                ..Default::default()
            },
        );
        assert!(source.contains("class Wrapper_MyDir {"));
        assert!(source.contains("this.context = new "));
        assert!(source.contains("check_value(currValue,throwOnChange,forceUpdate) {"));
        assert!(source.contains("if ((forceUpdate || "));
        assert!(source.contains("this.context.value = currValue;"));
        assert!(source.contains("this._changes['value'] = new "));
        assert!(source.contains("this._value = currValue;"));
        assert!(source.contains("ngDoCheck(view,el,throwOnChange) {"));
        assert!(source.contains("this.context.ngOnChanges(this._changes);"));
        assert!(source.contains("if ((view.numberOfChecks === 0)) {"));
        assert!(source.contains("return changed;"));
        assert!(source.contains("this.context.ngOnDestroy();"));
    }

    #[test]
    fn should_bind_host_properties_and_listeners() {
        let mut host = IndexMap::new();
        host.insert("[title]".to_string(), "label".to_string());
        host.insert("(click)".to_string(), "onClick($event)".to_string());
        let source = compile(
            CompilerConfig::default(),
            LifecycleHooks::empty(),
            DirectiveMetadataInput {
                host,
                ..Default::default()
            },
        );
        assert!(source.contains("checkHost(view,componentView,el,throwOnChange) {"));
        assert!(source.contains("const currVal_0 = this.context.label;"));
        assert!(source.contains(".checkRenderProperty(view,el,'title',this._expr_0,this._expr_0 = currVal_0,false,null);"));
        assert!(source.contains("handleEvent(eventName,$event) {"));
        assert!(source.contains("if ((eventName == 'click')) {"));
        assert!(source.contains("var pd_sub_0 = (this.context.onClick($event) !== false);"));
    }

    #[test]
    fn should_subscribe_to_outputs_and_unsubscribe_on_destroy() {
        let source = compile(
            CompilerConfig::default(),
            LifecycleHooks::empty(),
            DirectiveMetadataInput {
                outputs: vec!["changed: valueChange".to_string()],
                ..Default::default()
            },
        );
        assert!(source.contains("subscribe(view,_eventHandler,emit0) {"));
        assert!(source.contains(
            "this.subscription0 = this.context.changed.subscribe(_eventHandler.bind(view,'valueChange'));"
        ));
        assert!(source.contains("(this.subscription0 && this.subscription0.unsubscribe());"));
    }

    #[test]
    fn should_record_reflect_attributes_when_logging_binding_updates() {
        let config = CompilerConfig {
            log_binding_update: true,
            ..CompilerConfig::default()
        };
        let source = compile(
            config,
            LifecycleHooks::empty(),
            DirectiveMetadataInput {
                inputs: vec!["maxLength".to_string()],
                ..Default::default()
            },
        );
        assert!(source.contains(".setBindingDebugInfo(view.renderer,el,'ng-reflect-max-length',this.context.maxLength);"));
    }
}
