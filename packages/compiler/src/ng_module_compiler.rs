//! NgModule Compiler
//!
//! Compiles an NgModule into a `<Module>Injector` class holding every
//! transitively collected provider, and a `<Module>NgFactory` variable that
//! creates it.

use crate::aot::static_value::StaticValue;
use crate::compile_metadata::{
    identifier_module_url, identifier_name, CompileDiDependencyMetadata, CompileNgModuleMetadata,
    CompileProviderMetadata, TokenKey,
};
use crate::compile_reflector::CompileReflector;
use crate::compiler_util::identifier_util::{convert_value_to_output_ast, create_di_token_expression};
use crate::core::LifecycleHooks;
use crate::error::{CompilerError, Result};
use crate::identifiers::{resolve_identifier, IdentifierSpec, Identifiers};
use crate::output::class_builder::ClassBuilder;
use crate::output::output_ast::{self as o, ClassGetter, ClassMethod, Expression, FnParam, Statement};
use crate::parse_util::{ParseLocation, ParseSourceFile, ParseSourceSpan};
use crate::provider_analyzer::{BuiltinTokens, NgModuleProviderAnalyzer};
use crate::template_parser::template_ast::ProviderAst;
use crate::util::sanitize_identifier;
use crate::view_compiler::deps::ComponentFactoryDependency;
use crate::view_compiler::component_factory_name;
use indexmap::IndexMap;
use std::rc::Rc;

const PARENT_VAR: &str = "parent";
const TOKEN_VAR: &str = "token";
const NOT_FOUND_RESULT_VAR: &str = "notFoundResult";

#[derive(Debug)]
pub struct NgModuleCompileResult {
    pub statements: Vec<Statement>,
    pub ng_module_factory_var: String,
    /// Factories of the entry components, patched by the caller.
    pub dependencies: Vec<ComponentFactoryDependency>,
}

pub struct NgModuleCompiler {
    reflector: Rc<dyn CompileReflector>,
}

impl NgModuleCompiler {
    pub fn new(reflector: Rc<dyn CompileReflector>) -> Self {
        NgModuleCompiler { reflector }
    }

    /// `extra_providers` are appended after the module's own providers;
    /// the JIT compiler uses them to bind a module-specific `Compiler`.
    pub fn compile(
        &self,
        ng_module: &CompileNgModuleMetadata,
        extra_providers: &[CompileProviderMetadata],
    ) -> Result<NgModuleCompileResult> {
        let module_name = identifier_name(ng_module.reference());
        let _span = tracing::debug_span!("compile_ng_module", module = %module_name).entered();
        let module_url = identifier_module_url(ng_module.reference());
        let source_file_name = if module_url.is_empty() {
            format!("in NgModule {}", module_name)
        } else {
            format!("in NgModule {} in {}", module_name, module_url)
        };
        let location = ParseLocation::new(ParseSourceFile::new("", source_file_name), 0, 0, 0);
        let source_span = ParseSourceSpan::new(location.clone(), location);

        let mut dependencies = Vec::new();
        let mut entry_component_factories = Vec::new();
        let mut bootstrap_component_factories = Vec::new();
        for entry_component in &ng_module.transitive_module.entry_components {
            let placeholder = o::Placeholder::new(component_factory_name(entry_component));
            let factory = o::placeholder_expr(&placeholder);
            if ng_module
                .bootstrap_components
                .iter()
                .any(|comp| comp.ptr_eq(entry_component))
            {
                bootstrap_component_factories.push(factory.clone());
            }
            entry_component_factories.push(factory);
            dependencies.push(ComponentFactoryDependency {
                comp: entry_component.clone(),
                placeholder,
            });
        }

        let builtins = BuiltinTokens::resolve(self.reflector.as_ref())?;
        let providers =
            NgModuleProviderAnalyzer::new(ng_module, extra_providers, builtins.clone(), &source_span).parse()?;
        let mut builder = InjectorBuilder::new(self.reflector.as_ref(), builtins);
        for provider in &providers {
            builder.add_provider(provider)?;
        }
        let injector_class = builder.build(
            ng_module,
            entry_component_factories,
            bootstrap_component_factories,
        )?;

        let ng_module_factory_var = format!("{}NgFactory", module_name);
        let factory_stmt = self
            .import(&Identifiers::NgModuleFactory)?
            .instantiate(vec![
                o::variable(injector_class.name.clone()),
                o::import_expr(ng_module.reference().clone()),
            ])
            .to_decl_stmt(ng_module_factory_var.clone(), true);
        let mut statements = vec![Statement::DeclareClass(injector_class), factory_stmt];
        if let Some(id) = &ng_module.id {
            statements.push(
                self.import(&Identifiers::RegisterModuleFactoryFn)?
                    .call_fn(vec![o::literal(id.as_str()), o::variable(ng_module_factory_var.clone())])
                    .to_stmt(),
            );
        }
        tracing::debug!(providers = providers.len(), "compiled module injector");
        Ok(NgModuleCompileResult {
            statements,
            ng_module_factory_var,
            dependencies,
        })
    }

    fn import(&self, spec: &IdentifierSpec) -> Result<Expression> {
        Ok(o::import_expr(resolve_identifier(self.reflector.as_ref(), spec)?))
    }
}

struct InjectorBuilder<'a> {
    reflector: &'a dyn CompileReflector,
    builtins: BuiltinTokens,
    class: ClassBuilder,
    tokens: Vec<(Expression, TokenKey)>,
    instances: IndexMap<TokenKey, Expression>,
    create_stmts: Vec<Statement>,
    destroy_stmts: Vec<Statement>,
}

impl<'a> InjectorBuilder<'a> {
    fn new(reflector: &'a dyn CompileReflector, builtins: BuiltinTokens) -> Self {
        InjectorBuilder {
            reflector,
            builtins,
            class: ClassBuilder::new(),
            tokens: Vec::new(),
            instances: IndexMap::new(),
            create_stmts: Vec::new(),
            destroy_stmts: Vec::new(),
        }
    }

    fn add_provider(&mut self, resolved: &ProviderAst) -> Result<()> {
        let values = resolved
            .providers
            .iter()
            .map(|provider| self.provider_value(provider))
            .collect::<Vec<_>>();
        let prop_name = format!(
            "_{}_{}",
            sanitize_identifier(&resolved.token.token_name()),
            self.instances.len()
        );
        let value = if resolved.multi_provider {
            o::literal_arr(values)
        } else {
            values.into_iter().next().ok_or_else(|| {
                CompilerError::illegal_state(format!(
                    "Illegal state: no provider definition for {}",
                    resolved.token.token_name()
                ))
            })?
        };
        let instance = self.create_provider_property(prop_name, value, resolved.eager)?;
        if resolved.lifecycle_hooks.contains(LifecycleHooks::ON_DESTROY) {
            self.destroy_stmts
                .push(instance.clone().call_method("ngOnDestroy", vec![]).to_stmt());
        }
        let key = resolved.token.key();
        self.tokens
            .push((create_di_token_expression(&resolved.token), key.clone()));
        self.instances.insert(key, instance);
        Ok(())
    }

    fn create_provider_property(&mut self, prop_name: String, value: Expression, eager: bool) -> Result<Expression> {
        let property = o::this_expr().prop(prop_name.clone());
        if eager {
            self.class.add_field(prop_name);
            self.create_stmts.push(property.clone().set(value)?.to_stmt());
        } else {
            let internal_field = format!("_{}", prop_name);
            let storage = o::this_expr().prop(internal_field.clone());
            self.class.add_field(internal_field);
            // `==` also catches `undefined`
            self.class.getters.push(ClassGetter {
                name: prop_name,
                body: vec![
                    o::if_stmt(
                        storage.clone().is_blank(),
                        vec![storage.clone().set(value)?.to_stmt()],
                    ),
                    o::return_stmt(storage),
                ],
            });
        }
        Ok(property)
    }

    fn provider_value(&self, provider: &CompileProviderMetadata) -> Expression {
        if let Some(existing) = &provider.use_existing {
            return self.dependency(&CompileDiDependencyMetadata {
                token: Some(existing.clone()),
                ..Default::default()
            });
        }
        if let Some(factory) = &provider.use_factory {
            let deps = provider.deps.as_ref().unwrap_or(&factory.di_deps);
            return o::import_expr(factory.reference.clone())
                .call_fn(deps.iter().map(|dep| self.dependency(dep)).collect());
        }
        if let Some(class) = &provider.use_class {
            let deps = provider.deps.as_ref().unwrap_or(&class.di_deps);
            return o::import_expr(class.reference.clone())
                .instantiate(deps.iter().map(|dep| self.dependency(dep)).collect());
        }
        convert_value_to_output_ast(provider.use_value.as_ref().unwrap_or(&StaticValue::Null))
    }

    fn dependency(&self, dep: &CompileDiDependencyMetadata) -> Expression {
        if dep.is_value {
            return convert_value_to_output_ast(dep.value.as_ref().unwrap_or(&StaticValue::Null));
        }
        let token = match &dep.token {
            Some(token) => token,
            None => return o::null_expr(),
        };
        if !dep.is_skip_self {
            let key = token.key();
            if key == self.builtins.injector || key == self.builtins.component_factory_resolver {
                return o::this_expr();
            }
            if let Some(instance) = self.instances.get(&key) {
                return instance.clone();
            }
        }
        let mut args = vec![create_di_token_expression(token)];
        if dep.is_optional {
            args.push(o::null_expr());
        }
        o::this_expr().prop(PARENT_VAR).call_method("get", args)
    }

    fn build(
        mut self,
        ng_module: &CompileNgModuleMetadata,
        entry_component_factories: Vec<Expression>,
        bootstrap_component_factories: Vec<Expression>,
    ) -> Result<o::ClassStmt> {
        let module_key = TokenKey::Symbol(ng_module.reference().clone());
        let module_instance = self.instances.get(&module_key).cloned().ok_or_else(|| {
            CompilerError::illegal_state(format!(
                "Illegal state: no provider for the module {}",
                identifier_name(ng_module.reference())
            ))
        })?;

        let token = o::variable(TOKEN_VAR);
        let mut get_stmts: Vec<Statement> = self
            .tokens
            .iter()
            .filter_map(|(token_expr, key)| {
                self.instances.get(key).map(|instance| {
                    o::if_stmt(
                        token.clone().identical(token_expr.clone()),
                        vec![o::return_stmt(instance.clone())],
                    )
                })
            })
            .collect();
        get_stmts.push(o::return_stmt(o::variable(NOT_FOUND_RESULT_VAR)));

        let mut create_stmts = std::mem::take(&mut self.create_stmts);
        create_stmts.push(o::return_stmt(module_instance));
        self.class
            .add_method(ClassMethod::new("createInternal", vec![], create_stmts));
        self.class.add_method(ClassMethod::new(
            "getInternal",
            vec![FnParam::new(TOKEN_VAR), FnParam::new(NOT_FOUND_RESULT_VAR)],
            get_stmts,
        ));
        self.class.add_method(ClassMethod::new(
            "destroyInternal",
            vec![],
            std::mem::take(&mut self.destroy_stmts),
        ));

        let parent = o::import_expr(resolve_identifier(self.reflector, &Identifiers::NgModuleInjector)?);
        let super_call = o::super_expr()
            .call_fn(vec![
                o::variable(PARENT_VAR),
                o::literal_arr(entry_component_factories),
                o::literal_arr(bootstrap_component_factories),
            ])
            .to_stmt();
        Ok(self.class.build(
            format!("{}Injector", identifier_name(ng_module.reference())),
            Some(parent),
            vec![FnParam::new(PARENT_VAR)],
            vec![super_call],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile_metadata::{CompileTokenMetadata, CompileTypeMetadata, TransitiveCompileNgModuleMetadata};
    use crate::output::js_emitter::{ImportResolver, JavaScriptEmitter};
    use crate::output::output_ast::ResolvedReference;
    use crate::testing::MockReflector;

    struct Verbatim;

    impl ImportResolver for Verbatim {
        fn file_name_to_module_name(&self, imported: &str, _containing: &str) -> String {
            imported.to_string()
        }
    }

    fn module(reflector: &MockReflector, providers: Vec<CompileProviderMetadata>) -> CompileNgModuleMetadata {
        let type_ = CompileTypeMetadata::new(reflector.symbol("/app/app.module.ts", "AppModule"));
        let comp = reflector.symbol("/app/app.component.ts", "AppComp");
        let mut transitive = TransitiveCompileNgModuleMetadata::new();
        transitive.add_module(type_.clone());
        transitive.add_entry_component(comp.clone());
        for provider in &providers {
            transitive.add_provider(provider.clone(), &type_.reference);
        }
        CompileNgModuleMetadata {
            type_,
            declared_directives: vec![comp.clone()],
            exported_directives: vec![],
            declared_pipes: vec![],
            exported_pipes: vec![],
            entry_components: vec![comp.clone()],
            bootstrap_components: vec![comp],
            providers,
            imported_modules: vec![],
            exported_modules: vec![],
            schemas: vec![],
            id: None,
            transitive_module: transitive,
        }
    }

    fn emit(result: &NgModuleCompileResult) -> String {
        JavaScriptEmitter::new(Rc::new(Verbatim))
            .emit_statements(
                "/app/app.module.ngfactory.js",
                &result.statements,
                &[result.ng_module_factory_var.clone()],
            )
            .unwrap()
    }

    #[test]
    fn should_generate_injector_and_factory() {
        let reflector = Rc::new(MockReflector::new());
        let service = CompileTypeMetadata::new(reflector.symbol("/app/service.ts", "Service"));
        let mut ng_module = module(&reflector, vec![CompileProviderMetadata::for_type(service)]);
        ng_module.id = Some("app".to_string());
        let result = NgModuleCompiler::new(reflector.clone()).compile(&ng_module, &[]).unwrap();
        assert_eq!(result.ng_module_factory_var, "AppModuleNgFactory");
        assert_eq!(result.dependencies.len(), 1);
        let factory = reflector.symbol("/app/app.component.ngfactory.js", "AppCompNgFactory");
        result.dependencies[0]
            .placeholder
            .resolve(ResolvedReference::Symbol(factory))
            .unwrap();

        let source = emit(&result);
        assert!(source.contains("class AppModuleInjector extends "));
        assert!(source.contains("constructor(parent) {"));
        assert!(source.contains(".AppCompNgFactory],["));
        assert!(source.contains("this._AppModule_0 = new "));
        assert!(source.contains("get _Service_1() {"));
        assert!(source.contains("if ((this.__Service_1 == null)) {"));
        assert!(source.contains("return this._AppModule_0;"));
        assert!(source.contains("getInternal(token,notFoundResult) {"));
        assert!(source.contains("return notFoundResult;"));
        assert!(source.contains("const AppModuleNgFactory = new "));
        assert!(source.contains(".registerModuleFactory('app',AppModuleNgFactory);"));
    }

    #[test]
    fn should_resolve_injector_dependencies_from_the_module_first() {
        let reflector = Rc::new(MockReflector::new());
        let injector = reflector.symbol("@angular/core/src/di/injector", "Injector");
        let config = reflector.symbol("/app/config.ts", "CONFIG");
        let mut service = CompileTypeMetadata::new(reflector.symbol("/app/service.ts", "Service"));
        service.di_deps = vec![
            CompileDiDependencyMetadata {
                token: Some(CompileTokenMetadata::from_symbol(injector)),
                ..Default::default()
            },
            CompileDiDependencyMetadata {
                token: Some(CompileTokenMetadata::from_symbol(config.clone())),
                is_optional: true,
                ..Default::default()
            },
        ];
        let ng_module = module(&reflector, vec![CompileProviderMetadata::for_type(service)]);
        let result = NgModuleCompiler::new(reflector.clone()).compile(&ng_module, &[]).unwrap();
        for dep in &result.dependencies {
            dep.placeholder
                .resolve(ResolvedReference::Symbol(reflector.symbol("/app/f.ts", "F")))
                .unwrap();
        }
        let source = emit(&result);
        assert!(source.contains(".Service(this,this.parent.get("));
        assert!(source.contains(".CONFIG,null))"));
    }
}
