//! Static Reflector
//!
//! Reads the per-file metadata produced by the metadata collector and answers
//! reflection questions (decorators, constructor parameters, lifecycle hooks)
//! without loading the program. Decorator arguments are evaluated
//! symbolically by `simplify`.

use super::static_symbol::{StaticSymbol, StaticSymbolCache};
use super::static_value::*;
use crate::compile_reflector::CompileReflector;
use crate::core::LifecycleHooks;
use crate::error::{CompilerError, ErrorCollector, Result};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

pub const SUPPORTED_SCHEMA_VERSION: u64 = 2;

pub const CORE_DECORATORS: &str = "@angular/core/src/metadata";
pub const DI_DECORATORS: &str = "@angular/core/src/di/metadata";
pub const DI_OPAQUE_TOKEN: &str = "@angular/core/src/di/opaque_token";
pub const ANIMATION_METADATA: &str = "@angular/core/src/animation/metadata";

static HIDDEN_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\$.*\$$").unwrap());

/// Host services the reflector needs: metadata loading and module resolution.
pub trait StaticReflectorHost {
    /// All metadata records stored for `file_path` (one per schema version).
    fn get_metadata_for(&self, file_path: &str) -> Option<Vec<Value>>;

    /// Resolves an import specifier to a file path, or `None` when it can't.
    fn module_name_to_file_name(&self, module_name: &str, containing_file: Option<&str>)
        -> Option<String>;
}

pub type ConversionFn = Rc<dyn Fn(&StaticSymbol, &[StaticValue]) -> StaticValue>;

pub fn conversion(f: impl Fn(&StaticSymbol, &[StaticValue]) -> StaticValue + 'static) -> ConversionFn {
    Rc::new(f)
}

pub struct StaticReflector {
    host: Rc<dyn StaticReflectorHost>,
    symbol_cache: Rc<StaticSymbolCache>,
    error_collector: Option<Rc<dyn ErrorCollector>>,
    declaration_cache: RefCell<HashMap<String, Option<StaticSymbol>>>,
    annotation_cache: RefCell<HashMap<StaticSymbol, Vec<Rc<Annotation>>>>,
    property_cache: RefCell<HashMap<StaticSymbol, IndexMap<String, Vec<Rc<Annotation>>>>>,
    parameter_cache: RefCell<HashMap<StaticSymbol, Vec<Vec<StaticValue>>>>,
    method_cache: RefCell<HashMap<StaticSymbol, HashMap<String, bool>>>,
    metadata_cache: RefCell<HashMap<String, Rc<Value>>>,
    conversion_map: RefCell<HashMap<StaticSymbol, ConversionFn>>,
    opaque_token: StaticSymbol,
}

impl StaticReflector {
    pub fn new(
        host: Rc<dyn StaticReflectorHost>,
        symbol_cache: Rc<StaticSymbolCache>,
        error_collector: Option<Rc<dyn ErrorCollector>>,
    ) -> Result<Self> {
        let placeholder = symbol_cache.get(DI_OPAQUE_TOKEN, "OpaqueToken", &[]);
        let mut reflector = StaticReflector {
            host,
            symbol_cache,
            error_collector,
            declaration_cache: RefCell::new(HashMap::new()),
            annotation_cache: RefCell::new(HashMap::new()),
            property_cache: RefCell::new(HashMap::new()),
            parameter_cache: RefCell::new(HashMap::new()),
            method_cache: RefCell::new(HashMap::new()),
            metadata_cache: RefCell::new(HashMap::new()),
            conversion_map: RefCell::new(HashMap::new()),
            opaque_token: placeholder,
        };
        reflector.opaque_token = reflector.find_declaration(DI_OPAQUE_TOKEN, "OpaqueToken", None)?;
        reflector.initialize_conversion_map()?;
        Ok(reflector)
    }

    pub fn symbol_cache(&self) -> &Rc<StaticSymbolCache> {
        &self.symbol_cache
    }

    pub fn get_static_symbol(&self, declaration_file: &str, name: &str, members: &[&str]) -> StaticSymbol {
        self.symbol_cache.get(declaration_file, name, members)
    }

    fn initialize_conversion_map(&self) -> Result<()> {
        use MetadataKind as K;
        let object_decorators = [
            (DI_DECORATORS, "Injectable", K::Injectable),
            (CORE_DECORATORS, "Pipe", K::Pipe),
            (CORE_DECORATORS, "Directive", K::Directive),
            (CORE_DECORATORS, "Component", K::Component),
            (CORE_DECORATORS, "NgModule", K::NgModule),
        ];
        for (module, name, kind) in object_decorators {
            let symbol = self.find_declaration(module, name, None)?;
            self.register(symbol, conversion(move |_, args| object_decorator(kind, args)));
        }

        for (name, kind) in [
            ("Host", K::Host),
            ("Self", K::Self_),
            ("SkipSelf", K::SkipSelf),
            ("Optional", K::Optional),
        ] {
            let symbol = self.find_declaration(DI_DECORATORS, name, None)?;
            self.register(symbol, conversion(move |_, args| marker_decorator(kind, args)));
        }

        let single_arg = [
            (DI_DECORATORS, "Inject", K::Inject, "token"),
            (CORE_DECORATORS, "Attribute", K::Attribute, "attributeName"),
            (CORE_DECORATORS, "Input", K::Input, "bindingPropertyName"),
            (CORE_DECORATORS, "Output", K::Output, "bindingPropertyName"),
            (CORE_DECORATORS, "HostBinding", K::HostBinding, "hostPropertyName"),
        ];
        for (module, name, kind, field) in single_arg {
            let symbol = self.find_declaration(module, name, None)?;
            self.register(
                symbol,
                conversion(move |_, args| single_arg_decorator(kind, field, args)),
            );
        }

        let host_listener_symbol = self.find_declaration(CORE_DECORATORS, "HostListener", None)?;
        self.register(host_listener_symbol, conversion(|_, args| host_listener(args)));

        for (name, kind) in [
            ("ContentChild", K::ContentChild),
            ("ContentChildren", K::ContentChildren),
            ("ViewChild", K::ViewChild),
            ("ViewChildren", K::ViewChildren),
        ] {
            let symbol = self.find_declaration(CORE_DECORATORS, name, None)?;
            self.register(symbol, conversion(move |_, args| query_decorator(kind, args)));
        }

        let animation_fns: [(&str, ConversionFn); 8] = [
            ("trigger", conversion(|_, args| animation_trigger(args))),
            ("state", conversion(|_, args| animation_state(args))),
            ("transition", conversion(|_, args| animation_transition(args))),
            ("style", conversion(|_, args| animation_style(args))),
            ("animate", conversion(|_, args| animation_animate(args))),
            (
                "keyframes",
                conversion(|_, args| animation_steps(K::AnimationKeyframes, args)),
            ),
            (
                "sequence",
                conversion(|_, args| animation_steps(K::AnimationSequence, args)),
            ),
            ("group", conversion(|_, args| animation_steps(K::AnimationGroup, args))),
        ];
        for (name, conversion) in animation_fns {
            let symbol = self.find_declaration(ANIMATION_METADATA, name, None)?;
            self.register(symbol, conversion);
        }
        Ok(())
    }

    fn register(&self, symbol: StaticSymbol, conversion: ConversionFn) {
        self.conversion_map.borrow_mut().insert(symbol, conversion);
    }

    /// Registers an additional decorator evaluated like the built-in class decorators.
    pub fn register_decorator_or_constructor(&self, symbol: StaticSymbol, kind: MetadataKind) {
        self.register(symbol, conversion(move |_, args| object_decorator(kind, args)));
    }

    pub fn register_function(&self, symbol: StaticSymbol, function: ConversionFn) {
        self.register(symbol, function);
    }

    fn report_error(&self, error: CompilerError, context: Option<&StaticSymbol>, path: Option<&str>) -> Result<()> {
        match &self.error_collector {
            Some(collector) => {
                let location = context.map(|c| c.file_path()).or(path);
                collector.collect(error, location);
                Ok(())
            }
            None => Err(error),
        }
    }

    pub fn find_declaration(
        &self,
        module: &str,
        symbol_name: &str,
        containing_file: Option<&str>,
    ) -> Result<StaticSymbol> {
        match self.host.module_name_to_file_name(module, containing_file) {
            // A declared module with no backing file: use the module name itself.
            None => Ok(self.get_static_symbol(module, symbol_name, &[])),
            Some(file_path) => Ok(self
                .resolve_exported_symbol(&file_path, symbol_name)?
                .unwrap_or_else(|| self.get_static_symbol(&file_path, symbol_name, &[]))),
        }
    }

    fn resolve_module(&self, module_name: &str, file_path: &str) -> Result<Option<String>> {
        let resolved = self.host.module_name_to_file_name(module_name, Some(file_path));
        if resolved.is_none() {
            self.report_error(
                CompilerError::syntax(format!(
                    "Could not resolve module '{}' relative to file {}",
                    module_name, file_path
                )),
                None,
                Some(file_path),
            )?;
        }
        Ok(resolved)
    }

    /// Follows `export {a as b} from` and `export * from` chains to the
    /// declaring file of `symbol_name`.
    pub fn resolve_exported_symbol(&self, file_path: &str, symbol_name: &str) -> Result<Option<StaticSymbol>> {
        let cache_key = format!("{}|{}", file_path, symbol_name);
        if let Some(cached) = self.declaration_cache.borrow().get(&cache_key) {
            return Ok(cached.clone());
        }
        // Placeholder breaks `export *` cycles.
        self.declaration_cache.borrow_mut().insert(cache_key.clone(), None);

        let metadata = self.get_module_metadata(file_path)?;
        let mut static_symbol = None;
        if metadata["metadata"].get(symbol_name).is_some() {
            static_symbol = Some(self.get_static_symbol(file_path, symbol_name, &[]));
        }

        let exports = metadata["exports"].as_array().cloned().unwrap_or_default();
        if static_symbol.is_none() {
            for module_export in &exports {
                let Some(names) = module_export["export"].as_array() else {
                    continue;
                };
                let found = names.iter().find_map(|entry| match entry {
                    Value::String(name) if name == symbol_name => Some(name.clone()),
                    Value::Object(spec) if spec.get("as").and_then(Value::as_str) == Some(symbol_name) => {
                        spec.get("name").and_then(Value::as_str).map(str::to_string)
                    }
                    _ => None,
                });
                if let Some(original_name) = found {
                    let from = module_export["from"].as_str().unwrap_or_default();
                    if let Some(resolved) = self.resolve_module(from, file_path)? {
                        static_symbol = self.resolve_exported_symbol(&resolved, &original_name)?;
                        break;
                    }
                }
            }
        }
        if static_symbol.is_none() {
            for module_export in &exports {
                if module_export.get("export").is_some() {
                    continue;
                }
                let from = module_export["from"].as_str().unwrap_or_default();
                if let Some(resolved) = self.resolve_module(from, file_path)? {
                    if let Some(candidate) = self.resolve_exported_symbol(&resolved, symbol_name)? {
                        static_symbol = Some(candidate);
                        break;
                    }
                }
            }
        }

        self.declaration_cache
            .borrow_mut()
            .insert(cache_key, static_symbol.clone());
        Ok(static_symbol)
    }

    /// Metadata for `module`, choosing the highest schema version the host has.
    pub fn get_module_metadata(&self, module: &str) -> Result<Rc<Value>> {
        if let Some(cached) = self.metadata_cache.borrow().get(module) {
            return Ok(cached.clone());
        }
        let mut module_metadata: Option<Value> = None;
        if let Some(candidates) = self.host.get_metadata_for(module) {
            let mut max_version = -1i64;
            for candidate in candidates {
                let version = candidate["version"].as_i64().unwrap_or(0);
                if version > max_version {
                    max_version = version;
                    module_metadata = Some(candidate);
                }
            }
        }
        let module_metadata = module_metadata.unwrap_or_else(|| {
            json!({
                "__symbolic": "module",
                "version": SUPPORTED_SCHEMA_VERSION,
                "module": module,
                "metadata": {}
            })
        });
        let module_metadata = Rc::new(module_metadata);
        // Cache before reporting so a collecting reflector keeps the best-effort record.
        self.metadata_cache
            .borrow_mut()
            .insert(module.to_string(), module_metadata.clone());
        let version = module_metadata["version"].as_u64();
        if version != Some(SUPPORTED_SCHEMA_VERSION) {
            tracing::warn!(module, ?version, "metadata version mismatch");
            self.report_error(
                CompilerError::syntax(format!(
                    "Metadata version mismatch for module {}, found version {}, expected {}",
                    module,
                    module_metadata["version"],
                    SUPPORTED_SCHEMA_VERSION
                )),
                None,
                None,
            )?;
        }
        Ok(module_metadata)
    }

    fn get_type_metadata(&self, ty: &StaticSymbol) -> Result<Value> {
        let module_metadata = self.get_module_metadata(ty.file_path())?;
        Ok(module_metadata["metadata"]
            .get(ty.name())
            .cloned()
            .unwrap_or_else(|| json!({"__symbolic": "class"})))
    }

    fn parent_of(&self, ty: &StaticSymbol, class_metadata: &Value) -> Result<Option<StaticSymbol>> {
        match class_metadata.get("extends") {
            Some(extends) => Ok(self.simplify(ty, extends)?.as_symbol().cloned()),
            None => Ok(None),
        }
    }

    /// Class decorators of `ty` including those of its base classes.
    pub fn annotations(&self, ty: &StaticSymbol) -> Result<Vec<Rc<Annotation>>> {
        if let Some(cached) = self.annotation_cache.borrow().get(ty) {
            return Ok(cached.clone());
        }
        let class_metadata = self.get_type_metadata(ty)?;
        let mut annotations = Vec::new();
        if let Some(parent) = self.parent_of(ty, &class_metadata)? {
            annotations.extend(self.annotations(&parent)?);
        }
        if let Some(decorators) = class_metadata.get("decorators") {
            if let StaticValue::Array(own) = self.simplify(ty, decorators)? {
                annotations.extend(own.iter().filter_map(|v| v.as_annotation().cloned()));
            }
        }
        self.annotation_cache
            .borrow_mut()
            .insert(ty.clone(), annotations.clone());
        Ok(annotations)
    }

    pub fn prop_metadata(&self, ty: &StaticSymbol) -> Result<IndexMap<String, Vec<Rc<Annotation>>>> {
        if let Some(cached) = self.property_cache.borrow().get(ty) {
            return Ok(cached.clone());
        }
        let class_metadata = self.get_type_metadata(ty)?;
        let mut prop_metadata = IndexMap::new();
        if let Some(parent) = self.parent_of(ty, &class_metadata)? {
            prop_metadata.extend(self.prop_metadata(&parent)?);
        }
        if let Some(members) = class_metadata["members"].as_object() {
            for (prop_name, prop_data) in members {
                let prop = prop_data.as_array().and_then(|entries| {
                    entries.iter().find(|entry| {
                        matches!(entry["__symbolic"].as_str(), Some("property") | Some("method"))
                    })
                });
                let decorators: &mut Vec<Rc<Annotation>> =
                    prop_metadata.entry(prop_name.clone()).or_default();
                if let Some(prop_decorators) = prop.and_then(|p| p.get("decorators")) {
                    if let StaticValue::Array(values) = self.simplify(ty, prop_decorators)? {
                        decorators.extend(values.iter().filter_map(|v| v.as_annotation().cloned()));
                    }
                }
            }
        }
        self.property_cache
            .borrow_mut()
            .insert(ty.clone(), prop_metadata.clone());
        Ok(prop_metadata)
    }

    pub fn parameters(&self, ty: &StaticSymbol) -> Result<Vec<Vec<StaticValue>>> {
        if let Some(cached) = self.parameter_cache.borrow().get(ty) {
            return Ok(cached.clone());
        }
        let class_metadata = self.get_type_metadata(ty)?;
        let ctor = class_metadata["members"]["__ctor__"]
            .as_array()
            .and_then(|entries| entries.iter().find(|e| e["__symbolic"] == "constructor"));
        let parameters = match ctor {
            Some(ctor) => {
                let empty = Value::Array(Vec::new());
                let parameter_types = self.simplify(ty, ctor.get("parameters").unwrap_or(&empty))?;
                let parameter_decorators =
                    self.simplify(ty, ctor.get("parameterDecorators").unwrap_or(&empty))?;
                let types = parameter_types.as_array().unwrap_or(&[]);
                types
                    .iter()
                    .enumerate()
                    .map(|(index, param_type)| {
                        let mut nested = Vec::new();
                        if param_type.is_truthy() {
                            nested.push(param_type.clone());
                        }
                        if let Some(StaticValue::Array(decorators)) =
                            parameter_decorators.as_array().and_then(|d| d.get(index))
                        {
                            nested.extend(decorators.iter().cloned());
                        }
                        nested
                    })
                    .collect()
            }
            None => match self.parent_of(ty, &class_metadata)? {
                Some(parent) => self.parameters(&parent)?,
                None => Vec::new(),
            },
        };
        self.parameter_cache
            .borrow_mut()
            .insert(ty.clone(), parameters.clone());
        Ok(parameters)
    }

    fn method_names(&self, ty: &StaticSymbol) -> Result<HashMap<String, bool>> {
        if let Some(cached) = self.method_cache.borrow().get(ty) {
            return Ok(cached.clone());
        }
        let class_metadata = self.get_type_metadata(ty)?;
        let mut method_names = HashMap::new();
        if let Some(parent) = self.parent_of(ty, &class_metadata)? {
            method_names.extend(self.method_names(&parent)?);
        }
        if let Some(members) = class_metadata["members"].as_object() {
            for (prop_name, prop_data) in members {
                let is_method = prop_data
                    .as_array()
                    .map(|entries| entries.iter().any(|e| e["__symbolic"] == "method"))
                    .unwrap_or(false);
                let entry = method_names.entry(prop_name.clone()).or_insert(false);
                *entry = *entry || is_method;
            }
        }
        self.method_cache
            .borrow_mut()
            .insert(ty.clone(), method_names.clone());
        Ok(method_names)
    }

    pub fn has_lifecycle_hook(&self, ty: &StaticSymbol, method_name: &str) -> Result<bool> {
        Ok(self
            .method_names(ty)?
            .get(method_name)
            .copied()
            .unwrap_or(false))
    }

    /// Evaluates a metadata expression in the context of `context`.
    ///
    /// With an error collector, failures are recorded against the context's
    /// file and the expression evaluates to `Undefined`.
    pub fn simplify(&self, context: &StaticSymbol, value: &Value) -> Result<StaticValue> {
        let mut evaluator = Evaluator {
            reflector: self,
            scope: None,
            calling: HashSet::new(),
        };
        let result = match evaluator.simplify_in_context(context, value, 0) {
            Ok(result) => result,
            Err(error) => {
                self.report_error(error, Some(context), None)?;
                StaticValue::Undefined
            }
        };
        Ok(if result.is_ignore() {
            StaticValue::Undefined
        } else {
            result
        })
    }
}

impl CompileReflector for StaticReflector {
    fn annotations(&self, ty: &StaticSymbol) -> Result<Vec<Rc<Annotation>>> {
        StaticReflector::annotations(self, ty)
    }

    fn prop_metadata(&self, ty: &StaticSymbol) -> Result<IndexMap<String, Vec<Rc<Annotation>>>> {
        StaticReflector::prop_metadata(self, ty)
    }

    fn parameters(&self, ty: &StaticSymbol) -> Result<Vec<Vec<StaticValue>>> {
        StaticReflector::parameters(self, ty)
    }

    fn has_lifecycle_hook(&self, ty: &StaticSymbol, hook: LifecycleHooks) -> Result<bool> {
        StaticReflector::has_lifecycle_hook(self, ty, hook.method_name())
    }

    fn resolve_identifier(&self, name: &str, module_url: &str) -> Result<StaticSymbol> {
        self.find_declaration(module_url, name, None)
    }

    fn resolve_enum(&self, enum_symbol: &StaticSymbol, name: &str) -> StaticSymbol {
        self.get_static_symbol(enum_symbol.file_path(), enum_symbol.name(), &[name])
    }

    fn import_uri(&self, ty: &StaticSymbol) -> Result<Option<String>> {
        let symbol = self.find_declaration(ty.file_path(), ty.name(), None)?;
        Ok(Some(symbol.file_path().to_string()))
    }
}

type Scope = Option<Rc<HashMap<String, StaticValue>>>;

/// State for one `simplify` call: the active parameter scope and the set of
/// functions currently being inlined.
struct Evaluator<'r> {
    reflector: &'r StaticReflector,
    scope: Scope,
    calling: HashSet<StaticSymbol>,
}

fn error_node(message: &str, context: Option<Value>) -> Value {
    let mut node = Map::new();
    node.insert("__symbolic".to_string(), json!("error"));
    node.insert("message".to_string(), json!(message));
    if let Some(context) = context {
        node.insert("context".to_string(), context);
    }
    Value::Object(node)
}

fn resolution_error(message: String, position: Option<(u32, u32)>, file: Option<String>) -> CompilerError {
    CompilerError::StaticResolution {
        message,
        position,
        context: file,
    }
}

impl<'r> Evaluator<'r> {
    fn simplify_in_context(&mut self, context: &StaticSymbol, value: &Value, depth: usize) -> Result<StaticValue> {
        self.simplify(context, value, depth).map_err(|error| {
            let (message, position, file) = match error {
                CompilerError::StaticResolution {
                    message,
                    position,
                    context,
                } => (message, position, context),
                other => (other.to_string(), None, None),
            };
            resolution_error(
                format!(
                    "{}, resolving symbol {} in {}",
                    message,
                    context.name(),
                    context.file_path()
                ),
                position,
                file,
            )
        })
    }

    fn resolve_reference(&self, context: &StaticSymbol, expression: &Value) -> Result<StaticSymbol> {
        let name = expression["name"].as_str().unwrap_or_default();
        match expression["module"].as_str() {
            Some(module) => self
                .reflector
                .find_declaration(module, name, Some(context.file_path())),
            None => Ok(self.reflector.get_static_symbol(context.file_path(), name, &[])),
        }
    }

    fn resolve_reference_value(&self, symbol: &StaticSymbol) -> Result<Option<Value>> {
        let module_metadata = self.reflector.get_module_metadata(symbol.file_path())?;
        Ok(module_metadata["metadata"].get(symbol.name()).cloned())
    }

    fn is_opaque_token(&self, context: &StaticSymbol, value: &Value) -> Result<bool> {
        if value["__symbolic"] == "new" {
            let target = &value["expression"];
            if target["__symbolic"] == "reference" {
                let resolved = self.resolve_reference(context, target)?;
                return Ok(resolved == self.reflector.opaque_token);
            }
        }
        Ok(false)
    }

    fn simplify(&mut self, context: &StaticSymbol, expression: &Value, depth: usize) -> Result<StaticValue> {
        match expression {
            Value::Null => Ok(StaticValue::Null),
            Value::Bool(b) => Ok(StaticValue::Bool(*b)),
            Value::Number(n) => Ok(StaticValue::Number(n.as_f64().unwrap_or(f64::NAN))),
            Value::String(s) => Ok(StaticValue::String(s.clone())),
            Value::Array(items) => {
                let mut result = Vec::with_capacity(items.len());
                for item in items {
                    if item["__symbolic"] == "spread" {
                        if let StaticValue::Array(spread) =
                            self.simplify(context, &item["expression"], depth)?
                        {
                            result.extend(spread);
                            continue;
                        }
                    }
                    let value = self.simplify(context, item, depth)?;
                    if !value.is_ignore() {
                        result.push(value);
                    }
                }
                Ok(StaticValue::Array(result))
            }
            Value::Object(map) => match map.get("__symbolic").and_then(Value::as_str) {
                Some(symbolic) => self.simplify_symbolic(context, symbolic, expression, depth),
                None => {
                    let mut result = IndexMap::new();
                    for (key, value) in map {
                        let value = self.simplify(context, value, depth)?;
                        if !value.is_ignore() && !HIDDEN_KEY.is_match(key) {
                            result.insert(key.clone(), value);
                        }
                    }
                    Ok(StaticValue::Object(result))
                }
            },
        }
    }

    fn simplify_symbolic(
        &mut self,
        context: &StaticSymbol,
        symbolic: &str,
        expression: &Value,
        depth: usize,
    ) -> Result<StaticValue> {
        match symbolic {
            "binop" => {
                let left = self.simplify(context, &expression["left"], depth)?;
                if left.is_ignore() {
                    return Ok(left);
                }
                let right = self.simplify(context, &expression["right"], depth)?;
                if right.is_ignore() {
                    return Ok(right);
                }
                let operator = expression["operator"].as_str().unwrap_or_default();
                Ok(StaticValue::binary(operator, left, right))
            }
            "if" => {
                let condition = self.simplify(context, &expression["condition"], depth)?;
                if condition.is_truthy() {
                    self.simplify(context, &expression["thenExpression"], depth)
                } else {
                    self.simplify(context, &expression["elseExpression"], depth)
                }
            }
            "pre" => {
                let operand = self.simplify(context, &expression["operand"], depth)?;
                if operand.is_ignore() {
                    return Ok(operand);
                }
                let operator = expression["operator"].as_str().unwrap_or_default();
                Ok(StaticValue::unary(operator, operand))
            }
            "index" => {
                let target = self.simplify(context, &expression["expression"], depth)?;
                let index = self.simplify(context, &expression["index"], depth)?;
                if target.is_truthy() && index.is_primitive() {
                    Ok(target.get(&index))
                } else {
                    Ok(StaticValue::Null)
                }
            }
            "select" => self.simplify_select(context, expression, depth),
            "reference" => {
                if expression.get("module").is_none() {
                    let name = expression["name"].as_str().unwrap_or_default();
                    if let Some(local) = self.scope.as_ref().and_then(|scope| scope.get(name)) {
                        return Ok(local.clone());
                    }
                }
                let symbol = self.resolve_reference(context, expression)?;
                match self.resolve_reference_value(&symbol)? {
                    Some(declaration) => {
                        if self.is_opaque_token(&symbol, &declaration)? {
                            // Tokens stay comparable by identity.
                            return Ok(StaticValue::Symbol(symbol));
                        }
                        self.simplify_in_context(&symbol, &declaration, depth + 1)
                    }
                    None => Ok(StaticValue::Symbol(symbol)),
                }
            }
            "class" | "function" => Ok(StaticValue::Symbol(context.clone())),
            "new" | "call" => {
                let target = &expression["expression"];
                let name = target["name"].as_str().unwrap_or_default();
                let symbol = match target["module"].as_str() {
                    Some(module) => {
                        self.reflector
                            .find_declaration(module, name, Some(context.file_path()))?
                    }
                    None => self.reflector.get_static_symbol(context.file_path(), name, &[]),
                };
                let converter = self.reflector.conversion_map.borrow().get(&symbol).cloned();
                if let Some(converter) = converter {
                    let mut args = Vec::new();
                    for arg in expression["arguments"].as_array().into_iter().flatten() {
                        args.push(self.simplify_in_context(context, arg, depth + 1)?);
                    }
                    return Ok(converter(context, &args));
                }
                self.simplify_call(context, expression, depth)
            }
            "error" => {
                let mut message = produce_error_message(expression);
                match (expression["line"].as_u64(), expression["character"].as_u64()) {
                    (Some(line), character) if line > 0 => {
                        let character = character.unwrap_or(0);
                        message = format!(
                            "{} (position {}:{} in the original .ts file)",
                            message,
                            line + 1,
                            character + 1
                        );
                        Err(resolution_error(
                            message,
                            Some((line as u32, character as u32)),
                            Some(context.file_path().to_string()),
                        ))
                    }
                    _ => Err(resolution_error(message, None, None)),
                }
            }
            "ignore" => Ok(StaticValue::Ignore),
            _ => Ok(StaticValue::Null),
        }
    }

    fn simplify_select(&mut self, context: &StaticSymbol, expression: &Value, depth: usize) -> Result<StaticValue> {
        let target = self.simplify(context, &expression["expression"], depth)?;
        let member = self.simplify_in_context(context, &expression["member"], depth + 1)?;
        if let StaticValue::Symbol(target_symbol) = &target {
            // Static member access: deepen the symbol, descend into `statics` if present.
            let member_name = member.to_js_string();
            let select_context = self.reflector.symbol_cache.member_of(target_symbol, &member_name);
            let declaration = self.resolve_reference_value(target_symbol)?;
            return match declaration.as_ref().and_then(|d| d.get("statics")) {
                Some(statics) if member.is_primitive() => {
                    let value = statics.get(&member_name).cloned().unwrap_or(Value::Null);
                    if value.is_null() {
                        Ok(StaticValue::Undefined)
                    } else {
                        self.simplify_in_context(&select_context, &value, depth + 1)
                    }
                }
                Some(_) => Ok(StaticValue::Null),
                None => Ok(StaticValue::Symbol(select_context)),
            };
        }
        if target.is_truthy() && member.is_primitive() {
            Ok(target.get(&member))
        } else {
            Ok(StaticValue::Null)
        }
    }

    fn simplify_call(&mut self, context: &StaticSymbol, expression: &Value, depth: usize) -> Result<StaticValue> {
        let mut call_context = None;
        if expression["__symbolic"] == "call" {
            let target = &expression["expression"];
            let mut function_symbol = None;
            let mut target_function = None;
            match target["__symbolic"].as_str() {
                Some("reference") => {
                    call_context = Some(json!({"name": target["name"]}));
                    let symbol = self.resolve_reference(context, target)?;
                    target_function = self.resolve_reference_value(&symbol)?;
                    function_symbol = Some(symbol);
                }
                Some("select") if target["expression"]["__symbolic"] == "reference" => {
                    let symbol = self.resolve_reference(context, &target["expression"])?;
                    let class_data = self.resolve_reference_value(&symbol)?;
                    let member = target["member"].as_str().unwrap_or_default();
                    target_function = class_data.and_then(|data| data["statics"].get(member).cloned());
                    function_symbol = Some(symbol);
                }
                _ => {}
            }

            if let (Some(function_symbol), Some(function)) = (function_symbol, target_function) {
                if function["__symbolic"] == "function" {
                    if self.calling.contains(&function_symbol) {
                        return Err(resolution_error("Recursion not supported".to_string(), None, None));
                    }
                    let value = &function["value"];
                    let evaluable = !value.is_null() && (depth != 0 || value["__symbolic"] != "error");
                    if evaluable {
                        self.calling.insert(function_symbol.clone());
                        let result = self.inline_call(context, &function_symbol, &function, expression, depth);
                        self.calling.remove(&function_symbol);
                        return result;
                    }
                }
            }
        }

        if depth == 0 {
            // An unknown decorator at the top level is skipped, not an error.
            return Ok(StaticValue::Ignore);
        }
        self.simplify(
            context,
            &error_node("Function call not supported", call_context),
            depth,
        )
    }

    fn inline_call(
        &mut self,
        context: &StaticSymbol,
        function_symbol: &StaticSymbol,
        function: &Value,
        expression: &Value,
        depth: usize,
    ) -> Result<StaticValue> {
        let mut args = Vec::new();
        for arg in expression["arguments"].as_array().into_iter().flatten() {
            args.push(self.simplify(context, arg, depth)?);
        }
        if let Some(defaults) = function["defaults"].as_array() {
            for default in defaults.iter().skip(args.len()) {
                args.push(self.simplify(context, default, depth)?);
            }
        }
        let mut function_scope = HashMap::new();
        for (index, parameter) in function["parameters"]
            .as_array()
            .into_iter()
            .flatten()
            .enumerate()
        {
            if let Some(name) = parameter.as_str() {
                let value = args.get(index).cloned().unwrap_or(StaticValue::Undefined);
                function_scope.insert(name.to_string(), value);
            }
        }
        let new_scope = if function_scope.is_empty() {
            None
        } else {
            Some(Rc::new(function_scope))
        };
        let old_scope = std::mem::replace(&mut self.scope, new_scope);
        let result = self.simplify_in_context(function_symbol, &function["value"], depth + 1);
        self.scope = old_scope;
        result
    }
}

fn expanded_message(error: &Value) -> String {
    let message = error["message"].as_str().unwrap_or_default();
    let context = &error["context"];
    match message {
        "Reference to non-exported class" => {
            if let Some(class_name) = context["className"].as_str() {
                return format!(
                    "Reference to a non-exported class {}. Consider exporting the class",
                    class_name
                );
            }
        }
        "Variable not initialized" => {
            return "Only initialized variables and constants can be referenced because the value of this variable is needed by the template compiler".to_string();
        }
        "Destructuring not supported" => {
            return "Referencing an exported destructured variable or constant is not supported by the template compiler. Consider simplifying this to avoid destructuring".to_string();
        }
        "Could not resolve type" => {
            if let Some(type_name) = context["typeName"].as_str() {
                return format!("Could not resolve type {}", type_name);
            }
        }
        "Function call not supported" => {
            let prefix = match context["name"].as_str() {
                Some(name) => format!("Calling function '{}', f", name),
                None => "F".to_string(),
            };
            return format!(
                "{}unction calls are not supported. Consider replacing the function or lambda with a reference to an exported function",
                prefix
            );
        }
        "Reference to a local symbol" => {
            if let Some(name) = context["name"].as_str() {
                return format!(
                    "Reference to a local (non-exported) symbol '{}'. Consider exporting the symbol",
                    name
                );
            }
        }
        _ => {}
    }
    message.to_string()
}

fn produce_error_message(error: &Value) -> String {
    format!(
        "Error encountered resolving symbol values statically. {}",
        expanded_message(error)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aot::metadata_host::InMemoryMetadataHost;
    use crate::error::CollectedErrors;
    use pretty_assertions::assert_eq;

    const APP: &str = "/app/app.ts";

    fn reflector(host: InMemoryMetadataHost, collector: Option<Rc<dyn ErrorCollector>>) -> StaticReflector {
        StaticReflector::new(Rc::new(host), Rc::new(StaticSymbolCache::new()), collector).unwrap()
    }

    fn app_host(declarations: Value) -> InMemoryMetadataHost {
        let host = InMemoryMetadataHost::with_angular_core();
        host.add_module(APP, declarations);
        host
    }

    fn simplify(reflector: &StaticReflector, value: Value) -> Result<StaticValue> {
        let context = reflector.get_static_symbol(APP, "Context", &[]);
        reflector.simplify(&context, &value)
    }

    fn reference(name: &str) -> Value {
        json!({"__symbolic": "reference", "name": name})
    }

    fn call(name: &str, arguments: Value) -> Value {
        json!({"__symbolic": "call", "expression": reference(name), "arguments": arguments})
    }

    #[test]
    fn should_fold_operators_and_conditionals() {
        let reflector = reflector(app_host(json!({})), None);
        let sum = json!({
            "__symbolic": "binop", "operator": "*",
            "left": {"__symbolic": "binop", "operator": "+", "left": 1, "right": 2},
            "right": 4
        });
        assert_eq!(simplify(&reflector, sum).unwrap(), StaticValue::Number(12.0));
        let not = json!({"__symbolic": "pre", "operator": "!", "operand": true});
        assert_eq!(simplify(&reflector, not).unwrap(), StaticValue::Bool(false));
        let negate = json!({"__symbolic": "pre", "operator": "-", "operand": 5});
        assert_eq!(simplify(&reflector, negate).unwrap(), StaticValue::Number(-5.0));
        let conditional = json!({
            "__symbolic": "if",
            "condition": {"__symbolic": "binop", "operator": "<", "left": 1, "right": 2},
            "thenExpression": "small",
            "elseExpression": {"__symbolic": "error", "message": "not evaluated"}
        });
        assert_eq!(simplify(&reflector, conditional).unwrap(), StaticValue::from("small"));
    }

    #[test]
    fn should_index_and_select_values() {
        let reflector = reflector(
            app_host(json!({
                "Config": {"__symbolic": "class", "statics": {"VALUE": 42}},
                "Plain": {"__symbolic": "class"},
                "Colors": {"Red": 0, "Blue": 1}
            })),
            None,
        );
        let index = json!({"__symbolic": "index", "expression": [10, 20, 30], "index": 1});
        assert_eq!(simplify(&reflector, index).unwrap(), StaticValue::Number(20.0));
        let fractional = json!({"__symbolic": "index", "expression": [10, 20, 30], "index": 1.5});
        assert_eq!(simplify(&reflector, fractional).unwrap(), StaticValue::Undefined);

        let select = |target: &str, member: &str| {
            json!({"__symbolic": "select", "expression": reference(target), "member": member})
        };
        assert_eq!(
            simplify(&reflector, select("Config", "VALUE")).unwrap(),
            StaticValue::Number(42.0)
        );
        assert_eq!(
            simplify(&reflector, select("Colors", "Blue")).unwrap(),
            StaticValue::Number(1.0)
        );
        let member = simplify(&reflector, select("Plain", "member")).unwrap();
        let member = member.as_symbol().unwrap();
        assert_eq!(member.display_name(), "Plain.member");
        assert!(member.ptr_eq(&reflector.get_static_symbol(APP, "Plain", &["member"])));
    }

    #[test]
    fn should_expand_spreads_and_drop_ignored_entries() {
        let reflector = reflector(app_host(json!({})), None);
        let array = json!([
            1,
            {"__symbolic": "spread", "expression": [2, 3]},
            call("unknownDecorator", json!([])),
            {"__symbolic": "ignore"},
            4
        ]);
        let numbers: Vec<StaticValue> = [1.0, 2.0, 3.0, 4.0].into_iter().map(StaticValue::Number).collect();
        assert_eq!(simplify(&reflector, array).unwrap(), StaticValue::Array(numbers));

        let object = json!({"kept": 1, "dropped": {"__symbolic": "ignore"}});
        let object = simplify(&reflector, object).unwrap();
        assert_eq!(object.as_object().unwrap().keys().cloned().collect::<Vec<_>>(), vec!["kept".to_string()]);
        assert_eq!(
            simplify(&reflector, json!({"__symbolic": "ignore"})).unwrap(),
            StaticValue::Undefined
        );
    }

    #[test]
    fn should_keep_opaque_tokens_by_identity() {
        let host = app_host(json!({}));
        host.add_module(
            "/app/tokens.ts",
            json!({
                "TOKEN": {
                    "__symbolic": "new",
                    "expression": {"__symbolic": "reference", "module": "@angular/core", "name": "OpaqueToken"},
                    "arguments": ["token"]
                },
                "VALUE": 5
            }),
        );
        let reflector = reflector(host, None);
        let token_ref = json!({"__symbolic": "reference", "module": "./tokens", "name": "TOKEN"});
        let first = simplify(&reflector, token_ref.clone()).unwrap();
        let second = simplify(&reflector, token_ref).unwrap();
        let token = reflector.get_static_symbol("/app/tokens.ts", "TOKEN", &[]);
        assert_eq!(first, StaticValue::Symbol(token.clone()));
        assert!(first.as_symbol().unwrap().ptr_eq(second.as_symbol().unwrap()));

        let value_ref = json!({"__symbolic": "reference", "module": "./tokens", "name": "VALUE"});
        assert_eq!(simplify(&reflector, value_ref).unwrap(), StaticValue::Number(5.0));
    }

    #[test]
    fn should_inline_functions_with_default_parameters() {
        let reflector = reflector(
            app_host(json!({
                "add": {
                    "__symbolic": "function",
                    "parameters": ["a", "b"],
                    "defaults": [null, 10],
                    "value": {"__symbolic": "binop", "operator": "+", "left": reference("a"), "right": reference("b")}
                }
            })),
            None,
        );
        assert_eq!(
            simplify(&reflector, call("add", json!([1]))).unwrap(),
            StaticValue::Number(11.0)
        );
        assert_eq!(
            simplify(&reflector, call("add", json!([1, 2]))).unwrap(),
            StaticValue::Number(3.0)
        );
    }

    #[test]
    fn should_reject_recursive_functions() {
        let reflector = reflector(
            app_host(json!({
                "loop": {
                    "__symbolic": "function",
                    "parameters": ["x"],
                    "value": call("loop", json!([reference("x")]))
                }
            })),
            None,
        );
        let err = simplify(&reflector, call("loop", json!([1]))).unwrap_err();
        assert!(err.to_string().starts_with("Recursion not supported, resolving symbol loop in /app/app.ts"));
    }

    #[test]
    fn should_report_to_the_collector_and_continue() {
        let errors = Rc::new(CollectedErrors::new());
        let collector: Rc<dyn ErrorCollector> = errors.clone();
        let reflector = reflector(app_host(json!({})), Some(collector));
        let error = json!({"__symbolic": "error", "message": "Variable not initialized"});
        assert_eq!(simplify(&reflector, error.clone()).unwrap(), StaticValue::Undefined);
        assert_eq!(errors.len(), 1);
        assert!(errors.messages()[0].starts_with(
            "Error encountered resolving symbol values statically. Only initialized variables and constants"
        ));

        let strict = reflector_without_collector();
        assert!(simplify(&strict, error).is_err());
    }

    fn reflector_without_collector() -> StaticReflector {
        reflector(app_host(json!({})), None)
    }

    #[test]
    fn should_add_positions_only_for_known_lines() {
        let reflector = reflector_without_collector();
        let located = json!({"__symbolic": "error", "message": "Something odd", "line": 2, "character": 3});
        let err = simplify(&reflector, located).unwrap_err();
        assert!(err.to_string().contains("Something odd (position 3:4 in the original .ts file)"));

        let first_line = json!({"__symbolic": "error", "message": "Something odd", "line": 0, "character": 3});
        let err = simplify(&reflector, first_line).unwrap_err();
        assert!(!err.to_string().contains("(position"));
        assert!(err.to_string().contains("Something odd, resolving symbol Context in /app/app.ts"));
    }

    #[test]
    fn should_follow_reexport_chains() {
        let host = app_host(json!({}));
        let record = |metadata: Value, exports: Value| {
            json!({"__symbolic": "module", "version": 2, "metadata": metadata, "exports": exports})
        };
        host.add_metadata(
            "/app/a.ts",
            record(json!({}), json!([{"from": "./b", "export": [{"name": "Inner", "as": "Outer"}]}])),
        );
        host.add_metadata("/app/b.ts", record(json!({}), json!([{"from": "./c"}])));
        host.add_module("/app/c.ts", json!({"Inner": {"__symbolic": "class"}}));
        host.add_metadata("/app/x.ts", record(json!({}), json!([{"from": "./y"}])));
        host.add_metadata("/app/y.ts", record(json!({}), json!([{"from": "./x"}])));
        let reflector = reflector(host, None);

        let outer = reflector.resolve_exported_symbol("/app/a.ts", "Outer").unwrap().unwrap();
        assert!(outer.ptr_eq(&reflector.get_static_symbol("/app/c.ts", "Inner", &[])));
        assert_eq!(
            reflector.find_declaration("./a", "Outer", Some(APP)).unwrap(),
            outer
        );

        // Cyclic `export *` terminates without finding anything.
        assert_eq!(reflector.resolve_exported_symbol("/app/x.ts", "Missing").unwrap(), None);
        assert_eq!(
            reflector.find_declaration("./x", "Missing", Some(APP)).unwrap(),
            reflector.get_static_symbol("/app/x.ts", "Missing", &[])
        );
    }

    #[test]
    fn should_pick_the_highest_metadata_version() {
        let host = app_host(json!({}));
        host.add_metadata("/app/v.ts", json!({"__symbolic": "module", "version": 1, "metadata": {"A": 1}}));
        host.add_metadata("/app/v.ts", json!({"__symbolic": "module", "version": 2, "metadata": {"A": 2}}));
        let reflector = reflector(host, None);
        let metadata = reflector.get_module_metadata("/app/v.ts").unwrap();
        assert_eq!(metadata["metadata"]["A"], json!(2));
    }

    #[test]
    fn should_report_metadata_version_mismatches() {
        let old = json!({"__symbolic": "module", "version": 1, "metadata": {}});
        let host = app_host(json!({}));
        host.add_metadata("/app/old.ts", old.clone());
        let err = reflector(host, None).get_module_metadata("/app/old.ts").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Metadata version mismatch for module /app/old.ts, found version 1, expected 2"
        );

        let errors = Rc::new(CollectedErrors::new());
        let collector: Rc<dyn ErrorCollector> = errors.clone();
        let host = app_host(json!({}));
        host.add_metadata("/app/old.ts", old);
        let reflector = reflector(host, Some(collector));
        assert!(reflector.get_module_metadata("/app/old.ts").is_ok());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn expands_known_error_messages() {
        let error = json!({"__symbolic": "error", "message": "Reference to a local symbol", "context": {"name": "foo"}});
        assert_eq!(
            produce_error_message(&error),
            "Error encountered resolving symbol values statically. Reference to a local (non-exported) symbol 'foo'. Consider exporting the symbol"
        );
        let call = json!({"__symbolic": "error", "message": "Function call not supported"});
        assert!(produce_error_message(&call).ends_with(
            "Function calls are not supported. Consider replacing the function or lambda with a reference to an exported function"
        ));
    }

    #[test]
    fn unknown_messages_pass_through() {
        let error = json!({"__symbolic": "error", "message": "Something odd"});
        assert_eq!(expanded_message(&error), "Something odd");
    }
}
