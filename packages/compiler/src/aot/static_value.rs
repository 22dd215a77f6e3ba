//! Values produced by static evaluation of metadata.
//!
//! Decorators and animation helpers are not executed; the conversion table
//! turns each known call into an `Annotation` tagged with its `MetadataKind`
//! and carrying the evaluated arguments as named fields.

use super::static_symbol::{StaticSymbol, SYMBOL_MARKER};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum StaticValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<StaticValue>),
    Object(IndexMap<String, StaticValue>),
    Symbol(StaticSymbol),
    Annotation(Rc<Annotation>),
    /// Unknown top-level decorator; dropped from arrays and objects.
    Ignore,
}

impl StaticValue {
    pub fn is_ignore(&self) -> bool {
        matches!(self, StaticValue::Ignore)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, StaticValue::Undefined | StaticValue::Null)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            StaticValue::Undefined
                | StaticValue::Null
                | StaticValue::Bool(_)
                | StaticValue::Number(_)
                | StaticValue::String(_)
        )
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            StaticValue::Undefined | StaticValue::Null | StaticValue::Ignore => false,
            StaticValue::Bool(b) => *b,
            StaticValue::Number(n) => *n != 0.0 && !n.is_nan(),
            StaticValue::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StaticValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StaticValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            StaticValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[StaticValue]> {
        match self {
            StaticValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, StaticValue>> {
        match self {
            StaticValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&StaticSymbol> {
        match self {
            StaticValue::Symbol(symbol) => Some(symbol),
            _ => None,
        }
    }

    pub fn as_annotation(&self) -> Option<&Rc<Annotation>> {
        match self {
            StaticValue::Annotation(annotation) => Some(annotation),
            _ => None,
        }
    }

    /// Property access with JavaScript semantics for arrays and objects.
    pub fn get(&self, key: &StaticValue) -> StaticValue {
        match (self, key) {
            (StaticValue::Array(items), StaticValue::Number(n)) if *n >= 0.0 && n.fract() == 0.0 => items
                .get(*n as usize)
                .cloned()
                .unwrap_or(StaticValue::Undefined),
            (StaticValue::Array(items), StaticValue::String(s)) if s == "length" => {
                StaticValue::Number(items.len() as f64)
            }
            (StaticValue::String(text), StaticValue::String(s)) if s == "length" => {
                StaticValue::Number(text.chars().count() as f64)
            }
            (StaticValue::Object(map), _) => map
                .get(&key.to_js_string())
                .cloned()
                .unwrap_or(StaticValue::Undefined),
            (StaticValue::Annotation(annotation), StaticValue::String(s)) => annotation
                .fields
                .get(s)
                .cloned()
                .unwrap_or(StaticValue::Undefined),
            _ => StaticValue::Undefined,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            StaticValue::Number(n) => *n,
            StaticValue::Bool(true) => 1.0,
            StaticValue::Bool(false) | StaticValue::Null => 0.0,
            StaticValue::String(s) if s.trim().is_empty() => 0.0,
            StaticValue::String(s) => s.trim().parse().unwrap_or(f64::NAN),
            _ => f64::NAN,
        }
    }

    pub fn to_js_string(&self) -> String {
        match self {
            StaticValue::Undefined | StaticValue::Ignore => "undefined".to_string(),
            StaticValue::Null => "null".to_string(),
            StaticValue::Bool(b) => b.to_string(),
            StaticValue::Number(n) => format_number(*n),
            StaticValue::String(s) => s.clone(),
            StaticValue::Array(items) => items
                .iter()
                .map(|item| {
                    if item.is_nullish() {
                        String::new()
                    } else {
                        item.to_js_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(","),
            StaticValue::Object(_) | StaticValue::Annotation(_) => "[object Object]".to_string(),
            StaticValue::Symbol(symbol) => symbol.display_name(),
        }
    }

    fn to_int32(&self) -> i32 {
        let n = self.to_number();
        if n.is_finite() {
            (n.trunc() as i64) as i32
        } else {
            0
        }
    }

    pub fn strict_equals(&self, other: &StaticValue) -> bool {
        match (self, other) {
            (StaticValue::Number(a), StaticValue::Number(b)) => a == b,
            (StaticValue::Annotation(a), StaticValue::Annotation(b)) => Rc::ptr_eq(a, b),
            (StaticValue::Array(_), StaticValue::Array(_))
            | (StaticValue::Object(_), StaticValue::Object(_)) => false,
            _ => self == other,
        }
    }

    pub fn loose_equals(&self, other: &StaticValue) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (StaticValue::Number(_), StaticValue::String(_))
            | (StaticValue::String(_), StaticValue::Number(_))
            | (StaticValue::Bool(_), _)
            | (_, StaticValue::Bool(_)) => self.to_number() == other.to_number(),
            _ => self.strict_equals(other),
        }
    }

    /// Applies a binary operator from the metadata expression language.
    pub fn binary(op: &str, left: StaticValue, right: StaticValue) -> StaticValue {
        use StaticValue::*;
        match op {
            "&&" => {
                if left.is_truthy() {
                    right
                } else {
                    left
                }
            }
            "||" => {
                if left.is_truthy() {
                    left
                } else {
                    right
                }
            }
            "|" => Number((left.to_int32() | right.to_int32()) as f64),
            "^" => Number((left.to_int32() ^ right.to_int32()) as f64),
            "&" => Number((left.to_int32() & right.to_int32()) as f64),
            "==" => Bool(left.loose_equals(&right)),
            "!=" => Bool(!left.loose_equals(&right)),
            "===" => Bool(left.strict_equals(&right)),
            "!==" => Bool(!left.strict_equals(&right)),
            "<" | ">" | "<=" | ">=" => {
                let ordering = match (&left, &right) {
                    (String(a), String(b)) => a.partial_cmp(b),
                    _ => left.to_number().partial_cmp(&right.to_number()),
                };
                Bool(match (op, ordering) {
                    (_, None) => false,
                    ("<", Some(o)) => o.is_lt(),
                    (">", Some(o)) => o.is_gt(),
                    ("<=", Some(o)) => o.is_le(),
                    (_, Some(o)) => o.is_ge(),
                })
            }
            "<<" => Number(left.to_int32().wrapping_shl(right.to_int32() as u32 & 31) as f64),
            ">>" => Number(left.to_int32().wrapping_shr(right.to_int32() as u32 & 31) as f64),
            "+" => match (&left, &right) {
                (String(_), _) | (_, String(_)) => {
                    String(format!("{}{}", left.to_js_string(), right.to_js_string()))
                }
                _ => Number(left.to_number() + right.to_number()),
            },
            "-" => Number(left.to_number() - right.to_number()),
            "*" => Number(left.to_number() * right.to_number()),
            "/" => Number(left.to_number() / right.to_number()),
            "%" => Number(left.to_number() % right.to_number()),
            _ => Null,
        }
    }

    pub fn unary(op: &str, operand: StaticValue) -> StaticValue {
        match op {
            "+" => operand,
            "-" => StaticValue::Number(-operand.to_number()),
            "!" => StaticValue::Bool(!operand.is_truthy()),
            "~" => StaticValue::Number(!operand.to_int32() as f64),
            _ => StaticValue::Null,
        }
    }

    /// Plain JSON view, symbols encoded with the summary marker.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            StaticValue::Undefined | StaticValue::Null | StaticValue::Ignore => Value::Null,
            StaticValue::Bool(b) => Value::Bool(*b),
            StaticValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            StaticValue::String(s) => Value::String(s.clone()),
            StaticValue::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            StaticValue::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            StaticValue::Symbol(symbol) => serde_json::to_value(symbol).unwrap_or(Value::Null),
            StaticValue::Annotation(annotation) => {
                let mut object = serde_json::Map::new();
                object.insert(
                    "__annotation__".to_string(),
                    Value::String(annotation.kind.name().to_string()),
                );
                for (k, v) in &annotation.fields {
                    object.insert(k.clone(), v.to_json());
                }
                Value::Object(object)
            }
        }
    }
}

pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl From<&str> for StaticValue {
    fn from(s: &str) -> Self {
        StaticValue::String(s.to_string())
    }
}

impl From<StaticSymbol> for StaticValue {
    fn from(symbol: StaticSymbol) -> Self {
        StaticValue::Symbol(symbol)
    }
}

impl Serialize for StaticValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StaticValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        StaticValue::from_json(&json).map_err(de::Error::custom)
    }
}

impl StaticValue {
    /// Inverse of `to_json`; symbol records are re-interned through the
    /// active symbol cache. Annotations come back as plain objects.
    pub fn from_json(json: &serde_json::Value) -> std::result::Result<StaticValue, serde_json::Error> {
        use serde_json::Value;
        Ok(match json {
            Value::Null => StaticValue::Null,
            Value::Bool(b) => StaticValue::Bool(*b),
            Value::Number(n) => StaticValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => StaticValue::String(s.clone()),
            Value::Array(items) => StaticValue::Array(
                items
                    .iter()
                    .map(StaticValue::from_json)
                    .collect::<std::result::Result<_, _>>()?,
            ),
            Value::Object(map) if map.get("__symbolic__").and_then(Value::as_str) == Some(SYMBOL_MARKER) => {
                StaticValue::Symbol(StaticSymbol::deserialize(json)?)
            }
            Value::Object(map) => {
                let mut object = IndexMap::new();
                for (key, value) in map {
                    if key != "__annotation__" {
                        object.insert(key.clone(), StaticValue::from_json(value)?);
                    }
                }
                StaticValue::Object(object)
            }
        })
    }
}

/// Every decorator, DI marker and animation helper the compiler understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    Component,
    Directive,
    Pipe,
    NgModule,
    Injectable,
    Input,
    Output,
    HostBinding,
    HostListener,
    ContentChild,
    ContentChildren,
    ViewChild,
    ViewChildren,
    Inject,
    Attribute,
    Host,
    Self_,
    SkipSelf,
    Optional,
    AnimationTrigger,
    AnimationState,
    AnimationTransition,
    AnimationStyle,
    AnimationAnimate,
    AnimationKeyframes,
    AnimationSequence,
    AnimationGroup,
    /// Registered by embedders through `register_decorator_or_constructor`.
    Custom(&'static str),
}

impl MetadataKind {
    pub fn name(&self) -> &'static str {
        match self {
            MetadataKind::Component => "Component",
            MetadataKind::Directive => "Directive",
            MetadataKind::Pipe => "Pipe",
            MetadataKind::NgModule => "NgModule",
            MetadataKind::Injectable => "Injectable",
            MetadataKind::Input => "Input",
            MetadataKind::Output => "Output",
            MetadataKind::HostBinding => "HostBinding",
            MetadataKind::HostListener => "HostListener",
            MetadataKind::ContentChild => "ContentChild",
            MetadataKind::ContentChildren => "ContentChildren",
            MetadataKind::ViewChild => "ViewChild",
            MetadataKind::ViewChildren => "ViewChildren",
            MetadataKind::Inject => "Inject",
            MetadataKind::Attribute => "Attribute",
            MetadataKind::Host => "Host",
            MetadataKind::Self_ => "Self",
            MetadataKind::SkipSelf => "SkipSelf",
            MetadataKind::Optional => "Optional",
            MetadataKind::AnimationTrigger => "trigger",
            MetadataKind::AnimationState => "state",
            MetadataKind::AnimationTransition => "transition",
            MetadataKind::AnimationStyle => "style",
            MetadataKind::AnimationAnimate => "animate",
            MetadataKind::AnimationKeyframes => "keyframes",
            MetadataKind::AnimationSequence => "sequence",
            MetadataKind::AnimationGroup => "group",
            MetadataKind::Custom(name) => name,
        }
    }

    /// `Directive` matches components too, like `instanceof Directive`.
    pub fn is_a(&self, other: MetadataKind) -> bool {
        *self == other || (other == MetadataKind::Directive && *self == MetadataKind::Component)
    }

    pub fn is_query(&self) -> bool {
        matches!(
            self,
            MetadataKind::ContentChild
                | MetadataKind::ContentChildren
                | MetadataKind::ViewChild
                | MetadataKind::ViewChildren
        )
    }
}

/// A materialized decorator or helper call.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub kind: MetadataKind,
    pub fields: IndexMap<String, StaticValue>,
}

impl Annotation {
    pub fn new(kind: MetadataKind) -> Self {
        Annotation {
            kind,
            fields: IndexMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: StaticValue) -> Self {
        if !value.is_nullish() {
            self.fields.insert(key.to_string(), value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&StaticValue> {
        self.fields.get(key).filter(|v| !v.is_nullish())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(StaticValue::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(StaticValue::as_bool)
    }

    pub fn get_array(&self, key: &str) -> &[StaticValue] {
        self.get(key).and_then(StaticValue::as_array).unwrap_or(&[])
    }

    pub fn into_value(self) -> StaticValue {
        StaticValue::Annotation(Rc::new(self))
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.kind.name())
    }
}

fn arg(args: &[StaticValue], index: usize) -> StaticValue {
    args.get(index).cloned().unwrap_or(StaticValue::Undefined)
}

/// Builds an annotation from the first (object) argument, as class decorators do.
pub fn object_decorator(kind: MetadataKind, args: &[StaticValue]) -> StaticValue {
    let mut annotation = Annotation::new(kind);
    if let Some(StaticValue::Object(map)) = args.first() {
        for (key, value) in map {
            annotation.fields.insert(key.clone(), value.clone());
        }
    }
    annotation.into_value()
}

pub fn marker_decorator(kind: MetadataKind, _args: &[StaticValue]) -> StaticValue {
    Annotation::new(kind).into_value()
}

pub fn single_arg_decorator(kind: MetadataKind, field: &str, args: &[StaticValue]) -> StaticValue {
    Annotation::new(kind).with(field, arg(args, 0)).into_value()
}

pub fn host_listener(args: &[StaticValue]) -> StaticValue {
    Annotation::new(MetadataKind::HostListener)
        .with("eventName", arg(args, 0))
        .with("args", arg(args, 1))
        .into_value()
}

pub fn query_decorator(kind: MetadataKind, args: &[StaticValue]) -> StaticValue {
    let options = arg(args, 1);
    let read = options.get(&StaticValue::from("read"));
    let (first, default_descendants, is_view_query) = match kind {
        MetadataKind::ContentChild => (true, true, false),
        MetadataKind::ContentChildren => (false, false, false),
        MetadataKind::ViewChild => (true, true, true),
        _ => (false, true, true),
    };
    let descendants = match options.get(&StaticValue::from("descendants")) {
        StaticValue::Bool(b) if kind == MetadataKind::ContentChildren => b,
        _ => default_descendants,
    };
    Annotation::new(kind)
        .with("selector", arg(args, 0))
        .with("first", StaticValue::Bool(first))
        .with("descendants", StaticValue::Bool(descendants))
        .with("isViewQuery", StaticValue::Bool(is_view_query))
        .with("read", read)
        .into_value()
}

pub fn animation_trigger(args: &[StaticValue]) -> StaticValue {
    Annotation::new(MetadataKind::AnimationTrigger)
        .with("name", arg(args, 0))
        .with("definitions", arg(args, 1))
        .into_value()
}

pub fn animation_state(args: &[StaticValue]) -> StaticValue {
    Annotation::new(MetadataKind::AnimationState)
        .with("stateNameExpr", arg(args, 0))
        .with("styles", arg(args, 1))
        .into_value()
}

pub fn animation_transition(args: &[StaticValue]) -> StaticValue {
    let steps = match arg(args, 1) {
        StaticValue::Array(items) => Annotation::new(MetadataKind::AnimationSequence)
            .with("steps", StaticValue::Array(items))
            .into_value(),
        other => other,
    };
    Annotation::new(MetadataKind::AnimationTransition)
        .with("stateChangeExpr", arg(args, 0))
        .with("steps", steps)
        .into_value()
}

pub fn animation_style(args: &[StaticValue]) -> StaticValue {
    let tokens = match arg(args, 0) {
        StaticValue::Array(items) => items,
        other => vec![other],
    };
    let mut offset = StaticValue::Null;
    let styles = tokens
        .into_iter()
        .map(|token| match token {
            StaticValue::Object(mut map) => {
                if let Some(value) = map.shift_remove("offset") {
                    offset = value;
                }
                StaticValue::Object(map)
            }
            other => other,
        })
        .collect();
    Annotation::new(MetadataKind::AnimationStyle)
        .with("offset", offset)
        .with("styles", StaticValue::Array(styles))
        .into_value()
}

pub fn animation_animate(args: &[StaticValue]) -> StaticValue {
    let styles = match arg(args, 1) {
        value if value.is_nullish() => Annotation::new(MetadataKind::AnimationStyle)
            .with("offset", StaticValue::Number(1.0))
            .with(
                "styles",
                StaticValue::Array(vec![StaticValue::Object(IndexMap::new())]),
            )
            .into_value(),
        value => value,
    };
    Annotation::new(MetadataKind::AnimationAnimate)
        .with("timings", arg(args, 0))
        .with("styles", styles)
        .into_value()
}

pub fn animation_steps(kind: MetadataKind, args: &[StaticValue]) -> StaticValue {
    Annotation::new(kind).with("steps", arg(args, 0)).into_value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_operator_semantics() {
        use StaticValue::*;
        assert_eq!(StaticValue::binary("+", Number(1.0), Number(2.0)), Number(3.0));
        assert_eq!(
            StaticValue::binary("+", String("a".into()), Number(1.0)),
            String("a1".into())
        );
        assert_eq!(StaticValue::binary("||", Null, Number(2.0)), Number(2.0));
        assert_eq!(StaticValue::binary("==", Null, Undefined), Bool(true));
        assert_eq!(StaticValue::binary("===", Null, Undefined), Bool(false));
        assert_eq!(StaticValue::binary("<<", Number(1.0), Number(3.0)), Number(8.0));
        assert_eq!(StaticValue::unary("~", Number(0.0)), Number(-1.0));
    }

    #[test]
    fn indexes_arrays_only_by_whole_numbers() {
        use StaticValue::*;
        let items = Array(vec![Number(10.0), Number(20.0)]);
        assert_eq!(items.get(&Number(1.0)), Number(20.0));
        assert_eq!(items.get(&Number(1.5)), Undefined);
        assert_eq!(items.get(&Number(-1.0)), Undefined);
        assert_eq!(items.get(&Number(2.0)), Undefined);
        assert_eq!(items.get(&String("length".into())), Number(2.0));
    }

    #[test]
    fn query_decorators_fill_defaults() {
        let value = query_decorator(
            MetadataKind::ViewChildren,
            &[StaticValue::from("item")],
        );
        let annotation = value.as_annotation().unwrap();
        assert_eq!(annotation.get_bool("first"), Some(false));
        assert_eq!(annotation.get_bool("descendants"), Some(true));
        assert_eq!(annotation.get_bool("isViewQuery"), Some(true));
    }

    #[test]
    fn style_extracts_offset() {
        let mut map = IndexMap::new();
        map.insert("opacity".to_string(), StaticValue::Number(0.0));
        map.insert("offset".to_string(), StaticValue::Number(0.5));
        let value = animation_style(&[StaticValue::Object(map)]);
        let annotation = value.as_annotation().unwrap();
        assert_eq!(annotation.get("offset"), Some(&StaticValue::Number(0.5)));
        assert_eq!(annotation.get_array("styles").len(), 1);
    }

    #[test]
    fn formats_numbers_like_javascript() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(f64::NAN), "NaN");
    }
}
