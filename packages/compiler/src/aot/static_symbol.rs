//! Static symbols
//!
//! A `StaticSymbol` names a declaration without loading it: the declaring file,
//! the exported name, and an optional member path (`Foo.bar.baz`). Symbols are
//! interned by `StaticSymbolCache`, so two lookups of the same triple return
//! the same allocation and the symbol can key every cache in the compiler.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

pub type Members = SmallVec<[String; 2]>;

#[derive(Debug)]
struct SymbolData {
    file_path: String,
    name: String,
    members: Members,
}

#[derive(Clone)]
pub struct StaticSymbol(Rc<SymbolData>);

impl StaticSymbol {
    /// Creates an un-interned symbol. Prefer `StaticSymbolCache::get`.
    pub fn new(file_path: &str, name: &str, members: &[&str]) -> Self {
        StaticSymbol(Rc::new(SymbolData {
            file_path: file_path.to_string(),
            name: name.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
        }))
    }

    pub fn file_path(&self) -> &str {
        &self.0.file_path
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn members(&self) -> &[String] {
        &self.0.members
    }

    pub fn has_members(&self) -> bool {
        !self.0.members.is_empty()
    }

    /// True when both handles share one interned allocation.
    pub fn ptr_eq(&self, other: &StaticSymbol) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Name used in generated identifiers and diagnostics: `Foo` or `Foo.bar`.
    pub fn display_name(&self) -> String {
        if self.0.members.is_empty() {
            self.0.name.clone()
        } else {
            format!("{}.{}", self.0.name, self.0.members.join("."))
        }
    }

    fn cache_key(file_path: &str, name: &str, members: &[&str]) -> String {
        let mut key = format!("\"{}\".{}", file_path, name);
        for member in members {
            key.push('.');
            key.push_str(member);
        }
        key
    }
}

impl PartialEq for StaticSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.0.file_path == other.0.file_path
                && self.0.name == other.0.name
                && self.0.members == other.0.members)
    }
}

impl Eq for StaticSymbol {}

impl Hash for StaticSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.file_path.hash(state);
        self.0.name.hash(state);
        self.0.members.hash(state);
    }
}

impl fmt::Debug for StaticSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StaticSymbol({:?}, {}", self.0.file_path, self.0.name)?;
        for member in &self.0.members {
            write!(f, ".{}", member)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for StaticSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Interning table for static symbols.
#[derive(Default)]
pub struct StaticSymbolCache {
    cache: RefCell<HashMap<String, StaticSymbol>>,
}

impl StaticSymbolCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, declaration_file: &str, name: &str, members: &[&str]) -> StaticSymbol {
        let key = StaticSymbol::cache_key(declaration_file, name, members);
        self.cache
            .borrow_mut()
            .entry(key)
            .or_insert_with(|| StaticSymbol::new(declaration_file, name, members))
            .clone()
    }

    /// Returns the interned twin of a symbol created elsewhere.
    pub fn intern(&self, symbol: &StaticSymbol) -> StaticSymbol {
        let members: Vec<&str> = symbol.members().iter().map(String::as_str).collect();
        self.get(symbol.file_path(), symbol.name(), &members)
    }

    /// Symbol for `member` of `base`, e.g. `Foo` + `bar` -> `Foo.bar`.
    pub fn member_of(&self, base: &StaticSymbol, member: &str) -> StaticSymbol {
        let mut members: Vec<&str> = base.members().iter().map(String::as_str).collect();
        members.push(member);
        self.get(base.file_path(), base.name(), &members)
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }
}

thread_local! {
    static READ_CACHE: RefCell<Option<Rc<StaticSymbolCache>>> = const { RefCell::new(None) };
}

/// Runs `f` with `cache` as the interning table for symbols deserialized
/// inside it.
pub fn with_symbol_cache<R>(cache: &Rc<StaticSymbolCache>, f: impl FnOnce() -> R) -> R {
    let previous = READ_CACHE.with(|slot| slot.borrow_mut().replace(cache.clone()));
    let result = f();
    READ_CACHE.with(|slot| *slot.borrow_mut() = previous);
    result
}

pub const SYMBOL_MARKER: &str = "symbol";

impl Serialize for StaticSymbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("__symbolic__", SYMBOL_MARKER)?;
        map.serialize_entry("name", &self.0.name)?;
        map.serialize_entry("path", &self.0.file_path)?;
        map.serialize_entry("members", &self.0.members.as_slice())?;
        map.end()
    }
}

#[derive(Deserialize)]
struct EncodedSymbol {
    #[serde(rename = "__symbolic__")]
    symbolic: String,
    name: String,
    path: String,
    #[serde(default)]
    members: Vec<String>,
}

impl<'de> Deserialize<'de> for StaticSymbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = EncodedSymbol::deserialize(deserializer)?;
        if encoded.symbolic != SYMBOL_MARKER {
            return Err(de::Error::custom(format!(
                "expected a symbol, got {}",
                encoded.symbolic
            )));
        }
        let members: Vec<&str> = encoded.members.iter().map(String::as_str).collect();
        let symbol = READ_CACHE.with(|slot| match &*slot.borrow() {
            Some(cache) => cache.get(&encoded.path, &encoded.name, &members),
            None => StaticSymbol::new(&encoded.path, &encoded.name, &members),
        });
        Ok(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_returns_same_instance() {
        let cache = StaticSymbolCache::new();
        let a = cache.get("/tmp/a.ts", "A", &[]);
        let b = cache.get("/tmp/a.ts", "A", &[]);
        assert!(a.ptr_eq(&b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn symbols_differing_in_any_field_are_distinct() {
        let cache = StaticSymbolCache::new();
        let base = cache.get("/tmp/a.ts", "A", &[]);
        assert_ne!(base, cache.get("/tmp/b.ts", "A", &[]));
        assert_ne!(base, cache.get("/tmp/a.ts", "B", &[]));
        let member = cache.get("/tmp/a.ts", "A", &["x"]);
        assert_ne!(base, member);
        assert!(cache.member_of(&base, "x").ptr_eq(&member));
    }

    #[test]
    fn deserialization_reinterns_through_active_cache() {
        let cache = Rc::new(StaticSymbolCache::new());
        let original = cache.get("/tmp/a.ts", "A", &["m"]);
        let json = serde_json::to_string(&original).unwrap();
        assert_eq!(
            json,
            r#"{"__symbolic__":"symbol","name":"A","path":"/tmp/a.ts","members":["m"]}"#
        );
        let read: StaticSymbol =
            with_symbol_cache(&cache, || serde_json::from_str(&json)).unwrap();
        assert!(read.ptr_eq(&original));
    }

    #[test]
    fn clear_drops_interned_symbols() {
        let cache = StaticSymbolCache::new();
        let a = cache.get("/tmp/a.ts", "A", &[]);
        cache.clear();
        let again = cache.get("/tmp/a.ts", "A", &[]);
        assert!(!a.ptr_eq(&again));
        assert_eq!(a, again);
    }
}
