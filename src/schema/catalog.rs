//! Schema catalog
//!
//! Per-predicate type and index metadata. The fan-out path only reads it;
//! defining and altering predicates happens elsewhere.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

/// Scalar value types a predicate can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeId {
    Default,
    Int,
    Float,
    String,
    Bool,
    DateTime,
    Geo,
    Uid,
    Password,
}

impl TypeId {
    /// Returns the type name reported in schema nodes
    pub fn name(&self) -> &'static str {
        match self {
            TypeId::Default => "default",
            TypeId::Int => "int",
            TypeId::Float => "float",
            TypeId::String => "string",
            TypeId::Bool => "bool",
            TypeId::DateTime => "datetime",
            TypeId::Geo => "geo",
            TypeId::Uid => "uid",
            TypeId::Password => "password",
        }
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Read access to predicate metadata, keyed by predicate name
pub trait SchemaCatalog: Send + Sync {
    /// Every predicate with a defined schema
    fn predicates(&self) -> Vec<String>;

    /// Value type of `predicate`, `None` if no schema is defined
    fn type_of(&self, predicate: &str) -> Option<TypeId>;

    fn is_indexed(&self, predicate: &str) -> bool;

    fn tokenizer_names(&self, predicate: &str) -> Vec<String>;

    fn is_reversed(&self, predicate: &str) -> bool;

    fn has_count(&self, predicate: &str) -> bool;

    fn is_list(&self, predicate: &str) -> bool;

    fn has_upsert(&self, predicate: &str) -> bool;

    fn has_lang(&self, predicate: &str) -> bool;
}

/// Stored metadata of one predicate
///
/// A predicate is indexed exactly when it has at least one tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateSchema {
    #[serde(rename = "type")]
    pub value_type: TypeId,

    #[serde(default)]
    pub tokenizers: Vec<String>,

    #[serde(default)]
    pub reverse: bool,

    #[serde(default)]
    pub count: bool,

    #[serde(default)]
    pub list: bool,

    #[serde(default)]
    pub upsert: bool,

    #[serde(default)]
    pub lang: bool,
}

impl PredicateSchema {
    /// Unindexed scalar predicate
    pub fn new(value_type: TypeId) -> Self {
        Self {
            value_type,
            tokenizers: Vec::new(),
            reverse: false,
            count: false,
            list: false,
            upsert: false,
            lang: false,
        }
    }

    /// Index with the given tokenizers
    pub fn indexed<I, S>(mut self, tokenizers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokenizers = tokenizers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn with_count(mut self) -> Self {
        self.count = true;
        self
    }

    pub fn with_list(mut self) -> Self {
        self.list = true;
        self
    }

    pub fn with_upsert(mut self) -> Self {
        self.upsert = true;
        self
    }

    pub fn with_lang(mut self) -> Self {
        self.lang = true;
        self
    }

    /// Check if the predicate is indexed
    pub fn is_indexed(&self) -> bool {
        !self.tokenizers.is_empty()
    }
}

/// In-memory catalog
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    entries: RwLock<BTreeMap<String, PredicateSchema>>,
}

impl MemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or replace the schema of `predicate`
    pub fn define(&self, predicate: impl Into<String>, schema: PredicateSchema) {
        self.write().insert(predicate.into(), schema);
    }

    /// Remove the schema of `predicate`
    pub fn remove(&self, predicate: &str) -> Option<PredicateSchema> {
        self.write().remove(predicate)
    }

    /// Get a copy of the stored schema
    pub fn get(&self, predicate: &str) -> Option<PredicateSchema> {
        self.read().get(predicate).cloned()
    }

    /// Number of defined predicates
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if no predicate is defined
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn flag(&self, predicate: &str, read: impl Fn(&PredicateSchema) -> bool) -> bool {
        self.read().get(predicate).map(read).unwrap_or(false)
    }

    // Entries are replaced whole, so a poisoned map is still consistent
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, PredicateSchema>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, PredicateSchema>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SchemaCatalog for MemoryCatalog {
    fn predicates(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    fn type_of(&self, predicate: &str) -> Option<TypeId> {
        self.read().get(predicate).map(|s| s.value_type)
    }

    fn is_indexed(&self, predicate: &str) -> bool {
        self.flag(predicate, PredicateSchema::is_indexed)
    }

    fn tokenizer_names(&self, predicate: &str) -> Vec<String> {
        self.get(predicate).map(|s| s.tokenizers).unwrap_or_default()
    }

    fn is_reversed(&self, predicate: &str) -> bool {
        self.flag(predicate, |s| s.reverse)
    }

    fn has_count(&self, predicate: &str) -> bool {
        self.flag(predicate, |s| s.count)
    }

    fn is_list(&self, predicate: &str) -> bool {
        self.flag(predicate, |s| s.list)
    }

    fn has_upsert(&self, predicate: &str) -> bool {
        self.flag(predicate, |s| s.upsert)
    }

    fn has_lang(&self, predicate: &str) -> bool {
        self.flag(predicate, |s| s.lang)
    }
}
