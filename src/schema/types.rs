//! Schema request and result types
//!
//! These are the wire types of the worker `Schema` call. Empty collections
//! and false flags are omitted when serialized.

use serde::{Deserialize, Serialize};

use crate::cluster::{GroupId, UNROUTED_GROUP};

/// Projectable schema fields, in default output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SchemaField {
    Type,
    Index,
    Tokenizer,
    Reverse,
    Count,
    List,
    Upsert,
    Lang,
}

impl SchemaField {
    /// Field set used when a request names no fields
    pub const DEFAULT: [SchemaField; 8] = [
        SchemaField::Type,
        SchemaField::Index,
        SchemaField::Tokenizer,
        SchemaField::Reverse,
        SchemaField::Count,
        SchemaField::List,
        SchemaField::Upsert,
        SchemaField::Lang,
    ];

    /// Parse a field name. Unknown names return `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "type" => Some(SchemaField::Type),
            "index" => Some(SchemaField::Index),
            "tokenizer" => Some(SchemaField::Tokenizer),
            "reverse" => Some(SchemaField::Reverse),
            "count" => Some(SchemaField::Count),
            "list" => Some(SchemaField::List),
            "upsert" => Some(SchemaField::Upsert),
            "lang" => Some(SchemaField::Lang),
            _ => None,
        }
    }

    /// Returns the wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaField::Type => "type",
            SchemaField::Index => "index",
            SchemaField::Tokenizer => "tokenizer",
            SchemaField::Reverse => "reverse",
            SchemaField::Count => "count",
            SchemaField::List => "list",
            SchemaField::Upsert => "upsert",
            SchemaField::Lang => "lang",
        }
    }

    /// Resolve requested field names to the fields to project.
    ///
    /// An empty list means the default set. Unknown names are dropped, so a
    /// list of only unknown names projects nothing but the predicate name.
    pub fn resolve(names: &[String]) -> Vec<SchemaField> {
        if names.is_empty() {
            return Self::DEFAULT.to_vec();
        }
        names.iter().filter_map(|name| Self::parse(name)).collect()
    }
}

/// A request to describe predicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRequest {
    /// Group this request is scoped to; `UNROUTED_GROUP` before partitioning
    #[serde(default)]
    pub group_id: GroupId,

    /// Predicates to describe; empty means all
    #[serde(default)]
    pub predicates: Vec<String>,

    /// Fields to project; empty means the default set
    #[serde(default)]
    pub fields: Vec<String>,
}

impl SchemaRequest {
    /// Describe every predicate with the default fields
    pub fn all() -> Self {
        Self::default()
    }

    /// Describe the named predicates
    pub fn for_predicates<I, S>(predicates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group_id: UNROUTED_GROUP,
            predicates: predicates.into_iter().map(Into::into).collect(),
            fields: Vec::new(),
        }
    }

    /// Empty sub-request scoped to one group
    pub fn for_group(group_id: GroupId, fields: Vec<String>) -> Self {
        Self {
            group_id,
            predicates: Vec::new(),
            fields,
        }
    }

    /// Set the fields to project
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Check if this request asks for every predicate
    pub fn is_all(&self) -> bool {
        self.predicates.is_empty()
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Projection of one predicate's schema
///
/// Only requested fields are populated; the rest keep their zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaNode {
    pub predicate: String,

    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub type_name: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub index: bool,

    /// Populated only for indexed predicates
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokenizer: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub reverse: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub count: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub list: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub upsert: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub lang: bool,
}

impl SchemaNode {
    /// A node carrying only the predicate name
    pub fn named(predicate: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
            ..Default::default()
        }
    }
}

/// Nodes produced for one group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaResult {
    #[serde(default)]
    pub schema: Vec<SchemaNode>,
}

impl SchemaResult {
    /// Create a result from nodes
    pub fn new(schema: Vec<SchemaNode>) -> Self {
        Self { schema }
    }
}
