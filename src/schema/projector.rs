//! Local schema projection
//!
//! Builds schema nodes for the predicates this node serves. Never fails:
//! predicates whose tablet lives elsewhere, or that have no schema yet, are
//! left out of the result.

use std::sync::Arc;

use super::catalog::SchemaCatalog;
use super::types::{SchemaField, SchemaNode, SchemaRequest, SchemaResult};
use crate::cluster::TopologyOracle;
use crate::observability::{log_event, Event};

/// Projects catalog metadata for locally served predicates
pub struct LocalProjector {
    catalog: Arc<dyn SchemaCatalog>,
    topology: Arc<dyn TopologyOracle>,
}

impl LocalProjector {
    /// Create a projector over a catalog and topology
    pub fn new(catalog: Arc<dyn SchemaCatalog>, topology: Arc<dyn TopologyOracle>) -> Self {
        Self { catalog, topology }
    }

    /// Project the predicates and fields of a sub-request
    pub fn project_request(&self, request: &SchemaRequest) -> SchemaResult {
        self.project(&request.predicates, &request.fields)
    }

    /// Project `predicates` (all catalog predicates if empty) with `fields`
    /// (the default set if empty).
    pub fn project(&self, predicates: &[String], fields: &[String]) -> SchemaResult {
        let fields = SchemaField::resolve(fields);
        let candidates = if predicates.is_empty() {
            self.catalog.predicates()
        } else {
            predicates.to_vec()
        };

        let mut schema = Vec::with_capacity(candidates.len());
        for predicate in &candidates {
            // Schema state outlives a tablet move, so the catalog can still
            // know predicates another group now answers for.
            if !self.topology.serves_tablet(predicate) {
                log_event(Event::TabletNotServed, &[("predicate", predicate.as_str())]);
                continue;
            }
            if let Some(node) = self.populate(predicate, &fields) {
                schema.push(node);
            }
        }

        let count = schema.len().to_string();
        log_event(Event::ProjectComplete, &[("nodes", count.as_str())]);
        SchemaResult::new(schema)
    }

    fn populate(&self, predicate: &str, fields: &[SchemaField]) -> Option<SchemaNode> {
        let value_type = self.catalog.type_of(predicate)?;

        let mut node = SchemaNode::named(predicate);
        for field in fields {
            match field {
                SchemaField::Type => node.type_name = value_type.name().to_string(),
                SchemaField::Index => node.index = self.catalog.is_indexed(predicate),
                SchemaField::Tokenizer => {
                    if self.catalog.is_indexed(predicate) {
                        node.tokenizer = self.catalog.tokenizer_names(predicate);
                    }
                }
                SchemaField::Reverse => node.reverse = self.catalog.is_reversed(predicate),
                SchemaField::Count => node.count = self.catalog.has_count(predicate),
                SchemaField::List => node.list = self.catalog.is_list(predicate),
                SchemaField::Upsert => node.upsert = self.catalog.has_upsert(predicate),
                SchemaField::Lang => node.lang = self.catalog.has_lang(predicate),
            }
        }
        Some(node)
    }
}
