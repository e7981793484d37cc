//! Schema directory: resolves schema URNs and attribute notation strings
//! against the core table and the custom-schema store.

use std::sync::Arc;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ScimError;
use crate::schema::core_schemas::{core_schemas, EXTENSION_SCHEMA_URN_PREFIX};
use crate::schema::store::SchemaStore;
use crate::schema::types::{split_path, Attribute, Schema};

static URN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^urn:[A-Za-z0-9][A-Za-z0-9-]{0,31}:[A-Za-z0-9()+,\-.:=@;$_!*'%/?#]+$")
        .expect("URN pattern compiles")
});

/// Whether `id` names one of the statically bundled core schemas.
pub fn is_core_schema(id: &str) -> bool {
    core_schemas().contains_key(id)
}

/// Whether `id` carries the reserved extension-schema URN prefix.
pub fn is_custom_schema(id: &str) -> bool {
    id.starts_with(EXTENSION_SCHEMA_URN_PREFIX)
}

/// Lexical URN shape check used where identifiers arrive from the wire.
pub fn is_valid_urn(value: &str) -> bool {
    URN_PATTERN.is_match(value)
}

/// Read-only view over core and custom schemas.
#[derive(Clone)]
pub struct SchemaDirectory {
    store: Arc<dyn SchemaStore>,
}

impl SchemaDirectory {
    pub fn new(store: Arc<dyn SchemaStore>) -> Self {
        Self { store }
    }

    /// Resolve a schema by URN: core table first, then the custom store.
    pub fn schema(&self, id: &str) -> Result<Option<Schema>, ScimError> {
        if let Some(schema) = core_schemas().get(id) {
            return Ok(Some(schema.clone()));
        }
        if is_custom_schema(id) {
            return self.store.get_schema(id);
        }
        Ok(None)
    }

    /// Resolve a fully qualified notation string to its leaf attribute.
    pub fn attribute(&self, full_path: &str) -> Result<Option<Attribute>, ScimError> {
        Ok(self
            .resolve_path(full_path)?
            .and_then(|chain| chain.into_iter().last()))
    }

    /// Resolve a fully qualified notation string to the whole attribute
    /// chain, root first. Returns `None` if the schema is unknown, any
    /// segment fails to match, or a non-leaf segment is not complex.
    pub fn resolve_path(&self, full_path: &str) -> Result<Option<Vec<Attribute>>, ScimError> {
        let (schema_id, attr_part) = split_path(full_path);
        let Some(schema_id) = schema_id else {
            debug!("Path '{full_path}' carries no schema URN");
            return Ok(None);
        };
        let Some(schema) = self.schema(schema_id)? else {
            debug!("Unknown schema '{schema_id}' in path '{full_path}'");
            return Ok(None);
        };

        let mut segments = attr_part.split('.');
        let first = match segments.next() {
            Some(name) if !name.is_empty() => name,
            _ => return Ok(None),
        };
        let Some(root) = schema.attribute(first) else {
            debug!("Schema '{schema_id}' has no attribute '{first}'");
            return Ok(None);
        };

        let mut chain = vec![root.clone()];
        for segment in segments {
            let current = chain.last().filter(|attr| attr.is_complex());
            let Some(next) = current.and_then(|attr| attr.sub_attribute(segment)) else {
                debug!("Segment '{segment}' does not resolve under '{full_path}'");
                return Ok(None);
            };
            let next = next.clone();
            chain.push(next);
        }
        Ok(Some(chain))
    }
}
