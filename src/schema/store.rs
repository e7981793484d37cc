//! Read-only store contracts supplied by the surrounding application.
//!
//! The validation core never mutates schema state; it only reads it. The
//! in-memory implementations back tests and embedded deployments.

use std::collections::HashMap;

use crate::error::ScimError;
use crate::schema::types::Schema;

/// Source of custom (extension) schema definitions.
///
/// Lookups must be side-effect-free and idempotent within one request.
pub trait SchemaStore: Send + Sync {
    /// Fetch a custom schema by its URN.
    fn get_schema(&self, id: &str) -> Result<Option<Schema>, ScimError>;

    /// All custom schemas currently registered.
    fn get_custom_schemas(&self) -> Result<Vec<Schema>, ScimError>;

    /// Whether `name` is an acceptable schema identifier.
    fn is_valid_schema_name(&self, name: &str) -> bool;
}

/// Which extension schemas a resource type requires or permits.
pub trait ResourceTypeStore: Send + Sync {
    /// Extension schema URNs that are mandatory for the resource type.
    fn required_extensions(&self, resource_type: &str) -> Result<Vec<String>, ScimError>;

    /// Extension schema URNs that are allowed but optional.
    fn optional_extensions(&self, resource_type: &str) -> Result<Vec<String>, ScimError>;
}

/// Simple in-memory schema store keyed by URN.
#[derive(Debug, Default)]
pub struct InMemorySchemaStore {
    schemas: HashMap<String, Schema>,
}

impl InMemorySchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schemas<I>(schemas: I) -> Self
    where
        I: IntoIterator<Item = Schema>,
    {
        let mut store = Self::new();
        for schema in schemas {
            store.register(schema);
        }
        store
    }

    /// Register a schema, replacing any previous definition under its URN.
    pub fn register(&mut self, schema: Schema) {
        self.schemas.insert(schema.id.clone(), schema);
    }
}

impl SchemaStore for InMemorySchemaStore {
    fn get_schema(&self, id: &str) -> Result<Option<Schema>, ScimError> {
        Ok(self.schemas.get(id).cloned())
    }

    fn get_custom_schemas(&self) -> Result<Vec<Schema>, ScimError> {
        Ok(self.schemas.values().cloned().collect())
    }

    fn is_valid_schema_name(&self, name: &str) -> bool {
        super::directory::is_valid_urn(name)
    }
}

/// In-memory resource-type bindings keyed by resource type name.
#[derive(Debug, Default)]
pub struct InMemoryResourceTypeStore {
    required: HashMap<String, Vec<String>>,
    optional: HashMap<String, Vec<String>>,
}

impl InMemoryResourceTypeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(&mut self, resource_type: &str, schema_id: &str) {
        self.required
            .entry(resource_type.to_string())
            .or_default()
            .push(schema_id.to_string());
    }

    pub fn permit(&mut self, resource_type: &str, schema_id: &str) {
        self.optional
            .entry(resource_type.to_string())
            .or_default()
            .push(schema_id.to_string());
    }
}

impl ResourceTypeStore for InMemoryResourceTypeStore {
    fn required_extensions(&self, resource_type: &str) -> Result<Vec<String>, ScimError> {
        Ok(self.required.get(resource_type).cloned().unwrap_or_default())
    }

    fn optional_extensions(&self, resource_type: &str) -> Result<Vec<String>, ScimError> {
        Ok(self.optional.get(resource_type).cloned().unwrap_or_default())
    }
}
