//! Validation core of a SCIM 2.0 identity-provisioning server.
//!
//! This crate implements the protocol's filter/value-path mini-language,
//! attribute-path resolution over core and extension schemas, the PATCH
//! operation validation pipeline, and whole-resource extension
//! validation. Transport, persistence, and authentication live in the
//! surrounding application; schemas and resource-type bindings arrive
//! through the read-only [`schema::SchemaStore`] and
//! [`schema::ResourceTypeStore`] contracts.

pub mod error;
pub mod filter;
pub mod patch;
pub mod resource;
pub mod schema;

pub use error::ScimError;
pub use filter::{parse_filter, AttrPath, CompareOp, FilterExpr, FilterValue};
pub use patch::{PatchOpKind, PatchOperation, PatchRequest, PatchValidator};
pub use resource::{ResourceValidator, ValidationMode};
pub use schema::{
    Attribute, AttributeType, Mutability, Schema, SchemaDirectory, SchemaStore,
};
