pub mod core_schemas;
pub mod directory;
pub mod store;
pub mod types;
pub mod value_validator;

pub use core_schemas::{
    core_schemas, EXTENSION_SCHEMA_URN_PREFIX, GROUP_SCHEMA_URN, PATCH_OP_MESSAGE_URN,
    USER_SCHEMA_URN,
};
pub use directory::{is_core_schema, is_custom_schema, is_valid_urn, SchemaDirectory};
pub use store::{
    InMemoryResourceTypeStore, InMemorySchemaStore, ResourceTypeStore, SchemaStore,
};
pub use types::{qualify, split_path, AttrPath, Attribute, AttributeType, Mutability, Schema};
