//! Bundled core schema definitions.
//!
//! The core table is built exactly once on first access and never mutated
//! afterward; concurrent first readers all observe the fully built table.

use std::collections::HashMap;

use log::info;
use once_cell::sync::Lazy;

use super::types::{Attribute, AttributeType, Mutability, Schema};

/// URN of the core User schema.
pub const USER_SCHEMA_URN: &str = "urn:ietf:params:scim:schemas:core:2.0:User";
/// URN of the core Group schema.
pub const GROUP_SCHEMA_URN: &str = "urn:ietf:params:scim:schemas:core:2.0:Group";
/// Reserved URN prefix identifying extension (custom) schemas.
pub const EXTENSION_SCHEMA_URN_PREFIX: &str = "urn:ietf:params:scim:schemas:extension:";
/// URN carried by every PATCH request body.
pub const PATCH_OP_MESSAGE_URN: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";

static CORE_SCHEMAS: Lazy<HashMap<String, Schema>> = Lazy::new(build_core_schemas);

/// The immutable core-schema table.
pub fn core_schemas() -> &'static HashMap<String, Schema> {
    &CORE_SCHEMAS
}

fn build_core_schemas() -> HashMap<String, Schema> {
    let mut table = HashMap::new();
    for schema in [user_schema(), group_schema()] {
        table.insert(schema.id.clone(), schema);
    }
    info!("Core schema table built with {} schemas", table.len());
    table
}

fn string_attr(name: &str) -> Attribute {
    Attribute::new(name, AttributeType::String)
}

/// Sub-attributes shared by the simple multi-valued attributes
/// (emails, phoneNumbers, addresses reuse a subset of these).
fn typed_value_sub_attributes(canonical_types: &[&str]) -> Vec<Attribute> {
    vec![
        string_attr("value"),
        string_attr("display"),
        string_attr("type").with_canonical_values(canonical_types.iter().copied()),
        Attribute::new("primary", AttributeType::Boolean),
    ]
}

fn user_schema() -> Schema {
    Schema::new(USER_SCHEMA_URN, "User", "User Account").with_attributes(vec![
        string_attr("id")
            .with_case_exact(true)
            .with_mutability(Mutability::ReadOnly),
        string_attr("externalId").with_case_exact(true),
        string_attr("userName").with_required(true),
        Attribute::new("name", AttributeType::Complex).with_sub_attributes(vec![
            string_attr("formatted"),
            string_attr("familyName"),
            // givenName is mandatory in this deployment's bundled dataset
            string_attr("givenName").with_required(true),
            string_attr("middleName"),
            string_attr("honorificPrefix"),
            string_attr("honorificSuffix"),
        ]),
        string_attr("displayName"),
        string_attr("nickName"),
        Attribute::new("profileUrl", AttributeType::Reference).with_reference_types(["external"]),
        string_attr("title"),
        string_attr("userType"),
        string_attr("preferredLanguage"),
        string_attr("locale"),
        string_attr("timezone"),
        Attribute::new("active", AttributeType::Boolean),
        string_attr("password").with_mutability(Mutability::WriteOnly),
        Attribute::new("emails", AttributeType::Complex)
            .with_multi_valued(true)
            .with_sub_attributes(typed_value_sub_attributes(&["work", "home", "other"])),
        Attribute::new("phoneNumbers", AttributeType::Complex)
            .with_multi_valued(true)
            .with_sub_attributes(typed_value_sub_attributes(&[
                "work", "home", "mobile", "fax", "pager", "other",
            ])),
        Attribute::new("addresses", AttributeType::Complex)
            .with_multi_valued(true)
            .with_sub_attributes(vec![
                string_attr("formatted"),
                string_attr("streetAddress"),
                string_attr("locality"),
                string_attr("region"),
                string_attr("postalCode"),
                string_attr("country"),
                string_attr("type").with_canonical_values(["work", "home", "other"]),
            ]),
        Attribute::new("groups", AttributeType::Complex)
            .with_multi_valued(true)
            .with_mutability(Mutability::ReadOnly)
            .with_sub_attributes(vec![
                string_attr("value").with_mutability(Mutability::ReadOnly),
                Attribute::new("$ref", AttributeType::Reference)
                    .with_mutability(Mutability::ReadOnly)
                    .with_reference_types(["User", "Group"]),
                string_attr("display").with_mutability(Mutability::ReadOnly),
                string_attr("type")
                    .with_mutability(Mutability::ReadOnly)
                    .with_canonical_values(["direct", "indirect"]),
            ]),
        Attribute::new("x509Certificates", AttributeType::Complex)
            .with_multi_valued(true)
            .with_sub_attributes(vec![Attribute::new("value", AttributeType::Binary)]),
    ])
}

fn group_schema() -> Schema {
    Schema::new(GROUP_SCHEMA_URN, "Group", "Group").with_attributes(vec![
        string_attr("id")
            .with_case_exact(true)
            .with_mutability(Mutability::ReadOnly),
        string_attr("externalId").with_case_exact(true),
        string_attr("displayName").with_required(true),
        Attribute::new("members", AttributeType::Complex)
            .with_multi_valued(true)
            .with_sub_attributes(vec![
                string_attr("value").with_mutability(Mutability::Immutable),
                Attribute::new("$ref", AttributeType::Reference)
                    .with_mutability(Mutability::Immutable)
                    .with_reference_types(["User", "Group"]),
                string_attr("type")
                    .with_mutability(Mutability::Immutable)
                    .with_canonical_values(["User", "Group"]),
                string_attr("display"),
            ]),
    ])
}
