//! Ordered validation pipeline for PATCH request bodies.
//!
//! Body-level checks run first, then each operation passes through a
//! fixed sequence of independent validators. Every stage fails fast with
//! a typed error; no partial-success state is retained.

use std::sync::Arc;

use log::debug;
use serde_json::Value as JsonValue;

use crate::error::ScimError;
use crate::filter::{
    check_value_path_restrictions, expect_value_path, parse_filter, visitors,
};
use crate::patch::types::{PatchOpKind, PatchOperation, PatchRequest};
use crate::schema::core_schemas::{GROUP_SCHEMA_URN, PATCH_OP_MESSAGE_URN, USER_SCHEMA_URN};
use crate::schema::directory::{is_custom_schema, SchemaDirectory};
use crate::schema::store::ResourceTypeStore;
use crate::schema::types::{qualify, split_path, Attribute};
use crate::schema::value_validator::validate_value;

/// Validates PATCH bodies against one resource kind's schema set.
///
/// Constructed per target resource kind because the core schema id and
/// the set of schemas eligible for paths differ between users and groups.
pub struct PatchValidator {
    directory: SchemaDirectory,
    resource_types: Arc<dyn ResourceTypeStore>,
    resource_type: String,
    core_schema_id: String,
}

impl PatchValidator {
    pub fn new(
        directory: SchemaDirectory,
        resource_types: Arc<dyn ResourceTypeStore>,
        resource_type: &str,
        core_schema_id: &str,
    ) -> Self {
        Self {
            directory,
            resource_types,
            resource_type: resource_type.to_string(),
            core_schema_id: core_schema_id.to_string(),
        }
    }

    pub fn for_users(
        directory: SchemaDirectory,
        resource_types: Arc<dyn ResourceTypeStore>,
    ) -> Self {
        Self::new(directory, resource_types, "User", USER_SCHEMA_URN)
    }

    pub fn for_groups(
        directory: SchemaDirectory,
        resource_types: Arc<dyn ResourceTypeStore>,
    ) -> Self {
        Self::new(directory, resource_types, "Group", GROUP_SCHEMA_URN)
    }

    /// Validate a whole PATCH body: the body-level checks, then every
    /// operation in order. The first failure aborts the walk.
    pub fn validate(&self, body: &PatchRequest) -> Result<(), ScimError> {
        if !body.schemas.iter().any(|s| s == PATCH_OP_MESSAGE_URN) {
            return Err(ScimError::InvalidSyntax(format!(
                "PATCH body must list the '{PATCH_OP_MESSAGE_URN}' schema"
            )));
        }
        if body.operations.is_empty() {
            return Err(ScimError::invalid_value(
                "PATCH body carries no operations",
            ));
        }
        for operation in &body.operations {
            self.validate_operation(operation)?;
        }
        Ok(())
    }

    /// Run one operation through the fixed validator sequence.
    pub fn validate_operation(&self, operation: &PatchOperation) -> Result<(), ScimError> {
        // 1. operation type
        let kind = operation.kind().ok_or_else(|| {
            ScimError::invalid_value(format!(
                "unknown PATCH operation type '{}'",
                operation.op
            ))
        })?;

        // 2. path mandatory for remove
        let path = operation.trimmed_path();
        if kind == PatchOpKind::Remove && path.is_none() {
            return Err(ScimError::NoTarget(
                "remove operation requires a path".to_string(),
            ));
        }

        // 3. value mandatory for add/replace
        if kind != PatchOpKind::Remove && operation.value.is_none() {
            return Err(ScimError::InvalidSyntax(format!(
                "{} operation requires a value",
                operation.op.to_ascii_lowercase()
            )));
        }

        // 4. path resolution
        let target = match path {
            Some(path) => self.resolve_target(path, kind)?,
            None => None,
        };

        // 5. mutability
        if let Some(attr) = &target {
            check_mutability(attr, kind)?;
        }

        // 6. value shape
        if kind != PatchOpKind::Remove {
            match (&target, &operation.value) {
                (Some(attr), Some(value)) => validate_value(attr, value)?,
                (None, Some(value)) => self.validate_pathless_value(value, kind)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Resolve an operation path to its target attribute. A remove path
    /// naming a whole schema URN targets the entire block and yields no
    /// attribute; bracketed paths go through the value-path visitors and
    /// plain paths through schema and attribute existence checks.
    fn resolve_target(
        &self,
        path: &str,
        kind: PatchOpKind,
    ) -> Result<Option<Attribute>, ScimError> {
        if kind == PatchOpKind::Remove && self.directory.schema(path)?.is_some() {
            self.check_schema_eligible(path, path)?;
            self.check_schema_removable(path)?;
            return Ok(None);
        }
        if path.contains('[') {
            self.resolve_value_path_target(path).map(Some)
        } else {
            self.resolve_plain_target(path, kind).map(Some)
        }
    }

    fn resolve_plain_target(&self, path: &str, kind: PatchOpKind) -> Result<Attribute, ScimError> {
        let qualified = qualify(path, &self.core_schema_id);
        let (schema_id, _) = split_path(&qualified);
        let schema_id = schema_id
            .ok_or_else(|| ScimError::invalid_path(format!("'{path}' is not a valid path")))?;
        self.check_schema_eligible(schema_id, path)?;

        let chain = self
            .directory
            .resolve_path(&qualified)?
            .ok_or_else(|| {
                ScimError::invalid_path(format!("attribute '{path}' does not exist"))
            })?;
        let target = chain
            .last()
            .cloned()
            .ok_or_else(|| ScimError::invalid_path(format!("attribute '{path}' does not exist")))?;

        if kind == PatchOpKind::Remove {
            self.check_removable(&target, schema_id, path)?;
        }
        Ok(target)
    }

    fn resolve_value_path_target(&self, path: &str) -> Result<Attribute, ScimError> {
        let expr = parse_filter(path)
            .map_err(|e| ScimError::invalid_path(format!("'{path}' is not a valid path: {e}")))?;
        let (attr_path, inner) = expect_value_path(&expr)?;
        check_value_path_restrictions(inner)?;

        let qualified = attr_path.qualified(&self.core_schema_id);
        let (schema_id, _) = split_path(&qualified);
        if let Some(schema_id) = schema_id {
            self.check_schema_eligible(schema_id, path)?;
        }
        let chain = self
            .directory
            .resolve_path(&qualified)?
            .ok_or_else(|| {
                ScimError::invalid_path(format!("attribute '{attr_path}' does not exist"))
            })?;
        let parent = chain
            .last()
            .cloned()
            .ok_or_else(|| ScimError::invalid_path(format!("attribute '{attr_path}' does not exist")))?;

        if !parent.multi_valued || !parent.is_complex() {
            return Err(ScimError::invalid_path(format!(
                "value filter applied to '{attr_path}', which is not a multi-valued complex attribute"
            )));
        }
        visitors::check_sub_attributes(inner, &parent)?;

        // The operation addresses matched elements, so the target is the
        // single-valued element view of the bracketed attribute.
        Ok(parent.singular())
    }

    fn check_schema_eligible(&self, schema_id: &str, path: &str) -> Result<(), ScimError> {
        if schema_id == self.core_schema_id || is_custom_schema(schema_id) {
            Ok(())
        } else {
            debug!(
                "Schema '{schema_id}' is not eligible for {} paths",
                self.resource_type
            );
            Err(ScimError::invalid_path(format!(
                "schema in path '{path}' is not eligible for {} resources",
                self.resource_type
            )))
        }
    }

    /// Removing an entire schema block is rejected for the core schema
    /// and for extension schemas the resource type requires.
    fn check_schema_removable(&self, schema_id: &str) -> Result<(), ScimError> {
        if schema_id == self.core_schema_id {
            return Err(ScimError::Mutability(format!(
                "cannot remove the core schema '{schema_id}'"
            )));
        }
        let required = self.resource_types.required_extensions(&self.resource_type)?;
        if required.iter().any(|id| id == schema_id) {
            return Err(ScimError::Mutability(format!(
                "cannot remove required extension schema '{schema_id}'"
            )));
        }
        Ok(())
    }

    /// Remove is rejected for attributes the schema marks required, and
    /// for attributes of an extension schema the resource type requires.
    fn check_removable(
        &self,
        target: &Attribute,
        schema_id: &str,
        path: &str,
    ) -> Result<(), ScimError> {
        if !target.required {
            return Ok(());
        }
        if is_custom_schema(schema_id) {
            let required = self.resource_types.required_extensions(&self.resource_type)?;
            if required.iter().any(|id| id == schema_id) {
                return Err(ScimError::Mutability(format!(
                    "cannot remove attribute '{path}' of required extension schema '{schema_id}'"
                )));
            }
        }
        Err(ScimError::Mutability(format!(
            "cannot remove required attribute '{path}'"
        )))
    }

    /// A pathless add/replace value is an object whose keys are attribute
    /// names of the core schema or extension schema URNs; every entry is
    /// resolved and validated as though it were its own operation.
    fn validate_pathless_value(
        &self,
        value: &JsonValue,
        kind: PatchOpKind,
    ) -> Result<(), ScimError> {
        let object = value.as_object().ok_or_else(|| {
            ScimError::InvalidSyntax(
                "a pathless operation requires an object value".to_string(),
            )
        })?;

        for (name, entry) in object {
            if name.eq_ignore_ascii_case("schemas") {
                continue;
            }
            if is_custom_schema(name) {
                let schema = self.directory.schema(name)?.ok_or_else(|| {
                    ScimError::invalid_path(format!("unknown extension schema '{name}'"))
                })?;
                let block = entry.as_object().ok_or_else(|| {
                    ScimError::invalid_value(format!(
                        "extension '{name}' expects an object value"
                    ))
                })?;
                for (attr_name, attr_value) in block {
                    let attr = schema.attribute(attr_name).ok_or_else(|| {
                        ScimError::invalid_path(format!(
                            "attribute '{attr_name}' does not exist in '{name}'"
                        ))
                    })?;
                    check_mutability(attr, kind)?;
                    validate_value(attr, attr_value)?;
                }
            } else {
                let attr = self.resolve_plain_target(name, kind)?;
                check_mutability(&attr, kind)?;
                validate_value(&attr, entry)?;
            }
        }
        Ok(())
    }
}

/// `readOnly` attributes reject all non-remove operations; `immutable`
/// attributes additionally reject replace, surfaced as `Uniqueness` to
/// preserve the legacy kind mapping.
fn check_mutability(attr: &Attribute, kind: PatchOpKind) -> Result<(), ScimError> {
    use crate::schema::types::Mutability;

    match attr.mutability {
        Mutability::ReadOnly if kind != PatchOpKind::Remove => Err(ScimError::Mutability(
            format!("attribute '{}' is readOnly", attr.name),
        )),
        Mutability::Immutable if kind == PatchOpKind::Replace => Err(ScimError::Uniqueness(
            format!("attribute '{}' is immutable and cannot be replaced", attr.name),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::core_schemas::USER_SCHEMA_URN;
    use crate::schema::store::{InMemoryResourceTypeStore, InMemorySchemaStore};
    use crate::schema::types::{Attribute, AttributeType, Mutability, Schema};
    use serde_json::json;

    const BADGE_URN: &str = "urn:ietf:params:scim:schemas:extension:acme:2.0:Badge";

    fn badge_schema() -> Schema {
        Schema::new(BADGE_URN, "Badge", "Badge extension").with_attributes(vec![
            Attribute::new("color", AttributeType::String)
                .with_canonical_values(["red", "blue"]),
            Attribute::new("serial", AttributeType::String)
                .with_mutability(Mutability::Immutable),
            Attribute::new("issued", AttributeType::DateTime),
            Attribute::new("badgeId", AttributeType::String).with_required(true),
        ])
    }

    fn validator() -> PatchValidator {
        let mut store = InMemorySchemaStore::new();
        store.register(badge_schema());
        let mut resource_types = InMemoryResourceTypeStore::new();
        resource_types.require("User", BADGE_URN);
        PatchValidator::for_users(
            SchemaDirectory::new(Arc::new(store)),
            Arc::new(resource_types),
        )
    }

    fn body(operations: Vec<PatchOperation>) -> PatchRequest {
        PatchRequest {
            schemas: vec![PATCH_OP_MESSAGE_URN.to_string()],
            operations,
        }
    }

    fn op(op: &str, path: Option<&str>, value: Option<serde_json::Value>) -> PatchOperation {
        PatchOperation {
            op: op.to_string(),
            path: path.map(str::to_string),
            value,
        }
    }

    #[test]
    fn body_must_carry_patch_op_urn() {
        let request = PatchRequest {
            schemas: vec!["urn:example:wrong".to_string()],
            operations: vec![op("replace", Some("title"), Some(json!("Engineer")))],
        };
        assert!(matches!(
            validator().validate(&request),
            Err(ScimError::InvalidSyntax(_))
        ));
    }

    #[test]
    fn body_must_carry_operations() {
        assert!(matches!(
            validator().validate(&body(vec![])),
            Err(ScimError::InvalidValue(_))
        ));
    }

    #[test]
    fn unknown_op_kind_is_invalid_value() {
        let request = body(vec![op("move", Some("title"), Some(json!("x")))]);
        assert!(matches!(
            validator().validate(&request),
            Err(ScimError::InvalidValue(_))
        ));
    }

    #[test]
    fn remove_without_path_is_no_target() {
        let request = body(vec![op("remove", None, None)]);
        assert!(matches!(
            validator().validate(&request),
            Err(ScimError::NoTarget(_))
        ));
    }

    #[test]
    fn add_without_value_is_invalid_syntax() {
        let request = body(vec![op("add", Some("title"), None)]);
        assert!(matches!(
            validator().validate(&request),
            Err(ScimError::InvalidSyntax(_))
        ));
    }

    #[test]
    fn replace_of_read_only_attribute_is_mutability() {
        let request = body(vec![op("replace", Some("id"), Some(json!("123")))]);
        assert!(matches!(
            validator().validate(&request),
            Err(ScimError::Mutability(_))
        ));
    }

    #[test]
    fn add_to_read_only_attribute_is_mutability() {
        let request = body(vec![op("add", Some("id"), Some(json!("123")))]);
        assert!(matches!(
            validator().validate(&request),
            Err(ScimError::Mutability(_))
        ));
    }

    #[test]
    fn replace_of_immutable_attribute_is_uniqueness() {
        let path = format!("{BADGE_URN}:serial");
        let request = body(vec![op("replace", Some(&path), Some(json!("abc")))]);
        assert!(matches!(
            validator().validate(&request),
            Err(ScimError::Uniqueness(_))
        ));
    }

    #[test]
    fn add_to_immutable_attribute_is_accepted() {
        let path = format!("{BADGE_URN}:serial");
        let request = body(vec![op("add", Some(&path), Some(json!("abc")))]);
        assert!(validator().validate(&request).is_ok());
    }

    #[test]
    fn unknown_path_is_invalid_path() {
        let request = body(vec![op("replace", Some("nope"), Some(json!("x")))]);
        assert!(matches!(
            validator().validate(&request),
            Err(ScimError::InvalidPath(_))
        ));
    }

    #[test]
    fn group_schema_not_eligible_for_user_paths() {
        let path = format!("{GROUP_SCHEMA_URN}:displayName");
        let request = body(vec![op("replace", Some(&path), Some(json!("Admins")))]);
        assert!(matches!(
            validator().validate(&request),
            Err(ScimError::InvalidPath(_))
        ));
    }

    #[test]
    fn remove_of_required_attribute_fails() {
        let request = body(vec![op("remove", Some("name.givenName"), None)]);
        assert!(matches!(
            validator().validate(&request),
            Err(ScimError::Mutability(_))
        ));
    }

    #[test]
    fn remove_of_optional_attribute_succeeds() {
        let request = body(vec![op("remove", Some("title"), None)]);
        assert!(validator().validate(&request).is_ok());
    }

    #[test]
    fn remove_of_required_extension_attribute_fails() {
        let path = format!("{BADGE_URN}:badgeId");
        let request = body(vec![op("remove", Some(&path), None)]);
        assert!(matches!(
            validator().validate(&request),
            Err(ScimError::Mutability(_))
        ));
    }

    #[test]
    fn remove_of_required_extension_schema_fails() {
        let request = body(vec![op("remove", Some(BADGE_URN), None)]);
        assert!(matches!(
            validator().validate(&request),
            Err(ScimError::Mutability(_))
        ));
    }

    #[test]
    fn remove_of_core_schema_fails() {
        let request = body(vec![op("remove", Some(USER_SCHEMA_URN), None)]);
        assert!(matches!(
            validator().validate(&request),
            Err(ScimError::Mutability(_))
        ));
    }

    #[test]
    fn remove_of_optional_extension_schema_succeeds() {
        let mut store = InMemorySchemaStore::new();
        store.register(badge_schema());
        let mut resource_types = InMemoryResourceTypeStore::new();
        resource_types.permit("User", BADGE_URN);
        let validator = PatchValidator::for_users(
            SchemaDirectory::new(Arc::new(store)),
            Arc::new(resource_types),
        );

        let request = body(vec![op("remove", Some(BADGE_URN), None)]);
        assert!(validator.validate(&request).is_ok());
    }

    #[test]
    fn value_path_target_resolves_and_validates() {
        let request = body(vec![op(
            "replace",
            Some("emails[type eq \"work\"]"),
            Some(json!({ "value": "new@example.com", "type": "work" })),
        )]);
        assert!(validator().validate(&request).is_ok());
    }

    #[test]
    fn value_path_with_forbidden_operator_is_invalid_filter() {
        let request = body(vec![op(
            "replace",
            Some("emails[value gt \"a\"]"),
            Some(json!({ "value": "x@example.com" })),
        )]);
        assert!(matches!(
            validator().validate(&request),
            Err(ScimError::InvalidFilter(_))
        ));
    }

    #[test]
    fn nested_value_path_is_rejected() {
        let request = body(vec![op(
            "replace",
            Some("emails[sub[x eq \"y\"]]"),
            Some(json!({ "value": "x@example.com" })),
        )]);
        assert!(matches!(
            validator().validate(&request),
            Err(ScimError::InvalidFilter(_))
        ));
    }

    #[test]
    fn value_path_on_single_valued_attribute_is_invalid_path() {
        let request = body(vec![op(
            "replace",
            Some("name[formatted eq \"x\"]"),
            Some(json!({ "formatted": "y" })),
        )]);
        assert!(matches!(
            validator().validate(&request),
            Err(ScimError::InvalidPath(_))
        ));
    }

    #[test]
    fn non_canonical_value_is_invalid_value() {
        let path = format!("{BADGE_URN}:color");
        let request = body(vec![op("replace", Some(&path), Some(json!("green")))]);
        assert!(matches!(
            validator().validate(&request),
            Err(ScimError::InvalidValue(_))
        ));
    }

    #[test]
    fn value_type_mismatch_is_invalid_value() {
        let request = body(vec![op("replace", Some("active"), Some(json!("yes")))]);
        assert!(matches!(
            validator().validate(&request),
            Err(ScimError::InvalidValue(_))
        ));
    }

    #[test]
    fn pathless_add_validates_each_entry() {
        let request = body(vec![op(
            "add",
            None,
            Some(json!({
                "title": "Engineer",
                "emails": [{ "value": "a@example.com", "type": "work" }]
            })),
        )]);
        assert!(validator().validate(&request).is_ok());

        let bad = body(vec![op(
            "add",
            None,
            Some(json!({ "unknownAttr": "x" })),
        )]);
        assert!(matches!(
            validator().validate(&bad),
            Err(ScimError::InvalidPath(_))
        ));
    }

    #[test]
    fn pathless_add_resolves_extension_blocks() {
        let request = body(vec![op(
            "add",
            None,
            Some(json!({
                BADGE_URN: { "color": "red", "badgeId": "b-1" }
            })),
        )]);
        assert!(validator().validate(&request).is_ok());

        let bad = body(vec![op(
            "add",
            None,
            Some(json!({ BADGE_URN: { "shape": "round" } })),
        )]);
        assert!(matches!(
            validator().validate(&bad),
            Err(ScimError::InvalidPath(_))
        ));
    }

    #[test]
    fn first_failing_operation_aborts_the_body() {
        let request = body(vec![
            op("replace", Some("title"), Some(json!("ok"))),
            op("replace", Some("id"), Some(json!("boom"))),
            op("replace", Some("nope"), Some(json!("never reached"))),
        ]);
        assert!(matches!(
            validator().validate(&request),
            Err(ScimError::Mutability(_))
        ));
    }
}
