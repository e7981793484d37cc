//! Whole-document validation of a resource's extension attributes.
//!
//! Applied on create and replace: every populated extension-schema block
//! is walked against its schema's attribute tree with the same
//! type/canonical/required rules the PATCH pipeline uses for one path.

use log::debug;
use serde_json::{Map, Value as JsonValue};

use crate::error::ScimError;
use crate::schema::directory::{is_custom_schema, SchemaDirectory};
use crate::schema::types::{Mutability, Schema};
use crate::schema::value_validator::validate_value;

/// Whether the document arrives on create or on replace. Replace
/// additionally rejects populated immutable attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    Create,
    Replace,
}

/// Validates entire resource payloads against their extension schemas.
pub struct ResourceValidator {
    directory: SchemaDirectory,
}

impl ResourceValidator {
    pub fn new(directory: SchemaDirectory) -> Self {
        Self { directory }
    }

    /// Walk every populated extension attribute of `resource`, stopping at
    /// the first violation.
    pub fn validate(&self, resource: &JsonValue, mode: ValidationMode) -> Result<(), ScimError> {
        let object = resource.as_object().ok_or_else(|| {
            ScimError::InvalidSyntax("resource must be a JSON object".to_string())
        })?;

        self.check_declared_schemas(object)?;

        for (key, value) in object {
            if !is_custom_schema(key) {
                continue;
            }
            let schema = self.directory.schema(key)?.ok_or_else(|| {
                ScimError::invalid_value(format!("extension schema '{key}' is not registered"))
            })?;
            let block = value.as_object().ok_or_else(|| {
                ScimError::invalid_value(format!("extension '{key}' expects an object value"))
            })?;
            debug!("Validating extension block '{key}'");
            self.validate_extension_block(&schema, block, mode)?;
        }
        Ok(())
    }

    /// Every URN listed in the document's `schemas` array must be known.
    fn check_declared_schemas(&self, object: &Map<String, JsonValue>) -> Result<(), ScimError> {
        let Some(declared) = object.get("schemas") else {
            return Ok(());
        };
        let list = declared.as_array().ok_or_else(|| {
            ScimError::invalid_value("'schemas' must be an array of URNs".to_string())
        })?;
        for entry in list {
            let urn = entry.as_str().ok_or_else(|| {
                ScimError::invalid_value("'schemas' entries must be strings".to_string())
            })?;
            if self.directory.schema(urn)?.is_none() {
                return Err(ScimError::invalid_value(format!(
                    "declared schema '{urn}' is unknown"
                )));
            }
        }
        Ok(())
    }

    fn validate_extension_block(
        &self,
        schema: &Schema,
        block: &Map<String, JsonValue>,
        mode: ValidationMode,
    ) -> Result<(), ScimError> {
        for (name, value) in block {
            let attr = schema.attribute(name).ok_or_else(|| {
                ScimError::invalid_value(format!(
                    "attribute '{name}' does not exist in '{}'",
                    schema.id
                ))
            })?;
            if mode == ValidationMode::Replace
                && attr.mutability == Mutability::Immutable
                && !value.is_null()
            {
                return Err(ScimError::Mutability(format!(
                    "immutable attribute '{name}' cannot be replaced"
                )));
            }
            validate_value(attr, value)?;
        }

        for attr in &schema.attributes {
            if attr.required {
                let present = block
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(&attr.name))
                    .map(|(_, v)| !v.is_null())
                    .unwrap_or(false);
                if !present {
                    return Err(ScimError::invalid_value(format!(
                        "required attribute '{}' is missing from '{}'",
                        attr.name, schema.id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::store::InMemorySchemaStore;
    use crate::schema::types::{Attribute, AttributeType};
    use serde_json::json;
    use std::sync::Arc;

    const BADGE_URN: &str = "urn:ietf:params:scim:schemas:extension:acme:2.0:Badge";

    fn validator() -> ResourceValidator {
        let mut store = InMemorySchemaStore::new();
        store.register(
            Schema::new(BADGE_URN, "Badge", "Badge extension").with_attributes(vec![
                Attribute::new("badgeId", AttributeType::String).with_required(true),
                Attribute::new("color", AttributeType::String)
                    .with_canonical_values(["red", "blue"]),
                Attribute::new("serial", AttributeType::String)
                    .with_mutability(Mutability::Immutable),
                Attribute::new("history", AttributeType::Complex)
                    .with_multi_valued(true)
                    .with_sub_attributes(vec![
                        Attribute::new("issued", AttributeType::DateTime).with_required(true),
                        Attribute::new("issuer", AttributeType::String),
                    ]),
            ]),
        );
        ResourceValidator::new(SchemaDirectory::new(Arc::new(store)))
    }

    fn user_with_badge(badge: JsonValue) -> JsonValue {
        json!({
            "schemas": [
                "urn:ietf:params:scim:schemas:core:2.0:User",
                BADGE_URN
            ],
            "userName": "alice",
            BADGE_URN: badge
        })
    }

    #[test]
    fn valid_extension_block_passes() {
        let resource = user_with_badge(json!({
            "badgeId": "b-1",
            "color": "red",
            "history": [{ "issued": "2024-05-01T12:00:00Z", "issuer": "hr" }]
        }));
        assert!(validator()
            .validate(&resource, ValidationMode::Create)
            .is_ok());
    }

    #[test]
    fn unknown_declared_schema_is_rejected() {
        let resource = json!({
            "schemas": ["urn:example:unknown"],
            "userName": "alice"
        });
        assert!(matches!(
            validator().validate(&resource, ValidationMode::Create),
            Err(ScimError::InvalidValue(_))
        ));
    }

    #[test]
    fn missing_required_extension_attribute_fails() {
        let resource = user_with_badge(json!({ "color": "red" }));
        let err = validator()
            .validate(&resource, ValidationMode::Create)
            .unwrap_err();
        assert!(err.to_string().contains("badgeId"));
    }

    #[test]
    fn non_canonical_value_fails() {
        let resource = user_with_badge(json!({ "badgeId": "b-1", "color": "green" }));
        assert!(matches!(
            validator().validate(&resource, ValidationMode::Create),
            Err(ScimError::InvalidValue(_))
        ));
    }

    #[test]
    fn required_sub_attribute_checked_recursively() {
        let resource = user_with_badge(json!({
            "badgeId": "b-1",
            "history": [{ "issuer": "hr" }]
        }));
        let err = validator()
            .validate(&resource, ValidationMode::Create)
            .unwrap_err();
        assert!(err.to_string().contains("history.issued"));
    }

    #[test]
    fn immutable_attribute_allowed_on_create_rejected_on_replace() {
        let resource = user_with_badge(json!({ "badgeId": "b-1", "serial": "s-9" }));
        assert!(validator()
            .validate(&resource, ValidationMode::Create)
            .is_ok());
        assert!(matches!(
            validator().validate(&resource, ValidationMode::Replace),
            Err(ScimError::Mutability(_))
        ));
    }

    #[test]
    fn unregistered_extension_block_fails() {
        let resource = json!({
            "userName": "alice",
            "urn:ietf:params:scim:schemas:extension:other:2.0:Thing": { "x": 1 }
        });
        assert!(matches!(
            validator().validate(&resource, ValidationMode::Create),
            Err(ScimError::InvalidValue(_))
        ));
    }
}
