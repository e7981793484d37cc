//! Attribute-value validation shared by the PATCH pipeline and the
//! whole-resource validator: declared type, canonical values, and
//! required sub-attributes, recursing through complex and multi-valued
//! attributes.

use base64::Engine as _;
use serde_json::{Map, Value as JsonValue};

use crate::error::ScimError;
use crate::schema::types::{Attribute, AttributeType};

/// Validate `value` against the attribute definition. Multi-valued
/// attributes accept an array validated element-wise; a bare element is
/// treated as a single-element array.
pub fn validate_value(attr: &Attribute, value: &JsonValue) -> Result<(), ScimError> {
    if attr.multi_valued {
        let element_view = attr.singular();
        match value {
            JsonValue::Array(items) => {
                for item in items {
                    validate_singular(&element_view, item)?;
                }
                Ok(())
            }
            other => validate_singular(&element_view, other),
        }
    } else {
        validate_singular(attr, value)
    }
}

fn validate_singular(attr: &Attribute, value: &JsonValue) -> Result<(), ScimError> {
    if value.is_null() {
        return Ok(());
    }

    match attr.data_type {
        AttributeType::String | AttributeType::Reference => {
            let text = value.as_str().ok_or_else(|| {
                ScimError::invalid_value(format!("attribute '{}' expects a string", attr.name))
            })?;
            check_canonical(attr, text)
        }
        AttributeType::Boolean => {
            if value.is_boolean() {
                Ok(())
            } else {
                Err(ScimError::invalid_value(format!(
                    "attribute '{}' expects a boolean",
                    attr.name
                )))
            }
        }
        AttributeType::Integer => {
            if value.as_i64().is_some() || value.as_u64().is_some() {
                Ok(())
            } else {
                Err(ScimError::invalid_value(format!(
                    "attribute '{}' expects an integer",
                    attr.name
                )))
            }
        }
        AttributeType::Decimal => {
            if value.is_number() {
                Ok(())
            } else {
                Err(ScimError::invalid_value(format!(
                    "attribute '{}' expects a number",
                    attr.name
                )))
            }
        }
        AttributeType::DateTime => {
            let text = value.as_str().ok_or_else(|| {
                ScimError::invalid_value(format!("attribute '{}' expects a dateTime", attr.name))
            })?;
            chrono::DateTime::parse_from_rfc3339(text).map_err(|_| {
                ScimError::invalid_value(format!(
                    "attribute '{}' expects an RFC 3339 dateTime, got '{text}'",
                    attr.name
                ))
            })?;
            Ok(())
        }
        AttributeType::Binary => {
            let text = value.as_str().ok_or_else(|| {
                ScimError::invalid_value(format!(
                    "attribute '{}' expects base64 binary data",
                    attr.name
                ))
            })?;
            base64::engine::general_purpose::STANDARD
                .decode(text)
                .map_err(|_| {
                    ScimError::invalid_value(format!(
                        "attribute '{}' holds invalid base64 data",
                        attr.name
                    ))
                })?;
            Ok(())
        }
        AttributeType::Complex => {
            let object = value.as_object().ok_or_else(|| {
                ScimError::invalid_value(format!(
                    "attribute '{}' expects a complex object",
                    attr.name
                ))
            })?;
            validate_complex(attr, object)
        }
    }
}

fn validate_complex(attr: &Attribute, object: &Map<String, JsonValue>) -> Result<(), ScimError> {
    for (name, sub_value) in object {
        let sub_attr = attr.sub_attribute(name).ok_or_else(|| {
            ScimError::invalid_value(format!(
                "'{name}' is not a sub-attribute of '{}'",
                attr.name
            ))
        })?;
        validate_value(sub_attr, sub_value)?;
    }

    for sub_attr in &attr.sub_attributes {
        if sub_attr.required {
            let present = get_ignore_case(object, &sub_attr.name)
                .map(|v| !v.is_null())
                .unwrap_or(false);
            if !present {
                return Err(ScimError::invalid_value(format!(
                    "required sub-attribute '{}.{}' is missing",
                    attr.name, sub_attr.name
                )));
            }
        }
    }
    Ok(())
}

fn check_canonical(attr: &Attribute, text: &str) -> Result<(), ScimError> {
    if attr.canonical_values.is_empty() {
        return Ok(());
    }
    let matched = attr.canonical_values.iter().any(|canonical| {
        if attr.case_exact {
            canonical == text
        } else {
            canonical.eq_ignore_ascii_case(text)
        }
    });
    if matched {
        Ok(())
    } else {
        Err(ScimError::invalid_value(format!(
            "'{text}' is not a canonical value of attribute '{}'",
            attr.name
        )))
    }
}

fn get_ignore_case<'a>(object: &'a Map<String, JsonValue>, name: &str) -> Option<&'a JsonValue> {
    object
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::Attribute;
    use serde_json::json;

    fn email_attr() -> Attribute {
        Attribute::new("emails", AttributeType::Complex)
            .with_multi_valued(true)
            .with_sub_attributes(vec![
                Attribute::new("value", AttributeType::String).with_required(true),
                Attribute::new("type", AttributeType::String)
                    .with_canonical_values(["work", "home", "other"]),
                Attribute::new("primary", AttributeType::Boolean),
            ])
    }

    #[test]
    fn primitive_type_checks() {
        let name = Attribute::new("userName", AttributeType::String);
        assert!(validate_value(&name, &json!("alice")).is_ok());
        assert!(validate_value(&name, &json!(42)).is_err());

        let active = Attribute::new("active", AttributeType::Boolean);
        assert!(validate_value(&active, &json!(true)).is_ok());
        assert!(validate_value(&active, &json!("true")).is_err());

        let count = Attribute::new("count", AttributeType::Integer);
        assert!(validate_value(&count, &json!(3)).is_ok());
        assert!(validate_value(&count, &json!(3.5)).is_err());
    }

    #[test]
    fn date_time_and_binary() {
        let ts = Attribute::new("lastModified", AttributeType::DateTime);
        assert!(validate_value(&ts, &json!("2024-05-01T12:30:00Z")).is_ok());
        assert!(validate_value(&ts, &json!("yesterday")).is_err());

        let cert = Attribute::new("value", AttributeType::Binary);
        assert!(validate_value(&cert, &json!("aGVsbG8=")).is_ok());
        assert!(validate_value(&cert, &json!("not base64!!!")).is_err());
    }

    #[test]
    fn canonical_values_respect_case_exactness() {
        let relaxed = Attribute::new("type", AttributeType::String)
            .with_canonical_values(["work", "home"]);
        assert!(validate_value(&relaxed, &json!("Work")).is_ok());
        assert!(validate_value(&relaxed, &json!("office")).is_err());

        let strict = Attribute::new("type", AttributeType::String)
            .with_canonical_values(["work"])
            .with_case_exact(true);
        assert!(validate_value(&strict, &json!("work")).is_ok());
        assert!(validate_value(&strict, &json!("Work")).is_err());
    }

    #[test]
    fn multi_valued_validates_each_element() {
        let emails = email_attr();
        let ok = json!([
            { "value": "a@example.com", "type": "work" },
            { "value": "b@example.com" }
        ]);
        assert!(validate_value(&emails, &ok).is_ok());

        let bad_type = json!([{ "value": "a@example.com", "type": "office" }]);
        assert!(matches!(
            validate_value(&emails, &bad_type),
            Err(ScimError::InvalidValue(_))
        ));
    }

    #[test]
    fn required_sub_attribute_must_be_present() {
        let emails = email_attr();
        let missing_value = json!([{ "type": "work" }]);
        let err = validate_value(&emails, &missing_value).unwrap_err();
        assert!(err.to_string().contains("emails.value"));
    }

    #[test]
    fn unknown_sub_attribute_is_rejected() {
        let emails = email_attr();
        let unknown = json!({ "value": "a@example.com", "color": "red" });
        assert!(validate_value(&emails, &unknown).is_err());
    }

    #[test]
    fn single_element_accepted_for_multi_valued() {
        let emails = email_attr();
        let element = json!({ "value": "a@example.com" });
        assert!(validate_value(&emails, &element).is_ok());
    }
}
