//! Attribute path notation: `[urn ":"] segment ("." segment)*`.
//!
//! Splitting and qualification are free functions so that the store
//! contracts stay pure data access.

use std::fmt;

/// Split a notation string into an optional schema URN and the dotted
/// attribute part. A qualified path takes the last `:` as the boundary,
/// e.g. `urn:ietf:params:scim:schemas:core:2.0:User:name.givenName`.
pub fn split_path(path: &str) -> (Option<&str>, &str) {
    if path.starts_with("urn:") {
        if let Some((schema, attr)) = path.rsplit_once(':') {
            return (Some(schema), attr);
        }
    }
    (None, path)
}

/// Prefix `path` with `default_schema_id` when it carries no URN prefix.
/// PATCH paths are written relative to the resource's own core schema
/// unless they explicitly target an extension.
pub fn qualify(path: &str, default_schema_id: &str) -> String {
    if path.starts_with("urn:") {
        path.to_string()
    } else {
        format!("{default_schema_id}:{path}")
    }
}

/// A parsed attribute path: optional schema URN plus dotted segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrPath {
    pub schema: Option<String>,
    pub segments: Vec<String>,
}

impl AttrPath {
    /// Parse notation text into its schema and segment parts. Parsing is
    /// purely lexical; whether the segments resolve is decided later.
    pub fn parse(raw: &str) -> Self {
        let (schema, attr) = split_path(raw);
        Self {
            schema: schema.map(str::to_string),
            segments: attr.split('.').map(str::to_string).collect(),
        }
    }

    /// Re-qualified notation string, using `default_schema_id` when the
    /// path carries no schema of its own.
    pub fn qualified(&self, default_schema_id: &str) -> String {
        let attr = self.segments.join(".");
        match &self.schema {
            Some(schema) => format!("{schema}:{attr}"),
            None => qualify(&attr, default_schema_id),
        }
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            write!(f, "{schema}:")?;
        }
        write!(f, "{}", self.segments.join("."))
    }
}
