//! Semantic visitors over the filter syntax tree.
//!
//! Three independent concerns, each a pure function recursing depth-first
//! and aborting on the first failure: attribute existence, value-path
//! structure, and value-path restrictions.

use crate::error::ScimError;
use crate::filter::ast::{AttrPath, CompareOp, FilterExpr};
use crate::schema::directory::{is_custom_schema, SchemaDirectory};
use crate::schema::types::Attribute;

/// Check that every attribute path in the tree resolves against the
/// operation's core schema (bare names are qualified first). Paths inside
/// a bracketed value filter resolve against the bracketed attribute's
/// sub-tree. Unknown attributes fail with `InvalidPath`.
pub fn check_attributes(
    expr: &FilterExpr,
    directory: &SchemaDirectory,
    default_schema_id: &str,
) -> Result<(), ScimError> {
    match expr {
        FilterExpr::Compare { path, .. } | FilterExpr::Present { path } => {
            resolve_or_fail(path, directory, default_schema_id).map(|_| ())
        }
        FilterExpr::ValuePath { path, filter } => {
            let parent = resolve_or_fail(path, directory, default_schema_id)?;
            check_sub_attributes(filter, &parent)
        }
        FilterExpr::And(left, right) | FilterExpr::Or(left, right) => {
            check_attributes(left, directory, default_schema_id)?;
            check_attributes(right, directory, default_schema_id)
        }
        FilterExpr::Not(inner) | FilterExpr::Group(inner) => {
            check_attributes(inner, directory, default_schema_id)
        }
    }
}

/// Assert that the top-level parse result is a value-path expression,
/// returning its attribute path and bracketed filter. Any other shape
/// fails with `InvalidPath`.
pub fn expect_value_path(expr: &FilterExpr) -> Result<(&AttrPath, &FilterExpr), ScimError> {
    match expr {
        FilterExpr::ValuePath { path, filter } => Ok((path, filter)),
        other => Err(ScimError::invalid_path(format!(
            "'{other}' is not a value-path expression"
        ))),
    }
}

/// Enforce the restrictions that apply inside a bracketed value filter:
/// only `eq` and `co` comparisons, no parenthesized sub-expressions, and
/// no nested value paths. Violations fail with `InvalidFilter`.
pub fn check_value_path_restrictions(filter: &FilterExpr) -> Result<(), ScimError> {
    match filter {
        FilterExpr::Compare { path, op, .. } => match op {
            CompareOp::Eq | CompareOp::Co => Ok(()),
            other => Err(ScimError::InvalidFilter(format!(
                "operator '{other}' is not permitted in a value filter on '{path}'"
            ))),
        },
        FilterExpr::Present { path } => Err(ScimError::InvalidFilter(format!(
            "'pr' is not permitted in a value filter on '{path}'"
        ))),
        FilterExpr::ValuePath { path, .. } => Err(ScimError::InvalidFilter(format!(
            "value filter on '{path}' may not nest another value filter"
        ))),
        FilterExpr::Group(_) => Err(ScimError::InvalidFilter(
            "parenthesized expressions are not permitted in a value filter".to_string(),
        )),
        FilterExpr::And(left, right) | FilterExpr::Or(left, right) => {
            check_value_path_restrictions(left)?;
            check_value_path_restrictions(right)
        }
        FilterExpr::Not(inner) => check_value_path_restrictions(inner),
    }
}

/// Resolve the paths of a bracketed filter against the sub-tree of the
/// bracketed (parent) attribute.
pub fn check_sub_attributes(filter: &FilterExpr, parent: &Attribute) -> Result<(), ScimError> {
    match filter {
        FilterExpr::Compare { path, .. } | FilterExpr::Present { path } => {
            resolve_sub_path(path, parent).map(|_| ())
        }
        FilterExpr::ValuePath { path, filter } => {
            let nested = resolve_sub_path(path, parent)?;
            check_sub_attributes(filter, &nested)
        }
        FilterExpr::And(left, right) | FilterExpr::Or(left, right) => {
            check_sub_attributes(left, parent)?;
            check_sub_attributes(right, parent)
        }
        FilterExpr::Not(inner) | FilterExpr::Group(inner) => check_sub_attributes(inner, parent),
    }
}

fn resolve_or_fail(
    path: &AttrPath,
    directory: &SchemaDirectory,
    default_schema_id: &str,
) -> Result<Attribute, ScimError> {
    // An explicit schema must be the operation's core schema or an
    // extension; another resource kind's core schema is out of reach.
    if let Some(schema) = &path.schema {
        if schema != default_schema_id && !is_custom_schema(schema) {
            return Err(ScimError::invalid_path(format!(
                "schema in path '{path}' does not apply to '{default_schema_id}' resources"
            )));
        }
    }
    let qualified = path.qualified(default_schema_id);
    directory
        .attribute(&qualified)?
        .ok_or_else(|| ScimError::invalid_path(format!("attribute '{path}' does not exist")))
}

fn resolve_sub_path(path: &AttrPath, parent: &Attribute) -> Result<Attribute, ScimError> {
    if path.schema.is_some() {
        return Err(ScimError::invalid_path(format!(
            "path '{path}' inside a value filter must be relative to '{}'",
            parent.name
        )));
    }
    let mut current = parent.clone();
    for segment in &path.segments {
        let next = current.sub_attribute(segment).ok_or_else(|| {
            ScimError::invalid_path(format!(
                "'{segment}' is not a sub-attribute of '{}'",
                current.name
            ))
        })?;
        current = next.clone();
    }
    Ok(current)
}
