//! Converts a filter string into a [`FilterExpr`] syntax tree.
//!
//! Parsing is total and pure: the same input always yields an identical
//! tree or an identical error. Any token or production mismatch is a hard
//! [`ScimError::InvalidFilter`].

use pest::iterators::Pair;
use pest::Parser;

use super::ast::{AttrPath, CompareOp, FilterExpr, FilterValue};
use super::grammar::{FilterParser, Rule};
use crate::error::ScimError;

/// Parse the filter mini-language into its syntax tree.
pub fn parse_filter(input: &str) -> Result<FilterExpr, ScimError> {
    let mut pairs = FilterParser::parse(Rule::complete_filter, input)
        .map_err(|e| ScimError::InvalidFilter(format!("parse error: {e}")))?;
    let root = pairs
        .next()
        .ok_or_else(|| ScimError::InvalidFilter("empty parse result".to_string()))?;
    build_expr(root)
}

fn build_expr(pair: Pair<Rule>) -> Result<FilterExpr, ScimError> {
    match pair.as_rule() {
        Rule::complete_filter => {
            let inner = pair
                .into_inner()
                .next()
                .ok_or_else(|| ScimError::InvalidFilter("empty filter".to_string()))?;
            build_expr(inner)
        }
        Rule::expr => build_logical(pair),
        Rule::term => {
            let mut pairs = pair.into_inner();
            let first = pairs
                .next()
                .ok_or_else(|| ScimError::InvalidFilter("empty term".to_string()))?;
            if first.as_rule() == Rule::not_op {
                let negated = pairs.next().ok_or_else(|| {
                    ScimError::InvalidFilter("'not' without expression".to_string())
                })?;
                Ok(FilterExpr::Not(Box::new(build_expr(negated)?)))
            } else {
                build_expr(first)
            }
        }
        Rule::group => {
            let inner = pair
                .into_inner()
                .next()
                .ok_or_else(|| ScimError::InvalidFilter("empty parentheses".to_string()))?;
            Ok(FilterExpr::Group(Box::new(build_expr(inner)?)))
        }
        Rule::value_path => build_value_path(pair),
        Rule::attr_expr => build_attr_expr(pair),
        other => Err(ScimError::InvalidFilter(format!(
            "unexpected rule {other:?}"
        ))),
    }
}

/// Left-folds `term (logic_op term)*` into nested And/Or nodes.
fn build_logical(pair: Pair<Rule>) -> Result<FilterExpr, ScimError> {
    let mut pairs = pair.into_inner();
    let first = pairs
        .next()
        .ok_or_else(|| ScimError::InvalidFilter("empty expression".to_string()))?;
    let mut expr = build_expr(first)?;

    while let Some(op_pair) = pairs.next() {
        let keyword = op_pair.as_str().to_ascii_lowercase();
        let right_pair = pairs.next().ok_or_else(|| {
            ScimError::InvalidFilter(format!("missing right operand after '{keyword}'"))
        })?;
        let right = build_expr(right_pair)?;
        expr = match keyword.as_str() {
            "and" => FilterExpr::And(Box::new(expr), Box::new(right)),
            "or" => FilterExpr::Or(Box::new(expr), Box::new(right)),
            other => {
                return Err(ScimError::InvalidFilter(format!(
                    "unknown logical operator '{other}'"
                )))
            }
        };
    }
    Ok(expr)
}

fn build_value_path(pair: Pair<Rule>) -> Result<FilterExpr, ScimError> {
    let mut pairs = pair.into_inner();
    let name = pairs
        .next()
        .ok_or_else(|| ScimError::InvalidFilter("value path without attribute".to_string()))?;
    let filter = pairs
        .next()
        .ok_or_else(|| ScimError::InvalidFilter("value path without filter".to_string()))?;
    Ok(FilterExpr::ValuePath {
        path: AttrPath::parse(name.as_str()),
        filter: Box::new(build_expr(filter)?),
    })
}

fn build_attr_expr(pair: Pair<Rule>) -> Result<FilterExpr, ScimError> {
    let mut pairs = pair.into_inner();
    let name = pairs
        .next()
        .ok_or_else(|| ScimError::InvalidFilter("expression without attribute".to_string()))?;
    let path = AttrPath::parse(name.as_str());

    let op_pair = pairs
        .next()
        .ok_or_else(|| ScimError::InvalidFilter(format!("attribute '{path}' without operator")))?;
    match op_pair.as_rule() {
        Rule::present_op => Ok(FilterExpr::Present { path }),
        Rule::compare_op => {
            let keyword = op_pair.as_str();
            let op = CompareOp::parse(keyword).ok_or_else(|| {
                ScimError::InvalidFilter(format!("unknown operator '{keyword}'"))
            })?;
            let literal = pairs.next().ok_or_else(|| {
                ScimError::InvalidFilter(format!("operator '{op}' without operand"))
            })?;
            Ok(FilterExpr::Compare {
                path,
                op,
                value: build_literal(literal)?,
            })
        }
        other => Err(ScimError::InvalidFilter(format!(
            "unexpected rule {other:?} after attribute '{path}'"
        ))),
    }
}

fn build_literal(pair: Pair<Rule>) -> Result<FilterValue, ScimError> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| ScimError::InvalidFilter("empty literal".to_string()))?;
    match inner.as_rule() {
        Rule::string => {
            let raw = inner.as_str();
            // the grammar guarantees exactly one quote on each side
            let body = raw
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .unwrap_or(raw);
            Ok(FilterValue::Str(unescape(body)))
        }
        Rule::number => {
            let n: f64 = inner
                .as_str()
                .parse()
                .map_err(|_| ScimError::InvalidFilter(format!("bad number '{}'", inner.as_str())))?;
            Ok(FilterValue::Number(n))
        }
        Rule::boolean => Ok(FilterValue::Boolean(inner.as_str() == "true")),
        Rule::null => Ok(FilterValue::Null),
        other => Err(ScimError::InvalidFilter(format!(
            "unexpected literal rule {other:?}"
        ))),
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(escaped) => out.push(escaped),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
