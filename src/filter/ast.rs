//! Abstract syntax tree for the filter mini-language.
//!
//! A tree is built once per filter string, consumed immediately by the
//! semantic visitors, then discarded.

use std::fmt;

pub use crate::schema::types::AttrPath;

/// Comparison operator of a filter expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Co,
    Sw,
    Ew,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    /// Parse an operator keyword, case-insensitively.
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "co" => Some(Self::Co),
            "sw" => Some(Self::Sw),
            "ew" => Some(Self::Ew),
            "gt" => Some(Self::Gt),
            "ge" => Some(Self::Ge),
            "lt" => Some(Self::Lt),
            "le" => Some(Self::Le),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Co => "co",
            Self::Sw => "sw",
            Self::Ew => "ew",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// A literal operand of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Str(String),
    Number(f64),
    Boolean(bool),
    Null,
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Str(s) => write!(f, "\"{s}\""),
            FilterValue::Number(n) => write!(f, "{n}"),
            FilterValue::Boolean(b) => write!(f, "{b}"),
            FilterValue::Null => write!(f, "null"),
        }
    }
}

/// Tagged variant over the filter grammar productions.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// `attrPath op literal`
    Compare {
        path: AttrPath,
        op: CompareOp,
        value: FilterValue,
    },
    /// `attrPath pr`
    Present { path: AttrPath },
    /// `attrPath[filter]`, a per-element filter on a multi-valued attribute
    ValuePath {
        path: AttrPath,
        filter: Box<FilterExpr>,
    },
    And(Box<FilterExpr>, Box<FilterExpr>),
    Or(Box<FilterExpr>, Box<FilterExpr>),
    Not(Box<FilterExpr>),
    /// A parenthesized sub-expression
    Group(Box<FilterExpr>),
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpr::Compare { path, op, value } => write!(f, "{path} {op} {value}"),
            FilterExpr::Present { path } => write!(f, "{path} pr"),
            FilterExpr::ValuePath { path, filter } => write!(f, "{path}[{filter}]"),
            FilterExpr::And(left, right) => write!(f, "{left} and {right}"),
            FilterExpr::Or(left, right) => write!(f, "{left} or {right}"),
            FilterExpr::Not(inner) => write!(f, "not {inner}"),
            FilterExpr::Group(inner) => write!(f, "({inner})"),
        }
    }
}
