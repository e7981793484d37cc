//! The filter/value-path mini-language: grammar, syntax tree, and the
//! semantic visitors that walk it.

pub mod ast;
pub mod grammar;
pub mod parser;
pub mod visitors;

pub use ast::{AttrPath, CompareOp, FilterExpr, FilterValue};
pub use parser::parse_filter;
pub use visitors::{check_attributes, check_value_path_restrictions, expect_value_path};
