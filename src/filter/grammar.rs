use pest_derive::Parser;

/// Parser for the filter and value-path mini-language.
#[derive(Parser)]
#[grammar = "filter/filter.pest"]
pub struct FilterParser;
