//! Analyze output types.

use clap::ValueEnum;
use serde::Serialize;
use tablegen_graphql::{ResolvedField, is_scalar_type};

/// Output format for `tablegen analyze`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum AnalyzeFormat {
    /// Indented tree with a summary.
    #[default]
    Table,
    /// The resolved field tree as JSON.
    Json,
    /// Tree and summary followed by a CSV block of the top-level fields.
    Csv,
}

/// Counts over the top-level fields of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSummary {
    /// Number of top-level fields.
    pub total: usize,
    /// Top-level fields of a built-in scalar type.
    pub scalars: usize,
    /// Top-level fields of any other type, enums included.
    pub objects: usize,
}

impl FieldSummary {
    pub fn from_fields(fields: &[ResolvedField]) -> Self {
        let scalars = fields.iter().filter(|field| field.is_scalar()).count();
        Self {
            total: fields.len(),
            scalars,
            objects: fields.len() - scalars,
        }
    }
}

/// `Type`, `[Type]`, `Type!` or `[Type]!`.
pub fn type_label(field: &ResolvedField) -> String {
    let mut label = if field.is_array {
        format!("[{}]", field.type_name)
    } else {
        field.type_name.clone()
    };
    if field.is_required {
        label.push('!');
    }
    label
}

/// One CSV row: `name,type,required,array,scalar`.
pub fn csv_row(field: &ResolvedField) -> String {
    format!(
        "{},{},{},{},{}",
        field.name,
        field.type_name,
        field.is_required,
        field.is_array,
        is_scalar_type(&field.type_name)
    )
}
