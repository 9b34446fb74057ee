//! `tablegen analyze` command implementation.
//!
//! Prints the resolved row fields of a query as a tree.
//!
//! # Usage
//!
//! ```text
//! # Tree with summary
//! tablegen analyze listInvoices
//!
//! # Scalars only, two levels
//! tablegen analyze listInvoices --scalars-only --depth 2
//!
//! # Field tree as JSON
//! tablegen analyze listInvoices --format json
//! ```

pub mod types;

use std::fmt::Write as _;

use anyhow::{Context, Result};
use clap::Args;
use tablegen_graphql::{QuerySynthesizer, ResolvedField};

use types::{AnalyzeFormat, FieldSummary, csv_row, type_label};

/// Arguments for the `tablegen analyze` command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Root query to analyze.
    pub query: String,

    /// Maximum number of nested levels to print.
    #[arg(long, short = 'd', default_value_t = 3)]
    pub depth: usize,

    /// Only print scalar fields.
    #[arg(long, short = 's', default_value_t = false)]
    pub scalars_only: bool,

    /// Output format.
    #[arg(long, short = 'f', value_enum, default_value_t = AnalyzeFormat::Table)]
    pub format: AnalyzeFormat,
}

/// Run the analyze command.
pub async fn run(synthesizer: &QuerySynthesizer, args: &AnalyzeArgs) -> Result<()> {
    let resolver = synthesizer.resolver();
    let fields = if args.format == AnalyzeFormat::Json {
        resolver.fields_for_query(&args.query).await
    } else {
        resolver.fields_for_query_to_depth(&args.query, args.depth).await
    };
    let fields = fields
        .with_context(|| format!("failed to analyze query '{}'", args.query))?;

    if fields.is_empty() {
        println!("No fields found for this query.");
        return Ok(());
    }

    if args.format == AnalyzeFormat::Json {
        let output =
            serde_json::to_string_pretty(&fields).context("failed to serialize fields to JSON")?;
        println!("{output}");
        return Ok(());
    }

    print!("{}", render_report(&fields, args));
    Ok(())
}

fn render_report(fields: &[ResolvedField], args: &AnalyzeArgs) -> String {
    let mut out = format!("Field types for {}:\n\n", args.query);
    for field in fields {
        render_tree(&mut out, field, "", 0, args.depth, args.scalars_only);
    }

    let summary = FieldSummary::from_fields(fields);
    out.push_str("\nSummary:\n");
    let _ = writeln!(out, "  Total fields: {}", summary.total);
    let _ = writeln!(out, "  Scalar fields: {}", summary.scalars);
    let _ = writeln!(out, "  Object fields: {}", summary.objects);

    if args.format == AnalyzeFormat::Csv {
        out.push_str("\nCSV:\nname,type,required,array,scalar\n");
        for field in fields {
            out.push_str(&csv_row(field));
            out.push('\n');
        }
    }
    out
}

fn render_tree(
    out: &mut String,
    field: &ResolvedField,
    indent: &str,
    depth: usize,
    max_depth: usize,
    scalars_only: bool,
) {
    if depth >= max_depth || (scalars_only && !field.is_scalar()) {
        return;
    }

    let _ = writeln!(out, "{indent}{}: {}", field.name, type_label(field));

    let children = field.children();
    if children.is_empty() || scalars_only {
        return;
    }
    let _ = writeln!(out, "{indent}  ├─ Subfields ({}):", children.len());
    for (index, child) in children.iter().enumerate() {
        let branch = if index + 1 == children.len() {
            "  └─ "
        } else {
            "  ├─ "
        };
        render_tree(
            out,
            child,
            &format!("{indent}{branch}"),
            depth + 1,
            max_depth,
            scalars_only,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, type_name: &str, fields: Option<Vec<ResolvedField>>) -> ResolvedField {
        ResolvedField {
            name: name.to_string(),
            type_name: type_name.to_string(),
            is_required: false,
            is_array: false,
            fields,
        }
    }

    fn invoice_fields() -> Vec<ResolvedField> {
        vec![
            ResolvedField {
                is_required: true,
                ..field("id", "ID", None)
            },
            field(
                "customer",
                "Customer",
                Some(vec![
                    field("name", "String", None),
                    ResolvedField {
                        is_array: true,
                        ..field("invoices", "Invoice", None)
                    },
                ]),
            ),
        ]
    }

    fn args(depth: usize, scalars_only: bool, format: AnalyzeFormat) -> AnalyzeArgs {
        AnalyzeArgs {
            query: "listInvoices".to_string(),
            depth,
            scalars_only,
            format,
        }
    }

    #[test]
    fn tree_shows_wrappers_and_subfields() {
        let out = render_report(&invoice_fields(), &args(3, false, AnalyzeFormat::Table));
        assert!(out.contains("id: ID!\n"));
        assert!(out.contains("customer: Customer\n  ├─ Subfields (2):\n"));
        assert!(out.contains("  ├─ name: String\n"));
        assert!(out.contains("  └─ invoices: [Invoice]\n"));
        assert!(out.contains("Total fields: 2"));
        assert!(out.contains("Scalar fields: 1"));
        assert!(out.contains("Object fields: 1"));
        assert!(!out.contains("CSV"));
    }

    #[test]
    fn depth_limits_nested_levels() {
        let out = render_report(&invoice_fields(), &args(1, false, AnalyzeFormat::Table));
        assert!(out.contains("customer: Customer\n"));
        assert!(!out.contains("name: String"));
    }

    #[test]
    fn scalars_only_skips_objects() {
        let out = render_report(&invoice_fields(), &args(3, true, AnalyzeFormat::Table));
        assert!(out.contains("id: ID!"));
        assert!(!out.contains("customer: Customer"));
    }

    #[test]
    fn csv_lists_top_level_fields() {
        let out = render_report(&invoice_fields(), &args(3, false, AnalyzeFormat::Csv));
        assert!(out.ends_with(
            "name,type,required,array,scalar\nid,ID,true,false,true\ncustomer,Customer,false,false,false\n"
        ));
    }
}
