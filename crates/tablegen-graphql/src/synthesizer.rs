//! Table query synthesis from a resolved field tree.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ResolverResult;
use crate::resolver::{ResolvedField, SchemaResolver};

/// Metadata fields appended after `data` when pagination is enabled.
pub const PAGINATION_FIELDS: [&str; 4] = ["totalCount", "totalPages", "currentPage", "pageSize"];

const FIELD_INDENT: &str = "      ";
const INDENT_STEP: &str = "  ";

/// Options for [`QuerySynthesizer::generate_table_query`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableQueryOptions {
    /// Declare `$page`/`$pageSize` and select the pagination metadata.
    pub include_pagination: bool,
    /// Declare and forward `$filters`.
    pub include_filters: bool,
    /// Declare and forward `$orderBy`/`$orderDirections`.
    pub include_ordering: bool,
    /// Number of field levels rendered under `data`.
    pub max_depth: usize,
    /// Allow-list for top-level fields; `None` or empty renders every field.
    pub selected_fields: Option<Vec<String>>,
}

impl Default for TableQueryOptions {
    fn default() -> Self {
        Self {
            include_pagination: true,
            include_filters: true,
            include_ordering: true,
            max_depth: 2,
            selected_fields: None,
        }
    }
}

impl TableQueryOptions {
    /// Options with pagination, filters and ordering disabled.
    #[must_use]
    pub fn simple(max_depth: usize) -> Self {
        Self {
            include_pagination: false,
            include_filters: false,
            include_ordering: false,
            max_depth,
            selected_fields: None,
        }
    }

    /// Toggle pagination.
    #[must_use]
    pub const fn with_pagination(mut self, enabled: bool) -> Self {
        self.include_pagination = enabled;
        self
    }

    /// Toggle filters.
    #[must_use]
    pub const fn with_filters(mut self, enabled: bool) -> Self {
        self.include_filters = enabled;
        self
    }

    /// Toggle ordering.
    #[must_use]
    pub const fn with_ordering(mut self, enabled: bool) -> Self {
        self.include_ordering = enabled;
        self
    }

    /// Set the maximum depth.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Restrict the top-level fields.
    #[must_use]
    pub fn with_selected_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    fn variable_declarations(&self) -> Vec<&'static str> {
        let mut declarations = Vec::new();
        if self.include_pagination {
            declarations.extend(["$page: Int! = 1", "$pageSize: Int! = 10"]);
        }
        if self.include_filters {
            declarations.push("$filters: [FlopFilters]!");
        }
        if self.include_ordering {
            declarations.extend(["$orderBy: [String]!", "$orderDirections: [String]!"]);
        }
        declarations
    }

    fn argument_bindings(&self) -> Vec<&'static str> {
        let mut bindings = Vec::new();
        if self.include_pagination {
            bindings.extend(["page: $page", "pageSize: $pageSize"]);
        }
        if self.include_filters {
            bindings.push("filters: $filters");
        }
        if self.include_ordering {
            bindings.extend(["orderBy: $orderBy", "orderDirections: $orderDirections"]);
        }
        bindings
    }
}

/// Builds table query documents for the root queries of one endpoint.
#[derive(Debug)]
pub struct QuerySynthesizer {
    resolver: SchemaResolver,
}

impl QuerySynthesizer {
    /// Create a synthesizer over `resolver`.
    #[must_use]
    pub const fn new(resolver: SchemaResolver) -> Self {
        Self { resolver }
    }

    /// The underlying resolver.
    #[must_use]
    pub const fn resolver(&self) -> &SchemaResolver {
        &self.resolver
    }

    /// Root `list*` queries of the endpoint.
    pub async fn available_queries(&self) -> ResolverResult<Vec<String>> {
        self.resolver.available_list_queries().await
    }

    /// Generate the full table query for `query_name`.
    pub async fn generate_table_query(
        &self,
        query_name: &str,
        options: &TableQueryOptions,
    ) -> ResolverResult<String> {
        let fields = self
            .resolver
            .fields_for_query_to_depth(query_name, options.max_depth)
            .await?;
        debug!(
            query = query_name,
            fields = fields.len(),
            max_depth = options.max_depth,
            "rendering table query"
        );
        Ok(render_table_query(query_name, &fields, options))
    }

    /// Generate a table query restricted to `selected_fields` at the top level.
    pub async fn generate_custom_query(
        &self,
        query_name: &str,
        selected_fields: Vec<String>,
        options: TableQueryOptions,
    ) -> ResolverResult<String> {
        let options = TableQueryOptions {
            selected_fields: Some(selected_fields),
            ..options
        };
        self.generate_table_query(query_name, &options).await
    }

    /// Generate a query without pagination, filters or ordering.
    pub async fn generate_simple_query(
        &self,
        query_name: &str,
        max_depth: usize,
    ) -> ResolverResult<String> {
        self.generate_table_query(query_name, &TableQueryOptions::simple(max_depth))
            .await
    }
}

/// Assemble the query document for an already resolved field tree.
#[must_use]
pub fn render_table_query(
    query_name: &str,
    fields: &[ResolvedField],
    options: &TableQueryOptions,
) -> String {
    let selected = options
        .selected_fields
        .as_deref()
        .filter(|selected| !selected.is_empty());
    let selection = render_selection(fields, options.max_depth, selected, 0, FIELD_INDENT);

    let declarations = options.variable_declarations();
    let variables = if declarations.is_empty() {
        String::new()
    } else {
        format!("({})", declarations.join("\n\t"))
    };

    let bindings = options.argument_bindings();
    let arguments = if bindings.is_empty() {
        String::new()
    } else {
        format!("(params: {{\n      {}\n    }})", bindings.join("\n      "))
    };

    let pagination: String = if options.include_pagination {
        PAGINATION_FIELDS
            .iter()
            .map(|field| format!("\n    {field}"))
            .collect()
    } else {
        String::new()
    };

    format!(
        "query table_{query_name}{variables} {{\n  table: {query_name}{arguments} {{\n    data {{\n{selection}\n    }}{pagination}\n  }}\n}}"
    )
}

/// Render `fields` as an indented selection set.
///
/// A field is expanded only while `depth + 1 < max_depth`. Object fields
/// that cannot be expanded, because the depth budget ran out or the cycle
/// check cut them, become a `# name { ... }` comment so the truncation stays
/// visible.
#[must_use]
pub fn render_selection(
    fields: &[ResolvedField],
    max_depth: usize,
    selected: Option<&[String]>,
    depth: usize,
    indent: &str,
) -> String {
    if depth >= max_depth {
        return String::new();
    }

    fields
        .iter()
        .filter(|field| selected.is_none_or(|names| names.contains(&field.name)))
        .map(|field| render_field(field, max_depth, depth, indent))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_field(field: &ResolvedField, max_depth: usize, depth: usize, indent: &str) -> String {
    let placeholder = || format!("{indent}# {} {{ ... }}", field.name);

    match field.fields.as_deref() {
        Some(children) if !children.is_empty() => {
            if depth + 1 >= max_depth {
                return placeholder();
            }
            let nested_indent = format!("{indent}{INDENT_STEP}");
            let nested = render_selection(children, max_depth, None, depth + 1, &nested_indent);
            if nested.trim().is_empty() {
                placeholder()
            } else {
                format!("{indent}{} {{\n{nested}\n{indent}}}", field.name)
            }
        }
        None if field.is_cycle_cut() => placeholder(),
        _ => format!("{indent}{}", field.name),
    }
}
