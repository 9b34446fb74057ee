//! Schema resolver: introspection plus cycle-safe field tree resolution.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::GraphqlTransport;
use crate::error::{GraphqlClientError, ResolverError, ResolverResult};
use crate::operation::{GraphqlQuery, GraphqlRequest};
use crate::schema::{
    FieldShape, INTROSPECTION_OPERATION, INTROSPECTION_QUERY, IntrospectionData, Schema, SchemaField,
};

/// Type names treated as leaves regardless of what the schema calls scalar.
pub const SCALAR_TYPES: [&str; 7] = ["String", "Int", "Float", "Boolean", "ID", "DateTime", "Date"];

/// Prefix of the root fields reported by [`SchemaResolver::available_list_queries`].
pub const LIST_QUERY_PREFIX: &str = "list";

/// Field name that marks a pagination envelope.
pub const ENVELOPE_DATA_FIELD: &str = "data";

/// Returns `true` if `type_name` is one of [`SCALAR_TYPES`].
#[must_use]
pub fn is_scalar_type(type_name: &str) -> bool {
    SCALAR_TYPES.contains(&type_name)
}

/// A field of the resolved row type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedField {
    /// Field name.
    pub name: String,
    /// Terminal type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Outermost wrapper was `NON_NULL`.
    pub is_required: bool,
    /// The field is a list.
    pub is_array: bool,
    /// Child fields when the terminal type was expanded.
    ///
    /// `None` for scalars and for types cut by the cycle check; `Some(vec![])`
    /// for expandable types that expose no fields (enums, unknown types).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<ResolvedField>>,
}

impl ResolvedField {
    /// Returns `true` if the terminal type is in the scalar set.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        is_scalar_type(&self.type_name)
    }

    /// Child fields, empty when none were resolved.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        self.fields.as_deref().unwrap_or_default()
    }

    /// Returns `true` for a non-scalar field whose expansion was cut because
    /// its type already appears among its ancestors.
    #[must_use]
    pub fn is_cycle_cut(&self) -> bool {
        self.fields.is_none() && !self.is_scalar()
    }

    /// Number of field levels from this field down to its deepest leaf.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + tree_depth(self.children())
    }
}

/// Deepest path length of a field list.
#[must_use]
pub fn tree_depth(fields: &[ResolvedField]) -> usize {
    fields.iter().map(ResolvedField::depth).max().unwrap_or(0)
}

/// Introspects an endpoint once and resolves query row types from the cached
/// schema.
pub struct SchemaResolver {
    transport: Arc<dyn GraphqlTransport>,
    schema: RwLock<Option<Arc<Schema>>>,
}

impl std::fmt::Debug for SchemaResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaResolver")
            .field("endpoint", &self.transport.endpoint())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl SchemaResolver {
    /// Create a resolver over `transport`. Nothing is fetched until first use.
    #[must_use]
    pub fn new(transport: Arc<dyn GraphqlTransport>) -> Self {
        Self {
            transport,
            schema: RwLock::new(None),
        }
    }

    /// Returns `true` once a schema has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.schema.read().is_some()
    }

    /// Run the introspection document and cache the result.
    ///
    /// Concurrent callers are not de-duplicated; the last successful load
    /// wins the cache slot.
    pub async fn load_schema(&self) -> ResolverResult<Arc<Schema>> {
        info!(endpoint = self.transport.endpoint(), "introspecting GraphQL schema");

        let request = GraphqlRequest::new(GraphqlQuery::from_static(INTROSPECTION_QUERY))
            .with_operation_name(INTROSPECTION_OPERATION);
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(ResolverError::SchemaLoad)?;

        if !response.errors.is_empty() {
            return Err(ResolverError::SchemaLoad(GraphqlClientError::GraphqlErrors {
                errors: response.errors,
            }));
        }
        let data = response.data.ok_or_else(|| {
            ResolverError::SchemaLoad(GraphqlClientError::Protocol {
                message: "introspection response carried no data".to_string(),
            })
        })?;
        let data: IntrospectionData = serde_json::from_value(data)
            .map_err(|err| ResolverError::SchemaLoad(GraphqlClientError::from(err)))?;

        let schema = Arc::new(Schema::new(data.schema));
        info!(
            types = schema.type_count(),
            query_fields = schema.query_fields().len(),
            "GraphQL schema loaded"
        );
        *self.schema.write() = Some(Arc::clone(&schema));
        Ok(schema)
    }

    /// Cached schema, loading it on first use.
    pub async fn schema(&self) -> ResolverResult<Arc<Schema>> {
        let cached = self.schema.read().clone();
        match cached {
            Some(schema) => Ok(schema),
            None => self.load_schema().await,
        }
    }

    /// Root query names starting with `list`, in declaration order.
    pub async fn available_list_queries(&self) -> ResolverResult<Vec<String>> {
        let schema = self.schema().await?;
        Ok(list_queries(&schema))
    }

    /// Resolve the row type of `query_name` into a field tree.
    pub async fn fields_for_query(&self, query_name: &str) -> ResolverResult<Vec<ResolvedField>> {
        let schema = self.schema().await?;
        fields_for_query(&schema, query_name)
    }

    /// Resolve the row type of `query_name`, expanding only the levels a
    /// selection of `max_depth` renders.
    pub async fn fields_for_query_to_depth(
        &self,
        query_name: &str,
        max_depth: usize,
    ) -> ResolverResult<Vec<ResolvedField>> {
        let schema = self.schema().await?;
        fields_for_query_to_depth(&schema, query_name, max_depth)
    }
}

/// Root query names starting with [`LIST_QUERY_PREFIX`].
#[must_use]
pub fn list_queries(schema: &Schema) -> Vec<String> {
    schema
        .query_fields()
        .iter()
        .filter(|field| field.name.starts_with(LIST_QUERY_PREFIX))
        .map(|field| field.name.clone())
        .collect()
}

/// Resolve the row type of `query_name` against a loaded schema.
///
/// The return type is unwrapped through `NON_NULL`. When that type is a
/// pagination envelope (it has a `data` field) the rows are the terminal type
/// of `data`; otherwise the return type itself is resolved.
pub fn fields_for_query(schema: &Schema, query_name: &str) -> ResolverResult<Vec<ResolvedField>> {
    Ok(row_type(schema, query_name)?
        .map(|row_type| resolve_fields(schema, row_type, HashSet::new()))
        .unwrap_or_default())
}

/// Like [`fields_for_query`], but only expands the levels a selection of
/// `max_depth` renders.
///
/// Fields on the last rendered level keep their type's fields one level deep
/// with no further children, which is enough to tell an object with fields
/// from an enum. The cycle cut is unchanged.
pub fn fields_for_query_to_depth(
    schema: &Schema,
    query_name: &str,
    max_depth: usize,
) -> ResolverResult<Vec<ResolvedField>> {
    Ok(row_type(schema, query_name)?
        .map(|row_type| resolve_fields_to_depth(schema, row_type, max_depth))
        .unwrap_or_default())
}

fn row_type<'s>(schema: &'s Schema, query_name: &str) -> ResolverResult<Option<&'s str>> {
    let query_field = schema
        .query_field(query_name)
        .ok_or_else(|| ResolverError::QueryNotFound {
            query_name: query_name.to_string(),
        })?;

    let Some(return_type) = query_field.type_ref.strip_non_null().name() else {
        debug!(query = query_name, "query return type has no name");
        return Ok(None);
    };

    let envelope_row = schema
        .find_type(return_type)
        .and_then(|ty| ty.fields.as_deref())
        .and_then(|fields| fields.iter().find(|field| field.name == ENVELOPE_DATA_FIELD))
        .map(|data| data.type_ref.shape().type_name);

    let row_type = envelope_row.unwrap_or(return_type);
    debug!(query = query_name, row_type, "resolving row type");
    Ok(Some(row_type))
}

/// Resolve the fields of `type_name`.
///
/// `visited` holds the types on the path from the root down to `type_name`.
/// Each child receives its own copy, so siblings never suppress each other;
/// a field whose type is already on the path is left without children.
#[must_use]
pub fn resolve_fields<'s>(
    schema: &'s Schema,
    type_name: &'s str,
    visited: HashSet<&'s str>,
) -> Vec<ResolvedField> {
    resolve_level(schema, type_name, visited, None)
}

/// Resolve the fields of `type_name`, expanding at most `max_depth` levels.
///
/// Every path of the full tree is a chain of distinct types, so on densely
/// connected schemas [`resolve_fields`] grows factorially with the type
/// count. This stops at the rendering horizon instead.
#[must_use]
pub fn resolve_fields_to_depth<'s>(
    schema: &'s Schema,
    type_name: &'s str,
    max_depth: usize,
) -> Vec<ResolvedField> {
    resolve_level(schema, type_name, HashSet::new(), Some(max_depth.saturating_sub(1)))
}

/// `budget` is the number of levels below this one whose children are still
/// resolved; at zero, children are listed without their own children.
fn resolve_level<'s>(
    schema: &'s Schema,
    type_name: &'s str,
    mut visited: HashSet<&'s str>,
    budget: Option<usize>,
) -> Vec<ResolvedField> {
    if !visited.insert(type_name) {
        return Vec::new();
    }

    row_fields(schema, type_name)
        .map(|(field, shape)| {
            let expandable = !is_scalar_type(shape.type_name) && !visited.contains(shape.type_name);
            let fields = expandable.then(|| match budget {
                Some(0) => row_fields(schema, shape.type_name)
                    .map(|(child, child_shape)| leaf(child, child_shape, None))
                    .collect(),
                _ => resolve_level(
                    schema,
                    shape.type_name,
                    visited.clone(),
                    budget.map(|levels| levels - 1),
                ),
            });
            leaf(field, shape, fields)
        })
        .collect()
}

/// Non-reserved fields of `type_name` with their unwrapped shapes.
fn row_fields<'s>(
    schema: &'s Schema,
    type_name: &'s str,
) -> impl Iterator<Item = (&'s SchemaField, FieldShape<'s>)> {
    schema
        .find_type(type_name)
        .and_then(|ty| ty.fields.as_deref())
        .unwrap_or_default()
        .iter()
        .filter(|field| !field.name.starts_with("__"))
        .map(|field| (field, field.type_ref.shape()))
}

fn leaf(field: &SchemaField, shape: FieldShape<'_>, fields: Option<Vec<ResolvedField>>) -> ResolvedField {
    ResolvedField {
        name: field.name.clone(),
        type_name: shape.type_name.to_string(),
        is_required: shape.is_required,
        is_array: shape.is_array,
        fields,
    }
}
