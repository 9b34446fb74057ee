//! tablegen GraphQL - schema introspection and table query synthesis.
//!
//! This crate provides:
//! - An HTTP GraphQL transport with retry and backoff.
//! - A schema resolver that introspects an endpoint once and resolves the
//!   row type of `list*` queries into a cycle-safe field tree.
//! - A query synthesizer that renders that tree into a paginated,
//!   filterable, orderable table query document.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

mod client;
mod error;
mod operation;
mod resolver;
mod retry;
mod schema;
mod synthesizer;

pub use client::{GraphqlClient, GraphqlClientBuilder, GraphqlClientConfig, GraphqlTransport};
pub use error::{
    GraphqlClientError, GraphqlError, GraphqlErrorLocation, HttpErrorInfo, ResolverError,
    ResolverResult,
};
pub use operation::{GraphqlQuery, GraphqlRequest, GraphqlResponse};
pub use resolver::{
    ENVELOPE_DATA_FIELD, LIST_QUERY_PREFIX, ResolvedField, SCALAR_TYPES, SchemaResolver,
    fields_for_query, fields_for_query_to_depth, is_scalar_type, list_queries, resolve_fields,
    resolve_fields_to_depth, tree_depth,
};
pub use retry::{RetryDecision, RetryPolicy};
pub use schema::{
    FieldShape, INTROSPECTION_OPERATION, INTROSPECTION_QUERY, IntrospectedSchema,
    IntrospectionData, QueryType, Schema, SchemaArgument, SchemaField, SchemaType, TypeKind,
    TypeRef,
};
pub use synthesizer::{
    PAGINATION_FIELDS, QuerySynthesizer, TableQueryOptions, render_selection, render_table_query,
};
