//! Introspection document and the decoded schema model.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer};

/// Introspection document sent to the endpoint.
///
/// Type references are requested four levels deep so that
/// `NON_NULL(LIST(NON_NULL(Named)))` decodes completely.
pub const INTROSPECTION_QUERY: &str = r"
  query IntrospectionQuery {
    __schema {
      queryType {
        name
        fields {
          name
          type {
            ...TypeRef
          }
          args {
            name
            type {
              ...TypeRef
            }
          }
        }
      }
      types {
        name
        kind
        fields {
          name
          type {
            ...TypeRef
          }
        }
      }
    }
  }

  fragment TypeRef on __Type {
    name
    kind
    ofType {
      name
      kind
      ofType {
        name
        kind
        ofType {
          name
          kind
        }
      }
    }
  }
";

/// Operation name of [`INTROSPECTION_QUERY`].
pub const INTROSPECTION_OPERATION: &str = "IntrospectionQuery";

/// `__TypeKind` values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum TypeKind {
    /// `SCALAR`
    Scalar,
    /// `OBJECT`
    Object,
    /// `INTERFACE`
    Interface,
    /// `UNION`
    Union,
    /// `ENUM`
    Enum,
    /// `INPUT_OBJECT`
    InputObject,
    /// `LIST`
    List,
    /// `NON_NULL`
    NonNull,
    /// Anything a server reports that is not in the list above.
    Other(String),
}

impl TypeKind {
    /// Wire name of the kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Scalar => "SCALAR",
            Self::Object => "OBJECT",
            Self::Interface => "INTERFACE",
            Self::Union => "UNION",
            Self::Enum => "ENUM",
            Self::InputObject => "INPUT_OBJECT",
            Self::List => "LIST",
            Self::NonNull => "NON_NULL",
            Self::Other(kind) => kind,
        }
    }
}

impl From<String> for TypeKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "SCALAR" => Self::Scalar,
            "OBJECT" => Self::Object,
            "INTERFACE" => Self::Interface,
            "UNION" => Self::Union,
            "ENUM" => Self::Enum,
            "INPUT_OBJECT" => Self::InputObject,
            "LIST" => Self::List,
            "NON_NULL" => Self::NonNull,
            _ => Self::Other(kind),
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static NON_NULL_KIND: TypeKind = TypeKind::NonNull;
static LIST_KIND: TypeKind = TypeKind::List;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTypeRef {
    kind: TypeKind,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    of_type: Option<Box<RawTypeRef>>,
}

/// A type reference with its wrapper chain decoded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawTypeRef")]
pub enum TypeRef {
    /// `T!`
    NonNull(Box<TypeRef>),
    /// `[T]`
    List(Box<TypeRef>),
    /// A named type.
    Named {
        /// Kind of the named type.
        kind: TypeKind,
        /// Type name.
        name: String,
    },
    /// A reference with no name and no decoded inner type, typically a
    /// wrapper nested deeper than the introspection document asks for.
    Opaque(TypeKind),
}

impl From<RawTypeRef> for TypeRef {
    fn from(raw: RawTypeRef) -> Self {
        match (raw.kind, raw.of_type, raw.name) {
            (TypeKind::NonNull, Some(inner), _) => Self::NonNull(Box::new(Self::from(*inner))),
            (TypeKind::List, Some(inner), _) => Self::List(Box::new(Self::from(*inner))),
            (kind, _, Some(name)) => Self::Named { kind, name },
            (kind, _, None) => Self::Opaque(kind),
        }
    }
}

/// Terminal type of a field plus the wrappers peeled off to reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldShape<'a> {
    /// Terminal type name, or the kind string when no name is available.
    pub type_name: &'a str,
    /// Outermost wrapper was `NON_NULL`.
    pub is_required: bool,
    /// A `LIST` wrapper was peeled.
    pub is_array: bool,
}

impl TypeRef {
    /// Convenience constructor for a named reference.
    #[must_use]
    pub fn named(kind: TypeKind, name: impl Into<String>) -> Self {
        Self::Named {
            kind,
            name: name.into(),
        }
    }

    /// Wrap in `NON_NULL`.
    #[must_use]
    pub fn non_null(self) -> Self {
        Self::NonNull(Box::new(self))
    }

    /// Wrap in `LIST`.
    #[must_use]
    pub fn list(self) -> Self {
        Self::List(Box::new(self))
    }

    /// Kind tag of this reference.
    #[must_use]
    pub fn kind(&self) -> &TypeKind {
        match self {
            Self::NonNull(_) => &NON_NULL_KIND,
            Self::List(_) => &LIST_KIND,
            Self::Named { kind, .. } | Self::Opaque(kind) => kind,
        }
    }

    /// Name of this reference when it is not a wrapper.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Peel one `NON_NULL` wrapper, if present.
    #[must_use]
    pub fn strip_non_null(&self) -> &Self {
        match self {
            Self::NonNull(inner) => &**inner,
            other => other,
        }
    }

    /// Name of the reference, falling back to its kind string.
    #[must_use]
    pub fn name_or_kind(&self) -> &str {
        self.name().unwrap_or_else(|| self.kind().as_str())
    }

    /// Unwrap `NON_NULL`, then `LIST`, then an optional trailing `NON_NULL`.
    #[must_use]
    pub fn shape(&self) -> FieldShape<'_> {
        let mut current = self;
        let mut is_required = false;
        let mut is_array = false;

        if let Self::NonNull(inner) = current {
            is_required = true;
            current = &**inner;
        }
        if let Self::List(inner) = current {
            is_array = true;
            current = inner.strip_non_null();
        }

        FieldShape {
            type_name: current.name_or_kind(),
            is_required,
            is_array,
        }
    }
}

/// Argument of a root query field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchemaArgument {
    /// Argument name.
    pub name: String,
    /// Argument type.
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
}

/// Field definition on an object type or on the root query type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchemaField {
    /// Field name.
    pub name: String,
    /// Field type.
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    /// Arguments (only requested for root query fields).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub args: Vec<SchemaArgument>,
}

/// Root query type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryType {
    /// Name of the root type (usually `Query`).
    #[serde(default)]
    pub name: Option<String>,
    /// Root fields in declaration order.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fields: Vec<SchemaField>,
}

/// Named type from `__schema.types`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchemaType {
    /// Type name.
    pub name: String,
    /// Type kind.
    pub kind: TypeKind,
    /// Field list; `None` for scalars, enums, unions and input objects.
    #[serde(default)]
    pub fields: Option<Vec<SchemaField>>,
}

/// `__schema` payload as returned by the introspection document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectedSchema {
    /// Root query type.
    pub query_type: QueryType,
    /// Every named type.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub types: Vec<SchemaType>,
}

/// `data` payload of the introspection response.
#[derive(Debug, Clone, Deserialize)]
pub struct IntrospectionData {
    /// The schema.
    #[serde(rename = "__schema")]
    pub schema: IntrospectedSchema,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Loaded schema with a name index over its types.
///
/// Immutable once built; shared behind an `Arc` by the resolver.
#[derive(Debug, Clone)]
pub struct Schema {
    raw: IntrospectedSchema,
    type_index: HashMap<String, usize>,
}

impl Schema {
    /// Index a decoded introspection payload.
    #[must_use]
    pub fn new(raw: IntrospectedSchema) -> Self {
        let mut type_index = HashMap::with_capacity(raw.types.len());
        for (position, ty) in raw.types.iter().enumerate() {
            type_index.entry(ty.name.clone()).or_insert(position);
        }
        Self { raw, type_index }
    }

    /// Root query fields in declaration order.
    #[must_use]
    pub fn query_fields(&self) -> &[SchemaField] {
        &self.raw.query_type.fields
    }

    /// Root query field by name.
    #[must_use]
    pub fn query_field(&self, name: &str) -> Option<&SchemaField> {
        self.query_fields().iter().find(|field| field.name == name)
    }

    /// Named type lookup.
    #[must_use]
    pub fn find_type(&self, name: &str) -> Option<&SchemaType> {
        self.type_index
            .get(name)
            .and_then(|&position| self.raw.types.get(position))
    }

    /// Number of named types.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.raw.types.len()
    }
}

impl From<IntrospectedSchema> for Schema {
    fn from(raw: IntrospectedSchema) -> Self {
        Self::new(raw)
    }
}
