//! Module: schema
//! Responsibility: immutable field-mapping snapshot consulted by compilation.
//! Does not own: scope selection policy or value coercion.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};
use thiserror::Error as ThisError;

///
/// SchemaError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SchemaError {
    #[error("mapping type name must not be empty")]
    EmptyTypeName,

    #[error("type '{type_name}' has a field with an empty path")]
    EmptyPath { type_name: String },

    #[error("type '{type_name}' maps '{path}' twice")]
    DuplicateField { type_name: String, path: String },

    #[error("type '{type_name}' nests '{path}' under non-object field '{parent}'")]
    ParentNotObject {
        type_name: String,
        path: String,
        parent: String,
    },

    #[error("mapping type '{name}' is defined twice")]
    DuplicateType { name: String },
}

///
/// FieldType
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum FieldType {
    Text,
    Int,
    Double,
    Boolean,
    Date,
    Object,
}

impl FieldType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Int => "int",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Object => "object",
        }
    }

    #[must_use]
    pub const fn is_leaf(self) -> bool {
        !matches!(self, Self::Object)
    }

    /// Ordered types accept range bounds.
    #[must_use]
    pub const fn is_orderable(self) -> bool {
        matches!(self, Self::Text | Self::Int | Self::Double | Self::Date)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// FieldMapping
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct FieldMapping {
    pub path: String,
    pub field_type: FieldType,
}

impl FieldMapping {
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.field_type.is_leaf()
    }

    /// Dotted path of the enclosing object, if nested.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.path.rsplit_once('.').map(|(parent, _)| parent)
    }
}

///
/// TypeMapping
///
/// Fields of one mapping type, keyed by full dotted path.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TypeMapping {
    name: String,
    fields: BTreeMap<String, FieldMapping>,
}

impl TypeMapping {
    #[must_use]
    pub fn builder(name: impl Into<String>) -> TypeMappingBuilder {
        TypeMappingBuilder {
            name: name.into(),
            fields: BTreeMap::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn field(&self, path: &str) -> Option<&FieldMapping> {
        self.fields.get(path)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldMapping> {
        self.fields.values()
    }

    /// Every field strictly below `path`.
    pub fn descendants_of<'a>(&'a self, path: &str) -> impl Iterator<Item = &'a FieldMapping> {
        let prefix = format!("{path}.");

        self.fields
            .range(prefix.clone()..)
            .take_while(move |(key, _)| key.starts_with(&prefix))
            .map(|(_, mapping)| mapping)
    }
}

///
/// TypeMappingBuilder
///
/// Adding `a.b` implicitly maps `a` as an object when it is not yet mapped.
/// The first error encountered is reported by `build`.
///

#[derive(Debug)]
pub struct TypeMappingBuilder {
    name: String,
    fields: BTreeMap<String, FieldMapping>,
    error: Option<SchemaError>,
}

impl TypeMappingBuilder {
    #[must_use]
    pub fn field(mut self, path: impl Into<String>, field_type: FieldType) -> Self {
        if self.error.is_none()
            && let Err(err) = self.insert(path.into(), field_type)
        {
            self.error = Some(err);
        }
        self
    }

    fn insert(&mut self, path: String, field_type: FieldType) -> Result<(), SchemaError> {
        if path.is_empty() || path.split('.').any(str::is_empty) {
            return Err(SchemaError::EmptyPath {
                type_name: self.name.clone(),
            });
        }

        if let Some((parent, _)) = path.rsplit_once('.') {
            match self.fields.get(parent) {
                Some(existing) if existing.field_type != FieldType::Object => {
                    return Err(SchemaError::ParentNotObject {
                        type_name: self.name.clone(),
                        parent: parent.to_string(),
                        path,
                    });
                }
                Some(_) => {}
                None => self.insert(parent.to_string(), FieldType::Object)?,
            }
        }

        if let Some(existing) = self.fields.get(&path) {
            // re-declaring an implicit parent as an object is harmless
            if existing.field_type == field_type && field_type == FieldType::Object {
                return Ok(());
            }
            return Err(SchemaError::DuplicateField {
                type_name: self.name.clone(),
                path,
            });
        }

        self.fields.insert(path.clone(), FieldMapping { path, field_type });

        Ok(())
    }

    pub fn build(self) -> Result<TypeMapping, SchemaError> {
        if self.name.is_empty() {
            return Err(SchemaError::EmptyTypeName);
        }
        if let Some(err) = self.error {
            return Err(err);
        }

        Ok(TypeMapping {
            name: self.name,
            fields: self.fields,
        })
    }
}

///
/// TypeScope
///
/// Mapping types a compilation is restricted to. An empty explicit set
/// behaves as `All`.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum TypeScope {
    #[default]
    All,
    Types(BTreeSet<String>),
}

impl TypeScope {
    #[must_use]
    pub fn types<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::Types(names.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn is_all(&self) -> bool {
        match self {
            Self::All => true,
            Self::Types(names) => names.is_empty(),
        }
    }

    #[must_use]
    pub fn includes(&self, type_name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Types(names) => names.is_empty() || names.contains(type_name),
        }
    }
}

///
/// SchemaSnapshot
///
/// Immutable set of mapping types, ordered by name. Shared by reference
/// across compilations and threads.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SchemaSnapshot {
    types: BTreeMap<String, TypeMapping>,
}

impl SchemaSnapshot {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_types(types: impl IntoIterator<Item = TypeMapping>) -> Result<Self, SchemaError> {
        let mut out = BTreeMap::new();
        for mapping in types {
            if out.contains_key(mapping.name()) {
                return Err(SchemaError::DuplicateType {
                    name: mapping.name,
                });
            }
            out.insert(mapping.name.clone(), mapping);
        }

        Ok(Self { types: out })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    #[must_use]
    pub fn mapping(&self, type_name: &str) -> Option<&TypeMapping> {
        self.types.get(type_name)
    }

    /// Active mapping types under `scope`, in name order.
    pub fn active<'a>(&'a self, scope: &TypeScope) -> impl Iterator<Item = &'a TypeMapping> {
        self.types
            .values()
            .filter(move |mapping| scope.includes(mapping.name()))
    }

    /// First mapping of `path` among active types, in type-name order.
    #[must_use]
    pub fn resolve(&self, path: &str, scope: &TypeScope) -> Option<&FieldMapping> {
        self.active(scope).find_map(|mapping| mapping.field(path))
    }

    /// Direct children of an object path, merged across active types.
    #[must_use]
    pub fn children_of(&self, path: &str, scope: &TypeScope) -> Vec<&FieldMapping> {
        let mut seen = BTreeSet::new();

        self.active(scope)
            .flat_map(|mapping| mapping.descendants_of(path))
            .filter(|field| field.parent() == Some(path))
            .filter(|field| seen.insert(field.path.as_str()))
            .collect()
    }

    /// Leaf paths below an object path, merged across active types and sorted.
    #[must_use]
    pub fn leaf_paths_under(&self, path: &str, scope: &TypeScope) -> Vec<String> {
        let leaves: BTreeSet<&str> = self
            .active(scope)
            .flat_map(|mapping| mapping.descendants_of(path))
            .filter(|field| field.is_leaf())
            .map(|field| field.path.as_str())
            .collect();

        leaves.into_iter().map(str::to_string).collect()
    }
}

///
/// TESTS
///
