//! Canonical Type Model
//!
//! The language-neutral IR every front-end produces. Types refer to each other
//! only by name (`TypeRef`), never by pointer, so records hash and compare
//! structurally and can be deduplicated.
//!
//! Serialization follows the IR's compact array form:
//! `[name, base, [options], description, [fields]]`.

pub mod schema;

pub use schema::{CanonicalSchema, Namespace, PackageInfo};

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, TranslateError};

/// Canonical type name (`prefix:Local[.segment…]`)
pub type TypeName = String;

/// Reference to a type by name
pub type TypeRef = String;

// =============================================================================
// Kinds
// =============================================================================

/// Built-in primitive kinds. These names are never allocated as types and
/// never appear in dependency sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Integer,
    Number,
    Boolean,
    Binary,
}

impl Primitive {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Number => "Number",
            Self::Boolean => "Boolean",
            Self::Binary => "Binary",
        }
    }

    /// Map a JSON Schema `type` keyword. JSON Schema has no binary type.
    pub fn from_json_type(type_str: &str) -> Option<Self> {
        match type_str {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "String" => Some(Self::String),
            "Integer" => Some(Self::Integer),
            "Number" => Some(Self::Number),
            "Boolean" => Some(Self::Boolean),
            "Binary" => Some(Self::Binary),
            _ => None,
        }
    }
}

/// True if `name` is a built-in primitive kind rather than a declared type
pub fn is_builtin(name: &str) -> bool {
    Primitive::from_name(name).is_some()
}

/// Union discipline of a Choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChoiceDiscipline {
    /// anyOf: one or more alternatives
    InclusiveOr,
    /// allOf: every alternative
    AllRequired,
    /// oneOf: exactly one alternative
    ExactlyOne,
}

impl ChoiceDiscipline {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "anyOf" => Some(Self::InclusiveOr),
            "allOf" => Some(Self::AllRequired),
            "oneOf" => Some(Self::ExactlyOne),
            _ => None,
        }
    }

    /// Type option code in the IR text form
    pub fn code(&self) -> &'static str {
        match self {
            Self::InclusiveOr => "CO",
            Self::AllRequired => "CA",
            Self::ExactlyOne => "CX",
        }
    }
}

/// Base kind of a canonical type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseKind {
    Primitive(Primitive),
    Record,
    /// Homogeneous array; item type in a `ValueType` option
    ArrayOf,
    /// Fixed-arity positional array; one field per position
    Array,
    /// Map; key and value types in `KeyType` / `ValueType` options
    MapOf,
    Enumerated,
    Choice(ChoiceDiscipline),
}

impl BaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primitive(p) => p.as_str(),
            Self::Record => "Record",
            Self::ArrayOf => "ArrayOf",
            Self::Array => "Array",
            Self::MapOf => "MapOf",
            Self::Enumerated => "Enumerated",
            Self::Choice(_) => "Choice",
        }
    }
}

impl fmt::Display for BaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Options
// =============================================================================

/// Type and field options
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeOption {
    /// Minimum occurrences of a field
    MinCount(u64),
    /// Maximum occurrences of a field (0 = unbounded)
    MaxCount(u64),
    /// Minimum size or value
    MinValue(i64),
    /// Maximum size or value
    MaxValue(i64),
    /// Fractional minimum of a Number
    MinFloat(serde_json::Number),
    /// Fractional maximum of a Number
    MaxFloat(serde_json::Number),
    /// Item / value type of ArrayOf and MapOf
    ValueType(TypeRef),
    /// Key type of MapOf
    KeyType(TypeRef),
    Format(String),
    Pattern(String),
    Default(String),
}

impl TypeOption {
    /// The type this option refers to, if any
    pub fn type_ref(&self) -> Option<&str> {
        match self {
            Self::ValueType(t) | Self::KeyType(t) => Some(t),
            _ => None,
        }
    }

    /// Rewrite the referenced type name, leaving other options untouched
    pub fn map_type_ref(&self, f: &impl Fn(&str) -> String) -> Self {
        match self {
            Self::ValueType(t) => Self::ValueType(f(t)),
            Self::KeyType(t) => Self::KeyType(f(t)),
            other => other.clone(),
        }
    }
}

impl fmt::Display for TypeOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinCount(n) => write!(f, "[{}", n),
            Self::MaxCount(n) => write!(f, "]{}", n),
            Self::MinValue(n) => write!(f, "{{{}", n),
            Self::MaxValue(n) => write!(f, "}}{}", n),
            Self::MinFloat(n) => write!(f, "y{}", n),
            Self::MaxFloat(n) => write!(f, "z{}", n),
            Self::ValueType(t) => write!(f, "*{}", t),
            Self::KeyType(t) => write!(f, "+{}", t),
            Self::Format(s) => write!(f, "/{}", s),
            Self::Pattern(s) => write!(f, "%{}", s),
            Self::Default(s) => write!(f, "!{}", s),
        }
    }
}

// =============================================================================
// Fields
// =============================================================================

/// Enumerated item
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemField {
    pub id: u32,
    pub value: String,
    pub description: String,
}

/// Structured field of a Record, Array or Choice
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructField {
    pub id: u32,
    pub name: String,
    pub type_ref: TypeRef,
    pub options: Vec<TypeOption>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    Item(ItemField),
    Struct(StructField),
}

impl Field {
    pub fn item(id: u32, value: impl Into<String>, description: impl Into<String>) -> Self {
        Field::Item(ItemField {
            id,
            value: value.into(),
            description: description.into(),
        })
    }

    pub fn structured(
        id: u32,
        name: impl Into<String>,
        type_ref: impl Into<TypeRef>,
        options: Vec<TypeOption>,
        description: impl Into<String>,
    ) -> Self {
        Field::Struct(StructField {
            id,
            name: name.into(),
            type_ref: type_ref.into(),
            options,
            description: description.into(),
        })
    }

    pub fn as_struct(&self) -> Option<&StructField> {
        match self {
            Field::Struct(f) => Some(f),
            Field::Item(_) => None,
        }
    }
}

// =============================================================================
// Canonical Type
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalType {
    pub name: TypeName,
    pub base_kind: BaseKind,
    pub options: Vec<TypeOption>,
    pub description: String,
    pub fields: Vec<Field>,
}

/// Build a canonical type. Pure: no registration, no naming side effects.
pub fn make_type(
    name: impl Into<TypeName>,
    base_kind: BaseKind,
    options: Vec<TypeOption>,
    description: impl Into<String>,
    fields: Vec<Field>,
) -> CanonicalType {
    CanonicalType {
        name: name.into(),
        base_kind,
        options,
        description: description.into(),
        fields,
    }
}

impl CanonicalType {
    /// Same kind, options and fields. Descriptions are not structural.
    pub fn same_structure(&self, other: &CanonicalType) -> bool {
        self.base_kind == other.base_kind && self.options == other.options && self.fields == other.fields
    }

    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Names of the declared types this type refers to (builtins excluded)
    pub fn references(&self) -> impl Iterator<Item = &str> {
        let from_fields = self
            .fields
            .iter()
            .filter_map(Field::as_struct)
            .flat_map(|f| {
                std::iter::once(f.type_ref.as_str()).chain(f.options.iter().filter_map(TypeOption::type_ref))
            });
        let from_options = self.options.iter().filter_map(TypeOption::type_ref);
        from_fields.chain(from_options).filter(|name| !is_builtin(name))
    }

    /// Copy of this type with its own name and every reference rewritten
    pub fn rename(&self, f: &impl Fn(&str) -> String) -> CanonicalType {
        let fields = self
            .fields
            .iter()
            .map(|field| match field {
                Field::Item(item) => Field::Item(item.clone()),
                Field::Struct(sf) => Field::Struct(StructField {
                    type_ref: f(&sf.type_ref),
                    options: sf.options.iter().map(|o| o.map_type_ref(f)).collect(),
                    ..sf.clone()
                }),
            })
            .collect();
        CanonicalType {
            name: f(&self.name),
            base_kind: self.base_kind,
            options: self.options.iter().map(|o| o.map_type_ref(f)).collect(),
            description: self.description.clone(),
            fields,
        }
    }

    /// Option strings in the IR text form. Choice types lead with their
    /// discipline code.
    pub fn option_strings(&self) -> Vec<String> {
        let mut opts = Vec::with_capacity(self.options.len() + 1);
        if let BaseKind::Choice(discipline) = self.base_kind {
            opts.push(discipline.code().to_string());
        }
        opts.extend(self.options.iter().map(|o| o.to_string()));
        opts
    }
}

impl Serialize for CanonicalType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(5))?;
        seq.serialize_element(&self.name)?;
        seq.serialize_element(self.base_kind.as_str())?;
        seq.serialize_element(&self.option_strings())?;
        seq.serialize_element(&self.description)?;
        seq.serialize_element(&self.fields)?;
        seq.end()
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Field::Item(item) => (item.id, &item.value, &item.description).serialize(serializer),
            Field::Struct(f) => {
                let opts: Vec<String> = f.options.iter().map(|o| o.to_string()).collect();
                (f.id, &f.name, &f.type_ref, opts, &f.description).serialize(serializer)
            }
        }
    }
}

// =============================================================================
// Type Table
// =============================================================================

/// Append-only table of canonical types, unique by name.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    types: Vec<CanonicalType>,
    index: HashMap<TypeName, usize>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a type. Returns `Ok(true)` if it was new, `Ok(false)` if a
    /// structurally identical record already holds the name.
    pub fn insert(&mut self, t: CanonicalType) -> Result<bool> {
        if let Some(&idx) = self.index.get(&t.name) {
            if self.types[idx].same_structure(&t) {
                return Ok(false);
            }
            return Err(TranslateError::TypeConflict { name: t.name });
        }
        self.index.insert(t.name.clone(), self.types.len());
        self.types.push(t);
        Ok(true)
    }

    pub fn get(&self, name: &str) -> Option<&CanonicalType> {
        self.index.get(name).map(|&idx| &self.types[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Types in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &CanonicalType> {
        self.types.iter()
    }

    pub fn as_slice(&self) -> &[CanonicalType] {
        &self.types
    }

    pub fn into_vec(self) -> Vec<CanonicalType> {
        self.types
    }
}

impl TypeTable {
    /// Build a table from already-canonical types, applying the same dedup
    pub fn from_types(types: impl IntoIterator<Item = CanonicalType>) -> Result<Self> {
        let mut table = TypeTable::new();
        for t in types {
            table.insert(t)?;
        }
        Ok(table)
    }
}
