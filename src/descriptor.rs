//! Type descriptor tree negotiated for a query's input and output.
//!
//! Descriptors are produced by the negotiation layer, consumed read-only by
//! [`crate::walk`], and never cached. The serde form is the one recorded in
//! fixture files:
//!
//! ```json
//! { "kind": "object", "fields": [
//!     { "name": "id", "cardinality": "ONE", "type": { "kind": "scalar", "name": "string" } }
//! ] }
//! ```
use serde::{Deserialize, Serialize};

use crate::cardinality::Cardinality;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Descriptor {
    Null,
    Scalar(ScalarDescriptor),
    Object {
        fields: Vec<ObjectField>,
    },
    NamedTuple {
        elements: Vec<NamedElement>,
    },
    Array {
        element: Box<Descriptor>,
    },
    Tuple {
        elements: Vec<Descriptor>,
    },
    /// Child must be a scalar.
    Range {
        element: Box<Descriptor>,
    },
    /// Child must be a scalar.
    MultiRange {
        element: Box<Descriptor>,
    },
    /// Only valid as the type of an object field declared `MANY` or `AT_LEAST_ONE`.
    Set {
        element: Box<Descriptor>,
    },
    /// Input shape for session globals; never part of a query signature.
    SparseObject {
        elements: Vec<NamedElement>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarDescriptor {
    /// Base type name as the client spells it (`string`, `number`, `Date`, ...).
    pub name: String,
    /// The base type lives outside the client's builtins and must be imported.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub imported: bool,
    /// Present for enum scalars: literal values in declared order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectField {
    pub name: String,
    pub cardinality: Cardinality,
    #[serde(rename = "type")]
    pub ty: Descriptor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedElement {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Descriptor,
}

impl Descriptor {
    pub fn kind(&self) -> &'static str {
        match self {
            Descriptor::Null => "null",
            Descriptor::Scalar(s) if s.values.is_some() => "enum",
            Descriptor::Scalar(_) => "scalar",
            Descriptor::Object { .. } => "object",
            Descriptor::NamedTuple { .. } => "named_tuple",
            Descriptor::Array { .. } => "array",
            Descriptor::Tuple { .. } => "tuple",
            Descriptor::Range { .. } => "range",
            Descriptor::MultiRange { .. } => "multi_range",
            Descriptor::Set { .. } => "set",
            Descriptor::SparseObject { .. } => "sparse_object",
        }
    }

    pub fn scalar(name: impl Into<String>) -> Self {
        Descriptor::Scalar(ScalarDescriptor { name: name.into(), imported: false, values: None })
    }

    pub fn imported_scalar(name: impl Into<String>) -> Self {
        Descriptor::Scalar(ScalarDescriptor { name: name.into(), imported: true, values: None })
    }

    pub fn enumeration<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Descriptor::Scalar(ScalarDescriptor {
            name: name.into(),
            imported: false,
            values: Some(values.into_iter().map(Into::into).collect()),
        })
    }

    pub fn object<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Cardinality, Descriptor)>,
    {
        Descriptor::Object {
            fields: fields
                .into_iter()
                .map(|(name, cardinality, ty)| ObjectField { name: name.to_string(), cardinality, ty })
                .collect(),
        }
    }

    pub fn array(element: Descriptor) -> Self {
        Descriptor::Array { element: Box::new(element) }
    }

    pub fn set(element: Descriptor) -> Self {
        Descriptor::Set { element: Box::new(element) }
    }

    pub fn range(element: Descriptor) -> Self {
        Descriptor::Range { element: Box::new(element) }
    }

    pub fn multi_range(element: Descriptor) -> Self {
        Descriptor::MultiRange { element: Box::new(element) }
    }
}
