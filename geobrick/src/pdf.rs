use std::{fmt::Display, ops::Deref};

use fnv::FnvBuildHasher;
use indexmap::IndexMap;

pub use self::{
    array::Array,
    indirect::ObjectId,
    name::Name,
    string::PdfString,
    trailer::Trailer,
    xref::{XrefEntry, XrefTable},
};

mod array;
pub mod document;
mod indirect;
mod name;
mod string;
pub mod trailer;
pub mod xref;

/// PDF dictionary. Keys keep their insertion order so that the serialized
/// output is deterministic.
pub type Dictionary = IndexMap<Name, Object, FnvBuildHasher>;

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    String(PdfString),
    HexString(Bytes),
    /// A real number. `as_string` requests the numeric-as-string form used by
    /// the OGC best practice dictionaries to keep full precision.
    Real { value: f64, as_string: bool },
    Integer(i64),
    Bool(bool),
    Name(Name),
    Array(Array),
    Dictionary(Dictionary),
    Null,
    Reference(ObjectId),
}

impl Object {
    /// Real number written with full precision as a PDF string.
    pub fn precise(value: f64) -> Self {
        Self::Real { value, as_string: true }
    }

    pub fn name(n: &str) -> Self {
        Self::Name(Name::from_str(n))
    }

    pub fn text(s: &str) -> Self {
        Self::String(PdfString::from(s))
    }

    pub fn integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn real(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Real { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn reference(&self) -> Option<ObjectId> {
        if let Self::Reference(r) = self {
            Some(*r)
        } else {
            None
        }
    }

    pub fn array(&self) -> Option<&Array> {
        if let Self::Array(a) = self {
            Some(a)
        } else {
            None
        }
    }

    pub fn dictionary(&self) -> Option<&Dictionary> {
        if let Self::Dictionary(d) = self {
            Some(d)
        } else {
            None
        }
    }

    pub fn string(&self) -> Option<&PdfString> {
        if let Self::String(s) = self {
            Some(s)
        } else {
            None
        }
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Object::String(obj) => obj.fmt(f),
            Object::HexString(obj) => obj.fmt(f),
            Object::Real { value, .. } => value.fmt(f),
            Object::Integer(obj) => obj.fmt(f),
            Object::Bool(obj) => obj.fmt(f),
            Object::Name(obj) => obj.fmt(f),
            Object::Array(obj) => obj.fmt(f),
            Object::Dictionary(d) => write!(f, "Dictionary({} entries)", d.len()),
            Object::Null => write!(f, "NULL"),
            Object::Reference(obj) => obj.fmt(f),
        }
    }
}

impl From<bool> for Object {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Object {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Object {
    fn from(v: i32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<usize> for Object {
    fn from(v: usize) -> Self {
        Self::Integer(v as i64)
    }
}

impl From<f64> for Object {
    fn from(value: f64) -> Self {
        Self::Real {
            value,
            as_string: false,
        }
    }
}

impl From<PdfString> for Object {
    fn from(v: PdfString) -> Self {
        Self::String(v)
    }
}

impl From<Name> for Object {
    fn from(n: Name) -> Self {
        Self::Name(n)
    }
}

impl From<ObjectId> for Object {
    fn from(r: ObjectId) -> Self {
        Self::Reference(r)
    }
}

impl From<Vec<Object>> for Object {
    fn from(a: Vec<Object>) -> Self {
        Self::Array(a.into())
    }
}

impl From<Array> for Object {
    fn from(a: Array) -> Self {
        Self::Array(a)
    }
}

impl From<Dictionary> for Object {
    fn from(d: Dictionary) -> Self {
        Self::Dictionary(d)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bytes(Vec<u8>);

impl From<Vec<u8>> for Bytes {
    fn from(v: Vec<u8>) -> Self {
        Bytes(v)
    }
}

impl Deref for Bytes {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for Bytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let limited_length = self.len().min(15);
        write!(f, "{}", &String::from_utf8_lossy(&self.0[..limited_length]))
    }
}

/// Build a [`Dictionary`] from `(key, value)` pairs, keeping their order.
pub fn dict<const N: usize>(entries: [(&str, Object); N]) -> Dictionary {
    let mut d = Dictionary::with_capacity_and_hasher(N, FnvBuildHasher::default());
    for (k, v) in entries {
        d.insert(Name::from_str(k), v);
    }
    d
}
