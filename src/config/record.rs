//! Attribute-style access to raw document data.

use crate::tree::{Mapping, TreeError, Value};

/// Read-only projection of a raw mapping where each key is looked up as a
/// single name. Dots in names carry no meaning here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record<'a> {
    data: &'a Mapping,
}

/// What an attribute of a [`Record`] resolves to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<'a> {
    Value(&'a Value),
    Record(Record<'a>),
}

impl<'a> Field<'a> {
    pub fn as_value(&self) -> Option<&'a Value> {
        match *self {
            Field::Value(value) => Some(value),
            Field::Record(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<Record<'a>> {
        match *self {
            Field::Record(record) => Some(record),
            Field::Value(_) => None,
        }
    }
}

impl<'a> Record<'a> {
    pub fn new(data: &'a Mapping) -> Self {
        Self { data }
    }

    /// Resolves `name`. Nested mappings come back as records.
    pub fn attr(&self, name: &str) -> Result<Field<'a>, TreeError> {
        match self.data.get(name) {
            Some(Value::Map(inner)) => Ok(Field::Record(Record::new(inner))),
            Some(value) => Ok(Field::Value(value)),
            None => Err(TreeError::AttributeNotFound(name.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.data.keys().map(String::as_str)
    }
}
