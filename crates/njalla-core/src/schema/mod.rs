//! Declarative resource schemas
//!
//! A [`Schema`] describes the fields of a resource type: their kind,
//! whether they are required, their default, whether changing them forces
//! the resource to be recreated, and an optional value constraint.
//!
//! Validation runs before a resource callback is invoked, so a value
//! outside an allowed set never reaches the remote API.

pub mod data;

pub use data::{ResourceData, Value};

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// Kind of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// UTF-8 string
    String,
    /// Signed integer
    Int,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::String => f.write_str("string"),
            FieldKind::Int => f.write_str("integer"),
        }
    }
}

/// Value constraint applied during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// Integer must be one of the listed values
    IntInSlice(&'static [i64]),
}

impl Validation {
    fn check(&self, key: &str, value: &Value) -> Result<()> {
        match (self, value) {
            (Validation::IntInSlice(allowed), Value::Int(v)) => {
                if allowed.contains(v) {
                    Ok(())
                } else {
                    Err(Error::validation(format!(
                        "expected {key} to be one of {allowed:?}, got {v}"
                    )))
                }
            }
            (Validation::IntInSlice(_), other) => Err(Error::validation(format!(
                "expected {key} to be an integer, got {other}"
            ))),
        }
    }
}

/// One field of a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    /// Value kind
    pub kind: FieldKind,
    /// Must be present after defaults are applied
    pub required: bool,
    /// Changing the value requires deleting and recreating the resource
    pub force_new: bool,
    /// Value used when the field is not set
    pub default: Option<Value>,
    /// Value constraint
    pub validate: Option<Validation>,
}

impl FieldSchema {
    /// A required string field
    pub fn string() -> Self {
        Self {
            kind: FieldKind::String,
            required: true,
            force_new: false,
            default: None,
            validate: None,
        }
    }

    /// A required integer field
    pub fn int() -> Self {
        Self {
            kind: FieldKind::Int,
            ..Self::string()
        }
    }

    /// Mark the field as forcing recreation on change
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Set a default value
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Attach a value constraint
    pub fn validate(mut self, validation: Validation) -> Self {
        self.validate = Some(validation);
        self
    }
}

/// Field schema of a resource type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: BTreeMap<&'static str, FieldSchema>,
}

impl Schema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field
    pub fn field(mut self, name: &'static str, field: FieldSchema) -> Self {
        self.fields.insert(name, field);
        self
    }

    /// Look up a field
    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    /// Iterate fields in name order
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &FieldSchema)> {
        self.fields.iter().map(|(k, v)| (*k, v))
    }

    /// Fill unset fields that have a default
    pub fn apply_defaults(&self, data: &mut ResourceData) {
        for (name, field) in &self.fields {
            if data.get(name).is_none() {
                if let Some(default) = &field.default {
                    data.set(name, default.clone());
                }
            }
        }
    }

    /// Check `data` against the schema
    ///
    /// Reports every problem found, joined into a single
    /// [`Error::Validation`]. Unknown fields are rejected.
    pub fn validate(&self, data: &ResourceData) -> Result<()> {
        let mut problems = Vec::new();

        for (name, field) in &self.fields {
            match data.get(name) {
                None if field.required => {
                    problems.push(format!("{name} is required"));
                }
                None => {}
                Some(value) if value.kind() != field.kind => {
                    problems.push(format!(
                        "{name} must be a {}, got {value}",
                        field.kind
                    ));
                }
                Some(value) => {
                    if let Some(validation) = &field.validate {
                        if let Err(Error::Validation(msg)) = validation.check(name, value) {
                            problems.push(msg);
                        }
                    }
                }
            }
        }

        for (name, _) in data.fields() {
            if !self.fields.contains_key(name) {
                problems.push(format!("unknown field {name}"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(problems.join("; ")))
        }
    }

    /// Names of force-new fields whose values differ between two instances
    pub fn force_new_changes(&self, prior: &ResourceData, desired: &ResourceData) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|(name, field)| field.force_new && prior.get(name) != desired.get(name))
            .map(|(name, _)| *name)
            .collect()
    }

    /// Names of fields whose values differ between two instances
    pub fn changed_fields(&self, prior: &ResourceData, desired: &ResourceData) -> Vec<&'static str> {
        self.fields
            .keys()
            .filter(|name| prior.get(name) != desired.get(name))
            .copied()
            .collect()
    }
}
