//! Typed attribute storage shared across every scope in the network.
//!
//! One `AttributeStore` instance is created per scope named in spec §3:
//! actors, layers, nodes-of-a-layer, edges-of-a-(layer,layer)-cell. All four
//! scopes share this single implementation (§4.1.1) — the only thing that
//! differs between them is which raw id space keys the store, which is the
//! caller's concern, not this module's.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Declared type of an attribute. Queried values coerce to one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeType {
    /// `f64`-valued attribute; default `0.0`.
    Numeric,
    /// `String`-valued attribute; default `""`.
    String,
}

/// A typed, lazily-populated attribute store keyed by raw object id.
///
/// `declare` fails with [`Error::AlreadyExists`] on a duplicate name;
/// `get_*`/`set_*` fail with [`Error::NotFound`] when the name was never
/// declared. Reading a declared name for an object with no stored value
/// returns the type's default rather than failing (§3 invariant).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeStore {
    schema: IndexMap<String, AttributeType>,
    numeric: IndexMap<(u64, String), f64>,
    string: IndexMap<(u64, String), String>,
}

impl AttributeStore {
    /// Empty store with no declared attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a new attribute name with its type.
    pub fn declare(&mut self, name: impl Into<String>, ty: AttributeType) -> Result<()> {
        let name = name.into();
        if self.schema.contains_key(&name) {
            return Err(Error::AlreadyExists(format!("attribute `{name}`")));
        }
        self.schema.insert(name, ty);
        Ok(())
    }

    /// Declare `name` if absent; no-op (not an error) if already declared
    /// with the same type. Used for attributes the crate manages itself
    /// (e.g. the `weight` attribute on edges).
    pub fn declare_if_absent(&mut self, name: &str, ty: AttributeType) {
        if !self.schema.contains_key(name) {
            self.schema.insert(name.to_string(), ty);
        }
    }

    fn require_type(&self, name: &str, expected: AttributeType) -> Result<()> {
        match self.schema.get(name) {
            Some(t) if *t == expected => Ok(()),
            Some(_) => Err(Error::InvalidArgument(format!(
                "attribute `{name}` is not {expected:?}"
            ))),
            None => Err(Error::NotFound(format!("attribute `{name}`"))),
        }
    }

    /// Set a numeric value for `obj` under `name`.
    pub fn set_numeric(&mut self, obj: u64, name: &str, value: f64) -> Result<()> {
        self.require_type(name, AttributeType::Numeric)?;
        self.numeric.insert((obj, name.to_string()), value);
        Ok(())
    }

    /// Set a string value for `obj` under `name`.
    pub fn set_string(&mut self, obj: u64, name: &str, value: impl Into<String>) -> Result<()> {
        self.require_type(name, AttributeType::String)?;
        self.string.insert((obj, name.to_string()), value.into());
        Ok(())
    }

    /// Read a numeric value, defaulting to `0.0` if never set.
    pub fn get_numeric(&self, obj: u64, name: &str) -> Result<f64> {
        self.require_type(name, AttributeType::Numeric)?;
        Ok(self
            .numeric
            .get(&(obj, name.to_string()))
            .copied()
            .unwrap_or(0.0))
    }

    /// Read a string value, defaulting to `""` if never set.
    pub fn get_string(&self, obj: u64, name: &str) -> Result<String> {
        self.require_type(name, AttributeType::String)?;
        Ok(self
            .string
            .get(&(obj, name.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    /// Reset (erase) every value stored for `obj`, across all attributes.
    pub fn reset(&mut self, obj: u64) {
        self.numeric.retain(|(o, _), _| *o != obj);
        self.string.retain(|(o, _), _| *o != obj);
    }

    /// Declared attribute names and their types, in declaration order.
    pub fn list(&self) -> impl Iterator<Item = (&str, AttributeType)> {
        self.schema.iter().map(|(n, t)| (n.as_str(), *t))
    }
}
