use crate::log::Error;
use serde::Serialize;
use serde_json::{to_value, Value};
use std::collections::HashMap;

/// Describes a type that expression sources can be evaluated against.
///
/// Implemented by [`Scope`], and by the renderer's internal scope stack so
/// that loop variables and local bindings shadow the caller's data.
pub trait Resolve {
    /// Return the value bound to the given name, if any.
    fn resolve(&self, name: &str) -> Option<&Value>;
}

/// Named bindings that templates are rendered against.
///
/// A `Scope` is owned by the caller and never mutated by a render; one
/// compiled template may be rendered against any number of scopes.
///
/// # Examples
///
/// ```
/// use lino::{compile, render, Scope};
///
/// let template = compile("Hello {{ name }}!").unwrap();
/// let scope = Scope::new().with_must("name", "Bot");
///
/// assert_eq!(render(&template, &scope).unwrap(), "Hello Bot!\n");
/// ```
pub struct Scope {
    data: HashMap<String, Value>,
}

impl Scope {
    /// Create a new Scope.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    /// Insert the value into the Scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the serialization fails.
    pub fn insert<S, T>(&mut self, key: S, value: T) -> Result<(), Error>
    where
        S: Into<String>,
        T: Serialize,
    {
        let key = key.into();
        match to_value(value) {
            Ok(value) => {
                self.data.insert(key, value);
                Ok(())
            }
            Err(_) => Err(Error::build(format!("value of `{key}` is unserializable"))),
        }
    }

    /// Insert the value into the Scope.
    ///
    /// # Panics
    ///
    /// Will panic if the serialization fails.
    #[inline]
    pub fn insert_must<S, T>(&mut self, key: S, value: T)
    where
        S: Into<String>,
        T: Serialize,
    {
        self.data.insert(key.into(), to_value(value).unwrap());
    }

    /// Insert the value into the Scope.
    ///
    /// Returns the Scope, so additional methods may be chained.
    ///
    /// # Errors
    ///
    /// Returns an error if the serialization fails.
    pub fn with<S, T>(mut self, key: S, value: T) -> Result<Self, Error>
    where
        S: Into<String>,
        T: Serialize,
    {
        self.insert(key, value)?;
        Ok(self)
    }

    /// Insert the value into the Scope.
    ///
    /// Returns the Scope, so additional methods may be chained.
    ///
    /// # Panics
    ///
    /// Will panic if the serialization fails.
    #[inline]
    pub fn with_must<S, T>(mut self, key: S, value: T) -> Self
    where
        S: Into<String>,
        T: Serialize,
    {
        self.insert_must(key, value);
        self
    }

    /// Get the value of the given key, if any.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolve for Scope {
    #[inline]
    fn resolve(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }
}
