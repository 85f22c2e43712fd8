//! [`Secret`] implementations for the container shapes and models that
//! carry encrypted fields.

use std::collections::BTreeMap;

use super::{Secret, SecretError, Visitor};
use crate::model::Identity;

impl Secret for String {
    fn visit(&mut self, f: &mut Visitor<'_>) -> Result<(), SecretError> {
        f(self)
    }
}

impl<T: Secret> Secret for Option<T> {
    fn visit(&mut self, f: &mut Visitor<'_>) -> Result<(), SecretError> {
        match self {
            Some(inner) => inner.visit(f),
            None => Ok(()),
        }
    }
}

impl<T: Secret> Secret for Vec<T> {
    fn visit(&mut self, f: &mut Visitor<'_>) -> Result<(), SecretError> {
        for item in self.iter_mut() {
            item.visit(f)?;
        }
        Ok(())
    }
}

impl<T: Secret> Secret for BTreeMap<String, T> {
    fn visit(&mut self, f: &mut Visitor<'_>) -> Result<(), SecretError> {
        for value in self.values_mut() {
            value.visit(f)?;
        }
        Ok(())
    }
}

/// Every string nested anywhere in the value. Keys, numbers and booleans
/// are left alone.
impl Secret for serde_json::Value {
    fn visit(&mut self, f: &mut Visitor<'_>) -> Result<(), SecretError> {
        match self {
            serde_json::Value::String(s) => f(s),
            serde_json::Value::Array(items) => {
                for item in items.iter_mut() {
                    item.visit(f)?;
                }
                Ok(())
            }
            serde_json::Value::Object(map) => {
                for value in map.values_mut() {
                    value.visit(f)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl Secret for Identity {
    fn visit(&mut self, f: &mut Visitor<'_>) -> Result<(), SecretError> {
        f(&mut self.password)?;
        f(&mut self.key)?;
        f(&mut self.settings)
    }
}
