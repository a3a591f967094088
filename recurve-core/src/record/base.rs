//! Base implementation of records.
use crate::error::RecurveError;
use chrono::prelude::{DateTime, Local};
use std::{
    collections::{
        hash_map::{Iter, Keys},
        HashMap,
    },
    convert::Into,
};

/// Represents possible types of values in a [`Record`].
#[derive(Debug, Clone)]
pub enum RecordValue {
    /// Scalar, e.g., metrics.
    Scalar(f32),

    /// DateTime.
    DateTime(DateTime<Local>),

    /// A 1-dimensional array.
    Array1(Vec<f32>),

    /// String.
    String(String),
}

/// Represents a record, a set of named values.
#[derive(Debug)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Construct empty record.
    pub fn empty() -> Self {
        Self {
            0: HashMap::new(),
        }
    }

    /// Create a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self {
            0: HashMap::from([(name.into(), RecordValue::Scalar(value))]),
        }
    }

    /// From slice of tuples `(key, value)`.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Get keys.
    pub fn keys(&self) -> Keys<String, RecordValue> {
        self.0.keys()
    }

    /// Insert a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Return an iterator over key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Get the value of the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merge records, the rhs overwriting on key collisions.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Merge another record into this one in place.
    pub fn merge_inplace(&mut self, record: Record) {
        for (k, v) in record.iter() {
            self.0.insert(k.clone(), v.clone());
        }
    }

    /// Get scalar value.
    ///
    /// * `key` - The key.
    pub fn get_scalar(&self, k: &str) -> Result<f32, RecurveError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::Scalar(v) => Ok(*v as _),
                _ => Err(RecurveError::RecordValueTypeError("Scalar".to_string())),
            }
        } else {
            Err(RecurveError::RecordKeyError(k.to_string()))
        }
    }

    /// Get 1-dimensional array.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, RecurveError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::Array1(v) => Ok(v.clone()),
                _ => Err(RecurveError::RecordValueTypeError("Array1".to_string())),
            }
        } else {
            Err(RecurveError::RecordKeyError(k.to_string()))
        }
    }

    /// Get String.
    pub fn get_string(&self, k: &str) -> Result<String, RecurveError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::String(s) => Ok(s.clone()),
                _ => Err(RecurveError::RecordValueTypeError("String".to_string())),
            }
        } else {
            Err(RecurveError::RecordKeyError(k.to_string()))
        }
    }

    /// Returns true if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.0.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_roundtrip_and_type_errors() {
        let mut record = Record::from_scalar("loss", 0.5);
        record.insert("name", RecordValue::String("drqn".to_string()));

        assert_eq!(record.get_scalar("loss").unwrap(), 0.5);
        assert!(matches!(
            record.get_scalar("name"),
            Err(RecurveError::RecordValueTypeError(_))
        ));
        assert!(matches!(
            record.get_scalar("missing"),
            Err(RecurveError::RecordKeyError(_))
        ));
    }

    #[test]
    fn merge_overwrites_with_rhs() {
        let a = Record::from_scalar("x", 1.0);
        let b = Record::from_scalar("x", 2.0);
        assert_eq!(a.merge(b).get_scalar("x").unwrap(), 2.0);
    }
}
