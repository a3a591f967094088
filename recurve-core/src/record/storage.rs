//! Storage and aggregation of records.
use super::{Record, RecordValue};
use std::collections::HashSet;

/// Stores records and aggregates them on demand.
///
/// Scalar values observed more than once between flushes are summarized with
/// min/max/mean/median; all other value types keep their most recent
/// occurrence.
pub struct RecordStorage {
    data: Vec<Record>,
}

fn min(vs: &Vec<f32>) -> RecordValue {
    RecordValue::Scalar(*vs.iter().min_by(|x, y| x.total_cmp(y)).unwrap())
}

fn max(vs: &Vec<f32>) -> RecordValue {
    RecordValue::Scalar(*vs.iter().max_by(|x, y| x.total_cmp(y)).unwrap())
}

fn mean(vs: &Vec<f32>) -> RecordValue {
    RecordValue::Scalar(vs.iter().map(|v| *v).sum::<f32>() / vs.len() as f32)
}

fn median(mut vs: Vec<f32>) -> RecordValue {
    vs.sort_by(|x, y| x.total_cmp(y));
    RecordValue::Scalar(vs[vs.len() / 2])
}

impl RecordStorage {
    /// Creates a new empty storage.
    pub fn new() -> Self {
        Self { data: vec![] }
    }

    /// Stores a record.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    fn get_keys(&self) -> HashSet<String> {
        let mut keys = HashSet::new();
        for record in self.data.iter() {
            for k in record.keys() {
                keys.insert(k.clone());
            }
        }
        keys
    }

    /// The most recent value of the key, regardless of its type.
    fn latest(&self, key: &str) -> Record {
        for record in self.data.iter().rev() {
            if let Some(value) = record.get(key) {
                return Record::from_slice(&[(key, value.clone())]);
            }
        }
        unreachable!("key taken from the stored records");
    }

    fn scalar(&self, key: &str) -> Record {
        let vs: Vec<f32> = self
            .data
            .iter()
            .filter_map(|record| match record.get(key) {
                Some(RecordValue::Scalar(v)) => Some(*v),
                Some(_) => panic!("Expect RecordValue::Scalar for {}", key),
                None => None,
            })
            .collect();

        if vs.len() == 1 {
            Record::from_slice(&[(key.to_string(), RecordValue::Scalar(vs[0]))])
        } else {
            Record::from_slice(&[
                (format!("{}_min", key), min(&vs)),
                (format!("{}_max", key), max(&vs)),
                (format!("{}_mean", key), mean(&vs)),
                (format!("{}_median", key), median(vs)),
            ])
        }
    }

    /// Aggregates all stored records and clears the storage.
    pub fn aggregate(&mut self) -> Record {
        let mut record = Record::empty();

        for key in self.get_keys().iter() {
            let is_scalar = self.data.iter().rev().find_map(|r| r.get(key)).map_or(
                false,
                |v| matches!(v, RecordValue::Scalar(..)),
            );
            let r = if is_scalar {
                self.scalar(key)
            } else {
                self.latest(key)
            };
            record = record.merge(r);
        }

        self.data = vec![];

        record
    }
}

impl Default for RecordStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregates_repeated_scalars() {
        let mut storage = RecordStorage::new();
        for v in [1.0f32, 2.0, 3.0].iter() {
            storage.store(Record::from_scalar("loss", *v));
        }

        let agg = storage.aggregate();
        assert_eq!(agg.get_scalar("loss_min").unwrap(), 1.0);
        assert_eq!(agg.get_scalar("loss_max").unwrap(), 3.0);
        assert_eq!(agg.get_scalar("loss_mean").unwrap(), 2.0);
        assert_eq!(agg.get_scalar("loss_median").unwrap(), 2.0);

        // Aggregation drains the storage.
        assert!(storage.aggregate().is_empty());
    }

    #[test]
    fn single_scalar_passes_through() {
        let mut storage = RecordStorage::new();
        storage.store(Record::from_scalar("eps", 0.1));
        assert_eq!(storage.aggregate().get_scalar("eps").unwrap(), 0.1);
    }
}
