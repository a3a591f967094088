//! A recorder emitting records through the `log` facade.
use super::{Record, RecordStorage, Recorder, RecordValue};
use log::info;

/// Emits records through the [`log`] crate.
///
/// Written records appear immediately; stored records are aggregated by a
/// [`RecordStorage`] and emitted as one line per flush. This is the plain
/// stand-in for recorder backends with an external sink.
#[derive(Default)]
pub struct LogRecorder {
    storage: RecordStorage,
}

impl LogRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self {
            storage: RecordStorage::new(),
        }
    }

    fn format(record: &Record) -> String {
        let mut kvs: Vec<String> = record
            .iter()
            .map(|(k, v)| match v {
                RecordValue::Scalar(v) => format!("{}={:.4}", k, v),
                RecordValue::DateTime(t) => format!("{}={}", k, t.to_rfc3339()),
                RecordValue::Array1(v) => format!("{}=[{} values]", k, v.len()),
                RecordValue::String(s) => format!("{}={}", k, s),
            })
            .collect();
        kvs.sort();
        kvs.join(" ")
    }
}

impl Recorder for LogRecorder {
    fn write(&mut self, record: Record) {
        info!("{}", Self::format(&record));
    }

    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        let record = self.storage.aggregate();
        if !record.is_empty() {
            info!("opt_steps={} {}", step, Self::format(&record));
        }
    }
}
