//! Process-wide append-only audit log.
//!
//! Every entry is stored with a timestamp prefix and read back with a
//! dump-all operation. The ledger's decision path writes here; administrative
//! collaborators may too.

use chrono::Local;
use std::sync::Mutex;

pub struct AuditLog {
    entries: Mutex<Vec<String>>,
}

impl AuditLog {
    pub fn new() -> Self {
        AuditLog {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Append `text` as `<timestamp>: <text>`.
    pub fn append(&self, text: &str) {
        let stamped = format!("{}: {}", Local::now().format("%Y-%m-%d %H:%M:%S"), text);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push(stamped);
    }

    /// All entries in append order.
    pub fn dump(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_timestamped_and_ordered() {
        let log = AuditLog::new();
        log.append("first");
        log.append("second");

        let dump = log.dump();
        assert_eq!(dump.len(), 2);
        assert!(dump[0].ends_with(": first"));
        assert!(dump[1].ends_with(": second"));
    }

    #[test]
    fn dump_of_empty_log_is_empty() {
        assert!(AuditLog::new().dump().is_empty());
    }
}
