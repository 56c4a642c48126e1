use crate::tpl::BoundQuery;
use dashmap::DashMap;
use std::collections::HashMap;
use tracing::debug;

/// Diagnostic record of executed statements, keyed by bound query shape.
///
/// Holds the last literal rendering of each shape and how often it ran. A
/// disabled recorder does no rendering at all.
#[derive(Debug, Default)]
pub struct DebugRecorder {
    enabled: bool,
    statements: DashMap<String, String>,
    counts: DashMap<String, u64>,
}

impl DebugRecorder {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Records one execution of `bound`, whose dialect form is `key`.
    pub fn record(&self, key: &str, bound: &BoundQuery) {
        if !self.enabled {
            return;
        }
        let literal = bound.render_literal();
        debug!("{}", literal);
        self.statements.insert(key.to_string(), literal);
        *self.counts.entry(key.to_string()).or_insert(0) += 1;
    }

    pub fn statement(&self, key: &str) -> Option<String> {
        self.statements.get(key).map(|v| v.value().clone())
    }

    pub fn count(&self, key: &str) -> u64 {
        self.counts.get(key).map(|v| *v.value()).unwrap_or(0)
    }

    /// Snapshot of bound query to its literal text.
    pub fn statements(&self) -> HashMap<String, String> {
        self.statements
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    /// Snapshot of bound query to execution count.
    pub fn counts(&self) -> HashMap<String, u64> {
        self.counts
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::tpl::bind_named;
    use std::sync::Arc;

    #[test]
    fn test_one_entry_per_shape() {
        let recorder = DebugRecorder::new(true);
        let tpl = "SELECT * FROM user WHERE name = :name";

        for name in ["a", "b", "c"] {
            let bound = bind_named(tpl, &args! { "name" => name }).unwrap();
            recorder.record(&bound.sql, &bound);
        }

        let key = "SELECT * FROM user WHERE name = ?";
        assert_eq!(recorder.statements().len(), 1);
        assert_eq!(recorder.count(key), 3);
        assert_eq!(
            recorder.statement(key).as_deref(),
            Some("SELECT * FROM user WHERE name = \"c\";")
        );
    }

    #[test]
    fn test_collection_length_changes_shape() {
        let recorder = DebugRecorder::new(true);
        let tpl = "DELETE FROM t WHERE id IN (:ids)";
        for ids in [vec![1], vec![1, 2], vec![3]] {
            let bound = bind_named(tpl, &args! { "ids" => ids }).unwrap();
            recorder.record(&bound.sql, &bound);
        }
        let counts = recorder.counts();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["DELETE FROM t WHERE id IN (?)"], 2);
        assert_eq!(counts["DELETE FROM t WHERE id IN (?, ?)"], 1);
    }

    #[test]
    fn test_disabled_records_nothing() {
        let recorder = DebugRecorder::disabled();
        let bound = bind_named("SELECT :x", &args! { "x" => 1 }).unwrap();
        recorder.record(&bound.sql, &bound);
        assert!(recorder.statements().is_empty());
        assert_eq!(recorder.count(&bound.sql), 0);
    }

    #[test]
    fn test_concurrent_records() {
        let recorder = Arc::new(DebugRecorder::new(true));
        let bound = Arc::new(bind_named("SELECT :x", &args! { "x" => 1 }).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let recorder = recorder.clone();
                let bound = bound.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        recorder.record(&bound.sql, &bound);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(recorder.count("SELECT ?"), 800);
    }
}
