//! Cumulative engine statistics.

use crate::types::{Severity, ValidationResult};

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Snapshot of the counters accumulated since creation or the last reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Files validated, including cache hits.
    pub files_processed: usize,
    /// Rule applications (one per applicable rule per evaluated file).
    pub rules_executed: usize,
    /// Violations across all files.
    pub total_violations: usize,
    /// Violations per severity.
    pub violations_by_severity: BTreeMap<Severity, usize>,
    /// Sum of per-file execution times.
    pub total_execution_time: Duration,
    /// `total_execution_time / files_processed`, zero when nothing ran.
    pub average_execution_time: Duration,
    /// Files answered from the result cache.
    pub cache_hits: usize,
}

impl EngineStats {
    /// Violations recorded for one severity.
    #[must_use]
    pub fn violations_of(&self, severity: Severity) -> usize {
        self.violations_by_severity.get(&severity).copied().unwrap_or(0)
    }
}

/// Accumulates per-file results. Never resets itself.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    files_processed: usize,
    rules_executed: usize,
    total_violations: usize,
    violations_by_severity: BTreeMap<Severity, usize>,
    total_execution_time: Duration,
    cache_hits: usize,
}

impl StatsAggregator {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an evaluated file and how many rules ran against it.
    pub fn record(&mut self, result: &ValidationResult, rules_executed: usize) {
        self.rules_executed += rules_executed;
        self.record_file(result);
    }

    /// Records a file answered from the cache.
    pub fn record_cache_hit(&mut self, result: &ValidationResult) {
        self.cache_hits += 1;
        self.record_file(result);
    }

    fn record_file(&mut self, result: &ValidationResult) {
        self.files_processed += 1;
        self.total_violations += result.violations().len();
        for v in result.violations() {
            *self.violations_by_severity.entry(v.severity).or_insert(0) += 1;
        }
        self.total_execution_time += result.execution_time();
    }

    /// Current counters.
    #[must_use]
    pub fn snapshot(&self) -> EngineStats {
        let average_execution_time = u32::try_from(self.files_processed)
            .ok()
            .filter(|n| *n > 0)
            .map_or(Duration::ZERO, |n| self.total_execution_time / n);

        EngineStats {
            files_processed: self.files_processed,
            rules_executed: self.rules_executed,
            total_violations: self.total_violations,
            violations_by_severity: self.violations_by_severity.clone(),
            total_execution_time: self.total_execution_time,
            average_execution_time,
            cache_hits: self.cache_hits,
        }
    }

    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Violation;

    fn result(severities: &[Severity], ms: u64) -> ValidationResult {
        let violations = severities
            .iter()
            .map(|s| Violation::new("r", *s, "m"))
            .collect();
        ValidationResult::new("a.ts", violations, Duration::from_millis(ms))
    }

    #[test]
    fn accumulates_across_records() {
        let mut stats = StatsAggregator::new();
        stats.record(&result(&[Severity::Error, Severity::Warning], 10), 3);
        stats.record(&result(&[Severity::Error], 30), 2);

        let snap = stats.snapshot();
        assert_eq!(snap.files_processed, 2);
        assert_eq!(snap.rules_executed, 5);
        assert_eq!(snap.total_violations, 3);
        assert_eq!(snap.violations_of(Severity::Error), 2);
        assert_eq!(snap.violations_of(Severity::Warning), 1);
        assert_eq!(snap.violations_of(Severity::Info), 0);
        assert_eq!(snap.total_execution_time, Duration::from_millis(40));
        assert_eq!(snap.average_execution_time, Duration::from_millis(20));
    }

    #[test]
    fn cache_hits_do_not_count_rule_executions() {
        let mut stats = StatsAggregator::new();
        stats.record_cache_hit(&result(&[Severity::Info], 0));
        let snap = stats.snapshot();
        assert_eq!(snap.files_processed, 1);
        assert_eq!(snap.rules_executed, 0);
        assert_eq!(snap.cache_hits, 1);
        assert_eq!(snap.total_violations, 1);
    }

    #[test]
    fn empty_average_is_zero() {
        assert_eq!(StatsAggregator::new().snapshot().average_execution_time, Duration::ZERO);
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut stats = StatsAggregator::new();
        stats.record(&result(&[Severity::Error], 5), 1);
        stats.reset();
        assert_eq!(stats.snapshot(), EngineStats::default());
    }
}
