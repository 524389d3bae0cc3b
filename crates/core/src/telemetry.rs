use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use crate::intent::EditIntent;

/// Point-in-time view of the suggestion counters.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TelemetryReport {
    pub total_suggestions: u64,
    pub accepted_suggestions: u64,
    pub rejected_suggestions: u64,
    pub suggestions_by_intent: BTreeMap<EditIntent, u64>,
    pub acceptance_rate: f64,
}

#[derive(Debug, Default)]
struct Counters {
    issued: u64,
    accepted: u64,
    rejected: u64,
    by_intent: BTreeMap<EditIntent, u64>,
}

/// Process-lifetime tallies of suggestions issued/accepted/rejected.
/// Reset only on process restart.
#[derive(Debug, Default)]
pub struct SuggestionTelemetry {
    counters: Mutex<Counters>,
}

impl SuggestionTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_issued(&self, intent: EditIntent) {
        let mut counters = self.lock();
        counters.issued += 1;
        *counters.by_intent.entry(intent).or_insert(0) += 1;
    }

    pub fn record_accepted(&self) {
        self.lock().accepted += 1;
    }

    pub fn record_rejected(&self) {
        self.lock().rejected += 1;
    }

    pub fn snapshot(&self) -> TelemetryReport {
        let counters = self.lock();
        let acceptance_rate = if counters.issued == 0 {
            0.0
        } else {
            counters.accepted as f64 / counters.issued as f64
        };

        TelemetryReport {
            total_suggestions: counters.issued,
            accepted_suggestions: counters.accepted,
            rejected_suggestions: counters.rejected,
            suggestions_by_intent: counters.by_intent.clone(),
            acceptance_rate,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        match self.counters.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::intent::EditIntent;

    use super::SuggestionTelemetry;

    #[test]
    fn acceptance_rate_is_zero_with_no_suggestions() {
        let telemetry = SuggestionTelemetry::new();
        let report = telemetry.snapshot();
        assert_eq!(report.total_suggestions, 0);
        assert_eq!(report.acceptance_rate, 0.0);
    }

    #[test]
    fn counters_tally_by_intent() {
        let telemetry = SuggestionTelemetry::new();
        telemetry.record_issued(EditIntent::CreativeRewrite);
        telemetry.record_issued(EditIntent::CreativeRewrite);
        telemetry.record_issued(EditIntent::Localization);
        telemetry.record_accepted();
        telemetry.record_rejected();

        let report = telemetry.snapshot();
        assert_eq!(report.total_suggestions, 3);
        assert_eq!(report.accepted_suggestions, 1);
        assert_eq!(report.rejected_suggestions, 1);
        assert_eq!(report.suggestions_by_intent.get(&EditIntent::CreativeRewrite), Some(&2));
        assert!((report.acceptance_rate - 1.0 / 3.0).abs() < 1e-9);
    }
}
