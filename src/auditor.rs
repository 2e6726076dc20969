use crate::normalizer::normalize_currency;
use crate::schema::{MetricRecord, MetricStatus};
use log::debug;
use std::collections::HashMap;

const TOTAL_ASSETS: &str = "total assets";
const TOTAL_LIABILITIES: &str = "total liabilities";
const TOTAL_SHAREHOLDERS_EQUITY: &str = "total shareholders' equity";
const TOTAL_EQUITY: &str = "total equity";

/// Applies the reconciliation rules and the period-over-period change
/// computation to a batch of metric records.
///
/// The auditor is infallible by design: values that fail to normalize simply
/// drop out of the reconciliation lookup, and rules with missing inputs are
/// inconclusive rather than failing. Auditing never blocks presentation of
/// the raw extracted data.
pub struct ReconciliationAuditor {
    relative_tolerance: f64,
    absolute_tolerance: f64,
}

impl Default for ReconciliationAuditor {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconciliationAuditor {
    pub fn new() -> Self {
        Self {
            relative_tolerance: 0.01,
            absolute_tolerance: 1.0,
        }
    }

    /// Overrides the default tolerance of 1% relative / 1.0 absolute.
    pub fn with_tolerance(relative: f64, absolute: f64) -> Self {
        Self {
            relative_tolerance: relative,
            absolute_tolerance: absolute,
        }
    }

    /// Annotates every record in place with a `status` and a
    /// `percentage_change`. Same length and order as the input; records are
    /// audited exactly once per invocation.
    pub fn audit(&self, records: &mut [MetricRecord]) {
        let lookup = build_lookup(records);
        debug!(
            "Reconciliation lookup holds {} of {} records",
            lookup.len(),
            records.len()
        );

        for record in records.iter_mut() {
            record.status = self.reconcile(record, &lookup);
            record.percentage_change = percentage_change(
                record.value_previous.as_deref(),
                record.value_current.as_deref(),
            );
        }
    }

    /// The two rules are mutually exclusive: declared sub-components take
    /// precedence, and only records without them are candidates for the
    /// balance-sheet identity.
    fn reconcile(&self, record: &MetricRecord, lookup: &HashMap<String, f64>) -> MetricStatus {
        if !record.sub_components.is_empty() {
            self.check_sub_components(record, lookup)
        } else if record.lookup_key() == TOTAL_ASSETS {
            self.check_balance_sheet_identity(record, lookup)
        } else {
            MetricStatus::Extracted
        }
    }

    /// Sum-of-children rule: the normalized current-period values of every
    /// declared child must add up to the parent's own value. An unresolved
    /// parent or child leaves the rule inconclusive.
    fn check_sub_components(
        &self,
        record: &MetricRecord,
        lookup: &HashMap<String, f64>,
    ) -> MetricStatus {
        let Some(&parent_val) = lookup.get(&record.lookup_key()) else {
            return MetricStatus::Extracted;
        };

        let mut children_sum = 0.0;
        for child in &record.sub_components {
            match lookup.get(&child.trim().to_lowercase()) {
                Some(val) => children_sum += val,
                None => {
                    debug!(
                        "Sub-component '{}' of '{}' not found; rule inconclusive",
                        child, record.metric
                    );
                    return MetricStatus::Extracted;
                }
            }
        }

        if self.within_tolerance(parent_val, children_sum) {
            MetricStatus::Verified
        } else {
            MetricStatus::MathMismatch
        }
    }

    /// Balance-sheet identity: Assets = Liabilities + Equity, with the
    /// equity key falling back from "total shareholders' equity" to
    /// "total equity". Missing inputs leave the rule inconclusive.
    fn check_balance_sheet_identity(
        &self,
        record: &MetricRecord,
        lookup: &HashMap<String, f64>,
    ) -> MetricStatus {
        let liabilities = lookup.get(TOTAL_LIABILITIES);
        let equity = lookup
            .get(TOTAL_SHAREHOLDERS_EQUITY)
            .or_else(|| lookup.get(TOTAL_EQUITY));
        let actual = lookup.get(&record.lookup_key());

        match (liabilities, equity, actual) {
            (Some(l), Some(e), Some(a)) => {
                if self.within_tolerance(l + e, *a) {
                    MetricStatus::Verified
                } else {
                    MetricStatus::MathMismatch
                }
            }
            _ => MetricStatus::Extracted,
        }
    }

    /// Tolerance is relative to the expected magnitude with an absolute
    /// floor: `max(|expected| * relative, absolute)`.
    fn within_tolerance(&self, expected: f64, actual: f64) -> bool {
        let tolerance = (expected.abs() * self.relative_tolerance).max(self.absolute_tolerance);
        (expected - actual).abs() <= tolerance
    }
}

/// Maps each record's lookup key to its normalized current-period value.
/// Built fresh per audit pass; previous-period values never participate.
/// Duplicate metric names keep the last occurrence.
fn build_lookup(records: &[MetricRecord]) -> HashMap<String, f64> {
    let mut lookup = HashMap::new();

    for record in records {
        if record.metric.trim().is_empty() {
            continue;
        }
        if let Some(value) = record
            .value_current
            .as_deref()
            .and_then(normalize_currency)
        {
            lookup.insert(record.lookup_key(), value);
        }
    }

    lookup
}

/// Period-over-period change in percent, rounded to 2 decimal places.
/// `None` when either value fails to normalize or the previous-period value
/// is exactly zero.
pub fn percentage_change(previous: Option<&str>, current: Option<&str>) -> Option<f64> {
    let previous = normalize_currency(previous?)?;
    let current = normalize_currency(current?)?;

    if previous == 0.0 {
        return None;
    }

    let change = ((current - previous) / previous.abs()) * 100.0;
    Some((change * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(metric: &str, current: &str) -> MetricRecord {
        let mut r = MetricRecord::new(metric);
        r.value_current = Some(current.to_string());
        r
    }

    fn parent(metric: &str, current: &str, children: &[&str]) -> MetricRecord {
        let mut r = record(metric, current);
        r.sub_components = children.iter().map(|c| c.to_string()).collect();
        r
    }

    #[test]
    fn test_sub_components_verified() {
        let mut records = vec![
            parent(
                "Total Revenue",
                "₹ 1,000.00",
                &["Product Sales", "Service Revenue"],
            ),
            record("Product Sales", "₹ 800.00"),
            record("Service Revenue", "₹ 200.00"),
        ];

        ReconciliationAuditor::new().audit(&mut records);

        assert_eq!(records[0].status, MetricStatus::Verified);
        assert_eq!(records[1].status, MetricStatus::Extracted);
        assert_eq!(records[2].status, MetricStatus::Extracted);
    }

    #[test]
    fn test_sub_components_mismatch() {
        // Sum is 950, diff 50 exceeds max(1000 * 0.01, 1.0) = 10.
        let mut records = vec![
            parent(
                "Total Revenue",
                "₹ 1,000.00",
                &["Product Sales", "Service Revenue"],
            ),
            record("Product Sales", "₹ 800.00"),
            record("Service Revenue", "₹ 150.00"),
        ];

        ReconciliationAuditor::new().audit(&mut records);

        assert_eq!(records[0].status, MetricStatus::MathMismatch);
    }

    #[test]
    fn test_missing_child_is_inconclusive() {
        let mut records = vec![
            parent(
                "Total Revenue",
                "₹ 1,000.00",
                &["Product Sales", "Licensing"],
            ),
            record("Product Sales", "₹ 800.00"),
        ];

        ReconciliationAuditor::new().audit(&mut records);

        // The declared sum would be wrong, but an unresolved child means
        // inconclusive, not failing.
        assert_eq!(records[0].status, MetricStatus::Extracted);
    }

    #[test]
    fn test_missing_parent_is_inconclusive() {
        let mut records = vec![
            parent("Total Revenue", "-", &["Product Sales"]),
            record("Product Sales", "₹ 800.00"),
        ];

        ReconciliationAuditor::new().audit(&mut records);

        assert_eq!(records[0].status, MetricStatus::Extracted);
    }

    #[test]
    fn test_balance_sheet_identity_verified() {
        let mut records = vec![
            record("Total Assets", "3400"),
            record("Total Liabilities", "1100"),
            record("Total Shareholders' Equity", "2300"),
        ];

        ReconciliationAuditor::new().audit(&mut records);

        assert_eq!(records[0].status, MetricStatus::Verified);
    }

    #[test]
    fn test_balance_sheet_identity_mismatch() {
        // Expected 3400, actual 3450: diff 50 exceeds max(34, 1) = 34.
        let mut records = vec![
            record("Total Assets", "3450"),
            record("Total Liabilities", "1100"),
            record("Total Shareholders' Equity", "2300"),
        ];

        ReconciliationAuditor::new().audit(&mut records);

        assert_eq!(records[0].status, MetricStatus::MathMismatch);
    }

    #[test]
    fn test_balance_sheet_total_equity_fallback() {
        let mut records = vec![
            record("Total Assets", "3400"),
            record("Total Liabilities", "1100"),
            record("Total Equity", "2300"),
        ];

        ReconciliationAuditor::new().audit(&mut records);

        assert_eq!(records[0].status, MetricStatus::Verified);
    }

    #[test]
    fn test_balance_sheet_missing_inputs() {
        let mut records = vec![
            record("Total Assets", "3400"),
            record("Total Liabilities", "1100"),
        ];

        ReconciliationAuditor::new().audit(&mut records);

        assert_eq!(records[0].status, MetricStatus::Extracted);
    }

    #[test]
    fn test_rules_are_mutually_exclusive() {
        // "Total Assets" with declared sub-components goes through the
        // sum-of-children rule, never the balance-sheet identity.
        let mut records = vec![
            parent("Total Assets", "3400", &["Current Assets", "Fixed Assets"]),
            record("Current Assets", "2000"),
            record("Fixed Assets", "1400"),
            record("Total Liabilities", "9999"),
            record("Total Equity", "1"),
        ];

        ReconciliationAuditor::new().audit(&mut records);

        assert_eq!(records[0].status, MetricStatus::Verified);
    }

    #[test]
    fn test_percentage_change_basic() {
        assert_eq!(
            percentage_change(Some("₹800.00"), Some("₹950.00")),
            Some(18.75)
        );
    }

    #[test]
    fn test_percentage_change_missing_or_zero_base() {
        assert_eq!(percentage_change(Some("-"), Some("₹950.00")), None);
        assert_eq!(percentage_change(None, Some("₹950.00")), None);
        assert_eq!(percentage_change(Some("0"), Some("₹950.00")), None);
        assert_eq!(percentage_change(Some("₹800.00"), Some("junk")), None);
    }

    #[test]
    fn test_percentage_change_negative_base_uses_magnitude() {
        // ((-50) - (-100)) / |-100| * 100 = 50.
        assert_eq!(percentage_change(Some("(100)"), Some("(50)")), Some(50.0));
    }

    #[test]
    fn test_percentage_change_rounding() {
        // (1 / 3) * 100 = 33.333... rounds to 33.33.
        assert_eq!(percentage_change(Some("3"), Some("4")), Some(33.33));
    }

    #[test]
    fn test_duplicate_metric_names_last_write_wins() {
        let mut records = vec![
            parent("Total Revenue", "₹ 1,000.00", &["Product Sales"]),
            record("Product Sales", "₹ 1.00"),
            record("Product Sales", "₹ 1,000.00"),
        ];

        ReconciliationAuditor::new().audit(&mut records);

        assert_eq!(records[0].status, MetricStatus::Verified);
    }

    #[test]
    fn test_custom_tolerance() {
        let mut records = vec![
            parent("Total Revenue", "1000", &["Product Sales"]),
            record("Product Sales", "950"),
        ];

        // 5% relative tolerance accepts the 50-unit gap.
        ReconciliationAuditor::with_tolerance(0.05, 1.0).audit(&mut records);

        assert_eq!(records[0].status, MetricStatus::Verified);
    }

    #[test]
    fn test_status_always_assigned() {
        let mut records = vec![record("Anything", "junk"), MetricRecord::new("")];
        ReconciliationAuditor::new().audit(&mut records);

        for record in &records {
            assert_eq!(record.status, MetricStatus::Extracted);
        }
    }
}
