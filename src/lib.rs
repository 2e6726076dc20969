//! # Financial Metric Auditor
//!
//! A library for reconciling financial metrics extracted from two-period
//! reports (e.g. an annual statement comparing the current and previous
//! fiscal year) into an auditable, annotated table.
//!
//! ## Core Concepts
//!
//! - **Metric record**: one line item with display values for two periods,
//!   optional declared sub-components, and provenance (page, snippet)
//! - **Normalization**: heterogeneous display strings (`₹ 1,50,000`,
//!   `34,54,136.30 Crores`, `(15.5)%`, `$12 Million`) reduced to signed
//!   floats in the base unit
//! - **Reconciliation**: a parent metric is checked against the sum of its
//!   declared sub-components, and "Total Assets" against
//!   Liabilities + Equity, within a 1%-or-1.0 tolerance
//! - **Graceful degradation**: values that fail to parse and rules with
//!   missing inputs leave a record at its default `Extracted` status rather
//!   than raising
//!
//! ## Example
//!
//! ```rust
//! use financial_metric_auditor::*;
//!
//! let mut revenue = MetricRecord::new("Total Revenue");
//! revenue.value_previous = Some("₹ 800.00".to_string());
//! revenue.value_current = Some("₹ 1,000.00".to_string());
//! revenue.sub_components = vec!["Product Sales".into(), "Service Revenue".into()];
//!
//! let mut product = MetricRecord::new("Product Sales");
//! product.value_current = Some("₹ 800.00".to_string());
//!
//! let mut service = MetricRecord::new("Service Revenue");
//! service.value_current = Some("₹ 200.00".to_string());
//!
//! let mut records = vec![revenue, product, service];
//! audit_metrics(&mut records);
//!
//! assert_eq!(records[0].status, MetricStatus::Verified);
//! assert_eq!(records[0].percentage_change, Some(25.0));
//! ```

pub mod auditor;
pub mod error;
pub mod ingestion;
pub mod normalizer;
pub mod report;
pub mod schema;

#[cfg(feature = "gemini")]
pub mod llm;

pub use auditor::{percentage_change, ReconciliationAuditor};
pub use error::{MetricAuditError, Result};
pub use ingestion::audit_json;
pub use normalizer::normalize_currency;
pub use report::AuditReport;
pub use schema::{MetricRecord, MetricStatus};

use log::{debug, info};

pub struct MetricAuditProcessor;

impl MetricAuditProcessor {
    /// Runs a full audit pass over a batch of typed records with the
    /// default tolerance.
    pub fn process(records: &mut [MetricRecord]) {
        info!("Auditing {} metric records", records.len());

        ReconciliationAuditor::new().audit(records);

        let verified = records
            .iter()
            .filter(|r| r.status == MetricStatus::Verified)
            .count();
        debug!(
            "Audit pass complete: {} of {} records verified",
            verified,
            records.len()
        );
    }

    /// Audits and wraps the batch into a renderable report.
    pub fn process_into_report(records: Vec<MetricRecord>) -> AuditReport {
        let mut records = records;
        Self::process(&mut records);
        AuditReport::from_records(records)
    }
}

/// Annotates every record in place with a reconciliation status and a
/// period-over-period percentage change.
pub fn audit_metrics(records: &mut [MetricRecord]) {
    MetricAuditProcessor::process(records)
}
