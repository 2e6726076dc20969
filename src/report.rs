use crate::schema::{MetricRecord, MetricStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tabular view of an audited batch, ready for rendering or export by the
/// downstream collaborator. Counts plus the annotated rows, stamped with the
/// audit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub total_records: usize,
    pub verified: usize,
    pub mismatched: usize,
    pub extracted: usize,
    pub records: Vec<MetricRecord>,
    pub audited_at: DateTime<Utc>,
}

impl AuditReport {
    /// Builds a report from records that have already been through an audit
    /// pass.
    pub fn from_records(records: Vec<MetricRecord>) -> Self {
        let mut verified = 0;
        let mut mismatched = 0;
        let mut extracted = 0;

        for record in &records {
            match record.status {
                MetricStatus::Verified => verified += 1,
                MetricStatus::MathMismatch => mismatched += 1,
                MetricStatus::Extracted => extracted += 1,
            }
        }

        Self {
            total_records: records.len(),
            verified,
            mismatched,
            extracted,
            records,
            audited_at: Utc::now(),
        }
    }

    /// True when no record failed a reconciliation rule. Inconclusive rows
    /// do not count against the batch.
    pub fn is_consistent(&self) -> bool {
        self.mismatched == 0
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_csv(&self) -> String {
        let mut out =
            String::from("Metric,Previous Period,Current Period,Change %,Status,Page,Snippet\n");

        for record in &self.records {
            out.push_str(&format!(
                "{},{},{},{},{},{},{}\n",
                csv_escape(&record.metric),
                csv_escape(record.value_previous.as_deref().unwrap_or("-")),
                csv_escape(record.value_current.as_deref().unwrap_or("-")),
                record
                    .percentage_change
                    .map(|c| format!("{:.2}", c))
                    .unwrap_or_else(|| "-".to_string()),
                status_label(&record.status),
                csv_escape(record.page.as_deref().unwrap_or("-")),
                csv_escape(record.snippet.as_deref().unwrap_or("-")),
            ));
        }

        out
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# Audit Report\n\n");
        out.push_str(&format!(
            "- Audited at: {}\n- Records: {}\n- Verified: {}\n- Math mismatches: {}\n- Extracted only: {}\n\n",
            self.audited_at.format("%Y-%m-%d %H:%M UTC"),
            self.total_records,
            self.verified,
            self.mismatched,
            self.extracted
        ));

        out.push_str("| Metric | Previous | Current | Change % | Status |\n");
        out.push_str("|--------|----------|---------|----------|--------|\n");

        for record in &self.records {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                record.metric,
                record.value_previous.as_deref().unwrap_or("-"),
                record.value_current.as_deref().unwrap_or("-"),
                record
                    .percentage_change
                    .map(|c| format!("{:.2}", c))
                    .unwrap_or_else(|| "-".to_string()),
                status_label(&record.status),
            ));
        }

        out
    }
}

fn status_label(status: &MetricStatus) -> &'static str {
    match status {
        MetricStatus::Extracted => "Extracted",
        MetricStatus::Verified => "Verified",
        MetricStatus::MathMismatch => "Math Mismatch",
    }
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
