use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema)]
pub enum MetricStatus {
    #[default]
    #[schemars(
        description = "The value was extracted from the document but no reconciliation rule could be applied conclusively"
    )]
    Extracted,

    #[schemars(
        description = "A reconciliation rule (sum of sub-components, or Assets = Liabilities + Equity) matched within tolerance"
    )]
    Verified,

    #[schemars(
        description = "A reconciliation rule applied but the arithmetic disagreed beyond tolerance"
    )]
    #[serde(rename = "Math Mismatch")]
    MathMismatch,
}

/// One row of the comparison table: a single financial line item across the
/// two reporting periods. This struct doubles as the response schema handed
/// to the LLM extraction collaborator, so every field the model must populate
/// carries a description.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MetricRecord {
    #[schemars(
        description = "The name of the financial metric exactly as it appears in the statement (e.g. 'Total Revenue'). Used case-insensitively as the identity key for reconciliation."
    )]
    pub metric: String,

    #[schemars(
        description = "The exact extracted value for the previous period, formatted as written in the document (e.g. '₹ 100 Lakhs', '(15.5)%'), or '-' if missing"
    )]
    #[serde(default)]
    pub value_previous: Option<String>,

    #[schemars(
        description = "The exact extracted value for the current period, formatted as written in the document, or '-' if missing"
    )]
    #[serde(default)]
    pub value_current: Option<String>,

    #[schemars(
        description = "Names of any child metrics that sum up to this metric (e.g. ['Product Revenue', 'Service Revenue']). Leave empty if none."
    )]
    #[serde(default)]
    pub sub_components: Vec<String>,

    #[schemars(
        description = "The absolute page number where this metric was found, as printed in the page markers"
    )]
    #[serde(default)]
    pub page: Option<String>,

    #[schemars(
        description = "A short exact 5-8 word quote from the surrounding text proving the source"
    )]
    #[serde(default)]
    pub snippet: Option<String>,

    /// Computed by the auditor; `None` when either period value fails to
    /// normalize or the previous-period value is exactly zero.
    #[serde(default)]
    #[schemars(skip)]
    pub percentage_change: Option<f64>,

    /// Assigned by the auditor on every pass; defaults to `Extracted`.
    #[serde(default)]
    #[schemars(skip)]
    pub status: MetricStatus,
}

impl MetricRecord {
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            value_previous: None,
            value_current: None,
            sub_components: Vec::new(),
            page: None,
            snippet: None,
            percentage_change: None,
            status: MetricStatus::Extracted,
        }
    }

    /// The lookup key used for reconciliation: lower-cased and trimmed.
    pub fn lookup_key(&self) -> String {
        self.metric.trim().to_lowercase()
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Vec<MetricRecord>)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
