//! Boundary between the loosely-typed records produced by the upstream
//! extraction collaborator and the typed audit core. Nothing in here raises:
//! malformed input passes through unaltered so that auditing failure never
//! blocks presentation of the raw extracted data.

use crate::auditor::ReconciliationAuditor;
use crate::schema::MetricRecord;
use log::debug;
use serde_json::{Map, Value};

/// Audits a loosely-typed JSON record collection in the shape the upstream
/// extractor emits. Non-array input is a no-op pass-through; non-object
/// elements keep their position but are skipped by lookup construction and
/// rule application. Every object element comes back with `status` and
/// `percentage_change` set, all other keys untouched.
pub fn audit_json(auditor: &ReconciliationAuditor, data: Value) -> Value {
    let mut items = match data {
        Value::Array(items) => items,
        other => {
            debug!("Audit input is not an array; passing through unaltered");
            return other;
        }
    };

    // Pair each object element with its position so annotations land back
    // on the right row.
    let mut indices = Vec::new();
    let mut records = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        if let Value::Object(fields) = item {
            indices.push(idx);
            records.push(record_from_fields(fields));
        }
    }

    auditor.audit(&mut records);

    for (idx, record) in indices.into_iter().zip(records) {
        if let Value::Object(fields) = &mut items[idx] {
            fields.insert(
                "status".to_string(),
                serde_json::to_value(&record.status).unwrap_or(Value::Null),
            );
            fields.insert(
                "percentage_change".to_string(),
                serde_json::to_value(record.percentage_change).unwrap_or(Value::Null),
            );
        }
    }

    Value::Array(items)
}

/// Converts one loose key-value record into a typed `MetricRecord` with
/// explicit present/absent semantics. This is the sanitization step: numeric
/// JSON values are coerced to their display string and strings are trimmed;
/// everything else about the record is left to pass through untouched.
fn record_from_fields(fields: &Map<String, Value>) -> MetricRecord {
    let mut record = MetricRecord::new(
        fields
            .get("metric")
            .and_then(value_as_display)
            .unwrap_or_default(),
    );

    record.value_previous = fields.get("value_previous").and_then(value_as_display);
    record.value_current = fields.get("value_current").and_then(value_as_display);
    record.page = fields.get("page").and_then(value_as_display);
    record.snippet = fields.get("snippet").and_then(value_as_display);

    if let Some(Value::Array(children)) = fields.get("sub_components") {
        record.sub_components = children.iter().filter_map(value_as_display).collect();
    }

    record
}

/// Display-string coercion: strings are trimmed, numbers are rendered as
/// written. Other shapes (null, objects, arrays) count as absent.
fn value_as_display(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
