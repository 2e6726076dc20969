use crate::error::{MetricAuditError, Result};
use crate::ingestion::audit_json;
use crate::llm::client::{Content, GeminiClient};
use crate::llm::prompts::{build_user_prompt, SYSTEM_PROMPT};
use crate::llm::types::ExtractionEvent;
use crate::ReconciliationAuditor;
use log::{info, warn};
use serde_json::{json, Value};
use tokio::sync::mpsc::Sender;

/// Drives one extraction round trip: page-marked document text in, audited
/// metric table out. Extraction failures surface as an `Error` pseudo-record
/// rather than an empty result, so the caller always has a row to display.
pub struct MetricExtractor {
    client: GeminiClient,
    model: String,
    auditor: ReconciliationAuditor,
}

impl MetricExtractor {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            auditor: ReconciliationAuditor::new(),
        }
    }

    pub async fn extract(
        &self,
        text: &str,
        progress: Option<Sender<ExtractionEvent>>,
    ) -> Result<Value> {
        self.send_event(&progress, ExtractionEvent::Starting).await;

        if text.trim().is_empty() {
            let reason = "No text extracted from PDF.";
            self.send_event(
                &progress,
                ExtractionEvent::Failed {
                    reason: reason.to_string(),
                },
            )
            .await;
            return Ok(error_row(reason));
        }

        info!("Requesting metric extraction from model {}", self.model);
        self.send_event(&progress, ExtractionEvent::DraftingResponse)
            .await;

        let raw = match self
            .client
            .generate_content(
                &self.model,
                SYSTEM_PROMPT,
                vec![Content::user(build_user_prompt(text))],
            )
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                self.send_event(
                    &progress,
                    ExtractionEvent::Failed {
                        reason: e.to_string(),
                    },
                )
                .await;
                return Err(e);
            }
        };

        self.send_event(&progress, ExtractionEvent::ProcessingResponse)
            .await;

        let data: Value = serde_json::from_str(&clean_json_output(&raw))?;
        let data = unwrap_record_list(data)?;

        self.send_event(&progress, ExtractionEvent::Auditing).await;
        let audited = audit_json(&self.auditor, data);

        self.send_event(&progress, ExtractionEvent::Success).await;
        Ok(audited)
    }

    async fn send_event(&self, sender: &Option<Sender<ExtractionEvent>>, event: ExtractionEvent) {
        if let Some(tx) = sender {
            let _ = tx.send(event).await;
        }
    }
}

/// The model occasionally wraps the array in an object under an arbitrary
/// key; fish out the first list it contains. A bare object with no list is
/// an unexpected shape.
fn unwrap_record_list(data: Value) -> Result<Value> {
    match data {
        Value::Array(_) => Ok(data),
        Value::Object(fields) => {
            for (key, value) in fields {
                if value.is_array() {
                    warn!("Model wrapped the record list under key '{}'", key);
                    return Ok(value);
                }
            }
            Err(MetricAuditError::UnexpectedResponseShape(
                "object response contains no record list".to_string(),
            ))
        }
        other => Err(MetricAuditError::UnexpectedResponseShape(format!(
            "expected a JSON array, got {}",
            other
        ))),
    }
}

/// Strips markdown fences or chatty prefixes around the JSON payload.
fn clean_json_output(raw: &str) -> String {
    if let (Some(start), Some(end)) = (raw.find('['), raw.rfind(']')) {
        if start < end {
            return raw[start..=end].to_string();
        }
    }
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            return raw[start..=end].to_string();
        }
    }
    raw.trim().to_string()
}

fn error_row(message: &str) -> Value {
    json!([{
        "metric": "Error",
        "value_previous": "-",
        "value_current": message,
        "sub_components": [],
        "page": "-",
        "snippet": "-",
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_clean_json_output_strips_fences() {
        let raw = "```json\n[{\"metric\": \"Revenue\"}]\n```";
        assert_eq!(clean_json_output(raw), "[{\"metric\": \"Revenue\"}]");
    }

    #[test]
    fn test_unwrap_wrapped_record_list() {
        let wrapped = json!({"metrics": [{"metric": "Revenue"}]});
        let unwrapped = unwrap_record_list(wrapped).unwrap();
        assert!(unwrapped.is_array());
    }

    #[test]
    fn test_unparseable_payload_maps_to_serialization_error() {
        let err: MetricAuditError =
            serde_json::from_str::<Value>(&clean_json_output("total garbage"))
                .unwrap_err()
                .into();
        assert!(matches!(err, MetricAuditError::SerializationError(_)));
    }

    #[test]
    fn test_unwrap_rejects_scalar() {
        assert!(unwrap_record_list(json!(42)).is_err());
        assert!(unwrap_record_list(json!({"note": "no list here"})).is_err());
    }

    #[tokio::test]
    async fn test_empty_text_short_circuits() {
        let extractor = MetricExtractor::new(
            GeminiClient::new("unused-key".to_string()),
            "gemini-2.5-flash",
        );

        let result = extractor.extract("   ", None).await.unwrap();
        assert_eq!(result[0]["metric"], json!("Error"));
    }

    #[tokio::test]
    async fn test_progress_events_on_empty_text() {
        let extractor = MetricExtractor::new(
            GeminiClient::new("unused-key".to_string()),
            "gemini-2.5-flash",
        );

        let (tx, mut rx) = mpsc::channel(8);
        extractor.extract("", Some(tx)).await.unwrap();

        assert!(matches!(rx.recv().await, Some(ExtractionEvent::Starting)));
        assert!(matches!(
            rx.recv().await,
            Some(ExtractionEvent::Failed { .. })
        ));
        assert!(rx.recv().await.is_none());
    }
}
