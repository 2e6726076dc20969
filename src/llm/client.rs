use crate::error::{MetricAuditError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<Part>,
}

/// Thin REST client for the Gemini generateContent endpoint, locked to JSON
/// response mode since every call in this crate expects structured output.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    pub(crate) async fn generate_content(
        &self,
        model: &str,
        system_prompt: &str,
        messages: Vec<Content>,
    ) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let payload = GenerateContentRequest {
            contents: messages,
            system_instruction: Content::user(system_prompt),
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let res = self.client.post(&url).json(&payload).send().await.map_err(|e| {
            MetricAuditError::ExtractionFailed(format!("Request to Gemini failed: {}", e))
        })?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await.unwrap_or_default();
            return Err(MetricAuditError::ExtractionFailed(format!(
                "Gemini API Error (status {}): {}",
                status, err_text
            )));
        }

        let body: GenerateContentResponse = res.json().await.map_err(|e| {
            MetricAuditError::ExtractionFailed(format!("Malformed Gemini response: {}", e))
        })?;

        let text = body
            .candidates
            .ok_or_else(|| {
                MetricAuditError::ExtractionFailed("No candidates returned".to_string())
            })?
            .first()
            .ok_or_else(|| {
                MetricAuditError::ExtractionFailed("Empty candidates list".to_string())
            })?
            .content
            .parts
            .first()
            .ok_or_else(|| MetricAuditError::ExtractionFailed("No parts in content".to_string()))?
            .text
            .clone();

        Ok(text)
    }
}
