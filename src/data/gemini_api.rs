use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use crate::ai::prompt::build_prompt;
use crate::ai::{AnalysisBackend, AnalysisError};
use crate::data::types::Market;
use tracing::{error, info};

pub const REMOTE_FAILURE_TEXT: &str =
    "Error generating analysis. Please check your API key and connection.";
pub const EMPTY_RESPONSE_TEXT: &str = "No analysis generated.";

/// Gemini `generateContent` client used as a remote analysis backend
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    instruction: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, if any
    fn text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl GeminiClient {
    pub fn new(
        base_url: String,
        model: String,
        temperature: f32,
        instruction: String,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url,
            model,
            temperature,
            instruction,
            api_key,
        }
    }

    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, AnalysisError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest {
            system_instruction: Content {
                parts: vec![Part { text: &self.instruction }],
            },
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        Ok(parsed.text().unwrap_or_else(|| EMPTY_RESPONSE_TEXT.to_string()))
    }
}

impl AnalysisBackend for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn analyze<'a>(&'a self, market: &'a Market) -> BoxFuture<'a, Result<String, AnalysisError>> {
        async move {
            let api_key = self.api_key.as_deref().ok_or(AnalysisError::MissingApiKey)?;

            info!("Requesting Gemini analysis for {} ({})", market.id, self.model);
            let prompt = build_prompt(market);

            match self.generate(api_key, &prompt).await {
                Ok(text) => Ok(text),
                Err(e) => {
                    error!("Gemini API error for {}: {}", market.id, e);
                    Ok(REMOTE_FAILURE_TEXT.to_string())
                }
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::SYSTEM_INSTRUCTION;
    use crate::data::catalog::initial_markets;

    fn client(base_url: &str, api_key: Option<&str>) -> GeminiClient {
        GeminiClient::new(
            base_url.to_string(),
            "gemini-3-flash-preview".to_string(),
            0.7,
            SYSTEM_INSTRUCTION.to_string(),
            api_key.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let gemini = client("http://127.0.0.1:9", None);
        let market = initial_markets().remove(0);

        let err = gemini.analyze(&market).await.unwrap_err();
        assert!(matches!(err, AnalysisError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_unreachable_backend_returns_failure_text() {
        // Port 9 (discard) is closed on test hosts
        let gemini = client("http://127.0.0.1:9", Some("test-key"));
        let market = initial_markets().remove(0);

        let text = gemini.analyze(&market).await.unwrap();
        assert_eq!(text, REMOTE_FAILURE_TEXT);
    }

    #[test]
    fn test_response_text_extraction() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"**Signal**: "},{"text":"Buy"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("**Signal**: Buy"));

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(empty.text().is_none());

        let blank: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#)
                .unwrap();
        assert!(blank.text().is_none());
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            system_instruction: Content {
                parts: vec![Part { text: "sys" }],
            },
            contents: vec![Content {
                parts: vec![Part { text: "prompt" }],
            }],
            generation_config: GenerationConfig { temperature: 0.5 },
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "prompt");
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
    }

    #[tokio::test]
    #[ignore = "requires GEMINI_API_KEY"]
    async fn test_live_analysis() {
        let key = std::env::var("GEMINI_API_KEY").unwrap();
        let gemini = client("https://generativelanguage.googleapis.com/v1beta", Some(&key));
        let market = initial_markets().remove(2);

        let text = gemini.analyze(&market).await.unwrap();
        assert_ne!(text, REMOTE_FAILURE_TEXT);
    }
}
