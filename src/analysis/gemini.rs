use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, TabragError};

use super::TextGenerator;

/// Request structure for the Gemini generateContent API
#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

/// Response structure from the Gemini generateContent API
#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ContentOut,
}

#[derive(Deserialize)]
struct ContentOut {
    parts: Vec<PartOut>,
}

#[derive(Deserialize)]
struct PartOut {
    text: String,
}

const MAX_RETRIES: usize = 3;

/// Google Gemini text-generation client with bounded retry and exponential
/// backoff on 429/5xx.
pub struct GeminiGenerator {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiGenerator {
    /// Create a generator for the given model (e.g. `gemini-2.5-flash`).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in
    /// normal operation).
    pub fn new(api_key: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            model,
        }
    }

    async fn request(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| TabragError::Generation(format!("Network error: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(TabragError::Generation(format!(
                "Gemini API error {}: {}",
                status, body
            )));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| TabragError::Generation(format!("Failed to parse response: {}", e)))?;

        result
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| TabragError::Generation("Empty response from Gemini API".to_string()))
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let start = std::time::Instant::now();
        let mut attempt = 0;
        let mut delay = Duration::from_secs(1);

        loop {
            match self.request(prompt).await {
                Ok(text) => {
                    log::debug!(
                        "Generation API call took {:?} (attempt {})",
                        start.elapsed(),
                        attempt + 1
                    );
                    return Ok(text);
                }
                Err(e) if attempt < MAX_RETRIES => {
                    let should_retry = e.to_string().contains("429")
                        || e.to_string().contains("500")
                        || e.to_string().contains("502")
                        || e.to_string().contains("503")
                        || e.to_string().contains("504");

                    if should_retry {
                        log::warn!("Retry {}/{} after error: {}", attempt + 1, MAX_RETRIES, e);
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                        attempt += 1;
                    } else {
                        return Err(e);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_shape() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: "hello".to_string(),
                }],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_response_parsing_extracts_first_candidate() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "the answer"}]}}
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text);
        assert_eq!(text.as_deref(), Some("the answer"));
    }

    #[test]
    fn test_empty_candidates_parse_cleanly() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(parsed.candidates.is_empty());
    }
}
