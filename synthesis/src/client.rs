use crate::error::SynthesisError;
use log::debug;
use serde::{Deserialize, Serialize};

/// Configuration for one Ollama-backed model role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model tag to generate with
    #[serde(default = "default_synthesis_model")]
    pub model: String,

    /// Sampling temperature; low values keep answers grounded
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_synthesis_model() -> String {
    "gemma2:9b".to_string()
}

fn default_rewrite_model() -> String {
    "qwen2.5-coder:14b".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::synthesis()
    }
}

impl OllamaConfig {
    /// Config for the answer-synthesis role.
    pub fn synthesis() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_synthesis_model(),
            temperature: default_temperature(),
        }
    }

    /// Config for the query-rewrite role.
    pub fn rewrite() -> Self {
        Self {
            model: default_rewrite_model(),
            ..Self::synthesis()
        }
    }

    /// Point the config at a different server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use a different model tag.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: Option<String>,
}

/// Thin client over Ollama's non-streaming `/api/generate` endpoint.
pub struct OllamaClient {
    config: OllamaConfig,
    http: reqwest::Client,
}

impl OllamaClient {
    /// Create a client for the given role config.
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// The configured model tag.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Run one prompt to completion and return the trimmed response text.
    pub async fn generate(&self, prompt: &str) -> Result<String, SynthesisError> {
        let url = format!(
            "{}/api/generate",
            self.config.base_url.trim_end_matches('/')
        );
        debug!(
            "Generating with model '{}' ({} prompt chars)",
            self.config.model,
            prompt.len()
        );

        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.config.temperature,
                top_p: 1.0,
            },
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        let body: GenerateResponse = response.json().await?;

        if let Some(error) = body.error {
            return Err(SynthesisError::Backend(error));
        }

        let text = body.response.trim().to_string();
        if text.is_empty() {
            return Err(SynthesisError::EmptyResponse);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> OllamaClient {
        OllamaClient::new(OllamaConfig::synthesis().with_base_url(server.uri()))
    }

    #[tokio::test]
    async fn test_generate_returns_trimmed_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({"model": "gemma2:9b", "stream": false})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"response": "  grounded answer\n"})),
            )
            .mount(&server)
            .await;

        let answer = client_for(&server).await.generate("question").await.unwrap();
        assert_eq!(answer, "grounded answer");
    }

    #[tokio::test]
    async fn test_backend_error_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"error": "model 'gemma2:9b' not found"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).await.generate("question").await.unwrap_err();
        assert!(matches!(err, SynthesisError::Backend(_)));
    }

    #[tokio::test]
    async fn test_empty_response_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "   "})))
            .mount(&server)
            .await;

        let err = client_for(&server).await.generate("question").await.unwrap_err();
        assert!(matches!(err, SynthesisError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_http_error_status_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).await.generate("question").await.unwrap_err();
        assert!(matches!(err, SynthesisError::Http(_)));
    }

    #[test]
    fn test_role_configs() {
        assert_eq!(OllamaConfig::synthesis().model, "gemma2:9b");
        assert_eq!(OllamaConfig::rewrite().model, "qwen2.5-coder:14b");
        assert_eq!(
            OllamaConfig::default().base_url,
            "http://localhost:11434"
        );
    }
}
