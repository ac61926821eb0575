//! Voice catalog: read-only listing of synthesized voices from the text-to-speech provider.
//! Consumed on demand; nothing is cached between requests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default ElevenLabs API root (no trailing slash).
pub const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io/v1";

/// A selectable voice. Only `id` and `display_name` matter to the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceCatalogEntry {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

#[derive(Error, Debug)]
pub enum VoiceCatalogError {
    #[error("voice catalog request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("voice catalog returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("voice catalog response parse: {0}")]
    Json(#[from] serde_json::Error),
}

/// Source of available voices.
#[async_trait]
pub trait VoiceCatalog: Send + Sync {
    async fn list_voices(&self) -> Result<Vec<VoiceCatalogEntry>, VoiceCatalogError>;
}

/// ElevenLabs `/voices` response shape.
#[derive(Debug, Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<ProviderVoice>,
}

#[derive(Debug, Deserialize)]
struct ProviderVoice {
    voice_id: Option<String>,
    name: Option<String>,
    category: Option<String>,
    description: Option<String>,
    #[serde(default)]
    labels: BTreeMap<String, serde_json::Value>,
}

impl ProviderVoice {
    fn into_entry(self) -> Option<VoiceCatalogEntry> {
        let id = self.voice_id.filter(|id| !id.is_empty())?;
        let labels = self
            .labels
            .into_iter()
            .filter_map(|(k, v)| match v {
                serde_json::Value::String(s) => Some((k, s)),
                serde_json::Value::Null => None,
                other => Some((k, other.to_string())),
            })
            .collect();
        Some(VoiceCatalogEntry {
            display_name: self.name.unwrap_or_else(|| id.clone()),
            id,
            category: self.category.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            labels,
        })
    }
}

/// Decodes a `/voices` body. Entries without a voice id are skipped.
pub fn parse_voices_response(body: &str) -> Result<Vec<VoiceCatalogEntry>, VoiceCatalogError> {
    let parsed: VoicesResponse = serde_json::from_str(body)?;
    Ok(parsed
        .voices
        .into_iter()
        .filter_map(ProviderVoice::into_entry)
        .collect())
}

/// ElevenLabs voice listing over HTTPS with the `xi-api-key` header.
#[derive(Debug, Clone)]
pub struct ElevenLabsCatalog {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl ElevenLabsCatalog {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl VoiceCatalog for ElevenLabsCatalog {
    async fn list_voices(&self) -> Result<Vec<VoiceCatalogEntry>, VoiceCatalogError> {
        let res = self
            .client
            .get(format!("{}/voices", self.base_url))
            .header("xi-api-key", &self.api_key)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), "voice catalog error: {}", text);
            return Err(VoiceCatalogError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let voices = parse_voices_response(&text)?;
        tracing::info!(count = voices.len(), "voice catalog fetched");
        Ok(voices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::get, Json, Router};

    const BODY: &str = r#"{
        "voices": [
            {"voice_id": "21m00Tcm4TlvDq8ikWAM", "name": "Rachel", "category": "premade",
             "labels": {"accent": "american", "age": "young", "use case": null}},
            {"voice_id": "AZnzlk1XvdvUeBnXmlld", "name": "Domi", "description": "strong"},
            {"name": "no id"}
        ]
    }"#;

    #[test]
    fn parses_provider_response() {
        let voices = parse_voices_response(BODY).unwrap();
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[0].id, "21m00Tcm4TlvDq8ikWAM");
        assert_eq!(voices[0].display_name, "Rachel");
        assert_eq!(voices[0].category, "premade");
        assert_eq!(voices[0].labels.get("accent").map(String::as_str), Some("american"));
        assert!(!voices[0].labels.contains_key("use case"));
        assert_eq!(voices[1].description, "strong");
    }

    #[test]
    fn missing_voices_key_is_empty() {
        assert!(parse_voices_response("{}").unwrap().is_empty());
    }

    #[test]
    fn garbage_is_a_json_error() {
        assert!(matches!(
            parse_voices_response("not json"),
            Err(VoiceCatalogError::Json(_))
        ));
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1/", addr)
    }

    #[tokio::test]
    async fn lists_voices_with_api_key_header() {
        let app = Router::new().route(
            "/v1/voices",
            get(|headers: HeaderMap| async move {
                match headers.get("xi-api-key").and_then(|v| v.to_str().ok()) {
                    Some("secret") => Ok(Json(serde_json::from_str::<serde_json::Value>(BODY).unwrap())),
                    _ => Err(StatusCode::UNAUTHORIZED),
                }
            }),
        );
        let base = serve(app).await;

        let catalog = ElevenLabsCatalog::new(base.clone(), "secret");
        assert!(!catalog.base_url().ends_with('/'));
        let voices = catalog.list_voices().await.unwrap();
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[1].display_name, "Domi");

        let wrong_key = ElevenLabsCatalog::new(base, "nope");
        match wrong_key.list_voices().await {
            Err(VoiceCatalogError::Api { status, .. }) => assert_eq!(status, 401),
            other => panic!("expected api error, got {other:?}"),
        }
    }
}
