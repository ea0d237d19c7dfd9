use axum::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::config::VisionConfig;

/// Hard cap on names accepted from the vision model per image.
const MAX_DETECTED_NAMES: usize = 15;

const SYSTEM_PROMPT: &str = "You are a kitchen assistant that identifies \
ingredients in a photo. List only cookable food ingredients (e.g. egg, \
tomato, chicken, onion, garlic). Do not describe dishes and do not write \
sentences. Reply with plain JSON matching the schema \
{\"ingredients\": [\"name1\", \"name2\", ...]}. At most 15 entries, no \
duplicates, common names, no quantities.";

pub enum ImageSource {
    Bytes { data: Bytes, mime_type: String },
    Url(String),
}

/// Image-to-ingredient-names collaborator.
///
/// Output is untrusted free text; callers must normalize every name before
/// matching. Failures propagate to the caller and are not retried here.
#[async_trait]
pub trait VisionClient: Send + Sync {
    async fn detect_ingredients(&self, image: ImageSource) -> anyhow::Result<Vec<String>>;
}

/// Gemini `generateContent` client. Remote images are fetched and inlined
/// because the API only accepts inline data.
pub struct GeminiVision {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiVision {
    pub fn new(config: &VisionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    async fn fetch_image(&self, url: &str) -> anyhow::Result<(Bytes, String)> {
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            anyhow::bail!("fetch image failed: {}", resp.status());
        }
        let mime = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        Ok((resp.bytes().await?, mime))
    }
}

#[async_trait]
impl VisionClient for GeminiVision {
    #[instrument(skip(self, image))]
    async fn detect_ingredients(&self, image: ImageSource) -> anyhow::Result<Vec<String>> {
        let (data, mime_type) = match image {
            ImageSource::Bytes { data, mime_type } => (data, mime_type),
            ImageSource::Url(url) => self.fetch_image(&url).await?,
        };

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body = json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_PROMPT }] },
            "contents": [{
                "parts": [
                    { "text": "Extract the list of ingredients" },
                    { "inlineData": { "mimeType": mime_type, "data": BASE64.encode(&data) } }
                ]
            }]
        });

        let resp = self.http.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            anyhow::bail!("vision request failed: {}", resp.status());
        }
        let payload: Value = resp.json().await?;
        let text = payload["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let names = parse_detected_names(&text);
        debug!(count = names.len(), "vision detected ingredient names");
        Ok(names)
    }
}

/// Used when GEMINI_API_KEY is not configured.
pub struct DisabledVision;

#[async_trait]
impl VisionClient for DisabledVision {
    async fn detect_ingredients(&self, _image: ImageSource) -> anyhow::Result<Vec<String>> {
        anyhow::bail!("vision API is not configured")
    }
}

/// Pull a name list out of whatever the model returned.
///
/// Prefers the `{"ingredients": [...]}` schema (tolerating surrounding
/// markdown); falls back to splitting on newlines/commas/bullets.
pub fn parse_detected_names(text: &str) -> Vec<String> {
    let json_str = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    };

    if let Ok(value) = serde_json::from_str::<Value>(json_str) {
        if let Some(list) = value["ingredients"].as_array() {
            return dedupe_names(
                list.iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| s.trim().to_string()),
            );
        }
    }

    dedupe_names(
        json_str
            .split(['\n', ',', '\u{2022}', '-'])
            .map(|s| s.trim_start_matches(['*', '.', ' ']).trim().to_string()),
    )
}

fn dedupe_names(names: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .filter(|n| !n.is_empty())
        .filter(|n| seen.insert(n.clone()))
        .take(MAX_DETECTED_NAMES)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_schema() {
        let names = parse_detected_names(r#"{"ingredients": ["egg", "tomato"]}"#);
        assert_eq!(names, vec!["egg", "tomato"]);
    }

    #[test]
    fn parses_json_wrapped_in_markdown() {
        let text = "```json\n{\"ingredients\": [\"onion\", \"garlic\"]}\n```";
        assert_eq!(parse_detected_names(text), vec!["onion", "garlic"]);
    }

    #[test]
    fn falls_back_to_line_splitting() {
        let names = parse_detected_names("egg\ntomato, onion");
        assert_eq!(names, vec!["egg", "tomato", "onion"]);
    }

    #[test]
    fn dedupes_and_caps_the_list() {
        let many: Vec<String> = (0..30).map(|i| format!("item{i}")).collect();
        let text = format!(
            r#"{{"ingredients": ["egg", "egg", {}]}}"#,
            many.iter()
                .map(|n| format!("\"{n}\""))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let names = parse_detected_names(&text);
        assert_eq!(names.len(), MAX_DETECTED_NAMES);
        assert_eq!(names.iter().filter(|n| *n == "egg").count(), 1);
    }

    #[test]
    fn garbage_yields_empty_list() {
        assert!(parse_detected_names("").is_empty());
        assert!(parse_detected_names("   \n  ").is_empty());
    }
}
