//! Gemini REST client: file upload, script generation, file cleanup.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::prompts::{SYSTEM_PROMPT, TEMPERATURE, USER_PROMPT};
use super::{MediaHandle, ScriptGenerator};
use crate::error::ExternalError;
use crate::sanitize;

const BASE_URL: &str = "https://generativelanguage.googleapis.com";
const SERVICE: &str = "Gemini";
const API_KEY_HEADER: &str = "x-goog-api-key";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5 * 60);

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_POLLS: u32 = 30;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata {
    name: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Deserialize)]
struct UploadResponse {
    file: FileMetadata,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    File {
        #[serde(rename = "fileData")]
        file_data: FileData<'a>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData<'a> {
    file_uri: &'a str,
    mime_type: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

pub struct GeminiClient {
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    poll_interval: Duration,
    max_polls: u32,
    uploaded: Mutex<Vec<String>>,
}

impl GeminiClient {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Result<Self, ExternalError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ExternalError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
            model: model.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
            uploaded: Mutex::new(Vec::new()),
        })
    }

    fn uploaded(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.uploaded.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn get_file(&self, name: &str) -> Result<FileMetadata, ExternalError> {
        let url = format!("{}/v1beta/{}", self.base_url, name);
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| http_error("File status", e))?;
        let response = error_for_status("File status", response).await?;
        response
            .json()
            .await
            .map_err(|e| http_error("Reading file status", e))
    }

    /// Polls until the uploaded file leaves `PROCESSING`.
    async fn wait_until_active(&self, mut file: FileMetadata) -> Result<FileMetadata, ExternalError> {
        let mut polls = 0;
        while file.state.as_deref() == Some("PROCESSING") {
            if polls >= self.max_polls {
                return Err(ExternalError::ProcessingTimeout {
                    service: SERVICE.to_string(),
                    attempts: self.max_polls,
                });
            }
            polls += 1;
            debug!("Waiting for {} to finish processing ({})", file.name, polls);
            tokio::time::sleep(self.poll_interval).await;
            file = self.get_file(&file.name).await?;
        }

        match file.state.as_deref() {
            None | Some("ACTIVE") => Ok(file),
            Some(state) => Err(ExternalError::InvalidResponse {
                service: SERVICE.to_string(),
                message: format!("uploaded file {} ended in state {}", file.name, state),
            }),
        }
    }
}

fn http_error(action: &str, e: reqwest::Error) -> ExternalError {
    // reqwest errors may include the request URL
    let message = e.without_url().to_string();
    ExternalError::Http(format!("{} failed: {}", action, message))
}

async fn error_for_status(
    action: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ExternalError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(ExternalError::InvalidResponse {
        service: SERVICE.to_string(),
        message: format!(
            "{} returned {}: {}",
            action,
            status,
            sanitize::truncate_chars(&body, 200)
        ),
    })
}

/// Joins the text parts of the first candidate.
fn extract_script(response: GenerateResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect::<Vec<_>>()
        .join("");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[async_trait]
impl ScriptGenerator for GeminiClient {
    async fn upload_media(&self, path: &Path) -> Result<MediaHandle, ExternalError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| ExternalError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mime_type = mime_guess::from_path(path).first_or_octet_stream().to_string();

        info!(
            "Uploading {} ({}, {} bytes) to {}",
            sanitize::redact_path(path),
            mime_type,
            bytes.len(),
            SERVICE
        );

        let url = format!("{}/upload/v1beta/files", self.base_url);
        let response = self
            .client
            .post(&url)
            .query(&[("uploadType", "media")])
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .header(reqwest::header::CONTENT_TYPE, mime_type.as_str())
            .body(bytes)
            .send()
            .await
            .map_err(|e| http_error("File upload", e))?;
        let response = error_for_status("File upload", response).await?;
        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| http_error("Reading upload response", e))?;

        self.uploaded().push(uploaded.file.name.clone());

        let file = self.wait_until_active(uploaded.file).await?;
        Ok(MediaHandle {
            mime_type: if file.mime_type.is_empty() {
                mime_type
            } else {
                file.mime_type
            },
            name: file.name,
            uri: file.uri,
        })
    }

    async fn generate_script(&self, media: &MediaHandle) -> Result<String, ExternalError> {
        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text {
                    text: SYSTEM_PROMPT,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    Part::File {
                        file_data: FileData {
                            file_uri: &media.uri,
                            mime_type: &media.mime_type,
                        },
                    },
                    Part::Text { text: USER_PROMPT },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| http_error("Script generation", e))?;
        let response = error_for_status("Script generation", response).await?;
        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| http_error("Reading generation response", e))?;

        let script = extract_script(parsed).ok_or_else(|| ExternalError::InvalidResponse {
            service: SERVICE.to_string(),
            message: "response contained no script text".to_string(),
        })?;
        info!("Generated script ({} chars)", script.chars().count());
        Ok(script)
    }

    async fn release_all(&self) -> Result<usize, ExternalError> {
        let names: Vec<String> = std::mem::take(&mut *self.uploaded());
        let mut released = 0;

        for name in names {
            let url = format!("{}/v1beta/{}", self.base_url, name);
            let result = self
                .client
                .delete(&url)
                .header(API_KEY_HEADER, self.api_key.expose_secret())
                .send()
                .await;
            match result {
                Ok(response) if response.status().is_success() => released += 1,
                Ok(response) => warn!("Failed to delete {}: {}", name, response.status()),
                Err(e) => warn!("Failed to delete {}: {}", name, e.without_url()),
            }
        }

        if released > 0 {
            info!("Released {} uploaded file(s)", released);
        }
        Ok(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_shape() {
        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text { text: "sys" }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    Part::File {
                        file_data: FileData {
                            file_uri: "https://files/abc",
                            mime_type: "video/mp4",
                        },
                    },
                    Part::Text { text: "go" },
                ],
            }],
            generation_config: GenerationConfig { temperature: 1.5 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(
            json["contents"][0]["parts"][0]["fileData"]["fileUri"],
            "https://files/abc"
        );
        assert_eq!(
            json["contents"][0]["parts"][0]["fileData"]["mimeType"],
            "video/mp4"
        );
        assert_eq!(json["generationConfig"]["temperature"], 1.5);
    }

    #[test]
    fn test_extract_script_joins_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": " Hello "}, {"text": "world. "}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_script(response).as_deref(), Some("Hello world."));
    }

    #[test]
    fn test_extract_script_empty() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(extract_script(response).is_none());
        let response: GenerateResponse =
            serde_json::from_str(r#"{"candidates": [{"content": {"parts": [{"text": "  "}]}}]}"#)
                .unwrap();
        assert!(extract_script(response).is_none());
    }

    #[test]
    fn test_upload_response_parses() {
        let response: UploadResponse = serde_json::from_str(
            r#"{"file": {"name": "files/abc", "uri": "https://x/files/abc", "mimeType": "video/mp4", "state": "PROCESSING"}}"#,
        )
        .unwrap();
        assert_eq!(response.file.name, "files/abc");
        assert_eq!(response.file.state.as_deref(), Some("PROCESSING"));
    }

    #[tokio::test]
    async fn test_release_all_with_nothing_uploaded() {
        let client = GeminiClient::new(SecretString::from("k".to_string()), "m").unwrap();
        assert_eq!(client.release_all().await.unwrap(), 0);
    }
}
