//! YouTube Data API v3 resumable upload.

use std::time::Duration;

use async_trait::async_trait;
use log::info;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{PublishRequest, Publisher};
use crate::error::ExternalError;
use crate::sanitize;

const UPLOAD_URL: &str = "https://www.googleapis.com/upload/youtube/v3/videos";
const SERVICE: &str = "YouTube";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Uploads of a few tens of MB over slow links.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(15 * 60);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoResource<'a> {
    snippet: Snippet<'a>,
    status: Status<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Snippet<'a> {
    title: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Status<'a> {
    privacy_status: &'a str,
    self_declared_made_for_kids: bool,
}

#[derive(Deserialize)]
struct UploadedVideo {
    #[serde(default)]
    id: Option<String>,
}

pub struct YouTubePublisher {
    client: Client,
    upload_url: String,
}

impl YouTubePublisher {
    pub fn new() -> Result<Self, ExternalError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .map_err(|e| ExternalError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            upload_url: UPLOAD_URL.to_string(),
        })
    }

    fn metadata<'a>(request: &'a PublishRequest) -> VideoResource<'a> {
        VideoResource {
            snippet: Snippet {
                title: &request.title,
                description: &request.description,
            },
            status: Status {
                privacy_status: request.privacy_status.as_str(),
                self_declared_made_for_kids: false,
            },
        }
    }
}

fn http_error(action: &str, e: reqwest::Error) -> ExternalError {
    ExternalError::Http(format!("{} failed: {}", action, e))
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

#[async_trait]
impl Publisher for YouTubePublisher {
    async fn publish(
        &self,
        access_token: &SecretString,
        request: &PublishRequest,
    ) -> Result<String, ExternalError> {
        let video = tokio::fs::read(&request.video_path)
            .await
            .map_err(|e| ExternalError::Io {
                path: request.video_path.clone(),
                source: e,
            })?;

        info!(
            "Uploading {} ({} bytes) as {}",
            sanitize::redact_path(&request.video_path),
            video.len(),
            request.privacy_status
        );

        let session = self
            .client
            .post(&self.upload_url)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(access_token.expose_secret())
            .header("X-Upload-Content-Type", "video/mp4")
            .header("X-Upload-Content-Length", video.len().to_string())
            .json(&Self::metadata(request))
            .send()
            .await
            .map_err(|e| http_error("Upload session", e))?;
        let session = error_for_status("Upload session", session).await?;

        let location = session
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ExternalError::InvalidResponse {
                service: SERVICE.to_string(),
                message: "upload session has no Location header".to_string(),
            })?;

        let response = self
            .client
            .put(&location)
            .bearer_auth(access_token.expose_secret())
            .header(CONTENT_TYPE, "video/mp4")
            .body(video)
            .send()
            .await
            .map_err(|e| http_error("Video upload", e))?;
        let response = error_for_status("Video upload", response).await?;

        let uploaded: UploadedVideo = response
            .json()
            .await
            .map_err(|e| http_error("Reading upload response", e))?;

        match uploaded.id {
            Some(id) if !id.is_empty() => {
                info!("Upload complete, video id {}", id);
                Ok(id)
            }
            _ => Err(ExternalError::InvalidResponse {
                service: SERVICE.to_string(),
                message: "upload succeeded but no video id was returned".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::PrivacyStatus;
    use std::path::PathBuf;

    #[test]
    fn test_metadata_shape() {
        let request = PublishRequest {
            video_path: PathBuf::from("/tmp/v.mp4"),
            title: "Title".to_string(),
            description: "Description".to_string(),
            privacy_status: PrivacyStatus::Unlisted,
        };
        let json = serde_json::to_value(YouTubePublisher::metadata(&request)).unwrap();
        assert_eq!(json["snippet"]["title"], "Title");
        assert_eq!(json["snippet"]["description"], "Description");
        assert_eq!(json["status"]["privacyStatus"], "unlisted");
        assert_eq!(json["status"]["selfDeclaredMadeForKids"], false);
    }

    #[tokio::test]
    async fn test_missing_video_is_io_error() {
        let publisher = YouTubePublisher::new().unwrap();
        let request = PublishRequest {
            video_path: PathBuf::from("/nonexistent/video.mp4"),
            title: "t".to_string(),
            description: "d".to_string(),
            privacy_status: PrivacyStatus::Public,
        };
        let err = publisher
            .publish(&SecretString::from("token".to_string()), &request)
            .await
            .unwrap_err();
        assert!(matches!(err, ExternalError::Io { .. }));
    }
}
