use async_trait::async_trait;
use planetary_common::{BotError, BotResult, Caption, Platform, PostReceipt};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::Publisher;
use super::oauth::{RequestNonce, authorization_header};

pub const DEFAULT_UPLOAD_URL: &str = "https://upload.twitter.com/1.1/media/upload.json";
pub const DEFAULT_POST_URL: &str = "https://api.twitter.com/2/tweets";

/// The four OAuth 1.0a values of a Twitter app acting as one user
#[derive(Clone, PartialEq, Eq)]
pub struct TwitterCredentials {
    pub app_key: String,
    pub app_secret: String,
    pub oauth_token: String,
    pub oauth_token_secret: String,
}

impl std::fmt::Debug for TwitterCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterCredentials")
            .field("app_key", &self.app_key)
            .field("app_secret", &"<redacted>")
            .field("oauth_token", &self.oauth_token)
            .field("oauth_token_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize, Debug)]
struct MediaUploadResponse {
    media_id_string: String,
}

#[derive(Serialize, Debug)]
struct CreatePostRequest<'a> {
    text: &'a str,
    media: PostMedia<'a>,
}

#[derive(Serialize, Debug)]
struct PostMedia<'a> {
    media_ids: [&'a str; 1],
}

#[derive(Deserialize, Debug)]
struct CreatePostResponse {
    data: CreatedPost,
}

#[derive(Deserialize, Debug)]
struct CreatedPost {
    id: String,
    #[serde(default)]
    text: String,
}

pub struct TwitterPublisher {
    client: reqwest::Client,
    credentials: TwitterCredentials,
    upload_url: String,
    post_url: String,
}

impl TwitterPublisher {
    pub fn new(
        credentials: TwitterCredentials,
        upload_url: impl Into<String>,
        post_url: impl Into<String>,
        timeout: Duration,
    ) -> BotResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BotError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, credentials, upload_url, post_url))
    }

    pub fn with_client(
        client: reqwest::Client,
        credentials: TwitterCredentials,
        upload_url: impl Into<String>,
        post_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            credentials,
            upload_url: upload_url.into(),
            post_url: post_url.into(),
        }
    }

    /// Upload an image as binary media, returning its media id
    pub async fn upload_media(&self, image_path: &Path) -> BotResult<String> {
        let bytes = tokio::fs::read(image_path).await.map_err(|e| {
            BotError::Publish(format!("Failed to read image {}: {}", image_path.display(), e))
        })?;
        let file_name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.jpg".to_string());

        tracing::debug!("Uploading {} ({} bytes)", file_name, bytes.len());

        let auth = authorization_header(
            &self.credentials,
            "POST",
            &self.upload_url,
            &[],
            &RequestNonce::generate(),
        )?;
        let form = Form::new().part("media", Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(&self.upload_url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BotError::Publish(format!("Failed to send media upload: {}", e)))?;

        let upload: MediaUploadResponse = read_json(response, "media upload").await?;
        tracing::info!("Uploaded media {}", upload.media_id_string);

        Ok(upload.media_id_string)
    }

    /// Create a post with one attached media id
    pub async fn create_post(&self, text: &str, media_id: &str) -> BotResult<PostReceipt> {
        let auth = authorization_header(
            &self.credentials,
            "POST",
            &self.post_url,
            &[],
            &RequestNonce::generate(),
        )?;
        let body = CreatePostRequest {
            text,
            media: PostMedia {
                media_ids: [media_id],
            },
        };

        let response = self
            .client
            .post(&self.post_url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(&body)
            .send()
            .await
            .map_err(|e| BotError::Publish(format!("Failed to send post: {}", e)))?;

        let created: CreatePostResponse = read_json(response, "post creation").await?;

        Ok(PostReceipt {
            platform: Platform::Twitter,
            post_id: created.data.id,
            text: created.data.text,
        })
    }
}

#[async_trait]
impl Publisher for TwitterPublisher {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn publish(&self, caption: &Caption, image_path: &Path) -> BotResult<PostReceipt> {
        let media_id = self.upload_media(image_path).await?;
        let receipt = self.create_post(&caption.text(), &media_id).await?;
        tracing::info!("Posted {} to {}: {:?}", receipt.post_id, receipt.platform, receipt.text);
        Ok(receipt)
    }
}

/// Decode a JSON body, turning HTTP and decode failures into publish errors
async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    step: &str,
) -> BotResult<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| BotError::Publish(format!("Failed to read {} response: {}", step, e)))?;

    if !status.is_success() {
        return Err(BotError::Publish(format!("HTTP error {} during {}: {}", status, step, body)));
    }

    serde_json::from_str(&body)
        .map_err(|e| BotError::Publish(format!("Failed to parse {} response: {}", step, e)))
}
