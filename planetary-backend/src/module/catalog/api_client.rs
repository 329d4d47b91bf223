///! OPUS API client for resolving and downloading preview images

use super::types::{ImageEntry, ImageMetadataResponse};
use planetary_common::{BotError, BotResult, PreviewImage};
use std::io::Write;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://pds-rings-tools.seti.org/opus/api";
const REQUEST_TIMEOUT_SECONDS: u64 = 60;

#[derive(Debug, Clone)]
pub struct CatalogClientConfig {
    /// Base of the OPUS API, without trailing slash
    pub api_base: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for CatalogClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECONDS),
            user_agent: format!("planetary-bot/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Resolves observation IDs to preview images and downloads them
pub struct CatalogClient {
    client: reqwest::Client,
    config: CatalogClientConfig,
}

impl CatalogClient {
    pub fn new(config: CatalogClientConfig) -> BotResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| BotError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, config))
    }

    /// Use a preconfigured HTTP client
    pub fn with_client(client: reqwest::Client, config: CatalogClientConfig) -> Self {
        Self { client, config }
    }

    /// Metadata lookup URL for one observation
    pub fn metadata_url(&self, observation_id: &str) -> String {
        format!(
            "{}/image/med/{}.json",
            self.config.api_base.trim_end_matches('/'),
            observation_id
        )
    }

    /// Download the medium-size preview image for an observation.
    ///
    /// The returned image lives in a temp file that is deleted when the
    /// [`PreviewImage`] is dropped.
    pub async fn fetch_preview(&self, observation_id: &str) -> BotResult<PreviewImage> {
        let entry = self.fetch_metadata(observation_id).await?;
        let image_url = entry.url();

        tracing::info!("Downloading {}", image_url);
        self.download(&image_url, entry.extension()).await
    }

    /// Look up the image location for an observation
    pub async fn fetch_metadata(&self, observation_id: &str) -> BotResult<ImageEntry> {
        let url = self.metadata_url(observation_id);
        tracing::debug!("Fetching image metadata from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BotError::Network(format!("Failed to send request for {}: {}", observation_id, e)))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!(
                "HTTP error {} for {}",
                response.status(),
                observation_id
            )));
        }

        let body = response.text().await.map_err(|e| {
            BotError::Network(format!("Failed to read response body for {}: {}", observation_id, e))
        })?;

        parse_metadata(&body, observation_id)
    }

    async fn download(&self, image_url: &str, extension: Option<&str>) -> BotResult<PreviewImage> {
        let response = self
            .client
            .get(image_url)
            .send()
            .await
            .map_err(|e| BotError::Network(format!("Failed to download {}: {}", image_url, e)))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!(
                "HTTP error {} for {}",
                response.status(),
                image_url
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BotError::Network(format!("Failed to read image body {}: {}", image_url, e)))?;

        let suffix = extension.map(|ext| format!(".{}", ext)).unwrap_or_default();
        let mut file = tempfile::Builder::new()
            .prefix("planetary-")
            .suffix(&suffix)
            .tempfile()
            .map_err(|e| BotError::Network(format!("Failed to create temp file: {}", e)))?;

        file.write_all(&bytes)
            .and_then(|_| file.flush())
            .map_err(|e| BotError::Network(format!("Failed to write image to temp file: {}", e)))?;

        tracing::debug!("Saved {} bytes to {}", bytes.len(), file.path().display());

        Ok(PreviewImage::new(file, image_url))
    }
}

/// Extract the first image entry from a metadata response body
pub fn parse_metadata(body: &str, observation_id: &str) -> BotResult<ImageEntry> {
    let response: ImageMetadataResponse = serde_json::from_str(body).map_err(|e| {
        BotError::Network(format!("Failed to parse JSON response for {}: {}", observation_id, e))
    })?;

    response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| BotError::Network(format!("No image listed for {}", observation_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const SAMPLE_JSON: &str = r#"{
        "data": [
            {
                "opus_id": "co-iss-n1869861543",
                "path": "https://pds-rings.seti.org/holdings/previews/COISS_2xxx/COISS_2111/data/1869781429_1869861543/",
                "img": "N1869861543_1_med.jpg"
            }
        ]
    }"#;

    /// Minimal HTTP server answering canned responses by request path
    async fn serve(routes: Vec<(&'static str, u16, Vec<u8>)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = vec![0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

                let (status, body) = routes
                    .iter()
                    .find(|(p, _, _)| *p == path)
                    .map(|(_, s, b)| (*s, b.clone()))
                    .unwrap_or((404, b"not found".to_vec()));

                let head = format!(
                    "HTTP/1.1 {} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            }
        });

        format!("http://{}", addr)
    }

    fn client_for(base: &str) -> CatalogClient {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        CatalogClient::with_client(
            http,
            CatalogClientConfig {
                api_base: format!("{}/opus/api", base),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_metadata_url() {
        let client = CatalogClient::new(CatalogClientConfig::default()).unwrap();
        assert_eq!(
            client.metadata_url("co-iss-n1869861543"),
            "http://pds-rings-tools.seti.org/opus/api/image/med/co-iss-n1869861543.json"
        );
    }

    #[test]
    fn test_parse_metadata() {
        let entry = parse_metadata(SAMPLE_JSON, "co-iss-n1869861543").unwrap();
        assert_eq!(
            entry.url(),
            "https://pds-rings.seti.org/holdings/previews/COISS_2xxx/COISS_2111/data/1869781429_1869861543/N1869861543_1_med.jpg"
        );
        assert_eq!(entry.extension(), Some("jpg"));
    }

    #[test]
    fn test_parse_metadata_errors_are_network() {
        assert!(matches!(
            parse_metadata("<html>oops</html>", "x"),
            Err(BotError::Network(_))
        ));
        assert!(matches!(
            parse_metadata(r#"{"data": []}"#, "x"),
            Err(BotError::Network(ref msg)) if msg.contains("No image")
        ));
        assert!(matches!(
            parse_metadata(r#"{"data": [{"path": "http://a/"}]}"#, "x"),
            Err(BotError::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_preview_downloads_to_temp_file() {
        // Image server first, so the metadata can point at it
        let image_host = serve(vec![("/previews/N1_med.jpg", 200, b"\xff\xd8\xffJPEG".to_vec())]).await;
        let metadata = format!(
            r#"{{"data": [{{"path": "{}/previews/", "img": "N1_med.jpg"}}]}}"#,
            image_host
        );
        let api_host = serve(vec![("/opus/api/image/med/co-iss-n1.json", 200, metadata.into_bytes())]).await;

        let client = client_for(&api_host);
        let image = client.fetch_preview("co-iss-n1").await.unwrap();

        let path = image.path().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"\xff\xd8\xffJPEG");
        assert!(path.to_string_lossy().ends_with(".jpg"));
        assert!(image.source_url().ends_with("/previews/N1_med.jpg"));

        drop(image);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_fetch_preview_http_error() {
        let api_host = serve(vec![]).await;
        let client = client_for(&api_host);

        let err = client.fetch_preview("missing").await.unwrap_err();
        assert!(matches!(err, BotError::Network(ref msg) if msg.contains("404")));
    }

    #[tokio::test]
    async fn test_fetch_preview_image_missing() {
        let image_host = serve(vec![]).await;
        let metadata = format!(
            r#"{{"data": [{{"path": "{}/previews/", "img": "gone.jpg"}}]}}"#,
            image_host
        );
        let api_host = serve(vec![("/opus/api/image/med/obs.json", 200, metadata.into_bytes())]).await;

        let err = client_for(&api_host).fetch_preview("obs").await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    #[ignore] // Requires network connection
    async fn test_fetch_real_preview() {
        let client = CatalogClient::new(CatalogClientConfig::default()).unwrap();
        let image = client.fetch_preview("co-iss-n1869861543").await.unwrap();
        assert!(std::fs::metadata(image.path()).unwrap().len() > 0);
        assert!(image.source_url().ends_with("N1869861543_1_med.jpg"));
    }
}
