///! OAuth 1.0a request signing (HMAC-SHA1)
///!
///! Twitter's v1.1 media upload and the v2 post endpoint both accept
///! user-context OAuth 1.0a. Multipart and JSON bodies are not part of the
///! signature, so only the oauth_* parameters and any query parameters are
///! signed.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use planetary_common::{BotError, BotResult};
use rand::Rng;
use rand::distr::Alphanumeric;
use sha1::Sha1;

use super::twitter::TwitterCredentials;

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";
const NONCE_LEN: usize = 32;

/// RFC 3986 percent-encoding: everything except `A-Z a-z 0-9 - . _ ~`
pub fn percent_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// Per-request values that must not be reused
#[derive(Debug, Clone)]
pub struct RequestNonce {
    pub nonce: String,
    pub timestamp: i64,
}

impl RequestNonce {
    pub fn generate() -> Self {
        let nonce = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        Self {
            nonce,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// `METHOD&url&params`, each part percent-encoded, params sorted
pub fn signature_base_string(method: &str, url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&param_string)
    )
}

/// Base64 HMAC-SHA1 of the base string
pub fn sign(base_string: &str, consumer_secret: &str, token_secret: &str) -> BotResult<String> {
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| BotError::Publish(format!("Failed to create signing key: {}", e)))?;
    mac.update(base_string.as_bytes());

    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Build the `Authorization` header value for one request
pub fn authorization_header(
    credentials: &TwitterCredentials,
    method: &str,
    url: &str,
    extra_params: &[(&str, &str)],
    nonce: &RequestNonce,
) -> BotResult<String> {
    let timestamp = nonce.timestamp.to_string();
    let mut oauth_params: Vec<(String, String)> = vec![
        ("oauth_consumer_key".to_string(), credentials.app_key.clone()),
        ("oauth_nonce".to_string(), nonce.nonce.clone()),
        ("oauth_signature_method".to_string(), SIGNATURE_METHOD.to_string()),
        ("oauth_timestamp".to_string(), timestamp),
        ("oauth_token".to_string(), credentials.oauth_token.clone()),
        ("oauth_version".to_string(), OAUTH_VERSION.to_string()),
    ];

    let mut signed_params = oauth_params.clone();
    signed_params.extend(
        extra_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string())),
    );

    let base = signature_base_string(method, url, &signed_params);
    let signature = sign(&base, &credentials.app_secret, &credentials.oauth_token_secret)?;
    oauth_params.push(("oauth_signature".to_string(), signature));
    oauth_params.sort();

    let fields = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!("OAuth {}", fields))
}
