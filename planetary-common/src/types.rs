use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::BotResult;

/// Social platforms a post can be delivered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "twitter")]
    Twitter,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
        }
    }

    /// Human-readable name, as used in console messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Twitter => "Twitter",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One observation record from the OPUS image index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRow {
    /// Mission / instrument host code, e.g. "CO"
    #[serde(rename = "Instrument Host Name")]
    pub instrument_host: String,
    /// Raw target name, e.g. "S RINGS"
    #[serde(rename = "Intended Target Name")]
    pub target: String,
    /// Either ISO-8601 or day-of-year notation
    #[serde(rename = "Observation Time 1 (UTC)")]
    pub observation_time: String,
    #[serde(rename = "Ring Observation ID")]
    pub observation_id: String,
}

impl CatalogRow {
    /// CSV headers a dataset must carry
    pub const REQUIRED_COLUMNS: [&'static str; 4] = [
        "Instrument Host Name",
        "Intended Target Name",
        "Observation Time 1 (UTC)",
        "Ring Observation ID",
    ];
}

/// Display-ready description of one observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caption {
    pub target: String,
    pub mission: String,
    /// `YYYY-MM-DD HH:MM:SS`
    pub time: String,
    pub permalink: String,
}

impl Caption {
    /// Render the four-line status text
    pub fn text(&self) -> String {
        format!(
            "📷 {}\n🛰 {}\n🗓 {}\n🔗 {}",
            self.target, self.mission, self.time, self.permalink
        )
    }
}

impl std::fmt::Display for Caption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text())
    }
}

/// Downloaded preview image. The file is removed when this value is dropped.
#[derive(Debug)]
pub struct PreviewImage {
    file: NamedTempFile,
    source_url: String,
}

impl PreviewImage {
    pub fn new(file: NamedTempFile, source_url: impl Into<String>) -> Self {
        Self {
            file,
            source_url: source_url.into(),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }
}

/// Caption plus image, ready to hand to a publisher
#[derive(Debug)]
pub struct PreparedPost {
    pub caption: Caption,
    pub image: PreviewImage,
}

/// Confirmation returned by a publisher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostReceipt {
    pub platform: Platform,
    pub post_id: String,
    pub text: String,
}

/// Produces a fresh post on every call: select, format, fetch.
#[async_trait]
pub trait PostSource {
    async fn prepare(&mut self) -> BotResult<PreparedPost>;
}
