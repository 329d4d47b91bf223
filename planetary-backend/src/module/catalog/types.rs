///! OPUS API response types

use serde::{Deserialize, Serialize};

/// Response of `GET {api}/image/med/{observation_id}.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMetadataResponse {
    #[serde(default)]
    pub data: Vec<ImageEntry>,
}

/// One image entry; the full URL is `path` followed by `img`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageEntry {
    pub path: String,
    pub img: String,
}

impl ImageEntry {
    pub fn url(&self) -> String {
        format!("{}{}", self.path, self.img)
    }

    /// File extension of the image, used for the temp file suffix
    pub fn extension(&self) -> Option<&str> {
        let name = self.img.rsplit('/').next()?;
        let (_, ext) = name.rsplit_once('.')?;
        if ext.is_empty() || ext.len() > 5 {
            None
        } else {
            Some(ext)
        }
    }
}
