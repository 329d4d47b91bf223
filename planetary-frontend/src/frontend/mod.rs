pub mod oauth;
pub mod twitter;

use async_trait::async_trait;
use planetary_common::{BotResult, Caption, Platform, PostReceipt};
use std::path::Path;

pub use twitter::{TwitterCredentials, TwitterPublisher};

/// A social platform that accepts one image plus a caption
#[async_trait]
pub trait Publisher {
    fn platform(&self) -> Platform;

    /// Upload the image and create a post referencing it.
    /// Not idempotent: every successful call is a new public post.
    async fn publish(&self, caption: &Caption, image_path: &Path) -> BotResult<PostReceipt>;
}
