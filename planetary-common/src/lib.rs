pub mod error;
pub mod types;

pub use error::{BotError, BotResult};
pub use types::{
    Caption, CatalogRow, Platform, PostReceipt, PostSource, PreparedPost, PreviewImage,
};
