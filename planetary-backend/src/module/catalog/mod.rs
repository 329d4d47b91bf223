///! OPUS catalog module
///!
///! Loads the curated image index exported from the OPUS search interface,
///! picks an observation from it, and downloads the matching preview image
///! from the PDS Planetary Rings Node API.

pub mod api_client;
pub mod dataset;
pub mod sampler;
pub mod types;

pub use api_client::{CatalogClient, CatalogClientConfig};
pub use dataset::DatasetIndex;
pub use sampler::{Sampler, DEFAULT_EXCLUDED_MISSIONS};
