///! Caption module
///!
///! Turns a raw catalog row into the four-line status text:
///! target, mission, observation time and OPUS permalink.

pub mod formatter;
pub mod name_mapper;
pub mod time;

pub use formatter::{CaptionFormatter, DEFAULT_VIEWER_BASE};
pub use name_mapper::{NameMapper, NameMappingConfig};
pub use time::normalize_time;
