use super::name_mapper::NameMapper;
use super::time::normalize_time;
use planetary_common::{BotResult, Caption, CatalogRow};

pub const DEFAULT_VIEWER_BASE: &str = "http://pds-rings-tools.seti.org/opus";

/// Turns catalog rows into captions
#[derive(Debug, Clone)]
pub struct CaptionFormatter {
    names: NameMapper,
    viewer_base: String,
}

impl Default for CaptionFormatter {
    fn default() -> Self {
        Self::new(NameMapper::with_defaults(), DEFAULT_VIEWER_BASE)
    }
}

impl CaptionFormatter {
    pub fn new(names: NameMapper, viewer_base: impl Into<String>) -> Self {
        Self {
            names,
            viewer_base: viewer_base.into(),
        }
    }

    /// OPUS detail page for one observation
    pub fn permalink(&self, observation_id: &str) -> String {
        format!(
            "{}#/view=detail&detail={}",
            self.viewer_base.trim_end_matches('/'),
            observation_id
        )
    }

    pub fn format(&self, row: &CatalogRow) -> BotResult<Caption> {
        Ok(Caption {
            target: self.names.target_name(&row.target),
            mission: self.names.mission_name(&row.instrument_host),
            time: normalize_time(&row.observation_time)?,
            permalink: self.permalink(&row.observation_id),
        })
    }
}
