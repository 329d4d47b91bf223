///! Post generator - select, format and fetch in one step
///!
///! Every call to [`PostSource::prepare`] draws a fresh observation, so a
///! retry after a failed fetch or publish lands on a different image.

use async_trait::async_trait;
use planetary_common::{BotResult, PostSource, PreparedPost};

use crate::module::caption::CaptionFormatter;
use crate::module::catalog::{CatalogClient, DatasetIndex, Sampler};

pub struct PostGenerator {
    index: DatasetIndex,
    sampler: Sampler,
    formatter: CaptionFormatter,
    client: CatalogClient,
}

impl PostGenerator {
    pub fn new(
        index: DatasetIndex,
        sampler: Sampler,
        formatter: CaptionFormatter,
        client: CatalogClient,
    ) -> Self {
        Self {
            index,
            sampler,
            formatter,
            client,
        }
    }

    pub fn index(&self) -> &DatasetIndex {
        &self.index
    }
}

#[async_trait]
impl PostSource for PostGenerator {
    async fn prepare(&mut self) -> BotResult<PreparedPost> {
        let row = self.sampler.select(&self.index)?;
        tracing::info!(
            "Selected observation {} ({}, {})",
            row.observation_id,
            row.instrument_host,
            row.target
        );

        let caption = self.formatter.format(row)?;
        let image = self.client.fetch_preview(&row.observation_id).await?;

        Ok(PreparedPost { caption, image })
    }
}
