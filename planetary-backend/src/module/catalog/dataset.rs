///! Dataset index - CSV loader for the OPUS image index
///!
///! The index is a CSV export from the OPUS search interface. Only four
///! columns are used; any others are ignored.

use planetary_common::{BotError, BotResult, CatalogRow};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

/// In-memory, read-only view of the image catalog
#[derive(Debug, Clone, Default)]
pub struct DatasetIndex {
    rows: Vec<CatalogRow>,
}

impl DatasetIndex {
    /// Load from CSV file
    pub async fn load(csv_path: impl AsRef<Path>) -> BotResult<Self> {
        let csv_path = csv_path.as_ref();
        tracing::info!("Loading image index from: {}", csv_path.display());

        let content = tokio::fs::read_to_string(csv_path).await.map_err(|e| {
            BotError::Load(format!("Failed to read CSV file {}: {}", csv_path.display(), e))
        })?;

        let index = Self::from_reader(content.as_bytes())?;

        tracing::info!(
            "Loaded {} observations across {} missions",
            index.len(),
            index.missions().len()
        );

        Ok(index)
    }

    /// Parse CSV content from any reader
    pub fn from_reader<R: Read>(reader: R) -> BotResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| BotError::Load(format!("Failed to read CSV header: {}", e)))?
            .clone();

        let missing: Vec<&str> = CatalogRow::REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| !headers.iter().any(|h| h == *column))
            .collect();
        if !missing.is_empty() {
            return Err(BotError::Load(format!(
                "Missing required columns: {}",
                missing.join(", ")
            )));
        }

        let mut rows = Vec::new();
        for (row_number, result) in reader.deserialize::<CatalogRow>().enumerate() {
            // Header is line 1
            let row = result.map_err(|e| {
                BotError::Load(format!("Malformed CSV row {}: {}", row_number + 2, e))
            })?;
            rows.push(row);
        }

        tracing::debug!("Parsed {} CSV rows", rows.len());

        Ok(Self { rows })
    }

    pub fn from_rows(rows: Vec<CatalogRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    /// Distinct mission codes, sorted
    pub fn missions(&self) -> BTreeSet<&str> {
        self.rows
            .iter()
            .map(|row| row.instrument_host.as_str())
            .collect()
    }

    /// All rows captured by one mission, in index order
    pub fn rows_for_mission<'a>(&'a self, mission: &'a str) -> impl Iterator<Item = &'a CatalogRow> + 'a {
        self.rows
            .iter()
            .filter(move |row| row.instrument_host == mission)
    }
}
