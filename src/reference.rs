//! Country and crop lists offered to presentation adapters.

use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::schema::SchemaRegistry;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReferenceCatalog {
    pub countries: Vec<String>,
    pub crops: Vec<String>,
}

impl ReferenceCatalog {
    /// Distinct `area` / `item` values from the reference dataset, in
    /// first-seen order.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| PipelineError::schema_load(&shown, format!("failed to open CSV: {e}")))?;
        let headers = reader
            .headers()
            .map_err(|e| PipelineError::schema_load(&shown, format!("failed to read headers: {e}")))?
            .clone();

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| PipelineError::schema_load(&shown, format!("missing column {name:?}")))
        };
        let area_idx = column("area")?;
        let item_idx = column("item")?;

        let mut catalog = Self::default();
        let mut seen_countries = HashSet::new();
        let mut seen_crops = HashSet::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| {
                PipelineError::schema_load(&shown, format!("line {}: {e}", line + 2))
            })?;
            if let Some(area) = record.get(area_idx).map(str::trim).filter(|s| !s.is_empty()) {
                if seen_countries.insert(area.to_string()) {
                    catalog.countries.push(area.to_string());
                }
            }
            if let Some(item) = record.get(item_idx).map(str::trim).filter(|s| !s.is_empty()) {
                if seen_crops.insert(item.to_string()) {
                    catalog.crops.push(item.to_string());
                }
            }
        }
        Ok(catalog)
    }

    /// Vocabulary straight from the schema, used when no reference dataset
    /// is configured.
    pub fn from_schema(schema: &SchemaRegistry) -> Self {
        Self {
            countries: schema.known_countries().to_vec(),
            crops: schema.known_crops().to_vec(),
        }
    }

    /// Drops names the model was never trained on. Returns what was dropped.
    pub fn restrict_to(&mut self, schema: &SchemaRegistry) -> Vec<String> {
        let mut dropped = Vec::new();
        self.countries.retain(|c| {
            let keep = schema.contains_country(c);
            if !keep {
                dropped.push(c.clone());
            }
            keep
        });
        self.crops.retain(|c| {
            let keep = schema.contains_crop(c);
            if !keep {
                dropped.push(c.clone());
            }
            keep
        });
        dropped
    }
}
