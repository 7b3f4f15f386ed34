//! Training-time feature schema.
//!
//! The column order here is the order the scaler, expander and model were
//! fitted on. It is read once from the header of the training snapshot and
//! never changes afterwards.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{PipelineError, Result};

pub const NUMERIC_COLUMNS: [&str; 3] = ["average_rainfall", "presticides_tonnes", "avg_temp"];
pub const COUNTRY_PREFIX: &str = "Country_";
pub const CROP_PREFIX: &str = "Item_";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnId {
    Numeric(&'static str),
    Country(String),
    Crop(String),
}

impl ColumnId {
    /// Header name as it appears in the training snapshot.
    pub fn header(&self) -> String {
        match self {
            ColumnId::Numeric(name) => (*name).to_string(),
            ColumnId::Country(name) => format!("{COUNTRY_PREFIX}{name}"),
            ColumnId::Crop(name) => format!("{CROP_PREFIX}{name}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    columns: Vec<ColumnId>,
    countries: Vec<String>,
    crops: Vec<String>,
    // name -> position in `columns`
    country_slots: HashMap<String, usize>,
    crop_slots: HashMap<String, usize>,
}

impl SchemaRegistry {
    /// Read the header row of the training snapshot CSV.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| PipelineError::schema_load(&shown, format!("failed to open CSV: {e}")))?;
        let headers = reader
            .headers()
            .map_err(|e| PipelineError::schema_load(&shown, format!("failed to read headers: {e}")))?;

        Self::from_headers(headers.iter()).map_err(|e| match e {
            PipelineError::SchemaLoad { reason, .. } => PipelineError::SchemaLoad {
                path: shown.clone(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_headers<I, S>(headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let headers: Vec<String> = headers
            .into_iter()
            .map(|h| h.as_ref().trim().to_string())
            .filter(|h| !h.is_empty())
            .collect();
        let fail = |reason: String| PipelineError::schema_load("<headers>", reason);

        if headers.is_empty() {
            return Err(fail("snapshot has no columns".into()));
        }
        if headers.len() < NUMERIC_COLUMNS.len() {
            return Err(fail(format!(
                "expected at least {} leading numeric columns, found {}",
                NUMERIC_COLUMNS.len(),
                headers.len()
            )));
        }

        let mut columns = Vec::with_capacity(headers.len());
        for (got, want) in headers.iter().zip(NUMERIC_COLUMNS) {
            if got != want {
                return Err(fail(format!("expected numeric column {want:?}, found {got:?}")));
            }
            columns.push(ColumnId::Numeric(want));
        }

        let mut countries = Vec::new();
        let mut crops = Vec::new();
        let mut country_slots = HashMap::new();
        let mut crop_slots = HashMap::new();

        for header in &headers[NUMERIC_COLUMNS.len()..] {
            let slot = columns.len();
            let (column, inserted) = if let Some(name) = header.strip_prefix(COUNTRY_PREFIX) {
                let fresh = !name.is_empty() && country_slots.insert(name.to_string(), slot).is_none();
                if fresh {
                    countries.push(name.to_string());
                }
                (ColumnId::Country(name.to_string()), fresh)
            } else if let Some(name) = header.strip_prefix(CROP_PREFIX) {
                let fresh = !name.is_empty() && crop_slots.insert(name.to_string(), slot).is_none();
                if fresh {
                    crops.push(name.to_string());
                }
                (ColumnId::Crop(name.to_string()), fresh)
            } else {
                return Err(fail(format!(
                    "column {header:?} is neither {COUNTRY_PREFIX}* nor {CROP_PREFIX}*"
                )));
            };
            if !inserted {
                return Err(fail(format!("column {header:?} is empty or duplicated")));
            }
            columns.push(column);
        }

        if countries.is_empty() {
            return Err(fail("no Country_* columns".into()));
        }
        if crops.is_empty() {
            return Err(fail("no Item_* columns".into()));
        }

        Ok(Self {
            columns,
            countries,
            crops,
            country_slots,
            crop_slots,
        })
    }

    pub fn ordered_columns(&self) -> &[ColumnId] {
        &self.columns
    }

    /// Known countries, in snapshot order.
    pub fn known_countries(&self) -> &[String] {
        &self.countries
    }

    /// Known crops, in snapshot order.
    pub fn known_crops(&self) -> &[String] {
        &self.crops
    }

    pub fn contains_country(&self, name: &str) -> bool {
        self.country_slots.contains_key(name)
    }

    pub fn contains_crop(&self, name: &str) -> bool {
        self.crop_slots.contains_key(name)
    }

    pub(crate) fn country_slot(&self, name: &str) -> Option<usize> {
        self.country_slots.get(name).copied()
    }

    pub(crate) fn crop_slot(&self, name: &str) -> Option<usize> {
        self.crop_slots.get(name).copied()
    }

    /// Total feature width.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
