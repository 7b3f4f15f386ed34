//! Pre-fitted standardization and polynomial expansion.

use ndarray::Array1;
use serde::{de::DeserializeOwned, Deserialize};
use std::{fs, path::Path};

use crate::error::{PipelineError, Result, Stage};
use crate::types::{ExpandedVector, FeatureVector, ScaledVector};

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let txt = fs::read_to_string(path)
        .map_err(|e| PipelineError::schema_load(path.display(), format!("failed to read: {e}")))?;
    serde_json::from_str(&txt)
        .map_err(|e| PipelineError::schema_load(path.display(), format!("failed to parse: {e}")))
}

fn check_width(stage: Stage, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(PipelineError::PipelineShape {
            stage,
            expected,
            actual,
        })
    }
}

#[derive(Deserialize)]
struct ScalerJson {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

/// `z = (x - mean) / scale`, parameters fixed at training time.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        if mean.len() != scale.len() {
            return Err(PipelineError::schema_load(
                "<scaler>",
                format!("mean has {} entries, scale has {}", mean.len(), scale.len()),
            ));
        }
        if mean.iter().chain(&scale).any(|v| !v.is_finite()) {
            return Err(PipelineError::schema_load("<scaler>", "non-finite parameter"));
        }
        // constant columns were fitted with zero variance
        let scale = scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();
        Ok(Self {
            mean: Array1::from_vec(mean),
            scale,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw: ScalerJson = read_json(path)?;
        Self::new(raw.mean, raw.scale).map_err(|e| relabel(e, path))
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn scale(&self, x: FeatureVector) -> Result<ScaledVector> {
        check_width(Stage::Scaler, self.n_features(), x.len())?;
        let z = (x.values() - &self.mean) / &self.scale;
        Ok(ScaledVector::from(z))
    }
}

#[derive(Deserialize)]
struct ExpanderJson {
    n_features_in: usize,
    degree: u32,
    #[serde(default = "default_true")]
    include_bias: bool,
    #[serde(default)]
    interaction_only: bool,
    #[serde(default)]
    powers: Option<Vec<Vec<u32>>>,
}

fn default_true() -> bool {
    true
}

/// Maps a standardized row onto monomials of its entries.
///
/// Each term is stored as the multiset of input indices whose product it is;
/// the empty term is the bias column.
#[derive(Debug, Clone)]
pub struct PolynomialExpander {
    n_features_in: usize,
    terms: Vec<Vec<usize>>,
}

impl PolynomialExpander {
    /// Terms in the conventional order: by degree, then lexicographic
    /// combinations with replacement.
    pub fn new(n_features_in: usize, degree: u32, include_bias: bool, interaction_only: bool) -> Self {
        let mut terms = Vec::new();
        let start = if include_bias { 0 } else { 1 };
        for d in start..=degree as usize {
            push_combinations(n_features_in, d, interaction_only, &mut Vec::new(), 0, &mut terms);
        }
        Self {
            n_features_in,
            terms,
        }
    }

    /// Explicit exponent matrix, one row per output term.
    pub fn from_powers(n_features_in: usize, powers: &[Vec<u32>]) -> Result<Self> {
        let mut terms = Vec::with_capacity(powers.len());
        for (i, row) in powers.iter().enumerate() {
            if row.len() != n_features_in {
                return Err(PipelineError::schema_load(
                    "<expander>",
                    format!("powers row {i} has {} entries, expected {n_features_in}", row.len()),
                ));
            }
            let mut term = Vec::new();
            for (idx, &p) in row.iter().enumerate() {
                term.extend(std::iter::repeat(idx).take(p as usize));
            }
            terms.push(term);
        }
        Ok(Self {
            n_features_in,
            terms,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw: ExpanderJson = read_json(path)?;
        match raw.powers {
            Some(powers) => Self::from_powers(raw.n_features_in, &powers).map_err(|e| relabel(e, path)),
            None => Ok(Self::new(
                raw.n_features_in,
                raw.degree,
                raw.include_bias,
                raw.interaction_only,
            )),
        }
    }

    pub fn n_features_in(&self) -> usize {
        self.n_features_in
    }

    pub fn n_output(&self) -> usize {
        self.terms.len()
    }

    pub fn expand(&self, x: ScaledVector) -> Result<ExpandedVector> {
        check_width(Stage::Expander, self.n_features_in, x.len())?;
        let v = x.values();
        let out: Array1<f64> = self
            .terms
            .iter()
            .map(|term| term.iter().map(|&i| v[i]).product::<f64>())
            .collect();
        Ok(ExpandedVector::from(out))
    }
}

fn push_combinations(
    n: usize,
    remaining: usize,
    interaction_only: bool,
    current: &mut Vec<usize>,
    from: usize,
    out: &mut Vec<Vec<usize>>,
) {
    if remaining == 0 {
        out.push(current.clone());
        return;
    }
    for i in from..n {
        current.push(i);
        let next = if interaction_only { i + 1 } else { i };
        push_combinations(n, remaining - 1, interaction_only, current, next, out);
        current.pop();
    }
}

pub(crate) fn relabel(err: PipelineError, path: &Path) -> PipelineError {
    match err {
        PipelineError::SchemaLoad { reason, .. } => PipelineError::schema_load(path.display(), reason),
        other => other,
    }
}
