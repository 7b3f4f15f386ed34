use anyhow::{Context, Result};
use serde::Deserialize;
use std::{env, fs, path::PathBuf};

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "defaults::scaler")]
    pub scaler_path: PathBuf,
    #[serde(default = "defaults::expander")]
    pub expander_path: PathBuf,
    #[serde(default = "defaults::model")]
    pub model_path: PathBuf,
    #[serde(default = "defaults::schema")]
    pub schema_path: PathBuf,
    #[serde(default)]
    pub reference_path: Option<PathBuf>,
    #[serde(default = "defaults::port")]
    pub port: u16,
    #[serde(default)]
    pub log_pred: bool,
}

mod defaults {
    use std::path::PathBuf;

    pub fn scaler() -> PathBuf {
        PathBuf::from("artifacts/sc.json")
    }
    pub fn expander() -> PathBuf {
        PathBuf::from("artifacts/pf.json")
    }
    pub fn model() -> PathBuf {
        PathBuf::from("artifacts/model.json")
    }
    pub fn schema() -> PathBuf {
        PathBuf::from("data/test.csv")
    }
    pub fn reference() -> PathBuf {
        PathBuf::from("data/main.csv")
    }
    pub fn port() -> u16 {
        8080
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scaler_path: defaults::scaler(),
            expander_path: defaults::expander(),
            model_path: defaults::model(),
            schema_path: defaults::schema(),
            reference_path: None,
            port: defaults::port(),
            log_pred: false,
        }
    }
}

impl Config {
    /// JSON file with any subset of the fields.
    pub fn load(path: &str) -> Result<Self> {
        let data = fs::read_to_string(path).with_context(|| format!("failed to read config at {}", path))?;
        serde_json::from_str(&data).with_context(|| format!("invalid config JSON in {}", path))
    }

    /// `CONFIG_PATH` if set, otherwise individual environment variables.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = env::var("CONFIG_PATH") {
            return Self::load(&path);
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = |key: &str, default: PathBuf| lookup(key).map(PathBuf::from).unwrap_or(default);

        let port = match lookup("PORT") {
            Some(s) => s.parse().with_context(|| format!("invalid PORT {:?}", s))?,
            None => defaults::port(),
        };

        // the reference dataset is optional; use the conventional path only if it exists
        let reference_path = lookup("REFERENCE_PATH").map(PathBuf::from).or_else(|| {
            let p = defaults::reference();
            p.exists().then_some(p)
        });

        Ok(Self {
            scaler_path: path("SCALER_PATH", defaults::scaler()),
            expander_path: path("EXPANDER_PATH", defaults::expander()),
            model_path: path("MODEL_PATH", defaults::model()),
            schema_path: path("SCHEMA_PATH", defaults::schema()),
            reference_path,
            port,
            log_pred: lookup("LOG_PRED").as_deref() == Some("1"),
        })
    }
}
