//! Runtime configuration.
//!
//! Values come from the environment (a `.env` file is loaded first by the
//! binary), falling back to defaults:
//!
//! | Variable            | Default                            |
//! |---------------------|------------------------------------|
//! | `QCEW_INPUT_DIR`    | `data/input`                       |
//! | `QCEW_OUTPUT_DIR`   | `data/output`                      |
//! | `QCEW_CROSSWALK`    | `data/crosswalk.csv`               |
//! | `QCEW_API_BASE_URL` | `http://www.bls.gov/cew/data/api`  |

use std::path::PathBuf;

use crate::fetch::DEFAULT_API_BASE_URL;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory of historical QCEW CSV files.
    pub input_dir: PathBuf,
    /// Root of the `01_json/` and `02_csv/` output trees.
    pub output_dir: PathBuf,
    pub crosswalk_path: PathBuf,
    pub api_base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            input_dir: get("QCEW_INPUT_DIR", "data/input").into(),
            output_dir: get("QCEW_OUTPUT_DIR", "data/output").into(),
            crosswalk_path: get("QCEW_CROSSWALK", "data/crosswalk.csv").into(),
            api_base_url: get("QCEW_API_BASE_URL", DEFAULT_API_BASE_URL),
        }
    }

    pub fn quarterly_json(&self) -> PathBuf {
        self.output_dir.join("01_json").join("quarterly_data.json")
    }

    pub fn annual_json(&self) -> PathBuf {
        self.output_dir.join("01_json").join("annual_data.json")
    }

    pub fn quarterly_csv(&self) -> PathBuf {
        self.output_dir.join("02_csv").join("quarterly_data.csv")
    }

    pub fn annual_csv(&self) -> PathBuf {
        self.output_dir.join("02_csv").join("annual_data.csv")
    }
}
