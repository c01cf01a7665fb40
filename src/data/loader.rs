// ============================================================
// Layer 4 - Dataset Loader
// ============================================================
// Reads the raw training file produced by the dataset
// authoring script. The format is a JSON array of pairs:
//
//   [
//     ["What is the admission process?", {"cats": {"admission_process": true,
//                                                  "fee_structure": false}}],
//     ["Tell me about hostel fees",      {"cats": {"hostel_facilities": 1.0}}]
//   ]
//
// The loader only checks STRUCTURE (array of 2-element arrays,
// string text, "cats" object). Label values are kept as raw
// JSON so the normaliser can coerce and range-check them with
// the category name in the error message.
//
// Reference: serde_json documentation (untyped Value)
//            Rust Book §9 (Error Handling)

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use crate::domain::error::IntentError;
use crate::domain::example::RawExample;
use crate::domain::traits::DatasetSource;

/// Loads raw examples from a JSON file on disk.
/// Implements the DatasetSource trait from Layer 3.
pub struct JsonDatasetLoader {
    path: PathBuf,
}

impl JsonDatasetLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for JsonDatasetLoader {
    fn load_raw(&self) -> Result<Vec<RawExample>> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read dataset '{}'", self.path.display()))?;

        let examples = parse_raw_dataset(&json)?;

        tracing::info!(
            "Loaded {} raw examples from '{}'",
            examples.len(),
            self.path.display()
        );
        Ok(examples)
    }
}

/// Parse the raw dataset text.
/// Every structural problem is a DataFormat error naming the example index.
pub fn parse_raw_dataset(json: &str) -> Result<Vec<RawExample>> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| IntentError::DataFormat(format!("invalid JSON: {e}")))?;

    let items = value.as_array().ok_or_else(|| {
        IntentError::DataFormat("top level must be an array of [text, annotations] pairs".into())
    })?;

    let examples = items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_entry(index, item))
        .collect::<Result<Vec<_>, IntentError>>()?;

    Ok(examples)
}

fn parse_entry(index: usize, item: &Value) -> Result<RawExample, IntentError> {
    let pair = item
        .as_array()
        .filter(|pair| pair.len() == 2)
        .ok_or_else(|| {
            IntentError::DataFormat(format!("example {index} is not a [text, annotations] pair"))
        })?;

    let text = pair[0].as_str().ok_or_else(|| {
        IntentError::DataFormat(format!("example {index}: text must be a string"))
    })?;

    let cats = pair[1]
        .get("cats")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            IntentError::DataFormat(format!("example {index}: missing \"cats\" object"))
        })?;

    Ok(RawExample {
        text:   text.to_string(),
        labels: cats.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
    })
}
