use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::naming::sanitize_component;

/// Image formats counted as already-downloaded results
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Other(String),
}

impl ImageFormat {
    /// Determine format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            other => Self::Other(other.to_string()),
        }
    }

    /// Determine format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
    }

    /// Whether a file of this format counts toward a class's total
    pub fn is_counted(&self) -> bool {
        matches!(self, Self::Jpeg | Self::Png)
    }
}

/// Identity of a vehicle class: the detail string is not part of it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassKey {
    pub make: String,
    pub model: String,
    pub year: u16,
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.make, self.model, self.year)
    }
}

/// One row of the reference table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleClass {
    #[serde(rename = "Make")]
    pub make: String,

    #[serde(rename = "Model")]
    pub model: String,

    #[serde(rename = "Year")]
    pub year: u16,

    /// Body style or trim, only used to sharpen the search query
    #[serde(rename = "BodyStyle", alias = "Detail", default)]
    pub detail: String,
}

impl VehicleClass {
    pub fn new(make: &str, model: &str, year: u16, detail: &str) -> Self {
        Self {
            make: make.to_string(),
            model: model.to_string(),
            year,
            detail: detail.to_string(),
        }
    }

    pub fn key(&self) -> ClassKey {
        ClassKey {
            make: self.make.clone(),
            model: self.model.clone(),
            year: self.year,
        }
    }

    /// Free-text search query for this class
    pub fn query(&self) -> String {
        let year = self.year.to_string();
        [
            self.make.trim(),
            self.model.trim(),
            self.detail.trim(),
            year.as_str(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Output directory relative to the output root: `Make/Model/Year`
    pub fn subpath(&self) -> PathBuf {
        PathBuf::from(sanitize_component(&self.make))
            .join(sanitize_component(&self.model))
            .join(self.year.to_string())
    }

    /// Provenance key for a file in this class's directory.
    ///
    /// Always `/`-separated so the index reads the same on every platform.
    pub fn index_key(&self, file_name: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            sanitize_component(&self.make),
            sanitize_component(&self.model),
            self.year,
            file_name
        )
    }
}
