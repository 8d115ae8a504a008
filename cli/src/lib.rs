use roi::{ImageId, PlaneStack, RoiStore, StackPosition, StoredShape};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
    #[error("No ROI named '{0}' in the project")]
    UnknownRoi(String),
}

/// How a thumbnail is written out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ThumbFormat {
    /// 8-bit PNG file
    Png,
    /// `<img>` tag with the PNG inlined as base64
    Html,
}

fn default_image_id() -> ImageId {
    1
}

/// One shape of an ROI, as stored by the database
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ShapeEntry {
    /// Points as `"x,y, x,y, ..."`
    pub points: String,
    #[serde(default)]
    pub z: u32,
    #[serde(default)]
    pub t: u32,
    #[serde(default)]
    pub c: u32,
}

impl From<&ShapeEntry> for StoredShape {
    fn from(entry: &ShapeEntry) -> Self {
        StoredShape {
            points: entry.points.clone(),
            position: StackPosition::new(entry.z, entry.t, entry.c),
        }
    }
}

/// Named region of interest
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RoiEntry {
    pub name: String,
    pub description: Option<String>,
    pub shapes: Vec<ShapeEntry>,
}

/// Project file: an image plus the ROIs drawn on it
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RoiProject {
    /// Raster file used as the pixel source
    pub image: String,
    /// Identifier the ROIs are attached to
    #[serde(default = "default_image_id")]
    pub image_id: ImageId,
    pub output_dir: Option<String>,
    /// Overrides the intensity ceiling derived from the image bit depth
    pub max_intensity: Option<f64>,
    #[serde(default)]
    pub rois: Vec<RoiEntry>,
}

impl RoiProject {
    /// Load RoiProject configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load RoiProject configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load RoiProject configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load RoiProject configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(ConfigError::UnsupportedFileFormat),
        }
    }

    /// Save RoiProject configuration to a TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    /// Save RoiProject configuration to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    /// JSON schema of the project file
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RoiProject)
    }

    /// ROIs of the project as an in-memory store, in file order.
    pub fn to_store(&self) -> RoiStore {
        let mut store = RoiStore::new();
        for entry in &self.rois {
            let shapes = entry.shapes.iter().map(StoredShape::from).collect();
            store.insert(self.image_id, Some(entry.name.clone()), shapes);
        }
        store
    }

    pub fn roi(&self, name: &str) -> Result<&RoiEntry, ConfigError> {
        self.rois
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| ConfigError::UnknownRoi(name.to_string()))
    }

    /// Open the project image, resolved against `base` when relative.
    pub fn load_pixels(&self, base: &Path) -> roi::Result<PlaneStack> {
        let stack = PlaneStack::open(base.join(&self.image))?;
        Ok(match self.max_intensity {
            Some(max) => stack.with_max_intensity(max),
            None => stack,
        })
    }

    /// Where to write `file_name`: the explicit path if given, otherwise the
    /// project output directory (or the current one).
    pub fn output_path(&self, explicit: Option<&Path>, file_name: &str) -> PathBuf {
        match explicit {
            Some(path) => path.to_path_buf(),
            None => Path::new(self.output_dir.as_deref().unwrap_or(".")).join(file_name),
        }
    }
}
