use thiserror::Error;

use crate::types::Tile;

/// Boxed error produced by a pixel or ROI collaborator.
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum RoiError {
    #[error("Malformed shape point token: {token:?}")]
    MalformedShape { token: String },

    #[error("Failed to fetch tile {tile:?}: {source}")]
    TileFetch {
        tile: Tile,
        #[source]
        source: SourceError,
    },

    #[error("ROI source error: {0}")]
    RoiSource(#[source] SourceError),

    #[error("Polygon needs at least 3 points and a non-zero area, got {points} points")]
    InvalidPolygon { points: usize },

    #[error("ROI {0} not found")]
    RoiNotFound(u64),

    #[error("ROI has no shapes")]
    EmptyRoi,

    #[error("No plane at z={z} c={c} t={t}")]
    PlaneOutOfRange { z: u32, c: u32, t: u32 },

    #[error("Buffer of {actual} values does not match the expected {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

pub type Result<T> = std::result::Result<T, RoiError>;
