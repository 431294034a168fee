// error.rs

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse GeoJSON in {}: {source}", path.display())]
    GeoJson {
        path: PathBuf,
        #[source]
        source: geojson::Error,
    },

    #[error("drawing failed: {0}")]
    Draw(String),
}

impl MapError {
    /// Wraps any plotters drawing error, which is generic over the backend.
    pub fn draw<E: std::fmt::Display>(err: E) -> Self {
        MapError::Draw(err.to_string())
    }
}

pub type Result<T, E = MapError> = std::result::Result<T, E>;
