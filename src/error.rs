use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by config, preset and export I/O.
///
/// The simulation and renderer never fail; only the edges that touch the
/// filesystem or an encoder do.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("no drawing surface available")]
    NoSurface,

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("gif encoding failed: {0}")]
    Gif(#[from] gif::EncodingError),
}

pub type Result<T> = std::result::Result<T, MeshError>;
