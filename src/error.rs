use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid quality value: {0}. Must be greater than 0 and at most 1")]
    InvalidQuality(f32),

    #[error("Invalid maximum dimension: {0}. Must be at least 1 pixel")]
    InvalidDimension(u32),

    #[error("Invalid maximum output size: {0}MB. Must be greater than 0")]
    InvalidOutputSize(f64),

    #[error("Invalid concurrency: {0}. At least one item must run at a time")]
    InvalidConcurrency(usize),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("No files found in input path: {0}")]
    NoFilesFound(String),

    #[error("Walkdir error: {0}")]
    WalkdirError(#[from] walkdir::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Failure of a single transformation. Recorded on the item, never fatal to a batch.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unsupported or corrupt input: {0}")]
    Decode(#[source] image::ImageError),

    #[error("encoding failed: {0}")]
    Encode(#[source] image::ImageError),

    #[error("PNG optimization failed: {0}")]
    PngOptimization(String),

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BatchError>;
