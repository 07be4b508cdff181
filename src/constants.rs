pub const DEFAULT_QUALITY: f32 = 0.8;
pub const MIN_QUALITY_STEP: f32 = 0.1;
pub const DEFAULT_MAX_DIMENSION_PX: u32 = 1920;
pub const DEFAULT_MAX_OUTPUT_SIZE_MB: f64 = 1.0;

/// Attempts made to bring an output under the size budget before giving up and keeping the best one.
pub const MAX_SIZE_ATTEMPTS: usize = 6;
/// Factor applied to both dimensions when lowering quality alone did not fit the budget.
pub const DOWNSCALE_FACTOR: f64 = 0.85;

pub const DEFAULT_COMPRESS_CONCURRENCY: usize = 3;

/// Progress marker set when an item starts; codecs do not report finer progress.
pub const PROCESSING_PROGRESS: u8 = 10;
pub const DONE_PROGRESS: u8 = 100;

pub const ZOPFLI_ITERATIONS: u8 = 15;
pub const LIBDEFLATER_HIGH_LEVEL: u8 = 12;
pub const LIBDEFLATER_LOW_LEVEL: u8 = 8;

pub const DEFAULT_SEQUENCE_PREFIX: &str = "file_";
pub const DEFAULT_SEQUENCE_START: u64 = 1;
pub const DEFAULT_SEQUENCE_DIGITS: usize = 3;
/// Widest zero padding accepted on the command line.
pub const MAX_SEQUENCE_DIGITS: u16 = 255;

pub const COMPRESSED_ENTRY_PREFIX: &str = "compressed-";
pub const COMPRESSED_ARCHIVE_NAME: &str = "images-compressed.zip";
pub const RENAMED_ARCHIVE_NAME: &str = "renamed_files.zip";
pub const SCRIPT_BASE_NAME: &str = "rename_script";

pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";
