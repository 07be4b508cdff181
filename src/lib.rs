pub mod batch;
pub mod cli;
pub mod commands;
pub mod constants;
pub mod error;
pub mod export;
pub mod formats;
pub mod handle;
pub mod intake;
pub mod item;
pub mod logger;
pub mod processing;
pub mod rules;
pub mod store;
pub mod utils;

pub use batch::{BatchScheduler, BatchSummary, CancellationToken, CompressTransform, Transform};
pub use error::{BatchError, CodecError, Result};
pub use export::{
    build_compressed_archive, build_rename_archive, build_rename_script, ArchiveEntry, Archiver, ScriptDialect,
    ZipArchiver,
};
pub use handle::{HandleId, HandleRegistry, MemoryHandleRegistry};
pub use intake::{collect_files, AcceptFilter, FileIntake, RawFile};
pub use item::{ItemId, ItemStatus, SourceFile, WorkItem};
pub use processing::{Codec, CompressionSettings, ImageCodec};
pub use rules::{compute_name, derive_name, CaseMode, NameDeriver, RenameRule, TextPosition};
pub use store::{ItemStore, StatusPatch};
