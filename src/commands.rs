//! End-to-end drivers behind the `compress` and `rename` subcommands.

use crate::batch::{BatchScheduler, BatchSummary, CompressTransform};
use crate::constants::{COMPRESSED_ARCHIVE_NAME, RENAMED_ARCHIVE_NAME};
use crate::error::Result;
use crate::export::{build_compressed_archive, build_rename_archive, build_rename_script, ZipArchiver};
use crate::intake::{collect_files, FileIntake};
use crate::item::ItemStatus;
use crate::processing::{CompressionSettings, ImageCodec};
use crate::report;
use crate::rules::RenameRule;
use crate::store::ItemStore;
use crate::utils::{create_progress_bar, format_file_size};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Inputs of one `compress` run.
#[derive(Debug, Clone)]
pub struct CompressRequest {
    pub input: String,
    pub output: Option<PathBuf>,
    pub recursive: bool,
    pub settings: CompressionSettings,
    pub concurrency: usize,
    pub retry_failed: bool,
}

/// Inputs of one `rename` run.
#[derive(Debug, Clone)]
pub struct RenameRequest {
    pub input: String,
    pub output: Option<PathBuf>,
    pub recursive: bool,
    pub rule: RenameRule,
    pub overrides: Vec<(String, String)>,
    pub format: RenameExport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameExport {
    Zip,
    Script(crate::export::ScriptDialect),
}

/// Compresses every image under `input` and writes the archive of finished items.
///
/// Returns the path written, or `None` when no item finished.
pub fn run_compress(request: &CompressRequest) -> Result<Option<PathBuf>> {
    report!("🚀 Starting batch compression...");
    report!("📁 Input: {}", request.input);

    let paths = collect_files(&request.input, request.recursive)?;
    let store = ItemStore::in_memory();
    let intake = FileIntake::compressor();
    let ids = intake.add_files(&store, intake.read_accepted(&paths));
    if ids.is_empty() {
        report!("⚠️  No image files found in the input path");
        return Ok(None);
    }
    report!("📊 Found {} image files to process", ids.len());
    report!("⚙️  Compressing {} at a time", request.concurrency);

    let transform = CompressTransform::new(ImageCodec, request.settings);
    let progress = create_progress_bar(ids.len() as u64);
    let scheduler = BatchScheduler::new(request.concurrency)?.with_progress(progress.clone());

    let mut summary = scheduler.run(&store, &ids, &transform)?;
    if request.retry_failed && summary.failed > 0 {
        info!("{} items failed, re-running the whole batch", summary.failed);
        report!("🔁 Retrying: re-compressing all {} files", store.len());
        summary = scheduler.rerun_all(&store, &transform)?;
    }
    progress.finish_with_message("✅ Batch compression complete");

    print_compress_summary(&store, &summary);

    let output = request
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(COMPRESSED_ARCHIVE_NAME));
    match build_compressed_archive(&store, &ZipArchiver)? {
        Some(blob) => {
            write_output(&output, &blob)?;
            report!("📦 Archive written: {:?} ({})", output, format_file_size(blob.len() as u64));
            Ok(Some(output))
        }
        None => {
            report!("⚠️  Nothing to export: no image was compressed");
            Ok(None)
        }
    }
}

/// Renames every file under `input` and writes the zip or the script.
///
/// Returns the path written, or `None` when there was nothing to export.
pub fn run_rename(request: &RenameRequest) -> Result<Option<PathBuf>> {
    report!("🚀 Starting batch rename...");
    report!("📁 Input: {}", request.input);

    let paths = collect_files(&request.input, request.recursive)?;
    let store = ItemStore::in_memory();
    let intake = FileIntake::renamer();
    intake.add_files(&store, intake.read_accepted(&paths));

    store.recompute(&request.rule);
    for (old, new) in &request.overrides {
        match store.find_by_original_name(old) {
            Some(id) => {
                store.set_derived_name(id, new.as_str());
            }
            None => warn!("No file named {} to override", old),
        }
    }

    let renamed = store.snapshot().iter().filter(|item| item.is_renamed()).count();
    report!("📊 {} files, {} with a new name", store.len(), renamed);
    for item in store.snapshot().iter().filter(|item| item.is_renamed()) {
        info!("{} -> {}", item.original_name(), item.derived_name());
    }

    let (default_name, contents) = match request.format {
        RenameExport::Zip => (
            RENAMED_ARCHIVE_NAME.to_string(),
            build_rename_archive(&store, &ZipArchiver)?,
        ),
        RenameExport::Script(dialect) => (
            dialect.file_name(),
            build_rename_script(&store, dialect).map(String::into_bytes),
        ),
    };

    let Some(contents) = contents else {
        report!("⚠️  Nothing to export");
        return Ok(None);
    };

    let output = request
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_name));
    write_output(&output, &contents)?;
    report!("✅ Written: {:?} ({})", output, format_file_size(contents.len() as u64));
    Ok(Some(output))
}

fn write_output(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

fn print_compress_summary(store: &ItemStore, summary: &BatchSummary) {
    for item in store.snapshot() {
        match item.status() {
            ItemStatus::Done => {
                if let (Some(result), Some(ratio)) = (item.result(), item.compression_ratio()) {
                    info!(
                        "{}: {} -> {} ({:.1}%)",
                        item.original_name(),
                        format_file_size(item.source().size()),
                        format_file_size(result.size()),
                        ratio
                    );
                }
            }
            ItemStatus::Error => {
                report!("❌ {}: {}", item.original_name(), item.error().unwrap_or("unknown error"));
            }
            ItemStatus::Pending | ItemStatus::Processing => {}
        }
    }

    report!("\n📊 Batch Compression Summary:");
    report!("  📁 Total files: {}", summary.total);
    report!("  ✅ Compressed: {}", summary.done);
    if summary.failed > 0 {
        report!("  ❌ Failed: {}", summary.failed);
    }
    if summary.orphaned > 0 {
        report!("  🗑️  Removed while processing: {}", summary.orphaned);
    }
    if summary.skipped > 0 {
        report!("  ⏭️  Skipped: {}", summary.skipped);
    }
    report!(
        "  📊 Total size before: {}",
        format_file_size(summary.bytes_before)
    );
    report!(
        "  📈 Total size after: {}",
        format_file_size(summary.bytes_after)
    );
    report!("  🎯 Overall compression ratio: {:.1}%", summary.compression_ratio());
    report!("  ⏱️  Time elapsed: {:.2?}", summary.elapsed);
    report!("  🚀 Files per second: {:.1}", summary.files_per_second());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ScriptDialect;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn write_jpeg(dir: &Path, name: &str) {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(64, 48, |x, y| Rgb([x as u8, y as u8, 128])));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg).unwrap();
        fs::write(dir.join(name), bytes).unwrap();
    }

    #[test]
    fn test_run_compress_writes_archive_of_done_items() {
        let temp_dir = TempDir::new().unwrap();
        write_jpeg(temp_dir.path(), "a.jpg");
        write_jpeg(temp_dir.path(), "b.jpg");
        fs::write(temp_dir.path().join("broken.jpg"), b"not an image").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), b"text").unwrap();

        let output = temp_dir.path().join("out").join("images.zip");
        let request = CompressRequest {
            input: temp_dir.path().to_string_lossy().into_owned(),
            output: Some(output.clone()),
            recursive: false,
            settings: CompressionSettings::default(),
            concurrency: 2,
            retry_failed: false,
        };

        let written = run_compress(&request).unwrap();
        assert_eq!(written, Some(output.clone()));

        let archive = zip::ZipArchive::new(fs::File::open(&output).unwrap()).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(names, vec!["compressed-a.jpg", "compressed-b.jpg"]);
    }

    #[test]
    fn test_run_compress_without_images_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("notes.txt"), b"text").unwrap();

        let output = temp_dir.path().join("images.zip");
        let request = CompressRequest {
            input: temp_dir.path().to_string_lossy().into_owned(),
            output: Some(output.clone()),
            recursive: false,
            settings: CompressionSettings::default(),
            concurrency: 3,
            retry_failed: true,
        };

        assert_eq!(run_compress(&request).unwrap(), None);
        assert!(!output.exists());
    }

    #[test]
    fn test_run_rename_script_with_override() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("IMG_1.jpg"), b"1").unwrap();
        fs::write(temp_dir.path().join("IMG_2.jpg"), b"2").unwrap();

        let output = temp_dir.path().join("rename.sh");
        let request = RenameRequest {
            input: temp_dir.path().to_string_lossy().into_owned(),
            output: Some(output.clone()),
            recursive: false,
            rule: RenameRule::FindReplace {
                find: "IMG".to_string(),
                replacement: "photo".to_string(),
                use_regex: false,
            },
            overrides: vec![("IMG_2.jpg".to_string(), "cover.jpg".to_string())],
            format: RenameExport::Script(ScriptDialect::Shell),
        };

        run_rename(&request).unwrap();
        let script = fs::read_to_string(&output).unwrap();
        assert_eq!(
            script,
            "#!/bin/bash\n\nmv \"IMG_1.jpg\" \"photo_1.jpg\"\nmv \"IMG_2.jpg\" \"cover.jpg\"\n"
        );
    }
}
