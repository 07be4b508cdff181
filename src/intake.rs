use crate::error::{BatchError, Result};
use crate::formats::{is_image_mime, mime_type_for_path};
use crate::handle::HandleRegistry;
use crate::item::{ItemId, SourceFile, WorkItem};
use crate::store::ItemStore;
use glob::glob;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A file as selected by the user, before it becomes a [`WorkItem`].
#[derive(Debug, Clone)]
pub struct RawFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl RawFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Reads `path` and types it by extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(BatchError::FileNotFound(path.to_path_buf()));
        }
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| BatchError::FileNotFound(path.to_path_buf()))?;
        let bytes = fs::read(path)?;
        Ok(Self::new(name, mime_type_for_path(path), bytes))
    }
}

/// Type predicate applied at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptFilter {
    /// MIME type must start with `image/`.
    Images,
    Any,
}

impl AcceptFilter {
    pub fn accepts(&self, file: &RawFile) -> bool {
        self.accepts_mime(&file.mime_type)
    }

    pub fn accepts_mime(&self, mime_type: &str) -> bool {
        match self {
            AcceptFilter::Images => is_image_mime(mime_type),
            AcceptFilter::Any => true,
        }
    }
}

/// Wraps raw files into work items and appends them to a store.
#[derive(Debug, Clone, Copy)]
pub struct FileIntake {
    filter: AcceptFilter,
    previews: bool,
}

impl FileIntake {
    pub fn new(filter: AcceptFilter, previews: bool) -> Self {
        Self { filter, previews }
    }

    /// Intake for the image compressor: images only, with previews.
    pub fn compressor() -> Self {
        Self::new(AcceptFilter::Images, true)
    }

    /// Intake for the renamer: any type, no previews.
    pub fn renamer() -> Self {
        Self::new(AcceptFilter::Any, false)
    }

    /// Appends accepted files to `store` in the given order and returns their ids.
    ///
    /// Files rejected by the filter are dropped without an error.
    pub fn add_files(&self, store: &ItemStore, files: Vec<RawFile>) -> Vec<ItemId> {
        let registry = store.handles();
        let items: Vec<WorkItem> = files
            .into_iter()
            .filter(|file| {
                let accepted = self.filter.accepts(file);
                if !accepted {
                    debug!("Dropping {} ({}) at intake", file.name, file.mime_type);
                }
                accepted
            })
            .map(|file| self.wrap(file, registry.as_ref()))
            .collect();

        debug!("Accepted {} files", items.len());
        store.add(items)
    }

    /// Reads the paths whose extension passes the filter, in order.
    ///
    /// Rejected paths are never opened. A file that cannot be read is logged
    /// and left out instead of failing the whole batch.
    pub fn read_accepted(&self, paths: &[PathBuf]) -> Vec<RawFile> {
        paths
            .iter()
            .filter(|path| {
                let accepted = self.filter.accepts_mime(mime_type_for_path(path));
                if !accepted {
                    debug!("Skipping {:?} before reading", path);
                }
                accepted
            })
            .filter_map(|path| match RawFile::from_path(path) {
                Ok(file) => Some(file),
                Err(e) => {
                    warn!("Skipping unreadable file {:?}: {}", path, e);
                    None
                }
            })
            .collect()
    }

    fn wrap(&self, file: RawFile, registry: &dyn HandleRegistry) -> WorkItem {
        let source = SourceFile::new(file.name, file.mime_type, file.bytes);
        let mut item = WorkItem::new(source);
        if self.previews {
            let preview = registry.allocate(item.source().bytes.clone());
            item.set_preview(preview);
        }
        item
    }
}

/// Collects the files named by `input`: a single file, a directory, or a glob pattern.
///
/// Hidden entries are skipped when walking a directory, which is descended
/// into only when `recursive` is set. Results are sorted by path so that
/// intake order is stable across runs.
pub fn collect_files(input: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let input_path = Path::new(input);
    let mut files = Vec::new();

    if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else if input_path.is_dir() {
        let max_depth = if recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(input_path)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
    } else if let Ok(pattern) = glob(input) {
        files.extend(pattern.flatten().filter(|path| path.is_file()));
        files.sort();
    }

    if files.is_empty() {
        return Err(BatchError::NoFilesFound(input.to_string()));
    }
    Ok(files)
}
