use crate::constants::{DONE_PROGRESS, PROCESSING_PROGRESS};
use crate::handle::HandleId;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Identifier assigned at intake, stable for the item's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Original file content plus the metadata captured at selection time.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Pending,
    Processing,
    Done,
    Error,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Processing => "processing",
            ItemStatus::Done => "done",
            ItemStatus::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// Produced output and the display handle pointing at it.
#[derive(Debug, Clone)]
pub struct ResultHandle {
    pub bytes: Arc<[u8]>,
    pub display: HandleId,
}

impl ResultHandle {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// One file tracked through the batch pipeline.
///
/// Status transitions go through the `pub(crate)` methods below so that the
/// result is present exactly when the item is done and progress reads 100
/// exactly when the item is done. Transitions that drop a result hand it
/// back to the caller, which owns revoking its display handle.
#[derive(Debug, Clone)]
pub struct WorkItem {
    id: ItemId,
    source: SourceFile,
    derived_name: String,
    status: ItemStatus,
    progress: u8,
    result: Option<ResultHandle>,
    preview: Option<HandleId>,
    error: Option<String>,
}

impl WorkItem {
    pub fn new(source: SourceFile) -> Self {
        Self {
            id: ItemId::new(),
            derived_name: source.name.clone(),
            source,
            status: ItemStatus::Pending,
            progress: 0,
            result: None,
            preview: None,
            error: None,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    pub fn original_name(&self) -> &str {
        &self.source.name
    }

    pub fn derived_name(&self) -> &str {
        &self.derived_name
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn result(&self) -> Option<&ResultHandle> {
        self.result.as_ref()
    }

    pub fn preview(&self) -> Option<HandleId> {
        self.preview
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_renamed(&self) -> bool {
        self.derived_name != self.source.name
    }

    /// Size reduction in percent, available once the item is done.
    pub fn compression_ratio(&self) -> Option<f64> {
        self.result
            .as_ref()
            .map(|result| crate::utils::calculate_compression_ratio(self.source.size(), result.size()))
    }

    /// Empty names are ignored and the current name is kept.
    pub(crate) fn set_derived_name(&mut self, name: String) -> bool {
        if name.is_empty() {
            return false;
        }
        self.derived_name = name;
        true
    }

    pub(crate) fn set_preview(&mut self, preview: HandleId) {
        self.preview = Some(preview);
    }

    pub(crate) fn mark_processing(&mut self) -> Option<ResultHandle> {
        self.status = ItemStatus::Processing;
        self.progress = PROCESSING_PROGRESS;
        self.error = None;
        self.result.take()
    }

    pub(crate) fn mark_done(&mut self, result: ResultHandle) -> Option<ResultHandle> {
        self.status = ItemStatus::Done;
        self.progress = DONE_PROGRESS;
        self.error = None;
        self.result.replace(result)
    }

    pub(crate) fn mark_error(&mut self, message: String) -> Option<ResultHandle> {
        self.status = ItemStatus::Error;
        self.progress = 0;
        self.error = Some(message);
        self.result.take()
    }

    pub(crate) fn reset(&mut self) -> Option<ResultHandle> {
        self.status = ItemStatus::Pending;
        self.progress = 0;
        self.error = None;
        self.result.take()
    }

    /// Every display handle the item owns, detached from the item.
    pub(crate) fn take_handles(&mut self) -> Vec<HandleId> {
        let mut handles = Vec::with_capacity(2);
        handles.extend(self.preview.take());
        handles.extend(self.result.take().map(|result| result.display));
        handles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> WorkItem {
        WorkItem::new(SourceFile::new("photo.jpg", "image/jpeg", vec![0u8; 1000]))
    }

    fn sample_result(len: usize) -> ResultHandle {
        ResultHandle {
            bytes: Arc::from(vec![1u8; len]),
            display: HandleId::new(7),
        }
    }

    #[test]
    fn test_new_item_is_pending() {
        let item = sample_item();
        assert_eq!(item.status(), ItemStatus::Pending);
        assert_eq!(item.progress(), 0);
        assert_eq!(item.derived_name(), "photo.jpg");
        assert!(item.result().is_none());
        assert!(!item.is_renamed());
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(sample_item().id(), sample_item().id());
    }

    #[test]
    fn test_done_sets_result_and_full_progress() {
        let mut item = sample_item();
        assert!(item.mark_processing().is_none());
        assert_eq!(item.progress(), PROCESSING_PROGRESS);

        item.mark_done(sample_result(400));
        assert_eq!(item.status(), ItemStatus::Done);
        assert_eq!(item.progress(), 100);
        assert_eq!(item.result().map(ResultHandle::size), Some(400));
        assert_eq!(item.compression_ratio(), Some(60.0));
    }

    #[test]
    fn test_error_and_reset_drop_result() {
        let mut item = sample_item();
        item.mark_done(sample_result(10));

        let dropped = item.reset();
        assert!(dropped.is_some());
        assert_eq!(item.status(), ItemStatus::Pending);
        assert_eq!(item.progress(), 0);
        assert!(item.result().is_none());

        item.mark_done(sample_result(10));
        assert!(item.mark_error("boom".to_string()).is_some());
        assert_eq!(item.progress(), 0);
        assert_eq!(item.error(), Some("boom"));
        assert!(item.result().is_none());
    }

    #[test]
    fn test_empty_name_keeps_previous() {
        let mut item = sample_item();
        assert!(item.set_derived_name("holiday.jpg".to_string()));
        assert!(!item.set_derived_name(String::new()));
        assert_eq!(item.derived_name(), "holiday.jpg");
        assert!(item.is_renamed());
    }

    #[test]
    fn test_take_handles_detaches_everything() {
        let mut item = sample_item();
        item.set_preview(HandleId::new(1));
        item.mark_done(sample_result(5));

        let handles = item.take_handles();
        assert_eq!(handles, vec![HandleId::new(1), HandleId::new(7)]);
        assert!(item.preview().is_none());
        assert!(item.result().is_none());
    }
}
