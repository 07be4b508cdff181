//! Archive and script export
//!
//! Compression export packs the results of finished items, rename export
//! packs the untouched original bytes of every item under its derived name.
//! Both return `None` when there is nothing to export so callers can skip
//! the download without treating it as an error.

use crate::constants::{COMPRESSED_ENTRY_PREFIX, SCRIPT_BASE_NAME};
use crate::error::Result;
use crate::item::{ItemStatus, WorkItem};
use crate::store::ItemStore;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::Arc;
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// One named file inside an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, bytes: Arc<[u8]>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Packs entries into a single blob. Entry bytes must be stored unchanged.
pub trait Archiver {
    fn archive(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>>;
}

/// Deflate-compressed zip. An entry whose name repeats an earlier one replaces
/// its content and keeps the earlier position.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiver;

impl Archiver for ZipArchiver {
    fn archive(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in dedupe(entries) {
            writer.start_file(entry.name.as_str(), options)?;
            writer.write_all(&entry.bytes)?;
        }

        Ok(writer.finish()?.into_inner())
    }
}

fn dedupe(entries: &[ArchiveEntry]) -> Vec<&ArchiveEntry> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut unique: Vec<&ArchiveEntry> = Vec::with_capacity(entries.len());

    for entry in entries {
        match positions.get(entry.name.as_str()) {
            Some(&index) => {
                debug!("Duplicate archive entry {}, keeping the later one", entry.name);
                unique[index] = entry;
            }
            None => {
                positions.insert(entry.name.as_str(), unique.len());
                unique.push(entry);
            }
        }
    }

    unique
}

/// Entries for every finished item, named `compressed-<original name>`.
pub fn compressed_entries(items: &[WorkItem]) -> Vec<ArchiveEntry> {
    items
        .iter()
        .filter(|item| item.status() == ItemStatus::Done)
        .filter_map(|item| {
            item.result().map(|result| {
                ArchiveEntry::new(
                    format!("{}{}", COMPRESSED_ENTRY_PREFIX, item.original_name()),
                    result.bytes.clone(),
                )
            })
        })
        .collect()
}

/// Entries for every item, named by derived name, holding the original bytes.
pub fn renamed_entries(items: &[WorkItem]) -> Vec<ArchiveEntry> {
    items
        .iter()
        .map(|item| ArchiveEntry::new(item.derived_name(), item.source().bytes.clone()))
        .collect()
}

pub fn build_compressed_archive<A: Archiver>(store: &ItemStore, archiver: &A) -> Result<Option<Vec<u8>>> {
    let entries = compressed_entries(&store.snapshot());
    if entries.is_empty() {
        debug!("No finished items to export");
        return Ok(None);
    }
    archiver.archive(&entries).map(Some)
}

pub fn build_rename_archive<A: Archiver>(store: &ItemStore, archiver: &A) -> Result<Option<Vec<u8>>> {
    let entries = renamed_entries(&store.snapshot());
    if entries.is_empty() {
        debug!("No items to export");
        return Ok(None);
    }
    archiver.archive(&entries).map(Some)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptDialect {
    /// Windows batch file, CRLF line endings.
    Batch,
    /// POSIX shell script, LF line endings.
    Shell,
}

impl ScriptDialect {
    pub fn extension(&self) -> &'static str {
        match self {
            ScriptDialect::Batch => "bat",
            ScriptDialect::Shell => "sh",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", SCRIPT_BASE_NAME, self.extension())
    }

    fn line_ending(&self) -> &'static str {
        match self {
            ScriptDialect::Batch => "\r\n",
            ScriptDialect::Shell => "\n",
        }
    }

    fn header(&self) -> &'static [&'static str] {
        match self {
            ScriptDialect::Batch => &["@echo off", "chcp 65001 >nul", "echo Renaming files..."],
            ScriptDialect::Shell => &["#!/bin/bash", ""],
        }
    }

    fn footer(&self) -> &'static [&'static str] {
        match self {
            ScriptDialect::Batch => &["echo Renaming Complete!", "pause"],
            ScriptDialect::Shell => &[],
        }
    }

    fn command(&self, old: &str, new: &str) -> String {
        match self {
            ScriptDialect::Batch => format!("ren \"{}\" \"{}\"", escape_batch(old), escape_batch(new)),
            ScriptDialect::Shell => format!("mv \"{}\" \"{}\"", escape_shell(old), escape_shell(new)),
        }
    }
}

// Inside double quotes cmd.exe still expands %VAR%.
fn escape_batch(name: &str) -> String {
    name.replace('%', "%%")
}

// Inside double quotes bash still interprets \ " $ and backticks.
fn escape_shell(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for ch in name.chars() {
        if matches!(ch, '\\' | '"' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Rename script with one command per item whose name changed.
///
/// Returns `None` for an empty store. A store where nothing was renamed
/// still yields a script with only the header and footer.
pub fn build_rename_script(store: &ItemStore, dialect: ScriptDialect) -> Option<String> {
    let items = store.snapshot();
    if items.is_empty() {
        return None;
    }

    let eol = dialect.line_ending();
    let mut script = String::new();
    let mut push_line = |line: &str| {
        script.push_str(line);
        script.push_str(eol);
    };

    for line in dialect.header() {
        push_line(*line);
    }
    for item in items.iter().filter(|item| item.is_renamed()) {
        push_line(&dialect.command(item.original_name(), item.derived_name()));
    }
    for line in dialect.footer() {
        push_line(*line);
    }

    Some(script)
}
