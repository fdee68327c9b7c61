//! Audio file tag reading and writing.
//!
//! Uses the lofty crate for format-independent metadata access.
//! Supports reading from and writing to MP3, FLAC, OGG, M4A, and WAV files.
//!
//! # Features
//! - Read a flat [`TagSet`] from any supported file
//! - Write a [`TagSet`] back, preserving tags the engine does not interpret
//! - Writes are staged on a sibling copy and renamed into place, so a file
//!   is either fully updated or left untouched
//!
//! The engine only sees the [`TagIo`] trait; [`LoftyTagIo`] is the
//! production implementation.

use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, ItemValue, Tag, TagExt};
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::{Field, TagSet, TagValue};

/// A file's tags could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Failed to read tags from {}: {message}", path.display())]
pub struct TagReadError {
    pub path: PathBuf,
    pub message: String,
}

impl TagReadError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A file's tags could not be written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Failed to write tags to {}: {message}", path.display())]
pub struct TagWriteError {
    pub path: PathBuf,
    pub message: String,
}

impl TagWriteError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Tag I/O capability: read a flat tag set from a file, write one back.
///
/// Implementations must round-trip [`TagSet::extra`] unchanged.
pub trait TagIo: Send + Sync {
    fn read(&self, path: &Path) -> Result<TagSet, TagReadError>;

    fn write(&self, path: &Path, tags: &TagSet) -> Result<(), TagWriteError>;
}

/// Tag I/O backed by lofty.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagIo;

impl TagIo for LoftyTagIo {
    fn read(&self, path: &Path) -> Result<TagSet, TagReadError> {
        read(path)
    }

    fn write(&self, path: &Path, tags: &TagSet) -> Result<(), TagWriteError> {
        write(path, tags)
    }
}

/// Read the tags of an audio file.
///
/// Files without any tag yield an empty [`TagSet`].
pub fn read(path: &Path) -> Result<TagSet, TagReadError> {
    let tagged_file = Probe::open(path)
        .map_err(|e| TagReadError::new(path, format!("failed to open file: {}", e)))?
        .read()
        .map_err(|e| TagReadError::new(path, format!("failed to read metadata: {}", e)))?;

    // Get the primary tag, or fall back to the first available tag
    let tags = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag())
        .map(tag_to_set)
        .unwrap_or_default();

    Ok(tags)
}

/// Write a tag set to an audio file.
///
/// Only fields present in `tags` are written; anything else already in the
/// file is left as it was.
pub fn write(path: &Path, tags: &TagSet) -> Result<(), TagWriteError> {
    let staged = staging_path(path);

    fs::copy(path, &staged)
        .map_err(|e| TagWriteError::new(path, format!("failed to stage copy: {}", e)))?;

    let result = write_in_place(&staged, tags)
        .map_err(|message| TagWriteError::new(path, message))
        .and_then(|()| {
            fs::rename(&staged, path).map_err(|e| {
                TagWriteError::new(path, format!("failed to replace original: {}", e))
            })
        });

    if result.is_err() {
        let _ = fs::remove_file(&staged);
    }
    result
}

fn write_in_place(path: &Path, tags: &TagSet) -> Result<(), String> {
    let mut tagged_file = Probe::open(path)
        .map_err(|e| format!("failed to open file for writing: {}", e))?
        .read()
        .map_err(|e| format!("failed to read file for tag writing: {}", e))?;

    // Get the primary tag type for this format, or create one
    let tag_type = tagged_file.primary_tag_type();
    if tagged_file.tag(tag_type).is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let tag = tagged_file
        .tag_mut(tag_type)
        .ok_or_else(|| format!("no {:?} tag available", tag_type))?;

    apply_set(tag, tags);

    tag.save_to_path(path, WriteOptions::default())
        .map_err(|e| format!("failed to save tags: {}", e))
}

/// Sibling path used while a write is in progress. Keeps the extension so
/// lofty still recognises the format.
fn staging_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!(".{}.mending.{}", stem, ext.to_string_lossy()),
        None => format!(".{}.mending", stem),
    };
    path.with_file_name(name)
}

fn tag_to_set(tag: &Tag) -> TagSet {
    let mut tags = TagSet::new();

    let text_fields = [
        (Field::Title, tag.title()),
        (Field::Artist, tag.artist()),
        (Field::Album, tag.album()),
        (Field::Genre, tag.genre()),
    ];
    for (field, value) in text_fields {
        if let Some(value) = value {
            let _ = tags.set(field, TagValue::Text(value.into_owned()));
        }
    }

    if let Some(album_artist) = tag.get_string(&ItemKey::AlbumArtist) {
        let _ = tags.set(Field::AlbumArtist, TagValue::Text(album_artist.to_string()));
    }

    let number_fields = [
        (Field::TrackNumber, tag.track()),
        (Field::TotalTracks, tag.track_total()),
        (Field::DiscNumber, tag.disk()),
        (Field::TotalDiscs, tag.disk_total()),
        (Field::Year, tag.year()),
    ];
    for (field, value) in number_fields {
        if let Some(value) = value {
            let _ = tags.set(field, TagValue::Number(value));
        }
    }

    for item in tag.items() {
        if let (ItemKey::Unknown(name), ItemValue::Text(value)) = (item.key(), item.value()) {
            tags.extra.insert(name.clone(), value.clone());
        }
    }

    tags
}

fn apply_set(tag: &mut Tag, tags: &TagSet) {
    for (field, value) in tags.iter() {
        match (field, value) {
            (Field::Title, TagValue::Text(s)) => tag.set_title(s.clone()),
            (Field::Artist, TagValue::Text(s)) => tag.set_artist(s.clone()),
            (Field::Album, TagValue::Text(s)) => tag.set_album(s.clone()),
            (Field::Genre, TagValue::Text(s)) => tag.set_genre(s.clone()),
            (Field::AlbumArtist, TagValue::Text(s)) => {
                let _ = tag.insert_text(ItemKey::AlbumArtist, s.clone());
            }
            (Field::TrackNumber, TagValue::Number(n)) => tag.set_track(*n),
            (Field::TotalTracks, TagValue::Number(n)) => tag.set_track_total(*n),
            (Field::DiscNumber, TagValue::Number(n)) => tag.set_disk(*n),
            (Field::TotalDiscs, TagValue::Number(n)) => tag.set_disk_total(*n),
            (Field::Year, TagValue::Number(n)) => tag.set_year(*n),
            // TagSet rejects mismatched shapes on insert
            _ => {}
        }
    }

    for (name, value) in &tags.extra {
        let _ = tag.insert_text(ItemKey::Unknown(name.clone()), value.clone());
    }
}
