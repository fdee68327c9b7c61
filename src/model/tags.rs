//! Normalized per-track tag storage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Semantic tag fields understood by the engine.
///
/// The declaration order is the fixed enumeration order used when rules
/// are evaluated field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Artist,
    AlbumArtist,
    Album,
    TrackNumber,
    DiscNumber,
    TotalTracks,
    TotalDiscs,
    Year,
    Genre,
}

impl Field {
    /// All fields, in enumeration order.
    pub const ALL: [Field; 10] = [
        Field::Title,
        Field::Artist,
        Field::AlbumArtist,
        Field::Album,
        Field::TrackNumber,
        Field::DiscNumber,
        Field::TotalTracks,
        Field::TotalDiscs,
        Field::Year,
        Field::Genre,
    ];

    /// Whether this field holds an integer rather than text.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Field::TrackNumber
                | Field::DiscNumber
                | Field::TotalTracks
                | Field::TotalDiscs
                | Field::Year
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Artist => "artist",
            Field::AlbumArtist => "album_artist",
            Field::Album => "album",
            Field::TrackNumber => "track_number",
            Field::DiscNumber => "disc_number",
            Field::TotalTracks => "total_tracks",
            Field::TotalDiscs => "total_discs",
            Field::Year => "year",
            Field::Genre => "genre",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single tag value.
///
/// Numeric fields are unsigned, so they can never hold a negative number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Number(u32),
    Text(String),
}

impl TagValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TagValue::Text(s) => Some(s),
            TagValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<u32> {
        match self {
            TagValue::Number(n) => Some(*n),
            TagValue::Text(_) => None,
        }
    }

    /// Whether this value has the right shape for `field`.
    pub fn fits(&self, field: Field) -> bool {
        matches!(self, TagValue::Number(_)) == field.is_numeric()
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Number(n) => write!(f, "{}", n),
            TagValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for TagValue {
    fn from(s: &str) -> Self {
        TagValue::Text(s.to_string())
    }
}

impl From<String> for TagValue {
    fn from(s: String) -> Self {
        TagValue::Text(s)
    }
}

impl From<u32> for TagValue {
    fn from(n: u32) -> Self {
        TagValue::Number(n)
    }
}

/// Normalized metadata for one track.
///
/// Known fields are interpreted; anything else the tag reader found is kept
/// verbatim in `extra` so it survives a write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet {
    fields: BTreeMap<Field, TagValue>,
    /// Unsupported tags, keyed by their raw name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> Option<&TagValue> {
        self.fields.get(&field)
    }

    /// Trimmed text value of a field, treating blank strings as absent.
    pub fn text(&self, field: Field) -> Option<&str> {
        self.get(field)
            .and_then(TagValue::as_text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn number(&self, field: Field) -> Option<u32> {
        self.get(field).and_then(TagValue::as_number)
    }

    /// Set a field, returning the previous value.
    ///
    /// Values of the wrong shape (text for a numeric field or the reverse)
    /// are rejected and the tag set is left unchanged.
    pub fn set(&mut self, field: Field, value: TagValue) -> Result<Option<TagValue>, TagValue> {
        if !value.fits(field) {
            return Err(value);
        }
        Ok(self.fields.insert(field, value))
    }

    pub fn remove(&mut self, field: Field) -> Option<TagValue> {
        self.fields.remove(&field)
    }

    /// Builder-style setter used when assembling tag sets by hand.
    pub fn with(mut self, field: Field, value: impl Into<TagValue>) -> Self {
        let _ = self.set(field, value.into());
        self
    }

    /// Iterate over the interpreted fields in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &TagValue)> {
        self.fields.iter().map(|(f, v)| (*f, v))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.extra.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_fields_reject_text() {
        let mut tags = TagSet::new();
        assert!(tags.set(Field::TrackNumber, "three".into()).is_err());
        assert_eq!(tags.get(Field::TrackNumber), None);

        assert_eq!(tags.set(Field::TrackNumber, 3u32.into()), Ok(None));
        assert_eq!(tags.number(Field::TrackNumber), Some(3));
    }

    #[test]
    fn test_text_fields_reject_numbers() {
        let mut tags = TagSet::new();
        assert!(tags.set(Field::Title, 7u32.into()).is_err());
        assert!(tags.set(Field::Title, "Seven".into()).is_ok());
    }

    #[test]
    fn test_blank_text_reads_as_absent() {
        let tags = TagSet::new().with(Field::Artist, "   ");
        assert_eq!(tags.text(Field::Artist), None);
        assert!(tags.get(Field::Artist).is_some());

        let padded = TagSet::new().with(Field::Artist, " Pink Floyd ");
        assert_eq!(padded.text(Field::Artist), Some("Pink Floyd"));
    }

    #[test]
    fn test_set_returns_previous_value() {
        let mut tags = TagSet::new().with(Field::Album, "Animals");
        let old = tags.set(Field::Album, "Meddle".into()).unwrap();
        assert_eq!(old, Some(TagValue::from("Animals")));
    }

    #[test]
    fn test_extra_tags_are_kept_apart() {
        let mut tags = TagSet::new().with(Field::Title, "Dogs");
        tags.extra
            .insert("REPLAYGAIN_TRACK_GAIN".to_string(), "-7.2 dB".to_string());

        let fields: Vec<_> = tags.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec![Field::Title]);
        assert_eq!(tags.extra.len(), 1);
    }
}
