//! Adapter layer: Convert MusicBrainz DTOs to canonical candidates
//!
//! This is the ONLY place where DTO types are converted to model types.

use super::dto;
use crate::model::CanonicalCandidate;

/// Convert a fetched MusicBrainz release into a canonical candidate.
///
/// Track titles are flattened across media in (disc, position) order.
pub fn to_candidate(release: dto::Release) -> CanonicalCandidate {
    let album_artist = build_artist_string(&release.artist_credit).unwrap_or_default();
    let year = release.date.as_deref().and_then(parse_year);
    let format = release.media.iter().find_map(|m| m.format.clone());

    let mut media = release.media;
    media.sort_by_key(|m| m.position.unwrap_or(u32::MAX));

    let track_titles = media
        .into_iter()
        .flat_map(|medium| {
            let mut tracks = medium.tracks;
            tracks.sort_by_key(|t| t.position.unwrap_or(u32::MAX));
            tracks
        })
        .map(|t| t.title.unwrap_or_default())
        .collect();

    CanonicalCandidate {
        id: Some(release.id),
        album_artist,
        album: release.title,
        year,
        track_titles,
        country: release.country,
        format,
    }
}

/// Build a combined artist string from artist credits
fn build_artist_string(credits: &[dto::ArtistCredit]) -> Option<String> {
    if credits.is_empty() {
        return None;
    }

    let mut result = String::new();
    for credit in credits {
        // Use credited name if available, otherwise official name
        let name = credit.name.as_ref().unwrap_or(&credit.artist.name);
        result.push_str(name);
        if let Some(ref join) = credit.joinphrase {
            result.push_str(join);
        }
    }

    Some(result)
}

/// Year from a MusicBrainz date ("1977", "1977-01", "1977-01-23").
fn parse_year(date: &str) -> Option<u32> {
    date.get(..4)
        .and_then(|y| y.parse().ok())
        .filter(|&y| y > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(position: u32, title: &str) -> dto::Track {
        dto::Track {
            position: Some(position),
            number: Some(position.to_string()),
            title: Some(title.to_string()),
            length: None,
        }
    }

    fn credit(name: &str, join: Option<&str>) -> dto::ArtistCredit {
        dto::ArtistCredit {
            artist: dto::Artist {
                id: format!("{}-id", name),
                name: name.to_string(),
                sort_name: None,
            },
            name: None,
            joinphrase: join.map(String::from),
        }
    }

    #[test]
    fn test_to_candidate_flattens_media_in_order() {
        let release = dto::Release {
            id: "rel-1".to_string(),
            title: "The Wall".to_string(),
            date: Some("1979-11-30".to_string()),
            country: Some("GB".to_string()),
            artist_credit: vec![credit("Pink Floyd", None)],
            media: vec![
                dto::Medium {
                    position: Some(2),
                    format: Some("CD".to_string()),
                    track_count: Some(1),
                    tracks: vec![track(1, "Hey You")],
                },
                dto::Medium {
                    position: Some(1),
                    format: Some("CD".to_string()),
                    track_count: Some(2),
                    tracks: vec![track(2, "The Thin Ice"), track(1, "In the Flesh?")],
                },
            ],
        };

        let candidate = to_candidate(release);

        assert_eq!(candidate.id.as_deref(), Some("rel-1"));
        assert_eq!(candidate.album_artist, "Pink Floyd");
        assert_eq!(candidate.album, "The Wall");
        assert_eq!(candidate.year, Some(1979));
        assert_eq!(candidate.format.as_deref(), Some("CD"));
        assert_eq!(
            candidate.track_titles,
            vec!["In the Flesh?", "The Thin Ice", "Hey You"]
        );
    }

    #[test]
    fn test_collaboration_artist_string() {
        let credits = vec![credit("Queen", Some(" & ")), credit("David Bowie", Some(""))];
        assert_eq!(
            build_artist_string(&credits).as_deref(),
            Some("Queen & David Bowie")
        );
        assert_eq!(build_artist_string(&[]), None);
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("1977"), Some(1977));
        assert_eq!(parse_year("1977-01"), Some(1977));
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("19"), None);
        assert_eq!(parse_year("????"), None);
    }
}
