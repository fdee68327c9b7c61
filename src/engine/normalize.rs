//! String normalization and fuzzy comparison.

/// Case-fold, strip punctuation and collapse whitespace.
///
/// Letters and digits in any script are kept; everything else is dropped
/// unless it is whitespace, which becomes a single space.
pub fn normalize(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Key identifying an album query, shared by matching and lookup caching.
pub fn query_key(album_artist: &str, album: &str) -> String {
    format!("{}|{}", normalize(album_artist), normalize(album))
}

/// Normalized edit-distance similarity in `0.0..=1.0`.
///
/// Strings that normalize to nothing are never similar to anything.
pub fn similarity(a: &str, b: &str) -> f64 {
    let (a, b) = (normalize(a), normalize(b));
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(&a, &b)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn similarity_is_bounded_and_symmetric(a in ".{0,30}", b in ".{0,30}") {
            let ab = similarity(&a, &b);
            prop_assert!((0.0..=1.0).contains(&ab));
            prop_assert!((ab - similarity(&b, &a)).abs() < 1e-9);
        }

        #[test]
        fn normalize_is_idempotent(s in ".{0,40}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }
    }
}
