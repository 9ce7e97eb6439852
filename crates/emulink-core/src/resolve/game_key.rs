use std::collections::HashMap;

use crate::config::detection::MIN_GAME_ID_LEN;

/// Key used when no game-specific entry matches.
pub const DEFAULT_KEY: &str = "default";

/// Turn raw identifier bytes into a game ID.
///
/// Bytes are decoded leniently and stripped to alphanumerics; anything shorter
/// than four characters is not a game ID.
pub fn normalize_game_id(raw: &[u8]) -> Option<String> {
    let id: String = String::from_utf8_lossy(raw)
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();

    (id.chars().count() >= MIN_GAME_ID_LEN).then_some(id)
}

/// Candidate keys for a game ID, most specific first.
///
/// `GZLE01` yields `GZLE01`, `GZLE`, `GZL`; a missing ID yields nothing.
pub fn game_key_tiers(game_id: Option<&str>) -> Vec<&str> {
    let Some(id) = game_id else {
        return Vec::new();
    };

    let mut tiers = vec![id];
    for len in [4, 3] {
        if let Some(prefix) = char_prefix(id, len)
            && !tiers.contains(&prefix)
        {
            tiers.push(prefix);
        }
    }
    tiers
}

/// First `len` characters of `id`, or `None` if it is shorter.
fn char_prefix(id: &str, len: usize) -> Option<&str> {
    match id.char_indices().nth(len) {
        Some((end, _)) => Some(&id[..end]),
        None if id.chars().count() == len => Some(id),
        None => None,
    }
}

/// Look up a game-keyed map: exact ID, first 4 chars, first 3 chars, then `default`.
pub fn resolve_game_key<'a>(
    map: &'a HashMap<String, String>,
    game_id: Option<&str>,
) -> Option<&'a str> {
    game_key_tiers(game_id)
        .into_iter()
        .find_map(|key| map.get(key))
        .or_else(|| map.get(DEFAULT_KEY))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiered_map() -> HashMap<String, String> {
        [
            ("GZLE01", "0x1000"),
            ("GZLE", "0x2000"),
            ("GZL", "0x3000"),
            ("default", "0x4000"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_exact_match_wins() {
        assert_eq!(resolve_game_key(&tiered_map(), Some("GZLE01")), Some("0x1000"));
    }

    #[test]
    fn test_four_char_fallback() {
        assert_eq!(resolve_game_key(&tiered_map(), Some("GZLEJP")), Some("0x2000"));
    }

    #[test]
    fn test_three_char_fallback() {
        assert_eq!(resolve_game_key(&tiered_map(), Some("GZLZZZ")), Some("0x3000"));
    }

    #[test]
    fn test_default_fallback() {
        assert_eq!(resolve_game_key(&tiered_map(), Some("RMGE01")), Some("0x4000"));
        assert_eq!(resolve_game_key(&tiered_map(), None), Some("0x4000"));
    }

    #[test]
    fn test_no_match_without_default() {
        let mut map = tiered_map();
        map.remove("default");
        assert_eq!(resolve_game_key(&map, Some("RMGE01")), None);
        assert_eq!(resolve_game_key(&map, None), None);
    }

    #[test]
    fn test_key_tiers() {
        assert_eq!(game_key_tiers(Some("GZLE01")), vec!["GZLE01", "GZLE", "GZL"]);
        assert_eq!(game_key_tiers(Some("GZLE")), vec!["GZLE", "GZL"]);
        assert!(game_key_tiers(None).is_empty());
    }

    #[test]
    fn test_normalize_game_id() {
        assert_eq!(normalize_game_id(b"GZLE01"), Some("GZLE01".to_string()));
        assert_eq!(normalize_game_id(b"GZLE01\0\0"), Some("GZLE01".to_string()));
        assert_eq!(normalize_game_id(b" G-Z-L-E "), Some("GZLE".to_string()));
        assert_eq!(normalize_game_id(b"GZ\0\0\0\0"), None);
        assert_eq!(normalize_game_id(&[0xFF, 0xFE, 0x00]), None);
    }
}
