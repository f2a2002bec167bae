//! Player catalog loading.
//!
//! The catalog is a JSON array of cards without ids. A copy ships inside the
//! crate; a file on disk can replace it.

use crate::{DraftError, NewPlayer, Position, Result};
use log::{info, warn};
use std::fs;
use std::path::Path;

const EMBEDDED_CATALOG: &str = include_str!("../data/players.json");

pub fn embedded_catalog() -> Result<Vec<NewPlayer>> {
    parse_catalog(EMBEDDED_CATALOG)
}

/// Load the catalog at `path`, or the embedded one when no path is given.
pub fn load_catalog(path: Option<&Path>) -> Result<Vec<NewPlayer>> {
    let Some(path) = path else {
        let players = embedded_catalog()?;
        info!("loaded {} players from the built-in catalog", players.len());
        return Ok(players);
    };

    let raw = fs::read_to_string(path)
        .map_err(|e| DraftError::Storage(format!("reading {}: {e}", path.display())))?;
    let players = parse_catalog(&raw)?;
    info!("loaded {} players from {}", players.len(), path.display());
    Ok(players)
}

pub fn parse_catalog(raw: &str) -> Result<Vec<NewPlayer>> {
    let players: Vec<NewPlayer> = serde_json::from_str(raw)
        .map_err(|e| DraftError::Validation(format!("Invalid player catalog: {e}")))?;
    validate_catalog(&players)?;
    Ok(players)
}

fn validate_catalog(players: &[NewPlayer]) -> Result<()> {
    if players.is_empty() {
        return Err(DraftError::Validation("Player catalog is empty".into()));
    }

    for player in players {
        if player.name.trim().is_empty() {
            return Err(DraftError::Validation("Catalog player without a name".into()));
        }
        let ratings = [
            player.overall,
            player.pace,
            player.shooting,
            player.passing,
            player.dribbling,
            player.defense,
            player.physical,
        ];
        if ratings.iter().any(|r| !(1..=99).contains(r)) {
            return Err(DraftError::Validation(format!(
                "{} has a rating outside 1-99",
                player.name
            )));
        }
    }

    // Gaps are allowed: a spin on an uncovered position simply finds nobody.
    for position in Position::ALL {
        if !players.iter().any(|p| p.position == position) {
            warn!("catalog has no {position}; spins landing on it will come up empty");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Event, OvrBand};

    #[test]
    fn embedded_catalog_covers_every_position() {
        let players = embedded_catalog().unwrap();
        for position in Position::ALL {
            assert!(players.iter().any(|p| p.position == position), "{position}");
        }
        for band in OvrBand::ALL {
            assert!(players.iter().any(|p| band.contains(p.overall)), "{band}");
        }
        assert!(Event::ALL.iter().all(|e| players.iter().any(|p| p.event == *e)));
    }

    #[test]
    fn parse_rejects_bad_documents() {
        assert!(matches!(parse_catalog("[]"), Err(DraftError::Validation(_))));
        assert!(matches!(parse_catalog("{"), Err(DraftError::Validation(_))));

        let out_of_range = r#"[{"name":"Giant","position":"ST","event":"ICONS","overall":120,
            "pace":90,"shooting":90,"passing":90,"dribbling":90,"defense":90,"physical":90}]"#;
        assert!(matches!(parse_catalog(out_of_range), Err(DraftError::Validation(_))));
    }

    #[test]
    fn parse_accepts_optional_image() {
        let raw = r#"[{"name":"Pic","position":"GK","event":"HEROES","overall":81,
            "pace":50,"shooting":30,"passing":60,"dribbling":40,"defense":55,"physical":80,
            "image_url":"https://cdn.example/pic.png"}]"#;
        let players = parse_catalog(raw).unwrap();
        assert_eq!(players[0].image_url.as_deref(), Some("https://cdn.example/pic.png"));
    }

    #[test]
    fn missing_file_is_a_storage_error() {
        let err = load_catalog(Some(Path::new("/nonexistent/players.json"))).unwrap_err();
        assert!(err.is_storage());
    }
}
