pub mod bracket;
pub mod catalog;
pub mod cpu;
pub mod draw;
pub mod error;
pub mod match_state;
pub mod matches;
pub mod simulation;
pub mod spin;
pub mod store;
pub mod team;
pub mod tournament;

pub use error::{DraftError, Result};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type UserId = u64;
pub type PlayerId = u64;
pub type TeamId = u64;
pub type MatchId = u64;
pub type TournamentId = u64;
pub type ParticipantId = u64;

// ---------------------------------------------------------------------------
// Fixed option sets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    Gk,
    Cb,
    Lb,
    Rb,
    Cdm,
    Cm,
    Cam,
    Lw,
    Rw,
    St,
}

impl Position {
    pub const ALL: [Position; 10] = [
        Position::Gk,
        Position::Cb,
        Position::Lb,
        Position::Rb,
        Position::Cdm,
        Position::Cm,
        Position::Cam,
        Position::Lw,
        Position::Rw,
        Position::St,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Gk => "GK",
            Position::Cb => "CB",
            Position::Lb => "LB",
            Position::Rb => "RB",
            Position::Cdm => "CDM",
            Position::Cm => "CM",
            Position::Cam => "CAM",
            Position::Lw => "LW",
            Position::Rw => "RW",
            Position::St => "ST",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event (rarity) tag a card was released under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    Tots,
    Toty,
    IcyMagicians,
    FutureStars,
    Icons,
    Heroes,
}

impl Event {
    pub const ALL: [Event; 6] = [
        Event::Tots,
        Event::Toty,
        Event::IcyMagicians,
        Event::FutureStars,
        Event::Icons,
        Event::Heroes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Event::Tots => "TOTS",
            Event::Toty => "TOTY",
            Event::IcyMagicians => "ICY_MAGICIANS",
            Event::FutureStars => "FUTURE_STARS",
            Event::Icons => "ICONS",
            Event::Heroes => "HEROES",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rating band drawn by an OVR spin. Serialized as its label ("90+", "85-89", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OvrBand {
    #[serde(rename = "90+")]
    Plus90,
    #[serde(rename = "85-89")]
    From85To89,
    #[serde(rename = "80-84")]
    From80To84,
    #[serde(rename = "75-79")]
    From75To79,
    #[serde(rename = "70-74")]
    From70To74,
}

impl OvrBand {
    pub const ALL: [OvrBand; 5] = [
        OvrBand::Plus90,
        OvrBand::From85To89,
        OvrBand::From80To84,
        OvrBand::From75To79,
        OvrBand::From70To74,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            OvrBand::Plus90 => "90+",
            OvrBand::From85To89 => "85-89",
            OvrBand::From80To84 => "80-84",
            OvrBand::From75To79 => "75-79",
            OvrBand::From70To74 => "70-74",
        }
    }

    /// Inclusive overall bounds, parsed from the label.
    pub fn bounds(&self) -> (u8, u8) {
        parse_band_label(self.label()).unwrap_or((1, 99))
    }

    pub fn contains(&self, overall: u8) -> bool {
        let (min, max) = self.bounds();
        (min..=max).contains(&overall)
    }
}

impl fmt::Display for OvrBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `"N+"` means `[N, 99]`, `"A-B"` means `[A, B]`.
pub fn parse_band_label(label: &str) -> Option<(u8, u8)> {
    let label = label.trim();
    if let Some(min) = label.strip_suffix('+') {
        let min = min.trim().parse::<u8>().ok()?;
        return (min <= 99).then_some((min, 99));
    }
    let (min, max) = label.split_once('-')?;
    let min = min.trim().parse::<u8>().ok()?;
    let max = max.trim().parse::<u8>().ok()?;
    (min <= max).then_some((min, max))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Formation {
    #[serde(rename = "4-3-3")]
    FourThreeThree,
    #[serde(rename = "4-4-2")]
    FourFourTwo,
    #[serde(rename = "3-5-2")]
    ThreeFiveTwo,
    #[serde(rename = "4-2-3-1")]
    FourTwoThreeOne,
    #[serde(rename = "5-3-2")]
    FiveThreeTwo,
    #[serde(rename = "4-1-2-1-2")]
    FourOneTwoOneTwo,
}

impl Formation {
    pub const ALL: [Formation; 6] = [
        Formation::FourThreeThree,
        Formation::FourFourTwo,
        Formation::ThreeFiveTwo,
        Formation::FourTwoThreeOne,
        Formation::FiveThreeTwo,
        Formation::FourOneTwoOneTwo,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Formation::FourThreeThree => "4-3-3",
            Formation::FourFourTwo => "4-4-2",
            Formation::ThreeFiveTwo => "3-5-2",
            Formation::FourTwoThreeOne => "4-2-3-1",
            Formation::FiveThreeTwo => "5-3-2",
            Formation::FourOneTwoOneTwo => "4-1-2-1-2",
        }
    }

    /// Slot labels, goalkeeper first. Wide midfield and wing-back slots
    /// (LM, RM, LWB, RWB) have no card position of their own.
    pub fn slots(&self) -> [&'static str; 11] {
        match self {
            Formation::FourThreeThree => {
                ["GK", "LB", "CB", "CB", "RB", "CDM", "CM", "CM", "LW", "ST", "RW"]
            }
            Formation::FourFourTwo => {
                ["GK", "LB", "CB", "CB", "RB", "LM", "CM", "CM", "RM", "ST", "ST"]
            }
            Formation::ThreeFiveTwo => {
                ["GK", "CB", "CB", "CB", "LM", "CDM", "CDM", "CAM", "RM", "ST", "ST"]
            }
            Formation::FourTwoThreeOne => {
                ["GK", "LB", "CB", "CB", "RB", "CDM", "CDM", "CAM", "CAM", "CAM", "ST"]
            }
            Formation::FiveThreeTwo => {
                ["GK", "LWB", "CB", "CB", "CB", "RWB", "CM", "CM", "CM", "ST", "ST"]
            }
            Formation::FourOneTwoOneTwo => {
                ["GK", "LB", "CB", "CB", "RB", "CDM", "CM", "CM", "CAM", "ST", "ST"]
            }
        }
    }
}

impl fmt::Display for Formation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayStyle {
    TikiTaka,
    CounterAttack,
    TotalFootball,
    HighPress,
}

impl PlayStyle {
    pub const ALL: [PlayStyle; 4] = [
        PlayStyle::TikiTaka,
        PlayStyle::CounterAttack,
        PlayStyle::TotalFootball,
        PlayStyle::HighPress,
    ];
}

macro_rules! from_str_via_serde {
    ($ty:ty, $what:literal) => {
        impl FromStr for $ty {
            type Err = DraftError;

            fn from_str(s: &str) -> Result<Self> {
                serde_json::from_value(serde_json::Value::String(s.trim().to_owned()))
                    .map_err(|_| DraftError::Validation(format!("Invalid {}: {s}", $what)))
            }
        }
    };
}

from_str_via_serde!(Position, "position");
from_str_via_serde!(Event, "event");
from_str_via_serde!(OvrBand, "rating band");
from_str_via_serde!(Formation, "formation");
from_str_via_serde!(PlayStyle, "play style");

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub coins: u64,
    pub created_at: DateTime<Utc>,
}

/// Catalog card. Immutable once created; collections and teams refer to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    pub event: Event,
    pub overall: u8,
    pub pace: u8,
    pub shooting: u8,
    pub passing: u8,
    pub dribbling: u8,
    pub defense: u8,
    pub physical: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A catalog card before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPlayer {
    pub name: String,
    pub position: Position,
    pub event: Event,
    pub overall: u8,
    pub pace: u8,
    pub shooting: u8,
    pub passing: u8,
    pub dribbling: u8,
    pub defense: u8,
    pub physical: u8,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewPlayer {
    pub fn with_id(self, id: PlayerId) -> Player {
        Player {
            id,
            name: self.name,
            position: self.position,
            event: self.event,
            overall: self.overall,
            pace: self.pace,
            shooting: self.shooting,
            passing: self.passing,
            dribbling: self.dribbling,
            defense: self.defense,
            physical: self.physical,
            image_url: self.image_url,
        }
    }
}

/// One acquisition of a player by a user. Repeated pulls create repeated entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub id: u64,
    pub user_id: UserId,
    pub player_id: PlayerId,
    pub acquired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinRecord {
    pub id: u64,
    pub user_id: UserId,
    pub player_id: PlayerId,
    pub position_result: Position,
    pub event_result: Event,
    pub ovr_result: OvrBand,
    pub spun_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSpin {
    pub user_id: UserId,
    pub player_id: PlayerId,
    pub position_result: Position,
    pub event_result: Event,
    pub ovr_result: OvrBand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub user_id: UserId,
    pub name: String,
    pub formation: Formation,
    pub play_style: PlayStyle,
    pub players: Vec<Player>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    pub fn average_overall(&self) -> f64 {
        average_overall(&self.players)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTeam {
    pub user_id: UserId,
    pub name: String,
    pub formation: Formation,
    pub play_style: PlayStyle,
    pub players: Vec<Player>,
}

pub(crate) fn average_overall(players: &[Player]) -> f64 {
    if players.is_empty() {
        return 0.0;
    }
    let total: u32 = players.iter().map(|p| u32::from(p.overall)).sum();
    f64::from(total) / players.len() as f64
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn player(id: PlayerId, position: Position, overall: u8) -> Player {
        Player {
            id,
            name: format!("Player {id}"),
            position,
            event: Event::Tots,
            overall,
            pace: overall,
            shooting: overall,
            passing: overall,
            dribbling: overall,
            defense: overall,
            physical: overall,
            image_url: None,
        }
    }

    pub fn new_player(name: &str, position: Position, event: Event, overall: u8) -> NewPlayer {
        NewPlayer {
            name: name.to_owned(),
            position,
            event,
            overall,
            pace: 80,
            shooting: 80,
            passing: 80,
            dribbling: 80,
            defense: 80,
            physical: 80,
            image_url: None,
        }
    }

    pub fn team(user_id: UserId, play_style: PlayStyle, overall: u8) -> Team {
        let players = Formation::FourThreeThree
            .slots()
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                let position = slot.parse::<Position>().unwrap_or(Position::Cm);
                player(i as PlayerId + 1, position, overall)
            })
            .collect();
        Team {
            id: 1,
            user_id,
            name: "Fixture XI".into(),
            formation: Formation::FourThreeThree,
            play_style,
            players,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_labels_parse_to_bounds() {
        assert_eq!(parse_band_label("90+"), Some((90, 99)));
        assert_eq!(parse_band_label("85-89"), Some((85, 89)));
        assert_eq!(parse_band_label("70-74"), Some((70, 74)));
        assert_eq!(parse_band_label("nonsense"), None);
        assert_eq!(parse_band_label("89-85"), None);
    }

    #[test]
    fn every_band_bounds_come_from_its_label() {
        for band in OvrBand::ALL {
            let (min, max) = band.bounds();
            assert!(min <= max, "{band}");
            assert!(band.contains(min) && band.contains(max));
        }
        assert!(!OvrBand::From80To84.contains(85));
    }

    #[test]
    fn enums_serialize_as_wire_labels() {
        assert_eq!(serde_json::to_string(&Position::Cdm).unwrap(), "\"CDM\"");
        assert_eq!(serde_json::to_string(&Event::IcyMagicians).unwrap(), "\"ICY_MAGICIANS\"");
        assert_eq!(serde_json::to_string(&OvrBand::Plus90).unwrap(), "\"90+\"");
        assert_eq!(serde_json::to_string(&Formation::FourOneTwoOneTwo).unwrap(), "\"4-1-2-1-2\"");
        assert_eq!(serde_json::to_string(&PlayStyle::HighPress).unwrap(), "\"HIGH_PRESS\"");
    }

    #[test]
    fn from_str_accepts_labels_and_rejects_unknowns() {
        assert_eq!("ST".parse::<Position>().unwrap(), Position::St);
        assert_eq!("3-5-2".parse::<Formation>().unwrap(), Formation::ThreeFiveTwo);
        assert_eq!("COUNTER_ATTACK".parse::<PlayStyle>().unwrap(), PlayStyle::CounterAttack);
        assert!(matches!("LM".parse::<Position>(), Err(DraftError::Validation(_))));
    }

    #[test]
    fn position_display_matches_serde_label() {
        for position in Position::ALL {
            let json = serde_json::to_string(&position).unwrap();
            assert_eq!(json, format!("\"{position}\""));
        }
    }

    #[test]
    fn every_formation_has_eleven_slots_with_one_keeper() {
        for formation in Formation::ALL {
            let slots = formation.slots();
            assert_eq!(slots.iter().filter(|s| **s == "GK").count(), 1, "{formation}");
        }
    }

    #[test]
    fn average_of_empty_squad_is_zero() {
        assert_eq!(average_overall(&[]), 0.0);
    }
}
