use crate::draw::{chance, int_between};
use crate::simulation::{EventKind, MatchEvent, TeamSide};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Simulated minutes in a match. The final tick ends the match without an event.
pub const MATCH_MINUTES: u8 = 90;
pub const COMMENTARY_LIMIT: usize = 10;
pub const EVENT_CHANCE: f64 = 0.2;
pub const ON_TARGET_CHANCE: f64 = 0.5;
pub const CORNER_CHANCE: f64 = 0.3;
pub const POSSESSION_DRIFT: i32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentaryLine {
    pub minute: u8,
    pub text: String,
}

/// Live state of one simulated match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    pub minute: u8,
    pub user_score: u32,
    pub cpu_score: u32,
    /// User side's share of the ball, 0–100.
    pub possession: u8,
    pub shots: u32,
    pub shots_on_target: u32,
    pub corners: u32,
    /// Most recent first, at most [`COMMENTARY_LIMIT`] lines.
    pub commentary: Vec<CommentaryLine>,
    pub finished: bool,
}

impl Default for MatchState {
    fn default() -> Self {
        Self {
            minute: 0,
            user_score: 0,
            cpu_score: 0,
            possession: 50,
            shots: 0,
            shots_on_target: 0,
            corners: 0,
            commentary: Vec::new(),
            finished: false,
        }
    }
}

impl MatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock on one minute. Returns `true` once full time is reached;
    /// the clock never runs past [`MATCH_MINUTES`].
    pub fn advance_minute(&mut self) -> bool {
        if self.minute < MATCH_MINUTES {
            self.minute += 1;
        }
        self.minute >= MATCH_MINUTES
    }

    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn total_goals(&self) -> u32 {
        self.user_score + self.cpu_score
    }

    /// Which side attacks this minute, weighted by current possession.
    pub fn user_attacking<R>(&self, rng: &mut R) -> bool
    where
        R: Rng + ?Sized,
    {
        chance(f64::from(self.possession) / 100.0, rng)
    }

    /// Fold an event into the counters, log its commentary and let
    /// possession drift.
    pub fn apply_event<R>(&mut self, event: &MatchEvent, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        match event.event_type {
            EventKind::Goal => {
                match event.team {
                    TeamSide::User => self.user_score += 1,
                    TeamSide::Cpu => self.cpu_score += 1,
                }
                self.shots += 1;
                self.shots_on_target += 1;
            }
            EventKind::Miss => {
                self.shots += 1;
                if chance(ON_TARGET_CHANCE, rng) {
                    self.shots_on_target += 1;
                }
                if chance(CORNER_CHANCE, rng) {
                    self.corners += 1;
                }
            }
            EventKind::Defense | EventKind::Possession => {}
        }

        self.push_commentary(event.minute, event.commentary.clone());
        self.drift_possession(int_between(-POSSESSION_DRIFT, POSSESSION_DRIFT, rng));
    }

    pub fn push_commentary(&mut self, minute: u8, text: String) {
        self.commentary.insert(0, CommentaryLine { minute, text });
        self.commentary.truncate(COMMENTARY_LIMIT);
    }

    pub fn drift_possession(&mut self, delta: i32) {
        self.possession = (i32::from(self.possession) + delta).clamp(0, 100) as u8;
    }
}
