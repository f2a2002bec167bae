//! Single-elimination brackets.
//!
//! Rounds and positions are 1-based. Round 1 pairs seed `i` against seed
//! `size - 1 - i`; a missing away seed is a bye and is advanced as soon as
//! the bracket is built.

use crate::{DraftError, MatchId, ParticipantId, Result};
use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketSlot {
    pub round: u32,
    pub position: u32,
    #[serde(rename = "homeParticipantId")]
    pub home: Option<ParticipantId>,
    #[serde(rename = "awayParticipantId")]
    pub away: Option<ParticipantId>,
    #[serde(rename = "winnerId")]
    pub winner: Option<ParticipantId>,
    pub match_id: Option<MatchId>,
    pub completed: bool,
}

impl BracketSlot {
    fn empty(round: u32, position: u32) -> Self {
        Self {
            round,
            position,
            home: None,
            away: None,
            winner: None,
            match_id: None,
            completed: false,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.round == 1 && self.home.is_some() && self.away.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bracket {
    pub rounds: u32,
    pub current_round: u32,
    #[serde(rename = "matches")]
    pub slots: Vec<BracketSlot>,
}

/// What a recorded result changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded {
        loser: ParticipantId,
        /// Set when this result decided the final.
        champion: Option<ParticipantId>,
    },
    /// The slot already held this exact winner.
    Unchanged,
}

/// `ceil(log2(n))`, with fewer than two participants needing no rounds.
pub fn rounds_for(participants: usize) -> u32 {
    if participants < 2 {
        return 0;
    }
    participants.next_power_of_two().trailing_zeros()
}

impl Bracket {
    /// Shuffle `participants` and build the bracket from that order.
    pub fn seed<R>(participants: &[ParticipantId], rng: &mut R) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        let mut order = participants.to_vec();
        order.shuffle(rng);
        Self::from_order(&order)
    }

    /// Build a bracket from an already-shuffled seed order.
    pub fn from_order(order: &[ParticipantId]) -> Result<Self> {
        if order.len() < 2 {
            return Err(DraftError::Conflict(
                "Tournament needs at least 2 participants to start".into(),
            ));
        }

        let rounds = rounds_for(order.len());
        let size = 1usize << rounds;
        let mut slots = Vec::with_capacity(size - 1);

        for i in 0..size / 2 {
            slots.push(BracketSlot {
                home: order.get(i).copied(),
                away: order.get(size - 1 - i).copied(),
                ..BracketSlot::empty(1, i as u32 + 1)
            });
        }
        for round in 2..=rounds {
            let count = 1u32 << (rounds - round);
            slots.extend((1..=count).map(|position| BracketSlot::empty(round, position)));
        }

        let mut bracket = Bracket { rounds, current_round: 1, slots };
        bracket.advance_byes();
        Ok(bracket)
    }

    fn advance_byes(&mut self) {
        let byes: Vec<(u32, ParticipantId)> = self
            .round_slots(1)
            .filter(|s| s.is_bye())
            .filter_map(|s| s.home.map(|home| (s.position, home)))
            .collect();

        for (position, home) in byes {
            debug!("participant {home} advances on a bye from slot {position}");
            if let Some(slot) = self.slot_mut(1, position) {
                slot.winner = Some(home);
                slot.completed = true;
            }
            self.promote(1, position, home);
        }
        self.advance_round();
    }

    pub fn slot(&self, round: u32, position: u32) -> Option<&BracketSlot> {
        self.slots
            .iter()
            .find(|s| s.round == round && s.position == position)
    }

    fn slot_mut(&mut self, round: u32, position: u32) -> Option<&mut BracketSlot> {
        self.slots
            .iter_mut()
            .find(|s| s.round == round && s.position == position)
    }

    pub fn round_slots(&self, round: u32) -> impl Iterator<Item = &BracketSlot> {
        self.slots.iter().filter(move |s| s.round == round)
    }

    pub fn round_complete(&self, round: u32) -> bool {
        self.round_slots(round).all(|s| s.completed)
    }

    pub fn is_finished(&self) -> bool {
        self.current_round == self.rounds && self.round_complete(self.rounds)
    }

    pub fn champion(&self) -> Option<ParticipantId> {
        if !self.is_finished() {
            return None;
        }
        self.slot(self.rounds, 1).and_then(|s| s.winner)
    }

    /// Record `winner` for the slot at (`round`, `position`), promote them and
    /// move the round pointer on when the current round is done.
    pub fn record(
        &mut self,
        round: u32,
        position: u32,
        winner: ParticipantId,
        match_id: MatchId,
    ) -> Result<RecordOutcome> {
        let slot = self
            .slot_mut(round, position)
            .ok_or_else(|| DraftError::NotFound("Match not found in bracket".into()))?;

        if slot.completed {
            if slot.winner == Some(winner) {
                return Ok(RecordOutcome::Unchanged);
            }
            return Err(DraftError::Conflict(format!(
                "Result for round {round} match {position} was already recorded"
            )));
        }

        let (Some(home), Some(away)) = (slot.home, slot.away) else {
            return Err(DraftError::Conflict(format!(
                "Round {round} match {position} is still waiting for its participants"
            )));
        };
        let loser = if winner == home {
            away
        } else if winner == away {
            home
        } else {
            return Err(DraftError::Validation(format!(
                "Participant {winner} is not playing in round {round} match {position}"
            )));
        };

        slot.winner = Some(winner);
        slot.match_id = Some(match_id);
        slot.completed = true;

        self.promote(round, position, winner);
        self.advance_round();

        Ok(RecordOutcome::Recorded { loser, champion: self.champion() })
    }

    fn promote(&mut self, round: u32, position: u32, winner: ParticipantId) {
        if round >= self.rounds {
            return;
        }
        if let Some(next) = self.slot_mut(round + 1, position.div_ceil(2)) {
            if position % 2 == 1 {
                next.home = Some(winner);
            } else {
                next.away = Some(winner);
            }
        }
    }

    fn advance_round(&mut self) {
        if self.current_round < self.rounds && self.round_complete(self.current_round) {
            self.current_round += 1;
        }
    }
}
