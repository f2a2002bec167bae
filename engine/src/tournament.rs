//! Tournament lifecycle: REGISTRATION → IN_PROGRESS → COMPLETED.
//!
//! Every tournament write goes through [`Store::update_tournament`] with the
//! version that was read, so two results racing on the same bracket cannot
//! both land.

use crate::bracket::{Bracket, RecordOutcome};
use crate::matches::MatchRecord;
use crate::store::Store;
use crate::{DraftError, MatchId, ParticipantId, Result, TeamId, TournamentId, UserId};
use chrono::{DateTime, Utc};
use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const MIN_NAME_LEN: usize = 3;
pub const MAX_NAME_LEN: usize = 50;
pub const MIN_PRIZE_COINS: u64 = 500;
pub const DEFAULT_PRIZE_COINS: u64 = 5000;
pub const MIN_PARTICIPANTS: u32 = 4;
pub const MAX_PARTICIPANTS: u32 = 32;
pub const DEFAULT_MAX_PARTICIPANTS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TournamentStatus {
    Registration,
    InProgress,
    Completed,
}

impl FromStr for TournamentStatus {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "REGISTRATION" => Ok(TournamentStatus::Registration),
            "IN_PROGRESS" => Ok(TournamentStatus::InProgress),
            "COMPLETED" => Ok(TournamentStatus::Completed),
            other => Err(DraftError::Validation(format!(
                "Invalid tournament status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub description: Option<String>,
    pub prize_coins: u64,
    pub max_participants: u32,
    pub current_participants: u32,
    pub status: TournamentStatus,
    pub bracket: Option<Bracket>,
    /// User who won the final.
    pub winner_id: Option<UserId>,
    pub prize_awarded: bool,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub tournament_id: TournamentId,
    pub user_id: UserId,
    pub team_id: TeamId,
    pub eliminated: bool,
    /// Round-1 bracket slot, assigned at start.
    pub position: Option<u32>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTournament {
    pub name: String,
    pub description: Option<String>,
    pub prize_coins: u64,
    pub max_participants: u32,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl NewTournament {
    pub fn with_id(self, id: TournamentId, created_at: DateTime<Utc>) -> Tournament {
        Tournament {
            id,
            name: self.name,
            description: self.description,
            prize_coins: self.prize_coins,
            max_participants: self.max_participants,
            current_participants: 0,
            status: TournamentStatus::Registration,
            bracket: None,
            winner_id: None,
            prize_awarded: false,
            version: 0,
            created_at,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
        }
    }
}

fn default_prize_coins() -> u64 {
    DEFAULT_PRIZE_COINS
}

fn default_max_participants() -> u32 {
    DEFAULT_MAX_PARTICIPANTS
}

/// Body of a create request, dates as RFC 3339 strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateTournament {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_prize_coins")]
    pub prize_coins: u64,
    #[serde(default = "default_max_participants")]
    pub max_participants: u32,
    #[serde(default)]
    pub starts_at: Option<String>,
    #[serde(default)]
    pub ends_at: Option<String>,
}

impl CreateTournament {
    pub fn validate(self) -> Result<NewTournament> {
        let name_len = self.name.chars().count();
        if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&name_len) {
            return Err(DraftError::Validation(format!(
                "Tournament name must be between {MIN_NAME_LEN} and {MAX_NAME_LEN} characters"
            )));
        }
        if self.prize_coins < MIN_PRIZE_COINS {
            return Err(DraftError::Validation(format!(
                "Prize must be at least {MIN_PRIZE_COINS} coins"
            )));
        }
        if !(MIN_PARTICIPANTS..=MAX_PARTICIPANTS).contains(&self.max_participants) {
            return Err(DraftError::Validation(format!(
                "Max participants must be between {MIN_PARTICIPANTS} and {MAX_PARTICIPANTS}"
            )));
        }

        Ok(NewTournament {
            name: self.name,
            description: self.description,
            prize_coins: self.prize_coins,
            max_participants: self.max_participants,
            starts_at: parse_date("starts_at", self.starts_at.as_deref())?,
            ends_at: parse_date("ends_at", self.ends_at.as_deref())?,
        })
    }
}

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    value
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|_| DraftError::Validation(format!("Invalid {field} date: {raw}")))
        })
        .transpose()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TournamentDetails {
    pub tournament: Tournament,
    pub participants: Vec<Participant>,
    pub matches: Vec<MatchRecord>,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

fn load(store: &dyn Store, id: TournamentId) -> Result<Tournament> {
    store
        .tournament(id)?
        .ok_or_else(|| DraftError::not_found("Tournament"))
}

pub fn create_tournament(store: &mut dyn Store, request: CreateTournament) -> Result<Tournament> {
    let tournament = store.insert_tournament(request.validate()?)?;
    info!("tournament {} '{}' open for registration", tournament.id, tournament.name);
    Ok(tournament)
}

pub fn list_tournaments(
    store: &dyn Store,
    status: Option<TournamentStatus>,
) -> Result<Vec<Tournament>> {
    store.tournaments(status)
}

pub fn tournament_details(store: &dyn Store, id: TournamentId) -> Result<TournamentDetails> {
    let tournament = load(store, id)?;
    Ok(TournamentDetails {
        participants: store.participants(id)?,
        matches: store.tournament_matches(id)?,
        tournament,
    })
}

pub fn join_tournament(
    store: &mut dyn Store,
    user_id: UserId,
    tournament_id: TournamentId,
    team_id: TeamId,
) -> Result<Participant> {
    let mut tournament = load(store, tournament_id)?;
    if tournament.status != TournamentStatus::Registration {
        return Err(DraftError::Conflict(
            "Tournament is not open for registration".into(),
        ));
    }
    if tournament.current_participants >= tournament.max_participants {
        return Err(DraftError::Conflict("Tournament is already full".into()));
    }

    let team = store
        .team(team_id)?
        .ok_or_else(|| DraftError::not_found("Team"))?;
    if team.user_id != user_id {
        return Err(DraftError::Forbidden(
            "You can only join with your own teams".into(),
        ));
    }

    let already_joined = store
        .participants(tournament_id)?
        .iter()
        .any(|p| p.user_id == user_id && !p.eliminated);
    if already_joined {
        return Err(DraftError::Conflict(
            "You are already participating in this tournament".into(),
        ));
    }

    let expected = tournament.version;
    tournament.current_participants += 1;
    let counted = store.update_tournament(tournament, expected)?;
    match store.insert_participant(tournament_id, user_id, team_id) {
        Ok(participant) => Ok(participant),
        Err(e) => {
            let version = counted.version;
            let mut rollback = counted;
            rollback.current_participants = rollback.current_participants.saturating_sub(1);
            if let Err(undo) = store.update_tournament(rollback, version) {
                warn!("tournament {tournament_id}: could not roll back participant count: {undo}");
            }
            Err(e)
        }
    }
}

pub fn leave_tournament(
    store: &mut dyn Store,
    user_id: UserId,
    tournament_id: TournamentId,
) -> Result<()> {
    let mut tournament = load(store, tournament_id)?;
    if tournament.status != TournamentStatus::Registration {
        return Err(DraftError::Conflict(
            "Cannot leave a tournament that has already started".into(),
        ));
    }

    let mut participant = store
        .participants(tournament_id)?
        .into_iter()
        .find(|p| p.user_id == user_id && !p.eliminated)
        .ok_or_else(|| {
            DraftError::NotFound("You are not participating in this tournament".into())
        })?;

    let expected = tournament.version;
    tournament.current_participants = tournament.current_participants.saturating_sub(1);
    store.update_tournament(tournament, expected)?;

    participant.eliminated = true;
    store.update_participant(participant)?;
    Ok(())
}

/// Seed the bracket from the active participants and move to IN_PROGRESS.
pub fn start_tournament<R>(
    store: &mut dyn Store,
    tournament_id: TournamentId,
    rng: &mut R,
) -> Result<Bracket>
where
    R: Rng + ?Sized,
{
    let mut tournament = load(store, tournament_id)?;
    if tournament.status != TournamentStatus::Registration {
        return Err(DraftError::Conflict(
            "Tournament has already started or finished".into(),
        ));
    }

    let active: Vec<Participant> = store
        .participants(tournament_id)?
        .into_iter()
        .filter(|p| !p.eliminated)
        .collect();
    let ids: Vec<ParticipantId> = active.iter().map(|p| p.id).collect();
    let bracket = Bracket::seed(&ids, rng)?;

    let expected = tournament.version;
    tournament.status = TournamentStatus::InProgress;
    tournament.starts_at = Some(Utc::now());
    tournament.bracket = Some(bracket.clone());
    store.update_tournament(tournament, expected)?;

    for mut participant in active {
        participant.position = bracket
            .round_slots(1)
            .find(|s| s.home == Some(participant.id) || s.away == Some(participant.id))
            .map(|s| s.position);
        store.update_participant(participant)?;
    }

    info!(
        "tournament {tournament_id} started with {} participants over {} rounds",
        ids.len(),
        bracket.rounds
    );
    Ok(bracket)
}

/// Record the winner of one bracket slot. The final result completes the
/// tournament and pays the prize to the champion's owner, once.
pub fn record_match_result(
    store: &mut dyn Store,
    tournament_id: TournamentId,
    round: u32,
    position: u32,
    winner: ParticipantId,
    match_id: MatchId,
) -> Result<Bracket> {
    let mut tournament = load(store, tournament_id)?;
    if tournament.status != TournamentStatus::InProgress {
        return Err(DraftError::Conflict("Tournament is not in progress".into()));
    }
    let mut bracket = tournament
        .bracket
        .clone()
        .ok_or_else(|| DraftError::Conflict("Tournament bracket not found".into()))?;

    let (loser, champion) = match bracket.record(round, position, winner, match_id)? {
        RecordOutcome::Unchanged => return Ok(bracket),
        RecordOutcome::Recorded { loser, champion } => (loser, champion),
    };

    let participants = store.participants(tournament_id)?;
    let user_of = |id: ParticipantId| {
        participants
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| DraftError::not_found("Participant"))
    };
    let loser = user_of(loser)?.clone();

    let mut payout = None;
    if let Some(champion) = champion {
        let champion_user = user_of(champion)?.user_id;
        tournament.status = TournamentStatus::Completed;
        tournament.winner_id = Some(champion_user);
        tournament.ends_at = Some(Utc::now());
        if !tournament.prize_awarded {
            tournament.prize_awarded = true;
            payout = Some((champion_user, tournament.prize_coins));
        }
    }

    let expected = tournament.version;
    tournament.bracket = Some(bracket.clone());
    store.update_tournament(tournament, expected)?;

    if !loser.eliminated {
        store.update_participant(Participant { eliminated: true, ..loser })?;
    }
    if let Some((user_id, coins)) = payout {
        store.credit_coins(user_id, coins)?;
        info!("tournament {tournament_id} won by user {user_id}, {coins} coins awarded");
    }
    Ok(bracket)
}
