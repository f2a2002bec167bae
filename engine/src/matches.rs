use crate::cpu::CpuTeam;
use crate::match_state::{CommentaryLine, MatchState};
use crate::store::Store;
use crate::{DraftError, MatchId, Result, Team, TeamId, TournamentId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of a finished simulation. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub user_id: UserId,
    pub team_id: TeamId,
    pub opponent_team: CpuTeam,
    pub user_score: u32,
    pub opponent_score: u32,
    pub possession: u8,
    pub shots: u32,
    pub shots_on_target: u32,
    pub corners: u32,
    pub commentary: Vec<CommentaryLine>,
    pub tournament_id: Option<TournamentId>,
    pub tournament_round: Option<u32>,
    pub played_at: DateTime<Utc>,
}

/// Ties a simulated match to a tournament bracket round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentLink {
    pub tournament_id: TournamentId,
    pub round: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMatch {
    pub user_id: UserId,
    pub team_id: TeamId,
    pub opponent_team: CpuTeam,
    pub user_score: u32,
    pub opponent_score: u32,
    pub possession: u8,
    pub shots: u32,
    pub shots_on_target: u32,
    pub corners: u32,
    pub commentary: Vec<CommentaryLine>,
    pub tournament_id: Option<TournamentId>,
    pub tournament_round: Option<u32>,
}

impl NewMatch {
    pub fn from_final_state(
        user_id: UserId,
        team: &Team,
        opponent: &CpuTeam,
        state: &MatchState,
        link: Option<TournamentLink>,
    ) -> Self {
        Self {
            user_id,
            team_id: team.id,
            opponent_team: opponent.clone(),
            user_score: state.user_score,
            opponent_score: state.cpu_score,
            possession: state.possession,
            shots: state.shots,
            shots_on_target: state.shots_on_target,
            corners: state.corners,
            commentary: state.commentary.clone(),
            tournament_id: link.map(|l| l.tournament_id),
            tournament_round: link.and_then(|l| l.round),
        }
    }

    pub fn with_id(self, id: MatchId, played_at: DateTime<Utc>) -> MatchRecord {
        MatchRecord {
            id,
            user_id: self.user_id,
            team_id: self.team_id,
            opponent_team: self.opponent_team,
            user_score: self.user_score,
            opponent_score: self.opponent_score,
            possession: self.possession,
            shots: self.shots,
            shots_on_target: self.shots_on_target,
            corners: self.corners,
            commentary: self.commentary,
            tournament_id: self.tournament_id,
            tournament_round: self.tournament_round,
            played_at,
        }
    }
}

pub fn match_history(store: &dyn Store, user_id: UserId) -> Result<Vec<MatchRecord>> {
    store.user_matches(user_id)
}

pub fn match_details(store: &dyn Store, user_id: UserId, match_id: MatchId) -> Result<MatchRecord> {
    let record = store
        .match_record(match_id)?
        .ok_or_else(|| DraftError::not_found("Match"))?;
    if record.user_id != user_id {
        return Err(DraftError::Forbidden(
            "You do not have access to this match".into(),
        ));
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::scaled_cpu_team;
    use crate::fixtures::team;
    use crate::store::MemoryStore;
    use crate::PlayStyle;

    fn finished_state() -> MatchState {
        let mut state = MatchState::new();
        state.user_score = 2;
        state.cpu_score = 1;
        state.shots = 7;
        state.shots_on_target = 4;
        state.corners = 2;
        state.push_commentary(88, "late drama".into());
        state
    }

    #[test]
    fn record_copies_final_state_and_link() {
        let team = team(1, PlayStyle::TikiTaka, 85);
        let cpu = scaled_cpu_team(&team, 0.9);
        let link = TournamentLink { tournament_id: 4, round: Some(2) };
        let new = NewMatch::from_final_state(1, &team, &cpu, &finished_state(), Some(link));
        assert_eq!(new.user_score, 2);
        assert_eq!(new.opponent_score, 1);
        assert_eq!(new.tournament_id, Some(4));
        assert_eq!(new.tournament_round, Some(2));
        assert_eq!(new.commentary.len(), 1);
    }

    #[test]
    fn details_check_existence_then_ownership() {
        let mut store = MemoryStore::new();
        let team = team(1, PlayStyle::TikiTaka, 85);
        let cpu = scaled_cpu_team(&team, 0.9);
        let saved = store
            .insert_match(NewMatch::from_final_state(1, &team, &cpu, &finished_state(), None))
            .unwrap();

        assert_eq!(match_details(&store, 1, saved.id).unwrap().id, saved.id);
        assert!(matches!(match_details(&store, 2, saved.id), Err(DraftError::Forbidden(_))));
        assert!(matches!(match_details(&store, 1, 99), Err(DraftError::NotFound(_))));
    }

    #[test]
    fn history_is_newest_first() {
        let mut store = MemoryStore::new();
        let team = team(1, PlayStyle::TikiTaka, 85);
        let cpu = scaled_cpu_team(&team, 0.9);
        for _ in 0..3 {
            store
                .insert_match(NewMatch::from_final_state(1, &team, &cpu, &finished_state(), None))
                .unwrap();
        }
        let ids: Vec<MatchId> = match_history(&store, 1).unwrap().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }
}
