//! Persistence seam.
//!
//! The game logic only ever talks to [`Store`]. [`MemoryStore`] keeps
//! everything in process memory and is what the server runs on; a database
//! backend would implement the same trait.

use crate::matches::{MatchRecord, NewMatch};
use crate::tournament::{NewTournament, Participant, Tournament, TournamentStatus};
use crate::{
    CollectionEntry, DraftError, Event, MatchId, NewPlayer, NewSpin, NewTeam, Player, PlayerId,
    Position, Result, SpinRecord, Team, TeamId, TournamentId, User, UserId,
};
use chrono::Utc;
use std::collections::BTreeMap;

/// Catalog query. `None` fields match anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerFilter {
    pub position: Option<Position>,
    pub event: Option<Event>,
    /// Inclusive overall bounds.
    pub overall: Option<(u8, u8)>,
}

impl PlayerFilter {
    pub fn matches(&self, player: &Player) -> bool {
        self.position.is_none_or(|p| p == player.position)
            && self.event.is_none_or(|e| e == player.event)
            && self
                .overall
                .is_none_or(|(min, max)| (min..=max).contains(&player.overall))
    }
}

pub trait Store: Send {
    // Users
    fn create_user(&mut self, username: &str) -> Result<User>;
    fn user(&self, id: UserId) -> Result<Option<User>>;
    fn credit_coins(&mut self, id: UserId, amount: u64) -> Result<User>;

    // Player catalog
    fn insert_player(&mut self, player: NewPlayer) -> Result<Player>;
    fn player(&self, id: PlayerId) -> Result<Option<Player>>;
    fn find_players(&self, filter: &PlayerFilter) -> Result<Vec<Player>>;

    // Collections and spin history
    fn add_to_collection(&mut self, user_id: UserId, player_id: PlayerId) -> Result<CollectionEntry>;
    /// One element per acquisition, oldest first.
    fn collection(&self, user_id: UserId) -> Result<Vec<Player>>;
    fn record_spin(&mut self, spin: NewSpin) -> Result<SpinRecord>;
    /// Newest first.
    fn recent_spins(&self, user_id: UserId, limit: usize) -> Result<Vec<SpinRecord>>;

    // Teams
    fn insert_team(&mut self, team: NewTeam) -> Result<Team>;
    fn team(&self, id: TeamId) -> Result<Option<Team>>;
    fn user_teams(&self, user_id: UserId) -> Result<Vec<Team>>;
    fn replace_team(&mut self, team: Team) -> Result<Team>;
    fn delete_team(&mut self, id: TeamId) -> Result<bool>;

    // Matches
    fn insert_match(&mut self, record: NewMatch) -> Result<MatchRecord>;
    fn match_record(&self, id: MatchId) -> Result<Option<MatchRecord>>;
    /// Newest first.
    fn user_matches(&self, user_id: UserId) -> Result<Vec<MatchRecord>>;
    fn tournament_matches(&self, tournament_id: TournamentId) -> Result<Vec<MatchRecord>>;

    // Tournaments
    fn insert_tournament(&mut self, tournament: NewTournament) -> Result<Tournament>;
    fn tournament(&self, id: TournamentId) -> Result<Option<Tournament>>;
    fn tournaments(&self, status: Option<TournamentStatus>) -> Result<Vec<Tournament>>;
    /// Write `tournament` back if the stored copy is still at
    /// `expected_version`; the stored version is bumped by one.
    fn update_tournament(&mut self, tournament: Tournament, expected_version: u64) -> Result<Tournament>;
    fn insert_participant(
        &mut self,
        tournament_id: TournamentId,
        user_id: UserId,
        team_id: TeamId,
    ) -> Result<Participant>;
    fn participants(&self, tournament_id: TournamentId) -> Result<Vec<Participant>>;
    fn update_participant(&mut self, participant: Participant) -> Result<Participant>;
}

#[derive(Debug, Default)]
struct Sequence(u64);

impl Sequence {
    fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}

/// In-process store. Ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: BTreeMap<UserId, User>,
    players: BTreeMap<PlayerId, Player>,
    collection: Vec<CollectionEntry>,
    spins: Vec<SpinRecord>,
    teams: BTreeMap<TeamId, Team>,
    matches: BTreeMap<MatchId, MatchRecord>,
    tournaments: BTreeMap<TournamentId, Tournament>,
    participants: BTreeMap<u64, Participant>,
    user_ids: Sequence,
    player_ids: Sequence,
    collection_ids: Sequence,
    spin_ids: Sequence,
    team_ids: Sequence,
    match_ids: Sequence,
    tournament_ids: Sequence,
    participant_ids: Sequence,
    #[cfg(test)]
    pub(crate) fail_participant_inserts: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(players: Vec<NewPlayer>) -> Result<Self> {
        let mut store = Self::new();
        for player in players {
            store.insert_player(player)?;
        }
        Ok(store)
    }
}

impl Store for MemoryStore {
    fn create_user(&mut self, username: &str) -> Result<User> {
        if self.users.values().any(|u| u.username == username) {
            return Err(DraftError::Conflict(format!("username {username} is taken")));
        }
        let user = User {
            id: self.user_ids.next(),
            username: username.to_owned(),
            coins: 0,
            created_at: Utc::now(),
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.get(&id).cloned())
    }

    fn credit_coins(&mut self, id: UserId, amount: u64) -> Result<User> {
        let user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| DraftError::not_found("User"))?;
        user.coins = user.coins.saturating_add(amount);
        Ok(user.clone())
    }

    fn insert_player(&mut self, player: NewPlayer) -> Result<Player> {
        let player = player.with_id(self.player_ids.next());
        self.players.insert(player.id, player.clone());
        Ok(player)
    }

    fn player(&self, id: PlayerId) -> Result<Option<Player>> {
        Ok(self.players.get(&id).cloned())
    }

    fn find_players(&self, filter: &PlayerFilter) -> Result<Vec<Player>> {
        Ok(self
            .players
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    fn add_to_collection(&mut self, user_id: UserId, player_id: PlayerId) -> Result<CollectionEntry> {
        if !self.players.contains_key(&player_id) {
            return Err(DraftError::not_found("Player"));
        }
        let entry = CollectionEntry {
            id: self.collection_ids.next(),
            user_id,
            player_id,
            acquired_at: Utc::now(),
        };
        self.collection.push(entry.clone());
        Ok(entry)
    }

    fn collection(&self, user_id: UserId) -> Result<Vec<Player>> {
        Ok(self
            .collection
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter_map(|e| self.players.get(&e.player_id).cloned())
            .collect())
    }

    fn record_spin(&mut self, spin: NewSpin) -> Result<SpinRecord> {
        let record = SpinRecord {
            id: self.spin_ids.next(),
            user_id: spin.user_id,
            player_id: spin.player_id,
            position_result: spin.position_result,
            event_result: spin.event_result,
            ovr_result: spin.ovr_result,
            spun_at: Utc::now(),
        };
        self.spins.push(record.clone());
        Ok(record)
    }

    fn recent_spins(&self, user_id: UserId, limit: usize) -> Result<Vec<SpinRecord>> {
        // Insertion order doubles as time order; ids break same-instant ties.
        Ok(self
            .spins
            .iter()
            .rev()
            .filter(|s| s.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    fn insert_team(&mut self, team: NewTeam) -> Result<Team> {
        let now = Utc::now();
        let team = Team {
            id: self.team_ids.next(),
            user_id: team.user_id,
            name: team.name,
            formation: team.formation,
            play_style: team.play_style,
            players: team.players,
            created_at: now,
            updated_at: now,
        };
        self.teams.insert(team.id, team.clone());
        Ok(team)
    }

    fn team(&self, id: TeamId) -> Result<Option<Team>> {
        Ok(self.teams.get(&id).cloned())
    }

    fn user_teams(&self, user_id: UserId) -> Result<Vec<Team>> {
        Ok(self
            .teams
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    fn replace_team(&mut self, team: Team) -> Result<Team> {
        let slot = self
            .teams
            .get_mut(&team.id)
            .ok_or_else(|| DraftError::not_found("Team"))?;
        *slot = team.clone();
        Ok(team)
    }

    fn delete_team(&mut self, id: TeamId) -> Result<bool> {
        Ok(self.teams.remove(&id).is_some())
    }

    fn insert_match(&mut self, record: NewMatch) -> Result<MatchRecord> {
        let record = record.with_id(self.match_ids.next(), Utc::now());
        self.matches.insert(record.id, record.clone());
        Ok(record)
    }

    fn match_record(&self, id: MatchId) -> Result<Option<MatchRecord>> {
        Ok(self.matches.get(&id).cloned())
    }

    fn user_matches(&self, user_id: UserId) -> Result<Vec<MatchRecord>> {
        Ok(self
            .matches
            .values()
            .rev()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    fn tournament_matches(&self, tournament_id: TournamentId) -> Result<Vec<MatchRecord>> {
        Ok(self
            .matches
            .values()
            .filter(|m| m.tournament_id == Some(tournament_id))
            .cloned()
            .collect())
    }

    fn insert_tournament(&mut self, tournament: NewTournament) -> Result<Tournament> {
        let tournament = tournament.with_id(self.tournament_ids.next(), Utc::now());
        self.tournaments.insert(tournament.id, tournament.clone());
        Ok(tournament)
    }

    fn tournament(&self, id: TournamentId) -> Result<Option<Tournament>> {
        Ok(self.tournaments.get(&id).cloned())
    }

    fn tournaments(&self, status: Option<TournamentStatus>) -> Result<Vec<Tournament>> {
        Ok(self
            .tournaments
            .values()
            .filter(|t| status.is_none_or(|s| s == t.status))
            .cloned()
            .collect())
    }

    fn update_tournament(&mut self, mut tournament: Tournament, expected_version: u64) -> Result<Tournament> {
        let stored = self
            .tournaments
            .get_mut(&tournament.id)
            .ok_or_else(|| DraftError::not_found("Tournament"))?;
        if stored.version != expected_version {
            return Err(DraftError::Conflict(format!(
                "tournament {} was modified concurrently (version {} != {expected_version})",
                tournament.id, stored.version
            )));
        }
        tournament.version = expected_version + 1;
        *stored = tournament.clone();
        Ok(tournament)
    }

    fn insert_participant(
        &mut self,
        tournament_id: TournamentId,
        user_id: UserId,
        team_id: TeamId,
    ) -> Result<Participant> {
        #[cfg(test)]
        if self.fail_participant_inserts {
            return Err(DraftError::Storage("participant insert rejected".into()));
        }
        let participant = Participant {
            id: self.participant_ids.next(),
            tournament_id,
            user_id,
            team_id,
            eliminated: false,
            position: None,
            joined_at: Utc::now(),
        };
        self.participants.insert(participant.id, participant.clone());
        Ok(participant)
    }

    fn participants(&self, tournament_id: TournamentId) -> Result<Vec<Participant>> {
        Ok(self
            .participants
            .values()
            .filter(|p| p.tournament_id == tournament_id)
            .cloned()
            .collect())
    }

    fn update_participant(&mut self, participant: Participant) -> Result<Participant> {
        let slot = self
            .participants
            .get_mut(&participant.id)
            .ok_or_else(|| DraftError::not_found("Participant"))?;
        *slot = participant.clone();
        Ok(participant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::new_player;
    use crate::tournament::NewTournament;

    fn store_with_players() -> MemoryStore {
        MemoryStore::with_catalog(vec![
            new_player("Keeper", Position::Gk, Event::Icons, 91),
            new_player("Striker", Position::St, Event::Tots, 86),
            new_player("Winger", Position::Lw, Event::Tots, 78),
        ])
        .unwrap()
    }

    #[test]
    fn ids_start_at_one_and_increase() {
        let store = store_with_players();
        let ids: Vec<PlayerId> = store
            .find_players(&PlayerFilter::default())
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn filter_combines_position_event_and_band() {
        let store = store_with_players();
        let filter = PlayerFilter {
            position: Some(Position::St),
            event: Some(Event::Tots),
            overall: Some((85, 89)),
        };
        let found = store.find_players(&filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Striker");

        let miss = PlayerFilter { overall: Some((90, 99)), ..filter };
        assert!(store.find_players(&miss).unwrap().is_empty());
    }

    #[test]
    fn repeated_acquisitions_are_separate_entries() {
        let mut store = store_with_players();
        let first = store.add_to_collection(1, 2).unwrap();
        let second = store.add_to_collection(1, 2).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(store.collection(1).unwrap().len(), 2);
        assert!(store.collection(2).unwrap().is_empty());
    }

    #[test]
    fn unknown_player_cannot_be_collected() {
        let mut store = store_with_players();
        assert!(matches!(store.add_to_collection(1, 99), Err(DraftError::NotFound(_))));
    }

    #[test]
    fn recent_spins_are_newest_first_and_limited() {
        let mut store = store_with_players();
        for player_id in [1, 2, 3] {
            store
                .record_spin(NewSpin {
                    user_id: 1,
                    player_id,
                    position_result: Position::St,
                    event_result: Event::Tots,
                    ovr_result: crate::OvrBand::Plus90,
                })
                .unwrap();
        }
        let recent = store.recent_spins(1, 2).unwrap();
        assert_eq!(recent.iter().map(|s| s.player_id).collect::<Vec<_>>(), vec![3, 2]);
    }

    #[test]
    fn duplicate_usernames_are_rejected() {
        let mut store = MemoryStore::new();
        store.create_user("guest").unwrap();
        assert!(matches!(store.create_user("guest"), Err(DraftError::Conflict(_))));
    }

    #[test]
    fn stale_tournament_write_is_a_conflict() {
        let mut store = MemoryStore::new();
        let created = store
            .insert_tournament(NewTournament {
                name: "Cup".into(),
                description: None,
                prize_coins: 5000,
                max_participants: 8,
                starts_at: None,
                ends_at: None,
            })
            .unwrap();
        assert_eq!(created.version, 0);

        let mut first = created.clone();
        first.current_participants = 1;
        let saved = store.update_tournament(first, 0).unwrap();
        assert_eq!(saved.version, 1);

        let mut second = created;
        second.current_participants = 5;
        let err = store.update_tournament(second, 0).unwrap_err();
        assert!(matches!(err, DraftError::Conflict(_)));
        assert_eq!(store.tournament(1).unwrap().unwrap().current_participants, 1);
    }
}
