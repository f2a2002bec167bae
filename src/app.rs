use crate::state::app_settings::AppSettings;
use draft_engine::bracket::Bracket;
use draft_engine::catalog::load_catalog;
use draft_engine::matches::{self, MatchRecord, NewMatch, TournamentLink};
use draft_engine::spin::{self, RecentSpin, SpinKind, SpinOptions, SpinOutcome};
use draft_engine::store::{MemoryStore, Store};
use draft_engine::team::{self, TeamRequest};
use draft_engine::tournament::{
    self, CreateTournament, Participant, Tournament, TournamentDetails, TournamentStatus,
};
use draft_engine::{
    DraftError, MatchId, ParticipantId, Player, Result, Team, TeamId, TournamentId, User, UserId,
};
use log::{error, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tokio::sync::Mutex;

pub type SharedApp = Arc<Mutex<App>>;

pub const GUEST_COINS: u64 = 10_000;

/// Storage failures are logged here, once, before they are handed back.
trait LogStorage {
    fn log_storage(self, operation: &str) -> Self;
}

impl<T> LogStorage for Result<T> {
    fn log_storage(self, operation: &str) -> Self {
        if let Err(e) = &self
            && e.is_storage()
        {
            error!("{operation}: {e}");
        }
        self
    }
}

/// Every game operation, each taking the caller's identity explicitly.
pub struct App {
    store: Box<dyn Store>,
    rng: StdRng,
}

impl App {
    pub fn new(store: Box<dyn Store>, rng: StdRng) -> Self {
        Self { store, rng }
    }

    pub fn from_settings(settings: &AppSettings) -> anyhow::Result<Self> {
        let catalog = load_catalog(settings.catalog_path.as_deref())?;
        let store = MemoryStore::with_catalog(catalog)?;
        let rng = match settings.seed {
            Some(seed) => {
                info!("using fixed random seed {seed}");
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };
        Ok(Self::new(Box::new(store), rng))
    }

    pub fn into_shared(self) -> SharedApp {
        Arc::new(Mutex::new(self))
    }

    /// Independent random source for one match session.
    pub fn fork_rng(&mut self) -> StdRng {
        StdRng::seed_from_u64(self.rng.r#gen())
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub fn create_user(&mut self, username: &str) -> Result<User> {
        self.store.create_user(username).log_storage("create user")
    }

    /// Guest account with its starting balance.
    pub fn create_guest(&mut self, username: &str) -> Result<User> {
        let guest = self.create_user(username)?;
        self.store
            .credit_coins(guest.id, GUEST_COINS)
            .log_storage("credit guest coins")
    }

    pub fn user(&self, user_id: UserId) -> Result<Option<User>> {
        self.store.user(user_id).log_storage("load user")
    }

    // -----------------------------------------------------------------------
    // Spins and collection
    // -----------------------------------------------------------------------

    pub fn spin_options(&self) -> SpinOptions {
        spin::spin_options()
    }

    /// `kind` is validated before anything is drawn.
    pub fn spin(&mut self, user_id: UserId, kind: &str) -> Result<SpinOutcome> {
        let kind: SpinKind = kind.parse()?;
        spin::resolve_spin(self.store.as_mut(), user_id, kind, &mut self.rng)
            .log_storage("perform spin")
    }

    pub fn recent_spins(&self, user_id: UserId, limit: Option<usize>) -> Result<Vec<RecentSpin>> {
        spin::recent_spins(self.store.as_ref(), user_id, limit).log_storage("load recent spins")
    }

    pub fn players(&self, user_id: UserId) -> Result<Vec<Player>> {
        spin::user_players(self.store.as_ref(), user_id).log_storage("load players")
    }

    // -----------------------------------------------------------------------
    // Teams
    // -----------------------------------------------------------------------

    pub fn teams(&self, user_id: UserId) -> Result<Vec<Team>> {
        team::user_teams(self.store.as_ref(), user_id).log_storage("load teams")
    }

    pub fn team(&self, user_id: UserId, team_id: TeamId) -> Result<Team> {
        team::owned_team(self.store.as_ref(), user_id, team_id).log_storage("load team")
    }

    pub fn create_team(&mut self, user_id: UserId, request: TeamRequest) -> Result<Team> {
        team::create_team(self.store.as_mut(), user_id, request).log_storage("create team")
    }

    pub fn update_team(&mut self, user_id: UserId, team_id: TeamId, request: TeamRequest) -> Result<Team> {
        team::update_team(self.store.as_mut(), user_id, team_id, request).log_storage("update team")
    }

    pub fn delete_team(&mut self, user_id: UserId, team_id: TeamId) -> Result<()> {
        team::delete_team(self.store.as_mut(), user_id, team_id).log_storage("delete team")
    }

    // -----------------------------------------------------------------------
    // Matches
    // -----------------------------------------------------------------------

    /// Pre-flight check before a client opens a live match.
    pub fn start_match(&self, user_id: UserId, team_id: TeamId) -> Result<TeamId> {
        self.team(user_id, team_id).map(|t| t.id)
    }

    /// Resolve the team and optional tournament for a live match.
    pub fn team_for_match(
        &self,
        user_id: UserId,
        team_id: TeamId,
        link: Option<TournamentLink>,
    ) -> Result<Team> {
        let team = self.team(user_id, team_id)?;
        if let Some(link) = link {
            self.store
                .tournament(link.tournament_id)
                .log_storage("load tournament")?
                .ok_or_else(|| DraftError::not_found("Tournament"))?;
        }
        Ok(team)
    }

    pub fn save_match(&mut self, record: NewMatch) -> Result<MatchRecord> {
        let saved = self.store.insert_match(record).log_storage("save match")?;
        info!(
            "match {} saved for user {}: {}-{}",
            saved.id, saved.user_id, saved.user_score, saved.opponent_score
        );
        Ok(saved)
    }

    pub fn matches(&self, user_id: UserId) -> Result<Vec<MatchRecord>> {
        matches::match_history(self.store.as_ref(), user_id).log_storage("load matches")
    }

    pub fn match_details(&self, user_id: UserId, match_id: MatchId) -> Result<MatchRecord> {
        matches::match_details(self.store.as_ref(), user_id, match_id).log_storage("load match")
    }

    // -----------------------------------------------------------------------
    // Tournaments
    // -----------------------------------------------------------------------

    pub fn create_tournament(&mut self, request: CreateTournament) -> Result<Tournament> {
        tournament::create_tournament(self.store.as_mut(), request).log_storage("create tournament")
    }

    /// Unrecognised status strings list everything.
    pub fn tournaments(&self, status: Option<&str>) -> Result<Vec<Tournament>> {
        let status = status.and_then(|s| s.parse::<TournamentStatus>().ok());
        tournament::list_tournaments(self.store.as_ref(), status).log_storage("load tournaments")
    }

    pub fn tournament(&self, tournament_id: TournamentId) -> Result<TournamentDetails> {
        tournament::tournament_details(self.store.as_ref(), tournament_id)
            .log_storage("load tournament")
    }

    pub fn join_tournament(
        &mut self,
        user_id: UserId,
        tournament_id: TournamentId,
        team_id: TeamId,
    ) -> Result<Participant> {
        tournament::join_tournament(self.store.as_mut(), user_id, tournament_id, team_id)
            .log_storage("join tournament")
    }

    pub fn leave_tournament(&mut self, user_id: UserId, tournament_id: TournamentId) -> Result<()> {
        tournament::leave_tournament(self.store.as_mut(), user_id, tournament_id)
            .log_storage("leave tournament")
    }

    pub fn start_tournament(&mut self, tournament_id: TournamentId) -> Result<Bracket> {
        tournament::start_tournament(self.store.as_mut(), tournament_id, &mut self.rng)
            .log_storage("start tournament")
    }

    pub fn record_tournament_result(
        &mut self,
        tournament_id: TournamentId,
        round: u32,
        position: u32,
        winner: ParticipantId,
        match_id: MatchId,
    ) -> Result<Bracket> {
        tournament::record_match_result(
            self.store.as_mut(),
            tournament_id,
            round,
            position,
            winner,
            match_id,
        )
        .log_storage("record tournament result")
    }
}
