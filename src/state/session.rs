use crate::state::messages::ServerMessage;
use chrono::{DateTime, Utc};
use draft_engine::cpu::{CpuTeam, generate_cpu_team};
use draft_engine::draw::chance;
use draft_engine::match_state::{EVENT_CHANCE, MatchState};
use draft_engine::matches::{NewMatch, TournamentLink};
use draft_engine::simulation::{MatchEvent, simulate_event};
use draft_engine::{Team, UserId};
use rand::rngs::StdRng;

/// Result of advancing a session by one simulated minute.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    Running {
        event: Option<MatchEvent>,
        state: MatchState,
    },
    Finished(MatchState),
}

impl Tick {
    /// Outbound messages for this minute. The final minute produces none;
    /// `match_end` is sent once the result has been saved.
    pub fn messages(self) -> Vec<ServerMessage> {
        match self {
            Tick::Running { event: Some(event), state } => vec![
                ServerMessage::MatchEvent { event, state: state.clone() },
                ServerMessage::MatchUpdate { state },
            ],
            Tick::Running { event: None, state } => vec![ServerMessage::MatchUpdate { state }],
            Tick::Finished(_) => Vec::new(),
        }
    }
}

/// One live match: the user's side, its synthesized opponent and the running
/// state. Owned by exactly one ticker task.
pub struct MatchSession {
    user_id: UserId,
    team: Team,
    cpu: CpuTeam,
    state: MatchState,
    link: Option<TournamentLink>,
    rng: StdRng,
    started_at: DateTime<Utc>,
}

impl MatchSession {
    pub fn begin(user_id: UserId, team: Team, link: Option<TournamentLink>, mut rng: StdRng) -> Self {
        let cpu = generate_cpu_team(&team, &mut rng);
        Self {
            user_id,
            team,
            cpu,
            state: MatchState::new(),
            link,
            rng,
            started_at: Utc::now(),
        }
    }

    /// `match_start` followed by the kick-off state.
    pub fn opening_messages(&self) -> Vec<ServerMessage> {
        vec![
            ServerMessage::MatchStart {
                user_team: self.team.clone(),
                cpu_team: self.cpu.clone(),
            },
            ServerMessage::MatchUpdate { state: self.state.clone() },
        ]
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn tick(&mut self) -> Tick {
        if self.state.finished || self.state.advance_minute() {
            self.state.finish();
            return Tick::Finished(self.state.clone());
        }

        let event = if chance(EVENT_CHANCE, &mut self.rng) {
            let user_attacking = self.state.user_attacking(&mut self.rng);
            let event = simulate_event(
                (&self.team).into(),
                (&self.cpu).into(),
                self.state.minute,
                user_attacking,
                &mut self.rng,
            );
            self.state.apply_event(&event, &mut self.rng);
            Some(event)
        } else {
            None
        };

        Tick::Running { event, state: self.state.clone() }
    }

    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }

    /// Persistable record of the final state.
    pub fn to_record(&self) -> NewMatch {
        NewMatch::from_final_state(self.user_id, &self.team, &self.cpu, &self.state, self.link)
    }
}
