use draft_engine::cpu::CpuTeam;
use draft_engine::match_state::MatchState;
use draft_engine::simulation::MatchEvent;
use draft_engine::{MatchId, Team, TeamId, TournamentId, UserId};
use serde::{Deserialize, Serialize};

pub const CONNECTED_TEXT: &str = "Connected to FUT Draft WebSocket server";
pub const AUTH_SUCCESS_TEXT: &str = "Authentication successful";
pub const UNKNOWN_TYPE_TEXT: &str = "Unknown message type";
pub const INVALID_FORMAT_TEXT: &str = "Invalid message format";
pub const TEAM_NOT_FOUND_TEXT: &str = "Team not found";
pub const TEAM_FORBIDDEN_TEXT: &str = "Not authorized to use this team";
pub const USER_NOT_FOUND_TEXT: &str = "User not found";
pub const USER_MISMATCH_TEXT: &str = "User does not match this connection";

/// Client → server envelope, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    Authenticate {
        user_id: UserId,
    },
    StartMatch {
        user_id: UserId,
        team_id: TeamId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tournament_id: Option<TournamentId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        round: Option<u32>,
    },
}

/// Server → client envelope, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Connected {
        message: String,
    },
    AuthSuccess {
        message: String,
    },
    MatchStart {
        user_team: Team,
        cpu_team: CpuTeam,
    },
    MatchUpdate {
        state: MatchState,
    },
    MatchEvent {
        event: MatchEvent,
        state: MatchState,
    },
    MatchEnd {
        state: MatchState,
        match_id: MatchId,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error { message: message.into() }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Connected { .. } => "connected",
            ServerMessage::AuthSuccess { .. } => "auth_success",
            ServerMessage::MatchStart { .. } => "match_start",
            ServerMessage::MatchUpdate { .. } => "match_update",
            ServerMessage::MatchEvent { .. } => "match_event",
            ServerMessage::MatchEnd { .. } => "match_end",
            ServerMessage::Error { .. } => "error",
        }
    }
}

/// Why an inbound frame was not understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFailure {
    /// Not JSON at all.
    InvalidFormat,
    /// JSON, but not a known message shape.
    UnknownType,
}

impl ParseFailure {
    pub fn reply(self) -> ServerMessage {
        match self {
            ParseFailure::InvalidFormat => ServerMessage::error(INVALID_FORMAT_TEXT),
            ParseFailure::UnknownType => ServerMessage::error(UNKNOWN_TYPE_TEXT),
        }
    }
}

pub fn parse_client_message(text: &str) -> Result<ClientMessage, ParseFailure> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|_| ParseFailure::InvalidFormat)?;
    serde_json::from_value(value).map_err(|_| ParseFailure::UnknownType)
}
