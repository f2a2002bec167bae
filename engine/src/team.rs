use crate::store::Store;
use crate::{DraftError, Formation, NewTeam, PlayStyle, Player, PlayerId, Result, Team, TeamId, UserId};
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};

pub const MIN_TEAM_NAME: usize = 3;
pub const MAX_TEAM_NAME: usize = 30;
pub const SQUAD_SIZE: usize = 11;

/// Create/update body. `players` are collection player ids in lineup order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRequest {
    pub name: String,
    pub formation: Formation,
    pub play_style: PlayStyle,
    pub players: Vec<PlayerId>,
}

impl TeamRequest {
    fn validate_shape(&self) -> Result<()> {
        let name_len = self.name.chars().count();
        if !(MIN_TEAM_NAME..=MAX_TEAM_NAME).contains(&name_len) {
            return Err(DraftError::Validation(format!(
                "Team name must be between {MIN_TEAM_NAME} and {MAX_TEAM_NAME} characters"
            )));
        }
        if self.players.len() != SQUAD_SIZE {
            return Err(DraftError::Validation(format!(
                "A team needs exactly {SQUAD_SIZE} players, got {}",
                self.players.len()
            )));
        }
        Ok(())
    }
}

/// Snapshot the requested players out of the user's collection, keeping the
/// request order.
fn resolve_squad(store: &dyn Store, user_id: UserId, ids: &[PlayerId]) -> Result<Vec<Player>> {
    let owned = store.collection(user_id)?;
    ids.iter()
        .map(|id| {
            owned.iter().find(|p| p.id == *id).cloned().ok_or_else(|| {
                DraftError::Validation(format!("Player with ID {id} not found in your collection"))
            })
        })
        .collect()
}

/// Load a team, 404 before 403.
pub fn owned_team(store: &dyn Store, user_id: UserId, team_id: TeamId) -> Result<Team> {
    let team = store
        .team(team_id)?
        .ok_or_else(|| DraftError::not_found("Team"))?;
    if team.user_id != user_id {
        return Err(DraftError::Forbidden(
            "You do not have access to this team".into(),
        ));
    }
    Ok(team)
}

pub fn user_teams(store: &dyn Store, user_id: UserId) -> Result<Vec<Team>> {
    store.user_teams(user_id)
}

pub fn create_team(store: &mut dyn Store, user_id: UserId, request: TeamRequest) -> Result<Team> {
    request.validate_shape()?;
    let players = resolve_squad(store, user_id, &request.players)?;
    let team = store.insert_team(NewTeam {
        user_id,
        name: request.name,
        formation: request.formation,
        play_style: request.play_style,
        players,
    })?;
    info!("user {user_id} created team {} '{}'", team.id, team.name);
    Ok(team)
}

pub fn update_team(
    store: &mut dyn Store,
    user_id: UserId,
    team_id: TeamId,
    request: TeamRequest,
) -> Result<Team> {
    let existing = owned_team(store, user_id, team_id)?;
    request.validate_shape()?;
    let players = resolve_squad(store, user_id, &request.players)?;
    store.replace_team(Team {
        name: request.name,
        formation: request.formation,
        play_style: request.play_style,
        players,
        updated_at: Utc::now(),
        ..existing
    })
}

pub fn delete_team(store: &mut dyn Store, user_id: UserId, team_id: TeamId) -> Result<()> {
    owned_team(store, user_id, team_id)?;
    store.delete_team(team_id)?;
    info!("user {user_id} deleted team {team_id}");
    Ok(())
}
