//! Opponent synthesis: the CPU side is the user's own squad, rescaled.

use crate::{Formation, PlayStyle, Player, Team, average_overall};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const CPU_TEAM_NAME: &str = "CPU Team";
pub const CPU_NAME_PREFIX: &str = "CPU ";
pub const MIN_SCALE: f64 = 0.8;
pub const MAX_SCALE: f64 = 1.0;
pub const MIN_CPU_OVERALL: u8 = 70;
pub const MAX_CPU_OVERALL: u8 = 99;

/// Lives for one match; persisted only as part of the match record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuTeam {
    pub name: String,
    pub formation: Formation,
    pub play_style: PlayStyle,
    /// `floor(user average overall * scale)`.
    pub strength: u8,
    pub players: Vec<Player>,
}

pub fn generate_cpu_team<R>(team: &Team, rng: &mut R) -> CpuTeam
where
    R: Rng + ?Sized,
{
    let scale = rng.gen_range(MIN_SCALE..=MAX_SCALE);
    scaled_cpu_team(team, scale)
}

pub fn scaled_cpu_team(team: &Team, scale: f64) -> CpuTeam {
    let strength = (average_overall(&team.players) * scale).floor().clamp(0.0, 99.0) as u8;
    CpuTeam {
        name: CPU_TEAM_NAME.to_owned(),
        formation: team.formation,
        play_style: team.play_style,
        strength,
        players: team
            .players
            .iter()
            .map(|p| Player {
                name: format!("{CPU_NAME_PREFIX}{}", p.name),
                overall: scale_overall(p.overall, scale),
                ..p.clone()
            })
            .collect(),
    }
}

pub fn scale_overall(overall: u8, scale: f64) -> u8 {
    let scaled = (f64::from(overall) * scale).floor();
    scaled.clamp(f64::from(MIN_CPU_OVERALL), f64::from(MAX_CPU_OVERALL)) as u8
}
