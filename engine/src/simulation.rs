//! Per-minute match events.
//!
//! [`simulate_event`] is pure apart from its random draws: it never touches
//! match state. The session driver owns the state and applies the event.

use crate::cpu::CpuTeam;
use crate::draw::pick;
use crate::{PlayStyle, Player, Team};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const BASE_GOAL_CHANCE: f64 = 0.1;
pub const RATING_WEIGHT: f64 = 0.01;
pub const MIN_GOAL_CHANCE: f64 = 0.05;
pub const MAX_GOAL_CHANCE: f64 = 0.40;
pub const MISS_WIDTH: f64 = 0.30;
pub const DEFENSE_WIDTH: f64 = 0.30;

const GOAL_LINES: [&str; 5] = [
    "GOAL! {scorer} buries it in the bottom corner!",
    "{scorer} lets fly from distance and it flies in! GOAL!",
    "Ice cold from {scorer}, who rounds the keeper and scores!",
    "GOAL! {scorer} gets on the end of the cross and heads home!",
    "The move of the match, finished off by {scorer}! GOAL!",
];

const MISS_LINES: [&str; 5] = [
    "{player} pulls the shot wide of the far post.",
    "The keeper gets down well to keep out {player}'s effort!",
    "{player} leans back and skies it over the bar.",
    "Off the crossbar! {player} is denied by the woodwork!",
    "{player} had all the time in the world but snatched at it.",
];

const DEFENSE_LINES: [&str; 5] = [
    "{player} steps across and clears the danger.",
    "A perfectly timed sliding tackle from {player}!",
    "{player} marshals the back line and the attack fizzles out.",
    "{player} reads it early and intercepts the through ball.",
    "Last-ditch block from {player}, that was a certain goal!",
];

const POSSESSION_LINES: [&str; 5] = [
    "{player} drops deep to collect and recycle possession.",
    "Neat and tidy on the ball from {player}.",
    "One-twos all over the pitch with {player} at the centre of it.",
    "{player} is dictating the tempo now.",
    "Patient build-up, {player} probing for an opening.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Goal,
    Miss,
    Defense,
    Possession,
}

impl EventKind {
    fn lines(&self) -> &'static [&'static str] {
        match self {
            EventKind::Goal => &GOAL_LINES,
            EventKind::Miss => &MISS_LINES,
            EventKind::Defense => &DEFENSE_LINES,
            EventKind::Possession => &POSSESSION_LINES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TeamSide {
    User,
    Cpu,
}

impl TeamSide {
    pub fn opponent(self) -> Self {
        match self {
            TeamSide::User => TeamSide::Cpu,
            TeamSide::Cpu => TeamSide::User,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchEvent {
    pub minute: u8,
    pub event_type: EventKind,
    pub commentary: String,
    /// Scorer, shooter, defender or ball-carrier depending on the kind.
    pub player: Player,
    /// Side credited with the event. For defensive actions this is the
    /// defending side.
    pub team: TeamSide,
}

/// Borrowed view of one side of a match.
#[derive(Debug, Clone, Copy)]
pub struct Lineup<'a> {
    pub players: &'a [Player],
    pub play_style: PlayStyle,
}

impl<'a> From<&'a Team> for Lineup<'a> {
    fn from(team: &'a Team) -> Self {
        Lineup { players: &team.players, play_style: team.play_style }
    }
}

impl<'a> From<&'a CpuTeam> for Lineup<'a> {
    fn from(team: &'a CpuTeam) -> Self {
        Lineup { players: &team.players, play_style: team.play_style }
    }
}

/// Matchup bonus for the attacking style against the defending style.
pub fn style_modifier(attacking: PlayStyle, defending: PlayStyle) -> f64 {
    match (attacking, defending) {
        (PlayStyle::CounterAttack, PlayStyle::HighPress) => 0.10,
        (PlayStyle::TikiTaka, PlayStyle::CounterAttack) => 0.05,
        _ => 0.0,
    }
}

pub fn goal_chance(
    attacker_overall: u8,
    defender_overall: u8,
    attacking: PlayStyle,
    defending: PlayStyle,
) -> f64 {
    let differential = f64::from(attacker_overall) - f64::from(defender_overall);
    let chance = BASE_GOAL_CHANCE + RATING_WEIGHT * differential + style_modifier(attacking, defending);
    chance.clamp(MIN_GOAL_CHANCE, MAX_GOAL_CHANCE)
}

/// Cumulative thresholds: goal, then 0.30 of miss, then 0.30 of defense.
pub fn classify(roll: f64, goal_chance: f64) -> EventKind {
    if roll < goal_chance {
        EventKind::Goal
    } else if roll < goal_chance + MISS_WIDTH {
        EventKind::Miss
    } else if roll < goal_chance + MISS_WIDTH + DEFENSE_WIDTH {
        EventKind::Defense
    } else {
        EventKind::Possession
    }
}

pub fn format_commentary(template: &str, player_name: &str) -> String {
    template
        .replace("{scorer}", player_name)
        .replace("{player}", player_name)
}

pub fn simulate_event<R>(
    user: Lineup<'_>,
    cpu: Lineup<'_>,
    minute: u8,
    user_attacking: bool,
    rng: &mut R,
) -> MatchEvent
where
    R: Rng + ?Sized,
{
    let (attacking, defending, attacking_side) = if user_attacking {
        (user, cpu, TeamSide::User)
    } else {
        (cpu, user, TeamSide::Cpu)
    };

    let attacker = pick(attacking.players, rng);
    let defender = pick(defending.players, rng);

    let chance = goal_chance(
        attacker.overall,
        defender.overall,
        attacking.play_style,
        defending.play_style,
    );
    let kind = classify(rng.r#gen::<f64>(), chance);

    let (player, team) = match kind {
        EventKind::Defense => (defender, attacking_side.opponent()),
        _ => (attacker, attacking_side),
    };
    let template = pick(kind.lines(), rng);

    MatchEvent {
        minute,
        event_type: kind,
        commentary: format_commentary(template, &player.name),
        player: player.clone(),
        team,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::scaled_cpu_team;
    use crate::fixtures::team;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn even_ratings_give_the_base_chance() {
        let chance = goal_chance(80, 80, PlayStyle::TotalFootball, PlayStyle::TotalFootball);
        assert!((chance - 0.1).abs() < 1e-9);
    }

    #[test]
    fn style_pairings() {
        assert_eq!(style_modifier(PlayStyle::CounterAttack, PlayStyle::HighPress), 0.10);
        assert_eq!(style_modifier(PlayStyle::TikiTaka, PlayStyle::CounterAttack), 0.05);
        assert_eq!(style_modifier(PlayStyle::HighPress, PlayStyle::CounterAttack), 0.0);
        assert_eq!(style_modifier(PlayStyle::TikiTaka, PlayStyle::TikiTaka), 0.0);

        let chance = goal_chance(80, 80, PlayStyle::CounterAttack, PlayStyle::HighPress);
        assert!((chance - 0.2).abs() < 1e-9);
    }

    #[test]
    fn chance_is_clamped() {
        assert_eq!(goal_chance(99, 1, PlayStyle::CounterAttack, PlayStyle::HighPress), MAX_GOAL_CHANCE);
        assert_eq!(goal_chance(1, 99, PlayStyle::TikiTaka, PlayStyle::TikiTaka), MIN_GOAL_CHANCE);
    }

    #[test]
    fn classification_thresholds() {
        assert_eq!(classify(0.0, 0.1), EventKind::Goal);
        assert_eq!(classify(0.099, 0.1), EventKind::Goal);
        assert_eq!(classify(0.1, 0.1), EventKind::Miss);
        assert_eq!(classify(0.399, 0.1), EventKind::Miss);
        assert_eq!(classify(0.41, 0.1), EventKind::Defense);
        assert_eq!(classify(0.699, 0.1), EventKind::Defense);
        assert_eq!(classify(0.71, 0.1), EventKind::Possession);
        assert_eq!(classify(0.999, 0.1), EventKind::Possession);
    }

    #[test]
    fn commentary_names_the_player() {
        assert_eq!(
            format_commentary("GOAL! {scorer} scores", "Kane"),
            "GOAL! Kane scores"
        );
        assert_eq!(format_commentary("{player} shoots", "Saka"), "Saka shoots");
    }

    #[test]
    fn defense_is_credited_to_the_defending_side() {
        let user = team(1, PlayStyle::TikiTaka, 85);
        let cpu = scaled_cpu_team(&user, 0.9);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut saw_defense = false;
        for minute in 1..=400u32 {
            let user_attacking = minute % 2 == 0;
            let event = simulate_event((&user).into(), (&cpu).into(), 10, user_attacking, &mut rng);
            let attacking_side = if user_attacking { TeamSide::User } else { TeamSide::Cpu };
            match event.event_type {
                EventKind::Defense => {
                    saw_defense = true;
                    assert_eq!(event.team, attacking_side.opponent());
                }
                _ => assert_eq!(event.team, attacking_side),
            }
            let from_cpu = event.player.name.starts_with("CPU ");
            assert_eq!(from_cpu, event.team == TeamSide::Cpu);
            assert!(event.commentary.contains(&event.player.name));
        }
        assert!(saw_defense);
    }

    #[test]
    fn every_kind_occurs_over_many_minutes() {
        let user = team(1, PlayStyle::CounterAttack, 85);
        let cpu = scaled_cpu_team(&user, 0.85);
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let mut kinds = std::collections::HashSet::new();
        for _ in 0..500 {
            kinds.insert(simulate_event((&user).into(), (&cpu).into(), 1, true, &mut rng).event_type);
        }
        assert_eq!(kinds.len(), 4);
    }

    proptest! {
        #[test]
        fn goal_chance_always_within_bounds(
            attacker in 0u8..=255,
            defender in 0u8..=255,
            a in 0usize..4,
            d in 0usize..4,
        ) {
            let chance = goal_chance(attacker, defender, PlayStyle::ALL[a], PlayStyle::ALL[d]);
            prop_assert!((MIN_GOAL_CHANCE..=MAX_GOAL_CHANCE).contains(&chance));
        }
    }
}
