//! Spins: draw position / event / rating band, and turn a full draw into a card.

use crate::draw::pick;
use crate::store::{PlayerFilter, Store};
use crate::{DraftError, Event, NewSpin, OvrBand, Player, Position, Result, SpinRecord, UserId};
use log::{debug, error};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_RECENT_SPINS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpinKind {
    Position,
    Event,
    Ovr,
    All,
}

impl SpinKind {
    fn draws_position(self) -> bool {
        matches!(self, SpinKind::Position | SpinKind::All)
    }

    fn draws_event(self) -> bool {
        matches!(self, SpinKind::Event | SpinKind::All)
    }

    fn draws_band(self) -> bool {
        matches!(self, SpinKind::Ovr | SpinKind::All)
    }
}

impl FromStr for SpinKind {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "position" => Ok(SpinKind::Position),
            "event" => Ok(SpinKind::Event),
            "ovr" => Ok(SpinKind::Ovr),
            "all" => Ok(SpinKind::All),
            other => Err(DraftError::Validation(format!("Invalid spin type: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinOutcome {
    #[serde(rename = "type")]
    pub kind: SpinKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_result: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_result: Option<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ovr_result: Option<OvrBand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<Player>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinOptions {
    pub positions: Vec<Position>,
    pub events: Vec<Event>,
    pub ovr_ranges: Vec<OvrBand>,
}

pub fn spin_options() -> SpinOptions {
    SpinOptions {
        positions: Position::ALL.to_vec(),
        events: Event::ALL.to_vec(),
        ovr_ranges: OvrBand::ALL.to_vec(),
    }
}

/// Perform one spin for `user_id`.
///
/// Only an `All` spin can yield a player: first an exact match on all three
/// draws, then any player at the drawn position. Finding nobody is a normal
/// outcome with the three draws and no player.
pub fn resolve_spin<R>(
    store: &mut dyn Store,
    user_id: UserId,
    kind: SpinKind,
    rng: &mut R,
) -> Result<SpinOutcome>
where
    R: Rng + ?Sized,
{
    let mut outcome = SpinOutcome {
        kind,
        position_result: kind.draws_position().then(|| *pick(&Position::ALL, rng)),
        event_result: kind.draws_event().then(|| *pick(&Event::ALL, rng)),
        ovr_result: kind.draws_band().then(|| *pick(&OvrBand::ALL, rng)),
        player: None,
    };

    let (Some(position), Some(event), Some(band)) =
        (outcome.position_result, outcome.event_result, outcome.ovr_result)
    else {
        return Ok(outcome);
    };

    debug!("user {user_id} spun {position} / {event} / {band}");
    outcome.player = find_player(store, position, event, band, rng).inspect_err(|e| {
        error!("spin lookup failed for user {user_id}: {e}");
    })?;

    if let Some(player) = &outcome.player {
        store.add_to_collection(user_id, player.id)?;
        store.record_spin(NewSpin {
            user_id,
            player_id: player.id,
            position_result: position,
            event_result: event,
            ovr_result: band,
        })?;
        debug!("user {user_id} acquired {} ({})", player.name, player.overall);
    }
    Ok(outcome)
}

fn find_player<R>(
    store: &dyn Store,
    position: Position,
    event: Event,
    band: OvrBand,
    rng: &mut R,
) -> Result<Option<Player>>
where
    R: Rng + ?Sized,
{
    let exact = store.find_players(&PlayerFilter {
        position: Some(position),
        event: Some(event),
        overall: Some(band.bounds()),
    })?;
    if !exact.is_empty() {
        return Ok(Some(pick(&exact, rng).clone()));
    }

    debug!("no exact match, relaxing to any {position}");
    let relaxed = store.find_players(&PlayerFilter {
        position: Some(position),
        ..PlayerFilter::default()
    })?;
    if relaxed.is_empty() {
        debug!("no {position} in the catalog");
        return Ok(None);
    }
    Ok(Some(pick(&relaxed, rng).clone()))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentSpin {
    #[serde(flatten)]
    pub spin: SpinRecord,
    pub player: Option<Player>,
}

/// Newest first, joined with the acquired player.
pub fn recent_spins(
    store: &dyn Store,
    user_id: UserId,
    limit: Option<usize>,
) -> Result<Vec<RecentSpin>> {
    store
        .recent_spins(user_id, limit.unwrap_or(DEFAULT_RECENT_SPINS))?
        .into_iter()
        .map(|spin| {
            Ok(RecentSpin {
                player: store.player(spin.player_id)?,
                spin,
            })
        })
        .collect()
}

/// Every player the user has acquired, one element per acquisition.
pub fn user_players(store: &dyn Store, user_id: UserId) -> Result<Vec<Player>> {
    store.collection(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::new_player;
    use crate::store::MemoryStore;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn full_catalog() -> MemoryStore {
        let mut players = Vec::new();
        for position in Position::ALL {
            for event in Event::ALL {
                for band in OvrBand::ALL {
                    let (min, _) = band.bounds();
                    players.push(new_player(&format!("{position} {event} {band}"), position, event, min));
                }
            }
        }
        MemoryStore::with_catalog(players).unwrap()
    }

    #[test]
    fn single_draws_carry_one_result_and_no_player() {
        let mut store = full_catalog();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let outcome = resolve_spin(&mut store, 1, SpinKind::Position, &mut rng).unwrap();
        assert!(outcome.position_result.is_some());
        assert!(outcome.event_result.is_none() && outcome.ovr_result.is_none());
        assert!(outcome.player.is_none());

        let outcome = resolve_spin(&mut store, 1, SpinKind::Event, &mut rng).unwrap();
        assert!(outcome.event_result.is_some() && outcome.position_result.is_none());

        let outcome = resolve_spin(&mut store, 1, SpinKind::Ovr, &mut rng).unwrap();
        assert!(outcome.ovr_result.is_some() && outcome.event_result.is_none());

        assert!(user_players(&store, 1).unwrap().is_empty());
        assert!(store.recent_spins(1, 10).unwrap().is_empty());
    }

    #[test]
    fn full_spin_finds_an_exact_match_and_records_it() {
        let mut store = full_catalog();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let outcome = resolve_spin(&mut store, 7, SpinKind::All, &mut rng).unwrap();

        let player = outcome.player.clone().unwrap();
        assert_eq!(Some(player.position), outcome.position_result);
        assert_eq!(Some(player.event), outcome.event_result);
        assert!(outcome.ovr_result.unwrap().contains(player.overall));

        assert_eq!(user_players(&store, 7).unwrap(), vec![player.clone()]);
        let recent = recent_spins(&store, 7, None).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].player.as_ref(), Some(&player));
        assert_eq!(recent[0].spin.position_result, player.position);
    }

    #[test]
    fn falls_back_to_any_player_at_the_position() {
        // Every position present, but only as 70-rated HEROES cards.
        let catalog = Position::ALL
            .iter()
            .map(|p| new_player(&format!("Hero {p}"), *p, Event::Heroes, 70))
            .collect();
        let mut store = MemoryStore::with_catalog(catalog).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..20 {
            let outcome = resolve_spin(&mut store, 1, SpinKind::All, &mut rng).unwrap();
            let player = outcome.player.unwrap();
            assert_eq!(Some(player.position), outcome.position_result);
        }
        assert_eq!(user_players(&store, 1).unwrap().len(), 20);
    }

    #[test]
    fn empty_catalog_returns_the_draws_without_a_player() {
        let mut store = MemoryStore::new();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let outcome = resolve_spin(&mut store, 1, SpinKind::All, &mut rng).unwrap();
        assert!(outcome.player.is_none());
        assert!(outcome.position_result.is_some());
        assert!(outcome.event_result.is_some());
        assert!(outcome.ovr_result.is_some());
        assert!(store.recent_spins(1, 5).unwrap().is_empty());
    }

    #[test]
    fn recent_spins_default_to_five() {
        let mut store = full_catalog();
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        for _ in 0..8 {
            resolve_spin(&mut store, 1, SpinKind::All, &mut rng).unwrap();
        }
        let recent = recent_spins(&store, 1, None).unwrap();
        assert_eq!(recent.len(), DEFAULT_RECENT_SPINS);
        assert!(recent.windows(2).all(|w| w[0].spin.id > w[1].spin.id));
        assert_eq!(recent_spins(&store, 1, Some(2)).unwrap().len(), 2);
    }

    #[test]
    fn kind_parsing_and_wire_shape() {
        assert_eq!("ovr".parse::<SpinKind>().unwrap(), SpinKind::Ovr);
        assert!(matches!("wheel".parse::<SpinKind>(), Err(DraftError::Validation(_))));

        let outcome = SpinOutcome {
            kind: SpinKind::Position,
            position_result: Some(Position::Cam),
            event_result: None,
            ovr_result: None,
            player: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "position", "positionResult": "CAM" }));

        let options = serde_json::to_value(spin_options()).unwrap();
        assert_eq!(options["positions"].as_array().unwrap().len(), 10);
        assert_eq!(options["events"].as_array().unwrap().len(), 6);
        assert_eq!(options["ovrRanges"][0], "90+");
    }

    proptest! {
        #[test]
        fn full_spin_is_player_or_all_three_results(seed in any::<u64>(), sparse in any::<bool>()) {
            let mut store = if sparse {
                MemoryStore::with_catalog(vec![new_player("Lone Keeper", Position::Gk, Event::Icons, 92)]).unwrap()
            } else {
                full_catalog()
            };
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let outcome = resolve_spin(&mut store, 1, SpinKind::All, &mut rng).unwrap();
            let all_three = outcome.position_result.is_some()
                && outcome.event_result.is_some()
                && outcome.ovr_result.is_some();
            prop_assert!(all_three);
            if outcome.player.is_none() {
                prop_assert!(sparse);
                prop_assert_ne!(outcome.position_result, Some(Position::Gk));
            }
        }
    }
}
