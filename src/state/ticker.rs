use crate::app::SharedApp;
use crate::state::messages::ServerMessage;
use crate::state::session::{MatchSession, Tick};
use draft_engine::match_state::MatchState;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Drives one [`MatchSession`] at a fixed real-time period, one simulated
/// minute per tick. Stops when the match ends or the connection goes away.
pub struct MatchTicker {
    session: MatchSession,
    app: SharedApp,
    outbound: mpsc::Sender<ServerMessage>,
    period: Duration,
}

impl MatchTicker {
    pub fn new(
        session: MatchSession,
        app: SharedApp,
        outbound: mpsc::Sender<ServerMessage>,
        period: Duration,
    ) -> Self {
        Self { session, app, outbound, period }
    }

    pub async fn run(mut self) {
        let mut minutes = interval(self.period);
        // Skip the immediate first tick; kick-off was already sent.
        minutes.tick().await;

        loop {
            minutes.tick().await;
            match self.session.tick() {
                Tick::Finished(state) => {
                    self.finish(state).await;
                    return;
                }
                running => {
                    for message in running.messages() {
                        if self.outbound.send(message).await.is_err() {
                            debug!(
                                "connection for user {} closed mid-match, dropping it",
                                self.session.user_id()
                            );
                            return;
                        }
                    }
                }
            }
        }
    }

    async fn finish(self, state: MatchState) {
        let saved = self.app.lock().await.save_match(self.session.to_record());
        let message = match saved {
            Ok(record) => {
                info!(
                    "user {} finished a match {}-{} in {}s",
                    self.session.user_id(),
                    state.user_score,
                    state.cpu_score,
                    self.session.elapsed().num_seconds()
                );
                ServerMessage::MatchEnd { state, match_id: record.id }
            }
            Err(e) => {
                warn!("could not save match for user {}: {e}", self.session.user_id());
                ServerMessage::error(e.public_message("Failed to save match"))
            }
        };
        let _ = self.outbound.send(message).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{test_app, user_with_team};
    use draft_engine::match_state::MATCH_MINUTES;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[tokio::test]
    async fn plays_to_full_time_then_saves() {
        let mut app = test_app();
        let (user, team) = user_with_team(&mut app, "ticker");
        let app = app.into_shared();

        let session = MatchSession::begin(user, team, None, StdRng::seed_from_u64(8));
        let (tx, mut rx) = mpsc::channel(256);
        let handle = tokio::spawn(MatchTicker::new(session, app.clone(), tx, Duration::from_millis(1)).run());

        let mut updates = 0;
        let mut events = 0;
        let end = loop {
            match rx.recv().await.unwrap() {
                ServerMessage::MatchUpdate { .. } => updates += 1,
                ServerMessage::MatchEvent { .. } => events += 1,
                ServerMessage::MatchEnd { state, match_id } => break (state, match_id),
                other => panic!("unexpected {}", other.kind()),
            }
        };
        handle.await.unwrap();

        assert_eq!(updates, usize::from(MATCH_MINUTES) - 1);
        assert!(events > 0);
        let (state, match_id) = end;
        assert_eq!(state.minute, MATCH_MINUTES);
        assert!(state.finished);

        let saved = app.lock().await.match_details(user, match_id).unwrap();
        assert_eq!(saved.user_score, state.user_score);
        assert_eq!(saved.opponent_score, state.cpu_score);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn closed_connection_stops_without_saving() {
        let mut app = test_app();
        let (user, team) = user_with_team(&mut app, "leaver");
        let app = app.into_shared();

        let session = MatchSession::begin(user, team, None, StdRng::seed_from_u64(8));
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        MatchTicker::new(session, app.clone(), tx, Duration::from_millis(1)).run().await;

        assert!(app.lock().await.matches(user).unwrap().is_empty());
    }
}
