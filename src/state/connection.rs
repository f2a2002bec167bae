use crate::app::SharedApp;
use crate::state::messages::{
    AUTH_SUCCESS_TEXT, CONNECTED_TEXT, ClientMessage, INVALID_FORMAT_TEXT, ServerMessage,
    TEAM_FORBIDDEN_TEXT, TEAM_NOT_FOUND_TEXT, USER_MISMATCH_TEXT, USER_NOT_FOUND_TEXT,
    parse_client_message,
};
use crate::state::session::MatchSession;
use crate::state::ticker::MatchTicker;
use draft_engine::matches::TournamentLink;
use draft_engine::{DraftError, TeamId, TournamentId, UserId};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{accept_async, tungstenite::Message};

const OUTBOUND_CAPACITY: usize = 64;

/// A match ticking on its own task, with its own outbound queue. Dropping it
/// aborts the task and discards anything it queued but was not yet sent.
struct RunningMatch {
    task: JoinHandle<()>,
    updates: mpsc::Receiver<ServerMessage>,
}

impl Drop for RunningMatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Next message from the current match, or never when none is running.
async fn next_update(running: &mut Option<RunningMatch>) -> Option<ServerMessage> {
    match running {
        Some(running) => running.updates.recv().await,
        None => std::future::pending().await,
    }
}

/// Per-connection state. At most one match runs at a time.
struct Connection {
    peer: SocketAddr,
    app: SharedApp,
    tick: Duration,
    authenticated: Option<UserId>,
    running: Option<RunningMatch>,
}

impl Connection {
    async fn handle_text(&mut self, text: &str) -> Vec<ServerMessage> {
        match parse_client_message(text) {
            Ok(ClientMessage::Authenticate { user_id }) => vec![self.authenticate(user_id).await],
            Ok(ClientMessage::StartMatch { user_id, team_id, tournament_id, round }) => {
                self.start_match(user_id, team_id, tournament_id, round).await
            }
            Err(failure) => {
                debug!("{}: rejected frame: {failure:?}", self.peer);
                vec![failure.reply()]
            }
        }
    }

    async fn authenticate(&mut self, user_id: UserId) -> ServerMessage {
        let user = self.app.lock().await.user(user_id);
        match user {
            Ok(Some(user)) => {
                info!("{} authenticated as {}", self.peer, user.username);
                self.authenticated = Some(user_id);
                ServerMessage::AuthSuccess { message: AUTH_SUCCESS_TEXT.to_string() }
            }
            Ok(None) => ServerMessage::error(USER_NOT_FOUND_TEXT),
            Err(e) => ServerMessage::error(e.public_message("Authentication failed")),
        }
    }

    async fn start_match(
        &mut self,
        user_id: UserId,
        team_id: TeamId,
        tournament_id: Option<TournamentId>,
        round: Option<u32>,
    ) -> Vec<ServerMessage> {
        if self.authenticated.is_some_and(|id| id != user_id) {
            return vec![ServerMessage::error(USER_MISMATCH_TEXT)];
        }

        let link = tournament_id.map(|tournament_id| TournamentLink { tournament_id, round });
        let (team, rng) = {
            let mut app = self.app.lock().await;
            match app.team_for_match(user_id, team_id, link) {
                Ok(team) => (team, app.fork_rng()),
                Err(e) => return vec![start_failure(&e)],
            }
        };

        let session = MatchSession::begin(user_id, team, link, rng);
        let opening = session.opening_messages();
        let (tx, updates) = mpsc::channel(OUTBOUND_CAPACITY);
        let ticker = MatchTicker::new(session, self.app.clone(), tx, self.tick);
        let task = tokio::spawn(ticker.run());
        if self.running.replace(RunningMatch { task, updates }).is_some() {
            info!("{}: replaced running match", self.peer);
        }
        info!("{}: user {user_id} kicked off with team {team_id}", self.peer);
        opening
    }
}

fn start_failure(e: &DraftError) -> ServerMessage {
    match e {
        DraftError::NotFound(message) if message == TEAM_NOT_FOUND_TEXT => {
            ServerMessage::error(TEAM_NOT_FOUND_TEXT)
        }
        DraftError::Forbidden(_) => ServerMessage::error(TEAM_FORBIDDEN_TEXT),
        other => ServerMessage::error(other.public_message("Failed to start match")),
    }
}

async fn send<S>(write: &mut S, message: &ServerMessage) -> anyhow::Result<()>
where
    S: futures_util::sink::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let text = serde_json::to_string(message)?;
    write.send(Message::Text(text.into())).await?;
    Ok(())
}

pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    app: SharedApp,
    tick: Duration,
) -> anyhow::Result<()> {
    let ws = accept_async(stream).await?;
    let (mut write, mut read) = ws.split();
    let mut connection = Connection {
        peer,
        app,
        tick,
        authenticated: None,
        running: None,
    };

    send(&mut write, &ServerMessage::Connected { message: CONNECTED_TEXT.to_string() }).await?;

    loop {
        tokio::select! {
            inbound = read.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        for reply in connection.handle_text(&text).await {
                            send(&mut write, &reply).await?;
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        send(&mut write, &ServerMessage::error(INVALID_FORMAT_TEXT)).await?;
                    }
                    Some(Ok(Message::Ping(_))) => {}
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Frame(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => return Err(e.into()),
                }
            }
            update = next_update(&mut connection.running) => {
                match update {
                    Some(message) => send(&mut write, &message).await?,
                    // Ticker finished and everything it queued has been sent.
                    None => connection.running = None,
                }
            }
        }
    }

    if connection.running.as_ref().is_some_and(|m| !m.task.is_finished()) {
        warn!("{peer} left mid-match, discarding it");
    }
    debug!("{peer} closed");
    Ok(())
}
