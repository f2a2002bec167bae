use crate::app::SharedApp;
use crate::state::connection::handle_connection;
use log::{info, warn};
use std::time::Duration;
use tokio::net::TcpListener;

/// Accept loop. Each client gets its own task; one failing connection never
/// stops the listener.
pub async fn serve(listener: TcpListener, app: SharedApp, tick: Duration) -> anyhow::Result<()> {
    info!("listening on {}", listener.local_addr()?);

    loop {
        let (stream, peer) = listener.accept().await?;
        let app = app.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer, app, tick).await {
                warn!("client {peer} disconnected: {e}");
            }
        });
    }
}
