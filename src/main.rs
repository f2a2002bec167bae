use env_logger::{Builder, Target};
use fut_draft::app::App;
use fut_draft::server::serve;
use fut_draft::state::app_settings::AppSettings;
use log::{info, warn};
use tokio::net::TcpListener;

const GUEST_USERNAME: &str = "guest";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if handle_cli_args() {
        return Ok(());
    }

    better_panic::install();
    init_logger();

    let settings = AppSettings::load();
    let mut app = App::from_settings(&settings)?;

    // Stand-in account until real sign-in exists.
    let guest = app.create_guest(GUEST_USERNAME)?;
    info!("guest account ready, user id {} with {} coins", guest.id, guest.coins);

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    let server = tokio::spawn(serve(listener, app.into_shared(), settings.tick));

    tokio::select! {
        result = server => {
            result??;
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupt received, shutting down");
        }
    }

    Ok(())
}

fn init_logger() {
    let mut builder = Builder::new();
    builder.target(Target::Stdout);
    builder.parse_filters(&AppSettings::log_filter());
    builder.init();
}

fn handle_cli_args() -> bool {
    let mut args = std::env::args().skip(1);
    let Some(arg) = args.next() else {
        return false;
    };

    match arg.as_str() {
        "-h" | "--help" => {
            println!("{}", usage_text());
            true
        }
        "-V" | "--version" => {
            println!("fut-draft {}", env!("CARGO_PKG_VERSION"));
            true
        }
        _ => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn usage_text() -> &'static str {
    "fut-draft - card-drafting football game server

Usage:
  fut-draft
  fut-draft --help
  fut-draft --version

Environment:
  FUT_BIND            WebSocket listen address (default 0.0.0.0:5000)
  FUT_TICK_MS         Milliseconds per simulated match minute (default 1000)
  FUT_CATALOG_JSON    Path to a player catalog JSON file (default: built-in catalog)
  FUT_LOG             Log filter, e.g. info or fut_draft=debug (default info)
  FUT_SEED            Fixed random seed for reproducible spins and matches"
}
