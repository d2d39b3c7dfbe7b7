mod action;
mod app;
mod app_state;
mod clipboard;
mod component;
mod components;
mod focus;
mod media_controls;
mod theme;
mod widgets;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use pctl_core::config::{CommitPolicy, Config};
use pctl_core::http::HttpTransport;
use pctl_core::Controller;

/// Terminal remote for a playerctl web backend.
#[derive(Debug, Parser)]
#[command(name = "pctl-remote", version, about)]
struct Args {
    /// Backend base URL, e.g. http://192.168.1.20:5000
    #[arg(long)]
    url: Option<String>,

    /// Player identifier to control (as listed by `playerctl --list-all`)
    #[arg(long)]
    player: Option<String>,

    /// When playlist edits are pushed: "batched" or "immediate"
    #[arg(long)]
    commit_policy: Option<CommitPolicy>,

    /// Do not register with the OS media controls
    #[arg(long)]
    no_media: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let data_dir = pctl_core::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("pctl.log");
    let ui_state_path = data_dir.join("ui_state.json");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // RUST_LOG overrides; keep HTTP client internals quiet by default.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("pctl-remote log: {}", log_path.display());

    tracing::info!("pctl-remote starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let mut config = Config::load().unwrap_or_default();
    let session = app::load_ui_session_state(&ui_state_path);

    if let Some(url) = args.url {
        config.server.base_url = url;
    }
    if let Some(player) = args.player.or(session.player.clone()) {
        config.player.default_player = player;
    }
    if let Some(policy) = args.commit_policy {
        config.playlist.commit_policy = policy;
    }
    if args.no_media {
        config.media.enabled = false;
    }
    tracing::info!(
        "backend {} player {:?} policy {:?}",
        config.server.base_url,
        config.player.default_player,
        config.playlist.commit_policy
    );

    // ── Transport ────────────────────────────────────────────────────────────
    let transport = Arc::new(HttpTransport::new(
        &config.server.base_url,
        Duration::from_millis(config.server.request_timeout_ms),
    )?);

    // ── Media controls ───────────────────────────────────────────────────────
    let (media_tx, media_rx) = tokio::sync::mpsc::unbounded_channel();
    let platform = media_controls::platform(&config.media, media_tx);

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let controller = Controller::new(&config, platform);
    let app = app::App::new(
        controller,
        transport,
        config.server.base_url.clone(),
        ui_state_path,
        session,
    );
    app.run(media_rx).await?;

    Ok(())
}
