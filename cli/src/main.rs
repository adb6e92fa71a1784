mod demo;
mod relay;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use roomsync::api::{ApiError, BackendClient, RunOutcome};
use roomsync::broker::MemoryBroker;
use roomsync::chat::ChatError;
use roomsync::code::Language;
use roomsync::config::ConfigError;
use roomsync::presence::PresenceChange;
use roomsync::store::{ClientStore, StoreError, StoredKey};
use roomsync::transport::WsTransport;
use roomsync::{ChannelError, ChannelManager, RoomId, RoomSession, RoomUpdate, SessionCode, SyncConfig};
use tracing::{debug, info};

/// Lets the socket pump flush `leave` before the runtime shuts down.
const LEAVE_GRACE: Duration = Duration::from_millis(250);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error("no display name; pass --name, set ROOMSYNC_NAME, or run `roomsync profile set-name`")]
    MissingName,
    #[error("cannot read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("relay server failed: {0}")]
    Serve(#[source] std::io::Error),
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
    #[error("channel closed while waiting for {0}")]
    Closed(&'static str),
}

#[derive(Parser, Debug)]
#[command(name = "roomsync", about = "Collaborative interview room client")]
struct Cli {
    /// Display name announced to the room (falls back to the stored name).
    #[arg(long, env = "ROOMSYNC_NAME", global = true)]
    name: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Room(RoomCommand),
    Profile(ProfileCommand),
    /// Follow a room's code, chat and presence until Ctrl-C.
    Watch { room: RoomId },
    /// Publish a file's contents as the room's code.
    Code { room: RoomId, file: PathBuf },
    /// Send one chat message.
    Chat {
        room: RoomId,
        #[arg(required = true)]
        message: Vec<String>,
    },
    /// Run a file on the execution service.
    Run(RunArgs),
    /// Serve a local STOMP relay over WebSocket.
    Relay {
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },
    /// Two simulated participants over the in-process broker.
    Demo {
        #[arg(long)]
        room: Option<RoomId>,
    },
}

#[derive(Args, Debug)]
struct RoomCommand {
    #[command(subcommand)]
    command: RoomSubcommand,
}

#[derive(Subcommand, Debug)]
enum RoomSubcommand {
    /// Create an interview room and print its `room:access` code.
    Create,
    /// Join an interview room with a `room:access` code.
    Join { code: SessionCode },
    /// List rooms previously entered under the current name.
    History,
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Show,
    SetName {
        name: String,
    },
    Login {
        #[arg(long)]
        token: String,
        #[arg(long)]
        email: Option<String>,
    },
    Logout,
}

#[derive(Args, Debug)]
struct RunArgs {
    file: PathBuf,

    #[arg(long, default_value_t = Language::Python)]
    language: Language,

    #[arg(long, default_value = "")]
    input: String,

    /// Use the quick `/execute` endpoint (no stdin).
    #[arg(long, default_value_t = false)]
    quick: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "loaded .env");
    }

    let cli = Cli::parse();
    let config = SyncConfig::from_env()?;
    let mut store = ClientStore::load(&config.store_path)?;
    let api = BackendClient::new(&config.api_url);

    match cli.command {
        Command::Room(room) => run_room(&api, &store, cli.name, room).await,
        Command::Profile(profile) => run_profile(&mut store, profile),
        Command::Watch { room } => {
            let name = display_name(cli.name, &store)?;
            run_watch(&config, &api, &name, &room).await
        }
        Command::Code { room, file } => {
            let name = display_name(cli.name, &store)?;
            let text = read_file(&file).await?;
            run_code(&config, &name, &room, &text).await
        }
        Command::Chat { room, message } => {
            let name = display_name(cli.name, &store)?;
            run_chat(&config, &name, &room, &message.join(" ")).await
        }
        Command::Run(args) => run_program(&api, args).await,
        Command::Relay { bind } => run_relay(bind).await,
        Command::Demo { room } => run_demo(room.unwrap_or_else(RoomId::generate)).await,
    }
}

fn display_name(flag: Option<String>, store: &ClientStore) -> Result<String, CliError> {
    flag.filter(|n| !n.trim().is_empty())
        .or_else(|| store.get(StoredKey::Name).map(ToOwned::to_owned))
        .ok_or(CliError::MissingName)
}

async fn read_file(path: &Path) -> Result<String, CliError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::ReadFile { path: path.to_owned(), source })
}

// =============================================================================
// REST
// =============================================================================

async fn run_room(
    api: &BackendClient,
    store: &ClientStore,
    name: Option<String>,
    room: RoomCommand,
) -> Result<(), CliError> {
    match room.command {
        RoomSubcommand::Create => {
            let code = api.create_room().await?;
            println!("{code}");
            eprintln!("share this code; join with `roomsync room join {code}`");
            Ok(())
        }
        RoomSubcommand::Join { code } => {
            let name = display_name(name, store)?;
            api.join_room(&code, &name).await?;
            api.save_session(&code.room_code, &name).await?;
            println!("joined {} as {name}", code.room_code);
            Ok(())
        }
        RoomSubcommand::History => {
            let name = display_name(name, store)?;
            for session in api.sessions(&name).await? {
                println!("{}\t{}", session.room_id, session.created_at.as_deref().unwrap_or("-"));
            }
            Ok(())
        }
    }
}

async fn run_program(api: &BackendClient, args: RunArgs) -> Result<(), CliError> {
    let code = read_file(&args.file).await?;
    if args.quick {
        println!("{}", api.execute(&code, args.language).await?);
        return Ok(());
    }
    match api.run(&code, args.language, &args.input).await? {
        RunOutcome::Output(output) => println!("{output}"),
        RunOutcome::Error(error) => eprintln!("{error}"),
    }
    Ok(())
}

fn run_profile(store: &mut ClientStore, profile: ProfileCommand) -> Result<(), CliError> {
    match profile.command {
        ProfileSubcommand::Show => {
            for key in StoredKey::ALL {
                let value = match key {
                    StoredKey::Token => store.get(key).map(|_| "(set)"),
                    _ => store.get(key),
                };
                println!("{key}: {}", value.unwrap_or("-"));
            }
            return Ok(());
        }
        ProfileSubcommand::SetName { name } => store.set(StoredKey::Name, name.trim()),
        ProfileSubcommand::Login { token, email } => {
            store.set(StoredKey::Token, &token);
            if let Some(email) = email {
                store.set(StoredKey::Email, &email);
            }
        }
        ProfileSubcommand::Logout => store.logout(),
    }
    store.save()?;
    info!(path = %store.path().display(), "profile saved");
    Ok(())
}

// =============================================================================
// REALTIME
// =============================================================================

fn room_session(config: &SyncConfig, name: &str, room: &RoomId) -> RoomSession {
    let channel = ChannelManager::with_config(WsTransport, &config.ws_url, name, config);
    RoomSession::new(channel, room, Language::default())
}

async fn run_watch(config: &SyncConfig, api: &BackendClient, name: &str, room: &RoomId) -> Result<(), CliError> {
    let mut session = room_session(config, name, room);
    if let Some(every) = config.refresh_interval {
        session = session.with_refresh(Arc::new(api.clone()), every);
    }
    session.join().await?;
    eprintln!("watching {room} as {name}; Ctrl-C to leave");

    loop {
        tokio::select! {
            update = session.next_update() => {
                let Some(update) = update else { break };
                println!("{}", describe(&update));
            }
            _ = tokio::signal::ctrl_c() => {
                session.leave();
                tokio::time::sleep(LEAVE_GRACE).await;
                break;
            }
        }
    }
    Ok(())
}

async fn run_code(config: &SyncConfig, name: &str, room: &RoomId, text: &str) -> Result<(), CliError> {
    let mut session = room_session(config, name, room);
    session.join().await?;
    if session.edit_code(text) {
        await_own(&mut session, config.connect_timeout, "code echo", |u| {
            matches!(u, RoomUpdate::CodeChanged { from, .. } if from == name)
        })
        .await?;
        println!("published {} bytes to {room}", text.len());
    } else {
        println!("nothing to publish");
    }
    session.leave();
    tokio::time::sleep(LEAVE_GRACE).await;
    Ok(())
}

async fn run_chat(config: &SyncConfig, name: &str, room: &RoomId, message: &str) -> Result<(), CliError> {
    let mut session = room_session(config, name, room);
    session.join().await?;
    if session.send_chat(message)? {
        await_own(&mut session, config.connect_timeout, "chat echo", |u| {
            matches!(u, RoomUpdate::Chat(m) if m.from == name)
        })
        .await?;
    }
    session.leave();
    tokio::time::sleep(LEAVE_GRACE).await;
    Ok(())
}

async fn await_own(
    session: &mut RoomSession,
    limit: Duration,
    what: &'static str,
    pred: impl Fn(&RoomUpdate) -> bool,
) -> Result<(), CliError> {
    let wait = async {
        while let Some(update) = session.next_update().await {
            if pred(&update) {
                return Ok(());
            }
            debug!(?update, "skipped while waiting");
        }
        Err(CliError::Closed(what))
    };
    tokio::time::timeout(limit, wait).await.map_err(|_| CliError::Timeout(what))?
}

/// One line (or block) of `watch` output.
fn describe(update: &RoomUpdate) -> String {
    match update {
        RoomUpdate::Connected => "* connected".to_owned(),
        RoomUpdate::CodeChanged { from, text } => format!("[code] {from}:\n{text}"),
        RoomUpdate::Chat(message) => format!("[chat] {}: {}", message.from, message.content),
        RoomUpdate::Presence(PresenceChange::Joined(name)) => format!("+ {name} joined"),
        RoomUpdate::Presence(PresenceChange::Left(name)) => format!("- {name} left"),
        RoomUpdate::Participants(names) => format!("participants: {}", names.join(", ")),
        RoomUpdate::Submitted { from, content } => format!("[submit] {from} submitted {} bytes", content.len()),
        RoomUpdate::Disconnected => "* disconnected".to_owned(),
        RoomUpdate::Error(reason) => format!("! {reason}"),
    }
}

// =============================================================================
// LOCAL
// =============================================================================

async fn run_relay(bind: SocketAddr) -> Result<(), CliError> {
    let listener = tokio::net::TcpListener::bind(bind).await.map_err(CliError::Serve)?;
    info!(%bind, "relay listening on /ws and /whiteboard");
    axum::serve(listener, relay::router(MemoryBroker::new())).await.map_err(CliError::Serve)
}

async fn run_demo(room: RoomId) -> Result<(), CliError> {
    let report = demo::run(room).await?;
    println!("room:          {}", report.room);
    println!("bob sees code: {}", report.code_seen);
    for line in &report.chat_seen {
        println!("bob sees chat: {line}");
    }
    println!("participants:  {}", report.participants.join(", "));
    println!("ops replayed:  {}", report.ops_replayed);
    println!("boards match:  {}", report.boards_match);
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
