//! A command line client for tabletop sessions.
//!
//! Connects to the per-concern signaling servers, joins a table, and
//! exposes the session operations as an interactive prompt. State changes
//! pushed by the servers are printed as they arrive.

use anyhow::Result;
use pico_args::Arguments;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};

use tabletop::rtc::StoredCapabilities;
use tabletop::{
    Endpoints, GameKind, SessionOrchestrator, TableState, UiEvent, UiEvents, shared_media,
};

const HELP: &str = "\
Connect to a tabletop session

USAGE:
  tt_client [OPTIONS]

OPTIONS:
  --table ID            Table to join on startup
  --username NAME       Username to join as  [default: login name]

FLAGS:
  -h, --help            Print help information

COMMANDS (at the prompt):
  join <table>          Join a table, leaving the current one
  leave                 Leave the current table
  game                  Start a snake game on the table
  sub                   Toggle the media subscription
  mute                  Toggle the local audio mute
  users                 List table occupants
  quit                  Leave and exit
";

struct Args {
    table: Option<String>,
    username: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let mut pargs = Arguments::from_env();
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }
    let args = Args {
        table: pargs.opt_value_from_str("--table")?,
        username: pargs
            .opt_value_from_str("--username")?
            .unwrap_or_else(whoami::username),
    };

    run(args).await
}

async fn run(args: Args) -> Result<()> {
    let endpoints = Endpoints::from_env();
    let (ui, mut events) = UiEvents::channel();
    let media = shared_media();
    let session = Arc::new(SessionOrchestrator::new(
        endpoints,
        media,
        ui.clone(),
        Box::new(StoredCapabilities::default()),
    ));
    let table_state = Arc::new(Mutex::new(TableState::new(ui)));

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                UiEvent::Rerender => {}
                UiEvent::InTable(joined) => {
                    println!("{}", if joined { "joined table" } else { "left table" });
                }
                UiEvent::AudioMuted(muted) => {
                    println!("audio {}", if muted { "muted" } else { "unmuted" });
                }
                other => log::debug!("ui event: {other:?}"),
            }
        }
    });

    if let Some(table) = &args.table {
        join(&session, &table_state, table, &args.username);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("type 'help' for commands");
    while let Some(line) = lines.next_line().await? {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("join") => match parts.next() {
                Some(table) => join(&session, &table_state, table, &args.username),
                None => println!("usage: join <table>"),
            },
            Some("leave") => session.leave_table(),
            Some("game") => match session.initiate_game(GameKind::Snake) {
                Some(game_id) => println!("requested snake game {game_id}"),
                None => println!("not in a table"),
            },
            Some("sub") => session.toggle_subscription(),
            Some("mute") => session.toggle_mute(),
            Some("users") => {
                let state = table_state
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                for (username, user) in state.users() {
                    println!(
                        "  {username} seat {} {}",
                        user.seat,
                        if user.online { "online" } else { "offline" }
                    );
                }
            }
            Some("help") => print!("{HELP}"),
            Some("quit") | Some("exit") => break,
            Some(other) => println!("unknown command: {other}"),
            None => {}
        }
    }

    session.leave_table();
    Ok(())
}

fn join(
    session: &Arc<SessionOrchestrator>,
    table_state: &Arc<Mutex<TableState>>,
    table_id: &str,
    username: &str,
) {
    session.join_table(table_id, username);
    if let Some(table) = session.table_socket() {
        let table_state = Arc::clone(table_state);
        table.add_listener(move |message| {
            table_state
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .handle_table_message(message);
        });
    }
}
