//! Manage participants in the data file without a running server.
//!
//! Usage:
//!   bingo-users <name> <secret> [player|admin]
//!   bingo-users --list

use std::sync::Arc;

use dinner_bingo::{
    clock::SystemClock,
    config::DEFAULT_DATA_FILE,
    state::AppState,
    store::JsonFileStore,
    types::Role,
};

const USAGE: &str = "Usage: bingo-users <name> <secret> [player|admin]\n       bingo-users --list";

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(message) = run(&args).await {
        eprintln!("{}", message);
        std::process::exit(1);
    }
}

async fn run(args: &[String]) -> Result<(), String> {
    let data_file = std::env::var("BINGO_DATA_FILE")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DATA_FILE.to_string());
    let store = Arc::new(JsonFileStore::new(&data_file));
    let state = AppState::load(store, Arc::new(SystemClock))
        .await
        .map_err(|e| e.to_string())?;

    match args {
        [flag] if flag == "--list" => {
            let participants = state.list_participants().await;
            println!("{:<24} {:<8} {:>6}", "Username", "Role", "Points");
            for p in participants {
                println!("{:<24} {:<8} {:>6}", p.username, p.role, p.points);
            }
            Ok(())
        }
        [name, secret] | [name, secret, _] => {
            let role = match args.get(2) {
                Some(raw) => raw.parse::<Role>()?,
                None => Role::Player,
            };
            let participant = state
                .create_participant(name, secret, role)
                .await
                .map_err(|e| e.to_string())?;
            println!(
                "Created {} '{}' in {}",
                participant.role, participant.username, data_file
            );
            Ok(())
        }
        _ => Err(USAGE.to_string()),
    }
}
