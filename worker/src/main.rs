use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use kvsweep_core::RandomBoardGenerator;
use kvsweep_protocol::{GameRecordView, MoveRequest, NewGameRequest};
use kvsweep_worker::{FileKv, GameStore, ServiceConfig, ServiceError, SessionService};
use serde_json::Value;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// JSON file backing the key-value store
    #[arg(short, long, default_value = "kvsweep.json")]
    store: PathBuf,

    /// TOML file with service settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Force a seed instead of random
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a new game
    New {
        #[arg(long)]
        width: Option<f64>,
        #[arg(long)]
        height: Option<f64>,
        #[arg(long)]
        mines: Option<f64>,
    },
    /// Reveal a cell
    Reveal {
        game_id: String,
        #[arg(allow_hyphen_values = true)]
        x: String,
        #[arg(allow_hyphen_values = true)]
        y: String,
    },
    /// Toggle the flag on a cell
    Flag {
        game_id: String,
        #[arg(allow_hyphen_values = true)]
        x: String,
        #[arg(allow_hyphen_values = true)]
        y: String,
    },
    /// Print a stored game
    Show { game_id: String },
    /// List the most recent games
    History,
}

/// Command line values as JSON, so they go through the same validation as
/// request bodies.
fn json_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

fn move_request(game_id: String, x: &str, y: &str) -> MoveRequest {
    MoveRequest {
        game_id,
        x: json_arg(x),
        y: json_arg(y),
    }
}

fn load_config(args: &Args) -> anyhow::Result<ServiceConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Could not read config {}", path.display()))?;
            ServiceConfig::from_toml(&text)
                .with_context(|| format!("Could not parse config {}", path.display()))?
        }
        None => ServiceConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    Ok(config)
}

async fn run(args: Args) -> anyhow::Result<Value> {
    let config = load_config(&args)?;
    log::debug!("config: {:?}", config);

    let store = GameStore::new(FileKv::new(&args.store)).with_capacity(config.recent_capacity);
    let service = SessionService::new(store, RandomBoardGenerator::default(), config);

    let output = match args.command {
        Command::New {
            width,
            height,
            mines,
        } => {
            let request = NewGameRequest {
                width,
                height,
                mine_count: mines,
            };
            let (width, height, mines) = request.floored();
            let record = service.new_game(width, height, mines).await?;
            serde_json::to_value(record.to_new_game_response())?
        }
        Command::Reveal { game_id, x, y } => {
            let request = move_request(game_id, &x, &y);
            let (x, y) = request.coords().map_err(ServiceError::from)?;
            let record = service
                .apply_reveal(request.game_id().map_err(ServiceError::from)?, x, y)
                .await?;
            serde_json::to_value(record.to_move_response())?
        }
        Command::Flag { game_id, x, y } => {
            let request = move_request(game_id, &x, &y);
            let (x, y) = request.coords().map_err(ServiceError::from)?;
            let record = service
                .apply_flag(request.game_id().map_err(ServiceError::from)?, x, y)
                .await?;
            serde_json::to_value(record.to_move_response())?
        }
        Command::Show { game_id } => serde_json::to_value(service.game(&game_id).await?.to_view())?,
        Command::History => {
            let games: Vec<GameRecordView> = service
                .history()
                .await?
                .iter()
                .map(|record| record.to_view())
                .collect();
            serde_json::to_value(games)?
        }
    };
    Ok(output)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    match run(args).await {
        Ok(output) => {
            println!("{output:#}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err:#}");
            match err.downcast_ref::<ServiceError>() {
                Some(err) => match serde_json::to_string_pretty(&err.to_body()) {
                    Ok(body) => println!("{body}"),
                    Err(_) => eprintln!("{}", err.to_body().error),
                },
                None => eprintln!("Error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
