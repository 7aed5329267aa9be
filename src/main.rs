//! NetProphet CLI
//!
//! Inspect pricing and prediction formatting, and manage the local wager
//! store.
//!
//! Usage:
//!   netprophet multiplier --winner Sinner --player1 Sinner:1.85 --player2 Alcaraz:2.10 --count 5
//!   netprophet sets --result 2-1 --format amateur_super_tiebreak
//!   netprophet parse "Winner: Sinner | Result: 2-0"
//!   netprophet history --user u-1
//!
//! Environment:
//!   NETPROPHET_CONFIG - TOML config path (default: netprophet.toml)
//!   DATABASE_PATH - Wager store location (overrides the config file)
//!   RUST_LOG - Log filter (default: netprophet_core=info)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use netprophet_core::odds::{calculate_multiplier_with, multiplier_options_with, PlayerOdds};
use netprophet_core::prediction::{
    build_prediction_text, set_winners, sets_to_show, MatchFormat, Prediction, PredictionOptions,
};
use netprophet_core::wager::{
    partition_wagers, summarize, BetHistoryItem, MatchSnapshot, Wager, WagerRequest, WagerStore,
    Wallet,
};
use netprophet_core::EngineConfig;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "netprophet")]
#[command(about = "NetProphet prediction pricing and wager tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Number of regular set scores to ask for
    Sets {
        #[arg(short, long)]
        result: String,

        #[arg(short, long, value_parser = parse_format, default_value = "standard")]
        format: MatchFormat,
    },

    /// Derived per-set winners (winner's sets first)
    SetWinners {
        #[arg(short, long)]
        result: String,

        #[arg(short, long)]
        winner: String,

        #[arg(long)]
        player1: String,

        #[arg(long)]
        player2: String,
    },

    /// Payout multiplier for a prediction
    Multiplier {
        #[arg(short, long)]
        winner: String,

        /// NAME:ODDS
        #[arg(long, value_parser = parse_player)]
        player1: PlayerOdds,

        /// NAME:ODDS
        #[arg(long, value_parser = parse_player)]
        player2: PlayerOdds,

        /// Populated prediction fields
        #[arg(short, long)]
        count: usize,
    },

    /// Multiplier preview table for a match
    Options {
        #[arg(long, value_parser = parse_player)]
        player1: PlayerOdds,

        #[arg(long, value_parser = parse_player)]
        player2: PlayerOdds,
    },

    /// Canonical prediction string from a JSON prediction object
    Build {
        json: String,
    },

    /// Parse a stored prediction (JSON, canonical or free text)
    Parse {
        text: String,
    },

    /// Credit coins to a wallet
    Deposit {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        amount: u64,
    },

    /// Place a wager: match and prediction given as JSON
    Place {
        #[arg(short, long)]
        user: String,

        /// MatchSnapshot JSON
        #[arg(long = "match")]
        match_json: String,

        /// PredictionOptions JSON
        #[arg(long)]
        prediction: String,

        #[arg(short, long)]
        amount: u64,
    },

    /// Wager history and totals for a user
    History {
        #[arg(short, long)]
        user: String,
    },
}

fn parse_player(raw: &str) -> Result<PlayerOdds, String> {
    let (name, odds) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("expected NAME:ODDS, got '{}'", raw))?;
    let odds: f64 = odds
        .trim()
        .parse()
        .map_err(|_| format!("invalid odds '{}'", odds))?;
    Ok(PlayerOdds::new(name.trim(), odds))
}

fn parse_format(raw: &str) -> Result<MatchFormat, String> {
    MatchFormat::from_str(raw).ok_or_else(|| format!("unknown match format '{}'", raw))
}

// Match titles are owned by the match provider; the id stands in here.
fn history_items(wagers: Vec<&Wager>) -> Vec<BetHistoryItem> {
    wagers
        .into_iter()
        .map(|w| BetHistoryItem::from_wager(w, w.match_id.clone().unwrap_or_default()))
        .collect()
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "netprophet_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::from_env();
    config.validate().context("invalid engine config")?;

    match cli.command {
        Commands::Sets { result, format } => {
            let sets = sets_to_show(&result, format)?;
            print_json(&json!({ "result": result, "format": format, "sets_to_show": sets }))?;
        }
        Commands::SetWinners {
            result,
            winner,
            player1,
            player2,
        } => {
            print_json(&set_winners(&result, &winner, &player1, &player2)?)?;
        }
        Commands::Multiplier {
            winner,
            player1,
            player2,
            count,
        } => {
            player1.validate()?;
            player2.validate()?;
            let multiplier =
                calculate_multiplier_with(&config.multiplier, &winner, &player1, &player2, count)?;
            print_json(&json!({ "winner": winner, "count": count, "multiplier": multiplier }))?;
        }
        Commands::Options { player1, player2 } => {
            print_json(&multiplier_options_with(&config.multiplier, &player1, &player2))?;
        }
        Commands::Build { json } => {
            let opts: PredictionOptions =
                serde_json::from_str(&json).context("prediction is not a JSON object")?;
            print_json(&json!({
                "text": build_prediction_text(&opts),
                "prediction_count": opts.prediction_count(),
            }))?;
        }
        Commands::Parse { text } => {
            let prediction = Prediction::from_stored(&text);
            print_json(&json!({
                "legacy": prediction.is_legacy(),
                "prediction": prediction.normalize(),
            }))?;
        }
        Commands::Deposit { user, amount } => {
            let store = WagerStore::from_config(&config)?;
            store.credit(&user, amount).await?;
            let balance = store.balance(&user).await?;
            info!("Deposited {} coins for {}", amount, user);
            print_json(&json!({ "user": user, "balance": balance }))?;
        }
        Commands::Place {
            user,
            match_json,
            prediction,
            amount,
        } => {
            let snapshot: MatchSnapshot =
                serde_json::from_str(&match_json).context("match is not valid JSON")?;
            let prediction: PredictionOptions =
                serde_json::from_str(&prediction).context("prediction is not valid JSON")?;
            let request = WagerRequest {
                user_id: user,
                prediction,
                bet_amount: amount,
            };

            let store = WagerStore::from_config(&config)?;
            let wager = store.submit(&request, &snapshot, &config).await?;
            print_json(&wager)?;
        }
        Commands::History { user } => {
            let store = WagerStore::from_config(&config)?;
            let wagers = store.wagers_for_user(&user).await?;
            let (active, resolved) = partition_wagers(&wagers);
            let balance = store.balance(&user).await?;

            print_json(&json!({
                "balance": balance,
                "summary": summarize(&wagers),
                "active": history_items(active),
                "resolved": history_items(resolved),
            }))?;
        }
    }

    Ok(())
}
