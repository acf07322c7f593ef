use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::domain::RoundCounters;
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/tug.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current round's counters.
    Show,
    /// Zero the rope and pull counters. Keeps the round number unless
    /// `--round` is given.
    Reset {
        #[arg(long)]
        round: Option<i64>,
    },
    /// List finished rounds, newest first.
    History {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::Show => {
            let state = storage.load_state().await?;
            println!(
                "round={} position={} left_pulls={} right_pulls={}",
                state.round, state.position, state.left_pulls, state.right_pulls
            );
        }
        Command::Reset { round } => {
            let current = storage.load_state().await?;
            let fresh = RoundCounters {
                round: round.unwrap_or(current.round),
                ..RoundCounters::default()
            };
            storage.write_state(fresh).await?;
            println!("reset round={}", fresh.round);
        }
        Command::History { limit } => {
            let results = storage.list_results(limit).await?;
            if results.is_empty() {
                println!("no finished rounds");
            }
            for result in results {
                println!(
                    "round={} winner={} left_pulls={} right_pulls={} finished_at={}",
                    result.round,
                    result.winner,
                    result.left_pulls,
                    result.right_pulls,
                    result.finished_at.to_rfc3339()
                );
            }
        }
    }

    Ok(())
}
