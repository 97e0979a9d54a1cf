//! gymbot - Personal strength training assistant

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use gymbot::coach::Coach;
use gymbot::db::{DEFAULT_STEP, Database};
use gymbot::event::{self, SetEvent};
use gymbot::progression::Marker;
use gymbot::tui::App;

#[derive(Parser)]
#[command(name = "gymbot")]
#[command(author, version, about = "Strength training assistant with automatic progression")]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "GYMBOT_DB", default_value = "gymbot.db", global = true)]
    db: PathBuf,

    /// Increment step for newly registered users (kg)
    #[arg(long, env = "GYMBOT_DEFAULT_STEP", default_value_t = DEFAULT_STEP, global = true)]
    default_step: f64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start Telegram bot
    Bot {
        /// Telegram bot token (or set TELOXIDE_TOKEN env var)
        #[arg(short, long, env = "TELOXIDE_TOKEN")]
        token: String,
    },

    /// Show today's plan
    Today {
        #[arg(short, long, env = "GYMBOT_USER")]
        user: i64,
    },

    /// Log a set (e.g. `log -u 1 success 50 Bench Press`)
    Log {
        #[arg(short, long, env = "GYMBOT_USER")]
        user: i64,

        /// success, neutral or failure
        marker: Marker,

        /// Weight used for the set
        weight: String,

        /// Exercise name
        #[arg(required = true, num_args = 1..)]
        exercise: Vec<String>,
    },

    /// Set the increment step
    Step {
        #[arg(short, long, env = "GYMBOT_USER")]
        user: i64,

        value: String,
    },

    /// Switch to the next plan day
    Swap {
        #[arg(short, long, env = "GYMBOT_USER")]
        user: i64,
    },

    /// Show stored progress
    Status {
        #[arg(short, long, env = "GYMBOT_USER")]
        user: i64,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Open TUI dashboard
    Tui {
        #[arg(short, long, env = "GYMBOT_USER")]
        user: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if !(cli.default_step.is_finite() && cli.default_step > 0.0) {
        bail!("default step must be a positive number, got {}", cli.default_step);
    }
    let db = Database::open(&cli.db)?.with_default_step(cli.default_step);

    match cli.command {
        Commands::Bot { token } => {
            println!("Starting Telegram bot...");
            println!("База данных: {}", cli.db.display());
            gymbot::bot::run_bot(token, Coach::new(db)).await?;
        }

        Commands::Today { user } => {
            let plan = Coach::new(db).today(user).await?;
            println!("{}", plan.render());
        }

        Commands::Log { user, marker, weight, exercise } => {
            let set = SetEvent {
                marker,
                exercise: exercise.join(" "),
                weight: event::parse_weight(&weight)?,
            };
            println!("{}", Coach::new(db).log_set(user, &set).await?);
        }

        Commands::Step { user, value } => {
            println!("{}", Coach::new(db).set_step(user, &value).await?);
        }

        Commands::Swap { user } => {
            let day = Coach::new(db).swap(user).await?;
            println!("Следующий день: {}", day);
        }

        Commands::Status { user, json } => {
            let records = Coach::new(db).progress(user).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                println!("{:<30} | {:>8} | {}", "Exercise", "Weight", "Fails");
                println!("{:-<52}", "");
                for r in &records {
                    println!("{:<30} | {:>8.1} | {}", r.exercise, r.weight, r.fails);
                }
            }
        }

        Commands::Tui { user } => {
            let mut app = App::new(db, user)?;
            app.run()?;
        }
    }

    Ok(())
}
