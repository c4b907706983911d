use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

use event_manager::db::{establish_connection, run_migrations};
use event_manager::seed::{populate, SeedOptions};
use event_manager::telemetry::init_tracing;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Database path
    db_path: PathBuf,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wipe the database and fill it with demo data
    Seed {
        #[clap(long, default_value_t = 6)]
        categories: usize,
        #[clap(long, default_value_t = 30)]
        events: usize,
        #[clap(long, default_value_t = 100)]
        participants: usize,
        /// Makes the generated data reproducible
        #[clap(long)]
        seed: Option<u64>,
    },
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let db_path = cli.db_path.display().to_string();
    let pool = establish_connection(&db_path)
        .await
        .with_context(|| format!("Cannot connect to {db_path}"))?;
    run_migrations(&pool).await.context("Cannot run migrations")?;

    match cli.command {
        Commands::Migrate => println!("Migrations applied to {db_path}"),
        Commands::Seed {
            categories,
            events,
            participants,
            seed,
        } => {
            let options = SeedOptions {
                categories,
                events,
                participants,
            };
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let summary = populate(&pool, &options, &mut rng)
                .await
                .context("Cannot seed database")?;

            println!(
                "Populated DB with {} categories, {} events, {} participants.",
                summary.categories, summary.events, summary.participants
            );
            println!("Example of event -> category (first {}):", summary.sample.len());
            for (event, category) in &summary.sample {
                println!(" - {event}  ->  {category}");
            }
        }
    }
    Ok(())
}
