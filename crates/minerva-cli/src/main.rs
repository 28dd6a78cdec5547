mod config;
mod display;
mod review;
mod session;

use anyhow::Context;
use clap::Parser;
use minerva_core::Filter;
use minerva_store::{PromptCache, PromptLookup};
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, Command};
use crate::session::{ReviewSession, SessionOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout belongs to the form.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("minerva v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Review {
            unreviewed,
            variant,
            reveal,
            reviewer,
        } => {
            let mut prompts = PromptCache::open(&cli.prompts)
                .with_context(|| format!("loading prompts from {}", cli.prompts.display()))?;
            let client = cli.remote.client()?;
            let mut session = ReviewSession::new(
                client,
                SessionOptions {
                    filter: Filter::from_unreviewed(unreviewed),
                    variant: variant.into(),
                    reveal: reveal.into(),
                    reviewer,
                },
            );
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            review::run(&mut session, &mut prompts, stdin.lock(), &mut stdout).await?;
        }
        Command::List { unreviewed, json } => {
            let snapshot = cli
                .remote
                .client()?
                .fetch(Filter::from_unreviewed(unreviewed))
                .await
                .context("fetching sheet")?;
            if json {
                println!("{}", serde_json::to_string_pretty(snapshot.records())?);
            } else {
                for record in snapshot.records() {
                    println!("{}", display::render_row_line(record));
                }
            }
        }
        Command::Status => {
            let snapshot = cli
                .remote
                .client()?
                .fetch(Filter::All)
                .await
                .context("fetching sheet")?;
            println!("{}", display::render_progress(&snapshot.progress()));
        }
        Command::Export { out, unreviewed } => {
            let snapshot = cli
                .remote
                .client()?
                .fetch(Filter::from_unreviewed(unreviewed))
                .await
                .context("fetching sheet")?;
            let rows = minerva_store::write_snapshot_csv(&snapshot, &out)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("Exported {rows} rows to {}", out.display());
        }
        Command::Prompts => {
            let lookup = PromptLookup::load(&cli.prompts)
                .with_context(|| format!("loading prompts from {}", cli.prompts.display()))?;
            for (sr_id, text) in lookup.entries() {
                println!("{sr_id:>4}  {text}");
            }
        }
    }

    Ok(())
}
