mod watch;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gtdvault_config::GtdConfig;
use gtdvault_core::{FsVault, GtdEngine, SyncStateFile, SyncStore};

#[derive(Debug, Parser)]
#[command(
    name = "gtdvault",
    version,
    about = "GTD task-sync engine for markdown note vaults"
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "gtd.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a default configuration file.
    Init,
    /// Scan notes for #TODO markers and create task notes.
    Scan,
    /// Propagate completed tasks back to their source checkboxes.
    Checkboxes,
    /// Roll overdue scheduled dates forward to today.
    Overdue,
    /// Delete task notes whose status is done.
    CleanCompleted,
    /// Delete task notes whose kind is trash.
    CleanTrash,
    /// Run every operation enabled in [auto], in sync order.
    Run,
    /// Stay resident and run enabled operations on their configured cadence.
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if matches!(cli.command, Commands::Init) {
        GtdConfig::default().save_to(&cli.config)?;
        println!("wrote {}", cli.config.display());
        return Ok(());
    }

    let config = GtdConfig::load_from(&cli.config)?;
    let state_file = SyncStateFile::new(Path::new(&config.vault.root).join(&config.vault.state_file));
    let mut store = SyncStore::default();
    store.load(state_file.load()?);

    let vault = FsVault::new(&config.vault.root);
    let engine = GtdEngine::new(vault, config.clone());

    match cli.command {
        Commands::Init => unreachable!("handled above"),
        Commands::Scan => {
            let count = engine.create_tasks_from_todos(&mut store).await;
            state_file.save(&store.snapshot()).await?;
            println!("created {count} task(s) from #TODO markers");
        }
        Commands::Checkboxes => {
            let count = engine.update_checkboxes_from_tasks(&mut store).await;
            state_file.save(&store.snapshot()).await?;
            println!("updated {count} checkbox(es)");
        }
        Commands::Overdue => {
            let count = engine.update_overdue_tasks().await;
            println!("rolled {count} overdue task(s) forward");
        }
        Commands::CleanCompleted => {
            let count = engine.delete_completed_tasks(&mut store).await;
            state_file.save(&store.snapshot()).await?;
            println!("deleted {count} completed task(s)");
        }
        Commands::CleanTrash => {
            let count = engine.delete_trash_tasks(&mut store).await;
            state_file.save(&store.snapshot()).await?;
            println!("deleted {count} trash task(s)");
        }
        Commands::Run => {
            let total = run_all(&engine, &mut store, &config).await;
            state_file.save(&store.snapshot()).await?;
            if total == 0 {
                println!("nothing to do");
            }
        }
        Commands::Watch => {
            watch::run(engine, store, state_file, config).await?;
        }
    }

    Ok(())
}

/// One pass over every operation enabled in `[auto]`, in the same order the
/// periodic loops use. Returns the total number of changes.
async fn run_all(engine: &GtdEngine<FsVault>, store: &mut SyncStore, config: &GtdConfig) -> usize {
    let mut total = 0;

    if config.auto.create_from_todo {
        let count = engine.create_tasks_from_todos(store).await;
        if count > 0 {
            println!("created {count} task(s) from #TODO markers");
        }
        total += count;
    }
    if config.auto.update_checkbox {
        let count = engine.update_checkboxes_from_tasks(store).await;
        if count > 0 {
            println!("updated {count} checkbox(es)");
        }
        total += count;
    }
    if config.auto.update_schedule {
        let count = engine.update_overdue_tasks().await;
        if count > 0 {
            println!("rolled {count} overdue task(s) forward");
        }
        total += count;
    }
    if config.auto.delete_completed {
        let count = engine.delete_completed_tasks(store).await;
        if count > 0 {
            println!("deleted {count} completed task(s)");
        }
        total += count;
    }
    if config.auto.delete_trash {
        let count = engine.delete_trash_tasks(store).await;
        if count > 0 {
            println!("deleted {count} trash task(s)");
        }
        total += count;
    }

    total
}
