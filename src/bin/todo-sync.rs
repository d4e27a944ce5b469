//! todo-sync CLI — run the reconciliation worker, enqueue and list items.

use clap::{Parser, Subcommand};
use std::sync::Arc;
use todo_sync::config::secrets::ExposeSecret;
use todo_sync::config::{Config, StoreBackend};
use todo_sync::db::Db;
use todo_sync::queue::QueueClient;
use todo_sync::store::{InMemoryStore, ItemStore, seed_defaults};
use todo_sync::telemetry::{TelemetryConfig, init_telemetry};
use todo_sync::worker::SyncWorker;

#[derive(Parser)]
#[command(name = "todo-sync", about = "Queue-to-store reconciliation for todo items")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the synchronization worker until ctrl-c
    Serve,
    /// Queue operations
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },
    /// Item operations against the Postgres store
    Items {
        #[command(subcommand)]
        action: ItemsAction,
    },
}

#[derive(Subcommand)]
enum QueueAction {
    /// Enqueue a description for the worker to add
    Send {
        /// Item description
        text: String,
    },
}

#[derive(Subcommand)]
enum ItemsAction {
    /// List stored items
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Insert the default items if the store is empty
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Serve => cmd_serve(config).await,
        Command::Queue { action } => {
            let db = Db::connect(config.database_url.expose_secret()).await?;
            db.migrate().await?;
            let queue = db.queue(&config.queue_name)?;
            queue.ensure_queue_exists().await?;

            match action {
                QueueAction::Send { text } => {
                    let id = queue.send(&text).await?;
                    println!("Sent: message {id} to {}", queue.name());
                    Ok(())
                }
            }
        }
        Command::Items { action } => {
            let db = Db::connect(config.database_url.expose_secret()).await?;
            db.migrate().await?;
            let store = db.item_store();

            match action {
                ItemsAction::List { json } => cmd_items_list(&store, json).await,
                ItemsAction::Seed => {
                    let count = seed_defaults(&store).await?;
                    println!("Seeded {count} item(s)");
                    Ok(())
                }
            }
        }
    }
}

async fn cmd_serve(config: Config) -> anyhow::Result<()> {
    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "todo-sync".to_string(),
        default_filter: config.log_level.clone(),
    })?;

    let db = Db::connect(config.database_url.expose_secret()).await?;
    db.migrate().await?;

    let queue = Arc::new(db.queue(&config.queue_name)?);
    let store: Arc<dyn ItemStore> = match config.store_backend {
        StoreBackend::Postgres => Arc::new(db.item_store()),
        StoreBackend::Memory => {
            let store = InMemoryStore::new();
            seed_defaults(&store).await?;
            Arc::new(store)
        }
    };
    tracing::info!(backend = ?config.store_backend, "item store selected");

    let worker = SyncWorker::new(queue, store, config.worker);
    worker.start().await?;

    let w = worker.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        w.shutdown();
    });

    worker.run().await?;
    Ok(())
}

async fn cmd_items_list(store: &dyn ItemStore, json: bool) -> anyhow::Result<()> {
    let items = store.list_all().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No items found.");
        return Ok(());
    }

    println!("{:<8}  {:<4}  DESCRIPTION", "ID", "DONE");
    println!("{}", "-".repeat(60));
    for item in &items {
        let id = item
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        let done = if item.is_completed { "yes" } else { "no" };
        println!("{id:<8}  {done:<4}  {}", item.description);
    }

    println!("\n{} item(s)", items.len());
    Ok(())
}
