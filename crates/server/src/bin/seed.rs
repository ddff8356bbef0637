//! Load a JSON seed document into the database.
//!
//! The document has the shape `{ categories, clients, products, orders, rules }`;
//! every key is optional.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use db::DBService;
use server::config::DatabaseArgs;
use services::services::seed::{DEFAULT_BATCH_SIZE, SeedDocument, Seeder};
use tracing::info;
use utils::logging::{DEFAULT_LOG_FILTER, init_tracing};

#[derive(Debug, Parser)]
#[command(name = "seed", about = "Bulk-load clients, products, orders and rules")]
struct SeedArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    /// Path to the JSON seed document
    #[arg(long)]
    file: PathBuf,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = SeedArgs::parse();
    init_tracing(DEFAULT_LOG_FILTER);

    let raw = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let doc: SeedDocument = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid seed document", args.file.display()))?;

    let db = DBService::new(
        &args.database.database_url,
        args.database.db_max_connections,
    )
    .await?;

    info!(
        file = %args.file.display(),
        batch_size = args.batch_size,
        "Seeding"
    );
    let report = Seeder::new(Arc::new(db.store()), args.batch_size)
        .run(&doc)
        .await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    db.pool.close().await;
    Ok(())
}
