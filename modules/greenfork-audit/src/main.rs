use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use ai_client::OpenAiClient;
use greenfork_audit::{AuditScan, ScanOptions};
use greenfork_common::Config;
use greenfork_store::PgRecipeStore;

/// Scan the recipe corpus, classify issues, and repair them.
#[derive(Debug, Parser)]
#[command(name = "greenfork-audit")]
struct Args {
    /// Compute and log fixes without writing (the default).
    #[arg(long, conflicts_with = "execute")]
    dry_run: bool,

    /// Apply fixes to the store.
    #[arg(long)]
    execute: bool,

    /// Cap the number of recipes scanned.
    #[arg(long)]
    limit: Option<u32>,

    /// Scan a single recipe by id.
    #[arg(long, conflicts_with = "recipe_slug")]
    recipe_id: Option<Uuid>,

    /// Scan a single recipe by slug.
    #[arg(long)]
    recipe_slug: Option<String>,

    /// Skip hero-image resolution.
    #[arg(long)]
    skip_images: bool,

    /// Skip nutrition estimation.
    #[arg(long)]
    skip_nutrition: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("greenfork=info".parse()?))
        .init();

    let args = Args::parse();
    let config = Config::from_env();
    config.log_redacted();

    // Store unreachable is the one unrecoverable setup failure: exit nonzero.
    let store = PgRecipeStore::connect(&config.database_url).await?;
    store.migrate().await?;

    let client = Arc::new(
        OpenAiClient::new(&config.openai_api_key)
            .with_text_models(&config.fast_model, &config.capable_model)
            .with_image_model(&config.image_model),
    );

    let scan = AuditScan::new(
        Arc::new(store),
        client.clone(),
        client,
        config.image_dir.clone(),
        config.placeholder_image.clone(),
    );

    let options = ScanOptions {
        dry_run: !args.execute,
        limit: args.limit,
        recipe_id: args.recipe_id,
        recipe_slug: args.recipe_slug,
        skip_images: args.skip_images,
        skip_nutrition: args.skip_nutrition,
    };

    let stats = scan.run(&options).await?;
    info!("Audit run complete. {stats}");

    Ok(())
}
