//! TrustML seeder - loads the sample resource catalog
//!
//! Usage:
//!   trustml-seed --reset
//!
//! Environment variables:
//!   MONGO_URL / MONGODB_URI - MongoDB connection string
//!   DB_NAME - database name (default: trustml_db)
//!   RESOURCE_ROOT - where placeholder files are written (default: public/resources)

use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use trustml_backend::{
    config::{LogArgs, StoreArgs},
    db::MongoClient,
    files::ResourceFiles,
    logging,
    seed::{self, SeedOptions},
    store::Stores,
};

#[derive(Parser, Debug)]
#[command(name = "trustml-seed")]
#[command(about = "Seed the resource catalog with sample resources")]
#[command(version)]
struct Args {
    #[command(flatten)]
    store: StoreArgs,

    /// Directory for placeholder resource files
    #[arg(long, env = "RESOURCE_ROOT", default_value = "public/resources")]
    resource_root: PathBuf,

    /// Delete existing resources before seeding
    #[arg(long)]
    reset: bool,

    /// Skip writing placeholder files
    #[arg(long)]
    no_files: bool,

    #[command(flatten)]
    log: LogArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    logging::init_tracing(&args.log);

    info!("Initializing resource database...");

    let client = match MongoClient::new(args.store.connection_uri(), &args.store.db_name).await {
        Ok(client) => client,
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            std::process::exit(1);
        }
    };

    // Opening the stores creates collections and indexes
    let stores = Stores::mongo(&client, args.store.store_timeout()).await?;
    let files = ResourceFiles::new(args.resource_root);

    let options = SeedOptions {
        reset: args.reset,
        write_files: !args.no_files,
    };
    let report = seed::seed_catalog(&stores, &files, &options).await?;

    if report.skipped {
        info!("Nothing to do");
    } else {
        info!(
            "Resource initialization complete: {} inserted, {} removed, {} files written",
            report.inserted.len(),
            report.removed,
            report.files_written
        );
    }

    Ok(())
}
