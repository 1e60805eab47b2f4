//! TrustML backend - resource catalog and download analytics API

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

use trustml_backend::{
    config::Args,
    db::{mongo::redact_uri, MongoClient},
    logging,
    server::{self, AppState},
    store::Stores,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    logging::init_tracing(&args.log);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  TrustML Backend v{}", env!("CARGO_PKG_VERSION"));
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {}", redact_uri(args.store.connection_uri()));
    info!("Database: {}", args.store.db_name);
    info!("Store timeout: {}ms", args.store.store_timeout_ms);
    info!("Resource root: {}", args.resource_root.display());
    info!("CORS origins: {}", args.cors_origins);
    info!("======================================");

    if !args.resource_root.is_dir() {
        warn!(
            "Resource root {} does not exist; downloads will return 404",
            args.resource_root.display()
        );
    }

    let timeout = args.store.store_timeout();
    let stores = match MongoClient::new(args.store.connection_uri(), &args.store.db_name).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            Stores::mongo(&client, timeout).await?
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
                Stores::memory(timeout)
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    let state = Arc::new(AppState::new(args, stores));

    if let Err(e) = server::run(state).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
