//! Offline maintenance of the larder cache database.
//!
//! Works on the same database and configuration the worker uses. Run it
//! while the worker is stopped.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use larder_core::cache::trim;
use larder_core::{AppConfig, CacheDb, CacheStores, StoreInfo};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "larder")]
#[command(about = "Inspect and maintain the larder response stores")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List stores in creation order with their entry counts
    Stores,
    /// List the keys of a store, oldest first
    Keys { store: String },
    /// Keep only the newest MAX entries of a store
    Trim { store: String, max: usize },
    /// Delete a store and all of its entries
    Drop { store: String },
    /// Delete every store the configured version does not use
    Prune,
}

/// Stores outside `known_good`, in creation order.
fn stale_stores<'a>(stores: &'a [StoreInfo], known_good: &[String]) -> Vec<&'a str> {
    stores.iter().map(|s| s.name.as_str()).filter(|name| !known_good.iter().any(|k| k == name)).collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AppConfig::load()?;
    let db = Arc::new(CacheDb::open(&config.db_path).await?);

    match args.command {
        Command::Stores => {
            for info in db.store_info().await? {
                println!("{}\t{}\t{}", info.name, info.entries, info.created_at);
            }
        }
        Command::Keys { store } => {
            if !db.list_stores().await?.contains(&store) {
                anyhow::bail!("no store named {store}");
            }
            let stores = CacheStores::new(db);
            for key in stores.handle(&store).keys().await? {
                println!("{}\t{}", key.method, key.url);
            }
        }
        Command::Trim { store, max } => {
            let stores = CacheStores::new(db);
            let evicted = trim(&stores.handle(&store), max).await?;
            println!("evicted {evicted} entries from {store}");
        }
        Command::Drop { store } => {
            if db.drop_store(&store).await? {
                println!("dropped {store}");
            } else {
                anyhow::bail!("no store named {store}");
            }
        }
        Command::Prune => {
            let known_good = config.known_good_stores();
            let stores = db.store_info().await?;
            for name in stale_stores(&stores, &known_good) {
                db.drop_store(name).await?;
                tracing::info!(store = name, "pruned stale store");
                println!("dropped {name}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str) -> StoreInfo {
        StoreInfo { name: name.to_string(), entries: 0, created_at: "2026-01-01T00:00:00+00:00".to_string() }
    }

    #[test]
    fn test_stale_stores_keeps_known_good() {
        let stores =
            vec![info("app-precache-v1"), info("app-runtime-v1"), info("app-precache-v2"), info("app-runtime-v2")];
        let known_good = vec!["app-precache-v2".to_string(), "app-runtime-v2".to_string()];

        assert_eq!(stale_stores(&stores, &known_good), vec!["app-precache-v1", "app-runtime-v1"]);
    }

    #[test]
    fn test_stale_stores_nothing_to_prune() {
        let stores = vec![info("app-precache-v2")];
        let known_good = vec!["app-precache-v2".to_string(), "app-runtime-v2".to_string()];

        assert!(stale_stores(&stores, &known_good).is_empty());
    }

    #[test]
    fn test_parse_trim() {
        let args = Args::try_parse_from(["larder", "trim", "app-runtime-v1", "60"]).unwrap();
        match args.command {
            Command::Trim { store, max } => {
                assert_eq!(store, "app-runtime-v1");
                assert_eq!(max, 60);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
