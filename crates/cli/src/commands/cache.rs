//! Cache command handler.
//!
//! Inspect or reset the persisted query cache.

use clap::{Args, Subcommand};
use techmate_core::{config::AppConfig, AppResult};
use techmate_knowledge::QueryCache;

/// Inspect or reset the query cache
#[derive(Args, Debug)]
pub struct CacheCommand {
    #[command(subcommand)]
    action: CacheAction,
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// List cached queries
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete the cache file
    Clear,
}

impl CacheCommand {
    /// Execute the cache command.
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let cache = QueryCache::new(config.cache_path());

        match &self.action {
            CacheAction::List { json } => {
                let store = cache.load()?;

                if *json {
                    println!("{}", serde_json::to_string_pretty(&store)?);
                    return Ok(());
                }

                if store.is_empty() {
                    println!("Query cache is empty.");
                    return Ok(());
                }

                println!("{} cached queries:", store.len());
                for entry in &store.queries {
                    let when = entry
                        .cached_at
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "unknown time".to_string());
                    println!(
                        "  {} ({}, confidence {:.0}%)",
                        entry.query,
                        when,
                        entry.answer.confidence * 100.0
                    );
                }
                Ok(())
            }

            CacheAction::Clear => {
                // Works on a corrupt file too: no load, just delete.
                if cache.path().exists() {
                    std::fs::remove_file(cache.path())?;
                    println!("Query cache cleared.");
                } else {
                    println!("Query cache is already empty.");
                }
                Ok(())
            }
        }
    }
}
