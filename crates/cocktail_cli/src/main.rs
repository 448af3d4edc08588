//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `cocktail_core` wiring.
//! - Open the configured store and print saved cocktails, one per line.

use cocktail_core::{core_version, init_logging_from_config, SavedCocktailsStore, StoreConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = StoreConfig::from_env();
    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("logging disabled: {err}");
    }

    println!("cocktail_core version={}", core_version());
    println!("db_path={}", config.db_path.display());

    let store = match SavedCocktailsStore::open(&config) {
        Ok(store) => store,
        Err(err) => {
            log::error!("event=cli_open module=cli status=error error={err}");
            eprintln!("failed to open store: {err}");
            return ExitCode::FAILURE;
        }
    };

    let cocktails = match store.list_saved_cocktails() {
        Ok(cocktails) => cocktails,
        Err(err) => {
            eprintln!("failed to list saved cocktails: {err}");
            return ExitCode::FAILURE;
        }
    };
    println!("saved={}", cocktails.len());
    for cocktail in &cocktails {
        println!("{}\t{}", cocktail.id, cocktail.name);
    }

    if let Err(err) = store.close() {
        eprintln!("failed to close store: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
