//! Local persistence for saved cocktails.
//! This crate is the single source of truth for saved-recipe invariants.

pub mod config;
pub mod db;
pub mod live;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::StoreConfig;
pub use live::{SubscriberRegistry, Subscription, SubscriptionId};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::cocktail::{
    Cocktail, CocktailId, CocktailIngredient, CocktailValidationError, RowId, SavedCocktail,
};
pub use repo::saved_cocktails_repo::{
    RepoError, RepoResult, SavedCocktailsRepository, SqliteSavedCocktailsRepository,
};
pub use service::saved_cocktails_service::SavedCocktailsStore;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
