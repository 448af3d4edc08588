//! Saved-cocktails store service.
//!
//! # Responsibility
//! - Own the single storage connection and serialize access to it.
//! - Expose the caller-facing save/delete/query operations.
//! - Re-run the "all saved cocktails" query and push it to live
//!   subscribers after every mutation that changes the `cocktails` table.
//!
//! # Invariants
//! - Every operation holds the connection lock for its whole duration.
//! - Snapshots are published while the lock is still held, so subscribers
//!   observe them in write order.
//! - Lock order is connection, then subscriber registry.

use crate::config::StoreConfig;
use crate::db::{open_db, open_db_in_memory};
use crate::live::{SubscriberRegistry, Subscription};
use crate::model::cocktail::{Cocktail, CocktailId, CocktailIngredient, RowId, SavedCocktail};
use crate::repo::saved_cocktails_repo::{
    RepoError, RepoResult, SavedCocktailsRepository, SqliteSavedCocktailsRepository,
};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use rusqlite::Connection;

const ALL_SAVED_COCKTAILS_QUERY: &str = "all_saved_cocktails";

/// Thread-safe store for saved cocktails.
///
/// Share it between worker threads with `Arc`. The store never spawns
/// threads itself; callers keep blocking I/O off latency-sensitive paths.
pub struct SavedCocktailsStore {
    conn: Mutex<Connection>,
    saved_cocktails: SubscriberRegistry<Vec<Cocktail>>,
}

impl SavedCocktailsStore {
    /// Creates a store over an injected, already migrated connection.
    ///
    /// # Errors
    /// - Returns repository readiness errors when the schema does not match.
    pub fn new(conn: Connection) -> RepoResult<Self> {
        let _ = SqliteSavedCocktailsRepository::try_new(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            saved_cocktails: SubscriberRegistry::new(ALL_SAVED_COCKTAILS_QUERY),
        })
    }

    /// Opens (or creates) the database file named by `config`.
    pub fn open(config: &StoreConfig) -> RepoResult<Self> {
        Self::new(open_db(&config.db_path)?)
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        Self::new(open_db_in_memory()?)
    }

    /// Inserts one cocktail, ignoring the call when its id is already saved.
    ///
    /// Returns the new storage row id, or `None` when the insert was ignored.
    pub fn insert_cocktail(&self, cocktail: &Cocktail) -> RepoResult<Option<RowId>> {
        let conn = self.conn.lock();
        let repo = SqliteSavedCocktailsRepository::assume_ready(&conn);
        let row_id = repo
            .insert_cocktail(cocktail)
            .inspect_err(|err| log_write_error("cocktail_insert", cocktail.id, err))?;

        match row_id {
            Some(row_id) => {
                info!(
                    "event=cocktail_insert module=store status=ok cocktail_id={} row_id={} outcome=inserted",
                    cocktail.id, row_id
                );
                self.publish_saved_cocktails(&repo);
            }
            None => info!(
                "event=cocktail_insert module=store status=ok cocktail_id={} outcome=ignored",
                cocktail.id
            ),
        }
        Ok(row_id)
    }

    /// Inserts ingredient rows, skipping rows that already exist.
    ///
    /// Returns the number of rows inserted. Fails without writing anything
    /// when a row references a cocktail that is not saved.
    pub fn insert_ingredients(&self, ingredients: &[CocktailIngredient]) -> RepoResult<usize> {
        let conn = self.conn.lock();
        let repo = SqliteSavedCocktailsRepository::assume_ready(&conn);
        let first_id = ingredients.first().map_or(0, |ingredient| ingredient.cocktail_id);
        let inserted = repo
            .insert_ingredients(ingredients)
            .inspect_err(|err| log_write_error("ingredients_insert", first_id, err))?;

        info!(
            "event=ingredients_insert module=store status=ok requested={} inserted={} ignored={}",
            ingredients.len(),
            inserted,
            ingredients.len() - inserted
        );
        Ok(inserted)
    }

    /// Saves a cocktail together with its ingredients in one transaction.
    pub fn save_cocktail(&self, saved: &SavedCocktail) -> RepoResult<Option<RowId>> {
        let conn = self.conn.lock();
        let repo = SqliteSavedCocktailsRepository::assume_ready(&conn);
        let row_id = repo
            .save_cocktail(saved)
            .inspect_err(|err| log_write_error("cocktail_save", saved.cocktail.id, err))?;

        info!(
            "event=cocktail_save module=store status=ok cocktail_id={} ingredients={} outcome={}",
            saved.cocktail.id,
            saved.ingredients.len(),
            if row_id.is_some() { "inserted" } else { "ignored" }
        );
        if row_id.is_some() {
            self.publish_saved_cocktails(&repo);
        }
        Ok(row_id)
    }

    /// Deletes the cocktail with the same id, and its ingredient rows.
    ///
    /// Deleting a cocktail that is not saved is a no-op.
    pub fn delete_cocktail(&self, cocktail: &Cocktail) -> RepoResult<()> {
        let conn = self.conn.lock();
        let repo = SqliteSavedCocktailsRepository::assume_ready(&conn);
        let removed = repo
            .delete_cocktail(cocktail.id)
            .inspect_err(|err| log_write_error("cocktail_delete", cocktail.id, err))?;

        info!(
            "event=cocktail_delete module=store status=ok cocktail_id={} outcome={}",
            cocktail.id,
            if removed { "deleted" } else { "absent" }
        );
        if removed {
            self.publish_saved_cocktails(&repo);
        }
        Ok(())
    }

    /// Subscribes to the list of all saved cocktails.
    ///
    /// The current list is queued immediately; a fresh list follows every
    /// insert or delete. A reader that falls behind only sees the newest list.
    /// A failed read is delivered as an empty list.
    pub fn watch_all_saved_cocktails(&self) -> Subscription<Vec<Cocktail>> {
        let conn = self.conn.lock();
        let repo = SqliteSavedCocktailsRepository::assume_ready(&conn);
        let snapshot = read_snapshot_or_empty(&repo);
        self.saved_cocktails.subscribe(snapshot)
    }

    /// Loads one cocktail with its ingredients; `None` when not saved.
    pub fn get_saved_cocktail_by_id(&self, id: CocktailId) -> RepoResult<Option<SavedCocktail>> {
        let conn = self.conn.lock();
        let repo = SqliteSavedCocktailsRepository::assume_ready(&conn);
        let saved = repo.get_saved_cocktail(id)?;
        debug!(
            "event=cocktail_get module=store status=ok cocktail_id={} found={}",
            id,
            saved.is_some()
        );
        Ok(saved)
    }

    pub fn is_cocktail_saved(&self, id: CocktailId) -> RepoResult<bool> {
        let conn = self.conn.lock();
        SqliteSavedCocktailsRepository::assume_ready(&conn).cocktail_exists(id)
    }

    /// Returns the current list of saved cocktails in insertion order.
    pub fn list_saved_cocktails(&self) -> RepoResult<Vec<Cocktail>> {
        let conn = self.conn.lock();
        SqliteSavedCocktailsRepository::assume_ready(&conn).list_cocktails()
    }

    /// Number of live subscriptions currently attached.
    pub fn subscriber_count(&self) -> usize {
        self.saved_cocktails.len()
    }

    /// Closes the underlying connection.
    ///
    /// Outstanding subscriptions stop receiving snapshots.
    pub fn close(self) -> RepoResult<()> {
        let Self {
            conn,
            saved_cocktails,
        } = self;
        drop(saved_cocktails);

        conn.into_inner().close().map_err(|(_, err)| {
            error!("event=db_close module=store status=error error={err}");
            RepoError::from(err)
        })?;
        info!("event=db_close module=store status=ok");
        Ok(())
    }

    fn publish_saved_cocktails(&self, repo: &impl SavedCocktailsRepository) {
        if self.saved_cocktails.is_empty() {
            return;
        }
        let snapshot = read_snapshot_or_empty(repo);
        let count = snapshot.len();
        let delivered = self.saved_cocktails.publish(snapshot);
        debug!(
            "event=live_publish module=store status=ok query={} cocktails={} subscribers={}",
            ALL_SAVED_COCKTAILS_QUERY, count, delivered
        );
    }
}

fn read_snapshot_or_empty(repo: &impl SavedCocktailsRepository) -> Vec<Cocktail> {
    repo.list_cocktails().unwrap_or_else(|err| {
        warn!(
            "event=live_refresh module=store status=error query={} error={}",
            ALL_SAVED_COCKTAILS_QUERY, err
        );
        Vec::new()
    })
}

fn log_write_error(event: &str, cocktail_id: CocktailId, err: &RepoError) {
    if err.is_storage_failure() {
        error!(
            "event={} module=store status=error cocktail_id={} error_code=storage_failure error={}",
            event, cocktail_id, err
        );
    } else {
        warn!(
            "event={} module=store status=rejected cocktail_id={} error={}",
            event, cocktail_id, err
        );
    }
}
