//! Saved-cocktail repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the write/read primitives over `cocktails` and
//!   `cocktail_ingredients` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths validate input before any SQL runs.
//! - Inserts use conflict-ignore; duplicates are skipped, never reported.
//! - Deleting a cocktail removes its ingredient rows in the same transaction.
//! - Cocktail listing order is insertion order (`row_id ASC`).

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::cocktail::{
    Cocktail, CocktailId, CocktailIngredient, CocktailValidationError, RowId, SavedCocktail,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const COCKTAIL_SELECT_SQL: &str = "SELECT
    id,
    name,
    category,
    alcoholic,
    glass,
    instructions,
    image_url
FROM cocktails";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "cocktails",
        &[
            "row_id",
            "id",
            "name",
            "category",
            "alcoholic",
            "glass",
            "instructions",
            "image_url",
        ],
    ),
    (
        "cocktail_ingredients",
        &["row_id", "cocktail_id", "name", "name_key", "measure"],
    ),
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for saved-cocktail persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    /// Input record failed validation; no I/O was attempted.
    Validation(CocktailValidationError),
    /// Storage-layer failure (I/O, corruption, constraint).
    Db(DbError),
    /// Ingredient rows reference a cocktail that is not stored.
    UnknownCocktail(CocktailId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted into a valid record.
    InvalidData(String),
}

impl RepoError {
    /// Returns whether this error came from the storage engine itself.
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::Db(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UnknownCocktail(id) => {
                write!(f, "ingredients reference unknown cocktail: {id}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "cocktail repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "cocktail repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "cocktail repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted cocktail data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CocktailValidationError> for RepoError {
    fn from(value: CocktailValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for saved-cocktail operations.
pub trait SavedCocktailsRepository {
    /// Inserts one cocktail; `None` when the id is already stored.
    fn insert_cocktail(&self, cocktail: &Cocktail) -> RepoResult<Option<RowId>>;
    /// Inserts ingredient rows, skipping natural-key duplicates.
    ///
    /// Returns the number of rows actually inserted.
    fn insert_ingredients(&self, ingredients: &[CocktailIngredient]) -> RepoResult<usize>;
    /// Inserts a cocktail and its ingredients in one transaction.
    fn save_cocktail(&self, saved: &SavedCocktail) -> RepoResult<Option<RowId>>;
    /// Deletes a cocktail and its ingredients; returns whether a row was removed.
    fn delete_cocktail(&self, id: CocktailId) -> RepoResult<bool>;
    /// Lists all cocktails in insertion order.
    fn list_cocktails(&self) -> RepoResult<Vec<Cocktail>>;
    /// Loads one cocktail joined with its ingredient rows.
    fn get_saved_cocktail(&self, id: CocktailId) -> RepoResult<Option<SavedCocktail>>;
    fn cocktail_exists(&self, id: CocktailId) -> RepoResult<bool>;
}

/// SQLite-backed saved-cocktail repository.
pub struct SqliteSavedCocktailsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSavedCocktailsRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version does not match.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` for drifted schemas.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Wraps a connection whose schema was already checked by `try_new`.
    pub(crate) fn assume_ready(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SavedCocktailsRepository for SqliteSavedCocktailsRepository<'_> {
    fn insert_cocktail(&self, cocktail: &Cocktail) -> RepoResult<Option<RowId>> {
        cocktail.validate()?;
        insert_cocktail_row(self.conn, cocktail)
    }

    fn insert_ingredients(&self, ingredients: &[CocktailIngredient]) -> RepoResult<usize> {
        for ingredient in ingredients {
            ingredient.validate()?;
        }
        if ingredients.is_empty() {
            return Ok(0);
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let inserted = insert_ingredient_rows(&tx, ingredients)?;
        tx.commit()?;
        Ok(inserted)
    }

    fn save_cocktail(&self, saved: &SavedCocktail) -> RepoResult<Option<RowId>> {
        saved.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let row_id = insert_cocktail_row(&tx, &saved.cocktail)?;
        insert_ingredient_rows(&tx, &saved.ingredients)?;
        tx.commit()?;
        Ok(row_id)
    }

    fn delete_cocktail(&self, id: CocktailId) -> RepoResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM cocktail_ingredients WHERE cocktail_id = ?1;",
            [id],
        )?;
        let removed = tx.execute("DELETE FROM cocktails WHERE id = ?1;", [id])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn list_cocktails(&self) -> RepoResult<Vec<Cocktail>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COCKTAIL_SELECT_SQL} ORDER BY row_id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut cocktails = Vec::new();
        while let Some(row) = rows.next()? {
            cocktails.push(parse_cocktail_row(row)?);
        }
        Ok(cocktails)
    }

    fn get_saved_cocktail(&self, id: CocktailId) -> RepoResult<Option<SavedCocktail>> {
        // Both selects share one read transaction so a concurrent delete from
        // another connection cannot split the composite.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let saved = match load_cocktail(&tx, id)? {
            Some(cocktail) => {
                let ingredients = load_ingredients(&tx, id)?;
                Some(SavedCocktail::new(cocktail, ingredients))
            }
            None => None,
        };
        tx.commit()?;
        Ok(saved)
    }

    fn cocktail_exists(&self, id: CocktailId) -> RepoResult<bool> {
        cocktail_exists_in(self.conn, id)
    }
}

fn insert_cocktail_row(conn: &Connection, cocktail: &Cocktail) -> RepoResult<Option<RowId>> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO cocktails (
            id,
            name,
            category,
            alcoholic,
            glass,
            instructions,
            image_url
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            cocktail.id,
            cocktail.name.as_str(),
            cocktail.category.as_deref(),
            cocktail.alcoholic.as_deref(),
            cocktail.glass.as_deref(),
            cocktail.instructions.as_deref(),
            cocktail.image_url.as_deref(),
        ],
    )?;

    if changed == 0 {
        return Ok(None);
    }
    Ok(Some(conn.last_insert_rowid()))
}

fn insert_ingredient_rows(
    conn: &Connection,
    ingredients: &[CocktailIngredient],
) -> RepoResult<usize> {
    let parents: BTreeSet<CocktailId> = ingredients
        .iter()
        .map(|ingredient| ingredient.cocktail_id)
        .collect();
    for cocktail_id in parents {
        if !cocktail_exists_in(conn, cocktail_id)? {
            return Err(RepoError::UnknownCocktail(cocktail_id));
        }
    }

    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO cocktail_ingredients (cocktail_id, name, name_key, measure)
         VALUES (?1, ?2, ?3, ?4);",
    )?;
    let mut inserted = 0;
    for ingredient in ingredients {
        let ingredient = ingredient.normalized();
        inserted += stmt.execute(params![
            ingredient.cocktail_id,
            ingredient.name.as_str(),
            ingredient.name_key(),
            ingredient.measure.as_deref(),
        ])?;
    }
    Ok(inserted)
}

fn load_cocktail(conn: &Connection, id: CocktailId) -> RepoResult<Option<Cocktail>> {
    let mut stmt = conn.prepare(&format!("{COCKTAIL_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_cocktail_row(row)?));
    }
    Ok(None)
}

fn load_ingredients(
    conn: &Connection,
    cocktail_id: CocktailId,
) -> RepoResult<Vec<CocktailIngredient>> {
    let mut stmt = conn.prepare(
        "SELECT cocktail_id, name, measure
         FROM cocktail_ingredients
         WHERE cocktail_id = ?1
         ORDER BY row_id ASC;",
    )?;
    let mut rows = stmt.query([cocktail_id])?;
    let mut ingredients = Vec::new();
    while let Some(row) = rows.next()? {
        let ingredient = CocktailIngredient {
            cocktail_id: row.get("cocktail_id")?,
            name: row.get("name")?,
            measure: row.get("measure")?,
        };
        ingredient.validate().map_err(|err| {
            RepoError::InvalidData(format!("cocktail_ingredients row: {err}"))
        })?;
        ingredients.push(ingredient);
    }
    Ok(ingredients)
}

fn parse_cocktail_row(row: &Row<'_>) -> RepoResult<Cocktail> {
    let cocktail = Cocktail {
        id: row.get("id")?,
        name: row.get("name")?,
        category: row.get("category")?,
        alcoholic: row.get("alcoholic")?,
        glass: row.get("glass")?,
        instructions: row.get("instructions")?,
        image_url: row.get("image_url")?,
    };
    cocktail
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("cocktails row: {err}")))?;
    Ok(cocktail)
}

fn cocktail_exists_in(conn: &Connection, id: CocktailId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM cocktails WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
