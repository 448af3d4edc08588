//! Cocktail domain model.
//!
//! # Responsibility
//! - Define the `Cocktail` record, its ingredient rows and the
//!   `SavedCocktail` read composite.
//! - Validate caller input before persistence.
//!
//! # Invariants
//! - `Cocktail::id` is positive and never reused for another recipe.
//! - `Cocktail::name` and ingredient names are never blank.
//! - Ingredient names are whitespace-normalized before they are stored,
//!   whether the row came from `CocktailIngredient::new` or from serde.
//! - Ingredient natural keys fold case with Unicode rules, not ASCII only.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// External recipe identifier (the upstream drink id).
pub type CocktailId = i64;

/// Storage row identifier returned by a successful cocktail insert.
///
/// Distinct from [`CocktailId`]; grows with insertion order.
pub type RowId = i64;

/// Validation failures for cocktail input records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CocktailValidationError {
    /// Cocktail ids must be positive.
    NonPositiveId(CocktailId),
    /// Cocktail name is empty or whitespace.
    BlankName(CocktailId),
    /// Ingredient references a non-positive cocktail id.
    NonPositiveCocktailId(CocktailId),
    /// Ingredient name is empty or whitespace.
    BlankIngredientName(CocktailId),
    /// Composite carries an ingredient of another cocktail.
    ForeignIngredient {
        expected: CocktailId,
        actual: CocktailId,
    },
}

impl Display for CocktailValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveId(id) => write!(f, "cocktail id must be positive, got {id}"),
            Self::BlankName(id) => write!(f, "cocktail {id} has a blank name"),
            Self::NonPositiveCocktailId(id) => {
                write!(f, "ingredient cocktail_id must be positive, got {id}")
            }
            Self::BlankIngredientName(id) => {
                write!(f, "ingredient of cocktail {id} has a blank name")
            }
            Self::ForeignIngredient { expected, actual } => write!(
                f,
                "ingredient belongs to cocktail {actual}, expected {expected}"
            ),
        }
    }
}

impl Error for CocktailValidationError {}

/// A saved cocktail recipe.
///
/// Descriptive fields are stored exactly as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cocktail {
    /// External recipe id; unique within the store.
    pub id: CocktailId,
    pub name: String,
    pub category: Option<String>,
    /// Upstream alcoholic marker, e.g. `Alcoholic` or `Non alcoholic`.
    pub alcoholic: Option<String>,
    pub glass: Option<String>,
    pub instructions: Option<String>,
    /// Thumbnail reference (usually a URL).
    pub image_url: Option<String>,
}

impl Cocktail {
    /// Creates a cocktail with only the required fields set.
    pub fn new(id: CocktailId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            category: None,
            alcoholic: None,
            glass: None,
            instructions: None,
            image_url: None,
        }
    }

    /// Checks required fields.
    pub fn validate(&self) -> Result<(), CocktailValidationError> {
        if self.id <= 0 {
            return Err(CocktailValidationError::NonPositiveId(self.id));
        }
        if self.name.trim().is_empty() {
            return Err(CocktailValidationError::BlankName(self.id));
        }
        Ok(())
    }
}

/// One ingredient row of a cocktail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CocktailIngredient {
    /// Owning cocktail id.
    pub cocktail_id: CocktailId,
    /// Ingredient name; part of the natural key (case-insensitive).
    pub name: String,
    /// Free-text amount such as `1 1/2 oz`.
    pub measure: Option<String>,
}

impl CocktailIngredient {
    /// Creates an ingredient row, normalizing whitespace in `name` and
    /// `measure`. A blank measure becomes `None`.
    pub fn new(cocktail_id: CocktailId, name: &str, measure: Option<&str>) -> Self {
        let measure = measure
            .map(normalize_whitespace)
            .filter(|value| !value.is_empty());
        Self {
            cocktail_id,
            name: normalize_whitespace(name),
            measure,
        }
    }

    /// Returns a copy with the same whitespace rules as [`Self::new`].
    ///
    /// Rows built through serde or struct literals skip `new`; storage goes
    /// through this before binding.
    pub fn normalized(&self) -> Self {
        Self::new(self.cocktail_id, &self.name, self.measure.as_deref())
    }

    /// Case-folded, whitespace-normalized name used as the natural key
    /// together with `cocktail_id`.
    pub fn name_key(&self) -> String {
        ingredient_name_key(&self.name)
    }

    /// Checks required fields.
    pub fn validate(&self) -> Result<(), CocktailValidationError> {
        if self.cocktail_id <= 0 {
            return Err(CocktailValidationError::NonPositiveCocktailId(
                self.cocktail_id,
            ));
        }
        if self.name.trim().is_empty() {
            return Err(CocktailValidationError::BlankIngredientName(
                self.cocktail_id,
            ));
        }
        Ok(())
    }
}

/// Read composite: one cocktail joined with all of its ingredient rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCocktail {
    pub cocktail: Cocktail,
    /// Ingredient rows in insertion order.
    pub ingredients: Vec<CocktailIngredient>,
}

impl SavedCocktail {
    pub fn new(cocktail: Cocktail, ingredients: Vec<CocktailIngredient>) -> Self {
        Self {
            cocktail,
            ingredients,
        }
    }

    /// Validates the cocktail and every ingredient row.
    ///
    /// Ingredients must reference the composite's own cocktail id.
    pub fn validate(&self) -> Result<(), CocktailValidationError> {
        self.cocktail.validate()?;
        for ingredient in &self.ingredients {
            ingredient.validate()?;
            if ingredient.cocktail_id != self.cocktail.id {
                return Err(CocktailValidationError::ForeignIngredient {
                    expected: self.cocktail.id,
                    actual: ingredient.cocktail_id,
                });
            }
        }
        Ok(())
    }
}

/// Trims and collapses inner whitespace runs to a single space.
pub fn normalize_whitespace(value: &str) -> String {
    WHITESPACE_RE.replace_all(value.trim(), " ").into_owned()
}

/// Natural-key form of an ingredient name: normalized whitespace, Unicode
/// lowercase. `"CRÈME  de Cassis"` and `"crème de cassis"` share a key.
pub fn ingredient_name_key(name: &str) -> String {
    normalize_whitespace(name).to_lowercase()
}
