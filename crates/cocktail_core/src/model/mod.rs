//! Domain model for saved cocktails.
//!
//! # Responsibility
//! - Define the records persisted by the saved-cocktails store.
//! - Own input validation so malformed records fail before any I/O.
//!
//! # Invariants
//! - Every cocktail is identified by its external recipe id.
//! - Every ingredient row belongs to exactly one cocktail.

pub mod cocktail;
