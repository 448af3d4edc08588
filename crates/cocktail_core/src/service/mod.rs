//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into caller-facing APIs.
//! - Keep callers decoupled from storage details.

pub mod saved_cocktails_service;
