//! Live query subscriptions.
//!
//! # Responsibility
//! - Keep a registry of active subscribers per query shape.
//! - Push fresh snapshots to every subscriber after relevant mutations.
//!
//! # Invariants
//! - Dropping a `Subscription` releases its registry entry.
//! - Publishing never blocks the writer; each subscriber holds at most the
//!   newest unread snapshot.

mod registry;

pub use registry::{SubscriberRegistry, Subscription, SubscriptionId};
