//! # nexus-core
//!
//! Reactive keyed document cache for the Nexus campus community app.
//!
//! The crate keeps a normalized in-memory [`store::EntityStore`] of
//! accounts, groups, initiatives, missions, broadcasts, channels, messages
//! and alerts, persisted wholesale through a pluggable
//! [`persist::PersistenceAdapter`].  Callers read through one-shot
//! projections, open live subscriptions keyed by [`keys::ViewKey`], and
//! mutate through named operations on the [`hub::Hub`], which applies each
//! mutation atomically under a single-writer lock and notifies exactly the
//! affected views.
//!
//! Identity, remote transport, media upload and text generation are
//! external collaborators: the core stores their outputs (ids, URLs,
//! highlight texts) but never calls them.

pub mod aggregate;
pub mod config;
pub mod hub;
pub mod keys;
pub mod models;
pub mod persist;
pub mod query;
pub mod registry;
pub mod store;

mod accounts;
mod broadcasts;
mod error;
mod groups;
mod initiatives;
mod messaging;
mod missions;

pub use config::{DurabilityPolicy, HubConfig};
pub use error::{HubError, Result};
pub use hub::{Hub, Subscription};
pub use initiatives::InitiativeDraft;
pub use keys::{dm_channel_id, ViewKey, DIRECT_CONTAINER};
pub use missions::MissionProposal;
pub use models::*;
pub use persist::{MemoryAdapter, PersistenceAdapter};
pub use query::View;
pub use store::EntityStore;
