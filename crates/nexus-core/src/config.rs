//! Hub configuration.
//!
//! All settings have defaults so a hub can be opened with zero
//! configuration in tests and local development.

/// What to do when the persistence adapter fails to write a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurabilityPolicy {
    /// Commit the mutation in memory anyway and log a warning.  Durability
    /// degrades until the next successful save.
    BestEffort,
    /// Reject the mutation with `Persistence`; the in-memory store is left
    /// exactly as it was before the mutation.
    Strict,
}

/// Tunables for a [`crate::hub::Hub`] instance.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Policy applied when a snapshot save fails mid-mutation.
    pub durability: DurabilityPolicy,

    /// Maximum number of accounts returned by the leaderboard projection.
    /// Default: `50`.
    pub leaderboard_limit: usize,

    /// Minimum points for mentor eligibility (admins always qualify).
    /// Default: `300`.
    pub mentor_point_threshold: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            durability: DurabilityPolicy::BestEffort,
            leaderboard_limit: 50,
            mentor_point_threshold: 300,
        }
    }
}
