use thiserror::Error;

/// Errors surfaced by the core to its callers.
///
/// Expected precondition violations are always returned as values, never
/// panicked; idempotent no-ops (duplicate join request, re-approving an
/// approved mission) are *not* errors and succeed silently.
#[derive(Error, Debug)]
pub enum HubError {
    /// A referenced entity id does not exist.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A required set-membership or state-machine precondition does not hold.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// Operation structurally disallowed regardless of caller identity,
    /// e.g. removing an owner as a member.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed input, e.g. a non-positive point award.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The durable medium could not be read or written.  The in-memory
    /// store remains valid; whether the mutation was still committed is
    /// governed by [`crate::config::DurabilityPolicy`].
    #[error("Persistence unavailable: {0}")]
    Persistence(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HubError>;
