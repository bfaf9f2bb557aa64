//! Canonical identifiers for subscribable views and direct-message threads.
//!
//! View keys are plain value-equal tuples: two keys built independently
//! from the same parameters hash to the same registry bucket.  The string
//! renderings are stable and suitable for logging.

use std::fmt;

/// Reserved container id for 1:1 threads.
pub const DIRECT_CONTAINER: &str = "direct";

/// Identifier of one subscribable projection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewKey {
    /// Single group document.
    Group(String),
    /// Single initiative document.
    Initiative(String),
    /// All channels of a group or initiative.
    Channels(String),
    /// Messages of one channel, `(container_id, channel_id)`.
    Messages(String, String),
    /// Broadcasts, optionally filtered to one group.
    Broadcasts(Option<String>),
    /// Approved missions, campus-wide.
    ApprovedMissions,
    /// Pending missions of one group.
    PendingMissions(String),
    /// Accounts ranked by points.
    Leaderboard,
    /// Direct-message conversation partners of one account.
    Partners(String),
    /// Accounts eligible to mentor.
    Mentors,
    /// Alerts addressed to one account, newest first.
    Alerts(String),
}

impl fmt::Display for ViewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewKey::Group(id) => write!(f, "group:{id}"),
            ViewKey::Initiative(id) => write!(f, "initiative:{id}"),
            ViewKey::Channels(container) => write!(f, "channels:{container}"),
            ViewKey::Messages(container, channel) => {
                write!(f, "messages:{container}:{channel}")
            }
            ViewKey::Broadcasts(Some(group)) => write!(f, "broadcasts:{group}"),
            ViewKey::Broadcasts(None) => write!(f, "broadcasts:*"),
            ViewKey::ApprovedMissions => write!(f, "missions:approved"),
            ViewKey::PendingMissions(group) => write!(f, "missions:pending:{group}"),
            ViewKey::Leaderboard => write!(f, "leaderboard"),
            ViewKey::Partners(account) => write!(f, "partners:{account}"),
            ViewKey::Mentors => write!(f, "mentors"),
            ViewKey::Alerts(account) => write!(f, "alerts:{account}"),
        }
    }
}

/// Canonical channel id of the 1:1 thread between two accounts.
///
/// The pair is sorted lexicographically and joined with `_`, so both
/// participants derive the identical id regardless of argument order.
pub fn dm_channel_id(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}_{b}")
    } else {
        format!("{b}_{a}")
    }
}

/// Split a direct-thread channel id back into its participant pair.
///
/// Returns `None` when the id is not a well-formed sorted pair.
pub fn dm_participants(channel_id: &str) -> Option<(&str, &str)> {
    let (low, high) = channel_id.split_once('_')?;
    if low.is_empty() || high.is_empty() {
        return None;
    }
    Some((low, high))
}
