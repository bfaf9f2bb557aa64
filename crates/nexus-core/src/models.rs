//! Domain model structs held in the entity store.
//!
//! Every struct derives `Serialize` and `Deserialize` so a persistence
//! adapter can round-trip the whole store losslessly and hand records
//! directly to a UI layer.
//!
//! Ids are opaque strings minted by the store on creation (UUID v4) and are
//! never reused.  Nested structures (`Reply`, `Achievement`,
//! role-assignment maps) are owned exclusively by their parent record.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// Role claimed by the identity provider at sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
    Faculty,
}

/// Category of an [`Achievement`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementKind {
    Event,
    Project,
    Skill,
    Badge,
}

/// A single entry in an account's achievement history.  Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub kind: AchievementKind,
    pub description: String,
    pub date: DateTime<Utc>,
}

/// A member of the campus community.
///
/// `joined_group_ids` is the inverse of every [`Group`]'s `members` set and
/// must always mirror it; the mutation engine maintains both sides in one
/// commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    /// Unique across all accounts.
    pub email: String,
    pub display_name: String,
    pub role: Role,
    /// Monotonically increasing; only the award operation may change it.
    pub points: u64,
    pub joined_group_ids: BTreeSet<String>,
    pub skill_tags: BTreeSet<String>,
    pub interest_tags: BTreeSet<String>,
    pub badge_ids: BTreeSet<String>,
    pub achievements: Vec<Achievement>,
    pub verified: bool,
}

// ---------------------------------------------------------------------------
// Badge (read-only catalog record)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeCategory {
    Contribution,
    Skill,
    Participation,
    Milestone,
}

/// A badge definition.  Definitions live in a static catalog; accounts hold
/// only badge ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub category: BadgeCategory,
}

// ---------------------------------------------------------------------------
// Group (club)
// ---------------------------------------------------------------------------

/// Approval state shared by groups and missions.
///
/// Transitions only `Pending -> Approved` or `Pending -> Rejected`; both
/// branches are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// A student club.
///
/// Invariants: `owner_id` is always in `members`; `members` and
/// `pending_requests` are disjoint; `role_assignments` holds entries only
/// for non-owner members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub members: BTreeSet<String>,
    pub pending_requests: BTreeSet<String>,
    pub category: String,
    pub logo_ref: Option<String>,
    /// Free-text role label per non-owner member.
    pub role_assignments: BTreeMap<String, String>,
    pub approval_status: ApprovalStatus,
}

// ---------------------------------------------------------------------------
// Mission (event proposal)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionKind {
    Workshop,
    Competition,
    Seminar,
    Hackathon,
}

/// A proposed campus event, approval-gated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    pub group_id: String,
    pub title: String,
    pub description: String,
    /// Calendar date in `YYYY-MM-DD` form, as entered by the proposer.
    pub date: String,
    pub location: String,
    pub kind: MissionKind,
    pub approval_status: ApprovalStatus,
    pub proposer_id: String,
    pub proposer_name: String,
    /// Empty until approval supplies an externally generated highlight text.
    pub highlight: String,
    pub media_ref: Option<MediaRef>,
}

// ---------------------------------------------------------------------------
// Broadcast (post)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    File,
}

/// Reference to media already uploaded through the external media
/// collaborator.  The core stores the returned URL verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
    pub kind: MediaKind,
    pub file_name: Option<String>,
}

/// A reply attached to a broadcast.  Replies are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A post published on a group's feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Broadcast {
    pub id: String,
    pub group_id: String,
    pub group_name: String,
    pub author_name: String,
    pub body: String,
    pub media_ref: Option<MediaRef>,
    pub created_at: DateTime<Utc>,
    /// Set semantics; no duplicate likes.
    pub liked_by: BTreeSet<String>,
    pub replies: Vec<Reply>,
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// A chat channel inside a group or initiative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    /// Id of the owning [`Group`] or [`Initiative`].
    pub container_id: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Initiative (project)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleState {
    Recruiting,
    InProgress,
    Completed,
}

/// A collaborative project.  Same member/applicant disjointness rules as
/// [`Group`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Initiative {
    pub id: String,
    pub title: String,
    pub description: String,
    pub owner_id: String,
    pub owner_name: String,
    pub members: BTreeSet<String>,
    pub pending_applicants: BTreeSet<String>,
    pub required_skill_tags: BTreeSet<String>,
    pub discovery_tags: BTreeSet<String>,
    pub role_assignments: BTreeMap<String, String>,
    pub lifecycle: LifecycleState,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message.
///
/// `container_id == DIRECT_CONTAINER` marks a 1:1 thread, where
/// `channel_id` is the canonical sorted pair of participant ids (see
/// [`crate::keys::dm_channel_id`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub container_id: String,
    pub channel_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub body: String,
    /// Assigned by the store at commit time.
    pub created_at: DateTime<Utc>,
    /// Store-assigned insertion counter; breaks `created_at` ties.
    pub seq: u64,
}

// ---------------------------------------------------------------------------
// Alert (notification)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Request,
    Approval,
    Rejection,
    RoleAssigned,
    PostLike,
    ProjectInvite,
    Mentorship,
}

/// A notification delivered to one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub recipient_id: String,
    pub title: String,
    pub body: String,
    pub kind: AlertKind,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

/// Mint a fresh opaque entity id.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
