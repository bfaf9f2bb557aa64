//! Projection engine: pure functions from the entity store to view values.
//!
//! Every projection is re-derivable from the store's current content alone,
//! which is what lets the registry recompute a view after any mutation
//! without diffing.

use crate::aggregate;
use crate::config::HubConfig;
use crate::keys::ViewKey;
use crate::models::{
    Account, Alert, ApprovalStatus, Broadcast, Channel, Group, Initiative, Message, Mission,
};
use crate::store::EntityStore;

/// Snapshot value delivered to subscribers and one-shot readers.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Group(Option<Group>),
    Initiative(Option<Initiative>),
    Channels(Vec<Channel>),
    Messages(Vec<Message>),
    Broadcasts(Vec<Broadcast>),
    Missions(Vec<Mission>),
    Accounts(Vec<Account>),
    Alerts(Vec<Alert>),
}

/// Compute the current projection for a view key.
pub fn project(store: &EntityStore, key: &ViewKey, config: &HubConfig) -> View {
    match key {
        ViewKey::Group(id) => View::Group(store.group(id).cloned()),
        ViewKey::Initiative(id) => View::Initiative(store.initiative(id).cloned()),
        ViewKey::Channels(container) => View::Channels(channels_for(store, container)),
        ViewKey::Messages(container, channel) => {
            View::Messages(messages_for(store, container, channel))
        }
        ViewKey::Broadcasts(group) => View::Broadcasts(broadcasts_for(store, group.as_deref())),
        ViewKey::ApprovedMissions => View::Missions(approved_missions(store)),
        ViewKey::PendingMissions(group) => View::Missions(pending_missions(store, group)),
        ViewKey::Leaderboard => {
            View::Accounts(aggregate::leaderboard(store, config.leaderboard_limit))
        }
        ViewKey::Partners(account) => {
            View::Accounts(aggregate::conversation_partners(store, account))
        }
        ViewKey::Mentors => View::Accounts(aggregate::mentors(store, config.mentor_point_threshold)),
        ViewKey::Alerts(account) => View::Alerts(alerts_for(store, account)),
    }
}

/// All channels of a group or initiative, ordered by name.
pub fn channels_for(store: &EntityStore, container_id: &str) -> Vec<Channel> {
    let mut channels: Vec<Channel> = store
        .channels
        .values()
        .filter(|c| c.container_id == container_id)
        .cloned()
        .collect();
    channels.sort_by(|a, b| a.name.cmp(&b.name));
    channels
}

/// Messages of one channel, ascending by timestamp; insertion order breaks
/// ties.
pub fn messages_for(store: &EntityStore, container_id: &str, channel_id: &str) -> Vec<Message> {
    let mut messages: Vec<Message> = store
        .messages
        .values()
        .filter(|m| m.container_id == container_id && m.channel_id == channel_id)
        .cloned()
        .collect();
    messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.seq.cmp(&b.seq)));
    messages
}

/// Broadcasts, optionally filtered to one group, newest first.
pub fn broadcasts_for(store: &EntityStore, group_id: Option<&str>) -> Vec<Broadcast> {
    let mut posts: Vec<Broadcast> = store
        .broadcasts
        .values()
        .filter(|b| group_id.map_or(true, |g| b.group_id == g))
        .cloned()
        .collect();
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    posts
}

/// Approved missions campus-wide, ascending by date.
pub fn approved_missions(store: &EntityStore) -> Vec<Mission> {
    let mut missions: Vec<Mission> = store
        .missions
        .values()
        .filter(|m| m.approval_status == ApprovalStatus::Approved)
        .cloned()
        .collect();
    missions.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
    missions
}

/// Missions of one group still awaiting a decision.
pub fn pending_missions(store: &EntityStore, group_id: &str) -> Vec<Mission> {
    let mut missions: Vec<Mission> = store
        .missions
        .values()
        .filter(|m| m.group_id == group_id && m.approval_status == ApprovalStatus::Pending)
        .cloned()
        .collect();
    missions.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
    missions
}

/// Alerts addressed to one account, newest first.
pub fn alerts_for(store: &EntityStore, recipient_id: &str) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = store
        .alerts
        .values()
        .filter(|a| a.recipient_id == recipient_id)
        .cloned()
        .collect();
    alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    alerts
}
