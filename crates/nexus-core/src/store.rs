//! The normalized in-memory entity store.
//!
//! One map per entity kind, keyed by id.  The store is the single source of
//! truth for every projection; it is owned for writes by the mutation
//! engine and read by the query engine and subscription registry.
//!
//! The store serializes wholesale (including the message insertion
//! counter) so a persistence adapter can round-trip it losslessly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{HubError, Result};
use crate::models::{Account, Alert, Broadcast, Channel, Group, Initiative, Message, Mission};

/// Normalized table of all records, keyed by kind + id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStore {
    pub accounts: HashMap<String, Account>,
    pub groups: HashMap<String, Group>,
    pub missions: HashMap<String, Mission>,
    pub broadcasts: HashMap<String, Broadcast>,
    pub channels: HashMap<String, Channel>,
    pub initiatives: HashMap<String, Initiative>,
    pub messages: HashMap<String, Message>,
    pub alerts: HashMap<String, Alert>,
    /// Next message insertion counter; never reused or rewound.
    pub next_seq: u64,
}

macro_rules! typed_accessors {
    ($get:ident, $get_mut:ident, $field:ident, $ty:ty, $kind:literal) => {
        /// Fetch one record, or `None` when absent.
        pub fn $get(&self, id: &str) -> Option<&$ty> {
            self.$field.get(id)
        }

        /// Read-modify-write access to one record.  Signals `NotFound`
        /// on an absent id.
        pub fn $get_mut(&mut self, id: &str) -> Result<&mut $ty> {
            self.$field
                .get_mut(id)
                .ok_or_else(|| HubError::NotFound(format!(concat!($kind, " {}"), id)))
        }
    };
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    typed_accessors!(account, account_mut, accounts, Account, "account");
    typed_accessors!(group, group_mut, groups, Group, "group");
    typed_accessors!(mission, mission_mut, missions, Mission, "mission");
    typed_accessors!(broadcast, broadcast_mut, broadcasts, Broadcast, "broadcast");
    typed_accessors!(channel, channel_mut, channels, Channel, "channel");
    typed_accessors!(
        initiative,
        initiative_mut,
        initiatives,
        Initiative,
        "initiative"
    );
    typed_accessors!(message, message_mut, messages, Message, "message");
    typed_accessors!(alert, alert_mut, alerts, Alert, "alert");

    /// Upsert, replacing any existing record wholesale.
    pub fn put_account(&mut self, account: Account) {
        self.accounts.insert(account.id.clone(), account);
    }

    pub fn put_group(&mut self, group: Group) {
        self.groups.insert(group.id.clone(), group);
    }

    pub fn put_mission(&mut self, mission: Mission) {
        self.missions.insert(mission.id.clone(), mission);
    }

    pub fn put_broadcast(&mut self, broadcast: Broadcast) {
        self.broadcasts.insert(broadcast.id.clone(), broadcast);
    }

    pub fn put_channel(&mut self, channel: Channel) {
        self.channels.insert(channel.id.clone(), channel);
    }

    pub fn put_initiative(&mut self, initiative: Initiative) {
        self.initiatives.insert(initiative.id.clone(), initiative);
    }

    pub fn put_alert(&mut self, alert: Alert) {
        self.alerts.insert(alert.id.clone(), alert);
    }

    /// Insert a message, assigning the next insertion counter.
    pub fn put_message(&mut self, mut message: Message) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        message.seq = seq;
        self.messages.insert(message.id.clone(), message);
        seq
    }

    /// Whether `container_id` names an existing group or initiative.
    pub fn container_exists(&self, container_id: &str) -> bool {
        self.groups.contains_key(container_id) || self.initiatives.contains_key(container_id)
    }

    /// Look up an account by email, if any.
    pub fn account_by_email(&self, email: &str) -> Option<&Account> {
        self.accounts.values().find(|a| a.email == email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Channel, Role};

    fn sample_account(id: &str) -> Account {
        Account {
            id: id.to_string(),
            email: format!("{id}@campus.test"),
            display_name: id.to_string(),
            role: Role::Student,
            points: 0,
            joined_group_ids: Default::default(),
            skill_tags: Default::default(),
            interest_tags: Default::default(),
            badge_ids: Default::default(),
            achievements: Vec::new(),
            verified: false,
        }
    }

    #[test]
    fn put_then_get() {
        let mut store = EntityStore::new();
        store.put_account(sample_account("u1"));
        assert_eq!(store.account("u1").unwrap().email, "u1@campus.test");
        assert!(store.account("u2").is_none());
    }

    #[test]
    fn patch_absent_id_signals_not_found() {
        let mut store = EntityStore::new();
        assert!(matches!(
            store.account_mut("missing"),
            Err(HubError::NotFound(_))
        ));
    }

    #[test]
    fn message_seq_is_monotonic() {
        let mut store = EntityStore::new();
        let msg = |id: &str| Message {
            id: id.to_string(),
            container_id: "g1".into(),
            channel_id: "c1".into(),
            sender_id: "u1".into(),
            sender_name: "U1".into(),
            body: "hi".into(),
            created_at: chrono::Utc::now(),
            seq: 0,
        };
        let a = store.put_message(msg("m1"));
        let b = store.put_message(msg("m2"));
        assert!(b > a);
    }

    #[test]
    fn container_lookup_spans_groups_and_initiatives() {
        use crate::models::{ApprovalStatus, Group, Initiative, LifecycleState};

        let mut store = EntityStore::new();
        // A channel alone does not make its container exist.
        store.put_channel(Channel {
            id: "c1".into(),
            container_id: "g1".into(),
            name: "lounge".into(),
        });
        assert!(!store.container_exists("g1"));

        store.put_group(Group {
            id: "g1".into(),
            name: "Tech Wizards".into(),
            description: String::new(),
            owner_id: "u1".into(),
            members: ["u1".to_string()].into(),
            pending_requests: Default::default(),
            category: "Technology".into(),
            logo_ref: None,
            role_assignments: Default::default(),
            approval_status: ApprovalStatus::Approved,
        });
        store.put_initiative(Initiative {
            id: "p1".into(),
            title: "Solar Car".into(),
            description: String::new(),
            owner_id: "u1".into(),
            owner_name: "u1".into(),
            members: ["u1".to_string()].into(),
            pending_applicants: Default::default(),
            required_skill_tags: Default::default(),
            discovery_tags: Default::default(),
            role_assignments: Default::default(),
            lifecycle: LifecycleState::Recruiting,
        });

        assert!(store.container_exists("g1"));
        assert!(store.container_exists("p1"));
        assert!(!store.container_exists("nope"));
    }
}
