//! Group (club) operations: creation, membership flows, role labels.
//!
//! Membership invariants enforced here:
//! - `owner_id` is always a member,
//! - `members` and `pending_requests` stay disjoint,
//! - `Account.joined_group_ids` mirrors `Group.members` on both sides,
//! - `role_assignments` carries entries for non-owner members only.

use crate::accounts::make_alert;
use crate::error::{HubError, Result};
use crate::hub::{Hub, Touched};
use crate::keys::ViewKey;
use crate::models::{new_id, AlertKind, ApprovalStatus, Channel, Group};

/// Name of the channel every new group starts with.
const DEFAULT_GROUP_CHANNEL: &str = "lounge";

impl Hub {
    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Fetch one group.
    pub fn group(&self, id: &str) -> Option<Group> {
        self.read(|store, _| store.group(id).cloned())
    }

    /// All groups, ordered by name.
    pub fn groups(&self) -> Vec<Group> {
        self.read(|store, _| {
            let mut groups: Vec<Group> = store.groups.values().cloned().collect();
            groups.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
            groups
        })
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Create a group with the creator enrolled as owner and member, plus
    /// the default channel, as one logical unit.
    pub fn create_group(
        &self,
        owner_id: &str,
        name: &str,
        description: &str,
        category: &str,
        logo_ref: Option<String>,
    ) -> Result<Group> {
        let owner_id = owner_id.to_string();
        let name = name.to_string();
        let description = description.to_string();
        let category = category.to_string();

        self.commit("create_group", move |store| {
            let owner = store.account_mut(&owner_id)?;

            let group_id = new_id();
            owner.joined_group_ids.insert(group_id.clone());

            let group = Group {
                id: group_id.clone(),
                name,
                description,
                owner_id: owner_id.clone(),
                members: [owner_id.clone()].into(),
                pending_requests: Default::default(),
                category,
                logo_ref,
                role_assignments: Default::default(),
                approval_status: ApprovalStatus::Approved,
            };
            store.put_group(group.clone());

            // Default channel in the same commit: the group is never
            // observable without at least one channel.
            store.put_channel(Channel {
                id: new_id(),
                container_id: group_id.clone(),
                name: DEFAULT_GROUP_CHANNEL.to_string(),
            });

            let touched = vec![
                ViewKey::Group(group_id.clone()),
                ViewKey::Channels(group_id),
            ];
            Ok((group, Touched::with_accounts(touched)))
        })
    }

    /// Update a group's descriptive fields.  `None` fields are unchanged.
    pub fn update_group_profile(
        &self,
        group_id: &str,
        name: Option<String>,
        description: Option<String>,
        category: Option<String>,
        logo_ref: Option<String>,
    ) -> Result<()> {
        let group_id = group_id.to_string();
        self.commit("update_group_profile", move |store| {
            let group = store.group_mut(&group_id)?;
            if let Some(name) = name {
                group.name = name;
            }
            if let Some(description) = description {
                group.description = description;
            }
            if let Some(category) = category {
                group.category = category;
            }
            if let Some(logo) = logo_ref {
                group.logo_ref = Some(logo);
            }
            Ok(((), Touched::keys(vec![ViewKey::Group(group_id)])))
        })
    }

    /// Enqueue a join request and alert the group owner.
    ///
    /// Already a member or already pending: silent no-op, no alert.
    pub fn request_join(&self, group_id: &str, account_id: &str) -> Result<()> {
        let group_id = group_id.to_string();
        let account_id = account_id.to_string();

        self.commit("request_join", move |store| {
            if store.account(&account_id).is_none() {
                return Err(HubError::NotFound(format!("account {account_id}")));
            }
            let group = store.group_mut(&group_id)?;
            if group.members.contains(&account_id) || group.pending_requests.contains(&account_id)
            {
                return Ok(((), Touched::keys(Vec::new())));
            }
            group.pending_requests.insert(account_id);

            let owner_id = group.owner_id.clone();
            let body = format!("A student has requested to join {}", group.name);
            store.put_alert(make_alert(
                &owner_id,
                "New Join Request",
                body,
                AlertKind::Request,
            ));

            let touched = vec![ViewKey::Group(group_id), ViewKey::Alerts(owner_id)];
            Ok(((), Touched::keys(touched)))
        })
    }

    /// Move a pending requester into the member set and mirror the group id
    /// into the account's joined list, atomically.
    pub fn approve_join(&self, group_id: &str, account_id: &str) -> Result<()> {
        let group_id = group_id.to_string();
        let account_id = account_id.to_string();

        self.commit("approve_join", move |store| {
            let group = store.group_mut(&group_id)?;
            if !group.pending_requests.remove(&account_id) {
                return Err(HubError::PreconditionFailed(format!(
                    "account {account_id} has no pending request for group {group_id}"
                )));
            }
            group.members.insert(account_id.clone());

            let account = store.account_mut(&account_id)?;
            account.joined_group_ids.insert(group_id.clone());

            store.put_alert(make_alert(
                &account_id,
                "Club Admittance",
                "Your request to join the club has been approved.".to_string(),
                AlertKind::Approval,
            ));

            let touched = vec![ViewKey::Group(group_id), ViewKey::Alerts(account_id)];
            Ok(((), Touched::with_accounts(touched)))
        })
    }

    /// Drop a pending request.  Absent requests are a silent no-op.
    pub fn reject_join(&self, group_id: &str, account_id: &str) -> Result<()> {
        let group_id = group_id.to_string();
        let account_id = account_id.to_string();

        self.commit("reject_join", move |store| {
            let group = store.group_mut(&group_id)?;
            group.pending_requests.remove(&account_id);
            Ok(((), Touched::keys(vec![ViewKey::Group(group_id)])))
        })
    }

    /// Remove a member, their role label and the mirrored joined-group
    /// entry.  Removing the owner is structurally forbidden.
    pub fn remove_member(&self, group_id: &str, account_id: &str) -> Result<()> {
        let group_id = group_id.to_string();
        let account_id = account_id.to_string();

        self.commit("remove_member", move |store| {
            let group = store.group_mut(&group_id)?;
            if group.owner_id == account_id {
                return Err(HubError::Forbidden(format!(
                    "cannot remove owner {account_id} from group {group_id}"
                )));
            }
            if !group.members.remove(&account_id) {
                return Ok(((), Touched::keys(Vec::new())));
            }
            group.role_assignments.remove(&account_id);
            let group_name = group.name.clone();

            let account = store.account_mut(&account_id)?;
            account.joined_group_ids.remove(&group_id);

            let body =
                format!("Your operative status in {group_name} has been revoked by leadership.");
            store.put_alert(make_alert(
                &account_id,
                "Membership Terminated",
                body,
                AlertKind::Rejection,
            ));

            let touched = vec![ViewKey::Group(group_id), ViewKey::Alerts(account_id)];
            Ok(((), Touched::with_accounts(touched)))
        })
    }

    /// Set a member's free-text role label and alert them.
    ///
    /// The label is not validated beyond membership; the owner carries no
    /// label by construction.
    pub fn assign_role(&self, group_id: &str, account_id: &str, label: &str) -> Result<()> {
        let group_id = group_id.to_string();
        let account_id = account_id.to_string();
        let label = label.to_string();

        self.commit("assign_role", move |store| {
            let group = store.group_mut(&group_id)?;
            if group.owner_id == account_id {
                return Err(HubError::Forbidden(format!(
                    "owner {account_id} does not carry a role label"
                )));
            }
            if !group.members.contains(&account_id) {
                return Err(HubError::PreconditionFailed(format!(
                    "account {account_id} is not a member of group {group_id}"
                )));
            }
            group.role_assignments.insert(account_id.clone(), label.clone());

            let body =
                format!("Your new status in the organization has been updated to: {label}");
            store.put_alert(make_alert(
                &account_id,
                "Role Reassigned",
                body,
                AlertKind::RoleAssigned,
            ));

            let touched = vec![ViewKey::Group(group_id), ViewKey::Alerts(account_id)];
            Ok(((), Touched::keys(touched)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HubConfig;
    use crate::models::Role;
    use crate::persist::MemoryAdapter;

    fn hub_with_accounts() -> Hub {
        let hub = Hub::open(Box::new(MemoryAdapter::new()), HubConfig::default()).unwrap();
        for (id, email) in [("A", "a@campus.test"), ("B", "b@campus.test")] {
            hub.ensure_account(id, email, None, Role::Student).unwrap();
        }
        hub
    }

    #[test]
    fn create_group_enrolls_owner_and_provisions_channel() {
        let hub = hub_with_accounts();
        let group = hub
            .create_group("A", "Tech Wizards", "coding club", "Technology", None)
            .unwrap();

        assert!(group.members.contains("A"));
        assert_eq!(group.owner_id, "A");
        assert!(group.role_assignments.is_empty());

        let owner = hub.account("A").unwrap();
        assert!(owner.joined_group_ids.contains(&group.id));

        let channels = hub.channels(&group.id);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "lounge");
        assert_eq!(channels[0].container_id, group.id);
    }

    #[test]
    fn join_flow_keeps_both_sides_in_sync() {
        let hub = hub_with_accounts();
        let group = hub
            .create_group("A", "Tech Wizards", "", "Technology", None)
            .unwrap();

        hub.request_join(&group.id, "B").unwrap();
        let pending = hub.group(&group.id).unwrap();
        assert!(pending.pending_requests.contains("B"));
        assert!(!pending.members.contains("B"));
        // Owner got the request alert.
        assert_eq!(hub.alerts("A").len(), 1);

        hub.approve_join(&group.id, "B").unwrap();
        let joined = hub.group(&group.id).unwrap();
        assert!(joined.members.contains("B"));
        assert!(joined.pending_requests.is_empty());
        assert!(hub.account("B").unwrap().joined_group_ids.contains(&group.id));
        assert_eq!(hub.alerts("B").len(), 1);
    }

    #[test]
    fn duplicate_join_request_is_a_silent_noop() {
        let hub = hub_with_accounts();
        let group = hub
            .create_group("A", "Tech Wizards", "", "Technology", None)
            .unwrap();

        hub.request_join(&group.id, "B").unwrap();
        hub.request_join(&group.id, "B").unwrap();

        let g = hub.group(&group.id).unwrap();
        assert_eq!(g.pending_requests.len(), 1);
        // No second alert for the duplicate.
        assert_eq!(hub.alerts("A").len(), 1);
    }

    #[test]
    fn approving_a_non_pending_request_fails() {
        let hub = hub_with_accounts();
        let group = hub
            .create_group("A", "Tech Wizards", "", "Technology", None)
            .unwrap();

        let err = hub.approve_join(&group.id, "B").unwrap_err();
        assert!(matches!(err, HubError::PreconditionFailed(_)));
        assert!(hub.group(&group.id).unwrap().members.len() == 1);
    }

    #[test]
    fn owner_cannot_be_removed() {
        let hub = hub_with_accounts();
        let group = hub
            .create_group("A", "Tech Wizards", "", "Technology", None)
            .unwrap();

        let err = hub.remove_member(&group.id, "A").unwrap_err();
        assert!(matches!(err, HubError::Forbidden(_)));

        let g = hub.group(&group.id).unwrap();
        assert!(g.members.contains("A"));
        assert!(hub.account("A").unwrap().joined_group_ids.contains(&group.id));
    }

    #[test]
    fn removal_clears_role_and_mirrored_membership() {
        let hub = hub_with_accounts();
        let group = hub
            .create_group("A", "Tech Wizards", "", "Technology", None)
            .unwrap();
        hub.request_join(&group.id, "B").unwrap();
        hub.approve_join(&group.id, "B").unwrap();
        hub.assign_role(&group.id, "B", "Treasurer").unwrap();

        hub.remove_member(&group.id, "B").unwrap();

        let g = hub.group(&group.id).unwrap();
        assert!(!g.members.contains("B"));
        assert!(g.role_assignments.is_empty());
        assert!(!hub.account("B").unwrap().joined_group_ids.contains(&group.id));
    }

    #[test]
    fn role_assignment_requires_membership_and_skips_owner() {
        let hub = hub_with_accounts();
        let group = hub
            .create_group("A", "Tech Wizards", "", "Technology", None)
            .unwrap();

        assert!(matches!(
            hub.assign_role(&group.id, "B", "Treasurer"),
            Err(HubError::PreconditionFailed(_))
        ));
        assert!(matches!(
            hub.assign_role(&group.id, "A", "Founder"),
            Err(HubError::Forbidden(_))
        ));
    }

    #[test]
    fn invariants_hold_after_interleaved_flows() {
        let hub = hub_with_accounts();
        let group = hub
            .create_group("A", "Tech Wizards", "", "Technology", None)
            .unwrap();

        hub.request_join(&group.id, "B").unwrap();
        hub.approve_join(&group.id, "B").unwrap();
        hub.request_join(&group.id, "B").unwrap(); // member now; no-op
        hub.reject_join(&group.id, "B").unwrap(); // nothing pending; no-op

        let g = hub.group(&group.id).unwrap();
        let both: Vec<_> = g.members.intersection(&g.pending_requests).collect();
        assert!(both.is_empty());
        for member in &g.members {
            assert!(hub
                .account(member)
                .unwrap()
                .joined_group_ids
                .contains(&g.id));
        }
    }
}
