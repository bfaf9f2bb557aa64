//! Initiative (project) operations.
//!
//! Applicant flows mirror the group join flows: the same disjointness and
//! idempotency rules apply, and the owner can never be removed as a member.
//! Initiative membership is not mirrored into `Account.joined_group_ids`;
//! that set tracks groups only.

use std::collections::BTreeSet;

use crate::accounts::make_alert;
use crate::error::{HubError, Result};
use crate::hub::{Hub, Touched};
use crate::keys::ViewKey;
use crate::models::{new_id, AlertKind, Channel, Initiative, LifecycleState};

/// Channels provisioned for every new initiative.
const DEFAULT_INITIATIVE_CHANNELS: [&str; 3] = ["coordination", "technical-specs", "intel-sharing"];

/// Creation parameters for [`Hub::create_initiative`].
#[derive(Debug, Clone)]
pub struct InitiativeDraft {
    pub title: String,
    pub description: String,
    pub owner_id: String,
    pub required_skill_tags: BTreeSet<String>,
    pub discovery_tags: BTreeSet<String>,
}

impl Hub {
    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Fetch one initiative.
    pub fn initiative(&self, id: &str) -> Option<Initiative> {
        self.read(|store, _| store.initiative(id).cloned())
    }

    /// All initiatives, ordered by title.
    pub fn initiatives(&self) -> Vec<Initiative> {
        self.read(|store, _| {
            let mut initiatives: Vec<Initiative> = store.initiatives.values().cloned().collect();
            initiatives.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
            initiatives
        })
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Create an initiative with the creator enrolled as owner and member,
    /// plus the default channel set, as one logical unit.
    pub fn create_initiative(&self, draft: InitiativeDraft) -> Result<Initiative> {
        self.commit("create_initiative", move |store| {
            let owner = store
                .account(&draft.owner_id)
                .ok_or_else(|| HubError::NotFound(format!("account {}", draft.owner_id)))?;
            let owner_name = owner.display_name.clone();

            let initiative_id = new_id();
            let initiative = Initiative {
                id: initiative_id.clone(),
                title: draft.title,
                description: draft.description,
                owner_id: draft.owner_id.clone(),
                owner_name,
                members: [draft.owner_id].into(),
                pending_applicants: Default::default(),
                required_skill_tags: draft.required_skill_tags,
                discovery_tags: draft.discovery_tags,
                role_assignments: Default::default(),
                lifecycle: LifecycleState::Recruiting,
            };
            store.put_initiative(initiative.clone());

            for name in DEFAULT_INITIATIVE_CHANNELS {
                store.put_channel(Channel {
                    id: new_id(),
                    container_id: initiative_id.clone(),
                    name: name.to_string(),
                });
            }

            let touched = vec![
                ViewKey::Initiative(initiative_id.clone()),
                ViewKey::Channels(initiative_id),
            ];
            Ok((initiative, Touched::keys(touched)))
        })
    }

    /// Move the initiative to a new lifecycle state.
    pub fn set_initiative_lifecycle(&self, id: &str, state: LifecycleState) -> Result<()> {
        let id = id.to_string();
        self.commit("set_initiative_lifecycle", move |store| {
            store.initiative_mut(&id)?.lifecycle = state;
            Ok(((), Touched::keys(vec![ViewKey::Initiative(id)])))
        })
    }

    /// Enqueue an application and alert the initiative owner.  Already a
    /// member or already pending: silent no-op, no alert.
    pub fn apply_to_initiative(&self, initiative_id: &str, account_id: &str) -> Result<()> {
        let initiative_id = initiative_id.to_string();
        let account_id = account_id.to_string();

        self.commit("apply_to_initiative", move |store| {
            if store.account(&account_id).is_none() {
                return Err(HubError::NotFound(format!("account {account_id}")));
            }
            let initiative = store.initiative_mut(&initiative_id)?;
            if initiative.members.contains(&account_id)
                || initiative.pending_applicants.contains(&account_id)
            {
                return Ok(((), Touched::keys(Vec::new())));
            }
            initiative.pending_applicants.insert(account_id);

            let owner_id = initiative.owner_id.clone();
            let body = format!("A student has applied to join {}", initiative.title);
            store.put_alert(make_alert(
                &owner_id,
                "New Applicant",
                body,
                AlertKind::Request,
            ));

            let touched = vec![
                ViewKey::Initiative(initiative_id),
                ViewKey::Alerts(owner_id),
            ];
            Ok(((), Touched::keys(touched)))
        })
    }

    /// Move a pending applicant into the member set.
    pub fn approve_applicant(&self, initiative_id: &str, account_id: &str) -> Result<()> {
        let initiative_id = initiative_id.to_string();
        let account_id = account_id.to_string();

        self.commit("approve_applicant", move |store| {
            let initiative = store.initiative_mut(&initiative_id)?;
            if !initiative.pending_applicants.remove(&account_id) {
                return Err(HubError::PreconditionFailed(format!(
                    "account {account_id} has no pending application for initiative {initiative_id}"
                )));
            }
            initiative.members.insert(account_id.clone());
            let title = initiative.title.clone();

            store.put_alert(make_alert(
                &account_id,
                "Project Acceptance",
                format!("Your application to join {title} has been approved."),
                AlertKind::Approval,
            ));

            let touched = vec![
                ViewKey::Initiative(initiative_id),
                ViewKey::Alerts(account_id),
            ];
            Ok(((), Touched::keys(touched)))
        })
    }

    /// Drop a pending application.  Absent applications are a silent no-op.
    pub fn reject_applicant(&self, initiative_id: &str, account_id: &str) -> Result<()> {
        let initiative_id = initiative_id.to_string();
        let account_id = account_id.to_string();

        self.commit("reject_applicant", move |store| {
            let initiative = store.initiative_mut(&initiative_id)?;
            initiative.pending_applicants.remove(&account_id);
            Ok(((), Touched::keys(vec![ViewKey::Initiative(initiative_id)])))
        })
    }

    /// Remove a member and their role label.  Removing the owner is
    /// structurally forbidden.
    pub fn remove_initiative_member(&self, initiative_id: &str, account_id: &str) -> Result<()> {
        let initiative_id = initiative_id.to_string();
        let account_id = account_id.to_string();

        self.commit("remove_initiative_member", move |store| {
            let initiative = store.initiative_mut(&initiative_id)?;
            if initiative.owner_id == account_id {
                return Err(HubError::Forbidden(format!(
                    "cannot remove owner {account_id} from initiative {initiative_id}"
                )));
            }
            if !initiative.members.remove(&account_id) {
                return Ok(((), Touched::keys(Vec::new())));
            }
            initiative.role_assignments.remove(&account_id);

            store.put_alert(make_alert(
                &account_id,
                "Project Deauthorization",
                "You have been removed from the project mission team.".to_string(),
                AlertKind::Rejection,
            ));

            let touched = vec![
                ViewKey::Initiative(initiative_id),
                ViewKey::Alerts(account_id),
            ];
            Ok(((), Touched::keys(touched)))
        })
    }

    /// Set a member's free-text role label.  Membership is required and the
    /// owner carries no label, as for groups.
    pub fn assign_initiative_role(
        &self,
        initiative_id: &str,
        account_id: &str,
        label: &str,
    ) -> Result<()> {
        let initiative_id = initiative_id.to_string();
        let account_id = account_id.to_string();
        let label = label.to_string();

        self.commit("assign_initiative_role", move |store| {
            let initiative = store.initiative_mut(&initiative_id)?;
            if initiative.owner_id == account_id {
                return Err(HubError::Forbidden(format!(
                    "owner {account_id} does not carry a role label"
                )));
            }
            if !initiative.members.contains(&account_id) {
                return Err(HubError::PreconditionFailed(format!(
                    "account {account_id} is not a member of initiative {initiative_id}"
                )));
            }
            initiative.role_assignments.insert(account_id, label);
            Ok(((), Touched::keys(vec![ViewKey::Initiative(initiative_id)])))
        })
    }
}
