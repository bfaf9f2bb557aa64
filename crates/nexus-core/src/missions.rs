//! Mission (event proposal) operations.
//!
//! Missions are approval-gated: `pending -> approved` or
//! `pending -> rejected`, both terminal.  Approval stores the externally
//! generated highlight text supplied by the caller; the core never calls
//! the text-generation collaborator itself.

use crate::error::{HubError, Result};
use crate::hub::{Hub, Touched};
use crate::keys::ViewKey;
use crate::models::{new_id, ApprovalStatus, MediaRef, Mission, MissionKind};
use crate::query;

/// Creation parameters for [`Hub::propose_mission`].
#[derive(Debug, Clone)]
pub struct MissionProposal {
    pub group_id: String,
    pub title: String,
    pub description: String,
    /// Calendar date in `YYYY-MM-DD` form.
    pub date: String,
    pub location: String,
    pub kind: MissionKind,
    pub proposer_id: String,
    pub media_ref: Option<MediaRef>,
}

impl Hub {
    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Approved missions campus-wide, ascending by date.
    pub fn approved_missions(&self) -> Vec<Mission> {
        self.read(|store, _| query::approved_missions(store))
    }

    /// A group's missions still awaiting a decision.
    pub fn pending_missions(&self, group_id: &str) -> Vec<Mission> {
        self.read(|store, _| query::pending_missions(store, group_id))
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// File a new mission proposal in the pending state.
    pub fn propose_mission(&self, proposal: MissionProposal) -> Result<Mission> {
        self.commit("propose_mission", move |store| {
            if store.group(&proposal.group_id).is_none() {
                return Err(HubError::NotFound(format!("group {}", proposal.group_id)));
            }
            let proposer = store
                .account(&proposal.proposer_id)
                .ok_or_else(|| HubError::NotFound(format!("account {}", proposal.proposer_id)))?;

            let mission = Mission {
                id: new_id(),
                group_id: proposal.group_id.clone(),
                title: proposal.title,
                description: proposal.description,
                date: proposal.date,
                location: proposal.location,
                kind: proposal.kind,
                approval_status: ApprovalStatus::Pending,
                proposer_id: proposal.proposer_id.clone(),
                proposer_name: proposer.display_name.clone(),
                highlight: String::new(),
                media_ref: proposal.media_ref,
            };
            store.put_mission(mission.clone());

            let touched = vec![ViewKey::PendingMissions(proposal.group_id)];
            Ok((mission, Touched::keys(touched)))
        })
    }

    /// Approve a pending mission, storing the supplied highlight text.
    ///
    /// Re-approving an already-approved mission is a silent no-op and does
    /// not overwrite its highlight.  Approving a rejected mission fails:
    /// both decision branches are terminal.
    pub fn approve_mission(&self, mission_id: &str, highlight: &str) -> Result<()> {
        let mission_id = mission_id.to_string();
        let highlight = highlight.to_string();

        self.commit("approve_mission", move |store| {
            let mission = store.mission_mut(&mission_id)?;
            match mission.approval_status {
                ApprovalStatus::Approved => Ok(((), Touched::keys(Vec::new()))),
                ApprovalStatus::Rejected => Err(HubError::PreconditionFailed(format!(
                    "mission {mission_id} was already rejected"
                ))),
                ApprovalStatus::Pending => {
                    mission.approval_status = ApprovalStatus::Approved;
                    mission.highlight = highlight;
                    let group_id = mission.group_id.clone();
                    let touched = vec![
                        ViewKey::ApprovedMissions,
                        ViewKey::PendingMissions(group_id),
                    ];
                    Ok(((), Touched::keys(touched)))
                }
            }
        })
    }

    /// Reject a pending mission.  Re-rejecting is a silent no-op; rejecting
    /// an approved mission fails.
    pub fn reject_mission(&self, mission_id: &str) -> Result<()> {
        let mission_id = mission_id.to_string();

        self.commit("reject_mission", move |store| {
            let mission = store.mission_mut(&mission_id)?;
            match mission.approval_status {
                ApprovalStatus::Rejected => Ok(((), Touched::keys(Vec::new()))),
                ApprovalStatus::Approved => Err(HubError::PreconditionFailed(format!(
                    "mission {mission_id} was already approved"
                ))),
                ApprovalStatus::Pending => {
                    mission.approval_status = ApprovalStatus::Rejected;
                    let group_id = mission.group_id.clone();
                    Ok(((), Touched::keys(vec![ViewKey::PendingMissions(group_id)])))
                }
            }
        })
    }
}
