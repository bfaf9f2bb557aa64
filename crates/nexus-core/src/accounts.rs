//! Account operations: sign-in minting, profile updates, gamification.

use std::collections::BTreeSet;

use chrono::Utc;

use crate::aggregate;
use crate::error::{HubError, Result};
use crate::hub::{Hub, Touched};
use crate::keys::ViewKey;
use crate::models::{
    new_id, Account, Achievement, AchievementKind, Alert, AlertKind, Role,
};

impl Hub {
    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Fetch one account.
    pub fn account(&self, id: &str) -> Option<Account> {
        self.read(|store, _| store.account(id).cloned())
    }

    /// All accounts, ordered by id, capped at `limit`.
    pub fn accounts(&self, limit: usize) -> Vec<Account> {
        self.read(|store, _| {
            let mut accounts: Vec<Account> = store.accounts.values().cloned().collect();
            accounts.sort_by(|a, b| a.id.cmp(&b.id));
            accounts.truncate(limit);
            accounts
        })
    }

    /// Accounts ranked by points (see [`crate::aggregate::leaderboard`]).
    pub fn leaderboard(&self) -> Vec<Account> {
        self.read(|store, config| aggregate::leaderboard(store, config.leaderboard_limit))
    }

    /// Mentor-eligible accounts.
    pub fn mentors(&self) -> Vec<Account> {
        self.read(|store, config| aggregate::mentors(store, config.mentor_point_threshold))
    }

    /// Direct-message partners of one account.
    pub fn conversation_partners(&self, account_id: &str) -> Vec<Account> {
        self.read(|store, _| aggregate::conversation_partners(store, account_id))
    }

    /// Campus-wide recent-achievement feed.
    pub fn recent_achievements(&self) -> Vec<aggregate::RecentAchievement> {
        self.read(|store, _| aggregate::recent_achievements(store))
    }

    /// Alerts addressed to one account, newest first.
    pub fn alerts(&self, recipient_id: &str) -> Vec<Alert> {
        self.read(|store, _| crate::query::alerts_for(store, recipient_id))
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Mint or look up the account for an identity-provider sign-in.
    ///
    /// The id, email and role come from the external identity provider and
    /// are trusted as-is.  An existing account with the same id is returned
    /// unchanged; an email already registered under a different id is a
    /// precondition failure.
    pub fn ensure_account(
        &self,
        id: &str,
        email: &str,
        display_name: Option<&str>,
        role: Role,
    ) -> Result<Account> {
        let id = id.to_string();
        let email = email.to_string();
        let display_name = display_name
            .map(str::to_string)
            .unwrap_or_else(|| email.split('@').next().unwrap_or(&email).to_string());

        self.commit("ensure_account", move |store| {
            if let Some(existing) = store.account(&id) {
                return Ok((existing.clone(), Touched::keys(Vec::new())));
            }
            if store.account_by_email(&email).is_some() {
                return Err(HubError::PreconditionFailed(format!(
                    "email {email} already registered"
                )));
            }

            let account = Account {
                id: id.clone(),
                email,
                display_name,
                role,
                points: 0,
                joined_group_ids: BTreeSet::new(),
                skill_tags: BTreeSet::new(),
                interest_tags: BTreeSet::new(),
                badge_ids: BTreeSet::new(),
                achievements: Vec::new(),
                verified: false,
            };
            store.put_account(account.clone());
            Ok((account, Touched::with_accounts(Vec::new())))
        })
    }

    /// Update the self-describing parts of a profile.  `None` fields are
    /// left unchanged.
    pub fn update_account_profile(
        &self,
        account_id: &str,
        display_name: Option<String>,
        skill_tags: Option<BTreeSet<String>>,
        interest_tags: Option<BTreeSet<String>>,
    ) -> Result<()> {
        let account_id = account_id.to_string();
        self.commit("update_account_profile", move |store| {
            let account = store.account_mut(&account_id)?;
            if let Some(name) = display_name {
                account.display_name = name;
            }
            if let Some(skills) = skill_tags {
                account.skill_tags = skills;
            }
            if let Some(interests) = interest_tags {
                account.interest_tags = interests;
            }
            Ok(((), Touched::with_accounts(Vec::new())))
        })
    }

    /// Award points and append a matching achievement entry.
    ///
    /// `amount` must be strictly positive; points never decrease and there
    /// is no penalty path.
    pub fn award_points(&self, account_id: &str, amount: i64, reason: &str) -> Result<()> {
        if amount <= 0 {
            return Err(HubError::InvalidArgument(format!(
                "point award must be positive, got {amount}"
            )));
        }
        let account_id = account_id.to_string();
        let reason = reason.to_string();

        self.commit("award_points", move |store| {
            let account = store.account_mut(&account_id)?;
            account.points += amount as u64;
            account.achievements.push(Achievement {
                id: new_id(),
                title: reason.clone(),
                kind: AchievementKind::Skill,
                description: reason,
                date: Utc::now(),
            });
            Ok(((), Touched::with_accounts(Vec::new())))
        })
    }

    /// Grant a badge from the built-in catalog.  Granting an already-held
    /// badge is a silent no-op.
    pub fn award_badge(&self, account_id: &str, badge_id: &str) -> Result<()> {
        if !aggregate::badge_catalog().iter().any(|b| b.id == badge_id) {
            return Err(HubError::InvalidArgument(format!(
                "unknown badge {badge_id}"
            )));
        }
        let account_id = account_id.to_string();
        let badge_id = badge_id.to_string();

        self.commit("award_badge", move |store| {
            let account = store.account_mut(&account_id)?;
            account.badge_ids.insert(badge_id);
            Ok(((), Touched::with_accounts(Vec::new())))
        })
    }

    /// Mark every alert addressed to `recipient_id` as read.
    pub fn mark_alerts_read(&self, recipient_id: &str) -> Result<()> {
        let recipient = recipient_id.to_string();
        self.commit("mark_alerts_read", move |store| {
            for alert in store.alerts.values_mut() {
                if alert.recipient_id == recipient {
                    alert.read = true;
                }
            }
            Ok(((), Touched::keys(vec![ViewKey::Alerts(recipient)])))
        })
    }
}

/// Build an alert record; shared by the mutation modules.
pub(crate) fn make_alert(recipient_id: &str, title: &str, body: String, kind: AlertKind) -> Alert {
    Alert {
        id: new_id(),
        recipient_id: recipient_id.to_string(),
        title: title.to_string(),
        body,
        kind,
        created_at: Utc::now(),
        read: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HubConfig;
    use crate::persist::MemoryAdapter;

    fn hub() -> Hub {
        Hub::open(Box::new(MemoryAdapter::new()), HubConfig::default()).unwrap()
    }

    #[test]
    fn ensure_account_mints_once() {
        let hub = hub();
        let first = hub
            .ensure_account("u1", "ada@campus.test", None, Role::Student)
            .unwrap();
        assert_eq!(first.display_name, "ada");
        assert_eq!(first.points, 0);

        let again = hub
            .ensure_account("u1", "ada@campus.test", Some("Ada"), Role::Admin)
            .unwrap();
        // Existing account returned unchanged.
        assert_eq!(again, first);
    }

    #[test]
    fn duplicate_email_under_new_id_is_rejected() {
        let hub = hub();
        hub.ensure_account("u1", "ada@campus.test", None, Role::Student)
            .unwrap();
        let err = hub
            .ensure_account("u2", "ada@campus.test", None, Role::Student)
            .unwrap_err();
        assert!(matches!(err, HubError::PreconditionFailed(_)));
    }

    #[test]
    fn negative_award_is_invalid_and_leaves_account_untouched() {
        let hub = hub();
        hub.ensure_account("u1", "ada@campus.test", None, Role::Student)
            .unwrap();

        let err = hub.award_points("u1", -5, "bad").unwrap_err();
        assert!(matches!(err, HubError::InvalidArgument(_)));

        let account = hub.account("u1").unwrap();
        assert_eq!(account.points, 0);
        assert!(account.achievements.is_empty());
    }

    #[test]
    fn award_appends_achievement() {
        let hub = hub();
        hub.ensure_account("u1", "ada@campus.test", None, Role::Student)
            .unwrap();
        hub.award_points("u1", 50, "Hackathon winner").unwrap();

        let account = hub.account("u1").unwrap();
        assert_eq!(account.points, 50);
        assert_eq!(account.achievements.len(), 1);
        assert_eq!(account.achievements[0].title, "Hackathon winner");
    }

    #[test]
    fn badge_grants_are_idempotent_and_validated() {
        let hub = hub();
        hub.ensure_account("u1", "ada@campus.test", None, Role::Student)
            .unwrap();

        hub.award_badge("u1", "b1").unwrap();
        hub.award_badge("u1", "b1").unwrap();
        assert_eq!(hub.account("u1").unwrap().badge_ids.len(), 1);

        assert!(matches!(
            hub.award_badge("u1", "nope"),
            Err(HubError::InvalidArgument(_))
        ));
    }
}
