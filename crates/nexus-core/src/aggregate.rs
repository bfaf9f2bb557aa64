//! Derived aggregation helpers.
//!
//! Pure read-only functions over the entity store: leaderboards, mentor
//! rosters, conversation partners and the recent-achievement feed.  None of
//! these mutate state or depend on history outside the current records.

use crate::keys::{dm_participants, DIRECT_CONTAINER};
use crate::models::{Account, Badge, BadgeCategory, Role};
use crate::store::EntityStore;

/// Accounts ranked by points, highest first, ties broken by id so the
/// ordering is deterministic.  Capped at `limit`.
pub fn leaderboard(store: &EntityStore, limit: usize) -> Vec<Account> {
    let mut accounts: Vec<Account> = store.accounts.values().cloned().collect();
    accounts.sort_by(|a, b| b.points.cmp(&a.points).then(a.id.cmp(&b.id)));
    accounts.truncate(limit);
    accounts
}

/// Accounts eligible to mentor: at or above the point threshold, or admins.
pub fn mentors(store: &EntityStore, point_threshold: u64) -> Vec<Account> {
    let mut accounts: Vec<Account> = store
        .accounts
        .values()
        .filter(|a| a.points >= point_threshold || a.role == Role::Admin)
        .cloned()
        .collect();
    accounts.sort_by(|a, b| a.id.cmp(&b.id));
    accounts
}

/// Distinct accounts the given account has a direct-message thread with.
///
/// Derived entirely from message records in the `direct` container whose
/// composite channel id names the account.  Ordered by id.
pub fn conversation_partners(store: &EntityStore, account_id: &str) -> Vec<Account> {
    let mut partner_ids: Vec<&str> = store
        .messages
        .values()
        .filter(|m| m.container_id == DIRECT_CONTAINER)
        .filter_map(|m| dm_participants(&m.channel_id))
        .filter_map(|(low, high)| {
            if low == account_id {
                Some(high)
            } else if high == account_id {
                Some(low)
            } else {
                None
            }
        })
        .collect();
    partner_ids.sort_unstable();
    partner_ids.dedup();

    partner_ids
        .into_iter()
        .filter_map(|id| store.account(id).cloned())
        .collect()
}

/// One line of the campus-wide recent-achievement feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentAchievement {
    pub account_name: String,
    pub title: String,
}

/// The most recent achievement of every account that has one, ordered by
/// achievement date, newest first.
pub fn recent_achievements(store: &EntityStore) -> Vec<RecentAchievement> {
    let mut latest: Vec<(&Account, &crate::models::Achievement)> = store
        .accounts
        .values()
        .filter_map(|a| a.achievements.last().map(|ach| (a, ach)))
        .collect();
    latest.sort_by(|(a1, x), (a2, y)| y.date.cmp(&x.date).then(a1.id.cmp(&a2.id)));
    latest
        .into_iter()
        .map(|(account, ach)| RecentAchievement {
            account_name: account.display_name.clone(),
            title: ach.title.clone(),
        })
        .collect()
}

/// Built-in badge catalog.  Accounts reference these by id.
pub fn badge_catalog() -> &'static [Badge] {
    const CATALOG: &[Badge] = &[
        Badge {
            id: "b1",
            name: "Nexus Pioneer",
            description: "Early adopter of the campus hub.",
            icon: "Zap",
            color: "indigo",
            category: BadgeCategory::Milestone,
        },
        Badge {
            id: "b2",
            name: "Code Maestro",
            description: "Validated expertise in programming languages.",
            icon: "Terminal",
            color: "emerald",
            category: BadgeCategory::Skill,
        },
        Badge {
            id: "b3",
            name: "Event Legend",
            description: "Attended over 10 campus workshops.",
            icon: "Calendar",
            color: "amber",
            category: BadgeCategory::Participation,
        },
        Badge {
            id: "b4",
            name: "Top Contributor",
            description: "High engagement in community discussions.",
            icon: "MessageSquare",
            color: "blue",
            category: BadgeCategory::Contribution,
        },
        Badge {
            id: "b5",
            name: "Visionary",
            description: "Created a high-impact group or initiative.",
            icon: "Eye",
            color: "violet",
            category: BadgeCategory::Milestone,
        },
    ];
    CATALOG
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Achievement, AchievementKind};
    use chrono::{TimeZone, Utc};

    fn account(id: &str, points: u64, role: Role) -> Account {
        Account {
            id: id.to_string(),
            email: format!("{id}@campus.test"),
            display_name: id.to_uppercase(),
            role,
            points,
            joined_group_ids: Default::default(),
            skill_tags: Default::default(),
            interest_tags: Default::default(),
            badge_ids: Default::default(),
            achievements: Vec::new(),
            verified: true,
        }
    }

    #[test]
    fn leaderboard_ties_break_by_id() {
        let mut store = EntityStore::new();
        store.put_account(account("u2", 100, Role::Student));
        store.put_account(account("u1", 100, Role::Student));
        store.put_account(account("u3", 250, Role::Student));

        let board = leaderboard(&store, 50);
        let ids: Vec<&str> = board.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["u3", "u1", "u2"]);

        assert_eq!(leaderboard(&store, 2).len(), 2);
    }

    #[test]
    fn mentors_include_admins_below_threshold() {
        let mut store = EntityStore::new();
        store.put_account(account("novice", 10, Role::Student));
        store.put_account(account("veteran", 300, Role::Student));
        store.put_account(account("dean", 0, Role::Admin));

        let ids: Vec<String> = mentors(&store, 300).into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["dean", "veteran"]);
    }

    #[test]
    fn recent_achievements_take_latest_entry() {
        let mut store = EntityStore::new();
        let mut a = account("u1", 0, Role::Student);
        a.achievements = vec![
            Achievement {
                id: "a1".into(),
                title: "First Steps".into(),
                kind: AchievementKind::Event,
                description: String::new(),
                date: Utc.timestamp_opt(100, 0).unwrap(),
            },
            Achievement {
                id: "a2".into(),
                title: "Hackathon Finalist".into(),
                kind: AchievementKind::Event,
                description: String::new(),
                date: Utc.timestamp_opt(200, 0).unwrap(),
            },
        ];
        store.put_account(a);
        store.put_account(account("u2", 0, Role::Student));

        let feed = recent_achievements(&store);
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].title, "Hackathon Finalist");
        assert_eq!(feed[0].account_name, "U1");
    }
}
