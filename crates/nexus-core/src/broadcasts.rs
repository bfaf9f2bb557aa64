//! Broadcast (feed post) operations: publishing, likes, replies.
//!
//! Content moderation is an external collaborator the caller runs *before*
//! invoking these mutations; a rejected reply must simply never reach
//! [`Hub::add_reply`].

use chrono::Utc;

use crate::error::{HubError, Result};
use crate::hub::{Hub, Touched};
use crate::keys::ViewKey;
use crate::models::{new_id, Broadcast, MediaRef, Reply};
use crate::query;

impl Hub {
    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Broadcasts, optionally scoped to one group, newest first.
    pub fn broadcasts(&self, group_id: Option<&str>) -> Vec<Broadcast> {
        self.read(|store, _| query::broadcasts_for(store, group_id))
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Publish a post on a group's feed.  Any media was already uploaded
    /// through the media collaborator; only the returned reference is
    /// stored.
    pub fn add_broadcast(
        &self,
        group_id: &str,
        author_name: &str,
        body: &str,
        media_ref: Option<MediaRef>,
    ) -> Result<Broadcast> {
        let group_id = group_id.to_string();
        let author_name = author_name.to_string();
        let body = body.to_string();

        self.commit("add_broadcast", move |store| {
            let group = store
                .group(&group_id)
                .ok_or_else(|| HubError::NotFound(format!("group {group_id}")))?;

            let broadcast = Broadcast {
                id: new_id(),
                group_id: group_id.clone(),
                group_name: group.name.clone(),
                author_name,
                body,
                media_ref,
                created_at: Utc::now(),
                liked_by: Default::default(),
                replies: Vec::new(),
            };
            store.put_broadcast(broadcast.clone());

            let touched = vec![
                ViewKey::Broadcasts(None),
                ViewKey::Broadcasts(Some(group_id)),
            ];
            Ok((broadcast, Touched::keys(touched)))
        })
    }

    /// Flip an account's like on a post: add when absent, remove when
    /// present.  No alert is emitted.
    pub fn toggle_like(&self, broadcast_id: &str, account_id: &str) -> Result<()> {
        let broadcast_id = broadcast_id.to_string();
        let account_id = account_id.to_string();

        self.commit("toggle_like", move |store| {
            let broadcast = store.broadcast_mut(&broadcast_id)?;
            if !broadcast.liked_by.remove(&account_id) {
                broadcast.liked_by.insert(account_id);
            }
            let group_id = broadcast.group_id.clone();

            let touched = vec![
                ViewKey::Broadcasts(None),
                ViewKey::Broadcasts(Some(group_id)),
            ];
            Ok(((), Touched::keys(touched)))
        })
    }

    /// Append a reply to a post.  Replies are append-only; there is no
    /// edit or delete path.
    pub fn add_reply(
        &self,
        broadcast_id: &str,
        author_id: &str,
        author_name: &str,
        body: &str,
    ) -> Result<Reply> {
        let broadcast_id = broadcast_id.to_string();
        let author_id = author_id.to_string();
        let author_name = author_name.to_string();
        let body = body.to_string();

        self.commit("add_reply", move |store| {
            let broadcast = store.broadcast_mut(&broadcast_id)?;
            let reply = Reply {
                id: new_id(),
                author_id,
                author_name,
                body,
                created_at: Utc::now(),
            };
            broadcast.replies.push(reply.clone());
            let group_id = broadcast.group_id.clone();

            let touched = vec![
                ViewKey::Broadcasts(None),
                ViewKey::Broadcasts(Some(group_id)),
            ];
            Ok((reply, Touched::keys(touched)))
        })
    }
}
