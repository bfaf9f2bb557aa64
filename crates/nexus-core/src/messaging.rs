//! Channels and chat messages, including 1:1 direct threads.
//!
//! Direct threads live in the reserved `direct` container; their channel id
//! is the canonical sorted participant pair from
//! [`crate::keys::dm_channel_id`], so both sides address the same thread.

use chrono::Utc;

use crate::error::{HubError, Result};
use crate::hub::{Hub, Touched};
use crate::keys::{dm_channel_id, ViewKey, DIRECT_CONTAINER};
use crate::models::{new_id, Channel, Message};
use crate::query;

impl Hub {
    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Channels of a group or initiative, ordered by name.
    pub fn channels(&self, container_id: &str) -> Vec<Channel> {
        self.read(|store, _| query::channels_for(store, container_id))
    }

    /// Messages of one channel, oldest first.
    pub fn messages(&self, container_id: &str, channel_id: &str) -> Vec<Message> {
        self.read(|store, _| query::messages_for(store, container_id, channel_id))
    }

    /// Messages of the direct thread between two accounts, oldest first.
    pub fn direct_messages(&self, account_a: &str, account_b: &str) -> Vec<Message> {
        let channel = dm_channel_id(account_a, account_b);
        self.messages(DIRECT_CONTAINER, &channel)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Add a channel to an existing group or initiative.
    pub fn create_channel(&self, container_id: &str, name: &str) -> Result<Channel> {
        let container_id = container_id.to_string();
        let name = name.to_string();

        self.commit("create_channel", move |store| {
            if !store.container_exists(&container_id) {
                return Err(HubError::NotFound(format!("container {container_id}")));
            }
            let channel = Channel {
                id: new_id(),
                container_id: container_id.clone(),
                name,
            };
            store.put_channel(channel.clone());
            Ok((channel, Touched::keys(vec![ViewKey::Channels(container_id)])))
        })
    }

    /// Remove a channel.  Deleting an unknown id is a silent no-op.
    /// Messages already sent to the channel are retained.
    pub fn delete_channel(&self, channel_id: &str) -> Result<()> {
        let channel_id = channel_id.to_string();

        self.commit("delete_channel", move |store| {
            let Some(channel) = store.channels.remove(&channel_id) else {
                return Ok(((), Touched::keys(Vec::new())));
            };
            Ok((
                (),
                Touched::keys(vec![ViewKey::Channels(channel.container_id)]),
            ))
        })
    }

    /// Append a message with a store-assigned timestamp.
    ///
    /// Invalidates exactly the one messages view for this channel.
    pub fn send_message(
        &self,
        container_id: &str,
        channel_id: &str,
        sender_id: &str,
        sender_name: &str,
        body: &str,
    ) -> Result<Message> {
        let container_id = container_id.to_string();
        let channel_id = channel_id.to_string();
        let sender_id = sender_id.to_string();
        let sender_name = sender_name.to_string();
        let body = body.to_string();

        self.commit("send_message", move |store| {
            let mut message = Message {
                id: new_id(),
                container_id: container_id.clone(),
                channel_id: channel_id.clone(),
                sender_id,
                sender_name,
                body,
                created_at: Utc::now(),
                seq: 0,
            };
            message.seq = store.put_message(message.clone());

            let touched = vec![ViewKey::Messages(container_id, channel_id)];
            Ok((message, Touched::keys(touched)))
        })
    }

    /// Append a message to the 1:1 thread between sender and recipient.
    ///
    /// Also refreshes both participants' conversation-partner lists, which
    /// are derived from direct-thread messages.
    pub fn send_direct_message(
        &self,
        sender_id: &str,
        sender_name: &str,
        recipient_id: &str,
        body: &str,
    ) -> Result<Message> {
        let channel_id = dm_channel_id(sender_id, recipient_id);
        let sender_id = sender_id.to_string();
        let sender_name = sender_name.to_string();
        let recipient_id = recipient_id.to_string();
        let body = body.to_string();

        self.commit("send_direct_message", move |store| {
            if store.account(&recipient_id).is_none() {
                return Err(HubError::NotFound(format!("account {recipient_id}")));
            }
            let mut message = Message {
                id: new_id(),
                container_id: DIRECT_CONTAINER.to_string(),
                channel_id: channel_id.clone(),
                sender_id: sender_id.clone(),
                sender_name,
                body,
                created_at: Utc::now(),
                seq: 0,
            };
            message.seq = store.put_message(message.clone());

            let touched = vec![
                ViewKey::Messages(DIRECT_CONTAINER.to_string(), channel_id),
                ViewKey::Partners(sender_id),
                ViewKey::Partners(recipient_id),
            ];
            Ok((message, Touched::keys(touched)))
        })
    }
}
