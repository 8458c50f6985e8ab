//! Offline mailbox for `tell` messages.
//!
//! Messages are queued per nickname and handed over on the recipient's next
//! presence signal (join or nick change). Queue and drain each touch a single
//! map entry under its shard lock, so a message enqueued while a drain is in
//! progress either rides along with that drain or waits for the next one.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::future::Future;
use tracing::debug;

use crate::irc::casemap::fold;
use crate::log::format::timestamp;

/// Nickname-keyed store of pending messages.
#[derive(Debug, Default)]
pub struct OfflineMailbox {
    pending: DashMap<String, Vec<String>>,
}

impl OfflineMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `body` from `sender` for `target`, stamped with the current time.
    pub fn enqueue(&self, target: &str, sender: &str, body: &str) {
        self.enqueue_at(target, sender, body, Utc::now());
    }

    /// Queue `body` from `sender` for `target`, stamped with `now`.
    pub fn enqueue_at(&self, target: &str, sender: &str, body: &str, now: DateTime<Utc>) {
        let rendered = format!(
            "{} left you a message on {} UTC: {}",
            sender,
            timestamp(now),
            body
        );
        self.pending.entry(fold(target)).or_default().push(rendered);
        debug!(recipient = %target, sender = %sender, "Queued offline message");
    }

    /// Remove and return everything queued for `nick`, oldest first.
    pub fn take(&self, nick: &str) -> Vec<String> {
        self.pending
            .remove(&fold(nick))
            .map(|(_, messages)| messages)
            .unwrap_or_default()
    }

    /// Take `nick`'s queue and hand each message to `send` in order.
    ///
    /// The queue is removed before the first send. If `send` fails, the
    /// messages not yet sent are dropped rather than requeued, so no message
    /// is ever delivered twice. Returns how many messages were sent.
    pub async fn drain_and_deliver<F, Fut, E>(&self, nick: &str, mut send: F) -> Result<usize, E>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let batch = self.take(nick);
        let total = batch.len();

        let mut sent = 0;
        for message in batch {
            if let Err(e) = send(message).await {
                debug!(nick = %nick, sent, dropped = total - sent, "Offline delivery aborted");
                return Err(e);
            }
            sent += 1;
        }

        if sent > 0 {
            debug!(nick = %nick, sent, "Delivered offline messages");
        }
        Ok(sent)
    }

    /// Number of messages waiting for `nick`.
    pub fn pending(&self, nick: &str) -> usize {
        self.pending.get(&fold(nick)).map_or(0, |m| m.len())
    }

    /// Number of nicknames with something waiting.
    pub fn recipients(&self) -> usize {
        self.pending.len()
    }
}
