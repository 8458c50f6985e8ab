//! `tell <nick> <message>` - leave a message for someone who is away.

use async_trait::async_trait;
use std::sync::Arc;

use super::CommandHandler;
use crate::mailbox::OfflineMailbox;

/// Handler for the `tell` command.
pub struct TellHandler {
    mailbox: Arc<OfflineMailbox>,
}

impl TellHandler {
    pub fn new(mailbox: Arc<OfflineMailbox>) -> Self {
        Self { mailbox }
    }
}

#[async_trait]
impl CommandHandler for TellHandler {
    async fn handle(&self, args: &str, sender: &str) -> Option<String> {
        // Malformed invocations get no reply at all.
        let (target, body) = args.split_once(char::is_whitespace)?;
        let body = body.trim();
        if target.is_empty() || body.is_empty() {
            return None;
        }

        self.mailbox.enqueue(target, sender, body);
        Some(format!(
            "{}: I'll pass that on when {} is around.",
            sender, target
        ))
    }
}
