//! In-channel bot commands.
//!
//! A command is a channel message starting with the configured marker
//! (`,tell alice see you at 5`). The first token names the command and the
//! rest of the line is passed to its handler untouched apart from trimming.

mod tell;

pub use tell::TellHandler;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::mailbox::OfflineMailbox;

/// A bot command.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Run the command with its arguments and the sender's nick.
    ///
    /// Returns text to post back to the channel the command came from, or
    /// `None` to stay quiet.
    async fn handle(&self, args: &str, sender: &str) -> Option<String>;
}

/// Registry of command handlers keyed by lowercase command name.
pub struct CommandDispatcher {
    prefix: String,
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandDispatcher {
    /// Create an empty dispatcher for commands introduced by `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            handlers: HashMap::new(),
        }
    }

    /// Create a dispatcher with the built-in commands registered.
    pub fn with_builtins(prefix: impl Into<String>, mailbox: Arc<OfflineMailbox>) -> Self {
        let mut dispatcher = Self::new(prefix);
        dispatcher.register("tell", Box::new(TellHandler::new(mailbox)));
        dispatcher
    }

    /// Register `handler` under `name` (matched case-insensitively).
    pub fn register(&mut self, name: &'static str, handler: Box<dyn CommandHandler>) {
        debug_assert!(name.chars().all(|c| !c.is_ascii_uppercase()));
        self.handlers.insert(name, handler);
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Run the command in `text`, if there is one.
    ///
    /// Text without the marker and unknown command names are ignored
    /// without a reply.
    pub async fn dispatch(&self, text: &str, sender: &str) -> Option<String> {
        let rest = text.trim().strip_prefix(self.prefix.as_str())?;
        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };

        let Some(handler) = self.handlers.get(name.to_ascii_lowercase().as_str()) else {
            debug!(command = %name, sender = %sender, "Ignoring unknown command");
            return None;
        };

        debug!(command = %name, sender = %sender, "Dispatching command");
        handler.handle(args, sender).await
    }
}
