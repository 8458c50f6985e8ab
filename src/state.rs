//! Shared bot state.
//!
//! `BotState` is the application context: built once at startup, handed to
//! the router and connection loop as `Arc<BotState>`. Tests build a fresh one
//! per case.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::commands::CommandDispatcher;
use crate::config::Config;
use crate::error::{LogError, SendError};
use crate::irc::{Message, casemap};
use crate::log::{LogSession, RetentionSweeper};
use crate::mailbox::OfflineMailbox;

/// Handle for queueing messages to the server.
///
/// The queue is unbounded: the connection loop both drains it and drives the
/// router that fills it, so a bounded queue could stall on itself.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<Message>,
}

impl Outbox {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, msg: Message) -> Result<(), SendError> {
        self.tx.send(msg)?;
        Ok(())
    }

    pub fn privmsg(&self, target: &str, text: &str) -> Result<(), SendError> {
        self.send(Message::privmsg(target, text))
    }
}

/// The bot's own, possibly changing, nickname.
#[derive(Debug)]
pub struct Identity {
    nick: RwLock<String>,
}

impl Identity {
    pub fn new(nick: &str) -> Self {
        Self {
            nick: RwLock::new(nick.to_string()),
        }
    }

    pub fn nick(&self) -> String {
        self.nick.read().clone()
    }

    pub fn set_nick(&self, nick: &str) {
        *self.nick.write() = nick.to_string();
    }

    pub fn is_me(&self, nick: &str) -> bool {
        casemap::eq(&self.nick.read(), nick)
    }
}

/// Everything the router and connection loop share.
pub struct BotState {
    pub config: Arc<Config>,
    pub identity: Identity,
    pub logs: Arc<LogSession>,
    pub mailbox: Arc<OfflineMailbox>,
    pub commands: CommandDispatcher,
    pub outbox: Outbox,
}

impl BotState {
    /// Build the bot state from `config`. Creates the log directory.
    ///
    /// Returns the receiving end of the outbox for the connection loop.
    pub fn new(
        config: Arc<Config>,
    ) -> Result<(Arc<Self>, mpsc::UnboundedReceiver<Message>), LogError> {
        let logs = Arc::new(LogSession::new(
            config.log.dir.clone(),
            config.server.channels.as_slice(),
            RetentionSweeper::new(config.log.retention_days),
        )?);
        let mailbox = Arc::new(OfflineMailbox::new());
        let commands =
            CommandDispatcher::with_builtins(config.bot.command_prefix.clone(), Arc::clone(&mailbox));
        let (outbox, rx) = Outbox::new();

        let state = Self {
            identity: Identity::new(&config.bot.nick),
            config,
            logs,
            mailbox,
            commands,
            outbox,
        };
        Ok((Arc::new(state), rx))
    }
}
