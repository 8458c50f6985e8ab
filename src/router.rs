//! Event routing.
//!
//! Decides what each session event means for the log files, the mailbox and
//! the command handlers. Log writes happen inline so lines keep arrival
//! order; mailbox delivery and command handling are spawned so the
//! connection loop never waits on them.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::BotError;
use crate::event::Event;
use crate::log::format::single_line;
use crate::state::BotState;

/// Greeting posted when the bot itself joins a channel.
pub const SELF_INTRODUCTION: &str = "Hello, I'm yet another logbot written in Rust.";

/// Reply to anything sent to the bot directly.
pub const DIRECT_MESSAGE_REFUSAL: &str = "Sorry, I don't accept direct messages!";

/// Routes session events to logging, commands and the mailbox.
#[derive(Clone)]
pub struct EventRouter {
    bot: Arc<BotState>,
}

impl EventRouter {
    pub fn new(bot: Arc<BotState>) -> Self {
        Self { bot }
    }

    /// Handle one event.
    ///
    /// Errors are fatal to the session: either a log file could not be
    /// written or the outbound queue is gone.
    pub async fn handle(&self, event: Event) -> Result<(), BotError> {
        let bot = &self.bot;

        match event {
            Event::Connected => {
                for channel in &bot.config.server.channels {
                    debug!(channel = %channel, "Joining");
                    bot.outbox.send(crate::irc::Message::join(channel))?;
                }
            }

            Event::Join { channel, nick } => {
                if bot.identity.is_me(&nick) {
                    bot.outbox.privmsg(&channel, SELF_INTRODUCTION)?;
                } else {
                    let welcome = format!("Hello {}, Welcome to {}!", nick, channel);
                    bot.outbox.privmsg(&channel, &welcome)?;
                    self.spawn_delivery(nick.clone());
                }
                bot.logs
                    .append(&channel, &format!("{} entered {}", nick, channel))?;
            }

            Event::NickChange { old, new } => {
                if bot.identity.is_me(&old) {
                    bot.identity.set_nick(&new);
                    debug!(nick = %new, "Own nickname changed");
                } else {
                    self.spawn_delivery(new);
                }
            }

            Event::PrivateMessage { nick, .. } => {
                bot.outbox.privmsg(&nick, DIRECT_MESSAGE_REFUSAL)?;
            }

            Event::ChannelMessage {
                channel,
                nick,
                text,
            } => {
                bot.logs
                    .append(&channel, &format!("{}: {}", nick, single_line(&text)))?;
                self.spawn_dispatch(channel, nick, text);
            }

            Event::Action {
                channel,
                nick,
                text,
            } => {
                bot.logs
                    .append(&channel, &format!("***{} {}", nick, single_line(&text)))?;
            }

            Event::Part { channel, nick } => {
                bot.logs
                    .append(&channel, &format!("{} left {}", nick, channel))?;
            }

            Event::Quit { nick } => {
                // Membership is not tracked, so every configured channel
                // gets the line.
                let line = format!("{} quit IRC.", nick);
                for channel in &bot.config.server.channels {
                    bot.logs.append(channel, &line)?;
                }
            }
        }

        Ok(())
    }

    /// Hand `nick` everything waiting in the mailbox, in the background.
    fn spawn_delivery(&self, nick: String) {
        let bot = Arc::clone(&self.bot);
        tokio::spawn(async move {
            let outbox = bot.outbox.clone();
            let target = nick.clone();
            let result = bot
                .mailbox
                .drain_and_deliver(&nick, move |message| {
                    let sent = outbox.privmsg(&target, &message);
                    async move { sent }
                })
                .await;
            if let Err(e) = result {
                warn!(nick = %nick, error = %e, "Offline message delivery failed");
            }
        });
    }

    /// Run any command in `text`, replying in `channel`, in the background.
    fn spawn_dispatch(&self, channel: String, nick: String, text: String) {
        let bot = Arc::clone(&self.bot);
        tokio::spawn(async move {
            let Some(reply) = bot.commands.dispatch(&text, &nick).await else {
                return;
            };
            if let Err(e) = bot.outbox.privmsg(&channel, &single_line(&reply)) {
                warn!(channel = %channel, error = %e, "Failed to send command reply");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::irc::Message;
    use std::path::Path;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn config(log_dir: &Path) -> Arc<Config> {
        let mut config: Config = toml::from_str(
            r##"
[bot]
nick = "goyal"
username = "goyal"

[server]
address = "127.0.0.1:6667"
channels = ["#rust", "#go-nuts"]
"##,
        )
        .unwrap();
        config.log.dir = log_dir.to_path_buf();
        Arc::new(config)
    }

    fn router(log_dir: &Path) -> (EventRouter, Arc<BotState>, UnboundedReceiver<Message>) {
        let (bot, rx) = BotState::new(config(log_dir)).unwrap();
        (EventRouter::new(Arc::clone(&bot)), bot, rx)
    }

    async fn next(rx: &mut UnboundedReceiver<Message>) -> Message {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for outbound message")
            .expect("outbox closed")
    }

    fn today_log(dir: &Path, stem: &str) -> String {
        let day = chrono::Utc::now().date_naive();
        let path = dir.join(crate::log::format::file_name(stem, day));
        std::fs::read_to_string(path).unwrap_or_default()
    }

    #[tokio::test]
    async fn test_connected_joins_all_channels() {
        let dir = tempfile::tempdir().unwrap();
        let (router, _bot, mut rx) = router(dir.path());

        router.handle(Event::Connected).await.unwrap();

        assert_eq!(next(&mut rx).await, Message::join("#rust"));
        assert_eq!(next(&mut rx).await, Message::join("#go-nuts"));
    }

    #[tokio::test]
    async fn test_self_join_introduces() {
        let dir = tempfile::tempdir().unwrap();
        let (router, _bot, mut rx) = router(dir.path());

        router
            .handle(Event::Join {
                channel: "#rust".into(),
                nick: "Goyal".into(),
            })
            .await
            .unwrap();

        assert_eq!(next(&mut rx).await, Message::privmsg("#rust", SELF_INTRODUCTION));
        assert!(today_log(dir.path(), "rust").contains("Goyal entered #rust"));
    }

    #[tokio::test]
    async fn test_join_welcomes_and_delivers() {
        let dir = tempfile::tempdir().unwrap();
        let (router, bot, mut rx) = router(dir.path());
        bot.mailbox.enqueue("alice", "bob", "ping me");

        router
            .handle(Event::Join {
                channel: "#rust".into(),
                nick: "alice".into(),
            })
            .await
            .unwrap();

        assert_eq!(
            next(&mut rx).await,
            Message::privmsg("#rust", "Hello alice, Welcome to #rust!")
        );
        let delivered = next(&mut rx).await;
        assert_eq!(delivered.arg(0), Some("alice"));
        assert!(delivered.arg(1).unwrap().contains("bob"));
        assert!(delivered.arg(1).unwrap().ends_with("ping me"));
        assert_eq!(bot.mailbox.pending("alice"), 0);
    }

    #[tokio::test]
    async fn test_nick_change_delivers_to_new_nick() {
        let dir = tempfile::tempdir().unwrap();
        let (router, bot, mut rx) = router(dir.path());
        bot.mailbox.enqueue("alice", "bob", "welcome back");

        router
            .handle(Event::NickChange {
                old: "alice_away".into(),
                new: "alice".into(),
            })
            .await
            .unwrap();

        let delivered = next(&mut rx).await;
        assert_eq!(delivered.arg(0), Some("alice"));
        assert!(delivered.arg(1).unwrap().ends_with("welcome back"));
    }

    #[tokio::test]
    async fn test_own_nick_change_updates_identity() {
        let dir = tempfile::tempdir().unwrap();
        let (router, bot, _rx) = router(dir.path());

        router
            .handle(Event::NickChange {
                old: "goyal".into(),
                new: "goyal_".into(),
            })
            .await
            .unwrap();

        assert!(bot.identity.is_me("goyal_"));
    }

    #[tokio::test]
    async fn test_private_message_is_refused_not_dispatched() {
        let dir = tempfile::tempdir().unwrap();
        let (router, bot, mut rx) = router(dir.path());

        router
            .handle(Event::PrivateMessage {
                nick: "bob".into(),
                text: ",tell alice hi".into(),
            })
            .await
            .unwrap();

        assert_eq!(next(&mut rx).await, Message::privmsg("bob", DIRECT_MESSAGE_REFUSAL));
        tokio::task::yield_now().await;
        assert_eq!(bot.mailbox.recipients(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_channel_command_is_logged_and_acknowledged() {
        let dir = tempfile::tempdir().unwrap();
        let (router, bot, mut rx) = router(dir.path());

        router
            .handle(Event::ChannelMessage {
                channel: "#rust".into(),
                nick: "bob".into(),
                text: ",tell alice hi there".into(),
            })
            .await
            .unwrap();

        let ack = next(&mut rx).await;
        assert_eq!(ack.arg(0), Some("#rust"));
        assert_eq!(bot.mailbox.pending("alice"), 1);
        assert!(today_log(dir.path(), "rust").contains("bob: ,tell alice hi there"));
    }

    #[tokio::test]
    async fn test_action_part_and_quit_lines() {
        let dir = tempfile::tempdir().unwrap();
        let (router, _bot, _rx) = router(dir.path());

        router
            .handle(Event::Action {
                channel: "#rust".into(),
                nick: "bob".into(),
                text: "waves\r\nQUIT".into(),
            })
            .await
            .unwrap();
        router
            .handle(Event::Part {
                channel: "#rust".into(),
                nick: "bob".into(),
            })
            .await
            .unwrap();
        router
            .handle(Event::Quit { nick: "carol".into() })
            .await
            .unwrap();

        let rust = today_log(dir.path(), "rust");
        let lines: Vec<_> = rust.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("> ***bob waves  QUIT"));
        assert!(lines[1].ends_with("> bob left #rust"));
        assert!(lines[2].ends_with("> carol quit IRC."));
        assert!(today_log(dir.path(), "go-nuts").contains("carol quit IRC."));
    }

    #[tokio::test]
    async fn test_log_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let (router, bot, _rx) = router(dir.path());
        bot.logs.close_all();

        let err = router
            .handle(Event::Part {
                channel: "#rust".into(),
                nick: "bob".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::Log(_)));
    }
}
