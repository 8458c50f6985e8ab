//! Connection lifecycle: registration, keepalive and the main event loop.

use futures_util::{SinkExt, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::error::BotError;
use crate::event::Event;
use crate::irc::ctcp::Ctcp;
use crate::irc::{self, IrcCodec, Message};
use crate::router::EventRouter;
use crate::state::BotState;

/// Answer to CTCP VERSION requests.
pub const VERSION_REPLY: &str = concat!("slirc-logbot ", env!("CARGO_PKG_VERSION"));

/// Message sent with QUIT on shutdown.
pub const QUIT_MESSAGE: &str = "Logbot shutting down";

/// Run one IRC session over `stream` until the server closes it, `shutdown`
/// resolves, or a fatal error occurs.
///
/// `outbound` is the receiving end of `bot.outbox`.
pub async fn run<S, F>(
    stream: S,
    bot: Arc<BotState>,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    shutdown: F,
) -> Result<(), BotError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: Future<Output = ()>,
{
    let mut framed = Framed::new(stream, IrcCodec::new());
    let router = EventRouter::new(Arc::clone(&bot));
    let mut registered = false;

    // Registration
    framed.send(Message::nick(&bot.identity.nick())).await?;
    framed
        .send(Message::user(
            &bot.config.bot.username,
            bot.config.bot.realname(),
        ))
        .await?;

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                info!("Shutdown requested, leaving server");
                framed.send(Message::quit(QUIT_MESSAGE)).await?;
                return Ok(());
            }

            Some(msg) = outbound.recv() => {
                framed.send(msg).await?;
            }

            incoming = framed.next() => {
                let msg = match incoming {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        info!("Server closed the connection");
                        return Ok(());
                    }
                };

                match msg.command.as_str() {
                    "PING" => {
                        framed.send(Message::pong(msg.arg(0).unwrap_or_default())).await?;
                        continue;
                    }
                    "ERROR" => {
                        warn!(reason = msg.arg(0).unwrap_or_default(), "Server sent ERROR");
                        continue;
                    }
                    irc::ERR_NICKNAMEINUSE if !registered => {
                        let fallback = format!("{}_", bot.identity.nick());
                        warn!(nick = %fallback, "Nickname in use, trying fallback");
                        bot.identity.set_nick(&fallback);
                        framed.send(Message::nick(&fallback)).await?;
                        continue;
                    }
                    irc::RPL_WELCOME => {
                        registered = true;
                        // The server tells us which nick it actually accepted.
                        if let Some(nick) = msg.arg(0) {
                            bot.identity.set_nick(nick);
                        }
                        info!(nick = %bot.identity.nick(), "Registered with server");
                    }
                    "PRIVMSG" if is_ctcp_query(&msg, &bot) => {
                        if let Some(reply) = ctcp_reply(&msg) {
                            framed.send(reply).await?;
                        }
                        continue;
                    }
                    _ => {}
                }

                if let Some(event) = Event::from_message(&msg, &bot.identity.nick()) {
                    debug!(?event, "Routing event");
                    router.handle(event).await?;
                }
            }
        }
    }
}

/// A CTCP request other than ACTION sent straight to the bot.
fn is_ctcp_query(msg: &Message, bot: &BotState) -> bool {
    let (Some(target), Some(text)) = (msg.arg(0), msg.arg(1)) else {
        return false;
    };
    bot.identity.is_me(target) && Ctcp::parse(text).is_some_and(|c| !c.is("ACTION"))
}

/// Reply to CTCP VERSION and PING; other queries are ignored.
fn ctcp_reply(msg: &Message) -> Option<Message> {
    let sender = msg.source_nick()?;
    let ctcp = Ctcp::parse(msg.arg(1)?)?;

    let response = if ctcp.is("VERSION") {
        Ctcp {
            command: "VERSION",
            params: Some(VERSION_REPLY),
        }
    } else if ctcp.is("PING") {
        Ctcp {
            command: "PING",
            params: ctcp.params,
        }
    } else {
        debug!(sender = %sender, command = %ctcp.command, "Ignoring CTCP query");
        return None;
    };

    Some(Message::notice(sender, &response.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctcp_version_reply() {
        let msg: Message = ":bob!b@h PRIVMSG goyal :\x01VERSION\x01".parse().unwrap();
        let reply = ctcp_reply(&msg).unwrap();
        assert_eq!(reply.command, "NOTICE");
        assert_eq!(reply.arg(0), Some("bob"));
        assert_eq!(reply.arg(1), Some(format!("\x01VERSION {}\x01", VERSION_REPLY).as_str()));
    }

    #[test]
    fn test_ctcp_ping_echoes_token() {
        let msg: Message = ":bob!b@h PRIVMSG goyal :\x01PING 42\x01".parse().unwrap();
        assert_eq!(ctcp_reply(&msg).unwrap().arg(1), Some("\x01PING 42\x01"));
    }

    #[test]
    fn test_ctcp_other_ignored() {
        let msg: Message = ":bob!b@h PRIVMSG goyal :\x01FINGER\x01".parse().unwrap();
        assert!(ctcp_reply(&msg).is_none());
    }
}
