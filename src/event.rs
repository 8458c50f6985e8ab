//! Session events seen by the router.
//!
//! The connection loop turns raw protocol messages into these; everything
//! past this point is independent of the wire format.

use crate::irc::{self, Message, ctcp};

/// Something that happened in the chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Registration finished; the bot may join channels.
    Connected,
    Join { channel: String, nick: String },
    Part { channel: String, nick: String },
    /// The server does not say which channels the user shared with us.
    Quit { nick: String },
    NickChange { old: String, new: String },
    ChannelMessage { channel: String, nick: String, text: String },
    /// A PRIVMSG addressed to the bot itself.
    PrivateMessage { nick: String, text: String },
    Action { channel: String, nick: String, text: String },
}

impl Event {
    /// Translate `msg` into an event, given the bot's current nickname.
    ///
    /// Returns `None` for traffic the router has no interest in.
    pub fn from_message(msg: &Message, own_nick: &str) -> Option<Self> {
        if msg.command == irc::RPL_WELCOME {
            return Some(Event::Connected);
        }

        let nick = msg.source_nick()?.to_string();
        match msg.command.as_str() {
            "JOIN" => Some(Event::Join {
                channel: msg.arg(0)?.to_string(),
                nick,
            }),
            "PART" => Some(Event::Part {
                channel: msg.arg(0)?.to_string(),
                nick,
            }),
            "QUIT" => Some(Event::Quit { nick }),
            "NICK" => Some(Event::NickChange {
                old: nick,
                new: msg.arg(0)?.to_string(),
            }),
            "PRIVMSG" => {
                let target = msg.arg(0)?;
                let text = msg.arg(1)?;

                if irc::casemap::eq(target, own_nick) || !irc::is_channel(target) {
                    return Some(Event::PrivateMessage {
                        nick,
                        text: text.to_string(),
                    });
                }

                if let Some(action) = ctcp::action(text) {
                    return Some(Event::Action {
                        channel: target.to_string(),
                        nick,
                        text: action.to_string(),
                    });
                }
                if ctcp::Ctcp::parse(text).is_some() {
                    return None;
                }

                Some(Event::ChannelMessage {
                    channel: target.to_string(),
                    nick,
                    text: text.to_string(),
                })
            }
            _ => None,
        }
    }
}
