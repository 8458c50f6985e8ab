//! IRC message model, parsing and serialization.
//!
//! Covers what a client needs: an optional source prefix, the command (or
//! three-digit numeric) and its parameters. IRCv3 message tags are accepted
//! on input and skipped.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{take_till, take_till1},
    character::complete::{alpha1, char, satisfy, space0, space1},
    combinator::{opt, recognize, rest},
    multi::many0,
    sequence::{preceded, terminated, tuple},
};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while framing or parsing protocol lines.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("empty message")]
    EmptyMessage,

    #[error("missing command in '{0}'")]
    MissingCommand(String),
}

/// Source of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prefix {
    /// A server name, e.g. `irc.libera.chat`.
    ServerName(String),
    /// A user: nickname, username, hostname (the last two may be empty).
    Nickname(String, String, String),
}

impl Prefix {
    /// Nickname of a user prefix.
    pub fn nick(&self) -> Option<&str> {
        match self {
            Prefix::Nickname(nick, _, _) => Some(nick),
            Prefix::ServerName(_) => None,
        }
    }
}

impl FromStr for Prefix {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // `source` never fails: every part may be empty.
        let (nick, user, host) = match source(s) {
            Ok((_, parts)) => parts,
            Err(_) => (s, None, None),
        };
        let (user, host) = (user.unwrap_or_default(), host.unwrap_or_default());

        if user.is_empty() && host.is_empty() && nick.contains('.') {
            return Ok(Prefix::ServerName(nick.to_string()));
        }
        Ok(Prefix::Nickname(
            nick.to_string(),
            user.to_string(),
            host.to_string(),
        ))
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::ServerName(name) => f.write_str(name),
            Prefix::Nickname(nick, user, host) => {
                f.write_str(nick)?;
                if !user.is_empty() {
                    write!(f, "!{}", user)?;
                }
                if !host.is_empty() {
                    write!(f, "@{}", host)?;
                }
                Ok(())
            }
        }
    }
}

/// A single IRC protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub prefix: Option<Prefix>,
    /// Command name in uppercase, or a three-digit numeric.
    pub command: String,
    pub params: Vec<String>,
}

impl Message {
    pub fn new(command: &str, params: Vec<String>) -> Self {
        Self {
            prefix: None,
            command: command.to_ascii_uppercase(),
            params,
        }
    }

    pub fn nick(nick: &str) -> Self {
        Self::new("NICK", vec![nick.to_string()])
    }

    pub fn user(username: &str, realname: &str) -> Self {
        Self::new(
            "USER",
            vec![
                username.to_string(),
                "0".to_string(),
                "*".to_string(),
                realname.to_string(),
            ],
        )
    }

    pub fn join(channel: &str) -> Self {
        Self::new("JOIN", vec![channel.to_string()])
    }

    pub fn privmsg(target: &str, text: &str) -> Self {
        Self::new("PRIVMSG", vec![target.to_string(), text.to_string()])
    }

    pub fn notice(target: &str, text: &str) -> Self {
        Self::new("NOTICE", vec![target.to_string(), text.to_string()])
    }

    pub fn pong(token: &str) -> Self {
        Self::new("PONG", vec![token.to_string()])
    }

    pub fn quit(reason: &str) -> Self {
        Self::new("QUIT", vec![reason.to_string()])
    }

    /// Parameter at `index`.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// Nickname of the message source, if it came from a user.
    pub fn source_nick(&self) -> Option<&str> {
        self.prefix.as_ref().and_then(Prefix::nick)
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim_end_matches(['\r', '\n']).trim_start_matches(' ');
        if line.is_empty() {
            return Err(ProtocolError::EmptyMessage);
        }

        let (_, (prefix, command, params)) =
            message(line).map_err(|_| ProtocolError::MissingCommand(s.to_string()))?;

        Ok(Message {
            prefix: prefix.map(|p| p.parse::<Prefix>()).transpose()?,
            command: command.to_ascii_uppercase(),
            params: params.into_iter().map(str::to_string).collect(),
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{} ", prefix)?;
        }
        f.write_str(&self.command)?;

        if let Some((last, middle)) = self.params.split_last() {
            for param in middle {
                write!(f, " {}", param)?;
            }
            if last.is_empty() || last.contains(' ') || last.starts_with(':') {
                write!(f, " :{}", last)?;
            } else {
                write!(f, " {}", last)?;
            }
        }
        Ok(())
    }
}

// Line grammar:
//
//     [@tags SPACE] [:source SPACE] command *( SPACE param ) [SPACE :trailing]
//
// Tags are recognised and dropped. Runs of spaces count as one separator.

fn tags(input: &str) -> IResult<&str, &str> {
    preceded(char('@'), take_till(|c| c == ' '))(input)
}

fn prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_till1(|c| c == ' '))(input)
}

/// `nick[!user][@host]`
fn source(input: &str) -> IResult<&str, (&str, Option<&str>, Option<&str>)> {
    tuple((
        take_till(|c| c == '!' || c == '@'),
        opt(preceded(char('!'), take_till(|c| c == '@'))),
        opt(preceded(char('@'), rest)),
    ))(input)
}

/// A word of letters, or a three-digit numeric.
fn command(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(tuple((
            satisfy(|c| c.is_ascii_digit()),
            satisfy(|c| c.is_ascii_digit()),
            satisfy(|c| c.is_ascii_digit()),
        ))),
        alpha1,
    ))(input)
}

fn trailing(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), rest)(input)
}

fn middle(input: &str) -> IResult<&str, &str> {
    take_till1(|c| c == ' ')(input)
}

fn param(input: &str) -> IResult<&str, &str> {
    preceded(space1, alt((trailing, middle)))(input)
}

fn message(input: &str) -> IResult<&str, (Option<&str>, &str, Vec<&str>)> {
    let (input, _) = opt(terminated(tags, space0))(input)?;
    let (input, prefix) = opt(terminated(prefix, space0))(input)?;
    let (input, command) = command(input)?;
    let (input, params) = many0(param)(input)?;
    Ok((input, (prefix, command, params)))
}
