//! Minimal IRC client plumbing: message model, line codec, CTCP and streams.

pub mod casemap;
pub mod codec;
pub mod ctcp;
pub mod message;
pub mod stream;

pub use codec::IrcCodec;
pub use message::{Message, Prefix, ProtocolError};
pub use stream::{IrcStream, connect};

/// Numeric sent once registration completes.
pub const RPL_WELCOME: &str = "001";
/// Numeric sent when the requested nickname is taken.
pub const ERR_NICKNAMEINUSE: &str = "433";

/// Whether `target` names a channel rather than a user.
pub fn is_channel(target: &str) -> bool {
    target.starts_with(['#', '&', '+', '!'])
}
