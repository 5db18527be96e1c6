//! Chat command layer
//!
//! - `command`: the command table (names, aliases, prompts)
//! - `conversation`: pending prompts and their storage
//! - `handlers`: one handler per command
//! - `dispatcher`: glue between an inbound message and the above

pub mod command;
pub mod conversation;
pub mod dispatcher;
pub mod handlers;

pub use command::CommandKind;
pub use conversation::{InMemorySessionStore, RedisSessionStore, SessionKey, SessionStore};
pub use dispatcher::dispatch;
pub use handlers::Outcome;
