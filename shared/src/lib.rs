//! Fitbot Shared Library
//!
//! Domain types, message model and input parsing shared by the bot backend
//! and its platform adapters. Nothing here touches I/O.

pub mod command;
pub mod errors;
pub mod message;
pub mod models;
pub mod validation;

// Re-export commonly used items
pub use command::{parse_command, ParsedCommand};
pub use errors::*;
pub use message::{Message, MusicKind, Reply, Segment};
pub use models::{
    DietaryChoice, DietaryTally, HistoryCategory, MessageTarget, Platform, Sample, TargetKind,
};
