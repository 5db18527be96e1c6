//! Webhook authentication
//!
//! OneBot connectors authenticate with a shared access token, either as a
//! bearer header or as an `access_token` query parameter.

mod middleware;

pub use middleware::{require_access_token, verify_access_token};
