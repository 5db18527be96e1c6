//! OneBot platform adapters
//!
//! Each adapter parses its webhook events into a [`ChatContext`] and turns
//! platform-neutral replies into its own wire format.

pub mod onebot_v11;
pub mod onebot_v12;

use async_trait::async_trait;
use fitbot_shared::{Message, MessageTarget, Platform};

pub use onebot_v11::OneBotV11Api;
pub use onebot_v12::OneBotV12Api;

/// An inbound chat message, independent of the platform it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ChatContext {
    pub platform: Platform,
    /// Account id of the bot that received the message
    pub bot_id: String,
    pub user_id: String,
    /// `None` for private chats
    pub group_id: Option<String>,
    pub text: String,
}

impl ChatContext {
    /// Where a reply to this message is delivered
    pub fn target(&self) -> MessageTarget {
        match &self.group_id {
            Some(group_id) => MessageTarget::group(self.platform, group_id.clone()),
            None => MessageTarget::private(self.platform, self.user_id.clone()),
        }
    }
}

/// Outbound side of a connector: proactive messages not tied to a webhook
#[async_trait]
pub trait BotApi: Send + Sync {
    async fn send_message(&self, target: &MessageTarget, message: &Message) -> anyhow::Result<()>;
}
