//! OneBot V12 adapter
//!
//! V12 has no quick operation: every reply is a `send_message` action on
//! the connector's HTTP action endpoint. Images must be uploaded first and
//! are then referenced by the returned `file_id`.

use super::{BotApi, ChatContext};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use fitbot_shared::{Message, MessageTarget, Platform, Reply, Segment, TargetKind};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Webhook event, discriminated by `type`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Message(MessageEvent),
    Meta(MetaEvent),
    /// notice, request and anything newer
    #[serde(other)]
    Other,
}

/// Bot identity attached to events
#[derive(Debug, Clone, Deserialize)]
pub struct BotSelf {
    pub platform: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSegment {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageEvent {
    pub detail_type: String,
    #[serde(rename = "self")]
    pub bot: BotSelf,
    pub user_id: String,
    #[serde(default)]
    pub group_id: Option<String>,
    pub message: Vec<RawSegment>,
}

impl MessageEvent {
    /// Concatenated text segments; mentions and media are dropped
    pub fn plain_text(&self) -> String {
        self.message
            .iter()
            .filter(|segment| segment.kind == "text")
            .filter_map(|segment| segment.data.get("text").and_then(Value::as_str))
            .collect()
    }

    pub fn into_context(self) -> ChatContext {
        let text = self.plain_text();
        let group_id = match self.detail_type.as_str() {
            "group" => self.group_id,
            _ => None,
        };

        ChatContext {
            platform: Platform::OnebotV12,
            bot_id: self.bot.user_id,
            user_id: self.user_id,
            group_id,
            text,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotStatus {
    #[serde(rename = "self")]
    pub bot: BotSelf,
    pub online: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub good: bool,
    #[serde(default)]
    pub bots: Vec<BotStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetaEvent {
    pub detail_type: String,
    #[serde(default)]
    pub status: Option<Status>,
}

impl MetaEvent {
    /// Ids of bots reported online by a `status_update`
    pub fn online_bots(&self) -> Vec<String> {
        if self.detail_type != "status_update" {
            return Vec::new();
        }

        self.status
            .iter()
            .flat_map(|status| status.bots.iter())
            .filter(|bot| bot.online)
            .map(|bot| bot.bot.user_id.clone())
            .collect()
    }
}

pub fn music_link(id: i64) -> String {
    format!("https://music.163.com/song?id={}", id)
}

#[derive(Debug, Deserialize)]
struct ActionResponse {
    status: String,
    retcode: i64,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    message: String,
}

/// Client for the connector's HTTP action endpoint
#[derive(Clone)]
pub struct OneBotV12Api {
    http: reqwest::Client,
    url: String,
    access_token: Option<Arc<SecretString>>,
}

impl OneBotV12Api {
    pub fn new(
        http: reqwest::Client,
        url: impl Into<String>,
        access_token: Option<Arc<SecretString>>,
    ) -> Self {
        Self {
            http,
            url: url.into(),
            access_token,
        }
    }

    /// Run one action and return its `data`
    pub async fn action(&self, action: &str, params: Value) -> Result<Value> {
        let mut request = self
            .http
            .post(&self.url)
            .json(&json!({"action": action, "params": params}));
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response: ActionResponse = request
            .send()
            .await
            .with_context(|| format!("{} request failed", action))?
            .error_for_status()?
            .json()
            .await
            .context("unexpected OneBot V12 response body")?;

        debug!(action, status = %response.status, retcode = response.retcode, "OneBot V12 action");

        if response.status != "ok" {
            bail!(
                "{} failed with retcode {}: {}",
                action,
                response.retcode,
                response.message
            );
        }
        Ok(response.data)
    }

    /// Upload file bytes and return the connector's `file_id`
    pub async fn upload_file(&self, name: &str, data: &[u8]) -> Result<String> {
        let data = self
            .action(
                "upload_file",
                json!({"type": "data", "name": name, "data": STANDARD.encode(data)}),
            )
            .await?;

        data.get("file_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .context("upload_file response has no file_id")
    }

    /// Turn a message into V12 segments, uploading images on the way
    pub async fn encode_message(&self, message: &Message) -> Result<Vec<Value>> {
        let mut segments = Vec::with_capacity(message.segments().len());

        for segment in message.segments() {
            let value = match segment {
                Segment::Text(text) => json!({"type": "text", "data": {"text": text}}),
                Segment::Image { name, data } => {
                    let file_id = self.upload_file(name, data).await?;
                    json!({"type": "image", "data": {"file_id": file_id}})
                }
                Segment::Music { id, .. } => {
                    json!({"type": "text", "data": {"text": music_link(*id)}})
                }
            };
            segments.push(value);
        }

        Ok(segments)
    }

    pub async fn send(
        &self,
        target: &MessageTarget,
        message: &Message,
        mention: Option<&str>,
    ) -> Result<()> {
        let mut segments = Vec::new();
        if let Some(user_id) = mention {
            segments.push(json!({"type": "mention", "data": {"user_id": user_id}}));
        }
        segments.extend(self.encode_message(message).await?);

        let params = match target.kind {
            TargetKind::Private => json!({
                "detail_type": "private",
                "user_id": target.id,
                "message": segments,
            }),
            TargetKind::Group => json!({
                "detail_type": "group",
                "group_id": target.id,
                "message": segments,
            }),
        };

        self.action("send_message", params).await?;
        Ok(())
    }

    /// Answer the message described by `ctx`
    pub async fn send_reply(&self, ctx: &ChatContext, reply: &Reply) -> Result<()> {
        let mention = match (&ctx.group_id, reply.at_sender) {
            (Some(_), true) => Some(ctx.user_id.as_str()),
            _ => None,
        };

        self.send(&ctx.target(), &reply.message, mention).await
    }
}

#[async_trait]
impl BotApi for OneBotV12Api {
    async fn send_message(&self, target: &MessageTarget, message: &Message) -> Result<()> {
        self.send(target, message, None).await
    }
}
