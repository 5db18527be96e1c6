//! OneBot V11 adapter
//!
//! Inbound events arrive on the HTTP POST webhook. Replies to a message are
//! returned in the webhook response as a quick operation; proactive messages
//! go through the connector's `send_msg` API.
//!
//! Message text is read from the `message` field, which connectors send
//! either as a segment array or as a CQ-code string.

use super::{BotApi, ChatContext};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use fitbot_shared::{Message, MessageTarget, Platform, Reply, Segment, TargetKind};
use regex_lite::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Webhook event, discriminated by `post_type`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "post_type", rename_all = "snake_case")]
pub enum Event {
    Message(MessageEvent),
    MetaEvent(MetaEvent),
    /// notice, request and anything newer
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSegment {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl RawSegment {
    fn text(text: &str) -> Self {
        Self {
            kind: "text".to_string(),
            data: json!({ "text": unescape(text) }),
        }
    }

    fn is_mention_of(&self, self_id: i64) -> bool {
        if self.kind != "at" {
            return false;
        }
        match self.data.get("qq") {
            Some(Value::String(qq)) => qq.parse::<i64>().ok() == Some(self_id),
            Some(Value::Number(qq)) => qq.as_i64() == Some(self_id),
            _ => false,
        }
    }
}

/// The `message` field in either of its wire forms
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawMessage {
    Segments(Vec<RawSegment>),
    CqCode(String),
}

impl RawMessage {
    pub fn into_segments(self) -> Vec<RawSegment> {
        match self {
            RawMessage::Segments(segments) => segments,
            RawMessage::CqCode(raw) => parse_cq_code(&raw),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageEvent {
    pub message_type: String,
    pub self_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub message: Option<RawMessage>,
    /// CQ-code form of `message`, used when `message` is missing
    #[serde(default)]
    pub raw_message: String,
}

impl MessageEvent {
    pub fn into_context(self) -> ChatContext {
        let segments = match self.message {
            Some(message) => message.into_segments(),
            None => parse_cq_code(&self.raw_message),
        };
        let text = plain_text(&segments, self.self_id);
        let group_id = match self.message_type.as_str() {
            "group" => self.group_id.map(|id| id.to_string()),
            _ => None,
        };

        ChatContext {
            platform: Platform::OnebotV11,
            bot_id: self.self_id.to_string(),
            user_id: self.user_id.to_string(),
            group_id,
            text,
        }
    }
}

/// Concatenated text segments.
///
/// A leading mention of the bot itself addresses the bot and is dropped
/// together with the whitespace after it. Other mentions and media are
/// dropped.
pub fn plain_text(segments: &[RawSegment], self_id: i64) -> String {
    let (addressed, rest) = match segments.split_first() {
        Some((first, rest)) if first.is_mention_of(self_id) => (true, rest),
        _ => (false, segments),
    };

    let text: String = rest
        .iter()
        .filter(|segment| segment.kind == "text")
        .filter_map(|segment| segment.data.get("text").and_then(Value::as_str))
        .collect();

    if addressed {
        text.trim_start().to_string()
    } else {
        text
    }
}

fn cq_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[CQ:([A-Za-z0-9_.-]+)((?:,[^,=\]]+=[^,\]]*)*),?\]")
            .expect("valid CQ code regex")
    })
}

/// Reverse the CQ escaping of `&`, `[`, `]` and `,`
fn unescape(text: &str) -> String {
    text.replace("&#91;", "[")
        .replace("&#93;", "]")
        .replace("&#44;", ",")
        .replace("&amp;", "&")
}

/// Split a CQ-code string such as `[CQ:at,qq=10000] hi &amp; bye` into
/// segments
pub fn parse_cq_code(raw: &str) -> Vec<RawSegment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for captures in cq_code_regex().captures_iter(raw) {
        let (Some(whole), Some(kind)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        if whole.start() > last {
            segments.push(RawSegment::text(&raw[last..whole.start()]));
        }

        let data: Map<String, Value> = captures
            .get(2)
            .map(|params| params.as_str())
            .unwrap_or_default()
            .split(',')
            .filter_map(|pair| pair.split_once('='))
            .map(|(key, value)| (key.to_string(), Value::from(unescape(value))))
            .collect();
        segments.push(RawSegment {
            kind: kind.as_str().to_string(),
            data: Value::Object(data),
        });
        last = whole.end();
    }

    if last < raw.len() {
        segments.push(RawSegment::text(&raw[last..]));
    }
    segments
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetaEvent {
    pub self_id: i64,
    pub meta_event_type: String,
    #[serde(default)]
    pub sub_type: Option<String>,
}

impl MetaEvent {
    /// Lifecycle event sent once the connector is connected
    pub fn is_connect(&self) -> bool {
        self.meta_event_type == "lifecycle" && self.sub_type.as_deref() == Some("connect")
    }
}

pub fn encode_segment(segment: &Segment) -> Value {
    match segment {
        Segment::Text(text) => json!({"type": "text", "data": {"text": text}}),
        Segment::Image { data, .. } => json!({
            "type": "image",
            "data": {"file": format!("base64://{}", STANDARD.encode(data))}
        }),
        Segment::Music { kind, id } => json!({
            "type": "music",
            "data": {"type": kind.code(), "id": id.to_string()}
        }),
    }
}

pub fn encode_message(message: &Message) -> Vec<Value> {
    message.segments().iter().map(encode_segment).collect()
}

/// Quick operation body answering the webhook request
pub fn quick_reply(reply: &Reply) -> Value {
    json!({
        "reply": encode_message(&reply.message),
        "at_sender": reply.at_sender,
    })
}

/// V11 ids are numeric; anything else is passed through as a string
fn wire_id(id: &str) -> Value {
    id.parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(id))
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    retcode: i64,
}

/// Client for the connector's HTTP API
#[derive(Clone)]
pub struct OneBotV11Api {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<Arc<SecretString>>,
}

impl OneBotV11Api {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        access_token: Option<Arc<SecretString>>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        }
    }

    async fn call(&self, endpoint: &str, body: Value) -> Result<()> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut request = self.http.post(&url).json(&body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response: ApiResponse = request
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?
            .error_for_status()?
            .json()
            .await
            .context("unexpected OneBot V11 response body")?;

        debug!(endpoint, status = %response.status, retcode = response.retcode, "OneBot V11 API call");

        match response.status.as_str() {
            "ok" | "async" => Ok(()),
            _ => bail!("{} returned retcode {}", endpoint, response.retcode),
        }
    }
}

#[async_trait]
impl BotApi for OneBotV11Api {
    async fn send_message(&self, target: &MessageTarget, message: &Message) -> Result<()> {
        let body = match target.kind {
            TargetKind::Private => json!({
                "message_type": "private",
                "user_id": wire_id(&target.id),
                "message": encode_message(message),
            }),
            TargetKind::Group => json!({
                "message_type": "group",
                "group_id": wire_id(&target.id),
                "message": encode_message(message),
            }),
        };

        self.call("send_msg", body).await
    }
}
