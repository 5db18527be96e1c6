//! Hello subscriptions
//!
//! A chat subscribes per bot; when that bot (re)connects, every subscribed
//! chat receives a short greeting.

use crate::adapters::BotApi;
use crate::error::ApiError;
use crate::repositories::HelloRepository;
use fitbot_shared::{Message, MessageTarget};
use sqlx::PgPool;
use tracing::{info, warn};

pub const GREETING: &str = "hello~";

/// What the `hello` command argument asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelloAction {
    Subscribe,
    Unsubscribe,
    Status,
}

impl HelloAction {
    /// `on`/`开启`, `off`/`关闭`, or empty for status
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "" => Some(Self::Status),
            "on" | "开启" => Some(Self::Subscribe),
            "off" | "关闭" => Some(Self::Unsubscribe),
            _ => None,
        }
    }
}

pub struct HelloService;

impl HelloService {
    /// Apply `action` for `target` on `bot_id` and return the reply text
    pub async fn apply(
        pool: &PgPool,
        bot_id: &str,
        target: &MessageTarget,
        action: HelloAction,
    ) -> Result<String, ApiError> {
        let text = match action {
            HelloAction::Subscribe => {
                let created = HelloRepository::subscribe(pool, bot_id, target)
                    .await
                    .map_err(ApiError::Internal)?;
                if created {
                    info!(bot_id, target_id = %target.id, "Hello subscribed");
                    "已开启 hello"
                } else {
                    "hello 已经是开启状态"
                }
            }
            HelloAction::Unsubscribe => {
                let removed = HelloRepository::unsubscribe(pool, bot_id, target)
                    .await
                    .map_err(ApiError::Internal)?;
                if removed {
                    info!(bot_id, target_id = %target.id, "Hello unsubscribed");
                    "已关闭 hello"
                } else {
                    "hello 本来就是关闭状态"
                }
            }
            HelloAction::Status => {
                let subscribed = HelloRepository::is_subscribed(pool, bot_id, target)
                    .await
                    .map_err(ApiError::Internal)?;
                if subscribed {
                    "hello 当前状态：开启"
                } else {
                    "hello 当前状态：关闭"
                }
            }
        };

        Ok(text.to_string())
    }

    /// Greet every chat subscribed to `bot_id`. Returns how many were sent.
    pub async fn greet(pool: &PgPool, api: &dyn BotApi, bot_id: &str) -> Result<usize, ApiError> {
        let targets: Vec<MessageTarget> = HelloRepository::list_by_bot(pool, bot_id)
            .await
            .map_err(ApiError::Internal)?
            .into_iter()
            .map(|record| record.target.0)
            .collect();

        let sent = send_greetings(api, &targets).await;
        info!(bot_id, sent, total = targets.len(), "Hello greetings sent");
        Ok(sent)
    }
}

/// Send the greeting to each target; failures are logged and skipped
pub async fn send_greetings(api: &dyn BotApi, targets: &[MessageTarget]) -> usize {
    let greeting = Message::text(GREETING);
    let mut sent = 0;

    for target in targets {
        match api.send_message(target, &greeting).await {
            Ok(()) => sent += 1,
            Err(e) => warn!(target_id = %target.id, error = %e, "Failed to send hello"),
        }
    }

    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use fitbot_shared::Platform;
    use rstest::rstest;
    use tokio::sync::Mutex;

    /// Records deliveries and fails for one target id
    #[derive(Default)]
    struct RecordingApi {
        fail_for: Option<String>,
        delivered: Mutex<Vec<(MessageTarget, String)>>,
    }

    #[async_trait]
    impl BotApi for RecordingApi {
        async fn send_message(
            &self,
            target: &MessageTarget,
            message: &Message,
        ) -> anyhow::Result<()> {
            if self.fail_for.as_deref() == Some(target.id.as_str()) {
                return Err(anyhow!("connector offline"));
            }
            self.delivered
                .lock()
                .await
                .push((target.clone(), message.plain_text()));
            Ok(())
        }
    }

    #[rstest]
    #[case("", Some(HelloAction::Status))]
    #[case("on", Some(HelloAction::Subscribe))]
    #[case(" ON ", Some(HelloAction::Subscribe))]
    #[case("开启", Some(HelloAction::Subscribe))]
    #[case("off", Some(HelloAction::Unsubscribe))]
    #[case("关闭", Some(HelloAction::Unsubscribe))]
    #[case("maybe", None)]
    fn test_parse_action(#[case] input: &str, #[case] expected: Option<HelloAction>) {
        assert_eq!(HelloAction::parse(input), expected);
    }

    #[tokio::test]
    async fn test_send_greetings_to_every_target() {
        let api = RecordingApi::default();
        let targets = vec![
            MessageTarget::group(Platform::OnebotV11, "100"),
            MessageTarget::private(Platform::OnebotV11, "200"),
        ];

        let sent = send_greetings(&api, &targets).await;

        assert_eq!(sent, 2);
        let delivered = api.delivered.lock().await;
        assert_eq!(delivered.len(), 2);
        assert!(delivered.iter().all(|(_, text)| text == GREETING));
    }

    #[tokio::test]
    async fn test_send_greetings_skips_failures() {
        let api = RecordingApi {
            fail_for: Some("100".to_string()),
            ..Default::default()
        };
        let targets = vec![
            MessageTarget::group(Platform::OnebotV11, "100"),
            MessageTarget::group(Platform::OnebotV11, "300"),
        ];

        let sent = send_greetings(&api, &targets).await;

        assert_eq!(sent, 1);
        assert_eq!(api.delivered.lock().await[0].0.id, "300");
    }
}
