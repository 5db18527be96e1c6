//! Multi-turn conversation state
//!
//! A command that needs an argument the user did not give leaves a session
//! behind. The next message from the same user in the same chat, seen by
//! the same bot, is taken as that argument. Sessions expire after `bot.session_timeout_secs`.

use super::command::CommandKind;
use super::handlers::Outcome;
use crate::adapters::ChatContext;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fitbot_shared::{parse_command, Platform};
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub const CANCEL_WORD: &str = "取消";
pub const CANCEL_COMMAND: &str = "cancel";
pub const CANCELLED: &str = "已取消";

/// One conversation: a user in a chat, talking to one bot on a platform
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub platform: Platform,
    pub bot_id: String,
    /// Group id, `None` in private chats
    pub group_id: Option<String>,
    pub user_id: String,
}

impl SessionKey {
    pub fn from_context(ctx: &ChatContext) -> Self {
        Self {
            platform: ctx.platform,
            bot_id: ctx.bot_id.clone(),
            group_id: ctx.group_id.clone(),
            user_id: ctx.user_id.clone(),
        }
    }

    /// Key used by external stores
    pub fn storage_key(&self) -> String {
        let scope = match &self.group_id {
            Some(group_id) => format!("group:{}", group_id),
            None => "private".to_string(),
        };
        format!(
            "fitbot:session:{}:{}:{}:{}",
            self.platform, self.bot_id, scope, self.user_id
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConversationState {
    /// Prompted; the next message is the argument of `command`
    AwaitingArgument { command: CommandKind },
    /// Handled; nothing is stored
    Dispatched,
}

impl ConversationState {
    /// State after `command` produced `outcome`
    pub fn after(command: CommandKind, outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Reject(_) => ConversationState::AwaitingArgument { command },
            Outcome::Finish(_) | Outcome::Silent => ConversationState::Dispatched,
        }
    }

    pub fn pending_command(&self) -> Option<CommandKind> {
        match self {
            ConversationState::AwaitingArgument { command } => Some(*command),
            ConversationState::Dispatched => None,
        }
    }
}

/// `取消` or `{prefix}cancel`
pub fn is_cancel<S: AsRef<str>>(text: &str, prefixes: &[S]) -> bool {
    if text.trim() == CANCEL_WORD {
        return true;
    }
    parse_command(text, prefixes)
        .is_some_and(|parsed| parsed.name == CANCEL_COMMAND && parsed.args.is_empty())
}

/// Storage for pending conversations
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The stored state, `None` if absent or expired
    async fn load(&self, key: &SessionKey) -> Result<Option<ConversationState>>;

    /// Store `state` for `ttl`, replacing any previous one
    async fn save(&self, key: &SessionKey, state: ConversationState, ttl: Duration) -> Result<()>;

    async fn remove(&self, key: &SessionKey) -> Result<()>;

    /// Reachability check for readiness probes
    async fn ping(&self) -> Result<()>;

    fn backend(&self) -> &'static str;
}

/// Persist a transition: awaiting states are (re)saved, dispatched ones removed
pub async fn apply_transition(
    store: &dyn SessionStore,
    key: &SessionKey,
    state: ConversationState,
    ttl: Duration,
) -> Result<()> {
    match state {
        ConversationState::AwaitingArgument { .. } => store.save(key, state, ttl).await,
        ConversationState::Dispatched => store.remove(key).await,
    }
}

/// Process-local store; sessions are lost on restart
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionKey, (ConversationState, Instant)>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, key: &SessionKey) -> Result<Option<ConversationState>> {
        let sessions = self.sessions.read().await;
        let state = sessions
            .get(key)
            .filter(|(_, expires_at)| Instant::now() < *expires_at)
            .map(|(state, _)| *state);
        Ok(state)
    }

    async fn save(&self, key: &SessionKey, state: ConversationState, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, (_, expires_at)| now < *expires_at);
        sessions.insert(key.clone(), (state, now + ttl));
        Ok(())
    }

    async fn remove(&self, key: &SessionKey) -> Result<()> {
        self.sessions.write().await.remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Redis-backed store; expiry is delegated to `SET .. EX`
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, key: &SessionKey) -> Result<Option<ConversationState>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(key.storage_key())
            .query_async(&mut conn)
            .await
            .context("failed to load session")?;

        raw.map(|raw| serde_json::from_str(&raw).context("corrupt session"))
            .transpose()
    }

    async fn save(&self, key: &SessionKey, state: ConversationState, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let value = serde_json::to_string(&state)?;
        redis::cmd("SET")
            .arg(key.storage_key())
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await
            .context("failed to save session")?;
        Ok(())
    }

    async fn remove(&self, key: &SessionKey) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(key.storage_key())
            .query_async::<_, ()>(&mut conn)
            .await
            .context("failed to remove session")?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .context("redis ping failed")?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitbot_shared::Reply;
    use rstest::rstest;

    fn key(user_id: &str, group_id: Option<&str>) -> SessionKey {
        SessionKey {
            platform: Platform::OnebotV11,
            bot_id: "10000".to_string(),
            group_id: group_id.map(str::to_string),
            user_id: user_id.to_string(),
        }
    }

    const AWAITING_HISTORY: ConversationState = ConversationState::AwaitingArgument {
        command: CommandKind::History,
    };

    #[test]
    fn test_storage_key() {
        assert_eq!(
            key("42", Some("777")).storage_key(),
            "fitbot:session:onebot_v11:10000:group:777:42"
        );
        assert_eq!(
            key("42", None).storage_key(),
            "fitbot:session:onebot_v11:10000:private:42"
        );
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&AWAITING_HISTORY).unwrap();
        assert_eq!(json, r#"{"state":"awaiting_argument","command":"history"}"#);
        let back: ConversationState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, AWAITING_HISTORY);
    }

    #[test]
    fn test_transitions() {
        let command = CommandKind::Weight;
        assert_eq!(
            ConversationState::after(command, &Outcome::Reject(Reply::text("again"))),
            ConversationState::AwaitingArgument { command }
        );
        assert_eq!(
            ConversationState::after(command, &Outcome::Finish(Reply::text("ok"))),
            ConversationState::Dispatched
        );
        assert_eq!(
            ConversationState::after(command, &Outcome::Silent),
            ConversationState::Dispatched
        );
    }

    #[rstest]
    #[case("取消", true)]
    #[case(" 取消 ", true)]
    #[case("/cancel", true)]
    #[case("/cancel now", false)]
    #[case("cancel", false)]
    #[case("a", false)]
    fn test_is_cancel(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(is_cancel(text, &["/"]), expected);
    }

    #[tokio::test]
    async fn test_memory_store_save_load_remove() {
        let store = InMemorySessionStore::new();
        let k = key("42", None);

        assert_eq!(store.load(&k).await.unwrap(), None);

        store
            .save(&k, AWAITING_HISTORY, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.load(&k).await.unwrap(), Some(AWAITING_HISTORY));

        store.remove(&k).await.unwrap();
        assert_eq!(store.load(&k).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_expired_session_is_absent() {
        let store = InMemorySessionStore::new();
        let k = key("42", None);

        store.save(&k, AWAITING_HISTORY, Duration::ZERO).await.unwrap();

        assert_eq!(store.load(&k).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_keys_are_scoped() {
        let store = InMemorySessionStore::new();
        store
            .save(&key("42", Some("1")), AWAITING_HISTORY, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.load(&key("42", Some("2"))).await.unwrap(), None);
        assert_eq!(store.load(&key("42", None)).await.unwrap(), None);
        assert_eq!(store.load(&key("43", Some("1"))).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_apply_transition_dispatched_removes() {
        let store = InMemorySessionStore::new();
        let k = key("42", None);
        let ttl = Duration::from_secs(60);

        apply_transition(&store, &k, AWAITING_HISTORY, ttl).await.unwrap();
        assert!(store.load(&k).await.unwrap().is_some());

        apply_transition(&store, &k, ConversationState::Dispatched, ttl)
            .await
            .unwrap();
        assert!(store.load(&k).await.unwrap().is_none());
    }
}
