//! Message dispatch
//!
//! Routes one inbound message either to the command awaiting an argument
//! in this conversation, or to the command it names.

use super::command::CommandKind;
use super::conversation::{apply_transition, is_cancel, ConversationState, SessionKey, CANCELLED};
use super::handlers::{self, Outcome};
use crate::adapters::ChatContext;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use fitbot_shared::{parse_command, Message, Reply};
use std::time::Duration;
use tracing::{debug, warn};

/// Handle one message. `None` means the bot stays quiet.
pub async fn dispatch(state: &AppState, ctx: &ChatContext) -> ApiResult<Option<Reply>> {
    let key = SessionKey::from_context(ctx);
    let prefixes = &state.config().bot.command_start;
    let sessions = state.sessions();

    let pending = sessions
        .load(&key)
        .await
        .map_err(ApiError::Internal)?
        .and_then(|session| session.pending_command());

    if let Some(command) = pending {
        if is_cancel(&ctx.text, prefixes) {
            sessions.remove(&key).await.map_err(ApiError::Internal)?;
            debug!(command = command.name(), "Conversation cancelled");
            return Ok(Some(Reply::at_sender(Message::text(CANCELLED))));
        }
        return run(state, ctx, &key, command, ctx.text.trim()).await;
    }

    let Some(parsed) = parse_command(&ctx.text, prefixes) else {
        return Ok(None);
    };
    let Some(command) = CommandKind::lookup(&parsed.name) else {
        return Ok(None);
    };

    if parsed.args.is_empty() {
        if let Some(prompt) = command.prompt() {
            apply_transition(
                sessions,
                &key,
                ConversationState::AwaitingArgument { command },
                session_ttl(state),
            )
            .await
            .map_err(ApiError::Internal)?;
            return Ok(Some(Reply::at_sender(Message::text(prompt))));
        }
    }

    run(state, ctx, &key, command, &parsed.args).await
}

async fn run(
    state: &AppState,
    ctx: &ChatContext,
    key: &SessionKey,
    command: CommandKind,
    arg: &str,
) -> ApiResult<Option<Reply>> {
    let sessions = state.sessions();

    let outcome = match handlers::handle(state, ctx, command, arg).await {
        Ok(outcome) => outcome,
        Err(e) => {
            if let Err(remove_err) = sessions.remove(key).await {
                warn!(error = %remove_err, "Failed to clear session after handler error");
            }
            return Err(e);
        }
    };

    let next = ConversationState::after(command, &outcome);
    apply_transition(sessions, key, next, session_ttl(state))
        .await
        .map_err(ApiError::Internal)?;

    Ok(match outcome {
        Outcome::Finish(reply) | Outcome::Reject(reply) => Some(reply),
        Outcome::Silent => None,
    })
}

fn session_ttl(state: &AppState) -> Duration {
    Duration::from_secs(state.config().bot.session_timeout_secs)
}
