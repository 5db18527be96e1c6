//! Command handlers
//!
//! A handler receives the argument text and answers with an [`Outcome`].
//! Bad input is never an error: it becomes a `Reject` whose reply asks
//! again.

use super::command::CommandKind;
use crate::adapters::ChatContext;
use crate::error::ApiError;
use crate::repositories::{UserRecord, UserRepository};
use crate::services::check_in::{BodyFatInput, FitnessInput, WeightInput};
use crate::services::{CheckInService, HelloAction, HelloService, HistoryService};
use crate::state::AppState;
use fitbot_shared::validation::{non_empty_text, parse_number};
use fitbot_shared::{DietaryChoice, HistoryCategory, Message, Reply};
use tracing::debug;

pub const HELLO_USAGE: &str = "请输入 on 开启或 off 关闭";

/// Result of running a handler
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Answer and end the conversation
    Finish(Reply),
    /// Answer and keep waiting for a better argument
    Reject(Reply),
    /// End the conversation without answering
    Silent,
}

impl Outcome {
    pub fn finish(text: impl Into<String>) -> Self {
        Outcome::Finish(Reply::at_sender(Message::text(text)))
    }

    pub fn reject(text: impl Into<String>) -> Self {
        Outcome::Reject(Reply::at_sender(Message::text(text)))
    }
}

/// Turn a service result into an outcome; validation failures re-prompt
fn settle<T>(result: Result<T, ApiError>, done: impl FnOnce(T) -> String) -> Result<Outcome, ApiError> {
    match result {
        Ok(value) => Ok(Outcome::finish(done(value))),
        Err(ApiError::Validation(message)) => Ok(Outcome::reject(message)),
        Err(e) => Err(e),
    }
}

async fn ensure_user(state: &AppState, ctx: &ChatContext) -> Result<UserRecord, ApiError> {
    UserRepository::ensure(state.db(), ctx.platform, &ctx.user_id)
        .await
        .map_err(ApiError::Internal)
}

/// Run `command` with `arg`
pub async fn handle(
    state: &AppState,
    ctx: &ChatContext,
    command: CommandKind,
    arg: &str,
) -> Result<Outcome, ApiError> {
    debug!(command = command.name(), user_id = %ctx.user_id, "Handling command");

    match command {
        CommandKind::History => history(state, ctx, arg).await,
        CommandKind::Fitness => fitness(state, ctx, arg).await,
        CommandKind::Dietary => dietary(state, ctx, arg).await,
        CommandKind::Weight => weight(state, ctx, arg).await,
        CommandKind::BodyFat => body_fat(state, ctx, arg).await,
        CommandKind::TargetWeight => target_weight(state, ctx, arg).await,
        CommandKind::TargetBodyFat => target_body_fat(state, ctx, arg).await,
        CommandKind::Music => music(state, arg).await,
        CommandKind::Hello => hello(state, ctx, arg).await,
    }
}

async fn history(state: &AppState, ctx: &ChatContext, arg: &str) -> Result<Outcome, ApiError> {
    let category = match HistoryCategory::parse(arg) {
        Ok(category) => category,
        Err(e) => return Ok(Outcome::reject(e.to_string())),
    };

    let user = ensure_user(state, ctx).await?;
    let message = HistoryService::report(state.db(), state.renderer(), &user, category).await?;

    Ok(Outcome::Finish(Reply::at_sender(message)))
}

async fn fitness(state: &AppState, ctx: &ChatContext, arg: &str) -> Result<Outcome, ApiError> {
    let message = match non_empty_text(arg) {
        Ok(message) => message.to_string(),
        Err(e) => return Ok(Outcome::reject(e.to_string())),
    };

    let user = ensure_user(state, ctx).await?;
    let result = CheckInService::fitness(state.db(), user.id, FitnessInput { message }).await;
    settle(result, |_| "健身打卡成功！继续加油哦".to_string())
}

async fn dietary(state: &AppState, ctx: &ChatContext, arg: &str) -> Result<Outcome, ApiError> {
    let choice = match DietaryChoice::parse(arg) {
        Ok(choice) => choice,
        Err(e) => return Ok(Outcome::reject(e.to_string())),
    };

    let user = ensure_user(state, ctx).await?;
    let result = CheckInService::dietary(state.db(), user.id, choice).await;
    settle(result, |record| {
        if record.healthy {
            "饮食打卡成功！继续保持健康饮食哦".to_string()
        } else {
            "饮食打卡成功！下次要注意饮食健康哦".to_string()
        }
    })
}

async fn weight(state: &AppState, ctx: &ChatContext, arg: &str) -> Result<Outcome, ApiError> {
    let weight = match parse_number(arg) {
        Ok(weight) => weight,
        Err(e) => return Ok(Outcome::reject(e.to_string())),
    };

    let user = ensure_user(state, ctx).await?;
    let result = CheckInService::weight(state.db(), user.id, WeightInput { weight }).await;
    settle(result, |_| format!("体重打卡成功！当前体重 {}kg", weight))
}

async fn body_fat(state: &AppState, ctx: &ChatContext, arg: &str) -> Result<Outcome, ApiError> {
    let body_fat = match parse_number(arg) {
        Ok(body_fat) => body_fat,
        Err(e) => return Ok(Outcome::reject(e.to_string())),
    };

    let user = ensure_user(state, ctx).await?;
    let result = CheckInService::body_fat(state.db(), user.id, BodyFatInput { body_fat }).await;
    settle(result, |_| format!("体脂打卡成功！当前体脂 {}%", body_fat))
}

async fn target_weight(
    state: &AppState,
    ctx: &ChatContext,
    arg: &str,
) -> Result<Outcome, ApiError> {
    let weight = match parse_number(arg) {
        Ok(weight) => weight,
        Err(e) => return Ok(Outcome::reject(e.to_string())),
    };

    let user = ensure_user(state, ctx).await?;
    let result =
        CheckInService::set_target_weight(state.db(), user.id, WeightInput { weight }).await;
    settle(result, |_| format!("目标体重已设置为 {}kg", weight))
}

async fn target_body_fat(
    state: &AppState,
    ctx: &ChatContext,
    arg: &str,
) -> Result<Outcome, ApiError> {
    let body_fat = match parse_number(arg) {
        Ok(body_fat) => body_fat,
        Err(e) => return Ok(Outcome::reject(e.to_string())),
    };

    let user = ensure_user(state, ctx).await?;
    let result =
        CheckInService::set_target_body_fat(state.db(), user.id, BodyFatInput { body_fat }).await;
    settle(result, |_| format!("目标体脂已设置为 {}%", body_fat))
}

/// Music replies carry no mention; no hit ends silently
async fn music(state: &AppState, arg: &str) -> Result<Outcome, ApiError> {
    Ok(match state.music().search(arg).await {
        Some(segment) => Outcome::Finish(Reply::new(segment)),
        None => Outcome::Silent,
    })
}

async fn hello(state: &AppState, ctx: &ChatContext, arg: &str) -> Result<Outcome, ApiError> {
    let Some(action) = HelloAction::parse(arg) else {
        return Ok(Outcome::reject(HELLO_USAGE));
    };

    let text = HelloService::apply(state.db(), &ctx.bot_id, &ctx.target(), action).await?;
    Ok(Outcome::Finish(Reply::text(text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_outcome_replies_mention_sender() {
        let Outcome::Finish(reply) = Outcome::finish("done") else {
            panic!("expected finish");
        };
        assert!(reply.at_sender);

        let Outcome::Reject(reply) = Outcome::reject("again") else {
            panic!("expected reject");
        };
        assert!(reply.at_sender);
        assert_eq!(reply.message.plain_text(), "again");
    }

    #[test]
    fn test_settle_validation_rejects() {
        let result: Result<(), ApiError> = Err(ApiError::Validation("体重不对".to_string()));
        let outcome = settle(result, |_| "ok".to_string()).unwrap();
        assert_eq!(outcome, Outcome::reject("体重不对"));
    }

    #[test]
    fn test_settle_success_finishes() {
        let outcome = settle(Ok(72.5), |w| format!("{}kg", w)).unwrap();
        assert_eq!(outcome, Outcome::finish("72.5kg"));
    }

    #[test]
    fn test_settle_internal_error_propagates() {
        let result: Result<(), ApiError> = Err(ApiError::Internal(anyhow!("db down")));
        assert!(matches!(
            settle(result, |_| String::new()),
            Err(ApiError::Internal(_))
        ));
    }
}
