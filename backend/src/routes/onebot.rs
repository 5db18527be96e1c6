//! OneBot webhook endpoints
//!
//! - POST /onebot/v11 - V11 HTTP POST events; replies as quick operation
//! - POST /onebot/v12 - V12 webhook events; replies via `send_message`

use crate::adapters::{onebot_v11, onebot_v12, BotApi};
use crate::auth::require_access_token;
use crate::bot::dispatch;
use crate::error::{ApiError, ApiResult};
use crate::services::HelloService;
use crate::state::AppState;
use anyhow::anyhow;
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use tracing::{debug, error};

/// Webhook routes, guarded by the access token when one is configured
pub fn onebot_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v11", post(v11_webhook))
        .route("/v12", post(v12_webhook))
        .route_layer(middleware::from_fn_with_state(state, require_access_token))
}

pub async fn v11_webhook(
    State(state): State<AppState>,
    Json(event): Json<onebot_v11::Event>,
) -> ApiResult<Response> {
    match event {
        onebot_v11::Event::Message(message) => {
            let ctx = message.into_context();
            match dispatch(&state, &ctx).await? {
                Some(reply) if !reply.message.is_empty() => {
                    Ok(Json(onebot_v11::quick_reply(&reply)).into_response())
                }
                _ => Ok(StatusCode::NO_CONTENT.into_response()),
            }
        }
        onebot_v11::Event::MetaEvent(meta) => {
            if meta.is_connect() {
                match state.onebot_v11() {
                    Some(api) => spawn_greetings(
                        state.clone(),
                        Arc::new(api.clone()),
                        meta.self_id.to_string(),
                    ),
                    None => debug!("onebot.v11_api_url not set, skipping hello greetings"),
                }
            }
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        onebot_v11::Event::Other => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

pub async fn v12_webhook(
    State(state): State<AppState>,
    Json(event): Json<onebot_v12::Event>,
) -> ApiResult<StatusCode> {
    match event {
        onebot_v12::Event::Message(message) => {
            let ctx = message.into_context();
            if let Some(reply) = dispatch(&state, &ctx).await? {
                if !reply.message.is_empty() {
                    let api = state.onebot_v12().ok_or_else(|| {
                        ApiError::Internal(anyhow!("onebot.v12_api_url is not configured"))
                    })?;
                    api.send_reply(&ctx, &reply)
                        .await
                        .map_err(ApiError::Internal)?;
                }
            }
        }
        onebot_v12::Event::Meta(meta) => {
            let bots = meta.online_bots();
            match state.onebot_v12() {
                Some(api) => {
                    for bot_id in bots {
                        spawn_greetings(state.clone(), Arc::new(api.clone()), bot_id);
                    }
                }
                None if !bots.is_empty() => {
                    debug!("onebot.v12_api_url not set, skipping hello greetings")
                }
                None => {}
            }
        }
        onebot_v12::Event::Other => {}
    }

    Ok(StatusCode::NO_CONTENT)
}

fn spawn_greetings(state: AppState, api: Arc<dyn BotApi>, bot_id: String) {
    tokio::spawn(async move {
        if let Err(e) = HelloService::greet(state.db(), api.as_ref(), &bot_id).await {
            error!(bot_id = %bot_id, error = %e, "Failed to send hello greetings");
        }
    });
}
