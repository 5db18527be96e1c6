//! Integration tests for check-in and hello commands

mod common;

use axum::http::StatusCode;
use fitbot_backend::repositories::{UserRepository, WeightRepository};
use fitbot_shared::Platform;
use rust_decimal::Decimal;
use std::str::FromStr;

#[tokio::test]
#[ignore = "requires database"]
async fn test_weight_check_in_reprompts_until_valid() {
    let app = common::TestApp::new().await;

    assert_eq!(app.say_text("/体重打卡").await, "请输入你的体重（kg）");
    assert!(app.say_text("700").await.contains("20 到 500"));
    assert_eq!(app.say_text("72.5").await, "体重打卡成功！当前体重 72.5kg");

    let user = UserRepository::ensure(&app.pool, Platform::OnebotV11, &app.user_id.to_string())
        .await
        .unwrap();
    let records = WeightRepository::list_by_user(&app.pool, user.id)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].weight, Decimal::from_str("72.50").unwrap());

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_targets_are_stored_on_user() {
    let app = common::TestApp::new().await;

    assert_eq!(app.say_text("/目标体重 60公斤").await, "目标体重已设置为 60kg");
    assert!(app.say_text("/目标体脂 90").await.contains("1% 到 75%"));
    assert_eq!(app.say_text("18.5%").await, "目标体脂已设置为 18.5%");

    let user = UserRepository::ensure(&app.pool, Platform::OnebotV11, &app.user_id.to_string())
        .await
        .unwrap();
    assert_eq!(user.target_weight, Some(Decimal::from_str("60.00").unwrap()));
    assert_eq!(user.target_body_fat, Some(Decimal::from_str("18.50").unwrap()));

    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_ensure_user_is_idempotent() {
    let app = common::TestApp::new().await;
    let platform_user_id = app.user_id.to_string();

    let first = UserRepository::ensure(&app.pool, Platform::OnebotV11, &platform_user_id)
        .await
        .unwrap();
    let second = UserRepository::ensure(&app.pool, Platform::OnebotV11, &platform_user_id)
        .await
        .unwrap();
    let other_platform = UserRepository::ensure(&app.pool, Platform::OnebotV12, &platform_user_id)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_ne!(first.id, other_platform.id);

    sqlx::query("DELETE FROM check_in_users WHERE id = $1")
        .bind(other_platform.id)
        .execute(&app.pool)
        .await
        .unwrap();
    app.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_hello_subscription_cycle() {
    let app = common::TestApp::new().await;

    assert_eq!(app.say_text("/hello").await, "hello 当前状态：关闭");
    assert_eq!(app.say_text("/hello on").await, "已开启 hello");
    assert_eq!(app.say_text("/hello 开启").await, "hello 已经是开启状态");
    assert_eq!(app.say_text("/hello").await, "hello 当前状态：开启");
    assert_eq!(app.say_text("/hello off").await, "已关闭 hello");
    assert_eq!(app.say_text("/hello off").await, "hello 本来就是关闭状态");

    // Finished conversations leave nothing pending
    let (status, _) = app.say("on").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
