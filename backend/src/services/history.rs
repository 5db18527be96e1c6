//! Check-in history reports
//!
//! Read-only: every report is built from the user's append-only check-in
//! records. Timestamps are stored in UTC and converted to the process's
//! local zone only when rendered.

use crate::error::ApiError;
use crate::repositories::{
    BodyFatRecord, BodyFatRepository, DietaryRepository, FitnessRecord, FitnessRepository,
    UserRecord, WeightRecord, WeightRepository,
};
use crate::services::chart::ChartRenderer;
use chrono::{DateTime, Local, TimeZone, Utc};
use fitbot_shared::{DietaryTally, HistoryCategory, Message, Sample, Segment};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub const NO_FITNESS_RECORDS: &str = "你还没有健身打卡记录哦";
pub const NO_DIETARY_RECORDS: &str = "你还没有饮食打卡记录哦";
pub const NO_BODY_RECORDS: &str = "你还没有体重或体脂记录哦";

/// File name of the chart attachment
pub const CHART_FILE_NAME: &str = "weight_body_fat.png";

/// Rendered in place of a goal the user has not set
const UNSET_GOAL: &str = "NaN";

const LABEL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// History report service
pub struct HistoryService;

impl HistoryService {
    /// Build the report for one category
    pub async fn report(
        pool: &PgPool,
        renderer: Arc<dyn ChartRenderer>,
        user: &UserRecord,
        category: HistoryCategory,
    ) -> Result<Message, ApiError> {
        debug!(user_id = %user.id, ?category, "Building history report");

        match category {
            HistoryCategory::Fitness => Self::fitness_report(pool, user.id).await,
            HistoryCategory::Dietary => Self::dietary_report(pool, user.id).await,
            HistoryCategory::Body => Self::body_report(pool, renderer, user).await,
        }
    }

    /// One line per fitness check-in
    pub async fn fitness_report(pool: &PgPool, user_id: Uuid) -> Result<Message, ApiError> {
        let records = FitnessRepository::list_by_user(pool, user_id)
            .await
            .map_err(ApiError::Internal)?;

        Ok(Message::text(format_fitness_history(&records, &Local)))
    }

    /// Healthy vs. unhealthy dietary check-in counts
    pub async fn dietary_report(pool: &PgPool, user_id: Uuid) -> Result<Message, ApiError> {
        let groups = DietaryRepository::count_by_health(pool, user_id)
            .await
            .map_err(ApiError::Internal)?;

        Ok(Message::text(format_dietary_summary(&groups)))
    }

    /// Goals followed by the weight and body fat chart
    pub async fn body_report(
        pool: &PgPool,
        renderer: Arc<dyn ChartRenderer>,
        user: &UserRecord,
    ) -> Result<Message, ApiError> {
        let weight = WeightRepository::list_by_user(pool, user.id)
            .await
            .map_err(ApiError::Internal)?;
        let body_fat = BodyFatRepository::list_by_user(pool, user.id)
            .await
            .map_err(ApiError::Internal)?;

        if weight.is_empty() && body_fat.is_empty() {
            return Ok(Message::text(NO_BODY_RECORDS));
        }

        let weight_samples = weight_samples(&weight, &Local);
        let body_fat_samples = body_fat_samples(&body_fat, &Local);

        // Rasterizing is CPU-bound
        let png = tokio::task::spawn_blocking(move || {
            renderer.render(&weight_samples, &body_fat_samples)
        })
        .await
        .map_err(|e| ApiError::Internal(e.into()))?
        .map_err(ApiError::Internal)?;

        Ok(
            Message::text(format_goals(user.target_weight, user.target_body_fat))
                .push(Segment::image(CHART_FILE_NAME, png)),
        )
    }
}

/// Fitness history text: a count header then `date message` lines
pub fn format_fitness_history<Tz>(records: &[FitnessRecord], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if records.is_empty() {
        return NO_FITNESS_RECORDS.to_string();
    }

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(format!(
        "你已成功打卡 {} 次，以下是你当月的健身情况哦～：",
        records.len()
    ));
    for record in records {
        let date = record.recorded_at.with_timezone(tz).format("%Y-%m-%d");
        lines.push(format!("{} {}", date, record.message));
    }
    lines.join("\n")
}

/// Dietary summary text from grouped `(healthy, count)` rows
pub fn format_dietary_summary(groups: &[(bool, i64)]) -> String {
    if groups.is_empty() {
        return NO_DIETARY_RECORDS.to_string();
    }

    let tally = DietaryTally::from_groups(groups);
    format!(
        "你已成功打卡 {} 次，其中健康饮食 {} 次，不健康饮食 {} 次",
        tally.total(),
        tally.healthy,
        tally.unhealthy
    )
}

/// Goals line preceding the chart
pub fn format_goals(target_weight: Option<Decimal>, target_body_fat: Option<Decimal>) -> String {
    format!(
        "你的目标体重是 {}kg，目标体脂是 {}%\n",
        goal_text(target_weight),
        goal_text(target_body_fat)
    )
}

fn goal_text(goal: Option<Decimal>) -> String {
    match goal {
        Some(value) if !value.is_zero() => value.normalize().to_string(),
        _ => UNSET_GOAL.to_string(),
    }
}

pub fn weight_samples<Tz>(records: &[WeightRecord], tz: &Tz) -> Vec<Sample>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    to_samples(records.iter().map(|r| (r.recorded_at, r.weight)), tz)
}

pub fn body_fat_samples<Tz>(records: &[BodyFatRecord], tz: &Tz) -> Vec<Sample>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    to_samples(records.iter().map(|r| (r.recorded_at, r.body_fat)), tz)
}

/// Label points with local time. Points sharing a label, adjacent or not
/// (local time repeats when clocks go back), collapse into the first one's
/// position with the last value.
fn to_samples<Tz, I>(points: I, tz: &Tz) -> Vec<Sample>
where
    Tz: TimeZone,
    Tz::Offset: Display,
    I: IntoIterator<Item = (DateTime<Utc>, Decimal)>,
{
    let mut samples: Vec<Sample> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for (at, value) in points {
        let label = at.with_timezone(tz).format(LABEL_FORMAT).to_string();
        let value = value.to_f64().unwrap_or(0.0);

        match positions.get(&label) {
            Some(&index) => samples[index].value = value,
            None => {
                positions.insert(label.clone(), samples.len());
                samples.push(Sample { label, value });
            }
        }
    }
    samples
}
