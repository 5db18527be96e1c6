//! Check-in recording service
//!
//! Range checks run here so that every entry point (chat command or
//! integration test) stores the same bounded values.

use crate::error::ApiError;
use crate::repositories::{
    BodyFatRecord, BodyFatRepository, DietaryRecord, DietaryRepository, FitnessRecord,
    FitnessRepository, UserRecord, UserRepository, WeightRecord, WeightRepository,
};
use fitbot_shared::DietaryChoice;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

/// Fitness check-in input
#[derive(Debug, Clone, Validate)]
pub struct FitnessInput {
    #[validate(length(min = 1, max = 500, message = "运动内容需要在 1 到 500 个字之间，请重新输入"))]
    pub message: String,
}

/// Weight in kg, used for both check-ins and goals
#[derive(Debug, Clone, Copy, Validate)]
pub struct WeightInput {
    #[validate(range(min = 20.0, max = 500.0, message = "体重需要在 20 到 500 kg 之间，请重新输入"))]
    pub weight: f64,
}

/// Body fat in %, used for both check-ins and goals
#[derive(Debug, Clone, Copy, Validate)]
pub struct BodyFatInput {
    #[validate(range(min = 1.0, max = 75.0, message = "体脂需要在 1% 到 75% 之间，请重新输入"))]
    pub body_fat: f64,
}

/// Validate an input, surfacing the first field message as a re-prompt
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|errors| ApiError::Validation(first_message(&errors)))
}

fn first_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errors| errors.iter())
        .find_map(|error| error.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}

/// Check-in service for business logic
pub struct CheckInService;

impl CheckInService {
    pub async fn fitness(
        pool: &PgPool,
        user_id: Uuid,
        input: FitnessInput,
    ) -> Result<FitnessRecord, ApiError> {
        validate_input(&input)?;

        let record = FitnessRepository::create(pool, user_id, input.message.trim())
            .await
            .map_err(ApiError::Internal)?;

        info!(user_id = %user_id, "Fitness check-in recorded");
        Ok(record)
    }

    pub async fn dietary(
        pool: &PgPool,
        user_id: Uuid,
        choice: DietaryChoice,
    ) -> Result<DietaryRecord, ApiError> {
        let record = DietaryRepository::create(pool, user_id, choice.healthy)
            .await
            .map_err(ApiError::Internal)?;

        info!(user_id = %user_id, healthy = choice.healthy, "Dietary check-in recorded");
        Ok(record)
    }

    pub async fn weight(
        pool: &PgPool,
        user_id: Uuid,
        input: WeightInput,
    ) -> Result<WeightRecord, ApiError> {
        validate_input(&input)?;

        let record = WeightRepository::create(pool, user_id, input.weight)
            .await
            .map_err(ApiError::Internal)?;

        info!(user_id = %user_id, weight = input.weight, "Weight check-in recorded");
        Ok(record)
    }

    pub async fn body_fat(
        pool: &PgPool,
        user_id: Uuid,
        input: BodyFatInput,
    ) -> Result<BodyFatRecord, ApiError> {
        validate_input(&input)?;

        let record = BodyFatRepository::create(pool, user_id, input.body_fat)
            .await
            .map_err(ApiError::Internal)?;

        info!(user_id = %user_id, body_fat = input.body_fat, "Body fat check-in recorded");
        Ok(record)
    }

    pub async fn set_target_weight(
        pool: &PgPool,
        user_id: Uuid,
        input: WeightInput,
    ) -> Result<UserRecord, ApiError> {
        validate_input(&input)?;

        UserRepository::set_target_weight(pool, user_id, input.weight)
            .await
            .map_err(ApiError::Internal)
    }

    pub async fn set_target_body_fat(
        pool: &PgPool,
        user_id: Uuid,
        input: BodyFatInput,
    ) -> Result<UserRecord, ApiError> {
        validate_input(&input)?;

        UserRepository::set_target_body_fat(pool, user_id, input.body_fat)
            .await
            .map_err(ApiError::Internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn rejection<T: Validate>(input: &T) -> Option<String> {
        match validate_input(input) {
            Err(ApiError::Validation(msg)) => Some(msg),
            _ => None,
        }
    }

    #[rstest]
    #[case(20.0)]
    #[case(72.5)]
    #[case(500.0)]
    fn test_weight_in_range(#[case] weight: f64) {
        assert!(validate_input(&WeightInput { weight }).is_ok());
    }

    #[rstest]
    #[case(19.9)]
    #[case(500.1)]
    #[case(-1.0)]
    fn test_weight_out_of_range(#[case] weight: f64) {
        let msg = rejection(&WeightInput { weight }).unwrap();
        assert!(msg.contains("20 到 500"));
    }

    #[rstest]
    #[case(0.5, false)]
    #[case(1.0, true)]
    #[case(18.5, true)]
    #[case(75.0, true)]
    #[case(75.5, false)]
    fn test_body_fat_bounds(#[case] body_fat: f64, #[case] ok: bool) {
        assert_eq!(validate_input(&BodyFatInput { body_fat }).is_ok(), ok);
    }

    #[test]
    fn test_fitness_message_length_counts_characters() {
        // 500 CJK characters are 1500 bytes
        let input = FitnessInput {
            message: "跑".repeat(500),
        };
        assert!(validate_input(&input).is_ok());

        let input = FitnessInput {
            message: "跑".repeat(501),
        };
        assert!(rejection(&input).unwrap().contains("1 到 500"));
    }

    #[test]
    fn test_fitness_message_empty_rejected() {
        let input = FitnessInput {
            message: String::new(),
        };
        assert!(rejection(&input).is_some());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_weight_accepted_iff_in_range(weight in 0.0f64..1000.0) {
            let ok = validate_input(&WeightInput { weight }).is_ok();
            prop_assert_eq!(ok, (20.0..=500.0).contains(&weight));
        }
    }
}
