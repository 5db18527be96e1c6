//! Database repositories
//!
//! Provides data access layer for database operations.

pub mod check_in;
pub mod hello;
pub mod user;

pub use check_in::{
    BodyFatRecord, BodyFatRepository, DietaryRecord, DietaryRepository, FitnessRecord,
    FitnessRepository, WeightRecord, WeightRepository,
};
pub use hello::{HelloRecord, HelloRepository};
pub use user::{UserRecord, UserRepository};
