//! Domain models shared by the bot and its adapters

use crate::errors::SelectionError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Chat platform a message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    OnebotV11,
    OnebotV12,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::OnebotV11 => "onebot_v11",
            Platform::OnebotV12 => "onebot_v12",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "onebot_v11" => Ok(Platform::OnebotV11),
            "onebot_v12" => Ok(Platform::OnebotV12),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}

/// Whether a target is a direct chat or a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Private,
    Group,
}

/// Where a message is delivered
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageTarget {
    pub platform: Platform,
    pub kind: TargetKind,
    pub id: String,
}

impl MessageTarget {
    pub fn private(platform: Platform, user_id: impl Into<String>) -> Self {
        Self {
            platform,
            kind: TargetKind::Private,
            id: user_id.into(),
        }
    }

    pub fn group(platform: Platform, group_id: impl Into<String>) -> Self {
        Self {
            platform,
            kind: TargetKind::Group,
            id: group_id.into(),
        }
    }
}

/// Which check-in history a user asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryCategory {
    /// `a`: fitness check-ins
    Fitness,
    /// `b`: dietary check-ins
    Dietary,
    /// `c`: weight and body fat
    Body,
}

impl HistoryCategory {
    /// Parse a category code, ignoring case and surrounding whitespace
    pub fn parse(input: &str) -> Result<Self, SelectionError> {
        let code = input.trim().to_lowercase();
        match code.as_str() {
            "" => Err(SelectionError::Empty),
            "a" => Ok(HistoryCategory::Fitness),
            "b" => Ok(HistoryCategory::Dietary),
            "c" => Ok(HistoryCategory::Body),
            _ => Err(SelectionError::Invalid),
        }
    }
}

/// Dietary check-in answer: `a` healthy, `b` unhealthy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DietaryChoice {
    pub healthy: bool,
}

impl DietaryChoice {
    pub fn parse(input: &str) -> Result<Self, SelectionError> {
        match input.trim().to_lowercase().as_str() {
            "" => Err(SelectionError::Empty),
            "a" => Ok(Self { healthy: true }),
            "b" => Ok(Self { healthy: false }),
            _ => Err(SelectionError::Invalid),
        }
    }
}

/// Dietary check-in counts split by the healthy flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DietaryTally {
    pub healthy: i64,
    pub unhealthy: i64,
}

impl DietaryTally {
    /// Build a tally from `(healthy, count)` rows of a grouped query.
    ///
    /// A missing group counts as zero. Repeated keys are summed.
    pub fn from_groups(groups: &[(bool, i64)]) -> Self {
        let mut counts: HashMap<bool, i64> = HashMap::with_capacity(2);
        for &(healthy, count) in groups {
            *counts.entry(healthy).or_insert(0) += count;
        }

        Self {
            healthy: counts.get(&true).copied().unwrap_or(0),
            unhealthy: counts.get(&false).copied().unwrap_or(0),
        }
    }

    pub fn total(&self) -> i64 {
        self.healthy + self.unhealthy
    }
}

/// One point of a chart series
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Local-time label, `%Y-%m-%d %H:%M:%S`
    pub label: String,
    pub value: f64,
}
