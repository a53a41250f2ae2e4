//! Default TTLs per data category, in seconds.

use serde::{Deserialize, Serialize};

pub struct CacheTtl;

impl CacheTtl {
    pub const USER_PROFILE: u64 = 300;
    pub const MACRO_GOALS: u64 = 600;
    pub const FOOD_DATABASE: u64 = 3600;
    pub const DAILY_INTAKE: u64 = 30;
    pub const WEARABLE_DATA: u64 = 120;
    pub const RECIPES: u64 = 1800;
    pub const STATIC_CONFIG: u64 = 86400;
}

/// Category of cached data, used to pick a TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheCategory {
    UserProfile,
    MacroGoals,
    FoodDatabase,
    DailyIntake,
    WearableData,
    Recipes,
    StaticConfig,
}

impl CacheCategory {
    pub fn ttl_seconds(self) -> u64 {
        match self {
            CacheCategory::UserProfile => CacheTtl::USER_PROFILE,
            CacheCategory::MacroGoals => CacheTtl::MACRO_GOALS,
            CacheCategory::FoodDatabase => CacheTtl::FOOD_DATABASE,
            CacheCategory::DailyIntake => CacheTtl::DAILY_INTAKE,
            CacheCategory::WearableData => CacheTtl::WEARABLE_DATA,
            CacheCategory::Recipes => CacheTtl::RECIPES,
            CacheCategory::StaticConfig => CacheTtl::STATIC_CONFIG,
        }
    }
}
