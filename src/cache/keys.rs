//! Cache key builders.
//!
//! The namespace is advisory; the cache itself accepts any string key.

use chrono::NaiveDate;

/// Maximum number of characters of a search query kept in its key.
pub const SEARCH_QUERY_MAX_CHARS: usize = 50;

pub struct CacheKeys;

impl CacheKeys {
    /// `user:{id}:profile`
    pub fn user_profile(user_id: &str) -> String {
        format!("user:{}:profile", user_id)
    }

    /// `user:{id}:goals`
    pub fn user_goals(user_id: &str) -> String {
        format!("user:{}:goals", user_id)
    }

    /// `intake:{userId}:{YYYY-MM-DD}`
    pub fn daily_intake(user_id: &str, date: NaiveDate) -> String {
        format!("intake:{}:{}", user_id, date.format("%Y-%m-%d"))
    }

    /// `wearable:{userId}:{source}`
    pub fn wearable_data(user_id: &str, source: &str) -> String {
        format!("wearable:{}:{}", user_id, source)
    }

    /// `food:{foodId}`
    pub fn food(food_id: &str) -> String {
        format!("food:{}", food_id)
    }

    /// `recipe:{recipeId}`
    pub fn recipe(recipe_id: &str) -> String {
        format!("recipe:{}", recipe_id)
    }

    /// `search:{query}`, lowercased and cut to [`SEARCH_QUERY_MAX_CHARS`] characters.
    pub fn search(query: &str) -> String {
        let normalized: String = query
            .to_lowercase()
            .chars()
            .take(SEARCH_QUERY_MAX_CHARS)
            .collect();
        format!("search:{}", normalized)
    }

    /// Prefix shared by every key belonging to `user_id`'s profile and goals.
    pub fn user_prefix(user_id: &str) -> String {
        format!("user:{}", user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_keys() {
        assert_eq!(CacheKeys::user_profile("42"), "user:42:profile");
        assert_eq!(CacheKeys::user_goals("42"), "user:42:goals");
        assert_eq!(CacheKeys::user_prefix("42"), "user:42");
    }

    #[test]
    fn test_daily_intake_date_format() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(CacheKeys::daily_intake("u1", date), "intake:u1:2024-03-07");
    }

    #[test]
    fn test_item_keys() {
        assert_eq!(CacheKeys::wearable_data("u1", "garmin"), "wearable:u1:garmin");
        assert_eq!(CacheKeys::food("123"), "food:123");
        assert_eq!(CacheKeys::recipe("r9"), "recipe:r9");
    }

    #[test]
    fn test_search_lowercases_and_truncates() {
        assert_eq!(CacheKeys::search("Greek YOGURT"), "search:greek yogurt");

        let long = "A".repeat(80);
        let key = CacheKeys::search(&long);
        assert_eq!(key, format!("search:{}", "a".repeat(SEARCH_QUERY_MAX_CHARS)));
    }

    #[test]
    fn test_search_truncates_on_char_boundary() {
        let query = "é".repeat(60);
        let key = CacheKeys::search(&query);
        assert_eq!(key.trim_start_matches("search:").chars().count(), 50);
    }
}
