//! Small text and clock helpers shared by the models, config and stores.

/// Trim optional user input, mapping blank values to `None`.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Case-insensitive substring test used for local note search
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Milliseconds since the Unix epoch; queue timestamps and row stamps use it
pub fn unix_timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_option_maps_blank_to_none() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some(" \n ".to_string())), None);
        assert_eq!(
            normalize_text_option(Some("  milk ".to_string())),
            Some("milk".to_string())
        );
    }

    #[test]
    fn contains_ignore_case_matches_across_case() {
        assert!(contains_ignore_case("Groceries for Sunday", "sunDAY"));
        assert!(contains_ignore_case("Élan", "élan"));
        assert!(!contains_ignore_case("Groceries", "milk"));
    }

    #[test]
    fn timestamps_are_monotonic_enough_for_ordering() {
        let first = unix_timestamp_millis();
        assert!(unix_timestamp_millis() >= first);
    }
}
