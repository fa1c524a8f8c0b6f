// Display helpers: base-model names and timestamps

use chrono::{DateTime, Datelike, Timelike};

/// Known base models and their display names
pub const KNOWN_MODELS: &[(&str, &str)] = &[
    ("gpt-4o", "GPT-4 Omni"),
    ("gpt-4.1-mini", "GPT-4 Mini"),
    ("gpt-4", "GPT-4"),
    ("gpt-3.5-turbo", "GPT-3.5 Turbo"),
];

const MONTHS: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sept", "oct", "nov", "dic",
];

/// Known base models as (id, display name) pairs
pub fn known_models() -> &'static [(&'static str, &'static str)] {
    KNOWN_MODELS
}

/// Resolve a base-model id to its display name. Unknown ids are returned as-is.
pub fn model_display_name(base_model_id: &str) -> &str {
    KNOWN_MODELS
        .iter()
        .find(|(id, _)| *id == base_model_id)
        .map(|(_, name)| *name)
        .unwrap_or(base_model_id)
}

/// Format seconds since epoch as a short date, e.g. "26 oct 2023, 14:05" (UTC)
pub fn format_timestamp(secs: i64) -> String {
    match DateTime::from_timestamp(secs, 0) {
        Some(dt) => format!(
            "{} {} {}, {:02}:{:02}",
            dt.day(),
            MONTHS[dt.month0() as usize],
            dt.year(),
            dt.hour(),
            dt.minute()
        ),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_display_name() {
        assert_eq!(model_display_name("gpt-4o"), "GPT-4 Omni");
        assert_eq!(model_display_name("gpt-4.1-mini"), "GPT-4 Mini");
        assert_eq!(model_display_name("gpt-3.5-turbo"), "GPT-3.5 Turbo");
        assert_eq!(model_display_name("llama3:8b"), "llama3:8b");
    }

    #[test]
    fn test_format_timestamp() {
        // 2023-10-26T14:05:00Z
        assert_eq!(format_timestamp(1_698_329_100), "26 oct 2023, 14:05");
        assert_eq!(format_timestamp(0), "1 ene 1970, 00:00");
    }

    #[test]
    fn test_format_timestamp_out_of_range() {
        assert_eq!(format_timestamp(i64::MAX), "-");
    }
}
