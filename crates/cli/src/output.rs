// Output formatting for CLI

use agentdesk_core::{Notification, NotificationKind};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to render YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s {
            "json" => OutputFormat::Json,
            "yaml" => OutputFormat::Yaml,
            _ => OutputFormat::Text,
        }
    }

    pub fn render<T: Serialize>(&self, value: &T) -> Result<Option<String>, OutputError> {
        match self {
            OutputFormat::Json => Ok(Some(serde_json::to_string_pretty(value)?)),
            OutputFormat::Yaml => Ok(Some(serde_yaml::to_string(value)?)),
            // Text format is handled by each command
            OutputFormat::Text => Ok(None),
        }
    }

    pub fn print_value<T: Serialize>(&self, value: &T) -> Result<(), OutputError> {
        if let Some(rendered) = self.render(value)? {
            println!("{}", rendered.trim_end());
        }
        Ok(())
    }

    pub fn is_text(&self) -> bool {
        matches!(self, OutputFormat::Text)
    }
}

/// Print a simple key-value pair for text output
pub fn print_field(label: &str, value: &str) {
    println!("{:<14} {}", format!("{}:", label), value);
}

/// Print a table header
pub fn print_table_header(columns: &[(&str, usize)]) {
    let header: String = columns
        .iter()
        .map(|(name, width)| format!("{:<width$}", name, width = width))
        .collect::<Vec<_>>()
        .join("  ");
    println!("{}", header.trim_end());
}

/// Fit a value into a column, cutting on a char boundary
pub fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let kept: String = value.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Print a table row
pub fn print_table_row(values: &[(&str, usize)]) {
    let row: String = values
        .iter()
        .map(|(val, width)| format!("{:<width$}", truncate(val, *width), width = width))
        .collect::<Vec<_>>()
        .join("  ");
    println!("{}", row.trim_end());
}

/// Print a notification to stderr, keeping stdout for command output
pub fn print_notification(notification: &Notification) {
    let tag = match notification.kind {
        NotificationKind::Info => "info",
        NotificationKind::Success => "ok",
        NotificationKind::Warning => "warning",
        NotificationKind::Alert => "error",
    };
    eprintln!("[{tag}] {}: {}", notification.title, notification.message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("Agente", 10), "Agente");
        assert_eq!(truncate("Atención al cliente", 10), "Atención...");
    }

    #[test]
    fn test_render_formats() {
        let value = serde_json::json!({ "id": "a" });
        assert_eq!(OutputFormat::Text.render(&value).unwrap(), None);
        assert_eq!(
            OutputFormat::Yaml.render(&value).unwrap().as_deref(),
            Some("id: a\n")
        );
        assert!(OutputFormat::Json
            .render(&value)
            .unwrap()
            .unwrap()
            .contains("\"id\": \"a\""));
    }
}
