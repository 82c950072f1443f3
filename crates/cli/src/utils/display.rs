//! Display utilities for the tapkit CLI

use colored::Colorize;

/// Format a success message
pub(crate) fn success(message: &str) -> String {
    format!("✅ {}", message.green().bold())
}

/// Format a warning message
pub(crate) fn warning(message: &str) -> String {
    format!("⚠️  {}", message.yellow().bold())
}

/// Format an info message
pub(crate) fn info(message: &str) -> String {
    format!("ℹ️  {}", message.blue())
}

/// Format a key-value section
pub(crate) fn key_value_box(title: &str, items: Vec<(&str, String)>) -> String {
    let mut result = format!("{}", title.bold().underline());

    for (key, value) in items {
        result.push_str(&format!("\n  {}: {}", key.bold(), value));
    }

    result
}

/// Format a status word, green on success
pub(crate) fn status(text: &str, success: bool) -> String {
    if success {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}
