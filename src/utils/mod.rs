//! Utility modules for the visibility gateway
//!
//! - **error**: Crate-level error type and result alias
//! - **logging**: Tracing subscriber setup

pub mod error;
pub mod logging;

/// Truncate string to at most `max_chars` characters with ellipsis
pub fn truncate_string(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
