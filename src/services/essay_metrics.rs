/// Whitespace-delimited word count, as shown next to the essay editor.
pub fn count_words(text: &str) -> u32 {
    let count = text.split_whitespace().count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// `MM:SS`, or `N/A` when no time was tracked.
pub fn format_time_spent(seconds: Option<u32>) -> String {
    match seconds {
        Some(seconds) if seconds > 0 => format!("{:02}:{:02}", seconds / 60, seconds % 60),
        _ => String::from("N/A"),
    }
}
