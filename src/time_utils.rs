/// Short break preset in seconds (5 minutes)
pub const SHORT_BREAK: u32 = 5 * 60;
/// Medium break preset in seconds (15 minutes)
pub const MEDIUM_BREAK: u32 = 15 * 60;
/// Classic pomodoro preset in seconds (25 minutes), also the default duration
pub const POMODORO: u32 = 25 * 60;
/// Extended focus preset in seconds (30 minutes)
pub const EXTENDED: u32 = 30 * 60;

/// Presets in display order, as (label, seconds)
pub const PRESETS: [(&str, u32); 4] = [
    ("Short break", SHORT_BREAK),
    ("Medium break", MEDIUM_BREAK),
    ("Pomodoro", POMODORO),
    ("Extended", EXTENDED),
];

/// Bounds accepted for a custom timer, in minutes
pub const MIN_CUSTOM_MINUTES: u32 = 1;
pub const MAX_CUSTOM_MINUTES: u32 = 60;

/// Format seconds as "MM:SS". The minutes field is not capped at 59.
pub fn format_time(seconds: u32) -> String {
    let mins = seconds / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}", mins, secs)
}

pub fn minutes_to_seconds(minutes: u32) -> u32 {
    minutes * 60
}

pub fn seconds_to_minutes(seconds: u32) -> u32 {
    seconds / 60
}

/// Percentage of the countdown still remaining, clamped to 0..=100.
/// Returns 0 when `initial` is 0.
pub fn calculate_fill_percentage(remaining: i64, initial: i64) -> f64 {
    if initial == 0 {
        return 0.0;
    }
    (remaining as f64 / initial as f64 * 100.0).clamp(0.0, 100.0)
}

/// Format time spent on a task (e.g. "45s", "2m 30s", "1h 5m")
pub fn format_time_spent(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{}s", seconds);
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        if minutes > 0 {
            format!("{}h {}m", hours, minutes)
        } else {
            format!("{}h", hours)
        }
    } else if secs > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}m", minutes)
    }
}

/// Validate a custom timer length in minutes and convert it to seconds
pub fn validate_custom_minutes(minutes: u32) -> Result<u32, String> {
    if !(MIN_CUSTOM_MINUTES..=MAX_CUSTOM_MINUTES).contains(&minutes) {
        return Err(format!(
            "Please enter a value between {} and {} minutes",
            MIN_CUSTOM_MINUTES, MAX_CUSTOM_MINUTES
        ));
    }
    Ok(minutes_to_seconds(minutes))
}
