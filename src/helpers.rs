use chrono::{DateTime, Utc};

pub fn format_relative_time(timestamp: DateTime<Utc>) -> String {
    format_relative_time_from(timestamp, Utc::now())
}

pub fn format_relative_time_from(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(timestamp);

    if delta.num_minutes() < 1 {
        return "just now".to_string();
    }

    if delta.num_hours() < 1 {
        let minutes = delta.num_minutes();
        return format!(
            "{} minute{} ago",
            minutes,
            if minutes == 1 { "" } else { "s" }
        );
    }

    if delta.num_hours() < 24 {
        let hours = delta.num_hours();
        return format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" });
    }

    let days = delta.num_days();
    if days < 7 {
        return format!("{} day{} ago", days, if days == 1 { "" } else { "s" });
    }

    let weeks = days / 7;
    if weeks < 5 {
        return format!("{} week{} ago", weeks, if weeks == 1 { "" } else { "s" });
    }

    let months = days / 30;
    if months < 12 {
        return format!("{} month{} ago", months, if months == 1 { "" } else { "s" });
    }

    let years = (days / 365).max(1);
    format!("{} year{} ago", years, if years == 1 { "" } else { "s" })
}

pub fn pending_summary(count: i64) -> String {
    match count {
        n if n <= 0 => "All apps are up to date.".to_string(),
        1 => "You have 1 app update available.".to_string(),
        n => format!("You have {} app updates available.", n),
    }
}

pub fn last_checked_text(last_check: Option<DateTime<Utc>>, loading: bool) -> String {
    if loading {
        return "Checking for app updates…".to_string();
    }
    match last_check {
        Some(timestamp) => format!("Last checked {}", format_relative_time(timestamp)),
        None => "Last checked: never".to_string(),
    }
}
