use chrono::{DateTime, Utc};

/// Shown while no expiry hint is known.
pub const EXPIRY_PLACEHOLDER: &str = "...";

/// Human-readable time left until `expires_at`, in whole minutes rounded down.
///
/// Anything under a minute, including an expiry already in the past, reads
/// as "less than 1 minute".
pub fn format_time_until_expiry(now: DateTime<Utc>, expires_at: Option<DateTime<Utc>>) -> String {
    let Some(expires_at) = expires_at else {
        return EXPIRY_PLACEHOLDER.to_string();
    };

    let minutes = (expires_at - now).num_seconds().div_euclid(60);

    match minutes {
        m if m < 1 => "less than 1 minute".to_string(),
        1 => "1 minute".to_string(),
        m => format!("{m} minutes"),
    }
}
