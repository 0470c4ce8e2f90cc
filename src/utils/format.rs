const DAY: i64 = 86_400;
const HOUR: i64 = 3_600;
const MINUTE: i64 = 60;

/// Renders remaining seconds as e.g. "1d 2h 3m", dropping zero components.
/// Seconds are never shown.
pub(crate) fn format_duration(seconds: i64) -> String {
    if seconds <= 0 {
        return "expired".to_owned();
    }

    let parts: Vec<String> = [
        (seconds / DAY, "d"),
        ((seconds % DAY) / HOUR, "h"),
        ((seconds % HOUR) / MINUTE, "m"),
    ]
    .into_iter()
    .filter(|(value, _)| *value > 0)
    .map(|(value, unit)| format!("{}{}", value, unit))
    .collect();

    if parts.is_empty() {
        "<1m".to_owned()
    } else {
        parts.join(" ")
    }
}
