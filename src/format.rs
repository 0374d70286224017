/// Renders a duration as `MM:SS`, `HH:MM:SS` once an hour is reached, or
/// `HH:MM:SS.mmm` when sub-second precision is requested.
pub fn format_duration(ms: u64, include_sub_second: bool) -> String {
    let total_secs = ms / 1_000;
    let hours = total_secs / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    if include_sub_second {
        let millis = ms % 1_000;
        format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
    } else if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}
